/// Dashboard page
///
/// Header with the user's email and a logout button, then the task list with
/// per-row edit and delete controls, then a form that either creates a task
/// or, on `/tasks/:id/edit`, edits the selected one. A failed read renders a
/// generic message in place of the list.

use super::{escape, flash, layout};
use crate::session::Flash;
use taskboard_shared::models::task::{Task, MAX_DESCRIPTION_LEN, MAX_NAME_LEN};

/// Everything the dashboard shows
#[derive(Debug)]
pub struct Dashboard<'a> {
    /// Signed-in user's email
    pub email: &'a str,

    /// Tasks, or `None` when the read failed
    pub tasks: Option<&'a [Task]>,

    /// Task being edited
    pub editing: Option<&'a Task>,

    /// Pending flash message
    pub flash: Option<&'a Flash>,
}

/// Renders the dashboard
pub fn render(view: &Dashboard<'_>) -> String {
    let content = format!(
        "{header}\n{flash}\n<section>\n<h2>Your tasks</h2>\n{list}\n</section>\n{form}",
        header = header(view.email),
        flash = flash(view.flash),
        list = task_list(view.tasks, view.editing.map(|t| t.id)),
        form = task_form(view.editing),
    );

    layout("Tasks", &content)
}

fn header(email: &str) -> String {
    format!(
        "<header>\n<h1>Taskboard</h1>\n<div>Signed in as <strong>{}</strong> \
         <form class=\"inline\" method=\"post\" action=\"/logout\">\
         <button type=\"submit\">Logout</button></form></div>\n</header>",
        escape(email)
    )
}

fn task_list(tasks: Option<&[Task]>, editing: Option<i64>) -> String {
    let Some(tasks) = tasks else {
        return "<p class=\"flash error\">Could not load your tasks. Please try again.</p>"
            .to_string();
    };

    if tasks.is_empty() {
        return "<p>No tasks yet.</p>".to_string();
    }

    let items: String = tasks
        .iter()
        .map(|task| {
            let marker = if editing == Some(task.id) { " (editing)" } else { "" };
            let description = match task.task_description.as_deref() {
                Some(text) if !text.is_empty() => format!("<br><small>{}</small>", escape(text)),
                _ => String::new(),
            };

            format!(
                "<li><strong>{name}</strong>{marker}{description}<br>\
                 <a href=\"/tasks/{id}/edit\">Edit</a> \
                 <form class=\"inline\" method=\"post\" action=\"/tasks/{id}/delete\">\
                 <button type=\"submit\">Delete</button></form></li>\n",
                name = escape(&task.task_name),
                id = task.id,
            )
        })
        .collect();

    format!("<ul>\n{}</ul>", items)
}

fn task_form(editing: Option<&Task>) -> String {
    let (heading, action, name, description, submit, cancel) = match editing {
        Some(task) => (
            "Edit task",
            format!("/tasks/{}", task.id),
            escape(&task.task_name),
            escape(task.description()),
            "Save",
            "<a href=\"/\">Cancel</a>",
        ),
        None => (
            "New task",
            "/tasks".to_string(),
            String::new(),
            String::new(),
            "Create",
            "",
        ),
    };

    format!(
        "<section>\n<h2>{heading}</h2>\n<form method=\"post\" action=\"{action}\">\n\
         <label>Name <input type=\"text\" name=\"task_name\" value=\"{name}\" required maxlength=\"{MAX_NAME_LEN}\"></label>\n\
         <label>Description <textarea name=\"task_description\" maxlength=\"{MAX_DESCRIPTION_LEN}\">{description}</textarea></label>\n\
         <button type=\"submit\">{submit}</button> {cancel}\n</form>\n</section>"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn task(id: i64, name: &str, description: Option<&str>) -> Task {
        Task {
            id,
            created_at: Utc::now(),
            user_id: None,
            task_name: name.to_string(),
            task_description: description.map(str::to_string),
        }
    }

    #[test]
    fn test_dashboard_lists_tasks() {
        let tasks = vec![task(1, "A", Some("x")), task(2, "<script>", None)];
        let html = render(&Dashboard {
            email: "user@example.com",
            tasks: Some(tasks.as_slice()),
            editing: None,
            flash: None,
        });

        assert!(html.contains("user@example.com"));
        assert!(html.contains(r#"action="/logout""#));
        assert!(html.contains("<strong>A</strong>"));
        assert!(html.contains("<small>x</small>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains(r#"action="/tasks/2/delete""#));
        assert!(html.contains(r#"action="/tasks""#));
        assert!(html.contains("New task"));
    }

    #[test]
    fn test_dashboard_edit_form_is_prefilled() {
        let tasks = vec![task(7, "Write \"report\"", Some("draft"))];
        let html = render(&Dashboard {
            email: "user@example.com",
            tasks: Some(tasks.as_slice()),
            editing: Some(&tasks[0]),
            flash: None,
        });

        assert!(html.contains(r#"action="/tasks/7""#));
        assert!(html.contains(r#"value="Write &quot;report&quot;""#));
        assert!(html.contains(">draft</textarea>"));
        assert!(html.contains("(editing)"));
    }

    #[test]
    fn test_dashboard_failed_read() {
        let html = render(&Dashboard {
            email: "user@example.com",
            tasks: None,
            editing: None,
            flash: None,
        });

        assert!(html.contains("Could not load your tasks"));
    }

    #[test]
    fn test_dashboard_empty_list() {
        let html = render(&Dashboard {
            email: "user@example.com",
            tasks: Some(&[]),
            editing: None,
            flash: Some(&Flash::success("Task deleted")),
        });

        assert!(html.contains("No tasks yet."));
        assert!(html.contains("Task deleted"));
    }
}
