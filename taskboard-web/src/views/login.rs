/// Login page
///
/// One page with two forms posting to `/login` and `/signup`.

use super::{escape, flash, layout};
use crate::session::Flash;

/// Renders the login page
pub fn render(notice: Option<&Flash>) -> String {
    let content = format!(
        r#"<h1>Taskboard</h1>
{flash}
<section>
<h2>Sign in</h2>
<form method="post" action="/login">
<label>Email <input type="email" name="email" required autocomplete="username"></label>
<label>Password <input type="password" name="password" required autocomplete="current-password"></label>
<button type="submit">Sign in</button>
</form>
</section>
<section>
<h2>Create an account</h2>
<form method="post" action="/signup">
<label>Email <input type="email" name="email" required autocomplete="username"></label>
<label>Password <input type="password" name="password" required minlength="6" autocomplete="new-password"></label>
<button type="submit">Sign up</button>
</form>
</section>"#,
        flash = flash(notice),
    );

    layout("Sign in", &content)
}

/// Renders a message page for pending email confirmation
pub fn confirmation_sent(email: &str) -> String {
    let content = format!(
        "<h1>Check your email</h1>\n<p>We sent a confirmation link to <strong>{}</strong>. \
         Follow it, then <a href=\"/login\">sign in</a>.</p>",
        escape(email)
    );

    layout("Check your email", &content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_page_has_both_forms() {
        let html = render(None);
        assert!(html.contains(r#"action="/login""#));
        assert!(html.contains(r#"action="/signup""#));
        assert!(!html.contains(r#"role="status""#));
    }

    #[test]
    fn test_login_page_shows_flash() {
        let html = render(Some(&Flash::error("Invalid login credentials")));
        assert!(html.contains("Invalid login credentials"));
    }

    #[test]
    fn test_confirmation_page_escapes_email() {
        let html = confirmation_sent("<x>@example.com");
        assert!(html.contains("&lt;x&gt;@example.com"));
    }
}
