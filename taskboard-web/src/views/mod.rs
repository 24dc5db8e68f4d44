/// Server-rendered HTML pages
///
/// Pages are plain HTML strings with no scripts. Every interpolated value goes
/// through [`escape`].
///
/// - [`login`]: sign-in and sign-up forms
/// - [`dashboard`]: task list with create, edit and delete forms

pub mod dashboard;
pub mod login;

use crate::session::{Flash, FlashKind};

const STYLE: &str = "body{font-family:system-ui,sans-serif;max-width:42rem;margin:2rem auto;padding:0 1rem}\
header{display:flex;justify-content:space-between;align-items:center}\
form.inline{display:inline}\
.flash{padding:.5rem .75rem;border-radius:4px}\
.flash.error{background:#fde8e8;color:#8a1c1c}\
.flash.success{background:#e6f6ea;color:#1c5e2c}\
li{margin:.5rem 0}\
input,textarea{display:block;width:100%;margin:.25rem 0 .75rem}";

/// Escapes text for use in element content and quoted attributes
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Wraps page content in the shared document shell
pub fn layout(title: &str, content: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{title} · Taskboard</title>\n<style>{STYLE}</style>\n</head>\n\
         <body>\n{content}\n</body>\n</html>\n",
        title = escape(title),
    )
}

/// Renders a pending flash message, or nothing
pub fn flash(flash: Option<&Flash>) -> String {
    match flash {
        Some(flash) => {
            let class = match flash.kind {
                FlashKind::Success => "success",
                FlashKind::Error => "error",
            };
            format!(
                "<p class=\"flash {}\" role=\"status\">{}</p>",
                class,
                escape(&flash.message)
            )
        }
        None => String::new(),
    }
}
