// ============================
// crates/backend-lib/src/views.rs
// ============================
//! HTML views. Deliberately plain; every page gets the signed-in identity
//! (if any) so the navigation can greet the user.
use axum::response::Html;
use warden_common::{routes, IdentitySummary};

/// Escape text for inclusion in HTML element content or attribute values
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

fn layout(title: &str, current: Option<&IdentitySummary>, body: &str) -> Html<String> {
    let nav = match current {
        Some(identity) => format!(
            r#"<span class="user">Signed in as {}</span> <a href="{}">Profile</a> <a href="{}">Log out</a>"#,
            escape(&identity.display_name),
            routes::PROFILE,
            routes::LOGOUT,
        ),
        None => format!(r#"<a href="{}">Log in</a>"#, routes::LOGIN),
    };
    Html(format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>{}</title></head>\
         <body><nav><a href=\"{}\">Home</a> {nav}</nav><main>{body}</main></body></html>",
        escape(title),
        routes::INDEX,
    ))
}

pub fn index(current: Option<&IdentitySummary>) -> Html<String> {
    layout("Welcome", current, "<h1>Welcome</h1>")
}

pub fn login(current: Option<&IdentitySummary>, messages: &[String]) -> Html<String> {
    let errors: String = messages
        .iter()
        .map(|message| format!(r#"<li class="error">{}</li>"#, escape(message)))
        .collect();
    let errors = if errors.is_empty() {
        String::new()
    } else {
        format!(r#"<ul class="errors">{errors}</ul>"#)
    };
    let body = format!(
        r#"<h1>Log in</h1>{errors}<form method="post" action="{}">
<label>Login <input type="text" name="login" autocomplete="username"></label>
<label>Password <input type="password" name="password" autocomplete="current-password"></label>
<button type="submit">Log in</button>
</form>"#,
        routes::LOGIN
    );
    layout("Log in", current, &body)
}

pub fn profile(identity: &IdentitySummary) -> Html<String> {
    let body = format!(
        r#"<h1>Profile</h1><dl><dt>Name</dt><dd>{}</dd><dt>Login</dt><dd>{}</dd><dt>Role</dt><dd>{}</dd></dl>"#,
        escape(&identity.display_name),
        escape(&identity.login),
        identity.role,
    );
    layout("Profile", Some(identity), &body)
}

pub fn admin(identity: &IdentitySummary) -> Html<String> {
    layout(
        "Administration",
        Some(identity),
        "<h1>Administration</h1><p>Only administrators can see this page.</p>",
    )
}

/// Fixed page shown when a signed-in identity lacks the required role
pub fn role_denied(current: Option<&IdentitySummary>) -> Html<String> {
    layout(
        "Not authorized",
        current,
        "<h1>Not authorized</h1><p>You do not have permission to view this page.</p>",
    )
}
