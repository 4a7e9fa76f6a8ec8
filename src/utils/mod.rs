//! Utility functions.

use crate::database::models::ChatUser;

/// Fill a welcome/goodbye template for `user`.
///
/// Supported placeholders:
/// - `{name}` - display name
/// - `{username}` - `@handle`, or the display name when there is no handle
///
/// Any other `{...}` sequence is left untouched. Substituted values are
/// never scanned again.
pub fn render(template: &str, user: &ChatUser) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];

        if let Some(after) = tail.strip_prefix("{name}") {
            out.push_str(&user.first_name);
            rest = after;
        } else if let Some(after) = tail.strip_prefix("{username}") {
            out.push_str(&user.handle());
            rest = after;
        } else {
            out.push('{');
            rest = &tail[1..];
        }
    }

    out.push_str(rest);
    out
}

/// Shorten text for log lines, on a char boundary.
pub fn preview(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
