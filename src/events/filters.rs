//! Content filters.
//!
//! Plain case-insensitive substring matching, checked in policy order.

use crate::database::models::Policy;

/// Substrings that mark a message as carrying a link.
const LINK_MARKERS: [&str; 4] = ["http://", "https://", "www.", "t.me/"];

/// First banned term contained in `text`, in policy insertion order.
pub fn match_banned_term<'a>(text: &str, policy: &'a Policy) -> Option<&'a str> {
    let text = text.to_lowercase();
    policy
        .banned_terms
        .iter()
        .find(|term| text.contains(&term.to_lowercase()))
        .map(String::as_str)
}

/// Response of the first-inserted trigger contained in `text`.
pub fn match_auto_response<'a>(text: &str, policy: &'a Policy) -> Option<&'a str> {
    let text = text.to_lowercase();
    policy
        .auto_responses
        .iter()
        .find(|entry| text.contains(&entry.trigger.to_lowercase()))
        .map(|entry| entry.response.as_str())
}

pub fn contains_link(text: &str) -> bool {
    let text = text.to_lowercase();
    LINK_MARKERS.iter().any(|marker| text.contains(marker))
}
