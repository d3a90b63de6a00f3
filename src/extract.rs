use crate::model::DetailRecord;

/// Candidates at or below this many characters are rejected.
const MIN_PROMPT_CHARS: usize = 20;

/// Pick the prompt text out of a tweet detail, in fixed priority order:
///
/// 1. first qualifying `altText` among the media entries
/// 2. the tweet's own `text`
/// 3. the quoted tweet's `text`
///
/// The order is a policy choice; callers must not reorder it. Returns `None`
/// when no candidate qualifies.
pub fn extract_prompt(detail: &DetailRecord) -> Option<String> {
    for media in &detail.media_extended {
        let alt = media.alt_text.trim();
        if qualifies(alt) {
            return Some(alt.to_string());
        }
    }

    let text = detail.text.trim();
    if qualifies(text) {
        return Some(text.to_string());
    }

    if let Some(qrt) = &detail.qrt {
        let quoted = qrt.text.trim();
        if qualifies(quoted) {
            return Some(quoted.to_string());
        }
    }

    None
}

fn qualifies(s: &str) -> bool {
    s.chars().count() > MIN_PROMPT_CHARS
}
