//! Length limiting for sanitized content.
//!
//! Lengths are counted in chars (Unicode scalar values), never bytes. Input is
//! a `&str`, so it is already a valid scalar sequence. A cut that lands inside
//! a tag drops the partial tag, and an anchor left open by the cut gets one
//! closing `</a>`. The closing tag is budgeted inside the
//! limit, so the result never exceeds `max_chars`.
//!
//! Only a single open anchor is repaired. Two or more unterminated anchors in
//! the kept window still receive exactly one `</a>`. Sanitized input cannot
//! nest anchors, so the kept window holds at most one open anchor in practice.

const ANCHOR_OPEN: &str = "<a";
const ANCHOR_CLOSE: &str = "</a>";

pub fn safe_truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }

    let repaired = fix_broken_html(take_chars(s, max_chars));
    if !needs_anchor_close(&repaired) {
        return repaired;
    }
    if repaired.chars().count() + ANCHOR_CLOSE.len() <= max_chars {
        return repaired + ANCHOR_CLOSE;
    }

    // No room for the closing tag: cut shorter and repair again
    let budget = max_chars.saturating_sub(ANCHOR_CLOSE.len());
    let repaired = fix_broken_html(take_chars(s, budget));
    if needs_anchor_close(&repaired) {
        repaired + ANCHOR_CLOSE
    } else {
        repaired
    }
}

fn take_chars(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Drop a trailing partial tag (a `<` with no `>` after it).
fn fix_broken_html(s: &str) -> String {
    if let Some(last_open) = s.rfind('<') {
        let closed_after = s.rfind('>').is_some_and(|last_close| last_close > last_open);
        if !closed_after {
            return s[..last_open].to_string();
        }
    }
    s.to_string()
}

fn needs_anchor_close(s: &str) -> bool {
    s.matches(ANCHOR_OPEN).count() > s.matches(ANCHOR_CLOSE).count()
}
