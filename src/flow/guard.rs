// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Input checks applied before text reaches a flow

use regex::Regex;
use std::sync::LazyLock;

const CANCEL_WORDS: &[&str] = &["/cancel", "cancel", "отмена", "закончить", "стоп"];

static SPAM_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"https?://",
        r"discord\.gg|t\.me|telegram",
        r"бесплатно|халява|скидка",
        r"\b(сука|бля|нахуй)\b",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

/// Whether the text asks to leave the current flow
pub fn is_cancel(text: &str) -> bool {
    let text = text.trim().to_lowercase();
    CANCEL_WORDS.contains(&text.as_str())
}

/// Links, invites, promo words, profanity, or a character repeated six times
pub fn is_spam(text: &str) -> bool {
    let text = text.to_lowercase();
    SPAM_PATTERNS.iter().any(|re| re.is_match(&text)) || has_repeated_run(&text, 6)
}

pub fn is_too_long(text: &str, limit: usize) -> bool {
    text.chars().count() > limit
}

// `regex` has no backreferences, so `(.)\1{5,}` is checked by hand.
fn has_repeated_run(text: &str, run: usize) -> bool {
    let mut prev = None;
    let mut count = 0;
    for c in text.chars() {
        if Some(c) == prev {
            count += 1;
        } else {
            prev = Some(c);
            count = 1;
        }
        if count >= run {
            return true;
        }
    }
    false
}
