//! Persona message rules: title pattern, body budget, canned fallbacks.
//!
//! Notifications read as if sent by a named character, never by "the app"
//! or an assistant. Everything the generation service returns is forced
//! through these rules; anything that fails is replaced wholesale by the
//! canned fallback for the day's notification type.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::classifier::NotificationType;

/// Maximum body length in characters after normalization.
pub const BODY_CHAR_BUDGET: usize = 120;

/// Appended when truncation strips every emoji from the body.
pub const DEFAULT_EMOJI: char = '🌸';

/// Most words a persona name may contain.
const MAX_TITLE_WORDS: usize = 3;

/// Words that break the persona voice. Matched case-insensitively against
/// whole words so names like "Maiden" stay valid.
const FORBIDDEN_TITLE_WORDS: &[&str] = &["ai", "assistant", "bot", "model", "system", "llm"];

/// A validated notification message.
///
/// Construction goes through [`PersonaMessage::new`]; a value of this type
/// always satisfies the title pattern and the body budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonaMessage {
    /// Persona name: 1-3 capitalized words, no self-references.
    pub title: String,
    /// Single-line body within [`BODY_CHAR_BUDGET`], carrying an emoji.
    pub body: String,
}

impl PersonaMessage {
    /// Validates and normalizes a candidate message.
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Result<Self, MessageError> {
        let title = title.into();
        validate_title(&title)?;

        let body = body.into();
        if body.trim().is_empty() {
            return Err(MessageError::EmptyBody);
        }

        Ok(Self {
            title,
            body: normalize_body(&body),
        })
    }
}

/// Reasons a generated message is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageError {
    #[error("title is empty")]
    EmptyTitle,

    #[error("title '{title}' does not match the persona name pattern")]
    TitlePattern { title: String },

    #[error("title '{title}' contains forbidden substring '{found}'")]
    ForbiddenReference { title: String, found: String },

    #[error("body is empty")]
    EmptyBody,
}

/// Checks the persona-name pattern: 1-3 words, each starting with an
/// uppercase letter, no forbidden self-references.
pub fn validate_title(title: &str) -> Result<(), MessageError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(MessageError::EmptyTitle);
    }

    let lowered = trimmed.to_lowercase();
    for forbidden in FORBIDDEN_TITLE_WORDS {
        if lowered
            .split(|c: char| !c.is_alphanumeric())
            .any(|word| word == *forbidden)
        {
            return Err(MessageError::ForbiddenReference {
                title: trimmed.to_string(),
                found: (*forbidden).to_string(),
            });
        }
    }

    let words: Vec<&str> = trimmed.split_whitespace().collect();
    if words.len() > MAX_TITLE_WORDS || !words.iter().all(|w| is_capitalized_word(w)) {
        return Err(MessageError::TitlePattern {
            title: trimmed.to_string(),
        });
    }

    Ok(())
}

fn is_capitalized_word(word: &str) -> bool {
    let mut chars = word.chars();
    let leads_uppercase = chars.next().is_some_and(|c| c.is_uppercase());
    leads_uppercase && chars.all(|c| c.is_alphabetic() || c == '\'' || c == '.' || c == '-')
}

/// Collapses the body to a single line, enforces the character budget with
/// a trailing ellipsis when cut, and guarantees one emoji survives.
pub fn normalize_body(raw: &str) -> String {
    let single_line = raw.split_whitespace().collect::<Vec<_>>().join(" ");

    let truncated = single_line.chars().count() > BODY_CHAR_BUDGET;
    let mut body = if truncated {
        single_line.chars().take(BODY_CHAR_BUDGET - 1).collect()
    } else {
        single_line
    };

    if !contains_emoji(&body) {
        // Keep room inside the budget for the glyph, its separator, and the
        // truncation marker when one is owed.
        let reserved = if truncated { 3 } else { 2 };
        while body.chars().count() > BODY_CHAR_BUDGET - reserved {
            body.pop();
        }
        if truncated {
            body.push('…');
        }
        if !body.is_empty() {
            body.push(' ');
        }
        body.push(DEFAULT_EMOJI);
    } else if truncated {
        body.push('…');
    }

    body
}

/// True when the text contains at least one emoji glyph.
///
/// Covers the emoji-dominant Unicode blocks: miscellaneous symbols,
/// dingbats, and the supplementary symbol planes.
pub fn contains_emoji(text: &str) -> bool {
    text.chars().any(|c| {
        matches!(
            u32::from(c),
            0x2600..=0x27BF | 0x1F000..=0x1FAFF | 0x2B00..=0x2BFF
        )
    })
}

/// Pre-approved fallback per notification type. Used verbatim whenever the
/// generation service fails or its reply breaks the rules above; must never
/// itself fail validation.
static CANNED_MESSAGES: Lazy<HashMap<NotificationType, PersonaMessage>> = Lazy::new(|| {
    let mut table = HashMap::new();
    table.insert(
        NotificationType::PeriodStart,
        PersonaMessage {
            title: "Luna".to_string(),
            body: "Your period is due today. Take it slow and keep your favorites close 🌷".to_string(),
        },
    );
    table.insert(
        NotificationType::PeriodForecast,
        PersonaMessage {
            title: "Luna".to_string(),
            body: "Your next period is just a few days away. A little planning now helps later 🌙".to_string(),
        },
    );
    table.insert(
        NotificationType::OvulationDay,
        PersonaMessage {
            title: "Luna".to_string(),
            body: "Today is your predicted ovulation day. Listen to what your body tells you 🌕".to_string(),
        },
    );
    table.insert(
        NotificationType::FertileWindow,
        PersonaMessage {
            title: "Luna".to_string(),
            body: "You are in your fertile window right now. Good days to pay attention 🌱".to_string(),
        },
    );
    table
});

/// The canned fallback for a notification type.
pub fn fallback_for(notification_type: NotificationType) -> &'static PersonaMessage {
    &CANNED_MESSAGES[&notification_type]
}
