//! PersonaTextGenerator - validated message synthesis with canned fallback.
//!
//! Asks the text generation service for a two-field persona message,
//! defensively parses the reply, and forces it through the domain's message
//! rules. Every failure mode, from a dead service to a title that breaks
//! persona, ends in the canned fallback for the day's type, so this
//! component always produces a valid message and never returns an error.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::{
    fallback_for, Classification, CycleStats, MessageError, NotificationType, PersonaMessage,
    BODY_CHAR_BUDGET,
};
use crate::ports::{GenerationError, GenerationRequest, TextGenerator};

/// Per-run memoization table: one generation-service call per notification
/// type, no matter how many subscribers fan out afterwards.
///
/// Deliberately an explicit value owned by the dispatcher's run, not shared
/// state inside the generator.
#[derive(Debug, Default)]
pub struct MessageCache {
    messages: HashMap<NotificationType, PersonaMessage>,
}

impl MessageCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn get(&self, notification_type: NotificationType) -> Option<&PersonaMessage> {
        self.messages.get(&notification_type)
    }

    fn insert(&mut self, notification_type: NotificationType, message: PersonaMessage) {
        self.messages.insert(notification_type, message);
    }
}

/// Why a generated reply was discarded in favor of the canned fallback.
#[derive(Debug, Error)]
enum GenerateFailure {
    #[error(transparent)]
    Service(#[from] GenerationError),

    #[error("reply not parseable as a two-field message: {0}")]
    Parse(String),

    #[error(transparent)]
    Validation(#[from] MessageError),
}

/// Generates persona-styled notification text.
pub struct PersonaTextGenerator {
    service: Arc<dyn TextGenerator>,
}

impl PersonaTextGenerator {
    pub fn new(service: Arc<dyn TextGenerator>) -> Self {
        Self { service }
    }

    /// Returns the message for the day's classification, memoized in
    /// `cache`. Infallible: any generation or validation failure is logged
    /// and answered with the canned fallback for the type.
    pub async fn generate(
        &self,
        cache: &mut MessageCache,
        classification: &Classification,
        stats: &CycleStats,
    ) -> PersonaMessage {
        let notification_type = classification.notification_type;
        if let Some(cached) = cache.get(notification_type) {
            debug!(%notification_type, "message served from run cache");
            return cached.clone();
        }

        let message = match self.generate_fresh(classification, stats).await {
            Ok(message) => message,
            Err(failure) => {
                warn!(%notification_type, %failure, "falling back to canned message");
                fallback_for(notification_type).clone()
            }
        };

        cache.insert(notification_type, message.clone());
        message
    }

    async fn generate_fresh(
        &self,
        classification: &Classification,
        stats: &CycleStats,
    ) -> Result<PersonaMessage, GenerateFailure> {
        let request = GenerationRequest::new(build_prompt(classification, stats))
            .with_response_shape(r#"{"title": string, "body": string}"#)
            .with_max_tokens(256);

        let reply = self.service.complete(request).await?;
        let raw = parse_reply(&reply)?;

        Ok(PersonaMessage::new(raw.title, raw.body)?)
    }
}

/// Builds the type-specific instruction, embedding day counts and
/// human-readable dates from the computed stats.
fn build_prompt(classification: &Classification, stats: &CycleStats) -> String {
    let preamble = format!(
        "You are Luna, a warm and slightly playful friend who helps with \
         cycle tracking. Write one short push notification (at most {BODY_CHAR_BUDGET} \
         characters, one line, include an emoji). Never mention being an AI, \
         assistant, bot or app. Reply with JSON only: \
         {{\"title\": \"<your persona name, 1-3 capitalized words>\", \"body\": \"<the message>\"}}."
    );

    let situation = match classification.notification_type {
        NotificationType::PeriodStart => format!(
            "Her period is predicted to start today, {}.",
            human_date(stats.next_period_date)
        ),
        NotificationType::PeriodForecast => format!(
            "Her next period is predicted in {} day(s), on {}.",
            classification.days_until_period,
            human_date(stats.next_period_date)
        ),
        NotificationType::OvulationDay => format!(
            "Today, {}, is her predicted ovulation day.",
            human_date(stats.ovulation_date)
        ),
        NotificationType::FertileWindow => format!(
            "She is in her fertile window ({} through {}), with ovulation predicted in {} day(s).",
            human_date(stats.fertile_start),
            human_date(stats.fertile_end),
            classification.days_until_ovulation
        ),
    };

    format!("{preamble}\n\nSituation: {situation}")
}

fn human_date(date: chrono::NaiveDate) -> String {
    date.format("%B %-d").to_string()
}

/// The two-field structure we ask the service to return.
#[derive(Debug, Deserialize)]
struct RawReply {
    title: String,
    body: String,
}

/// Parses a service reply defensively.
///
/// Replies arrive wrapped in code fences or other formatting noise often
/// enough that we strip fences first and, failing that, take the outermost
/// brace-delimited object.
fn parse_reply(reply: &str) -> Result<RawReply, GenerateFailure> {
    let stripped = strip_code_fences(reply);

    if let Ok(raw) = serde_json::from_str::<RawReply>(stripped) {
        return Ok(raw);
    }

    let start = stripped.find('{');
    let end = stripped.rfind('}');
    if let (Some(start), Some(end)) = (start, end) {
        if start < end {
            if let Ok(raw) = serde_json::from_str::<RawReply>(&stripped[start..=end]) {
                return Ok(raw);
            }
        }
    }

    Err(GenerateFailure::Parse(truncate_for_log(reply)))
}

/// Removes a surrounding markdown code fence, including its info string.
fn strip_code_fences(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    match rest.find('\n') {
        Some(newline) => rest[newline + 1..].trim(),
        None => rest.trim_start_matches("json").trim(),
    }
}

fn truncate_for_log(reply: &str) -> String {
    reply.chars().take(80).collect()
}
