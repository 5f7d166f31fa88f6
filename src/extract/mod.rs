//! Payload extraction: free-text notification bodies into job candidates.
//!
//! Producers post embeds whose layout has drifted between versions, so every
//! sub-extraction degrades to a sentinel instead of failing the parse:
//!
//! 1. **Identifier** - first UUID-shaped token anywhere in the embed
//! 2. **Magnitude** - `$2.3M/s`, then `250/s`, then a field labelled as the value
//! 3. **Occupancy** - a `<current>/<max>` pair outside the magnitude text
//! 4. **Name** - the cleaned title, else the first description line
//!
//! An embed is accepted when any one of id, name, or value resolved. Embeds are
//! tried in order and the first accepted one wins.

pub mod payload;
pub mod strategies;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, trace};

use crate::types::{JobCandidate, UNKNOWN_NAME, UNKNOWN_PLAYERS, ZERO_VALUE};

pub use payload::{Embed, EmbedField, embeds_from_body};
pub use strategies::MagnitudeMatch;

/// No embed in the payload carried enough signal to become a job.
///
/// This is an ordinary outcome, reported to the producer as a rejection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionFailure {
    /// The body had no readable embeds at all.
    #[error("payload has no embeds")]
    NoEmbeds,

    /// Every embed was read but none resolved an id, a name, or a value.
    #[error("none of {embeds} embeds yielded a usable job")]
    NoSignal { embeds: usize },
}

/// Extracts a job candidate from a notification body.
///
/// # Examples
///
/// ```
/// use job_relay::extract::extract_job;
///
/// let body = serde_json::json!({
///     "embeds": [{
///         "title": "🔥 Giant Banana $2.3M/s",
///         "fields": [{ "name": "Job ID", "value": "12345678-1234-1234-1234-123456789abc" }]
///     }]
/// });
///
/// let job = extract_job(&body).unwrap();
/// assert_eq!(job.name, "Giant Banana");
/// assert_eq!(job.value, "2.3M/s");
/// ```
pub fn extract_job(body: &Value) -> Result<JobCandidate, ExtractionFailure> {
    let embeds = embeds_from_body(body);
    if embeds.is_empty() {
        return Err(ExtractionFailure::NoEmbeds);
    }

    for (index, embed) in embeds.iter().enumerate() {
        let candidate = extract_embed(embed);
        if candidate.has_signal() {
            debug!(
                embed = index,
                job_id = candidate.job_id.as_ref().map(|id| id.as_str()),
                name = %candidate.name,
                value = %candidate.value,
                players = %candidate.players,
                "Embed yielded a job"
            );
            return Ok(candidate);
        }
        trace!(embed = index, "Embed rejected, no usable signal");
    }

    Err(ExtractionFailure::NoSignal {
        embeds: embeds.len(),
    })
}

/// Runs every field extractor over one embed.
///
/// Always returns a candidate; fields that could not be found hold sentinels.
pub fn extract_embed(embed: &Embed) -> JobCandidate {
    let text = embed.search_text();

    let job_id = strategies::identifier(&text);
    let magnitude = strategies::magnitude(embed, &text);
    let raw_magnitude = magnitude.as_ref().map(|m| m.raw.as_str());
    let players = strategies::occupancy(&text, raw_magnitude);
    let name = strategies::name(embed, raw_magnitude);

    JobCandidate {
        job_id,
        name: name.unwrap_or_else(|| UNKNOWN_NAME.to_string()),
        players: players.unwrap_or_else(|| UNKNOWN_PLAYERS.to_string()),
        value: magnitude
            .map(|m| m.value)
            .unwrap_or_else(|| ZERO_VALUE.to_string()),
    }
}
