//! Per-field extraction strategies.
//!
//! Each strategy looks at one embed independently and either finds its field or
//! returns `None`. Where a field has several strategies they are listed in
//! priority order in a const slice and combined first-match-wins, so the
//! ambiguity policy can be read off the slice and each strategy tested alone.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

use crate::types::JobId;

use super::payload::Embed;

/// A UUID not flanked by further hex digits. Underscores and letters may touch
/// it (`__uuid__`, `id_uuid`); the id itself is capture group 1.
static UUID_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile(
        r"(?i)(?:^|[^0-9a-f])([0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12})(?:[^0-9a-f]|$)",
    )
});

/// `$2.3M/s`, `1.5 k/s`, `$ 10B/s`.
static SUFFIXED_RATE_RE: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?i)(?:\$[ \t]*)?\d+(?:\.\d+)?[ \t]*[KMBT][ \t]*/s"));

/// `250/s`, `$12.5/s`.
static BARE_RATE_RE: LazyLock<Regex> = LazyLock::new(|| compile(r"(?:\$[ \t]*)?\d+(?:\.\d+)?/s"));

/// A number with an optional magnitude suffix, used on labelled field values.
static LABELLED_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?i)(\d+(?:\.\d+)?)([KMBT])?"));

static OCCUPANCY_RE: LazyLock<Regex> = LazyLock::new(|| compile(r"(\d+)[ \t]*/[ \t]*(\d+)"));

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|err| panic!("invalid extractor regex {pattern}: {err}"))
}

/// Field labels (lowercased substrings) that mark a field as holding the value.
const VALUE_LABELS: &[&str] = &["value", "valor", "money", "income", "💰"];

/// Glyphs producers put in front of titles.
const DECORATIVE_GLYPHS: &[char] = &[
    '🔥', '💎', '⭐', '🚨', '☯', '✨', '🌟', '⚡', '🎯', '\u{FE0F}',
];

/// Separator characters left dangling once a magnitude is cut out of a label.
const TRAILING_SEPARATORS: &[char] = &['-', '|', ':', '•', '–', '—', ','];

/// Upper bound on a name taken from a description line.
pub const MAX_DESCRIPTION_NAME_CHARS: usize = 64;

/// A magnitude found in an embed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MagnitudeMatch {
    /// Normalized form, e.g. `2.3M/s`.
    pub value: String,
    /// The text as it appeared in the payload, e.g. `$2.3M/s`.
    pub raw: String,
}

/// A way of finding the magnitude in an embed, given its search text.
pub type MagnitudeStrategy = fn(&Embed, &str) -> Option<MagnitudeMatch>;

/// Magnitude strategies, highest priority first.
pub const MAGNITUDE_STRATEGIES: &[MagnitudeStrategy] =
    &[suffixed_rate, bare_rate, labelled_value_field];

/// A way of finding the name, given the raw magnitude text to cut out of it.
pub type NameStrategy = fn(&Embed, Option<&str>) -> Option<String>;

/// Name strategies, highest priority first.
pub const NAME_STRATEGIES: &[NameStrategy] = &[title_name, description_name];

/// Finds the first UUID-shaped token in the text, preserving its case.
pub fn identifier(text: &str) -> Option<JobId> {
    UUID_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| JobId::new(m.as_str()))
}

/// Runs the magnitude strategies in order and returns the first match.
pub fn magnitude(embed: &Embed, text: &str) -> Option<MagnitudeMatch> {
    MAGNITUDE_STRATEGIES
        .iter()
        .find_map(|strategy| strategy(embed, text))
}

/// `<number>[.<number>]<K|M|B|T>/s` anywhere in the text, with an optional `$`.
pub fn suffixed_rate(_embed: &Embed, text: &str) -> Option<MagnitudeMatch> {
    SUFFIXED_RATE_RE.find(text).map(|m| MagnitudeMatch {
        value: normalize_magnitude(m.as_str()),
        raw: m.as_str().to_string(),
    })
}

/// A bare `<number>/s` anywhere in the text.
pub fn bare_rate(_embed: &Embed, text: &str) -> Option<MagnitudeMatch> {
    BARE_RATE_RE.find(text).map(|m| MagnitudeMatch {
        value: normalize_magnitude(m.as_str()),
        raw: m.as_str().to_string(),
    })
}

/// A field labelled as the value holding a number with an optional suffix.
pub fn labelled_value_field(embed: &Embed, _text: &str) -> Option<MagnitudeMatch> {
    embed
        .fields
        .iter()
        .filter(|field| is_value_label(&field.name))
        .find_map(|field| {
            let cleaned = strip_markup(&field.value);
            let caps = LABELLED_NUMBER_RE.captures(&cleaned)?;
            let suffix = caps.get(2).map(|s| s.as_str()).unwrap_or("");
            Some(MagnitudeMatch {
                value: format!("{}{}/s", &caps[1], suffix.to_ascii_uppercase()),
                raw: field.value.trim().to_string(),
            })
        })
}

fn is_value_label(label: &str) -> bool {
    let label = label.to_lowercase();
    VALUE_LABELS.iter().any(|keyword| label.contains(keyword))
}

/// Strips emphasis markers, currency symbol and whitespace, uppercases the
/// suffix, and makes sure the result ends in `/s`.
pub fn normalize_magnitude(raw: &str) -> String {
    let compact = strip_markup(raw);
    let number = compact
        .strip_suffix("/s")
        .or_else(|| compact.strip_suffix("/S"))
        .unwrap_or(&compact);
    format!("{}/s", number.to_ascii_uppercase())
}

fn strip_markup(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, '*' | '_' | '`' | '$') && !c.is_whitespace())
        .collect()
}

/// Finds a `<current>/<max>` pair, ignoring the text already taken as the magnitude.
pub fn occupancy(text: &str, consumed: Option<&str>) -> Option<String> {
    let haystack = match consumed {
        Some(raw) if !raw.is_empty() => Cow::Owned(text.replacen(raw, &" ".repeat(raw.len()), 1)),
        _ => Cow::Borrowed(text),
    };
    let caps = OCCUPANCY_RE.captures(&haystack)?;
    Some(format!("{}/{}", &caps[1], &caps[2]))
}

/// Runs the name strategies in order and returns the first usable label.
pub fn name(embed: &Embed, magnitude_raw: Option<&str>) -> Option<String> {
    NAME_STRATEGIES
        .iter()
        .find_map(|strategy| strategy(embed, magnitude_raw))
}

/// The title, minus decoration and the magnitude text.
pub fn title_name(embed: &Embed, magnitude_raw: Option<&str>) -> Option<String> {
    clean_label(embed.title.as_deref()?, magnitude_raw)
}

/// The first non-blank description line, cleaned and truncated.
pub fn description_name(embed: &Embed, magnitude_raw: Option<&str>) -> Option<String> {
    let line = embed
        .description
        .as_deref()?
        .lines()
        .find(|line| !line.trim().is_empty())?;
    let label = clean_label(line, magnitude_raw)?;
    let truncated: String = label.chars().take(MAX_DESCRIPTION_NAME_CHARS).collect();
    let truncated = truncated.trim_end();
    (!truncated.is_empty()).then(|| truncated.to_string())
}

fn clean_label(raw: &str, magnitude_raw: Option<&str>) -> Option<String> {
    let label = match magnitude_raw {
        Some(m) if !m.is_empty() => raw.replacen(m, " ", 1),
        _ => raw.to_string(),
    };
    let label = label.replace("**", "").replace("__", "").replace('`', "");
    let label = label
        .trim_start_matches(|c: char| c.is_whitespace() || DECORATIVE_GLYPHS.contains(&c))
        .trim_end_matches(|c: char| c.is_whitespace() || TRAILING_SEPARATORS.contains(&c));
    let label = label.split_whitespace().collect::<Vec<_>>().join(" ");
    (!label.is_empty()).then_some(label)
}
