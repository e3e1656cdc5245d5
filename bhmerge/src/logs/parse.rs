//! Tokenizer for `blackhole_details` log shards.
//!
//! A merger line looks like
//!
//! ```text
//! ThisTask=3 a=0.180000: id=100 swallows 200 (5.0, 3.0)
//! ```
//!
//! Fields sit at fixed offsets from the `swallows` marker word; each one is
//! stripped of the surrounding `= : ( ) ,` syntax.

use tracing::warn;

use super::types::{LineError, MergerEvent, MergerTokens};

pub const MARKER: &str = "swallows";
pub const DELIMITERS: [char; 5] = ['=', ':', '(', ')', ','];

// word offsets relative to the marker
const TIME_AT: isize = -2;
const PRIMARY_ID_AT: isize = -1;
const SECONDARY_ID_AT: isize = 1;
const MASS_GROUP_AT: isize = 2;

/// One log shard: its name (for diagnostics) and full text.
#[derive(Debug, Clone, Copy)]
pub struct LogShard<'a> {
    pub name: &'a str,
    pub contents: &'a str,
}

fn word_at<'a>(
    words: &[&'a str],
    marker: usize,
    offset: isize,
    field: &'static str,
) -> Result<&'a str, LineError> {
    marker
        .checked_add_signed(offset)
        .and_then(|i| words.get(i))
        .copied()
        .ok_or(LineError::MissingField(field))
}

/// Last non-empty piece once the delimiters are removed: `a=0.18:` -> `0.18`.
fn field_value(word: &str, field: &'static str) -> Result<String, LineError> {
    word.split(DELIMITERS)
        .filter(|p| !p.is_empty())
        .last()
        .map(str::to_string)
        .ok_or(LineError::EmptyValue(field))
}

/// `(m1, m2)` or `(m1,m2)`, possibly spread over several words.
fn mass_group(words: &[&str]) -> Result<(String, String), LineError> {
    match words.first() {
        Some(w) if w.starts_with('(') => {}
        _ => return Err(LineError::MissingField("mass group")),
    }
    let close = words
        .iter()
        .position(|w| w.contains(')'))
        .ok_or(LineError::UnterminatedGroup)?;

    // comma-separated slots between '(' and the first ')'
    let group = words[..=close].join(" ");
    let inner = group[1..].split(')').next().unwrap_or_default();
    let mut slots = inner
        .split(',')
        .map(|s| s.trim_matches(|c: char| c.is_whitespace() || DELIMITERS.contains(&c)));
    let mut slot = |field| {
        slots
            .next()
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .ok_or(LineError::EmptyValue(field))
    };
    let primary = slot("primary mass")?;
    let secondary = slot("secondary mass")?;
    Ok((primary, secondary))
}

/// `Ok(None)` when the line carries no marker, `Err` when it does but the
/// fields cannot be extracted.
pub fn parse_line(line: &str) -> Result<Option<MergerTokens>, LineError> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let Some(at) = words.iter().position(|w| *w == MARKER) else {
        return Ok(None);
    };

    let time = field_value(word_at(&words, at, TIME_AT, "time")?, "time")?;
    let primary_id = field_value(word_at(&words, at, PRIMARY_ID_AT, "primary id")?, "primary id")?;
    let secondary_id = word_at(&words, at, SECONDARY_ID_AT, "secondary id")?.to_string();
    word_at(&words, at, MASS_GROUP_AT, "mass group")?;
    let (primary_mass, secondary_mass) = mass_group(&words[at + MASS_GROUP_AT as usize..])?;

    Ok(Some(MergerTokens {
        time,
        primary_id,
        secondary_id,
        primary_mass,
        secondary_mass,
    }))
}

/// Tokens from every qualifying line, shard by shard, line by line.
/// Malformed lines are logged and skipped.
pub fn parse<'a>(shards: impl IntoIterator<Item = LogShard<'a>>) -> Vec<MergerTokens> {
    let mut out = Vec::new();
    for shard in shards {
        for (lineno, line) in shard.contents.lines().enumerate() {
            match parse_line(line) {
                Ok(Some(tokens)) => out.push(tokens),
                Ok(None) => {}
                Err(err) => warn!("[logs] {}:{}: skipping line ({err})", shard.name, lineno + 1),
            }
        }
    }
    out
}

/// Numeric form of `tokens`; entries that do not convert are logged and dropped.
pub fn to_events(tokens: &[MergerTokens]) -> Vec<MergerEvent> {
    tokens
        .iter()
        .filter_map(|t| match MergerEvent::try_from(t) {
            Ok(ev) => Some(ev),
            Err(err) => {
                warn!("[logs] dropping merger {} swallows {}: {err}", t.primary_id, t.secondary_id);
                None
            }
        })
        .collect()
}
