// Version identifiers: `2024-01-15T10-30-45.123456Z-k3f9`.
//
// The timestamp half is ISO 8601 with `:` replaced by `-` so the id is a
// valid file stem everywhere; the 4-char suffix keeps ids from separate
// processes distinct within the same microsecond.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, NaiveDateTime, Utc};
use rand::Rng;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H-%M-%S%.6fZ";
const PARSE_FORMAT: &str = "%Y-%m-%dT%H-%M-%S%.fZ";
const SUFFIX_LEN: usize = 4;
const SUFFIX_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// File extension for stored snapshots.
pub const VERSION_FILE_EXT: &str = "md";

static DEFAULT_GENERATOR: VersionIdGenerator = VersionIdGenerator::new();

/// A freshly minted id and the instant it encodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionStamp {
    pub id: String,
    pub timestamp: DateTime<Utc>,
}

/// Issues strictly increasing ids.
///
/// When the wall clock has not advanced (or stepped backwards) since the last
/// id, the new timestamp is bumped one microsecond past the previous one.
#[derive(Debug, Default)]
pub struct VersionIdGenerator {
    last_micros: AtomicI64,
}

impl VersionIdGenerator {
    pub const fn new() -> Self {
        Self { last_micros: AtomicI64::new(i64::MIN) }
    }

    pub fn next(&self) -> VersionStamp {
        self.next_at(Utc::now())
    }

    pub fn next_at(&self, now: DateTime<Utc>) -> VersionStamp {
        let candidate = now.timestamp_micros();
        let mut previous = self.last_micros.load(Ordering::Acquire);
        let micros = loop {
            let next = candidate.max(previous.saturating_add(1));
            match self.last_micros.compare_exchange_weak(
                previous,
                next,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => break next,
                Err(actual) => previous = actual,
            }
        };

        let timestamp = DateTime::from_timestamp_micros(micros).unwrap_or(now);
        VersionStamp { id: format_id(timestamp, &random_suffix()), timestamp }
    }
}

/// Generate an id from the process-wide generator.
pub fn generate_id() -> VersionStamp {
    DEFAULT_GENERATOR.next()
}

/// Recover the creation instant from an id. `None` for anything malformed.
pub fn parse_id(id: &str) -> Option<DateTime<Utc>> {
    let (stamp, suffix) = id.rsplit_once('-')?;
    if suffix.len() != SUFFIX_LEN || !suffix.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return None;
    }
    NaiveDateTime::parse_from_str(stamp, PARSE_FORMAT).ok().map(|naive| naive.and_utc())
}

/// `<id>.md`
pub fn version_file_name(id: &str) -> String {
    format!("{id}.{VERSION_FILE_EXT}")
}

/// Extract the id from a snapshot file name, if the name is one.
pub fn id_from_file_name(name: &str) -> Option<&str> {
    let stem = name.strip_suffix(VERSION_FILE_EXT)?.strip_suffix('.')?;
    parse_id(stem).map(|_| stem)
}

pub fn is_version_file_name(name: &str) -> bool {
    id_from_file_name(name).is_some()
}

fn format_id(timestamp: DateTime<Utc>, suffix: &str) -> String {
    format!("{}-{suffix}", timestamp.format(TIMESTAMP_FORMAT))
}

fn random_suffix() -> String {
    let mut rng = rand::thread_rng();
    (0..SUFFIX_LEN)
        .map(|_| char::from(SUFFIX_ALPHABET[rng.gen_range(0..SUFFIX_ALPHABET.len())]))
        .collect()
}
