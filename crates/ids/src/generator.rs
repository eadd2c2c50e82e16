//! Identifier generator implementations.

use crate::{IdError, IdResult};
use chrono::{DateTime, Duration, SubsecRound, Utc};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Source of fresh entity identifiers.
///
/// Implementations are total: they never fail, and two calls on the same generator never return
/// the same value.
pub trait IdGenerator: Send + Sync {
    /// Returns a new identifier starting with `prefix`.
    fn new_id(&self, prefix: &str) -> String;
}

fn join(prefix: &str, value: impl fmt::Display) -> String {
    if prefix.is_empty() {
        value.to_string()
    } else {
        format!("{prefix}-{value}")
    }
}

/// Generates `<prefix>-<uuid>` identifiers from random v4 UUIDs.
///
/// The UUID is rendered in simple form (32 lowercase hex characters, no hyphens).
#[derive(Clone, Copy, Debug, Default)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn new_id(&self, prefix: &str) -> String {
        join(prefix, uuid::Uuid::new_v4().simple())
    }
}

/// Generates `<prefix>-<timestamp>` identifiers.
///
/// Format of the timestamp part: `YYYYMMDDTHHMMSS.mmmZ`, for example
/// `20260111T143522.045Z`.
///
/// # Monotonicity
///
/// The generator remembers the last timestamp it issued. When the clock has not advanced past it
/// (two calls inside the same millisecond, or a clock step backwards) the previous timestamp plus
/// one millisecond is used instead, so identifiers from one generator never collide.
#[derive(Debug, Default)]
pub struct TimestampIdGenerator {
    last: Mutex<Option<DateTime<Utc>>>,
}

impl TimestampIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next timestamp, strictly greater than any previously issued one.
    fn next_timestamp(&self) -> DateTime<Utc> {
        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        let now = Utc::now().trunc_subsecs(3);

        let timestamp = match *last {
            Some(prev) if now <= prev => prev + Duration::milliseconds(1),
            _ => now,
        };
        *last = Some(timestamp);
        timestamp
    }
}

impl IdGenerator for TimestampIdGenerator {
    fn new_id(&self, prefix: &str) -> String {
        let timestamp = self.next_timestamp();
        join(prefix, timestamp.format("%Y%m%dT%H%M%S%.3fZ"))
    }
}

/// Generates `<prefix>-<n>` identifiers from a process-local counter starting at 1.
#[derive(Debug)]
pub struct CounterIdGenerator {
    next: AtomicU64,
}

impl CounterIdGenerator {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    /// Creates a counter whose first identifier uses `first`.
    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }
}

impl Default for CounterIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator for CounterIdGenerator {
    fn new_id(&self, prefix: &str) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        join(prefix, n)
    }
}

/// Identifier scheme selected at startup.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum IdStrategy {
    #[default]
    Uuid,
    Timestamp,
    Counter,
}

impl IdStrategy {
    /// Builds a shareable generator for this strategy.
    pub fn build(self) -> Arc<dyn IdGenerator> {
        match self {
            IdStrategy::Uuid => Arc::new(UuidIdGenerator),
            IdStrategy::Timestamp => Arc::new(TimestampIdGenerator::new()),
            IdStrategy::Counter => Arc::new(CounterIdGenerator::new()),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IdStrategy::Uuid => "uuid",
            IdStrategy::Timestamp => "timestamp",
            IdStrategy::Counter => "counter",
        }
    }
}

impl fmt::Display for IdStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IdStrategy {
    type Err = IdError;

    /// Parses `uuid`, `timestamp` or `counter` (case-insensitive, surrounding whitespace ignored).
    fn from_str(s: &str) -> IdResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "uuid" => Ok(IdStrategy::Uuid),
            "timestamp" => Ok(IdStrategy::Timestamp),
            "counter" => Ok(IdStrategy::Counter),
            _ => Err(IdError::InvalidInput(format!(
                "id strategy must be one of uuid, timestamp, counter; got '{}'",
                s
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn assert_unique(generator: &dyn IdGenerator, count: usize) {
        let ids: HashSet<String> = (0..count).map(|_| generator.new_id("dx")).collect();
        assert_eq!(ids.len(), count);
    }

    #[test]
    fn uuid_ids_carry_prefix_and_simple_uuid() {
        let id = UuidIdGenerator.new_id("role");
        let (prefix, rest) = id.split_once('-').unwrap();

        assert_eq!(prefix, "role");
        assert_eq!(rest.len(), 32);
        assert!(rest.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')));
    }

    #[test]
    fn uuid_ids_are_unique() {
        assert_unique(&UuidIdGenerator, 1_000);
    }

    #[test]
    fn timestamp_ids_are_unique_within_one_millisecond() {
        // Far more calls than milliseconds elapse, forcing the monotonic bump.
        assert_unique(&TimestampIdGenerator::new(), 1_000);
    }

    #[test]
    fn timestamp_ids_strictly_increase() {
        let generator = TimestampIdGenerator::new();
        let first = generator.next_timestamp();
        let second = generator.next_timestamp();

        assert!(second > first);
        assert!(second - first >= Duration::milliseconds(1));
    }

    #[test]
    fn timestamp_id_format() {
        let id = TimestampIdGenerator::new().new_id("tpl");
        let stamp = id.strip_prefix("tpl-").unwrap();

        assert!(stamp.ends_with('Z'));
        assert_eq!(stamp.len(), "20260111T143522.045Z".len());
        assert!(chrono::NaiveDateTime::parse_from_str(
            &stamp[..stamp.len() - 1],
            "%Y%m%dT%H%M%S%.3f"
        )
        .is_ok());
    }

    #[test]
    fn counter_ids_count_from_one() {
        let generator = CounterIdGenerator::new();
        assert_eq!(generator.new_id("perm"), "perm-1");
        assert_eq!(generator.new_id("perm"), "perm-2");
        assert_eq!(generator.new_id("role"), "role-3");
    }

    #[test]
    fn empty_prefix_yields_bare_value() {
        let generator = CounterIdGenerator::starting_at(42);
        assert_eq!(generator.new_id(""), "42");
    }

    #[test]
    fn strategy_parses_case_insensitively() {
        assert_eq!("UUID".parse::<IdStrategy>().unwrap(), IdStrategy::Uuid);
        assert_eq!(" timestamp ".parse::<IdStrategy>().unwrap(), IdStrategy::Timestamp);
        assert_eq!("Counter".parse::<IdStrategy>().unwrap(), IdStrategy::Counter);
    }

    #[test]
    fn strategy_rejects_unknown_values() {
        match "snowflake".parse::<IdStrategy>() {
            Err(IdError::InvalidInput(msg)) => assert!(msg.contains("snowflake")),
            other => panic!("expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn built_generators_are_usable_across_threads() {
        let generator = IdStrategy::Counter.build();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let generator = Arc::clone(&generator);
                std::thread::spawn(move || {
                    (0..100).map(|_| generator.new_id("x")).collect::<Vec<_>>()
                })
            })
            .collect();

        let mut all = HashSet::new();
        for handle in handles {
            all.extend(handle.join().unwrap());
        }
        assert_eq!(all.len(), 400);
    }

    #[test]
    fn strategy_serialises_lowercase() {
        assert_eq!(
            serde_json::to_string(&IdStrategy::Timestamp).unwrap(),
            "\"timestamp\""
        );
    }
}
