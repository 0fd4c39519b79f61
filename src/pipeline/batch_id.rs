//! Batch identifier generation.
//!
//! Identifiers are UTC ISO-8601 timestamps with microsecond precision
//! (`2026-10-14T09:30:00.123456Z`). The generator never hands out the same
//! microsecond twice: when the clock has not advanced past the last issued
//! value it issues `last + 1µs`. Issued ids are therefore unique and strictly
//! increasing, and lexicographic order equals issue order.

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use std::sync::atomic::{AtomicI64, Ordering};

/// Issues unique, strictly increasing batch ids. Safe to share across tasks.
#[derive(Debug, Default)]
pub struct BatchIdGenerator {
    last_micros: AtomicI64,
}

impl BatchIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next id based on the current wall clock.
    pub fn next_id(&self) -> String {
        self.next_at(Utc::now())
    }

    /// Next id for a given clock reading.
    pub fn next_at(&self, now: DateTime<Utc>) -> String {
        let now_micros = now.timestamp_micros();
        let mut issued = now_micros;
        // fetch_update only fails when the closure returns None, which it never does.
        let _ = self
            .last_micros
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| {
                issued = now_micros.max(last.saturating_add(1));
                Some(issued)
            });
        format_micros(issued)
    }
}

fn format_micros(micros: i64) -> String {
    Utc.timestamp_micros(micros)
        .single()
        .unwrap_or_default()
        .to_rfc3339_opts(SecondsFormat::Micros, true)
}
