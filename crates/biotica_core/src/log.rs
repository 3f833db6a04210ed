//! Bounded ring buffer of structured domain events. Single-writer (the
//! kernel); readers get copies or bounded slices.

use biotica_data::{LogCategory, LogEntry, Severity};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

pub const LOG_CAPACITY: usize = 5000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLog {
    entries: VecDeque<LogEntry>,
    capacity: usize,
    next_id: u64,
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new(LOG_CAPACITY)
    }
}

impl EventLog {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(LOG_CAPACITY)),
            capacity: capacity.max(1),
            next_id: 0,
        }
    }

    pub fn push(&mut self, mut entry: LogEntry) -> u64 {
        let id = self.next_id;
        entry.id = id;
        self.next_id += 1;
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
        id
    }

    /// Convenience constructor for the common info-level case.
    pub fn record(
        &mut self,
        tick: u64,
        severity: Severity,
        category: LogCategory,
        message: impl Into<String>,
    ) -> u64 {
        self.push(LogEntry {
            id: 0,
            tick,
            time: wall_clock(),
            severity,
            category,
            message: message.into(),
            position: None,
            subject_id: None,
            faction_id: None,
            payload: None,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    /// Most recent entries first, filtered and paged. Returns copies.
    #[must_use]
    pub fn recent(
        &self,
        category: Option<LogCategory>,
        page: usize,
        limit: usize,
    ) -> Vec<LogEntry> {
        self.entries
            .iter()
            .rev()
            .filter(|e| category.map_or(true, |c| e.category == c))
            .skip(page.saturating_mul(limit))
            .take(limit)
            .cloned()
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    /// Rebuild from saved entries (oldest first).
    #[must_use]
    pub fn from_entries(entries: Vec<LogEntry>, next_id: u64, capacity: usize) -> Self {
        let mut log = Self::new(capacity);
        log.entries = entries.into();
        while log.entries.len() > log.capacity {
            log.entries.pop_front();
        }
        log.next_id = next_id;
        log
    }
}

/// Wall-clock stamp: log metadata only, never part of determinism hashes.
#[must_use]
pub fn wall_clock() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Builder-style helper for entries carrying position/subject/payload.
pub struct LogEvent {
    entry: LogEntry,
}

impl LogEvent {
    #[must_use]
    pub fn new(tick: u64, category: LogCategory, message: impl Into<String>) -> Self {
        Self {
            entry: LogEntry {
                id: 0,
                tick,
                time: wall_clock(),
                severity: Severity::Info,
                category,
                message: message.into(),
                position: None,
                subject_id: None,
                faction_id: None,
                payload: None,
            },
        }
    }

    #[must_use]
    pub fn severity(mut self, s: Severity) -> Self {
        self.entry.severity = s;
        self
    }

    #[must_use]
    pub fn at(mut self, x: u16, y: u16) -> Self {
        self.entry.position = Some((x, y));
        self
    }

    #[must_use]
    pub fn subject(mut self, id: impl Into<String>) -> Self {
        self.entry.subject_id = Some(id.into());
        self
    }

    #[must_use]
    pub fn faction(mut self, id: u32) -> Self {
        self.entry.faction_id = Some(id);
        self
    }

    #[must_use]
    pub fn payload(mut self, value: serde_json::Value) -> Self {
        self.entry.payload = Some(value);
        self
    }

    pub fn emit(self, log: &mut EventLog) -> u64 {
        log.push(self.entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_monotonic() {
        let mut log = EventLog::new(10);
        let a = log.record(1, Severity::Info, LogCategory::Info, "a");
        let b = log.record(1, Severity::Info, LogCategory::Info, "b");
        assert_eq!(b, a + 1);
    }

    #[test]
    fn overflow_drops_oldest() {
        let mut log = EventLog::new(3);
        for i in 0..5 {
            log.record(i, Severity::Info, LogCategory::Info, format!("m{i}"));
        }
        assert_eq!(log.len(), 3);
        let oldest = log.iter().next().expect("non-empty");
        assert_eq!(oldest.message, "m2");
        assert_eq!(log.next_id(), 5);
    }

    #[test]
    fn recent_filters_by_category() {
        let mut log = EventLog::new(10);
        log.record(1, Severity::Info, LogCategory::Births, "b");
        log.record(2, Severity::Info, LogCategory::Deaths, "d");
        log.record(3, Severity::Info, LogCategory::Births, "b2");
        let births = log.recent(Some(LogCategory::Births), 0, 10);
        assert_eq!(births.len(), 2);
        assert_eq!(births[0].message, "b2");
    }
}
