use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warn,
    Error,
}

/// Closed log category set. New categories are a schema change for external
/// subscribers, so this enum is exhaustive by design of the snapshot stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogCategory {
    Events,
    Births,
    Deaths,
    Speciation,
    CivFounding,
    CivTerritory,
    CivCraft,
    CivDiplomacy,
    CivLanguage,
    CivStructure,
    Info,
}

/// One structured domain event. `time` is wall-clock metadata only and is
/// excluded from determinism hashes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: u64,
    pub tick: u64,
    pub time: String,
    pub severity: Severity,
    pub category: LogCategory,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<(u16, u16)>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub faction_id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}
