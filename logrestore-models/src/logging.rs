use serde::{Deserialize, Serialize};

pub const CUSTOM_LOG_TYPE: &str = "CUSTOM";
pub const RESTORE_SOURCE: &str = "Log-Restore";
pub const RESTORE_SUBJECT: &str = "Log_Content_Restore_Staging_Area";
pub const LOGGING_SPEC_VERSION: &str = "1.0";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogGroupSummary {
    pub id: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compartment_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogSummary {
    pub id: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_group_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLogGroupDetails {
    pub compartment_id: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLogDetails {
    pub display_name: String,
    pub log_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_enabled: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub data: String,
    pub id: String,
    pub time: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntryBatch {
    pub entries: Vec<LogEntry>,
    pub source: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub subject: String,
    pub defaultlogentrytime: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PutLogsDetails {
    pub specversion: String,
    pub log_entry_batches: Vec<LogEntryBatch>,
}

impl PutLogsDetails {
    pub fn single(batch: LogEntryBatch) -> Self {
        Self {
            specversion: LOGGING_SPEC_VERSION.to_string(),
            log_entry_batches: vec![batch],
        }
    }
}
