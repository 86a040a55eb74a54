//! Payloads of the chat history endpoints.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Filters and paging of the chat history listing.
#[derive(Debug, Default, Deserialize, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct ChatHistoryQuery {
    #[serde(alias = "agent_type")]
    pub persona: Option<String>,
    pub session_id: Option<String>,
    /// Defaults to 0.
    pub offset: Option<usize>,
    /// Defaults to 50.
    #[validate(range(min = 1, max = 1000))]
    pub limit: Option<usize>,
}

/// Stored chat exchange.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ChatLogEntry {
    pub id: Uuid,
    pub persona: String,
    pub query: String,
    pub response: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub timestamp: String,
    pub response_time_ms: u64,
    pub fallback: bool,
}

/// Page of the chat history.
#[derive(Debug, Serialize, ToSchema)]
pub struct ChatHistoryPage {
    /// Entries matching the filters across all pages.
    pub total: usize,
    pub offset: usize,
    pub limit: usize,
    pub items: Vec<ChatLogEntry>,
}

/// Export of the chat history.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct ExportRequest {
    /// `json`, `txt` or `csv`.
    #[validate(length(min = 1, max = 16))]
    pub format: String,
    #[serde(default, alias = "agent_type")]
    pub persona: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Exported chat history. `data` is filled for `json`, `content` for `txt` and `csv`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ExportResponse {
    pub format: String,
    pub exported_at: String,
    pub total_records: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<ChatLogEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// Chat log totals.
#[derive(Debug, Serialize, ToSchema)]
pub struct ChatStats {
    pub total_messages: usize,
    /// Messages per persona key.
    pub agent_stats: IndexMap<String, usize>,
    pub average_response_time_ms: f64,
    pub timestamp: String,
}

/// Window of the history overview.
#[derive(Debug, Default, Deserialize, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct OverviewQuery {
    /// Days to look back. Defaults to 30.
    #[validate(range(min = 1, max = 365))]
    pub days: Option<u32>,
}

/// Chat and session activity over the last `period_days` days.
#[derive(Debug, Serialize, ToSchema)]
pub struct HistoryOverview {
    pub period_days: u32,
    pub total_messages: usize,
    pub agent_stats: IndexMap<String, usize>,
    pub average_response_time_ms: f64,
    pub total_sessions: usize,
    pub active_sessions: usize,
    /// Sessions per game mode.
    pub sessions_by_mode: IndexMap<String, usize>,
    pub timestamp: String,
}
