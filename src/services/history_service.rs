use std::time::{Duration, SystemTime};

use indexmap::IndexMap;
use tracing::info;
use uuid::Uuid;

use crate::{
    dao::models::{ChatLogEntity, ChatLogFilter, SessionFilter},
    dto::{
        common::ActionResponse,
        format_system_time,
        history::{
            ChatHistoryPage, ChatHistoryQuery, ChatLogEntry, ChatStats, ExportRequest,
            ExportResponse, HistoryOverview, OverviewQuery,
        },
    },
    error::ServiceError,
    services::generation::persona::Persona,
    state::{SharedState, mode::GameMode, phase::round2},
};

const DEFAULT_PAGE_SIZE: usize = 50;
const MAX_PAGE_SIZE: usize = 1000;
const DEFAULT_OVERVIEW_DAYS: u32 = 30;
const SECONDS_PER_DAY: u64 = 86_400;
const CSV_HEADER: &str = "id,timestamp,agent_type,query,response,session_id,user_rating,response_time";

/// Supported export encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExportFormat {
    Json,
    Txt,
    Csv,
}

impl ExportFormat {
    fn parse(value: &str) -> Result<Self, ServiceError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "txt" => Ok(ExportFormat::Txt),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(ServiceError::InvalidRequest(format!(
                "unsupported export format `{other}`, expected json, txt or csv"
            ))),
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Txt => "txt",
            ExportFormat::Csv => "csv",
        }
    }
}

/// Page of the chat log, newest first.
pub async fn list(
    state: &SharedState,
    query: ChatHistoryQuery,
) -> Result<ChatHistoryPage, ServiceError> {
    let offset = query.offset.unwrap_or_default();
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let filter = ChatLogFilter {
        persona: query.persona.as_deref().map(persona_key),
        session_id: query.session_id,
        offset,
        limit: Some(limit),
        ..ChatLogFilter::default()
    };

    let store = state.require_store().await?;
    let total = store.count_chat(filter.clone()).await?;
    let entries = store.list_chat(filter).await?;
    Ok(ChatHistoryPage {
        total,
        offset,
        limit,
        items: entries.iter().map(entry_view).collect(),
    })
}

/// Remove one chat log entry.
pub async fn delete(state: &SharedState, id: Uuid) -> Result<ActionResponse, ServiceError> {
    let store = state.require_store().await?;
    if !store.delete_chat(id).await? {
        return Err(ServiceError::NotFound(format!("chat entry `{id}` not found")));
    }
    info!(entry_id = %id, "chat entry deleted");
    Ok(ActionResponse::new(format!("chat entry `{id}` deleted")))
}

/// Export the chat log matching the request filters in the requested format.
pub async fn export(
    state: &SharedState,
    request: ExportRequest,
) -> Result<ExportResponse, ServiceError> {
    let format = ExportFormat::parse(&request.format)?;
    let filter = ChatLogFilter {
        persona: request.persona.as_deref().map(persona_key),
        session_id: request.session_id,
        ..ChatLogFilter::default()
    };

    let store = state.require_store().await?;
    let entries = store.list_chat(filter).await?;
    let exported_at = SystemTime::now();
    info!(format = format.as_str(), records = entries.len(), "chat history exported");

    let (data, content) = match format {
        ExportFormat::Json => (Some(entries.iter().map(entry_view).collect()), None),
        ExportFormat::Txt => (None, Some(render_txt(&entries, exported_at))),
        ExportFormat::Csv => (None, Some(render_csv(&entries))),
    };
    Ok(ExportResponse {
        format: format.as_str().to_owned(),
        exported_at: format_system_time(exported_at),
        total_records: entries.len(),
        data,
        content,
    })
}

/// Message totals over the whole chat log.
pub async fn chat_stats(state: &SharedState) -> Result<ChatStats, ServiceError> {
    let store = state.require_store().await?;
    let entries = store.list_chat(ChatLogFilter::default()).await?;
    let summary = MessageSummary::of(&entries);
    Ok(ChatStats {
        total_messages: entries.len(),
        agent_stats: summary.per_persona,
        average_response_time_ms: summary.average_response_time_ms,
        timestamp: format_system_time(SystemTime::now()),
    })
}

/// Chat and session activity of the last `days` days.
pub async fn overview(
    state: &SharedState,
    query: OverviewQuery,
) -> Result<HistoryOverview, ServiceError> {
    let days = query.days.unwrap_or(DEFAULT_OVERVIEW_DAYS);
    let now = SystemTime::now();
    let since = now
        .checked_sub(Duration::from_secs(u64::from(days) * SECONDS_PER_DAY))
        .unwrap_or(SystemTime::UNIX_EPOCH);

    let store = state.require_store().await?;
    let entries = store
        .list_chat(ChatLogFilter {
            since: Some(since),
            ..ChatLogFilter::default()
        })
        .await?;
    let sessions = store.list_sessions(SessionFilter::default()).await?;

    let mut sessions_by_mode: IndexMap<String, usize> = GameMode::ALL
        .iter()
        .map(|mode| (mode.as_str().to_owned(), 0))
        .collect();
    let mut total_sessions = 0;
    let mut active_sessions = 0;
    for session in sessions.iter().filter(|session| session.created_at >= since) {
        total_sessions += 1;
        if session.active {
            active_sessions += 1;
        }
        *sessions_by_mode.entry(session.mode.clone()).or_default() += 1;
    }

    let summary = MessageSummary::of(&entries);
    Ok(HistoryOverview {
        period_days: days,
        total_messages: entries.len(),
        agent_stats: summary.per_persona,
        average_response_time_ms: summary.average_response_time_ms,
        total_sessions,
        active_sessions,
        sessions_by_mode,
        timestamp: format_system_time(now),
    })
}

/// Per-persona counts and the mean response time of a set of chat entries.
struct MessageSummary {
    per_persona: IndexMap<String, usize>,
    average_response_time_ms: f64,
}

impl MessageSummary {
    fn of(entries: &[ChatLogEntity]) -> Self {
        let mut per_persona: IndexMap<String, usize> = Persona::ALL
            .iter()
            .map(|persona| (persona.key().to_owned(), 0))
            .collect();
        let mut total_ms = 0u64;
        for entry in entries {
            *per_persona.entry(entry.persona.clone()).or_default() += 1;
            total_ms = total_ms.saturating_add(entry.response_time_ms);
        }
        let average_response_time_ms = if entries.is_empty() {
            0.0
        } else {
            round2(total_ms as f64 / entries.len() as f64)
        };
        Self {
            per_persona,
            average_response_time_ms,
        }
    }
}

/// Stored persona key for a persona name or key given by a client.
fn persona_key(value: &str) -> String {
    Persona::from_name(value).key().to_owned()
}

fn entry_view(entry: &ChatLogEntity) -> ChatLogEntry {
    ChatLogEntry {
        id: entry.id,
        persona: entry.persona.clone(),
        query: entry.query.clone(),
        response: entry.response.clone(),
        session_id: entry.session_id.clone(),
        timestamp: format_system_time(entry.created_at),
        response_time_ms: entry.response_time_ms,
        fallback: entry.fallback,
    }
}

fn render_txt(entries: &[ChatLogEntity], exported_at: SystemTime) -> String {
    let mut out = String::from("AI Chat Arena - Export History\n");
    out.push_str(&format!("Exported at: {}\n", format_system_time(exported_at)));
    out.push_str(&format!("Total records: {}\n", entries.len()));
    out.push_str(&"=".repeat(50));
    out.push_str("\n\n");

    for entry in entries {
        out.push_str(&format!("Time: {}\n", format_system_time(entry.created_at)));
        out.push_str(&format!("Agent: {}\n", entry.persona));
        out.push_str(&format!("Query: {}\n", entry.query));
        out.push_str(&format!("Response: {}\n", entry.response));
        out.push_str(&"-".repeat(30));
        out.push_str("\n\n");
    }
    out
}

fn render_csv(entries: &[ChatLogEntity]) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');
    for entry in entries {
        let row = [
            entry.id.to_string(),
            format_system_time(entry.created_at),
            entry.persona.clone(),
            entry.query.clone(),
            entry.response.clone(),
            entry.session_id.clone().unwrap_or_default(),
            String::new(),
            entry.response_time_ms.to_string(),
        ];
        let line: Vec<String> = row.iter().map(|field| csv_field(field)).collect();
        out.push_str(&line.join(","));
        out.push('\n');
    }
    out
}

/// Quote a CSV field when it holds a separator, a quote or a line break.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use super::*;
    use crate::{
        config::AppConfig,
        dao::arena_store::{ArenaStore, memory::MemoryArenaStore},
        services::generation::testing::{FailingBackend, generator},
        state::AppState,
    };

    fn entry(persona: &str, query: &str, response: &str, age_secs: u64) -> ChatLogEntity {
        ChatLogEntity {
            id: Uuid::new_v4(),
            persona: persona.into(),
            query: query.into(),
            response: response.into(),
            session_id: None,
            created_at: SystemTime::now() - Duration::from_secs(age_secs),
            response_time_ms: 120,
            fallback: false,
        }
    }

    async fn seeded() -> (SharedState, Vec<ChatLogEntity>) {
        let state = AppState::new(AppConfig::default(), generator(FailingBackend));
        let store = Arc::new(MemoryArenaStore::new());
        let entries = vec![
            entry("adam", "Hej", "Cześć!", 30),
            entry("beata", "Czy AI myśli?", "To zależy, co masz na myśli.", 20),
            entry("adam", "Pizza?", "Zawsze, \"z ananasem\"", 10),
        ];
        for item in &entries {
            store.append_chat(item.clone()).await.unwrap();
        }
        state.set_store(store).await;
        (state, entries)
    }

    #[tokio::test]
    async fn listing_filters_by_persona_name() {
        let (state, entries) = seeded().await;
        let page = list(
            &state,
            ChatHistoryQuery {
                persona: Some("Adam".into()),
                ..ChatHistoryQuery::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(page.total, 2);
        assert_eq!(page.items[0].id, entries[2].id);
        assert_eq!(page.limit, DEFAULT_PAGE_SIZE);
    }

    #[tokio::test]
    async fn page_total_counts_every_matching_entry() {
        let (state, entries) = seeded().await;
        let page = list(
            &state,
            ChatHistoryQuery {
                limit: Some(1),
                offset: Some(1),
                ..ChatHistoryQuery::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].id, entries[1].id);
        assert_eq!(page.total, 3);
    }

    #[tokio::test]
    async fn stats_count_messages_per_persona() {
        let (state, _) = seeded().await;
        let stats = chat_stats(&state).await.unwrap();

        assert_eq!(stats.total_messages, 3);
        assert_eq!(stats.agent_stats.get("adam"), Some(&2));
        assert_eq!(stats.agent_stats.get("beata"), Some(&1));
        assert_eq!(stats.agent_stats.get("daria"), Some(&0));
        assert_eq!(stats.average_response_time_ms, 120.0);
    }

    #[tokio::test]
    async fn overview_only_counts_the_requested_window() {
        let (state, _) = seeded().await;
        let store = state.require_store().await.unwrap();
        let mut old = entry("beata", "Stare", "Dawno temu", 3 * SECONDS_PER_DAY);
        old.response_time_ms = 900;
        store.append_chat(old).await.unwrap();

        let window = overview(&state, OverviewQuery { days: Some(1) }).await.unwrap();
        assert_eq!(window.period_days, 1);
        assert_eq!(window.total_messages, 3);
        assert_eq!(window.agent_stats.get("beata"), Some(&1));
        assert_eq!(window.average_response_time_ms, 120.0);
        assert_eq!(window.total_sessions, 0);
        assert_eq!(window.sessions_by_mode.get("gladiator"), Some(&0));

        let month = overview(&state, OverviewQuery::default()).await.unwrap();
        assert_eq!(month.period_days, DEFAULT_OVERVIEW_DAYS);
        assert_eq!(month.total_messages, 4);
        assert_eq!(month.average_response_time_ms, 315.0);
    }

    #[tokio::test]
    async fn stats_need_storage() {
        let state = AppState::new(AppConfig::default(), generator(FailingBackend));
        assert!(matches!(chat_stats(&state).await, Err(ServiceError::Degraded)));
    }

    #[tokio::test]
    async fn unknown_formats_are_rejected() {
        let (state, _) = seeded().await;
        let result = export(
            &state,
            ExportRequest {
                format: "xml".into(),
                persona: None,
                session_id: None,
            },
        )
        .await;
        assert!(matches!(result, Err(ServiceError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn csv_export_quotes_awkward_fields() {
        let (state, _) = seeded().await;
        let response = export(
            &state,
            ExportRequest {
                format: "CSV".into(),
                persona: None,
                session_id: None,
            },
        )
        .await
        .unwrap();

        let content = response.content.unwrap();
        let mut lines = content.lines();
        assert_eq!(lines.next(), Some(CSV_HEADER));
        assert!(content.contains("\"Zawsze, \"\"z ananasem\"\"\""));
        assert_eq!(response.total_records, 3);
        assert!(response.data.is_none());
    }

    #[tokio::test]
    async fn txt_export_has_a_header_and_one_block_per_entry() {
        let (state, _) = seeded().await;
        let response = export(
            &state,
            ExportRequest {
                format: "txt".into(),
                persona: Some("beata".into()),
                session_id: None,
            },
        )
        .await
        .unwrap();

        let content = response.content.unwrap();
        assert!(content.starts_with("AI Chat Arena - Export History\n"));
        assert!(content.contains("Total records: 1\n"));
        assert_eq!(content.matches("Agent: ").count(), 1);
    }

    #[tokio::test]
    async fn deleting_twice_reports_not_found() {
        let (state, entries) = seeded().await;
        delete(&state, entries[0].id).await.unwrap();
        assert!(matches!(
            delete(&state, entries[0].id).await,
            Err(ServiceError::NotFound(_))
        ));
    }
}
