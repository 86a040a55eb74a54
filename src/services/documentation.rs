use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the Chat Arena backend.
#[openapi(
    info(title = "Chat Arena Back", description = "Party game modes and persona chat driven by a local LLM"),
    paths(
        crate::routes::health::healthcheck,
        crate::routes::modes::start_session,
        crate::routes::modes::mode_stats,
        crate::routes::modes::karaoke_songs,
        crate::routes::sessions::list_sessions,
        crate::routes::sessions::get_session,
        crate::routes::sessions::delete_session,
        crate::routes::sessions::advance_session,
        crate::routes::sessions::cast_vote,
        crate::routes::sessions::finish_session,
        crate::routes::chat::chat,
        crate::routes::chat::split_dialog,
        crate::routes::chat::doubt,
        crate::routes::chat::chat_stats,
        crate::routes::history::list_chat,
        crate::routes::history::delete_chat,
        crate::routes::history::export_chat,
        crate::routes::history::overview,
        crate::routes::agents::list_agents,
        crate::routes::agents::roast,
        crate::routes::agents::reality_show,
    ),
    components(
        schemas(
            crate::error::ErrorBody,
            crate::dto::health::HealthResponse,
            crate::dto::common::ActionResponse,
            crate::state::mode::GameMode,
            crate::dto::session::StartSessionRequest,
            crate::dto::session::RoundResult,
            crate::dto::session::MessageView,
            crate::dto::session::PerformanceView,
            crate::dto::session::AdvanceResponse,
            crate::dto::session::VoteRequest,
            crate::dto::session::TallyView,
            crate::dto::session::FinishSummary,
            crate::dto::session::RankingEntry,
            crate::dto::session::SessionSnapshot,
            crate::dto::session::RoundView,
            crate::dto::session::EvidenceView,
            crate::dto::session::SessionListItem,
            crate::dto::session::ModeStats,
            crate::dto::session::SongCatalogue,
            crate::dto::session::ThemeSongs,
            crate::dto::session::SongView,
            crate::dto::chat::ChatRequest,
            crate::dto::chat::ChatResponse,
            crate::dto::chat::SplitDialogRequest,
            crate::dto::chat::SplitDialogResponse,
            crate::dto::chat::DialogTurn,
            crate::dto::chat::DoubtRequest,
            crate::dto::chat::DoubtResponse,
            crate::dto::history::ChatHistoryPage,
            crate::dto::history::ChatLogEntry,
            crate::dto::history::ExportRequest,
            crate::dto::history::ExportResponse,
            crate::dto::history::ChatStats,
            crate::dto::history::HistoryOverview,
            crate::dto::agents::AgentCard,
            crate::dto::agents::AgentCatalogue,
            crate::dto::agents::RoastRequest,
            crate::dto::agents::RoastResponse,
            crate::dto::agents::RealityShowRequest,
            crate::dto::agents::RealityShowResponse,
            crate::dto::agents::RealityTurn,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "modes", description = "Session creation and per-mode information"),
        (name = "sessions", description = "Round progression, voting and results"),
        (name = "chat", description = "Persona chat"),
        (name = "history", description = "Chat log browsing, export and statistics"),
        (name = "agents", description = "Agent catalogue, roasts and the reality show"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_route_is_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/healthcheck",
            "/modes/{mode}/sessions",
            "/modes/{mode}/stats",
            "/modes/karaoke/songs",
            "/sessions",
            "/sessions/{id}",
            "/sessions/{id}/advance",
            "/sessions/{id}/votes",
            "/sessions/{id}/finish",
            "/chat",
            "/chat/split-dialog",
            "/chat/doubt",
            "/history/chat",
            "/history/chat/{id}",
            "/history/export",
            "/history/stats/overview",
            "/chat/stats",
            "/agents",
            "/agents/roast",
            "/agents/reality-show",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
