/// Agent catalogue, roasts and the reality show.
pub mod agents_service;
/// Persona chat, split dialogs and the doubting agent.
pub mod chat_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Shapes sessions, rounds and tallies into API responses.
pub mod formatter;
/// LLM-backed line generation with guaranteed fallbacks.
pub mod generation;
/// Health check service.
pub mod health_service;
/// Chat log listing, deletion and export.
pub mod history_service;
/// Session lifecycle: start, advance, finish and queries.
pub mod phase_controller;
/// Per-mode round scripts.
pub mod scripts;
/// Locked persistence helpers for sessions.
pub mod session_store;
/// Background storage connection supervisor.
pub mod storage_supervisor;
/// Ballots, round closing and final standings.
pub mod voting;
