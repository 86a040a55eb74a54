use axum::Router;

use crate::state::SharedState;

pub mod agents;
pub mod chat;
pub mod docs;
pub mod extract;
pub mod health;
pub mod history;
pub mod modes;
pub mod sessions;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(modes::router())
        .merge(sessions::router())
        .merge(chat::router())
        .merge(history::router())
        .merge(agents::router());

    let docs_router = docs::router(state.clone());

    api_router.merge(docs_router).with_state(state)
}
