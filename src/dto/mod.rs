use std::time::SystemTime;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

pub mod agents;
pub mod chat;
pub mod common;
pub mod health;
pub mod history;
pub mod session;
pub mod validation;

/// RFC 3339 rendering used by every payload timestamp.
pub fn format_system_time(time: SystemTime) -> String {
    OffsetDateTime::from(time)
        .format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}
