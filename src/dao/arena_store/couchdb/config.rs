use std::env;

use super::error::{CouchDaoError, CouchResult};

const URL_ENV: &str = "COUCH_BASE_URL";
const DB_ENV: &str = "COUCH_DB";
const USER_ENV: &str = "COUCH_USERNAME";
const PASSWORD_ENV: &str = "COUCH_PASSWORD";
const DEFAULT_DB: &str = "chat_arena";

/// Basic-auth pair sent with every CouchDB request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CouchCredentials {
    pub username: String,
    pub password: String,
}

/// Where the arena documents live in CouchDB.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CouchConfig {
    pub base_url: String,
    /// Single database holding both `session::` and `chat::` documents.
    pub database: String,
    pub credentials: Option<CouchCredentials>,
}

impl CouchConfig {
    /// Read [`URL_ENV`] (required), [`DB_ENV`] and the optional credential pair.
    ///
    /// Credentials are only used when both the user name and the password are set.
    pub fn from_env() -> CouchResult<Self> {
        let base_url = env::var(URL_ENV).map_err(|_| CouchDaoError::MissingEnvVar { var: URL_ENV })?;
        let database = env::var(DB_ENV)
            .ok()
            .filter(|db| !db.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DB.to_owned());
        let credentials = env::var(USER_ENV)
            .ok()
            .zip(env::var(PASSWORD_ENV).ok())
            .map(|(username, password)| CouchCredentials { username, password });

        Ok(Self {
            base_url,
            database,
            credentials,
        })
    }
}
