use mongodb::options::ClientOptions;

use super::error::{MongoDaoError, MongoResult};

const URI_ENV: &str = "MONGO_URI";
const DB_ENV: &str = "MONGO_DB";
const DEFAULT_DB: &str = "chat_arena";
const APP_NAME: &str = "chat-arena-back";

/// Parsed client options plus the database holding `sessions` and `chat_logs`.
#[derive(Clone)]
pub struct MongoConfig {
    pub options: ClientOptions,
    pub database_name: String,
}

impl MongoConfig {
    /// Read [`URI_ENV`] (required) and [`DB_ENV`], defaulting the database to `chat_arena`.
    pub async fn from_env() -> MongoResult<Self> {
        let uri = std::env::var(URI_ENV).map_err(|_| MongoDaoError::MissingEnvVar { var: URI_ENV })?;
        let mut options = ClientOptions::parse(&uri)
            .await
            .map_err(|source| MongoDaoError::InvalidUri {
                uri: uri.clone(),
                source,
            })?;
        options.app_name.get_or_insert_with(|| APP_NAME.to_owned());

        let database_name = std::env::var(DB_ENV)
            .ok()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DB.to_owned());

        Ok(Self {
            options,
            database_name,
        })
    }
}
