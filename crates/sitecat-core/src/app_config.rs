use std::path::PathBuf;

/// Application-wide configuration, resolved once at startup and passed by
/// reference into the pipeline and its collaborators. There is no ambient
/// global client state anywhere downstream of this struct.
#[derive(Clone)]
pub struct AppConfig {
    pub database_path: PathBuf,
    pub log_level: String,
    /// Optional so maintenance commands can run without classifier access;
    /// the pipeline itself refuses to start without it.
    pub classifier_api_key: Option<String>,
    pub classifier_base_url: String,
    pub classifier_model: String,
    pub classifier_max_attempts: u32,
    pub classifier_backoff_base_ms: u64,
    pub fetch_timeout_secs: u64,
    pub fetch_user_agent: String,
    pub default_workers: usize,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("database_path", &self.database_path)
            .field("log_level", &self.log_level)
            .field(
                "classifier_api_key",
                &self.classifier_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("classifier_base_url", &self.classifier_base_url)
            .field("classifier_model", &self.classifier_model)
            .field("classifier_max_attempts", &self.classifier_max_attempts)
            .field(
                "classifier_backoff_base_ms",
                &self.classifier_backoff_base_ms,
            )
            .field("fetch_timeout_secs", &self.fetch_timeout_secs)
            .field("fetch_user_agent", &self.fetch_user_agent)
            .field("default_workers", &self.default_workers)
            .finish()
    }
}
