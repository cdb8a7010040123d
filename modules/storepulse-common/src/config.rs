use std::env;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Postgres
    pub database_url: String,

    // Insight external AI/search service.
    // An empty key is allowed: the engine fails open (assumes external
    // existence, never fabricates a score) rather than blocking reads.
    pub insight_api_key: String,
    pub insight_mock: bool,
    pub insight_timeout_secs: u64,

    // Web server
    pub web_host: String,
    pub web_port: u16,

    // Admin (force-refresh endpoint)
    pub admin_username: String,
    pub admin_password: String,
}

impl Config {
    /// Load configuration from environment variables.
    /// Panics with a clear message if required vars are missing.
    pub fn from_env() -> Self {
        Self {
            database_url: required_env("DATABASE_URL"),
            insight_api_key: env::var("INSIGHT_API_KEY").unwrap_or_default(),
            insight_mock: truthy(&env::var("INSIGHT_MOCK").unwrap_or_default()),
            insight_timeout_secs: env::var("INSIGHT_TIMEOUT_SECS")
                .unwrap_or_else(|_| "25".to_string())
                .parse()
                .expect("INSIGHT_TIMEOUT_SECS must be a number"),
            web_host: env::var("WEB_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            web_port: env::var("WEB_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .expect("WEB_PORT must be a number"),
            admin_username: env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string()),
            admin_password: required_env("ADMIN_PASSWORD"),
        }
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}

fn truthy(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "true" | "1" | "yes")
}

#[cfg(test)]
mod tests {
    use super::truthy;

    #[test]
    fn truthy_accepts_common_spellings() {
        assert!(truthy("true"));
        assert!(truthy("1"));
        assert!(truthy("YES"));
        assert!(!truthy(""));
        assert!(!truthy("false"));
        assert!(!truthy("0"));
    }
}
