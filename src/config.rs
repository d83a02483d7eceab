//! Process Configuration
//! Mission: Load every runtime setting once at startup

use std::env;
use std::path::PathBuf;

/// Runtime configuration, assembled from the environment in `main` and
/// injected into constructors. The signing secret in particular is never
/// read as ambient state past startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub auth_db_path: String,
    pub content_db_path: String,
    pub jwt_secret: String,
    pub token_validity_hours: i64,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub openai_model: String,
    pub azure_account_name: Option<String>,
    pub azure_account_key: Option<String>,
    pub mail_relay_url: Option<String>,
    pub mail_from_address: String,
}

impl Config {
    pub fn from_env() -> Self {
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".to_string());

        let auth_db_path = resolve_data_path(env::var("AUTH_DB_PATH").ok(), "mindcare_auth.db");
        let content_db_path =
            resolve_data_path(env::var("CONTENT_DB_PATH").ok(), "mindcare_content.db");

        let jwt_secret = env::var("JWT_SECRET")
            .unwrap_or_else(|_| "dev-secret-change-in-production-minimum-32-characters".to_string());

        let token_validity_hours = env::var("TOKEN_VALIDITY_HOURS")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .filter(|&v| v > 0)
            .unwrap_or(24);

        let openai_api_key = env::var("OPENAI_API_KEY").ok().filter(|s| !s.trim().is_empty());
        let openai_base_url = env::var("OPENAI_BASE_URL")
            .unwrap_or_else(|_| "https://api.openai.com/v1".to_string());
        let openai_model = env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4".to_string());

        let azure_account_name = env::var("AZURE_STORAGE_ACCOUNT")
            .ok()
            .filter(|s| !s.trim().is_empty());
        let azure_account_key = env::var("AZURE_STORAGE_KEY")
            .ok()
            .filter(|s| !s.trim().is_empty());

        let mail_relay_url = env::var("MAIL_RELAY_URL").ok().filter(|s| !s.trim().is_empty());
        let mail_from_address = env::var("MAIL_FROM_ADDRESS")
            .unwrap_or_else(|_| "no-reply@mindcare.example".to_string());

        Self {
            bind_addr,
            auth_db_path,
            content_db_path,
            jwt_secret,
            token_validity_hours,
            openai_api_key,
            openai_base_url,
            openai_model,
            azure_account_name,
            azure_account_key,
            mail_relay_url,
            mail_from_address,
        }
    }
}

fn default_data_path(filename: &str) -> String {
    let base = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    base.join(filename).to_string_lossy().to_string()
}

/// Resolve a data-file path from the environment. Relative paths are taken
/// relative to the crate directory, not the caller's cwd, so running from
/// elsewhere never creates a second empty database.
pub fn resolve_data_path(env_value: Option<String>, default_filename: &str) -> String {
    let base = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let Some(raw) = env_value.filter(|v| !v.trim().is_empty()) else {
        return default_data_path(default_filename);
    };

    let p = PathBuf::from(raw);
    if p.is_absolute() {
        return p.to_string_lossy().to_string();
    }

    base.join(p).to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_data_path_defaults() {
        let resolved = resolve_data_path(None, "mindcare_auth.db");
        assert!(resolved.ends_with("mindcare_auth.db"));

        // Blank env values fall back to the default too.
        let resolved = resolve_data_path(Some("  ".to_string()), "mindcare_auth.db");
        assert!(resolved.ends_with("mindcare_auth.db"));
    }

    #[test]
    fn test_resolve_data_path_absolute_passthrough() {
        let resolved = resolve_data_path(Some("/var/lib/mindcare/auth.db".to_string()), "x.db");
        assert_eq!(resolved, "/var/lib/mindcare/auth.db");
    }

    #[test]
    fn test_resolve_data_path_relative_is_anchored() {
        let resolved = resolve_data_path(Some("data/auth.db".to_string()), "x.db");
        assert!(resolved.ends_with("data/auth.db"));
        assert!(PathBuf::from(&resolved).is_absolute());
    }
}
