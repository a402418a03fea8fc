//! Configuration loader for the `greenheart-agronomy` backend service.
//!
//! All runtime settings are read once at startup (after `.env` has been
//! applied by the caller) into an immutable [`Config`], which is then handed
//! to the generation client and the router. Nothing else in the crate reads
//! the environment.
use std::{env, fmt};

use anyhow::{anyhow, Result};

use crate::prompt::DEFAULT_REGION;

const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-pro";
const DEFAULT_GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Parse an optional integer variable with a default value.
macro_rules! parse_env_u32 {
    ($lookup:expr, $var_name:expr, $default:expr) => {
        $lookup($var_name)
            .map(|v| v.parse::<u32>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse a required string variable.
macro_rules! require_env {
    ($lookup:expr, $var_name:expr) => {
        $lookup($var_name)
            .filter(|v: &String| !v.trim().is_empty())
            .ok_or_else(|| anyhow!("{} must be set in .env or environment", $var_name))?
    };
}

/// Strongly typed application configuration.
///
/// All fields are immutable after loading, ensuring a consistent configuration
/// snapshot for the lifetime of the application.
#[derive(Clone)]
pub struct Config {
    // ---
    /// Generation service API key.
    pub api_key: String,

    /// Generation model name.
    pub gemini_model: String,

    /// Generation service base URL (up to and including the API version).
    pub gemini_api_url: String,

    /// Detection service base URL; leaf images are not annotated when unset.
    pub detection_url: Option<String>,

    /// HTTP listen port.
    pub port: u16,

    /// Maximum accepted upload size in megabytes.
    pub max_upload_mb: u32,

    /// Region used for recommendations that do not name one.
    pub default_region: String,
}

/// Load configuration from environment variables with defaults.
///
/// Required:
/// - `GOOGLE_API_KEY` – generation service key
///
/// Optional:
/// - `GEMINI_MODEL` – model name (default: `gemini-1.5-pro`)
/// - `GEMINI_API_URL` – service base URL
/// - `DETECTION_URL` – detection service base URL
/// - `PORT` – listen port (default: 8000)
/// - `MAX_UPLOAD_MB` – upload limit (default: 10)
/// - `DEFAULT_REGION` – default region (default: `India`)
pub fn load_from_env() -> Result<Config> {
    load_with(|key| env::var(key).ok())
}

/// Load configuration through an arbitrary key lookup.
pub fn load_with<F>(lookup: F) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    // ---
    let api_key = require_env!(lookup, "GOOGLE_API_KEY");
    let port = parse_env_u32!(lookup, "PORT", 8000);
    let port = u16::try_from(port).map_err(|_| anyhow!("Invalid PORT: {} is out of range", port))?;
    let max_upload_mb = parse_env_u32!(lookup, "MAX_UPLOAD_MB", 10);

    Ok(Config {
        api_key,
        gemini_model: lookup("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
        gemini_api_url: lookup("GEMINI_API_URL")
            .unwrap_or_else(|| DEFAULT_GEMINI_API_URL.to_string()),
        detection_url: lookup("DETECTION_URL").filter(|v| !v.trim().is_empty()),
        port,
        max_upload_mb,
        default_region: lookup("DEFAULT_REGION").unwrap_or_else(|| DEFAULT_REGION.to_string()),
    })
}

impl Config {
    /// Upload limit in bytes.
    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb as usize * 1024 * 1024
    }

    /// Log the loaded configuration for debugging purposes.
    ///
    /// The API key is masked down to its last four characters.
    pub fn log_config(&self) {
        // ---
        tracing::info!("Configuration loaded:");
        tracing::info!("  GOOGLE_API_KEY : {}", mask_secret(&self.api_key));
        tracing::info!("  GEMINI_MODEL   : {}", self.gemini_model);
        tracing::info!("  GEMINI_API_URL : {}", self.gemini_api_url);
        tracing::info!(
            "  DETECTION_URL  : {}",
            self.detection_url.as_deref().unwrap_or("(disabled)")
        );
        tracing::info!("  PORT           : {}", self.port);
        tracing::info!("  MAX_UPLOAD_MB  : {}", self.max_upload_mb);
        tracing::info!("  DEFAULT_REGION : {}", self.default_region);
    }

    #[cfg(test)]
    pub(crate) fn for_tests() -> Self {
        Config {
            api_key: "test-key".to_string(),
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            gemini_api_url: DEFAULT_GEMINI_API_URL.to_string(),
            detection_url: None,
            port: 0,
            max_upload_mb: 1,
            default_region: DEFAULT_REGION.to_string(),
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &mask_secret(&self.api_key))
            .field("gemini_model", &self.gemini_model)
            .field("gemini_api_url", &self.gemini_api_url)
            .field("detection_url", &self.detection_url)
            .field("port", &self.port)
            .field("max_upload_mb", &self.max_upload_mb)
            .field("default_region", &self.default_region)
            .finish()
    }
}

fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{tail}")
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_apply() {
        // ---
        let cfg = load_with(lookup(&[("GOOGLE_API_KEY", "abc123456")])).unwrap();

        assert_eq!(cfg.api_key, "abc123456");
        assert_eq!(cfg.gemini_model, "gemini-1.5-pro");
        assert_eq!(cfg.port, 8000);
        assert_eq!(cfg.max_upload_mb, 10);
        assert_eq!(cfg.max_upload_bytes(), 10 * 1024 * 1024);
        assert_eq!(cfg.default_region, "India");
        assert!(cfg.detection_url.is_none());
    }

    #[test]
    fn test_missing_key_is_an_error() {
        // ---
        let err = load_with(lookup(&[])).unwrap_err();
        assert!(err.to_string().contains("GOOGLE_API_KEY"));

        let err = load_with(lookup(&[("GOOGLE_API_KEY", "  ")])).unwrap_err();
        assert!(err.to_string().contains("GOOGLE_API_KEY"));
    }

    #[test]
    fn test_invalid_integers_name_the_variable() {
        // ---
        let err = load_with(lookup(&[("GOOGLE_API_KEY", "k"), ("PORT", "http")])).unwrap_err();
        assert!(err.to_string().contains("PORT"));

        let err = load_with(lookup(&[("GOOGLE_API_KEY", "k"), ("PORT", "70000")])).unwrap_err();
        assert!(err.to_string().contains("out of range"));

        let err =
            load_with(lookup(&[("GOOGLE_API_KEY", "k"), ("MAX_UPLOAD_MB", "-1")])).unwrap_err();
        assert!(err.to_string().contains("MAX_UPLOAD_MB"));
    }

    #[test]
    fn test_overrides() {
        // ---
        let cfg = load_with(lookup(&[
            ("GOOGLE_API_KEY", "k"),
            ("GEMINI_MODEL", "gemini-1.5-flash"),
            ("DETECTION_URL", "http://detector:9000"),
            ("DEFAULT_REGION", "Kenya"),
            ("PORT", "3000"),
        ]))
        .unwrap();

        assert_eq!(cfg.gemini_model, "gemini-1.5-flash");
        assert_eq!(cfg.detection_url.as_deref(), Some("http://detector:9000"));
        assert_eq!(cfg.default_region, "Kenya");
        assert_eq!(cfg.port, 3000);
    }

    #[test]
    fn test_secret_is_masked() {
        // ---
        assert_eq!(mask_secret("AIzaSyExample1234"), "****1234");
        assert_eq!(mask_secret("abc"), "****");
    }

    #[test]
    fn test_debug_output_masks_key() {
        // ---
        let cfg = load_with(lookup(&[("GOOGLE_API_KEY", "AIzaSySecretValue9876")])).unwrap();
        let rendered = format!("{cfg:?}");

        assert!(!rendered.contains("AIzaSySecretValue9876"));
        assert!(rendered.contains("****9876"));
        assert!(rendered.contains("gemini-1.5-pro"));
    }
}
