use serde::Deserialize;

pub const DEFAULT_GEOCODING_BASE_URL: &str = "https://maps.googleapis.com";
pub const DEFAULT_SOLAR_BASE_URL: &str = "https://solar.googleapis.com";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub google_maps_api_key: String,
    pub gemini_api_key: String,
    pub proxy_base_url: Option<String>, // Unset means the proxy tier is skipped
    pub geocoding_base_url: String,
    pub solar_base_url: String,
    pub gemini_base_url: String,
    pub gemini_model: String,
    pub lead_price: f64,
    pub installer_initial_credits: f64,
    pub http_timeout_secs: u64,
}

fn required_var(name: &str) -> anyhow::Result<String> {
    std::env::var(name)
        .map_err(|_| anyhow::anyhow!("{} environment variable required", name))
        .and_then(|value| {
            if value.trim().is_empty() {
                anyhow::bail!("{} cannot be empty", name);
            }
            Ok(value)
        })
}

fn url_var(name: &str, default: &str) -> anyhow::Result<String> {
    let url = std::env::var(name).unwrap_or_else(|_| default.to_string());
    validate_url(name, &url)?;
    Ok(url.trim_end_matches('/').to_string())
}

fn validate_url(name: &str, url: &str) -> anyhow::Result<()> {
    if url.trim().is_empty() {
        anyhow::bail!("{} cannot be empty", name);
    }
    if !url.starts_with("http://") && !url.starts_with("https://") {
        anyhow::bail!("{} must start with http:// or https://", name);
    }
    Ok(())
}

fn positive_f64_var(name: &str, default: f64) -> anyhow::Result<f64> {
    let value = match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<f64>()
            .map_err(|_| anyhow::anyhow!("{} must be a number", name))?,
        Err(_) => default,
    };
    if !value.is_finite() || value <= 0.0 {
        anyhow::bail!("{} must be greater than zero", name);
    }
    Ok(value)
}

fn positive_u64_var(name: &str, default: u64) -> anyhow::Result<u64> {
    let value = match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|_| anyhow::anyhow!("{} must be a whole number", name))?,
        Err(_) => default,
    };
    if value == 0 {
        anyhow::bail!("{} must be greater than zero", name);
    }
    Ok(value)
}

fn port_var(name: &str, default: u16) -> anyhow::Result<u16> {
    positive_u64_var(name, u64::from(default))
        .ok()
        .and_then(|port| u16::try_from(port).ok())
        .ok_or_else(|| anyhow::anyhow!("{} must be a valid number between 1-65535", name))
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let proxy_base_url = match std::env::var("PROXY_BASE_URL")
            .ok()
            .filter(|s| !s.trim().is_empty())
        {
            Some(url) => {
                validate_url("PROXY_BASE_URL", &url)?;
                Some(url.trim_end_matches('/').to_string())
            }
            None => None,
        };

        let config = Self {
            port: port_var("PORT", 3000)?,
            google_maps_api_key: required_var("GOOGLE_MAPS_API_KEY")?,
            gemini_api_key: required_var("GEMINI_API_KEY")?,
            proxy_base_url,
            geocoding_base_url: url_var("GEOCODING_BASE_URL", DEFAULT_GEOCODING_BASE_URL)?,
            solar_base_url: url_var("SOLAR_BASE_URL", DEFAULT_SOLAR_BASE_URL)?,
            gemini_base_url: url_var("GEMINI_BASE_URL", DEFAULT_GEMINI_BASE_URL)?,
            gemini_model: std::env::var("GEMINI_MODEL")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            lead_price: positive_f64_var("LEAD_PRICE", 50.0)?,
            installer_initial_credits: positive_f64_var("INSTALLER_INITIAL_CREDITS", 500.0)?,
            http_timeout_secs: positive_u64_var("HTTP_TIMEOUT_SECS", 15)?,
        };

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        match config.proxy_base_url {
            Some(ref proxy) => tracing::info!("Provider proxy configured: {}", proxy),
            None => tracing::info!("No provider proxy configured, calling providers directly"),
        }
        tracing::debug!("Geocoding Base URL: {}", config.geocoding_base_url);
        tracing::debug!("Solar Base URL: {}", config.solar_base_url);
        tracing::debug!(
            "Gemini Base URL: {} (model {})",
            config.gemini_base_url,
            config.gemini_model
        );
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }

    /// Configuration with every provider pointed at `base_url`, for tests and local runs.
    pub fn for_base_url(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            port: 0,
            google_maps_api_key: "test-maps-key".to_string(),
            gemini_api_key: "test-gemini-key".to_string(),
            proxy_base_url: None,
            geocoding_base_url: base_url.clone(),
            solar_base_url: base_url.clone(),
            gemini_base_url: base_url,
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            lead_price: 50.0,
            installer_initial_credits: 500.0,
            http_timeout_secs: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Tests that touch the process environment run one at a time
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn with_env<T>(vars: &[(&str, Option<&str>)], f: impl FnOnce() -> T) -> T {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let saved: Vec<(String, Option<String>)> = vars
            .iter()
            .map(|(name, _)| (name.to_string(), std::env::var(name).ok()))
            .collect();
        for (name, value) in vars {
            match value {
                Some(v) => std::env::set_var(name, v),
                None => std::env::remove_var(name),
            }
        }
        let result = f();
        for (name, value) in saved {
            match value {
                Some(v) => std::env::set_var(&name, v),
                None => std::env::remove_var(&name),
            }
        }
        result
    }

    fn base_env<'a>(extra: &[(&'a str, Option<&'a str>)]) -> Vec<(&'a str, Option<&'a str>)> {
        let mut vars = vec![
            ("GOOGLE_MAPS_API_KEY", Some("maps-key")),
            ("GEMINI_API_KEY", Some("gemini-key")),
            ("PORT", None),
            ("HTTP_TIMEOUT_SECS", None),
            ("PROXY_BASE_URL", None),
        ];
        vars.extend_from_slice(extra);
        vars
    }

    #[test]
    fn test_from_env_defaults() {
        let config = with_env(&base_env(&[]), Config::from_env).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.http_timeout_secs, 15);
    }

    #[test]
    fn test_from_env_rejects_zero_timeout() {
        let result = with_env(
            &base_env(&[("HTTP_TIMEOUT_SECS", Some("0"))]),
            Config::from_env,
        );
        let err = result.unwrap_err().to_string();
        assert!(err.contains("HTTP_TIMEOUT_SECS"), "{}", err);
    }

    #[test]
    fn test_from_env_rejects_zero_port() {
        let result = with_env(&base_env(&[("PORT", Some("0"))]), Config::from_env);
        let err = result.unwrap_err().to_string();
        assert!(err.contains("PORT"), "{}", err);
    }

    #[test]
    fn test_port_var_bounds() {
        with_env(&[("TEST_SOLAR_PORT", Some("65536"))], || {
            assert!(port_var("TEST_SOLAR_PORT", 3000).is_err());
        });
        with_env(&[("TEST_SOLAR_PORT", Some("8080"))], || {
            assert_eq!(port_var("TEST_SOLAR_PORT", 3000).unwrap(), 8080);
        });
        with_env(&[("TEST_SOLAR_PORT", Some("abc"))], || {
            assert!(port_var("TEST_SOLAR_PORT", 3000).is_err());
        });
    }

    #[test]
    fn test_positive_u64_var() {
        with_env(&[("TEST_SOLAR_TIMEOUT", None)], || {
            assert_eq!(positive_u64_var("TEST_SOLAR_TIMEOUT", 15).unwrap(), 15);
        });
        with_env(&[("TEST_SOLAR_TIMEOUT", Some("0"))], || {
            assert!(positive_u64_var("TEST_SOLAR_TIMEOUT", 15).is_err());
        });
        with_env(&[("TEST_SOLAR_TIMEOUT", Some("-3"))], || {
            assert!(positive_u64_var("TEST_SOLAR_TIMEOUT", 15).is_err());
        });
    }

    #[test]
    fn test_validate_url() {
        assert!(validate_url("X", "https://example.com").is_ok());
        assert!(validate_url("X", "http://localhost:3001").is_ok());
        assert!(validate_url("X", "ftp://example.com").is_err());
        assert!(validate_url("X", "   ").is_err());
    }

    #[test]
    fn test_for_base_url_points_every_provider() {
        let config = Config::for_base_url("http://127.0.0.1:9999");
        assert_eq!(config.geocoding_base_url, "http://127.0.0.1:9999");
        assert_eq!(config.solar_base_url, "http://127.0.0.1:9999");
        assert_eq!(config.gemini_base_url, "http://127.0.0.1:9999");
        assert!(config.proxy_base_url.is_none());
    }
}
