//! Typed Configuration
//!
//! One configuration object, read from the environment once at startup.
//! Missing required keys abort startup with a `Config` error instead of
//! limping along with absent credentials.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{CoreError, Result};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_PIPELINE_TIMEOUT_SECS: u64 = 300;
const DEFAULT_SESSION_IDLE_SECS: u64 = 3600;

/// Stripe credentials and price identifiers
#[derive(Clone, Debug)]
pub struct StripeConfig {
    pub secret_key: String,
    pub webhook_secret: String,

    /// Stripe price id billed for the Pro plan; a plan without a price id
    /// is treated as not configured at checkout time
    pub pro_price_id: Option<String>,

    /// Stripe price id billed for the Enterprise plan
    pub enterprise_price_id: Option<String>,
}

/// External diagram pipeline endpoint
#[derive(Clone, Debug)]
pub struct PipelineEndpoint {
    pub base_url: String,
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Listen address for the HTTP server
    pub bind_addr: String,

    /// Public base URL, used for checkout success/cancel redirects
    pub base_url: String,

    /// Demo mode: mock pipeline and a billing stub that grants Pro without
    /// contacting Stripe. Must be enabled explicitly with `PAPERFIG_DEMO=1`.
    pub demo_mode: bool,

    /// Stripe configuration; `None` only in demo mode
    pub stripe: Option<StripeConfig>,

    /// Pipeline endpoint; `None` only in demo mode
    pub pipeline: Option<PipelineEndpoint>,

    /// Deadline for one generation call
    pub pipeline_timeout: Duration,

    /// Directory generated images are written to
    pub output_dir: PathBuf,

    /// Idle duration after which sessions are dropped
    pub session_idle: Duration,
}

impl AppConfig {
    /// Read configuration from process environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through a key lookup function
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let demo_mode = lookup("PAPERFIG_DEMO")
            .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let bind_addr =
            lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());

        let base_url = match lookup("APP_BASE_URL") {
            Some(url) => url.trim_end_matches('/').to_string(),
            None if demo_mode => "http://localhost:3000".to_string(),
            None => return Err(missing("APP_BASE_URL")),
        };

        let stripe = if demo_mode {
            None
        } else {
            Some(StripeConfig {
                secret_key: lookup("STRIPE_SECRET_KEY")
                    .ok_or_else(|| missing("STRIPE_SECRET_KEY"))?,
                webhook_secret: lookup("STRIPE_WEBHOOK_SECRET")
                    .ok_or_else(|| missing("STRIPE_WEBHOOK_SECRET"))?,
                pro_price_id: lookup("PRICE_ID_PRO"),
                enterprise_price_id: lookup("PRICE_ID_ENTERPRISE"),
            })
        };

        let pipeline = if demo_mode {
            None
        } else {
            Some(PipelineEndpoint {
                base_url: lookup("PIPELINE_URL")
                    .map(|url| url.trim_end_matches('/').to_string())
                    .ok_or_else(|| missing("PIPELINE_URL"))?,
            })
        };

        let pipeline_timeout =
            parse_secs(&lookup, "PIPELINE_TIMEOUT_SECS", DEFAULT_PIPELINE_TIMEOUT_SECS)?;
        let session_idle =
            parse_secs(&lookup, "SESSION_IDLE_SECS", DEFAULT_SESSION_IDLE_SECS)?;

        let output_dir = lookup("OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join("paperfig"));

        Ok(Self {
            bind_addr,
            base_url,
            demo_mode,
            stripe,
            pipeline,
            pipeline_timeout,
            output_dir,
            session_idle,
        })
    }
}

fn missing(key: &str) -> CoreError {
    CoreError::Config(format!("{} is not set", key))
}

fn parse_secs<F>(lookup: &F, key: &str, default: u64) -> Result<Duration>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(Duration::from_secs(default)),
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|_| CoreError::Config(format!("{} must be a number of seconds", key))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn full_env() -> HashMap<String, String> {
        env(&[
            ("STRIPE_SECRET_KEY", "sk_test_123"),
            ("STRIPE_WEBHOOK_SECRET", "whsec_123"),
            ("APP_BASE_URL", "https://paperfig.example/"),
            ("PIPELINE_URL", "https://pipeline.example"),
            ("PRICE_ID_PRO", "price_pro_123"),
        ])
    }

    #[test]
    fn test_full_config_parses() {
        let vars = full_env();
        let config = AppConfig::from_lookup(|k| vars.get(k).cloned()).unwrap();

        assert!(!config.demo_mode);
        assert_eq!(config.base_url, "https://paperfig.example");
        let stripe = config.stripe.unwrap();
        assert_eq!(stripe.pro_price_id.as_deref(), Some("price_pro_123"));
        assert_eq!(stripe.enterprise_price_id, None);
        assert_eq!(config.pipeline_timeout, Duration::from_secs(300));
    }

    #[test]
    fn test_each_required_key_fails_fast() {
        for key in [
            "STRIPE_SECRET_KEY",
            "STRIPE_WEBHOOK_SECRET",
            "APP_BASE_URL",
            "PIPELINE_URL",
        ] {
            let mut vars = full_env();
            vars.remove(key);
            let err = AppConfig::from_lookup(|k| vars.get(k).cloned()).unwrap_err();
            match err {
                CoreError::Config(msg) => assert!(msg.contains(key), "{msg}"),
                other => panic!("expected Config error, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_demo_mode_needs_no_credentials() {
        let vars = env(&[("PAPERFIG_DEMO", "1")]);
        let config = AppConfig::from_lookup(|k| vars.get(k).cloned()).unwrap();

        assert!(config.demo_mode);
        assert!(config.stripe.is_none());
        assert!(config.pipeline.is_none());
    }

    #[test]
    fn test_bad_timeout_is_a_config_error() {
        let mut vars = full_env();
        vars.insert("PIPELINE_TIMEOUT_SECS".into(), "soon".into());
        let err = AppConfig::from_lookup(|k| vars.get(k).cloned()).unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));
    }
}
