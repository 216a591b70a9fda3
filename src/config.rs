use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub razorpay: RazorpayConfig,
    #[serde(default)]
    pub linkedin: LinkedInConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub cron: CronConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_expires_in: i64, // seconds
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RazorpayConfig {
    pub key_id: String,
    pub key_secret: String,
    pub webhook_secret: String,
    #[serde(default = "default_razorpay_base_url")]
    pub base_url: String,
    #[serde(default = "default_currency")]
    pub currency: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkedInConfig {
    #[serde(default = "default_linkedin_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_linkedin_timeout")]
    pub request_timeout_secs: u64,
}

/// Sequential requests in an image post: register, fetch, upload, publish.
pub const ADAPTER_REQUEST_BUDGET: u64 = 4;

impl LinkedInConfig {
    /// Upper bound on one adapter call.
    pub fn adapter_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.saturating_mul(ADAPTER_REQUEST_BUDGET))
    }
}

impl Default for LinkedInConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_linkedin_base_url(),
            request_timeout_secs: default_linkedin_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: i32,
    /// A `dispatching` row older than this is treated as abandoned.
    #[serde(default = "default_claim_lease")]
    pub claim_lease_secs: i64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sweep_interval_secs: default_sweep_interval(),
            max_attempts: default_max_attempts(),
            claim_lease_secs: default_claim_lease(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CronConfig {
    #[serde(default)]
    pub secret: String,
}

fn default_razorpay_base_url() -> String {
    "https://api.razorpay.com".to_string()
}

fn default_currency() -> String {
    "INR".to_string()
}

fn default_linkedin_base_url() -> String {
    "https://api.linkedin.com".to_string()
}

fn default_linkedin_timeout() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

fn default_sweep_interval() -> u64 {
    60
}

fn default_max_attempts() -> i32 {
    3
}

fn default_claim_lease() -> i64 {
    600
}

impl Config {
    pub fn from_toml() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        // Without a config file everything comes from the environment.
        let config_result = std::fs::read_to_string(&config_path);

        let mut config: Config = match config_result {
            Ok(config_str) => toml::from_str(&config_str)
                .map_err(|e| format!("Failed to parse config file: {e}"))?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                fn get_env(name: &str) -> Option<String> {
                    env::var(name).ok()
                }
                fn get_env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
                    env::var(name)
                        .ok()
                        .and_then(|v| v.parse::<T>().ok())
                        .unwrap_or(default)
                }

                let database_url = get_env("DATABASE_URL")
                    .ok_or("DATABASE_URL is not set and no config.toml was found")?;

                Config {
                    server: ServerConfig {
                        host: get_env("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                        port: get_env_parse("SERVER_PORT", 8080u16),
                    },
                    database: DatabaseConfig {
                        url: database_url,
                        max_connections: get_env_parse("DB_MAX_CONNECTIONS", 10u32),
                    },
                    jwt: JwtConfig {
                        secret: get_env("JWT_SECRET")
                            .unwrap_or_else(|| "change-me-in-production".to_string()),
                        access_token_expires_in: get_env_parse("JWT_ACCESS_EXPIRES_IN", 7200i64),
                    },
                    razorpay: RazorpayConfig {
                        key_id: get_env("RAZORPAY_KEY_ID").unwrap_or_default(),
                        key_secret: get_env("RAZORPAY_KEY_SECRET").unwrap_or_default(),
                        webhook_secret: get_env("RAZORPAY_WEBHOOK_SECRET").unwrap_or_default(),
                        base_url: get_env("RAZORPAY_BASE_URL")
                            .unwrap_or_else(default_razorpay_base_url),
                        currency: get_env("RAZORPAY_CURRENCY").unwrap_or_else(default_currency),
                    },
                    linkedin: LinkedInConfig::default(),
                    scheduler: SchedulerConfig::default(),
                    cron: CronConfig::default(),
                }
            }
            Err(e) => {
                return Err(format!("Cannot read config file {config_path}: {e}").into());
            }
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    // Environment wins over the file even when the file exists.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = env::var("SERVER_HOST") {
            self.server.host = v;
        }
        if let Ok(v) = env::var("SERVER_PORT")
            && let Ok(p) = v.parse()
        {
            self.server.port = p;
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = v;
        }
        if let Ok(v) = env::var("DB_MAX_CONNECTIONS")
            && let Ok(mc) = v.parse()
        {
            self.database.max_connections = mc;
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            self.jwt.secret = v;
        }
        if let Ok(v) = env::var("JWT_ACCESS_EXPIRES_IN")
            && let Ok(n) = v.parse()
        {
            self.jwt.access_token_expires_in = n;
        }
        if let Ok(v) = env::var("RAZORPAY_KEY_ID") {
            self.razorpay.key_id = v;
        }
        if let Ok(v) = env::var("RAZORPAY_KEY_SECRET") {
            self.razorpay.key_secret = v;
        }
        if let Ok(v) = env::var("RAZORPAY_WEBHOOK_SECRET") {
            self.razorpay.webhook_secret = v;
        }
        if let Ok(v) = env::var("RAZORPAY_BASE_URL") {
            self.razorpay.base_url = v;
        }
        if let Ok(v) = env::var("RAZORPAY_CURRENCY") {
            self.razorpay.currency = v;
        }
        if let Ok(v) = env::var("LINKEDIN_API_BASE_URL") {
            self.linkedin.api_base_url = v;
        }
        if let Ok(v) = env::var("LINKEDIN_TIMEOUT_SECS")
            && let Ok(n) = v.parse()
        {
            self.linkedin.request_timeout_secs = n;
        }
        if let Ok(v) = env::var("SCHEDULER_ENABLED")
            && let Ok(b) = v.parse()
        {
            self.scheduler.enabled = b;
        }
        if let Ok(v) = env::var("SCHEDULER_SWEEP_INTERVAL_SECS")
            && let Ok(n) = v.parse()
        {
            self.scheduler.sweep_interval_secs = n;
        }
        if let Ok(v) = env::var("SCHEDULER_MAX_ATTEMPTS")
            && let Ok(n) = v.parse()
        {
            self.scheduler.max_attempts = n;
        }
        if let Ok(v) = env::var("SCHEDULER_CLAIM_LEASE_SECS")
            && let Ok(n) = v.parse()
        {
            self.scheduler.claim_lease_secs = n;
        }
        if let Ok(v) = env::var("CRON_SECRET") {
            self.cron.secret = v;
        }
    }

    fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        if self.scheduler.max_attempts < 1 {
            return Err("scheduler.max_attempts must be at least 1".into());
        }
        if self.scheduler.sweep_interval_secs == 0 {
            return Err("scheduler.sweep_interval_secs must be positive".into());
        }
        if self.linkedin.request_timeout_secs == 0 {
            return Err("linkedin.request_timeout_secs must be positive".into());
        }
        let adapter_timeout = self.linkedin.adapter_timeout().as_secs();
        if self.scheduler.claim_lease_secs <= 0
            || (self.scheduler.claim_lease_secs as u64) <= adapter_timeout
        {
            return Err(format!(
                "scheduler.claim_lease_secs must exceed the adapter timeout of {adapter_timeout}s"
            )
            .into());
        }
        Ok(())
    }
}
