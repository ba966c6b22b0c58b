use std::str::FromStr;
use std::time::Duration;

use stylist_core::imaging::CompressionConfig;

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development. In
/// production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Time allowed for background loops to stop after a shutdown signal.
    pub shutdown_timeout_secs: u64,
    /// JWT verification settings.
    pub jwt: JwtConfig,
    /// PostgreSQL URL. `None` runs the in-memory store and queue.
    pub database_url: Option<String>,
    pub pipeline: PipelineConfig,
    pub transformer: TransformerConfig,
}

/// Timeouts, sweep cadences and limits of the task pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub max_upload_bytes: usize,
    /// A `PENDING` task older than this is canceled instead of processed.
    pub max_time_from_start: Duration,
    /// A `PROCESSING` task idle for longer than this is canceled by the sweep.
    pub max_processing: Duration,
    /// Completed results older than this are cleared.
    pub result_ttl: Duration,
    pub long_processing_sweep_interval: Duration,
    pub result_retention_sweep_interval: Duration,
    pub worker_concurrency: usize,
    pub queue_poll_interval: Duration,
    pub queue_visibility_timeout: Duration,
    pub compression: CompressionConfig,
}

/// Remote transformer endpoint.
#[derive(Debug, Clone)]
pub struct TransformerConfig {
    pub url: String,
    pub api_key: String,
    /// Applied to both connect and read.
    pub timeout: Duration,
    pub style_sync_interval: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: 10 * 1024 * 1024,
            max_time_from_start: Duration::from_secs(120),
            max_processing: Duration::from_secs(300),
            result_ttl: Duration::from_secs(3600),
            long_processing_sweep_interval: Duration::from_secs(60),
            result_retention_sweep_interval: Duration::from_secs(600),
            worker_concurrency: 4,
            queue_poll_interval: Duration::from_millis(500),
            queue_visibility_timeout: Duration::from_secs(600),
            compression: CompressionConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Reject values the pipeline cannot run with.
    ///
    /// # Panics
    ///
    /// Panics on a zero worker count or a zero loop period; a zero period
    /// would otherwise panic inside the spawned loop after startup.
    pub fn validate(&self) {
        assert!(self.worker_concurrency > 0, "WORKER_CONCURRENCY must be at least 1");
        assert!(self.max_upload_bytes > 0, "MAX_UPLOAD_BYTES must be at least 1");
        require_nonzero("QUEUE_POLL_INTERVAL_MS", self.queue_poll_interval);
        require_nonzero(
            "LONG_PROCESSING_SWEEP_INTERVAL_SECS",
            self.long_processing_sweep_interval,
        );
        require_nonzero(
            "RESULT_RETENTION_SWEEP_INTERVAL_SECS",
            self.result_retention_sweep_interval,
        );
        require_nonzero("QUEUE_VISIBILITY_TIMEOUT_SECS", self.queue_visibility_timeout);
    }
}

impl TransformerConfig {
    /// # Panics
    ///
    /// Panics on a zero timeout or a zero style sync period.
    pub fn validate(&self) {
        require_nonzero("TRANSFORMER_TIMEOUT_SECS", self.timeout);
        require_nonzero("STYLE_SYNC_INTERVAL_SECS", self.style_sync_interval);
    }
}

fn require_nonzero(key: &str, value: Duration) {
    assert!(!value.is_zero(), "{key} must be greater than zero");
}

/// Read `key` and parse it, falling back to `default` when unset.
///
/// # Panics
///
/// Panics if the variable is set but does not parse, so misconfiguration
/// fails at startup.
fn env_or<T>(key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|e| panic!("{key} is invalid ({raw:?}): {e}")),
        Err(_) => default,
    }
}

fn env_secs(key: &str, default: Duration) -> Duration {
    Duration::from_secs(env_or(key, default.as_secs()))
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                                | Default                    |
    /// |----------------------------------------|----------------------------|
    /// | `HOST`                                 | `0.0.0.0`                  |
    /// | `PORT`                                 | `3000`                     |
    /// | `CORS_ORIGINS`                         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`                 | `30`                       |
    /// | `SHUTDOWN_TIMEOUT_SECS`                | `30`                       |
    /// | `DATABASE_URL`                         | unset (in-memory)          |
    /// | `MAX_UPLOAD_BYTES`                     | `10485760`                 |
    /// | `MAX_TIME_FROM_START_SECS`             | `120`                      |
    /// | `MAX_PROCESSING_SECS`                  | `300`                      |
    /// | `RESULT_TTL_SECS`                      | `3600`                     |
    /// | `LONG_PROCESSING_SWEEP_INTERVAL_SECS`  | `60`                       |
    /// | `RESULT_RETENTION_SWEEP_INTERVAL_SECS` | `600`                      |
    /// | `WORKER_CONCURRENCY`                   | `4`                        |
    /// | `QUEUE_POLL_INTERVAL_MS`               | `500`                      |
    /// | `QUEUE_VISIBILITY_TIMEOUT_SECS`        | `600`                      |
    /// | `COMPRESSION_ENABLED`                  | `true`                     |
    /// | `COMPRESSION_QUALITY`                  | `85`                       |
    /// | `COMPRESSION_MAX_WIDTH`                | `1920`                     |
    /// | `COMPRESSION_MAX_HEIGHT`               | `1920`                     |
    /// | `COMPRESSION_MIN_BYTES`                | `1048576`                  |
    /// | `TRANSFORMER_URL`                      | `http://localhost:8000`    |
    /// | `TRANSFORMER_API_KEY`                  | empty                      |
    /// | `TRANSFORMER_TIMEOUT_SECS`             | `60`                       |
    /// | `STYLE_SYNC_INTERVAL_SECS`             | `3600`                     |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port: u16 = env_or("PORT", 3000);

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = env_or("REQUEST_TIMEOUT_SECS", 30);
        let shutdown_timeout_secs: u64 = env_or("SHUTDOWN_TIMEOUT_SECS", 30);

        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());

        let defaults = PipelineConfig::default();
        let compression = CompressionConfig {
            enabled: env_or("COMPRESSION_ENABLED", defaults.compression.enabled),
            quality: env_or("COMPRESSION_QUALITY", defaults.compression.quality),
            max_width: env_or("COMPRESSION_MAX_WIDTH", defaults.compression.max_width),
            max_height: env_or("COMPRESSION_MAX_HEIGHT", defaults.compression.max_height),
            min_bytes: env_or("COMPRESSION_MIN_BYTES", defaults.compression.min_bytes),
        };
        assert!(
            (1..=100).contains(&compression.quality),
            "COMPRESSION_QUALITY must be between 1 and 100"
        );

        let worker_concurrency: usize = env_or("WORKER_CONCURRENCY", defaults.worker_concurrency);

        let pipeline = PipelineConfig {
            max_upload_bytes: env_or("MAX_UPLOAD_BYTES", defaults.max_upload_bytes),
            max_time_from_start: env_secs("MAX_TIME_FROM_START_SECS", defaults.max_time_from_start),
            max_processing: env_secs("MAX_PROCESSING_SECS", defaults.max_processing),
            result_ttl: env_secs("RESULT_TTL_SECS", defaults.result_ttl),
            long_processing_sweep_interval: env_secs(
                "LONG_PROCESSING_SWEEP_INTERVAL_SECS",
                defaults.long_processing_sweep_interval,
            ),
            result_retention_sweep_interval: env_secs(
                "RESULT_RETENTION_SWEEP_INTERVAL_SECS",
                defaults.result_retention_sweep_interval,
            ),
            worker_concurrency,
            queue_poll_interval: Duration::from_millis(env_or(
                "QUEUE_POLL_INTERVAL_MS",
                defaults.queue_poll_interval.as_millis() as u64,
            )),
            queue_visibility_timeout: env_secs(
                "QUEUE_VISIBILITY_TIMEOUT_SECS",
                defaults.queue_visibility_timeout,
            ),
            compression,
        };

        let transformer = TransformerConfig {
            url: std::env::var("TRANSFORMER_URL")
                .unwrap_or_else(|_| "http://localhost:8000".into()),
            api_key: std::env::var("TRANSFORMER_API_KEY").unwrap_or_default(),
            timeout: env_secs("TRANSFORMER_TIMEOUT_SECS", Duration::from_secs(60)),
            style_sync_interval: env_secs("STYLE_SYNC_INTERVAL_SECS", Duration::from_secs(3600)),
        };

        pipeline.validate();
        transformer.validate();

        if pipeline.queue_visibility_timeout <= transformer.timeout {
            tracing::warn!(
                visibility_secs = pipeline.queue_visibility_timeout.as_secs(),
                transformer_timeout_secs = transformer.timeout.as_secs(),
                "Queue visibility timeout should exceed the transformer timeout",
            );
        }

        let jwt = JwtConfig::from_env();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            jwt,
            database_url,
            pipeline,
            transformer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transformer() -> TransformerConfig {
        TransformerConfig {
            url: "http://localhost:8000".into(),
            api_key: String::new(),
            timeout: Duration::from_secs(60),
            style_sync_interval: Duration::from_secs(3600),
        }
    }

    #[test]
    fn defaults_are_valid() {
        PipelineConfig::default().validate();
        transformer().validate();
    }

    #[test]
    #[should_panic(expected = "QUEUE_POLL_INTERVAL_MS must be greater than zero")]
    fn zero_poll_interval_is_rejected() {
        PipelineConfig {
            queue_poll_interval: Duration::ZERO,
            ..PipelineConfig::default()
        }
        .validate();
    }

    #[test]
    #[should_panic(expected = "LONG_PROCESSING_SWEEP_INTERVAL_SECS must be greater than zero")]
    fn zero_long_processing_interval_is_rejected() {
        PipelineConfig {
            long_processing_sweep_interval: Duration::ZERO,
            ..PipelineConfig::default()
        }
        .validate();
    }

    #[test]
    #[should_panic(expected = "RESULT_RETENTION_SWEEP_INTERVAL_SECS must be greater than zero")]
    fn zero_retention_interval_is_rejected() {
        PipelineConfig {
            result_retention_sweep_interval: Duration::ZERO,
            ..PipelineConfig::default()
        }
        .validate();
    }

    #[test]
    #[should_panic(expected = "WORKER_CONCURRENCY must be at least 1")]
    fn zero_workers_are_rejected() {
        PipelineConfig {
            worker_concurrency: 0,
            ..PipelineConfig::default()
        }
        .validate();
    }

    #[test]
    #[should_panic(expected = "STYLE_SYNC_INTERVAL_SECS must be greater than zero")]
    fn zero_style_sync_interval_is_rejected() {
        TransformerConfig {
            style_sync_interval: Duration::ZERO,
            ..transformer()
        }
        .validate();
    }

    #[test]
    fn env_secs_falls_back_when_unset() {
        assert_eq!(
            env_secs("STYLIST_TEST_UNSET_VARIABLE", Duration::from_secs(7)),
            Duration::from_secs(7)
        );
    }
}
