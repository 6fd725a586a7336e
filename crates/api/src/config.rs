use std::path::PathBuf;
use std::time::Duration;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8123`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `ALLOWED_ORIGINS`.
    /// A single `*` entry allows any origin (without credentials).
    pub allowed_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`). The upload route
    /// is mounted outside this layer -- uploads are bounded by
    /// `max_upload_bytes`, not by wall clock.
    pub request_timeout_secs: u64,
    /// Maximum file-block payload size in bytes, derived from
    /// `MAX_UPLOAD_SIZE_GIB` (default: 1 GiB; fractional values allowed).
    pub max_upload_bytes: u64,
    /// Inactivity threshold after which a session is evicted (default: 1 h).
    pub session_timeout_secs: u64,
    /// Generated session-ID length (default: `6`).
    pub session_id_length: usize,
    /// Expected client liveness interval in seconds (default: `30`).
    pub heartbeat_interval_secs: u64,
    /// Missed intervals before a channel counts as disconnected (default: `2`).
    pub heartbeat_timeout_intervals: u32,
    /// Eviction sweeper period in seconds (default: `60`).
    pub eviction_sweep_secs: u64,
    /// How long an empty session survives awaiting reconnects (default: `120`).
    pub empty_session_grace_secs: u64,
    /// Blob store root for uploaded file blocks (default: `uploads`).
    pub upload_dir: PathBuf,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                       | Default   |
    /// |-------------------------------|-----------|
    /// | `HOST`                        | `0.0.0.0` |
    /// | `PORT`                        | `8123`    |
    /// | `ALLOWED_ORIGINS`             | `*`       |
    /// | `REQUEST_TIMEOUT_SECS`        | `30`      |
    /// | `MAX_UPLOAD_SIZE_GIB`         | `1`       |
    /// | `SESSION_TIMEOUT_SECONDS`     | `3600`    |
    /// | `SESSION_ID_LENGTH`           | `6`       |
    /// | `HEARTBEAT_INTERVAL_SECS`     | `30`      |
    /// | `HEARTBEAT_TIMEOUT_INTERVALS` | `2`       |
    /// | `EVICTION_SWEEP_SECS`         | `60`      |
    /// | `EMPTY_SESSION_GRACE_SECS`    | `120`     |
    /// | `UPLOAD_DIR`                  | `uploads` |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "8123".into())
            .parse()
            .expect("PORT must be a valid u16");

        let allowed_origins: Vec<String> = std::env::var("ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "*".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let max_upload_gib: f64 = std::env::var("MAX_UPLOAD_SIZE_GIB")
            .unwrap_or_else(|_| "1".into())
            .parse()
            .expect("MAX_UPLOAD_SIZE_GIB must be a number");
        let max_upload_bytes = (max_upload_gib * 1024.0 * 1024.0 * 1024.0) as u64;

        let session_timeout_secs: u64 = std::env::var("SESSION_TIMEOUT_SECONDS")
            .unwrap_or_else(|_| "3600".into())
            .parse()
            .expect("SESSION_TIMEOUT_SECONDS must be a valid u64");

        let session_id_length: usize = std::env::var("SESSION_ID_LENGTH")
            .unwrap_or_else(|_| "6".into())
            .parse()
            .expect("SESSION_ID_LENGTH must be a valid usize");

        let heartbeat_interval_secs: u64 = std::env::var("HEARTBEAT_INTERVAL_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("HEARTBEAT_INTERVAL_SECS must be a valid u64");

        let heartbeat_timeout_intervals: u32 = std::env::var("HEARTBEAT_TIMEOUT_INTERVALS")
            .unwrap_or_else(|_| "2".into())
            .parse()
            .expect("HEARTBEAT_TIMEOUT_INTERVALS must be a valid u32");

        let eviction_sweep_secs: u64 = std::env::var("EVICTION_SWEEP_SECS")
            .unwrap_or_else(|_| "60".into())
            .parse()
            .expect("EVICTION_SWEEP_SECS must be a valid u64");

        let empty_session_grace_secs: u64 = std::env::var("EMPTY_SESSION_GRACE_SECS")
            .unwrap_or_else(|_| "120".into())
            .parse()
            .expect("EMPTY_SESSION_GRACE_SECS must be a valid u64");

        let upload_dir = PathBuf::from(std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".into()));

        Self {
            host,
            port,
            allowed_origins,
            request_timeout_secs,
            max_upload_bytes,
            session_timeout_secs,
            session_id_length,
            heartbeat_interval_secs,
            heartbeat_timeout_intervals,
            eviction_sweep_secs,
            empty_session_grace_secs,
            upload_dir,
        }
    }

    /// Interval between heartbeat monitor ticks.
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }

    /// Silence threshold at which a channel counts as disconnected.
    pub fn heartbeat_timeout(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs * u64::from(self.heartbeat_timeout_intervals))
    }

    /// Inactivity threshold for session eviction.
    pub fn idle_timeout(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.session_timeout_secs as i64)
    }

    /// Grace period an empty session survives awaiting reconnects.
    pub fn empty_grace(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.empty_session_grace_secs as i64)
    }
}
