//! A [`DataSource`] backed by shell commands that print JSON.

use std::process::Stdio;
use std::time::Duration;

use serde_json::Value;
use tokio::process::Command;
use tracing::debug;

use vigil_core::{DataSource, FetchError, LocalCacheStore};

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

pub struct CommandSource {
    key: String,
    live: String,
    cached: Option<String>,
    local: LocalCacheStore,
    timeout: Duration,
}

impl CommandSource {
    /// Without a `cached` command the cached fetch re-reads `local`.
    pub fn new(
        key: impl Into<String>,
        live: impl Into<String>,
        cached: Option<String>,
        local: LocalCacheStore,
    ) -> Self {
        Self {
            key: key.into(),
            live: live.into(),
            cached,
            local,
            timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl DataSource for CommandSource {
    type Payload = Value;

    async fn fetch_live(&self) -> Result<Value, FetchError> {
        run_json_command(&self.live, self.timeout).await
    }

    async fn fetch_cached(&self) -> Result<Value, FetchError> {
        match &self.cached {
            Some(command) => run_json_command(command, self.timeout).await,
            None => self
                .local
                .read::<Value>(&self.key)
                .map(|entry| entry.payload)
                .ok_or_else(|| FetchError::Transport {
                    message: format!("no cached data for '{}'", self.key),
                }),
        }
    }
}

/// Run `command` through `sh -c` and parse its stdout as JSON.
///
/// A non-zero exit maps to [`FetchError::Status`] carrying the exit code
/// and trimmed stderr.
pub async fn run_json_command(command: &str, timeout: Duration) -> Result<Value, FetchError> {
    debug!(event = "cli.source.command_started", command = command);

    let output = Command::new("sh")
        .arg("-c")
        .arg(command)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output();

    let output = tokio::time::timeout(timeout, output)
        .await
        .map_err(|_| FetchError::Timeout)?
        .map_err(|e| FetchError::Transport {
            message: format!("could not run '{}': {}", command, e),
        })?;

    if !output.status.success() {
        let code = output
            .status
            .code()
            .and_then(|c| u16::try_from(c).ok())
            .unwrap_or(u16::MAX);
        return Err(FetchError::Status {
            code,
            message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    serde_json::from_slice(&output.stdout).map_err(|e| FetchError::Decode {
        message: e.to_string(),
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::sync::Arc;
    use vigil_core::{MemoryStore, SystemClock};

    fn local() -> LocalCacheStore {
        LocalCacheStore::new(Arc::new(MemoryStore::new()), Arc::new(SystemClock))
    }

    #[tokio::test]
    async fn test_stdout_json_is_parsed() {
        let value = run_json_command(r#"echo '{"rx": 100, "tx": 50}'"#, DEFAULT_FETCH_TIMEOUT)
            .await
            .unwrap();
        assert_eq!(value, serde_json::json!({"rx": 100, "tx": 50}));
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_status_error() {
        let err = run_json_command("echo 'backend down' >&2; exit 3", DEFAULT_FETCH_TIMEOUT)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            FetchError::Status {
                code: 3,
                message: "backend down".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_invalid_json_is_decode_error() {
        let err = run_json_command("echo not-json", DEFAULT_FETCH_TIMEOUT)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_slow_command_times_out() {
        let err = run_json_command("sleep 5", Duration::from_millis(50))
            .await
            .unwrap_err();
        assert_eq!(err, FetchError::Timeout);
    }

    #[tokio::test]
    async fn test_cached_fetch_rereads_local_cache_without_command() {
        let local = local();
        let source = CommandSource::new("traffic", "exit 1", None, local.clone());

        assert!(source.fetch_cached().await.is_err());

        local.write("traffic", &serde_json::json!({"rx": 1}));
        assert_eq!(
            source.fetch_cached().await.unwrap(),
            serde_json::json!({"rx": 1})
        );
    }

    #[tokio::test]
    async fn test_cached_fetch_prefers_command() {
        let source = CommandSource::new(
            "traffic",
            "exit 1",
            Some(r#"echo '{"rx": 7}'"#.to_string()),
            local(),
        );
        assert_eq!(
            source.fetch_cached().await.unwrap(),
            serde_json::json!({"rx": 7})
        );
    }
}
