//! External status file health probing

use async_trait::async_trait;
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use super::{Probe, ProbeError};

/// Probe that inspects a status file maintained by another process
///
/// Checks, in order: the file is readable; its mtime is within the TTL
/// (when a TTL is configured); no line contains the error string; some
/// line contains the success string (when one is required).
#[derive(Debug, Clone)]
pub struct StatusFileProbe {
    path: PathBuf,
    ttl: Duration,
    error_string: String,
    success_string: String,
}

impl StatusFileProbe {
    /// Create a new status-file probe; a zero `ttl` disables the age check
    pub fn new(
        path: impl Into<PathBuf>,
        ttl: Duration,
        error_string: impl Into<String>,
        success_string: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            ttl,
            error_string: error_string.into(),
            success_string: success_string.into(),
        }
    }
}

#[async_trait]
impl Probe for StatusFileProbe {
    async fn execute(&self) -> Result<String, ProbeError> {
        let metadata = fs::metadata(&self.path)?;

        if !self.ttl.is_zero() {
            let mtime = metadata.modified()?;
            let age = SystemTime::now()
                .duration_since(mtime)
                .unwrap_or(Duration::ZERO);
            if age > self.ttl {
                return Err(ProbeError::Failed(format!(
                    "status file {} is stale ({}s old)",
                    self.path.display(),
                    age.as_secs()
                )));
            }
        }

        let contents = fs::read_to_string(&self.path)?;

        if !self.error_string.is_empty() {
            if let Some(line) = contents.lines().find(|l| l.contains(&self.error_string)) {
                return Err(ProbeError::Failed(format!(
                    "error string found in {}: {}",
                    self.path.display(),
                    line.trim()
                )));
            }
        }

        if !self.success_string.is_empty()
            && !contents.lines().any(|l| l.contains(&self.success_string))
        {
            return Err(ProbeError::Failed(format!(
                "success string \"{}\" not found in {}",
                self.success_string,
                self.path.display()
            )));
        }

        Ok(String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file(label: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "rscheck-status-{}-{}-{}",
            label,
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        ));
        fs::write(&path, contents).expect("write status file");
        path
    }

    #[tokio::test]
    async fn test_missing_file_is_an_error() {
        let probe = StatusFileProbe::new("/nonexistent/rscheck-status", Duration::ZERO, "", "");
        match probe.execute().await.unwrap_err() {
            ProbeError::Io(_) => {}
            other => panic!("Expected ProbeError::Io, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fresh_file_with_no_strings_passes() {
        let path = temp_file("plain", "all good\n");
        let probe = StatusFileProbe::new(&path, Duration::from_secs(60), "", "");
        assert!(probe.execute().await.is_ok());
        let _ = fs::remove_file(path);
    }

    #[tokio::test]
    async fn test_error_string_fails_and_quotes_the_line() {
        let path = temp_file("error", "phase one ok\nFATAL: disk on fire\n");
        let probe = StatusFileProbe::new(&path, Duration::ZERO, "FATAL", "");
        match probe.execute().await.unwrap_err() {
            ProbeError::Failed(msg) => assert!(msg.contains("disk on fire")),
            other => panic!("Expected ProbeError::Failed, got {other:?}"),
        }
        let _ = fs::remove_file(path);
    }

    #[tokio::test]
    async fn test_required_success_string() {
        let path = temp_file("success", "sync complete\n");
        let present = StatusFileProbe::new(&path, Duration::ZERO, "", "complete");
        assert!(present.execute().await.is_ok());

        let absent = StatusFileProbe::new(&path, Duration::ZERO, "", "running");
        match absent.execute().await.unwrap_err() {
            ProbeError::Failed(msg) => assert!(msg.contains("running")),
            other => panic!("Expected ProbeError::Failed, got {other:?}"),
        }
        let _ = fs::remove_file(path);
    }

    #[tokio::test]
    async fn test_error_string_wins_over_success_string() {
        let path = temp_file("both", "ERROR but also complete\n");
        let probe = StatusFileProbe::new(&path, Duration::ZERO, "ERROR", "complete");
        assert!(probe.execute().await.is_err());
        let _ = fs::remove_file(path);
    }

    #[tokio::test]
    async fn test_zero_ttl_ignores_age() {
        let path = temp_file("ttl", "ok\n");
        let probe = StatusFileProbe::new(&path, Duration::ZERO, "", "");
        assert!(probe.execute().await.is_ok());
        let _ = fs::remove_file(path);
    }
}
