//! Connection counting through netstat

use crate::services::probe::{ConnectionCounter, ProbeError};
use async_trait::async_trait;
use tokio::process::Command;

/// Counts `netstat -an` lines mentioning a local or remote port
#[derive(Debug, Clone, Default)]
pub struct NetstatCounter;

impl NetstatCounter {
    fn pipeline(port: u16) -> String {
        // port must not be followed by another digit, so :80 does not match :8080
        format!("netstat -an | grep -E ':{}([^0-9]|$)' | wc -l", port)
    }
}

#[async_trait]
impl ConnectionCounter for NetstatCounter {
    async fn connection_count(&self, port: u16) -> Result<String, ProbeError> {
        let output = Command::new("sh")
            .arg("-c")
            .arg(Self::pipeline(port))
            .kill_on_drop(true)
            .output()
            .await?;

        // without pipefail a missing netstat only shows up on stderr
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() || !stderr.trim().is_empty() {
            return Err(ProbeError::Command(format!(
                "netstat pipeline ({}): {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_matches_whole_port() {
        assert_eq!(
            NetstatCounter::pipeline(80),
            "netstat -an | grep -E ':80([^0-9]|$)' | wc -l"
        );
    }
}
