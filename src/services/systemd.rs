//! Unit state lookups through systemd

use crate::services::probe::{ProbeError, ServiceStateSource};
use async_trait::async_trait;
use tokio::process::Command;

/// `systemctl is-active` exit status for a unit that does not exist
const EXIT_UNKNOWN_UNIT: i32 = 4;

/// Asks `systemctl is-active` for the state of a unit
#[derive(Debug, Clone, Default)]
pub struct SystemctlStateSource;

/// Decide between a reported state and a failed query.
///
/// `is-active` exits non-zero for every state but "active" and still prints
/// the state; an unknown unit or an empty answer means the query failed.
fn interpret_is_active(
    unit: &str,
    code: Option<i32>,
    stdout: &str,
    stderr: &str,
) -> Result<String, ProbeError> {
    let state = stdout.trim();

    if code == Some(EXIT_UNKNOWN_UNIT) {
        return Err(ProbeError::Command(format!("unit {} not found", unit)));
    }

    if state.is_empty() {
        return Err(ProbeError::Command(format!(
            "systemctl is-active {} (exit {:?}): {}",
            unit,
            code,
            stderr.trim()
        )));
    }

    Ok(state.to_string())
}

#[async_trait]
impl ServiceStateSource for SystemctlStateSource {
    async fn active_state(&self, unit: &str) -> Result<String, ProbeError> {
        let output = Command::new("systemctl")
            .args(["is-active", unit])
            .kill_on_drop(true)
            .output()
            .await?;

        interpret_is_active(
            unit,
            output.status.code(),
            &String::from_utf8_lossy(&output.stdout),
            &String::from_utf8_lossy(&output.stderr),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_unit() {
        let state = interpret_is_active("nginx", Some(0), "active\n", "").unwrap();
        assert_eq!(state, "active");
    }

    #[test]
    fn test_inactive_unit_reports_its_state() {
        let state = interpret_is_active("jibri", Some(3), "inactive\n", "").unwrap();
        assert_eq!(state, "inactive");

        let state = interpret_is_active("jicofo", Some(3), "failed\n", "").unwrap();
        assert_eq!(state, "failed");
    }

    #[test]
    fn test_unknown_unit_is_an_error() {
        let result = interpret_is_active("coturn", Some(4), "inactive\n", "");
        assert!(matches!(result, Err(ProbeError::Command(_))));
    }

    #[test]
    fn test_empty_answer_is_an_error() {
        let result = interpret_is_active(
            "prosody",
            Some(1),
            "",
            "Failed to connect to bus: No such file or directory",
        );
        assert!(matches!(result, Err(ProbeError::Command(_))));

        // killed by a signal: no exit code, no output
        let result = interpret_is_active("prosody", None, "", "");
        assert!(matches!(result, Err(ProbeError::Command(_))));
    }
}
