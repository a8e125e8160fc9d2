// Runs external PDF tools with a wall-clock budget.

use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio::runtime::{Builder, Handle};
use tracing::warn;

use super::EngineError;

/// Runs `command` to completion and returns its stdout. The child is killed
/// once `timeout` elapses.
///
/// Engines are synchronous, so this drives the async runner on the current
/// runtime when called from its blocking pool, or on a private
/// current-thread runtime otherwise. Must not be called from async code.
pub fn run_with_timeout(
    command: Command,
    tool: &'static str,
    timeout: Duration,
) -> Result<Vec<u8>, EngineError> {
    let run = run_async(command, tool, timeout);
    match Handle::try_current() {
        Ok(handle) => handle.block_on(run),
        Err(_) => Builder::new_current_thread().enable_all().build()?.block_on(run),
    }
}

pub async fn run_async(
    mut command: Command,
    tool: &'static str,
    timeout: Duration,
) -> Result<Vec<u8>, EngineError> {
    command.stdin(Stdio::null()).kill_on_drop(true);

    // Dropping the `output()` future on expiry kills the child.
    let output = match tokio::time::timeout(timeout, command.output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(EngineError::ToolNotFound(tool));
        }
        Ok(Err(e)) => return Err(EngineError::Io(e)),
        Err(_) => {
            warn!(tool, ?timeout, "Killed after exceeding its time budget");
            return Err(EngineError::TimedOut { tool, timeout });
        }
    };

    if output.status.success() {
        Ok(output.stdout)
    } else {
        Err(EngineError::Failed {
            tool,
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_collects_stdout() {
        let mut cmd = Command::new("echo");
        cmd.arg("hello");
        let out = run_with_timeout(cmd, "echo", Duration::from_secs(5)).unwrap();
        assert_eq!(String::from_utf8_lossy(&out).trim(), "hello");
    }

    #[test]
    fn test_missing_tool() {
        let cmd = Command::new("pdfscan-definitely-not-installed");
        let err = run_with_timeout(cmd, "missing", Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, EngineError::ToolNotFound("missing")));
    }

    #[test]
    fn test_nonzero_exit_is_failure() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "echo broken >&2; exit 3"]);
        let err = run_with_timeout(cmd, "sh", Duration::from_secs(5)).unwrap_err();
        match err {
            EngineError::Failed { tool, stderr, .. } => {
                assert_eq!(tool, "sh");
                assert_eq!(stderr, "broken");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_times_out() {
        let mut cmd = Command::new("sleep");
        cmd.arg("5");
        let started = Instant::now();
        let err = run_with_timeout(cmd, "sleep", Duration::from_millis(100)).unwrap_err();
        assert!(matches!(err, EngineError::TimedOut { tool: "sleep", .. }));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_runs_on_blocking_pool() {
        let out = tokio::task::spawn_blocking(|| {
            let mut cmd = Command::new("echo");
            cmd.arg("pooled");
            run_with_timeout(cmd, "echo", Duration::from_secs(5))
        })
        .await
        .unwrap()
        .unwrap();
        assert_eq!(String::from_utf8_lossy(&out).trim(), "pooled");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_times_out_on_blocking_pool() {
        let err = tokio::task::spawn_blocking(|| {
            let mut cmd = Command::new("sleep");
            cmd.arg("5");
            run_with_timeout(cmd, "sleep", Duration::from_millis(100))
        })
        .await
        .unwrap()
        .unwrap_err();
        assert!(matches!(err, EngineError::TimedOut { .. }));
    }
}
