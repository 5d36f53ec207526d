//! Shell command execution for /exec

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Exit code reported when the shell itself could not be started
pub const SPAWN_FAILURE_EXIT_CODE: i32 = 127;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

/// Runs commands through `<shell> -c`
#[derive(Debug, Clone)]
pub struct ExecService {
    shell: String,
}

impl ExecService {
    pub fn new(shell: impl Into<String>) -> Self {
        Self { shell: shell.into() }
    }

    pub fn shell(&self) -> &str {
        &self.shell
    }

    /// Run `command` to completion. Never fails: spawn errors are reported
    /// in `stderr` with exit code 127, signal deaths with -1.
    pub async fn run(&self, command: &str) -> CommandOutput {
        debug!(shell = %self.shell, command, "Executing command");

        let output = match tokio::process::Command::new(&self.shell)
            .args(["-c", command])
            .kill_on_drop(true)
            .output()
            .await
        {
            Ok(output) => output,
            Err(e) => {
                warn!(shell = %self.shell, error = %e, "Failed to start shell");
                return CommandOutput {
                    stdout: String::new(),
                    stderr: e.to_string(),
                    exit_code: SPAWN_FAILURE_EXIT_CODE,
                };
            }
        };

        let exit_code = output.status.code().unwrap_or(-1);
        debug!(exit_code, "Command finished");

        CommandOutput {
            stdout: trim_trailing_newlines(&String::from_utf8_lossy(&output.stdout)),
            stderr: trim_trailing_newlines(&String::from_utf8_lossy(&output.stderr)),
            exit_code,
        }
    }
}

fn trim_trailing_newlines(s: &str) -> String {
    s.trim_end_matches('\n').to_string()
}
