//! Build action execution
//!
//! Consumes the lazy action sequence a handler hook hands back and runs
//! each step, short-circuiting on the first failure. Command output is
//! captured line by line and forwarded to tracing.

use camino::Utf8Path;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

use crate::{Error, Result};

use super::action::{BuildAction, BuildActions, CommandAction};

/// Executes build actions sequentially
pub struct ActionExecutor {
    runtime: tokio::runtime::Runtime,
}

impl ActionExecutor {
    /// Create an executor with its own runtime for process I/O
    pub fn new() -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| Error::build("Failed to create async runtime", e.to_string()))?;
        Ok(Self { runtime })
    }

    /// Run an action sequence for a package.
    ///
    /// Actions execute in iteration order; the first failure abandons
    /// the remainder of the sequence. An empty sequence succeeds
    /// trivially.
    pub fn run(
        &self,
        actions: BuildActions,
        build_space: &Utf8Path,
        package_name: &str,
    ) -> Result<()> {
        for action in actions {
            match action? {
                BuildAction::Command(command) => {
                    self.run_command(command, build_space, package_name)?;
                }
                BuildAction::Function => return Err(Error::UnsupportedAction),
            }
        }
        Ok(())
    }

    fn run_command(
        &self,
        action: CommandAction,
        build_space: &Utf8Path,
        package_name: &str,
    ) -> Result<()> {
        if action.argv.is_empty() {
            return Err(Error::build(
                format!("Handler yielded an empty command for '{}'", package_name),
                "This indicates a bug in the build-type handler",
            ));
        }

        let cwd = action
            .cwd
            .clone()
            .unwrap_or_else(|| build_space.to_path_buf());
        let cmd_display = action.argv.join(" ");
        tracing::info!(package = %package_name, "==> '{}'", cmd_display);

        let mut command = Command::new(&action.argv[0]);
        command.args(&action.argv[1..]).current_dir(&cwd);

        let status = self
            .runtime
            .block_on(run_with_logging(command, package_name))
            .map_err(|e| {
                tracing::error!(package = %package_name, "Failed to start '{}': {}", cmd_display, e);
                Error::command_execution(&cmd_display, package_name, None)
            })?;

        if !status.success() {
            if action.test {
                return Err(Error::test_failure(package_name));
            }
            return Err(Error::command_execution(
                &cmd_display,
                package_name,
                status.code(),
            ));
        }

        Ok(())
    }
}

/// Run a command, streaming its stdout and stderr into tracing
async fn run_with_logging(
    mut command: Command,
    package_name: &str,
) -> std::io::Result<std::process::ExitStatus> {
    command.stdout(Stdio::piped()).stderr(Stdio::piped());

    let mut child = command.spawn()?;

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let package_stdout = package_name.to_string();
    let stdout_task = tokio::spawn(async move {
        if let Some(stdout) = stdout {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                tracing::debug!(target: "build_output", package = %package_stdout, "{}", line);
            }
        }
    });

    let package_stderr = package_name.to_string();
    let stderr_task = tokio::spawn(async move {
        if let Some(stderr) = stderr {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                tracing::warn!(target: "build_output", package = %package_stderr, "{}", line);
            }
        }
    });

    let status = child.wait().await;
    let _ = stdout_task.await;
    let _ = stderr_task.await;
    status
}
