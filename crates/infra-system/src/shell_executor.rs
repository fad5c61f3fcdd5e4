// Shell command executor
// reason: tokio::process so output can be streamed line by line while waiting
use async_trait::async_trait;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, info};

use pkgagent_core::port::{CommandExecutor, CommandSpec, ExecutionError, ExecutionResult};

const SUDO: &str = "sudo";

/// Spawns commands as child processes and collects their combined output
pub struct ShellCommandExecutor {
    use_sudo: bool,
    default_timeout: Option<Duration>,
}

impl ShellCommandExecutor {
    /// Create a new shell executor
    ///
    /// # Arguments
    /// * `use_sudo` - Prefix privileged commands with `sudo -n -H -E`
    /// * `default_timeout` - Applied when a command sets no timeout of its own
    ///
    /// # Example
    /// ```ignore
    /// let executor = ShellCommandExecutor::new(!crate::privilege::is_root(), None);
    /// ```
    pub fn new(use_sudo: bool, default_timeout: Option<Duration>) -> Self {
        Self {
            use_sudo,
            default_timeout,
        }
    }

    /// argv actually handed to the OS, after privilege elevation
    fn effective_argv(&self, command: &CommandSpec) -> Vec<String> {
        let mut argv = Vec::with_capacity(command.argv().len() + 4);
        if self.use_sudo && command.is_privileged() {
            argv.extend([SUDO, "-n", "-H", "-E"].map(String::from));
        }
        argv.extend(command.argv().iter().cloned());
        argv
    }

    fn spawn(&self, command: &CommandSpec) -> Result<Child, ExecutionError> {
        let argv = self.effective_argv(command);

        Command::new(&argv[0])
            .args(&argv[1..])
            .envs(command.envs().iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ExecutionError::SpawnFailed {
                command: command.to_string(),
                reason: e.to_string(),
            })
    }

    /// Drain stdout and stderr in arrival order, then reap the child
    async fn collect(
        child: &mut Child,
        logoutput: bool,
    ) -> std::io::Result<(ExitStatus, Vec<String>)> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(forward_lines(stdout, tx.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_lines(stderr, tx.clone()));
        }
        drop(tx);

        let mut lines = Vec::new();
        while let Some(line) = rx.recv().await {
            if logoutput {
                info!("{}", line);
            }
            lines.push(line);
        }

        let status = child.wait().await?;
        Ok((status, lines))
    }
}

async fn forward_lines<R>(reader: R, tx: mpsc::UnboundedSender<String>)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if tx.send(line).is_err() {
            break;
        }
    }
}

/// Exit code, or 128 + signal number for a signalled child
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    -1
}

#[async_trait]
impl CommandExecutor for ShellCommandExecutor {
    async fn call(&self, command: &CommandSpec) -> Result<ExecutionResult, ExecutionError> {
        debug!(command = %command, privileged = command.is_privileged(), "Running command");

        let mut child = self.spawn(command)?;
        let logoutput = command.logs_output();

        let collected = match command.get_timeout().or(self.default_timeout) {
            Some(limit) => match timeout(limit, Self::collect(&mut child, logoutput)).await {
                Ok(collected) => collected,
                Err(_) => {
                    let _ = child.kill().await;
                    return Err(ExecutionError::Timeout {
                        command: command.to_string(),
                        timeout: limit,
                    });
                }
            },
            None => Self::collect(&mut child, logoutput).await,
        };

        let (status, lines) = collected.map_err(|e| ExecutionError::Io {
            command: command.to_string(),
            reason: e.to_string(),
        })?;

        let result = ExecutionResult::new(exit_code(status), lines.join("\n"));

        debug!(
            command = %command,
            exit_code = result.exit_code,
            "Command finished"
        );

        Ok(result)
    }
}
