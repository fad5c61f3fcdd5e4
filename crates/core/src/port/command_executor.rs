// Command Executor Port
// Abstraction over "run this command, give me exit code and output"

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// A command line plus how to run it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    argv: Vec<String>,
    env: Vec<(String, String)>,
    timeout: Option<Duration>,
    logoutput: bool,
    privileged: bool,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            argv: vec![program.into()],
            env: Vec::new(),
            timeout: None,
            logoutput: false,
            privileged: false,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.argv.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.argv.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Stream each output line to the log while the command runs
    pub fn logoutput(mut self, enabled: bool) -> Self {
        self.logoutput = enabled;
        self
    }

    /// Needs root; executors may elevate it (e.g. through sudo)
    pub fn privileged(mut self) -> Self {
        self.privileged = true;
        self
    }

    pub fn program(&self) -> &str {
        &self.argv[0]
    }

    pub fn arguments(&self) -> &[String] {
        &self.argv[1..]
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    pub fn envs(&self) -> &[(String, String)] {
        &self.env
    }

    pub fn get_timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn logs_output(&self) -> bool {
        self.logoutput
    }

    pub fn is_privileged(&self) -> bool {
        self.privileged
    }
}

impl std::fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, word) in self.argv.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            if word.is_empty() || word.contains(|c: char| c.is_whitespace() || "'\"$*?".contains(c))
            {
                write!(f, "'{}'", word.replace('\'', r"'\''"))?;
            } else {
                f.write_str(word)?;
            }
        }
        Ok(())
    }
}

/// Result of a finished command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub exit_code: i32,
    /// Combined stdout and stderr
    pub output: String,
}

impl ExecutionResult {
    pub fn new(exit_code: i32, output: impl Into<String>) -> Self {
        Self {
            exit_code,
            output: output.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Whether a non-zero exit is an error or a value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Non-zero exit becomes [`ExecutionError::NonZeroExit`]
    Checked,
    /// Non-zero exit is returned in the [`ExecutionResult`]
    Unchecked,
}

/// Execution errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    #[error("Execution of '{command}' returned {code}. {output}")]
    NonZeroExit {
        command: String,
        code: i32,
        output: String,
    },

    #[error("Spawn of '{command}' failed: {reason}")]
    SpawnFailed { command: String, reason: String },

    #[error("Execution of '{command}' was killed due to timeout after {} seconds", .timeout.as_secs_f64())]
    Timeout { command: String, timeout: Duration },

    #[error("IO error while running '{command}': {reason}")]
    Io { command: String, reason: String },
}

impl ExecutionError {
    pub fn command(&self) -> &str {
        match self {
            ExecutionError::NonZeroExit { command, .. }
            | ExecutionError::SpawnFailed { command, .. }
            | ExecutionError::Timeout { command, .. }
            | ExecutionError::Io { command, .. } => command,
        }
    }

    pub fn exit_code(&self) -> Option<i32> {
        match self {
            ExecutionError::NonZeroExit { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub fn output(&self) -> Option<&str> {
        match self {
            ExecutionError::NonZeroExit { output, .. } => Some(output),
            _ => None,
        }
    }
}

/// Command Executor trait
///
/// Implementations:
/// - ShellCommandExecutor (infra-system): spawns the process via tokio
/// - mocks::ScriptedExecutor: replays canned results in tests
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Run the command; a non-zero exit is not an error
    ///
    /// # Errors
    /// - ExecutionError::SpawnFailed if the process cannot be started
    /// - ExecutionError::Timeout if the command outlives its timeout
    async fn call(&self, command: &CommandSpec) -> Result<ExecutionResult, ExecutionError>;

    /// Run the command; a non-zero exit becomes `ExecutionError::NonZeroExit`
    async fn checked_call(
        &self,
        command: &CommandSpec,
    ) -> Result<ExecutionResult, ExecutionError> {
        let result = self.call(command).await?;
        if result.is_success() {
            Ok(result)
        } else {
            Err(ExecutionError::NonZeroExit {
                command: command.to_string(),
                code: result.exit_code,
                output: result.output,
            })
        }
    }

    async fn run(
        &self,
        command: &CommandSpec,
        mode: ExecutionMode,
    ) -> Result<ExecutionResult, ExecutionError> {
        match mode {
            ExecutionMode::Checked => self.checked_call(command).await,
            ExecutionMode::Unchecked => self.call(command).await,
        }
    }
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Replays a script of results, one per call
    ///
    /// Once the script is exhausted every call succeeds with empty output.
    #[derive(Clone, Default)]
    pub struct ScriptedExecutor {
        script: Arc<Mutex<VecDeque<Result<ExecutionResult, ExecutionError>>>>,
        calls: Arc<Mutex<Vec<CommandSpec>>>,
    }

    impl ScriptedExecutor {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn push(&self, response: Result<ExecutionResult, ExecutionError>) {
            self.script.lock().unwrap().push_back(response);
        }

        pub fn push_result(&self, exit_code: i32, output: &str) {
            self.push(Ok(ExecutionResult::new(exit_code, output)));
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        pub fn calls(&self) -> Vec<CommandSpec> {
            self.calls.lock().unwrap().clone()
        }

        /// Rendered command lines, in call order
        pub fn command_lines(&self) -> Vec<String> {
            self.calls().iter().map(ToString::to_string).collect()
        }
    }

    #[async_trait]
    impl CommandExecutor for ScriptedExecutor {
        async fn call(&self, command: &CommandSpec) -> Result<ExecutionResult, ExecutionError> {
            self.calls.lock().unwrap().push(command.clone());
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(ExecutionResult::new(0, "")))
        }
    }
}
