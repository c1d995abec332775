use crate::framework::{ChannelError, CommandOutput, CommandRunner, Script};
use crate::lifecycle::ProviderConfig;
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, instrument};

/// Runs scripts through a local PowerShell interpreter with the WebAdministration module.
///
/// Each invocation is a fresh process that is awaited to completion.
#[derive(Debug, Clone)]
pub struct PowerShellRunner {
    executable: PathBuf,
}

impl PowerShellRunner {
    /// Statements run ahead of every script.
    pub const PRELUDE: &'static [&'static str] = &[
        "$ProgressPreference = 'SilentlyContinue'",
        "Import-Module WebAdministration",
    ];

    const ARGS: &'static [&'static str] = &[
        "-NoProfile",
        "-NonInteractive",
        "-NoLogo",
        "-ExecutionPolicy",
        "Bypass",
        "-Command",
    ];

    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    pub fn from_config(config: &ProviderConfig) -> Self {
        Self::new(config.powershell.clone())
    }

    /// The full text passed to `-Command`: the prelude, then the script.
    pub fn command_text(script: &Script) -> String {
        let mut full = Script::from_statements(Self::PRELUDE.iter().copied());
        for statement in script.statements() {
            full.push(statement);
        }
        full.render()
    }
}

#[async_trait]
impl CommandRunner for PowerShellRunner {
    #[instrument(skip(self, script), fields(statements = script.len()))]
    async fn run(&self, script: &Script) -> Result<CommandOutput, ChannelError> {
        let output = Command::new(&self.executable)
            .args(Self::ARGS)
            .arg(Self::command_text(script))
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| ChannelError::Launch(format!("{}: {e}", self.executable.display())))?;

        let exit_code = output.status.code().ok_or(ChannelError::Terminated)?;
        debug!(exit_code, "Interpreter finished");

        Ok(CommandOutput {
            exit_code,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
