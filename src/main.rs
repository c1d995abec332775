//! `iis-vdir`: list or reconcile IIS virtual directories on this host.

use clap::{Parser, Subcommand};
use iis_vdir::channel::PowerShellRunner;
use iis_vdir::lifecycle::{load_manifest, setup_tracing, ProviderConfig};
use iis_vdir::vdir_provider;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, Instrument};

/// Reconcile IIS virtual directories against a declared desired state
#[derive(Parser, Debug)]
#[command(name = "iis-vdir", version, about)]
struct Cli {
    /// PowerShell interpreter to run commands with (overrides IIS_VDIR_POWERSHELL)
    #[arg(long, global = true)]
    powershell: Option<PathBuf>,

    /// Fail when a local physical path does not exist on this machine
    #[arg(long, global = true)]
    verify_local_paths: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Command-line options win over the environment.
    fn apply_overrides(&self, mut config: ProviderConfig) -> ProviderConfig {
        if let Some(powershell) = &self.powershell {
            config = config.with_powershell(powershell.clone());
        }
        if self.verify_local_paths {
            config = config.with_verify_local_paths(true);
        }
        config
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print every live virtual directory as JSON
    List,

    /// Reconcile the virtual directories declared in a JSON manifest
    Apply {
        /// Path to the manifest (a JSON list of virtual directories)
        manifest: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    setup_tracing();
    let cli = Cli::parse();

    let config = cli.apply_overrides(ProviderConfig::from_env());
    let runner = Arc::new(PowerShellRunner::from_config(&config));
    let reconciler = vdir_provider::new(runner, config);

    match cli.command {
        Commands::List => {
            let records = reconciler.list_current().await;
            match serde_json::to_string_pretty(&records) {
                Ok(json) => {
                    println!("{json}");
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    error!(error = %e, "Failed to serialize virtual directories");
                    ExitCode::FAILURE
                }
            }
        }
        Commands::Apply { manifest } => {
            let desired = match load_manifest(&manifest).await {
                Ok(desired) => desired,
                Err(e) => {
                    error!(error = %e, "Failed to load manifest");
                    return ExitCode::FAILURE;
                }
            };

            let span = tracing::info_span!("reconcile");
            let report = async {
                info!(resources = desired.len(), "Reconciling");
                reconciler.reconcile(&desired).await
            }
            .instrument(span)
            .await;

            for outcome in &report.outcomes {
                match &outcome.result {
                    Ok(()) => println!("{}: {}", outcome.name, outcome.action),
                    Err(e) => println!("{}: {} failed: {e}", outcome.name, outcome.action),
                }
            }

            if report.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_environment() {
        let cli = Cli::parse_from([
            "iis-vdir",
            "apply",
            "site.json",
            "--powershell",
            "pwsh",
            "--verify-local-paths",
        ]);
        assert!(matches!(&cli.command, Commands::Apply { manifest } if manifest == &PathBuf::from("site.json")));

        let base = ProviderConfig::from_lookup(|_| None);
        let config = cli.apply_overrides(base);
        assert_eq!(config.powershell, PathBuf::from("pwsh"));
        assert!(config.verify_local_paths);
    }

    #[test]
    fn test_environment_kept_without_flags() {
        let cli = Cli::parse_from(["iis-vdir", "list"]);
        assert!(matches!(cli.command, Commands::List));

        let base = ProviderConfig::from_lookup(|key| match key {
            ProviderConfig::POWERSHELL_ENV => Some("C:\\tools\\pwsh.exe".to_string()),
            ProviderConfig::VERIFY_LOCAL_PATHS_ENV => Some("true".to_string()),
            _ => None,
        });
        let config = cli.apply_overrides(base.clone());
        assert_eq!(config, base);
        assert!(config.verify_local_paths);
    }

    #[test]
    fn test_apply_requires_manifest() {
        assert!(Cli::try_parse_from(["iis-vdir", "apply"]).is_err());
    }
}
