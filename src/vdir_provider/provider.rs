//! [`ResourceProvider`] implementation for IIS virtual directories.

use crate::domain::{Ensure, ResourceDescriptor, VirtualDirectory};
use crate::framework::{Action, CommandOutput, CommandRunner, ResourceProvider, Script};
use crate::lifecycle::ProviderConfig;
use crate::vdir_provider::commands::{self, PathKind, Statement};
use crate::vdir_provider::discovery;
use crate::vdir_provider::error::VirtualDirectoryError;
use crate::vdir_provider::path::{self, PathCache};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Reconciles virtual directories through an injected [`CommandRunner`].
#[derive(Clone)]
pub struct VirtualDirectoryProvider {
    runner: Arc<dyn CommandRunner>,
    config: ProviderConfig,
}

impl VirtualDirectoryProvider {
    pub fn new(runner: Arc<dyn CommandRunner>, config: ProviderConfig) -> Self {
        Self { runner, config }
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Sends `statements` as one script; a nonzero exit becomes [`VirtualDirectoryError::CommandFailed`].
    #[instrument(skip(self, statements), fields(statements = statements.len()))]
    async fn dispatch(
        &self,
        name: &str,
        operation: Action,
        statements: Vec<Statement>,
    ) -> Result<CommandOutput, VirtualDirectoryError> {
        let script = Script::from_statements(&statements);
        let output = self
            .runner
            .run(&script)
            .await
            .map_err(|source| VirtualDirectoryError::Channel {
                name: name.to_string(),
                source,
            })?;

        if !output.is_success() {
            return Err(VirtualDirectoryError::CommandFailed {
                name: name.to_string(),
                operation,
                message: output.error_text(),
            });
        }
        Ok(output)
    }

    async fn verify_physical_path(&self, desired: &ResourceDescriptor) -> Result<(), VirtualDirectoryError> {
        if !self.config.verify_local_paths {
            return Ok(());
        }
        let Some(path) = desired.physical_path() else {
            return Ok(());
        };
        if PathKind::of(path) != PathKind::Local {
            return Ok(());
        }
        if tokio::fs::try_exists(path).await.unwrap_or(false) {
            Ok(())
        } else {
            Err(VirtualDirectoryError::PhysicalPathNotFound {
                name: desired.name.clone(),
                path: path.to_string(),
            })
        }
    }
}

fn differs(want: Option<&str>, have: Option<&str>) -> bool {
    want.is_some_and(|want| have != Some(want))
}

fn differs_ignore_case(want: Option<&str>, have: Option<&str>) -> bool {
    want.is_some_and(|want| !have.is_some_and(|have| have.eq_ignore_ascii_case(want)))
}

fn differs_application(want: Option<&str>, have: Option<&str>) -> bool {
    want.is_some_and(|want| !have.is_some_and(|have| path::same_application(want, have)))
}

#[async_trait]
impl ResourceProvider for VirtualDirectoryProvider {
    const KIND: &'static str = "iis_virtual_directory";

    type Desired = ResourceDescriptor;
    type Current = VirtualDirectory;
    type PassState = PathCache;
    type Error = VirtualDirectoryError;

    fn name_of(desired: &ResourceDescriptor) -> &str {
        &desired.name
    }

    fn wants_present(desired: &ResourceDescriptor) -> bool {
        desired.ensure == Ensure::Present
    }

    fn matches(desired: &ResourceDescriptor, current: &VirtualDirectory, paths: &mut PathCache) -> bool {
        discovery::is_match(desired, current, paths)
    }

    /// Only fields the descriptor sets are compared; paths ignore case, credentials do not.
    fn has_drift(desired: &ResourceDescriptor, current: &VirtualDirectory) -> bool {
        differs_ignore_case(desired.physical_path(), current.physical_path())
            || differs_application(desired.application(), current.application())
            || differs(desired.user_name(), current.user_name())
            || differs(desired.password(), current.password())
    }

    async fn list_current(&self) -> Vec<VirtualDirectory> {
        discovery::discover(self.runner.as_ref()).await
    }

    async fn create(&self, desired: &ResourceDescriptor, paths: &mut PathCache) -> Result<(), VirtualDirectoryError> {
        let path = paths.for_descriptor(desired);
        let statements = commands::create_statements(desired, &path)?;
        self.verify_physical_path(desired).await?;

        debug!(name = %desired.name, %path, "Creating virtual directory");
        self.dispatch(&desired.name, Action::Create, statements).await?;
        Ok(())
    }

    async fn update(
        &self,
        desired: &ResourceDescriptor,
        _current: &VirtualDirectory,
        paths: &mut PathCache,
    ) -> Result<(), VirtualDirectoryError> {
        let path = paths.for_descriptor(desired);
        let statements = commands::update_statements(desired, &path)?;
        if statements.is_empty() {
            return Ok(());
        }
        self.verify_physical_path(desired).await?;

        debug!(name = %desired.name, %path, fields = statements.len(), "Updating virtual directory");
        self.dispatch(&desired.name, Action::Update, statements).await?;
        Ok(())
    }

    async fn destroy(&self, desired: &ResourceDescriptor, paths: &mut PathCache) -> Result<(), VirtualDirectoryError> {
        let path = paths.for_descriptor(desired);
        let check = commands::existence_check(desired, &path)?;

        let output = self.dispatch(&desired.name, Action::Destroy, vec![check]).await?;
        if !commands::reports_existing(&output.stdout) {
            debug!(name = %desired.name, %path, "Already absent");
            return Ok(());
        }

        debug!(name = %desired.name, %path, "Removing virtual directory");
        self.dispatch(&desired.name, Action::Destroy, vec![commands::removal(&path)])
            .await?;
        Ok(())
    }
}
