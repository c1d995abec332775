//! # Core Reconciliation Framework
//!
//! This module defines the generic building blocks every resource type plugs into.
//!
//! ## Key Types
//!
//! - [`CommandRunner`]: The injected execution channel (script in, exit code and output back).
//! - [`ResourceProvider`]: The trait a resource type implements to be reconciled.
//! - [`Reconciler`]: The generic driver that runs one discovery per pass and walks the batch.
//! - [`ReconcilePass`]: One pass worth of discovered state plus per-pass scratch state.
//! - [`PassReport`]: Per-resource outcomes of a pass.

use async_trait::async_trait;
use std::fmt::{self, Debug, Display};
use tracing::{debug, info, instrument, warn};

// =============================================================================
// 1. THE EXECUTION CHANNEL
// =============================================================================

/// An ordered list of rendered statements, joined only when dispatched.
///
/// Statements are kept apart until the last moment so callers (and tests) can
/// inspect exactly what will be sent without re-parsing a command string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Script {
    statements: Vec<String>,
}

impl Script {
    /// Statement separator used by [`Script::render`].
    pub const SEPARATOR: &'static str = "; ";

    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a script from anything that renders to a statement.
    pub fn from_statements<I, S>(statements: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        Self {
            statements: statements.into_iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn push(&mut self, statement: impl ToString) {
        self.statements.push(statement.to_string());
    }

    pub fn statements(&self) -> &[String] {
        &self.statements
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Joins the statements into the single text blob the interpreter receives.
    pub fn render(&self) -> String {
        self.statements.join(Self::SEPARATOR)
    }
}

impl Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// What the execution channel hands back for one invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            exit_code: 0,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failure(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            exit_code,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }

    /// The text to surface when the invocation failed.
    ///
    /// Prefers stderr, falls back to stdout, and finally to the bare exit code.
    pub fn error_text(&self) -> String {
        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            return stderr.to_string();
        }
        let stdout = self.stdout.trim();
        if !stdout.is_empty() {
            return stdout.to_string();
        }
        format!("exit code {}", self.exit_code)
    }
}

/// Errors raised by the execution channel itself (as opposed to a script that ran and failed).
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum ChannelError {
    #[error("Failed to launch command interpreter: {0}")]
    Launch(String),
    #[error("Command interpreter terminated without an exit code")]
    Terminated,
    #[error("Channel error: {0}")]
    Custom(String),
}

/// The execution channel: takes a script, runs it to completion, reports the result.
///
/// # Architecture Note
/// The runner is injected into providers rather than reached through a global,
/// so a test can hand in a [`MockRunner`](crate::framework::mock::MockRunner)
/// and assert on every script that would have been sent to the host.
///
/// There is no timeout here. A hung interpreter hangs the pass; the runner
/// implementation owns any timeout policy.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, script: &Script) -> Result<CommandOutput, ChannelError>;
}

// =============================================================================
// 2. THE RESOURCE ABSTRACTION
// =============================================================================

/// The operation a pass decided on for one resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Create,
    Update,
    Destroy,
    NoOp,
}

impl Action {
    /// The reconciliation state machine.
    ///
    /// `drift` is `None` when nothing was discovered for the resource, otherwise
    /// whether the matched record differs from the desired state.
    pub fn plan(wants_present: bool, drift: Option<bool>) -> Self {
        match (drift, wants_present) {
            (None, true) => Action::Create,
            (None, false) => Action::NoOp,
            (Some(_), false) => Action::Destroy,
            (Some(true), true) => Action::Update,
            (Some(false), true) => Action::NoOp,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Update => "update",
            Action::Destroy => "destroy",
            Action::NoOp => "no-op",
        }
    }
}

impl Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trait that any resource type must implement to be driven by [`Reconciler`].
///
/// # Architecture Note
/// The driver logic (discover once, match, plan, dispatch, record the outcome)
/// is written once here; a resource type only supplies discovery, matching,
/// drift detection and the three mutating operations.
///
/// Associated types keep the two sides apart: a `Desired` descriptor can never
/// be passed where a discovered `Current` record is expected.
///
/// `PassState` is scratch space owned by a single pass (e.g. a memo table).
/// It is created fresh by [`Reconciler::begin_pass`] and dropped with the pass.
#[async_trait]
pub trait ResourceProvider: Send + Sync {
    /// Short resource kind used in log fields.
    const KIND: &'static str;

    /// Caller-supplied desired state.
    type Desired: Send + Sync + Debug;

    /// A record produced by discovery.
    type Current: Clone + Send + Sync + Debug;

    /// Per-pass scratch state.
    type PassState: Default + Send;

    /// The resource-specific error type.
    type Error: std::error::Error + Send + Sync;

    fn name_of(desired: &Self::Desired) -> &str;

    fn wants_present(desired: &Self::Desired) -> bool;

    /// Whether `current` is the live counterpart of `desired`.
    fn matches(desired: &Self::Desired, current: &Self::Current, state: &mut Self::PassState) -> bool;

    /// Whether any field the caller cares about differs from the live record.
    fn has_drift(desired: &Self::Desired, current: &Self::Current) -> bool;

    /// Reads every live record of this kind. Called once per pass.
    async fn list_current(&self) -> Vec<Self::Current>;

    async fn create(&self, desired: &Self::Desired, state: &mut Self::PassState) -> Result<(), Self::Error>;

    async fn update(
        &self,
        desired: &Self::Desired,
        current: &Self::Current,
        state: &mut Self::PassState,
    ) -> Result<(), Self::Error>;

    async fn destroy(&self, desired: &Self::Desired, state: &mut Self::PassState) -> Result<(), Self::Error>;
}

// =============================================================================
// 3. THE DRIVER
// =============================================================================

/// Terminal result for one resource in a pass.
#[derive(Debug)]
pub struct Outcome<E> {
    pub name: String,
    pub action: Action,
    pub result: Result<(), E>,
}

impl<E> Outcome<E> {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Outcomes of a whole pass, in the order the resources were given.
#[derive(Debug)]
pub struct PassReport<E> {
    /// Number of live records discovery returned for this pass.
    pub discovered: usize,
    pub outcomes: Vec<Outcome<E>>,
}

impl<E> PassReport<E> {
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(Outcome::is_success)
    }

    pub fn failures(&self) -> impl Iterator<Item = &Outcome<E>> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }

    pub fn outcome(&self, name: &str) -> Option<&Outcome<E>> {
        self.outcomes.iter().find(|o| o.name == name)
    }
}

/// The generic driver for one resource type.
///
/// **Execution Model**:
/// Everything runs in sequence on the caller's task. A pass owns its discovered
/// records and its scratch state outright, so no locking is needed, and nothing
/// is remembered from one pass to the next.
pub struct Reconciler<P: ResourceProvider> {
    provider: P,
}

impl<P: ResourceProvider> Reconciler<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Bulk read of every live record, for callers that want to prefetch.
    pub async fn list_current(&self) -> Vec<P::Current> {
        self.provider.list_current().await
    }

    /// Starts a pass: one discovery call, fresh scratch state.
    #[instrument(skip(self), fields(kind = P::KIND))]
    pub async fn begin_pass(&self) -> ReconcilePass<'_, P> {
        let current = self.provider.list_current().await;
        debug!(discovered = current.len(), "Discovery complete");
        ReconcilePass {
            provider: &self.provider,
            current,
            state: P::PassState::default(),
        }
    }

    /// Reconciles a whole batch in one pass.
    ///
    /// A failing resource is recorded and the batch moves on to the next one.
    #[instrument(skip(self, desired), fields(kind = P::KIND, resources = desired.len()))]
    pub async fn reconcile(&self, desired: &[P::Desired]) -> PassReport<P::Error> {
        let mut pass = self.begin_pass().await;
        let mut outcomes = Vec::with_capacity(desired.len());

        for resource in desired {
            let (action, index) = pass.locate(resource);
            let result = pass.execute(resource, action, index).await;
            outcomes.push(Outcome {
                name: P::name_of(resource).to_string(),
                action,
                result,
            });
        }

        let failed = outcomes.iter().filter(|o| !o.is_success()).count();
        info!(kind = P::KIND, total = outcomes.len(), failed, "Pass complete");

        PassReport {
            discovered: pass.current.len(),
            outcomes,
        }
    }
}

/// One reconciliation pass: the records discovered at its start plus its scratch state.
pub struct ReconcilePass<'a, P: ResourceProvider> {
    provider: &'a P,
    current: Vec<P::Current>,
    state: P::PassState,
}

impl<'a, P: ResourceProvider> ReconcilePass<'a, P> {
    /// Records discovered at the start of this pass.
    pub fn records(&self) -> &[P::Current] {
        &self.current
    }

    /// First discovered record matching `desired`, if any.
    pub fn find(&mut self, desired: &P::Desired) -> Option<&P::Current> {
        let index = self.position_of(desired)?;
        self.current.get(index)
    }

    /// Whether the resource was live when this pass started.
    pub fn present(&mut self, desired: &P::Desired) -> bool {
        self.position_of(desired).is_some()
    }

    /// The action [`apply`](Self::apply) would take for `desired`.
    pub fn plan(&mut self, desired: &P::Desired) -> Action {
        self.locate(desired).0
    }

    /// Performs whatever operation reconciles `desired` with the live state.
    pub async fn apply(&mut self, desired: &P::Desired) -> Result<Action, P::Error> {
        let (action, index) = self.locate(desired);
        self.execute(desired, action, index).await.map(|()| action)
    }

    fn position_of(&mut self, desired: &P::Desired) -> Option<usize> {
        let state = &mut self.state;
        self.current
            .iter()
            .position(|current| P::matches(desired, current, state))
    }

    fn locate(&mut self, desired: &P::Desired) -> (Action, Option<usize>) {
        let index = self.position_of(desired);
        let drift = index
            .and_then(|i| self.current.get(i))
            .map(|current| P::has_drift(desired, current));
        (Action::plan(P::wants_present(desired), drift), index)
    }

    async fn execute(
        &mut self,
        desired: &P::Desired,
        action: Action,
        index: Option<usize>,
    ) -> Result<(), P::Error> {
        let kind = P::KIND;
        let name = P::name_of(desired);
        debug!(kind, name, %action, ?desired, "Apply");

        let result = match (action, index.and_then(|i| self.current.get(i))) {
            (Action::Create, _) => self.provider.create(desired, &mut self.state).await,
            (Action::Update, Some(current)) => {
                self.provider.update(desired, current, &mut self.state).await
            }
            (Action::Destroy, _) => self.provider.destroy(desired, &mut self.state).await,
            (Action::Update, None) | (Action::NoOp, _) => Ok(()),
        };

        match &result {
            Ok(()) if action == Action::NoOp => debug!(kind, name, "In sync"),
            Ok(()) => info!(kind, name, %action, "Applied"),
            Err(e) => warn!(kind, name, %action, error = %e, "Apply failed"),
        }
        result
    }
}
