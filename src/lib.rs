//! # IIS Virtual Directory Reconciler
//!
//! > **Declared virtual directories in, idempotent WebAdministration commands out.**
//!
//! This crate reconciles a declared desired state for IIS virtual directories
//! against the live state of an IIS host. It decides, per resource, whether to
//! create, update, destroy or leave alone, and never re-creates or mis-targets
//! a directory that already exists.
//!
//! ## 🏗️ Design Philosophy
//!
//! ### Discover once, decide per resource
//! A pass starts with a single bulk read of every live virtual directory. Each
//! desired resource is then matched against that snapshot and walked through a
//! small state machine:
//!
//! | live?   | desired  | drift? | action  |
//! |---------|----------|--------|---------|
//! | no      | present  |        | create  |
//! | no      | absent   |        | no-op   |
//! | yes     | present  | yes    | update  |
//! | yes     | present  | no     | no-op   |
//! | yes     | absent   |        | destroy |
//!
//! A failing resource is recorded and the pass moves on.
//!
//! ### Canonical paths
//! Callers spell names loosely (`assets`, `Site1/assets`, `SITE1\App1\assets`).
//! Every spelling folds into one `site\application\...` path, so two spellings
//! of the same directory are treated as the same directory.
//!
//! ## 🚀 Core Concepts
//!
//! ### The execution channel is injected
//! Nothing in the core launches a process. Every command goes through a
//! [`CommandRunner`](framework::CommandRunner) handed in at construction time:
//! [`PowerShellRunner`](channel::PowerShellRunner) in production,
//! [`MockRunner`](framework::mock::MockRunner) in tests.
//!
//! ### Commands are values
//! Create, update and destroy build lists of
//! [`Statement`](vdir_provider::commands::Statement)s that validate and quote
//! their own arguments. They are joined into a script only at dispatch.
//!
//! ## 👩‍💻 Architecture Notes
//!
//! ### 1. Type-Safe Error Handling
//! Provider failures are [`VirtualDirectoryError`](vdir_provider::VirtualDirectoryError)s
//! that always carry the resource name. Channel failures are
//! [`ChannelError`](framework::ChannelError)s. Unreadable discovery output is
//! not an error at all: it reads as "no virtual directories".
//!
//! ### 2. Execution Model
//! A pass runs resources strictly in sequence on the caller's task and awaits
//! every command to completion. Per-pass scratch state (the path cache) is owned
//! by the pass and dropped with it.
//!
//! ### 3. Observability
//! `tracing` is used throughout with structured fields (`kind`, `name`, `action`).
//! See the [`lifecycle::tracing`] module for details.
//!
//! ## 🗺️ Module Tour
//!
//! ### 1. The Engine ([`framework`])
//! The generic driver: [`Reconciler`](framework::Reconciler),
//! [`ReconcilePass`](framework::ReconcilePass) and the
//! [`ResourceProvider`](framework::ResourceProvider) trait resource types implement.
//!
//! ### 2. The Resource ([`vdir_provider`])
//! Path resolution, discovery, command synthesis and the provider itself.
//!
//! ### 3. The Data ([`domain`])
//! [`ResourceDescriptor`](domain::ResourceDescriptor) (desired) and
//! [`VirtualDirectory`](domain::VirtualDirectory) (discovered).
//!
//! ### 4. The Channel ([`channel`])
//! The PowerShell runner.
//!
//! ### 5. The Setup ([`lifecycle`])
//! Configuration, manifests and tracing.
//!
//! ## 🚀 Quick Start
//!
//! ```ignore
//! let config = ProviderConfig::from_env();
//! let runner = Arc::new(PowerShellRunner::from_config(&config));
//! let reconciler = iis_vdir::vdir_provider::new(runner, config);
//!
//! let desired = vec![
//!     ResourceDescriptor::new("assets")
//!         .with_site("Default Web Site")
//!         .with_physical_path("C:\\inetpub\\assets"),
//! ];
//! let report = reconciler.reconcile(&desired).await;
//! assert!(report.is_success());
//! ```
//!
//! ### Running Tests
//!
//! ```bash
//! cargo test
//! ```

pub mod channel;
pub mod domain;
pub mod framework;
pub mod lifecycle;
pub mod vdir_provider;
