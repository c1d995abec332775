//! # Observability & Tracing
//!
//! The [`setup_tracing`] function initializes structured logging with the `tracing` crate.
//!
//! ## Configuration
//!
//! Log lines use the compact format without module paths (`with_target(false)`);
//! the `kind` and `name` fields already say which resource a line is about.
//! Output goes to stderr so that `iis-vdir list` can print JSON on stdout.
//!
//! ## What Gets Traced
//!
//! - **Passes**: discovery count, then one summary line with totals and failures
//! - **Resources**: the planned action, and whether it was applied or failed
//! - **Channel**: every interpreter invocation, with statement count and exit code
//!
//! Scripts are never logged verbatim, since they may carry passwords.
//!
//! ## Usage Examples
//!
//! ```bash
//! # Outcomes only
//! RUST_LOG=info iis-vdir apply site.json
//!
//! # Full descriptors (passwords redacted) and per-statement spans
//! RUST_LOG=debug iis-vdir apply site.json
//!
//! # Only the channel
//! RUST_LOG=iis_vdir::channel=debug iis-vdir list
//! ```
//!
//! With `RUST_LOG=info` a pass reads like:
//!
//! ```text
//! INFO reconcile: Applied kind="iis_virtual_directory" name="Site1/assets" action=create
//! WARN reconcile: Apply failed kind="iis_virtual_directory" name="media" action=create error=physicalpath is a required parameter for virtual directory 'media'
//! INFO reconcile: Pass complete kind="iis_virtual_directory" total=2 failed=1
//! ```
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .with_target(false) // kind/name fields identify the resource
        .compact()
        .init();
}
