//! # Mock Framework
//!
//! Utilities for testing providers without a real command interpreter.
//!
//! [`MockRunner`] answers scripts from a queue of expectations, in order, and
//! records every script it was handed. Use the builder returned by
//! [`MockRunner::expect_script_containing`] or [`MockRunner::expect_any_script`]
//! to queue a response, then [`MockRunner::verify`] at the end of the test.

use crate::framework::{ChannelError, CommandOutput, CommandRunner, Script};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

// =============================================================================
// EXPECTATION BUILDER API
// =============================================================================

/// One queued expectation: an optional fragment the script must contain, and the reply.
struct Expectation {
    fragment: Option<String>,
    response: Result<CommandOutput, ChannelError>,
}

/// A scripted execution channel with expectation tracking.
///
/// # Example
/// ```ignore
/// let mock = Arc::new(MockRunner::new());
/// mock.expect_script_containing("Test-Path").return_stdout("True");
/// mock.expect_script_containing("Remove-Item").return_stdout("");
///
/// let provider = VirtualDirectoryProvider::new(mock.clone(), ProviderConfig::default());
/// // Drive the provider...
/// mock.verify(); // Ensures all expectations were met
/// ```
#[derive(Default)]
pub struct MockRunner {
    expectations: Arc<Mutex<VecDeque<Expectation>>>,
    calls: Mutex<Vec<Script>>,
}

impl MockRunner {
    /// Creates a new mock runner with no expectations.
    pub fn new() -> Self {
        Self::default()
    }

    /// Expects the next script to contain `fragment`.
    pub fn expect_script_containing(&self, fragment: impl Into<String>) -> ScriptExpectationBuilder {
        ScriptExpectationBuilder {
            fragment: Some(fragment.into()),
            expectations: self.expectations.clone(),
        }
    }

    /// Expects a next script, whatever it contains.
    pub fn expect_any_script(&self) -> ScriptExpectationBuilder {
        ScriptExpectationBuilder {
            fragment: None,
            expectations: self.expectations.clone(),
        }
    }

    /// Every script received so far, in order.
    pub fn calls(&self) -> Vec<Script> {
        self.calls.lock().unwrap().clone()
    }

    /// Every script received so far, rendered as sent.
    pub fn rendered_calls(&self) -> Vec<String> {
        self.calls().iter().map(Script::render).collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Verifies that all expectations were met.
    pub fn verify(&self) {
        let exps = self.expectations.lock().unwrap();
        if !exps.is_empty() {
            panic!("Not all expectations were met. {} remaining", exps.len());
        }
    }
}

#[async_trait]
impl CommandRunner for MockRunner {
    async fn run(&self, script: &Script) -> Result<CommandOutput, ChannelError> {
        self.calls.lock().unwrap().push(script.clone());
        let rendered = script.render();

        let expectation = self.expectations.lock().unwrap().pop_front();
        match expectation {
            Some(Expectation { fragment: Some(fragment), .. }) if !rendered.contains(&fragment) => {
                panic!("Expected script containing {fragment:?}, got {rendered:?}");
            }
            Some(Expectation { response, .. }) => response,
            None => panic!("Unexpected script: {rendered:?}"),
        }
    }
}

/// Builder for script expectations.
pub struct ScriptExpectationBuilder {
    fragment: Option<String>,
    expectations: Arc<Mutex<VecDeque<Expectation>>>,
}

impl ScriptExpectationBuilder {
    /// Replies with exit code 0 and the given stdout.
    pub fn return_stdout(self, stdout: impl Into<String>) {
        self.return_output(CommandOutput::success(stdout));
    }

    /// Replies with a nonzero exit code and the given stderr.
    pub fn return_failure(self, exit_code: i32, stderr: impl Into<String>) {
        self.return_output(CommandOutput::failure(exit_code, stderr));
    }

    /// Replies with an arbitrary output.
    pub fn return_output(self, output: CommandOutput) {
        self.push(Ok(output));
    }

    /// Fails at the channel level, as if the interpreter could not be launched.
    pub fn return_err(self, error: ChannelError) {
        self.push(Err(error));
    }

    fn push(self, response: Result<CommandOutput, ChannelError>) {
        let mut exps = self.expectations.lock().unwrap();
        exps.push_back(Expectation {
            fragment: self.fragment,
            response,
        });
    }
}
