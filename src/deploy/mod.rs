//! Deploy orchestration
//!
//! Resolve app → verify files → trigger redeploy → poll until terminal.
//! Every step runs in order on one task; a failing step ends the workflow
//! before anything after it runs.

use std::path::PathBuf;

use crate::api::DeployApi;
use crate::error::{CliError, ResolutionFailure};
use crate::git::GitIdentity;
use crate::shared::{App, DeployTask};
use crate::verify::{VerificationGate, VerifyReport};

pub mod poller;
pub mod resolver;
pub mod trigger;

pub use poller::{
    MAX_POLLS, POLL_INTERVAL, PollConfig, PollOutcome, Poller, ProgressSink, Sleeper, TokioSleeper,
};

/// Options of one `deploy` invocation
#[derive(Debug, Clone)]
pub struct DeployOptions {
    /// App name or id; detected from the git remote when absent
    pub app: Option<String>,
    /// Project directory
    pub dir: PathBuf,
    pub skip_verify: bool,
    /// Poll until the deploy finishes
    pub wait: bool,
}

impl Default for DeployOptions {
    fn default() -> Self {
        Self {
            app: None,
            dir: PathBuf::from("."),
            skip_verify: false,
            wait: true,
        }
    }
}

/// Observer of workflow milestones
///
/// The workflow itself never prints; the terminal renderer and tests
/// implement this trait.
pub trait DeployReporter: ProgressSink {
    fn repository_detected(&mut self, _identity: &GitIdentity) {}
    fn app_selected(&mut self, _app: &App) {}
    fn verified(&mut self, _report: &VerifyReport) {}
    fn triggering(&mut self, _app: &App) {}
    fn triggered(&mut self, _app: &App, _task: &DeployTask) {}
    fn polling(&mut self) {}
}

/// Result of a workflow that did not fail
#[derive(Debug, Clone)]
pub struct DeployReport {
    pub app: App,
    pub task: DeployTask,
    /// `false` when `--no-wait` skipped polling
    pub waited: bool,
}

/// Dependencies of the deploy workflow
pub struct Deployer<'a, S: Sleeper = TokioSleeper> {
    api: &'a dyn DeployApi,
    gate: &'a dyn VerificationGate,
    poller: Poller<S>,
}

impl<'a> Deployer<'a> {
    pub fn new(api: &'a dyn DeployApi, gate: &'a dyn VerificationGate) -> Self {
        Self::with_poller(api, gate, Poller::default())
    }
}

impl<'a, S: Sleeper> Deployer<'a, S> {
    pub fn with_poller(
        api: &'a dyn DeployApi,
        gate: &'a dyn VerificationGate,
        poller: Poller<S>,
    ) -> Self {
        Self { api, gate, poller }
    }

    /// Run the workflow
    ///
    /// Remote FAILURE and poll timeout come back as
    /// [`CliError::DeployFailed`] and [`CliError::PollTimeout`].
    pub async fn run(
        &self,
        options: &DeployOptions,
        reporter: &mut dyn DeployReporter,
    ) -> Result<DeployReport, CliError> {
        let app = self.resolve(options, reporter).await?;
        reporter.app_selected(&app);

        if !options.skip_verify {
            let report = self.gate.verify(&options.dir).await?;
            reporter.verified(&report);
            if !report.passed() {
                tracing::info!(dir = %report.dir.display(), "Verification failed, deploy not triggered");
                return Err(CliError::VerificationFailed { dir: report.dir });
            }
        }

        reporter.triggering(&app);
        let task = trigger::trigger(self.api, &app.id).await?;
        reporter.triggered(&app, &task);

        if !options.wait {
            return Ok(DeployReport {
                app,
                task,
                waited: false,
            });
        }

        reporter.polling();
        match self
            .poller
            .poll(self.api, &app.id, &task.task_id, &mut *reporter)
            .await
        {
            PollOutcome::Success => Ok(DeployReport {
                app,
                task,
                waited: true,
            }),
            PollOutcome::Failure(detail) => Err(CliError::DeployFailed(detail)),
            PollOutcome::Timeout(message) => Err(CliError::PollTimeout(message)),
        }
    }

    async fn resolve(
        &self,
        options: &DeployOptions,
        reporter: &mut dyn DeployReporter,
    ) -> Result<App, CliError> {
        if let Some(ident) = &options.app {
            return resolver::resolve_explicit(self.api, ident).await;
        }

        let identity = GitIdentity::detect(&options.dir)
            .await
            .ok_or_else(|| ResolutionFailure::NoRepository(options.dir.clone()))?;
        reporter.repository_detected(&identity);

        resolver::resolve_by_remote(self.api, &identity.remote_url).await
    }
}
