//! Bounded polling of a running deploy
//!
//! Strictly sequential: sleep one interval, fetch one snapshot, repeat.
//! A failed fetch only costs its own tick; it never ends the loop.

use std::time::Duration;

use async_trait::async_trait;

use crate::api::DeployApi;
use crate::shared::{DeployState, StatusSnapshot};

/// Pause between two status fetches
pub const POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Number of fetches before giving up (10 minutes at the default interval)
pub const MAX_POLLS: u32 = 120;

/// Tick interval and budget of a poll loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub interval: Duration,
    pub max_polls: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: POLL_INTERVAL,
            max_polls: MAX_POLLS,
        }
    }
}

impl PollConfig {
    /// Wall-clock ceiling of the loop, ignoring request time
    pub fn ceiling(&self) -> Duration {
        self.interval * self.max_polls
    }

    fn timeout_message(&self) -> String {
        let secs = self.ceiling().as_secs();
        if secs >= 60 && secs % 60 == 0 {
            format!("Timeout: deploy took longer than {} minutes", secs / 60)
        } else {
            format!("Timeout: deploy took longer than {} seconds", secs)
        }
    }
}

/// Suspension between ticks, injectable so tests run without real delays
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Receives progress changes while polling
pub trait ProgressSink {
    /// Called only when the percent or message changed since the last call
    fn update(&mut self, snapshot: &StatusSnapshot);

    /// Called once when the loop ends, whatever the outcome
    fn finish(&mut self) {}
}

/// Terminal state of a poll loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Success,
    /// The remote task reported FAILURE with this message
    Failure(String),
    /// The tick budget ran out first
    Timeout(String),
}

/// Remembers the last rendered progress so unchanged ticks stay quiet
#[derive(Debug, Default)]
struct ProgressTracker {
    percent: u32,
    status: String,
}

impl ProgressTracker {
    fn observe(&mut self, snapshot: &StatusSnapshot) -> bool {
        let percent = snapshot.percent();
        if percent == self.percent && snapshot.status == self.status {
            return false;
        }
        self.percent = percent;
        self.status.clone_from(&snapshot.status);
        true
    }
}

/// Drives the status loop for one app
pub struct Poller<S: Sleeper = TokioSleeper> {
    config: PollConfig,
    sleeper: S,
}

impl Default for Poller {
    fn default() -> Self {
        Self::new(PollConfig::default(), TokioSleeper)
    }
}

impl<S: Sleeper> Poller<S> {
    pub fn new(config: PollConfig, sleeper: S) -> Self {
        Self { config, sleeper }
    }

    /// Poll `app_id` until its task succeeds, fails, or the budget runs out
    pub async fn poll(
        &self,
        api: &dyn DeployApi,
        app_id: &str,
        task_id: &str,
        progress: &mut dyn ProgressSink,
    ) -> PollOutcome {
        let mut tracker = ProgressTracker::default();

        for tick in 1..=self.config.max_polls {
            self.sleeper.sleep(self.config.interval).await;

            let snapshot = match api.app_status(app_id).await {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    tracing::debug!(app_id, task_id, tick, error = %e, "Status fetch failed, retrying next tick");
                    continue;
                }
            };

            tracing::trace!(
                app_id,
                task_id,
                tick,
                state = %snapshot.state,
                percent = snapshot.current,
                "Deploy status"
            );

            if tracker.observe(&snapshot) {
                progress.update(&snapshot);
            }

            match snapshot.state {
                DeployState::Success => {
                    progress.finish();
                    tracing::info!(app_id, task_id, tick, "Deploy finished");
                    return PollOutcome::Success;
                }
                DeployState::Failure => {
                    progress.finish();
                    tracing::warn!(app_id, task_id, tick, status = %snapshot.status, "Deploy failed");
                    let detail = if snapshot.status.is_empty() {
                        "unknown error".to_string()
                    } else {
                        snapshot.status
                    };
                    return PollOutcome::Failure(detail);
                }
                DeployState::Running => {}
            }
        }

        progress.finish();
        tracing::warn!(
            app_id,
            task_id,
            polls = self.config.max_polls,
            "Deploy did not finish within the poll budget"
        );
        PollOutcome::Timeout(self.config.timeout_message())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::api::ApiError;
    use crate::shared::{App, DeployTask};

    /// Serves scripted status responses, then repeats `fallback`
    struct ScriptedStatus {
        script: Mutex<VecDeque<Result<StatusSnapshot, ApiError>>>,
        fallback: StatusSnapshot,
        calls: AtomicU32,
    }

    impl ScriptedStatus {
        fn new(script: Vec<Result<StatusSnapshot, ApiError>>, fallback: StatusSnapshot) -> Self {
            Self {
                script: Mutex::new(script.into()),
                fallback,
                calls: AtomicU32::new(0),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl DeployApi for ScriptedStatus {
        async fn list_apps(&self) -> Result<Vec<App>, ApiError> {
            unreachable!("poller never lists apps")
        }

        async fn redeploy_app(&self, _app_id: &str) -> Result<DeployTask, ApiError> {
            unreachable!("poller never triggers")
        }

        async fn app_status(&self, _app_id: &str) -> Result<StatusSnapshot, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(self.fallback.clone()))
        }
    }

    #[derive(Default)]
    struct CountingSleeper {
        sleeps: AtomicU32,
    }

    #[async_trait]
    impl Sleeper for CountingSleeper {
        async fn sleep(&self, _duration: Duration) {
            self.sleeps.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[derive(Default)]
    struct Recorder {
        updates: Vec<StatusSnapshot>,
        finished: u32,
    }

    impl ProgressSink for Recorder {
        fn update(&mut self, snapshot: &StatusSnapshot) {
            self.updates.push(snapshot.clone());
        }

        fn finish(&mut self) {
            self.finished += 1;
        }
    }

    fn snap(state: DeployState, current: u32, status: &str) -> StatusSnapshot {
        StatusSnapshot {
            state,
            current,
            status: status.to_string(),
        }
    }

    fn transient() -> ApiError {
        ApiError::Status {
            status: 502,
            detail: "bad gateway".to_string(),
        }
    }

    fn poller() -> Poller<CountingSleeper> {
        Poller::new(PollConfig::default(), CountingSleeper::default())
    }

    #[tokio::test]
    async fn test_success_on_third_fetch() {
        let api = ScriptedStatus::new(
            vec![
                Ok(snap(DeployState::Running, 10, "Cloning")),
                Ok(snap(DeployState::Running, 60, "Building")),
            ],
            snap(DeployState::Success, 100, "Done"),
        );
        let poller = poller();
        let mut recorder = Recorder::default();

        let outcome = poller.poll(&api, "7", "task", &mut recorder).await;

        assert_eq!(outcome, PollOutcome::Success);
        assert_eq!(api.calls(), 3);
        assert_eq!(poller.sleeper.sleeps.load(Ordering::SeqCst), 3);
        assert_eq!(recorder.updates.len(), 3);
        assert_eq!(recorder.finished, 1);
    }

    #[tokio::test]
    async fn test_unchanged_progress_is_not_rerendered() {
        let api = ScriptedStatus::new(
            vec![
                Ok(snap(DeployState::Running, 0, "")),
                Ok(snap(DeployState::Running, 50, "Building")),
                Ok(snap(DeployState::Running, 50, "Building")),
            ],
            snap(DeployState::Success, 50, "Building"),
        );
        let mut recorder = Recorder::default();

        let outcome = poller().poll(&api, "7", "task", &mut recorder).await;

        assert_eq!(outcome, PollOutcome::Success);
        assert_eq!(api.calls(), 4);
        assert_eq!(recorder.updates.len(), 1);
        assert_eq!(recorder.updates[0].current, 50);
    }

    #[tokio::test]
    async fn test_always_running_times_out_after_budget() {
        let api = ScriptedStatus::new(vec![], snap(DeployState::Running, 30, "Building"));
        let mut recorder = Recorder::default();

        let outcome = poller().poll(&api, "7", "task", &mut recorder).await;

        assert_eq!(
            outcome,
            PollOutcome::Timeout("Timeout: deploy took longer than 10 minutes".to_string())
        );
        assert_eq!(api.calls(), MAX_POLLS);
        assert_eq!(recorder.finished, 1);
    }

    #[tokio::test]
    async fn test_transient_errors_do_not_abort() {
        let api = ScriptedStatus::new(
            vec![Err(transient()), Err(transient())],
            snap(DeployState::Success, 100, "Done"),
        );
        let mut recorder = Recorder::default();

        let outcome = poller().poll(&api, "7", "task", &mut recorder).await;

        assert_eq!(outcome, PollOutcome::Success);
        assert_eq!(api.calls(), 3);
    }

    #[tokio::test]
    async fn test_errors_consume_budget() {
        let api = ScriptedStatus::new(
            vec![Err(transient()), Err(transient()), Err(transient())],
            snap(DeployState::Success, 100, "Done"),
        );
        let poller = Poller::new(
            PollConfig {
                interval: Duration::from_secs(1),
                max_polls: 3,
            },
            CountingSleeper::default(),
        );
        let mut recorder = Recorder::default();

        let outcome = poller.poll(&api, "7", "task", &mut recorder).await;

        assert_eq!(
            outcome,
            PollOutcome::Timeout("Timeout: deploy took longer than 3 seconds".to_string())
        );
        assert_eq!(api.calls(), 3);
        assert!(recorder.updates.is_empty());
    }

    #[tokio::test]
    async fn test_failure_carries_status_message() {
        let api = ScriptedStatus::new(
            vec![Ok(snap(DeployState::Running, 20, "Building"))],
            snap(DeployState::Failure, 20, "npm run build exited with 1"),
        );
        let mut recorder = Recorder::default();

        let outcome = poller().poll(&api, "7", "task", &mut recorder).await;

        assert_eq!(
            outcome,
            PollOutcome::Failure("npm run build exited with 1".to_string())
        );
        assert_eq!(api.calls(), 2);
    }

    #[tokio::test]
    async fn test_failure_without_message() {
        let api = ScriptedStatus::new(vec![], snap(DeployState::Failure, 0, ""));
        let mut recorder = Recorder::default();

        let outcome = poller().poll(&api, "7", "task", &mut recorder).await;

        assert_eq!(outcome, PollOutcome::Failure("unknown error".to_string()));
    }

    #[test]
    fn test_default_ceiling() {
        assert_eq!(PollConfig::default().ceiling(), Duration::from_secs(600));
    }
}
