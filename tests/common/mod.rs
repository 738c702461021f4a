//! Common test utilities and fixtures

#![allow(dead_code)]

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use fabroku::config::Session;
use fabroku::deploy::{DeployReporter, PollConfig, Poller, ProgressSink, Sleeper};
use fabroku::git::GitIdentity;
use fabroku::shared::{App, DeployTask, StatusSnapshot};
use fabroku::verify::{AppType, FileCheck, FileState, VerificationGate, VerifyReport};
use serde_json::{Value, json};
use wiremock::MockServer;

pub const TOKEN: &str = "secret-token";

/// Session pointed at a mock platform
pub fn session_for(server: &MockServer) -> Session {
    Session {
        api_url: server.uri(),
        token: Some(TOKEN.to_string()),
        user: Some("tester".to_string()),
    }
}

/// App record in the platform's wire format
pub fn app_json(id: u64, name: &str, git: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "status": "RUNNING",
        "domain": format!("{}.fabroku.example", name),
        "git": git,
        "project": 1,
    })
}

pub fn status_json(state: &str, current: u32, status: &str) -> Value {
    json!({ "state": state, "current": current, "status": status })
}

/// Sleeper that returns immediately
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSleep;

#[async_trait]
impl Sleeper for NoSleep {
    async fn sleep(&self, _duration: Duration) {}
}

pub fn fast_poller(max_polls: u32) -> Poller<NoSleep> {
    Poller::new(
        PollConfig {
            interval: Duration::from_millis(1),
            max_polls,
        },
        NoSleep,
    )
}

/// Gate with a fixed verdict that records whether it ran
pub struct FixedGate {
    pub pass: bool,
}

#[async_trait]
impl VerificationGate for FixedGate {
    async fn verify(&self, dir: &Path) -> std::io::Result<VerifyReport> {
        let state = if self.pass {
            FileState::Present
        } else {
            FileState::Missing
        };
        Ok(VerifyReport {
            dir: dir.to_path_buf(),
            app_type: Some(AppType::Backend),
            files: vec![FileCheck {
                name: "Procfile",
                description: "Command that starts the server",
                state,
            }],
        })
    }
}

/// Reporter that records milestones as short labels
#[derive(Debug, Default)]
pub struct EventLog {
    pub events: Vec<String>,
    pub updates: Vec<StatusSnapshot>,
}

impl ProgressSink for EventLog {
    fn update(&mut self, snapshot: &StatusSnapshot) {
        self.updates.push(snapshot.clone());
    }

    fn finish(&mut self) {
        self.events.push("finish".to_string());
    }
}

impl DeployReporter for EventLog {
    fn repository_detected(&mut self, identity: &GitIdentity) {
        self.events.push(format!("repository:{}", identity.remote_url));
    }

    fn app_selected(&mut self, app: &App) {
        self.events.push(format!("app:{}", app.name));
    }

    fn verified(&mut self, report: &VerifyReport) {
        self.events.push(format!("verified:{}", report.passed()));
    }

    fn triggering(&mut self, _app: &App) {
        self.events.push("triggering".to_string());
    }

    fn triggered(&mut self, _app: &App, task: &DeployTask) {
        self.events.push(format!("triggered:{}", task.short_id()));
    }

    fn polling(&mut self) {
        self.events.push("polling".to_string());
    }
}
