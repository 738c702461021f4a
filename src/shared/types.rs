use derive_more::Display;
use serde::{Deserialize, Deserializer, Serialize};

/// Application record as returned by the platform
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct App {
    /// Platform identifier (numeric on the wire, kept as text)
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,

    /// Human-readable app name
    #[serde(default)]
    pub name: String,

    /// Current lifecycle status
    #[serde(default)]
    pub status: Option<AppStatus>,

    /// Public domain (without scheme)
    #[serde(default)]
    pub domain: Option<String>,

    /// Linked git repository URL
    #[serde(default)]
    pub git: Option<String>,

    /// Owning project identifier
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub project: Option<String>,
}

impl App {
    /// Public URL of the app, when a domain is assigned
    pub fn public_url(&self) -> Option<String> {
        self.domain
            .as_deref()
            .filter(|d| !d.is_empty())
            .map(|d| format!("https://{}", d))
    }
}

/// App lifecycle status values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppStatus {
    #[display("RUNNING")]
    Running,
    #[display("STOPPED")]
    Stopped,
    #[display("ERROR")]
    Error,
    #[display("STARTING")]
    Starting,
    #[display("DEPLOYING")]
    Deploying,
    #[display("DELETING")]
    Deleting,
    #[display("STOPPING")]
    Stopping,
    #[display("RESTARTING")]
    Restarting,
    /// Any status this client does not know about yet
    #[serde(other)]
    #[display("UNKNOWN")]
    Unknown,
}

impl AppStatus {
    /// Title-cased label for tables ("Running", "Stopped", ...)
    pub fn label(&self) -> String {
        let upper = self.to_string();
        let mut chars = upper.chars();
        match chars.next() {
            Some(first) => first.to_string() + &chars.as_str().to_lowercase(),
            None => String::new(),
        }
    }
}

/// App list response: paginated `{results: [...]}` or a bare array
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AppList {
    Paginated {
        #[serde(default)]
        results: Vec<App>,
    },
    Plain(Vec<App>),
}

impl AppList {
    pub fn into_apps(self) -> Vec<App> {
        match self {
            AppList::Paginated { results } => results,
            AppList::Plain(apps) => apps,
        }
    }
}

/// Handle returned by the redeploy endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployTask {
    /// Opaque task identifier, used only for log correlation
    pub task_id: String,
}

impl DeployTask {
    /// First 8 characters of the task id, for display
    pub fn short_id(&self) -> &str {
        let end = self
            .task_id
            .char_indices()
            .nth(8)
            .map(|(i, _)| i)
            .unwrap_or(self.task_id.len());
        &self.task_id[..end]
    }
}

/// Remote deploy task state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeployState {
    #[display("SUCCESS")]
    Success,
    #[display("FAILURE")]
    Failure,
    /// Every non-terminal state (PENDING, STARTED, PROGRESS, ...)
    #[default]
    #[serde(other)]
    #[display("RUNNING")]
    Running,
}

/// One poll tick's view of a running deploy
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StatusSnapshot {
    #[serde(default, deserialize_with = "null_as_default")]
    pub state: DeployState,

    /// Progress percent, 0-100
    #[serde(default, deserialize_with = "percent_or_zero")]
    pub current: u32,

    /// Human-readable progress message
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: String,
}

impl StatusSnapshot {
    /// Percent clamped to 0-100
    pub fn percent(&self) -> u32 {
        self.current.min(100)
    }
}

/// Authenticated user profile
#[derive(Debug, Clone, Deserialize)]
pub struct User {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub is_fabric: bool,
    #[serde(default)]
    pub is_superuser: bool,
}

/// A single diagnostic check from the webhook endpoints
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Check {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub expected_url: Option<String>,
    #[serde(default)]
    pub all_hooks: Vec<RepoHook>,
    #[serde(default)]
    pub fabroku_statuses: Vec<CommitStatus>,
    #[serde(default)]
    pub sha: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Webhook registered on the GitHub repository
#[derive(Debug, Clone, Deserialize)]
pub struct RepoHook {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub active: bool,
}

/// Commit status previously reported by the platform
#[derive(Debug, Clone, Deserialize)]
pub struct CommitStatus {
    pub state: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub created_at: String,
}

/// Result of the diagnose-webhook endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookDiagnosis {
    pub app: DiagnosedApp,
    #[serde(default)]
    pub webhook_url: Option<String>,
    pub checks: WebhookChecks,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiagnosedApp {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub git: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookChecks {
    #[serde(default)]
    pub backend_url_public: Check,
    #[serde(default)]
    pub user_git_token: Check,
    #[serde(default)]
    pub project_git_token: Check,
    #[serde(default)]
    pub git_url_parseable: Check,
    #[serde(default)]
    pub webhook_exists: Option<Check>,
    #[serde(default)]
    pub last_commit: Option<Check>,
}

impl WebhookChecks {
    /// Whether every reported check passed
    pub fn all_ok(&self) -> bool {
        [
            Some(&self.backend_url_public),
            Some(&self.user_git_token),
            Some(&self.project_git_token),
            Some(&self.git_url_parseable),
            self.webhook_exists.as_ref(),
            self.last_commit.as_ref(),
        ]
        .into_iter()
        .flatten()
        .all(|c| c.ok)
    }

    /// Whether the webhook is known to be missing and should be recreated
    pub fn needs_webhook_repair(&self) -> bool {
        self.webhook_exists.as_ref().is_some_and(|c| !c.ok)
    }
}

/// Result of the setup-webhook endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookSetup {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub webhook_url: Option<String>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub hook_id: Option<String>,
}

/// Outcome classes of the setup-webhook endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupStatus {
    Created,
    AlreadyExists,
    Other,
}

impl WebhookSetup {
    pub fn outcome(&self) -> SetupStatus {
        match self.status.as_str() {
            "webhook criado" => SetupStatus::Created,
            "webhook já existe" => SetupStatus::AlreadyExists,
            _ => SetupStatus::Other,
        }
    }
}

/// Result of the test-commit-status endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommitStatusTest {
    #[serde(default)]
    pub repo_name: Option<String>,
    #[serde(default)]
    pub token_preview: Option<String>,
    #[serde(default)]
    pub repo_access: Option<Check>,
    #[serde(default)]
    pub branch_access: Option<Check>,
    #[serde(default)]
    pub create_status: Option<Check>,
    #[serde(default)]
    pub unexpected_error: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Number(serde_json::Number),
}

impl From<StringOrNumber> for String {
    fn from(value: StringOrNumber) -> Self {
        match value {
            StringOrNumber::String(s) => s,
            StringOrNumber::Number(n) => n.to_string(),
        }
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    StringOrNumber::deserialize(deserializer).map(String::from)
}

fn optional_string_or_number<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Option::<StringOrNumber>::deserialize(deserializer).map(|v| v.map(String::from))
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

// Null counts as 0; fractional values are rounded and clamped to 0-100.
fn percent_or_zero<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let value = Option::<f64>::deserialize(deserializer)?.unwrap_or_default();
    if value.is_nan() {
        return Ok(0);
    }
    Ok(value.clamp(0.0, 100.0).round() as u32)
}
