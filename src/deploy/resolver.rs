//! Selects the single app a command operates on

use crate::api::DeployApi;
use crate::error::{CliError, ResolutionFailure};
use crate::git::normalize_url;
use crate::shared::App;

/// Find the app whose name or id equals `ident`
pub fn find_by_ident<'a>(apps: &'a [App], ident: &str) -> Option<&'a App> {
    apps.iter().find(|app| app.name == ident || app.id == ident)
}

/// Find the first app whose linked repository matches `remote_url`
pub fn find_by_remote<'a>(apps: &'a [App], remote_url: &str) -> Option<&'a App> {
    let local = normalize_url(remote_url);
    apps.iter()
        .find(|app| app.git.as_deref().is_some_and(|git| normalize_url(git) == local))
}

/// Resolve an explicit `--app` name or id
pub async fn resolve_explicit(api: &dyn DeployApi, ident: &str) -> Result<App, CliError> {
    let apps = api.list_apps().await?;
    let app = find_by_ident(&apps, ident)
        .cloned()
        .ok_or_else(|| ResolutionFailure::AppNotFound(ident.to_string()))?;

    tracing::debug!(app_id = %app.id, app = %app.name, "Resolved app by name or id");
    Ok(app)
}

/// Resolve the app linked to a local git remote
pub async fn resolve_by_remote(api: &dyn DeployApi, remote_url: &str) -> Result<App, CliError> {
    let apps = api.list_apps().await?;
    let app = find_by_remote(&apps, remote_url)
        .cloned()
        .ok_or_else(|| ResolutionFailure::NoMatchingApp(remote_url.to_string()))?;

    tracing::debug!(app_id = %app.id, app = %app.name, remote = remote_url, "Resolved app by git remote");
    Ok(app)
}
