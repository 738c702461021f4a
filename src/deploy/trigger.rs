use crate::api::{ApiError, DeployApi};
use crate::error::CliError;
use crate::shared::DeployTask;

/// Queue a redeploy of `app_id`
///
/// 409 and 400 responses become [`CliError::DeployConflict`] and
/// [`CliError::DeployRejected`] carrying the server's detail; everything
/// else, including 401, is passed through as an API error.
pub async fn trigger(api: &dyn DeployApi, app_id: &str) -> Result<DeployTask, CliError> {
    match api.redeploy_app(app_id).await {
        Ok(task) => {
            tracing::info!(app_id, task_id = %task.task_id, "Redeploy queued");
            Ok(task)
        }
        Err(e) => Err(classify(e)),
    }
}

fn classify(error: ApiError) -> CliError {
    match error {
        ApiError::Status { status: 409, detail } => CliError::DeployConflict(detail),
        ApiError::Status { status: 400, detail } => CliError::DeployRejected(detail),
        other => CliError::Api(other),
    }
}
