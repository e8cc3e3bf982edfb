//! Tool listing for the category editor's tool picker.

use axum::{Router, extract::State, response::Json as ResponseJson, routing::get};
use db::models::tool::{Tool, ToolSummary};
use deployment::Deployment;
use utils::response::ApiResponse;

use crate::{DeploymentImpl, error::ApiError};

/// GET /api/admin/tools
pub async fn list_tools(
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<Vec<ToolSummary>>>, ApiError> {
    let tools = Tool::find_all_summaries(&deployment.db().pool).await?;
    Ok(ResponseJson(ApiResponse::success(tools)))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new().route("/admin/tools", get(list_tools))
}
