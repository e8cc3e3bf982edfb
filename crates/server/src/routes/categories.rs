//! Routes backing the category editor.

use axum::{
    Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::{get, post},
};
use db::models::category::{
    Category, CategorySummary, CategoryWithTools, DeleteCategories, DeletedCategories,
    UpsertCategory,
};
use deployment::Deployment;
use services::services::category_tree::CategoryTreeNode;
use tracing::info;
use utils::response::ApiResponse;

use crate::{DeploymentImpl, error::ApiError};

/// GET /api/admin/categories
/// Flat list with parent ids, full paths and subcategory counts
pub async fn list_categories(
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<Vec<CategorySummary>>>, ApiError> {
    let categories = deployment.categories().list().await?;
    Ok(ResponseJson(ApiResponse::success(categories)))
}

/// GET /api/admin/categories/tree
pub async fn get_category_tree(
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<Vec<CategoryTreeNode>>>, ApiError> {
    let tree = deployment.categories().tree().await?;
    Ok(ResponseJson(ApiResponse::success(tree)))
}

/// GET /api/admin/categories/by-slug/{slug}
pub async fn get_category(
    State(deployment): State<DeploymentImpl>,
    Path(slug): Path<String>,
) -> Result<ResponseJson<ApiResponse<CategoryWithTools>>, ApiError> {
    let category = deployment
        .categories()
        .find_by_slug(&slug)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Category `{slug}` not found")))?;
    Ok(ResponseJson(ApiResponse::success(category)))
}

/// POST /api/admin/categories
/// Creates when `id` is absent, updates otherwise
pub async fn upsert_category(
    State(deployment): State<DeploymentImpl>,
    axum::Json(payload): axum::Json<UpsertCategory>,
) -> Result<ResponseJson<ApiResponse<Category>>, ApiError> {
    let category = deployment.categories().upsert(payload).await?;
    Ok(ResponseJson(ApiResponse::success(category)))
}

/// POST /api/admin/categories/delete
pub async fn delete_categories(
    State(deployment): State<DeploymentImpl>,
    axum::Json(payload): axum::Json<DeleteCategories>,
) -> Result<ResponseJson<ApiResponse<DeletedCategories>>, ApiError> {
    if payload.ids.is_empty() {
        return Err(ApiError::BadRequest("No categories selected".to_string()));
    }
    let deleted = deployment.categories().delete(&payload.ids).await?;
    info!(deleted, "Deleted categories via admin api");
    Ok(ResponseJson(ApiResponse::success(DeletedCategories { deleted })))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new().nest(
        "/admin/categories",
        Router::new()
            .route("/", get(list_categories).post(upsert_category))
            .route("/tree", get(get_category_tree))
            .route("/delete", post(delete_categories))
            .route("/by-slug/{slug}", get(get_category)),
    )
}
