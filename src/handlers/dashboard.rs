use axum::{extract::State, response::Json};

use super::require_admin;
use crate::services::dashboard::DashboardSummary;
use crate::{auth::AuthUser, errors::ServiceError, ApiResponse, AppState};

#[utoipa::path(
    get,
    path = "/api/v1/admin/dashboard",
    responses(
        (status = 200, description = "Summary retrieved", body = ApiResponse<DashboardSummary>),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "admin"
)]
pub async fn dashboard_summary(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<ApiResponse<DashboardSummary>>, ServiceError> {
    require_admin(&auth_user)?;
    let summary = state.services.dashboard.summary().await?;
    Ok(Json(ApiResponse::success(summary)))
}
