/// Dashboard endpoint
///
/// `GET /v1/dashboard` returns ticket counters and the five most urgent
/// active tickets.

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Json};
use helpdesk_shared::{
    auth::middleware::AuthContext,
    models::ticket::{DashboardSummary, Ticket},
};

pub async fn dashboard(
    State(state): State<AppState>,
    _auth: AuthContext,
) -> ApiResult<Json<DashboardSummary>> {
    Ok(Json(Ticket::dashboard(&state.db).await?))
}
