/// Reporting endpoints
///
/// # Endpoints
///
/// - `GET /v1/statistics?range=30d&backlog_cutoff=7` - All aggregations as JSON
/// - `GET /v1/statistics/export?range=30d&backlog_cutoff=7` - Same data as `.xlsx`
///
/// Both require technician or admin.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
};
use axum::{
    extract::{Query, State},
    response::Response,
    Json,
};
use helpdesk_shared::{
    auth::{authorization::require_role, middleware::AuthContext},
    models::user::UserRole,
    stats::{
        export::{export_workbook, EXPORT_FILENAME},
        StatisticsReport, TimeRange, DEFAULT_BACKLOG_CUTOFF_DAYS, MAX_BACKLOG_CUTOFF_DAYS,
    },
};
use serde::Deserialize;

use super::xlsx_attachment;

#[derive(Debug, Default, Deserialize)]
pub struct StatisticsQuery {
    /// `7d`, `30d` or `90d`; defaults to `30d`
    pub range: Option<TimeRange>,

    /// Width of each backlog bucket in days; defaults to 7
    pub backlog_cutoff: Option<i64>,
}

impl StatisticsQuery {
    fn resolve(&self) -> ApiResult<(TimeRange, i64)> {
        let cutoff = self.backlog_cutoff.unwrap_or(DEFAULT_BACKLOG_CUTOFF_DAYS);
        if !(1..=MAX_BACKLOG_CUTOFF_DAYS).contains(&cutoff) {
            return Err(ApiError::ValidationError(vec![ValidationErrorDetail::new(
                "backlog_cutoff",
                format!(
                    "Backlog cutoff must be between 1 and {} days",
                    MAX_BACKLOG_CUTOFF_DAYS
                ),
            )]));
        }

        Ok((self.range.unwrap_or_default(), cutoff))
    }
}

async fn collect(
    state: &AppState,
    auth: &AuthContext,
    query: &StatisticsQuery,
) -> ApiResult<StatisticsReport> {
    require_role(auth, UserRole::Technician)?;
    let (range, cutoff) = query.resolve()?;

    Ok(StatisticsReport::collect(&state.db, range, cutoff).await?)
}

pub async fn get_statistics(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(query): Query<StatisticsQuery>,
) -> ApiResult<Json<StatisticsReport>> {
    Ok(Json(collect(&state, &auth, &query).await?))
}

pub async fn export_statistics(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(query): Query<StatisticsQuery>,
) -> ApiResult<Response> {
    let report = collect(&state, &auth, &query).await?;
    let bytes = export_workbook(&report)?;

    tracing::info!(
        user_id = %auth.user_id,
        time_range = %report.time_range,
        "Statistics exported"
    );

    xlsx_attachment(EXPORT_FILENAME, bytes)
}
