use crate::core::insights::{
    build_report, summarize, window_start, DASHBOARD_WINDOW_DAYS, SUMMARY_WINDOW_DAYS,
};
use crate::routes::{ensure_company_owner, ApiError, AppState, AuthenticatedUser};
use actix_web::{web, HttpResponse};
use chrono::Utc;

/// Configure analytics routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/analytics/company/{id}", web::get().to(company_report))
        .route("/analytics/company/{id}/summary", web::get().to(company_summary));
}

/// 30-day dashboard for the owner
///
/// GET /api/v1/analytics/company/{id}
async fn company_report(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let company_id = path.into_inner();
    ensure_company_owner(&state, company_id, &user).await?;

    let since = window_start(Utc::now().date_naive(), DASHBOARD_WINDOW_DAYS);
    let days = state.postgres.analytics_since(company_id, since).await?;

    Ok(HttpResponse::Ok().json(build_report(days)))
}

/// 7-day totals for the owner
///
/// GET /api/v1/analytics/company/{id}/summary
async fn company_summary(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let company_id = path.into_inner();
    ensure_company_owner(&state, company_id, &user).await?;

    let since = window_start(Utc::now().date_naive(), SUMMARY_WINDOW_DAYS);
    let days = state.postgres.analytics_since(company_id, since).await?;

    Ok(HttpResponse::Ok().json(summarize(&days, "last_7_days")))
}
