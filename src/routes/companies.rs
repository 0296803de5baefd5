use crate::core::paginate;
use crate::models::{
    AnalyticsMetric, CompanyResponse, CompanyUpdate, Coordinate, MessageResponse, SearchRequest,
    SearchResponse, SponsoredRequest, SponsoredResponse, UpdateCompanyRequest,
};
use crate::routes::{ensure_company_owner, ApiError, AppState, AuthenticatedUser};
use crate::services::normalize_postal_code;
use actix_web::{web, HttpResponse};
use chrono::Utc;
use validator::Validate;

/// Configure company routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/companies/search", web::post().to(search_companies))
        .route("/companies/sponsored", web::post().to(sponsored_companies))
        .route("/companies/location/{cep}", web::get().to(lookup_location))
        .service(
            web::resource("/companies/{id}")
                .route(web::get().to(get_company))
                .route(web::put().to(update_company)),
        )
        .route("/companies/{id}/whatsapp-click", web::post().to(record_whatsapp_click));
}

/// Proximity search
///
/// POST /api/v1/companies/search
///
/// Request body:
/// ```json
/// {
///   "latitude": -23.55,
///   "longitude": -46.63,
///   "category": "string",
///   "radius_km": 10,
///   "page": 1,
///   "per_page": 20
/// }
/// ```
async fn search_companies(
    state: web::Data<AppState>,
    req: web::Json<SearchRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;

    let origin = match (req.latitude, req.longitude) {
        (Some(lat), Some(lon)) => Some(Coordinate::new(lat, lon)?),
        _ => None,
    };

    let query = state
        .search
        .prepare(origin, req.category.as_deref(), req.radius_km)?;

    let candidates = state.postgres.search_candidates(&query).await?;
    tracing::debug!(
        "Search at ({}, {}) within {} km: {} candidates from store",
        query.origin.latitude(),
        query.origin.longitude(),
        query.radius_km,
        candidates.len()
    );

    let result = state.search.execute(&query, candidates);

    let per_page = state.paging.resolve(req.per_page);
    let page = paginate(result.hits, req.page.unwrap_or(1), per_page);

    tracing::info!(
        "Returning {} of {} companies (from {} candidates)",
        page.items.len(),
        page.total,
        result.total_candidates
    );

    Ok(HttpResponse::Ok().json(SearchResponse {
        companies: page.items,
        page: page.page,
        per_page: page.per_page,
        total_results: page.total,
        total_pages: page.total_pages,
        has_next: page.has_next,
    }))
}

/// Sponsored carousel
///
/// POST /api/v1/companies/sponsored
///
/// `limit` defaults to `sponsorship.default_limit`; values above
/// `sponsorship.max_limit` are a 400.
async fn sponsored_companies(
    state: web::Data<AppState>,
    req: Option<web::Json<SponsoredRequest>>,
) -> Result<HttpResponse, ApiError> {
    let req = req.map(web::Json::into_inner).unwrap_or_default();
    req.validate()?;
    let limit = state
        .sponsorship
        .resolve_limit(req.limit.map(|l| l as usize))?;

    let region = req.region.as_deref().map(str::trim).filter(|r| !r.is_empty());
    let candidates = state
        .postgres
        .sponsored_candidates(region, Utc::now())
        .await?;

    let companies = state.sponsorship.select(
        candidates,
        region,
        limit,
        &mut rand::thread_rng(),
    );

    tracing::debug!("Sponsored carousel: {} companies", companies.len());

    Ok(HttpResponse::Ok().json(SponsoredResponse { companies }))
}

/// Postal code lookup
///
/// GET /api/v1/companies/location/{cep}
async fn lookup_location(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let location = state.geocoder.resolve(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(location))
}

/// Company profile; each fetch counts as a profile view
///
/// GET /api/v1/companies/{id}
async fn get_company(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let company_id = path.into_inner();

    let company = state
        .postgres
        .get_company(company_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Company {} not found", company_id)))?;

    if let Err(e) = state
        .postgres
        .increment_metric(company_id, Utc::now().date_naive(), AnalyticsMetric::ProfileView)
        .await
    {
        tracing::warn!("Failed to record profile view for {}: {}", company_id, e);
    }

    Ok(HttpResponse::Ok().json(CompanyResponse { company }))
}

/// Count a WhatsApp contact click
///
/// POST /api/v1/companies/{id}/whatsapp-click
async fn record_whatsapp_click(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let company_id = path.into_inner();

    if state.postgres.company_owner(company_id).await?.is_none() {
        return Err(ApiError::NotFound(format!("Company {} not found", company_id)));
    }

    state
        .postgres
        .increment_metric(company_id, Utc::now().date_naive(), AnalyticsMetric::WhatsappClick)
        .await?;

    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Click registered".to_string(),
    }))
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Build the store update from a request; blank strings are ignored
fn company_update_from(req: UpdateCompanyRequest) -> CompanyUpdate {
    CompanyUpdate {
        company_name: trimmed(req.company_name),
        description: trimmed(req.description),
        phone: trimmed(req.phone),
        whatsapp: trimmed(req.whatsapp),
        address: trimmed(req.address),
        city: trimmed(req.city),
        state: trimmed(req.state).map(|s| s.to_uppercase()),
        postal_code: trimmed(req.postal_code),
        category: trimmed(req.category),
        logo_url: trimmed(req.logo_url),
        coordinate: None,
        region: None,
    }
}

/// Owner-only partial profile update
///
/// PUT /api/v1/companies/{id}
///
/// A new postal code is geocoded; when the lookup fails the remaining
/// fields are still saved.
async fn update_company(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<i64>,
    req: web::Json<UpdateCompanyRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;
    let company_id = path.into_inner();

    ensure_company_owner(&state, company_id, &user).await?;

    let mut update = company_update_from(req.into_inner());

    if let Some(raw) = update.postal_code.take() {
        let cep = normalize_postal_code(&raw)?;

        match state.geocoder.resolve(&cep).await {
            Ok(location) => {
                update.coordinate = location.coordinate;
                update.region = location.region;
            }
            Err(e) if e.is_recoverable() => {
                tracing::warn!("Keeping previous location for company {}: {}", company_id, e);
            }
            Err(e) => return Err(e.into()),
        }
        update.postal_code = Some(cep);
    }

    if update.is_empty() {
        return Err(ApiError::BadRequest("No fields to update".to_string()));
    }

    if !state.postgres.update_company(company_id, &update).await? {
        return Err(ApiError::NotFound(format!("Company {} not found", company_id)));
    }

    tracing::info!("Company {} updated by {}", company_id, user.id);

    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Company updated successfully".to_string(),
    }))
}
