use crate::models::{
    CreatePreferenceRequest, PaymentStatus, PreferenceResponse, PromotionResponse, WebhookAck,
    WebhookNotification,
};
use crate::routes::{ensure_company_owner, ApiError, AppState, AuthenticatedUser};
use crate::services::{GatewayPayment, PreferenceItem};
use actix_web::{web, HttpResponse};
use chrono::{Duration, Utc};
use validator::Validate;

/// Promotion length when the buyer does not choose one
pub const DEFAULT_PROMOTION_DAYS: i32 = 30;

/// Configure payment routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/payments/preference", web::post().to(create_preference))
        .route("/payments/webhook", web::post().to(payment_webhook))
        .route("/payments/status/{promotion_id}", web::get().to(promotion_status));
}

/// Start a promotion checkout
///
/// POST /api/v1/payments/preference
///
/// Request body:
/// ```json
/// {
///   "company_id": 1,
///   "amount_cents": 4990,
///   "duration_days": 30
/// }
/// ```
async fn create_preference(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    req: web::Json<CreatePreferenceRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;
    ensure_company_owner(&state, req.company_id, &user).await?;

    let company = state
        .postgres
        .get_company(req.company_id)
        .await?
        .ok_or_else(ApiError::forbidden)?;

    let duration_days = req.duration_days.unwrap_or(DEFAULT_PROMOTION_DAYS);

    let preference = state
        .payments
        .create_preference(&PreferenceItem {
            company_id: company.id,
            company_name: &company.company_name,
            payer_email: &user.email,
            amount_cents: req.amount_cents,
            duration_days,
        })
        .await?;

    let promotion = state
        .postgres
        .create_promotion(
            company.id,
            req.amount_cents,
            duration_days,
            &preference.external_reference,
        )
        .await?;

    tracing::info!(
        "Created pending promotion {} for company {} (preference {})",
        promotion.id,
        company.id,
        preference.id
    );

    Ok(HttpResponse::Ok().json(PreferenceResponse {
        preference_id: preference.id,
        init_point: preference.init_point,
        promotion_id: promotion.id,
    }))
}

/// Gateway notification
///
/// POST /api/v1/payments/webhook
///
/// Non-payment notifications are acknowledged and ignored.
async fn payment_webhook(
    state: web::Data<AppState>,
    req: web::Json<WebhookNotification>,
) -> Result<HttpResponse, ApiError> {
    let ack = HttpResponse::Ok().json(WebhookAck { received: true });

    if req.kind != "payment" {
        tracing::debug!("Ignoring {:?} notification", req.kind);
        return Ok(ack);
    }

    let payment_id = req
        .data
        .as_ref()
        .and_then(|data| data.id_string())
        .ok_or_else(|| ApiError::BadRequest("Payment notification without id".to_string()))?;

    let payment = state.payments.get_payment(&payment_id).await?;
    apply_payment(&state, &payment).await?;

    Ok(ack)
}

/// Settle the promotion a gateway payment refers to
async fn apply_payment(state: &AppState, payment: &GatewayPayment) -> Result<(), ApiError> {
    let target = if payment.is_approved() {
        PaymentStatus::Approved
    } else if payment.is_rejected() {
        PaymentStatus::Failed
    } else {
        tracing::debug!("Payment {} is {}, nothing to do", payment.id, payment.status);
        return Ok(());
    };

    let Some(reference) = payment.external_reference.as_deref() else {
        tracing::warn!("Payment {} has no external reference", payment.id);
        return Ok(());
    };

    let Some(promotion) = state.postgres.find_promotion_by_payment(reference).await? else {
        tracing::warn!("No promotion for payment reference {}", reference);
        return Ok(());
    };

    if !promotion.payment_status.can_transition_to(target) {
        tracing::debug!(
            "Promotion {} already {:?}, ignoring {:?}",
            promotion.id,
            promotion.payment_status,
            target
        );
        return Ok(());
    }

    match target {
        PaymentStatus::Approved => {
            let start = Utc::now();
            let end = start + Duration::days(i64::from(promotion.duration_days));
            state
                .postgres
                .activate_promotion(promotion.id, start, end)
                .await?;
        }
        PaymentStatus::Failed => {
            state.postgres.fail_promotion(promotion.id).await?;
            tracing::info!("Promotion {} payment failed ({})", promotion.id, payment.status);
        }
        PaymentStatus::Pending => {}
    }

    Ok(())
}

/// Promotion state for its owner
///
/// GET /api/v1/payments/status/{promotion_id}
async fn promotion_status(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let promotion = state
        .postgres
        .get_promotion(path.into_inner())
        .await?
        .ok_or_else(ApiError::forbidden)?;

    ensure_company_owner(&state, promotion.company_id, &user).await?;

    Ok(HttpResponse::Ok().json(PromotionResponse { promotion }))
}
