// src/handlers/billing.rs

use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    Json,
};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
    models::billing::{BillingEvent, WebhookOutcome},
    services::webhook_service::SIGNATURE_HEADER,
};

// POST /api/webhooks/billing
// A assinatura é calculada sobre o corpo cru, então lemos Bytes antes do JSON.
#[utoipa::path(
    post,
    path = "/api/webhooks/billing",
    tag = "Billing",
    request_body = BillingEvent,
    responses(
        (status = 200, description = "Evento recebido; `applied` indica se alterou alguma assinatura", body = WebhookOutcome),
        (status = 400, description = "Corpo inválido"),
        (status = 401, description = "Assinatura ausente ou inválida")
    ),
    params(("x-signature" = String, Header, description = "sha256=<hmac hex do corpo>"))
)]
pub async fn billing_webhook(
    State(app_state): State<AppState>,
    locale: Locale,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookOutcome>, ApiError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());

    app_state
        .webhook_service
        .verify_signature(&body, signature)
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let event: BillingEvent = serde_json::from_slice(&body).map_err(|e| {
        AppError::Validation(format!("Evento inválido: {e}"))
            .to_api_error(&locale, &app_state.i18n_store)
    })?;

    let outcome = app_state
        .webhook_service
        .handle(event)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(outcome))
}
