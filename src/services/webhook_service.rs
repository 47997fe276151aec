// src/services/webhook_service.rs

use std::sync::Arc;

use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;

use crate::{
    common::error::AppError,
    db::repository::{OrganizationRepository, SubscriptionRepository, UserRepository},
    models::{
        audit::{AuditResource, NewAuditEntry},
        auth::normalize_email,
        billing::{BillingEvent, WebhookOutcome},
        subscription::{BillingUpdate, Plan, SubscriptionStatus},
    },
    services::audit_service::AuditService,
};

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "x-signature";
const SIGNATURE_PREFIX: &str = "sha256=";

/// Mudança de assinatura derivada de um evento.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Transition {
    pub plan: Option<Plan>,
    pub status: SubscriptionStatus,
    pub sets_period: bool,
}

#[derive(Clone)]
pub struct WebhookService {
    secret: Option<String>,
    users: Arc<dyn UserRepository>,
    organizations: Arc<dyn OrganizationRepository>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    audit: AuditService,
}

impl WebhookService {
    pub fn new(
        secret: Option<String>,
        users: Arc<dyn UserRepository>,
        organizations: Arc<dyn OrganizationRepository>,
        subscriptions: Arc<dyn SubscriptionRepository>,
        audit: AuditService,
    ) -> Self {
        Self {
            secret,
            users,
            organizations,
            subscriptions,
            audit,
        }
    }

    /// Sem segredo configurado, nenhuma chamada é aceita.
    pub fn verify_signature(&self, body: &[u8], header: Option<&str>) -> Result<(), AppError> {
        let Some(secret) = self.secret.as_deref() else {
            tracing::warn!("Webhook recusado: BILLING_WEBHOOK_SECRET não configurado");
            return Err(AppError::AuthenticationRequired);
        };
        let valid = header
            .and_then(|h| h.trim().strip_prefix(SIGNATURE_PREFIX))
            .and_then(|hex_sig| hex::decode(hex_sig).ok())
            .is_some_and(|sig| {
                HmacSha256::new_from_slice(secret.as_bytes())
                    .map(|mut mac| {
                        mac.update(body);
                        mac.verify_slice(&sig).is_ok()
                    })
                    .unwrap_or(false)
            });
        if valid {
            Ok(())
        } else {
            tracing::warn!("Webhook recusado: assinatura inválida");
            Err(AppError::AuthenticationRequired)
        }
    }

    pub async fn handle(&self, event: BillingEvent) -> Result<WebhookOutcome, AppError> {
        // 1. Evento conhecido?
        let Some(transition) = transition_for(&event) else {
            tracing::warn!(event = %event.event, "Evento de cobrança não reconhecido");
            return Ok(WebhookOutcome::ignored());
        };

        // 2. E-mail -> usuário -> primeira organização da qual é dono
        let email = normalize_email(&event.supporter_email);
        let Some(user) = self.users.find_by_email(&email).await? else {
            tracing::warn!(%email, event = %event.event, "Webhook sem usuário correspondente; reconciliar manualmente");
            return Ok(WebhookOutcome::ignored());
        };
        let Some(organization) = self.organizations.find_first_owned_by(user.id).await? else {
            tracing::warn!(user_id = %user.id, event = %event.event, "Webhook sem organização correspondente; reconciliar manualmente");
            return Ok(WebhookOutcome::ignored());
        };

        // 3. Aplica
        let update = BillingUpdate {
            plan: transition.plan,
            status: transition.status,
            supporter_email: email,
            external_subscription_id: event.subscription_id.clone(),
            current_period_start: event.period_start.filter(|_| transition.sets_period),
            current_period_end: event.period_end.filter(|_| transition.sets_period),
        };
        let subscription = self
            .subscriptions
            .apply_billing_update(organization.id, update)
            .await?;

        tracing::info!(
            organization_id = %organization.id,
            plan = ?subscription.plan,
            status = ?subscription.status,
            event = %event.event,
            "Assinatura atualizada"
        );

        self.audit
            .record(
                NewAuditEntry::new(
                    organization.id,
                    AuditResource::Subscription,
                    Some(subscription.id),
                    "subscription.updated",
                )
                .with_metadata(json!({
                    "event": event.event,
                    "plan": subscription.plan,
                    "status": subscription.status,
                })),
            )
            .await?;

        Ok(WebhookOutcome {
            applied: true,
            organization_id: Some(organization.id),
        })
    }
}

/// Nome do tier vence; sem tier reconhecível, decide pelo preço.
pub fn plan_for(tier: Option<&str>, price: Option<f64>) -> Plan {
    if let Some(tier) = tier.map(str::to_lowercase) {
        if tier.contains("enterprise") {
            return Plan::Enterprise;
        }
        if tier.contains("pro") {
            return Plan::Pro;
        }
    }
    match price {
        Some(p) if p >= 49.0 => Plan::Enterprise,
        Some(p) if p >= 9.0 => Plan::Pro,
        _ => Plan::Free,
    }
}

pub(crate) fn transition_for(event: &BillingEvent) -> Option<Transition> {
    let kind = event.event.trim().to_lowercase();
    let transition = match kind.as_str() {
        "started" | "renewed" | "upgraded" => Transition {
            plan: Some(plan_for(event.tier.as_deref(), event.price)),
            status: SubscriptionStatus::Active,
            sets_period: true,
        },
        "cancelled" | "canceled" => Transition {
            plan: None,
            status: SubscriptionStatus::Canceled,
            sets_period: false,
        },
        "expired" => Transition {
            plan: Some(Plan::Free),
            status: SubscriptionStatus::Active,
            sets_period: false,
        },
        "payment_failed" => Transition {
            plan: None,
            status: SubscriptionStatus::PastDue,
            sets_period: false,
        },
        _ => return None,
    };
    Some(transition)
}
