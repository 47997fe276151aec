// src/db/subscription_repo.rs

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::{
    common::{
        db_utils::{begin_for_organization, begin_scoped},
        error::AppError,
    },
    db::repository::SubscriptionRepository,
    middleware::tenancy::TenantContext,
    models::subscription::{BillingUpdate, ResourceKind, Subscription},
};

pub(crate) const SUBSCRIPTION_COLUMNS: &str = "id, organization_id, plan, status, \
     external_supporter_email, external_subscription_id, \
     current_period_start, current_period_end, created_at, updated_at";

// ---
// Trava de capacidade
// ---
/// Trava a assinatura da organização até o fim da transação, conta as linhas
/// vivas do recurso e aplica `Subscription::admit`. Toda inserção de ativo,
/// licença ou membro passa por aqui antes do INSERT, na mesma transação.
pub(crate) async fn admit_locked(
    conn: &mut PgConnection,
    organization_id: Uuid,
    kind: ResourceKind,
) -> Result<(), AppError> {
    // 1. Serializa as criações concorrentes da mesma organização
    let subscription = sqlx::query_as::<_, Subscription>(&format!(
        "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE organization_id = $1 FOR UPDATE"
    ))
    .bind(organization_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(AppError::NotFound("Assinatura"))?;

    // 2. Conta com a trava já adquirida
    let count_sql = match kind {
        ResourceKind::Asset => "SELECT COUNT(*) FROM assets WHERE organization_id = $1",
        ResourceKind::License => "SELECT COUNT(*) FROM licenses WHERE organization_id = $1",
        ResourceKind::Member => "SELECT COUNT(*) FROM memberships WHERE organization_id = $1",
    };
    let current: i64 = sqlx::query_scalar(count_sql)
        .bind(organization_id)
        .fetch_one(&mut *conn)
        .await?;

    // 3. A decisão é do modelo
    subscription.admit(kind, current)
}

#[derive(Clone)]
pub struct PgSubscriptionRepository {
    pool: PgPool,
}

impl PgSubscriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriptionRepository for PgSubscriptionRepository {
    async fn get_subscription(&self, ctx: &TenantContext) -> Result<Subscription, AppError> {
        let mut tx = begin_scoped(&self.pool, ctx).await?;
        let subscription = sqlx::query_as::<_, Subscription>(&format!(
            "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE organization_id = $1"
        ))
        .bind(ctx.organization_id())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::NotFound("Assinatura"))?;
        tx.commit().await?;
        Ok(subscription)
    }

    async fn apply_billing_update(
        &self,
        organization_id: Uuid,
        update: BillingUpdate,
    ) -> Result<Subscription, AppError> {
        let mut tx = begin_for_organization(&self.pool, organization_id, None).await?;

        // COALESCE: eventos sem plano (cancelamento, falha de pagamento) mantêm o atual
        let subscription = sqlx::query_as::<_, Subscription>(&format!(
            r#"
            UPDATE subscriptions SET
                plan = COALESCE($2, plan),
                status = $3,
                external_supporter_email = $4,
                external_subscription_id = COALESCE($5, external_subscription_id),
                current_period_start = COALESCE($6, current_period_start),
                current_period_end = COALESCE($7, current_period_end),
                updated_at = NOW()
            WHERE organization_id = $1
            RETURNING {SUBSCRIPTION_COLUMNS}
            "#
        ))
        .bind(organization_id)
        .bind(update.plan)
        .bind(update.status)
        .bind(&update.supporter_email)
        .bind(&update.external_subscription_id)
        .bind(update.current_period_start)
        .bind(update.current_period_end)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::NotFound("Assinatura"))?;

        tx.commit().await?;
        Ok(subscription)
    }
}
