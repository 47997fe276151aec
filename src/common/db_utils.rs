// src/common/db_utils.rs

use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::common::error::AppError;
use crate::middleware::tenancy::TenantContext;

// ---
// Helper RLS: a "chave" do banco de dados
// ---
/// Abre uma transação com as variáveis de RLS definidas para o tenant do contexto.
/// As políticas das tabelas de recursos só enxergam linhas de `app.organization_id`.
pub(crate) async fn begin_scoped(
    pool: &PgPool,
    ctx: &TenantContext,
) -> Result<Transaction<'static, Postgres>, AppError> {
    begin_for_organization(pool, ctx.organization_id(), Some(ctx.user_id())).await
}

/// Variante para caminhos de sistema (webhook de cobrança), sem usuário.
pub(crate) async fn begin_for_organization(
    pool: &PgPool,
    organization_id: Uuid,
    user_id: Option<Uuid>,
) -> Result<Transaction<'static, Postgres>, AppError> {
    // 1. Inicia a transação (set_config local só vale dentro dela)
    let mut tx = pool.begin().await?;

    // 2. Define o tenant
    sqlx::query("SELECT set_config('app.organization_id', $1, true)")
        .bind(organization_id.to_string())
        .execute(&mut *tx)
        .await?;

    // 3. Define o usuário, quando houver
    if let Some(user_id) = user_id {
        sqlx::query("SELECT set_config('app.user_id', $1, true)")
            .bind(user_id.to_string())
            .execute(&mut *tx)
            .await?;
    }

    Ok(tx)
}

/// Converte violação de unicidade em `Conflict`, o resto segue como erro de banco.
pub(crate) fn map_unique_violation(e: sqlx::Error, message: &str) -> AppError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            return AppError::Conflict(message.to_string());
        }
    }
    e.into()
}
