// src/db/request_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{db_utils::begin_scoped, error::AppError},
    db::repository::RequestRepository,
    middleware::tenancy::TenantContext,
    models::request::{NewRequest, RequestDecision, RequestStatus, RequestedResource, ResourceRequest},
};

const REQUEST_COLUMNS: &str = "id, organization_id, requested_by, resource_type, resource_id, \
     reason, status, decided_by, decided_at, created_at";

#[derive(Clone)]
pub struct PgRequestRepository {
    pool: PgPool,
}

impl PgRequestRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RequestRepository for PgRequestRepository {
    async fn create_request(&self, ctx: &TenantContext, input: NewRequest) -> Result<ResourceRequest, AppError> {
        let mut tx = begin_scoped(&self.pool, ctx).await?;
        let request = sqlx::query_as::<_, ResourceRequest>(&format!(
            r#"
            INSERT INTO asset_requests (organization_id, requested_by, resource_type, resource_id, reason, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {REQUEST_COLUMNS}
            "#
        ))
        .bind(ctx.organization_id())
        .bind(input.requested_by)
        .bind(input.resource_type)
        .bind(input.resource_id)
        .bind(&input.reason)
        .bind(RequestStatus::Pending)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(request)
    }

    async fn list_requests(
        &self,
        ctx: &TenantContext,
        requested_by: Option<Uuid>,
    ) -> Result<Vec<ResourceRequest>, AppError> {
        let mut tx = begin_scoped(&self.pool, ctx).await?;
        let requests = sqlx::query_as::<_, ResourceRequest>(&format!(
            r#"
            SELECT {REQUEST_COLUMNS} FROM asset_requests
            WHERE organization_id = $1 AND ($2::uuid IS NULL OR requested_by = $2)
            ORDER BY created_at DESC
            "#
        ))
        .bind(ctx.organization_id())
        .bind(requested_by)
        .fetch_all(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(requests)
    }

    async fn get_request(&self, ctx: &TenantContext, id: Uuid) -> Result<Option<ResourceRequest>, AppError> {
        let mut tx = begin_scoped(&self.pool, ctx).await?;
        let request = sqlx::query_as::<_, ResourceRequest>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM asset_requests WHERE id = $1 AND organization_id = $2"
        ))
        .bind(id)
        .bind(ctx.organization_id())
        .fetch_optional(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(request)
    }

    async fn decide_request(
        &self,
        ctx: &TenantContext,
        id: Uuid,
        decision: RequestDecision,
    ) -> Result<Option<ResourceRequest>, AppError> {
        let mut tx = begin_scoped(&self.pool, ctx).await?;
        let request = sqlx::query_as::<_, ResourceRequest>(&format!(
            r#"
            UPDATE asset_requests SET status = $3, decided_by = $4, decided_at = NOW()
            WHERE id = $1 AND organization_id = $2 AND status = 'pending'
            RETURNING {REQUEST_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(ctx.organization_id())
        .bind(decision.status)
        .bind(decision.decided_by)
        .fetch_optional(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(request)
    }

    async fn approve_request(
        &self,
        ctx: &TenantContext,
        id: Uuid,
        decided_by: Uuid,
    ) -> Result<Option<ResourceRequest>, AppError> {
        let mut tx = begin_scoped(&self.pool, ctx).await?;
        let Some(request) = sqlx::query_as::<_, ResourceRequest>(&format!(
            r#"
            UPDATE asset_requests SET status = 'approved', decided_by = $3, decided_at = NOW()
            WHERE id = $1 AND organization_id = $2 AND status = 'pending'
            RETURNING {REQUEST_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(ctx.organization_id())
        .bind(decided_by)
        .fetch_optional(&mut *tx)
        .await?
        else {
            return Ok(None);
        };

        if let Some(resource_id) = request.resource_id {
            let table = match request.resource_type {
                RequestedResource::Asset => "assets",
                RequestedResource::License => "licenses",
            };
            let assigned: Option<Uuid> = sqlx::query_scalar(&format!(
                r#"
                UPDATE {table} SET assignee_user_id = $3, status = 'assigned', updated_at = NOW()
                WHERE id = $1 AND organization_id = $2
                RETURNING id
                "#
            ))
            .bind(resource_id)
            .bind(ctx.organization_id())
            .bind(request.requested_by)
            .fetch_optional(&mut *tx)
            .await?;

            // Sem commit: a decisão volta junto
            if assigned.is_none() {
                return Err(AppError::NotFound(request.resource_type.label()));
            }
        }

        tx.commit().await?;
        Ok(Some(request))
    }

    async fn count_pending_requests(&self, ctx: &TenantContext) -> Result<i64, AppError> {
        let mut tx = begin_scoped(&self.pool, ctx).await?;
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM asset_requests WHERE organization_id = $1 AND status = 'pending'",
        )
        .bind(ctx.organization_id())
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(count)
    }
}
