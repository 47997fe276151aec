// src/models/invite.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::common::error::AppError;
use crate::models::auth::normalize_email;
use crate::models::organization::{MemberRole, Membership};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Invite {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub email: String,
    pub role: MemberRole,
    pub invited_by: Uuid,

    // O token só é devolvido uma vez, na criação (InviteCreated).
    #[serde(skip_serializing)]
    #[schema(ignore)]
    pub token: String,

    pub expires_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Estados derivados. "Revogado" não aparece: o convite revogado é apagado.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum InviteState {
    Pending,
    Accepted,
    Expired,
}

impl Invite {
    pub fn state(&self, now: DateTime<Utc>) -> InviteState {
        if self.accepted_at.is_some() {
            InviteState::Accepted
        } else if self.expires_at <= now {
            InviteState::Expired
        } else {
            InviteState::Pending
        }
    }

    /// Pré-condições de `pending -> accepted` que não dependem do banco.
    pub fn check_acceptance(&self, accepting_email: &str, now: DateTime<Utc>) -> Result<(), AppError> {
        match self.state(now) {
            InviteState::Accepted => return Err(AppError::InviteAlreadyUsed),
            InviteState::Expired => return Err(AppError::InviteExpired),
            InviteState::Pending => {}
        }

        if normalize_email(&self.email) != normalize_email(accepting_email) {
            return Err(AppError::AuthorizationDenied);
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InviteView {
    #[serde(flatten)]
    pub invite: Invite,
    pub state: InviteState,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InviteCreated {
    #[serde(flatten)]
    pub invite: Invite,
    pub token: String,
}

#[derive(Debug, Clone)]
pub struct NewInvite {
    pub email: String,
    pub role: MemberRole,
    pub invited_by: Uuid,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AcceptOutcome {
    pub membership: Membership,
    /// true quando o usuário já era membro (aceite sem efeito)
    pub already_member: bool,
}
