// src/models/license.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

const MASK_PREFIX: &str = "****-****-****-";
const VISIBLE_CHARS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "license_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LicenseStatus {
    Available,
    Assigned,
    Expired,
    Revoked,
}

// Projeção padrão da licença. Não existe campo para a chave completa:
// ela fica em `license_secrets` e só sai por `reveal_full_key`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct License {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub product: String,
    #[schema(example = "****-****-****-9999")]
    pub masked_key: String,
    pub status: LicenseStatus,
    pub assignee_user_id: Option<Uuid>,
    pub expires_at: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewLicense {
    pub product: String,
    pub full_key: String,
    pub expires_at: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl NewLicense {
    pub fn masked_key(&self) -> String {
        mask_key(&self.full_key)
    }
}

#[derive(Debug, Clone, Default)]
pub struct LicenseChanges {
    pub product: Option<String>,
    /// Nova chave; a máscara é derivada de novo na gravação.
    pub full_key: Option<String>,
    pub status: Option<LicenseStatus>,
    pub expires_at: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RevealedKey {
    pub license_id: Uuid,
    pub full_key: String,
}

/// Mantém visíveis só os 4 últimos caracteres.
/// `mask_key("ABCD-1234-WXYZ-9999") == "****-****-****-9999"`; chaves com até 4 caracteres viram `"****"`.
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= VISIBLE_CHARS {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - VISIBLE_CHARS..].iter().collect();
    format!("{MASK_PREFIX}{tail}")
}
