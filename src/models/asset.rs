// src/models/asset.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "asset_category", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AssetCategory {
    Laptop,
    Desktop,
    Monitor,
    Phone,
    Tablet,
    Peripheral,
    Network,
    Furniture,
    Other,
}

impl AssetCategory {
    pub const ALL: [AssetCategory; 9] = [
        AssetCategory::Laptop,
        AssetCategory::Desktop,
        AssetCategory::Monitor,
        AssetCategory::Phone,
        AssetCategory::Tablet,
        AssetCategory::Peripheral,
        AssetCategory::Network,
        AssetCategory::Furniture,
        AssetCategory::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Laptop => "laptop",
            Self::Desktop => "desktop",
            Self::Monitor => "monitor",
            Self::Phone => "phone",
            Self::Tablet => "tablet",
            Self::Peripheral => "peripheral",
            Self::Network => "network",
            Self::Furniture => "furniture",
            Self::Other => "other",
        }
    }

    /// Aceita o valor em qualquer caixa ("Laptop", " laptop ").
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(value))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "asset_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AssetStatus {
    Available,
    Assigned,
    Maintenance,
    Retired,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub category: AssetCategory,
    pub serial_number: Option<String>,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub status: AssetStatus,
    pub assignee_user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAsset {
    pub name: String,
    pub category: AssetCategory,
    pub serial_number: Option<String>,
    pub location: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct AssetChanges {
    pub name: Option<String>,
    pub category: Option<AssetCategory>,
    pub serial_number: Option<String>,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub status: Option<AssetStatus>,
}

/// Atribuição (ou devolução, com `None`)
#[derive(Debug, Clone, Copy)]
pub struct Assignment {
    pub assignee_user_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct AssetFilter {
    pub status: Option<AssetStatus>,
    pub category: Option<AssetCategory>,
    /// Busca por nome ou número de série
    pub search: Option<String>,
}

impl AssetFilter {
    pub fn matches(&self, asset: &Asset) -> bool {
        if self.status.is_some_and(|s| s != asset.status) {
            return false;
        }
        if self.category.is_some_and(|c| c != asset.category) {
            return false;
        }
        match self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(term) => {
                let term = term.to_lowercase();
                asset.name.to_lowercase().contains(&term)
                    || asset
                        .serial_number
                        .as_deref()
                        .is_some_and(|s| s.to_lowercase().contains(&term))
            }
            None => true,
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusCount {
    pub status: AssetStatus,
    pub count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_parse_case_insensitively() {
        assert_eq!(AssetCategory::parse(" Laptop "), Some(AssetCategory::Laptop));
        assert_eq!(AssetCategory::parse("FURNITURE"), Some(AssetCategory::Furniture));
        assert_eq!(AssetCategory::parse("spaceship"), None);
        assert_eq!(AssetCategory::parse(""), None);
    }
}
