// src/services/import_service.rs

use chrono::NaiveDate;

use crate::{
    common::error::AppError,
    middleware::tenancy::TenantContext,
    models::{
        asset::{AssetCategory, NewAsset},
        import::ImportReport,
        license::NewLicense,
        subscription::Feature,
    },
    services::{
        asset_service::{trimmed, AssetService},
        license_service::LicenseService,
        plan_service::PlanService,
        policy::{self, Action},
    },
};

pub const ASSET_COLUMNS: [&str; 5] = ["name", "category", "serial_number", "location", "notes"];
pub const LICENSE_COLUMNS: [&str; 4] = ["product", "seat_key_full", "expires_at", "notes"];

/// Importação em lote. Cada linha passa pelo mesmo caminho de criação
/// (papel, limite do plano, auditoria); uma linha ruim não derruba o lote.
#[derive(Clone)]
pub struct ImportService {
    assets: AssetService,
    licenses: LicenseService,
    plan: PlanService,
}

impl ImportService {
    pub fn new(assets: AssetService, licenses: LicenseService, plan: PlanService) -> Self {
        Self {
            assets,
            licenses,
            plan,
        }
    }

    async fn ensure_allowed(&self, ctx: &TenantContext) -> Result<(), AppError> {
        policy::authorize(ctx, Action::ImportData)?;
        self.plan.require_feature(ctx, Feature::BulkImport).await
    }

    pub async fn import_assets(&self, ctx: &TenantContext, csv_bytes: &[u8]) -> Result<ImportReport, AppError> {
        self.ensure_allowed(ctx).await?;
        let rows = read_rows(csv_bytes, &ASSET_COLUMNS)?;

        let mut report = ImportReport::default();
        for (row, fields) in rows {
            let fields = match fields {
                Ok(fields) => fields,
                Err(message) => {
                    report.failure(row, message);
                    continue;
                }
            };
            let input = match parse_asset_row(&fields) {
                Ok(input) => input,
                Err(message) => {
                    report.failure(row, message);
                    continue;
                }
            };
            match self.assets.create(ctx, input).await {
                Ok(_) => report.success(),
                Err(e) => report.failure(row, row_message(e)),
            }
        }

        tracing::info!(
            organization_id = %ctx.organization_id(),
            imported = report.imported,
            failed = report.failed,
            "Importação de ativos concluída"
        );
        Ok(report)
    }

    pub async fn import_licenses(&self, ctx: &TenantContext, csv_bytes: &[u8]) -> Result<ImportReport, AppError> {
        self.ensure_allowed(ctx).await?;
        let rows = read_rows(csv_bytes, &LICENSE_COLUMNS)?;

        let mut report = ImportReport::default();
        for (row, fields) in rows {
            let parsed = fields.and_then(|fields| parse_license_row(&fields));
            let input = match parsed {
                Ok(input) => input,
                Err(message) => {
                    report.failure(row, message);
                    continue;
                }
            };
            match self.licenses.create(ctx, input).await {
                Ok(_) => report.success(),
                Err(e) => report.failure(row, row_message(e)),
            }
        }

        tracing::info!(
            organization_id = %ctx.organization_id(),
            imported = report.imported,
            failed = report.failed,
            "Importação de licenças concluída"
        );
        Ok(report)
    }
}

type Row = (usize, Result<Vec<String>, String>);

/// Valida o cabeçalho e devolve as linhas numeradas a partir de 1.
fn read_rows(csv_bytes: &[u8], expected: &[&str]) -> Result<Vec<Row>, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(csv_bytes);

    let headers = reader
        .headers()
        .map_err(|e| AppError::Validation(format!("CSV ilegível: {e}")))?;
    let matches = headers.len() == expected.len()
        && headers
            .iter()
            .zip(expected)
            .all(|(got, want)| got.trim().eq_ignore_ascii_case(want));
    if !matches {
        return Err(AppError::Validation(format!(
            "Cabeçalho inválido. Esperado: {}",
            expected.join(",")
        )));
    }

    Ok(reader
        .records()
        .enumerate()
        .map(|(i, record)| {
            let fields = match record {
                Ok(record) if record.len() == expected.len() => {
                    Ok(record.iter().map(str::to_string).collect())
                }
                Ok(record) => Err(format!(
                    "Esperadas {} colunas, encontradas {}.",
                    expected.len(),
                    record.len()
                )),
                Err(e) => Err(format!("Linha ilegível: {e}")),
            };
            (i + 1, fields)
        })
        .collect())
}

fn parse_asset_row(fields: &[String]) -> Result<NewAsset, String> {
    let name = fields[0].trim();
    if name.is_empty() {
        return Err("O nome é obrigatório.".into());
    }
    let category = AssetCategory::parse(&fields[1])
        .ok_or_else(|| format!("Categoria inválida: '{}'.", fields[1].trim()))?;
    Ok(NewAsset {
        name: name.to_string(),
        category,
        serial_number: trimmed(Some(fields[2].clone())),
        location: trimmed(Some(fields[3].clone())),
        notes: trimmed(Some(fields[4].clone())),
    })
}

fn parse_license_row(fields: &[String]) -> Result<NewLicense, String> {
    let product = fields[0].trim();
    if product.is_empty() {
        return Err("O produto é obrigatório.".into());
    }
    let full_key = fields[1].trim();
    if full_key.is_empty() {
        return Err("A chave da licença é obrigatória.".into());
    }
    let expires_at = match fields[2].trim() {
        "" => None,
        raw => Some(
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map_err(|_| format!("Data de expiração inválida: '{raw}' (use AAAA-MM-DD)."))?,
        ),
    };
    Ok(NewLicense {
        product: product.to_string(),
        full_key: full_key.to_string(),
        expires_at,
        notes: trimmed(Some(fields[3].clone())),
    })
}

// Erros de infraestrutura não vazam para o relatório
fn row_message(e: AppError) -> String {
    if e.status().is_server_error() {
        tracing::error!("Falha ao importar linha: {:?}", e);
        "Erro interno ao importar a linha.".to_string()
    } else {
        e.to_string()
    }
}
