// src/models/import.rs

use serde::Serialize;
use utoipa::ToSchema;

// Falha de uma linha do CSV (linhas de dados contadas a partir de 1)
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RowError {
    pub row: usize,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct ImportReport {
    pub imported: usize,
    pub failed: usize,
    pub errors: Vec<RowError>,
}

impl ImportReport {
    pub fn success(&mut self) {
        self.imported += 1;
    }

    pub fn failure(&mut self, row: usize, message: impl Into<String>) {
        self.failed += 1;
        self.errors.push(RowError {
            row,
            message: message.into(),
        });
    }
}
