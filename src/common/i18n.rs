// src/common/i18n.rs

use std::collections::HashMap;
use std::sync::LazyLock;

const DEFAULT_LANG: &str = "en";

// Catálogo: (chave, inglês, português)
const MESSAGES: &[(&str, &str, &str)] = &[
    (
        "validation_failed",
        "One or more fields are invalid.",
        "Um ou mais campos são inválidos.",
    ),
    (
        "invalid_input",
        "The request data is invalid.",
        "Os dados enviados são inválidos.",
    ),
    (
        "authentication_required",
        "Missing or invalid authentication token.",
        "Token de autenticação inválido ou ausente.",
    ),
    (
        "invalid_credentials",
        "Invalid email or password.",
        "E-mail ou senha inválidos.",
    ),
    ("access_denied", "Access denied.", "Acesso negado."),
    (
        "limit_exceeded",
        "Your plan limit has been reached. Upgrade to add more.",
        "O limite do seu plano foi atingido. Faça upgrade para adicionar mais.",
    ),
    (
        "feature_not_available",
        "This feature is not available on your current plan.",
        "Este recurso não está disponível no seu plano atual.",
    ),
    ("not_found", "Resource not found.", "Recurso não encontrado."),
    (
        "conflict",
        "The resource already exists.",
        "O recurso já existe.",
    ),
    (
        "invite_already_used",
        "This invite has already been used.",
        "Este convite já foi utilizado.",
    ),
    (
        "invite_expired",
        "This invite has expired.",
        "Este convite expirou.",
    ),
    (
        "internal_error",
        "An unexpected error occurred.",
        "Ocorreu um erro inesperado.",
    ),
];

static FALLBACK: LazyLock<I18nStore> = LazyLock::new(I18nStore::new);

/// Mensagens de erro por idioma. Idiomas desconhecidos caem no inglês.
#[derive(Debug)]
pub struct I18nStore {
    catalogs: HashMap<&'static str, HashMap<&'static str, &'static str>>,
}

impl I18nStore {
    pub fn new() -> Self {
        let mut en = HashMap::new();
        let mut pt = HashMap::new();
        for (key, en_msg, pt_msg) in MESSAGES {
            en.insert(*key, *en_msg);
            pt.insert(*key, *pt_msg);
        }

        let mut catalogs = HashMap::new();
        catalogs.insert("en", en);
        catalogs.insert("pt", pt);
        Self { catalogs }
    }

    /// Instância compartilhada para quem não tem acesso ao AppState.
    pub fn fallback() -> &'static I18nStore {
        &FALLBACK
    }

    pub fn message(&self, key: &str, lang: &str) -> &'static str {
        self.catalogs
            .get(lang)
            .and_then(|catalog| catalog.get(key))
            .or_else(|| {
                self.catalogs
                    .get(DEFAULT_LANG)
                    .and_then(|catalog| catalog.get(key))
            })
            .copied()
            .unwrap_or("An unexpected error occurred.")
    }
}

impl Default for I18nStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_languages_fall_back_to_english() {
        let store = I18nStore::new();
        assert_eq!(store.message("access_denied", "de"), "Access denied.");
        assert_eq!(store.message("access_denied", "pt"), "Acesso negado.");
    }

    #[test]
    fn every_key_has_both_translations() {
        let store = I18nStore::new();
        for (key, en, pt) in MESSAGES {
            assert_eq!(store.message(key, "en"), *en);
            assert_eq!(store.message(key, "pt"), *pt);
        }
    }
}
