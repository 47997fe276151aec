// src/middleware/i18n.rs

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts, HeaderMap};

const SUPPORTED: &[&str] = &["en", "pt"];
const DEFAULT_LANG: &str = "en";

// Idioma das mensagens de erro, lido do Accept-Language
#[derive(Debug, Clone)]
pub struct Locale(pub String);

impl Default for Locale {
    fn default() -> Self {
        Locale(DEFAULT_LANG.to_string())
    }
}

impl Locale {
    pub fn from_header(value: &str) -> Self {
        accept_language::intersection(value, SUPPORTED)
            .into_iter()
            .next()
            .map(Locale)
            .or_else(|| {
                // "pt-BR" -> "pt"
                accept_language::parse(value)
                    .into_iter()
                    .filter_map(|tag| tag.split('-').next().map(str::to_lowercase))
                    .find(|lang| SUPPORTED.contains(&lang.as_str()))
                    .map(Locale)
            })
            .unwrap_or_default()
    }

    /// Usado pelos middlewares, que recebem a requisição inteira.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get(header::ACCEPT_LANGUAGE)
            .and_then(|header_value| header_value.to_str().ok())
            .map(Locale::from_header)
            .unwrap_or_default()
    }
}

impl<S> FromRequestParts<S> for Locale
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Locale::from_headers(&parts.headers))
    }
}
