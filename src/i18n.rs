// ============================================================================
// Locales
// ============================================================================
//
// - Locale: a single locale code ("en", "es", "pt-BR")
// - AvailableLocales: the configured, ordered set of supported locales
// - negotiate(): decide what a `locale` request parameter does
// - translate(): tiny message catalog for page titles
//
// The active locale is request-scoped: every request starts at the configured
// default and only the `locale` parameter of that request can change it.
//
// ============================================================================

use serde::Serialize;
use std::fmt;

/// A locale code accepted by the server
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Locale(String);

impl Locale {
    /// Validates the shape of a locale code. Does not check availability.
    pub fn new(code: &str) -> Result<Self, LocaleError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(LocaleError::Empty);
        }
        if !code
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(LocaleError::Malformed(code.to_string()));
        }
        Ok(Self(code.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LocaleError {
    #[error("locale code is empty")]
    Empty,
    #[error("malformed locale code: {0:?}")]
    Malformed(String),
    #[error("no locales configured")]
    NoneConfigured,
}

/// Ordered set of supported locales. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailableLocales {
    locales: Vec<Locale>,
}

impl AvailableLocales {
    pub fn new<I, S>(codes: I) -> Result<Self, LocaleError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut locales: Vec<Locale> = Vec::new();
        for code in codes {
            let locale = Locale::new(code.as_ref())?;
            if !locales.contains(&locale) {
                locales.push(locale);
            }
        }
        if locales.is_empty() {
            return Err(LocaleError::NoneConfigured);
        }
        Ok(Self { locales })
    }

    /// Parses a comma separated list such as "en,es"
    pub fn parse_list(raw: &str) -> Result<Self, LocaleError> {
        Self::new(raw.split(',').map(str::trim).filter(|s| !s.is_empty()))
    }

    /// Exact, case-sensitive lookup of a requested code
    pub fn resolve(&self, code: &str) -> Option<&Locale> {
        self.locales.iter().find(|l| l.as_str() == code)
    }

    pub fn first(&self) -> &Locale {
        // Constructors reject an empty list
        &self.locales[0]
    }
}

impl Default for AvailableLocales {
    fn default() -> Self {
        Self {
            locales: vec![Locale("en".to_string()), Locale("es".to_string())],
        }
    }
}

impl fmt::Display for AvailableLocales {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let codes: Vec<&str> = self.locales.iter().map(Locale::as_str).collect();
        f.write_str(&codes.join(","))
    }
}

/// Outcome of looking at the `locale` request parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocaleSwitch {
    /// No parameter supplied
    Unchanged,
    /// Parameter names an available locale
    Switched(Locale),
    /// Parameter supplied but not available; carries the raw value
    Unsupported(String),
}

pub fn negotiate(available: &AvailableLocales, param: Option<&str>) -> LocaleSwitch {
    match param {
        None => LocaleSwitch::Unchanged,
        Some(code) => match available.resolve(code) {
            Some(locale) => LocaleSwitch::Switched(locale.clone()),
            None => LocaleSwitch::Unsupported(code.to_string()),
        },
    }
}

/// User-visible notice for an unsupported locale request
pub fn unsupported_locale_notice(code: &str) -> String {
    format!("{} translation not available", code)
}

// ============================================================================
// Message catalog
// ============================================================================

const FALLBACK_LOCALE: &str = "en";

const CATALOG: &[(&str, &str, &str)] = &[
    ("en", "store.title", "Your Pragmatic Catalog"),
    ("es", "store.title", "Su Catálogo de Pragmatic"),
    ("en", "sessions.title", "Please Log In"),
    ("es", "sessions.title", "Por favor, inicie sesión"),
    ("en", "orders.title", "Please Enter Your Details"),
    ("es", "orders.title", "Por favor, introduzca sus datos"),
    ("en", "orders.pay_type", "Pay type"),
    ("es", "orders.pay_type", "Forma de pago"),
];

/// Looks `key` up for `locale`, falling back to English and then to the key
pub fn translate<'a>(locale: &Locale, key: &'a str) -> &'a str {
    match lookup(locale.as_str(), key).or_else(|| lookup(FALLBACK_LOCALE, key)) {
        Some(text) => text,
        None => key,
    }
}

fn lookup(locale: &str, key: &str) -> Option<&'static str> {
    CATALOG
        .iter()
        .find(|(l, k, _)| *l == locale && *k == key)
        .map(|(_, _, text)| *text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locales() -> AvailableLocales {
        AvailableLocales::parse_list("en, es").unwrap()
    }

    #[test]
    fn test_parse_list_trims_and_dedups() {
        let available = AvailableLocales::parse_list(" en,es,,en ").unwrap();
        assert_eq!(available.to_string(), "en,es");
        assert_eq!(available.first().as_str(), "en");
    }

    #[test]
    fn test_parse_list_rejects_empty() {
        assert_eq!(
            AvailableLocales::parse_list(" , "),
            Err(LocaleError::NoneConfigured)
        );
    }

    #[test]
    fn test_malformed_code_rejected() {
        assert!(matches!(
            AvailableLocales::parse_list("en,e s"),
            Err(LocaleError::Malformed(_))
        ));
    }

    #[test]
    fn test_negotiate_without_param() {
        assert_eq!(negotiate(&locales(), None), LocaleSwitch::Unchanged);
    }

    #[test]
    fn test_negotiate_known_locale() {
        assert_eq!(
            negotiate(&locales(), Some("es")),
            LocaleSwitch::Switched(Locale::new("es").unwrap())
        );
    }

    #[test]
    fn test_negotiate_is_case_sensitive() {
        assert_eq!(
            negotiate(&locales(), Some("ES")),
            LocaleSwitch::Unsupported("ES".to_string())
        );
    }

    #[test]
    fn test_negotiate_unknown_locale() {
        assert_eq!(
            negotiate(&locales(), Some("fr")),
            LocaleSwitch::Unsupported("fr".to_string())
        );
        assert_eq!(unsupported_locale_notice("fr"), "fr translation not available");
    }

    #[test]
    fn test_translate_falls_back() {
        let es = Locale::new("es").unwrap();
        let de = Locale::new("de").unwrap();
        assert_eq!(translate(&es, "store.title"), "Su Catálogo de Pragmatic");
        assert_eq!(translate(&de, "store.title"), "Your Pragmatic Catalog");
        assert_eq!(translate(&es, "missing.key"), "missing.key");
    }
}
