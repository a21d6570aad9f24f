// ============================================================================
// Locale Configuration
// ============================================================================

use anyhow::Context;

use super::DEFAULT_AVAILABLE_LOCALES;
use crate::i18n::{AvailableLocales, Locale};

#[derive(Clone, Debug)]
pub struct I18nConfig {
    pub available_locales: AvailableLocales,
    /// Locale every request starts with
    pub default_locale: Locale,
}

impl I18nConfig {
    pub(crate) fn from_env() -> anyhow::Result<Self> {
        let raw = std::env::var("AVAILABLE_LOCALES")
            .unwrap_or_else(|_| DEFAULT_AVAILABLE_LOCALES.to_string());
        let available_locales =
            AvailableLocales::parse_list(&raw).context("Invalid AVAILABLE_LOCALES")?;

        let default_locale = match std::env::var("DEFAULT_LOCALE") {
            Ok(code) => available_locales.resolve(&code).cloned().ok_or_else(|| {
                anyhow::anyhow!(
                    "DEFAULT_LOCALE '{}' is not one of AVAILABLE_LOCALES ({})",
                    code,
                    available_locales
                )
            })?,
            Err(_) => available_locales.first().clone(),
        };

        Ok(Self {
            available_locales,
            default_locale,
        })
    }
}

impl Default for I18nConfig {
    fn default() -> Self {
        let available_locales = AvailableLocales::default();
        let default_locale = available_locales.first().clone();
        Self {
            available_locales,
            default_locale,
        }
    }
}
