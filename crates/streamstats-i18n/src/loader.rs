//! Fluent bundle loading and message formatting.

use crate::error::{I18nError, I18nResult};
use fluent_bundle::concurrent::FluentBundle;
use fluent_bundle::{FluentArgs, FluentResource};
use tracing::{debug, warn};
use unic_langid::LanguageIdentifier;

/// Locale used when the requested one is unknown or lacks a message.
pub const DEFAULT_LOCALE: &str = "en-US";

/// Locales with an embedded translation.
pub const SUPPORTED_LOCALES: &[&str] = &["en-US", "fr-FR"];

const EN_US: &str = include_str!("../locales/en-US/main.ftl");
const FR_FR: &str = include_str!("../locales/fr-FR/main.ftl");

fn embedded_resource(locale: &str) -> Option<&'static str> {
    match locale {
        "en-US" => Some(EN_US),
        "fr-FR" => Some(FR_FR),
        _ => None,
    }
}

type Bundle = FluentBundle<FluentResource>;

/// Formats messages for one locale, falling back to `en-US` message by
/// message.
pub struct Localizer {
    locale: String,
    primary: Bundle,
    fallback: Option<Bundle>,
}

impl std::fmt::Debug for Localizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Localizer")
            .field("locale", &self.locale)
            .field("has_fallback", &self.fallback.is_some())
            .finish()
    }
}

impl Localizer {
    /// Builds a localizer for `requested`.
    ///
    /// An exact match wins, then a supported locale with the same language
    /// (`fr` or `fr-CA` resolve to `fr-FR`). Anything else uses `en-US`.
    pub fn new(requested: &str) -> I18nResult<Self> {
        let locale = negotiate(requested)?;
        let primary = build_bundle(locale)?;
        let fallback = if locale == DEFAULT_LOCALE {
            None
        } else {
            Some(build_bundle(DEFAULT_LOCALE)?)
        };

        debug!(requested, locale, "Initialized localizer");
        Ok(Self {
            locale: locale.to_string(),
            primary,
            fallback,
        })
    }

    /// The `en-US` localizer.
    pub fn english() -> I18nResult<Self> {
        Self::new(DEFAULT_LOCALE)
    }

    /// Locale actually in use after negotiation.
    pub fn locale(&self) -> &str {
        &self.locale
    }

    /// Whether `id` resolves in this localizer, fallback included.
    pub fn has_message(&self, id: &str) -> bool {
        self.primary.has_message(id)
            || self
                .fallback
                .as_ref()
                .is_some_and(|bundle| bundle.has_message(id))
    }

    /// Formats a message, falling back to `en-US` when the primary bundle
    /// lacks it.
    pub fn try_format(&self, id: &str, args: Option<&FluentArgs>) -> I18nResult<String> {
        match format_in(&self.primary, id, args) {
            Err(I18nError::MessageNotFound { .. }) => match &self.fallback {
                Some(fallback) => format_in(fallback, id, args),
                None => Err(I18nError::MessageNotFound {
                    key: id.to_string(),
                }),
            },
            result => result,
        }
    }

    /// Formats a message; on failure the message id is returned so output
    /// stays readable.
    pub fn format(&self, id: &str, args: Option<&FluentArgs>) -> String {
        self.try_format(id, args).unwrap_or_else(|e| {
            warn!(error = %e, "Falling back to raw message id");
            id.to_string()
        })
    }
}

/// Picks the supported locale for a requested tag.
pub fn negotiate(requested: &str) -> I18nResult<&'static str> {
    let requested_id: LanguageIdentifier = requested
        .trim()
        .parse()
        .map_err(|_| I18nError::InvalidLanguageId(requested.to_string()))?;

    let mut same_language = None;
    for &supported in SUPPORTED_LOCALES {
        let supported_id: LanguageIdentifier = supported
            .parse()
            .map_err(|_| I18nError::InvalidLanguageId(supported.to_string()))?;
        if supported_id == requested_id {
            return Ok(supported);
        }
        if same_language.is_none() && supported_id.language == requested_id.language {
            same_language = Some(supported);
        }
    }

    Ok(same_language.unwrap_or_else(|| {
        warn!(requested, "Unsupported locale, using {DEFAULT_LOCALE}");
        DEFAULT_LOCALE
    }))
}

fn build_bundle(locale: &str) -> I18nResult<Bundle> {
    let source = embedded_resource(locale)
        .ok_or_else(|| I18nError::InvalidLanguageId(locale.to_string()))?;
    let lang_id: LanguageIdentifier = locale
        .parse()
        .map_err(|_| I18nError::InvalidLanguageId(locale.to_string()))?;

    let resource = FluentResource::try_new(source.to_string()).map_err(|(_, errors)| {
        I18nError::FluentParse {
            locale: locale.to_string(),
            errors: errors.iter().map(|e| format!("{e:?}")).collect(),
        }
    })?;

    let mut bundle = FluentBundle::new_concurrent(vec![lang_id]);
    bundle.set_use_isolating(false);
    bundle
        .add_resource(resource)
        .map_err(|errors| I18nError::BundleCreation {
            locale: locale.to_string(),
            errors: errors.iter().map(|e| format!("{e:?}")).collect(),
        })?;

    Ok(bundle)
}

fn format_in(bundle: &Bundle, id: &str, args: Option<&FluentArgs>) -> I18nResult<String> {
    let pattern = bundle
        .get_message(id)
        .and_then(|message| message.value())
        .ok_or_else(|| I18nError::MessageNotFound { key: id.to_string() })?;

    let mut errors = Vec::new();
    let formatted = bundle.format_pattern(pattern, args, &mut errors);
    if !errors.is_empty() {
        return Err(I18nError::MessageFormat {
            key: id.to_string(),
            errors: errors.iter().map(|e| format!("{e:?}")).collect(),
        });
    }

    Ok(formatted.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negotiation() {
        assert_eq!(negotiate("en-US").unwrap(), "en-US");
        assert_eq!(negotiate("fr-FR").unwrap(), "fr-FR");
        assert_eq!(negotiate("fr").unwrap(), "fr-FR");
        assert_eq!(negotiate("fr-CA").unwrap(), "fr-FR");
        assert_eq!(negotiate("en-GB").unwrap(), "en-US");
        assert_eq!(negotiate("de-DE").unwrap(), "en-US");
        assert!(negotiate("not a locale!").is_err());
    }

    #[test]
    fn test_every_embedded_resource_builds() {
        for locale in SUPPORTED_LOCALES {
            assert!(build_bundle(locale).is_ok(), "bundle for {locale}");
        }
    }

    #[test]
    fn test_simple_message() {
        let localizer = Localizer::english().unwrap();
        assert_eq!(localizer.format("weekday-sun", None), "Sun");
        assert_eq!(localizer.locale(), "en-US");
    }

    #[test]
    fn test_missing_message_returns_id() {
        let localizer = Localizer::new("fr-FR").unwrap();
        assert!(!localizer.has_message("does-not-exist"));
        assert_eq!(localizer.format("does-not-exist", None), "does-not-exist");
        assert!(matches!(
            localizer.try_format("does-not-exist", None),
            Err(I18nError::MessageNotFound { .. })
        ));
    }

    #[test]
    fn test_missing_argument_is_format_error() {
        let localizer = Localizer::english().unwrap();
        assert!(matches!(
            localizer.try_format("hour-label", None),
            Err(I18nError::MessageFormat { .. })
        ));
    }
}
