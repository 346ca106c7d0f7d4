//! Runtime validation of a loaded configuration.
//!
//! Range, URL and presence rules live on the schema as `#[validate]`
//! attributes; the functions here cover the checks that need code.

use crate::schema::Config;
use std::borrow::Cow;
use std::fmt;
use streamstats_common::{parse_timezone, LoggingConfig};
use url::Url;
use validator::{Validate, ValidationError, ValidationErrors, ValidationErrorsKind};

/// One rejected configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Dotted path of the offending field, e.g. `import.parallelism`.
    pub field: String,
    /// What is wrong with it.
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validates a configuration, collecting every issue instead of stopping
    /// at the first. Issues are ordered by field path.
    pub fn validate(config: &Config) -> Result<(), Vec<ValidationIssue>> {
        let Err(errors) = config.validate() else {
            return Ok(());
        };
        let mut issues = Vec::new();
        flatten("", &errors, &mut issues);
        issues.sort_by(|a, b| a.field.cmp(&b.field));
        Err(issues)
    }
}

fn flatten(prefix: &str, errors: &ValidationErrors, out: &mut Vec<ValidationIssue>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            (*field).to_string()
        } else {
            format!("{prefix}.{field}")
        };
        match kind {
            ValidationErrorsKind::Field(list) => {
                out.extend(list.iter().map(|error| ValidationIssue {
                    field: path.clone(),
                    message: error
                        .message
                        .as_ref()
                        .map_or_else(|| error.code.to_string(), ToString::to_string),
                }));
            }
            ValidationErrorsKind::Struct(inner) => flatten(&path, inner, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    flatten(&format!("{path}[{index}]"), inner, out);
                }
            }
        }
    }
}

fn rejected(code: &'static str, message: String) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Owned(message));
    error
}

/// Validates an IANA time zone name.
pub fn validate_timezone(timezone: &str) -> Result<(), ValidationError> {
    parse_timezone(timezone)
        .map(|_| ())
        .map_err(|_| rejected("unknown_timezone", format!("unknown time zone '{timezone}'")))
}

/// Validates a BCP 47 style language tag such as `en-US`.
pub fn validate_locale(locale: &str) -> Result<(), ValidationError> {
    if is_locale_tag(locale) {
        Ok(())
    } else {
        Err(rejected("invalid_locale", format!("'{locale}' is not a language tag")))
    }
}

/// Only plain HTTP(S) endpoints are accepted. Unparsable URLs are left to the
/// `url` rule.
pub fn validate_http_scheme(base_url: &str) -> Result<(), ValidationError> {
    match Url::parse(base_url) {
        Ok(url) if !matches!(url.scheme(), "http" | "https") => Err(rejected(
            "unsupported_scheme",
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        _ => Ok(()),
    }
}

/// Rejects a token made only of whitespace.
pub fn validate_token(token: &str) -> Result<(), ValidationError> {
    if token.trim().is_empty() {
        return Err(ValidationError::new("blank_token"));
    }
    Ok(())
}

/// The logging section lives in the common crate, so its rules are checked here.
pub fn validate_logging(logging: &LoggingConfig) -> Result<(), ValidationError> {
    if logging.level.trim().is_empty() {
        return Err(rejected("empty_level", "level must not be empty".to_string()));
    }
    Ok(())
}

fn is_locale_tag(tag: &str) -> bool {
    !tag.is_empty()
        && tag
            .split('-')
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_alphanumeric()))
}
