use axum::http::header::HeaderValue;

use crate::error::{ConfigError, ConfigResult};

// =============================================================================
// Validation Constants
// =============================================================================

/// Maximum length for a single computed header value.
///
/// Well below common proxy limits (8 KiB per header line) while leaving room
/// for generous CSP allow-lists.
pub const MAX_HEADER_VALUE_LENGTH: usize = 4096;

/// Validate a CSP directive name.
///
/// Rules:
/// - Must not be empty
/// - Can contain ASCII alphanumeric characters and hyphens only
pub fn validate_directive_name(name: &str) -> ConfigResult<()> {
    if name.is_empty() {
        return Err(ConfigError::invalid(
            "contentSecurityPolicy.directives",
            "directive name cannot be empty",
        ));
    }

    if let Some((i, c)) = name
        .char_indices()
        .find(|(_, c)| !c.is_ascii_alphanumeric() && *c != '-')
    {
        return Err(ConfigError::invalid(
            format!("contentSecurityPolicy.directives.{name}"),
            format!(
                "directive name contains invalid character {c:?} at position {i}. \
                 Only alphanumeric characters and hyphens are allowed"
            ),
        ));
    }

    Ok(())
}

/// Validate one token of a CSP directive.
///
/// Rules:
/// - Must not be empty
/// - Must not contain `;` or `,` (they would split the policy)
/// - Must only contain visible ASCII characters (no whitespace or controls)
pub fn validate_directive_token(directive: &str, token: &str) -> ConfigResult<()> {
    let option = || format!("contentSecurityPolicy.directives.{directive}");

    if token.is_empty() {
        return Err(ConfigError::invalid(option(), "directive values cannot be empty"));
    }

    if token.contains([';', ',']) {
        return Err(ConfigError::invalid(
            option(),
            format!("value {token:?} cannot contain ';' or ','"),
        ));
    }

    if let Some(pos) = token.chars().position(|c| !c.is_ascii_graphic()) {
        return Err(ConfigError::invalid(
            option(),
            format!("value {token:?} contains an invalid character at position {pos}"),
        ));
    }

    Ok(())
}

/// Turn a configured string into a header value, rejecting anything that
/// could not be sent on the wire.
pub fn parse_header_value(option: &str, value: &str) -> ConfigResult<HeaderValue> {
    if value.len() > MAX_HEADER_VALUE_LENGTH {
        return Err(ConfigError::invalid(
            option,
            format!(
                "value cannot exceed {MAX_HEADER_VALUE_LENGTH} bytes (got {})",
                value.len()
            ),
        ));
    }

    HeaderValue::from_str(value)
        .map_err(|_| ConfigError::invalid(option, format!("{value:?} is not a valid header value")))
}
