//! Content-Security-Policy directive formatting.
//!
//! Directives are emitted in map order, separated by `;`. Tokens inside a
//! directive are separated by a single space, and a directive with an empty
//! token list is emitted as its bare name:
//!
//! ```text
//! default-src 'self';img-src 'self' data:;upgrade-insecure-requests
//! ```

use super::options::{ContentSecurityPolicyOptions, Directive, Directives};
use crate::error::ConfigResult;
use crate::validation::{validate_directive_name, validate_directive_token};

/// The directive set used when no `directives` are configured.
pub fn default_directives() -> Directives {
    [
        ("default-src", Directive::values(["'self'"])),
        ("base-uri", Directive::values(["'self'"])),
        ("font-src", Directive::values(["'self'", "https:", "data:"])),
        ("form-action", Directive::values(["'self'"])),
        ("frame-ancestors", Directive::values(["'self'"])),
        ("img-src", Directive::values(["'self'", "data:"])),
        ("object-src", Directive::values(["'none'"])),
        ("script-src", Directive::values(["'self'"])),
        ("script-src-attr", Directive::values(["'none'"])),
        (
            "style-src",
            Directive::values(["'self'", "https:", "'unsafe-inline'"]),
        ),
        ("upgrade-insecure-requests", Directive::flag()),
    ]
    .into_iter()
    .map(|(name, directive)| (name.to_string(), directive))
    .collect()
}

/// Directive set in effect for `options`.
///
/// Without `useDefaults`, configured directives replace the defaults. With
/// it, defaults keep their position, configured names override them in
/// place and new names are appended.
pub fn effective_directives(options: Option<&ContentSecurityPolicyOptions>) -> Directives {
    let Some(options) = options else {
        return default_directives();
    };

    match (&options.directives, options.use_defaults) {
        (None, _) => default_directives(),
        (Some(directives), false) => directives.clone(),
        (Some(directives), true) => {
            let mut merged = default_directives();
            for (name, directive) in directives {
                merged.insert(name.clone(), directive.clone());
            }
            merged
        }
    }
}

/// Serialize `directives` into a policy string.
///
/// Returns an empty string when every directive is omitted. Names and tokens
/// are validated so the result is always a legal header value.
pub fn format_directives(directives: &Directives) -> ConfigResult<String> {
    let mut parts = Vec::with_capacity(directives.len());

    for (name, directive) in directives {
        let Directive::Values(tokens) = directive else {
            continue;
        };

        validate_directive_name(name)?;
        for token in tokens.as_slice() {
            validate_directive_token(name, token)?;
        }

        if tokens.as_slice().is_empty() {
            parts.push(name.clone());
        } else {
            parts.push(format!("{name} {}", tokens.as_slice().join(" ")));
        }
    }

    Ok(parts.join(";"))
}
