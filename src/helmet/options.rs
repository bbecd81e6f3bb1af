//! Typed helmet options.
//!
//! Every rule family is one optional [`RuleSetting`]. Deserialization accepts
//! the usual helmet JSON shapes:
//!
//! ```json
//! {
//!   "contentSecurityPolicy": { "directives": { "default-src": ["'self'"] } },
//!   "hsts": { "maxAge": 31536000, "preload": true },
//!   "xPoweredBy": { "serverValue": null },
//!   "originAgentCluster": false
//! }
//! ```
//!
//! `false` disables a rule, `true` (or leaving the key out) enables it with
//! defaults and an object carries per-rule overrides. Several families accept
//! a legacy key as well (`hsts`, `noSniff`, `frameguard`, ...); supplying both
//! keys of one family is rejected when the rule set is resolved.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};

use crate::error::ConfigResult;

/// How one rule family is configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleSetting<T> {
    /// `false`: the rule is omitted.
    Disabled,
    /// `true`: the rule is included with its defaults.
    Enabled,
    /// Object: the rule is included with these overrides.
    Configured(T),
    /// `null`: the key is present but the rule keeps its default.
    Unset,
}

impl<T> RuleSetting<T> {
    /// Overrides carried by this setting, if any.
    pub fn options(&self) -> Option<&T> {
        match self {
            RuleSetting::Configured(options) => Some(options),
            RuleSetting::Disabled | RuleSetting::Enabled | RuleSetting::Unset => None,
        }
    }
}

impl<T> From<bool> for RuleSetting<T> {
    fn from(enabled: bool) -> Self {
        if enabled {
            RuleSetting::Enabled
        } else {
            RuleSetting::Disabled
        }
    }
}

impl<'de, T> Deserialize<'de> for RuleSetting<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw<T> {
            Flag(bool),
            Options(T),
        }

        Ok(match Option::<Raw<T>>::deserialize(deserializer)? {
            None => RuleSetting::Unset,
            Some(Raw::Flag(enabled)) => enabled.into(),
            Some(Raw::Options(options)) => RuleSetting::Configured(options),
        })
    }
}

/// Keeps an explicit `null` key as `Some(RuleSetting::Unset)` so alias
/// conflicts see it; only a missing key is `None`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<RuleSetting<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    RuleSetting::deserialize(deserializer).map(Some)
}

/// A nullable override: absent keeps the rule default, `null` suppresses the
/// value and anything else replaces it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Override<T> {
    Inherit,
    Clear,
    Set(T),
}

impl<T> Default for Override<T> {
    fn default() -> Self {
        Override::Inherit
    }
}

impl<T> Override<T> {
    /// Resolve against `default`: `None` means the value was cleared.
    pub fn resolve<'a>(&'a self, default: &'a T) -> Option<&'a T> {
        match self {
            Override::Inherit => Some(default),
            Override::Clear => None,
            Override::Set(value) => Some(value),
        }
    }
}

impl<'de, T> Deserialize<'de> for Override<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<T>::deserialize(deserializer)?.map_or(Override::Clear, Override::Set))
    }
}

/// One or many string tokens; scalars are treated as single-element lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tokens(pub Vec<String>);

impl Tokens {
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl<S: Into<String>> FromIterator<S> for Tokens {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Tokens(iter.into_iter().map(Into::into).collect())
    }
}

impl<'de> Deserialize<'de> for Tokens {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Scalar {
            Text(String),
            Integer(i64),
        }

        impl fmt::Display for Scalar {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self {
                    Scalar::Text(text) => f.write_str(text),
                    Scalar::Integer(n) => write!(f, "{n}"),
                }
            }
        }

        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            One(Scalar),
            Many(Vec<Scalar>),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::One(token) => Tokens(vec![token.to_string()]),
            Raw::Many(tokens) => tokens.iter().map(ToString::to_string).collect(),
        })
    }
}

/// Value of a single CSP directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// `null`: the directive is left out of the policy.
    Omit,
    /// Token list; an empty list emits the bare directive name.
    Values(Tokens),
}

impl Directive {
    /// Flag-only directive such as `upgrade-insecure-requests`.
    pub fn flag() -> Self {
        Directive::Values(Tokens(Vec::new()))
    }

    pub fn values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Directive::Values(values.into_iter().collect())
    }
}

impl<'de> Deserialize<'de> for Directive {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<Tokens>::deserialize(deserializer)?.map_or(Directive::Omit, Directive::Values))
    }
}

/// CSP directives in insertion order.
pub type Directives = IndexMap<String, Directive>;

/// `contentSecurityPolicy` overrides.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContentSecurityPolicyOptions {
    /// Replaces the default directive set unless `use_defaults` is set.
    pub directives: Option<Directives>,
    /// Emit `Content-Security-Policy-Report-Only` instead.
    pub report_only: bool,
    /// Merge `directives` over the defaults instead of replacing them.
    pub use_defaults: bool,
}

/// Options of the single-policy families (COEP, COOP, CORP).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PolicyOptions {
    pub policy: Override<String>,
}

/// `referrerPolicy` overrides; a list is joined with `,`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ReferrerPolicyOptions {
    pub policy: Override<Tokens>,
}

/// `strictTransportSecurity` / `hsts` overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StrictTransportSecurityOptions {
    /// Seconds; defaults to 180 days.
    pub max_age: Option<u64>,
    /// Defaults to `true`.
    pub include_sub_domains: Option<bool>,
    pub preload: bool,
}

/// `xDnsPrefetchControl` / `dnsPrefetchControl` overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DnsPrefetchControlOptions {
    pub allow: bool,
}

/// `xFrameOptions` / `frameguard` overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FrameOptions {
    /// `deny` (any case) or anything else for `SAMEORIGIN`.
    pub action: Option<String>,
}

/// `xPermittedCrossDomainPolicies` / `permittedCrossDomainPolicies`
/// overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PermittedCrossDomainPoliciesOptions {
    pub policy: Option<String>,
}

/// `xPoweredBy` / `hidePoweredBy` overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PoweredByOptions {
    /// `Server` header value; `null` removes the header.
    pub server_value: Override<String>,
}

/// Placeholder for rules without overrides; accepts any object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NoOptions {}

/// Complete helmet configuration, one field per accepted option key.
///
/// `None` means the key was not supplied; a `null` key is
/// `Some(RuleSetting::Unset)`. Legacy keys live next to the
/// current ones so alias conflicts can be detected.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HelmetOptions {
    #[serde(deserialize_with = "present")]
    pub content_security_policy: Option<RuleSetting<ContentSecurityPolicyOptions>>,
    #[serde(deserialize_with = "present")]
    pub cross_origin_embedder_policy: Option<RuleSetting<PolicyOptions>>,
    #[serde(deserialize_with = "present")]
    pub cross_origin_opener_policy: Option<RuleSetting<PolicyOptions>>,
    #[serde(deserialize_with = "present")]
    pub cross_origin_resource_policy: Option<RuleSetting<PolicyOptions>>,
    #[serde(deserialize_with = "present")]
    pub origin_agent_cluster: Option<RuleSetting<NoOptions>>,
    #[serde(deserialize_with = "present")]
    pub referrer_policy: Option<RuleSetting<ReferrerPolicyOptions>>,

    #[serde(deserialize_with = "present")]
    pub strict_transport_security: Option<RuleSetting<StrictTransportSecurityOptions>>,
    #[serde(deserialize_with = "present")]
    pub hsts: Option<RuleSetting<StrictTransportSecurityOptions>>,

    #[serde(deserialize_with = "present")]
    pub x_content_type_options: Option<RuleSetting<NoOptions>>,
    #[serde(deserialize_with = "present")]
    pub no_sniff: Option<RuleSetting<NoOptions>>,

    #[serde(deserialize_with = "present")]
    pub x_dns_prefetch_control: Option<RuleSetting<DnsPrefetchControlOptions>>,
    #[serde(deserialize_with = "present")]
    pub dns_prefetch_control: Option<RuleSetting<DnsPrefetchControlOptions>>,

    #[serde(deserialize_with = "present")]
    pub x_download_options: Option<RuleSetting<NoOptions>>,
    #[serde(deserialize_with = "present")]
    pub ie_no_open: Option<RuleSetting<NoOptions>>,

    #[serde(deserialize_with = "present")]
    pub x_frame_options: Option<RuleSetting<FrameOptions>>,
    #[serde(deserialize_with = "present")]
    pub frameguard: Option<RuleSetting<FrameOptions>>,

    #[serde(deserialize_with = "present")]
    pub x_permitted_cross_domain_policies: Option<RuleSetting<PermittedCrossDomainPoliciesOptions>>,
    #[serde(deserialize_with = "present")]
    pub permitted_cross_domain_policies: Option<RuleSetting<PermittedCrossDomainPoliciesOptions>>,

    #[serde(deserialize_with = "present")]
    pub x_powered_by: Option<RuleSetting<PoweredByOptions>>,
    #[serde(deserialize_with = "present")]
    pub hide_powered_by: Option<RuleSetting<PoweredByOptions>>,

    #[serde(deserialize_with = "present")]
    pub x_xss_protection: Option<RuleSetting<NoOptions>>,
    #[serde(deserialize_with = "present")]
    pub xss_filter: Option<RuleSetting<NoOptions>>,
}

impl HelmetOptions {
    /// Parse an options bag from JSON text.
    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parse an options bag from an already decoded JSON value.
    pub fn from_json_value(value: serde_json::Value) -> ConfigResult<Self> {
        Ok(serde_json::from_value(value)?)
    }
}
