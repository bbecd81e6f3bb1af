//! Individual header rules.
//!
//! Every rule captures its fully computed header value at construction, so
//! applying a rule to a response cannot fail.

use std::fmt;

use axum::http::Response;
use axum::http::header::{self, HeaderName, HeaderValue};

use super::csp;
use super::options::{
    ContentSecurityPolicyOptions, DnsPrefetchControlOptions, FrameOptions,
    PermittedCrossDomainPoliciesOptions, PolicyOptions, PoweredByOptions, ReferrerPolicyOptions,
    StrictTransportSecurityOptions, Tokens,
};
use crate::error::ConfigResult;
use crate::response::ResponseExt;
use crate::validation::parse_header_value;

pub const CROSS_ORIGIN_EMBEDDER_POLICY: HeaderName =
    HeaderName::from_static("cross-origin-embedder-policy");
pub const CROSS_ORIGIN_OPENER_POLICY: HeaderName =
    HeaderName::from_static("cross-origin-opener-policy");
pub const CROSS_ORIGIN_RESOURCE_POLICY: HeaderName =
    HeaderName::from_static("cross-origin-resource-policy");
pub const ORIGIN_AGENT_CLUSTER: HeaderName = HeaderName::from_static("origin-agent-cluster");
pub const X_DOWNLOAD_OPTIONS: HeaderName = HeaderName::from_static("x-download-options");
pub const X_PERMITTED_CROSS_DOMAIN_POLICIES: HeaderName =
    HeaderName::from_static("x-permitted-cross-domain-policies");
pub const X_POWERED_BY: HeaderName = HeaderName::from_static("x-powered-by");

/// 180 days.
pub const DEFAULT_HSTS_MAX_AGE: u64 = 15_552_000;

/// Rule families in canonical application order.
///
/// The derived `Ord` follows declaration order and is the order in which a
/// resolved rule set applies its rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RuleKind {
    ContentSecurityPolicy,
    CrossOriginEmbedderPolicy,
    CrossOriginOpenerPolicy,
    CrossOriginResourcePolicy,
    OriginAgentCluster,
    ReferrerPolicy,
    StrictTransportSecurity,
    XContentTypeOptions,
    XDnsPrefetchControl,
    XDownloadOptions,
    XFrameOptions,
    XPermittedCrossDomainPolicies,
    XPoweredBy,
    XXssProtection,
}

impl RuleKind {
    pub const CANONICAL_ORDER: [RuleKind; 14] = [
        RuleKind::ContentSecurityPolicy,
        RuleKind::CrossOriginEmbedderPolicy,
        RuleKind::CrossOriginOpenerPolicy,
        RuleKind::CrossOriginResourcePolicy,
        RuleKind::OriginAgentCluster,
        RuleKind::ReferrerPolicy,
        RuleKind::StrictTransportSecurity,
        RuleKind::XContentTypeOptions,
        RuleKind::XDnsPrefetchControl,
        RuleKind::XDownloadOptions,
        RuleKind::XFrameOptions,
        RuleKind::XPermittedCrossDomainPolicies,
        RuleKind::XPoweredBy,
        RuleKind::XXssProtection,
    ];

    /// Current option key of this family.
    pub fn option_key(self) -> &'static str {
        match self {
            RuleKind::ContentSecurityPolicy => "contentSecurityPolicy",
            RuleKind::CrossOriginEmbedderPolicy => "crossOriginEmbedderPolicy",
            RuleKind::CrossOriginOpenerPolicy => "crossOriginOpenerPolicy",
            RuleKind::CrossOriginResourcePolicy => "crossOriginResourcePolicy",
            RuleKind::OriginAgentCluster => "originAgentCluster",
            RuleKind::ReferrerPolicy => "referrerPolicy",
            RuleKind::StrictTransportSecurity => "strictTransportSecurity",
            RuleKind::XContentTypeOptions => "xContentTypeOptions",
            RuleKind::XDnsPrefetchControl => "xDnsPrefetchControl",
            RuleKind::XDownloadOptions => "xDownloadOptions",
            RuleKind::XFrameOptions => "xFrameOptions",
            RuleKind::XPermittedCrossDomainPolicies => "xPermittedCrossDomainPolicies",
            RuleKind::XPoweredBy => "xPoweredBy",
            RuleKind::XXssProtection => "xXssProtection",
        }
    }

    /// Legacy synonym accepted for this family, if any.
    pub fn legacy_key(self) -> Option<&'static str> {
        match self {
            RuleKind::StrictTransportSecurity => Some("hsts"),
            RuleKind::XContentTypeOptions => Some("noSniff"),
            RuleKind::XDnsPrefetchControl => Some("dnsPrefetchControl"),
            RuleKind::XDownloadOptions => Some("ieNoOpen"),
            RuleKind::XFrameOptions => Some("frameguard"),
            RuleKind::XPermittedCrossDomainPolicies => Some("permittedCrossDomainPolicies"),
            RuleKind::XPoweredBy => Some("hidePoweredBy"),
            RuleKind::XXssProtection => Some("xssFilter"),
            _ => None,
        }
    }

    /// Display name of the header this family controls.
    pub fn header_label(self) -> &'static str {
        match self {
            RuleKind::ContentSecurityPolicy => "Content-Security-Policy",
            RuleKind::CrossOriginEmbedderPolicy => "Cross-Origin-Embedder-Policy",
            RuleKind::CrossOriginOpenerPolicy => "Cross-Origin-Opener-Policy",
            RuleKind::CrossOriginResourcePolicy => "Cross-Origin-Resource-Policy",
            RuleKind::OriginAgentCluster => "Origin-Agent-Cluster",
            RuleKind::ReferrerPolicy => "Referrer-Policy",
            RuleKind::StrictTransportSecurity => "Strict-Transport-Security",
            RuleKind::XContentTypeOptions => "X-Content-Type-Options",
            RuleKind::XDnsPrefetchControl => "X-DNS-Prefetch-Control",
            RuleKind::XDownloadOptions => "X-Download-Options",
            RuleKind::XFrameOptions => "X-Frame-Options",
            RuleKind::XPermittedCrossDomainPolicies => "X-Permitted-Cross-Domain-Policies",
            RuleKind::XPoweredBy => "X-Powered-By",
            RuleKind::XXssProtection => "X-XSS-Protection",
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.option_key())
    }
}

/// `X-Frame-Options` action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameAction {
    Deny,
    #[default]
    SameOrigin,
}

impl FrameAction {
    /// `deny` in any case selects `DENY`; everything else is `SAMEORIGIN`.
    pub fn parse(action: &str) -> Self {
        if action.eq_ignore_ascii_case("deny") {
            FrameAction::Deny
        } else {
            FrameAction::SameOrigin
        }
    }

    fn header_value(self) -> HeaderValue {
        match self {
            FrameAction::Deny => HeaderValue::from_static("DENY"),
            FrameAction::SameOrigin => HeaderValue::from_static("SAMEORIGIN"),
        }
    }
}

/// One active header rule with its resolved value.
///
/// A `None` value means the configuration cleared the value; the rule then
/// leaves the response untouched instead of writing an empty header.
#[derive(Debug, Clone, PartialEq)]
pub enum HeaderRule {
    ContentSecurityPolicy {
        header: HeaderName,
        value: Option<HeaderValue>,
    },
    CrossOriginEmbedderPolicy(Option<HeaderValue>),
    CrossOriginOpenerPolicy(Option<HeaderValue>),
    CrossOriginResourcePolicy(Option<HeaderValue>),
    OriginAgentCluster,
    ReferrerPolicy(Option<HeaderValue>),
    StrictTransportSecurity(HeaderValue),
    XContentTypeOptions,
    XDnsPrefetchControl {
        allow: bool,
    },
    XDownloadOptions,
    XFrameOptions(FrameAction),
    XPermittedCrossDomainPolicies(HeaderValue),
    /// Always strips `X-Powered-By`; sets or removes `Server`.
    XPoweredBy {
        server: Option<HeaderValue>,
    },
    XXssProtection,
}

impl HeaderRule {
    pub fn content_security_policy(
        options: Option<&ContentSecurityPolicyOptions>,
    ) -> ConfigResult<Self> {
        let directives = csp::effective_directives(options);
        let policy = csp::format_directives(&directives)?;

        let header = if options.is_some_and(|o| o.report_only) {
            header::CONTENT_SECURITY_POLICY_REPORT_ONLY
        } else {
            header::CONTENT_SECURITY_POLICY
        };

        let value = if policy.is_empty() {
            None
        } else {
            Some(parse_header_value("contentSecurityPolicy", &policy)?)
        };

        Ok(HeaderRule::ContentSecurityPolicy { header, value })
    }

    pub fn cross_origin_embedder_policy(options: Option<&PolicyOptions>) -> ConfigResult<Self> {
        policy_value("crossOriginEmbedderPolicy", options, "require-corp")
            .map(HeaderRule::CrossOriginEmbedderPolicy)
    }

    pub fn cross_origin_opener_policy(options: Option<&PolicyOptions>) -> ConfigResult<Self> {
        policy_value("crossOriginOpenerPolicy", options, "same-origin")
            .map(HeaderRule::CrossOriginOpenerPolicy)
    }

    pub fn cross_origin_resource_policy(options: Option<&PolicyOptions>) -> ConfigResult<Self> {
        policy_value("crossOriginResourcePolicy", options, "same-origin")
            .map(HeaderRule::CrossOriginResourcePolicy)
    }

    pub fn referrer_policy(options: Option<&ReferrerPolicyOptions>) -> ConfigResult<Self> {
        let default = Tokens(vec!["no-referrer".to_string()]);
        let policy = match options {
            Some(options) => options.policy.resolve(&default),
            None => Some(&default),
        };

        let value = match policy {
            Some(tokens) if !tokens.as_slice().is_empty() => Some(parse_header_value(
                "referrerPolicy.policy",
                &tokens.as_slice().join(","),
            )?),
            _ => None,
        };

        Ok(HeaderRule::ReferrerPolicy(value))
    }

    pub fn strict_transport_security(
        options: Option<&StrictTransportSecurityOptions>,
    ) -> ConfigResult<Self> {
        let max_age = options
            .and_then(|o| o.max_age)
            .unwrap_or(DEFAULT_HSTS_MAX_AGE);
        let include_sub_domains = options.and_then(|o| o.include_sub_domains).unwrap_or(true);
        let preload = options.is_some_and(|o| o.preload);

        let mut value = format!("max-age={max_age}");
        if include_sub_domains {
            value.push_str("; includeSubDomains");
        }
        if preload {
            value.push_str("; preload");
        }

        Ok(HeaderRule::StrictTransportSecurity(parse_header_value(
            "strictTransportSecurity",
            &value,
        )?))
    }

    pub fn x_dns_prefetch_control(options: Option<&DnsPrefetchControlOptions>) -> Self {
        HeaderRule::XDnsPrefetchControl {
            allow: options.is_some_and(|o| o.allow),
        }
    }

    pub fn x_frame_options(options: Option<&FrameOptions>) -> Self {
        let action = options
            .and_then(|o| o.action.as_deref())
            .map(FrameAction::parse)
            .unwrap_or_default();

        HeaderRule::XFrameOptions(action)
    }

    pub fn x_permitted_cross_domain_policies(
        options: Option<&PermittedCrossDomainPoliciesOptions>,
    ) -> ConfigResult<Self> {
        let policy = options
            .and_then(|o| o.policy.as_deref())
            .unwrap_or("none");

        Ok(HeaderRule::XPermittedCrossDomainPolicies(parse_header_value(
            "xPermittedCrossDomainPolicies.policy",
            policy,
        )?))
    }

    pub fn x_powered_by(options: Option<&PoweredByOptions>) -> ConfigResult<Self> {
        let default = "secure".to_string();
        let server_value = match options {
            Some(options) => options.server_value.resolve(&default),
            None => Some(&default),
        };

        let server = server_value
            .map(|value| parse_header_value("xPoweredBy.serverValue", value))
            .transpose()?;

        Ok(HeaderRule::XPoweredBy { server })
    }

    /// Family this rule belongs to.
    pub fn kind(&self) -> RuleKind {
        match self {
            HeaderRule::ContentSecurityPolicy { .. } => RuleKind::ContentSecurityPolicy,
            HeaderRule::CrossOriginEmbedderPolicy(_) => RuleKind::CrossOriginEmbedderPolicy,
            HeaderRule::CrossOriginOpenerPolicy(_) => RuleKind::CrossOriginOpenerPolicy,
            HeaderRule::CrossOriginResourcePolicy(_) => RuleKind::CrossOriginResourcePolicy,
            HeaderRule::OriginAgentCluster => RuleKind::OriginAgentCluster,
            HeaderRule::ReferrerPolicy(_) => RuleKind::ReferrerPolicy,
            HeaderRule::StrictTransportSecurity(_) => RuleKind::StrictTransportSecurity,
            HeaderRule::XContentTypeOptions => RuleKind::XContentTypeOptions,
            HeaderRule::XDnsPrefetchControl { .. } => RuleKind::XDnsPrefetchControl,
            HeaderRule::XDownloadOptions => RuleKind::XDownloadOptions,
            HeaderRule::XFrameOptions(_) => RuleKind::XFrameOptions,
            HeaderRule::XPermittedCrossDomainPolicies(_) => {
                RuleKind::XPermittedCrossDomainPolicies
            }
            HeaderRule::XPoweredBy { .. } => RuleKind::XPoweredBy,
            HeaderRule::XXssProtection => RuleKind::XXssProtection,
        }
    }

    /// Return `response` with this rule's header applied.
    pub fn apply<B>(&self, response: Response<B>) -> Response<B> {
        match self {
            HeaderRule::ContentSecurityPolicy { header, value } => {
                set_optional(response, header, value.as_ref())
            }
            HeaderRule::CrossOriginEmbedderPolicy(value) => {
                set_optional(response, &CROSS_ORIGIN_EMBEDDER_POLICY, value.as_ref())
            }
            HeaderRule::CrossOriginOpenerPolicy(value) => {
                set_optional(response, &CROSS_ORIGIN_OPENER_POLICY, value.as_ref())
            }
            HeaderRule::CrossOriginResourcePolicy(value) => {
                set_optional(response, &CROSS_ORIGIN_RESOURCE_POLICY, value.as_ref())
            }
            HeaderRule::OriginAgentCluster => {
                response.with_header(ORIGIN_AGENT_CLUSTER, HeaderValue::from_static("?1"))
            }
            HeaderRule::ReferrerPolicy(value) => {
                set_optional(response, &header::REFERRER_POLICY, value.as_ref())
            }
            HeaderRule::StrictTransportSecurity(value) => {
                response.with_header(header::STRICT_TRANSPORT_SECURITY, value.clone())
            }
            HeaderRule::XContentTypeOptions => response.with_header(
                header::X_CONTENT_TYPE_OPTIONS,
                HeaderValue::from_static("nosniff"),
            ),
            HeaderRule::XDnsPrefetchControl { allow } => response.with_header(
                header::X_DNS_PREFETCH_CONTROL,
                HeaderValue::from_static(if *allow { "on" } else { "off" }),
            ),
            HeaderRule::XDownloadOptions => {
                response.with_header(X_DOWNLOAD_OPTIONS, HeaderValue::from_static("noopen"))
            }
            HeaderRule::XFrameOptions(action) => {
                response.with_header(header::X_FRAME_OPTIONS, action.header_value())
            }
            HeaderRule::XPermittedCrossDomainPolicies(value) => {
                response.with_header(X_PERMITTED_CROSS_DOMAIN_POLICIES, value.clone())
            }
            HeaderRule::XPoweredBy { server } => {
                let response = response.without_header(&X_POWERED_BY);
                match server {
                    Some(value) => response.with_header(header::SERVER, value.clone()),
                    None => response.without_header(&header::SERVER),
                }
            }
            HeaderRule::XXssProtection => {
                response.with_header(header::X_XSS_PROTECTION, HeaderValue::from_static("0"))
            }
        }
    }
}

fn policy_value(
    option: &str,
    options: Option<&PolicyOptions>,
    default: &str,
) -> ConfigResult<Option<HeaderValue>> {
    let default = default.to_string();
    let policy = match options {
        Some(options) => options.policy.resolve(&default),
        None => Some(&default),
    };

    policy
        .filter(|p| !p.is_empty())
        .map(|p| parse_header_value(&format!("{option}.policy"), p))
        .transpose()
}

fn set_optional<B>(
    response: Response<B>,
    name: &HeaderName,
    value: Option<&HeaderValue>,
) -> Response<B> {
    match value {
        Some(value) => response.with_header(name.clone(), value.clone()),
        None => response,
    }
}
