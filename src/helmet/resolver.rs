//! Turns a [`HelmetOptions`] bag into an ordered, validated rule set.

use axum::http::Response;

use super::options::{HelmetOptions, PolicyOptions, RuleSetting};
use super::rules::{HeaderRule, RuleKind};
use crate::error::{ConfigError, ConfigResult};

/// Active header rules in canonical order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedRuleSet {
    rules: Vec<HeaderRule>,
}

impl ResolvedRuleSet {
    /// Apply every rule to `response`, in order.
    pub fn apply<B>(&self, response: Response<B>) -> Response<B> {
        self.rules
            .iter()
            .fold(response, |response, rule| rule.apply(response))
    }

    pub fn iter(&self) -> impl Iterator<Item = &HeaderRule> {
        self.rules.iter()
    }

    /// Families of the active rules, in application order.
    pub fn kinds(&self) -> Vec<RuleKind> {
        self.rules.iter().map(HeaderRule::kind).collect()
    }

    pub fn contains(&self, kind: RuleKind) -> bool {
        self.rules.iter().any(|rule| rule.kind() == kind)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Resolve `options` into a rule set.
///
/// Alias conflicts are reported before any rule is built. Rules are enabled
/// unless their key is `false`, except Cross-Origin-Embedder-Policy, which
/// must be switched on explicitly. A `null` key keeps the rule's default.
pub fn resolve(options: &HelmetOptions) -> ConfigResult<ResolvedRuleSet> {
    check_aliases(options)?;

    let mut rules = Vec::with_capacity(RuleKind::CANONICAL_ORDER.len());

    if let Some(csp) = active(options.content_security_policy.as_ref(), true) {
        rules.push(HeaderRule::content_security_policy(csp)?);
    }
    if let Some(coep) = active(embedder_policy(options), false) {
        rules.push(HeaderRule::cross_origin_embedder_policy(coep)?);
    }
    if let Some(coop) = active(options.cross_origin_opener_policy.as_ref(), true) {
        rules.push(HeaderRule::cross_origin_opener_policy(coop)?);
    }
    if let Some(corp) = active(options.cross_origin_resource_policy.as_ref(), true) {
        rules.push(HeaderRule::cross_origin_resource_policy(corp)?);
    }
    if active(options.origin_agent_cluster.as_ref(), true).is_some() {
        rules.push(HeaderRule::OriginAgentCluster);
    }
    if let Some(referrer) = active(options.referrer_policy.as_ref(), true) {
        rules.push(HeaderRule::referrer_policy(referrer)?);
    }
    if let Some(hsts) = active(
        either(&options.strict_transport_security, &options.hsts),
        true,
    ) {
        rules.push(HeaderRule::strict_transport_security(hsts)?);
    }
    if active(either(&options.x_content_type_options, &options.no_sniff), true).is_some() {
        rules.push(HeaderRule::XContentTypeOptions);
    }
    if let Some(dns) = active(
        either(&options.x_dns_prefetch_control, &options.dns_prefetch_control),
        true,
    ) {
        rules.push(HeaderRule::x_dns_prefetch_control(dns));
    }
    if active(either(&options.x_download_options, &options.ie_no_open), true).is_some() {
        rules.push(HeaderRule::XDownloadOptions);
    }
    if let Some(frame) = active(either(&options.x_frame_options, &options.frameguard), true) {
        rules.push(HeaderRule::x_frame_options(frame));
    }
    if let Some(cross_domain) = active(
        either(
            &options.x_permitted_cross_domain_policies,
            &options.permitted_cross_domain_policies,
        ),
        true,
    ) {
        rules.push(HeaderRule::x_permitted_cross_domain_policies(cross_domain)?);
    }
    if let Some(powered_by) = active(
        either(&options.x_powered_by, &options.hide_powered_by),
        true,
    ) {
        rules.push(HeaderRule::x_powered_by(powered_by)?);
    }
    if active(either(&options.x_xss_protection, &options.xss_filter), true).is_some() {
        rules.push(HeaderRule::XXssProtection);
    }

    Ok(ResolvedRuleSet { rules })
}

fn check_aliases(options: &HelmetOptions) -> ConfigResult<()> {
    let pairs = [
        (
            RuleKind::StrictTransportSecurity,
            options.strict_transport_security.is_some(),
            options.hsts.is_some(),
        ),
        (
            RuleKind::XContentTypeOptions,
            options.x_content_type_options.is_some(),
            options.no_sniff.is_some(),
        ),
        (
            RuleKind::XDnsPrefetchControl,
            options.x_dns_prefetch_control.is_some(),
            options.dns_prefetch_control.is_some(),
        ),
        (
            RuleKind::XDownloadOptions,
            options.x_download_options.is_some(),
            options.ie_no_open.is_some(),
        ),
        (
            RuleKind::XFrameOptions,
            options.x_frame_options.is_some(),
            options.frameguard.is_some(),
        ),
        (
            RuleKind::XPermittedCrossDomainPolicies,
            options.x_permitted_cross_domain_policies.is_some(),
            options.permitted_cross_domain_policies.is_some(),
        ),
        (
            RuleKind::XPoweredBy,
            options.x_powered_by.is_some(),
            options.hide_powered_by.is_some(),
        ),
        (
            RuleKind::XXssProtection,
            options.x_xss_protection.is_some(),
            options.xss_filter.is_some(),
        ),
    ];

    for (kind, canonical_set, legacy_set) in pairs {
        if let (true, true, Some(legacy)) = (canonical_set, legacy_set, kind.legacy_key()) {
            return Err(ConfigError::ConflictingOption {
                header: kind.header_label(),
                canonical: kind.option_key(),
                legacy,
            });
        }
    }

    Ok(())
}

/// An empty COEP object is not an opt-in.
fn embedder_policy(options: &HelmetOptions) -> Option<&RuleSetting<PolicyOptions>> {
    options
        .cross_origin_embedder_policy
        .as_ref()
        .filter(|setting| {
            !matches!(setting, RuleSetting::Configured(opts) if *opts == PolicyOptions::default())
        })
}

fn either<'a, T>(
    canonical: &'a Option<RuleSetting<T>>,
    legacy: &'a Option<RuleSetting<T>>,
) -> Option<&'a RuleSetting<T>> {
    canonical.as_ref().or(legacy.as_ref())
}

/// `Some(overrides)` when the rule is on, `None` when it is off.
fn active<T>(setting: Option<&RuleSetting<T>>, enabled_by_default: bool) -> Option<Option<&T>> {
    match setting {
        None | Some(RuleSetting::Unset) if enabled_by_default => Some(None),
        None | Some(RuleSetting::Unset) | Some(RuleSetting::Disabled) => None,
        Some(setting) => Some(setting.options()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::helmet::rules::FrameAction;
    use axum::body::Body;
    use serde_json::json;

    fn resolve_json(value: serde_json::Value) -> ConfigResult<ResolvedRuleSet> {
        resolve(&HelmetOptions::from_json_value(value).unwrap())
    }

    #[test]
    fn test_defaults_enable_everything_but_coep() {
        let rules = resolve(&HelmetOptions::default()).unwrap();

        assert_eq!(rules.len(), 13);
        assert!(!rules.contains(RuleKind::CrossOriginEmbedderPolicy));
        assert_eq!(
            rules.kinds(),
            RuleKind::CANONICAL_ORDER
                .into_iter()
                .filter(|kind| *kind != RuleKind::CrossOriginEmbedderPolicy)
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_coep_requires_opt_in() {
        let rules = resolve_json(json!({ "crossOriginEmbedderPolicy": true })).unwrap();
        assert!(rules.contains(RuleKind::CrossOriginEmbedderPolicy));

        let rules = resolve_json(json!({ "crossOriginEmbedderPolicy": false })).unwrap();
        assert!(!rules.contains(RuleKind::CrossOriginEmbedderPolicy));
    }

    #[test]
    fn test_empty_or_null_coep_stays_off() {
        let rules = resolve_json(json!({ "crossOriginEmbedderPolicy": {} })).unwrap();
        assert!(!rules.contains(RuleKind::CrossOriginEmbedderPolicy));

        let rules = resolve_json(json!({ "crossOriginEmbedderPolicy": null })).unwrap();
        assert!(!rules.contains(RuleKind::CrossOriginEmbedderPolicy));

        let rules = resolve_json(json!({
            "crossOriginEmbedderPolicy": { "policy": "credentialless" }
        }))
        .unwrap();
        assert!(rules.contains(RuleKind::CrossOriginEmbedderPolicy));
    }

    #[test]
    fn test_null_key_keeps_default() {
        let rules = resolve_json(json!({
            "hsts": null,
            "contentSecurityPolicy": null
        }))
        .unwrap();

        assert_eq!(rules.len(), 13);
        assert!(rules.contains(RuleKind::StrictTransportSecurity));
        assert!(rules.contains(RuleKind::ContentSecurityPolicy));
    }

    #[test]
    fn test_null_key_counts_for_alias_conflict() {
        let result = resolve_json(json!({ "hsts": null, "strictTransportSecurity": true }));
        assert!(matches!(
            result,
            Err(ConfigError::ConflictingOption {
                canonical: "strictTransportSecurity",
                legacy: "hsts",
                ..
            })
        ));

        let result = resolve_json(json!({ "xFrameOptions": null, "frameguard": null }));
        assert!(matches!(
            result,
            Err(ConfigError::ConflictingOption { .. })
        ));
    }

    #[test]
    fn test_false_disables_rule() {
        let rules = resolve_json(json!({
            "contentSecurityPolicy": false,
            "xssFilter": false
        }))
        .unwrap();

        assert_eq!(rules.len(), 11);
        assert!(!rules.contains(RuleKind::ContentSecurityPolicy));
        assert!(!rules.contains(RuleKind::XXssProtection));
    }

    #[test]
    fn test_legacy_key_configures_family() {
        let rules = resolve_json(json!({ "frameguard": { "action": "deny" } })).unwrap();
        let frame = rules
            .iter()
            .find(|rule| rule.kind() == RuleKind::XFrameOptions)
            .unwrap();

        assert_eq!(
            frame,
            &HeaderRule::XFrameOptions(FrameAction::Deny)
        );
    }

    #[test]
    fn test_alias_conflict_is_rejected() {
        let err = resolve_json(json!({
            "strictTransportSecurity": true,
            "hsts": { "maxAge": 60 }
        }))
        .unwrap_err();

        assert!(matches!(
            err,
            ConfigError::ConflictingOption {
                canonical: "strictTransportSecurity",
                legacy: "hsts",
                ..
            }
        ));
    }

    #[test]
    fn test_alias_conflict_even_when_both_disabled() {
        let result = resolve_json(json!({ "xPoweredBy": false, "hidePoweredBy": false }));
        assert!(matches!(
            result,
            Err(ConfigError::ConflictingOption { .. })
        ));
    }

    #[test]
    fn test_conflict_reported_before_invalid_values() {
        let result = resolve_json(json!({
            "xPoweredBy": { "serverValue": "bad\nvalue" },
            "noSniff": true,
            "xContentTypeOptions": true
        }));

        assert!(matches!(
            result,
            Err(ConfigError::ConflictingOption { .. })
        ));
    }

    #[test]
    fn test_apply_is_idempotent() {
        let rules = resolve(&HelmetOptions::default()).unwrap();

        let once = rules.apply(Response::new(Body::empty()));
        let once_headers = once.headers().clone();
        let twice = rules.apply(once);

        assert_eq!(&once_headers, twice.headers());
    }
}
