//! Login authorization policy.
//!
//! Decides whether a principal that the identity provider has already
//! authenticated may log into a given organization:
//! 1. Public organizations admit everyone.
//! 2. Principals with a membership record are admitted.
//! 3. Everyone else is handled by the tenant's [`UnknownUserPolicy`].

use async_trait::async_trait;
use rootcause::prelude::Report;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{info, warn};

use crate::error::StoreError;
use crate::org::Organization;

/// How to treat authenticated principals that are not yet members.
///
/// `PermissivePending` admits them (they are provisioned on login), which
/// is the provisional default. `Strict` denies them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownUserPolicy {
    #[default]
    PermissivePending,
    Strict,
}

impl UnknownUserPolicy {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PermissivePending => "permissive_pending",
            Self::Strict => "strict",
        }
    }
}

impl fmt::Display for UnknownUserPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UnknownUserPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "permissive_pending" => Ok(Self::PermissivePending),
            "strict" => Ok(Self::Strict),
            other => Err(format!("unknown user policy '{other}'")),
        }
    }
}

/// Answers whether a principal already belongs to an organization.
#[async_trait]
pub trait MembershipDirectory: Send + Sync {
    async fn has_user(
        &self,
        org: &Organization,
        identifier: &str,
    ) -> Result<bool, Report<StoreError>>;
}

/// Why a principal was admitted or refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    /// The organization is public.
    Public,
    /// The principal has a membership record.
    Member,
    /// Not a member, admitted by `UnknownUserPolicy::PermissivePending`.
    PendingMember,
    /// Refused.
    Denied,
}

impl AccessDecision {
    /// Returns true if the principal may log in.
    #[must_use]
    pub fn is_allowed(self) -> bool {
        !matches!(self, Self::Denied)
    }
}

/// The login authorization policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthorizationPolicy {
    /// Mode for tenants that do not set their own.
    default_mode: UnknownUserPolicy,
}

impl AuthorizationPolicy {
    #[must_use]
    pub fn new(default_mode: UnknownUserPolicy) -> Self {
        Self { default_mode }
    }

    /// Returns the unknown-user mode in force for an organization.
    #[must_use]
    pub fn mode_for(&self, org: &Organization) -> UnknownUserPolicy {
        org.unknown_user_policy().unwrap_or(self.default_mode)
    }

    /// Decides whether `principal` may log into `org`.
    ///
    /// A failed membership lookup is logged and denies the principal,
    /// whatever the unknown-user mode, unless the organization is public.
    pub async fn decide<D>(
        &self,
        org: &Organization,
        principal: &str,
        directory: &D,
    ) -> AccessDecision
    where
        D: MembershipDirectory + ?Sized,
    {
        if org.is_public() {
            return AccessDecision::Public;
        }

        let lookup_failed = match directory.has_user(org, principal).await {
            Ok(true) => return AccessDecision::Member,
            Ok(false) => false,
            Err(e) => {
                warn!(
                    org = %org.slug(),
                    username = %principal,
                    error = %e,
                    "membership lookup failed"
                );
                true
            }
        };

        match self.mode_for(org) {
            UnknownUserPolicy::PermissivePending if !lookup_failed => {
                info!(
                    org = %org.slug(),
                    username = %principal,
                    "admitting principal without membership record"
                );
                AccessDecision::PendingMember
            }
            UnknownUserPolicy::PermissivePending | UnknownUserPolicy::Strict => {
                AccessDecision::Denied
            }
        }
    }

    /// Returns true if `principal` may log into `org`.
    pub async fn verify<D>(&self, org: &Organization, principal: &str, directory: &D) -> bool
    where
        D: MembershipDirectory + ?Sized,
    {
        self.decide(org, principal, directory).await.is_allowed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::org::{OrgSettings, settings_keys};
    use std::collections::HashSet;

    struct Members(HashSet<String>);

    #[async_trait]
    impl MembershipDirectory for Members {
        async fn has_user(
            &self,
            _org: &Organization,
            identifier: &str,
        ) -> Result<bool, Report<StoreError>> {
            Ok(self.0.contains(identifier))
        }
    }

    struct Unavailable;

    #[async_trait]
    impl MembershipDirectory for Unavailable {
        async fn has_user(
            &self,
            _org: &Organization,
            _identifier: &str,
        ) -> Result<bool, Report<StoreError>> {
            Err(StoreError::Backend {
                details: "database down".to_string(),
            }
            .into())
        }
    }

    fn members(names: &[&str]) -> Members {
        Members(names.iter().map(|n| n.to_string()).collect())
    }

    fn strict_org() -> Organization {
        let mut settings = OrgSettings::new();
        settings.set_setting(settings_keys::CAS_UNKNOWN_USER_POLICY, "strict");
        Organization::new("acme", "Acme").with_settings(settings)
    }

    #[tokio::test]
    async fn public_org_admits_anyone() {
        let org = strict_org().with_public(true);
        let policy = AuthorizationPolicy::new(UnknownUserPolicy::Strict);

        for principal in ["jdoe", "stranger", "x"] {
            assert!(policy.verify(&org, principal, &members(&[])).await);
            assert!(policy.verify(&org, principal, &Unavailable).await);
        }
    }

    #[tokio::test]
    async fn member_is_admitted_even_when_strict() {
        let policy = AuthorizationPolicy::default();
        assert_eq!(
            policy.decide(&strict_org(), "jdoe", &members(&["jdoe"])).await,
            AccessDecision::Member
        );
    }

    #[tokio::test]
    async fn permissive_pending_admits_non_members() {
        let org = Organization::new("acme", "Acme");
        let policy = AuthorizationPolicy::new(UnknownUserPolicy::PermissivePending);

        assert_eq!(
            policy.decide(&org, "newcomer", &members(&["jdoe"])).await,
            AccessDecision::PendingMember
        );
    }

    #[tokio::test]
    async fn strict_denies_non_members() {
        let policy = AuthorizationPolicy::new(UnknownUserPolicy::PermissivePending);
        assert!(
            !policy
                .verify(&strict_org(), "newcomer", &members(&["jdoe"]))
                .await
        );
    }

    #[tokio::test]
    async fn server_default_applies_without_tenant_override() {
        let org = Organization::new("acme", "Acme");
        let policy = AuthorizationPolicy::new(UnknownUserPolicy::Strict);

        assert_eq!(policy.mode_for(&org), UnknownUserPolicy::Strict);
        assert!(!policy.verify(&org, "newcomer", &members(&[])).await);
    }

    #[tokio::test]
    async fn lookup_failure_never_admits_non_public() {
        let org = Organization::new("acme", "Acme");
        let policy = AuthorizationPolicy::new(UnknownUserPolicy::PermissivePending);

        assert_eq!(
            policy.decide(&org, "jdoe", &Unavailable).await,
            AccessDecision::Denied
        );
    }

    #[test]
    fn policy_parses_from_str() {
        assert_eq!(
            "strict".parse::<UnknownUserPolicy>().unwrap(),
            UnknownUserPolicy::Strict
        );
        assert_eq!(
            "permissive_pending".parse::<UnknownUserPolicy>().unwrap(),
            UnknownUserPolicy::PermissivePending
        );
        assert!("allow_all".parse::<UnknownUserPolicy>().is_err());
    }
}
