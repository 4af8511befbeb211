//! Per-resource and per-action protocol requirements.
//!
//! # Responsibilities
//! - Record `require_ssl` / `refuse_ssl` / `ignore_ssl` declarations
//! - Narrow declarations to actions with `only` / `except` scopes
//! - Resolve the single requirement in force for a (resource, action)
//!
//! # Design Decisions
//! - A declaration scoped with `only` beats a resource-wide one,
//!   regardless of declaration order
//! - Among equally specific declarations, the last one wins
//! - Unmatched endpoints fall back to the rule set default (ignore)

use std::collections::HashMap;

use crate::config::schema::{RuleConfig, SslKeyword};
use crate::policy::Protocol;

/// The protocol requirement attached to an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SslRequirement {
    /// Only HTTPS is accepted.
    Require,
    /// Only plain HTTP is accepted.
    Refuse,
    /// Both checks are skipped.
    #[default]
    Ignore,
}

impl SslRequirement {
    /// Protocol the guard must enforce, if any.
    pub fn protocol(self) -> Option<Protocol> {
        match self {
            SslRequirement::Require => Some(Protocol::Secure),
            SslRequirement::Refuse => Some(Protocol::Insecure),
            SslRequirement::Ignore => None,
        }
    }
}

impl From<SslKeyword> for SslRequirement {
    fn from(keyword: SslKeyword) -> Self {
        match keyword {
            SslKeyword::Require => SslRequirement::Require,
            SslKeyword::Refuse => SslRequirement::Refuse,
            SslKeyword::Ignore => SslRequirement::Ignore,
        }
    }
}

/// Which actions of a resource a declaration covers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ActionScope {
    #[default]
    All,
    Only(Vec<String>),
    Except(Vec<String>),
}

impl ActionScope {
    pub fn only<I, S>(actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ActionScope::Only(actions.into_iter().map(Into::into).collect())
    }

    pub fn except<I, S>(actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ActionScope::Except(actions.into_iter().map(Into::into).collect())
    }

    fn covers(&self, action: &str) -> bool {
        match self {
            ActionScope::All => true,
            ActionScope::Only(actions) => actions.iter().any(|a| a == action),
            ActionScope::Except(actions) => !actions.iter().any(|a| a == action),
        }
    }

    fn is_specific(&self) -> bool {
        matches!(self, ActionScope::Only(_))
    }
}

#[derive(Debug, Clone)]
struct Declaration {
    requirement: SslRequirement,
    scope: ActionScope,
}

/// Requirement declarations for every resource.
#[derive(Debug, Clone, Default)]
pub struct SslRules {
    default: SslRequirement,
    resources: HashMap<String, Vec<Declaration>>,
}

impl SslRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requirement for endpoints no declaration covers.
    pub fn with_default(mut self, requirement: SslRequirement) -> Self {
        self.default = requirement;
        self
    }

    pub fn require_ssl(self, resource: impl Into<String>, scope: ActionScope) -> Self {
        self.declare(resource, SslRequirement::Require, scope)
    }

    pub fn refuse_ssl(self, resource: impl Into<String>, scope: ActionScope) -> Self {
        self.declare(resource, SslRequirement::Refuse, scope)
    }

    pub fn ignore_ssl(self, resource: impl Into<String>, scope: ActionScope) -> Self {
        self.declare(resource, SslRequirement::Ignore, scope)
    }

    /// Add a declaration for `resource`.
    pub fn declare(
        mut self,
        resource: impl Into<String>,
        requirement: SslRequirement,
        scope: ActionScope,
    ) -> Self {
        self.resources
            .entry(resource.into())
            .or_default()
            .push(Declaration { requirement, scope });
        self
    }

    /// Build rules from the `[[rules]]` tables of a config file.
    pub fn from_config(rules: &[RuleConfig]) -> Self {
        rules.iter().fold(Self::new(), |acc, rule| {
            let scope = if !rule.only.is_empty() {
                ActionScope::only(rule.only.iter().cloned())
            } else if !rule.except.is_empty() {
                ActionScope::except(rule.except.iter().cloned())
            } else {
                ActionScope::All
            };
            acc.declare(rule.resource.clone(), rule.ssl.into(), scope)
        })
    }

    /// The requirement in force for `action` of `resource`.
    pub fn resolve(&self, resource: &str, action: &str) -> SslRequirement {
        let Some(declarations) = self.resources.get(resource) else {
            return self.default;
        };

        let mut general = None;
        let mut specific = None;
        for decl in declarations.iter().filter(|d| d.scope.covers(action)) {
            if decl.scope.is_specific() {
                specific = Some(decl.requirement);
            } else {
                general = Some(decl.requirement);
            }
        }

        specific.or(general).unwrap_or(self.default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_resource_uses_default() {
        let rules = SslRules::new();
        assert_eq!(rules.resolve("pages", "home"), SslRequirement::Ignore);

        let rules = SslRules::new().with_default(SslRequirement::Refuse);
        assert_eq!(rules.resolve("pages", "home"), SslRequirement::Refuse);
    }

    #[test]
    fn test_action_overrides_resource() {
        let rules = SslRules::new()
            .ignore_ssl("accounts", ActionScope::only(["logout"]))
            .require_ssl("accounts", ActionScope::All);

        assert_eq!(rules.resolve("accounts", "login"), SslRequirement::Require);
        assert_eq!(rules.resolve("accounts", "logout"), SslRequirement::Ignore);
    }

    #[test]
    fn test_last_declaration_wins_at_same_level() {
        let rules = SslRules::new()
            .require_ssl("accounts", ActionScope::All)
            .refuse_ssl("accounts", ActionScope::All);
        assert_eq!(rules.resolve("accounts", "show"), SslRequirement::Refuse);
    }

    #[test]
    fn test_except_scope() {
        let rules = SslRules::new().refuse_ssl("blog", ActionScope::except(["admin"]));
        assert_eq!(rules.resolve("blog", "index"), SslRequirement::Refuse);
        assert_eq!(rules.resolve("blog", "admin"), SslRequirement::Ignore);
    }

    #[test]
    fn test_from_config() {
        let rules = SslRules::from_config(&[
            RuleConfig {
                resource: "accounts".into(),
                ssl: SslKeyword::Require,
                only: vec![],
                except: vec![],
            },
            RuleConfig {
                resource: "accounts".into(),
                ssl: SslKeyword::Ignore,
                only: vec!["avatar".into()],
                except: vec![],
            },
        ]);
        assert_eq!(rules.resolve("accounts", "edit"), SslRequirement::Require);
        assert_eq!(rules.resolve("accounts", "avatar"), SslRequirement::Ignore);
    }

    #[test]
    fn test_requirement_protocol() {
        assert_eq!(SslRequirement::Require.protocol(), Some(Protocol::Secure));
        assert_eq!(SslRequirement::Refuse.protocol(), Some(Protocol::Insecure));
        assert_eq!(SslRequirement::Ignore.protocol(), None);
    }
}
