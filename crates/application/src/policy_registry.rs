//! Read-only registry of retention policies.
//!
//! Built once at startup from the built-in defaults plus optional operator
//! overrides. There is no mutation API: sweeps always read the same rules
//! for the lifetime of the process.

use std::collections::HashSet;

use odontia_core::{AppError, AppResult};
use odontia_domain::{RetentionCategory, RetentionPeriod, RetentionPolicy};

/// Operator override for one default policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyOverride {
    /// Category to override.
    pub category: RetentionCategory,
    /// Replacement retention period.
    pub retention_period: Option<RetentionPeriod>,
    /// Replacement enabled flag.
    pub enabled: Option<bool>,
}

impl PolicyOverride {
    /// Creates an override that changes nothing yet.
    #[must_use]
    pub fn new(category: RetentionCategory) -> Self {
        Self {
            category,
            retention_period: None,
            enabled: None,
        }
    }

    fn apply(&self, policy: RetentionPolicy) -> RetentionPolicy {
        let policy = match self.retention_period {
            Some(period) => policy.with_retention_period(period),
            None => policy,
        };

        match self.enabled {
            Some(enabled) => policy.with_enabled(enabled),
            None => policy,
        }
    }
}

/// Ordered, immutable category to policy mapping.
#[derive(Debug, Clone)]
pub struct PolicyRegistry {
    policies: Vec<RetentionPolicy>,
}

impl PolicyRegistry {
    /// Creates a registry preserving the given registration order.
    pub fn new(policies: Vec<RetentionPolicy>) -> AppResult<Self> {
        let mut seen = HashSet::with_capacity(policies.len());
        for policy in &policies {
            policy.validate()?;
            if !seen.insert(policy.category()) {
                return Err(AppError::Validation(format!(
                    "retention category '{}' is registered more than once",
                    policy.category()
                )));
            }
        }

        Ok(Self { policies })
    }

    /// Creates a registry holding the built-in policies.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            policies: default_retention_policies(),
        }
    }

    /// Creates a registry from the defaults with overrides applied.
    pub fn from_overrides(overrides: &[PolicyOverride]) -> AppResult<Self> {
        let mut policies = default_retention_policies();
        for policy_override in overrides {
            let position = policies
                .iter()
                .position(|policy| policy.category() == policy_override.category)
                .ok_or_else(|| unknown_category(policy_override.category))?;
            let policy = policies.remove(position);
            policies.insert(position, policy_override.apply(policy));
        }

        Self::new(policies)
    }

    /// Returns the policy registered for one category.
    pub fn get_policy(&self, category: RetentionCategory) -> AppResult<&RetentionPolicy> {
        self.policies
            .iter()
            .find(|policy| policy.category() == category)
            .ok_or_else(|| unknown_category(category))
    }

    /// Returns all policies in registration order.
    #[must_use]
    pub fn list_policies(&self) -> &[RetentionPolicy] {
        self.policies.as_slice()
    }
}

fn unknown_category(category: RetentionCategory) -> AppError {
    AppError::NotFound(format!("unknown retention category '{category}'"))
}

/// Returns the built-in retention policies in sweep order.
#[must_use]
pub fn default_retention_policies() -> Vec<RetentionPolicy> {
    vec![
        RetentionPolicy::new(RetentionCategory::AuditLogs, RetentionPeriod::Days(1_825))
            .with_legal_floor(RetentionPeriod::Years(5))
            .with_description("Logs de auditoria para rastreamento de acoes")
            .with_legal_basis("LGPD Art. 37 - Registro das operacoes de tratamento"),
        RetentionPolicy::new(RetentionCategory::ExpiredTokens, RetentionPeriod::Days(1))
            .with_description("Tokens de recuperacao de senha expirados")
            .with_legal_basis("Seguranca - limpeza automatica"),
        RetentionPolicy::new(RetentionCategory::EmailVerifications, RetentionPeriod::Days(7))
            .with_description("Verificacoes de email nao completadas")
            .with_legal_basis("Seguranca - limpeza automatica"),
        RetentionPolicy::new(RetentionCategory::OldSessions, RetentionPeriod::Days(30))
            .with_description("Sessoes inativas")
            .with_legal_basis("Seguranca - limpeza automatica"),
        RetentionPolicy::new(RetentionCategory::Consents, RetentionPeriod::Years(5))
            .with_legal_floor(RetentionPeriod::Years(5))
            .with_description("Termos de consentimento assinados")
            .with_legal_basis("LGPD Art. 8 - Prova do consentimento"),
        RetentionPolicy::new(RetentionCategory::MedicalRecords, RetentionPeriod::Years(20))
            .with_legal_floor(RetentionPeriod::Years(20))
            .with_description("Prontuarios medicos e odontologicos")
            .with_legal_basis("CFO Resolucao 118/2012 - Retencao minima de 20 anos"),
        RetentionPolicy::new(RetentionCategory::FiscalDocuments, RetentionPeriod::Years(5))
            .with_legal_floor(RetentionPeriod::Years(5))
            .with_description("Documentos fiscais e notas")
            .with_legal_basis("Legislacao tributaria brasileira"),
    ]
}
