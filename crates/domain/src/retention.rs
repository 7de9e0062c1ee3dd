//! Retention policy domain types.
//!
//! A policy binds one data category to a configured retention period and an
//! optional legal floor. Sweepers never see raw timestamps computed by
//! callers: they receive a [`RetentionCutoff`], which can only be built from a
//! policy and therefore always honours the floor.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Months, TimeDelta, Utc};
use odontia_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Data categories governed by retention policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetentionCategory {
    /// Append-only audit trail entries.
    AuditLogs,
    /// Expired password reset tokens.
    ExpiredTokens,
    /// Email verifications that were never completed.
    EmailVerifications,
    /// Sessions without recent activity.
    OldSessions,
    /// Signed patient consent terms.
    Consents,
    /// Medical and dental records.
    MedicalRecords,
    /// Invoices and other fiscal documents.
    FiscalDocuments,
}

impl RetentionCategory {
    /// Returns a stable storage value for this category.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuditLogs => "audit_logs",
            Self::ExpiredTokens => "expired_tokens",
            Self::EmailVerifications => "email_verifications",
            Self::OldSessions => "old_sessions",
            Self::Consents => "consents",
            Self::MedicalRecords => "medical_records",
            Self::FiscalDocuments => "fiscal_documents",
        }
    }

    /// Returns all known categories.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[RetentionCategory] = &[
            RetentionCategory::AuditLogs,
            RetentionCategory::ExpiredTokens,
            RetentionCategory::EmailVerifications,
            RetentionCategory::OldSessions,
            RetentionCategory::Consents,
            RetentionCategory::MedicalRecords,
            RetentionCategory::FiscalDocuments,
        ];

        ALL
    }
}

impl Display for RetentionCategory {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for RetentionCategory {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|category| category.as_str() == value)
            .ok_or_else(|| {
                AppError::Validation(format!("unknown retention category '{value}'"))
            })
    }
}

/// Retention duration in the unit natural to its legal basis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "unit", content = "value", rename_all = "snake_case")]
pub enum RetentionPeriod {
    /// Whole days.
    Days(u32),
    /// Calendar years.
    Years(u32),
}

impl RetentionPeriod {
    /// Returns the instant before which data falls outside this period.
    ///
    /// Years are calendar years, so the cutoff lands on the same calendar
    /// date (clamped to the end of February for leap days).
    #[must_use]
    pub fn cutoff_from(&self, reference: DateTime<Utc>) -> DateTime<Utc> {
        let cutoff = match self {
            Self::Days(days) => TimeDelta::try_days(i64::from(*days))
                .and_then(|delta| reference.checked_sub_signed(delta)),
            Self::Years(years) => {
                reference.checked_sub_months(Months::new(years.saturating_mul(12)))
            }
        };

        cutoff.unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Returns whichever period retains data longer at `reference`.
    #[must_use]
    pub fn longest(self, other: Self, reference: DateTime<Utc>) -> Self {
        if other.cutoff_from(reference) < self.cutoff_from(reference) {
            other
        } else {
            self
        }
    }

    /// Returns the numeric amount regardless of unit.
    #[must_use]
    pub fn amount(&self) -> u32 {
        match self {
            Self::Days(value) | Self::Years(value) => *value,
        }
    }

    /// Returns the stable unit label.
    #[must_use]
    pub fn unit(&self) -> &'static str {
        match self {
            Self::Days(_) => "days",
            Self::Years(_) => "years",
        }
    }
}

impl Display for RetentionPeriod {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Days(days) => write!(formatter, "{days} day(s)"),
            Self::Years(years) => write!(formatter, "{years} year(s)"),
        }
    }
}

/// Regulator-imposed minimum retention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegalFloor {
    /// Shortest retention the law allows.
    pub minimum: RetentionPeriod,
}

/// Retention rule for one data category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionPolicy {
    category: RetentionCategory,
    retention_period: RetentionPeriod,
    legal_floor: Option<LegalFloor>,
    legal_basis: String,
    description: String,
    enabled: bool,
}

impl RetentionPolicy {
    /// Creates an enabled policy without legal floor.
    #[must_use]
    pub fn new(category: RetentionCategory, retention_period: RetentionPeriod) -> Self {
        Self {
            category,
            retention_period,
            legal_floor: None,
            legal_basis: String::new(),
            description: String::new(),
            enabled: true,
        }
    }

    /// Attaches a legal minimum retention.
    #[must_use]
    pub fn with_legal_floor(mut self, minimum: RetentionPeriod) -> Self {
        self.legal_floor = Some(LegalFloor { minimum });
        self
    }

    /// Attaches the legal basis citation.
    #[must_use]
    pub fn with_legal_basis(mut self, legal_basis: impl Into<String>) -> Self {
        self.legal_basis = legal_basis.into();
        self
    }

    /// Attaches an operator-facing description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets whether the category participates in sweeps.
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Replaces the configured retention period.
    #[must_use]
    pub fn with_retention_period(mut self, retention_period: RetentionPeriod) -> Self {
        self.retention_period = retention_period;
        self
    }

    /// Validates policy invariants.
    pub fn validate(&self) -> AppResult<()> {
        if self.retention_period.amount() == 0 {
            return Err(AppError::Validation(format!(
                "retention period for '{}' must be greater than zero",
                self.category
            )));
        }

        if self
            .legal_floor
            .is_some_and(|floor| floor.minimum.amount() == 0)
        {
            return Err(AppError::Validation(format!(
                "legal minimum for '{}' must be greater than zero",
                self.category
            )));
        }

        Ok(())
    }

    /// Returns the governed category.
    #[must_use]
    pub fn category(&self) -> RetentionCategory {
        self.category
    }

    /// Returns the configured retention period.
    #[must_use]
    pub fn retention_period(&self) -> RetentionPeriod {
        self.retention_period
    }

    /// Returns the legal floor, if any.
    #[must_use]
    pub fn legal_floor(&self) -> Option<LegalFloor> {
        self.legal_floor
    }

    /// Returns the legal basis citation.
    #[must_use]
    pub fn legal_basis(&self) -> &str {
        self.legal_basis.as_str()
    }

    /// Returns the operator-facing description.
    #[must_use]
    pub fn description(&self) -> &str {
        self.description.as_str()
    }

    /// Returns whether the category participates in sweeps.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Returns the period actually enforced at `reference`.
    ///
    /// Configuration can lengthen retention past the legal floor but never
    /// shorten it below.
    #[must_use]
    pub fn effective_period(&self, reference: DateTime<Utc>) -> RetentionPeriod {
        match self.legal_floor {
            Some(floor) => self.retention_period.longest(floor.minimum, reference),
            None => self.retention_period,
        }
    }
}

/// Floor-checked deletion boundary handed to sweepers.
///
/// Rows whose relevant timestamp is strictly older than [`Self::at`] are
/// expired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionCutoff {
    category: RetentionCategory,
    effective_period: RetentionPeriod,
    at: DateTime<Utc>,
}

impl RetentionCutoff {
    /// Resolves the cutoff for one policy relative to `reference`.
    #[must_use]
    pub fn for_policy(policy: &RetentionPolicy, reference: DateTime<Utc>) -> Self {
        let effective_period = policy.effective_period(reference);
        Self {
            category: policy.category(),
            effective_period,
            at: effective_period.cutoff_from(reference),
        }
    }

    /// Returns the category this cutoff was resolved for.
    #[must_use]
    pub fn category(&self) -> RetentionCategory {
        self.category
    }

    /// Returns the period used after legal floor reconciliation.
    #[must_use]
    pub fn effective_period(&self) -> RetentionPeriod {
        self.effective_period
    }

    /// Returns the boundary instant.
    #[must_use]
    pub fn at(&self) -> DateTime<Utc> {
        self.at
    }

    /// Returns whether a row stamped at `timestamp` is expired.
    #[must_use]
    pub fn is_expired(&self, timestamp: DateTime<Utc>) -> bool {
        timestamp < self.at
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use chrono::{DateTime, TimeZone, Utc};
    use proptest::prelude::*;

    use super::{RetentionCategory, RetentionCutoff, RetentionPeriod, RetentionPolicy};

    fn reference() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 15, 3, 0, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    #[test]
    fn category_roundtrip_storage_value() {
        for category in RetentionCategory::all() {
            let restored = RetentionCategory::from_str(category.as_str());
            assert_eq!(restored.ok(), Some(*category));
        }
    }

    #[test]
    fn unknown_category_is_rejected() {
        assert!(RetentionCategory::from_str("appointments").is_err());
    }

    #[test]
    fn years_cutoff_uses_calendar_dates() {
        let cutoff = RetentionPeriod::Years(20).cutoff_from(reference());
        assert_eq!(
            cutoff,
            Utc.with_ymd_and_hms(2006, 3, 15, 3, 0, 0)
                .single()
                .unwrap_or(DateTime::<Utc>::MIN_UTC)
        );
    }

    #[test]
    fn misconfigured_period_is_overridden_by_legal_floor() {
        let policy =
            RetentionPolicy::new(RetentionCategory::MedicalRecords, RetentionPeriod::Days(1))
                .with_legal_floor(RetentionPeriod::Years(20));

        assert_eq!(
            policy.effective_period(reference()),
            RetentionPeriod::Years(20)
        );
    }

    #[test]
    fn configuration_can_lengthen_past_legal_floor() {
        let policy =
            RetentionPolicy::new(RetentionCategory::FiscalDocuments, RetentionPeriod::Days(3_000))
                .with_legal_floor(RetentionPeriod::Years(5));

        assert_eq!(
            policy.effective_period(reference()),
            RetentionPeriod::Days(3_000)
        );
    }

    #[test]
    fn cutoff_marks_only_strictly_older_rows_expired() {
        let policy =
            RetentionPolicy::new(RetentionCategory::ExpiredTokens, RetentionPeriod::Days(1));
        let cutoff = RetentionCutoff::for_policy(&policy, reference());

        assert!(cutoff.is_expired(cutoff.at() - chrono::TimeDelta::seconds(1)));
        assert!(!cutoff.is_expired(cutoff.at()));
        assert!(!cutoff.is_expired(reference()));
    }

    #[test]
    fn zero_period_is_rejected() {
        let policy = RetentionPolicy::new(RetentionCategory::OldSessions, RetentionPeriod::Days(0));
        assert!(policy.validate().is_err());
    }

    proptest! {
        #[test]
        fn effective_cutoff_never_precedes_legal_minimum(
            configured_days in 1_u32..20_000,
            minimum_years in 1_u32..30,
            offset_days in 0_i64..40_000,
        ) {
            let reference = reference() - chrono::TimeDelta::days(offset_days);
            let policy = RetentionPolicy::new(
                RetentionCategory::MedicalRecords,
                RetentionPeriod::Days(configured_days),
            )
            .with_legal_floor(RetentionPeriod::Years(minimum_years));

            let cutoff = RetentionCutoff::for_policy(&policy, reference);
            let floor_cutoff = RetentionPeriod::Years(minimum_years).cutoff_from(reference);

            prop_assert!(cutoff.at() <= floor_cutoff);
        }
    }
}
