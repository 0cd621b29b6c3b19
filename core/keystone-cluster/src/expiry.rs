//! License expiry health check.

use crate::config::ExpiryThresholds;
use crate::coordinator::ClusterLicenseCoordinator;
use keystone_license::{LicenseRecord, now_millis};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Identifier of the license expiry check among the node's health checks.
pub const LICENSE_EXPIRY_CHECK_ID: i32 = 5;

/// How urgently a failed health check needs attention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    None,
    Medium,
    High,
}

/// A named node health check.
pub trait HealthCheck: Send + Sync {
    fn id(&self) -> i32;

    /// `true` when the check passes.
    fn validate(&self) -> bool;

    fn severity(&self) -> Severity;

    fn description(&self) -> String;
}

/// Read access to the node's current license.
pub trait CurrentLicense: Send + Sync {
    fn current_license(&self) -> Option<Arc<LicenseRecord>>;
}

impl CurrentLicense for ClusterLicenseCoordinator {
    fn current_license(&self) -> Option<Arc<LicenseRecord>> {
        ClusterLicenseCoordinator::current_license(self)
    }
}

/// Warning windows before a license expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LicenseExpiryNotification {
    /// Inside the moderate window, outside the severe one.
    Moderate,
    /// Inside the severe window, or already expired.
    Severe,
}

impl LicenseExpiryNotification {
    /// Classifies `record` at `now_ms`; `None` outside every window.
    #[must_use]
    pub fn classify(
        record: &LicenseRecord,
        now_ms: i64,
        thresholds: &ExpiryThresholds,
    ) -> Option<Self> {
        let remaining = record.millis_until_expiry(now_ms);
        if remaining <= thresholds.severe_ms {
            Some(Self::Severe)
        } else if remaining <= thresholds.moderate_ms {
            Some(Self::Moderate)
        } else {
            None
        }
    }

    #[must_use]
    pub fn severity(self) -> Severity {
        match self {
            Self::Moderate => Severity::Medium,
            Self::Severe => Severity::High,
        }
    }
}

/// Fails while the current license is inside an expiry warning window.
///
/// Pure over (cached record, clock, thresholds): no I/O, never writes the
/// cache.
pub struct LicenseExpiryCheck {
    license: Arc<dyn CurrentLicense>,
    thresholds: ExpiryThresholds,
    clock: fn() -> i64,
}

impl LicenseExpiryCheck {
    pub fn new(license: Arc<dyn CurrentLicense>, thresholds: ExpiryThresholds) -> Self {
        Self::with_clock(license, thresholds, now_millis)
    }

    /// Uses `clock` (epoch milliseconds) instead of the wall clock.
    pub fn with_clock(
        license: Arc<dyn CurrentLicense>,
        thresholds: ExpiryThresholds,
        clock: fn() -> i64,
    ) -> Self {
        Self {
            license,
            thresholds,
            clock,
        }
    }

    /// The current notification, if any.
    #[must_use]
    pub fn notification(&self) -> Option<LicenseExpiryNotification> {
        let record = self.license.current_license()?;
        LicenseExpiryNotification::classify(&record, (self.clock)(), &self.thresholds)
    }
}

impl HealthCheck for LicenseExpiryCheck {
    fn id(&self) -> i32 {
        LICENSE_EXPIRY_CHECK_ID
    }

    fn validate(&self) -> bool {
        self.notification().is_none()
    }

    fn severity(&self) -> Severity {
        self.notification()
            .map_or(Severity::None, LicenseExpiryNotification::severity)
    }

    fn description(&self) -> String {
        let expiry = self
            .license
            .current_license()
            .and_then(|record| record.expiration())
            .map_or_else(|| "an unknown date".to_string(), |at| at.to_rfc3339());
        format!(
            "Your license will expire on {expiry}. Request a new license key to keep enterprise features enabled."
        )
    }
}
