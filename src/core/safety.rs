//! Safety enforcement for a single invocation.
//!
//! Pure limit checking over tool-call count, elapsed wall-clock time, and
//! accumulated cost. One enforcer is constructed per invocation and never
//! shared or persisted. Checks are synchronous, idempotent, and inclusive:
//! `observed >= limit` fails.

use std::time::Instant;

use crate::core::error::{EngineError, LimitKind, SafetyViolation};
use crate::model::SafetyLimits;

/// Remaining headroom snapshot, for diagnostics and logging.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RemainingCapacity {
    pub tool_calls: u32,
    pub seconds: u64,
    pub cost: f64,
}

pub struct SafetyEnforcer {
    limits: SafetyLimits,
    started_at: Instant,
}

impl SafetyEnforcer {
    pub fn new(limits: SafetyLimits) -> Self {
        Self::with_start(limits, Instant::now())
    }

    /// Construct with an explicit start time. Lets tests simulate elapsed time.
    pub fn with_start(limits: SafetyLimits, started_at: Instant) -> Self {
        Self { limits, started_at }
    }

    pub fn limits(&self) -> &SafetyLimits {
        &self.limits
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    /// Fails once `count` reaches the configured maximum.
    pub fn check_tool_call_limit(&self, count: u32) -> Result<(), EngineError> {
        if count >= self.limits.max_tool_calls {
            return Err(EngineError::safety(SafetyViolation {
                limit: LimitKind::ToolCalls,
                configured: self.limits.max_tool_calls as f64,
                observed: count as f64,
            }));
        }
        Ok(())
    }

    /// Fails once elapsed wall-clock time reaches the configured timeout.
    pub fn check_timeout(&self) -> Result<(), EngineError> {
        let elapsed = self.elapsed_seconds();
        if elapsed >= self.limits.timeout_seconds {
            return Err(EngineError::safety(SafetyViolation {
                limit: LimitKind::Timeout,
                configured: self.limits.timeout_seconds as f64,
                observed: elapsed as f64,
            }));
        }
        Ok(())
    }

    /// Fails once accumulated cost reaches the configured ceiling.
    pub fn check_cost_limit(&self, cost: f64) -> Result<(), EngineError> {
        if cost >= self.limits.max_total_cost {
            return Err(EngineError::safety(SafetyViolation {
                limit: LimitKind::Cost,
                configured: self.limits.max_total_cost,
                observed: cost,
            }));
        }
        Ok(())
    }

    /// Non-failing combined check.
    pub fn can_continue(&self, count: u32, cost: f64) -> bool {
        self.check_tool_call_limit(count).is_ok()
            && self.check_timeout().is_ok()
            && self.check_cost_limit(cost).is_ok()
    }

    pub fn remaining_capacity(&self, count: u32, cost: f64) -> RemainingCapacity {
        RemainingCapacity {
            tool_calls: self.limits.max_tool_calls.saturating_sub(count),
            seconds: self
                .limits
                .timeout_seconds
                .saturating_sub(self.elapsed_seconds()),
            cost: (self.limits.max_total_cost - cost).max(0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn limits(max_tool_calls: u32, timeout_seconds: u64, max_total_cost: f64) -> SafetyLimits {
        SafetyLimits {
            max_tool_calls,
            timeout_seconds,
            max_total_cost,
        }
    }

    #[test]
    fn test_tool_call_limit_inclusive() {
        let enforcer = SafetyEnforcer::new(limits(3, 300, 1.0));
        assert!(enforcer.check_tool_call_limit(0).is_ok());
        assert!(enforcer.check_tool_call_limit(2).is_ok());
        assert!(enforcer.check_tool_call_limit(3).is_err());
        assert!(enforcer.check_tool_call_limit(4).is_err());
    }

    #[test]
    fn test_cost_limit_inclusive() {
        let enforcer = SafetyEnforcer::new(limits(10, 300, 0.5));
        assert!(enforcer.check_cost_limit(0.0).is_ok());
        assert!(enforcer.check_cost_limit(0.49).is_ok());
        assert!(enforcer.check_cost_limit(0.5).is_err());
        assert!(enforcer.check_cost_limit(0.9).is_err());
    }

    #[test]
    fn test_timeout_against_backdated_start() {
        let started = Instant::now() - Duration::from_secs(60);
        let enforcer = SafetyEnforcer::with_start(limits(10, 30, 1.0), started);
        assert!(enforcer.check_timeout().is_err());

        let enforcer = SafetyEnforcer::with_start(limits(10, 300, 1.0), started);
        assert!(enforcer.check_timeout().is_ok());
    }

    #[test]
    fn test_checks_are_idempotent() {
        let enforcer = SafetyEnforcer::new(limits(2, 300, 1.0));
        for _ in 0..5 {
            assert!(enforcer.check_tool_call_limit(1).is_ok());
            assert!(enforcer.check_tool_call_limit(2).is_err());
        }
    }

    #[test]
    fn test_violation_carries_limit_and_observed() {
        let enforcer = SafetyEnforcer::new(limits(2, 300, 1.0));
        let err = enforcer.check_tool_call_limit(5).unwrap_err();
        match err {
            EngineError::SafetyLimit { violation, .. } => {
                assert_eq!(violation.limit, LimitKind::ToolCalls);
                assert_eq!(violation.configured, 2.0);
                assert_eq!(violation.observed, 5.0);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_can_continue_and_remaining_capacity() {
        let enforcer = SafetyEnforcer::new(limits(4, 300, 1.0));
        assert!(enforcer.can_continue(3, 0.5));
        assert!(!enforcer.can_continue(4, 0.5));
        assert!(!enforcer.can_continue(3, 1.0));

        let remaining = enforcer.remaining_capacity(3, 0.25);
        assert_eq!(remaining.tool_calls, 1);
        assert!((remaining.cost - 0.75).abs() < 1e-9);
        assert!(remaining.seconds <= 300);
    }
}
