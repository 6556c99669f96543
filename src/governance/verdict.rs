//! Policy decisions and verdicts

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of one evaluation.
///
/// Variants are declared in priority order: when several rules match the
/// same text, the greatest decision wins (`Abort > Redact > Allow`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// No policy concern
    Allow,
    /// Suppress the current increment, keep the exchange going
    Redact,
    /// Terminate the exchange
    Abort,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Allow => "allow",
            Decision::Redact => "redact",
            Decision::Abort => "abort",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classifier's verdict for one evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    /// What to do with the inspected content
    pub decision: Decision,
    /// Short reason code, e.g. `email_detected`
    pub reason: String,
}

impl Verdict {
    pub fn new(decision: Decision, reason: impl Into<String>) -> Self {
        Self {
            decision,
            reason: reason.into(),
        }
    }

    pub fn redact(reason: impl Into<String>) -> Self {
        Self::new(Decision::Redact, reason)
    }

    pub fn abort(reason: impl Into<String>) -> Self {
        Self::new(Decision::Abort, reason)
    }

    pub fn is_abort(&self) -> bool {
        self.decision == Decision::Abort
    }
}

/// Decision carried by an optional verdict; no verdict means allow.
pub fn decision_of(verdict: Option<&Verdict>) -> Decision {
    verdict.map_or(Decision::Allow, |v| v.decision)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_order() {
        assert!(Decision::Abort > Decision::Redact);
        assert!(Decision::Redact > Decision::Allow);
        assert_eq!(
            [Decision::Redact, Decision::Abort, Decision::Allow]
                .into_iter()
                .max(),
            Some(Decision::Abort)
        );
    }

    #[test]
    fn test_serializes_snake_case() {
        let json = serde_json::to_string(&Decision::Redact).unwrap();
        assert_eq!(json, "\"redact\"");
        assert_eq!(Decision::Abort.to_string(), "abort");
    }

    #[test]
    fn test_missing_verdict_is_allow() {
        assert_eq!(decision_of(None), Decision::Allow);
        assert_eq!(
            decision_of(Some(&Verdict::redact("phone_detected"))),
            Decision::Redact
        );
    }
}
