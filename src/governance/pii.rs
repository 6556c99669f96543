//! PII Detection and Masking Module
//!
//! This module detects Personally Identifiable Information (PII) in model
//! output and masks it on request.
//!
//! Each rule carries its own decision, so the relative priority of every
//! rule is defined by construction: the highest decision among matching
//! rules wins, ties go to the rule registered first.

use once_cell::sync::Lazy;
use regex::Regex;

use super::classifier::Classifier;
use super::verdict::{Decision, Verdict};
use crate::config::{ConfigError, GovernorConfig};

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[a-zA-Z0-9._%+\-]+@[a-zA-Z0-9.\-]+\.[a-zA-Z]{2,}").unwrap());

// Optional leading '+', then at least 8 digits with spaces or hyphens between them
static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\+?\d(?:[\s\-]*\d){7,}").unwrap());

static SSN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").unwrap());

static CREDIT_CARD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\d{4}[\-\s]?\d{4}[\-\s]?\d{4}[\-\s]?\d{4}\b").unwrap());

/// Built-in PII kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PiiKind {
    /// Email address
    Email,
    /// Phone number (8+ digits, optional '+', spaces or hyphens)
    Phone,
    /// Social Security Number (XXX-XX-XXXX)
    Ssn,
    /// Credit card number (16 digits with optional separators)
    CreditCard,
}

impl PiiKind {
    /// Parse a configuration name (`email`, `phone`, `ssn`, `credit_card`)
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "email" => Some(PiiKind::Email),
            "phone" => Some(PiiKind::Phone),
            "ssn" => Some(PiiKind::Ssn),
            "credit_card" => Some(PiiKind::CreditCard),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PiiKind::Email => "email",
            PiiKind::Phone => "phone",
            PiiKind::Ssn => "ssn",
            PiiKind::CreditCard => "credit_card",
        }
    }

    /// Decision taken when this kind is found
    pub fn decision(&self) -> Decision {
        match self {
            PiiKind::Phone => Decision::Redact,
            PiiKind::Email | PiiKind::Ssn | PiiKind::CreditCard => Decision::Abort,
        }
    }

    /// Reason code recorded on the verdict
    pub fn reason(&self) -> &'static str {
        match self {
            PiiKind::Email => "email_detected",
            PiiKind::Phone => "phone_detected",
            PiiKind::Ssn => "ssn_detected",
            PiiKind::CreditCard => "credit_card_detected",
        }
    }

    /// Get the masking placeholder for this PII kind
    pub fn placeholder(&self) -> &'static str {
        match self {
            PiiKind::Email => "[EMAIL REDACTED]",
            PiiKind::Phone => "[PHONE REDACTED]",
            PiiKind::Ssn => "[SSN REDACTED]",
            PiiKind::CreditCard => "[CREDIT CARD REDACTED]",
        }
    }

    fn regex(&self) -> &'static Regex {
        match self {
            PiiKind::Email => &EMAIL_RE,
            PiiKind::Phone => &PHONE_RE,
            PiiKind::Ssn => &SSN_RE,
            PiiKind::CreditCard => &CREDIT_CARD_RE,
        }
    }
}

/// One detection rule
#[derive(Debug, Clone)]
pub struct PiiRule {
    name: String,
    decision: Decision,
    reason: String,
    placeholder: String,
    regex: Regex,
}

impl PiiRule {
    /// Rule for a built-in kind
    pub fn builtin(kind: PiiKind) -> Self {
        Self {
            name: kind.name().to_string(),
            decision: kind.decision(),
            reason: kind.reason().to_string(),
            placeholder: kind.placeholder().to_string(),
            regex: kind.regex().clone(),
        }
    }

    /// Rule from a caller-supplied pattern
    pub fn custom(
        name: &str,
        pattern: &str,
        decision: Decision,
        reason: &str,
        placeholder: &str,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            name: name.to_string(),
            decision,
            reason: reason.to_string(),
            placeholder: placeholder.to_string(),
            regex: Regex::new(pattern)?,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn decision(&self) -> Decision {
        self.decision
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

/// Regex-backed PII classifier
#[derive(Debug, Clone)]
pub struct PiiClassifier {
    rules: Vec<PiiRule>,
}

impl PiiClassifier {
    /// Policy name recorded on events
    pub const POLICY: &'static str = "pii";

    /// Create a classifier with an explicit rule list
    pub fn new(rules: Vec<PiiRule>) -> Self {
        Self { rules }
    }

    /// Create a classifier for the given built-in kinds
    pub fn with_kinds(kinds: &[PiiKind]) -> Self {
        Self::new(kinds.iter().map(|k| PiiRule::builtin(*k)).collect())
    }

    /// Build the rule set named by `pii_types`
    pub fn from_config(config: &GovernorConfig) -> Result<Self, ConfigError> {
        let kinds = config
            .pii_types
            .iter()
            .map(|name| {
                PiiKind::from_name(name).ok_or_else(|| ConfigError::UnknownPiiType(name.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::with_kinds(&kinds))
    }

    /// Register an additional rule
    pub fn with_rule(mut self, rule: PiiRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Number of registered rules
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Names of every rule matching `text`, in registration order
    pub fn matching_rules(&self, text: &str) -> Vec<&str> {
        self.rules
            .iter()
            .filter(|r| r.is_match(text))
            .map(|r| r.name())
            .collect()
    }
}

impl Default for PiiClassifier {
    /// Base rule set: email aborts, phone redacts
    fn default() -> Self {
        Self::with_kinds(&[PiiKind::Email, PiiKind::Phone])
    }
}

impl Classifier for PiiClassifier {
    fn policy(&self) -> &str {
        Self::POLICY
    }

    fn evaluate(&self, text: &str) -> Option<Verdict> {
        let mut best: Option<&PiiRule> = None;

        for rule in &self.rules {
            // An allow rule can never outrank the absence of a verdict
            if rule.decision == Decision::Allow {
                continue;
            }
            if best.is_some_and(|b| b.decision >= rule.decision) {
                continue;
            }
            if rule.is_match(text) {
                best = Some(rule);
            }
        }

        best.map(|rule| Verdict::new(rule.decision, rule.reason.clone()))
    }

    fn mask(&self, text: &str) -> String {
        let mut ordered: Vec<&PiiRule> = self.rules.iter().collect();
        // Stable sort keeps registration order within a decision
        ordered.sort_by(|a, b| b.decision.cmp(&a.decision));

        ordered.into_iter().fold(text.to_string(), |acc, rule| {
            rule.regex
                .replace_all(&acc, rule.placeholder.as_str())
                .into_owned()
        })
    }

    fn last_match_end(&self, text: &str, decision: Decision) -> Option<usize> {
        self.rules
            .iter()
            .filter(|r| r.decision == decision)
            .filter_map(|r| r.regex.find_iter(text).last().map(|m| m.end()))
            .max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_aborts() {
        let classifier = PiiClassifier::default();
        let verdict = classifier
            .evaluate("Contact me at user@example.com for details")
            .unwrap();

        assert_eq!(verdict.decision, Decision::Abort);
        assert_eq!(verdict.reason, "email_detected");
    }

    #[test]
    fn test_phone_redacts() {
        let classifier = PiiClassifier::default();
        let verdict = classifier.evaluate("Call +1 555-123-4567 today").unwrap();

        assert_eq!(verdict.decision, Decision::Redact);
        assert_eq!(verdict.reason, "phone_detected");
    }

    #[test]
    fn test_phone_needs_eight_digits() {
        let classifier = PiiClassifier::default();

        assert!(classifier.evaluate("room 555-1234").is_none());
        assert!(classifier.evaluate("call 5551-2345").is_some());
    }

    #[test]
    fn test_no_pii() {
        let classifier = PiiClassifier::default();
        assert!(classifier.evaluate("What is the weather like today?").is_none());
    }

    #[test]
    fn test_abort_dominates_redact() {
        let classifier = PiiClassifier::default();
        let text = "Phone: 555-123-4567, Email: test@example.com";

        assert_eq!(classifier.matching_rules(text), vec!["email", "phone"]);
        assert_eq!(classifier.evaluate(text).unwrap().decision, Decision::Abort);

        // Registration order does not change the outcome
        let reversed = PiiClassifier::with_kinds(&[PiiKind::Phone, PiiKind::Email]);
        assert_eq!(reversed.evaluate(text).unwrap().reason, "email_detected");
    }

    #[test]
    fn test_evaluation_is_idempotent() {
        let classifier = PiiClassifier::default();
        let text = "reach me on 020 7946 0958 after lunch";

        assert_eq!(classifier.evaluate(text), classifier.evaluate(text));
    }

    #[test]
    fn test_optional_kinds() {
        let classifier = PiiClassifier::with_kinds(&[PiiKind::Ssn, PiiKind::CreditCard]);

        let ssn = classifier.evaluate("My SSN is 123-45-6789").unwrap();
        assert_eq!(ssn.reason, "ssn_detected");

        let card = classifier.evaluate("Card: 4111-1111-1111-1111").unwrap();
        assert_eq!(card.reason, "credit_card_detected");
    }

    #[test]
    fn test_custom_rule_priority() {
        let rule = PiiRule::custom(
            "ticket",
            r"TICKET-\d{4}",
            Decision::Redact,
            "ticket_detected",
            "[TICKET]",
        )
        .unwrap();
        let classifier = PiiClassifier::default().with_rule(rule);

        let verdict = classifier.evaluate("see TICKET-1234").unwrap();
        assert_eq!(verdict.reason, "ticket_detected");

        // Phone was registered first and ties on decision
        let verdict = classifier.evaluate("TICKET-1234 or 555-123-4567").unwrap();
        assert_eq!(verdict.reason, "phone_detected");
    }

    #[test]
    fn test_mask() {
        let classifier = PiiClassifier::default();
        let masked = classifier.mask("Mail a@b.io or call 555-123-4567.");

        assert_eq!(masked, "Mail [EMAIL REDACTED] or call [PHONE REDACTED].");
    }

    #[test]
    fn test_last_match_end() {
        let classifier = PiiClassifier::default();
        let text = "call 555-123-4567 or 020 7946 0958 now";

        assert_eq!(classifier.last_match_end(text, Decision::Redact), Some(34));
        assert_eq!(classifier.last_match_end(text, Decision::Abort), None);
        assert_eq!(classifier.last_match_end("nothing here", Decision::Redact), None);
    }

    #[test]
    fn test_from_config() {
        let config = GovernorConfig {
            pii_types: vec!["email".to_string(), "ssn".to_string()],
            ..Default::default()
        };
        let classifier = PiiClassifier::from_config(&config).unwrap();
        assert_eq!(classifier.rule_count(), 2);
        assert!(classifier.evaluate("555-123-4567").is_none());

        let bad = GovernorConfig {
            pii_types: vec!["passport".to_string()],
            ..Default::default()
        };
        assert!(matches!(
            PiiClassifier::from_config(&bad),
            Err(ConfigError::UnknownPiiType(name)) if name == "passport"
        ));
    }
}
