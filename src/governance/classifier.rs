//! Classifier contract
//!
//! A classifier turns the current window contents into a verdict. It is
//! shared by every in-flight exchange, so implementations must be pure and
//! thread-safe.

use super::verdict::{Decision, Verdict};

/// Pattern-based content classifier
pub trait Classifier: Send + Sync {
    /// Policy name recorded on events when this classifier fires
    fn policy(&self) -> &str;

    /// Evaluate text, returning `None` when there is no policy concern.
    ///
    /// Must be deterministic: identical text yields identical verdicts.
    fn evaluate(&self, text: &str) -> Option<Verdict>;

    /// Replace every match in `text` with a placeholder.
    ///
    /// Classifiers that cannot locate their matches return the text as is.
    fn mask(&self, text: &str) -> String {
        text.to_string()
    }

    /// Byte offset in `text` where the last match carrying `decision` ends.
    ///
    /// `None` when nothing matches or the classifier cannot locate matches.
    fn last_match_end(&self, _text: &str, _decision: Decision) -> Option<usize> {
        None
    }
}
