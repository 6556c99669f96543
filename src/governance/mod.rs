//! Governance module for AI-Guard
//!
//! This module provides:
//! - Policy verdicts and the classifier seam
//! - Regex PII classification
//! - Streaming and batch output governors

pub mod batch_governor;
pub mod classifier;
pub mod context;
pub mod pii;
pub mod stream_governor;
pub mod verdict;

pub use batch_governor::{BatchGovernor, BatchOutcome, BatchOutput};
pub use classifier::Classifier;
pub use context::RequestContext;
pub use pii::{PiiClassifier, PiiKind, PiiRule};
pub use stream_governor::{GovernorState, OutputAction, StreamGovernor, StreamSummary};
pub use verdict::{decision_of, Decision, Verdict};
