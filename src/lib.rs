//! AI Guard output governor
//!
//! Sits between a generation backend and its consumer. Generated text is
//! evaluated against content policies while it streams, and the governor
//! decides per fragment whether to forward it, withhold it, or cut the
//! stream. Every decision is audited through a fire-and-forget event sink.
//!
//! Complete (non-streaming) responses go through the same classifier with
//! a single evaluation.

pub mod api;
pub mod backend;
pub mod config;
pub mod error;
pub mod gateway;
pub mod governance;
pub mod streaming;
pub mod telemetry;

#[cfg(test)]
mod testing;

pub use api::{ChatMessage, ChatRequest};
pub use backend::{BackendError, FragmentStream, GenerationBackend};
pub use config::{ConfigError, GovernorConfig, RedactMode};
pub use error::{GovernError, GovernResult};
pub use gateway::{BatchResponse, Gateway, GatewayResponse};
pub use governance::{
    BatchGovernor, BatchOutcome, BatchOutput, Classifier, Decision, OutputAction, PiiClassifier,
    RequestContext, StreamGovernor, StreamSummary, Verdict,
};
pub use streaming::RollingWindow;
pub use telemetry::{EventSink, FanoutSink, GovernanceEvent, LogSink, Publisher, PublisherSink};
