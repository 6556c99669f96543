//! Telemetry module for the output governor
//!
//! Every governance decision becomes a structured [`GovernanceEvent`]
//! delivered through an [`EventSink`]:
//! - [`LogSink`] writes one JSON line per event and always succeeds
//! - [`PublisherSink`] delivers to a durable bus on a spawned task
//! - [`FanoutSink`] dispatches the same event to several sinks

pub mod event;
pub mod fanout;
pub mod publisher;
pub mod sink;

pub use event::{GovernanceEvent, POLICY_NONE};
pub use fanout::FanoutSink;
pub use publisher::{log_and_publish, PublishError, Publisher, PublisherSink};
pub use sink::{EventSink, LogSink};
