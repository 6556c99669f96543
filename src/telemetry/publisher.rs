//! Durable bus sink
//!
//! Events are serialized to JSON and handed to a [`Publisher`] on a
//! spawned task, so a slow or unavailable bus never delays the data path.
//! Delivery failures are logged and dropped.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, warn};
use thiserror::Error;
use tokio::runtime::Handle;

use super::event::GovernanceEvent;
use super::fanout::FanoutSink;
use super::sink::{EventSink, LogSink};

#[derive(Debug, Clone, Error)]
#[error("publish failed: {0}")]
pub struct PublishError(pub String);

/// Message bus client
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Publish one message; resolves once the bus acknowledged it
    async fn publish(
        &self,
        payload: Vec<u8>,
        attributes: HashMap<String, String>,
    ) -> Result<(), PublishError>;
}

/// Sink delivering events through a [`Publisher`]
pub struct PublisherSink<P> {
    publisher: Arc<P>,
    topic: String,
}

impl<P: Publisher + 'static> PublisherSink<P> {
    pub fn new(publisher: Arc<P>, topic: &str) -> Self {
        Self {
            publisher,
            topic: topic.to_string(),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }
}

fn attributes_for(event: &GovernanceEvent) -> HashMap<String, String> {
    HashMap::from([
        ("policy".to_string(), event.policy.clone()),
        ("decision".to_string(), event.decision.to_string()),
    ])
}

impl<P: Publisher + 'static> EventSink for PublisherSink<P> {
    fn emit(&self, event: GovernanceEvent) {
        let payload = match serde_json::to_vec(&event) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("[{}] event marshal failed: {}", self.topic, e);
                return;
            }
        };

        let handle = match Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                warn!(
                    "[{}] no async runtime, dropping event for request {}",
                    self.topic, event.request_id
                );
                return;
            }
        };

        let publisher = Arc::clone(&self.publisher);
        let topic = self.topic.clone();
        let attributes = attributes_for(&event);
        let request_id = event.request_id;

        handle.spawn(async move {
            match publisher.publish(payload, attributes).await {
                Ok(()) => debug!("[{}] published event for request {}", topic, request_id),
                Err(e) => warn!("[{}] {} (request {})", topic, e, request_id),
            }
        });
    }

    fn name(&self) -> &str {
        &self.topic
    }
}

/// Local log sink, fanned out to a publisher when one is available.
///
/// The log sink always comes first so a degraded bus never leaves a
/// decision unaudited.
pub fn log_and_publish<P: Publisher + 'static>(
    publisher: Option<Arc<P>>,
    topic: &str,
) -> Arc<dyn EventSink> {
    match publisher {
        Some(publisher) => Arc::new(
            FanoutSink::default()
                .with_sink(Arc::new(LogSink::new()))
                .with_sink(Arc::new(PublisherSink::new(publisher, topic))),
        ),
        None => {
            warn!("[{}] publisher disabled, auditing to log only", topic);
            Arc::new(LogSink::new())
        }
    }
}
