//! Test doubles shared by the unit tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;

use crate::backend::{BackendError, FragmentStream, GenerationBackend};
use crate::telemetry::{EventSink, GovernanceEvent, PublishError, Publisher};

/// Sink that keeps every event in memory
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<GovernanceEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<GovernanceEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: GovernanceEvent) {
        self.events.lock().unwrap().push(event);
    }

    fn name(&self) -> &str {
        "recording"
    }
}

/// Sink that panics on every event
pub struct PanickingSink;

impl EventSink for PanickingSink {
    fn emit(&self, _event: GovernanceEvent) {
        panic!("sink exploded");
    }

    fn name(&self) -> &str {
        "panicking"
    }
}

/// Publisher that records payloads and attributes
#[derive(Default)]
pub struct RecordingPublisher {
    messages: Mutex<Vec<(Vec<u8>, HashMap<String, String>)>>,
}

impl RecordingPublisher {
    pub fn messages(&self) -> Vec<(Vec<u8>, HashMap<String, String>)> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl Publisher for RecordingPublisher {
    async fn publish(
        &self,
        payload: Vec<u8>,
        attributes: HashMap<String, String>,
    ) -> Result<(), PublishError> {
        self.messages.lock().unwrap().push((payload, attributes));
        Ok(())
    }
}

/// Publisher whose bus is always down
#[derive(Default)]
pub struct FailingPublisher {
    attempts: AtomicUsize,
}

impl FailingPublisher {
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Publisher for FailingPublisher {
    async fn publish(
        &self,
        _payload: Vec<u8>,
        _attributes: HashMap<String, String>,
    ) -> Result<(), PublishError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(PublishError("topic unavailable".to_string()))
    }
}

/// Backend replaying a fixed answer and fragment list
pub struct ScriptedBackend {
    answer: Result<String, BackendError>,
    fragments: Result<Vec<Result<String, BackendError>>, BackendError>,
    calls: AtomicUsize,
}

impl ScriptedBackend {
    pub fn answering(answer: &str) -> Self {
        Self {
            answer: Ok(answer.to_string()),
            fragments: Ok(vec![Ok(answer.to_string())]),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn streaming(fragments: Vec<Result<String, BackendError>>) -> Self {
        Self::answering("").with_fragments(fragments)
    }

    pub fn failing(error: BackendError) -> Self {
        Self {
            answer: Err(error.clone()),
            fragments: Err(error),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_fragments(mut self, fragments: Vec<Result<String, BackendError>>) -> Self {
        self.fragments = Ok(fragments);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerationBackend for ScriptedBackend {
    fn model(&self) -> &str {
        "scripted-model"
    }

    async fn generate(&self, _prompt: &str) -> Result<String, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answer.clone()
    }

    async fn stream(&self, _prompt: &str) -> Result<FragmentStream, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.fragments.clone().map(fragment_stream)
    }
}

pub fn fragment_stream(items: Vec<Result<String, BackendError>>) -> FragmentStream {
    futures::stream::iter(items).boxed()
}

/// Clean filler text of exactly `len` characters
pub fn filler(len: usize) -> String {
    "the quick brown fox jumps over the lazy dog "
        .chars()
        .cycle()
        .take(len)
        .collect()
}

/// Let spawned publisher tasks run to completion
pub async fn settle() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
    tokio::time::sleep(Duration::from_millis(10)).await;
}
