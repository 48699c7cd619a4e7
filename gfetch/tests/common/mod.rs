//! Shared test helpers.

#![allow(dead_code)]

use async_trait::async_trait;
use gfetch::{
    Client, LifecycleEvent, Response, StatusCode, Transport, TransportError, TransportRequest,
};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// Canned outcome for one request.
pub enum Reply {
    Respond(Response),
    Fail(String),
}

/// Transport that records requests and replays canned replies.
///
/// When the queue is empty it answers `200 {}`.
#[derive(Clone, Default)]
pub struct MockTransport {
    requests: Arc<Mutex<Vec<TransportRequest>>>,
    replies: Arc<Mutex<VecDeque<Reply>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, response: Response) -> Self {
        self.replies.lock().push_back(Reply::Respond(response));
        self
    }

    pub fn fail(self, message: &str) -> Self {
        self.replies.lock().push_back(Reply::Fail(message.to_string()));
        self
    }

    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().clone()
    }

    pub fn last_request(&self) -> TransportRequest {
        self.requests
            .lock()
            .last()
            .cloned()
            .expect("no request recorded")
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: TransportRequest) -> Result<Response, TransportError> {
        self.requests.lock().push(request);
        match self.replies.lock().pop_front() {
            Some(Reply::Respond(response)) => Ok(response),
            Some(Reply::Fail(message)) => Err(TransportError::Connection(message)),
            None => Ok(Response::new(StatusCode::OK, "{}")),
        }
    }
}

/// Notifier that keeps every event.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    events: Arc<Mutex<Vec<LifecycleEvent>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<LifecycleEvent> {
        self.events.lock().clone()
    }
}

impl gfetch::Notifier for RecordingNotifier {
    fn notify(&self, event: &LifecycleEvent) {
        self.events.lock().push(event.clone());
    }
}

pub const BASE_URL: &str = "https://api.example.com/v1";

/// Client over `transport` with a recording notifier and a `users` endpoint.
pub fn client(transport: &MockTransport) -> (Client, RecordingNotifier) {
    let notifier = RecordingNotifier::new();
    let client = Client::builder(BASE_URL)
        .transport(transport.clone())
        .notifier(notifier.clone())
        .endpoint("users")
        .build()
        .expect("valid client");
    (client, notifier)
}
