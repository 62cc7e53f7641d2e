//! Test doubles shared by the integration suites
#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use heartbeat::clock::Clock;
use heartbeat::io::{HttpClient, HttpResponse};
use heartbeat::notifier::{MessageId, Notification, Notifier};
use heartbeat::store::StateStore;
use heartbeat::HeartbeatError;

/// The monitored site: answers GETs with a configurable status, or not at all
#[derive(Debug)]
pub struct FakeSite {
    status: Mutex<Option<u16>>,
}

impl Default for FakeSite {
    fn default() -> Self {
        Self {
            status: Mutex::new(Some(200)),
        }
    }
}

impl FakeSite {
    pub fn respond_with(&self, status: u16) {
        *self.status.lock().unwrap() = Some(status);
    }

    pub fn go_offline(&self) {
        *self.status.lock().unwrap() = None;
    }
}

#[async_trait]
impl HttpClient for FakeSite {
    async fn get(&self, url: &str) -> heartbeat::Result<HttpResponse> {
        match *self.status.lock().unwrap() {
            Some(status) => Ok(HttpResponse {
                status,
                body: String::new(),
            }),
            None => Err(HeartbeatError::Http(format!("GET {} failed: refused", url))),
        }
    }

    async fn post_json(
        &self,
        url: &str,
        _body: &serde_json::Value,
    ) -> heartbeat::Result<HttpResponse> {
        Err(HeartbeatError::Http(format!("unexpected POST {}", url)))
    }
}

/// A notification channel that keeps messages until they are deleted
#[derive(Debug, Default)]
pub struct FakeChannel {
    live: Mutex<HashSet<MessageId>>,
    sent: Mutex<Vec<(MessageId, Notification)>>,
    next_id: Mutex<u64>,
    fail_sends: Mutex<bool>,
}

impl FakeChannel {
    pub fn insert(&self, id: &str) {
        self.live.lock().unwrap().insert(MessageId::new(id));
    }

    pub fn delete(&self, id: &MessageId) {
        self.live.lock().unwrap().remove(id);
    }

    pub fn set_failing(&self, failing: bool) {
        *self.fail_sends.lock().unwrap() = failing;
    }

    pub fn sent(&self) -> Vec<(MessageId, Notification)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn last_sent(&self) -> Option<(MessageId, Notification)> {
        self.sent.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Notifier for FakeChannel {
    fn type_name(&self) -> &str {
        "fake"
    }

    async fn send(&self, notification: &Notification) -> heartbeat::Result<MessageId> {
        if *self.fail_sends.lock().unwrap() {
            return Err(HeartbeatError::Notifier("channel unavailable".to_string()));
        }
        let id = {
            let mut next_id = self.next_id.lock().unwrap();
            *next_id += 1;
            MessageId::new(format!("msg-{}", *next_id))
        };
        self.live.lock().unwrap().insert(id.clone());
        self.sent
            .lock()
            .unwrap()
            .push((id.clone(), notification.clone()));
        Ok(id)
    }

    async fn exists(&self, message_id: &MessageId) -> heartbeat::Result<bool> {
        Ok(self.live.lock().unwrap().contains(message_id))
    }
}

/// A write to the state store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreWrite {
    Set(MessageId),
    Clear,
}

/// Wraps a real store and records every write that reaches it
#[derive(Debug)]
pub struct RecordingStore {
    inner: Arc<dyn StateStore>,
    writes: Mutex<Vec<StoreWrite>>,
}

impl RecordingStore {
    pub fn new(inner: Arc<dyn StateStore>) -> Self {
        Self {
            inner,
            writes: Mutex::new(Vec::new()),
        }
    }

    pub fn writes(&self) -> Vec<StoreWrite> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl StateStore for RecordingStore {
    async fn get_active_message_id(&self) -> heartbeat::Result<Option<MessageId>> {
        self.inner.get_active_message_id().await
    }

    async fn set_active_message_id(&self, message_id: &MessageId) -> heartbeat::Result<()> {
        self.writes
            .lock()
            .unwrap()
            .push(StoreWrite::Set(message_id.clone()));
        self.inner.set_active_message_id(message_id).await
    }

    async fn clear_active_message_id(&self) -> heartbeat::Result<()> {
        self.writes.lock().unwrap().push(StoreWrite::Clear);
        self.inner.clear_active_message_id().await
    }
}

/// Frozen time; sleeping returns immediately
#[derive(Debug, Default)]
pub struct FrozenClock;

pub fn frozen_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
}

#[async_trait]
impl Clock for FrozenClock {
    fn now(&self) -> DateTime<Utc> {
        frozen_time()
    }

    async fn sleep(&self, _duration: Duration) {}
}
