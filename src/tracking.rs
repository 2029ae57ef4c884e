//! Fire-and-forget analytics.
//!
//! Dispatch pushes a [`TrackEvent`] onto a bounded queue and moves on; when
//! the queue is full the event is dropped. A background worker counts
//! resolved hits per registrable domain in a [`KvStore`] and, when a
//! tracking id is configured, posts the event to the Google Analytics
//! measurement protocol. Nothing the worker does can fail a request.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::config::TrackingConfig;
use crate::store::{KvStore, StoreError};

/// What happened to a forwarding request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Redirect,
    Proxy,
    Miss,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Redirect => "Redirect",
            Action::Proxy => "Proxy",
            Action::Miss => "Miss",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One tracked forwarding outcome.
#[derive(Debug, Clone)]
pub struct TrackEvent {
    pub action: Action,
    /// Full request host, as reported to analytics.
    pub host: String,
    /// Registrable domain the hit is counted against.
    pub domain: String,
    pub destination: Option<String>,
    pub client_ip: String,
}

/// Events buffered ahead of the worker.
const QUEUE_CAPACITY: usize = 1024;

/// Store key holding the hit counter for `action` on `domain`.
pub fn hit_key(action: Action, domain: &str) -> String {
    format!("hits:{}:{}", action.as_str().to_ascii_lowercase(), domain)
}

/// Handle for submitting events; cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct Tracker {
    tx: Option<mpsc::Sender<TrackEvent>>,
}

impl Tracker {
    /// A tracker that drops every event.
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    /// Start the background worker; must be called inside a Tokio runtime.
    pub fn spawn(config: &TrackingConfig, store: Arc<dyn KvStore>) -> Self {
        if !config.enabled {
            return Self::disabled();
        }

        let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_default();

        let worker = Worker {
            rx,
            store,
            client,
            tracking_id: config.tracking_id.clone().filter(|id| !id.is_empty()),
            endpoint: config.endpoint.clone(),
        };
        tokio::spawn(worker.run());

        tracing::info!(remote = config.tracking_id.is_some(), "Tracking worker started");
        Self { tx: Some(tx) }
    }

    /// Submit an event. Never blocks and never fails.
    pub fn track(&self, event: TrackEvent) {
        if let Some(tx) = &self.tx {
            if let Err(mpsc::error::TrySendError::Full(event)) = tx.try_send(event) {
                tracing::debug!(host = %event.host, "Tracking queue full, event dropped");
            }
        }
    }
}

struct Worker {
    rx: mpsc::Receiver<TrackEvent>,
    store: Arc<dyn KvStore>,
    client: reqwest::Client,
    tracking_id: Option<String>,
    endpoint: String,
}

impl Worker {
    async fn run(mut self) {
        while let Some(event) = self.rx.recv().await {
            self.count(&event).await;
            if let Some(tid) = &self.tracking_id {
                self.post(tid, event);
            }
        }
        tracing::debug!("Tracking worker stopped");
    }

    /// Misses are never counted: their hosts are chosen by the client.
    async fn count(&self, event: &TrackEvent) {
        if event.action == Action::Miss {
            return;
        }
        let key = hit_key(event.action, &event.domain);
        let hits = match self.store.get(&key).await {
            Ok(value) => value.parse::<u64>().unwrap_or(0),
            Err(StoreError::NotFound) => 0,
            Err(e) => {
                tracing::debug!(key = %key, error = %e, "Hit counter unavailable");
                return;
            }
        };
        if let Err(e) = self.store.set(&key, (hits + 1).to_string()).await {
            tracing::debug!(key = %key, error = %e, "Hit counter not saved");
        }
    }

    fn post(&self, tid: &str, event: TrackEvent) {
        let cid = uuid::Uuid::new_v4().to_string();
        let params = [
            ("v", "1".to_string()),
            ("tid", tid.to_string()),
            ("cid", cid),
            ("t", "event".to_string()),
            ("ec", event.action.as_str().to_string()),
            ("ea", event.host),
            ("el", event.destination.unwrap_or_default()),
            ("uip", event.client_ip),
        ];
        let request = self.client.post(&self.endpoint).form(&params);

        tokio::spawn(async move {
            if let Err(e) = request.send().await {
                tracing::debug!(error = %e, "Tracking event dropped");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn event(action: Action, host: &str) -> TrackEvent {
        let domain = host.split_once('.').map(|(_, d)| d).unwrap_or(host);
        TrackEvent {
            action,
            host: host.to_string(),
            domain: domain.to_string(),
            destination: Some("http://example.org".to_string()),
            client_ip: "192.0.2.1".to_string(),
        }
    }

    async fn wait_for(store: &MemoryStore, key: &str, expected: &str) -> String {
        let mut hits = String::new();
        for _ in 0..50 {
            if let Ok(v) = store.get(key).await {
                hits = v;
                if hits == expected {
                    break;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        hits
    }

    #[tokio::test]
    async fn subdomains_share_one_counter_per_domain() {
        let store = Arc::new(MemoryStore::new());
        let config = TrackingConfig {
            enabled: true,
            ..Default::default()
        };
        let tracker = Tracker::spawn(&config, store.clone());

        tracker.track(event(Action::Redirect, "a.example.com"));
        tracker.track(event(Action::Redirect, "b.example.com"));
        tracker.track(event(Action::Redirect, "c.example.com"));

        let key = hit_key(Action::Redirect, "example.com");
        assert_eq!(wait_for(&store, &key, "3").await, "3");
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn misses_are_not_counted() {
        let store = Arc::new(MemoryStore::new());
        let config = TrackingConfig {
            enabled: true,
            ..Default::default()
        };
        let tracker = Tracker::spawn(&config, store.clone());

        for i in 0..20 {
            tracker.track(event(Action::Miss, &format!("r{}.example.net", i)));
        }
        tracker.track(event(Action::Proxy, "api.example.com"));

        let key = hit_key(Action::Proxy, "example.com");
        assert_eq!(wait_for(&store, &key, "1").await, "1");
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn disabled_tracker_drops_events() {
        let store = Arc::new(MemoryStore::new());
        let tracker = Tracker::spawn(&TrackingConfig::default(), store.clone());
        tracker.track(event(Action::Proxy, "a.example.com"));
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(store.is_empty());
    }
}
