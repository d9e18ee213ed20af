//! In-memory collaborators for driving the run coordinator in tests.

#![allow(dead_code)]

use std::collections::{HashSet, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use weather_core::fingerprint::Fingerprint;
use weather_core::mail::{MailComposer, OutgoingEmail};
use weather_core::mailer::{MailError, Mailer};
use weather_core::notice::NoticeKind;
use weather_core::model::{
    BandwidthSub, NodeDownSub, Router, Subscriber, TShirtSub, VersionSub, Watched,
};
use weather_core::registry::RegistryUpdate;
use weather_core::relay::{RelayStatus, SnapshotSet, FLAG_RUNNING, FLAG_STABLE};
use weather_core::source::{RelaySource, SourceError};
use weather_core::store::{StoreError, SubscriptionUpdate, WeatherStore};
use weather_core::types::{DbId, Timestamp};
use weather_events::AppendLog;
use weather_worker::{Outbox, RunCoordinator};

pub const FP_F: &str = "9695DFC35FFEB861329B9F1AB04C46397020CE31";
pub const FP_G: &str = "847B1F850344D7876491A54892F904934E4EB85D";

pub fn t0() -> Timestamp {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

pub fn fp(raw: &str) -> Fingerprint {
    Fingerprint::parse(raw).unwrap()
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

#[derive(Default)]
struct State {
    next_id: DbId,
    routers: Vec<Router>,
    subscribers: Vec<Subscriber>,
    node_down: Vec<NodeDownSub>,
    version: Vec<VersionSub>,
    bandwidth: Vec<BandwidthSub>,
    tshirt: Vec<TShirtSub>,
    registry_writes: usize,
    subscription_writes: usize,
    failing_saves: HashSet<DbId>,
    failing_listings: HashSet<NoticeKind>,
}

impl State {
    fn next_id(&mut self) -> DbId {
        self.next_id += 1;
        self.next_id
    }

    fn check_listing(&self, kind: NoticeKind) -> Result<(), StoreError> {
        if self.failing_listings.contains(&kind) {
            return Err(StoreError::Backend(format!("{} listing unavailable", kind.as_str())));
        }
        Ok(())
    }

    fn watched<S: Clone>(&self, sub: &S, subscriber_id: DbId) -> Option<Watched<S>> {
        let subscriber = self
            .subscribers
            .iter()
            .find(|s| s.id == subscriber_id && s.confirmed)?;
        let router = self.routers.iter().find(|r| r.id == subscriber.router_id)?;
        Some(Watched {
            subscription: sub.clone(),
            subscriber: subscriber.clone(),
            router: router.clone(),
        })
    }
}

/// A store holding everything in a mutex, with cascade deletes.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_router(&self, fingerprint: &str, name: &str, last_seen: Timestamp, up: bool) -> DbId {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id();
        state.routers.push(Router {
            id,
            fingerprint: fp(fingerprint),
            name: name.to_string(),
            welcomed: true,
            last_seen,
            up,
            exit: false,
        });
        id
    }

    pub fn add_subscriber(&self, router_id: DbId, email: &str) -> DbId {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id();
        state.subscribers.push(Subscriber {
            id,
            email: email.to_string(),
            router_id,
            confirmed: true,
            confirm_auth: format!("confirm{id}"),
            unsubs_auth: format!("unsubs{id}"),
            pref_auth: format!("pref{id}"),
            sub_date: t0(),
        });
        id
    }

    pub fn add_node_down(&self, subscriber_id: DbId, grace_pd: i32) -> DbId {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id();
        state.node_down.push(NodeDownSub {
            id,
            subscriber_id,
            emailed: false,
            triggered: false,
            grace_pd,
            last_changed: t0() - chrono::Duration::days(30),
        });
        id
    }

    pub fn add_version(&self, sub: VersionSub) {
        self.state.lock().unwrap().version.push(sub);
    }

    pub fn add_bandwidth(&self, sub: BandwidthSub) {
        self.state.lock().unwrap().bandwidth.push(sub);
    }

    /// Start a T-shirt subscription that has not seen the relay yet.
    pub fn add_tshirt(&self, subscriber_id: DbId) -> DbId {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id();
        state.tshirt.push(TShirtSub {
            id,
            subscriber_id,
            emailed: false,
            triggered: false,
            avg_bandwidth: 0,
            last_changed: t0() - chrono::Duration::days(30),
        });
        id
    }

    /// Make every listing of `kind` fail.
    pub fn fail_listing(&self, kind: NoticeKind) {
        self.state.lock().unwrap().failing_listings.insert(kind);
    }

    pub fn fail_saves_for(&self, subscription_id: DbId) {
        self.state
            .lock()
            .unwrap()
            .failing_saves
            .insert(subscription_id);
    }

    pub fn routers(&self) -> Vec<Router> {
        self.state.lock().unwrap().routers.clone()
    }

    pub fn router(&self, fingerprint: &str) -> Option<Router> {
        let wanted = fp(fingerprint);
        self.routers().into_iter().find(|r| r.fingerprint == wanted)
    }

    pub fn node_down(&self, id: DbId) -> NodeDownSub {
        let state = self.state.lock().unwrap();
        state.node_down.iter().find(|s| s.id == id).cloned().unwrap()
    }

    pub fn version(&self, id: DbId) -> VersionSub {
        let state = self.state.lock().unwrap();
        state.version.iter().find(|s| s.id == id).cloned().unwrap()
    }

    pub fn bandwidth(&self, id: DbId) -> BandwidthSub {
        let state = self.state.lock().unwrap();
        state.bandwidth.iter().find(|s| s.id == id).cloned().unwrap()
    }

    pub fn tshirt(&self, id: DbId) -> TShirtSub {
        let state = self.state.lock().unwrap();
        state.tshirt.iter().find(|s| s.id == id).cloned().unwrap()
    }

    pub fn registry_writes(&self) -> usize {
        self.state.lock().unwrap().registry_writes
    }

    pub fn subscription_writes(&self) -> usize {
        self.state.lock().unwrap().subscription_writes
    }
}

fn replace<S>(rows: &mut [S], id: DbId, row: S, row_id: impl Fn(&S) -> DbId) -> Result<(), StoreError> {
    let slot = rows
        .iter_mut()
        .find(|r| row_id(r) == id)
        .ok_or(StoreError::NotFound {
            entity: "subscription",
            id,
        })?;
    *slot = row;
    Ok(())
}

#[async_trait]
impl WeatherStore for MemoryStore {
    async fn list_routers(&self) -> Result<Vec<Router>, StoreError> {
        Ok(self.routers())
    }

    async fn apply_registry(&self, update: &RegistryUpdate) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        state.registry_writes += 1;

        for router in &update.updated {
            if let Some(slot) = state.routers.iter_mut().find(|r| r.id == router.id) {
                *slot = router.clone();
            }
        }
        for new in &update.created {
            let id = state.next_id();
            state.routers.push(Router {
                id,
                fingerprint: new.fingerprint.clone(),
                name: new.name.clone(),
                welcomed: new.welcomed,
                last_seen: new.last_seen,
                up: new.up,
                exit: new.exit,
            });
        }

        let evicted: HashSet<DbId> = update.evicted.iter().copied().collect();
        state.routers.retain(|r| !evicted.contains(&r.id));
        let gone: HashSet<DbId> = state
            .subscribers
            .iter()
            .filter(|s| evicted.contains(&s.router_id))
            .map(|s| s.id)
            .collect();
        state.subscribers.retain(|s| !gone.contains(&s.id));
        state.node_down.retain(|s| !gone.contains(&s.subscriber_id));
        state.version.retain(|s| !gone.contains(&s.subscriber_id));
        state.bandwidth.retain(|s| !gone.contains(&s.subscriber_id));
        state.tshirt.retain(|s| !gone.contains(&s.subscriber_id));
        Ok(())
    }

    async fn node_down_subs(&self) -> Result<Vec<Watched<NodeDownSub>>, StoreError> {
        let state = self.state.lock().unwrap();
        state.check_listing(NoticeKind::NodeDown)?;
        Ok(state
            .node_down
            .iter()
            .filter_map(|s| state.watched(s, s.subscriber_id))
            .collect())
    }

    async fn version_subs(&self) -> Result<Vec<Watched<VersionSub>>, StoreError> {
        let state = self.state.lock().unwrap();
        state.check_listing(NoticeKind::Version)?;
        Ok(state
            .version
            .iter()
            .filter_map(|s| state.watched(s, s.subscriber_id))
            .collect())
    }

    async fn bandwidth_subs(&self) -> Result<Vec<Watched<BandwidthSub>>, StoreError> {
        let state = self.state.lock().unwrap();
        state.check_listing(NoticeKind::Bandwidth)?;
        Ok(state
            .bandwidth
            .iter()
            .filter_map(|s| state.watched(s, s.subscriber_id))
            .collect())
    }

    async fn tshirt_subs(&self) -> Result<Vec<Watched<TShirtSub>>, StoreError> {
        let state = self.state.lock().unwrap();
        state.check_listing(NoticeKind::TShirt)?;
        Ok(state
            .tshirt
            .iter()
            .filter(|s| !s.emailed)
            .filter_map(|s| state.watched(s, s.subscriber_id))
            .collect())
    }

    async fn save_subscription(&self, update: &SubscriptionUpdate) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        if state.failing_saves.contains(&update.id()) {
            return Err(StoreError::Backend("injected failure".into()));
        }
        state.subscription_writes += 1;
        let id = update.id();
        match update.clone() {
            SubscriptionUpdate::NodeDown(s) => replace(&mut state.node_down, id, s, |r| r.id),
            SubscriptionUpdate::Version(s) => replace(&mut state.version, id, s, |r| r.id),
            SubscriptionUpdate::Bandwidth(s) => replace(&mut state.bandwidth, id, s, |r| r.id),
            SubscriptionUpdate::TShirt(s) => replace(&mut state.tshirt, id, s, |r| r.id),
        }
    }

    async fn deployment_time(&self, now: Timestamp) -> Result<Timestamp, StoreError> {
        Ok(now)
    }
}

// ---------------------------------------------------------------------------
// ScriptedSource
// ---------------------------------------------------------------------------

/// Serves queued results in order, then repeats the current snapshot set.
#[derive(Default)]
pub struct ScriptedSource {
    current: Mutex<SnapshotSet>,
    failures: Mutex<VecDeque<SourceError>>,
    delay: Option<Duration>,
}

impl ScriptedSource {
    pub fn new(set: SnapshotSet) -> Self {
        Self {
            current: Mutex::new(set),
            ..Self::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn set(&self, set: SnapshotSet) {
        *self.current.lock().unwrap() = set;
    }

    /// Make the next fetch fail with `error`.
    pub fn fail_next(&self, error: SourceError) {
        self.failures.lock().unwrap().push_back(error);
    }
}

#[async_trait]
impl RelaySource for ScriptedSource {
    async fn fetch(&self) -> Result<SnapshotSet, SourceError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(error) = self.failures.lock().unwrap().pop_front() {
            return Err(error);
        }
        Ok(self.current.lock().unwrap().clone())
    }
}

pub fn relay(fingerprint: &str, name: &str, up: bool) -> RelayStatus {
    let mut flags = vec![FLAG_STABLE.to_string()];
    if up {
        flags.push(FLAG_RUNNING.to_string());
    }
    RelayStatus {
        fingerprint: fp(fingerprint),
        nickname: name.to_string(),
        up,
        hibernating: false,
        is_exit: false,
        observed_bandwidth_kbs: 800,
        version: Some("0.2.4.23".to_string()),
        contact: None,
        flags,
    }
}

// ---------------------------------------------------------------------------
// RecordingMailer
// ---------------------------------------------------------------------------

/// Records every message; recipients in `rejecting` get a transport error.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutgoingEmail>>,
    rejecting: Mutex<HashSet<String>>,
}

impl RecordingMailer {
    pub fn reject(&self, recipient: &str) {
        self.rejecting.lock().unwrap().insert(recipient.to_string());
    }

    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn subjects(&self) -> Vec<String> {
        self.sent().into_iter().map(|e| e.subject).collect()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_batch(&self, emails: &[OutgoingEmail]) -> Vec<Result<(), MailError>> {
        let rejecting = self.rejecting.lock().unwrap().clone();
        emails
            .iter()
            .map(|email| {
                if email.recipients.iter().any(|r| rejecting.contains(r)) {
                    return Err(MailError::Transport("550 mailbox unavailable".into()));
                }
                self.sent.lock().unwrap().push(email.clone());
                Ok(())
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub source: Arc<ScriptedSource>,
    pub mailer: Arc<RecordingMailer>,
    pub coordinator: RunCoordinator,
}

/// Wire a coordinator whose logs live under `log_dir`. The deployment time
/// is far enough in the past that new relays are welcomed.
pub fn harness(store: MemoryStore, source: ScriptedSource, log_dir: &Path) -> Harness {
    harness_with_timeout(store, source, log_dir, Duration::from_secs(5))
}

pub fn harness_with_timeout(
    store: MemoryStore,
    source: ScriptedSource,
    log_dir: &Path,
    source_timeout: Duration,
) -> Harness {
    let store = Arc::new(store);
    let source = Arc::new(source);
    let mailer = Arc::new(RecordingMailer::default());
    let outbox = Outbox::new(
        mailer.clone(),
        MailComposer::new("https://weather.example.org", "tor-ops@torproject.org"),
        AppendLog::new(log_dir.join("failed_emails.txt")),
    );
    let coordinator = RunCoordinator::new(
        store.clone(),
        source.clone(),
        outbox,
        AppendLog::new(log_dir.join("unparsable_emails.txt")),
        t0() - chrono::Duration::days(30),
    )
    .with_source_timeout(source_timeout);
    Harness {
        store,
        source,
        mailer,
        coordinator,
    }
}
