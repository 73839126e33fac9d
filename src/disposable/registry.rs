use std::collections::HashSet;
use std::sync::{Arc, Weak};
use std::time::{Duration, SystemTime};

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::cancel::{CancelHandle, CancelToken, cancel_pair};
use crate::events::{Event, EventKind, EventSink, TracingSink};
use crate::smtp_verify::ErrorKind;

use super::builtin::SEED_DOMAINS;
use super::error::RegistryError;
use super::source::DomainSource;

/// Shortest accepted refresh period.
const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(1);

/// An immutable view of the registry at one point in time.
#[derive(Debug, Clone)]
pub struct DisposableSet {
    domains: HashSet<String>,
    updated_at: SystemTime,
}

impl DisposableSet {
    fn new(domains: HashSet<String>) -> Self {
        Self {
            domains,
            updated_at: SystemTime::now(),
        }
    }

    /// `domain` is matched as given; use [`DisposableRegistry::is_disposable`]
    /// for normalised lookups.
    pub fn contains(&self, domain: &str) -> bool {
        self.domains.contains(domain)
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    pub fn updated_at(&self) -> SystemTime {
        self.updated_at
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.domains.iter().map(String::as_str)
    }
}

/// Disposable-domain lookups backed by an atomically swapped snapshot.
///
/// Reads never take a lock. Writers (`add_domains`, refreshes) serialise on
/// an internal mutex, build a fresh [`DisposableSet`] and publish it in one
/// pointer swap, so a reader sees either the old set or the new one.
#[derive(Clone)]
pub struct DisposableRegistry {
    inner: Arc<Inner>,
}

struct Inner {
    current: ArcSwap<DisposableSet>,
    lists: Mutex<Lists>,
    refresher: Mutex<Option<Refresher>>,
    sink: Arc<dyn EventSink>,
}

#[derive(Default)]
struct Lists {
    base: HashSet<String>,
    overrides: HashSet<String>,
}

impl Lists {
    fn merged(&self) -> DisposableSet {
        DisposableSet::new(self.base.union(&self.overrides).cloned().collect())
    }
}

struct Refresher {
    handle: CancelHandle,
    task: JoinHandle<()>,
}

impl Default for DisposableRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DisposableRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DisposableRegistry")
            .field("domains", &self.inner.current.load().len())
            .field("auto_refresh", &self.is_auto_refreshing())
            .finish()
    }
}

impl DisposableRegistry {
    /// A registry seeded with the built-in list, reporting to `tracing`.
    pub fn new() -> Self {
        Self::with_seed(SEED_DOMAINS.iter().copied(), Arc::new(TracingSink))
    }

    /// A registry with no domains until the first refresh or `add_domains`.
    pub fn empty() -> Self {
        Self::with_seed(std::iter::empty::<&str>(), Arc::new(TracingSink))
    }

    pub fn with_seed<I, S>(seed: I, sink: Arc<dyn EventSink>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let lists = Lists {
            base: normalize_all(seed),
            overrides: HashSet::new(),
        };
        let inner = Inner {
            current: ArcSwap::from_pointee(lists.merged()),
            lists: Mutex::new(lists),
            refresher: Mutex::new(None),
            sink,
        };
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Case-insensitive; a trailing dot is ignored.
    pub fn is_disposable(&self, domain: &str) -> bool {
        match normalize(domain) {
            Some(domain) => self.inner.current.load().contains(&domain),
            None => false,
        }
    }

    pub fn snapshot(&self) -> Arc<DisposableSet> {
        self.inner.current.load_full()
    }

    /// Merges caller-supplied domains immediately. They are kept across
    /// refreshes. Returns how many were new.
    pub fn add_domains<I, S>(&self, domains: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut lists = self.inner.lists.lock();
        let before = lists.overrides.len();
        lists.overrides.extend(normalize_all(domains));
        let added = lists.overrides.len() - before;
        if added > 0 {
            self.inner.current.store(Arc::new(lists.merged()));
        }
        added
    }

    /// Fetches once from `source` and publishes the result. On failure the
    /// current snapshot stays in place and a `RefreshFailed` event is sent.
    pub async fn refresh_now(&self, source: &dyn DomainSource) -> Result<usize, RegistryError> {
        self.inner.refresh(source).await
    }

    /// Spawns a background task refreshing from `source` every `interval`,
    /// starting immediately. A refresher that is already running is stopped
    /// first. Must be called within a tokio runtime.
    pub fn start_auto_refresh(&self, interval: Duration, source: Arc<dyn DomainSource>) {
        let (handle, token) = cancel_pair();
        let period = interval.max(MIN_REFRESH_INTERVAL);
        let task = tokio::spawn(refresh_loop(
            Arc::downgrade(&self.inner),
            period,
            source,
            token,
        ));
        let previous = self
            .inner
            .refresher
            .lock()
            .replace(Refresher { handle, task });
        if let Some(previous) = previous {
            previous.handle.cancel();
        }
    }

    /// Stops the background refresher. Safe to call any number of times.
    pub fn stop_auto_refresh(&self) {
        if let Some(refresher) = self.inner.refresher.lock().take() {
            refresher.handle.cancel();
        }
    }

    pub fn is_auto_refreshing(&self) -> bool {
        self.inner
            .refresher
            .lock()
            .as_ref()
            .is_some_and(|refresher| !refresher.task.is_finished())
    }
}

impl Inner {
    async fn refresh(&self, source: &dyn DomainSource) -> Result<usize, RegistryError> {
        let source_name = source.name();
        let result = match source.fetch().await {
            Ok(domains) => {
                let base = normalize_all(domains);
                if base.is_empty() {
                    Err(RegistryError::empty(&source_name))
                } else {
                    Ok(self.publish(base))
                }
            }
            Err(err) => Err(RegistryError::fetch(&source_name, err)),
        };

        match &result {
            Ok(len) => self.sink.emit(&Event::new(
                EventKind::RefreshPublished,
                &source_name,
                None,
                format!("published {len} disposable domains"),
            )),
            Err(err) => self.sink.emit(&Event::new(
                EventKind::RefreshFailed,
                &source_name,
                Some(ErrorKind::RefreshFetchFailed),
                err.to_string(),
            )),
        }
        result
    }

    fn publish(&self, base: HashSet<String>) -> usize {
        let mut lists = self.lists.lock();
        lists.base = base;
        let set = lists.merged();
        let len = set.len();
        self.current.store(Arc::new(set));
        len
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(refresher) = self.refresher.get_mut().take() {
            refresher.handle.cancel();
        }
    }
}

/// Holds only a weak reference so the task ends once every registry handle
/// is gone.
async fn refresh_loop(
    inner: Weak<Inner>,
    period: Duration,
    source: Arc<dyn DomainSource>,
    cancel: CancelToken,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }
        let Some(state) = inner.upgrade() else {
            break;
        };
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            // failures are already reported through the sink
            _ = state.refresh(source.as_ref()) => {}
        }
    }
    tracing::debug!(source = %source.name(), "disposable refresher stopped");
}

fn normalize(domain: &str) -> Option<String> {
    let domain = domain.trim().trim_end_matches('.');
    if domain.is_empty() {
        None
    } else {
        Some(domain.to_lowercase())
    }
}

fn normalize_all<I, S>(domains: I) -> HashSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    domains
        .into_iter()
        .filter_map(|domain| normalize(domain.as_ref()))
        .collect()
}
