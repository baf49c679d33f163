//! Change watching by periodic sampling.
//!
//! A [`Poller`] owns a [`PollSource`] and a list of callbacks, each with the
//! interval its owner asked for. Sampling never happens more often than the
//! smallest of those intervals; when a sample reports a change, every
//! callback runs once, in registration order.
//!
//! Nothing here spawns threads: the owner drives sampling by calling
//! [`Poller::test_poll`] from its own loop.

use std::fmt;
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::{FsError, Item};

/// Something whose state can be sampled for changes.
pub trait PollSource {
    /// Take a sample; `true` if it differs from the previous one.
    fn poll(&mut self) -> bool;
}

/// Handle returned by [`Poller::add_watch`], used to remove the watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchId(u64);

type Callback<S> = Box<dyn FnMut(&S) + Send>;

struct Watch<S> {
    id: WatchId,
    interval: Duration,
    callback: Callback<S>,
}

/// Callbacks sharing one sampled source.
///
/// # Example
///
/// ```rust
/// use ezfs::{PollSource, Poller};
/// use std::time::{Duration, Instant};
///
/// struct Counter(u32);
///
/// impl PollSource for Counter {
///     fn poll(&mut self) -> bool {
///         self.0 += 1;
///         true
///     }
/// }
///
/// let mut poller = Poller::new(Counter(0));
/// let start = Instant::now();
/// poller.add_watch_at(|_| {}, Duration::from_secs(10), start);
/// poller.add_watch_at(|_| {}, Duration::from_secs(2), start);
/// assert_eq!(poller.least_interval(), Some(Duration::from_secs(2)));
///
/// assert!(!poller.test_poll_at(start + Duration::from_secs(1)));
/// assert!(poller.test_poll_at(start + Duration::from_secs(2)));
/// ```
pub struct Poller<S> {
    source: S,
    watches: Vec<Watch<S>>,
    least: Option<Duration>,
    last_poll: Option<Instant>,
    next_id: u64,
}

impl<S: PollSource> Poller<S> {
    /// A poller with no watches.
    pub fn new(source: S) -> Self {
        Self {
            source,
            watches: Vec::new(),
            least: None,
            last_poll: None,
            next_id: 0,
        }
    }

    /// The sampled source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Number of registered watches.
    pub fn len(&self) -> usize {
        self.watches.len()
    }

    /// Whether no watches are registered.
    pub fn is_empty(&self) -> bool {
        self.watches.is_empty()
    }

    /// The smallest interval among the registered watches.
    pub fn least_interval(&self) -> Option<Duration> {
        self.least
    }

    /// Register `callback`, then check whether a sample is due.
    pub fn add_watch<F>(&mut self, callback: F, interval: Duration) -> WatchId
    where
        F: FnMut(&S) + Send + 'static,
    {
        self.add_watch_at(callback, interval, Instant::now())
    }

    /// [`add_watch`](Poller::add_watch) with an explicit clock reading.
    pub fn add_watch_at<F>(&mut self, callback: F, interval: Duration, now: Instant) -> WatchId
    where
        F: FnMut(&S) + Send + 'static,
    {
        self.next_id += 1;
        let id = WatchId(self.next_id);
        self.watches.push(Watch {
            id,
            interval,
            callback: Box::new(callback),
        });
        self.recompute_least();
        debug!(?id, ?interval, least = ?self.least, "watch added");
        self.test_poll_at(now);
        id
    }

    /// Remove a watch. Returns `false` (and does nothing) if `id` is unknown.
    pub fn remove_watch(&mut self, id: WatchId) -> bool {
        let before = self.watches.len();
        self.watches.retain(|w| w.id != id);
        let removed = self.watches.len() != before;
        if removed {
            self.recompute_least();
            debug!(?id, least = ?self.least, "watch removed");
        }
        removed
    }

    fn recompute_least(&mut self) {
        self.least = self.watches.iter().map(|w| w.interval).min();
        if self.least.is_none() {
            self.last_poll = None;
        }
    }

    /// Sample the source if the smallest interval has elapsed; run every
    /// callback if it changed. Returns whether a change was reported.
    pub fn test_poll(&mut self) -> bool {
        self.test_poll_at(Instant::now())
    }

    /// [`test_poll`](Poller::test_poll) with an explicit clock reading.
    pub fn test_poll_at(&mut self, now: Instant) -> bool {
        let Some(least) = self.least else {
            return false;
        };
        let due = self
            .last_poll
            .is_none_or(|last| now.saturating_duration_since(last) >= least);
        if !due {
            return false;
        }
        self.last_poll = Some(now);

        let Self {
            source, watches, ..
        } = self;
        if !source.poll() {
            trace!("poll: unchanged");
            return false;
        }
        debug!(callbacks = watches.len(), "poll: changed");
        for watch in watches.iter_mut() {
            (watch.callback)(source);
        }
        true
    }
}

impl<S: fmt::Debug> fmt::Debug for Poller<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Poller")
            .field("source", &self.source)
            .field("watches", &self.watches.len())
            .field("least", &self.least)
            .field("last_poll", &self.last_poll)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Sample {
    Revision(Option<u64>),
    Missing,
}

/// A [`PollSource`] reporting changes to one item, using its backend's
/// revision counter.
///
/// The first sample is the baseline. An item that disappears counts as one
/// change. Backends without revisions never report changes.
#[derive(Debug)]
pub struct ItemWatch {
    item: Item,
    last: Option<Sample>,
}

impl ItemWatch {
    /// Watch `item`.
    pub fn new(item: Item) -> Self {
        Self { item, last: None }
    }

    /// The watched item.
    pub fn item(&self) -> &Item {
        &self.item
    }

    fn sample(&self) -> Sample {
        match self.item.backend().revision(self.item.url()) {
            Ok(revision) => Sample::Revision(revision),
            Err(FsError::NotFound { .. }) => Sample::Missing,
            Err(e) => {
                debug!(url = %self.item.url(), error = %e, "revision query failed");
                Sample::Missing
            }
        }
    }
}

impl PollSource for ItemWatch {
    fn poll(&mut self) -> bool {
        let sample = self.sample();
        let changed = self.last.as_ref().is_some_and(|last| *last != sample);
        self.last = Some(sample);
        changed
    }
}
