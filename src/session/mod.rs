//! One client session: latest snapshot, active view, derived cards.
//!
//! Background refreshes run on short-lived worker threads and report back
//! over a crossbeam channel. Results are applied only when the owner polls,
//! in completion order, so the last refresh to finish wins.

#![allow(missing_docs)]

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError, unbounded};
use serde::Serialize;

use crate::acquire::{Acquired, Acquirer, MetricsTransport};
use crate::core::errors::{DashError, Result};
use crate::logger::ActivityLog;
use crate::logger::jsonl::{EventType, LogEntry, Severity};
use crate::metrics::derive::{MetricDescriptor, derive_with};
use crate::metrics::format::MetricFormatter;
use crate::view::{View, ViewState};

/// Running counters for one session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    pub refreshes_started: u64,
    pub refreshes_applied: u64,
    pub fallbacks: u64,
    pub view_changes: u64,
    pub rejected_selections: u64,
}

/// A background refresh that has finished but not yet been applied.
struct CompletedRefresh {
    seq: u64,
    acquired: Acquired,
}

pub struct DashboardSession<T> {
    acquirer: Arc<Acquirer<T>>,
    views: ViewState,
    formatter: MetricFormatter,
    latest: Option<Acquired>,
    descriptors: Vec<MetricDescriptor>,
    log: ActivityLog,
    stats: SessionStats,
    next_seq: u64,
    last_applied_seq: Option<u64>,
    in_flight: usize,
    done_tx: Sender<CompletedRefresh>,
    done_rx: Receiver<CompletedRefresh>,
}

impl<T: MetricsTransport + 'static> DashboardSession<T> {
    /// A session in the loading state: no snapshot, no descriptors.
    #[must_use]
    pub fn new(acquirer: Acquirer<T>, views: ViewState, formatter: MetricFormatter) -> Self {
        let (done_tx, done_rx) = unbounded();
        Self {
            acquirer: Arc::new(acquirer),
            views,
            formatter,
            latest: None,
            descriptors: Vec::new(),
            log: ActivityLog::disabled(),
            stats: SessionStats::default(),
            next_seq: 0,
            last_applied_seq: None,
            in_flight: 0,
            done_tx,
            done_rx,
        }
    }

    /// Attach an activity log and record `session_start`.
    #[must_use]
    pub fn with_activity_log(mut self, log: ActivityLog) -> Self {
        self.log = log;
        self.log.record(
            &LogEntry::new(EventType::SessionStart, Severity::Info)
                .with_view(self.views.active().id())
                .with_details(format!("endpoint={}", self.acquirer.transport().describe())),
        );
        self
    }

    /// True until the first snapshot has been applied.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.latest.is_none()
    }

    /// Acquire on the calling thread and apply the result.
    pub fn refresh(&mut self) -> &Acquired {
        self.stats.refreshes_started += 1;
        let seq = self.take_seq();
        let acquired = self.acquirer.acquire();
        self.apply(seq, acquired)
    }

    /// Start a background acquisition and return its sequence number.
    ///
    /// The current snapshot stays exposed until [`Self::poll_refresh`]
    /// applies the result.
    ///
    /// # Errors
    /// `Runtime` when the worker thread cannot be spawned.
    pub fn request_refresh(&mut self) -> Result<u64> {
        let seq = self.take_seq();
        let acquirer = Arc::clone(&self.acquirer);
        let done_tx = self.done_tx.clone();
        thread::Builder::new()
            .name(format!("mobdash-refresh-{seq}"))
            .spawn(move || {
                let acquired = acquirer.acquire();
                // The session may be gone; nothing to report to then.
                let _ = done_tx.send(CompletedRefresh { seq, acquired });
            })
            .map_err(|source| DashError::Runtime {
                details: format!("failed to spawn refresh thread: {source}"),
            })?;
        self.stats.refreshes_started += 1;
        self.in_flight += 1;
        Ok(seq)
    }

    /// Apply every finished background refresh. Returns how many were applied.
    pub fn poll_refresh(&mut self) -> usize {
        let mut applied = 0;
        loop {
            match self.done_rx.try_recv() {
                Ok(done) => {
                    self.in_flight = self.in_flight.saturating_sub(1);
                    self.apply(done.seq, done.acquired);
                    applied += 1;
                }
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => return applied,
            }
        }
    }

    /// Block up to `timeout` for one background refresh, then apply it and
    /// anything else already finished.
    ///
    /// # Errors
    /// `ChannelClosed` if the completion channel disconnected.
    pub fn wait_refresh(&mut self, timeout: Duration) -> Result<usize> {
        if self.in_flight == 0 {
            return Ok(self.poll_refresh());
        }
        match self.done_rx.recv_timeout(timeout) {
            Ok(done) => {
                self.in_flight = self.in_flight.saturating_sub(1);
                self.apply(done.seq, done.acquired);
                Ok(1 + self.poll_refresh())
            }
            Err(RecvTimeoutError::Timeout) => Ok(0),
            Err(RecvTimeoutError::Disconnected) => Err(DashError::ChannelClosed {
                component: "session-refresh",
            }),
        }
    }

    /// Background refreshes started but not yet applied.
    #[must_use]
    pub const fn pending_refreshes(&self) -> usize {
        self.in_flight
    }

    /// Select a view by identifier or alias.
    ///
    /// # Errors
    /// `InvalidView`; the active view and descriptors are left unchanged.
    pub fn select_view(&mut self, raw: &str) -> Result<View> {
        let before = self.views.active();
        let outcome = self.views.select(raw);
        self.after_selection(before, outcome)
    }

    /// Select by 1-based catalog position (`0` is the tenth).
    ///
    /// # Errors
    /// `InvalidView` when the catalog has no such position.
    pub fn select_number(&mut self, number: u8) -> Result<View> {
        let before = self.views.active();
        let outcome = self.views.select_number(number);
        self.after_selection(before, outcome)
    }

    pub fn next_view(&mut self) -> View {
        let before = self.views.active();
        let view = self.views.next();
        self.record_transition(before, view);
        view
    }

    pub fn prev_view(&mut self) -> View {
        let before = self.views.active();
        let view = self.views.prev();
        self.record_transition(before, view);
        view
    }

    /// Return to the previously active view, if any.
    pub fn back(&mut self) -> Option<View> {
        let before = self.views.active();
        let view = self.views.back()?;
        self.record_transition(before, view);
        Some(view)
    }

    // ──────────────────── read-only views ────────────────────

    #[must_use]
    pub fn descriptors(&self) -> &[MetricDescriptor] {
        &self.descriptors
    }

    #[must_use]
    pub const fn active_view(&self) -> View {
        self.views.active()
    }

    #[must_use]
    pub const fn view_state(&self) -> &ViewState {
        &self.views
    }

    /// Most recently applied acquisition.
    #[must_use]
    pub const fn latest(&self) -> Option<&Acquired> {
        self.latest.as_ref()
    }

    /// Sequence number of the most recently applied refresh.
    #[must_use]
    pub const fn last_applied_seq(&self) -> Option<u64> {
        self.last_applied_seq
    }

    #[must_use]
    pub const fn stats(&self) -> SessionStats {
        self.stats
    }

    #[must_use]
    pub const fn formatter(&self) -> &MetricFormatter {
        &self.formatter
    }

    // ──────────────────── internals ────────────────────

    fn take_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    fn apply(&mut self, seq: u64, acquired: Acquired) -> &Acquired {
        self.stats.refreshes_applied += 1;

        let mut entry = LogEntry::new(EventType::RefreshComplete, Severity::Info)
            .with_view(self.views.active().id())
            .with_duration(acquired.elapsed);
        entry.source = Some(acquired.source().to_string());
        if acquired.schema.has_drift() {
            entry.details = Some(format!(
                "schema drift: unknown={:?} missing={:?}",
                acquired.schema.unknown_fields, acquired.schema.missing_fields
            ));
        }
        self.log.record(&entry);

        if let Some(failure) = &acquired.failure {
            self.stats.fallbacks += 1;
            let mut entry = LogEntry::new(EventType::FallbackEngaged, Severity::Warning)
                .with_details(failure.to_string());
            entry.source = Some(acquired.source().to_string());
            entry.status = failure.status();
            self.log.record(&entry);
        }

        self.last_applied_seq = Some(seq);
        self.descriptors = derive_with(&acquired.snapshot, &self.formatter);
        self.latest.insert(acquired)
    }

    fn after_selection(&mut self, before: View, outcome: Result<View>) -> Result<View> {
        match outcome {
            Ok(view) => {
                self.record_transition(before, view);
                Ok(view)
            }
            Err(err) => {
                self.stats.rejected_selections += 1;
                let mut entry = LogEntry::new(EventType::ViewRejected, Severity::Warning)
                    .with_view(before.id())
                    .with_error(&err);
                if let DashError::InvalidView { requested } = &err {
                    entry.details = Some(format!("requested={requested}"));
                }
                self.log.record(&entry);
                Err(err)
            }
        }
    }

    fn record_transition(&mut self, before: View, after: View) {
        if before != after {
            self.stats.view_changes += 1;
        }
        self.log.record(
            &LogEntry::new(EventType::ViewSelected, Severity::Info)
                .with_view(after.id())
                .with_details(format!("from={}", before.id())),
        );
        if let Some(acquired) = &self.latest {
            self.descriptors = derive_with(&acquired.snapshot, &self.formatter);
        }
    }
}

impl<T> Drop for DashboardSession<T> {
    fn drop(&mut self) {
        if !self.log.is_enabled() {
            return;
        }
        let details = serde_json::to_string(&self.stats).unwrap_or_default();
        self.log.record(
            &LogEntry::new(EventType::SessionEnd, Severity::Info)
                .with_view(self.views.active().id())
                .with_details(details),
        );
    }
}
