//! Job status poller
//!
//! Keeps the local view of the user's translation jobs in sync with the
//! backend. The backend is authoritative: every successful fetch replaces the
//! whole list, a failed fetch leaves it untouched. A recurring timer re-fetches
//! only while at least one job is still pending or processing.
//!
//! The poller runs as a single task that is the only writer of the job list.
//! Readers get immutable snapshots through a watch channel.

use anyhow::anyhow;
use std::collections::HashSet;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::{AbortHandle, JoinHandle};
use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};
use transdoc_client::TranslationApi;
use transdoc_core::domain::job::TranslationJob;
use transdoc_core::domain::user::User;

/// Default delay between refreshes while jobs are active
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

const COMMAND_BUFFER: usize = 32;

/// Whether any job can still change on the backend
pub fn has_active_jobs(jobs: &[TranslationJob]) -> bool {
    jobs.iter().any(TranslationJob::is_active)
}

/// Read-only view of the poller state handed to renderers
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobListSnapshot {
    /// Jobs, newest first
    pub jobs: Vec<TranslationJob>,
    /// A blocking (full-page) load is in progress
    pub loading: bool,
    /// A background refresh is in progress; manual refresh is disabled
    pub refreshing: bool,
    /// The recurring timer is armed
    pub polling: bool,
    /// Message of the last failed refresh, cleared by the next success
    pub last_error: Option<String>,
    /// Number of refreshes that finished (successfully or not) for this identity
    pub completed_refreshes: u64,
}

impl JobListSnapshot {
    pub fn has_active_jobs(&self) -> bool {
        has_active_jobs(&self.jobs)
    }

    /// A refresh of either kind is in flight
    pub fn is_busy(&self) -> bool {
        self.loading || self.refreshing
    }
}

/// Inputs to the poller task
#[derive(Debug)]
pub enum PollerCommand {
    /// Manual refresh, ignored while another refresh is in flight
    Refresh { show_blocking_indicator: bool },
    /// The job set may have changed out-of-band (e.g. a new upload)
    JobsChanged,
    /// The signed-in identity changed; `None` means signed out
    IdentityChanged(Option<User>),
    Shutdown,
}

struct FetchOutcome {
    epoch: u64,
    result: anyhow::Result<Vec<TranslationJob>>,
}

/// Polls the backend for the current identity's jobs
pub struct JobStatusPoller {
    api: Arc<dyn TranslationApi>,
    interval: Duration,
    identity: Option<User>,
    jobs: Vec<TranslationJob>,

    /// Bumped whenever in-flight results must be discarded
    epoch: u64,
    in_flight: Option<AbortHandle>,
    refresh_queued: bool,
    loading: bool,
    refreshing: bool,
    last_error: Option<String>,
    completed_refreshes: u64,

    ticker: Option<Interval>,
    outcome_tx: mpsc::UnboundedSender<FetchOutcome>,
    outcome_rx: mpsc::UnboundedReceiver<FetchOutcome>,
    snapshot_tx: watch::Sender<JobListSnapshot>,
}

impl JobStatusPoller {
    /// Creates a poller for `identity`; nothing is fetched until a command arrives
    pub fn new(api: Arc<dyn TranslationApi>, interval: Duration, identity: Option<User>) -> Self {
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, _) = watch::channel(JobListSnapshot::default());

        Self {
            api,
            interval,
            identity,
            jobs: Vec::new(),
            epoch: 0,
            in_flight: None,
            refresh_queued: false,
            loading: false,
            refreshing: false,
            last_error: None,
            completed_refreshes: 0,
            ticker: None,
            outcome_tx,
            outcome_rx,
            snapshot_tx,
        }
    }

    /// Moves the poller onto its own task
    pub fn spawn(self) -> PollerHandle {
        let (commands, receiver) = mpsc::channel(COMMAND_BUFFER);
        let snapshots = self.snapshot_tx.subscribe();
        tokio::spawn(self.run(receiver));

        PollerHandle {
            commands,
            snapshots,
        }
    }

    pub fn has_active_jobs(&self) -> bool {
        has_active_jobs(&self.jobs)
    }

    pub fn jobs(&self) -> &[TranslationJob] {
        &self.jobs
    }

    pub fn is_polling(&self) -> bool {
        self.ticker.is_some()
    }

    pub fn is_refreshing(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Runs until shut down or every handle is dropped
    pub async fn run(mut self, mut commands: mpsc::Receiver<PollerCommand>) {
        info!("Starting job status poller (interval: {:?})", self.interval);

        loop {
            tokio::select! {
                command = commands.recv() => {
                    let Some(command) = command else { break };
                    if self.handle_command(command).is_break() {
                        break;
                    }
                }
                Some(outcome) = self.outcome_rx.recv() => self.apply_outcome(outcome),
                _ = next_tick(&mut self.ticker) => self.on_tick(),
            }
        }

        self.reset();
        self.publish();
        info!("Job status poller stopped");
    }

    fn handle_command(&mut self, command: PollerCommand) -> ControlFlow<()> {
        match command {
            PollerCommand::Refresh {
                show_blocking_indicator,
            } => {
                if self.is_refreshing() {
                    debug!("Refresh already in flight, ignoring manual refresh");
                } else {
                    self.start_refresh(show_blocking_indicator);
                }
            }
            PollerCommand::JobsChanged => {
                if self.is_refreshing() {
                    debug!("Refresh in flight, queueing follow-up refresh");
                    self.refresh_queued = true;
                } else {
                    self.start_refresh(true);
                }
            }
            PollerCommand::IdentityChanged(user) => self.on_identity_changed(user),
            PollerCommand::Shutdown => return ControlFlow::Break(()),
        }

        ControlFlow::Continue(())
    }

    /// Starts one fetch of the full job list
    ///
    /// Returns `false` when there is no identity to fetch for.
    fn start_refresh(&mut self, show_blocking_indicator: bool) -> bool {
        if self.identity.is_none() {
            debug!("No signed-in user, skipping refresh");
            return false;
        }

        if show_blocking_indicator {
            self.loading = true;
        } else {
            self.refreshing = true;
        }

        let api = Arc::clone(&self.api);
        let outcomes = self.outcome_tx.clone();
        let epoch = self.epoch;

        let fetch = tokio::spawn(async move { api.list_translations().await });
        self.in_flight = Some(fetch.abort_handle());

        // A fetch that dies without an answer still has to end the refresh
        tokio::spawn(async move {
            let result = match fetch.await {
                Ok(result) => result.map_err(anyhow::Error::from),
                Err(e) if e.is_cancelled() => return,
                Err(e) => Err(anyhow!("Job list fetch aborted: {}", e)),
            };
            // The receiver lives as long as the poller
            let _ = outcomes.send(FetchOutcome { epoch, result });
        });

        self.publish();
        true
    }

    /// Applies a finished fetch, unless it belongs to a cancelled epoch
    fn apply_outcome(&mut self, outcome: FetchOutcome) {
        if outcome.epoch != self.epoch {
            debug!(
                "Discarding stale job list (epoch {}, current {})",
                outcome.epoch, self.epoch
            );
            return;
        }

        self.in_flight = None;
        self.loading = false;
        self.refreshing = false;
        self.completed_refreshes += 1;

        match outcome.result {
            Ok(fetched) => {
                self.jobs = order_jobs(&self.jobs, fetched);
                self.last_error = None;
                debug!("Loaded {} translation job(s)", self.jobs.len());

                let active = self.has_active_jobs();
                self.on_active_jobs_changed(active);
            }
            Err(e) => {
                error!("Failed to load translations: {}", e);
                self.last_error = Some(e.to_string());
            }
        }

        if std::mem::take(&mut self.refresh_queued) {
            self.start_refresh(true);
        }

        self.publish();
    }

    /// Arms or cancels the recurring timer
    pub fn on_active_jobs_changed(&mut self, active: bool) {
        match (active, self.ticker.is_some()) {
            (true, false) => {
                let mut ticker = time::interval_at(Instant::now() + self.interval, self.interval);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                self.ticker = Some(ticker);
                info!("Active jobs detected, polling every {:?}", self.interval);
            }
            (false, true) => {
                self.ticker = None;
                info!("No active jobs, polling stopped");
            }
            _ => {}
        }
    }

    fn on_tick(&mut self) {
        if self.is_refreshing() {
            debug!("Previous refresh still in flight, skipping tick");
            return;
        }

        debug!("Polling for translation updates");
        self.start_refresh(false);
    }

    fn on_identity_changed(&mut self, user: Option<User>) {
        if self.identity == user {
            return;
        }

        match &user {
            Some(user) => info!("Loading translations for {}", user.email),
            None => info!("Signed out, clearing translations"),
        }

        self.identity = user;
        self.reset();

        if self.identity.is_some() {
            self.start_refresh(true);
        }
        self.publish();
    }

    /// Cancels the timer and any in-flight fetch, and clears local state
    fn reset(&mut self) {
        self.epoch += 1;
        if let Some(handle) = self.in_flight.take() {
            handle.abort();
        }
        self.ticker = None;
        self.jobs.clear();
        self.refresh_queued = false;
        self.loading = false;
        self.refreshing = false;
        self.last_error = None;
        self.completed_refreshes = 0;
    }

    fn snapshot(&self) -> JobListSnapshot {
        JobListSnapshot {
            jobs: self.jobs.clone(),
            loading: self.loading,
            refreshing: self.refreshing,
            polling: self.is_polling(),
            last_error: self.last_error.clone(),
            completed_refreshes: self.completed_refreshes,
        }
    }

    fn publish(&self) {
        let snapshot = self.snapshot();
        self.snapshot_tx.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

/// Puts a fetched list into display order: newest first, one entry per id
///
/// The sort is stable, so jobs created at the same instant keep the
/// backend's order. Status regressions against `previous` are only logged;
/// the backend stays authoritative.
pub fn order_jobs(previous: &[TranslationJob], fetched: Vec<TranslationJob>) -> Vec<TranslationJob> {
    let mut seen = HashSet::with_capacity(fetched.len());
    let mut jobs: Vec<TranslationJob> = fetched
        .into_iter()
        .filter(|job| {
            let first = seen.insert(job.id.clone());
            if !first {
                warn!("Backend returned job {} more than once, keeping the first", job.id);
            }
            first
        })
        .collect();

    jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    for job in &jobs {
        if let Some(old) = previous.iter().find(|old| old.id == job.id) {
            if !old.status.can_transition_to(job.status) {
                warn!(
                    "Job {} went from {} back to {}",
                    job.id, old.status, job.status
                );
            }
        }
    }

    jobs
}

/// Cloneable handle to a spawned poller
#[derive(Clone)]
pub struct PollerHandle {
    commands: mpsc::Sender<PollerCommand>,
    snapshots: watch::Receiver<JobListSnapshot>,
}

impl PollerHandle {
    async fn send(&self, command: PollerCommand) {
        if let Err(e) = self.commands.send(command).await {
            warn!("Job status poller is not running, dropped {:?}", e.0);
        }
    }

    /// Manual refresh with the lightweight indicator
    pub async fn refresh(&self) {
        self.send(PollerCommand::Refresh {
            show_blocking_indicator: false,
        })
        .await;
    }

    /// Signals that the job set may have changed
    pub async fn jobs_changed(&self) {
        self.send(PollerCommand::JobsChanged).await;
    }

    pub async fn identity_changed(&self, user: Option<User>) {
        self.send(PollerCommand::IdentityChanged(user)).await;
    }

    pub async fn shutdown(&self) {
        self.send(PollerCommand::Shutdown).await;
    }

    pub fn snapshot(&self) -> JobListSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<JobListSnapshot> {
        self.snapshots.clone()
    }

    /// Forwards every identity change from a session to the poller
    pub fn follow_identity(&self, mut identity: watch::Receiver<Option<User>>) -> JoinHandle<()> {
        let handle = self.clone();
        tokio::spawn(async move {
            while identity.changed().await.is_ok() {
                let user = identity.borrow_and_update().clone();
                handle.identity_changed(user).await;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeApi, job, user};
    use transdoc_core::domain::job::JobStatus;

    const INTERVAL: Duration = Duration::from_secs(3);

    fn poller(api: &Arc<FakeApi>) -> JobStatusPoller {
        JobStatusPoller::new(api.clone(), INTERVAL, Some(user("user-1")))
    }

    /// Runs one refresh to completion without the command loop
    async fn refresh(poller: &mut JobStatusPoller, show_blocking_indicator: bool) {
        if !poller.start_refresh(show_blocking_indicator) {
            return;
        }
        while poller.is_refreshing() {
            match poller.outcome_rx.recv().await {
                Some(outcome) => poller.apply_outcome(outcome),
                None => break,
            }
        }
    }

    #[test]
    fn test_has_active_jobs() {
        assert!(!has_active_jobs(&[]));
        assert!(has_active_jobs(&[job("a", JobStatus::Pending, 0)]));
        assert!(has_active_jobs(&[job("a", JobStatus::Processing, 0)]));
        assert!(!has_active_jobs(&[
            job("a", JobStatus::Completed, 0),
            job("b", JobStatus::Failed, 1),
        ]));
        assert!(has_active_jobs(&[
            job("a", JobStatus::Completed, 0),
            job("b", JobStatus::Processing, 1),
        ]));
    }

    #[test]
    fn test_order_jobs_newest_first_and_unique() {
        let fetched = vec![
            job("old", JobStatus::Completed, 0),
            job("new", JobStatus::Pending, 10),
            job("old", JobStatus::Failed, 0),
            job("mid", JobStatus::Processing, 5),
        ];

        let ordered = order_jobs(&[], fetched);
        let ids: Vec<_> = ordered.iter().map(|j| j.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "mid", "old"]);
        assert_eq!(ordered[2].status, JobStatus::Completed);
    }

    #[test]
    fn test_order_jobs_is_stable_for_equal_timestamps() {
        let fetched = vec![
            job("b", JobStatus::Pending, 3),
            job("a", JobStatus::Pending, 3),
        ];
        let ids: Vec<_> = order_jobs(&[], fetched)
            .into_iter()
            .map(|j| j.id.to_string())
            .collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[tokio::test]
    async fn test_refresh_replaces_list_wholesale() {
        let api = Arc::new(FakeApi::new());
        api.push_jobs(vec![
            job("a", JobStatus::Processing, 2),
            job("b", JobStatus::Completed, 1),
        ]);
        api.push_jobs(vec![job("c", JobStatus::Completed, 3)]);
        let mut poller = poller(&api);

        refresh(&mut poller, true).await;
        assert_eq!(poller.jobs().len(), 2);

        refresh(&mut poller, false).await;
        assert_eq!(poller.jobs(), &[job("c", JobStatus::Completed, 3)]);
        assert_eq!(api.list_calls(), 2);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_list() {
        let api = Arc::new(FakeApi::new());
        let jobs = vec![job("a", JobStatus::Processing, 0)];
        api.push_jobs(jobs.clone()).push_error(503);
        let mut poller = poller(&api);

        refresh(&mut poller, true).await;
        refresh(&mut poller, false).await;

        assert_eq!(poller.jobs(), jobs.as_slice());
        assert!(poller.is_polling());
        let snapshot = poller.snapshot();
        assert!(snapshot.last_error.unwrap().contains("503"));
        assert!(!snapshot.loading);
        assert!(!snapshot.refreshing);
    }

    #[tokio::test]
    async fn test_timer_follows_active_jobs() {
        let api = Arc::new(FakeApi::new());
        api.push_jobs(vec![job("1", JobStatus::Processing, 0)]);
        api.push_jobs(vec![job("1", JobStatus::Completed, 0)]);
        let mut poller = poller(&api);
        assert!(!poller.is_polling());

        refresh(&mut poller, true).await;
        assert!(poller.has_active_jobs());
        assert!(poller.is_polling());

        refresh(&mut poller, false).await;
        assert!(!poller.has_active_jobs());
        assert!(!poller.is_polling());
    }

    #[tokio::test]
    async fn test_empty_list_never_polls() {
        let api = Arc::new(FakeApi::new());
        api.push_jobs(vec![]);
        let mut poller = poller(&api);

        refresh(&mut poller, true).await;
        assert!(!poller.has_active_jobs());
        assert!(!poller.is_polling());
    }

    #[tokio::test]
    async fn test_no_identity_never_fetches() {
        let api = Arc::new(FakeApi::new());
        let mut poller = JobStatusPoller::new(api.clone(), INTERVAL, None);

        refresh(&mut poller, true).await;
        assert_eq!(api.list_calls(), 0);
        assert!(poller.jobs().is_empty());
    }

    #[tokio::test]
    async fn test_stale_outcome_is_discarded() {
        let api = Arc::new(FakeApi::new());
        api.push_jobs(vec![job("a", JobStatus::Processing, 0)]);
        let mut poller = poller(&api);
        refresh(&mut poller, true).await;

        poller.on_identity_changed(None);
        poller.apply_outcome(FetchOutcome {
            epoch: poller.epoch - 1,
            result: Ok(vec![job("ghost", JobStatus::Pending, 0)]),
        });

        assert!(poller.jobs().is_empty());
        assert!(!poller.is_polling());
    }

    #[tokio::test(start_paused = true)]
    async fn test_polling_stops_once_jobs_are_terminal() {
        let api = Arc::new(FakeApi::new());
        api.push_jobs(vec![job("1", JobStatus::Processing, 0)]);
        api.push_jobs(vec![job("1", JobStatus::Completed, 0)]);
        let handle = poller(&api).spawn();

        handle.jobs_changed().await;
        time::sleep(Duration::from_secs(1)).await;
        assert_eq!(api.list_calls(), 1);
        assert!(handle.snapshot().polling);

        time::sleep(Duration::from_secs(20)).await;
        assert_eq!(api.list_calls(), 2);

        let snapshot = handle.snapshot();
        assert!(!snapshot.polling);
        assert_eq!(snapshot.jobs[0].status, JobStatus::Completed);
        assert!(snapshot.jobs[0].completed_at.is_some());

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_polling_repeats_while_active() {
        let api = Arc::new(FakeApi::new());
        api.push_jobs(vec![job("1", JobStatus::Pending, 0)]);
        let handle = poller(&api).spawn();

        handle.jobs_changed().await;
        time::sleep(Duration::from_millis(10)).await;
        time::sleep(INTERVAL * 3).await;

        assert_eq!(api.list_calls(), 4);
        assert!(handle.snapshot().polling);
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_sign_out_cancels_polling_and_clears() {
        let api = Arc::new(FakeApi::new());
        api.push_jobs(vec![job("1", JobStatus::Processing, 0)]);
        let handle = poller(&api).spawn();

        handle.jobs_changed().await;
        time::sleep(Duration::from_secs(1)).await;
        assert_eq!(handle.snapshot().jobs.len(), 1);

        handle.identity_changed(None).await;
        time::sleep(Duration::from_secs(1)).await;
        let snapshot = handle.snapshot();
        assert!(snapshot.jobs.is_empty());
        assert!(!snapshot.polling);

        time::sleep(Duration::from_secs(30)).await;
        assert_eq!(api.list_calls(), 1);
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_sign_out_discards_in_flight_fetch() {
        let api = Arc::new(FakeApi::new());
        api.push_jobs(vec![job("1", JobStatus::Processing, 0)]);
        api.set_list_delay(Duration::from_secs(2));
        let handle = poller(&api).spawn();

        handle.jobs_changed().await;
        time::sleep(Duration::from_secs(1)).await;
        assert!(handle.snapshot().loading);

        handle.identity_changed(None).await;
        time::sleep(Duration::from_secs(5)).await;

        let snapshot = handle.snapshot();
        assert!(snapshot.jobs.is_empty());
        assert!(!snapshot.loading);
        assert!(!snapshot.polling);
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_crashed_fetch_does_not_block_later_refreshes() {
        let api = Arc::new(FakeApi::new());
        api.push_jobs(vec![job("1", JobStatus::Completed, 0)]);
        api.panic_next_list();
        let handle = poller(&api).spawn();

        handle.refresh().await;
        time::sleep(Duration::from_millis(100)).await;
        let snapshot = handle.snapshot();
        assert!(!snapshot.is_busy());
        assert!(snapshot.last_error.is_some());
        assert_eq!(snapshot.completed_refreshes, 1);

        handle.refresh().await;
        time::sleep(Duration::from_millis(100)).await;
        let snapshot = handle.snapshot();
        assert_eq!(api.list_calls(), 2);
        assert_eq!(snapshot.jobs.len(), 1);
        assert!(snapshot.last_error.is_none());
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_refresh_suppressed_while_in_flight() {
        let api = Arc::new(FakeApi::new());
        api.push_jobs(vec![job("1", JobStatus::Completed, 0)]);
        api.set_list_delay(Duration::from_secs(2));
        let handle = poller(&api).spawn();

        handle.refresh().await;
        time::sleep(Duration::from_millis(100)).await;
        assert!(handle.snapshot().refreshing);
        handle.refresh().await;
        handle.refresh().await;

        time::sleep(Duration::from_secs(5)).await;
        assert_eq!(api.list_calls(), 1);
        assert!(!handle.snapshot().refreshing);
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_jobs_changed_during_flight_queues_one_refresh() {
        let api = Arc::new(FakeApi::new());
        api.push_jobs(vec![]);
        api.push_jobs(vec![job("new", JobStatus::Pending, 1)]);
        api.set_list_delay(Duration::from_secs(1));
        let handle = poller(&api).spawn();

        handle.jobs_changed().await;
        time::sleep(Duration::from_millis(100)).await;
        handle.jobs_changed().await;
        handle.jobs_changed().await;

        time::sleep(Duration::from_millis(2500)).await;
        assert_eq!(api.list_calls(), 2);
        assert_eq!(handle.snapshot().jobs.len(), 1);
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_follow_identity_forwards_changes() {
        let api = Arc::new(FakeApi::new());
        api.push_jobs(vec![job("1", JobStatus::Completed, 0)]);
        let handle = JobStatusPoller::new(api.clone(), INTERVAL, None).spawn();
        let (identity_tx, identity_rx) = watch::channel(None);
        let forwarder = handle.follow_identity(identity_rx);

        identity_tx.send_replace(Some(user("user-1")));
        time::sleep(Duration::from_millis(100)).await;
        assert_eq!(api.list_calls(), 1);
        assert_eq!(handle.snapshot().jobs.len(), 1);

        identity_tx.send_replace(None);
        time::sleep(Duration::from_millis(100)).await;
        assert!(handle.snapshot().jobs.is_empty());

        forwarder.abort();
        handle.shutdown().await;
    }
}
