// ── Portal abstraction ──
//
// Ties the reward subsystem together: quota, selector, dispatcher, the
// free-window monitor, and the external collaborators. Delayed steps run
// as tracked tokio tasks under one cancellation token, so `shutdown()`
// can stop every pending continuation before the final snapshot is saved.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError};
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::{Mutex, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::clock::{Clock, SystemClock};
use crate::collaborator::{Authenticator, Notifier, Severity, TracingNotifier};
use crate::config::PortalConfig;
use crate::dispatch::{Credential, DispatchAction, RewardDispatcher};
use crate::error::CoreError;
use crate::ledger::{Ledger, LedgerKey, LedgerKeys};
use crate::model::{
    FeatureState, PortalStatus, PrizeEntry, SpinFailure, SpinOutcome, WinRecord,
};
use crate::quota::QuotaManager;
use crate::selector::select_prize;
use crate::session::{SpinAttempt, SpinPhase, SpinSession};
use crate::window::{FreeWindowMonitor, is_within_free_window};

const WINNER_CONNECTING: &str = "Spin winner connecting...";
const FREE_CONNECTING: &str = "Connecting to Free WiFi...";
const AUTH_NOT_READY: &str = "Error: Authentication system not ready. Please try direct login.";
const REWARD_NOT_CONNECTED: &str = "Error connecting spin reward. Please contact support.";

// ── Builder ──────────────────────────────────────────────────────

/// Assembles a [`Portal`]. Only the configuration and the ledger are
/// required; everything else has a default.
pub struct PortalBuilder {
    config: PortalConfig,
    ledger: Arc<dyn Ledger>,
    clock: Arc<dyn Clock>,
    authenticator: Option<Arc<dyn Authenticator>>,
    notifier: Arc<dyn Notifier>,
    seed: Option<u64>,
}

impl PortalBuilder {
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn authenticator(mut self, authenticator: Arc<dyn Authenticator>) -> Self {
        self.authenticator = Some(authenticator);
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Seed the prize draw for reproducible results.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn build(self) -> Portal {
        let config = self.config;
        let keys = LedgerKeys::with_prefix(config.key_prefix.clone());

        let quota = QuotaManager::new(
            Arc::clone(&self.ledger),
            keys.clone(),
            Arc::clone(&self.clock),
            config.daily_allowance,
        );
        let dispatcher = RewardDispatcher::new(
            Arc::clone(&self.ledger),
            keys.clone(),
            Arc::clone(&self.clock),
            config.credentials.clone(),
            config.history_cap,
        );
        let window = Arc::new(FreeWindowMonitor::new(
            config.schedule.clone(),
            Arc::clone(&self.clock),
            config.timing.window_poll_interval,
        ));
        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Portal {
            inner: Arc::new(PortalInner {
                config,
                keys,
                ledger: self.ledger,
                clock: self.clock,
                quota,
                dispatcher,
                window,
                session: Arc::new(SpinSession::new()),
                rng: std::sync::Mutex::new(rng),
                authenticator: self.authenticator,
                notifier: self.notifier,
                cancel: CancellationToken::new(),
                continuations: TaskTracker::new(),
                task_handles: Mutex::new(Vec::new()),
                started: AtomicBool::new(false),
            }),
        }
    }
}

// ── Portal ───────────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<PortalInner>`. Methods that schedule work
/// (`spin`, `connect_free`, `open_advert`, `start`) must be called from
/// within a tokio runtime.
#[derive(Clone)]
pub struct Portal {
    inner: Arc<PortalInner>,
}

struct PortalInner {
    config: PortalConfig,
    keys: LedgerKeys,
    ledger: Arc<dyn Ledger>,
    clock: Arc<dyn Clock>,
    quota: QuotaManager,
    dispatcher: RewardDispatcher,
    window: Arc<FreeWindowMonitor>,
    session: Arc<SpinSession>,
    rng: std::sync::Mutex<StdRng>,
    authenticator: Option<Arc<dyn Authenticator>>,
    notifier: Arc<dyn Notifier>,
    cancel: CancellationToken,
    continuations: TaskTracker,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
    started: AtomicBool,
}

impl Portal {
    pub fn builder(config: PortalConfig, ledger: Arc<dyn Ledger>) -> PortalBuilder {
        PortalBuilder {
            config,
            ledger,
            clock: Arc::new(SystemClock),
            authenticator: None,
            notifier: Arc::new(TracingNotifier),
            seed: None,
        }
    }

    pub fn config(&self) -> &PortalConfig {
        &self.inner.config
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Evaluate the free window, log the last saved snapshot, and spawn
    /// the background tasks (window polling, periodic snapshot).
    ///
    /// Shutdown is final: a portal that has been shut down stays down.
    pub async fn start(&self) {
        if self.is_shut_down() {
            warn!("portal was shut down; not restarting");
            return;
        }
        if self.inner.started.swap(true, Ordering::AcqRel) {
            debug!("portal already started");
            return;
        }

        if let Some(state) = self.load_feature_state() {
            debug!(
                last_update = %state.last_update,
                spins_remaining = state.spins_remaining,
                free_window = state.free_window_open,
                "previous feature state"
            );
        }
        let open = self.inner.window.check();

        let timing = self.inner.config.timing;
        let mut handles = self.inner.task_handles.lock().await;

        if !timing.window_poll_interval.is_zero() {
            let monitor = Arc::clone(&self.inner.window);
            let cancel = self.inner.cancel.clone();
            handles.push(tokio::spawn(monitor.run(cancel)));
        }

        if !timing.snapshot_interval.is_zero() {
            let portal = self.clone();
            let cancel = self.inner.cancel.clone();
            handles.push(tokio::spawn(snapshot_task(
                portal,
                timing.snapshot_interval,
                cancel,
            )));
        }

        info!(
            spins_remaining = self.remaining_spins(),
            free_window = open,
            "portal started"
        );
    }

    /// Cancel pending continuations, stop background tasks, and write a
    /// final feature-state snapshot. Later spins and free-window logins
    /// fail with [`CoreError::PortalShutDown`].
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }

        self.inner.continuations.close();
        self.inner.continuations.wait().await;

        if let Err(e) = self.save_feature_state() {
            warn!(error = %e, "final snapshot failed (non-fatal)");
        }
        self.inner.started.store(false, Ordering::Release);
        debug!("portal shut down");
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }

    /// Wait for every pending continuation (result reveal, delayed
    /// logins, redirects) to run to completion.
    pub async fn settle(&self) {
        self.inner.continuations.close();
        self.inner.continuations.wait().await;
        self.inner.continuations.reopen();
    }

    // ── Spinning ─────────────────────────────────────────────────

    /// Request a spin.
    ///
    /// Rejected with [`CoreError::ConcurrentSpinRejected`] while another
    /// spin is in flight; the "Spin In Progress" result is still shown.
    /// Fails with [`CoreError::PortalShutDown`] after shutdown, before any
    /// spin is spent. Otherwise a quota check runs immediately: with
    /// no spins left the handle resolves at once to a "No Spins Left"
    /// outcome. With a spin consumed the prize is drawn now and revealed
    /// after the configured delay.
    pub fn spin(&self) -> Result<SpinHandle, CoreError> {
        if self.is_shut_down() {
            return Err(CoreError::PortalShutDown);
        }
        let attempt = self.inner.session.begin().inspect_err(|e| {
            warn!(error = %e, "spin rejected");
            let outcome = SpinOutcome::failed(SpinFailure::SpinInProgress, None);
            self.inner.notifier.show_spin_result(&outcome);
        })?;

        if !self.inner.quota.consume_spin() {
            attempt.finish_denied();
            let outcome = SpinOutcome::failed(SpinFailure::NoSpinsLeft, None);
            self.inner.notifier.show_spin_result(&outcome);
            info!("spin denied, no spins left today");
            return Ok(SpinHandle::ready(outcome));
        }

        attempt.set_phase(SpinPhase::Drawing);
        let prize = {
            let mut rng = self.inner.rng.lock().unwrap_or_else(PoisonError::into_inner);
            select_prize(&self.inner.config.prizes, &mut *rng).clone()
        };
        info!(prize = %prize.name, weight = prize.weight, "prize drawn");

        let (tx, rx) = oneshot::channel();
        let portal = self.clone();
        let drawn = prize.clone();
        self.inner
            .continuations
            .spawn(async move { portal.reveal(attempt, drawn, tx).await });

        Ok(SpinHandle {
            prize: Some(prize),
            outcome: OutcomeSource::Pending(rx),
        })
    }

    /// Reveal the drawn prize and carry out its action.
    async fn reveal(&self, attempt: SpinAttempt, prize: PrizeEntry, tx: oneshot::Sender<SpinOutcome>) {
        let timing = self.inner.config.timing;
        if !self.pause(timing.reveal_delay).await {
            debug!(prize = %prize.name, "spin cancelled before reveal");
            return;
        }

        attempt.set_phase(SpinPhase::Resolved);
        self.inner.dispatcher.record_win(&prize);

        match self.inner.dispatcher.resolve_prize(&prize) {
            Ok(DispatchAction::Notify { .. }) => {
                let outcome = SpinOutcome::for_prize(&prize);
                self.inner.notifier.show_spin_result(&outcome);
                attempt.finish();
                let _ = tx.send(outcome);
            }
            Ok(DispatchAction::BonusGrant) => {
                let mut outcome = SpinOutcome::for_prize(&prize);
                match self.inner.quota.grant_bonus_spin() {
                    Ok(_) => attempt.release_for_respin(),
                    Err(e) => {
                        error!(error = %e, "bonus spin could not be granted");
                        outcome.respin_available = false;
                        attempt.finish();
                    }
                }
                self.inner.notifier.show_spin_result(&outcome);
                let _ = tx.send(outcome);
            }
            Ok(DispatchAction::GrantSession { credential_key }) => {
                let outcome = SpinOutcome::for_prize(&prize);
                self.inner.notifier.show_spin_result(&outcome);
                attempt.set_phase(SpinPhase::AwaitingExternalAuth);
                let _ = tx.send(outcome);

                self.connect_winner(&credential_key).await;
                attempt.finish();
            }
            Err(e) => {
                warn!(error = %e, prize = %prize.name, "reward could not be dispatched");
                let outcome = SpinOutcome::failed(SpinFailure::UnknownRewardTag, Some(prize));
                self.inner.notifier.show_spin_result(&outcome);
                self.inner
                    .notifier
                    .show_main_message(REWARD_NOT_CONNECTED, Severity::Alert);
                attempt.finish();
                let _ = tx.send(outcome);
            }
        }
    }

    /// Let the result sink in, then log the winner in.
    async fn connect_winner(&self, credential_key: &str) {
        let timing = self.inner.config.timing;
        if !self.pause(timing.result_hold).await {
            return;
        }

        self.inner.notifier.show_connecting_overlay();
        self.inner
            .notifier
            .show_main_message(WINNER_CONNECTING, Severity::Success);

        if !self.pause(timing.auth_delay).await {
            return;
        }

        // resolve_prize already checked the key exists.
        if let Some(credential) = self.inner.dispatcher.credential(credential_key) {
            if let Err(e) = self.authenticate(credential) {
                warn!(error = %e, tag = credential_key, "won session not started");
            }
        }
    }

    // ── Free window & advert ─────────────────────────────────────

    /// Log in with the free-window credentials.
    ///
    /// Fails with [`CoreError::FreeWindowClosed`] outside the window, with
    /// no side effects. Inside it, the connecting overlay is shown and the
    /// login follows after the configured delay.
    pub fn connect_free(&self) -> Result<(), CoreError> {
        if self.is_shut_down() {
            return Err(CoreError::PortalShutDown);
        }
        if !self.inner.window.check() {
            return Err(CoreError::FreeWindowClosed);
        }
        let Some(credential) = self.inner.config.free_window_credential.clone() else {
            return Err(CoreError::Config {
                message: "no free window credential configured".into(),
            });
        };

        info!(username = %credential.username, "free window connection attempt");
        self.inner.notifier.show_connecting_overlay();
        self.inner
            .notifier
            .show_main_message(FREE_CONNECTING, Severity::Success);

        let portal = self.clone();
        self.inner.continuations.spawn(async move {
            if !portal.pause(portal.inner.config.timing.free_connect_delay).await {
                return;
            }
            if let Err(e) = portal.authenticate(&credential) {
                warn!(error = %e, "free window session not started");
            }
        });
        Ok(())
    }

    /// Redirect to the advertiser's page after the configured delay.
    /// Returns the URL, or `None` when no advert is configured.
    pub fn open_advert(&self) -> Option<Url> {
        let Some(url) = self.inner.config.advert_url.clone() else {
            warn!("no advert URL configured");
            return None;
        };

        info!(%url, "redirecting to advert");
        let portal = self.clone();
        let target = url.clone();
        self.inner.continuations.spawn(async move {
            if portal.pause(portal.inner.config.timing.advert_delay).await {
                portal.inner.notifier.open_external(&target);
            }
        });
        Some(url)
    }

    // ── Queries ──────────────────────────────────────────────────

    pub fn remaining_spins(&self) -> u32 {
        self.inner.quota.remaining_spins()
    }

    pub fn win_history(&self) -> Vec<WinRecord> {
        self.inner.dispatcher.history()
    }

    pub fn total_spins(&self) -> u64 {
        self.inner.dispatcher.total_spins()
    }

    /// Whether the free window is open right now.
    pub fn free_window_open(&self) -> bool {
        is_within_free_window(self.inner.clock.now(), &self.inner.config.schedule)
    }

    pub fn phase(&self) -> SpinPhase {
        self.inner.session.phase()
    }

    pub fn subscribe_phase(&self) -> watch::Receiver<SpinPhase> {
        self.inner.session.subscribe()
    }

    /// Free-window transitions as seen by the background monitor.
    pub fn subscribe_free_window(&self) -> watch::Receiver<bool> {
        self.inner.window.subscribe()
    }

    pub fn status(&self) -> PortalStatus {
        let now = self.inner.clock.now();
        PortalStatus {
            initialized: self.inner.started.load(Ordering::Acquire),
            spins_remaining: self.remaining_spins(),
            free_window_open: is_within_free_window(now, &self.inner.config.schedule),
            total_spins: self.total_spins(),
            history_len: self.win_history().len(),
            next_free_window: self.inner.config.schedule.next_opening(now),
        }
    }

    // ── Snapshots & maintenance ──────────────────────────────────

    pub fn save_feature_state(&self) -> Result<(), CoreError> {
        let state = FeatureState {
            last_update: self.inner.clock.now(),
            spins_remaining: self.remaining_spins(),
            free_window_open: self.free_window_open(),
        };
        let json = serde_json::to_string(&state).map_err(CoreError::storage)?;
        self.inner
            .ledger
            .set(&self.inner.keys.name(LedgerKey::FeatureState), &json)?;
        debug!(spins_remaining = state.spins_remaining, "feature state saved");
        Ok(())
    }

    /// Last saved snapshot, if any and readable.
    pub fn load_feature_state(&self) -> Option<FeatureState> {
        let raw = match self
            .inner
            .ledger
            .get(&self.inner.keys.name(LedgerKey::FeatureState))
        {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(error = %e, "feature state unreadable");
                return None;
            }
        };
        serde_json::from_str(&raw)
            .inspect_err(|e| warn!(error = %e, "ignoring malformed feature state"))
            .ok()
    }

    /// Clear today's quota so the next read grants a full allowance.
    pub fn reset_daily_spins(&self) -> Result<(), CoreError> {
        self.inner.quota.reset()
    }

    // ── Helpers ──────────────────────────────────────────────────

    fn authenticate(&self, credential: &Credential) -> Result<(), CoreError> {
        let Some(authenticator) = &self.inner.authenticator else {
            error!("authentication collaborator not available");
            self.inner
                .notifier
                .show_main_message(AUTH_NOT_READY, Severity::Alert);
            return Err(CoreError::AuthenticatorUnavailable);
        };
        info!(username = %credential.username, "starting hotspot session");
        authenticator.perform_authentication(&credential.username, &credential.password);
        Ok(())
    }

    /// Sleep for `delay` unless the portal shuts down first. Returns
    /// `false` when cancelled.
    async fn pause(&self, delay: Duration) -> bool {
        let cancel = &self.inner.cancel;
        if delay.is_zero() {
            return !cancel.is_cancelled();
        }
        tokio::select! {
            biased;
            () = cancel.cancelled() => false,
            () = tokio::time::sleep(delay) => true,
        }
    }
}

impl std::fmt::Debug for Portal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Portal")
            .field("phase", &self.phase())
            .field("started", &self.inner.started.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

// ── SpinHandle ───────────────────────────────────────────────────

/// Result of a spin request that got past the concurrency check.
#[derive(Debug)]
pub struct SpinHandle {
    prize: Option<PrizeEntry>,
    outcome: OutcomeSource,
}

#[derive(Debug)]
enum OutcomeSource {
    Ready(SpinOutcome),
    Pending(oneshot::Receiver<SpinOutcome>),
}

impl SpinHandle {
    fn ready(outcome: SpinOutcome) -> Self {
        Self {
            prize: None,
            outcome: OutcomeSource::Ready(outcome),
        }
    }

    /// The drawn prize, known before it is revealed. `None` when denied.
    pub fn prize(&self) -> Option<&PrizeEntry> {
        self.prize.as_ref()
    }

    /// Wait for the reveal. A spin cut short by shutdown reports
    /// [`SpinFailure::Interrupted`].
    pub async fn outcome(self) -> SpinOutcome {
        match self.outcome {
            OutcomeSource::Ready(outcome) => outcome,
            OutcomeSource::Pending(rx) => rx
                .await
                .unwrap_or_else(|_| SpinOutcome::failed(SpinFailure::Interrupted, self.prize)),
        }
    }
}

// ── Background tasks ─────────────────────────────────────────────

/// Periodically persist the feature-state snapshot.
async fn snapshot_task(portal: Portal, every: Duration, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(every);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                if let Err(e) = portal.save_feature_state() {
                    warn!(error = %e, "periodic snapshot failed");
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex as StdMutex;

    use chrono::{NaiveDate, NaiveDateTime};
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    use super::*;
    use crate::clock::FixedClock;
    use crate::config::TimingConfig;
    use crate::dispatch::CredentialTable;
    use crate::ledger::MemoryLedger;
    use crate::model::{OutcomeKind, PrizeTable};

    #[derive(Default)]
    struct RecordingAuth {
        logins: StdMutex<Vec<(String, String)>>,
    }

    impl RecordingAuth {
        fn logins(&self) -> Vec<(String, String)> {
            self.logins.lock().unwrap().clone()
        }
    }

    impl Authenticator for RecordingAuth {
        fn perform_authentication(&self, username: &str, password: &secrecy::SecretString) {
            self.logins
                .lock()
                .unwrap()
                .push((username.to_owned(), password.expose_secret().to_owned()));
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        events: StdMutex<Vec<String>>,
    }

    impl RecordingNotifier {
        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }

        fn push(&self, event: String) {
            self.events.lock().unwrap().push(event);
        }
    }

    impl Notifier for RecordingNotifier {
        fn show_spin_result(&self, outcome: &SpinOutcome) {
            self.push(format!("result:{}", outcome.title));
        }
        fn show_connecting_overlay(&self) {
            self.push("overlay".into());
        }
        fn show_main_message(&self, text: &str, severity: Severity) {
            self.push(format!("{severity}:{text}"));
        }
        fn open_external(&self, url: &Url) {
            self.push(format!("open:{url}"));
        }
    }

    struct Fixture {
        portal: Portal,
        auth: Arc<RecordingAuth>,
        notifier: Arc<RecordingNotifier>,
        clock: Arc<FixedClock>,
        ledger: Arc<MemoryLedger>,
    }

    fn monday_noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn saturday_one_am() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 24)
            .unwrap()
            .and_hms_opt(1, 0, 0)
            .unwrap()
    }

    fn config_with(prizes: Vec<PrizeEntry>) -> PortalConfig {
        let mut credentials = CredentialTable::new();
        credentials.insert("3h", Credential::new("winner-3h", "pw3"));
        credentials.insert("data_1gb", Credential::new("winner-data", "pwd"));
        PortalConfig {
            prizes: PrizeTable::new(prizes).unwrap(),
            credentials,
            free_window_credential: Some(Credential::new("free", "pwf")),
            advert_url: Some("https://ads.example.com/".parse().unwrap()),
            timing: TimingConfig {
                snapshot_interval: Duration::ZERO,
                window_poll_interval: Duration::ZERO,
                ..TimingConfig::default()
            },
            ..PortalConfig::default()
        }
    }

    fn fixture(config: PortalConfig, with_auth: bool) -> Fixture {
        let auth = Arc::new(RecordingAuth::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let clock = Arc::new(FixedClock::new(monday_noon()));
        let ledger = Arc::new(MemoryLedger::new());
        let mut builder = Portal::builder(config, ledger.clone())
            .clock(clock.clone())
            .notifier(notifier.clone())
            .seed(7);
        if with_auth {
            builder = builder.authenticator(auth.clone());
        }
        Fixture {
            portal: builder.build(),
            auth,
            notifier,
            clock,
            ledger,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn time_grant_connects_after_reveal() {
        let f = fixture(config_with(vec![PrizeEntry::time("3 Hours", 1, "3h")]), true);

        let handle = f.portal.spin().unwrap();
        assert_eq!(handle.prize().unwrap().name, "3 Hours");
        assert_eq!(f.portal.phase(), SpinPhase::Drawing);

        let outcome = handle.outcome().await;
        assert_eq!(outcome.kind, OutcomeKind::Win);
        assert_eq!(outcome.title, "Congratulations!");
        assert_eq!(f.portal.phase(), SpinPhase::AwaitingExternalAuth);
        assert!(f.auth.logins().is_empty());

        f.portal.settle().await;
        assert_eq!(f.auth.logins(), [("winner-3h".to_owned(), "pw3".to_owned())]);
        assert_eq!(f.portal.phase(), SpinPhase::Idle);
        assert_eq!(
            f.notifier.events(),
            [
                "result:Congratulations!",
                "overlay",
                "success:Spin winner connecting...",
            ]
        );
        assert_eq!(f.portal.remaining_spins(), 1);
        assert_eq!(f.portal.total_spins(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_spin_is_rejected_without_spending() {
        let f = fixture(config_with(vec![PrizeEntry::neutral("Thanks", 1)]), true);

        let first = f.portal.spin().unwrap();
        let err = f.portal.spin().unwrap_err();
        assert!(matches!(
            err,
            CoreError::ConcurrentSpinRejected {
                phase: SpinPhase::Drawing
            }
        ));
        assert_eq!(f.portal.remaining_spins(), 1);
        assert_eq!(f.notifier.events(), ["result:Spin In Progress"]);

        let outcome = first.outcome().await;
        assert_eq!(outcome.kind, OutcomeKind::Thanks);
        assert_eq!(f.portal.phase(), SpinPhase::Idle);
        assert_eq!(
            f.notifier.events(),
            ["result:Spin In Progress", "result:Thanks for Playing!"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_quota_is_denied_through_the_result_channel() {
        let f = fixture(config_with(vec![PrizeEntry::neutral("Thanks", 1)]), true);

        for _ in 0..2 {
            f.portal.spin().unwrap().outcome().await;
        }
        let handle = f.portal.spin().unwrap();
        assert!(handle.prize().is_none());
        let outcome = handle.outcome().await;

        assert!(outcome.is_error());
        assert_eq!(outcome.failure, Some(SpinFailure::NoSpinsLeft));
        assert_eq!(f.portal.phase(), SpinPhase::Denied);
        assert_eq!(f.portal.win_history().len(), 2);
        assert_eq!(f.notifier.events().last().unwrap(), "result:No Spins Left");
    }

    #[tokio::test(start_paused = true)]
    async fn bonus_spin_allows_immediate_respin() {
        let f = fixture(config_with(vec![PrizeEntry::bonus("1 More Chance", 1)]), true);

        let outcome = f.portal.spin().unwrap().outcome().await;
        assert_eq!(outcome.kind, OutcomeKind::Bonus);
        assert!(outcome.respin_available);
        assert_eq!(f.portal.phase(), SpinPhase::QuotaCheck);
        // 2 - 1 consumed + 1 bonus
        assert_eq!(f.portal.remaining_spins(), 2);

        assert!(f.portal.spin().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn missing_credential_surfaces_connection_error() {
        let f = fixture(config_with(vec![PrizeEntry::data("500MB", 1, "500mb")]), true);

        let outcome = f.portal.spin().unwrap().outcome().await;
        assert_eq!(outcome.failure, Some(SpinFailure::UnknownRewardTag));
        assert_eq!(outcome.title, "Connection Error");

        f.portal.settle().await;
        assert!(f.auth.logins().is_empty());
        // Consumed and recorded, not refunded.
        assert_eq!(f.portal.remaining_spins(), 1);
        assert_eq!(f.portal.total_spins(), 1);
        assert!(f.notifier.events().contains(&format!("alert:{REWARD_NOT_CONNECTED}")));
    }

    #[tokio::test(start_paused = true)]
    async fn missing_authenticator_alerts_without_refund() {
        let f = fixture(config_with(vec![PrizeEntry::data("1GB", 1, "1gb")]), false);

        f.portal.spin().unwrap().outcome().await;
        f.portal.settle().await;

        assert_eq!(f.notifier.events().last().unwrap(), &format!("alert:{AUTH_NOT_READY}"));
        assert_eq!(f.portal.remaining_spins(), 1);
        assert_eq!(f.portal.phase(), SpinPhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_interrupts_pending_reveal() {
        let f = fixture(config_with(vec![PrizeEntry::neutral("Thanks", 1)]), true);

        let handle = f.portal.spin().unwrap();
        f.portal.shutdown().await;

        let outcome = handle.outcome().await;
        assert_eq!(outcome.failure, Some(SpinFailure::Interrupted));
        assert_eq!(f.portal.phase(), SpinPhase::Idle);
        assert!(f.portal.win_history().is_empty());

        let snapshot = f.portal.load_feature_state().unwrap();
        assert_eq!(snapshot.spins_remaining, 1);
        assert!(!snapshot.free_window_open);
    }

    #[tokio::test(start_paused = true)]
    async fn shut_down_portal_refuses_to_spend_spins() {
        let f = fixture(config_with(vec![PrizeEntry::neutral("Thanks", 1)]), true);

        f.portal.start().await;
        f.portal.shutdown().await;
        f.portal.start().await;
        assert!(f.portal.is_shut_down());
        assert!(!f.portal.status().initialized);

        assert!(matches!(f.portal.spin(), Err(CoreError::PortalShutDown)));
        assert_eq!(f.portal.remaining_spins(), 2);
        assert!(f.portal.win_history().is_empty());
        assert_eq!(f.portal.phase(), SpinPhase::Idle);

        f.clock.set(saturday_one_am());
        assert!(matches!(
            f.portal.connect_free(),
            Err(CoreError::PortalShutDown)
        ));
        assert!(f.notifier.events().is_empty());
        assert!(f.auth.logins().is_empty());
    }

    /// Rejects writes to the history and lifetime counter keys.
    struct TelemetryRejectingLedger {
        inner: MemoryLedger,
    }

    impl Ledger for TelemetryRejectingLedger {
        fn get(&self, key: &str) -> Result<Option<String>, CoreError> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), CoreError> {
            if key.ends_with("win_history") || key.ends_with("total_spins") {
                return Err(CoreError::StorageUnavailable {
                    message: format!("{key} is read-only"),
                });
            }
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<(), CoreError> {
            self.inner.remove(key)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn failed_history_write_still_grants_session() {
        let auth = Arc::new(RecordingAuth::default());
        let ledger = Arc::new(TelemetryRejectingLedger {
            inner: MemoryLedger::new(),
        });
        let portal = Portal::builder(
            config_with(vec![PrizeEntry::time("3 Hours", 1, "3h")]),
            ledger,
        )
        .clock(Arc::new(FixedClock::new(monday_noon())))
        .notifier(Arc::new(RecordingNotifier::default()))
        .authenticator(auth.clone())
        .build();

        let outcome = portal.spin().unwrap().outcome().await;
        assert_eq!(outcome.kind, OutcomeKind::Win);
        portal.settle().await;

        assert_eq!(auth.logins(), [("winner-3h".to_owned(), "pw3".to_owned())]);
        assert_eq!(portal.remaining_spins(), 1);
        assert!(portal.win_history().is_empty());
        assert_eq!(portal.total_spins(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn free_connect_requires_open_window() {
        let f = fixture(config_with(vec![PrizeEntry::neutral("Thanks", 1)]), true);

        assert!(matches!(
            f.portal.connect_free(),
            Err(CoreError::FreeWindowClosed)
        ));
        assert!(f.notifier.events().is_empty());

        f.clock.set(saturday_one_am());
        f.portal.connect_free().unwrap();
        assert!(f.auth.logins().is_empty());

        f.portal.settle().await;
        assert_eq!(f.auth.logins(), [("free".to_owned(), "pwf".to_owned())]);
        assert_eq!(
            f.notifier.events(),
            ["overlay", "success:Connecting to Free WiFi..."]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn advert_opens_after_delay() {
        let f = fixture(config_with(vec![PrizeEntry::neutral("Thanks", 1)]), true);

        let url = f.portal.open_advert().unwrap();
        assert_eq!(url.as_str(), "https://ads.example.com/");
        assert!(f.notifier.events().is_empty());

        f.portal.settle().await;
        assert_eq!(f.notifier.events(), ["open:https://ads.example.com/"]);
    }

    #[tokio::test(start_paused = true)]
    async fn snapshot_task_persists_feature_state() {
        let mut config = config_with(vec![PrizeEntry::neutral("Thanks", 1)]);
        config.timing.snapshot_interval = Duration::from_secs(300);
        let f = fixture(config, true);

        f.portal.start().await;
        assert!(f.portal.status().initialized);
        assert!(f.ledger.get("smartnet_feature_state").unwrap().is_none());

        tokio::time::sleep(Duration::from_secs(301)).await;
        let raw = f.ledger.get("smartnet_feature_state").unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["spinsRemaining"], 2);
        assert_eq!(value["freeWifiAvailable"], false);

        f.portal.shutdown().await;
        assert!(!f.portal.status().initialized);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_restores_allowance_and_status_reports_next_window() {
        let f = fixture(config_with(vec![PrizeEntry::neutral("Thanks", 1)]), true);
        f.portal.spin().unwrap().outcome().await;
        f.portal.spin().unwrap().outcome().await;
        assert_eq!(f.portal.remaining_spins(), 0);

        f.portal.reset_daily_spins().unwrap();
        let status = f.portal.status();
        assert_eq!(status.spins_remaining, 2);
        assert_eq!(status.total_spins, 2);
        assert_eq!(status.history_len, 2);
        assert_eq!(
            status.next_free_window,
            NaiveDate::from_ymd_opt(2026, 10, 24).unwrap().and_hms_opt(0, 0, 0)
        );
    }
}
