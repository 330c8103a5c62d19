use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::runtime::Handle;
use tokio::sync::Notify;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::account::models::UserId;

/// All sessions of a user issued at or before `revoked_before` are revoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SessionCutoff {
    /// Microseconds since the epoch
    revoked_before: i64,
    /// Unix timestamp past which no session the cutoff matches is unexpired
    expires_at: i64,
}

#[derive(Debug, Default)]
struct RevocationState {
    /// Raw token -> the token's own `exp`
    tokens: HashMap<String, i64>,
    cutoffs: HashMap<UserId, SessionCutoff>,
}

/// In-memory record of tokens invalidated before their natural expiry.
///
/// Lookups share a read lock; every mutation, including the sweep, takes
/// the write lock. Cloning yields another handle to the same registry.
#[derive(Debug, Clone, Default)]
pub struct RevocationRegistry {
    state: Arc<RwLock<RevocationState>>,
}

impl RevocationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Revoke a raw token until `expires_at` (the token's `exp`).
    ///
    /// Revoking the same token again leaves a single entry.
    pub async fn revoke(&self, token: &str, expires_at: i64) {
        self.state
            .write()
            .await
            .tokens
            .insert(token.to_string(), expires_at);
    }

    pub async fn is_revoked(&self, token: &str) -> bool {
        self.state.read().await.tokens.contains_key(token)
    }

    /// Revoke every session of `user_id` issued at or before `revoked_before`
    /// (microseconds), keeping the cutoff until `expires_at` (seconds).
    ///
    /// A later cutoff for the same user widens the existing one.
    pub async fn revoke_sessions_before(
        &self,
        user_id: UserId,
        revoked_before: i64,
        expires_at: i64,
    ) {
        let mut state = self.state.write().await;
        let cutoff = state.cutoffs.entry(user_id).or_insert(SessionCutoff {
            revoked_before,
            expires_at,
        });
        cutoff.revoked_before = cutoff.revoked_before.max(revoked_before);
        cutoff.expires_at = cutoff.expires_at.max(expires_at);
    }

    /// Whether a session of `user_id` issued at `issued_at_us` (microseconds)
    /// falls under a cutoff. A session issued in the cutoff's own microsecond
    /// is revoked.
    pub async fn is_session_cut_off(&self, user_id: &UserId, issued_at_us: i64) -> bool {
        self.state
            .read()
            .await
            .cutoffs
            .get(user_id)
            .map_or(false, |cutoff| issued_at_us <= cutoff.revoked_before)
    }

    /// Drop every entry whose expiry is before `now`.
    pub async fn sweep(&self, now: i64) {
        let mut state = self.state.write().await;
        let before = state.tokens.len() + state.cutoffs.len();

        state.tokens.retain(|_, expires_at| *expires_at >= now);
        state.cutoffs.retain(|_, cutoff| cutoff.expires_at >= now);

        let removed = before - (state.tokens.len() + state.cutoffs.len());
        if removed > 0 {
            tracing::debug!(
                removed,
                remaining = state.tokens.len(),
                "Revocation registry swept"
            );
        }
    }

    /// Number of revoked tokens currently held.
    pub async fn len(&self) -> usize {
        self.state.read().await.tokens.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Background task that sweeps a [`RevocationRegistry`].
///
/// Runs on a fixed period and whenever [`trigger`](Self::trigger) is called.
/// Triggers coalesce into at most one pending sweep. The task is aborted
/// when the sweeper is dropped.
#[derive(Debug)]
pub struct RevocationSweeper {
    notify: Arc<Notify>,
    handle: Option<JoinHandle<()>>,
}

impl RevocationSweeper {
    /// Start sweeping `registry` every `period`.
    ///
    /// Outside a Tokio runtime nothing is spawned; `trigger` is then a no-op.
    pub fn start(registry: RevocationRegistry, period: Duration) -> Self {
        let notify = Arc::new(Notify::new());

        let handle = match Handle::try_current() {
            Ok(runtime) => Some(runtime.spawn(sweep_loop(
                registry,
                Arc::clone(&notify),
                period,
            ))),
            Err(_) => {
                tracing::warn!("No async runtime available, revocation sweeper not started");
                None
            }
        };

        Self { notify, handle }
    }

    /// Request a sweep without waiting for it.
    pub fn trigger(&self) {
        self.notify.notify_one();
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .map_or(false, |handle| !handle.is_finished())
    }
}

impl Drop for RevocationSweeper {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

async fn sweep_loop(registry: RevocationRegistry, notify: Arc<Notify>, period: Duration) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = notify.notified() => {}
        }
        registry.sweep(Utc::now().timestamp()).await;
    }
}
