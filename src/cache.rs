//! Roster cache with TTL and single-flight, retrying refresh.
//!
//! Holds at most one installed [`RosterSnapshot`]. Staleness is checked
//! lazily on access. A refresh only ever swaps in a fully built snapshot;
//! a failed refresh leaves the previous one untouched.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::{env_var_parsed, DEFAULT_CACHE_TTL_SECS};
use crate::error::{NormalizerError, Result};
use crate::retry::{retry_async, RetryPolicy};
use crate::roster::{RosterProvider, RosterSnapshot};

/// Cache tuning
#[derive(Debug, Clone)]
pub struct RosterCacheConfig {
    /// Snapshot lifetime; a snapshot this old or older is stale
    pub ttl: Duration,
    pub retry: RetryPolicy,
    /// After a failed refresh, how long a stale snapshot is served without
    /// asking the provider again
    pub failure_cooldown: Duration,
}

impl Default for RosterCacheConfig {
    fn default() -> Self {
        let retry = RetryPolicy::default();
        Self {
            ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            failure_cooldown: Duration::from_millis(retry.max_elapsed_ms),
            retry,
        }
    }
}

impl RosterCacheConfig {
    /// ROSTER_CACHE_TTL_SECS, ROSTER_FAILURE_COOLDOWN_SECS plus the RETRY_*
    /// variables. The cooldown defaults to the retry policy's elapsed budget.
    pub fn from_env() -> Self {
        let ttl_secs = env_var_parsed::<u64>("ROSTER_CACHE_TTL_SECS")
            .filter(|&v| v > 0)
            .unwrap_or(DEFAULT_CACHE_TTL_SECS);
        let retry = RetryPolicy::from_env();
        let failure_cooldown = env_var_parsed::<u64>("ROSTER_FAILURE_COOLDOWN_SECS")
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_millis(retry.max_elapsed_ms));
        Self {
            ttl: Duration::from_secs(ttl_secs),
            retry,
            failure_cooldown,
        }
    }
}

/// Observable cache lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    /// Nothing installed, no refresh running
    Empty,
    /// A refresh is in flight
    Loading,
    /// Snapshot installed and within its TTL
    Ready,
    /// Snapshot installed but past its TTL
    Stale,
}

struct Installed {
    snapshot: Arc<RosterSnapshot>,
    loaded_at: Instant,
}

struct RefreshFailure {
    attempts: u32,
    error: Arc<anyhow::Error>,
    failed_at: Instant,
}

impl RefreshFailure {
    fn to_error(&self) -> NormalizerError {
        NormalizerError::DataUnavailable {
            attempts: self.attempts,
            source: anyhow::Error::new(SharedFailure(self.error.clone())),
        }
    }
}

/// A recorded refresh failure handed to every caller that observes it.
/// Displays as the provider's error and exposes the same causes.
#[derive(Debug)]
struct SharedFailure(Arc<anyhow::Error>);

impl fmt::Display for SharedFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&**self.0, f)
    }
}

impl std::error::Error for SharedFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(&**self.0)
    }
}

/// Raised while the provider is called; lowered on drop, so a cancelled
/// refresh does not leave the cache reporting Loading
struct FetchingFlag<'a>(&'a AtomicBool);

impl<'a> FetchingFlag<'a> {
    fn raise(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::Release);
        Self(flag)
    }
}

impl Drop for FetchingFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Shared roster cache. Construct once, wrap in `Arc`, hand to every matcher.
pub struct RosterCache {
    provider: Arc<dyn RosterProvider>,
    config: RosterCacheConfig,
    current: RwLock<Option<Installed>>,
    /// Held for the whole fetch-and-build cycle
    refresh_gate: Mutex<()>,
    /// Outcome of the most recent cycle; `None` after a success
    last_failure: RwLock<Option<RefreshFailure>>,
    /// Set only while the provider is being called or retried
    fetching: AtomicBool,
    /// Completed refresh cycles (success or failure)
    refreshes: AtomicU64,
    /// Provider calls made
    fetches: AtomicU64,
}

impl RosterCache {
    pub fn new(provider: Arc<dyn RosterProvider>, config: RosterCacheConfig) -> Self {
        Self {
            provider,
            config,
            current: RwLock::new(None),
            refresh_gate: Mutex::new(()),
            last_failure: RwLock::new(None),
            fetching: AtomicBool::new(false),
            refreshes: AtomicU64::new(0),
            fetches: AtomicU64::new(0),
        }
    }

    pub fn with_defaults(provider: Arc<dyn RosterProvider>) -> Self {
        Self::new(provider, RosterCacheConfig::default())
    }

    pub fn config(&self) -> &RosterCacheConfig {
        &self.config
    }

    fn is_expired(&self, installed: &Installed) -> bool {
        installed.loaded_at.elapsed() >= self.config.ttl
    }

    /// Installed snapshot if it exists and is still fresh
    async fn fresh_snapshot(&self) -> Option<Arc<RosterSnapshot>> {
        let current = self.current.read().await;
        current
            .as_ref()
            .filter(|installed| !self.is_expired(installed))
            .map(|installed| installed.snapshot.clone())
    }

    async fn installed_snapshot(&self) -> Option<Arc<RosterSnapshot>> {
        let current = self.current.read().await;
        current.as_ref().map(|installed| installed.snapshot.clone())
    }

    /// Installed snapshot, if the last refresh failed less than
    /// `failure_cooldown` ago
    async fn cooling_down_snapshot(&self) -> Option<Arc<RosterSnapshot>> {
        let recent_failure = self
            .last_failure
            .read()
            .await
            .as_ref()
            .is_some_and(|failure| failure.failed_at.elapsed() < self.config.failure_cooldown);
        if !recent_failure {
            return None;
        }
        self.installed_snapshot().await
    }

    /// Make sure a fresh snapshot is installed and return it.
    ///
    /// No-op when fresh and `force` is false. Otherwise runs one
    /// fetch-and-build cycle under the retry policy. Callers that arrive
    /// while a cycle is running wait for it and share its outcome instead of
    /// fetching again.
    pub async fn ensure_fresh(&self, force: bool) -> Result<Arc<RosterSnapshot>> {
        let observed = self.refreshes.load(Ordering::Acquire);

        if !force {
            if let Some(snapshot) = self.fresh_snapshot().await {
                return Ok(snapshot);
            }
        }

        let _gate = self.refresh_gate.lock().await;

        if self.refreshes.load(Ordering::Acquire) != observed {
            // A cycle finished while we waited on the gate
            if let Some(failure) = self.last_failure.read().await.as_ref() {
                return Err(failure.to_error());
            }
            if let Some(snapshot) = self.installed_snapshot().await {
                return Ok(snapshot);
            }
        }

        if !force {
            if let Some(snapshot) = self.fresh_snapshot().await {
                return Ok(snapshot);
            }
        }

        debug!(
            "roster: refreshing from provider '{}' (force={})",
            self.provider.name(),
            force
        );

        let fetching = FetchingFlag::raise(&self.fetching);
        let outcome = retry_async(&self.config.retry, "roster_refresh", move || {
            self.fetch_and_build()
        })
        .await;
        drop(fetching);

        let result = match outcome {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                *self.current.write().await = Some(Installed {
                    snapshot: snapshot.clone(),
                    loaded_at: Instant::now(),
                });
                *self.last_failure.write().await = None;
                info!(
                    "roster: installed {} teams from '{}'",
                    snapshot.len(),
                    self.provider.name()
                );
                Ok(snapshot)
            }
            Err(exhausted) => {
                warn!(
                    "roster: refresh failed after {} attempt(s): {:#}",
                    exhausted.attempts, exhausted.last_error
                );
                let failure = RefreshFailure {
                    attempts: exhausted.attempts,
                    error: Arc::new(exhausted.last_error),
                    failed_at: Instant::now(),
                };
                let err = failure.to_error();
                *self.last_failure.write().await = Some(failure);
                Err(err)
            }
        };

        self.refreshes.fetch_add(1, Ordering::Release);
        result
    }

    /// One provider call; an empty roster counts as a failed attempt
    async fn fetch_and_build(&self) -> anyhow::Result<RosterSnapshot> {
        self.fetches.fetch_add(1, Ordering::Relaxed);

        let records = self.provider.fetch_roster().await?;
        if records.is_empty() {
            anyhow::bail!("provider '{}' returned an empty roster", self.provider.name());
        }

        let total = records.len();
        let snapshot = RosterSnapshot::build(records);
        if snapshot.is_empty() {
            anyhow::bail!(
                "provider '{}' returned {} records but none were usable",
                self.provider.name(),
                total
            );
        }
        Ok(snapshot)
    }

    /// Snapshot for matching. Refreshes when empty or stale; if that refresh
    /// fails but an older snapshot exists, the older snapshot is served.
    /// Within `failure_cooldown` of a failed refresh the older snapshot is
    /// served without calling the provider.
    pub async fn snapshot(&self) -> Result<Arc<RosterSnapshot>> {
        if let Some(snapshot) = self.fresh_snapshot().await {
            return Ok(snapshot);
        }
        if let Some(stale) = self.cooling_down_snapshot().await {
            debug!("roster: serving stale snapshot during failure cooldown");
            return Ok(stale);
        }

        match self.ensure_fresh(false).await {
            Ok(snapshot) => Ok(snapshot),
            Err(err) => match self.installed_snapshot().await {
                Some(stale) => {
                    warn!("roster: serving stale snapshot ({})", err);
                    Ok(stale)
                }
                None => Err(err),
            },
        }
    }

    /// Drop the installed snapshot; the next access refetches
    pub async fn invalidate(&self) {
        *self.current.write().await = None;
        debug!("roster: cache invalidated");
    }

    pub async fn state(&self) -> CacheState {
        if self.fetching.load(Ordering::Acquire) {
            return CacheState::Loading;
        }
        let current = self.current.read().await;
        match current.as_ref() {
            None => CacheState::Empty,
            Some(installed) if self.is_expired(installed) => CacheState::Stale,
            Some(_) => CacheState::Ready,
        }
    }

    /// Number of provider calls made so far (including retries)
    pub fn fetch_count(&self) -> u64 {
        self.fetches.load(Ordering::Relaxed)
    }
}
