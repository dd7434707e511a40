//! Mock tests for the team normalizer without network access
//!
//! A scripted in-memory roster provider stands in for ESPN, with a call
//! counter, optional latency and switchable failures, so the matcher tiers,
//! the no-match policies and the roster cache can be exercised end to end.

use async_trait::async_trait;
use ncaa_team_normalizer::{
    AliasTable, CacheState, MatchMethod, NormalizerError, ProviderRecord, ResolveOptions,
    RosterCache, RosterCacheConfig, RosterProvider, TeamNormalizer,
};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

// =============================================================================
// MOCK ROSTER PROVIDER
// =============================================================================

/// Mock roster provider for testing without real API calls
pub struct MockRosterProvider {
    records: Vec<ProviderRecord>,
    /// Simulated latency (ms)
    latency_ms: u64,
    /// Fail every call while set
    failing: AtomicBool,
    /// Fail this many calls, then recover
    fail_next: AtomicU32,
    /// Return an empty roster instead of `records`
    empty: AtomicBool,
    /// Call counter
    call_count: AtomicU64,
}

impl MockRosterProvider {
    pub fn new(records: Vec<ProviderRecord>) -> Self {
        Self {
            records,
            latency_ms: 0,
            failing: AtomicBool::new(false),
            fail_next: AtomicU32::new(0),
            empty: AtomicBool::new(false),
            call_count: AtomicU64::new(0),
        }
    }

    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn fail_next(&self, n: u32) {
        self.fail_next.store(n, Ordering::SeqCst);
    }

    pub fn set_empty(&self, empty: bool) {
        self.empty.store(empty, Ordering::SeqCst);
    }

    pub fn calls(&self) -> u64 {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RosterProvider for MockRosterProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch_roster(&self) -> anyhow::Result<Vec<ProviderRecord>> {
        self.call_count.fetch_add(1, Ordering::SeqCst);

        if self.latency_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.latency_ms)).await;
        }

        if self.failing.load(Ordering::SeqCst) {
            anyhow::bail!("mock provider unavailable");
        }
        let pending = self.fail_next.load(Ordering::SeqCst);
        if pending > 0 {
            self.fail_next.store(pending - 1, Ordering::SeqCst);
            anyhow::bail!("mock transient failure");
        }
        if self.empty.load(Ordering::SeqCst) {
            return Ok(Vec::new());
        }
        Ok(self.records.clone())
    }
}

/// Division I sample covering the disambiguation cases
fn fixture_roster() -> Vec<ProviderRecord> {
    [
        ("Duke", "150", "DUKE"),
        ("North Carolina", "153", "UNC"),
        ("Connecticut", "41", "CONN"),
        ("Massachusetts", "113", "MASS"),
        ("Mississippi", "145", "MISS"),
        ("Pennsylvania", "219", "PENN"),
        ("Penn State", "213", "PSU"),
        ("Miami (FL)", "2390", "MIA"),
        ("Miami (OH)", "193", "M-OH"),
        ("St. John's (NY)", "2599", "SJU"),
        ("Saint Mary's (CA)", "2608", "SMC"),
        ("Texas A&M", "245", "TA&M"),
        ("Michigan State", "127", "MSU"),
        ("NC State", "152", "NCSU"),
        ("Villanova", "222", "VILL"),
        ("Syracuse", "183", "SYR"),
    ]
    .into_iter()
    .map(|(name, id, abbr)| ProviderRecord::new(name, id).with_abbreviation(abbr))
    .collect()
}

fn setup_with(provider: MockRosterProvider) -> (Arc<MockRosterProvider>, TeamNormalizer) {
    let provider = Arc::new(provider);
    let cache = Arc::new(RosterCache::with_defaults(provider.clone()));
    (provider, TeamNormalizer::new(cache))
}

fn setup() -> (Arc<MockRosterProvider>, TeamNormalizer) {
    setup_with(MockRosterProvider::new(fixture_roster()))
}

fn strict() -> ResolveOptions {
    ResolveOptions::default().strict()
}

// =============================================================================
// TIER RESOLUTION TESTS
// =============================================================================

#[cfg(test)]
mod tier_tests {
    use super::*;

    /// Test: case and surrounding whitespace never change the exact hit
    #[tokio::test]
    async fn test_exact_is_case_and_whitespace_insensitive() {
        let (_, matcher) = setup();

        for raw in ["Duke", "  DUKE  ", "duke", "Duke Blue Devils", "Duke University"] {
            let m = matcher.resolve(raw).await.unwrap().unwrap();
            assert_eq!(m.canonical_name, "Duke", "input {:?}", raw);
            assert_eq!(m.entity_id, "150");
            assert_eq!(m.abbreviation, "DUKE");
            assert_eq!(m.match_method, MatchMethod::Exact);
            assert_eq!(m.confidence, 100.0);
        }
    }

    /// Test: "State" survives suffix stripping
    #[tokio::test]
    async fn test_state_schools_keep_state() {
        let (_, matcher) = setup();

        let m = matcher
            .resolve("Michigan State University")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(m.canonical_name, "Michigan State");
        assert_eq!(m.match_method, MatchMethod::Exact);

        let m = matcher.resolve("Michigan State Spartans").await.unwrap().unwrap();
        assert_eq!(m.canonical_name, "Michigan State");
    }

    /// Test: curated aliases resolve at full confidence
    #[tokio::test]
    async fn test_alias_tier() {
        let (_, matcher) = setup();

        let cases = [
            ("UConn", "Connecticut"),
            ("UNC", "North Carolina"),
            ("UMass", "Massachusetts"),
            ("Ole Miss", "Mississippi"),
            ("St. John's", "St. John's (NY)"),
            ("The U", "Miami (FL)"),
            ("Nova", "Villanova"),
        ];
        for (raw, expected) in cases {
            let m = matcher.resolve(raw).await.unwrap().unwrap();
            assert_eq!(m.canonical_name, expected, "input {:?}", raw);
            assert_eq!(m.match_method, MatchMethod::Alias, "input {:?}", raw);
            assert_eq!(m.confidence, 100.0);
        }
    }

    /// Test: near-identical names never collide
    #[tokio::test]
    async fn test_disambiguation() {
        let (_, matcher) = setup();

        let penn = matcher.resolve("Penn").await.unwrap().unwrap();
        assert_eq!(penn.canonical_name, "Pennsylvania");

        let penn_state = matcher.resolve("Penn State").await.unwrap().unwrap();
        assert_eq!(penn_state.canonical_name, "Penn State");
        assert_eq!(penn_state.match_method, MatchMethod::Exact);

        let lions = matcher
            .resolve("Penn State Nittany Lions")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(lions.canonical_name, "Penn State");

        let fl = matcher.resolve("Miami (FL)").await.unwrap().unwrap();
        let oh = matcher.resolve("Miami (OH)").await.unwrap().unwrap();
        assert_eq!(fl.entity_id, "2390");
        assert_eq!(oh.entity_id, "193");
    }

    /// Test: phonetic misspelling lands in the fuzzy tier below 100
    #[tokio::test]
    async fn test_fuzzy_tier_floor() {
        let (_, matcher) = setup();

        let options = ResolveOptions::default().with_threshold(80.0);
        let m = matcher.resolve_with("Dook", &options).await.unwrap().unwrap();
        assert!(m.canonical_name.contains("Duke"));
        assert_eq!(m.match_method, MatchMethod::Fuzzy);
        assert!(m.confidence < 100.0);
        assert!(m.confidence >= 80.0);
    }

    /// Test: transposed letters still resolve
    #[tokio::test]
    async fn test_fuzzy_tier_typo() {
        let (_, matcher) = setup();

        let options = ResolveOptions::default().with_threshold(75.0);
        let m = matcher
            .resolve_with("Villanvoa", &options)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(m.canonical_name, "Villanova");
        assert_eq!(m.match_method, MatchMethod::Fuzzy);
    }

    /// Test: a threshold of 100 disables fuzzy hits for distinct keys
    #[tokio::test]
    async fn test_threshold_100_only_allows_exact_and_alias() {
        let (_, matcher) = setup();

        let options = ResolveOptions::default().with_threshold(100.0);
        assert!(matcher.resolve_with("Dook", &options).await.unwrap().is_none());
        assert!(matcher.resolve_with("UConn", &options).await.unwrap().is_some());
    }

    /// Test: a shared phonetic code alone never clears the default threshold
    #[tokio::test]
    async fn test_sound_alikes_need_a_lowered_threshold() {
        let records = [
            ("Duke", "150"),
            ("Georgia Tech", "59"),
            ("Texas Tech", "2641"),
            ("Rice", "242"),
            ("Kent State", "2309"),
        ]
        .into_iter()
        .map(|(name, id)| ProviderRecord::new(name, id))
        .collect();
        let (_, matcher) = setup_with(MockRosterProvider::new(records));

        for raw in ["Tech", "Doug", "Take", "Dook", "Rose", "Ross"] {
            let hit = matcher.resolve(raw).await.unwrap();
            assert!(hit.is_none(), "{:?} resolved to {:?}", raw, hit);
        }

        let lowered = ResolveOptions::default().with_threshold(80.0);
        let m = matcher.resolve_with("Rose", &lowered).await.unwrap().unwrap();
        assert_eq!(m.canonical_name, "Rice");
        assert_eq!(m.match_method, MatchMethod::Fuzzy);
        assert!(m.confidence < 85.0);
    }

    /// Test: an alias pointing outside the roster falls through instead of failing
    #[tokio::test]
    async fn test_stale_alias_falls_through() {
        let (_, matcher) = setup();

        let mut aliases = AliasTable::builtin();
        assert!(aliases.insert("Zags", "Gonzaga"));
        assert!(aliases.insert("Blue Devs", "Duke"));
        let matcher = matcher.with_aliases(Arc::new(aliases));

        assert!(matcher.resolve("Zags").await.unwrap().is_none());

        let m = matcher.resolve("Blue Devs").await.unwrap().unwrap();
        assert_eq!(m.canonical_name, "Duke");
        assert_eq!(m.match_method, MatchMethod::Alias);
    }
}

// =============================================================================
// NO-MATCH POLICY AND INPUT VALIDATION TESTS
// =============================================================================

#[cfg(test)]
mod policy_tests {
    use super::*;

    /// Test: lenient mode returns empty, strict mode names the raw input
    #[tokio::test]
    async fn test_no_match_policies() {
        let (_, matcher) = setup();

        let lenient = matcher.resolve("Completely Fake Team XYZ").await.unwrap();
        assert!(lenient.is_none());

        let err = matcher
            .resolve_with("Completely Fake Team XYZ", &strict())
            .await
            .unwrap_err();
        match err {
            NormalizerError::UnknownTeam(raw) => assert_eq!(raw, "Completely Fake Team XYZ"),
            other => panic!("expected UnknownTeam, got {:?}", other),
        }
    }

    /// Test: a name that normalizes to nothing is a clean miss
    #[tokio::test]
    async fn test_name_that_normalizes_to_empty() {
        let (_, matcher) = setup();

        assert!(matcher.resolve("Nittany Lions").await.unwrap().is_none());
        let err = matcher
            .resolve_with("Nittany Lions", &strict())
            .await
            .unwrap_err();
        assert!(matches!(err, NormalizerError::UnknownTeam(_)));
    }

    /// Test: invalid input is rejected before the roster is fetched
    #[tokio::test]
    async fn test_invalid_input_never_touches_cache() {
        let (provider, matcher) = setup();

        for raw in ["", "   ", "\t"] {
            let err = matcher.resolve(raw).await.unwrap_err();
            assert!(matches!(err, NormalizerError::InvalidInput(_)));
        }

        let options = ResolveOptions::default().with_threshold(150.0);
        let err = matcher.resolve_with("Duke", &options).await.unwrap_err();
        assert!(matches!(err, NormalizerError::InvalidInput(_)));

        assert_eq!(provider.calls(), 0);
        assert_eq!(matcher.cache().state().await, CacheState::Empty);
    }
}

// =============================================================================
// BATCH AND ENUMERATION TESTS
// =============================================================================

#[cfg(test)]
mod batch_tests {
    use super::*;

    /// Test: batch results line up with single calls
    #[tokio::test]
    async fn test_resolve_many_preserves_order() {
        let (_, matcher) = setup();

        let names = ["Duke", "UConn", "UNC"];
        let batch = matcher.resolve_many(&names).await.unwrap();
        assert_eq!(batch.len(), 3);

        for (name, result) in names.iter().zip(&batch) {
            let single = matcher.resolve(name).await.unwrap();
            assert_eq!(result, &single);
        }
        let canonical: Vec<&str> = batch
            .iter()
            .map(|m| m.as_ref().unwrap().canonical_name.as_str())
            .collect();
        assert_eq!(canonical, vec!["Duke", "Connecticut", "North Carolina"]);
    }

    /// Test: lenient misses leave a hole; invalid input aborts
    #[tokio::test]
    async fn test_resolve_many_miss_and_abort() {
        let (_, matcher) = setup();

        let batch = matcher
            .resolve_many(&["Duke", "Completely Fake Team XYZ", "Syracuse"])
            .await
            .unwrap();
        assert!(batch[0].is_some());
        assert!(batch[1].is_none());
        assert!(batch[2].is_some());

        let err = matcher
            .resolve_many(&["Duke", "  ", "Syracuse"])
            .await
            .unwrap_err();
        assert!(matches!(err, NormalizerError::InvalidInput(_)));
    }

    /// Test: strict batch stops on the first unknown name
    #[tokio::test]
    async fn test_resolve_many_strict_aborts() {
        let (_, matcher) = setup();
        let matcher = matcher.with_options(strict());

        let err = matcher
            .resolve_many(&vec!["Duke".to_string(), "Not A Team".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, NormalizerError::UnknownTeam(raw) if raw == "Not A Team"));
    }

    /// Test: enumeration and secondary lookups
    #[tokio::test]
    async fn test_list_and_lookup() {
        let (_, matcher) = setup();

        let all = matcher.list_all_entities().await.unwrap();
        assert_eq!(all.len(), 16);
        assert_eq!(all[0].canonical_name, "Duke");
        assert_eq!(all[0].entity_id, "150");
        assert_eq!(all[15].canonical_name, "Syracuse");

        let unc = matcher.find_by_abbreviation("unc").await.unwrap().unwrap();
        assert_eq!(unc.display_name, "North Carolina");

        let miami = matcher.find_by_id("2390").await.unwrap().unwrap();
        assert_eq!(miami.display_name, "Miami (FL)");

        assert!(matcher.find_by_id("0").await.unwrap().is_none());
    }
}

// =============================================================================
// ROSTER CACHE TESTS
// =============================================================================

#[cfg(test)]
mod cache_tests {
    use super::*;

    /// Test: repeated access within the TTL costs one fetch
    #[tokio::test(start_paused = true)]
    async fn test_single_fetch_within_ttl() {
        let (provider, matcher) = setup();

        matcher.cache().snapshot().await.unwrap();
        matcher.cache().snapshot().await.unwrap();
        matcher.resolve("Duke").await.unwrap();
        assert_eq!(provider.calls(), 1);
        assert_eq!(matcher.cache().fetch_count(), 1);
    }

    /// Test: forced refresh and TTL expiry each refetch
    #[tokio::test(start_paused = true)]
    async fn test_force_and_ttl_refetch() {
        let (provider, matcher) = setup();

        matcher.resolve("Duke").await.unwrap();
        assert_eq!(matcher.refresh().await.unwrap(), 16);
        assert_eq!(provider.calls(), 2);

        tokio::time::advance(Duration::from_secs(24 * 60 * 60)).await;
        assert_eq!(matcher.cache().state().await, CacheState::Stale);
        matcher.resolve("Duke").await.unwrap();
        assert_eq!(provider.calls(), 3);
        assert_eq!(matcher.cache().state().await, CacheState::Ready);
    }

    /// Test: concurrent callers on a cold cache share one fetch
    #[tokio::test(start_paused = true)]
    async fn test_single_flight_refresh() {
        let (provider, matcher) =
            setup_with(MockRosterProvider::new(fixture_roster()).with_latency(250));

        let mut handles = Vec::new();
        for name in ["Duke", "UConn", "Villanova", "Penn", "Syracuse", "UNC", "Nova", "Penn State"] {
            let matcher = matcher.clone();
            handles.push(tokio::spawn(async move { matcher.resolve(name).await }));
        }
        for handle in handles {
            assert!(handle.await.unwrap().unwrap().is_some());
        }

        assert_eq!(provider.calls(), 1);
    }

    /// Test: transient failures are retried with backoff
    #[tokio::test(start_paused = true)]
    async fn test_transient_failures_recover() {
        let (provider, matcher) = setup();
        provider.fail_next(2);

        let start = tokio::time::Instant::now();
        let m = matcher.resolve("Duke").await.unwrap().unwrap();
        assert_eq!(m.canonical_name, "Duke");
        assert_eq!(provider.calls(), 3);
        // 1s then 2s of backoff
        assert!(start.elapsed() >= Duration::from_secs(3));
    }

    /// Test: exhausted retries surface DataUnavailable with the attempt count
    #[tokio::test(start_paused = true)]
    async fn test_unavailable_after_retries() {
        let (provider, matcher) = setup();
        provider.set_failing(true);

        let err = matcher.resolve("Duke").await.unwrap_err();
        assert!(err.is_data_unavailable());
        match err {
            NormalizerError::DataUnavailable { attempts, source } => {
                assert_eq!(attempts, 3);
                assert!(source.to_string().contains("mock provider unavailable"));
            }
            other => panic!("expected DataUnavailable, got {:?}", other),
        }
        assert_eq!(provider.calls(), 3);
        assert_eq!(matcher.cache().state().await, CacheState::Empty);
    }

    /// Test: an empty roster is a failed attempt, not an empty snapshot
    #[tokio::test(start_paused = true)]
    async fn test_empty_roster_is_failure() {
        let (provider, matcher) = setup();
        provider.set_empty(true);

        let err = matcher.resolve("Duke").await.unwrap_err();
        assert!(err.is_data_unavailable());
        assert_eq!(provider.calls(), 3);
    }

    /// Test: waiters on a failing refresh share its outcome
    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_share_failure() {
        let (provider, matcher) =
            setup_with(MockRosterProvider::new(fixture_roster()).with_latency(100));
        provider.set_failing(true);

        let mut handles = Vec::new();
        for _ in 0..5 {
            let matcher = matcher.clone();
            handles.push(tokio::spawn(async move { matcher.resolve("Duke").await }));
        }
        for handle in handles {
            let err = handle.await.unwrap().unwrap_err();
            assert!(err.is_data_unavailable());
        }

        assert_eq!(provider.calls(), 3);
    }

    /// Test: a failed refresh keeps serving the previous snapshot
    #[tokio::test(start_paused = true)]
    async fn test_stale_snapshot_served_on_refresh_failure() {
        let (provider, matcher) = setup();
        matcher.resolve("Duke").await.unwrap();

        tokio::time::advance(Duration::from_secs(24 * 60 * 60 + 1)).await;
        provider.set_failing(true);

        let m = matcher.resolve("UConn").await.unwrap().unwrap();
        assert_eq!(m.canonical_name, "Connecticut");
        assert_eq!(provider.calls(), 4);
        assert_eq!(matcher.cache().state().await, CacheState::Stale);

        // Forced refresh reports the failure but leaves the snapshot installed
        let err = matcher.refresh().await.unwrap_err();
        assert!(err.is_data_unavailable());
        assert_eq!(matcher.list_all_entities().await.unwrap().len(), 16);
    }

    /// Test: while the provider stays down, stale reads inside the failure
    /// cooldown do not retry
    #[tokio::test(start_paused = true)]
    async fn test_failure_cooldown_limits_provider_calls() {
        let (provider, matcher) = setup();
        matcher.resolve("Duke").await.unwrap();

        tokio::time::advance(Duration::from_secs(24 * 60 * 60)).await;
        provider.set_failing(true);

        let start = tokio::time::Instant::now();
        let batch = matcher.resolve_many(&["Duke"; 10]).await.unwrap();
        assert!(batch.iter().all(|m| m.as_ref().unwrap().canonical_name == "Duke"));
        assert_eq!(provider.calls(), 4);
        // One retry cycle, not ten
        assert!(start.elapsed() < Duration::from_secs(10));
        assert_eq!(matcher.cache().state().await, CacheState::Stale);

        let cooldown = matcher.cache().config().failure_cooldown;
        tokio::time::advance(cooldown).await;
        matcher.resolve("Duke").await.unwrap().unwrap();
        assert_eq!(provider.calls(), 7);

        // Provider back: the next read after the cooldown refreshes
        provider.set_failing(false);
        tokio::time::advance(cooldown).await;
        matcher.resolve("Duke").await.unwrap().unwrap();
        assert_eq!(provider.calls(), 8);
        assert_eq!(matcher.cache().state().await, CacheState::Ready);
    }

    /// Test: state reads Loading only while the provider call is in flight
    #[tokio::test(start_paused = true)]
    async fn test_state_loading_while_fetching() {
        let (_, matcher) =
            setup_with(MockRosterProvider::new(fixture_roster()).with_latency(250));
        assert_eq!(matcher.cache().state().await, CacheState::Empty);

        let pending = tokio::spawn({
            let matcher = matcher.clone();
            async move { matcher.resolve("Duke").await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(matcher.cache().state().await, CacheState::Loading);

        assert!(pending.await.unwrap().unwrap().is_some());
        assert_eq!(matcher.cache().state().await, CacheState::Ready);
    }

    /// Test: invalidate drops the snapshot
    #[tokio::test(start_paused = true)]
    async fn test_invalidate() {
        let (provider, matcher) = setup();
        matcher.resolve("Duke").await.unwrap();
        assert_eq!(matcher.cache().state().await, CacheState::Ready);

        matcher.cache().invalidate().await;
        assert_eq!(matcher.cache().state().await, CacheState::Empty);

        matcher.resolve("Duke").await.unwrap();
        assert_eq!(provider.calls(), 2);
    }

    /// Test: a short TTL from config
    #[tokio::test(start_paused = true)]
    async fn test_custom_ttl() {
        let provider = Arc::new(MockRosterProvider::new(fixture_roster()));
        let config = RosterCacheConfig {
            ttl: Duration::from_secs(60),
            ..RosterCacheConfig::default()
        };
        let cache = Arc::new(RosterCache::new(provider.clone(), config));
        let matcher = TeamNormalizer::new(cache);

        matcher.resolve("Duke").await.unwrap();
        tokio::time::advance(Duration::from_secs(59)).await;
        matcher.resolve("Duke").await.unwrap();
        assert_eq!(provider.calls(), 1);

        tokio::time::advance(Duration::from_secs(1)).await;
        matcher.resolve("Duke").await.unwrap();
        assert_eq!(provider.calls(), 2);
    }
}
