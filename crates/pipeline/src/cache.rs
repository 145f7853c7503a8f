//! TTL caches: the result cache and the shared reference-data cache.
//!
//! Both are pure optimizations. A miss always recomputes an equivalent
//! result, so pipeline correctness never depends on cache presence. Methods
//! take an explicit `now` so expiry can be driven by a simulated clock in
//! tests; the `get`/`put` convenience wrappers use the wall clock.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;

use adsim_core::{CampaignId, MetricKind, Timeframe};

/// Deterministic fingerprint of a simulation's cacheable identity.
///
/// Stable over (campaign id, timeframe, sorted metric kinds): two requests
/// for the same campaign, window, and metric set hit the same entry no
/// matter how the metrics were ordered.
pub fn result_fingerprint(
    campaign_id: CampaignId,
    timeframe: &Timeframe,
    metrics: &[MetricKind],
) -> String {
    let mut kinds: Vec<&str> = metrics.iter().map(|m| m.as_str()).collect();
    kinds.sort_unstable();
    kinds.dedup();
    format!(
        "{}|{}|{}",
        campaign_id,
        timeframe.fingerprint_component(),
        kinds.join(",")
    )
}

#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    expires_at: DateTime<Utc>,
}

/// Cached simulation results keyed by fingerprint.
#[derive(Debug, Default)]
pub struct ResultCache {
    entries: RwLock<HashMap<String, Entry<JsonValue>>>,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a fingerprint. An expired entry is a miss and is evicted on
    /// the way out.
    pub fn get_at(&self, fingerprint: &str, now: DateTime<Utc>) -> Option<JsonValue> {
        {
            let entries = self.entries.read().ok()?;
            match entries.get(fingerprint) {
                Some(entry) if entry.expires_at > now => return Some(entry.value.clone()),
                Some(_) => {}
                None => return None,
            }
        }
        // Lazy eviction of the expired entry.
        if let Ok(mut entries) = self.entries.write() {
            if entries
                .get(fingerprint)
                .is_some_and(|e| e.expires_at <= now)
            {
                entries.remove(fingerprint);
            }
        }
        None
    }

    pub fn put_at(&self, fingerprint: String, value: JsonValue, ttl: Duration, now: DateTime<Utc>) {
        let expires_at = now + chrono::Duration::from_std(ttl).unwrap_or_default();
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(fingerprint, Entry { value, expires_at });
        }
    }

    pub fn get(&self, fingerprint: &str) -> Option<JsonValue> {
        self.get_at(fingerprint, Utc::now())
    }

    pub fn put(&self, fingerprint: String, value: JsonValue, ttl: Duration) {
        self.put_at(fingerprint, value, ttl, Utc::now())
    }

    /// Drop every expired entry. Callers may run this periodically; normal
    /// operation relies on lazy eviction alone.
    pub fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let Ok(mut entries) = self.entries.write() else {
            return 0;
        };
        let before = entries.len();
        entries.retain(|_, e| e.expires_at > now);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Default TTL for shared reference data (benchmark tables, competitor
/// profiles). Stale reads are acceptable; this is a soft-consistency cache.
pub const REFERENCE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Read-through TTL cache for shared reference data.
///
/// Read by many workers concurrently, written only by the refresh path
/// inside `get_or_fetch_at`. Values are cloned out, so `V` should be cheap
/// to clone or wrapped in `Arc` by the caller.
#[derive(Debug)]
pub struct ReferenceCache<V: Clone> {
    entries: RwLock<HashMap<String, Entry<V>>>,
    ttl: Duration,
}

impl<V: Clone> ReferenceCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Return the cached value, or fetch, store, and return it. A fetch
    /// error is propagated and nothing is cached.
    pub fn get_or_fetch_at<E, F>(&self, key: &str, now: DateTime<Utc>, fetch: F) -> Result<V, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        if let Ok(entries) = self.entries.read() {
            if let Some(entry) = entries.get(key) {
                if entry.expires_at > now {
                    return Ok(entry.value.clone());
                }
            }
        }

        let value = fetch()?;
        let expires_at = now + chrono::Duration::from_std(self.ttl).unwrap_or_default();
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(
                key.to_string(),
                Entry {
                    value: value.clone(),
                    expires_at,
                },
            );
        }
        Ok(value)
    }
}

impl<V: Clone> Default for ReferenceCache<V> {
    fn default() -> Self {
        Self::new(REFERENCE_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    use adsim_core::Granularity;

    fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn timeframe() -> Timeframe {
        Timeframe::new(utc(2026, 4, 1), utc(2026, 5, 1), Granularity::Daily)
    }

    #[test]
    fn fingerprint_ignores_metric_order() {
        let id = CampaignId::new();
        let tf = timeframe();
        let a = result_fingerprint(id, &tf, &[MetricKind::Ctr, MetricKind::Cpc]);
        let b = result_fingerprint(id, &tf, &[MetricKind::Cpc, MetricKind::Ctr]);
        assert_eq!(a, b);

        let c = result_fingerprint(id, &tf, &[MetricKind::Ctr]);
        assert_ne!(a, c);
        let d = result_fingerprint(CampaignId::new(), &tf, &[MetricKind::Ctr, MetricKind::Cpc]);
        assert_ne!(a, d);
    }

    #[test]
    fn round_trip_then_expiry_under_simulated_clock() {
        let cache = ResultCache::new();
        let t0 = utc(2026, 3, 1);
        let value = serde_json::json!({"score": 72.5});

        cache.put_at("fp".to_string(), value.clone(), Duration::from_secs(60), t0);
        assert_eq!(cache.get_at("fp", t0), Some(value.clone()));
        assert_eq!(
            cache.get_at("fp", t0 + chrono::Duration::seconds(59)),
            Some(value)
        );

        // At exactly the TTL boundary the entry is expired: a miss, and
        // lazily evicted.
        assert_eq!(cache.get_at("fp", t0 + chrono::Duration::seconds(60)), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn purge_drops_only_expired_entries() {
        let cache = ResultCache::new();
        let t0 = utc(2026, 3, 1);
        cache.put_at("a".to_string(), serde_json::json!(1), Duration::from_secs(10), t0);
        cache.put_at("b".to_string(), serde_json::json!(2), Duration::from_secs(1000), t0);

        let purged = cache.purge_expired(t0 + chrono::Duration::seconds(100));
        assert_eq!(purged, 1);
        assert_eq!(cache.len(), 1);
        assert!(cache
            .get_at("b", t0 + chrono::Duration::seconds(100))
            .is_some());
    }

    #[test]
    fn reference_cache_reads_through_once_per_ttl() {
        let cache: ReferenceCache<u32> = ReferenceCache::new(Duration::from_secs(60));
        let t0 = utc(2026, 3, 1);
        let mut fetches = 0;

        let v = cache
            .get_or_fetch_at("key", t0, || -> Result<u32, ()> {
                fetches += 1;
                Ok(7)
            })
            .unwrap();
        assert_eq!(v, 7);

        // Within the TTL the fetcher is not consulted again.
        let v = cache
            .get_or_fetch_at(
                "key",
                t0 + chrono::Duration::seconds(30),
                || -> Result<u32, ()> {
                    fetches += 1;
                    Ok(9)
                },
            )
            .unwrap();
        assert_eq!(v, 7);
        assert_eq!(fetches, 1);

        // Past the TTL it refreshes.
        let v = cache
            .get_or_fetch_at(
                "key",
                t0 + chrono::Duration::seconds(120),
                || -> Result<u32, ()> {
                    fetches += 1;
                    Ok(9)
                },
            )
            .unwrap();
        assert_eq!(v, 9);
        assert_eq!(fetches, 2);
    }

    #[test]
    fn reference_cache_does_not_store_failed_fetches() {
        let cache: ReferenceCache<u32> = ReferenceCache::new(Duration::from_secs(60));
        let t0 = utc(2026, 3, 1);

        let err: Result<u32, &str> = cache.get_or_fetch_at("key", t0, || Err("offline"));
        assert!(err.is_err());

        let v = cache
            .get_or_fetch_at("key", t0, || -> Result<u32, &str> { Ok(3) })
            .unwrap();
        assert_eq!(v, 3);
    }
}
