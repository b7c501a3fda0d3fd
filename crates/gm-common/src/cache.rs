//! 순위 결과 페이지용 LRU 캐시.
//!
//! 항목은 고정 TTL 이 지나면 만료된다. 키에 분류체계 버전, 카탈로그 데이터 버전,
//! 채점 기준일이 모두 들어가므로 어느 쪽이 바뀌어도 캐시를 타지 않는다.
//! 자정이 지나면 전날 기준으로 채점된 항목은 조회되지 않는다.

use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use lru::LruCache;
use tracing::{debug, warn};

use crate::{
    explanation::{ExplainOptions, Locale},
    matching::{QueryKind, RankOptions},
};

pub const METRIC_CACHE_HITS: &str = "gm_result_cache_hits_total";
pub const METRIC_CACHE_MISSES: &str = "gm_result_cache_misses_total";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub kind: QueryKind,
    pub organization_id: String,
    pub taxonomy_version: String,
    pub data_version: String,
    /// 채점 기준일
    pub scored_on: NaiveDate,
    pub locale: Locale,
    pub max_reasons: Option<usize>,
    pub offset: usize,
    pub limit: usize,
}

impl CacheKey {
    pub fn new(
        kind: QueryKind,
        organization_id: &str,
        taxonomy_version: &str,
        data_version: &str,
        scored_on: NaiveDate,
        options: &RankOptions,
    ) -> Self {
        let ExplainOptions {
            locale,
            max_reasons,
        } = options.explain;
        Self {
            kind,
            organization_id: organization_id.to_string(),
            taxonomy_version: taxonomy_version.to_string(),
            data_version: data_version.to_string(),
            scored_on,
            locale,
            max_reasons,
            offset: options.page.offset,
            limit: options.page.limit,
        }
    }
}

struct CachedEntry<V> {
    value: V,
    cached_at: Instant,
}

pub struct ResultCache<V> {
    /// 용량 0 이면 None (캐시 비활성)
    entries: Option<Mutex<LruCache<CacheKey, CachedEntry<V>>>>,
    ttl: Duration,
}

impl<V: Clone> ResultCache<V> {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            entries: NonZeroUsize::new(capacity).map(|cap| Mutex::new(LruCache::new(cap))),
            ttl,
        }
    }

    pub fn disabled() -> Self {
        Self::new(0, Duration::ZERO)
    }

    pub fn is_enabled(&self) -> bool {
        self.entries.is_some()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn lock(
        entries: &Mutex<LruCache<CacheKey, CachedEntry<V>>>,
    ) -> MutexGuard<'_, LruCache<CacheKey, CachedEntry<V>>> {
        entries.lock().unwrap_or_else(|poisoned| {
            warn!("result cache lock poisoned; recovering");
            entries.clear_poison();
            poisoned.into_inner()
        })
    }

    pub fn get(&self, key: &CacheKey) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    pub fn get_at(&self, key: &CacheKey, now: Instant) -> Option<V> {
        let entries = self.entries.as_ref()?;
        let mut cache = Self::lock(entries);

        let hit = match cache.get(key) {
            Some(entry) if now.saturating_duration_since(entry.cached_at) < self.ttl => {
                Some(entry.value.clone())
            }
            Some(_) => {
                cache.pop(key);
                debug!(query = key.kind.as_ref(), "result cache entry expired");
                None
            }
            None => None,
        };

        let metric = if hit.is_some() {
            METRIC_CACHE_HITS
        } else {
            METRIC_CACHE_MISSES
        };
        metrics::counter!(metric, "query" => <&'static str>::from(key.kind)).increment(1);
        hit
    }

    pub fn insert(&self, key: CacheKey, value: V) {
        self.insert_at(key, value, Instant::now());
    }

    pub fn insert_at(&self, key: CacheKey, value: V, now: Instant) {
        let Some(entries) = self.entries.as_ref() else {
            return;
        };
        Self::lock(entries).put(
            key,
            CachedEntry {
                value,
                cached_at: now,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries
            .as_ref()
            .map_or(0, |entries| Self::lock(entries).len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        if let Some(entries) = self.entries.as_ref() {
            Self::lock(entries).clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::Page;

    fn scored_on() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
    }

    fn key(org: &str, data_version: &str) -> CacheKey {
        CacheKey::new(
            QueryKind::Programs,
            org,
            "builtin-2025.1",
            data_version,
            scored_on(),
            &RankOptions::default(),
        )
    }

    #[test]
    fn returns_fresh_entries_and_expires_old_ones() {
        let cache = ResultCache::new(4, Duration::from_secs(60));
        let start = Instant::now();
        cache.insert_at(key("org-1", "v1"), 42u8, start);

        assert_eq!(cache.get_at(&key("org-1", "v1"), start + Duration::from_secs(59)), Some(42));
        assert_eq!(cache.get_at(&key("org-1", "v1"), start + Duration::from_secs(60)), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn data_version_is_part_of_the_key() {
        let cache = ResultCache::new(4, Duration::from_secs(60));
        cache.insert(key("org-1", "v1"), 1u8);
        assert_eq!(cache.get(&key("org-1", "v2")), None);
        assert_eq!(cache.get(&key("org-1", "v1")), Some(1));
    }

    #[test]
    fn scoring_date_is_part_of_the_key() {
        let cache = ResultCache::new(4, Duration::from_secs(24 * 60 * 60));
        cache.insert(key("org-1", "v1"), 1u8);

        let mut next_day = key("org-1", "v1");
        next_day.scored_on = scored_on().succ_opt().unwrap();
        assert_eq!(cache.get(&next_day), None);
        assert_eq!(cache.get(&key("org-1", "v1")), Some(1));
    }

    #[test]
    fn page_and_locale_are_part_of_the_key() {
        let first = key("org-1", "v1");
        let mut second_page = first.clone();
        second_page.offset = Page::default().limit;
        let mut english = first.clone();
        english.locale = Locale::En;

        assert_ne!(first, second_page);
        assert_ne!(first, english);
    }

    #[test]
    fn evicts_least_recently_used() {
        let cache = ResultCache::new(2, Duration::from_secs(60));
        cache.insert(key("a", "v"), 1u8);
        cache.insert(key("b", "v"), 2u8);
        assert_eq!(cache.get(&key("a", "v")), Some(1));
        cache.insert(key("c", "v"), 3u8);

        assert_eq!(cache.get(&key("b", "v")), None);
        assert_eq!(cache.get(&key("a", "v")), Some(1));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn zero_capacity_disables_caching() {
        let cache = ResultCache::<u8>::disabled();
        cache.insert(key("a", "v"), 1);
        assert!(!cache.is_enabled());
        assert_eq!(cache.get(&key("a", "v")), None);
    }
}
