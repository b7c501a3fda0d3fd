use std::env;
use std::time::Duration;

use crate::matching::{PreFilterConfig, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

pub const DEFAULT_MAX_CANDIDATES: usize = 3000;
pub const DEFAULT_CACHE_TTL_SECS: u64 = 6 * 60 * 60;
pub const DEFAULT_CACHE_CAPACITY: usize = 1024;

/// 매칭 조립 계층 설정 (환경 변수에서 읽음)
#[derive(Debug, Clone, PartialEq)]
pub struct AssemblyConfig {
    /// 한 질의에서 채점할 최대 후보 수 (기본: 3000)
    pub max_candidates: usize,
    /// 결과 캐시 유효 시간 (기본: 6시간)
    pub cache_ttl: Duration,
    /// 결과 캐시 항목 수 (0 이면 캐시 비활성)
    pub cache_capacity: usize,
    /// limit 미지정 시 페이지 크기 (기본: 20, 최대 200)
    pub default_page_size: usize,
    /// 채점 스레드 수. None 이면 가용 코어 수.
    pub worker_threads: Option<usize>,
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            max_candidates: DEFAULT_MAX_CANDIDATES,
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            default_page_size: DEFAULT_PAGE_SIZE,
            worker_threads: None,
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|raw| raw.trim().parse().ok())
}

impl AssemblyConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_candidates: parse_env::<usize>("GM_MAX_CANDIDATES")
                .filter(|value| *value > 0)
                .unwrap_or(defaults.max_candidates),
            cache_ttl: parse_env::<u64>("GM_CACHE_TTL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.cache_ttl),
            cache_capacity: parse_env("GM_CACHE_CAPACITY").unwrap_or(defaults.cache_capacity),
            default_page_size: parse_env::<usize>("GM_DEFAULT_PAGE_SIZE")
                .map(|size| size.clamp(1, MAX_PAGE_SIZE))
                .unwrap_or(defaults.default_page_size),
            worker_threads: parse_env::<usize>("GM_WORKER_THREADS").filter(|value| *value > 0),
        }
    }

    pub fn prefilter(&self) -> PreFilterConfig {
        PreFilterConfig {
            max_candidates: self.max_candidates,
            ..PreFilterConfig::default()
        }
    }
}
