use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::matching::{CandidateFailure, QueryKind, RankedPage};

/// 순위 결과 응답
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchListResponse<T> {
    pub query: QueryKind,
    /// 정렬 대상이 된 전체 후보 수
    pub total: usize,
    pub offset: usize,
    pub limit: usize,
    pub results: Vec<T>,
    /// 입력 오류로 제외된 후보
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<CandidateFailure>,

    // === 메타데이터 ===
    pub taxonomy_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_version: Option<String>,
    pub engine_version: String,
    pub generated_at: DateTime<Utc>,
}

impl<T> MatchListResponse<T> {
    pub fn from_page(
        query: QueryKind,
        page: RankedPage<T>,
        taxonomy_version: &str,
        generated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            query,
            total: page.total,
            offset: page.offset,
            limit: page.limit,
            results: page.items,
            skipped: page.failures,
            taxonomy_version: taxonomy_version.to_string(),
            data_version: None,
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            generated_at,
        }
    }

    pub fn with_data_version(mut self, version: impl Into<String>) -> Self {
        self.data_version = Some(version.into());
        self
    }
}
