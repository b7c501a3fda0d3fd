use serde::Deserialize;

use crate::{
    explanation::{ExplainOptions, Locale},
    matching::{Page, RankOptions},
    Organization, Program,
};

/// 결과 개수·설명 옵션 (본문 필드와 쿼리 문자열 공용)
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct QueryOptions {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    /// 결과마다 보여줄 근거 문장 수
    pub max_reasons: Option<usize>,
    /// "ko", "en", "ko-KR" 등. 알 수 없으면 ko.
    pub locale: Option<String>,
}

impl QueryOptions {
    pub fn rank_options(&self, default_page_size: usize) -> RankOptions {
        RankOptions {
            page: Page::new(self.offset, self.limit, default_page_size),
            explain: ExplainOptions::new(
                Locale::from_tag(self.locale.as_deref()),
                self.max_reasons,
            ),
        }
    }
}

/// POST /api/match/programs
#[derive(Debug, Clone, Deserialize)]
pub struct ProgramMatchRequest {
    pub organization: Organization,
    #[serde(default)]
    pub programs: Vec<Program>,
    #[serde(flatten)]
    pub options: QueryOptions,
}

/// POST /api/match/partners
#[derive(Debug, Clone, Deserialize)]
pub struct PartnerMatchRequest {
    pub organization: Organization,
    #[serde(default)]
    pub candidates: Vec<Organization>,
    #[serde(flatten)]
    pub options: QueryOptions,
}
