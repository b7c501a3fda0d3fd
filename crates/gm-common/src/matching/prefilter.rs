use tracing::warn;

use super::{
    partner::is_same_organization,
    pipeline::{Candidate, QueryKind},
    scoring::PARTIAL_RELEVANCE,
};
use crate::{taxonomy::Taxonomy, Organization, Program};

/// 점수 계산 전에 후보를 줄이는 설정
#[derive(Debug, Clone)]
pub struct PreFilterConfig {
    /// 한 번의 질의에서 채점할 최대 후보 수 (소프트 상한)
    pub max_candidates: usize,
    /// 상한 초과 시 재조회 대상으로 삼을 섹터 연관도 하한
    pub related_relevance: f64,
}

impl Default for PreFilterConfig {
    fn default() -> Self {
        Self {
            max_candidates: 3000,
            related_relevance: PARTIAL_RELEVANCE,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EnhancedPreFilter {
    config: PreFilterConfig,
}

impl Default for EnhancedPreFilter {
    fn default() -> Self {
        Self::new(PreFilterConfig::default())
    }
}

impl EnhancedPreFilter {
    pub fn new(config: PreFilterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PreFilterConfig {
        &self.config
    }

    /// 마감(비활성) 사업과 지원 대상이 아닌 사업을 제외
    pub fn retain_programs(&self, org: &Organization, programs: Vec<Program>) -> Vec<Program> {
        programs
            .into_iter()
            .filter(|program| program.is_active() && program.accepts(org.kind))
            .collect()
    }

    /// 요청 기관 자신을 파트너 후보에서 제외
    pub fn retain_partners(
        &self,
        org: &Organization,
        candidates: Vec<Organization>,
    ) -> Vec<Organization> {
        candidates
            .into_iter()
            .filter(|candidate| !is_same_organization(org, candidate))
            .collect()
    }

    pub fn exceeds_ceiling(&self, count: usize) -> bool {
        count > self.config.max_candidates
    }

    /// 상한 초과 시 재조회에 쓸 섹터 라벨 (연관 섹터의 id·명칭)
    ///
    /// 기관 섹터를 해석할 수 없으면 좁힐 기준이 없으므로 None.
    pub fn narrowed_sectors(
        &self,
        org: &Organization,
        taxonomy: &Taxonomy,
    ) -> Option<Vec<String>> {
        let sector = taxonomy.resolve_sector(org.industry_sector.as_deref()?)?;
        let labels = taxonomy
            .related_sectors(&sector.id, self.config.related_relevance)
            .into_iter()
            .flat_map(|related| {
                [
                    related.id.clone(),
                    related.name.clone(),
                    related.name_en.clone(),
                ]
            })
            .collect();
        Some(labels)
    }

    /// 그래도 상한을 넘으면 id 순으로 잘라낸다 (결정적)
    pub fn enforce_ceiling<C: Candidate>(
        &self,
        kind: QueryKind,
        mut candidates: Vec<C>,
    ) -> Vec<C> {
        let limit = self.config.max_candidates;
        if candidates.len() <= limit {
            return candidates;
        }

        warn!(
            query = kind.as_ref(),
            fetched = candidates.len(),
            max_candidates = limit,
            "candidate set exceeds soft ceiling; truncating by id"
        );
        candidates.sort_by(|a, b| a.candidate_id().cmp(&b.candidate_id()));
        candidates.truncate(limit);
        candidates
    }
}
