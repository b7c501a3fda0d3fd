use std::sync::Arc;

use chrono::{Local, NaiveDate};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, IntoStaticStr};
use thiserror::Error;
use tracing::{debug, warn};

use super::{
    partner::{CompatibilityScore, PartnerCompatibilityScorer},
    scoring::{MatchScore, ProgramMatchScorer},
};
use crate::{
    catalog::CatalogError,
    explanation::{explain, ExplainOptions, Explainable, Explanation},
    taxonomy::Taxonomy,
    Organization, OrganizationKind, Program, TrlRange,
};

pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const MAX_PAGE_SIZE: usize = 200;

pub const METRIC_CANDIDATES_SCORED: &str = "gm_candidates_scored_total";
pub const METRIC_CANDIDATES_FAILED: &str = "gm_candidates_failed_total";

/// 질의 종류 ("X 기관에 맞는 사업" / "X 기관에 맞는 파트너")
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum QueryKind {
    Programs,
    Partners,
}

/// 후보 단위 입력 오류. 해당 후보만 제외하고 나머지는 계속 채점한다.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CandidateError {
    #[error("candidate has no identifier")]
    MissingId,
    #[error("{field} = {value} is outside TRL {min}-{max}", min = TrlRange::LOWEST, max = TrlRange::HIGHEST)]
    InvalidTrl { field: &'static str, value: u8 },
}

impl CandidateError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingId => "missing_id",
            Self::InvalidTrl { .. } => "invalid_trl",
        }
    }
}

#[derive(Debug, Error)]
pub enum AssemblyError {
    #[error("no eligible matches: all {candidates} candidates failed validation")]
    NoEligibleMatches { candidates: usize },
    #[error("invalid requesting organization: {0}")]
    InvalidOrganization(#[source] CandidateError),
    #[error("organization {0} not found")]
    UnknownOrganization(String),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("failed to build scoring worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

fn check_trl(field: &'static str, value: Option<u8>) -> Result<(), CandidateError> {
    match value {
        Some(v) if !(TrlRange::LOWEST..=TrlRange::HIGHEST).contains(&v) => {
            Err(CandidateError::InvalidTrl { field, value: v })
        }
        _ => Ok(()),
    }
}

fn required_id(id: Option<&str>) -> Result<String, CandidateError> {
    id.map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .ok_or(CandidateError::MissingId)
}

/// 채점 대상이 될 수 있는 레코드
pub trait Candidate {
    fn candidate_id(&self) -> Option<&str>;

    /// 필수 식별자와 값 범위를 확인하고 정규화된 id 를 돌려준다
    fn validate(&self) -> Result<String, CandidateError>;
}

impl Candidate for Program {
    fn candidate_id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn validate(&self) -> Result<String, CandidateError> {
        let id = required_id(self.id.as_deref())?;
        check_trl("min_trl", self.min_trl)?;
        check_trl("max_trl", self.max_trl)?;
        Ok(id)
    }
}

impl Candidate for Organization {
    fn candidate_id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn validate(&self) -> Result<String, CandidateError> {
        let id = required_id(self.id.as_deref())?;
        validate_requester(self)?;
        Ok(id)
    }
}

/// 요청 기관 자체는 id 없이도 채점할 수 있지만 TRL 값은 범위 안이어야 한다
pub fn validate_requester(org: &Organization) -> Result<(), CandidateError> {
    check_trl("current_trl", org.current_trl)?;
    check_trl("target_trl", org.target_trl)?;
    if let Some(range) = org.target_partner_trl {
        check_trl("target_partner_trl.min", range.min)?;
        check_trl("target_partner_trl.max", range.max)?;
    }
    Ok(())
}

/// 페이지 지정 (offset / limit)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Page {
    pub offset: usize,
    pub limit: usize,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Page {
    /// limit 은 1〜MAX_PAGE_SIZE 로 보정한다
    pub fn new(offset: Option<usize>, limit: Option<usize>, default_limit: usize) -> Self {
        let limit = limit.unwrap_or(default_limit).clamp(1, MAX_PAGE_SIZE);
        Self {
            offset: offset.unwrap_or(0),
            limit,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RankOptions {
    pub page: Page,
    pub explain: ExplainOptions,
}

/// 채점에서 제외된 후보
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateFailure {
    /// 입력 목록에서의 위치
    pub index: usize,
    pub candidate_id: Option<String>,
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedPage<T> {
    pub items: Vec<T>,
    /// 정렬 대상이 된 전체 후보 수 (페이지 적용 전)
    pub total: usize,
    pub offset: usize,
    pub limit: usize,
    pub failures: Vec<CandidateFailure>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramMatch {
    pub program_id: String,
    pub title: Option<String>,
    pub agency: Option<String>,
    pub deadline: Option<NaiveDate>,
    #[serde(flatten)]
    pub result: MatchScore,
    pub explanation: Explanation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartnerMatch {
    pub organization_id: String,
    pub name: Option<String>,
    pub kind: OrganizationKind,
    #[serde(flatten)]
    pub result: CompatibilityScore,
    pub explanation: Explanation,
}

struct Scored<'c, C, S> {
    id: String,
    candidate: &'c C,
    result: S,
}

#[derive(Debug, Clone, Default)]
pub struct MatchingEngineConfig {
    /// 채점 스레드 수. None 이면 가용 코어 수.
    pub worker_threads: Option<usize>,
}

/// 채점 → 정렬 → 페이지 → 설명 파이프라인
pub struct MatchingEngine {
    taxonomy: Arc<Taxonomy>,
    programs: ProgramMatchScorer,
    partners: PartnerCompatibilityScorer,
    pool: rayon::ThreadPool,
}

impl MatchingEngine {
    pub fn new(taxonomy: Arc<Taxonomy>, config: MatchingEngineConfig) -> Result<Self, AssemblyError> {
        let mut builder = rayon::ThreadPoolBuilder::new().thread_name(|i| format!("gm-score-{i}"));
        if let Some(threads) = config.worker_threads.filter(|n| *n > 0) {
            builder = builder.num_threads(threads);
        }
        let pool = builder.build()?;

        Ok(Self {
            programs: ProgramMatchScorer::new(taxonomy.clone()),
            partners: PartnerCompatibilityScorer::new(taxonomy.clone()),
            taxonomy,
            pool,
        })
    }

    pub fn taxonomy(&self) -> &Arc<Taxonomy> {
        &self.taxonomy
    }

    pub fn worker_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// scoreProgramMatches: 사업 목록을 점수 내림차순으로 정렬하고 설명을 붙인다
    pub fn rank_programs(
        &self,
        org: &Organization,
        programs: &[Program],
        options: &RankOptions,
    ) -> Result<RankedPage<ProgramMatch>, AssemblyError> {
        self.rank_programs_at(org, programs, options, Local::now().date_naive())
    }

    pub fn rank_programs_at(
        &self,
        org: &Organization,
        programs: &[Program],
        options: &RankOptions,
        today: NaiveDate,
    ) -> Result<RankedPage<ProgramMatch>, AssemblyError> {
        validate_requester(org).map_err(AssemblyError::InvalidOrganization)?;

        let (scored, failures) = self.score_batch(QueryKind::Programs, programs, |program| {
            self.programs.score_at(org, program, today)
        })?;

        Ok(assemble(scored, failures, options, |program, id, result, explanation| {
            ProgramMatch {
                program_id: id,
                title: program.title.clone(),
                agency: program.agency.clone(),
                deadline: program.deadline,
                result,
                explanation,
            }
        }))
    }

    /// scorePartnerCandidates: 요청 기관 관점의 파트너 호환성 순위
    pub fn rank_partners(
        &self,
        org: &Organization,
        candidates: &[Organization],
        options: &RankOptions,
    ) -> Result<RankedPage<PartnerMatch>, AssemblyError> {
        validate_requester(org).map_err(AssemblyError::InvalidOrganization)?;

        let (scored, failures) = self.score_batch(QueryKind::Partners, candidates, |partner| {
            self.partners.score(org, partner)
        })?;

        Ok(assemble(scored, failures, options, |partner, id, result, explanation| {
            PartnerMatch {
                organization_id: id,
                name: partner.name.clone(),
                kind: partner.kind,
                result,
                explanation,
            }
        }))
    }

    fn score_batch<'c, C, S, F>(
        &self,
        kind: QueryKind,
        candidates: &'c [C],
        score: F,
    ) -> Result<(Vec<Scored<'c, C, S>>, Vec<CandidateFailure>), AssemblyError>
    where
        C: Candidate + Sync,
        S: Explainable + Send,
        F: Fn(&C) -> S + Sync,
    {
        let outcomes: Vec<Result<Scored<'c, C, S>, CandidateFailure>> = self.pool.install(|| {
            candidates
                .par_iter()
                .enumerate()
                .map(|(index, candidate)| match candidate.validate() {
                    Ok(id) => Ok(Scored {
                        id,
                        candidate,
                        result: score(candidate),
                    }),
                    Err(err) => Err(CandidateFailure {
                        index,
                        candidate_id: candidate.candidate_id().map(str::to_string),
                        code: err.code().to_string(),
                        message: err.to_string(),
                    }),
                })
                .collect()
        });

        let mut scored = Vec::with_capacity(outcomes.len());
        let mut failures = Vec::new();
        for outcome in outcomes {
            match outcome {
                Ok(item) => scored.push(item),
                Err(failure) => {
                    warn!(
                        query = kind.as_ref(),
                        index = failure.index,
                        candidate_id = failure.candidate_id.as_deref().unwrap_or("-"),
                        error = %failure.message,
                        "skipping malformed candidate"
                    );
                    failures.push(failure);
                }
            }
        }

        metrics::counter!(METRIC_CANDIDATES_SCORED, "query" => <&'static str>::from(kind))
            .increment(scored.len() as u64);
        metrics::counter!(METRIC_CANDIDATES_FAILED, "query" => <&'static str>::from(kind))
            .increment(failures.len() as u64);

        if !candidates.is_empty() && scored.is_empty() {
            return Err(AssemblyError::NoEligibleMatches {
                candidates: candidates.len(),
            });
        }

        // 점수 내림차순, 동점이면 id 오름차순 (안정 정렬)
        scored.sort_by(|a, b| {
            b.result
                .total()
                .cmp(&a.result.total())
                .then_with(|| a.id.cmp(&b.id))
        });

        debug!(
            query = kind.as_ref(),
            scored = scored.len(),
            failed = failures.len(),
            "scored candidate batch"
        );

        Ok((scored, failures))
    }
}

fn assemble<C, S, T, B>(
    scored: Vec<Scored<'_, C, S>>,
    failures: Vec<CandidateFailure>,
    options: &RankOptions,
    build: B,
) -> RankedPage<T>
where
    S: Explainable,
    B: Fn(&C, String, S, Explanation) -> T,
{
    let total = scored.len();
    let items = scored
        .into_iter()
        .skip(options.page.offset)
        .take(options.page.limit)
        .map(|item| {
            let explanation = explain(&item.result, &options.explain);
            build(item.candidate, item.id, item.result, explanation)
        })
        .collect();

    RankedPage {
        items,
        total,
        offset: options.page.offset,
        limit: options.page.limit,
        failures,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{explanation::Locale, ScaleBracket};

    fn engine() -> MatchingEngine {
        MatchingEngine::new(
            Arc::new(Taxonomy::builtin()),
            MatchingEngineConfig {
                worker_threads: Some(2),
            },
        )
        .unwrap()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
    }

    fn org() -> Organization {
        Organization {
            id: Some("org-1".into()),
            kind: OrganizationKind::Company,
            industry_sector: Some("ICT".into()),
            current_trl: Some(6),
            has_rd_experience: true,
            key_technologies: vec!["인공지능".into(), "반도체".into()],
            ..Organization::default()
        }
    }

    fn program(id: &str, keywords: &[&str]) -> Program {
        Program {
            id: Some(id.into()),
            title: Some(format!("사업 {id}")),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            min_trl: Some(4),
            max_trl: Some(7),
            deadline: NaiveDate::from_ymd_opt(2025, 4, 15),
            ..Program::default()
        }
    }

    #[test]
    fn query_kind_labels_match_wire_names() {
        let cases = [
            (QueryKind::Programs, "programs"),
            (QueryKind::Partners, "partners"),
        ];
        for (kind, label) in cases {
            assert_eq!(kind.as_ref(), label);
            assert_eq!(<&'static str>::from(kind), label);
            assert_eq!(serde_json::to_value(kind).unwrap(), label);
        }
    }

    #[test]
    fn ranks_descending_and_breaks_ties_by_id() {
        let programs = vec![
            program("b-weak", &[]),
            program("c-strong", &["인공지능", "반도체"]),
            program("a-weak", &[]),
        ];
        let page = engine()
            .rank_programs_at(&org(), &programs, &RankOptions::default(), today())
            .unwrap();

        let ids: Vec<_> = page.items.iter().map(|m| m.program_id.as_str()).collect();
        assert_eq!(ids, vec!["c-strong", "a-weak", "b-weak"]);
        assert!(page.items[0].result.score > page.items[1].result.score);
        assert_eq!(page.items[1].result.score, page.items[2].result.score);
        assert_eq!(page.total, 3);
    }

    #[test]
    fn malformed_candidates_are_skipped_not_fatal() {
        let mut no_id = program("x", &[]);
        no_id.id = Some("   ".into());
        let mut bad_trl = program("bad-trl", &[]);
        bad_trl.max_trl = Some(12);

        let page = engine()
            .rank_programs_at(
                &org(),
                &[no_id, program("ok", &[]), bad_trl],
                &RankOptions::default(),
                today(),
            )
            .unwrap();

        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].program_id, "ok");
        assert_eq!(page.failures.len(), 2);
        assert_eq!(page.failures[0].index, 0);
        assert_eq!(page.failures[0].code, "missing_id");
        assert_eq!(page.failures[1].candidate_id.as_deref(), Some("bad-trl"));
        assert_eq!(page.failures[1].code, "invalid_trl");
    }

    #[test]
    fn all_failed_candidates_report_no_eligible_matches() {
        let result = engine().rank_programs_at(
            &org(),
            &[Program::default(), Program::default()],
            &RankOptions::default(),
            today(),
        );
        assert!(matches!(
            result,
            Err(AssemblyError::NoEligibleMatches { candidates: 2 })
        ));
    }

    #[test]
    fn empty_candidate_list_is_an_empty_page() {
        let page = engine()
            .rank_programs_at(&org(), &[], &RankOptions::default(), today())
            .unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total, 0);
    }

    #[test]
    fn invalid_requester_is_rejected() {
        let mut requester = org();
        requester.current_trl = Some(0);
        let result = engine().rank_partners(&requester, &[], &RankOptions::default());
        assert!(matches!(result, Err(AssemblyError::InvalidOrganization(_))));
    }

    #[test]
    fn paginates_after_sorting() {
        let programs: Vec<Program> = (0..5).map(|i| program(&format!("p-{i}"), &[])).collect();
        let options = RankOptions {
            page: Page::new(Some(1), Some(2), DEFAULT_PAGE_SIZE),
            ..RankOptions::default()
        };
        let page = engine()
            .rank_programs_at(&org(), &programs, &options, today())
            .unwrap();

        let ids: Vec<_> = page.items.iter().map(|m| m.program_id.as_str()).collect();
        assert_eq!(ids, vec!["p-1", "p-2"]);
        assert_eq!(page.total, 5);
        assert_eq!((page.offset, page.limit), (1, 2));
    }

    #[test]
    fn page_limits_are_clamped() {
        assert_eq!(Page::new(None, None, 20).limit, 20);
        assert_eq!(Page::new(None, Some(0), 20).limit, 1);
        assert_eq!(Page::new(None, Some(10_000), 20).limit, MAX_PAGE_SIZE);
    }

    #[test]
    fn explanations_respect_reason_limit() {
        let options = RankOptions {
            explain: ExplainOptions::new(Locale::En, Some(2)),
            ..RankOptions::default()
        };
        let page = engine()
            .rank_programs_at(&org(), &[program("p", &["인공지능"])], &options, today())
            .unwrap();

        let item = &page.items[0];
        assert!(item.result.reason_codes.len() > 2);
        assert_eq!(item.explanation.reasons.len(), 2);
        assert!(item.explanation.summary.contains("사업 p"));
    }

    #[test]
    fn ranks_partners_with_explanations() {
        let mut near = Organization {
            id: Some("near".into()),
            name: Some("가까운 기관".into()),
            industry_sector: Some("ICT".into()),
            current_trl: Some(6),
            has_rd_experience: true,
            scale: Some(ScaleBracket::Small),
            ..Organization::default()
        };
        near.key_technologies = vec!["반도체".into()];
        let far = Organization {
            id: Some("far".into()),
            industry_sector: Some("AGRI_FOOD".into()),
            current_trl: Some(1),
            ..Organization::default()
        };

        let mut requester = org();
        requester.scale = Some(ScaleBracket::Small);
        let page = engine()
            .rank_partners(&requester, &[far, near], &RankOptions::default())
            .unwrap();

        assert_eq!(page.items[0].organization_id, "near");
        assert!(page.items[0].result.score > page.items[1].result.score);
        assert!(page.items[0].explanation.summary.contains("가까운 기관"));
    }

    #[test]
    fn parallel_scoring_matches_sequential_scoring() {
        let programs: Vec<Program> = (0..64)
            .map(|i| {
                let keywords: &[&str] = if i % 3 == 0 { &["인공지능"] } else { &[] };
                program(&format!("p-{i:02}"), keywords)
            })
            .collect();
        let options = RankOptions {
            page: Page::new(None, Some(MAX_PAGE_SIZE), DEFAULT_PAGE_SIZE),
            ..RankOptions::default()
        };

        let engine = engine();
        let first = engine
            .rank_programs_at(&org(), &programs, &options, today())
            .unwrap();
        let second = engine
            .rank_programs_at(&org(), &programs, &options, today())
            .unwrap();
        assert_eq!(first, second);

        let scorer = ProgramMatchScorer::new(engine.taxonomy().clone());
        for item in &first.items {
            let program = programs
                .iter()
                .find(|p| p.id.as_deref() == Some(item.program_id.as_str()))
                .unwrap();
            assert_eq!(item.result, scorer.score_at(&org(), program, today()));
        }
    }
}
