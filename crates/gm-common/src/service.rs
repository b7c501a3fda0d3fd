use std::sync::Arc;

use chrono::{Local, NaiveDate};
use tracing::{debug, info};

use crate::{
    cache::{CacheKey, ResultCache},
    catalog::{CandidateSource, OrganizationFilter, ProgramFilter},
    config::AssemblyConfig,
    matching::{
        AssemblyError, Candidate, EnhancedPreFilter, MatchingEngine, MatchingEngineConfig,
        PartnerMatch, ProgramMatch, QueryKind, RankOptions, RankedPage,
    },
    taxonomy::Taxonomy,
    Organization, Program,
};

/// 카탈로그 기반 "기관 X 에 맞는 상위 N" 질의
pub struct MatchingService {
    source: Arc<dyn CandidateSource>,
    engine: MatchingEngine,
    prefilter: EnhancedPreFilter,
    program_cache: ResultCache<RankedPage<ProgramMatch>>,
    partner_cache: ResultCache<RankedPage<PartnerMatch>>,
    config: AssemblyConfig,
}

impl MatchingService {
    pub fn new(
        source: Arc<dyn CandidateSource>,
        taxonomy: Arc<Taxonomy>,
        config: AssemblyConfig,
    ) -> Result<Self, AssemblyError> {
        let engine = MatchingEngine::new(
            taxonomy,
            MatchingEngineConfig {
                worker_threads: config.worker_threads,
            },
        )?;

        info!(
            taxonomy_version = engine.taxonomy().version(),
            data_version = %source.data_version(),
            worker_threads = engine.worker_threads(),
            max_candidates = config.max_candidates,
            cache_capacity = config.cache_capacity,
            cache_ttl_secs = config.cache_ttl.as_secs(),
            "matching service ready"
        );

        Ok(Self {
            source,
            prefilter: EnhancedPreFilter::new(config.prefilter()),
            program_cache: ResultCache::new(config.cache_capacity, config.cache_ttl),
            partner_cache: ResultCache::new(config.cache_capacity, config.cache_ttl),
            engine,
            config,
        })
    }

    pub fn config(&self) -> &AssemblyConfig {
        &self.config
    }

    pub fn taxonomy(&self) -> &Arc<Taxonomy> {
        self.engine.taxonomy()
    }

    pub fn data_version(&self) -> String {
        self.source.data_version()
    }

    fn requester(&self, organization_id: &str) -> Result<(String, Organization), AssemblyError> {
        let org = self
            .source
            .organization(organization_id)?
            .ok_or_else(|| AssemblyError::UnknownOrganization(organization_id.to_string()))?;
        let id = org.validate().map_err(AssemblyError::InvalidOrganization)?;
        Ok((id, org))
    }

    fn cache_key(
        &self,
        kind: QueryKind,
        organization_id: &str,
        options: &RankOptions,
        today: NaiveDate,
    ) -> CacheKey {
        CacheKey::new(
            kind,
            organization_id,
            self.engine.taxonomy().version(),
            &self.source.data_version(),
            today,
            options,
        )
    }

    /// 활성 사업 중 기관에 맞는 상위 사업
    pub fn top_programs_for(
        &self,
        organization_id: &str,
        options: &RankOptions,
    ) -> Result<RankedPage<ProgramMatch>, AssemblyError> {
        self.top_programs_for_at(organization_id, options, Local::now().date_naive())
    }

    /// `today` 기준으로 마감일을 채점한다
    pub fn top_programs_for_at(
        &self,
        organization_id: &str,
        options: &RankOptions,
        today: NaiveDate,
    ) -> Result<RankedPage<ProgramMatch>, AssemblyError> {
        let (id, org) = self.requester(organization_id)?;
        let key = self.cache_key(QueryKind::Programs, &id, options, today);
        if let Some(hit) = self.program_cache.get(&key) {
            debug!(organization_id = %id, "program matches served from cache");
            return Ok(hit);
        }

        let mut filter = ProgramFilter {
            kind: Some(org.kind),
            sectors: None,
            active_only: true,
        };
        let mut programs = self.source.programs(&filter)?;
        if self.prefilter.exceeds_ceiling(programs.len()) {
            if let Some(sectors) = self.prefilter.narrowed_sectors(&org, self.engine.taxonomy()) {
                debug!(
                    organization_id = %id,
                    fetched = programs.len(),
                    "refetching programs narrowed to related sectors"
                );
                filter.sectors = Some(sectors);
                programs = self.source.programs(&filter)?;
            }
        }

        let programs = self.prefilter.retain_programs(&org, programs);
        let programs = self.prefilter.enforce_ceiling(QueryKind::Programs, programs);
        let page = self.engine.rank_programs_at(&org, &programs, options, today)?;

        self.program_cache.insert(key, page.clone());
        Ok(page)
    }

    /// 카탈로그의 다른 기관 중 협력 호환성이 높은 상위 파트너
    pub fn top_partners_for(
        &self,
        organization_id: &str,
        options: &RankOptions,
    ) -> Result<RankedPage<PartnerMatch>, AssemblyError> {
        let (id, org) = self.requester(organization_id)?;
        let key = self.cache_key(QueryKind::Partners, &id, options, Local::now().date_naive());
        if let Some(hit) = self.partner_cache.get(&key) {
            debug!(organization_id = %id, "partner matches served from cache");
            return Ok(hit);
        }

        let mut filter = OrganizationFilter {
            sectors: None,
            exclude_id: Some(id.clone()),
        };
        let mut candidates = self.source.organizations(&filter)?;
        if self.prefilter.exceeds_ceiling(candidates.len()) {
            if let Some(sectors) = self.prefilter.narrowed_sectors(&org, self.engine.taxonomy()) {
                debug!(
                    organization_id = %id,
                    fetched = candidates.len(),
                    "refetching partners narrowed to related sectors"
                );
                filter.sectors = Some(sectors);
                candidates = self.source.organizations(&filter)?;
            }
        }

        let candidates = self.prefilter.retain_partners(&org, candidates);
        let candidates = self.prefilter.enforce_ceiling(QueryKind::Partners, candidates);
        let page = self.engine.rank_partners(&org, &candidates, options)?;

        self.partner_cache.insert(key, page.clone());
        Ok(page)
    }

    /// 호출자가 넘긴 사업 목록을 그대로 채점 (활성 여부는 호출자 책임)
    pub fn score_programs(
        &self,
        org: &Organization,
        programs: &[Program],
        options: &RankOptions,
    ) -> Result<RankedPage<ProgramMatch>, AssemblyError> {
        self.engine.rank_programs(org, programs, options)
    }

    /// 호출자가 넘긴 파트너 후보를 채점. 요청 기관 자신은 제외한다.
    pub fn score_partners(
        &self,
        org: &Organization,
        candidates: Vec<Organization>,
        options: &RankOptions,
    ) -> Result<RankedPage<PartnerMatch>, AssemblyError> {
        let candidates = self.prefilter.retain_partners(org, candidates);
        self.engine.rank_partners(org, &candidates, options)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::{
        catalog::{CatalogError, InMemoryCatalog},
        OrganizationKind, ProgramStatus,
    };

    fn org(id: &str, sector: &str) -> Organization {
        Organization {
            id: Some(id.into()),
            name: Some(format!("기관 {id}")),
            industry_sector: Some(sector.into()),
            current_trl: Some(5),
            has_rd_experience: true,
            ..Organization::default()
        }
    }

    fn program(id: &str, sector: &str) -> Program {
        Program {
            id: Some(id.into()),
            title: Some(format!("사업 {id}")),
            sector: Some(sector.into()),
            min_trl: Some(4),
            max_trl: Some(6),
            ..Program::default()
        }
    }

    /// 호출 횟수를 세는 카탈로그
    struct CountingSource {
        inner: InMemoryCatalog,
        program_calls: AtomicUsize,
        organization_calls: AtomicUsize,
    }

    impl CountingSource {
        fn new(inner: InMemoryCatalog) -> Self {
            Self {
                inner,
                program_calls: AtomicUsize::new(0),
                organization_calls: AtomicUsize::new(0),
            }
        }
    }

    impl CandidateSource for CountingSource {
        fn programs(&self, filter: &ProgramFilter) -> Result<Vec<Program>, CatalogError> {
            self.program_calls.fetch_add(1, Ordering::SeqCst);
            self.inner.programs(filter)
        }

        fn organizations(
            &self,
            filter: &OrganizationFilter,
        ) -> Result<Vec<Organization>, CatalogError> {
            self.organization_calls.fetch_add(1, Ordering::SeqCst);
            self.inner.organizations(filter)
        }

        fn organization(&self, id: &str) -> Result<Option<Organization>, CatalogError> {
            self.inner.organization(id)
        }

        fn data_version(&self) -> String {
            self.inner.data_version()
        }
    }

    fn service_with(
        catalog: InMemoryCatalog,
        config: AssemblyConfig,
    ) -> (Arc<CountingSource>, MatchingService) {
        let source = Arc::new(CountingSource::new(catalog));
        let service = MatchingService::new(
            source.clone(),
            Arc::new(Taxonomy::builtin()),
            AssemblyConfig {
                worker_threads: Some(2),
                ..config
            },
        )
        .unwrap();
        (source, service)
    }

    fn catalog() -> InMemoryCatalog {
        let mut expired = program("p-expired", "ICT");
        expired.status = ProgramStatus::Expired;
        let mut institutes_only = program("p-institutes", "ICT");
        institutes_only.target_types = vec![OrganizationKind::ResearchInstitute];

        InMemoryCatalog::new(
            vec![
                program("p-ict", "ICT"),
                program("p-bio", "BIO_HEALTH"),
                expired,
                institutes_only,
            ],
            vec![
                org("org-1", "ICT"),
                org("org-2", "ICT"),
                org("org-3", "AGRI_FOOD"),
            ],
        )
    }

    #[test]
    fn top_programs_skip_expired_and_ineligible() {
        let (_, service) = service_with(catalog(), AssemblyConfig::default());
        let page = service
            .top_programs_for("org-1", &RankOptions::default())
            .unwrap();

        let ids: Vec<_> = page.items.iter().map(|m| m.program_id.as_str()).collect();
        assert_eq!(ids, vec!["p-ict", "p-bio"]);
    }

    #[test]
    fn top_partners_exclude_the_requester() {
        let (_, service) = service_with(catalog(), AssemblyConfig::default());
        let page = service
            .top_partners_for("org-1", &RankOptions::default())
            .unwrap();

        let ids: Vec<_> = page
            .items
            .iter()
            .map(|m| m.organization_id.as_str())
            .collect();
        assert_eq!(ids, vec!["org-2", "org-3"]);
    }

    #[test]
    fn unknown_organization_is_reported() {
        let (_, service) = service_with(catalog(), AssemblyConfig::default());
        let result = service.top_programs_for("nobody", &RankOptions::default());
        assert!(matches!(result, Err(AssemblyError::UnknownOrganization(id)) if id == "nobody"));
    }

    #[test]
    fn repeated_queries_are_served_from_cache() {
        let (source, service) = service_with(catalog(), AssemblyConfig::default());
        let first = service
            .top_programs_for("org-1", &RankOptions::default())
            .unwrap();
        let second = service
            .top_programs_for("org-1", &RankOptions::default())
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(source.program_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn cached_program_pages_do_not_outlive_the_scoring_date() {
        let (source, service) = service_with(catalog(), AssemblyConfig::default());
        let options = RankOptions::default();
        let march_1 = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let march_2 = NaiveDate::from_ymd_opt(2025, 3, 2).unwrap();

        service.top_programs_for_at("org-1", &options, march_1).unwrap();
        service.top_programs_for_at("org-1", &options, march_1).unwrap();
        assert_eq!(source.program_calls.load(Ordering::SeqCst), 1);

        service.top_programs_for_at("org-1", &options, march_2).unwrap();
        assert_eq!(source.program_calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn deadline_points_follow_the_scoring_date() {
        let mut closing = program("p-closing", "ICT");
        closing.deadline = NaiveDate::from_ymd_opt(2025, 3, 10);
        let catalog = InMemoryCatalog::new(vec![closing], vec![org("org-1", "ICT")]);
        let (_, service) = service_with(catalog, AssemblyConfig::default());
        let options = RankOptions::default();
        let february_1 = NaiveDate::from_ymd_opt(2025, 2, 1).unwrap();
        let march_9 = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();

        let early = service
            .top_programs_for_at("org-1", &options, february_1)
            .unwrap();
        let late = service
            .top_programs_for_at("org-1", &options, march_9)
            .unwrap();

        assert_eq!(early.items[0].result.breakdown.deadline, 10);
        assert_eq!(late.items[0].result.breakdown.deadline, 15);
    }

    #[test]
    fn disabled_cache_recomputes() {
        let (source, service) = service_with(
            catalog(),
            AssemblyConfig {
                cache_capacity: 0,
                ..AssemblyConfig::default()
            },
        );
        for _ in 0..2 {
            service
                .top_partners_for("org-1", &RankOptions::default())
                .unwrap();
        }
        assert_eq!(source.organization_calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn oversized_catalog_is_refetched_by_related_sectors() {
        let programs = (0..4)
            .map(|i| program(&format!("ict-{i}"), "ICT"))
            .chain((0..4).map(|i| program(&format!("env-{i}"), "ENVIRONMENT")))
            .collect();
        let catalog = InMemoryCatalog::new(programs, vec![org("org-1", "ICT")]);
        let (source, service) = service_with(
            catalog,
            AssemblyConfig {
                max_candidates: 5,
                ..AssemblyConfig::default()
            },
        );

        let page = service
            .top_programs_for("org-1", &RankOptions::default())
            .unwrap();

        assert_eq!(source.program_calls.load(Ordering::SeqCst), 2);
        assert_eq!(page.total, 4);
        assert!(page
            .items
            .iter()
            .all(|m| m.program_id.starts_with("ict-")));
    }

    #[test]
    fn direct_partner_scoring_drops_the_requester() {
        let (_, service) = service_with(catalog(), AssemblyConfig::default());
        let requester = org("org-1", "ICT");
        let page = service
            .score_partners(
                &requester,
                vec![requester.clone(), org("org-2", "ICT")],
                &RankOptions::default(),
            )
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].organization_id, "org-2");
    }
}
