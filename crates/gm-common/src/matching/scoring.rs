use std::{collections::BTreeSet, sync::Arc};

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

use super::{
    reason::{Component, ReasonCode, ScoreFacts, SectorLabel},
    trl::score_trl,
    weights::PROGRAM_BANDS,
};
use crate::{
    normalize::{extract_keywords, normalize_term_set},
    taxonomy::{Sector, Taxonomy},
    Organization, OrganizationKind, Program,
};

/// 키워드 일치: 첫 일치 5점, 이후 1개당 2점, 최대 15점
const KEYWORD_FIRST_POINTS: u8 = 5;
const KEYWORD_EXTRA_POINTS: u8 = 2;
const KEYWORD_CAP: u8 = 15;

const SECTOR_MATCH_POINTS: u8 = 10;
const SECTOR_HIGH_RELEVANCE_POINTS: u8 = 5;
const SECTOR_PARTIAL_RELEVANCE_POINTS: u8 = 3;
pub const HIGH_RELEVANCE: f64 = 0.7;
pub const PARTIAL_RELEVANCE: f64 = 0.5;

/// 연구기관 보유기술 가산점
const TECHNOLOGY_POINTS: u8 = 2;
const TECHNOLOGY_CAP: u8 = 5;

const RD_EXPERIENCE_POINTS: u8 = 10;
const COLLABORATION_MAX_POINTS: f64 = 5.0;
/// 협력 1건마다 남은 가산점의 40% 를 얻는다
const COLLABORATION_DECAY: f64 = 0.6;

const DEADLINE_NOT_PROVIDED_POINTS: u8 = 8;

/// 지원사업 매칭 점수 내역
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramBreakdown {
    pub industry: u8,
    pub trl: u8,
    pub org_type: u8,
    pub experience: u8,
    pub deadline: u8,
}

impl ProgramBreakdown {
    pub fn total(&self) -> u8 {
        self.industry + self.trl + self.org_type + self.experience + self.deadline
    }
}

/// 지원사업 매칭 결과
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchScore {
    pub score: u8,
    pub breakdown: ProgramBreakdown,
    pub reason_codes: Vec<ReasonCode>,
    pub facts: ScoreFacts,
}

/// 협력 실적 가산점 (체감: 0, 2, 3, 4, 4, 5, ...)
pub fn collaboration_bonus(count: u32) -> u8 {
    if count == 0 {
        return 0;
    }
    let exponent = count.min(64) as i32;
    let bonus = COLLABORATION_MAX_POINTS * (1.0 - COLLABORATION_DECAY.powi(exponent));
    bonus.round() as u8
}

/// 마감까지 남은 일수에 따른 계단식 점수. 지난 마감은 0점.
pub fn deadline_points(days_left: Option<i64>) -> (u8, Option<ReasonCode>) {
    let Some(days) = days_left else {
        return (
            DEADLINE_NOT_PROVIDED_POINTS,
            Some(ReasonCode::DeadlineNotProvided),
        );
    };

    match days {
        d if d < 0 => (0, None),
        0..=14 => (15, Some(ReasonCode::DeadlineImminent)),
        15..=30 => (13, Some(ReasonCode::DeadlineSoon)),
        31..=60 => (10, Some(ReasonCode::DeadlineUpcoming)),
        61..=90 => (7, Some(ReasonCode::DeadlineAmple)),
        _ => (5, Some(ReasonCode::DeadlineDistant)),
    }
}

/// 규칙 기반 지원사업 매칭 엔진
///
/// 상태가 없는 순수 함수. 택소노미는 생성 시점에 주입받는다.
#[derive(Debug, Clone)]
pub struct ProgramMatchScorer {
    taxonomy: Arc<Taxonomy>,
}

impl ProgramMatchScorer {
    pub fn new(taxonomy: Arc<Taxonomy>) -> Self {
        Self { taxonomy }
    }

    pub fn taxonomy(&self) -> &Taxonomy {
        &self.taxonomy
    }

    /// 오늘 날짜(로컬) 기준 점수
    pub fn score(&self, org: &Organization, program: &Program) -> MatchScore {
        self.score_at(org, program, Local::now().date_naive())
    }

    /// 기준일을 지정한 점수 계산 (마감 근접도만 기준일에 의존)
    pub fn score_at(&self, org: &Organization, program: &Program, today: NaiveDate) -> MatchScore {
        let mut facts = ScoreFacts {
            subject_name: program.display_name().map(str::to_string),
            org_kind: org.kind,
            collaboration_count: org.collaboration_count,
            ..ScoreFacts::default()
        };

        let industry = self.score_industry(org, program, &mut facts);
        let trl = self.score_trl(org, program, &mut facts);
        let org_type = self.score_org_type(org, program);
        let experience = self.score_experience(org);
        let deadline = self.score_deadline(program, today, &mut facts);

        let breakdown = ProgramBreakdown {
            industry: industry.points,
            trl: trl.points,
            org_type: org_type.points,
            experience: experience.points,
            deadline: deadline.points,
        };

        // 평가 순서: 산업 → TRL → 유형 → 경험 → 마감
        let reason_codes = [&industry, &trl, &org_type, &experience, &deadline]
            .into_iter()
            .flat_map(|component| component.contributing_reasons().iter().copied())
            .collect();

        MatchScore {
            score: breakdown.total(),
            breakdown,
            reason_codes,
            facts,
        }
    }

    /// 지원사업의 섹터: 명시된 섹터 힌트 → 키워드 다수결
    pub fn program_sector(&self, program: &Program, keywords: &BTreeSet<String>) -> Option<&Sector> {
        program
            .sector
            .as_deref()
            .and_then(|hint| self.taxonomy.resolve_sector(hint))
            .or_else(|| self.taxonomy.detect_sector(keywords.iter().map(String::as_str)))
    }

    fn score_industry(
        &self,
        org: &Organization,
        program: &Program,
        facts: &mut ScoreFacts,
    ) -> Component {
        let org_keywords = extract_keywords(org, &self.taxonomy);
        let program_keywords = extract_keywords(program, &self.taxonomy);

        let mut component = Component::zero();

        let matched: Vec<String> = org_keywords
            .intersection(&program_keywords)
            .cloned()
            .collect();
        if !matched.is_empty() {
            let extra = (matched.len() - 1).min(KEYWORD_CAP as usize) as u8;
            let points = KEYWORD_FIRST_POINTS
                .saturating_add(extra.saturating_mul(KEYWORD_EXTRA_POINTS))
                .min(KEYWORD_CAP);
            component.add(points, ReasonCode::KeywordMatch);
        }
        facts.matched_keywords = matched;

        let org_sector = org
            .industry_sector
            .as_deref()
            .and_then(|hint| self.taxonomy.resolve_sector(hint));
        let program_sector = self.program_sector(program, &program_keywords);
        facts.org_sector = org_sector.map(SectorLabel::from);
        facts.candidate_sector = program_sector.map(SectorLabel::from);

        if let (Some(org_sector), Some(program_sector)) = (org_sector, program_sector) {
            let relevance = self.taxonomy.relevance(&org_sector.id, &program_sector.id);
            facts.relevance = Some(relevance);

            if org_sector.id == program_sector.id {
                component.add(SECTOR_MATCH_POINTS, ReasonCode::SectorMatch);
            } else if relevance >= HIGH_RELEVANCE {
                component.add(SECTOR_HIGH_RELEVANCE_POINTS, ReasonCode::SectorHighRelevance);
            } else if relevance >= PARTIAL_RELEVANCE {
                component.add(
                    SECTOR_PARTIAL_RELEVANCE_POINTS,
                    ReasonCode::SectorPartialRelevance,
                );
            }
        }

        if org.kind == OrganizationKind::ResearchInstitute {
            let technologies: Vec<String> = normalize_term_set(&org.key_technologies)
                .into_iter()
                .filter(|tech| program_keywords.contains(tech))
                .collect();
            let count = technologies.len().min(TECHNOLOGY_CAP as usize) as u8;
            let points = count.saturating_mul(TECHNOLOGY_POINTS).min(TECHNOLOGY_CAP);
            component.add(points, ReasonCode::TechnologyBonus);
            facts.matched_technologies = technologies;
        }

        component.capped(PROGRAM_BANDS.industry)
    }

    fn score_trl(&self, org: &Organization, program: &Program, facts: &mut ScoreFacts) -> Component {
        let range = program.trl_range();
        let assessment = score_trl(org.current_trl, Some(range));

        facts.org_trl = org.current_trl;
        if !range.is_unconstrained() {
            let (min, max) = range.bounds();
            facts.trl_min = Some(min);
            facts.trl_max = Some(max);
        }
        facts.trl_gap = assessment.gap;

        Component::single(assessment.points, assessment.reason)
    }

    fn score_org_type(&self, org: &Organization, program: &Program) -> Component {
        let open_to_all = program.target_types.is_empty()
            || [OrganizationKind::Company, OrganizationKind::ResearchInstitute]
                .iter()
                .all(|kind| program.target_types.contains(kind));

        if open_to_all {
            Component::single(PROGRAM_BANDS.org_type, ReasonCode::OrgTypeOpen)
        } else if program.accepts(org.kind) {
            Component::single(PROGRAM_BANDS.org_type, ReasonCode::OrgTypeEligible)
        } else {
            Component::zero()
        }
    }

    fn score_experience(&self, org: &Organization) -> Component {
        let mut component = Component::zero();
        if !org.has_rd_experience {
            return component;
        }

        component.add(RD_EXPERIENCE_POINTS, ReasonCode::RdExperience);
        component.add(
            collaboration_bonus(org.collaboration_count),
            ReasonCode::CollaborationHistory,
        );
        component.capped(PROGRAM_BANDS.experience)
    }

    fn score_deadline(
        &self,
        program: &Program,
        today: NaiveDate,
        facts: &mut ScoreFacts,
    ) -> Component {
        let days_left = program
            .deadline
            .map(|deadline| deadline.signed_duration_since(today).num_days());
        facts.deadline = program.deadline;
        facts.days_left = days_left;

        match deadline_points(days_left) {
            (points, Some(reason)) => Component::single(points, reason),
            (_, None) => Component::zero(),
        }
    }
}
