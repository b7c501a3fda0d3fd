use std::{collections::BTreeSet, sync::Arc};

use serde::{Deserialize, Serialize};

use super::{
    reason::{Component, ReasonCode, ScoreFacts, SectorLabel},
    scoring::{HIGH_RELEVANCE, PARTIAL_RELEVANCE},
    trl::score_trl,
    weights::PARTNER_BANDS,
};
use crate::{
    normalize::{extract_keywords, normalize_keyword, normalize_term_set},
    taxonomy::{Sector, Taxonomy},
    Organization, TrlRange,
};

const TRL_PERFECT_POINTS: u8 = 40;
const TRL_STRONG_POINTS: u8 = 30;
/// 기본 구간 하한 (15〜25)
const TRL_BASIC_FLOOR: u8 = 15;
const TRL_NOT_PROVIDED_POINTS: u8 = 10;

const SAME_SECTOR_POINTS: u8 = 15;
const RELATED_SECTOR_POINTS: u8 = 10;
const ADJACENT_SECTOR_POINTS: u8 = 5;
const DESIRED_FIELD_POINTS: u8 = 4;
const DESIRED_FIELD_CAP: u8 = 8;
const DESIRED_TECH_POINTS: u8 = 3;
const DESIRED_TECH_CAP: u8 = 9;
const SHARED_KEYWORD_POINTS: u8 = 2;
const SHARED_KEYWORD_CAP: u8 = 6;

const SCALE_UNKNOWN_POINTS: u8 = 7;

const MUTUAL_RD_POINTS: u8 = 12;
const MUTUAL_COLLABORATION_POINTS: u8 = 3;
const ONE_SIDED_RD_POINTS: u8 = 6;

/// 파트너 호환성 점수 내역
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartnerBreakdown {
    pub trl_fit: u8,
    pub industry: u8,
    pub scale: u8,
    pub experience: u8,
}

impl PartnerBreakdown {
    pub fn total(&self) -> u8 {
        self.trl_fit + self.industry + self.scale + self.experience
    }
}

/// 파트너 호환성 결과
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompatibilityScore {
    pub score: u8,
    pub breakdown: PartnerBreakdown,
    pub reason_codes: Vec<ReasonCode>,
    pub facts: ScoreFacts,
}

/// 두 기관의 협력 적합도 평가
///
/// `seeker` 관점의 방향성 있는 평가이며 자동으로 대칭화하지 않는다.
/// 양방향 평가가 필요하면 호출자가 두 번 호출해 조합한다.
#[derive(Debug, Clone)]
pub struct PartnerCompatibilityScorer {
    taxonomy: Arc<Taxonomy>,
}

impl PartnerCompatibilityScorer {
    pub fn new(taxonomy: Arc<Taxonomy>) -> Self {
        Self { taxonomy }
    }

    pub fn score(&self, seeker: &Organization, partner: &Organization) -> CompatibilityScore {
        let mut facts = ScoreFacts {
            subject_name: partner.display_name().map(str::to_string),
            org_kind: seeker.kind,
            collaboration_count: seeker.collaboration_count,
            candidate_collaboration_count: partner.collaboration_count,
            ..ScoreFacts::default()
        };

        let trl_fit = self.score_trl_fit(seeker, partner, &mut facts);
        let industry = self.score_industry(seeker, partner, &mut facts);
        let scale = self.score_scale(seeker, partner, &mut facts);
        let experience = self.score_experience(seeker, partner);

        let breakdown = PartnerBreakdown {
            trl_fit: trl_fit.points,
            industry: industry.points,
            scale: scale.points,
            experience: experience.points,
        };

        let reason_codes = [&trl_fit, &industry, &scale, &experience]
            .into_iter()
            .flat_map(|component| component.contributing_reasons().iter().copied())
            .collect();

        CompatibilityScore {
            score: breakdown.total(),
            breakdown,
            reason_codes,
            facts,
        }
    }

    /// TRL 보완성
    ///
    /// 선호 범위를 선언한 기관만 30〜40 구간에 들어갈 수 있다.
    /// 선언이 없거나 벗어나면 기준 TRL 대비 거리 점수를 15〜25 로 환산한다.
    fn score_trl_fit(
        &self,
        seeker: &Organization,
        partner: &Organization,
        facts: &mut ScoreFacts,
    ) -> Component {
        facts.org_trl = seeker.current_trl;
        facts.candidate_trl = partner.current_trl;

        let (Some(seeker_trl), Some(partner_trl)) = (seeker.current_trl, partner.current_trl)
        else {
            return Component::single(TRL_NOT_PROVIDED_POINTS, ReasonCode::PartnerTrlNotProvided);
        };
        facts.trl_gap = Some(seeker_trl.abs_diff(partner_trl));

        let seeker_pref = seeker.declared_partner_trl();
        let partner_pref = partner.declared_partner_trl();
        let seeker_hit = seeker_pref.is_some_and(|range| range.contains(partner_trl));
        let partner_hit = partner_pref.is_some_and(|range| range.contains(seeker_trl));

        if let Some(range) = seeker_pref {
            let (min, max) = range.bounds();
            facts.trl_min = Some(min);
            facts.trl_max = Some(max);
        }

        if seeker_hit || partner_hit {
            // 초기 단계 기관이 성숙한 파트너를 찾는 경우, 혹은 서로의 선호가 맞는 경우
            let mutual = seeker_hit && partner_hit;
            return if mutual || seeker_trl < partner_trl {
                Component::single(TRL_PERFECT_POINTS, ReasonCode::PartnerTrlPerfect)
            } else {
                Component::single(TRL_STRONG_POINTS, ReasonCode::PartnerTrlStrong)
            };
        }

        let reference = seeker_pref.unwrap_or_else(|| {
            let level = seeker.target_trl.unwrap_or(seeker_trl);
            TrlRange::bounded(level, level)
        });
        let assessment = score_trl(Some(partner_trl), Some(reference));
        let points = TRL_BASIC_FLOOR + assessment.points / 2;

        Component::single(points, ReasonCode::PartnerTrlBasic)
    }

    fn resolve_sector(&self, org: &Organization) -> Option<&Sector> {
        org.industry_sector
            .as_deref()
            .and_then(|hint| self.taxonomy.resolve_sector(hint))
    }

    fn score_industry(
        &self,
        seeker: &Organization,
        partner: &Organization,
        facts: &mut ScoreFacts,
    ) -> Component {
        let mut component = Component::zero();

        let seeker_sector = self.resolve_sector(seeker);
        let partner_sector = self.resolve_sector(partner);
        facts.org_sector = seeker_sector.map(SectorLabel::from);
        facts.candidate_sector = partner_sector.map(SectorLabel::from);

        if let (Some(a), Some(b)) = (seeker_sector, partner_sector) {
            let relevance = self.taxonomy.relevance(&a.id, &b.id);
            facts.relevance = Some(relevance);

            if a.id == b.id {
                component.add(SAME_SECTOR_POINTS, ReasonCode::PartnerSameSector);
            } else if relevance >= HIGH_RELEVANCE {
                component.add(RELATED_SECTOR_POINTS, ReasonCode::PartnerRelatedSector);
            } else if relevance >= PARTIAL_RELEVANCE {
                component.add(ADJACENT_SECTOR_POINTS, ReasonCode::PartnerAdjacentSector);
            }
        }

        let partner_keywords = extract_keywords(partner, &self.taxonomy);

        // 희망 분야: 파트너 섹터명·키워드에 있거나 택소노미상 파트너 섹터에 속하면 충족
        let fields: Vec<String> = normalize_term_set(&seeker.desired_consortium_fields)
            .into_iter()
            .filter(|field| self.partner_covers_field(field, partner_sector, &partner_keywords))
            .collect();
        component.add(
            capped_points(fields.len(), DESIRED_FIELD_POINTS, DESIRED_FIELD_CAP),
            ReasonCode::DesiredFieldMatch,
        );
        facts.matched_fields = fields;

        let partner_technologies = normalize_term_set(&partner.key_technologies);
        let technologies: Vec<String> = normalize_term_set(&seeker.desired_technologies)
            .into_iter()
            .filter(|tech| partner_technologies.contains(tech) || partner_keywords.contains(tech))
            .collect();
        component.add(
            capped_points(technologies.len(), DESIRED_TECH_POINTS, DESIRED_TECH_CAP),
            ReasonCode::DesiredTechnologyMatch,
        );
        facts.matched_technologies = technologies;

        let seeker_keywords = extract_keywords(seeker, &self.taxonomy);
        let shared: Vec<String> = seeker_keywords
            .intersection(&partner_keywords)
            .cloned()
            .collect();
        component.add(
            capped_points(shared.len(), SHARED_KEYWORD_POINTS, SHARED_KEYWORD_CAP),
            ReasonCode::SharedKeywords,
        );
        facts.matched_keywords = shared;

        component.capped(PARTNER_BANDS.industry)
    }

    fn partner_covers_field(
        &self,
        field: &str,
        partner_sector: Option<&Sector>,
        partner_keywords: &BTreeSet<String>,
    ) -> bool {
        if partner_keywords.contains(field) {
            return true;
        }
        match (partner_sector, self.taxonomy.find_sector(field)) {
            (Some(partner), Some(wanted)) => partner.id == wanted.id,
            _ => false,
        }
    }

    fn score_scale(
        &self,
        seeker: &Organization,
        partner: &Organization,
        facts: &mut ScoreFacts,
    ) -> Component {
        let seeker_scale = seeker.effective_scale();
        let partner_scale = partner.effective_scale();
        facts.org_scale = seeker_scale;
        facts.candidate_scale = partner_scale;

        let (Some(a), Some(b)) = (seeker_scale, partner_scale) else {
            return Component::single(SCALE_UNKNOWN_POINTS, ReasonCode::ScaleUnknown);
        };

        match a.gap(b) {
            0 => Component::single(PARTNER_BANDS.scale, ReasonCode::ScaleSame),
            1 => Component::single(10, ReasonCode::ScaleClose),
            2 => Component::single(5, ReasonCode::ScaleModerate),
            _ => Component::zero(),
        }
    }

    fn score_experience(&self, seeker: &Organization, partner: &Organization) -> Component {
        let mut component = Component::zero();
        match (seeker.has_rd_experience, partner.has_rd_experience) {
            (true, true) => {
                component.add(MUTUAL_RD_POINTS, ReasonCode::MutualRdExperience);
                if seeker.collaboration_count > 0 && partner.collaboration_count > 0 {
                    component.add(MUTUAL_COLLABORATION_POINTS, ReasonCode::MutualCollaboration);
                }
            }
            (true, false) | (false, true) => {
                component.add(ONE_SIDED_RD_POINTS, ReasonCode::OneSidedRdExperience);
            }
            (false, false) => {}
        }
        component.capped(PARTNER_BANDS.experience)
    }
}

fn capped_points(count: usize, each: u8, cap: u8) -> u8 {
    let count = count.min(cap as usize) as u8;
    count.saturating_mul(each).min(cap)
}

/// 요청 기관과 파트너 후보가 같은 기관인지 (정규화된 id 비교)
pub fn is_same_organization(a: &Organization, b: &Organization) -> bool {
    match (a.id.as_deref(), b.id.as_deref()) {
        (Some(a), Some(b)) => {
            let a = normalize_keyword(a);
            !a.is_empty() && a == normalize_keyword(b)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{OrganizationKind, ScaleBracket};

    fn scorer() -> PartnerCompatibilityScorer {
        PartnerCompatibilityScorer::new(Arc::new(Taxonomy::builtin()))
    }

    fn org(id: &str, trl: Option<u8>) -> Organization {
        Organization {
            id: Some(id.into()),
            name: Some(format!("기관 {id}")),
            current_trl: trl,
            ..Organization::default()
        }
    }

    #[test]
    fn gap_of_two_without_preferences_stays_in_basic_band() {
        let seeker = org("a", Some(4));
        let partner = org("b", Some(6));

        let result = scorer().score(&seeker, &partner);
        assert!((15..=25).contains(&result.breakdown.trl_fit));
        assert_eq!(result.breakdown.trl_fit, 20);
        assert_eq!(result.reason_codes[0], ReasonCode::PartnerTrlBasic);

        let reversed = scorer().score(&partner, &seeker);
        assert!((15..=25).contains(&reversed.breakdown.trl_fit));
    }

    #[test]
    fn declared_preference_hit_reaches_preference_tier() {
        let mut seeker = org("a", Some(3));
        seeker.target_partner_trl = Some(TrlRange::bounded(6, 8));
        let partner = org("b", Some(7));

        let result = scorer().score(&seeker, &partner);
        assert_eq!(result.breakdown.trl_fit, 40);
        assert!(result.reason_codes.contains(&ReasonCode::PartnerTrlPerfect));
    }

    #[test]
    fn late_stage_seeker_hit_is_strong_not_perfect() {
        let mut seeker = org("a", Some(8));
        seeker.target_partner_trl = Some(TrlRange::bounded(2, 4));
        let partner = org("b", Some(3));

        let result = scorer().score(&seeker, &partner);
        assert_eq!(result.breakdown.trl_fit, 30);
        assert!(result.reason_codes.contains(&ReasonCode::PartnerTrlStrong));
    }

    #[test]
    fn mutual_preferences_are_perfect_regardless_of_direction() {
        let mut seeker = org("a", Some(8));
        seeker.target_partner_trl = Some(TrlRange::bounded(2, 4));
        let mut partner = org("b", Some(3));
        partner.target_partner_trl = Some(TrlRange::new(Some(7), None));

        assert_eq!(scorer().score(&seeker, &partner).breakdown.trl_fit, 40);
    }

    #[test]
    fn missed_preference_falls_back_to_basic_band_against_declared_range() {
        let mut seeker = org("a", Some(3));
        seeker.target_partner_trl = Some(TrlRange::bounded(7, 9));
        let partner = org("b", Some(6));

        let result = scorer().score(&seeker, &partner);
        // 범위 [7,9] 에서 1 단계 아래 → 12 / 2 + 15
        assert_eq!(result.breakdown.trl_fit, 21);
    }

    #[test]
    fn empty_preference_range_counts_as_undeclared() {
        let mut seeker = org("a", Some(4));
        seeker.target_partner_trl = Some(TrlRange::default());
        let partner = org("b", Some(4));

        let result = scorer().score(&seeker, &partner);
        assert_eq!(result.breakdown.trl_fit, 25);
    }

    #[test]
    fn target_trl_is_used_as_reference_when_present() {
        let mut seeker = org("a", Some(3));
        seeker.target_trl = Some(7);
        let partner = org("b", Some(7));

        assert_eq!(scorer().score(&seeker, &partner).breakdown.trl_fit, 25);
    }

    #[test]
    fn missing_trl_scores_ten() {
        let result = scorer().score(&org("a", None), &org("b", Some(5)));
        assert_eq!(result.breakdown.trl_fit, 10);
        assert!(result.reason_codes.contains(&ReasonCode::PartnerTrlNotProvided));
    }

    #[test]
    fn industry_combines_sector_and_desired_overlap() {
        let mut seeker = org("a", Some(4));
        seeker.industry_sector = Some("ICT".into());
        seeker.key_technologies = vec!["자율주행".into()];
        seeker.desired_consortium_fields = vec!["모빌리티".into()];
        seeker.desired_technologies = vec!["라이다".into(), "배터리".into()];

        let mut partner = org("b", Some(6));
        partner.industry_sector = Some("MOBILITY".into());
        partner.key_technologies = vec!["라이다".into(), "자율 주행".into()];

        let result = scorer().score(&seeker, &partner);
        // 연관 섹터 10 + 희망 분야 4 + 희망 기술 3 + 공유 키워드 2
        assert_eq!(result.breakdown.industry, 19);
        assert_eq!(result.facts.matched_fields, vec!["모빌리티".to_string()]);
        assert_eq!(result.facts.matched_technologies, vec!["라이다".to_string()]);
        assert_eq!(result.facts.matched_keywords, vec!["자율주행".to_string()]);
    }

    #[test]
    fn industry_is_capped_at_thirty() {
        let techs: Vec<String> = ["수소", "연료전지", "수전해", "태양광", "풍력"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let mut seeker = org("a", Some(4));
        seeker.industry_sector = Some("ENERGY".into());
        seeker.key_technologies = techs.clone();
        seeker.desired_technologies = techs.clone();
        seeker.desired_consortium_fields = vec!["에너지".into(), "수소".into(), "태양광".into()];

        let mut partner = org("b", Some(6));
        partner.industry_sector = Some("ENERGY".into());
        partner.key_technologies = techs;

        assert_eq!(scorer().score(&seeker, &partner).breakdown.industry, 30);
    }

    #[test]
    fn scale_gap_points() {
        let scale = |a, b| {
            let mut seeker = org("a", None);
            seeker.scale = a;
            let mut partner = org("b", None);
            partner.scale = b;
            scorer().score(&seeker, &partner).breakdown.scale
        };

        assert_eq!(scale(Some(ScaleBracket::Small), Some(ScaleBracket::Small)), 15);
        assert_eq!(scale(Some(ScaleBracket::Small), Some(ScaleBracket::Medium)), 10);
        assert_eq!(scale(Some(ScaleBracket::Small), Some(ScaleBracket::Large)), 5);
        assert_eq!(
            scale(Some(ScaleBracket::Startup), Some(ScaleBracket::Enterprise)),
            0
        );
        assert_eq!(scale(None, Some(ScaleBracket::Large)), 7);
    }

    #[test]
    fn experience_rewards_mutual_history() {
        let experience = |a: bool, b: bool, collabs: u32| {
            let mut seeker = org("a", None);
            seeker.has_rd_experience = a;
            seeker.collaboration_count = collabs;
            let mut partner = org("b", None);
            partner.has_rd_experience = b;
            partner.collaboration_count = collabs;
            scorer().score(&seeker, &partner).breakdown.experience
        };

        assert_eq!(experience(true, true, 2), 15);
        assert_eq!(experience(true, true, 0), 12);
        assert_eq!(experience(true, false, 2), 6);
        assert_eq!(experience(false, true, 0), 6);
        assert_eq!(experience(false, false, 5), 0);
    }

    #[test]
    fn total_is_sum_of_bounded_breakdown() {
        let mut seeker = org("a", Some(3));
        seeker.kind = OrganizationKind::Company;
        seeker.target_partner_trl = Some(TrlRange::bounded(5, 7));
        seeker.has_rd_experience = true;
        seeker.employee_count = Some(20);
        let mut partner = org("b", Some(6));
        partner.kind = OrganizationKind::ResearchInstitute;
        partner.has_rd_experience = true;
        partner.employee_count = Some(400);

        let result = scorer().score(&seeker, &partner);
        let b = result.breakdown;
        assert_eq!(result.score, b.trl_fit + b.industry + b.scale + b.experience);
        assert!(b.trl_fit <= 40 && b.industry <= 30 && b.scale <= 15 && b.experience <= 15);
        assert_eq!(result.facts.subject_name.as_deref(), Some("기관 b"));
    }

    #[test]
    fn detects_self_as_same_organization() {
        assert!(is_same_organization(&org("Org-1", None), &org("org-1", None)));
        assert!(!is_same_organization(&org("org-1", None), &org("org-2", None)));
        assert!(!is_same_organization(&Organization::default(), &Organization::default()));
    }
}
