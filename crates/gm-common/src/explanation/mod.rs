//! 근거 코드를 사용자용 설명 문장으로 바꾸는 생성기
//!
//! 순수 조회/치환 함수이며 I/O 가 없다. 채점 결과가 어떤 값이든 실패하지 않는다.

mod locale;
mod templates;

use regex::Captures;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumIter};

pub use locale::Locale;
pub use templates::{verify_templates, TemplateError, PLACEHOLDERS};

use crate::matching::{CompatibilityScore, MatchScore, ReasonCode, ScoreFacts, SectorLabel};
use templates::{
    reason_template, recommendation_template, summary_template, warning_template, RE_PLACEHOLDER,
};

/// 목록형 placeholder 에 보여줄 최대 항목 수
const LIST_PREVIEW: usize = 3;
/// 채워지지 않은 placeholder 표시
const EMPTY_SLOT: &str = "-";

/// 총점 구간별 판정
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumIter)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Tier {
    /// 80 이상
    StronglyRecommended,
    /// 60〜79
    Recommended,
    /// 40〜59
    ReviewNeeded,
    /// 40 미만
    ReferenceOnly,
}

impl Tier {
    pub fn from_score(score: u8) -> Self {
        match score {
            80..=u8::MAX => Self::StronglyRecommended,
            60..=79 => Self::Recommended,
            40..=59 => Self::ReviewNeeded,
            _ => Self::ReferenceOnly,
        }
    }
}

/// 추천 대상 종류 (요약 문장 선택에 사용)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumIter)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum SubjectKind {
    Program,
    Partner,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Explanation {
    pub tier: Tier,
    pub summary: String,
    pub reasons: Vec<String>,
    pub warnings: Vec<String>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ExplainOptions {
    pub locale: Locale,
    /// 근거 문장 최대 개수. None 이면 전부.
    pub max_reasons: Option<usize>,
}

impl ExplainOptions {
    pub fn new(locale: Locale, max_reasons: Option<usize>) -> Self {
        Self {
            locale,
            max_reasons,
        }
    }

    /// 목록 화면용 (근거 2개)
    pub fn compact(locale: Locale) -> Self {
        Self::new(locale, Some(2))
    }
}

/// 설명 생성이 가능한 채점 결과
pub trait Explainable {
    const SUBJECT: SubjectKind;

    fn total(&self) -> u8;
    fn reason_codes(&self) -> &[ReasonCode];
    fn facts(&self) -> &ScoreFacts;
}

impl Explainable for MatchScore {
    const SUBJECT: SubjectKind = SubjectKind::Program;

    fn total(&self) -> u8 {
        self.score
    }

    fn reason_codes(&self) -> &[ReasonCode] {
        &self.reason_codes
    }

    fn facts(&self) -> &ScoreFacts {
        &self.facts
    }
}

impl Explainable for CompatibilityScore {
    const SUBJECT: SubjectKind = SubjectKind::Partner;

    fn total(&self) -> u8 {
        self.score
    }

    fn reason_codes(&self) -> &[ReasonCode] {
        &self.reason_codes
    }

    fn facts(&self) -> &ScoreFacts {
        &self.facts
    }
}

/// placeholder 값을 채우는 문맥
struct SlotValues<'a> {
    facts: &'a ScoreFacts,
    score: u8,
    locale: Locale,
}

impl SlotValues<'_> {
    fn value(&self, name: &str) -> Option<String> {
        let facts = self.facts;
        let english = self.locale.is_english();
        match name {
            "subject" => facts.subject_name.clone(),
            "score" => Some(self.score.to_string()),
            "org_kind" => Some(self.locale.kind_label(facts.org_kind).to_string()),
            "org_sector" => facts.org_sector.as_ref().map(|s| sector_name(s, english)),
            "candidate_sector" => facts
                .candidate_sector
                .as_ref()
                .map(|s| sector_name(s, english)),
            "relevance" => facts
                .relevance
                .map(|r| format!("{}%", (r * 100.0).round() as i64)),
            "org_trl" => facts.org_trl.map(|v| v.to_string()),
            "candidate_trl" => facts.candidate_trl.map(|v| v.to_string()),
            "trl_min" => facts.trl_min.map(|v| v.to_string()),
            "trl_max" => facts.trl_max.map(|v| v.to_string()),
            "trl_gap" => facts.trl_gap.map(|v| v.to_string()),
            "keywords" => preview(&facts.matched_keywords),
            "keyword_count" => Some(facts.matched_keywords.len().to_string()),
            "technologies" => preview(&facts.matched_technologies),
            "fields" => preview(&facts.matched_fields),
            "collaboration_count" => Some(facts.collaboration_count.to_string()),
            "candidate_collaboration_count" => {
                Some(facts.candidate_collaboration_count.to_string())
            }
            "deadline" => facts.deadline.map(|d| d.format("%Y-%m-%d").to_string()),
            "days_left" => facts.days_left.map(|d| d.to_string()),
            "org_scale" => facts.org_scale.map(|s| self.locale.scale_label(s).to_string()),
            "candidate_scale" => facts
                .candidate_scale
                .map(|s| self.locale.scale_label(s).to_string()),
            _ => None,
        }
    }

    fn render(&self, template: &str) -> String {
        RE_PLACEHOLDER
            .replace_all(template, |caps: &Captures| {
                self.value(&caps[1])
                    .filter(|v| !v.is_empty())
                    .unwrap_or_else(|| EMPTY_SLOT.to_string())
            })
            .into_owned()
    }
}

fn sector_name(label: &SectorLabel, english: bool) -> String {
    if english {
        label.name_en.clone()
    } else {
        label.name.clone()
    }
}

fn preview(items: &[String]) -> Option<String> {
    if items.is_empty() {
        return None;
    }
    let shown: Vec<&str> = items.iter().take(LIST_PREVIEW).map(String::as_str).collect();
    let mut text = shown.join(", ");
    if items.len() > LIST_PREVIEW {
        text.push_str(&format!(" +{}", items.len() - LIST_PREVIEW));
    }
    Some(text)
}

/// 채점 결과를 설명으로 변환
pub fn explain<S: Explainable + ?Sized>(score: &S, options: &ExplainOptions) -> Explanation {
    let slots = SlotValues {
        facts: score.facts(),
        score: score.total(),
        locale: options.locale,
    };

    let tier = Tier::from_score(score.total());
    let summary = slots.render(summary_template(tier, S::SUBJECT, options.locale));

    let codes = score.reason_codes();
    let limit = options.max_reasons.unwrap_or(codes.len());
    let reasons = codes
        .iter()
        .take(limit)
        .map(|code| slots.render(reason_template(*code, options.locale)))
        .collect();

    let mut warnings: Vec<String> = Vec::new();
    let mut recommendations: Vec<String> = Vec::new();
    for code in codes {
        if let Some(template) = warning_template(*code, options.locale) {
            let text = slots.render(template);
            if !warnings.contains(&text) {
                warnings.push(text);
            }
        }
        if let Some(template) = recommendation_template(*code, options.locale) {
            let text = slots.render(template);
            if !recommendations.contains(&text) {
                recommendations.push(text);
            }
        }
    }

    Explanation {
        tier,
        summary,
        reasons,
        warnings,
        recommendations,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;
    use strum::IntoEnumIterator;

    use super::*;
    use crate::{
        matching::{PartnerCompatibilityScorer, ProgramBreakdown, ProgramMatchScorer},
        taxonomy::Taxonomy,
        Organization, OrganizationKind, Program,
    };

    fn score_with(score: u8, codes: Vec<ReasonCode>) -> MatchScore {
        MatchScore {
            score,
            breakdown: ProgramBreakdown::default(),
            reason_codes: codes,
            facts: ScoreFacts {
                subject_name: Some("소재부품 기술개발".into()),
                org_trl: Some(5),
                trl_min: Some(6),
                trl_max: Some(9),
                ..ScoreFacts::default()
            },
        }
    }

    #[test]
    fn tiers_follow_score_thresholds() {
        assert_eq!(Tier::from_score(100), Tier::StronglyRecommended);
        assert_eq!(Tier::from_score(80), Tier::StronglyRecommended);
        assert_eq!(Tier::from_score(79), Tier::Recommended);
        assert_eq!(Tier::from_score(60), Tier::Recommended);
        assert_eq!(Tier::from_score(59), Tier::ReviewNeeded);
        assert_eq!(Tier::from_score(40), Tier::ReviewNeeded);
        assert_eq!(Tier::from_score(39), Tier::ReferenceOnly);
        assert_eq!(Tier::from_score(0), Tier::ReferenceOnly);
    }

    #[test]
    fn summary_names_the_subject() {
        let explanation = explain(&score_with(82, vec![]), &ExplainOptions::default());
        assert_eq!(explanation.tier, Tier::StronglyRecommended);
        assert!(explanation.summary.contains("소재부품 기술개발"));
        assert!(explanation.summary.contains("82"));
    }

    #[test]
    fn fills_placeholders_and_recommends_near_misses() {
        let score = score_with(55, vec![ReasonCode::TrlTooLowClose]);
        let explanation = explain(&score, &ExplainOptions::default());

        assert_eq!(
            explanation.reasons,
            vec!["현재 TRL 5은(는) 요구 범위(TRL 6〜9)보다 1단계 낮습니다.".to_string()]
        );
        assert_eq!(explanation.recommendations.len(), 1);
        assert!(explanation.recommendations[0].contains("TRL 6"));
        assert!(explanation.warnings.is_empty());
    }

    #[test]
    fn warns_about_missing_inputs() {
        let score = score_with(
            45,
            vec![ReasonCode::TrlNotProvided, ReasonCode::DeadlineNotProvided],
        );
        let explanation = explain(&score, &ExplainOptions::new(Locale::En, None));
        assert_eq!(explanation.warnings.len(), 2);
        assert!(explanation.recommendations.is_empty());
    }

    #[test]
    fn truncates_reasons_to_requested_count() {
        let codes = vec![
            ReasonCode::KeywordMatch,
            ReasonCode::SectorMatch,
            ReasonCode::TrlPerfectMatch,
            ReasonCode::OrgTypeOpen,
        ];
        let score = score_with(70, codes);

        let compact = explain(&score, &ExplainOptions::compact(Locale::Ko));
        assert_eq!(compact.reasons.len(), 2);

        let full = explain(&score, &ExplainOptions::default());
        assert_eq!(full.reasons.len(), 4);

        let none = explain(&score, &ExplainOptions::new(Locale::Ko, Some(0)));
        assert!(none.reasons.is_empty());
    }

    #[test]
    fn missing_facts_render_as_dash() {
        let score = MatchScore {
            score: 10,
            breakdown: ProgramBreakdown::default(),
            reason_codes: vec![ReasonCode::SectorHighRelevance],
            facts: ScoreFacts::default(),
        };
        let explanation = explain(&score, &ExplainOptions::default());
        assert!(explanation.summary.contains("'-'"));
        assert!(explanation.reasons[0].contains("(-)"));
        assert!(!explanation.reasons[0].contains('{'));
    }

    #[test]
    fn every_reason_code_renders_in_every_locale() {
        for locale in Locale::iter() {
            for code in ReasonCode::iter() {
                let explanation = explain(
                    &score_with(50, vec![code]),
                    &ExplainOptions::new(locale, None),
                );
                assert_eq!(explanation.reasons.len(), 1);
                assert!(!explanation.reasons[0].trim().is_empty());
                assert!(!explanation.reasons[0].contains('{'), "{code:?} {locale:?}");
            }
        }
    }

    #[test]
    fn explains_real_scores_from_both_scorers() {
        let taxonomy = Arc::new(Taxonomy::builtin());
        let org = Organization {
            id: Some("org-1".into()),
            kind: OrganizationKind::Company,
            industry_sector: Some("ENERGY".into()),
            current_trl: Some(4),
            key_technologies: vec!["수소".into()],
            ..Organization::default()
        };
        let program = Program {
            id: Some("p-1".into()),
            title: Some("수소 연료전지 실증".into()),
            min_trl: Some(5),
            max_trl: Some(7),
            deadline: NaiveDate::from_ymd_opt(2025, 3, 10),
            ..Program::default()
        };
        let today = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();

        let program_score = ProgramMatchScorer::new(taxonomy.clone()).score_at(&org, &program, today);
        let explanation = explain(&program_score, &ExplainOptions::new(Locale::En, None));
        assert_eq!(explanation.reasons.len(), program_score.reason_codes.len());
        assert!(explanation.summary.contains("수소 연료전지 실증"));
        assert!(!explanation.recommendations.is_empty());

        let partner = Organization {
            id: Some("org-2".into()),
            name: Some("그린수소연구원".into()),
            current_trl: Some(6),
            ..Organization::default()
        };
        let partner_score = PartnerCompatibilityScorer::new(taxonomy).score(&org, &partner);
        let explanation = explain(&partner_score, &ExplainOptions::default());
        assert!(explanation.summary.contains("그린수소연구원"));
        assert!(!explanation.warnings.is_empty());
    }
}
