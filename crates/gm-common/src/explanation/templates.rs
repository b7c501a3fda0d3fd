//! 근거 코드별 문장 템플릿 (ko / en)
//!
//! 템플릿은 `{name}` 형태의 placeholder 를 쓴다. 사용할 수 있는 이름은 [`PLACEHOLDERS`] 에 있다.

use once_cell::sync::Lazy;
use regex::Regex;
use strum::IntoEnumIterator;
use thiserror::Error;

use super::{locale::Locale, SubjectKind, Tier};
use crate::matching::ReasonCode;

pub(super) static RE_PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([a-z_]+)\}").unwrap());

/// 템플릿에서 참조 가능한 placeholder 이름
pub const PLACEHOLDERS: &[&str] = &[
    "subject",
    "score",
    "org_kind",
    "org_sector",
    "candidate_sector",
    "relevance",
    "org_trl",
    "candidate_trl",
    "trl_min",
    "trl_max",
    "trl_gap",
    "keywords",
    "keyword_count",
    "technologies",
    "fields",
    "collaboration_count",
    "candidate_collaboration_count",
    "deadline",
    "days_left",
    "org_scale",
    "candidate_scale",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("template {key} has no text for locale {locale}")]
    Empty { key: String, locale: String },
    #[error("template {key} ({locale}) references unknown placeholder {{{name}}}")]
    UnknownPlaceholder {
        key: String,
        locale: String,
        name: String,
    },
}

pub(crate) fn placeholders(template: &str) -> impl Iterator<Item = &str> {
    RE_PLACEHOLDER
        .captures_iter(template)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
}

pub(crate) fn reason_template(code: ReasonCode, locale: Locale) -> &'static str {
    match locale {
        Locale::Ko => reason_ko(code),
        Locale::En => reason_en(code),
    }
}

fn reason_ko(code: ReasonCode) -> &'static str {
    use ReasonCode::*;
    match code {
        KeywordMatch => "핵심 키워드 {keyword_count}개가 일치합니다 ({keywords}).",
        SectorMatch => "기관의 산업 분야({org_sector})와 사업 분야가 같습니다.",
        SectorHighRelevance => {
            "기관 분야({org_sector})와 사업 분야({candidate_sector})의 연관성이 높습니다 ({relevance})."
        }
        SectorPartialRelevance => {
            "기관 분야({org_sector})와 사업 분야({candidate_sector})가 일부 연관되어 있습니다 ({relevance})."
        }
        TechnologyBonus => "보유 기술({technologies})이 사업 키워드에 포함되어 있습니다.",
        TrlNotProvided => "기관의 기술성숙도(TRL) 정보가 없어 기본 점수를 적용했습니다.",
        TrlNoRequirement => "사업에 TRL 요건이 없어 기술 단계와 무관하게 지원할 수 있습니다.",
        TrlPerfectMatch => "현재 TRL {org_trl}이(가) 요구 범위(TRL {trl_min}〜{trl_max})에 포함됩니다.",
        TrlTooLowClose => {
            "현재 TRL {org_trl}은(는) 요구 범위(TRL {trl_min}〜{trl_max})보다 1단계 낮습니다."
        }
        TrlTooHighClose => {
            "현재 TRL {org_trl}은(는) 요구 범위(TRL {trl_min}〜{trl_max})보다 1단계 높지만 지원 가능성이 있습니다."
        }
        TrlTooLowModerate => {
            "현재 TRL {org_trl}은(는) 요구 범위(TRL {trl_min}〜{trl_max})보다 2단계 낮습니다."
        }
        TrlTooHighModerate => {
            "현재 TRL {org_trl}은(는) 요구 범위(TRL {trl_min}〜{trl_max})보다 2단계 높습니다."
        }
        TrlTooHighFar => {
            "현재 TRL {org_trl}은(는) 요구 범위(TRL {trl_min}〜{trl_max})보다 3단계 높습니다."
        }
        TrlTooFar => "현재 TRL {org_trl}은(는) 요구 범위(TRL {trl_min}〜{trl_max})와 차이가 큽니다.",
        OrgTypeEligible => "{org_kind} 유형이 지원 대상에 포함됩니다.",
        OrgTypeOpen => "기관 유형 제한이 없는 사업입니다.",
        RdExperience => "R&D 수행 경험이 있어 사업 수행 역량이 인정됩니다.",
        CollaborationHistory => "공동연구 실적 {collaboration_count}건이 가점 요인입니다.",
        DeadlineImminent => "마감까지 {days_left}일 남았습니다 ({deadline}).",
        DeadlineSoon => "마감이 {days_left}일 후({deadline})로 준비 기간이 적당합니다.",
        DeadlineUpcoming => "마감이 {days_left}일 후({deadline})로 충분히 준비할 수 있습니다.",
        DeadlineAmple => "마감({deadline})까지 {days_left}일의 여유가 있습니다.",
        DeadlineDistant => "마감({deadline})이 {days_left}일 이상 남아 장기 준비가 가능합니다.",
        DeadlineNotProvided => "공고에 마감일 정보가 없습니다.",
        PartnerTrlPerfect => {
            "상대 기관의 TRL {candidate_trl}이(가) 선호 범위에 들어 기술 단계가 완벽하게 보완됩니다."
        }
        PartnerTrlStrong => "상대 기관의 TRL {candidate_trl}이(가) 선호 범위에 들어 기술 협력이 유리합니다.",
        PartnerTrlBasic => {
            "두 기관의 TRL({org_trl} / {candidate_trl}) 차이는 {trl_gap}단계로 기본 수준의 보완성이 있습니다."
        }
        PartnerTrlNotProvided => "TRL 정보가 부족해 기술 단계 보완성을 판단하기 어렵습니다.",
        PartnerSameSector => "두 기관 모두 {org_sector} 분야에서 활동합니다.",
        PartnerRelatedSector => {
            "{org_sector} 분야와 {candidate_sector} 분야는 융합 연구 연관성이 높습니다 ({relevance})."
        }
        PartnerAdjacentSector => {
            "{org_sector} 분야와 {candidate_sector} 분야는 일부 연관되어 있습니다 ({relevance})."
        }
        DesiredFieldMatch => "희망 컨소시엄 분야({fields})를 상대 기관이 갖추고 있습니다.",
        DesiredTechnologyMatch => "희망 기술({technologies})을 상대 기관이 보유하고 있습니다.",
        SharedKeywords => "공통 연구 키워드({keywords})가 있습니다.",
        ScaleSame => "두 기관의 규모({org_scale})가 같아 협업 방식이 잘 맞습니다.",
        ScaleClose => "기관 규모({org_scale} / {candidate_scale})가 비슷합니다.",
        ScaleModerate => "기관 규모({org_scale} / {candidate_scale}) 차이가 있으나 협력이 가능합니다.",
        ScaleUnknown => "기관 규모 정보가 부족해 기본 점수를 적용했습니다.",
        MutualRdExperience => "두 기관 모두 R&D 수행 경험이 있습니다.",
        MutualCollaboration => {
            "양측 모두 공동연구 실적({collaboration_count}건 / {candidate_collaboration_count}건)이 있습니다."
        }
        OneSidedRdExperience => "한쪽 기관만 R&D 수행 경험이 있습니다.",
    }
}

fn reason_en(code: ReasonCode) -> &'static str {
    use ReasonCode::*;
    match code {
        KeywordMatch => "{keyword_count} key keywords match ({keywords}).",
        SectorMatch => "The program targets your industry sector ({org_sector}).",
        SectorHighRelevance => {
            "Your sector ({org_sector}) is closely related to the program sector ({candidate_sector}, {relevance})."
        }
        SectorPartialRelevance => {
            "Your sector ({org_sector}) is partially related to the program sector ({candidate_sector}, {relevance})."
        }
        TechnologyBonus => "Your key technologies ({technologies}) appear in the program keywords.",
        TrlNotProvided => "No technology readiness level (TRL) on file; a default score was applied.",
        TrlNoRequirement => "The program has no TRL requirement.",
        TrlPerfectMatch => "Your TRL {org_trl} is within the required range (TRL {trl_min}-{trl_max}).",
        TrlTooLowClose => "Your TRL {org_trl} is one level below the required range (TRL {trl_min}-{trl_max}).",
        TrlTooHighClose => {
            "Your TRL {org_trl} is one level above the required range (TRL {trl_min}-{trl_max}) but still viable."
        }
        TrlTooLowModerate => {
            "Your TRL {org_trl} is two levels below the required range (TRL {trl_min}-{trl_max})."
        }
        TrlTooHighModerate => {
            "Your TRL {org_trl} is two levels above the required range (TRL {trl_min}-{trl_max})."
        }
        TrlTooHighFar => {
            "Your TRL {org_trl} is three levels above the required range (TRL {trl_min}-{trl_max})."
        }
        TrlTooFar => "Your TRL {org_trl} is far from the required range (TRL {trl_min}-{trl_max}).",
        OrgTypeEligible => "Organizations of type {org_kind} are eligible.",
        OrgTypeOpen => "The program is open to every organization type.",
        RdExperience => "Prior R&D experience demonstrates delivery capability.",
        CollaborationHistory => "{collaboration_count} prior joint research projects add credit.",
        DeadlineImminent => "Only {days_left} days left until the deadline ({deadline}).",
        DeadlineSoon => "The deadline is in {days_left} days ({deadline}), a workable window.",
        DeadlineUpcoming => "The deadline is in {days_left} days ({deadline}), enough time to prepare.",
        DeadlineAmple => "There are {days_left} days until the deadline ({deadline}).",
        DeadlineDistant => "The deadline ({deadline}) is {days_left} days away.",
        DeadlineNotProvided => "The announcement does not state a deadline.",
        PartnerTrlPerfect => {
            "The partner's TRL {candidate_trl} is within your preferred range and fully complements yours."
        }
        PartnerTrlStrong => "The partner's TRL {candidate_trl} is within the preferred range.",
        PartnerTrlBasic => {
            "The TRL gap between both organizations ({org_trl} / {candidate_trl}) is {trl_gap}, a basic fit."
        }
        PartnerTrlNotProvided => "TRL information is missing, so complementarity could not be judged.",
        PartnerSameSector => "Both organizations work in {org_sector}.",
        PartnerRelatedSector => "{org_sector} and {candidate_sector} are closely related ({relevance}).",
        PartnerAdjacentSector => "{org_sector} and {candidate_sector} are partially related ({relevance}).",
        DesiredFieldMatch => "The partner covers your desired consortium fields ({fields}).",
        DesiredTechnologyMatch => "The partner holds your desired technologies ({technologies}).",
        SharedKeywords => "You share research keywords ({keywords}).",
        ScaleSame => "Both organizations are the same size ({org_scale}).",
        ScaleClose => "The organizations are similar in size ({org_scale} / {candidate_scale}).",
        ScaleModerate => {
            "The organizations differ in size ({org_scale} / {candidate_scale}) but can still collaborate."
        }
        ScaleUnknown => "Organization size is unknown; a default score was applied.",
        MutualRdExperience => "Both organizations have R&D experience.",
        MutualCollaboration => {
            "Both sides have joint research history ({collaboration_count} / {candidate_collaboration_count})."
        }
        OneSidedRdExperience => "Only one of the organizations has R&D experience.",
    }
}

pub(crate) fn summary_template(tier: Tier, subject: SubjectKind, locale: Locale) -> &'static str {
    match (locale, subject, tier) {
        (Locale::Ko, SubjectKind::Program, Tier::StronglyRecommended) => {
            "'{subject}' 사업은 적극 추천하는 지원사업입니다. (적합도 {score}점)"
        }
        (Locale::Ko, SubjectKind::Program, Tier::Recommended) => {
            "'{subject}' 사업은 지원을 추천합니다. (적합도 {score}점)"
        }
        (Locale::Ko, SubjectKind::Program, Tier::ReviewNeeded) => {
            "'{subject}' 사업은 세부 요건 검토가 필요합니다. (적합도 {score}점)"
        }
        (Locale::Ko, SubjectKind::Program, Tier::ReferenceOnly) => {
            "'{subject}' 사업은 참고용으로 안내합니다. (적합도 {score}점)"
        }
        (Locale::Ko, SubjectKind::Partner, Tier::StronglyRecommended) => {
            "'{subject}'은(는) 협력 파트너로 적극 추천합니다. (호환성 {score}점)"
        }
        (Locale::Ko, SubjectKind::Partner, Tier::Recommended) => {
            "'{subject}'은(는) 협력 파트너로 추천합니다. (호환성 {score}점)"
        }
        (Locale::Ko, SubjectKind::Partner, Tier::ReviewNeeded) => {
            "'{subject}'과(와)의 협력은 추가 검토가 필요합니다. (호환성 {score}점)"
        }
        (Locale::Ko, SubjectKind::Partner, Tier::ReferenceOnly) => {
            "'{subject}'은(는) 참고용 후보입니다. (호환성 {score}점)"
        }
        (Locale::En, SubjectKind::Program, Tier::StronglyRecommended) => {
            "'{subject}' is strongly recommended for you (fit {score}/100)."
        }
        (Locale::En, SubjectKind::Program, Tier::Recommended) => {
            "'{subject}' is recommended (fit {score}/100)."
        }
        (Locale::En, SubjectKind::Program, Tier::ReviewNeeded) => {
            "'{subject}' needs a closer look at its requirements (fit {score}/100)."
        }
        (Locale::En, SubjectKind::Program, Tier::ReferenceOnly) => {
            "'{subject}' is listed for reference only (fit {score}/100)."
        }
        (Locale::En, SubjectKind::Partner, Tier::StronglyRecommended) => {
            "'{subject}' is a strongly recommended partner (compatibility {score}/100)."
        }
        (Locale::En, SubjectKind::Partner, Tier::Recommended) => {
            "'{subject}' is a recommended partner (compatibility {score}/100)."
        }
        (Locale::En, SubjectKind::Partner, Tier::ReviewNeeded) => {
            "A partnership with '{subject}' needs further review (compatibility {score}/100)."
        }
        (Locale::En, SubjectKind::Partner, Tier::ReferenceOnly) => {
            "'{subject}' is a reference-only candidate (compatibility {score}/100)."
        }
    }
}

/// 입력 누락 경고
pub(crate) fn warning_template(code: ReasonCode, locale: Locale) -> Option<&'static str> {
    use ReasonCode::*;
    let text = match (locale, code) {
        (Locale::Ko, TrlNotProvided | PartnerTrlNotProvided) => {
            "TRL 정보를 입력하면 더 정확한 매칭 결과를 받을 수 있습니다."
        }
        (Locale::Ko, DeadlineNotProvided) => "마감일이 확인되지 않으니 공고 원문을 확인하세요.",
        (Locale::Ko, ScaleUnknown) => "기관 규모(종업원 수)를 입력하면 규모 적합도를 평가할 수 있습니다.",
        (Locale::En, TrlNotProvided | PartnerTrlNotProvided) => {
            "Add your TRL to get a more accurate match."
        }
        (Locale::En, DeadlineNotProvided) => "Check the original announcement for the deadline.",
        (Locale::En, ScaleUnknown) => "Add your employee count so organization size can be compared.",
        _ => return None,
    };
    Some(text)
}

/// 아깝게 놓친 항목에 대한 보완 제안
pub(crate) fn recommendation_template(code: ReasonCode, locale: Locale) -> Option<&'static str> {
    use ReasonCode::*;
    let text = match (locale, code) {
        (Locale::Ko, TrlTooLowClose) => {
            "TRL {trl_min} 단계 달성 후 지원하면 만점 구간에 들어갈 수 있습니다."
        }
        (Locale::Ko, TrlTooLowModerate) => {
            "기술 고도화 과제로 TRL {trl_min} 단계를 먼저 확보하는 것을 권장합니다."
        }
        (Locale::Ko, DeadlineImminent) => "마감이 임박했으니 제출 서류를 서둘러 준비하세요.",
        (Locale::Ko, PartnerTrlBasic) => {
            "파트너 선호 TRL 범위를 등록하면 보완성이 높은 기관을 우선 추천받을 수 있습니다."
        }
        (Locale::Ko, OneSidedRdExperience) => {
            "R&D 경험이 있는 기관과 역할을 나누면 컨소시엄 경쟁력이 높아집니다."
        }
        (Locale::En, TrlTooLowClose) => "Reaching TRL {trl_min} before applying would earn full TRL credit.",
        (Locale::En, TrlTooLowModerate) => {
            "Consider a technology maturation project to reach TRL {trl_min} first."
        }
        (Locale::En, DeadlineImminent) => "The deadline is close; prepare the submission documents now.",
        (Locale::En, PartnerTrlBasic) => {
            "Declare a preferred partner TRL range to be matched with more complementary partners."
        }
        (Locale::En, OneSidedRdExperience) => {
            "Splitting roles with an experienced R&D organization strengthens the consortium."
        }
        _ => return None,
    };
    Some(text)
}

fn check(key: &str, locale: Locale, template: &str) -> Result<(), TemplateError> {
    if template.trim().is_empty() {
        return Err(TemplateError::Empty {
            key: key.to_string(),
            locale: locale.as_ref().to_string(),
        });
    }
    if let Some(unknown) = placeholders(template).find(|name| !PLACEHOLDERS.contains(name)) {
        return Err(TemplateError::UnknownPlaceholder {
            key: key.to_string(),
            locale: locale.as_ref().to_string(),
            name: unknown.to_string(),
        });
    }
    Ok(())
}

/// 시작 시 자체 점검: 모든 (근거 코드, 언어) 조합에 유효한 템플릿이 있는지 확인한다
pub fn verify_templates() -> Result<(), TemplateError> {
    for locale in Locale::iter() {
        for code in ReasonCode::iter() {
            check(code.as_ref(), locale, reason_template(code, locale))?;

            if code.is_missing_data() {
                let warning = warning_template(code, locale).unwrap_or_default();
                check(&format!("warning.{}", code.as_ref()), locale, warning)?;
            }
            if code.is_near_miss() {
                let recommendation = recommendation_template(code, locale).unwrap_or_default();
                check(&format!("recommendation.{}", code.as_ref()), locale, recommendation)?;
            }
        }

        for subject in SubjectKind::iter() {
            for tier in Tier::iter() {
                let key = format!("summary.{}.{}", subject.as_ref(), tier.as_ref());
                check(&key, locale, summary_template(tier, subject, locale))?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_template_is_registered() {
        assert_eq!(verify_templates(), Ok(()));
    }

    #[test]
    fn extracts_placeholder_names() {
        let names: Vec<_> = placeholders("TRL {org_trl} / {trl_min}〜{trl_max}").collect();
        assert_eq!(names, vec!["org_trl", "trl_min", "trl_max"]);
    }

    #[test]
    fn rejects_unknown_placeholders() {
        let err = check("test", Locale::Ko, "{unknown_value}").unwrap_err();
        assert!(matches!(err, TemplateError::UnknownPlaceholder { name, .. } if name == "unknown_value"));
        assert!(check("test", Locale::En, "  ").is_err());
    }
}
