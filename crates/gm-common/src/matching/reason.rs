use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumIter};

use crate::{taxonomy::Sector, OrganizationKind, ScaleBracket};

/// 점수 근거 코드
///
/// 설명 생성기가 템플릿을 고르는 키. 목록 순서는 평가 순서를 따른다.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ReasonCode {
    // 산업/키워드 (지원사업)
    KeywordMatch,
    SectorMatch,
    SectorHighRelevance,
    SectorPartialRelevance,
    TechnologyBonus,

    // TRL
    TrlNotProvided,
    TrlNoRequirement,
    TrlPerfectMatch,
    TrlTooLowClose,
    TrlTooHighClose,
    TrlTooLowModerate,
    TrlTooHighModerate,
    TrlTooHighFar,
    TrlTooFar,

    // 기관 유형
    OrgTypeEligible,
    OrgTypeOpen,

    // R&D 경험
    RdExperience,
    CollaborationHistory,

    // 마감
    DeadlineImminent,
    DeadlineSoon,
    DeadlineUpcoming,
    DeadlineAmple,
    DeadlineDistant,
    DeadlineNotProvided,

    // 파트너 TRL
    PartnerTrlPerfect,
    PartnerTrlStrong,
    PartnerTrlBasic,
    PartnerTrlNotProvided,

    // 파트너 산업/기술
    PartnerSameSector,
    PartnerRelatedSector,
    PartnerAdjacentSector,
    DesiredFieldMatch,
    DesiredTechnologyMatch,
    SharedKeywords,

    // 규모
    ScaleSame,
    ScaleClose,
    ScaleModerate,
    ScaleUnknown,

    // 파트너 경험
    MutualRdExperience,
    MutualCollaboration,
    OneSidedRdExperience,
}

impl ReasonCode {
    /// 입력 데이터 누락을 뜻하는 코드 (적합도가 낮다는 뜻이 아님)
    pub fn is_missing_data(self) -> bool {
        matches!(
            self,
            Self::TrlNotProvided
                | Self::DeadlineNotProvided
                | Self::PartnerTrlNotProvided
                | Self::ScaleUnknown
        )
    }

    /// 조금만 보완하면 점수가 오르는 "아까운" 코드
    pub fn is_near_miss(self) -> bool {
        matches!(
            self,
            Self::TrlTooLowClose
                | Self::TrlTooLowModerate
                | Self::DeadlineImminent
                | Self::PartnerTrlBasic
                | Self::OneSidedRdExperience
        )
    }
}

/// 설명 템플릿에 쓰이는 섹터 표시명
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectorLabel {
    pub id: String,
    pub name: String,
    pub name_en: String,
}

impl From<&Sector> for SectorLabel {
    fn from(sector: &Sector) -> Self {
        Self {
            id: sector.id.clone(),
            name: sector.name.clone(),
            name_en: sector.name_en.clone(),
        }
    }
}

/// 채점 중에 관찰한 값들. 설명 문장의 placeholder 를 채운다.
///
/// 목록은 모두 정렬된 상태로 담아 동일 입력에 대해 직렬화 결과가 같도록 한다.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreFacts {
    /// 추천 대상 (지원사업명 또는 파트너 기관명)
    pub subject_name: Option<String>,
    pub org_kind: OrganizationKind,
    pub org_sector: Option<SectorLabel>,
    pub candidate_sector: Option<SectorLabel>,
    pub relevance: Option<f64>,
    pub org_trl: Option<u8>,
    pub candidate_trl: Option<u8>,
    pub trl_min: Option<u8>,
    pub trl_max: Option<u8>,
    pub trl_gap: Option<u8>,
    pub matched_keywords: Vec<String>,
    pub matched_technologies: Vec<String>,
    pub matched_fields: Vec<String>,
    pub collaboration_count: u32,
    pub candidate_collaboration_count: u32,
    pub deadline: Option<NaiveDate>,
    pub days_left: Option<i64>,
    pub org_scale: Option<ScaleBracket>,
    pub candidate_scale: Option<ScaleBracket>,
}

/// 하나의 평가 항목 결과 (점수 + 근거 코드)
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Component {
    pub points: u8,
    pub reasons: Vec<ReasonCode>,
}

impl Component {
    pub fn zero() -> Self {
        Self {
            points: 0,
            reasons: Vec::new(),
        }
    }

    pub fn single(points: u8, reason: ReasonCode) -> Self {
        Self {
            points,
            reasons: vec![reason],
        }
    }

    pub fn add(&mut self, points: u8, reason: ReasonCode) {
        if points > 0 {
            self.points = self.points.saturating_add(points);
            self.reasons.push(reason);
        }
    }

    /// 상한 적용
    pub fn capped(mut self, max: u8) -> Self {
        self.points = self.points.min(max);
        self
    }

    /// 점수에 기여한 경우에만 근거 코드를 넘긴다
    pub fn contributing_reasons(&self) -> &[ReasonCode] {
        if self.points > 0 {
            &self.reasons
        } else {
            &[]
        }
    }
}
