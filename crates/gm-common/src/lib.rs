pub mod api;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod explanation;
pub mod logging;
pub mod matching;
pub mod normalize;
pub mod service;
pub mod taxonomy;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumIter};

// Matching 에서 공통으로 사용하는 프로필 모델.

/// 기관 유형
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
    AsRefStr, EnumIter,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum OrganizationKind {
    #[default]
    Company,
    ResearchInstitute,
}

/// 기관 규모 구간 (작은 순서대로 정렬됨)
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ScaleBracket {
    Startup,
    Small,
    Medium,
    Large,
    Enterprise,
}

impl ScaleBracket {
    /// 상시 종업원 수 기준 구간 추정
    pub fn from_employee_count(count: u32) -> Self {
        match count {
            0..=9 => Self::Startup,
            10..=49 => Self::Small,
            50..=299 => Self::Medium,
            300..=999 => Self::Large,
            _ => Self::Enterprise,
        }
    }

    pub fn rank(self) -> u8 {
        self as u8
    }

    /// 두 구간 사이의 단계 차이
    pub fn gap(self, other: Self) -> u8 {
        self.rank().abs_diff(other.rank())
    }
}

/// TRL 범위 (양 끝 포함). 한쪽이 비어 있으면 열린 구간으로 취급한다.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrlRange {
    pub min: Option<u8>,
    pub max: Option<u8>,
}

impl TrlRange {
    pub const LOWEST: u8 = 1;
    pub const HIGHEST: u8 = 9;

    pub fn new(min: Option<u8>, max: Option<u8>) -> Self {
        Self { min, max }
    }

    pub fn bounded(min: u8, max: u8) -> Self {
        Self::new(Some(min), Some(max))
    }

    /// 양쪽 경계가 모두 없으면 "요건 없음"
    pub fn is_unconstrained(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    /// 열린 경계를 1/9 로 채운 (min, max). 역전된 입력은 정렬해서 돌려준다.
    pub fn bounds(&self) -> (u8, u8) {
        let min = self.min.unwrap_or(Self::LOWEST);
        let max = self.max.unwrap_or(Self::HIGHEST);
        if min <= max {
            (min, max)
        } else {
            (max, min)
        }
    }

    pub fn contains(&self, trl: u8) -> bool {
        let (min, max) = self.bounds();
        (min..=max).contains(&trl)
    }
}

/// 매칭 대상 기관 프로필
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Organization {
    pub id: Option<String>,
    pub name: Option<String>,
    pub kind: OrganizationKind,
    /// 택소노미 섹터 키 (예: "ICT")
    pub industry_sector: Option<String>,
    pub current_trl: Option<u8>,
    /// 도달하고자 하는 TRL (파트너 매칭에서만 사용)
    pub target_trl: Option<u8>,
    pub has_rd_experience: bool,
    pub collaboration_count: u32,
    pub research_focus_areas: Vec<String>,
    pub key_technologies: Vec<String>,
    pub desired_consortium_fields: Vec<String>,
    pub desired_technologies: Vec<String>,
    /// 파트너에게 기대하는 TRL 범위
    pub target_partner_trl: Option<TrlRange>,
    pub employee_count: Option<u32>,
    pub scale: Option<ScaleBracket>,
}

impl Organization {
    /// 명시된 규모 구간, 없으면 종업원 수에서 추정
    pub fn effective_scale(&self) -> Option<ScaleBracket> {
        self.scale
            .or_else(|| self.employee_count.map(ScaleBracket::from_employee_count))
    }

    pub fn display_name(&self) -> Option<&str> {
        self.name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .or_else(|| self.id.as_deref())
    }

    /// 파트너 TRL 선호가 실제로 선언되었는지 (빈 범위는 미선언)
    pub fn declared_partner_trl(&self) -> Option<TrlRange> {
        self.target_partner_trl
            .filter(|range| !range.is_unconstrained())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, AsRefStr)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ProgramStatus {
    #[default]
    Active,
    Expired,
}

/// 정부 R&D 지원사업 공고
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Program {
    pub id: Option<String>,
    pub title: Option<String>,
    pub agency: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub keywords: Vec<String>,
    /// 명시적인 택소노미 섹터 힌트 (텍스트 추론보다 우선)
    pub sector: Option<String>,
    /// 지원 가능 기관 유형. 비어 있으면 유형 제한 없음.
    pub target_types: Vec<OrganizationKind>,
    pub min_trl: Option<u8>,
    pub max_trl: Option<u8>,
    pub deadline: Option<NaiveDate>,
    pub status: ProgramStatus,
}

impl Program {
    pub fn trl_range(&self) -> TrlRange {
        TrlRange::new(self.min_trl, self.max_trl)
    }

    pub fn is_active(&self) -> bool {
        self.status == ProgramStatus::Active
    }

    pub fn accepts(&self, kind: OrganizationKind) -> bool {
        self.target_types.is_empty() || self.target_types.contains(&kind)
    }

    pub fn display_name(&self) -> Option<&str> {
        self.title
            .as_deref()
            .filter(|title| !title.trim().is_empty())
            .or_else(|| self.id.as_deref())
    }
}
