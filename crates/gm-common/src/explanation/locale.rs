use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumIter};

use crate::{OrganizationKind, ScaleBracket};

/// 설명 문장 언어. 알 수 없는 태그는 기본값(ko)으로 처리한다.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Locale {
    #[default]
    Ko,
    En,
}

impl Locale {
    /// `ko`, `ko-KR`, `EN_us` 처럼 언어 접두어만 본다
    pub fn parse(tag: &str) -> Self {
        let language = tag
            .trim()
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match language.as_str() {
            "en" => Self::En,
            _ => Self::Ko,
        }
    }

    pub fn from_tag(tag: Option<&str>) -> Self {
        tag.map(Self::parse).unwrap_or_default()
    }

    pub fn is_english(self) -> bool {
        self == Self::En
    }

    pub(crate) fn scale_label(self, scale: ScaleBracket) -> &'static str {
        match (self, scale) {
            (Self::Ko, ScaleBracket::Startup) => "스타트업",
            (Self::Ko, ScaleBracket::Small) => "소기업",
            (Self::Ko, ScaleBracket::Medium) => "중기업",
            (Self::Ko, ScaleBracket::Large) => "중견기업",
            (Self::Ko, ScaleBracket::Enterprise) => "대기업",
            (Self::En, ScaleBracket::Startup) => "startup",
            (Self::En, ScaleBracket::Small) => "small business",
            (Self::En, ScaleBracket::Medium) => "medium business",
            (Self::En, ScaleBracket::Large) => "mid-size enterprise",
            (Self::En, ScaleBracket::Enterprise) => "large enterprise",
        }
    }

    pub(crate) fn kind_label(self, kind: OrganizationKind) -> &'static str {
        match (self, kind) {
            (Self::Ko, OrganizationKind::Company) => "기업",
            (Self::Ko, OrganizationKind::ResearchInstitute) => "연구기관",
            (Self::En, OrganizationKind::Company) => "company",
            (Self::En, OrganizationKind::ResearchInstitute) => "research institute",
        }
    }
}
