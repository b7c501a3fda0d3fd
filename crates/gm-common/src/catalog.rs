//! 후보 저장소 경계.
//!
//! 엔진은 저장소를 직접 갖지 않고 정규화가 끝난 레코드를 [`CandidateSource`] 로 읽는다.
//! API 바이너리와 테스트는 [`InMemoryCatalog`] 를 쓴다.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{normalize::normalize_keyword, Organization, OrganizationKind, Program};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse catalog json: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("candidate store unavailable: {0}")]
    Unavailable(String),
}

/// 사업 후보 조회 조건
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgramFilter {
    /// 이 기관 유형이 지원할 수 있는 사업만 남긴다
    pub kind: Option<OrganizationKind>,
    /// 허용 섹터 라벨 (id 또는 표시명). `None` 이면 전체
    pub sectors: Option<Vec<String>>,
    pub active_only: bool,
}

/// 파트너 후보 조회 조건
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrganizationFilter {
    pub sectors: Option<Vec<String>>,
    pub exclude_id: Option<String>,
}

pub trait CandidateSource: Send + Sync {
    fn programs(&self, filter: &ProgramFilter) -> Result<Vec<Program>, CatalogError>;

    fn organizations(&self, filter: &OrganizationFilter)
        -> Result<Vec<Organization>, CatalogError>;

    fn organization(&self, id: &str) -> Result<Option<Organization>, CatalogError>;

    /// 레코드가 바뀔 때마다 달라지는 버전. 캐시 키에 포함된다.
    fn data_version(&self) -> String;
}

/// [`InMemoryCatalog::from_json_str`] 가 읽는 JSON 문서
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogDocument {
    pub version: Option<String>,
    pub programs: Vec<Program>,
    pub organizations: Vec<Organization>,
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    programs: Vec<Program>,
    organizations: Vec<Organization>,
    version: String,
}

/// 섹터 정보가 없는 레코드는 걸러내지 않는다
fn sector_accepted(sector: Option<&str>, accepted: Option<&[String]>) -> bool {
    let (Some(sector), Some(accepted)) = (sector, accepted) else {
        return true;
    };
    let sector = normalize_keyword(sector);
    accepted
        .iter()
        .any(|label| normalize_keyword(label) == sector)
}

impl InMemoryCatalog {
    pub fn new(programs: Vec<Program>, organizations: Vec<Organization>) -> Self {
        let version = format!("inline-{}p-{}o", programs.len(), organizations.len());
        Self {
            programs,
            organizations,
            version,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn from_json_str(raw: &str) -> Result<Self, CatalogError> {
        let document: CatalogDocument = serde_json::from_str(raw)?;
        let catalog = Self::new(document.programs, document.organizations);
        Ok(match document.version {
            Some(version) => catalog.with_version(version),
            None => catalog,
        })
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn program_count(&self) -> usize {
        self.programs.len()
    }

    pub fn organization_count(&self) -> usize {
        self.organizations.len()
    }
}

impl CandidateSource for InMemoryCatalog {
    fn programs(&self, filter: &ProgramFilter) -> Result<Vec<Program>, CatalogError> {
        Ok(self
            .programs
            .iter()
            .filter(|program| !filter.active_only || program.is_active())
            .filter(|program| filter.kind.map_or(true, |kind| program.accepts(kind)))
            .filter(|program| sector_accepted(program.sector.as_deref(), filter.sectors.as_deref()))
            .cloned()
            .collect())
    }

    fn organizations(
        &self,
        filter: &OrganizationFilter,
    ) -> Result<Vec<Organization>, CatalogError> {
        let excluded = filter.exclude_id.as_deref().map(normalize_keyword);
        Ok(self
            .organizations
            .iter()
            .filter(|org| match (&excluded, org.id.as_deref()) {
                (Some(excluded), Some(id)) => normalize_keyword(id) != *excluded,
                _ => true,
            })
            .filter(|org| {
                sector_accepted(org.industry_sector.as_deref(), filter.sectors.as_deref())
            })
            .cloned()
            .collect())
    }

    fn organization(&self, id: &str) -> Result<Option<Organization>, CatalogError> {
        let wanted = normalize_keyword(id);
        if wanted.is_empty() {
            return Ok(None);
        }
        Ok(self
            .organizations
            .iter()
            .find(|org| {
                org.id
                    .as_deref()
                    .is_some_and(|candidate| normalize_keyword(candidate) == wanted)
            })
            .cloned())
    }

    fn data_version(&self) -> String {
        self.version.clone()
    }
}
