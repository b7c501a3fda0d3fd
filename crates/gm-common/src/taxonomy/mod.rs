//! 산업·기술 분류체계와 섹터 간 연관도 행렬.
//!
//! 프로세스 시작 시 한 번 만들고 (내장 데이터 또는 JSON 덮어쓰기) 검증한 뒤
//! `Arc` 뒤에서 읽기 전용으로 공유한다. 채점기는 생성자로 받는다.

mod data;

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::normalize::normalize_keyword;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubSector {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sector {
    pub id: String,
    /// 대표 명칭 (키워드 풀과 설명 문장에 사용)
    pub name: String,
    pub name_en: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub sub_sectors: Vec<SubSector>,
}

impl Sector {
    pub fn localized_name(&self, english: bool) -> &str {
        if english {
            &self.name_en
        } else {
            &self.name
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelevanceEntry {
    pub a: String,
    pub b: String,
    pub relevance: f64,
}

/// 외부 JSON 으로 내장 택소노미를 대체할 때의 문서 형태
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxonomyConfig {
    pub version: String,
    pub sectors: Vec<Sector>,
    #[serde(default)]
    pub relevance: Vec<RelevanceEntry>,
}

#[derive(Debug, Error)]
pub enum TaxonomyError {
    #[error("failed to read taxonomy file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse taxonomy json: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("taxonomy has no sectors")]
    Empty,
    #[error("duplicate sector id or name: {0}")]
    DuplicateSector(String),
    #[error("relevance entry references unknown sector: {0}")]
    UnknownSector(String),
    #[error("relevance {a}/{b} = {value} is outside [0, 1]")]
    OutOfRange { a: String, b: String, value: f64 },
    #[error("relevance {a}/{b} is declared twice with different values")]
    Conflicting { a: String, b: String },
    #[error("self relevance of {0} must be 1.0")]
    SelfRelevance(String),
}

#[derive(Debug, Clone)]
struct KeywordEntry {
    keyword: String,
    sector: usize,
    sub_sector: Option<usize>,
}

/// 검증을 마친 읽기 전용 택소노미
#[derive(Debug, Clone)]
pub struct Taxonomy {
    version: String,
    sectors: Vec<Sector>,
    /// 정규화된 id / 명칭 → 섹터 인덱스
    names: HashMap<String, usize>,
    /// 정규화된 sub-sector id / 명칭 → (섹터, 하위 섹터)
    sub_names: HashMap<String, (usize, usize)>,
    /// 선언 순서를 유지한 키워드 목록
    keywords: Vec<KeywordEntry>,
    /// (작은 인덱스, 큰 인덱스) → 연관도
    relevance: HashMap<(usize, usize), f64>,
}

/// 짧은 영문 키워드("ai", "ev")는 부분 문자열 일치를 허용하지 않는다
fn term_matches(term: &str, keyword: &str) -> bool {
    if term == keyword {
        return true;
    }
    let allows_substring = !keyword.is_ascii() || keyword.chars().count() >= 4;
    allows_substring && term.contains(keyword)
}

fn ordered(a: usize, b: usize) -> (usize, usize) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

impl Taxonomy {
    /// 내장 택소노미
    pub fn builtin() -> Self {
        Self::build(Self::builtin_config())
    }

    pub fn builtin_config() -> TaxonomyConfig {
        let sectors = data::SECTORS
            .iter()
            .map(|seed| Sector {
                id: seed.id.to_string(),
                name: seed.name.to_string(),
                name_en: seed.name_en.to_string(),
                keywords: seed.keywords.iter().map(|k| k.to_string()).collect(),
                sub_sectors: seed
                    .sub_sectors
                    .iter()
                    .map(|sub| SubSector {
                        id: sub.id.to_string(),
                        name: sub.name.to_string(),
                        keywords: sub.keywords.iter().map(|k| k.to_string()).collect(),
                    })
                    .collect(),
            })
            .collect();

        let relevance = data::RELEVANCE
            .iter()
            .map(|(a, b, relevance)| RelevanceEntry {
                a: a.to_string(),
                b: b.to_string(),
                relevance: *relevance,
            })
            .collect();

        TaxonomyConfig {
            version: data::BUILTIN_VERSION.to_string(),
            sectors,
            relevance,
        }
    }

    pub fn from_json_str(raw: &str) -> Result<Self, TaxonomyError> {
        let config: TaxonomyConfig = serde_json::from_str(raw)?;
        Self::from_config(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, TaxonomyError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| TaxonomyError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    /// 설정 문서를 검증한 뒤 택소노미를 구성한다
    pub fn from_config(config: TaxonomyConfig) -> Result<Self, TaxonomyError> {
        Self::validate(&config)?;
        Ok(Self::build(config))
    }

    fn validate(config: &TaxonomyConfig) -> Result<(), TaxonomyError> {
        if config.sectors.is_empty() {
            return Err(TaxonomyError::Empty);
        }

        let mut seen = HashSet::new();
        for sector in &config.sectors {
            if !seen.insert(normalize_keyword(&sector.id)) {
                return Err(TaxonomyError::DuplicateSector(sector.id.clone()));
            }
        }

        let mut declared: HashMap<(String, String), f64> = HashMap::new();
        for entry in &config.relevance {
            let a = normalize_keyword(&entry.a);
            let b = normalize_keyword(&entry.b);
            for (raw, key) in [(&entry.a, &a), (&entry.b, &b)] {
                if !seen.contains(key) {
                    return Err(TaxonomyError::UnknownSector(raw.clone()));
                }
            }

            if !(0.0..=1.0).contains(&entry.relevance) {
                return Err(TaxonomyError::OutOfRange {
                    a: entry.a.clone(),
                    b: entry.b.clone(),
                    value: entry.relevance,
                });
            }

            if a == b {
                if entry.relevance != 1.0 {
                    return Err(TaxonomyError::SelfRelevance(entry.a.clone()));
                }
                continue;
            }

            let key = if a <= b { (a, b) } else { (b, a) };
            match declared.get(&key) {
                Some(existing) if *existing != entry.relevance => {
                    return Err(TaxonomyError::Conflicting {
                        a: entry.a.clone(),
                        b: entry.b.clone(),
                    });
                }
                _ => {
                    declared.insert(key, entry.relevance);
                }
            }
        }

        Ok(())
    }

    fn build(config: TaxonomyConfig) -> Self {
        let mut names = HashMap::new();
        let mut sub_names = HashMap::new();
        let mut keywords = Vec::new();

        for (sector_idx, sector) in config.sectors.iter().enumerate() {
            for label in [&sector.id, &sector.name, &sector.name_en] {
                names.entry(normalize_keyword(label)).or_insert(sector_idx);
            }
            for keyword in &sector.keywords {
                keywords.push(KeywordEntry {
                    keyword: normalize_keyword(keyword),
                    sector: sector_idx,
                    sub_sector: None,
                });
            }
            for (sub_idx, sub) in sector.sub_sectors.iter().enumerate() {
                for label in [&sub.id, &sub.name] {
                    sub_names
                        .entry(normalize_keyword(label))
                        .or_insert((sector_idx, sub_idx));
                }
                for keyword in &sub.keywords {
                    keywords.push(KeywordEntry {
                        keyword: normalize_keyword(keyword),
                        sector: sector_idx,
                        sub_sector: Some(sub_idx),
                    });
                }
            }
        }
        keywords.retain(|entry| !entry.keyword.is_empty());

        let mut relevance = HashMap::new();
        for entry in &config.relevance {
            let a = names.get(&normalize_keyword(&entry.a)).copied();
            let b = names.get(&normalize_keyword(&entry.b)).copied();
            if let (Some(a), Some(b)) = (a, b) {
                if a != b {
                    relevance.insert(ordered(a, b), entry.relevance.clamp(0.0, 1.0));
                }
            }
        }

        Self {
            version: config.version,
            sectors: config.sectors,
            names,
            sub_names,
            keywords,
            relevance,
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn sectors(&self) -> &[Sector] {
        &self.sectors
    }

    /// id 로 섹터를 찾는다 (대소문자·공백 무시)
    pub fn sector(&self, id: &str) -> Option<&Sector> {
        let idx = *self.names.get(&normalize_keyword(id))?;
        self.sectors.get(idx)
    }

    fn index_of(&self, id: &str) -> Option<usize> {
        self.names.get(&normalize_keyword(id)).copied()
    }

    /// 섹터 id/명칭이면 그대로, 아니면 키워드 조회로 해석
    pub fn resolve_sector(&self, hint: &str) -> Option<&Sector> {
        self.sector(hint).or_else(|| self.find_sector(hint))
    }

    /// 키워드가 속한 섹터 (하위 섹터 키워드 일치도 섹터 일치로 본다)
    pub fn find_sector(&self, keyword: &str) -> Option<&Sector> {
        let term = normalize_keyword(keyword);
        if term.is_empty() {
            return None;
        }
        if let Some(&idx) = self.names.get(&term) {
            return self.sectors.get(idx);
        }
        if let Some(&(idx, _)) = self.sub_names.get(&term) {
            return self.sectors.get(idx);
        }

        self.keywords
            .iter()
            .find(|entry| term_matches(&term, &entry.keyword))
            .and_then(|entry| self.sectors.get(entry.sector))
    }

    /// 키워드가 속한 (섹터, 하위 섹터)
    pub fn find_sub_sector(&self, keyword: &str) -> Option<(&Sector, &SubSector)> {
        let term = normalize_keyword(keyword);
        if term.is_empty() {
            return None;
        }

        let (sector_idx, sub_idx) = match self.sub_names.get(&term) {
            Some(found) => *found,
            None => self.keywords.iter().find_map(|entry| {
                let sub = entry.sub_sector?;
                term_matches(&term, &entry.keyword).then_some((entry.sector, sub))
            })?,
        };

        let sector = self.sectors.get(sector_idx)?;
        let sub = sector.sub_sectors.get(sub_idx)?;
        Some((sector, sub))
    }

    /// 여러 용어 중 가장 많이 일치한 섹터 (동률이면 선언 순서가 빠른 쪽)
    pub fn detect_sector<'a, I>(&self, terms: I) -> Option<&Sector>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut hits = vec![0usize; self.sectors.len()];
        for term in terms {
            if let Some(idx) = self.find_sector(term).and_then(|s| self.index_of(&s.id)) {
                if let Some(count) = hits.get_mut(idx) {
                    *count += 1;
                }
            }
        }

        let (best_idx, best_hits) = hits
            .iter()
            .enumerate()
            .fold((0, 0), |best, (idx, &count)| {
                if count > best.1 {
                    (idx, count)
                } else {
                    best
                }
            });

        (best_hits > 0)
            .then(|| self.sectors.get(best_idx))
            .flatten()
    }

    /// 두 섹터의 연관도. 같은 섹터는 1.0, 정의되지 않은 쌍이나 미등록 섹터는 0.0
    pub fn relevance(&self, a: &str, b: &str) -> f64 {
        if normalize_keyword(a) == normalize_keyword(b) {
            return 1.0;
        }
        match (self.index_of(a), self.index_of(b)) {
            (Some(a), Some(b)) if a == b => 1.0,
            (Some(a), Some(b)) => self.relevance.get(&ordered(a, b)).copied().unwrap_or(0.0),
            _ => 0.0,
        }
    }

    /// 기준 섹터와 연관도가 `min_relevance` 이상인 섹터 (자기 자신 포함)
    pub fn related_sectors(&self, id: &str, min_relevance: f64) -> Vec<&Sector> {
        self.sectors
            .iter()
            .filter(|sector| self.relevance(id, &sector.id) >= min_relevance)
            .collect()
    }
}
