use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use crate::{taxonomy::Taxonomy, Organization, Program};

/// 자유 텍스트를 토큰으로 나누는 구분자 (공백은 정규화 단계에서 따로 제거)
static RE_TERM_SEPARATORS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[\s,;/|·・()\[\]{}<>"'“”‘’!?:+&]+"#).unwrap());

/// 토큰으로 인정하는 최소 글자 수
const MIN_TERM_CHARS: usize = 2;

/// 키워드 정규화
///
/// NFKC → 소문자 → 공백(전각 포함)·zero-width 문자 제거.
/// 띄어쓰기나 대소문자만 다른 표기("인공 지능", "Machine Learning")는 같은 토큰이 된다.
/// 멱등: `normalize_keyword(normalize_keyword(x)) == normalize_keyword(x)`
pub fn normalize_keyword(text: &str) -> String {
    text.nfkc()
        .collect::<String>()
        .to_lowercase()
        .nfkc()
        .filter(|c| !c.is_whitespace() && !is_zero_width(*c))
        .collect()
}

fn is_zero_width(c: char) -> bool {
    matches!(c, '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{FEFF}')
}

/// 목록형 필드 값(키워드, 기술명 등)을 하나의 토큰으로 정규화
fn normalize_term(term: &str) -> Option<String> {
    let normalized = normalize_keyword(term);
    (normalized.chars().count() >= MIN_TERM_CHARS).then_some(normalized)
}

/// 자유 텍스트(제목, 설명 등)를 구분자로 나눈 뒤 토큰별로 정규화
pub fn split_terms(text: &str) -> impl Iterator<Item = String> + '_ {
    RE_TERM_SEPARATORS
        .split(text)
        .filter_map(normalize_term)
}

/// 키워드 풀을 구성하는 텍스트 필드 제공자
pub trait KeywordSource {
    /// 택소노미 섹터 키 또는 명칭
    fn sector_hint(&self) -> Option<&str>;

    /// 통째로 하나의 용어로 취급하는 목록형 필드
    fn listed_terms(&self) -> Vec<&str>;

    /// 토큰 단위로 분해하는 자유 텍스트 필드
    fn free_text(&self) -> Vec<&str> {
        Vec::new()
    }
}

impl KeywordSource for Organization {
    fn sector_hint(&self) -> Option<&str> {
        self.industry_sector.as_deref()
    }

    fn listed_terms(&self) -> Vec<&str> {
        self.research_focus_areas
            .iter()
            .chain(self.key_technologies.iter())
            .map(String::as_str)
            .collect()
    }
}

impl KeywordSource for Program {
    fn sector_hint(&self) -> Option<&str> {
        self.sector.as_deref()
    }

    fn listed_terms(&self) -> Vec<&str> {
        self.keywords.iter().map(String::as_str).collect()
    }

    fn free_text(&self) -> Vec<&str> {
        [
            self.title.as_deref(),
            self.category.as_deref(),
            self.description.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

/// 엔티티의 텍스트 필드를 하나의 정규화 키워드 집합으로 모은다 (중복은 합쳐짐)
///
/// 섹터 힌트가 택소노미에서 해석되면 섹터의 대표 명칭을, 아니면 힌트 문자열 자체를 넣는다.
pub fn extract_keywords<E: KeywordSource + ?Sized>(
    entity: &E,
    taxonomy: &Taxonomy,
) -> BTreeSet<String> {
    let mut keywords = BTreeSet::new();

    if let Some(hint) = entity.sector_hint() {
        let sector_name = taxonomy
            .resolve_sector(hint)
            .map(|sector| sector.name.as_str())
            .unwrap_or(hint);
        keywords.extend(normalize_term(sector_name));
    }

    for term in entity.listed_terms() {
        keywords.extend(normalize_term(term));
    }

    for text in entity.free_text() {
        keywords.extend(split_terms(text));
    }

    keywords
}

/// 목록 필드를 정규화된 집합으로 변환 (빈 값 제외)
pub fn normalize_term_set<S: AsRef<str>>(terms: &[S]) -> BTreeSet<String> {
    terms
        .iter()
        .filter_map(|term| normalize_term(term.as_ref()))
        .collect()
}
