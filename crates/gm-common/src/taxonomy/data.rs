//! 기본 내장 택소노미 (산업·기술 분류 + 섹터 간 연관도)
//!
//! NOTE: 섹터를 추가하면 RELEVANCE 에도 쌍을 추가할 것. 정의되지 않은 쌍은 0.0 으로 취급된다.

pub(super) const BUILTIN_VERSION: &str = "builtin-2025.1";

pub(super) struct SubSectorSeed {
    pub id: &'static str,
    pub name: &'static str,
    pub keywords: &'static [&'static str],
}

pub(super) struct SectorSeed {
    pub id: &'static str,
    pub name: &'static str,
    pub name_en: &'static str,
    pub keywords: &'static [&'static str],
    pub sub_sectors: &'static [SubSectorSeed],
}

pub(super) static SECTORS: &[SectorSeed] = &[
    SectorSeed {
        id: "ICT",
        name: "정보통신",
        name_en: "ICT",
        keywords: &["ict", "정보통신", "디지털", "플랫폼", "데이터", "digital"],
        sub_sectors: &[
            SubSectorSeed {
                id: "AI",
                name: "인공지능",
                keywords: &[
                    "인공지능",
                    "ai",
                    "머신러닝",
                    "기계학습",
                    "machine learning",
                    "딥러닝",
                    "deep learning",
                    "자연어처리",
                    "컴퓨터비전",
                    "생성형ai",
                    "llm",
                ],
            },
            SubSectorSeed {
                id: "SEMICONDUCTOR",
                name: "반도체",
                keywords: &[
                    "반도체",
                    "semiconductor",
                    "시스템반도체",
                    "팹리스",
                    "파운드리",
                    "메모리",
                    "npu",
                ],
            },
            SubSectorSeed {
                id: "NETWORK",
                name: "네트워크·통신",
                keywords: &["5g", "6g", "통신", "네트워크", "iot", "사물인터넷", "위성통신"],
            },
            SubSectorSeed {
                id: "SECURITY",
                name: "정보보호",
                keywords: &["보안", "정보보호", "사이버보안", "security", "암호", "블록체인"],
            },
            SubSectorSeed {
                id: "SOFTWARE",
                name: "소프트웨어",
                keywords: &[
                    "소프트웨어",
                    "software",
                    "saas",
                    "클라우드",
                    "cloud",
                    "빅데이터",
                    "메타버스",
                    "xr",
                ],
            },
        ],
    },
    SectorSeed {
        id: "BIO_HEALTH",
        name: "바이오헬스",
        name_en: "Bio & Health",
        keywords: &["바이오", "bio", "헬스케어", "healthcare", "의료", "제약"],
        sub_sectors: &[
            SubSectorSeed {
                id: "PHARMA",
                name: "의약품",
                keywords: &["신약", "항체", "백신", "바이오의약품", "pharma"],
            },
            SubSectorSeed {
                id: "MEDICAL_DEVICE",
                name: "의료기기",
                keywords: &["의료기기", "진단기기", "체외진단", "의료영상", "medical device"],
            },
            SubSectorSeed {
                id: "DIGITAL_HEALTH",
                name: "디지털헬스",
                keywords: &["디지털헬스", "디지털치료제", "원격의료", "전자의무기록"],
            },
            SubSectorSeed {
                id: "GENOMICS",
                name: "유전체·합성생물",
                keywords: &["유전체", "합성생물학", "유전자", "세포치료", "genomics"],
            },
        ],
    },
    SectorSeed {
        id: "MANUFACTURING",
        name: "제조",
        name_en: "Manufacturing",
        keywords: &["제조", "manufacturing", "생산", "공정"],
        sub_sectors: &[
            SubSectorSeed {
                id: "SMART_FACTORY",
                name: "스마트공장",
                keywords: &["스마트공장", "스마트팩토리", "smart factory", "디지털트윈", "mes"],
            },
            SubSectorSeed {
                id: "ROBOTICS",
                name: "로봇",
                keywords: &["로봇", "robot", "robotics", "협동로봇", "자동화"],
            },
            SubSectorSeed {
                id: "MACHINERY",
                name: "기계·장비",
                keywords: &["기계", "장비", "정밀가공", "부품", "machinery"],
            },
        ],
    },
    SectorSeed {
        id: "ENERGY",
        name: "에너지",
        name_en: "Energy",
        keywords: &["에너지", "energy", "전력", "발전"],
        sub_sectors: &[
            SubSectorSeed {
                id: "RENEWABLE",
                name: "신재생에너지",
                keywords: &["태양광", "풍력", "재생에너지", "신재생", "solar"],
            },
            SubSectorSeed {
                id: "HYDROGEN",
                name: "수소",
                keywords: &["수소", "연료전지", "수전해", "hydrogen"],
            },
            SubSectorSeed {
                id: "BATTERY",
                name: "이차전지",
                keywords: &["이차전지", "배터리", "battery", "ess", "전고체"],
            },
            SubSectorSeed {
                id: "NUCLEAR",
                name: "원자력",
                keywords: &["원자력", "원전", "smr"],
            },
        ],
    },
    SectorSeed {
        id: "ENVIRONMENT",
        name: "환경",
        name_en: "Environment",
        keywords: &["환경", "environment", "기후", "탄소중립"],
        sub_sectors: &[
            SubSectorSeed {
                id: "CARBON",
                name: "탄소저감",
                keywords: &["탄소포집", "ccus", "온실가스", "탄소저감"],
            },
            SubSectorSeed {
                id: "RECYCLING",
                name: "자원순환",
                keywords: &["재활용", "자원순환", "폐기물", "업사이클링", "recycling"],
            },
            SubSectorSeed {
                id: "WATER",
                name: "물·대기",
                keywords: &["수처리", "정수", "하수", "대기오염", "미세먼지"],
            },
        ],
    },
    SectorSeed {
        id: "MATERIALS",
        name: "소재",
        name_en: "Materials",
        keywords: &["소재", "소재부품", "materials"],
        sub_sectors: &[
            SubSectorSeed {
                id: "ADVANCED_MATERIALS",
                name: "첨단소재",
                keywords: &["신소재", "나노", "그래핀", "복합소재", "첨단소재"],
            },
            SubSectorSeed {
                id: "CHEMICALS",
                name: "화학",
                keywords: &["화학", "고분자", "정밀화학", "촉매", "chemical"],
            },
            SubSectorSeed {
                id: "METALS",
                name: "금속",
                keywords: &["금속", "철강", "합금", "희토류"],
            },
        ],
    },
    SectorSeed {
        id: "MOBILITY",
        name: "모빌리티",
        name_en: "Mobility",
        keywords: &["모빌리티", "mobility", "자동차", "운송"],
        sub_sectors: &[
            SubSectorSeed {
                id: "AUTONOMOUS",
                name: "자율주행",
                keywords: &["자율주행", "autonomous driving", "라이다", "adas"],
            },
            SubSectorSeed {
                id: "EV",
                name: "전기차",
                keywords: &["전기차", "전기자동차", "ev", "충전인프라"],
            },
            SubSectorSeed {
                id: "AEROSPACE",
                name: "항공우주",
                keywords: &["항공", "우주", "드론", "uam", "위성", "aerospace"],
            },
        ],
    },
    SectorSeed {
        id: "AGRI_FOOD",
        name: "농식품",
        name_en: "Agri-food",
        keywords: &["농식품", "농업", "식품", "agriculture", "food"],
        sub_sectors: &[
            SubSectorSeed {
                id: "SMART_FARM",
                name: "스마트팜",
                keywords: &["스마트팜", "smart farm", "수직농장", "정밀농업"],
            },
            SubSectorSeed {
                id: "FOOD_TECH",
                name: "푸드테크",
                keywords: &["푸드테크", "foodtech", "대체육", "식품가공", "기능성식품"],
            },
        ],
    },
    SectorSeed {
        id: "CONSTRUCTION",
        name: "건설",
        name_en: "Construction",
        keywords: &["건설", "construction", "건축", "인프라"],
        sub_sectors: &[
            SubSectorSeed {
                id: "SMART_CONSTRUCTION",
                name: "스마트건설",
                keywords: &["스마트건설", "bim", "모듈러", "건설자동화"],
            },
            SubSectorSeed {
                id: "CIVIL",
                name: "토목",
                keywords: &["토목", "교량", "도로", "터널"],
            },
        ],
    },
];

/// 섹터 간 연관도. 한 쌍은 한 번만 적는다 (대칭은 로딩 시 보장).
pub(super) static RELEVANCE: &[(&str, &str, f64)] = &[
    ("ICT", "BIO_HEALTH", 0.6),
    ("ICT", "MANUFACTURING", 0.7),
    ("ICT", "ENERGY", 0.5),
    ("ICT", "ENVIRONMENT", 0.4),
    ("ICT", "MATERIALS", 0.4),
    ("ICT", "MOBILITY", 0.8),
    ("ICT", "AGRI_FOOD", 0.5),
    ("ICT", "CONSTRUCTION", 0.5),
    ("BIO_HEALTH", "MANUFACTURING", 0.4),
    ("BIO_HEALTH", "ENERGY", 0.2),
    ("BIO_HEALTH", "ENVIRONMENT", 0.4),
    ("BIO_HEALTH", "MATERIALS", 0.5),
    ("BIO_HEALTH", "MOBILITY", 0.2),
    ("BIO_HEALTH", "AGRI_FOOD", 0.7),
    ("BIO_HEALTH", "CONSTRUCTION", 0.1),
    ("MANUFACTURING", "ENERGY", 0.6),
    ("MANUFACTURING", "ENVIRONMENT", 0.5),
    ("MANUFACTURING", "MATERIALS", 0.8),
    ("MANUFACTURING", "MOBILITY", 0.7),
    ("MANUFACTURING", "AGRI_FOOD", 0.4),
    ("MANUFACTURING", "CONSTRUCTION", 0.6),
    ("ENERGY", "ENVIRONMENT", 0.8),
    ("ENERGY", "MATERIALS", 0.6),
    ("ENERGY", "MOBILITY", 0.7),
    ("ENERGY", "AGRI_FOOD", 0.3),
    ("ENERGY", "CONSTRUCTION", 0.5),
    ("ENVIRONMENT", "MATERIALS", 0.5),
    ("ENVIRONMENT", "MOBILITY", 0.4),
    ("ENVIRONMENT", "AGRI_FOOD", 0.6),
    ("ENVIRONMENT", "CONSTRUCTION", 0.5),
    ("MATERIALS", "MOBILITY", 0.6),
    ("MATERIALS", "AGRI_FOOD", 0.2),
    ("MATERIALS", "CONSTRUCTION", 0.5),
    ("MOBILITY", "AGRI_FOOD", 0.2),
    ("MOBILITY", "CONSTRUCTION", 0.4),
    ("AGRI_FOOD", "CONSTRUCTION", 0.2),
];
