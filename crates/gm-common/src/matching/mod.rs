pub mod partner;
pub mod pipeline;
pub mod prefilter;
pub mod reason;
pub mod scoring;
pub mod trl;
pub mod weights;

pub use partner::{
    is_same_organization, CompatibilityScore, PartnerBreakdown, PartnerCompatibilityScorer,
};
pub use pipeline::{
    validate_requester, AssemblyError, Candidate, CandidateError, CandidateFailure,
    MatchingEngine, MatchingEngineConfig, Page, PartnerMatch, ProgramMatch, QueryKind,
    RankOptions, RankedPage, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};
pub use prefilter::{EnhancedPreFilter, PreFilterConfig};
pub use reason::{ReasonCode, ScoreFacts, SectorLabel};
pub use scoring::{MatchScore, ProgramBreakdown, ProgramMatchScorer};
pub use trl::{score_trl, TrlAssessment};
pub use weights::{PARTNER_BANDS, PROGRAM_BANDS};
