pub mod match_request;
pub mod match_response;

pub use match_request::{PartnerMatchRequest, ProgramMatchRequest, QueryOptions};
pub use match_response::MatchListResponse;
