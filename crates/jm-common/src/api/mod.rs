pub mod match_response;

pub use match_response::{
    ApplicantMatchSummary, CandidateMatchSummary, JobMatchSummary, MatchSummary,
};
