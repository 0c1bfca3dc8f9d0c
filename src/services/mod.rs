// Service exports
pub mod matching;

pub use matching::{MatchingApiClient, MatchingService, MatchingServiceError};
