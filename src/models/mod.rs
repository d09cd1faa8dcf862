// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    Annotation, MatchDetails, MatchResult, SocketLevel, UserPreferences, Venue, VenueAttributes,
    WifiLevel,
};
pub use requests::{AnnotateRequest, SearchRequest};
pub use responses::{
    AnnotateResponse, ErrorResponse, HealthResponse, RecommendationsResponse, SearchResponse,
};
