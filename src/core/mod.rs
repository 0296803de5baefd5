// Core algorithm exports
pub mod distance;
pub mod documents;
pub mod filters;
pub mod insights;
pub mod search;
pub mod sponsorship;

pub use distance::{calculate_bounding_box, distance_km, haversine_distance, is_within_bounding_box};
pub use documents::{is_valid_document, normalize_document, DocumentKind};
pub use filters::{is_listed, matches_category, matches_region, matches_search_constraints};
pub use insights::{build_report, click_through_rate, summarize};
pub use search::{paginate, Page, SearchError, SearchPipeline, SearchResult};
pub use sponsorship::{SponsorshipError, SponsorshipSelector};
