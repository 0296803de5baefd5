//! Guia Local - local-services marketplace API
//!
//! Proximity search over registered companies, a rotating sponsored
//! carousel, CPF/CNPJ validation, postal-code geocoding, per-day
//! interaction analytics and paid promotions.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{
    distance::{calculate_bounding_box, haversine_distance},
    is_valid_document, DocumentKind, SearchPipeline, SponsorshipSelector,
};
pub use models::{Company, Coordinate, SearchHit, SearchRequest, SearchResponse};
