//! Collapses flat odds-movement feeds into per-event summaries, and the
//! event snapshot into per-sport counts.

pub mod grouping;
pub mod sports;

pub use grouping::{group_movements, movement_facets, MovementFacets};
pub use sports::{sport_catalogue, sport_catalogue_at, SportCategory};
