//! Shared data model for the overgrid artwork pipeline.
//!
//! Holds the static art-style catalog, the per-unit request record, the
//! provenance tags and the filename/tag normalization rules that every
//! other crate agrees on.

pub mod artwork;
pub mod ext;
pub mod normalize;
pub mod style;

pub use artwork::{ArtworkRequest, CompositeResult, Provenance, RawArtwork};
pub use style::ArtStyle;
