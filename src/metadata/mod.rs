//! Article metadata
//!
//! Every article carries a YAML metadata block inside an HTML comment. This
//! module parses that block into a [`MetadataDocument`] and rewrites it in
//! place through the [`MetadataStore`].

pub mod block;
mod document;
mod store;
mod value;

pub use document::{
    ARTICLE_METADATA, CROSS_REFERENCES, MetadataDocument, STATUS_NOT_VALIDATED, VALIDATION_TYPES,
    VALIDATIONS, timestamp_now,
};
pub use store::{MetadataStore, MetadataValidation};
pub use value::{MetaMap, MetaValue};
