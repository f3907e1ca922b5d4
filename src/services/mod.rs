//! Content services used by the tool handlers

pub mod templates;
pub mod validation;

pub use templates::TemplateService;
pub use validation::{
    GapAnalysis, Readability, RelatedArticle, ValidationEngine, ValidationReport, analyze_gaps,
    read_content,
};
