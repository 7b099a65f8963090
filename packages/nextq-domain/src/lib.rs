pub mod category;
pub mod scoring;
pub mod text;
pub mod vector;

pub use category::{Category, FeedbackKind, QueryStatus, SourceType};
pub use scoring::{ScoreBreakdown, WEIGHTS, overall_score};
