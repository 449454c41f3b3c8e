// Extraction Pipeline
// Ordered extractors that fill an AnalysisRecord from a raw report:
// - source: trailing @handle and militant-sourced reporting
// - who: attributed actor
// - action: first matching action category
// - target: special-case targets, then the target map
// - location: correction table and location cascade
// - casualties: personnel and equipment counts
// - details: independent annotation rules

pub mod source;
pub mod who;
pub mod action;
pub mod target;
pub mod location;
pub mod casualties;
pub mod details;

pub use action::{extract_action, strip_claimed};
pub use casualties::extract_casualties;
pub use details::{extract_details, DetailRule, ALLEGED_DETAIL, HIDEOUT_DETAIL};
pub use location::extract_location;
pub use source::{attribute_social_media_source, extract_source, strip_source, DEFAULT_SOURCE};
pub use target::extract_target;
pub use who::extract_who;
