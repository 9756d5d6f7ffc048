mod contract;
mod image;
mod parse;
mod prompt;
mod request;

pub use contract::{feedback_schema, ReviewFeedback};
pub use self::image::DecodedImage;
pub use parse::parse_feedback;
pub use prompt::{build_prompt, build_system_prompt};
pub use request::{AnalysisInput, FeedbackRequest, Frame};

#[cfg(test)]
pub use request::{DesignMetadata, Dimensions};
