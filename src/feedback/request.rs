use super::image::DecodedImage;
use crate::error::InputError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DesignMetadata {
    pub frame_name: String,
    pub dimensions: Dimensions,
    #[serde(default)]
    pub text_content: Vec<String>,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub component_names: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FrameData {
    pub image: String,
    pub metadata: DesignMetadata,
}

/// Body accepted by both feedback endpoints.
///
/// Either the single-frame shape (`image` + `metadata`) or the multi-frame
/// shape (`frames`) must be present; `frames` wins when both are sent.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeedbackRequest {
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub metadata: Option<DesignMetadata>,
    #[serde(default)]
    pub frames: Option<Vec<FrameData>>,
    pub personas: Vec<String>,
    #[serde(default)]
    pub context: Option<String>,
}

/// One decoded frame, ready for a provider.
#[derive(Debug, Clone)]
pub struct Frame {
    pub image: DecodedImage,
    pub metadata: DesignMetadata,
}

/// The payload every task of a run shares read-only.
#[derive(Debug, Clone)]
pub struct AnalysisInput {
    pub frames: Vec<Frame>,
    pub context: Option<String>,
}

impl AnalysisInput {
    pub fn is_flow(&self) -> bool {
        self.frames.len() > 1
    }
}

impl FeedbackRequest {
    /// Split the request into the requested persona ids and the normalized,
    /// decoded analysis input.
    pub fn into_parts(self) -> Result<(Vec<String>, AnalysisInput), InputError> {
        let frames = match (self.frames, self.image, self.metadata) {
            (Some(frames), _, _) if !frames.is_empty() => frames,
            (_, Some(image), Some(metadata)) => vec![FrameData { image, metadata }],
            _ => return Err(InputError::MissingFrames),
        };

        let frames = frames
            .into_iter()
            .enumerate()
            .map(|(index, frame)| {
                Ok(Frame {
                    image: DecodedImage::from_base64(&frame.image, index)?,
                    metadata: frame.metadata,
                })
            })
            .collect::<Result<Vec<_>, InputError>>()?;

        let context = self.context.filter(|c| !c.trim().is_empty());

        Ok((self.personas, AnalysisInput { frames, context }))
    }
}
