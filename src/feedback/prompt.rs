use super::{feedback_schema, AnalysisInput};
use crate::config::Persona;

/// System prompt: the persona's role plus single-screen or flow framing.
pub fn build_system_prompt(persona: &Persona, is_flow: bool) -> String {
    let framing = if is_flow {
        "You are evaluating a multi-screen user flow. Analyze transitions, \
         consistency, and the overall user journey across all screens. "
    } else {
        "You are evaluating a UI design screenshot. Analyze the visual design, \
         layout, typography, color usage, and user experience. "
    };

    format!(
        "{}\n\n{}Be specific and actionable in your feedback. \
         Rate severity of issues as 'high', 'medium', or 'low'.",
        persona.system_prompt, framing
    )
}

/// User prompt describing the frames, the designer's context and the exact
/// output contract. Runners attach the screenshots themselves.
pub fn build_prompt(persona: &Persona, input: &AnalysisInput) -> String {
    let mut parts = Vec::new();

    if input.is_flow() {
        parts.push(
            "You are analyzing a user flow consisting of multiple screens. \
             Analyze the complete user journey.\n"
                .to_string(),
        );
        for (idx, frame) in input.frames.iter().enumerate() {
            let meta = &frame.metadata;
            parts.push(format!(
                "Frame {}: \"{}\" ({}x{})",
                idx + 1,
                meta.frame_name,
                meta.dimensions.width,
                meta.dimensions.height
            ));
        }
        parts.push(
            "\nThe screenshots are attached in order. Focus on:\n\
             - Transitions between screens (is the flow logical?)\n\
             - Visual consistency across screens\n\
             - Overall user journey and experience\n\
             - Individual screen issues that affect the flow"
                .to_string(),
        );
    } else {
        parts.push("Analyze the attached design screenshot.".to_string());
        if let Some(frame) = input.frames.first() {
            let metadata = serde_json::to_string_pretty(&frame.metadata).unwrap_or_default();
            parts.push(format!("\nDesign metadata:\n{}", metadata));
        }
    }

    if let Some(context) = &input.context {
        parts.push(format!("\nDesigner's context: {}", context));
    }

    let last_frame = input.frames.len().saturating_sub(1);
    parts.push(format!(
        "\nProvide your feedback as the '{label}' persona. Your persona ID is '{id}'.\n\n\
         For annotations: provide bounding boxes highlighting where each issue \
         is located in the screenshot. Each annotation has:\n\
         - frame_index: 0-based index of which frame (0-{last_frame})\n\
         - x_pct, y_pct: top-left corner as percentage (0-100) of image width/height\n\
         - width_pct, height_pct: box size as percentage (0-100) of image width/height\n\
         - issue_index: 0-based index into the issues array\n\
         - label: short label for the area\n\
         Estimate the regions visually. It's OK to be approximate.\n\n\
         Respond with a single JSON object and nothing else. It must match this JSON Schema:\n\
         ```json\n{schema}\n```",
        label = persona.label,
        id = persona.id,
        last_frame = last_frame,
        schema = feedback_schema(),
    ));

    parts.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::{DecodedImage, DesignMetadata, Dimensions, Frame};

    fn persona() -> Persona {
        Persona {
            id: "power_user".to_string(),
            label: "Power User".to_string(),
            system_prompt: "You use this daily.".to_string(),
            enabled: true,
            provider: None,
            timeout_sec: None,
        }
    }

    fn frame(name: &str) -> Frame {
        Frame {
            image: DecodedImage {
                bytes: vec![1, 2, 3],
                media_type: "image/png",
            },
            metadata: DesignMetadata {
                frame_name: name.to_string(),
                dimensions: Dimensions {
                    width: 1440,
                    height: 900,
                },
                text_content: vec!["Sign up".to_string()],
                colors: vec![],
                component_names: vec![],
            },
        }
    }

    #[test]
    fn test_single_frame_prompt_embeds_metadata() {
        let input = AnalysisInput {
            frames: vec![frame("Landing")],
            context: Some("Marketing site".to_string()),
        };
        let prompt = build_prompt(&persona(), &input);
        assert!(prompt.contains("\"frame_name\": \"Landing\""));
        assert!(prompt.contains("Designer's context: Marketing site"));
        assert!(prompt.contains("Your persona ID is 'power_user'"));
        assert!(prompt.contains("\"overall_impression\""));
    }

    #[test]
    fn test_flow_prompt_lists_frames() {
        let input = AnalysisInput {
            frames: vec![frame("Login"), frame("Dashboard")],
            context: None,
        };
        let prompt = build_prompt(&persona(), &input);
        assert!(prompt.contains("Frame 1: \"Login\" (1440x900)"));
        assert!(prompt.contains("Frame 2: \"Dashboard\" (1440x900)"));
        assert!(prompt.contains("(0-1)"));
        assert!(!prompt.contains("Designer's context"));
    }

    #[test]
    fn test_system_prompt_framing() {
        let single = build_system_prompt(&persona(), false);
        let flow = build_system_prompt(&persona(), true);
        assert!(single.starts_with("You use this daily."));
        assert!(single.contains("UI design screenshot"));
        assert!(flow.contains("multi-screen user flow"));
    }
}
