//! Prompt templates sent to the image models.

const FEEDBACK_PLACEHOLDER: &str = "{user_feedback}";

pub const IMAGE_REGENERATION_PROMPT: &str = r#"You are an expert interior designer and renovation consultant.
Analyze these property images and regenerate them based on the user's feedback.

User Feedback: {user_feedback}

Instructions:
1. Analyze the provided images
2. Apply the user's renovation feedback to transform the space
3. Generate new images showing the renovated/redesigned space

Focus on:
- Applying the requested style changes
- Maintaining realistic proportions and lighting
- Keeping the core room structure while updating finishes, colors, and fixtures

Generate the renovated version of each image based on the user's requirements.
"#;

pub fn render_regeneration_prompt(user_feedback: &str) -> String {
    IMAGE_REGENERATION_PROMPT.replace(FEEDBACK_PLACEHOLDER, user_feedback)
}
