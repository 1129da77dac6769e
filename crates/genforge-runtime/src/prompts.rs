//! Prompt shaping for each request kind.

/// Wrap an application request in a code-generation instruction.
pub fn application_prompt(intent_text: &str) -> String {
    format!(
        "You are an expert React Native developer. Create a complete, working \
         React Native component for the following request:\n\n\
         {}\n\n\
         Requirements:\n\
         - Use functional components and hooks\n\
         - Include StyleSheet styles\n\
         - Export the component as the default export\n\
         - Return ONLY the code inside a single ```javascript block, no explanations",
        intent_text.trim()
    )
}

/// Wrap an image request in a prompt-engineering instruction. The model's
/// answer becomes the image backend's prompt.
pub fn enhancement_prompt(intent_text: &str) -> String {
    format!(
        "You are a prompt engineer for a Stable Diffusion image model. Rewrite \
         the following idea as a single detailed image prompt:\n\n\
         {}\n\n\
         Describe the subject, art style, lighting, colour palette and composition, \
         and add quality keywords (highly detailed, sharp focus). \
         Reply with the prompt text only, on one line, without quotes or commentary.",
        intent_text.trim()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompts_embed_intent() {
        let p = application_prompt("  a weather app ");
        assert!(p.contains("\n\na weather app\n\n"));
        assert!(p.contains("```javascript"));

        let p = enhancement_prompt("a cat");
        assert!(p.contains("a cat"));
        assert!(p.contains("Stable Diffusion"));
    }
}
