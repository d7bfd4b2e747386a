use anyhow::{Context, Result};
use tera::{Context as TeraContext, Tera};

const INSTRUCTION_TEMPLATE: &str = include_str!("prompts/instruction.tera");

/// Builds the single instruction sent to the completion provider: translate
/// `text` into `target_language`, or define up to two uncommon words when it is
/// already in that language, and explain any idioms.
pub fn render_instruction(text: &str, target_language: &str) -> Result<String> {
    let mut context = TeraContext::new();
    context.insert("text", text);
    context.insert("target_language", target_language.trim());

    let rendered = Tera::one_off(INSTRUCTION_TEMPLATE, &context, false)
        .with_context(|| "failed to render translation instruction")?;
    Ok(rendered.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::render_instruction;

    #[test]
    fn instruction_names_target_language_and_text() {
        let prompt = render_instruction("break a leg", " de ").unwrap();
        assert!(prompt.starts_with("Translate the following text into de."));
        assert!(prompt.contains("already written in de"));
        assert!(prompt.contains("at most two uncommon words"));
        assert!(prompt.contains("idiomatic expressions"));
        assert!(prompt.ends_with("Text: \"\"\"break a leg\"\"\""));
    }

    #[test]
    fn template_syntax_in_input_is_not_evaluated() {
        let prompt = render_instruction("{{ target_language }} <b>&</b>", "es").unwrap();
        assert!(prompt.contains("Text: \"\"\"{{ target_language }} <b>&</b>\"\"\""));
    }

    #[test]
    fn empty_text_still_renders() {
        let prompt = render_instruction("", "ja").unwrap();
        assert!(prompt.ends_with("Text: \"\"\"\"\"\""));
    }
}
