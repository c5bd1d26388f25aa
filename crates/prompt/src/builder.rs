//! Prompt builder for rendering the system and context messages.

use crate::types::{PromptDefinition, RenderedPrompt};
use assist_core::{AppError, AppResult};
use handlebars::Handlebars;
use std::collections::HashMap;

/// Render a prompt definition.
///
/// This function:
/// 1. Resolves the response language (override or the definition's own)
/// 2. Renders the system template with `{{language}}`
/// 3. Renders the context template with `{{context}}` and `{{language}}`
///
/// # Arguments
/// * `definition` - Prompt definition
/// * `context` - Context block (newline-joined document descriptions, may be empty)
/// * `language` - Optional language override
///
/// # Example
/// ```no_run
/// use assist_prompt::{render_prompt, PromptDefinition};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let rendered = render_prompt(&PromptDefinition::builtin(), "Refunds take 5 days.", None)?;
/// println!("{}", rendered.context);
/// # Ok(())
/// # }
/// ```
pub fn render_prompt(
    definition: &PromptDefinition,
    context: &str,
    language: Option<&str>,
) -> AppResult<RenderedPrompt> {
    tracing::debug!("Rendering prompt: {}", definition.id);

    let language = language.unwrap_or(&definition.language).to_string();

    let mut variables = HashMap::new();
    variables.insert("language".to_string(), language.clone());

    let system = render_template(&definition.system, &variables)?;

    variables.insert("context".to_string(), context.to_string());
    let context = render_template(&definition.context, &variables)?;

    Ok(RenderedPrompt {
        system,
        context,
        source_prompt_id: definition.id.clone(),
        language,
    })
}

/// Render a Handlebars template with variables.
fn render_template(template: &str, variables: &HashMap<String, String>) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Disable HTML escaping for plain text
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    let rendered = handlebars
        .render("prompt", &variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))?;

    Ok(rendered)
}
