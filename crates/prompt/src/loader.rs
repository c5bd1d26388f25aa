//! Prompt loader for loading YAML prompt definitions.

use crate::types::{PromptDefinition, BUILTIN_PROMPT_ID};
use assist_core::{AppError, AppResult};
use std::path::Path;

/// Load a prompt definition by ID from a prompt directory.
///
/// This function looks for a file named `<id>.yml` directly inside `dir`.
///
/// # Arguments
/// * `dir` - Directory containing prompt YAML files
/// * `prompt_id` - Prompt identifier (e.g., "support.en")
///
/// # Returns
/// A parsed `PromptDefinition` or an error if not found/invalid.
///
/// # Example
/// ```no_run
/// use assist_prompt::load_prompt;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let prompt = load_prompt(Path::new("prompts"), "support.en")?;
/// println!("Loaded prompt: {}", prompt.title);
/// # Ok(())
/// # }
/// ```
pub fn load_prompt(dir: &Path, prompt_id: &str) -> AppResult<PromptDefinition> {
    let prompt_file = dir.join(format!("{}.yml", prompt_id));

    tracing::debug!("Loading prompt from: {:?}", prompt_file);

    if !prompt_file.exists() {
        let available = list_prompts(dir).unwrap_or_default();
        return Err(AppError::Prompt(format!(
            "Prompt '{}' not found in {:?}. Available prompts: [{}]",
            prompt_id,
            dir,
            available.join(", ")
        )));
    }

    let contents = std::fs::read_to_string(&prompt_file).map_err(|e| {
        AppError::Prompt(format!(
            "Failed to read prompt file {:?}: {}",
            prompt_file, e
        ))
    })?;

    let definition: PromptDefinition = serde_yaml::from_str(&contents).map_err(|e| {
        AppError::Prompt(format!(
            "Failed to parse prompt YAML {:?}: {}",
            prompt_file, e
        ))
    })?;

    validate_prompt(&definition)?;

    if definition.id != prompt_id {
        tracing::warn!(
            "Prompt file {:?} declares id '{}'",
            prompt_file,
            definition.id
        );
    }

    tracing::info!("Loaded prompt: {} ({})", definition.id, definition.title);

    Ok(definition)
}

/// List all prompt IDs available in a directory, sorted.
pub fn list_prompts(dir: &Path) -> AppResult<Vec<String>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut prompt_ids = Vec::new();

    for entry in walkdir::WalkDir::new(dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("yml") {
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                prompt_ids.push(stem.to_string());
            }
        }
    }

    prompt_ids.sort();
    Ok(prompt_ids)
}

/// Resolve the prompt to use.
///
/// Without a directory only the built-in prompt is available.
pub fn resolve_prompt(dir: Option<&Path>, prompt_id: &str) -> AppResult<PromptDefinition> {
    match dir {
        Some(dir) => load_prompt(dir, prompt_id),
        None if prompt_id == BUILTIN_PROMPT_ID => Ok(PromptDefinition::builtin()),
        None => Err(AppError::Prompt(format!(
            "Prompt '{}' requested but no prompt directory is configured",
            prompt_id
        ))),
    }
}

/// Validate a prompt definition.
fn validate_prompt(def: &PromptDefinition) -> AppResult<()> {
    if def.id.is_empty() {
        return Err(AppError::Prompt("Prompt ID cannot be empty".to_string()));
    }

    if def.title.is_empty() {
        return Err(AppError::Prompt("Prompt title cannot be empty".to_string()));
    }

    if def.language.trim().is_empty() {
        return Err(AppError::Prompt(
            "Prompt language cannot be empty".to_string(),
        ));
    }

    if def.system.trim().is_empty() {
        return Err(AppError::Prompt(
            "Prompt system template cannot be empty".to_string(),
        ));
    }

    if !def.context.contains("{{context}}") {
        return Err(AppError::Prompt(format!(
            "Prompt '{}' context template must reference {{{{context}}}}",
            def.id
        )));
    }

    // Validate API version format (simple check)
    if !def.api_version.contains('.') {
        return Err(AppError::Prompt(format!(
            "Invalid apiVersion format: {}. Expected format: 'x.y'",
            def.api_version
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn create_test_prompt(dir: &Path, id: &str, valid: bool) -> PathBuf {
        let content = if valid {
            format!(
                r#"
id: {}
title: "Test Prompt"
apiVersion: "1.0"
createdBy: test
language: English
system: "Answer only in {{{{language}}}}."
context: "CONTEXT:\n{{{{context}}}}\n\nQUESTION:"
"#,
                id
            )
        } else {
            "invalid: yaml: content:".to_string()
        };

        let file_path = dir.join(format!("{}.yml", id));
        fs::write(&file_path, content).unwrap();
        file_path
    }

    #[test]
    fn test_load_valid_prompt() {
        let temp_dir = TempDir::new().unwrap();
        create_test_prompt(temp_dir.path(), "test.prompt", true);

        let prompt = load_prompt(temp_dir.path(), "test.prompt").unwrap();
        assert_eq!(prompt.id, "test.prompt");
        assert_eq!(prompt.title, "Test Prompt");
        assert_eq!(prompt.language, "English");
        assert_eq!(prompt.system, "Answer only in {{language}}.");
    }

    #[test]
    fn test_load_nonexistent_prompt_lists_available() {
        let temp_dir = TempDir::new().unwrap();
        create_test_prompt(temp_dir.path(), "other", true);

        let err = load_prompt(temp_dir.path(), "nonexistent").unwrap_err();
        assert!(err.to_string().contains("other"));
    }

    #[test]
    fn test_load_invalid_yaml() {
        let temp_dir = TempDir::new().unwrap();
        create_test_prompt(temp_dir.path(), "invalid", false);

        assert!(load_prompt(temp_dir.path(), "invalid").is_err());
    }

    #[test]
    fn test_context_template_must_reference_context() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("broken.yml"),
            r#"
id: broken
title: "Broken"
apiVersion: "1.0"
language: English
system: "Be nice."
context: "QUESTION:"
"#,
        )
        .unwrap();

        assert!(matches!(
            load_prompt(temp_dir.path(), "broken"),
            Err(AppError::Prompt(_))
        ));
    }

    #[test]
    fn test_list_prompts() {
        let temp_dir = TempDir::new().unwrap();
        create_test_prompt(temp_dir.path(), "prompt2", true);
        create_test_prompt(temp_dir.path(), "prompt1", true);
        fs::write(temp_dir.path().join("notes.txt"), "ignored").unwrap();

        let prompts = list_prompts(temp_dir.path()).unwrap();
        assert_eq!(prompts, vec!["prompt1".to_string(), "prompt2".to_string()]);
    }

    #[test]
    fn test_resolve_prompt() {
        let builtin = resolve_prompt(None, BUILTIN_PROMPT_ID).unwrap();
        assert_eq!(builtin, PromptDefinition::builtin());

        assert!(resolve_prompt(None, "support.en").is_err());

        let temp_dir = TempDir::new().unwrap();
        create_test_prompt(temp_dir.path(), "support.en", true);
        let loaded = resolve_prompt(Some(temp_dir.path()), "support.en").unwrap();
        assert_eq!(loaded.language, "English");
    }
}
