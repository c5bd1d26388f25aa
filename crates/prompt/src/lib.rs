//! Prompt templates for the assistant backend.
//!
//! This crate provides:
//! - YAML-based prompt definitions (system instructions + context template)
//! - A built-in default definition
//! - Handlebars rendering of the system and context messages

pub mod builder;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::render_prompt;
pub use loader::{list_prompts, load_prompt, resolve_prompt};
pub use types::{PromptDefinition, RenderedPrompt, BUILTIN_PROMPT_ID};
