//! Conversation assembly.
//!
//! Builds the three-message conversation sent to the chat model: rendered
//! system instructions, a context message made of document descriptions, and
//! the user's query.

use crate::types::DocumentRecord;
use assist_core::AppResult;
use assist_llm::{ChatMessage, Conversation};
use assist_prompt::{render_prompt, PromptDefinition};

/// The leading documents that go into the context message.
pub fn included_documents(documents: &[DocumentRecord], include_limit: usize) -> &[DocumentRecord] {
    &documents[..documents.len().min(include_limit)]
}

/// Join document descriptions, one per line.
pub fn build_context(documents: &[DocumentRecord]) -> String {
    documents
        .iter()
        .map(|d| d.description.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Assemble the conversation for a query.
///
/// # Arguments
/// * `prompt` - Prompt definition supplying the system and context templates
/// * `language` - Optional override of the prompt's response language
/// * `query` - The user's question, passed through unchanged
/// * `documents` - Selected documents, closest first
/// * `include_limit` - How many leading documents feed the context
pub fn assemble_conversation(
    prompt: &PromptDefinition,
    language: Option<&str>,
    query: &str,
    documents: &[DocumentRecord],
    include_limit: usize,
) -> AppResult<Conversation> {
    let included = included_documents(documents, include_limit);
    let context = build_context(included);

    let rendered = render_prompt(prompt, &context, language)?;

    tracing::debug!(
        "Assembled conversation with {} of {} documents ({} context chars)",
        included.len(),
        documents.len(),
        context.chars().count()
    );

    Ok(Conversation::new()
        .with_message(ChatMessage::system(rendered.system))
        .with_message(ChatMessage::user(rendered.context))
        .with_message(ChatMessage::user(query)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assist_llm::Role;

    fn doc(id: &str, description: &str) -> DocumentRecord {
        DocumentRecord {
            id: id.to_string(),
            description: description.to_string(),
            ..DocumentRecord::default()
        }
    }

    #[test]
    fn test_included_documents() {
        let documents = vec![doc("a", "A"), doc("b", "B")];
        assert_eq!(included_documents(&documents, 3).len(), 2);
        assert_eq!(included_documents(&documents, 1)[0].id, "a");
        assert!(included_documents(&[], 3).is_empty());
    }

    #[test]
    fn test_build_context() {
        let documents = vec![doc("a", "First"), doc("b", "Second")];
        assert_eq!(build_context(&documents), "First\nSecond");
        assert_eq!(build_context(&[]), "");
    }

    #[test]
    fn test_three_messages() {
        let documents = vec![
            doc("a", "Alpha"),
            doc("b", "Beta"),
            doc("c", "Gamma"),
            doc("d", "Delta"),
        ];

        let conversation = assemble_conversation(
            &PromptDefinition::builtin(),
            None,
            "What is the refund policy?",
            &documents,
            3,
        )
        .unwrap();

        let messages = conversation.messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].role, Role::System);
        assert!(messages[0].content.contains("Russian"));
        assert_eq!(messages[1].role, Role::User);
        assert_eq!(
            messages[1].content,
            "CONTEXT:\nAlpha\nBeta\nGamma\n\nQUESTION:"
        );
        assert_eq!(messages[2].role, Role::User);
        assert_eq!(messages[2].content, "What is the refund policy?");
    }

    #[test]
    fn test_no_documents_still_has_marker() {
        let conversation =
            assemble_conversation(&PromptDefinition::builtin(), Some("English"), "Hi", &[], 3)
                .unwrap();

        let messages = conversation.messages();
        assert_eq!(messages.len(), 3);
        assert!(messages[0].content.contains("English"));
        assert!(messages[1].content.ends_with("QUESTION:"));
        assert_eq!(messages[2].content, "Hi");
    }

    #[test]
    fn test_query_is_not_templated() {
        let conversation = assemble_conversation(
            &PromptDefinition::builtin(),
            None,
            "{{context}} <b>",
            &[doc("a", "x")],
            3,
        )
        .unwrap();

        assert_eq!(conversation.messages()[2].content, "{{context}} <b>");
    }
}
