//! Retrieval-augmented answering.
//!
//! Turns selected documents into a conversation for the chat model and
//! orchestrates the full query pipeline.

pub mod assist;
pub mod conversation;
pub mod links;

pub use assist::{AssistOptions, Assistant};
pub use conversation::{assemble_conversation, build_context, included_documents};
pub use links::collect_links;
