//! Command handlers for the assist binary.

pub mod ask;
pub mod serve;

// Re-export command types for convenience
pub use ask::AskCommand;
pub use serve::ServeCommand;
