//! Context assembly from retrieved documents

use crate::models::RetrievedDocument;

/// Context used when retrieval returns nothing
pub const NO_CONTEXT: &str = "No relevant information found.";

const ENTRY_SEPARATOR: &str = "\n\n";

/// Renders retrieved documents into the grounding block handed to the prompt
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextAssembler;

impl ContextAssembler {
    pub const fn new() -> Self {
        Self
    }

    /// Render documents in retrieval order as numbered blocks.
    ///
    /// Each entry is `Document {n}:\n{content}` with the content trimmed;
    /// entries are separated by a blank line.
    #[must_use]
    pub fn assemble(&self, retrieved: &[RetrievedDocument]) -> String {
        if retrieved.is_empty() {
            return NO_CONTEXT.to_string();
        }

        retrieved
            .iter()
            .enumerate()
            .map(|(idx, result)| {
                format!("Document {}:\n{}", idx + 1, result.document.content.trim())
            })
            .collect::<Vec<_>>()
            .join(ENTRY_SEPARATOR)
    }
}
