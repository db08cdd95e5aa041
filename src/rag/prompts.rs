//! Prompt template for grounded question answering

const INSTRUCTION: &str = "Answer the following question using only the provided context. \
If the context doesn't contain enough information to answer the question, say so clearly.";

/// Builds the completion prompt from the assembled context and the question
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptBuilder;

impl PromptBuilder {
    pub const fn new() -> Self {
        Self
    }

    /// Only `context` and the trimmed `query` vary; the surrounding text is fixed
    #[must_use]
    pub fn build(&self, query: &str, context: &str) -> String {
        format!(
            "{INSTRUCTION}\n\nContext:\n{context}\n\nQuestion: {question}\n\nAnswer:\n",
            question = query.trim()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_prompt_layout() {
        let prompt = PromptBuilder::new().build("  What is AI?\n", "Document 1:\nAI is...");
        assert_eq!(
            prompt,
            "Answer the following question using only the provided context. \
If the context doesn't contain enough information to answer the question, say so clearly.\n\
\n\
Context:\n\
Document 1:\nAI is...\n\
\n\
Question: What is AI?\n\
\n\
Answer:\n"
        );
    }

    #[test]
    fn test_build_is_deterministic() {
        let builder = PromptBuilder::new();
        assert_eq!(builder.build("q", "c"), builder.build("q", "c"));
    }

    #[test]
    fn test_context_is_inserted_verbatim() {
        let prompt = PromptBuilder::new().build("q", "  padded context  ");
        assert!(prompt.contains("Context:\n  padded context  \n\nQuestion: q"));
        assert!(prompt.trim_end().ends_with("Answer:"));
    }
}
