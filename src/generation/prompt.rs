//! Prompt templates for grounded answer generation

use crate::index::SearchResult;

/// Notice substituted when retrieval finds nothing relevant
pub const NO_CONTEXT_NOTICE: &str =
    "No relevant documents were found for this question. Suggest rephrasing it.";

/// Prompt builder for document-grounded answers
pub struct PromptBuilder;

impl PromptBuilder {
    /// Build context from retrieved chunks
    ///
    /// When nothing was retrieved, an explicit notice is used instead so the
    /// model can tell the user rather than hallucinate.
    pub fn build_context(results: &[SearchResult]) -> String {
        if results.is_empty() {
            return NO_CONTEXT_NOTICE.to_string();
        }

        results
            .iter()
            .enumerate()
            .map(|(i, result)| {
                format!(
                    "--- Document {} ({}) ---\n{}",
                    i + 1,
                    result.path,
                    result.content
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Build the question-answering prompt
    pub fn build_qa_prompt(question: &str, context: &str) -> String {
        format!(
            r#"You are a helpful AI assistant answering questions about a software project.
Your goal is to give accurate, context-grounded answers based on the retrieved documents.

Retrieved Context:
{context}

User Question: {question}

Please give a detailed, helpful answer that directly addresses the question using the available context.
Keep the answer well structured and easy to follow. Use markdown formatting for any code so it reads well."#,
            context = context,
            question = question
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(path: &str, content: &str) -> SearchResult {
        SearchResult {
            path: path.to_string(),
            chunk_index: 0,
            content: content.to_string(),
            similarity: 0.9,
        }
    }

    #[test]
    fn context_numbers_documents_and_includes_paths() {
        let context = PromptBuilder::build_context(&[
            result("a.md", "alpha"),
            result("b/c.py", "beta"),
        ]);

        assert!(context.contains("--- Document 1 (a.md) ---\nalpha"));
        assert!(context.contains("--- Document 2 (b/c.py) ---\nbeta"));
    }

    #[test]
    fn empty_results_produce_the_no_context_notice() {
        assert_eq!(PromptBuilder::build_context(&[]), NO_CONTEXT_NOTICE);
    }

    #[test]
    fn qa_prompt_embeds_question_and_context() {
        let prompt = PromptBuilder::build_qa_prompt("How does login work?", "some context");
        assert!(prompt.contains("How does login work?"));
        assert!(prompt.contains("some context"));
        assert!(prompt.contains("markdown"));
    }
}
