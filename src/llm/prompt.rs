use std::fmt::Write;

const SYSTEM_INSTRUCTION: &str = "You are the assistant for a job portal. Answer the question using only the numbered context below. If the context does not contain the answer, say you don't have that information and briefly list what the context does cover.";

/// Assemble the generation prompt: instruction, numbered snippets in
/// retrieval order, then the question with an answer cue.
pub fn build_prompt(snippets: &[String], question: &str) -> String {
    let mut prompt = String::from(SYSTEM_INSTRUCTION);
    prompt.push_str("\n\nContext:\n");
    for (i, snippet) in snippets.iter().enumerate() {
        let _ = writeln!(prompt, "{}. {}", i + 1, snippet.trim());
    }
    let _ = write!(prompt, "\nQuestion: {}\nAnswer:", question.trim());
    prompt
}
