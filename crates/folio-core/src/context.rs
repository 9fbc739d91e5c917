//! Full-corpus synthesis context.
//!
//! Some questions ("list all your projects", "what stacks do you know?")
//! need every document at once. [`corpus_context`] concatenates the whole
//! corpus verbatim under one labelled section per document. There is no
//! truncation: the reasoning model's context window is assumed to exceed the
//! corpus size.

use crate::models::Document;

/// Header that opens each document's section.
pub fn section_header(name: &str) -> String {
    format!("=== PROJECT: {} ===", name)
}

/// Render all `documents`, in order, for the owner called `owner_name`.
pub fn corpus_context(owner_name: &str, documents: &[Document]) -> String {
    if documents.is_empty() {
        return "No project documents are currently loaded.".to_string();
    }

    let sections: Vec<String> = documents
        .iter()
        .map(|doc| format!("{}\n{}\n", section_header(&doc.name), doc.content))
        .collect();

    format!(
        "Here are ALL the project READMEs from {owner}'s portfolio:\n\n\
         {body}\n\n\
         Based on these projects, you can now answer questions about:\n\
         - The complete list of projects\n\
         - Technologies and tech stacks used across all projects\n\
         - Skills demonstrated\n\
         - Project descriptions and purposes\n",
        owner = owner_name,
        body = sections.join("\n"),
    )
}
