use crate::models::ChatMessage;
use serde_json::{json, Value};

/// System instruction shared by the QA and refine calls.
pub const SYSTEM_PROMPT: &str = "Always answer the question, even if the context isn't helpful.";

/// A named extraction job: one fixed question plus the schema its answer
/// must conform to. New extraction targets become new tasks, not new
/// handler code.
pub struct ExtractionTask {
    pub name: &'static str,
    pub query: &'static str,
    pub schema_name: &'static str,
    pub schema: Value,
}

/// The built-in contract-terms task: fee, deliverables with deadlines, and
/// payment timeline.
pub fn contract_terms_task() -> ExtractionTask {
    ExtractionTask {
        name: "contract_terms",
        query: "what is the fee, what are the deliverables and their timelines, and what is the payment timeline?",
        schema_name: "contract_terms",
        schema: json!({
            "type": "object",
            "properties": {
                "rate": { "type": "string" },
                "deliverables": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "deliverable": { "type": "string" },
                            "deadline": { "type": "string" }
                        },
                        "required": ["deliverable", "deadline"],
                        "additionalProperties": false
                    }
                },
                "paymentTimeline": { "type": "string" }
            },
            "required": ["rate", "deliverables", "paymentTimeline"],
            "additionalProperties": false
        }),
    }
}

/// First-pass question answering over retrieved context.
pub fn qa_messages(context: &str, query: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage {
            role: "system".to_string(),
            content: SYSTEM_PROMPT.to_string(),
        },
        ChatMessage {
            role: "user".to_string(),
            content: format!(
                "Context information is below.\n\
                 ---------------------\n\
                 {context}\n\
                 ---------------------\n\
                 Given the context information and not prior knowledge, \
                 answer the question: {query}\n"
            ),
        },
    ]
}

/// Revise an existing answer against additional retrieved context, or repeat
/// it unchanged if the new context does not help.
pub fn refine_messages(context: &str, query: &str, existing_answer: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage {
            role: "system".to_string(),
            content: SYSTEM_PROMPT.to_string(),
        },
        ChatMessage {
            role: "user".to_string(),
            content: format!(
                "We have the opportunity to refine the original answer \
                 (only if needed) with some more context below.\n\
                 ------------\n\
                 {context}\n\
                 ------------\n\
                 Given the new context, refine the original answer to better \
                 answer the question: {query}. \
                 If the context isn't useful, output the original answer again.\n\
                 Original Answer: {existing_answer}"
            ),
        },
    ]
}
