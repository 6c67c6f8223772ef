//! Prompt templates. The agent's behavior is keyed to these exact strings,
//! so they are fixed verbatim; the CSV text and the question are embedded
//! whole, with no escaping and no size limit.

pub fn analysis_prompt(csv_text: &str) -> String {
    format!("Analyze these transaction data:\n\n{csv_text}")
}

pub fn chat_prompt(question: &str) -> String {
    format!("Based on the analyzed transaction data, answer this query: {question}")
}
