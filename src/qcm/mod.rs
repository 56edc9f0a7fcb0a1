// Question generation: prompts, the chat model client, the answer-table
// parser and the per-note pipeline that ties them to the keyword engine.

pub mod generator;
pub mod llm;
pub mod parser;
pub mod prompt;

pub use generator::{NoteOutcome, ProcessingSummary, QcmGenerator};
