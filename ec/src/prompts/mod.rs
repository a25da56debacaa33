//! Prompt templates for the LLM-backed pipeline stages

mod embedded;
mod loader;

pub use loader::{AnalyzePromptContext, PromptLoader, SummaryPromptContext};
