//! etl-cognition - PowerCenter workflow analyzer
//!
//! Parses PowerCenter XML exports and runs them through a fixed four-stage
//! pipeline: `parse_xml -> analyze_workflow -> map_dependencies -> summarize`.
//! The two text-producing stages ask a hosted LLM when an API key is set and
//! fall back to canned mock text otherwise. Every run gets a session folder
//! with a markdown report and a diagram of the pipeline.
//!
//! # Modules
//!
//! - [`sample`] - synthetic PowerCenter export for demos
//! - [`powercenter`] - repository model and XML parser
//! - [`pipeline`] - the four stages and their runner
//! - [`state`] - the record threaded through the stages
//! - [`llm`] - LLM client trait, OpenAI implementation, mock-aware adapter
//! - [`prompts`] - Handlebars prompt templates
//! - [`diagram`] - PNG and Mermaid rendering of the pipeline topology
//! - [`session`] / [`report`] - session folders and the markdown report
//! - [`extractor`] - one end-to-end run, shared by CLI and server
//! - [`server`] - HTTP API
//! - [`config`] / [`cli`] - configuration and command line

pub mod cli;
pub mod config;
pub mod diagram;
pub mod extractor;
pub mod llm;
pub mod pipeline;
pub mod powercenter;
pub mod prompts;
pub mod report;
pub mod sample;
pub mod server;
pub mod session;
pub mod state;

// Re-export commonly used types
pub use config::{Config, LlmConfig};
pub use extractor::{ExtractionResult, WorkflowExtractor};
pub use llm::{LlmAdapter, LlmClient, LlmError, OpenAIClient};
pub use pipeline::{Pipeline, PipelineError, Stage};
pub use powercenter::{ParseError, ParsedComponent, ParsedRepository, parse_repository};
pub use session::{Session, SessionError};
pub use state::{DependencyEdge, TransformationAnalysis, WorkflowState};
