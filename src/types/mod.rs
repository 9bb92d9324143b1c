//! Core data types shared across the engine, providers, and adapters.

mod completion;
mod outcome;
mod source;
mod usage;

pub use completion::{CompletionRequest, CompletionResponse};
pub use outcome::GenerationResult;
pub use source::{Ast, Definition, Language, Parameter, SourceFile, TestType};
pub use usage::UsageMetrics;
