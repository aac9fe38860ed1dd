pub mod export;
pub mod generation;
pub mod llm;
pub mod prompt;
pub mod script;
pub mod store;
pub mod workflow;
