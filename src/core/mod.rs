pub mod cost;
pub mod error;
pub mod llm;
pub mod providers;
pub mod safety;
