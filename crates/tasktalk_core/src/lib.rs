pub mod config;
pub mod dispatch;
pub mod due;
pub mod error;
pub mod llm;
pub mod model;
pub mod parser;
pub mod session;
pub mod storage;
pub mod summarize;
pub mod task_store;
