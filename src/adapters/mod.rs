//! Adapter implementations of the domain ports.

pub mod http;
pub mod questions;
pub mod sqlite;

pub use http::HttpEvaluationDispatcher;
pub use questions::StaticQuestionProvider;
