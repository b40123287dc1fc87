//! HTTP adapters for external collaborators.

pub mod dispatcher;

pub use dispatcher::HttpEvaluationDispatcher;
