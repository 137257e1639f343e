//! Rule-based question answering over a Batman-universe SQLite store.

pub mod cache;
pub mod chatbot;
pub mod compare;
pub mod compose;
pub mod config;
pub mod error;
pub mod import;
pub mod knowledge;
pub mod matcher;
pub mod relations;
pub mod router;
pub mod scope;
pub mod similarity;
pub mod store;

#[cfg(test)]
mod testing;

pub use chatbot::Chatbot;
pub use config::Config;
pub use error::{Error, Result};
pub use gotham_types::{EntityId, EntityKind, MatchKind, QueryResponse, QueryType, Stats};
pub use store::Store;
