// Application layer - business rules and orchestration of store + cache

pub mod error;
pub mod service;

pub use error::*;
pub use service::*;
