pub mod error;
pub mod journal;
pub mod logger;
pub mod monitor;
pub mod snapshot;
pub mod validation;
