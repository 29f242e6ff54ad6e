// Pure funnel logic: no I/O below this module.
pub mod category;
pub mod extract;
pub mod message;
pub mod phone;
pub mod records;
pub mod render;
pub mod schedule;

pub use crate::domain::model::{Prospect, Site};
pub use crate::domain::ports::Storage;
pub use crate::utils::error::Result;
