// Application layer: funnel stages wired to the domain ports, the full-run engine and the nightly runner
#[cfg(feature = "cli")]
pub mod commands;
pub mod factory;
pub mod funnel;
pub mod nightly;
pub mod stages;

pub use funnel::{Funnel, RunOutcome};
pub use nightly::{NightlyOutcome, NightlyRunner};
