//! Reconstruct per-instruction pipeline timelines from the cycle-by-cycle
//! listings (`.lst`) written by an HDL simulator.
//!
//! The listing is parsed into a [`parse::SignalTable`], reduced to one sample
//! per clock tick, and replayed tick by tick through a
//! [`pipeline::CommandManager`]. The retired instructions' histories are then
//! rewritten into the stage codes shown by [`export`].
pub mod config;
pub mod convert;
mod error;
pub mod export;
mod generate;
pub mod parse;
pub mod pipeline;
pub mod sample;

pub use error::FormatError;
pub use generate::{
    drive, generate, DecodeRecord, GenerateOption, IssueRecord, TickSignals, Timeline,
};
