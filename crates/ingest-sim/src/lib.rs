//! Runnable motion sources: a synthetic waveform generator and a batch replay.

mod replay;
mod sim;

pub use replay::ReplaySource;
pub use sim::{SimConfig, SimSource};
