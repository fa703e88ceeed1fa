//! Offline rendering of wavesynth instruments into audio files.

pub mod config;
pub use config::*;

mod rendered;
pub use rendered::*;

pub mod builder;
pub use builder::*;

pub mod demo;

pub mod utils;

mod writer;
