//! Instrument parameters and their metadata.
//!
//! An instrument is one of a closed set of backends plus the envelopes,
//! LFOs and modulation routing shared by all of them. The render path
//! matches on [`BackendParams`] directly.

mod params;
pub use params::*;

mod keys;
pub use keys::*;

mod descriptors;
pub use descriptors::*;
