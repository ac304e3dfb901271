//! GLONASS L1 C/A GNAV message decoding and orbit/clock propagation.
//!
//! Consumes already-synchronized, frame-aligned navigation strings and
//! produces immutable ephemeris and almanac records plus propagated
//! satellite states for a downstream PVT solver.

pub mod almanac;
pub mod bits;
pub mod constants;
pub mod decoder;
pub mod ephemeris;
pub mod fields;
pub mod frame;
pub mod orbit;

use thiserror::Error;

/// Runtime data faults while ingesting a string. Anything structural
/// (field tables, integrator configuration) panics instead: those are
/// build-time errors, not data conditions.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GnavError {
    #[error("invalid string length: {0} symbols")]
    InvalidLength(usize),
    #[error("time mark mismatch")]
    TimeMark,
    #[error("invalid string number {0}")]
    InvalidStringNumber(u8),
}

pub use almanac::AlmanacEntry;
pub use decoder::GnavDecoder;
pub use ephemeris::Ephemeris;
pub use frame::RawString;
pub use orbit::{SatelliteState, propagate};
