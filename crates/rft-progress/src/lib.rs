//! The interactive transfer readout: byte/time unit formatting plus a
//! `\r`-rewinding stdout [`Reporter`]. Entirely cosmetic — suppressing it
//! changes nothing about whether a transfer succeeds.

pub mod reporter;
pub mod units;

pub use reporter::Reporter;
