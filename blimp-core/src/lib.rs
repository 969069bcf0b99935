//! This crate provides the core of a bit-level in-memory processor (BLIMP) simulator: a DRAM
//! bank modelled as fixed-width rows behind a single row buffer, and an associative equality scan
//! that streams over the records in the bank and writes a bit-packed hitmap back into it.
//!
//! A run goes through these steps:
//! 1. Describe the bank with a [`Geometry`] and validate it into a [`Layout`]
//! 2. Fill a [`Bank`] with records
//! 3. Run an [`EqualityScan`] for a [`Predicate`]
//! 4. Read the result back with [`Hitmap::read`]
pub mod bank;
pub mod config;
pub mod error;
pub mod hitmap;
pub mod layout;
pub mod scan;

pub use bank::{AccessStats, Bank, RowBuffer, RowStore};
pub use config::Geometry;
pub use error::ConfigError;
pub use hitmap::Hitmap;
pub use layout::{HitmapAddress, Layout, Packing, RecordAddress, Zone};
pub use scan::{Accumulator, EqualityScan, Predicate, ScanReport, ScanState};
