//! This crate implements the evaluation infrastructure around the BLIMP simulator, including:
//! - Memory initialisation and record placement
//! - Hex dumps of the bank and their parser
//! - A naive equality scan used as the correctness baseline
//! - The end-to-end compliance run driven by the `blimp_equality` binary
#[cfg(test)]
mod test;

pub mod dump;
pub mod init;
pub mod records;
pub mod util;

use anyhow::Result;
use blimp_core::{Accumulator, Bank, EqualityScan, Layout, Predicate, RowStore, ScanReport};
use rand::Rng;
use tracing::info;

use crate::init::create_memory;

/// Algorithm: Naive comparison
/// Predicate: Select if the key field equals the target
/// * `store`: bank contents, read directly without going through the row buffer
/// * `layout`: validated layout the records were placed with
/// * `predicate`: key field, target and negation
///
/// Returns one boolean per processable record.
pub fn naive_equality(store: &RowStore, layout: &Layout, predicate: &Predicate) -> Vec<bool> {
  (0..layout.records_processable())
    .map(|index| {
      let address = layout.record_address(index);
      predicate.matches(store.row(address.row), address.byte_offset)
    })
    .collect()
}

/// State of the bank after a compliance run.
pub struct ComplianceRun {
  pub bank: Bank,
  pub accumulator: Accumulator,
  pub report: ScanReport,
}

/// Create and fill a bank for `layout`, then scan it once with `predicate`.
pub fn run_compliance<R: Rng>(
  layout: &Layout,
  predicate: Predicate,
  rng: &mut R,
) -> Result<ComplianceRun> {
  let mut scan = EqualityScan::new(layout, predicate)?;

  info!("Creating memory...");
  let (mut bank, mut accumulator) = create_memory(layout, rng);

  info!("Starting compliance...");
  let report = scan.run(&mut bank, &mut accumulator);
  info!(
    records = report.records_scanned,
    matches = report.matches,
    activations = report.access.activations,
    rows_flushed = report.rows_flushed,
    "compliance finished"
  );

  Ok(ComplianceRun {
    bank,
    accumulator,
    report,
  })
}
