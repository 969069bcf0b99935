//! This crate is the entry point of a simulated BLIMP equality run. It has responsibilities for:
//! 1. Turning command-line arguments into a layout and predicate, defaulting to the reference run
//! 2. Running the compliance pass over a freshly initialised bank
//! 3. Writing the resulting bank to a hex dump for external verification
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use blimp_core::{Geometry, Layout, Predicate};
use blimp_eval::{dump::dump_to_file, run_compliance, util::seeded_rng};
use clap::Parser;
use tracing::info;

/// Simulates a BLIMP equality scan over a single DRAM bank and dumps the bank.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// Sets the dump file to write
  #[arg(long, short, default_value = "test.memdump")]
  pub output: PathBuf,
  #[arg(long, default_value_t = Predicate::REFERENCE_HITMAP, help = "Hitmap receiving the results")]
  pub hitmap_index: usize,
  #[arg(long, default_value_t = 0, help = "Byte offset of the key field within a record")]
  pub field_offset: usize,
  #[arg(long, default_value_t = 8, help = "Width of the key field in bytes")]
  pub field_width: usize,
  #[arg(long, default_value = "0000000000000000", help = "Target key as big-endian hex")]
  pub value: String,
  /// Flip every comparison result (NOT EQUAL)
  #[arg(long)]
  pub negate: bool,
  /// Seed for the record contents, random when omitted
  #[arg(long)]
  pub seed: Option<u64>,
  /// Log scan state changes and hitmap flushes
  #[arg(long, short)]
  pub verbose: bool,
}

impl Args {
  pub fn predicate(&self) -> Result<Predicate> {
    let target = parse_hex(&self.value)?;
    let predicate = Predicate::for_field(
      self.field_offset,
      self.field_width,
      target,
      self.hitmap_index,
    )?;
    Ok(if self.negate {
      predicate.negated()
    } else {
      predicate
    })
  }
}

/// Decode a string of hex digit pairs, most significant byte first.
pub fn parse_hex(value: &str) -> Result<Vec<u8>> {
  let value = value.strip_prefix("0x").unwrap_or(value);
  if value.is_empty() || !value.is_ascii() || value.len() % 2 != 0 {
    bail!("{:?} is not a whole number of hex bytes", value);
  }
  (0..value.len())
    .step_by(2)
    .map(|i| {
      u8::from_str_radix(&value[i..i + 2], 16)
        .with_context(|| format!("{:?} is not a hex byte", &value[i..i + 2]))
    })
    .collect()
}

pub fn run(args: &Args) -> Result<()> {
  let layout = Layout::new(Geometry::REFERENCE)?;
  let predicate = args.predicate()?;
  let mut rng = seeded_rng(args.seed);

  let run = run_compliance(&layout, predicate, &mut rng)?;

  info!("Dumping data...");
  dump_to_file(run.bank.store(), &args.output)?;
  info!(path = %args.output.display(), "dump written");
  Ok(())
}

#[cfg(test)]
mod tests {
  use blimp_core::ConfigError;
  use rstest::rstest;

  use super::*;

  #[rstest]
  #[case("0000000000000000", vec![0; 8])]
  #[case("0xCAFE", vec![0xCA, 0xFE])]
  #[case("00ff10", vec![0x00, 0xFF, 0x10])]
  fn test_parse_hex(#[case] value: &str, #[case] expected: Vec<u8>) {
    assert_eq!(parse_hex(value).unwrap(), expected);
  }

  #[rstest]
  #[case("")]
  #[case("abc")]
  #[case("zz")]
  #[case("0x0x12")]
  fn test_parse_hex_rejects(#[case] value: &str) {
    assert!(parse_hex(value).is_err());
  }

  #[test]
  fn test_defaults_are_reference_run() {
    let args = Args::parse_from(["blimp_equality"]);
    assert_eq!(args.output, PathBuf::from("test.memdump"));
    assert_eq!(args.predicate().unwrap(), Predicate::reference());
  }

  #[test]
  fn test_width_mismatch() {
    let args = Args::parse_from(["blimp_equality", "--value", "00ff", "--field-width", "4"]);
    let err = args.predicate().unwrap_err();
    assert_eq!(
      err.downcast_ref::<ConfigError>(),
      Some(&ConfigError::TargetWidthMismatch {
        target_bytes: 2,
        field_width: 4
      })
    );
  }

  #[test]
  fn test_negated_predicate() {
    let args = Args::parse_from([
      "blimp_equality",
      "--value",
      "0102",
      "--field-width",
      "2",
      "--field-offset",
      "8",
      "--negate",
    ]);
    let predicate = args.predicate().unwrap();
    assert!(predicate.is_negated());
    assert_eq!(predicate.target(), &[1, 2]);
    assert_eq!(predicate.field_offset(), 8);
  }
}
