//! The associative equality scan.
//!
//! Records are visited in index order. Each record's row is opened through the row buffer only
//! when it differs from the open row, a fixed-width key field is compared byte for byte against
//! the target, and the result is shifted into a hitmap byte MSB first. Completed bytes are staged
//! in an [`Accumulator`] row which is written into the hitmap zone each time it fills.
//!
//! Once every record is consumed the remaining bit positions of the staged row are padded with
//! `1`s, so positions past the last record read as "no further filtering", and the staged row is
//! flushed one final time.
use tracing::debug;

use crate::bank::{AccessStats, Bank};
use crate::error::ConfigError;
use crate::layout::Layout;

/// Equality over a fixed-width key field of every record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
  field_offset: usize,
  target: Vec<u8>,
  negate: bool,
  target_hitmap: usize,
}

impl Predicate {
  /// The reference key: eight zero bytes.
  pub const REFERENCE_KEY: [u8; 8] = [0; 8];
  /// The hitmap the reference run writes into.
  pub const REFERENCE_HITMAP: usize = 1;

  /// Compare `target.len()` bytes at `field_offset` within each record, writing into hitmap
  /// `target_hitmap`.
  pub fn new(field_offset: usize, target: Vec<u8>, target_hitmap: usize) -> Predicate {
    Predicate {
      field_offset,
      target,
      negate: false,
      target_hitmap,
    }
  }

  /// Like [`Predicate::new`] for a key field declared `field_width` bytes wide.
  pub fn for_field(
    field_offset: usize,
    field_width: usize,
    target: Vec<u8>,
    target_hitmap: usize,
  ) -> Result<Predicate, ConfigError> {
    if target.len() != field_width {
      return Err(ConfigError::TargetWidthMismatch {
        target_bytes: target.len(),
        field_width,
      });
    }
    Ok(Predicate::new(field_offset, target, target_hitmap))
  }

  pub fn reference() -> Predicate {
    Predicate::new(
      0,
      Predicate::REFERENCE_KEY.to_vec(),
      Predicate::REFERENCE_HITMAP,
    )
  }

  /// Turn the predicate into NOT EQUAL.
  pub fn negated(mut self) -> Predicate {
    self.negate = !self.negate;
    self
  }

  pub fn field_offset(&self) -> usize {
    self.field_offset
  }

  pub fn field_width(&self) -> usize {
    self.target.len()
  }

  pub fn target(&self) -> &[u8] {
    &self.target
  }

  pub fn is_negated(&self) -> bool {
    self.negate
  }

  pub fn target_hitmap(&self) -> usize {
    self.target_hitmap
  }

  /// Evaluate against the key field of a record starting at `record_offset` in `row`.
  pub fn matches(&self, row: &[u8], record_offset: usize) -> bool {
    let start = record_offset + self.field_offset;
    let equal = row[start..start + self.target.len()] == self.target[..];
    equal != self.negate
  }
}

/// A row-sized staging buffer for freshly computed hitmap bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accumulator {
  bytes: Vec<u8>,
}

impl Accumulator {
  pub fn new(row_bytes: usize) -> Accumulator {
    Accumulator {
      bytes: vec![0; row_bytes],
    }
  }

  pub fn bytes(&self) -> &[u8] {
    &self.bytes
  }

  pub fn reset(&mut self) {
    self.bytes.fill(0);
  }

  fn set(&mut self, offset: usize, byte: u8) {
    self.bytes[offset] = byte;
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
  Idle,
  Scanning,
  Draining,
  Done,
}

/// What a finished scan did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanReport {
  pub records_scanned: usize,
  pub matches: usize,
  /// Bits shifted into hitmap bytes, padding included.
  pub bits_written: usize,
  /// Completed hitmap bytes, padding included.
  pub bytes_written: usize,
  /// Accumulator rows written into the hitmap zone, the final flush included.
  pub rows_flushed: usize,
  /// Row traffic caused by this scan alone.
  pub access: AccessStats,
}

/// One equality pass over a bank.
#[derive(Debug)]
pub struct EqualityScan<'a> {
  layout: &'a Layout,
  predicate: Predicate,
  state: ScanState,
  /// In-progress hitmap byte.
  bitmap: u8,
  /// Bits produced so far.
  bitdex: usize,
  /// Completed bytes so far.
  hitdex: usize,
  report: ScanReport,
}

impl<'a> EqualityScan<'a> {
  pub fn new(layout: &'a Layout, predicate: Predicate) -> Result<EqualityScan<'a>, ConfigError> {
    layout.check_predicate(&predicate)?;
    Ok(EqualityScan {
      layout,
      predicate,
      state: ScanState::Idle,
      bitmap: 0,
      bitdex: 0,
      hitdex: 0,
      report: ScanReport::default(),
    })
  }

  pub fn state(&self) -> ScanState {
    self.state
  }

  pub fn predicate(&self) -> &Predicate {
    &self.predicate
  }

  /// Drive the scan from `Idle` to `Done`.
  ///
  /// The bank and accumulator are borrowed exclusively for the whole pass. Running a scan that
  /// is already `Done` starts it over.
  pub fn run(&mut self, bank: &mut Bank, accumulator: &mut Accumulator) -> ScanReport {
    assert_eq!(
      bank.store().row_bytes(),
      self.layout.row_bytes(),
      "bank rows do not match the layout"
    );
    assert_eq!(
      bank.store().bank_rows(),
      self.layout.bank_rows(),
      "bank size does not match the layout"
    );
    assert_eq!(
      accumulator.bytes().len(),
      self.layout.row_bytes(),
      "accumulator is not row sized"
    );

    let before = bank.stats();
    self.start(accumulator);
    self.scan(bank, accumulator);
    self.drain(accumulator);
    self.finish(bank, accumulator);
    self.report.access = bank.stats() - before;
    self.report
  }

  fn transition(&mut self, next: ScanState) {
    debug!(from = ?self.state, to = ?next, "equality scan state change");
    self.state = next;
  }

  fn start(&mut self, accumulator: &mut Accumulator) {
    self.bitmap = 0;
    self.bitdex = 0;
    self.hitdex = 0;
    self.report = ScanReport::default();
    accumulator.reset();
    self.transition(ScanState::Scanning);
  }

  fn scan(&mut self, bank: &mut Bank, accumulator: &mut Accumulator) {
    for index in 0..self.layout.records_processable() {
      let address = self.layout.record_address(index);
      if bank.row_buffer().current_row() != Some(address.row) {
        bank.load(address.row);
      }

      let matched = self
        .predicate
        .matches(bank.row_buffer().bytes(), address.byte_offset);
      self.report.records_scanned += 1;
      self.report.matches += usize::from(matched);

      if self.push_bit(matched, accumulator) {
        let flush = (self.hitdex - 1) / self.layout.row_bytes();
        self.flush(bank, accumulator, flush);
      }
    }
    self.transition(ScanState::Draining);
  }

  /// Pad with `1` bits until both the current byte and the staged row are complete. An empty
  /// scan still produces one full row.
  fn drain(&mut self, accumulator: &mut Accumulator) {
    let row_bytes = self.layout.row_bytes();
    while self.bitdex % 8 != 0 || self.hitdex % row_bytes != 0 || self.hitdex == 0 {
      self.push_bit(true, accumulator);
    }
    self.transition(ScanState::Done);
  }

  fn finish(&mut self, bank: &mut Bank, accumulator: &Accumulator) {
    let flush = (self.hitdex - 1) / self.layout.row_bytes();
    self.flush(bank, accumulator, flush);
    self.report.bits_written = self.bitdex;
    self.report.bytes_written = self.hitdex;
  }

  /// Shift one result bit in. Returns `true` when the staged row has just filled.
  fn push_bit(&mut self, bit: bool, accumulator: &mut Accumulator) -> bool {
    let row_bytes = self.layout.row_bytes();
    self.bitmap = (self.bitmap << 1) | u8::from(bit);
    self.bitdex += 1;

    if self.bitdex % 8 != 0 {
      return false;
    }
    accumulator.set(self.hitdex % row_bytes, self.bitmap);
    self.hitdex += 1;
    self.hitdex % row_bytes == 0
  }

  fn flush(&mut self, bank: &mut Bank, accumulator: &Accumulator, flush: usize) {
    let row = self
      .layout
      .hitmap_row(self.predicate.target_hitmap(), flush);
    debug!(row, flush, hitdex = self.hitdex, "flushing hitmap row");
    bank.write_row(row, accumulator.bytes());
    self.report.rows_flushed += 1;
  }
}
