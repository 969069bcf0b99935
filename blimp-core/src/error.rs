use thiserror::Error;

/// A geometry or predicate that cannot be simulated.
///
/// Every variant is caught once, before a scan starts. A scan over a validated [`crate::Layout`]
/// never fails.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
  #[error("{what} must be non-zero")]
  ZeroSized { what: &'static str },

  /// Records must either tile a row exactly or span a whole number of rows.
  #[error("record size {record_bytes} is not aligned to the {row_bytes}-byte row buffer")]
  MisalignedRecord {
    record_bytes: usize,
    row_bytes: usize,
  },

  #[error("index field of {index_bytes} bytes does not fit a {record_bytes}-byte record")]
  IndexTooWide {
    index_bytes: usize,
    record_bytes: usize,
  },

  #[error("record zone ends at row {record_end} past the hitmap base row {hitmap_base_row}")]
  ZoneOverlap {
    record_end: usize,
    hitmap_base_row: usize,
  },

  #[error("hitmap zone ends at row {hitmap_end} past the end of a {bank_rows}-row bank")]
  ZoneOutOfBank { hitmap_end: usize, bank_rows: usize },

  #[error("{records} records need {needed} rows but the record zone has {available}")]
  RecordZoneTooSmall {
    records: usize,
    needed: usize,
    available: usize,
  },

  #[error("{rows_for_hitmaps} hitmap rows cannot be split evenly across {hitmap_count} hitmaps")]
  UnevenHitmapSplit {
    rows_for_hitmaps: usize,
    hitmap_count: usize,
  },

  #[error("each hitmap needs {needed} rows for {records} records but only has {available}")]
  HitmapTooSmall {
    records: usize,
    needed: usize,
    available: usize,
  },

  #[error("{reserved} reserved rows leave no room in a {bank_rows}-row bank")]
  NotEnoughRows { reserved: usize, bank_rows: usize },

  #[error("key field [{field_offset}, {field_end}) lies outside the {limit}-byte {scope}")]
  FieldOutOfRange {
    field_offset: usize,
    field_end: usize,
    limit: usize,
    scope: &'static str,
  },

  #[error("target value is empty")]
  EmptyTarget,

  #[error("hitmap index {index} is out of range for {hitmap_count} hitmaps")]
  HitmapIndexOutOfRange { index: usize, hitmap_count: usize },

  #[error("target value has {target_bytes} bytes but the key field is {field_width} bytes wide")]
  TargetWidthMismatch {
    target_bytes: usize,
    field_width: usize,
  },

  #[error("{what} overflows the address space")]
  Overflow { what: &'static str },
}
