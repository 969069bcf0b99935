use crate::error::ConfigError;

/// The raw bank geometry of a simulation run.
///
/// A [`Geometry`] is unchecked: it is only meaningful once it has been validated into a
/// [`crate::Layout`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
  /// Width of one row (and of the row buffer) in bytes.
  pub row_bytes: usize,
  /// Number of rows in the bank.
  pub bank_rows: usize,
  /// Size of one record, index field included.
  pub record_bytes: usize,
  /// Size of the index (key) field at the start of each record.
  pub index_bytes: usize,
  /// Number of independently addressable hitmaps.
  pub hitmap_count: usize,
  /// First row of the record zone. Rows before it form the utility zone.
  pub record_base_row: usize,
  /// Rows actually holding records.
  pub rows_for_records: usize,
  /// Number of records a scan walks over.
  pub records_processable: usize,
  /// First row of the hitmap zone.
  pub hitmap_base_row: usize,
  /// Rows shared by all hitmaps.
  pub rows_for_hitmaps: usize,
}

impl Geometry {
  /// A 32MiB bank of 1KiB rows holding 512-byte records and three hitmaps.
  pub const REFERENCE: Geometry = Geometry {
    row_bytes: 1024,
    bank_rows: 32768,
    record_bytes: 512,
    index_bytes: 8,
    hitmap_count: 3,
    record_base_row: 514,
    rows_for_records: 32220,
    records_processable: 64440,
    hitmap_base_row: 32734,
    rows_for_hitmaps: 24,
  };

  /// Total size of the bank. Only meaningful for a geometry that passed [`crate::Layout::new`].
  pub fn bank_bytes(&self) -> usize {
    self.row_bytes * self.bank_rows
  }

  /// Derive a geometry by packing records and hitmaps into the rows left after `reserved_rows`.
  ///
  /// Placement works in blocks. A block is `8 * record_bytes` data rows, which hold exactly
  /// `row_bytes * 8` records, plus one row per hitmap covering those records. Whole blocks are
  /// placed while they fit; the remaining rows then receive one more set of hitmap rows and as
  /// many records as still fit, provided at least one record does.
  ///
  /// The record zone starts right after the reserved rows and the hitmap zone right after the
  /// record zone.
  pub fn derive(
    row_bytes: usize,
    bank_rows: usize,
    record_bytes: usize,
    index_bytes: usize,
    hitmap_count: usize,
    reserved_rows: usize,
  ) -> Result<Geometry, ConfigError> {
    check_dimensions(row_bytes, bank_rows, record_bytes, hitmap_count)?;
    check_alignment(row_bytes, record_bytes)?;
    row_bytes
      .checked_mul(bank_rows)
      .and_then(|bytes| bytes.checked_mul(8))
      .ok_or(ConfigError::Overflow { what: "bank size" })?;

    let configurable = bank_rows
      .checked_sub(reserved_rows)
      .filter(|rows| *rows > 0)
      .ok_or(ConfigError::NotEnoughRows {
        reserved: reserved_rows,
        bank_rows,
      })?;

    let mut data_rows = 0;
    let mut hitmap_rows = 0;
    let mut records = 0;
    // Sizes past the bank saturate and simply never fit.
    let block_data_rows = record_bytes.saturating_mul(8);

    while data_rows + hitmap_rows < configurable {
      let with_hitmaps = hitmap_rows.saturating_add(hitmap_count).saturating_add(data_rows);

      if with_hitmaps.saturating_add(block_data_rows) < configurable {
        hitmap_rows += hitmap_count;
        data_rows += block_data_rows;
        records += row_bytes * 8;
        continue;
      }

      if with_hitmaps >= configurable {
        break;
      }

      // A partial block needs room for at least one record.
      if record_bytes >= row_bytes
        && with_hitmaps + record_bytes / row_bytes > configurable
      {
        break;
      }

      hitmap_rows += hitmap_count;
      let remaining = configurable - hitmap_rows - data_rows;
      if record_bytes <= row_bytes {
        records += remaining * (row_bytes / record_bytes);
        data_rows += remaining;
      } else {
        let rows_per_record = record_bytes / row_bytes;
        let placed = remaining / rows_per_record;
        records += placed;
        data_rows += placed * rows_per_record;
      }
      break;
    }

    Ok(Geometry {
      row_bytes,
      bank_rows,
      record_bytes,
      index_bytes,
      hitmap_count,
      record_base_row: reserved_rows,
      rows_for_records: data_rows,
      records_processable: records,
      hitmap_base_row: reserved_rows + data_rows,
      rows_for_hitmaps: hitmap_rows,
    })
  }
}

pub(crate) fn check_dimensions(
  row_bytes: usize,
  bank_rows: usize,
  record_bytes: usize,
  hitmap_count: usize,
) -> Result<(), ConfigError> {
  for (value, what) in [
    (row_bytes, "row size"),
    (bank_rows, "bank row count"),
    (record_bytes, "record size"),
    (hitmap_count, "hitmap count"),
  ] {
    if value == 0 {
      return Err(ConfigError::ZeroSized { what });
    }
  }
  Ok(())
}

pub(crate) fn check_alignment(row_bytes: usize, record_bytes: usize) -> Result<(), ConfigError> {
  let aligned = if record_bytes > row_bytes {
    record_bytes % row_bytes == 0
  } else {
    row_bytes % record_bytes == 0
  };
  if aligned {
    Ok(())
  } else {
    Err(ConfigError::MisalignedRecord {
      record_bytes,
      row_bytes,
    })
  }
}

#[cfg(test)]
mod tests {
  use rstest::rstest;

  use super::*;

  #[test]
  fn test_derive_reference_bank() {
    // 524 rows reserved for code and scratch space gives the reference record and hitmap sizes.
    let geometry = Geometry::derive(1024, 32768, 512, 8, 3, 524).unwrap();
    assert_eq!(geometry.rows_for_records, 32220);
    assert_eq!(geometry.records_processable, 64440);
    assert_eq!(geometry.rows_for_hitmaps, 24);
    assert_eq!(geometry.hitmap_base_row, 524 + 32220);
  }

  #[test]
  fn test_derive_multi_row_records() {
    // 2 rows per record, one block is 16384 data rows which never fits, so only the partial
    // block is placed: 2 hitmap rows, then 99 / 2 = 49 records.
    let geometry = Geometry::derive(1024, 128, 2048, 8, 2, 27).unwrap();
    assert_eq!(geometry.rows_for_hitmaps, 2);
    assert_eq!(geometry.records_processable, 49);
    assert_eq!(geometry.rows_for_records, 98);
    assert_eq!(geometry.hitmap_base_row, 27 + 98);
  }

  #[test]
  fn test_derive_whole_blocks() {
    // Blocks of 8 * 4 = 32 data rows + 1 hitmap row, 64 records each.
    let geometry = Geometry::derive(8, 100, 4, 2, 1, 0).unwrap();
    // Three whole blocks use 99 rows, the last row has no space for records.
    assert_eq!(geometry.rows_for_hitmaps, 3);
    assert_eq!(geometry.rows_for_records, 96);
    assert_eq!(geometry.records_processable, 192);
  }

  #[rstest]
  #[case(1000, 512)]
  #[case(1024, 1000)]
  #[case(1024, 1536)]
  fn test_misaligned_records(#[case] row_bytes: usize, #[case] record_bytes: usize) {
    let err = Geometry::derive(row_bytes, 1024, record_bytes, 8, 1, 0).unwrap_err();
    assert!(matches!(err, ConfigError::MisalignedRecord { .. }));
  }

  #[test]
  fn test_reserved_rows_exhaust_bank() {
    let err = Geometry::derive(1024, 64, 512, 8, 1, 64).unwrap_err();
    assert_eq!(
      err,
      ConfigError::NotEnoughRows {
        reserved: 64,
        bank_rows: 64
      }
    );
  }

  #[test]
  fn test_reference_bank_bytes() {
    assert_eq!(Geometry::REFERENCE.bank_bytes(), 32 * 1024 * 1024);
  }

  #[rstest]
  #[case(1 << 62, 64, 512, 1)]
  #[case(1024, usize::MAX, 512, 1)]
  fn test_derive_bank_overflow(
    #[case] row_bytes: usize,
    #[case] bank_rows: usize,
    #[case] record_bytes: usize,
    #[case] hitmap_count: usize,
  ) {
    let err = Geometry::derive(row_bytes, bank_rows, record_bytes, 8, hitmap_count, 0).unwrap_err();
    assert_eq!(err, ConfigError::Overflow { what: "bank size" });
  }

  #[test]
  fn test_derive_huge_sizes_never_fit() {
    // A block and a hitmap set each larger than the bank place nothing instead of overflowing.
    let geometry = Geometry::derive(8, 64, 1 << 60, 8, usize::MAX, 0).unwrap();
    assert_eq!(geometry.records_processable, 0);
    assert_eq!(geometry.rows_for_records, 0);
    assert_eq!(geometry.rows_for_hitmaps, 0);
  }

  #[test]
  fn test_zero_row_size() {
    let err = Geometry::derive(0, 64, 512, 8, 1, 0).unwrap_err();
    assert_eq!(err, ConfigError::ZeroSized { what: "row size" });
  }
}
