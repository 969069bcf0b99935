//! Address arithmetic over a validated bank geometry.
//!
//! The bank row space is split into four consecutive zones:
//!
//! ```text
//! row 0
//! + - - - - - - - - - - - - - - - - - - - - - - - +
//! -                    UTILITY                    -
//! + - - - - - - - - - - - - - - - - - - - - - - - + record_base_row
//! - [     record     ][     record     ]          -
//! -                      ...                      -
//! + - - - - - - - - - - - - - - - - - - - - - - - + hitmap_base_row
//! -     HITMAP 0    |    HITMAP 1    |    ...     -
//! + - - - - - - - - - - - - - - - - - - - - - - - + hitmap_base_row + rows_for_hitmaps
//! -                      TAIL                     -
//! + - - - - - - - - - - - - - - - - - - - - - - - + bank_rows
//! ```
use std::ops::Range;

use crate::config::{check_alignment, check_dimensions, Geometry};
use crate::error::ConfigError;
use crate::scan::Predicate;

/// How records are packed into rows. Exactly one mode applies to a geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Packing {
  /// `record_bytes <= row_bytes`: several records side by side in one row.
  RecordsPerRow(usize),
  /// `record_bytes > row_bytes`: one record spread over consecutive rows.
  RowsPerRecord(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Zone {
  Utility,
  Records,
  Hitmaps,
  Tail,
}

impl Zone {
  pub const ALL: [Zone; 4] = [Zone::Utility, Zone::Records, Zone::Hitmaps, Zone::Tail];
}

/// Where a record starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordAddress {
  pub row: usize,
  pub byte_offset: usize,
}

/// Where the `byte_index`-th completed hitmap byte lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitmapAddress {
  pub row: usize,
  pub byte_offset: usize,
}

/// A validated [`Geometry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
  geometry: Geometry,
  packing: Packing,
  rows_per_hitmap: usize,
}

impl Layout {
  /// Validate every geometry invariant once, up front.
  pub fn new(geometry: Geometry) -> Result<Layout, ConfigError> {
    let g = geometry;
    check_dimensions(g.row_bytes, g.bank_rows, g.record_bytes, g.hitmap_count)?;
    check_alignment(g.row_bytes, g.record_bytes)?;

    if g.index_bytes > g.record_bytes {
      return Err(ConfigError::IndexTooWide {
        index_bytes: g.index_bytes,
        record_bytes: g.record_bytes,
      });
    }

    // Every address computed later stays below the bank size in bits.
    g.row_bytes
      .checked_mul(g.bank_rows)
      .and_then(|bytes| bytes.checked_mul(8))
      .ok_or(ConfigError::Overflow { what: "bank size" })?;

    let record_end = g
      .record_base_row
      .checked_add(g.rows_for_records)
      .ok_or(ConfigError::Overflow { what: "record zone end" })?;
    if record_end > g.hitmap_base_row {
      return Err(ConfigError::ZoneOverlap {
        record_end,
        hitmap_base_row: g.hitmap_base_row,
      });
    }

    let hitmap_end = g
      .hitmap_base_row
      .checked_add(g.rows_for_hitmaps)
      .ok_or(ConfigError::Overflow { what: "hitmap zone end" })?;
    if hitmap_end > g.bank_rows {
      return Err(ConfigError::ZoneOutOfBank {
        hitmap_end,
        bank_rows: g.bank_rows,
      });
    }

    let packing = if g.record_bytes <= g.row_bytes {
      Packing::RecordsPerRow(g.row_bytes / g.record_bytes)
    } else {
      Packing::RowsPerRecord(g.record_bytes / g.row_bytes)
    };

    let record_rows_needed = match packing {
      Packing::RecordsPerRow(n) => g.records_processable.div_ceil(n),
      Packing::RowsPerRecord(n) => g
        .records_processable
        .checked_mul(n)
        .ok_or(ConfigError::Overflow {
          what: "record zone size",
        })?,
    };
    if record_rows_needed > g.rows_for_records {
      return Err(ConfigError::RecordZoneTooSmall {
        records: g.records_processable,
        needed: record_rows_needed,
        available: g.rows_for_records,
      });
    }

    if g.rows_for_hitmaps % g.hitmap_count != 0 {
      return Err(ConfigError::UnevenHitmapSplit {
        rows_for_hitmaps: g.rows_for_hitmaps,
        hitmap_count: g.hitmap_count,
      });
    }
    let rows_per_hitmap = g.rows_for_hitmaps / g.hitmap_count;

    // Draining always completes at least one full hitmap row, even for an empty scan.
    let hitmap_rows_needed = g
      .records_processable
      .div_ceil(8)
      .div_ceil(g.row_bytes)
      .max(1);
    if hitmap_rows_needed > rows_per_hitmap {
      return Err(ConfigError::HitmapTooSmall {
        records: g.records_processable,
        needed: hitmap_rows_needed,
        available: rows_per_hitmap,
      });
    }

    Ok(Layout {
      geometry,
      packing,
      rows_per_hitmap,
    })
  }

  pub fn geometry(&self) -> &Geometry {
    &self.geometry
  }

  pub fn packing(&self) -> Packing {
    self.packing
  }

  pub fn row_bytes(&self) -> usize {
    self.geometry.row_bytes
  }

  pub fn bank_rows(&self) -> usize {
    self.geometry.bank_rows
  }

  pub fn records_processable(&self) -> usize {
    self.geometry.records_processable
  }

  pub fn rows_per_hitmap(&self) -> usize {
    self.rows_per_hitmap
  }

  /// Number of bits one hitmap can hold.
  pub fn hitmap_capacity_bits(&self) -> usize {
    self.rows_per_hitmap * self.geometry.row_bytes * 8
  }

  /// Row and byte offset where record `index` begins.
  pub fn record_address(&self, index: usize) -> RecordAddress {
    let g = &self.geometry;
    match self.packing {
      Packing::RecordsPerRow(per_row) => RecordAddress {
        row: g.record_base_row + index / per_row,
        byte_offset: (index % per_row) * g.record_bytes,
      },
      Packing::RowsPerRecord(per_record) => RecordAddress {
        row: g.record_base_row + index * per_record,
        byte_offset: 0,
      },
    }
  }

  /// First row of hitmap `hitmap_index`.
  pub fn hitmap_base(&self, hitmap_index: usize) -> usize {
    self.geometry.hitmap_base_row + self.rows_per_hitmap * hitmap_index
  }

  /// Row receiving the `flush`-th full accumulator row of hitmap `hitmap_index`.
  pub fn hitmap_row(&self, hitmap_index: usize, flush: usize) -> usize {
    self.hitmap_base(hitmap_index) + flush
  }

  /// Where the `byte_index`-th completed byte of hitmap `hitmap_index` is stored.
  pub fn hitmap_address(&self, hitmap_index: usize, byte_index: usize) -> HitmapAddress {
    let row_bytes = self.geometry.row_bytes;
    HitmapAddress {
      row: self.hitmap_row(hitmap_index, byte_index / row_bytes),
      byte_offset: byte_index % row_bytes,
    }
  }

  /// The rows belonging to `zone`. The four zones tile `[0, bank_rows)`.
  pub fn zone_rows(&self, zone: Zone) -> Range<usize> {
    let g = &self.geometry;
    let hitmap_end = g.hitmap_base_row + g.rows_for_hitmaps;
    match zone {
      Zone::Utility => 0..g.record_base_row,
      Zone::Records => g.record_base_row..g.hitmap_base_row,
      Zone::Hitmaps => g.hitmap_base_row..hitmap_end,
      Zone::Tail => hitmap_end..g.bank_rows,
    }
  }

  pub fn zone_of(&self, row: usize) -> Zone {
    assert!(
      row < self.geometry.bank_rows,
      "row {} is outside a {}-row bank",
      row,
      self.geometry.bank_rows
    );
    Zone::ALL
      .into_iter()
      .find(|zone| self.zone_rows(*zone).contains(&row))
      .unwrap_or(Zone::Tail)
  }

  /// Check that a predicate can be evaluated against this layout.
  ///
  /// The compared field has to sit within a record and, since only the record's first row is
  /// opened, within a single row.
  pub fn check_predicate(&self, predicate: &Predicate) -> Result<(), ConfigError> {
    let g = &self.geometry;
    if predicate.field_width() == 0 {
      return Err(ConfigError::EmptyTarget);
    }
    let field_end = predicate.field_offset() + predicate.field_width();
    if field_end > g.record_bytes {
      return Err(ConfigError::FieldOutOfRange {
        field_offset: predicate.field_offset(),
        field_end,
        limit: g.record_bytes,
        scope: "record",
      });
    }
    if field_end > g.row_bytes {
      return Err(ConfigError::FieldOutOfRange {
        field_offset: predicate.field_offset(),
        field_end,
        limit: g.row_bytes,
        scope: "row",
      });
    }
    if predicate.target_hitmap() >= g.hitmap_count {
      return Err(ConfigError::HitmapIndexOutOfRange {
        index: predicate.target_hitmap(),
        hitmap_count: g.hitmap_count,
      });
    }
    Ok(())
  }
}
