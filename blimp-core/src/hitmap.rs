use crate::bank::RowStore;
use crate::layout::Layout;

/// A hitmap read back out of the hitmap zone, one bit per record, MSB first within each byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hitmap {
  bytes: Vec<u8>,
}

impl Hitmap {
  /// Concatenate every row of hitmap `hitmap_index`.
  pub fn read(store: &RowStore, layout: &Layout, hitmap_index: usize) -> Hitmap {
    assert!(
      hitmap_index < layout.geometry().hitmap_count,
      "hitmap {} does not exist",
      hitmap_index
    );
    let base = layout.hitmap_base(hitmap_index);
    let bytes = (base..base + layout.rows_per_hitmap())
      .flat_map(|row| store.row(row).iter().copied())
      .collect();
    Hitmap { bytes }
  }

  pub fn from_bytes(bytes: Vec<u8>) -> Hitmap {
    Hitmap { bytes }
  }

  pub fn as_bytes(&self) -> &[u8] {
    &self.bytes
  }

  pub fn capacity(&self) -> usize {
    self.bytes.len() * 8
  }

  pub fn is_set(&self, index: usize) -> bool {
    let byte = self.bytes[index / 8];
    byte & (0x80 >> (index % 8)) != 0
  }

  /// Indices of the set bits below `limit`.
  pub fn matching_records(&self, limit: usize) -> Vec<usize> {
    (0..limit.min(self.capacity()))
      .filter(|index| self.is_set(*index))
      .collect()
  }

  pub fn count_set(&self, limit: usize) -> usize {
    let limit = limit.min(self.capacity());
    let whole = limit / 8;
    let full: u32 = self.bytes[..whole].iter().map(|byte| byte.count_ones()).sum();
    let rest = (whole * 8..limit).filter(|index| self.is_set(*index)).count();
    full as usize + rest
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::Geometry;

  #[test]
  fn test_bit_order() {
    let hitmap = Hitmap::from_bytes(vec![0b1001_0100, 0b0000_0001]);
    assert_eq!(hitmap.matching_records(16), vec![0, 3, 5, 15]);
    assert_eq!(hitmap.matching_records(6), vec![0, 3, 5]);
    assert_eq!(hitmap.count_set(16), 4);
    assert_eq!(hitmap.count_set(4), 2);
    assert_eq!(hitmap.count_set(100), 4);
  }

  #[test]
  fn test_read_concatenates_rows() {
    let layout = Layout::new(Geometry {
      row_bytes: 4,
      bank_rows: 16,
      record_bytes: 4,
      index_bytes: 2,
      hitmap_count: 2,
      record_base_row: 0,
      rows_for_records: 8,
      records_processable: 8,
      hitmap_base_row: 10,
      rows_for_hitmaps: 4,
    })
    .unwrap();
    let mut store = RowStore::new(16, 4);
    store.store(12, &[1, 2, 3, 4]);
    store.store(13, &[5, 6, 7, 8]);
    let hitmap = Hitmap::read(&store, &layout, 1);
    assert_eq!(hitmap.as_bytes(), &[1, 2, 3, 4, 5, 6, 7, 8]);
    assert_eq!(hitmap.capacity(), 64);
  }
}
