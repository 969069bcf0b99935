//! The simulated DRAM bank: a flat row store and the single row buffer in front of it.
use tracing::trace;

/// All bytes of a bank, addressed in rows of `row_bytes`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowStore {
  row_bytes: usize,
  bank_rows: usize,
  data: Vec<u8>,
}

impl RowStore {
  /// A zero-filled store.
  pub fn new(bank_rows: usize, row_bytes: usize) -> RowStore {
    RowStore {
      row_bytes,
      bank_rows,
      data: vec![0; bank_rows * row_bytes],
    }
  }

  /// Wrap raw bank bytes. `data.len()` must be a multiple of `row_bytes`.
  pub fn from_bytes(row_bytes: usize, data: Vec<u8>) -> RowStore {
    assert!(
      row_bytes > 0 && data.len() % row_bytes == 0,
      "{} bytes cannot be split into {}-byte rows",
      data.len(),
      row_bytes
    );
    RowStore {
      row_bytes,
      bank_rows: data.len() / row_bytes,
      data,
    }
  }

  pub fn row_bytes(&self) -> usize {
    self.row_bytes
  }

  pub fn bank_rows(&self) -> usize {
    self.bank_rows
  }

  pub fn as_bytes(&self) -> &[u8] {
    &self.data
  }

  pub fn row(&self, row: usize) -> &[u8] {
    let range = self.row_range(row);
    &self.data[range]
  }

  pub fn row_mut(&mut self, row: usize) -> &mut [u8] {
    let range = self.row_range(row);
    &mut self.data[range]
  }

  pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
    self.data.chunks_exact(self.row_bytes)
  }

  /// Overwrite a whole row.
  pub fn store(&mut self, row: usize, bytes: &[u8]) {
    assert_eq!(
      bytes.len(),
      self.row_bytes,
      "a stored row must be exactly {} bytes",
      self.row_bytes
    );
    self.row_mut(row).copy_from_slice(bytes);
  }

  fn row_range(&self, row: usize) -> std::ops::Range<usize> {
    assert!(
      row < self.bank_rows,
      "row {} is outside a {}-row bank",
      row,
      self.bank_rows
    );
    let start = row * self.row_bytes;
    start..start + self.row_bytes
  }
}

/// The sense-amplifier row buffer. At most one row is open at a time.
#[derive(Debug, Clone)]
pub struct RowBuffer {
  bytes: Vec<u8>,
  current_row: Option<usize>,
}

impl RowBuffer {
  pub fn new(row_bytes: usize) -> RowBuffer {
    RowBuffer {
      bytes: vec![0; row_bytes],
      current_row: None,
    }
  }

  pub fn current_row(&self) -> Option<usize> {
    self.current_row
  }

  pub fn bytes(&self) -> &[u8] {
    &self.bytes
  }

  /// `len` bytes of the open row starting at `offset`.
  pub fn read(&self, offset: usize, len: usize) -> &[u8] {
    &self.bytes[offset..offset + len]
  }

  /// Open `row`, copying it out of `store`. Returns `false` without touching the buffer when the
  /// row is already open.
  pub fn load(&mut self, store: &RowStore, row: usize) -> bool {
    if self.current_row == Some(row) {
      return false;
    }
    self.bytes.copy_from_slice(store.row(row));
    self.current_row = Some(row);
    true
  }
}

/// Row traffic observed by a [`Bank`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccessStats {
  /// Loads that opened a new row.
  pub activations: u64,
  /// Loads of the row that was already open.
  pub buffer_hits: u64,
  /// Full-row writes into the store.
  pub stores: u64,
}

impl std::ops::Sub for AccessStats {
  type Output = AccessStats;

  fn sub(self, rhs: AccessStats) -> AccessStats {
    AccessStats {
      activations: self.activations - rhs.activations,
      buffer_hits: self.buffer_hits - rhs.buffer_hits,
      stores: self.stores - rhs.stores,
    }
  }
}

/// A [`RowStore`] that is only read through its [`RowBuffer`].
#[derive(Debug, Clone)]
pub struct Bank {
  store: RowStore,
  buffer: RowBuffer,
  stats: AccessStats,
}

impl Bank {
  pub fn new(bank_rows: usize, row_bytes: usize) -> Bank {
    Bank::from_store(RowStore::new(bank_rows, row_bytes))
  }

  pub fn from_store(store: RowStore) -> Bank {
    let buffer = RowBuffer::new(store.row_bytes());
    Bank {
      store,
      buffer,
      stats: AccessStats::default(),
    }
  }

  pub fn store(&self) -> &RowStore {
    &self.store
  }

  /// Direct access to the store for placing data outside of a scan.
  ///
  /// Writing to the open row through this handle would desynchronise the row buffer, so the
  /// buffer is closed first.
  pub fn store_mut(&mut self) -> &mut RowStore {
    self.buffer.current_row = None;
    &mut self.store
  }

  pub fn row_buffer(&self) -> &RowBuffer {
    &self.buffer
  }

  pub fn stats(&self) -> AccessStats {
    self.stats
  }

  /// Open `row` in the row buffer. Reopening the current row is free.
  pub fn load(&mut self, row: usize) -> bool {
    let activated = self.buffer.load(&self.store, row);
    if activated {
      trace!(row, "row activation");
      self.stats.activations += 1;
    } else {
      self.stats.buffer_hits += 1;
    }
    activated
  }

  /// Write a full row from an external buffer. The open row does not change.
  pub fn write_row(&mut self, row: usize, bytes: &[u8]) {
    self.store.store(row, bytes);
    self.stats.stores += 1;
    // Keep the open row identical to its backing row.
    if self.buffer.current_row == Some(row) {
      self.buffer.bytes.copy_from_slice(bytes);
    }
  }
}
