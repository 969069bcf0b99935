use blimp_core::{Accumulator, Bank, Layout, Zone};
use rand::Rng;
use tracing::debug;

/// The zero sentinel sits this many rows before the hitmap zone.
pub const SENTINEL_ROWS_BEFORE_HITMAPS: usize = 10;
pub const SENTINEL_BYTES: usize = 8;

/// Allocate a bank for `layout` and bring it to its starting state.
pub fn create_memory<R: Rng>(layout: &Layout, rng: &mut R) -> (Bank, Accumulator) {
  debug!(bytes = layout.geometry().bank_bytes(), "allocating bank");
  let mut bank = Bank::new(layout.bank_rows(), layout.row_bytes());
  let mut accumulator = Accumulator::new(layout.row_bytes());
  initialize_memory(&mut bank, &mut accumulator, layout, rng);
  (bank, accumulator)
}

/// Fill every zone of `bank`:
/// - utility and tail rows are zeroed
/// - record rows get random bytes
/// - hitmap rows are all ones
///
/// A zero sentinel is planted for whoever reads the dump, the accumulator is cleared and row 0
/// is opened.
pub fn initialize_memory<R: Rng>(
  bank: &mut Bank,
  accumulator: &mut Accumulator,
  layout: &Layout,
  rng: &mut R,
) {
  let store = bank.store_mut();
  for zone in Zone::ALL {
    let rows = layout.zone_rows(zone);
    debug!(?zone, start = rows.start, end = rows.end, "filling zone");
    for row in rows {
      let bytes = store.row_mut(row);
      match zone {
        Zone::Utility | Zone::Tail => bytes.fill(0),
        Zone::Records => rng.fill(bytes),
        Zone::Hitmaps => bytes.fill(0xFF),
      }
    }
  }

  if let Some(row) = sentinel_row(layout) {
    let width = SENTINEL_BYTES.min(layout.row_bytes());
    store.row_mut(row)[..width].fill(0);
  }

  accumulator.reset();
  bank.load(0);
}

/// Row holding the sentinel, if the bank has one.
pub fn sentinel_row(layout: &Layout) -> Option<usize> {
  layout
    .geometry()
    .hitmap_base_row
    .checked_sub(SENTINEL_ROWS_BEFORE_HITMAPS)
}
