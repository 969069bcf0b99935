//! Record generation and placement into the record zone.
//!
//! A record is `[index | data]`: a big-endian key of `index_bytes` followed by
//! `record_bytes - index_bytes` bytes of data.
use anyhow::{anyhow, bail, Result};
use blimp_core::{Bank, Layout};
use rand::{rngs::SmallRng, Rng};
use rand_distr::{Distribution, Zipf};

pub enum KeyGenerator {
  /// Every record has the same key.
  Constant(u64),
  /// Keys count up from the given value, wrapping at the key width.
  Incremental(u64),
  Uniform,
  /// Keys in `[0, n)` with Zipf-distributed frequencies, key 0 the most frequent.
  Zipf(Zipf<f64>),
}

impl KeyGenerator {
  pub fn zipf(n: u64, exponent: f64) -> Result<KeyGenerator> {
    let distribution =
      Zipf::new(n, exponent).map_err(|err| anyhow!("invalid zipf parameters: {:?}", err))?;
    Ok(KeyGenerator::Zipf(distribution))
  }

  fn next_key(&mut self, rng: &mut SmallRng) -> u64 {
    match self {
      KeyGenerator::Constant(key) => *key,
      KeyGenerator::Incremental(next) => {
        let key = *next;
        *next = next.wrapping_add(1);
        key
      }
      KeyGenerator::Uniform => rng.gen(),
      KeyGenerator::Zipf(distribution) => {
        let rank: f64 = distribution.sample(rng);
        rank as u64 - 1
      }
    }
  }
}

pub enum DataGenerator {
  Null,
  Constant(u8),
  Uniform,
}

pub struct RecordGenerator {
  keys: KeyGenerator,
  data: DataGenerator,
  index_bytes: usize,
  record_bytes: usize,
  rng: SmallRng,
}

impl RecordGenerator {
  pub fn new(
    keys: KeyGenerator,
    data: DataGenerator,
    index_bytes: usize,
    record_bytes: usize,
    rng: SmallRng,
  ) -> Result<RecordGenerator> {
    if index_bytes > record_bytes {
      bail!(
        "a {}-byte index does not fit a {}-byte record",
        index_bytes,
        record_bytes
      );
    }
    Ok(RecordGenerator {
      keys,
      data,
      index_bytes,
      record_bytes,
      rng,
    })
  }

  /// A generator sized for `layout`.
  pub fn for_layout(
    layout: &Layout,
    keys: KeyGenerator,
    data: DataGenerator,
    rng: SmallRng,
  ) -> Result<RecordGenerator> {
    let geometry = layout.geometry();
    RecordGenerator::new(keys, data, geometry.index_bytes, geometry.record_bytes, rng)
  }

  pub fn next_record(&mut self) -> Vec<u8> {
    let key = self.keys.next_key(&mut self.rng);
    let mut record = encode_key(key, self.index_bytes);
    record.resize(self.record_bytes, 0);
    let data = &mut record[self.index_bytes..];
    match self.data {
      DataGenerator::Null => {}
      DataGenerator::Constant(byte) => data.fill(byte),
      DataGenerator::Uniform => self.rng.fill(data),
    }
    record
  }
}

/// Big-endian `value` in exactly `width` bytes. Wider fields are zero-extended, narrower ones keep
/// the low-order bytes.
pub fn encode_key(value: u64, width: usize) -> Vec<u8> {
  let bytes = value.to_be_bytes();
  if width >= bytes.len() {
    let mut key = vec![0; width - bytes.len()];
    key.extend_from_slice(&bytes);
    key
  } else {
    bytes[bytes.len() - width..].to_vec()
  }
}

/// Write `record` at the address of record `index`. Records wider than a row continue at the
/// start of the following rows.
pub fn write_record(bank: &mut Bank, layout: &Layout, index: usize, record: &[u8]) {
  assert_eq!(
    record.len(),
    layout.geometry().record_bytes,
    "record does not match the layout"
  );
  let address = layout.record_address(index);
  let store = bank.store_mut();
  for (k, chunk) in record.chunks(layout.row_bytes()).enumerate() {
    let row = store.row_mut(address.row + k);
    row[address.byte_offset..address.byte_offset + chunk.len()].copy_from_slice(chunk);
  }
}

/// Place up to `limit` generated records, never more than the layout can scan. Returns the number
/// placed.
pub fn place_records(
  bank: &mut Bank,
  layout: &Layout,
  generator: &mut RecordGenerator,
  limit: usize,
) -> usize {
  let count = limit.min(layout.records_processable());
  for index in 0..count {
    let record = generator.next_record();
    write_record(bank, layout, index, &record);
  }
  count
}

/// Overwrite `key.len()` bytes at `field_offset` within record `index`.
pub fn plant_key(bank: &mut Bank, layout: &Layout, index: usize, field_offset: usize, key: &[u8]) {
  let address = layout.record_address(index);
  let start = address.byte_offset + field_offset;
  bank.store_mut().row_mut(address.row)[start..start + key.len()].copy_from_slice(key);
}
