//! Text dumps of a whole bank.
//!
//! One line per row: the byte address of the row as eight hex digits, a colon and two spaces,
//! then every byte of the row as two lowercase hex digits followed by a space.
//!
//! ```text
//! 00000400:  00 00 ff 3a ...
//! ```
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{bail, Context, Result};
use blimp_core::RowStore;

const ADDRESS_SEPARATOR: &str = ":  ";

pub fn dump_memory<W: Write>(store: &RowStore, mut writer: W) -> Result<()> {
  for (row, bytes) in store.rows().enumerate() {
    write!(writer, "{:08x}{}", row * store.row_bytes(), ADDRESS_SEPARATOR)?;
    for byte in bytes {
      write!(writer, "{:02x} ", byte)?;
    }
    writeln!(writer)?;
  }
  Ok(())
}

pub fn dump_to_file(store: &RowStore, path: impl AsRef<Path>) -> Result<()> {
  let path = path.as_ref();
  let file = File::create(path)
    .with_context(|| format!("failed to create dump file {}", path.display()))?;
  let mut writer = BufWriter::new(file);
  dump_memory(store, &mut writer)?;
  writer.flush()?;
  Ok(())
}

/// Rebuild a store from a dump of `row_bytes`-wide rows. Blank lines are ignored.
pub fn parse_dump<R: BufRead>(reader: R, row_bytes: usize) -> Result<RowStore> {
  if row_bytes == 0 {
    bail!("row size must be non-zero");
  }

  let mut data = Vec::new();
  let mut row = 0;
  for (line_number, line) in reader.lines().enumerate() {
    let line = line?;
    if line.trim().is_empty() {
      continue;
    }

    let (address, bytes) = line
      .split_once(ADDRESS_SEPARATOR)
      .with_context(|| format!("line {}: missing address label", line_number + 1))?;
    let address = usize::from_str_radix(address.trim(), 16)
      .with_context(|| format!("line {}: bad address {:?}", line_number + 1, address))?;
    if address != row * row_bytes {
      bail!(
        "line {}: address {:#x} does not match row {}",
        line_number + 1,
        address,
        row
      );
    }

    let start = data.len();
    for token in bytes.split_whitespace() {
      if token.len() != 2 {
        bail!("line {}: {:?} is not a hex byte", line_number + 1, token);
      }
      let byte = u8::from_str_radix(token, 16)
        .with_context(|| format!("line {}: {:?} is not a hex byte", line_number + 1, token))?;
      data.push(byte);
    }
    let parsed = data.len() - start;
    if parsed != row_bytes {
      bail!(
        "line {}: expected {} bytes, found {}",
        line_number + 1,
        row_bytes,
        parsed
      );
    }
    row += 1;
  }

  if data.is_empty() {
    bail!("dump contains no rows");
  }
  Ok(RowStore::from_bytes(row_bytes, data))
}

pub fn load_dump(path: impl AsRef<Path>, row_bytes: usize) -> Result<RowStore> {
  let path = path.as_ref();
  let file =
    File::open(path).with_context(|| format!("failed to open dump file {}", path.display()))?;
  parse_dump(BufReader::new(file), row_bytes)
}
