use blimp_core::{Accumulator, Bank, EqualityScan, Geometry, Hitmap, Layout, Predicate, Zone};
use rand::{rngs::SmallRng, SeedableRng};
use rstest::rstest;

use crate::{
  dump::{dump_memory, parse_dump},
  init::create_memory,
  naive_equality,
  records::{place_records, plant_key, DataGenerator, KeyGenerator, RecordGenerator},
  run_compliance,
};

/// Multi-record rows, multi-row records and one record per row.
#[rstest]
#[case(Geometry::derive(256, 2048, 64, 8, 2, 16).unwrap())]
#[case(Geometry::derive(128, 1024, 512, 8, 3, 4).unwrap())]
#[case(Geometry::derive(64, 512, 64, 4, 1, 0).unwrap())]
fn test_scan_matches_naive(#[case] geometry: Geometry) {
  let layout = Layout::new(geometry).unwrap();
  let mut rng = SmallRng::seed_from_u64(42);
  let (mut bank, mut accumulator) = create_memory(&layout, &mut rng);

  // Few distinct keys so that a good share of records match.
  let mut generator = RecordGenerator::for_layout(
    &layout,
    KeyGenerator::zipf(8, 1.1).unwrap(),
    DataGenerator::Uniform,
    SmallRng::seed_from_u64(7),
  )
  .unwrap();
  place_records(&mut bank, &layout, &mut generator, usize::MAX);

  let target = vec![0; geometry.index_bytes];
  let predicate = Predicate::new(0, target, geometry.hitmap_count - 1);
  let expected = naive_equality(bank.store(), &layout, &predicate);

  let actual = eval_scan_get_result(&layout, &mut bank, &mut accumulator, predicate);
  assert_eq!(expected, actual);
  assert!(expected.iter().any(|hit| *hit));
}

#[rstest]
#[case(4, &[1, 3], 0b0101_1111)]
#[case(4, &[], 0b0000_1111)]
#[case(8, &[0, 7], 0b1000_0001)]
#[case(0, &[], 0b1111_1111)]
fn test_first_hitmap_byte(#[case] records: usize, #[case] hits: &[usize], #[case] expected: u8) {
  // 1KiB rows, two 512-byte records per row, records from row 10.
  let layout = Layout::new(Geometry {
    row_bytes: 1024,
    bank_rows: 32,
    record_bytes: 512,
    index_bytes: 8,
    hitmap_count: 1,
    record_base_row: 10,
    rows_for_records: 4,
    records_processable: records,
    hitmap_base_row: 20,
    rows_for_hitmaps: 1,
  })
  .unwrap();
  let mut rng = SmallRng::seed_from_u64(5);
  let (mut bank, mut accumulator) = create_memory(&layout, &mut rng);

  let target = [0xCA, 0xFE, 0xBA, 0xBE, 0, 0, 0, 1];
  for index in 0..records {
    let key = if hits.contains(&index) { target } else { [0xFF; 8] };
    plant_key(&mut bank, &layout, index, 0, &key);
  }

  let mut scan = EqualityScan::new(&layout, Predicate::new(0, target.to_vec(), 0)).unwrap();
  scan.run(&mut bank, &mut accumulator);

  assert_eq!(accumulator.bytes()[0], expected);
  assert_eq!(bank.store().row(20)[0], expected);
  assert!(bank.store().row(20)[1..].iter().all(|byte| *byte == 0xFF));
}

#[test]
fn test_reference_run() {
  let layout = Layout::new(Geometry::REFERENCE).unwrap();
  let mut rng = SmallRng::seed_from_u64(2024);
  let run = run_compliance(&layout, Predicate::reference(), &mut rng).unwrap();

  assert_eq!(run.report.records_scanned, 64440);
  // Two records per row, each record row opened exactly once.
  assert_eq!(run.report.access.activations, 32220);
  // 64440 bits fill 7 full 1KiB rows and part of an eighth.
  assert_eq!(run.report.rows_flushed, 8);
  assert_eq!(run.report.bytes_written, 8 * 1024);

  let hitmap = Hitmap::read(run.bank.store(), &layout, Predicate::REFERENCE_HITMAP);
  let expected = naive_equality(run.bank.store(), &layout, &Predicate::reference());
  let expected: Vec<usize> = (0..expected.len()).filter(|i| expected[*i]).collect();
  assert_eq!(hitmap.matching_records(layout.records_processable()), expected);
  assert_eq!(hitmap.capacity(), layout.hitmap_capacity_bits());
  // Positions past the last record read as set.
  assert!((64440..hitmap.capacity()).all(|index| hitmap.is_set(index)));

  // The other hitmaps keep their initial all-ones content.
  for other in [0, 2] {
    let untouched = Hitmap::read(run.bank.store(), &layout, other);
    assert!(untouched.as_bytes().iter().all(|byte| *byte == 0xFF));
  }
}

#[test]
fn test_dump_round_trip_after_scan() {
  let layout = Layout::new(Geometry::derive(32, 256, 16, 4, 2, 8).unwrap()).unwrap();
  let mut rng = SmallRng::seed_from_u64(9);
  let run = run_compliance(&layout, Predicate::new(0, vec![0; 4], 1), &mut rng).unwrap();

  let mut out = Vec::new();
  dump_memory(run.bank.store(), &mut out).unwrap();
  let parsed = parse_dump(&out[..], layout.row_bytes()).unwrap();
  assert_eq!(&parsed, run.bank.store());

  // The hitmap written by the scan survives the dump.
  assert_eq!(
    Hitmap::read(&parsed, &layout, 1),
    Hitmap::read(run.bank.store(), &layout, 1)
  );
  // Hitmaps run to the last row of the bank, leaving no tail.
  assert!(layout.zone_rows(Zone::Tail).is_empty());
}

fn eval_scan_get_result(
  layout: &Layout,
  bank: &mut Bank,
  accumulator: &mut Accumulator,
  predicate: Predicate,
) -> Vec<bool> {
  let hitmap_index = predicate.target_hitmap();
  let mut scan = EqualityScan::new(layout, predicate).unwrap();
  scan.run(bank, accumulator);
  let hitmap = Hitmap::read(bank.store(), layout, hitmap_index);
  (0..layout.records_processable())
    .map(|index| hitmap.is_set(index))
    .collect()
}
