//! Tests for the traversal iterator
//!
//! These tests verify:
//! - Full iteration yields every entry once, in ascending key order
//! - Monotonic seek lands on the requested key or its successor
//! - Prefix enumeration with grouping, limits and resume keys
//! - Codec equivalence: Snappy and uncompressed files iterate identically

use hfile::testutil::{key_int, value_int, write_fixture, write_multi_fixture};
use hfile::{Compression, HfileError, Reader};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn fixture_reader(count: u32, compression: Compression) -> (TempDir, Reader) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("pairs.hfile");
    write_fixture(&path, count, 4096, compression).unwrap();
    let reader = Reader::open_path("sample", &path).unwrap();
    (dir, reader)
}

// =============================================================================
// next
// =============================================================================

#[test]
fn test_fresh_iterator_starts_at_first_entry() {
    let (_dir, reader) = fixture_reader(100_000, Compression::Snappy);
    let mut it = reader.iter();

    assert!(it.next().unwrap());
    assert_eq!(it.key().unwrap(), key_int(1));
    assert_eq!(it.value().unwrap(), value_int(1));

    assert!(it.next().unwrap());
    assert_eq!(it.key().unwrap(), key_int(2));
    assert_eq!(it.value().unwrap(), value_int(2));
}

#[test]
fn test_full_iteration_yields_every_entry_in_order() {
    let count = 10_000;
    let (_dir, reader) = fixture_reader(count, Compression::Snappy);
    let mut it = reader.iter();

    let mut seen = 0u32;
    let mut last: Option<Vec<u8>> = None;
    while it.next().unwrap() {
        let key = it.key().unwrap();
        if let Some(prev) = &last {
            assert!(*prev < key, "keys must ascend: {:02x?} then {:02x?}", prev, key);
        }
        seen += 1;
        assert_eq!(key, key_int(seen));
        assert_eq!(it.value().unwrap(), value_int(seen));
        last = Some(key);
    }

    assert_eq!(seen, reader.entry_count());
    // Exhausted iterators stay exhausted.
    assert!(!it.next().unwrap());
    assert_eq!(it.key(), None);
}

#[test]
fn test_key_copies_survive_advancing() {
    let (_dir, reader) = fixture_reader(50_000, Compression::Snappy);
    let mut it = reader.iter();

    assert!(it.next().unwrap());
    let first_key = it.key().unwrap();
    let first_value = it.value().unwrap();

    // Drive the cursor through several block reloads.
    while it.next().unwrap() {}

    assert_eq!(first_key, key_int(1));
    assert_eq!(first_value, value_int(1));
}

// =============================================================================
// seek
// =============================================================================

#[test]
fn test_seek_lands_on_present_keys() {
    let (_dir, reader) = fixture_reader(100_000, Compression::Snappy);
    let mut it = reader.iter();

    assert!(it.next().unwrap());
    assert_eq!(it.key().unwrap(), key_int(1));
    assert!(it.next().unwrap());
    assert_eq!(it.key().unwrap(), key_int(2));

    assert!(it.seek(&key_int(65_537)).unwrap());
    assert_eq!(it.key().unwrap(), key_int(65_537));
    assert_eq!(it.value().unwrap(), value_int(65_537));

    assert!(it.seek(&key_int(75_537)).unwrap());
    assert_eq!(it.key().unwrap(), key_int(75_537));
    assert_eq!(it.value().unwrap(), value_int(75_537));
}

#[test]
fn test_seek_reference_probes() {
    let (_dir, reader) = fixture_reader(100_000, Compression::Snappy);
    let mut it = reader.iter();

    assert!(it.seek(&[0, 0, 0xf0, 0xf8]).unwrap());
    assert_eq!(it.key().unwrap(), vec![0, 0, 0xf0, 0xf8]);
    assert_eq!(it.value().unwrap(), b"~61688".to_vec());

    assert!(it.seek(&[0, 1, 0, 1]).unwrap());
    assert_eq!(it.key().unwrap(), vec![0, 1, 0, 1]);
    assert_eq!(it.value().unwrap(), b"~65537".to_vec());
}

#[test]
fn test_seek_missing_key_lands_on_successor() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("gaps.hfile");
    let mut writer = hfile::Writer::create(&path, Compression::None, 4096).unwrap();
    for i in [10u32, 20, 30] {
        writer.write(&key_int(i), &value_int(i)).unwrap();
    }
    writer.finish().unwrap();
    let reader = Reader::open_path("gaps", &path).unwrap();
    let mut it = reader.iter();

    // Before the first key: lands on the first key.
    assert!(it.seek(&key_int(1)).unwrap());
    assert_eq!(it.key().unwrap(), key_int(10));

    // In a gap: lands on the successor.
    assert!(it.seek(&key_int(15)).unwrap());
    assert_eq!(it.key().unwrap(), key_int(20));

    // Past the last key: nothing to land on.
    assert!(!it.seek(&key_int(31)).unwrap());
    assert_eq!(it.key(), None);
}

#[test]
fn test_seek_at_or_behind_current_does_not_move() {
    let (_dir, reader) = fixture_reader(10_000, Compression::None);
    let mut it = reader.iter();

    assert!(it.seek(&key_int(100)).unwrap());
    assert_eq!(it.key().unwrap(), key_int(100));

    // Equal seek: stays put.
    assert!(it.seek(&key_int(100)).unwrap());
    assert_eq!(it.key().unwrap(), key_int(100));
}

#[test]
fn test_out_of_order_seek_is_rejected() {
    let (_dir, reader) = fixture_reader(10_000, Compression::None);
    let mut it = reader.iter();

    assert!(it.seek(&key_int(5000)).unwrap());
    match it.seek(&key_int(400)) {
        Err(HfileError::OutOfOrderKey { last, requested }) => {
            assert_eq!(last, key_int(5000));
            assert_eq!(requested, key_int(400));
        }
        other => panic!("expected OutOfOrderKey, got {:?}", other),
    }

    // State survived the rejected seek.
    assert_eq!(it.key().unwrap(), key_int(5000));
    assert!(it.seek(&key_int(5001)).unwrap());
    assert_eq!(it.key().unwrap(), key_int(5001));
}

// =============================================================================
// all_for_prefixes
// =============================================================================

#[test]
fn test_single_prefix_enumeration() {
    let (_dir, reader) = fixture_reader(100_000, Compression::Snappy);
    let mut it = reader.iter();

    // Prefix 00 00 01 covers exactly keys 0x000100..=0x0001ff (256..511).
    let res = it
        .all_for_prefixes(&[vec![0, 0, 1]], None, None)
        .unwrap();

    assert_eq!(res.len(), 256, "wrong number of matched keys");

    let values = res.get(&key_int(511)).expect("key 511 present");
    assert_eq!(values, &vec![value_int(511)]);

    let values = res.get(&key_int(256)).expect("key 256 present");
    assert_eq!(values, &vec![value_int(256)]);

    let values = res.get(&key_int(286)).expect("key 286 present");
    assert_eq!(values[0], value_int(286));

    // Neighbours on either side of the prefix range are absent.
    assert!(!res.contains_key(&vec![0u8, 0, 0, 0xff]));
    assert!(!res.contains_key(&vec![0u8, 0, 2, 0]));
}

#[test]
fn test_multiple_disjoint_prefixes() {
    let (_dir, reader) = fixture_reader(100_000, Compression::Snappy);
    let mut it = reader.iter();

    let res = it
        .all_for_prefixes(&[vec![0, 0, 1], vec![0, 0, 3]], None, None)
        .unwrap();

    // 256 keys under each prefix, no key under both.
    assert_eq!(res.len(), 512);
    assert!(res.contains_key(&key_int(256)));
    assert!(res.contains_key(&key_int(0x0300)));
    assert!(!res.contains_key(&key_int(0x0200)));
}

#[test]
fn test_prefix_enumeration_groups_multi_values() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("multi.hfile");
    write_multi_fixture(&path, 100_000, 4096, Compression::Snappy).unwrap();
    let reader = Reader::open_path("multi", &path).unwrap();
    let mut it = reader.iter();

    // Keys 0x000001 and 0x0003e9 (= 1001) carry three values each; both
    // fall under prefix 00 00.
    let res = it
        .all_for_prefixes(&[vec![0, 0, 0, 1]], None, None)
        .unwrap();
    assert_eq!(res.len(), 1);
    assert_eq!(res.get(&key_int(1)).unwrap().len(), 3);
}

#[test]
fn test_prefix_enumeration_honors_limit() {
    let (_dir, reader) = fixture_reader(100_000, Compression::Snappy);
    let mut it = reader.iter();

    let res = it
        .all_for_prefixes(&[vec![0, 0, 1]], Some(10), None)
        .unwrap();

    let total: usize = res.values().map(Vec::len).sum();
    assert!(total <= 10, "limit exceeded: {}", total);
    // The keys collected are the earliest under the prefix.
    assert!(res.contains_key(&key_int(256)));
    assert!(!res.contains_key(&key_int(511)));
}

#[test]
fn test_prefix_enumeration_resumes_mid_prefix() {
    let (_dir, reader) = fixture_reader(100_000, Compression::Snappy);
    let mut it = reader.iter();

    // Resume from key 300: only keys 300..=511 of the prefix remain.
    let res = it
        .all_for_prefixes(&[vec![0, 0, 1]], None, Some(&key_int(300)))
        .unwrap();

    assert_eq!(res.len(), 212);
    assert!(res.contains_key(&key_int(300)));
    assert!(res.contains_key(&key_int(511)));
    assert!(!res.contains_key(&key_int(299)));
}

// =============================================================================
// Codec Equivalence
// =============================================================================

#[test]
fn test_snappy_and_plain_files_iterate_identically() {
    let dir = TempDir::new().unwrap();
    let plain_path = dir.path().join("plain.hfile");
    let snappy_path = dir.path().join("snappy.hfile");
    write_fixture(&plain_path, 20_000, 4096, Compression::None).unwrap();
    write_fixture(&snappy_path, 20_000, 4096, Compression::Snappy).unwrap();

    let plain = Reader::open_path("plain", &plain_path).unwrap();
    let snappy = Reader::open_path("snappy", &snappy_path).unwrap();

    let mut a = plain.iter();
    let mut b = snappy.iter();
    loop {
        let more_a = a.next().unwrap();
        let more_b = b.next().unwrap();
        assert_eq!(more_a, more_b, "iterators exhausted at different points");
        if !more_a {
            break;
        }
        assert_eq!(a.key(), b.key());
        assert_eq!(a.value(), b.value());
    }
}

// =============================================================================
// Reuse
// =============================================================================

#[test]
fn test_reset_restarts_traversal() {
    let (_dir, reader) = fixture_reader(10_000, Compression::Snappy);
    let mut it = reader.iter();

    assert!(it.seek(&key_int(9000)).unwrap());
    it.reset();

    assert!(it.next().unwrap());
    assert_eq!(it.key().unwrap(), key_int(1));
}

#[test]
fn test_release_recycles_into_pool() {
    let (_dir, reader) = fixture_reader(10_000, Compression::Snappy);

    let mut it = reader.iter();
    assert!(it.next().unwrap());
    it.release();

    let mut it = reader.iter();
    assert!(it.seek(&key_int(777)).unwrap());
    assert_eq!(it.value().unwrap(), value_int(777));
    it.release();
}
