//! End-to-end tests for n-gram counting and threshold-then-merge aggregation.

use pretty_assertions::assert_eq;
use reven::{Engine, EngineConfig, Error, NgramConfig, Sample, aggregate_ngrams, count_ngrams};

// ============================================================================
// 1. Counting
// ============================================================================

#[test]
fn test_count_overlapping() {
    let counts = count_ngrams(b"aaaa", 2).unwrap();
    assert_eq!(counts.len(), 1);
    assert_eq!(counts.get(b"aa".as_slice()), Some(&3));
}

#[test]
fn test_count_mixed() {
    let counts = count_ngrams(b"abcab", 2).unwrap();
    assert_eq!(counts.get(b"ab".as_slice()), Some(&2));
    assert_eq!(counts.get(b"bc".as_slice()), Some(&1));
    assert_eq!(counts.get(b"ca".as_slice()), Some(&1));
    assert_eq!(counts.values().sum::<usize>(), 4);
}

#[test]
fn test_count_short_data_and_zero_n() {
    assert!(count_ngrams(b"abc", 4).unwrap().is_empty());
    assert!(count_ngrams(b"abcd", 4).unwrap().len() == 1);
    assert!(matches!(count_ngrams(b"abc", 0), Err(Error::InvalidArgument(_))));
}

// ============================================================================
// 2. Aggregation
// ============================================================================

#[test]
fn test_threshold_is_exclusive() {
    let five = count_ngrams(&[0u8; 6], 2).unwrap(); // "\0\0" x5
    let six = count_ngrams(&[0u8; 7], 2).unwrap(); // "\0\0" x6

    let table = aggregate_ngrams([("five", five), ("six", six)], 5);
    let record = &table[[0u8, 0].as_slice()];
    assert_eq!(record.total_count, 6);
    assert_eq!(record.sources.len(), 1);
    assert_eq!(record.sources[0].source, "six");
}

#[test]
fn test_merge_sums_sources_in_order() {
    let a = count_ngrams(&[0xAB; 10], 1).unwrap();
    let b = count_ngrams(&[0xAB; 7], 1).unwrap();
    let c = count_ngrams(&[0xCD; 3], 1).unwrap();

    let table = aggregate_ngrams(vec![("a.bin", a), ("b.bin", b), ("c.bin", c)], 2);
    assert_eq!(table.len(), 2);
    let ab = &table[[0xABu8].as_slice()];
    assert_eq!(ab.total_count, 17);
    let names: Vec<&str> = ab.sources.iter().map(|s| s.source.as_str()).collect();
    assert_eq!(names, vec!["a.bin", "b.bin"]);
    assert_eq!(table[[0xCDu8].as_slice()].total_count, 3);
}

#[test]
fn test_zero_threshold_keeps_everything() {
    let counts = count_ngrams(b"abc", 1).unwrap();
    let table = aggregate_ngrams([("x", counts)], 0);
    assert_eq!(table.len(), 3);
}

// ============================================================================
// 3. Through the engine
// ============================================================================

#[test]
fn test_engine_ngrams_use_config() {
    let config = EngineConfig {
        ngram: NgramConfig { n: 4, retain_threshold: 1 },
        ..EngineConfig::default()
    };
    let engine = Engine::new(config).unwrap();

    let one = b"\xde\xad\xbe\xef\x00\xde\xad\xbe\xef";
    let two = b"\xde\xad\xbe\xef";
    let samples = vec![Sample::new("one", one), Sample::new("two", two)];
    let table = engine.ngrams(&samples).unwrap();

    assert_eq!(table.len(), 1);
    let record = &table[b"\xde\xad\xbe\xef".as_slice()];
    assert_eq!(record.total_count, 2);
    assert_eq!(record.sources[0].source, "one");
}
