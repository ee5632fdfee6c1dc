//! Tests for MemoryPartition
//!
//! These tests verify:
//! - Subsystem lifecycle (init, erase_all)
//! - Namespace open modes and name validation
//! - Blob primitives and their error codes
//! - Footprint accounting against capacity
//! - Primitive call counters

use nvscell::store::{
    blob_footprint, Limits, MemoryPartition, Namespace, OpenMode, Partition, StoreError, StoreStats,
    ENTRY_SIZE,
};

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_partition() -> MemoryPartition {
    let partition = MemoryPartition::new();
    partition.init().unwrap();
    partition
}

fn small_partition(capacity: usize) -> MemoryPartition {
    let partition = MemoryPartition::with_limits(Limits {
        capacity,
        ..Limits::default()
    });
    partition.init().unwrap();
    partition
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[test]
fn test_open_before_init_fails() {
    let partition = MemoryPartition::new();

    assert!(!partition.is_initialized());
    assert!(matches!(
        partition.open_namespace("app", OpenMode::ReadWrite),
        Err(StoreError::NotInitialized)
    ));
}

#[test]
fn test_init_is_idempotent() {
    let partition = setup_partition();
    let ns = partition.open_namespace("app", OpenMode::ReadWrite).unwrap();
    ns.set_blob("key", b"value").unwrap();

    partition.init().unwrap();

    assert_eq!(ns.blob_size("key").unwrap(), 5);
}

#[test]
fn test_erase_all_requires_reinit() {
    let partition = setup_partition();
    let ns = partition.open_namespace("app", OpenMode::ReadWrite).unwrap();
    ns.set_blob("key", b"value").unwrap();

    partition.erase_all().unwrap();

    assert!(!partition.is_initialized());
    assert!(matches!(ns.blob_size("key"), Err(StoreError::NotInitialized)));

    partition.init().unwrap();

    // The old handle points at a namespace that is gone
    assert!(matches!(ns.blob_size("key"), Err(StoreError::InvalidHandle)));
    let reopened = partition.open_namespace("app", OpenMode::ReadWrite).unwrap();
    assert!(matches!(reopened.blob_size("key"), Err(StoreError::NotFound)));
}

#[test]
fn test_clones_share_contents() {
    let partition = setup_partition();
    let other = partition.clone();

    let ns = partition.open_namespace("app", OpenMode::ReadWrite).unwrap();
    ns.set_blob("key", b"v").unwrap();

    let seen = other.open_namespace("app", OpenMode::ReadOnly).unwrap();
    assert_eq!(seen.blob_size("key").unwrap(), 1);
}

// =============================================================================
// Namespace Tests
// =============================================================================

#[test]
fn test_read_only_open_of_missing_namespace() {
    let partition = setup_partition();

    assert!(matches!(
        partition.open_namespace("missing", OpenMode::ReadOnly),
        Err(StoreError::NotFound)
    ));
}

#[test]
fn test_read_only_handle_rejects_writes() {
    let partition = setup_partition();
    partition.open_namespace("app", OpenMode::ReadWrite).unwrap();

    let ns = partition.open_namespace("app", OpenMode::ReadOnly).unwrap();

    assert_eq!(ns.mode(), OpenMode::ReadOnly);
    assert!(matches!(ns.set_blob("key", b"v"), Err(StoreError::ReadOnly)));
    assert!(matches!(ns.erase_key("key"), Err(StoreError::ReadOnly)));
    ns.commit().unwrap();
}

#[test]
fn test_namespaces_are_isolated() {
    let partition = setup_partition();
    let a = partition.open_namespace("a", OpenMode::ReadWrite).unwrap();
    let b = partition.open_namespace("b", OpenMode::ReadWrite).unwrap();

    a.set_blob("key", b"from-a").unwrap();

    assert_eq!(a.name(), "a");
    assert!(matches!(b.blob_size("key"), Err(StoreError::NotFound)));
}

#[test]
fn test_name_validation() {
    let partition = setup_partition();

    assert!(matches!(
        partition.open_namespace("", OpenMode::ReadWrite),
        Err(StoreError::InvalidName(_))
    ));
    assert!(matches!(
        partition.open_namespace("sixteen_chars_xx", OpenMode::ReadWrite),
        Err(StoreError::InvalidName(_))
    ));

    let ns = partition.open_namespace("fifteen_chars_x", OpenMode::ReadWrite).unwrap();
    assert!(matches!(
        ns.set_blob("a_key_that_is_too_long", b"v"),
        Err(StoreError::InvalidName(_))
    ));
}

// =============================================================================
// Blob Primitive Tests
// =============================================================================

#[test]
fn test_get_blob_copies_value() {
    let partition = setup_partition();
    let ns = partition.open_namespace("app", OpenMode::ReadWrite).unwrap();
    ns.set_blob("key", b"hello").unwrap();

    let mut buf = [0u8; 8];
    let n = ns.get_blob("key", &mut buf).unwrap();

    assert_eq!(n, 5);
    assert_eq!(&buf[..n], b"hello");
}

#[test]
fn test_get_blob_with_short_buffer() {
    let partition = setup_partition();
    let ns = partition.open_namespace("app", OpenMode::ReadWrite).unwrap();
    ns.set_blob("key", b"hello").unwrap();

    let mut buf = [0u8; 4];
    match ns.get_blob("key", &mut buf) {
        Err(StoreError::InvalidLength { stored, buffer }) => {
            assert_eq!(stored, 5);
            assert_eq!(buffer, 4);
        }
        other => panic!("expected InvalidLength, got {:?}", other),
    }
}

#[test]
fn test_missing_key_errors() {
    let partition = setup_partition();
    let ns = partition.open_namespace("app", OpenMode::ReadWrite).unwrap();
    let mut buf = [0u8; 4];

    assert!(matches!(ns.blob_size("nope"), Err(StoreError::NotFound)));
    assert!(matches!(ns.get_blob("nope", &mut buf), Err(StoreError::NotFound)));
    assert!(matches!(ns.erase_key("nope"), Err(StoreError::NotFound)));
}

#[test]
fn test_empty_blob_is_present() {
    let partition = setup_partition();
    let ns = partition.open_namespace("app", OpenMode::ReadWrite).unwrap();

    ns.set_blob("empty", b"").unwrap();

    assert_eq!(ns.blob_size("empty").unwrap(), 0);
}

#[test]
fn test_value_too_long() {
    let partition = MemoryPartition::with_limits(Limits {
        max_blob_len: 16,
        ..Limits::default()
    });
    partition.init().unwrap();
    let ns = partition.open_namespace("app", OpenMode::ReadWrite).unwrap();

    assert!(matches!(
        ns.set_blob("key", &[0u8; 17]),
        Err(StoreError::ValueTooLong { len: 17, max: 16 })
    ));
    ns.set_blob("key", &[0u8; 16]).unwrap();
}

// =============================================================================
// Capacity Tests
// =============================================================================

#[test]
fn test_footprint_accounting() {
    assert_eq!(blob_footprint(0), ENTRY_SIZE);
    assert_eq!(blob_footprint(1), 2 * ENTRY_SIZE);
    assert_eq!(blob_footprint(32), 2 * ENTRY_SIZE);
    assert_eq!(blob_footprint(33), 3 * ENTRY_SIZE);

    let partition = setup_partition();
    let ns = partition.open_namespace("app", OpenMode::ReadWrite).unwrap();
    assert_eq!(partition.used().unwrap(), ENTRY_SIZE);

    ns.set_blob("key", &[0u8; 40]).unwrap();
    assert_eq!(partition.used().unwrap(), ENTRY_SIZE + blob_footprint(40));
}

#[test]
fn test_write_beyond_capacity_fails() {
    // Namespace (32) + one 64-byte blob (96) = 128
    let partition = small_partition(128);
    let ns = partition.open_namespace("app", OpenMode::ReadWrite).unwrap();
    ns.set_blob("first", &[1u8; 64]).unwrap();

    match ns.set_blob("second", &[2u8; 1]) {
        Err(StoreError::NotEnoughSpace { needed, available }) => {
            assert_eq!(needed, 64);
            assert_eq!(available, 0);
        }
        other => panic!("expected NotEnoughSpace, got {:?}", other),
    }
}

#[test]
fn test_replacing_blob_reuses_its_space() {
    let partition = small_partition(128);
    let ns = partition.open_namespace("app", OpenMode::ReadWrite).unwrap();
    ns.set_blob("first", &[1u8; 64]).unwrap();

    ns.set_blob("first", &[3u8; 60]).unwrap();

    assert_eq!(ns.blob_size("first").unwrap(), 60);
}

#[test]
fn test_erase_key_frees_space() {
    let partition = small_partition(128);
    let ns = partition.open_namespace("app", OpenMode::ReadWrite).unwrap();
    ns.set_blob("first", &[1u8; 64]).unwrap();

    ns.erase_key("first").unwrap();

    ns.set_blob("second", &[2u8; 64]).unwrap();
}

#[test]
fn test_namespace_creation_beyond_capacity() {
    let partition = small_partition(ENTRY_SIZE);
    partition.open_namespace("one", OpenMode::ReadWrite).unwrap();

    assert!(matches!(
        partition.open_namespace("two", OpenMode::ReadWrite),
        Err(StoreError::NotEnoughSpace { .. })
    ));
}

// =============================================================================
// Counter Tests
// =============================================================================

#[test]
fn test_stats_count_primitive_calls() {
    let partition = setup_partition();
    let ns = partition.open_namespace("app", OpenMode::ReadWrite).unwrap();
    let mut buf = [0u8; 4];

    ns.set_blob("key", b"1234").unwrap();
    ns.blob_size("key").unwrap();
    ns.get_blob("key", &mut buf).unwrap();
    ns.commit().unwrap();
    ns.erase_key("key").unwrap();
    let _ = ns.blob_size("key");

    assert_eq!(
        partition.stats(),
        StoreStats {
            size_queries: 2,
            reads: 1,
            writes: 1,
            erases: 1,
            commits: 1,
        }
    );
}
