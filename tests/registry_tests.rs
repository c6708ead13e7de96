// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Registry lifecycle and concurrency tests.

use std::path::PathBuf;
use std::sync::Arc;

use rawview::{AccessMode, Lookup, MappingRegistry, PersistMode, StreamId, View, ViewError};

fn temp_path(name: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!(
        "rawview_test_registry_{}_{}.tmp",
        std::process::id(),
        name
    ));
    path
}

#[test]
fn test_n_acquires_n_releases_one_mapping() {
    let path = temp_path("exact");
    std::fs::write(&path, vec![0u8; 1024]).unwrap();
    let registry = MappingRegistry::new();
    let id = StreamId::new_unique("exact");
    let persist = PersistMode::file(&path);

    const N: usize = 16;
    let mut handles = Vec::new();
    for _ in 0..N {
        handles.push(
            registry
                .acquire(&id, AccessMode::OPEN_READ, &persist, None)
                .unwrap(),
        );
    }
    // All N acquisitions share one underlying mapping.
    for h in &handles[1..] {
        assert!(Arc::ptr_eq(&handles[0], h));
    }
    assert_eq!(registry.ref_count(&id), Some(N));
    assert_eq!(registry.len(), 1);

    for i in 0..N {
        let disposed = registry.release(&id).unwrap();
        assert_eq!(disposed, i == N - 1);
    }
    assert!(registry.is_empty());
    // Only the caller-held Arcs remain; the registry gave up its reference.
    drop(handles);

    // A further release must fail rather than driving the count negative.
    assert!(matches!(
        registry.release(&id),
        Err(ViewError::NotFound { .. })
    ));

    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_force_close_at_any_ref_count() {
    let registry = MappingRegistry::new();
    let id = StreamId::new_unique("force");
    let persist = PersistMode::Anonymous;

    let handle = registry
        .acquire(&id, AccessMode::OPEN_READ_WRITE, &persist, Some(512))
        .unwrap();
    for _ in 0..4 {
        registry
            .acquire(&id, AccessMode::OPEN_READ_WRITE, &persist, Some(512))
            .unwrap();
    }
    assert_eq!(registry.ref_count(&id), Some(5));

    let view = View::root(&handle).unwrap();
    assert!(registry.force_close(&id));

    assert!(matches!(registry.lookup(&id), Lookup::NotFound));
    assert!(handle.is_closed());
    assert!(matches!(
        view.as_slice(),
        Err(ViewError::RegionClosed { .. })
    ));
    assert!(matches!(
        View::root(&handle),
        Err(ViewError::RegionClosed { .. })
    ));

    // The id can be mapped fresh afterwards.
    let reopened = registry
        .acquire(&id, AccessMode::OPEN_READ_WRITE, &persist, Some(512))
        .unwrap();
    assert!(!reopened.is_closed());
    assert!(!Arc::ptr_eq(&handle, &reopened));
}

#[test]
fn test_zero_size_anonymous_never_reaches_os() {
    let registry = MappingRegistry::new();
    let id = StreamId::new_unique("zero");

    for size in [Some(0), None] {
        let err = registry
            .acquire(&id, AccessMode::OPEN_READ_WRITE, &PersistMode::Anonymous, size)
            .unwrap_err();
        assert!(matches!(err, ViewError::ZeroLength { .. }));
    }
    assert!(registry.is_empty());
    assert!(matches!(registry.lookup(&id), Lookup::Error(_)));
}

#[test]
fn test_soft_failure_side_channel_for_bulk_open() {
    let registry = MappingRegistry::new();
    let good = StreamId::new_unique("good");
    let bad = StreamId::new_unique("bad");
    let missing = temp_path("does_not_exist");

    let mut opened = Vec::new();
    for (id, persist, size) in [
        (&good, PersistMode::Anonymous, Some(64)),
        (&bad, PersistMode::file(&missing), None),
    ] {
        // Bulk-open workflows continue past soft failures.
        if let Ok(region) = registry.acquire(id, AccessMode::OPEN_READ_WRITE, &persist, size) {
            opened.push(region);
        }
    }

    assert_eq!(opened.len(), 1);
    assert_eq!(registry.len(), 1);
    assert!(registry.last_error(&good).is_none());
    let message = registry.last_error(&bad).unwrap();
    assert!(message.contains("No backing resource"));
}

#[test]
fn test_concurrent_acquire_release_stress() {
    const THREADS: usize = 8;
    const ITERATIONS: usize = 200;

    let registry = Arc::new(MappingRegistry::new());
    let id = StreamId::new_unique("stress");

    let workers: Vec<_> = (0..THREADS)
        .map(|_| {
            let registry = Arc::clone(&registry);
            let id = id.clone();
            std::thread::spawn(move || {
                for _ in 0..ITERATIONS {
                    let region = registry
                        .acquire(
                            &id,
                            AccessMode::OPEN_READ_WRITE,
                            &PersistMode::Anonymous,
                            Some(4096),
                        )
                        .unwrap();
                    // Use the handle before releasing so a use-after-dispose
                    // would be observed.
                    let view = View::root(&region).unwrap();
                    let _ = view.as_slice().unwrap()[0];
                    registry.release(&id).unwrap();
                }
            })
        })
        .collect();

    for w in workers {
        w.join().unwrap();
    }

    // Every acquire was paired with a release; nothing may remain.
    assert!(registry.is_empty());
    assert_eq!(registry.ref_count(&id), None);
}

#[test]
fn test_concurrent_acquire_with_force_close() {
    const THREADS: usize = 4;
    const ITERATIONS: usize = 100;

    let registry = Arc::new(MappingRegistry::new());
    let id = StreamId::new_unique("refresh");

    let workers: Vec<_> = (0..THREADS)
        .map(|t| {
            let registry = Arc::clone(&registry);
            let id = id.clone();
            std::thread::spawn(move || {
                for i in 0..ITERATIONS {
                    if t == 0 && i % 10 == 0 {
                        // Simulates remapping a file under active acquisition.
                        registry.force_close(&id);
                        continue;
                    }
                    let region = registry
                        .acquire(
                            &id,
                            AccessMode::OPEN_READ_WRITE,
                            &PersistMode::Anonymous,
                            Some(1024),
                        )
                        .unwrap();
                    // A force-closed handle fails cleanly; it never reads
                    // unmapped memory.
                    if let Ok(view) = View::root(&region) {
                        let _ = view.as_slice().map(|s| s[0]);
                    }
                    // Force-close may already have removed the entry.
                    let _ = registry.release(&id);
                }
            })
        })
        .collect();

    for w in workers {
        w.join().unwrap();
    }

    registry.close_all();
    assert!(registry.is_empty());
}

#[test]
fn test_explicit_teardown() {
    let registry = MappingRegistry::new();
    let ids: Vec<_> = (0..3).map(|i| StreamId::new_unique(format!("t{i}"))).collect();
    let handles: Vec<_> = ids
        .iter()
        .map(|id| {
            registry
                .acquire(id, AccessMode::OPEN_READ_WRITE, &PersistMode::Anonymous, Some(64))
                .unwrap()
        })
        .collect();

    assert_eq!(registry.close_all(), 3);
    assert!(registry.is_empty());
    for handle in &handles {
        assert!(handle.is_closed());
    }
}
