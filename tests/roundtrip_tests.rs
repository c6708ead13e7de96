// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! End-to-end write/read round trips through file-backed regions.

use std::path::PathBuf;
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use rawview::{AccessMode, MappedRegion, MappingRegistry, PersistMode, StreamId, View, ViewError};

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
struct RunHeaderRecord {
    revision: u32,
    scan_count: u32,
    start_time: f64,
    end_time: f64,
    // Newer revision appended this field; legacy files end before it.
    instrument_flags: u64,
}

const LEGACY_HEADER_SIZE: usize = 24;

fn temp_path(name: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!(
        "rawview_test_roundtrip_{}_{}.tmp",
        std::process::id(),
        name
    ));
    path
}

#[test]
fn test_file_round_trip_through_registry() {
    let path = temp_path("registry");
    let _ = std::fs::remove_file(&path);
    let registry = MappingRegistry::new();
    let id = StreamId::new_unique("RunHeader");
    let persist = PersistMode::file(&path);

    let header = RunHeaderRecord {
        revision: 3,
        scan_count: 2400,
        start_time: 0.0,
        end_time: 35.5,
        instrument_flags: 0b1010,
    };
    let masses = [152.0571f64, 153.0608, 305.1581];

    // Write pass.
    {
        let region = registry
            .acquire(&id, AccessMode::CREATE_READ_WRITE, &persist, Some(4096))
            .unwrap();
        let view = View::root(&region).unwrap();
        let mut writer = view.writer().unwrap();

        let mut cursor = 0;
        cursor += writer.write_struct(cursor, &header).unwrap();
        cursor += writer.write_utf16_string(cursor, "FTMS + p ESI Full ms").unwrap();
        cursor += writer.write_array(cursor, &masses).unwrap();
        assert!(cursor <= 4096);

        region.flush().unwrap();
        assert!(registry.release(&id).unwrap());
    }
    assert!(registry.is_empty());

    // Read pass, read-only mapping.
    {
        let region = registry
            .acquire(&id, AccessMode::OPEN_READ, &persist, None)
            .unwrap();
        let view = View::root(&region).unwrap();
        let reader = view.reader().unwrap();

        let mut cursor = 0;
        let (decoded, n) = reader.read_struct::<RunHeaderRecord>(cursor).unwrap();
        assert_eq!(decoded, header);
        cursor += n;
        let (filter, n) = reader.read_utf16_string(cursor).unwrap();
        assert_eq!(filter, "FTMS + p ESI Full ms");
        cursor += n;
        let (decoded_masses, _) = reader.read_array::<f64>(cursor).unwrap();
        assert_eq!(decoded_masses, masses);

        assert!(registry.release(&id).unwrap());
    }

    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_legacy_revision_read() {
    let header = RunHeaderRecord {
        revision: 2,
        scan_count: 100,
        start_time: 1.25,
        end_time: 9.75,
        instrument_flags: 0xFFFF_FFFF,
    };

    let region = Arc::new(
        MappedRegion::from_vec(
            StreamId::new_unique("legacy"),
            bytemuck::bytes_of(&header).to_vec(),
            AccessMode::OPEN_READ,
        )
        .unwrap(),
    );
    let view = View::root(&region).unwrap();
    let reader = view.reader().unwrap();

    let (full, full_n) = reader.read_struct::<RunHeaderRecord>(0).unwrap();
    let (legacy, legacy_n) = reader
        .read_struct_prefix::<RunHeaderRecord>(0, LEGACY_HEADER_SIZE)
        .unwrap();

    assert_eq!(full_n, std::mem::size_of::<RunHeaderRecord>());
    assert_eq!(legacy_n, LEGACY_HEADER_SIZE);

    // The legacy prefix agrees with the full read; newer fields default to
    // zero.
    assert_eq!(legacy.revision, full.revision);
    assert_eq!(legacy.scan_count, full.scan_count);
    assert_eq!(legacy.start_time, full.start_time);
    assert_eq!(legacy.end_time, full.end_time);
    assert_eq!(legacy.instrument_flags, 0);
}

#[test]
fn test_write_read_all_scalar_types_at_same_offset() {
    let region = Arc::new(
        MappedRegion::create_anonymous(StreamId::new_unique("scalars"), 256).unwrap(),
    );
    let view = View::root(&region).unwrap();
    let mut writer = view.writer().unwrap();

    writer.write_u8(0, u8::MAX).unwrap();
    writer.write_i8(1, i8::MIN).unwrap();
    writer.write_u16(2, u16::MAX).unwrap();
    writer.write_i16(4, i16::MIN).unwrap();
    writer.write_u32(6, u32::MAX).unwrap();
    writer.write_i32(10, i32::MIN).unwrap();
    writer.write_u64(14, u64::MAX).unwrap();
    writer.write_i64(22, i64::MIN).unwrap();
    writer.write_f32(30, f32::MIN_POSITIVE).unwrap();
    writer.write_f64(34, f64::MAX).unwrap();

    let reader = view.reader().unwrap();
    assert_eq!(reader.read_u8(0).unwrap().0, u8::MAX);
    assert_eq!(reader.read_i8(1).unwrap().0, i8::MIN);
    assert_eq!(reader.read_u16(2).unwrap().0, u16::MAX);
    assert_eq!(reader.read_i16(4).unwrap().0, i16::MIN);
    assert_eq!(reader.read_u32(6).unwrap().0, u32::MAX);
    assert_eq!(reader.read_i32(10).unwrap().0, i32::MIN);
    assert_eq!(reader.read_u64(14).unwrap().0, u64::MAX);
    assert_eq!(reader.read_i64(22).unwrap().0, i64::MIN);
    assert_eq!(reader.read_f32(30).unwrap().0, f32::MIN_POSITIVE);
    assert_eq!(reader.read_f64(34).unwrap().0, f64::MAX);
}

#[test]
fn test_empty_array_and_string_round_trip() {
    let region = Arc::new(
        MappedRegion::create_anonymous(StreamId::new_unique("empty"), 64).unwrap(),
    );
    let view = View::root(&region).unwrap();
    let mut writer = view.writer().unwrap();

    let n1 = writer.write_array::<i32>(0, &[]).unwrap();
    let n2 = writer.write_utf16_string(n1, "").unwrap();
    assert_eq!((n1, n2), (4, 4));

    let reader = view.reader().unwrap();
    let (arr, _) = reader.read_array::<i32>(0).unwrap();
    assert!(arr.is_empty());
    let (s, _) = reader.read_utf16_string(4).unwrap();
    assert_eq!(s, "");
}

#[test]
fn test_reads_bounded_by_view_not_region() {
    let region = Arc::new(
        MappedRegion::create_anonymous(StreamId::new_unique("bounded"), 4096).unwrap(),
    );
    let window = View::over(&region, 0, 8).unwrap();
    let reader = window.reader().unwrap();
    assert!(reader.read_u64(0).is_ok());
    assert!(matches!(
        reader.read_u64(8),
        Err(ViewError::OutOfRange { .. })
    ));
}

#[test]
fn test_shared_counter_across_threads() {
    let region = Arc::new(
        MappedRegion::create_anonymous(StreamId::new_unique("counter"), 4096).unwrap(),
    );

    let threads: Vec<_> = (0..4)
        .map(|_| {
            let region = Arc::clone(&region);
            std::thread::spawn(move || {
                let view = View::root(&region).unwrap();
                for _ in 0..1000 {
                    view.fetch_add_u32(0, 1).unwrap();
                }
            })
        })
        .collect();
    for t in threads {
        t.join().unwrap();
    }

    let view = View::root(&region).unwrap();
    let (total, _) = view.reader().unwrap().read_u32(0).unwrap();
    assert_eq!(total, 4000);
}
