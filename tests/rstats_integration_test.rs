/*!
 * Integration tests for RStats history decoding against real gzip files
 */

use std::io::Write;

use flate2::write::GzEncoder;
use flate2::Compression;
use tempfile::tempdir;

use lantern::{BandwidthHistory, FormatVersion, LanternError, NO_DATA_RANGE};

const DAILY_SLOTS: usize = 62;

/// (123 << 16) | (5 << 8) | 15 -> 2023-06-15
const PACKED_2023_06_15: u32 = 0x007B_050F;
const EPOCH_2023_06_15: i64 = 1_686_787_200;

fn push_counter(out: &mut Vec<u8>, date: u32, download: u64, upload: u64) {
    out.extend_from_slice(&date.to_le_bytes());
    out.extend_from_slice(&download.to_le_bytes());
    out.extend_from_slice(&upload.to_le_bytes());
}

fn raw_history(magic: &[u8; 4], monthly_slots: usize) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(magic);
    out.extend_from_slice(&[0u8; 4]);

    push_counter(&mut out, PACKED_2023_06_15, 1_000_000, 50_000);
    for _ in 1..DAILY_SLOTS {
        push_counter(&mut out, 0, 0, 0);
    }
    out.extend_from_slice(&7u64.to_le_bytes()); // daily pointer, ignored

    push_counter(&mut out, PACKED_2023_06_15 & 0xFFFF_FF00, 9_000_000, 450_000);
    for _ in 1..monthly_slots {
        push_counter(&mut out, 0, 0, 0);
    }
    out.extend_from_slice(&3u64.to_le_bytes()); // monthly pointer, ignored
    out
}

fn gzip(raw: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(raw).unwrap();
    encoder.finish().unwrap()
}

#[test]
fn test_decode_from_gzip_file_on_disk() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tomato_rstats.gz");
    std::fs::write(&path, gzip(&raw_history(b"RS00", 12))).unwrap();

    let history = BandwidthHistory::from_file(&path).unwrap();

    assert_eq!(history.version(), FormatVersion::V0);

    let daily = history.daily();
    assert_eq!(daily.len(), 1);
    assert_eq!(daily[0].date, EPOCH_2023_06_15);
    assert_eq!(daily[0].download, 1_000_000);
    assert_eq!(daily[0].upload, 50_000);
    assert_eq!(history.daily_range(), (EPOCH_2023_06_15, EPOCH_2023_06_15));

    // The monthly slot has day 0, decoding as the 1st of June
    let monthly = history.monthly();
    assert_eq!(monthly.len(), 1);
    assert_eq!(monthly[0].date, EPOCH_2023_06_15 - 14 * 86_400);
    assert_eq!(monthly[0].download, 9_000_000);
}

#[test]
fn test_samples_serialize_for_downstream_writers() {
    let compressed = gzip(&raw_history(b"RS00", 12));
    let history = BandwidthHistory::from_reader(compressed.as_slice()).unwrap();

    let json = serde_json::to_value(&history.daily()[0]).unwrap();
    assert_eq!(json["date"], EPOCH_2023_06_15);
    assert_eq!(json["download"], 1_000_000);
    assert_eq!(json["upload"], 50_000);
}

#[test]
fn test_current_version_from_reader() {
    let compressed = gzip(&raw_history(b"RS01", 25));
    let history = BandwidthHistory::from_reader(compressed.as_slice()).unwrap();

    assert_eq!(history.version(), FormatVersion::V1);
    assert_eq!(history.monthly().len(), 1);
}

#[test]
fn test_wrong_monthly_count_for_version_is_truncation() {
    // A legacy header over a 25-slot body would leave the stream misaligned;
    // the reverse (12-slot body under a current header) runs out of bytes
    let compressed = gzip(&raw_history(b"RS01", 12));
    let err = BandwidthHistory::from_reader(compressed.as_slice()).unwrap_err();

    match err {
        LanternError::Format(msg) => assert!(msg.contains("monthly"), "{}", msg),
        other => panic!("Expected Format error, got {:?}", other),
    }
}

#[test]
fn test_garbage_archive_is_fatal_decompression_error() {
    let err = BandwidthHistory::from_reader(&b"this is not a gzip stream"[..]).unwrap_err();

    assert!(matches!(err, LanternError::Decompression(_)), "{:?}", err);
    assert!(err.is_fatal());
}

#[test]
fn test_missing_file_is_fatal() {
    let err = BandwidthHistory::from_file(std::path::Path::new("/no/such/rstats.gz")).unwrap_err();
    assert!(matches!(err, LanternError::Io(_)));
    assert!(err.is_fatal());
}

#[test]
fn test_all_sentinel_file_reports_no_data() {
    let mut raw = Vec::new();
    raw.extend_from_slice(b"RS00");
    raw.extend_from_slice(&[0u8; 4]);
    for _ in 0..DAILY_SLOTS {
        push_counter(&mut raw, 0, 0, 0);
    }
    raw.extend_from_slice(&[0u8; 8]);
    for _ in 0..12 {
        push_counter(&mut raw, 0, 0, 0);
    }
    raw.extend_from_slice(&[0u8; 8]);

    let history = BandwidthHistory::from_reader(gzip(&raw).as_slice()).unwrap();

    assert!(history.daily().is_empty());
    assert_eq!(history.daily_range(), NO_DATA_RANGE);
    assert_eq!(history.monthly_range(), NO_DATA_RANGE);
}
