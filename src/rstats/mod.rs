/*!
 * Decoder for gzip-compressed RStats (Tomato) bandwidth history
 *
 * The router keeps fixed-capacity rings of daily and monthly byte counters.
 * After decompression the layout is:
 *
 *   8-byte header   (4-byte LE magic + 4 reserved bytes)
 *   62 x 24-byte daily records
 *   8-byte pointer  (last-write index in the device, discarded)
 *   N  x 24-byte monthly records (N = 12 or 25, selected by the magic)
 *   8-byte pointer  (discarded)
 *
 * Each record is a 4-byte packed date, an 8-byte download counter and an
 * 8-byte upload counter, all little-endian. A packed date of zero marks a
 * slot that has never been written; such slots keep their array position
 * but are excluded from query results.
 */

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use chrono::NaiveDate;
use flate2::read::GzDecoder;
use serde::Serialize;
use tracing::debug;

use crate::error::{LanternError, Result};

/// Magic for the legacy 12-month-slot layout ("RS00" on the wire)
const MAGIC_V0: u32 = 0x3030_5352;
/// Magic for the current 25-month-slot layout ("RS01" on the wire)
const MAGIC_V1: u32 = 0x3130_5352;

/// The daily ring always holds exactly 62 slots, in every layout
const DAILY_SLOTS: usize = 62;

/// Range returned when a series has no populated slots. Callers must compare
/// against this pair before treating the values as real dates.
pub const NO_DATA_RANGE: (i64, i64) = (i64::MAX, 0);

/// File layout variant, selected once from the header magic and threaded
/// through the rest of the decode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FormatVersion {
    /// Legacy layout
    V0,
    /// Current layout
    V1,
}

impl FormatVersion {
    /// Map a header magic to its layout, if recognized
    pub fn from_magic(magic: u32) -> Option<Self> {
        match magic {
            MAGIC_V0 => Some(FormatVersion::V0),
            MAGIC_V1 => Some(FormatVersion::V1),
            _ => None,
        }
    }

    /// Monthly ring capacity for this layout
    pub fn monthly_slots(self) -> usize {
        match self {
            FormatVersion::V0 => 12,
            FormatVersion::V1 => 25,
        }
    }
}

/// One raw counter slot as stored on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Counter {
    date: u32,
    download: u64,
    upload: u64,
}

/// One decoded bandwidth sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Sample {
    /// UTC midnight of the day (or first of the month) the counters cover,
    /// as epoch seconds
    pub date: i64,
    /// Bytes uploaded
    pub upload: u64,
    /// Bytes downloaded
    pub download: u64,
}

/// Daily and monthly bandwidth counters decoded from one RStats file.
///
/// The entire parse happens in the constructor; afterwards the history is an
/// immutable snapshot with read-only queries, safe to share by reference.
#[derive(Debug, Clone)]
pub struct BandwidthHistory {
    version: FormatVersion,
    daily: Vec<Counter>,
    monthly: Vec<Counter>,
}

impl BandwidthHistory {
    /// Open and decode a gzip-compressed RStats file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Decode a gzip-compressed RStats stream. The stream is scoped to this
    /// call: it is drained as far as the layout requires and dropped on
    /// every exit path.
    pub fn from_reader<R: Read>(compressed: R) -> Result<Self> {
        Self::parse(GzDecoder::new(compressed))
    }

    fn parse<R: Read>(mut stream: R) -> Result<Self> {
        let mut header = [0u8; 8];
        read_section(&mut stream, &mut header, "header")?;
        // Bytes 4..8 are reserved padding, consumed and ignored.
        let magic = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
        let version = FormatVersion::from_magic(magic).ok_or_else(|| {
            LanternError::Format(format!("unknown RStats file version {:#010x}", magic))
        })?;
        debug!("decoding {:?} bandwidth history", version);

        let mut daily = Vec::with_capacity(DAILY_SLOTS);
        for slot in 0..DAILY_SLOTS {
            let counter = read_counter(&mut stream, "daily block")?;
            check_slot_date(&counter, "daily", slot)?;
            daily.push(counter);
        }

        let mut pointer = [0u8; 8];
        read_section(&mut stream, &mut pointer, "daily pointer")?;

        let mut monthly = Vec::with_capacity(version.monthly_slots());
        for slot in 0..version.monthly_slots() {
            let counter = read_counter(&mut stream, "monthly block")?;
            check_slot_date(&counter, "monthly", slot)?;
            monthly.push(counter);
        }
        read_section(&mut stream, &mut pointer, "monthly pointer")?;

        Ok(Self {
            version,
            daily,
            monthly,
        })
    }

    /// Layout variant this file was written with
    pub fn version(&self) -> FormatVersion {
        self.version
    }

    /// Daily samples in slot order, unused slots excluded
    pub fn daily(&self) -> Vec<Sample> {
        samples(&self.daily)
    }

    /// Monthly samples in slot order, unused slots excluded
    pub fn monthly(&self) -> Vec<Sample> {
        samples(&self.monthly)
    }

    /// `(earliest, latest)` epoch seconds across populated daily slots, or
    /// [`NO_DATA_RANGE`] when every slot is unused
    pub fn daily_range(&self) -> (i64, i64) {
        range(&self.daily)
    }

    /// `(earliest, latest)` epoch seconds across populated monthly slots, or
    /// [`NO_DATA_RANGE`] when every slot is unused
    pub fn monthly_range(&self) -> (i64, i64) {
        range(&self.monthly)
    }
}

/// Decode a packed date to epoch seconds at UTC midnight.
///
/// Bits 16-23 hold the year offset from 1900, bits 8-15 the month offset
/// from 1, bits 0-7 the day, where day 0 means the 1st. Returns `None` when
/// the fields do not form a real calendar date.
pub fn epoch_from_packed(packed: u32) -> Option<i64> {
    let year = ((packed >> 16) & 0xFF) as i32 + 1900;
    let month = ((packed >> 8) & 0xFF) + 1;
    let day = match packed & 0xFF {
        0 => 1,
        d => d,
    };
    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    Some(date.and_hms_opt(0, 0, 0)?.and_utc().timestamp())
}

fn read_section<R: Read>(stream: &mut R, buf: &mut [u8], section: &str) -> Result<()> {
    stream.read_exact(buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => {
            LanternError::Format(format!("truncated {} section", section))
        }
        // The gzip layer reports archive corruption as invalid data
        io::ErrorKind::InvalidData | io::ErrorKind::InvalidInput => {
            LanternError::Decompression(e.to_string())
        }
        _ => LanternError::Io(e),
    })
}

fn read_counter<R: Read>(stream: &mut R, section: &str) -> Result<Counter> {
    let mut date = [0u8; 4];
    read_section(stream, &mut date, section)?;
    let mut download = [0u8; 8];
    read_section(stream, &mut download, section)?;
    let mut upload = [0u8; 8];
    read_section(stream, &mut upload, section)?;

    Ok(Counter {
        date: u32::from_le_bytes(date),
        download: u64::from_le_bytes(download),
        upload: u64::from_le_bytes(upload),
    })
}

/// A populated slot must carry a decodable calendar date. Catching this at
/// parse time keeps the query surface infallible.
fn check_slot_date(counter: &Counter, series: &str, slot: usize) -> Result<()> {
    if counter.date != 0 && epoch_from_packed(counter.date).is_none() {
        return Err(LanternError::Format(format!(
            "{} slot {} holds invalid packed date {:#010x}",
            series, slot, counter.date
        )));
    }
    Ok(())
}

fn samples(counters: &[Counter]) -> Vec<Sample> {
    counters
        .iter()
        .filter(|c| c.date != 0)
        .filter_map(|c| {
            epoch_from_packed(c.date).map(|date| Sample {
                date,
                upload: c.upload,
                download: c.download,
            })
        })
        .collect()
}

fn range(counters: &[Counter]) -> (i64, i64) {
    let (mut earliest, mut latest) = NO_DATA_RANGE;
    for counter in counters {
        if counter.date == 0 {
            continue;
        }
        if let Some(date) = epoch_from_packed(counter.date) {
            earliest = earliest.min(date);
            latest = latest.max(date);
        }
    }
    (earliest, latest)
}
