//! Types describing the metadata of an archive entry.

use std::fmt;

/// Representation of the timestamp stored alongside a ZIP entry, with
/// the resolution the MS-DOS on-disk encoding gives it (two-second
/// granularity, years 1980-2107).
///
/// There is no timezone attached, so this is only good for user-facing
/// description, which is all the probe wants from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateTime {
    year: u16,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
    second: u8,
}

impl Default for DateTime {
    /// Constructs an 'default' datetime of 1980-01-01 00:00:00
    fn default() -> DateTime {
        DateTime {
            year: 1980,
            month: 1,
            day: 1,
            hour: 0,
            minute: 0,
            second: 0,
        }
    }
}

impl DateTime {
    /// Converts an msdos (u16, u16) pair to a DateTime object
    ///
    /// The decode is lenient: out-of-range fields (month 15, hour 31) come
    /// straight from the bits. Archives written by odd tooling carry such
    /// values, and the probe reports what is on disk.
    pub const fn from_msdos(datepart: u16, timepart: u16) -> DateTime {
        let seconds = (timepart & 0b0000000000011111) << 1;
        let minutes = (timepart & 0b0000011111100000) >> 5;
        let hours = (timepart & 0b1111100000000000) >> 11;
        let days = datepart & 0b0000000000011111;
        let months = (datepart & 0b0000000111100000) >> 5;
        let years = (datepart & 0b1111111000000000) >> 9;

        DateTime {
            year: years + 1980,
            month: months as u8,
            day: days as u8,
            hour: hours as u8,
            minute: minutes as u8,
            second: seconds as u8,
        }
    }

    /// Get the year. There is no epoch, i.e. 2018 will be returned as 2018.
    pub const fn year(&self) -> u16 {
        self.year
    }

    /// Get the month, where 1 = january and 12 = december
    pub const fn month(&self) -> u8 {
        self.month
    }

    /// Get the day
    pub const fn day(&self) -> u8 {
        self.day
    }

    /// Get the hour
    pub const fn hour(&self) -> u8 {
        self.hour
    }

    /// Get the minute
    pub const fn minute(&self) -> u8 {
        self.minute
    }

    /// Get the second
    pub const fn second(&self) -> u8 {
        self.second
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

/// Identifies the storage format used to write an entry.
///
/// Only methods the probe can act on are named; everything else is kept as
/// the raw method id so it can still be displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    /// Store the file as is
    Stored,
    /// Compress the file using Deflate
    Deflated,
    /// Any method this crate does not decode
    Unsupported(u16),
}

impl CompressionMethod {
    pub const fn parse_from_u16(val: u16) -> Self {
        match val {
            0 => CompressionMethod::Stored,
            8 => CompressionMethod::Deflated,
            v => CompressionMethod::Unsupported(v),
        }
    }

}

impl fmt::Display for CompressionMethod {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CompressionMethod::Stored => write!(f, "stored"),
            CompressionMethod::Deflated => write!(f, "deflated"),
            CompressionMethod::Unsupported(v) => write!(f, "unsupported({v})"),
        }
    }
}

/// Structure representing an archive entry, as described by its central
/// directory header.
#[derive(Debug, Clone)]
pub struct EntryMetadata {
    /// Name of the entry
    pub name: Box<str>,
    /// True if the entry's payload is encrypted
    pub encrypted: bool,
    /// Compression method used to store the entry
    pub compression_method: CompressionMethod,
    /// Last modified time, at MS-DOS resolution
    pub last_modified_time: DateTime,
    /// CRC32 checksum recorded for the uncompressed payload
    pub crc32: u32,
    /// Size of the entry's payload as stored in the archive
    pub compressed_size: u64,
    /// Size of the entry's payload once decompressed
    pub uncompressed_size: u64,
    /// Offset of the entry's local header within the file
    pub header_start: u64,
    /// Offset of the entry's payload within the file, past the local
    /// header's variable-length fields
    pub data_start: u64,
}

impl EntryMetadata {
    /// True if the entry looks like a directory marker.
    pub fn is_dir(&self) -> bool {
        self.name.ends_with('/')
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn datetime_conversion() {
        let dt = DateTime::from_msdos(0x4D71, 0x54CF);
        assert_eq!(dt.year(), 2018);
        assert_eq!(dt.month(), 11);
        assert_eq!(dt.day(), 17);
        assert_eq!(dt.hour(), 10);
        assert_eq!(dt.minute(), 38);
        assert_eq!(dt.second(), 30);
        assert_eq!(dt.to_string(), "2018-11-17 10:38:30");
    }

    #[test]
    fn datetime_out_of_bounds_is_reported_as_is() {
        let dt = DateTime::from_msdos(0xFFFF, 0xFFFF);
        assert_eq!(dt.year(), 2107);
        assert_eq!(dt.month(), 15);
        assert_eq!(dt.day(), 31);
        assert_eq!(dt.hour(), 31);
        assert_eq!(dt.minute(), 63);
        assert_eq!(dt.second(), 62);

        let dt = DateTime::from_msdos(0x0000, 0x0000);
        assert_eq!(dt.year(), 1980);
        assert_eq!(dt.month(), 0);
        assert_eq!(dt.day(), 0);
    }

    #[test]
    fn compression_method_from_u16() {
        assert_eq!(
            CompressionMethod::parse_from_u16(0),
            CompressionMethod::Stored
        );
        assert_eq!(
            CompressionMethod::parse_from_u16(8),
            CompressionMethod::Deflated
        );
        assert_eq!(
            CompressionMethod::parse_from_u16(14),
            CompressionMethod::Unsupported(14)
        );
        assert_eq!(
            CompressionMethod::Unsupported(14).to_string(),
            "unsupported(14)"
        );
    }
}
