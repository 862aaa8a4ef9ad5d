//! Types that specify what is contained in a ZIP.

use time::OffsetDateTime;

use crate::compression::CompressionMethod;
use crate::spec;

/// A date and time in the packed MS-DOS representation ZIP archives use:
/// two-second resolution, representable range 1980-01-01 to 2107-12-31.
///
/// Out-of-range years are kept as given; they collapse to the boundary
/// constants when the value is written out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateTime {
    year: u16,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
    second: u8,
}

/// A date or time component was outside its calendar range.
#[derive(Debug, Clone, Copy, thiserror::Error)]
#[error("invalid date or time component")]
pub struct DateTimeRangeError;

/// Smallest date/time the format can handle, as the original InfoZip
/// writers emit it for anything before 1980.
const DOS_TIME_MIN: u32 = 0x0000_2100;
/// Dec 31 2107 23:59:58, the top of the representable range.
const DOS_TIME_MAX: u32 = 0xff9f_bf7d;

impl Default for DateTime {
    /// Constructs a 'default' datetime of 1980-01-01 00:00:00
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
    /// Constructs a DateTime from a specific date and time
    ///
    /// The year is not restricted to the representable range; months are
    /// 1-12, days 1-31, and the time of day follows the clock. Seconds are
    /// stored with two-second resolution.
    pub fn from_date_and_time(
        year: u16,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
    ) -> Result<DateTime, DateTimeRangeError> {
        if (1..=12).contains(&month)
            && (1..=31).contains(&day)
            && hour <= 23
            && minute <= 59
            && second <= 59
        {
            Ok(DateTime {
                year,
                month,
                day,
                hour,
                minute,
                second,
            })
        } else {
            Err(DateTimeRangeError)
        }
    }

    /// Converts an [`OffsetDateTime`] to a DateTime, using its broken-down
    /// components in the offset it carries.
    pub fn from_time(dt: OffsetDateTime) -> DateTime {
        DateTime {
            year: dt.year().clamp(0, i32::from(u16::MAX)) as u16,
            month: u8::from(dt.month()),
            day: dt.day(),
            hour: dt.hour(),
            minute: dt.minute(),
            second: dt.second(),
        }
    }

    /// The current wall-clock time in the local offset, falling back to UTC
    /// when the platform cannot determine the offset.
    pub fn now_local() -> DateTime {
        DateTime::from_time(OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc()))
    }

    /// The date part, packed for a header record. Years are clamped to the
    /// representable range.
    pub fn datepart(&self) -> u16 {
        u16::from(self.day) | (u16::from(self.month) << 5) | ((self.year.clamp(1980, 2107) - 1980) << 9)
    }

    /// The time part, packed for a header record.
    pub fn timepart(&self) -> u16 {
        (u16::from(self.second) >> 1) | (u16::from(self.minute) << 5) | (u16::from(self.hour) << 11)
    }

    /// The complete 4-byte DOS date/time field.
    ///
    /// Dates before 1980 become the `0x00002100` constant widespread
    /// writers emit; dates after 2107 saturate at Dec 31 2107 23:59:58.
    pub fn dos_value(&self) -> u32 {
        if self.year < 1980 {
            return DOS_TIME_MIN;
        }
        if self.year > 2107 {
            return DOS_TIME_MAX;
        }
        (u32::from(self.datepart()) << 16) | u32::from(self.timepart())
    }

    /// Get the year. There is no epoch, i.e. 2018 is 2018.
    pub fn year(&self) -> u16 {
        self.year
    }

    /// Get the month, where 1 = january and 12 = december
    pub fn month(&self) -> u8 {
        self.month
    }

    /// Get the day
    pub fn day(&self) -> u8 {
        self.day
    }

    /// Get the hour
    pub fn hour(&self) -> u8 {
        self.hour
    }

    /// Get the minute
    pub fn minute(&self) -> u8 {
        self.minute
    }

    /// Get the second
    pub fn second(&self) -> u8 {
        self.second
    }
}

/// Metadata for a member of an archive, described before any of its payload
/// is written.
///
/// Everything except the name is optional. A stored entry must declare its
/// uncompressed size and CRC before it is started; a deflated entry gets
/// both computed while its payload streams through the writer.
#[derive(Clone, Debug)]
pub struct ZipEntry {
    pub(crate) name: String,
    pub(crate) method: Option<CompressionMethod>,
    pub(crate) last_modified: Option<DateTime>,
    pub(crate) size: Option<u32>,
    pub(crate) crc32: Option<u32>,
    pub(crate) local_extra: Vec<u8>,
    pub(crate) central_extra: Vec<u8>,
    pub(crate) comment: String,
    pub(crate) internal_attributes: u16,
    pub(crate) external_attributes: u32,
}

impl ZipEntry {
    /// Creates a new entry with the given name.
    pub fn new<S: Into<String>>(name: S) -> ZipEntry {
        ZipEntry {
            name: name.into(),
            method: None,
            last_modified: None,
            size: None,
            crc32: None,
            local_extra: Vec::new(),
            central_extra: Vec::new(),
            comment: String::new(),
            internal_attributes: 0,
            external_attributes: 0,
        }
    }

    /// The name of the entry.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set the compression method for this entry.
    ///
    /// When unset, the writer's default method applies.
    #[must_use]
    pub fn compression_method(mut self, method: CompressionMethod) -> ZipEntry {
        self.method = Some(method);
        self
    }

    /// Set the last modified time.
    ///
    /// When unset, the wall-clock time at which the entry is started is
    /// recorded.
    #[must_use]
    pub fn last_modified_time(mut self, mod_time: DateTime) -> ZipEntry {
        self.last_modified = Some(mod_time);
        self
    }

    /// Declare the uncompressed size. Required for stored entries.
    #[must_use]
    pub fn size(mut self, size: u32) -> ZipEntry {
        self.size = Some(size);
        self
    }

    /// Declare the CRC-32 of the payload. Required for stored entries.
    #[must_use]
    pub fn crc32(mut self, crc32: u32) -> ZipEntry {
        self.crc32 = Some(crc32);
        self
    }

    /// Set the extra field bytes stored in the local file header.
    #[must_use]
    pub fn local_extra(mut self, extra: Vec<u8>) -> ZipEntry {
        self.local_extra = extra;
        self
    }

    /// Set the extra field bytes stored in the central directory.
    #[must_use]
    pub fn central_extra(mut self, extra: Vec<u8>) -> ZipEntry {
        self.central_extra = extra;
        self
    }

    /// Set the entry comment, stored in the central directory.
    #[must_use]
    pub fn comment<S: Into<String>>(mut self, comment: S) -> ZipEntry {
        self.comment = comment.into();
        self
    }

    /// Set the internal file attributes.
    #[must_use]
    pub fn internal_attributes(mut self, attributes: u16) -> ZipEntry {
        self.internal_attributes = attributes;
        self
    }

    /// Set the external file attributes.
    #[must_use]
    pub fn external_attributes(mut self, attributes: u32) -> ZipEntry {
        self.external_attributes = attributes;
        self
    }
}

/// Everything the central directory needs to describe one entry, with the
/// name and comment already converted to their stored bytes.
pub(crate) struct ZipFileData {
    pub name_raw: Vec<u8>,
    pub method: CompressionMethod,
    pub last_modified: DateTime,
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub local_extra: Vec<u8>,
    pub central_extra: Vec<u8>,
    pub comment_raw: Vec<u8>,
    pub internal_attributes: u16,
    pub external_attributes: u32,
    /// Offset of the local file header, from the start of the stream.
    pub header_start: u64,
    pub utf8: bool,
}

impl ZipFileData {
    pub fn version_needed(&self) -> u16 {
        match self.method {
            // 2.0 as the sizes travel in the data descriptor
            CompressionMethod::Deflated => spec::VERSION_NEEDED_DATA_DESCRIPTOR,
            CompressionMethod::Stored => spec::VERSION_NEEDED_DEFAULT,
        }
    }

    pub fn flags(&self) -> u16 {
        let mut flags = 0;
        if self.method == CompressionMethod::Deflated {
            flags |= spec::FLAG_DATA_DESCRIPTOR;
        }
        if self.utf8 {
            flags |= spec::FLAG_UTF8;
        }
        flags
    }
}
