//! Types for creating ZIP archives

use std::io;
use std::io::prelude::*;
use std::mem;

use byteorder::{LittleEndian, WriteBytesExt};
use crc32fast::Hasher;
use flate2::write::DeflateEncoder;
use flate2::Compression;
use log::debug;

use crate::compression::CompressionMethod;
use crate::encoding::TextEncoding;
use crate::result::{ZipError, ZipResult};
use crate::spec;
use crate::types::{DateTime, ZipEntry, ZipFileData};

/// Counts every byte that reaches the sink.
///
/// The count is the authoritative stream position: local header offsets and
/// the central directory offset are taken from it. The sink is never
/// seeked.
struct CountingWriter<W> {
    inner: W,
    written: u64,
}

impl<W: Write> CountingWriter<W> {
    fn new(inner: W) -> CountingWriter<W> {
        CountingWriter { inner, written: 0 }
    }

    fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let count = self.inner.write(buf)?;
        self.written += count as u64;
        Ok(count)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

enum GenericZipWriter<W: Write> {
    Closed,
    Storer(CountingWriter<W>),
    Deflater(DeflateEncoder<CountingWriter<W>>),
}

/// ZIP archive generator
///
/// Entries are started one after another; the payload of the current entry
/// is supplied through the [`Write`] implementation. Finishing the archive
/// appends the central directory and hands the sink back.
///
/// ```
/// use std::io::Write;
///
/// # fn doit() -> zipstream::result::ZipResult<()>
/// # {
/// use zipstream::{CompressionMethod, ZipEntry, ZipWriter};
///
/// let mut zip = ZipWriter::new(Vec::new());
///
/// zip.start_entry(ZipEntry::new("hello_world.txt"))?;
/// zip.write_all(b"Hello, World!")?;
///
/// // A stored entry must declare its size and checksum up front.
/// let mut hasher = crc32fast::Hasher::new();
/// hasher.update(b"raw");
/// zip.start_entry(
///     ZipEntry::new("raw.bin")
///         .compression_method(CompressionMethod::Stored)
///         .size(3)
///         .crc32(hasher.finalize()),
/// )?;
/// zip.write_all(b"raw")?;
///
/// let archive = zip.finish()?;
/// assert_eq!(&archive[0..4], b"PK\x03\x04");
/// # Ok(())
/// # }
/// # doit().unwrap();
/// ```
pub struct ZipWriter<W: Write> {
    inner: GenericZipWriter<W>,
    files: Vec<ZipFileData>,
    stats: ZipWriterStats,
    writing_entry: bool,
    data_start: u64,
    comment: String,
    encoding: TextEncoding,
    default_method: CompressionMethod,
    level: Option<u32>,
}

#[derive(Default)]
struct ZipWriterStats {
    hasher: Hasher,
    bytes_written: u64,
}

impl ZipWriterStats {
    fn update(&mut self, buf: &[u8]) {
        self.hasher.update(buf);
        self.bytes_written += buf.len() as u64;
    }
}

impl<W: Write> Write for ZipWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !self.writing_entry {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                "No entry has been started",
            ));
        }
        match self.inner.ref_mut() {
            Some(ref mut w) => {
                let count = w.write(buf)?;
                self.stats.update(&buf[0..count]);
                Ok(count)
            }
            None => Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "write(): ZipWriter was already closed",
            )),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.inner.ref_mut() {
            Some(ref mut w) => w.flush(),
            None => Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "flush(): ZipWriter was already closed",
            )),
        }
    }
}

impl<W: Write> ZipWriter<W> {
    /// Initializes the archive.
    ///
    /// Before writing to this object, the [`ZipWriter::start_entry`]
    /// function should be called.
    pub fn new(inner: W) -> ZipWriter<W> {
        ZipWriter {
            inner: GenericZipWriter::Storer(CountingWriter::new(inner)),
            files: Vec::new(),
            stats: Default::default(),
            writing_entry: false,
            data_start: 0,
            comment: String::new(),
            encoding: TextEncoding::default(),
            default_method: CompressionMethod::Deflated,
            level: None,
        }
    }

    /// Set the archive comment, written in the end-of-central-directory
    /// record. May be called any time before [`ZipWriter::finish`].
    pub fn set_comment<S>(&mut self, comment: S)
    where
        S: Into<String>,
    {
        self.comment = comment.into();
    }

    /// Choose the encoding applied to all subsequent name and comment
    /// conversions, by label.
    pub fn set_encoding(&mut self, label: &str) -> ZipResult<()> {
        self.encoding = TextEncoding::for_label(label)?;
        Ok(())
    }

    /// The encoding currently applied to names and comments.
    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    /// Set the compression method for subsequent entries that do not carry
    /// their own. The initial default is [`CompressionMethod::Deflated`].
    pub fn set_method(&mut self, method: CompressionMethod) {
        self.default_method = method;
    }

    /// Set the compression level for subsequent deflated entries, 0-9.
    /// `None` selects the deflate default.
    pub fn set_level(&mut self, level: Option<u32>) {
        self.level = level;
    }

    /// Begin writing the next entry, closing any entry still in flight.
    ///
    /// Payload bytes for the entry are then supplied through the [`Write`]
    /// implementation.
    pub fn start_entry(&mut self, entry: ZipEntry) -> ZipResult<()> {
        self.close_entry()?;
        if self.inner.is_closed() {
            return Err(closed_error("start_entry"));
        }

        let method = entry.method.unwrap_or(self.default_method);
        let last_modified = entry.last_modified.unwrap_or_else(DateTime::now_local);

        // A stored entry has no compression ratio: the declared size is
        // final, and the checksum must be known before the header goes out.
        let (crc32, size) = match method {
            CompressionMethod::Stored => (
                entry.crc32.ok_or(ZipError::MissingStoredMetadata)?,
                entry.size.ok_or(ZipError::MissingStoredMetadata)?,
            ),
            CompressionMethod::Deflated => (0, 0),
        };

        debug!("starting {} entry {:?}", method, entry.name);

        let name_raw = self.encoding.encode(&entry.name);
        let comment_raw = self.encoding.encode(&entry.comment);
        let utf8 = self.encoding == TextEncoding::Utf8
            && !(name_raw.is_ascii() && comment_raw.is_ascii());

        let mut file = ZipFileData {
            name_raw,
            method,
            last_modified,
            crc32,
            compressed_size: size,
            uncompressed_size: size,
            local_extra: entry.local_extra,
            central_extra: entry.central_extra,
            comment_raw,
            internal_attributes: entry.internal_attributes,
            external_attributes: entry.external_attributes,
            header_start: 0,
            utf8,
        };

        {
            let writer = self.inner.get_plain();
            file.header_start = writer.written;
            write_local_file_header(writer, &file)?;
            self.data_start = writer.written;
        }

        self.stats.hasher = Hasher::new();
        self.stats.bytes_written = 0;
        self.files.push(file);

        self.inner.switch_to(method, self.level)?;
        self.writing_entry = true;
        Ok(())
    }

    /// Finalize the entry currently in flight, if any.
    ///
    /// For a deflated entry this drains the compressor and appends the data
    /// descriptor carrying the checksum and sizes. For a stored entry the
    /// declared size and checksum are verified against the bytes actually
    /// written.
    pub fn close_entry(&mut self) -> ZipResult<()> {
        if !self.writing_entry {
            return Ok(());
        }

        let real_crc = self.stats.hasher.clone().finalize();
        self.inner.switch_to(CompressionMethod::Stored, self.level)?;

        let data_end = self.inner.get_plain().written;
        let file = self.files.last_mut().expect("an entry is in flight");

        match file.method {
            CompressionMethod::Deflated => {
                file.crc32 = real_crc;
                file.uncompressed_size = self.stats.bytes_written as u32;
                file.compressed_size = (data_end - self.data_start) as u32;
                write_data_descriptor(self.inner.get_plain(), file)?;
            }
            CompressionMethod::Stored => {
                if file.crc32 != real_crc {
                    return Err(ZipError::StoredCrcMismatch {
                        declared: file.crc32,
                        actual: real_crc,
                    });
                }
                let actual = data_end - self.data_start;
                if u64::from(file.uncompressed_size) != actual {
                    return Err(ZipError::StoredSizeMismatch {
                        declared: file.uncompressed_size,
                        actual,
                    });
                }
            }
        }

        debug!(
            "closed entry {:?}: {} -> {} bytes, crc {:#010x}",
            String::from_utf8_lossy(&file.name_raw),
            file.uncompressed_size,
            file.compressed_size,
            file.crc32
        );

        self.writing_entry = false;
        Ok(())
    }

    /// Finish the archive: close the current entry, write the central
    /// directory and the end-of-central-directory record, flush the sink
    /// and hand it back.
    ///
    /// Every operation on the writer afterwards fails.
    pub fn finish(&mut self) -> ZipResult<W> {
        self.finalize()?;
        let inner = mem::replace(&mut self.inner, GenericZipWriter::Closed);
        Ok(inner.unwrap().into_inner())
    }

    fn finalize(&mut self) -> ZipResult<()> {
        self.close_entry()?;
        if self.inner.is_closed() {
            return Err(closed_error("finish"));
        }

        let comment = self.encoding.encode(&self.comment);

        {
            let writer = self.inner.get_plain();

            let central_start = writer.written;
            for file in self.files.iter() {
                write_central_directory_header(writer, file)?;
            }
            let central_size = writer.written - central_start;

            let footer = spec::CentralDirectoryEnd {
                disk_number: 0,
                disk_with_central_directory: 0,
                number_of_files_on_this_disk: self.files.len() as u16,
                number_of_files: self.files.len() as u16,
                central_directory_size: central_size as u32,
                central_directory_offset: central_start as u32,
                zip_file_comment: comment,
            };
            footer.write(writer)?;
            writer.flush()?;

            debug!(
                "finished archive: {} entries, central directory of {} bytes at offset {}",
                self.files.len(),
                central_size,
                central_start
            );
        }

        self.files.clear();
        Ok(())
    }
}

impl<W: Write> GenericZipWriter<W> {
    fn switch_to(&mut self, method: CompressionMethod, level: Option<u32>) -> ZipResult<()> {
        let bare = match mem::replace(self, GenericZipWriter::Closed) {
            GenericZipWriter::Storer(w) => w,
            GenericZipWriter::Deflater(w) => w.finish()?,
            GenericZipWriter::Closed => return Err(closed_error("switch_to")),
        };

        *self = match method {
            CompressionMethod::Stored => GenericZipWriter::Storer(bare),
            CompressionMethod::Deflated => {
                let compression = level
                    .map(|level| Compression::new(level.min(9)))
                    .unwrap_or_default();
                GenericZipWriter::Deflater(DeflateEncoder::new(bare, compression))
            }
        };

        Ok(())
    }

    fn ref_mut(&mut self) -> Option<&mut dyn Write> {
        match *self {
            GenericZipWriter::Storer(ref mut w) => Some(w as &mut dyn Write),
            GenericZipWriter::Deflater(ref mut w) => Some(w as &mut dyn Write),
            GenericZipWriter::Closed => None,
        }
    }

    fn is_closed(&self) -> bool {
        matches!(*self, GenericZipWriter::Closed)
    }

    fn get_plain(&mut self) -> &mut CountingWriter<W> {
        match *self {
            GenericZipWriter::Storer(ref mut w) => w,
            _ => panic!("Should have switched to stored beforehand"),
        }
    }

    fn unwrap(self) -> CountingWriter<W> {
        match self {
            GenericZipWriter::Storer(w) => w,
            _ => panic!("Should have switched to stored beforehand"),
        }
    }
}

fn closed_error(operation: &str) -> ZipError {
    ZipError::Io(io::Error::new(
        io::ErrorKind::BrokenPipe,
        format!("{}(): ZipWriter was already closed", operation),
    ))
}

fn write_local_file_header<T: Write>(writer: &mut T, file: &ZipFileData) -> ZipResult<()> {
    // local file header signature
    writer.write_u32::<LittleEndian>(spec::LOCAL_FILE_HEADER_SIGNATURE)?;
    // version needed to extract
    writer.write_u16::<LittleEndian>(file.version_needed())?;
    // general purpose bit flag
    writer.write_u16::<LittleEndian>(file.flags())?;
    // compression method
    writer.write_u16::<LittleEndian>(file.method.to_u16())?;
    // last mod file time and last mod file date
    writer.write_u32::<LittleEndian>(file.last_modified.dos_value())?;
    // crc-32, compressed size and uncompressed size; zero for deflated
    // entries, whose real values follow the data in the descriptor
    match file.method {
        CompressionMethod::Deflated => {
            writer.write_u32::<LittleEndian>(0)?;
            writer.write_u32::<LittleEndian>(0)?;
            writer.write_u32::<LittleEndian>(0)?;
        }
        CompressionMethod::Stored => {
            writer.write_u32::<LittleEndian>(file.crc32)?;
            writer.write_u32::<LittleEndian>(file.compressed_size)?;
            writer.write_u32::<LittleEndian>(file.uncompressed_size)?;
        }
    }
    // file name length
    writer.write_u16::<LittleEndian>(file.name_raw.len() as u16)?;
    // extra field length
    writer.write_u16::<LittleEndian>(file.local_extra.len() as u16)?;
    // file name
    writer.write_all(&file.name_raw)?;
    // extra field (local layout)
    writer.write_all(&file.local_extra)?;

    Ok(())
}

fn write_data_descriptor<T: Write>(writer: &mut T, file: &ZipFileData) -> ZipResult<()> {
    writer.write_u32::<LittleEndian>(spec::DATA_DESCRIPTOR_SIGNATURE)?;
    writer.write_u32::<LittleEndian>(file.crc32)?;
    writer.write_u32::<LittleEndian>(file.compressed_size)?;
    writer.write_u32::<LittleEndian>(file.uncompressed_size)?;
    Ok(())
}

fn write_central_directory_header<T: Write>(writer: &mut T, file: &ZipFileData) -> ZipResult<()> {
    // central file header signature
    writer.write_u32::<LittleEndian>(spec::CENTRAL_DIRECTORY_HEADER_SIGNATURE)?;
    // version made by
    writer.write_u16::<LittleEndian>(spec::VERSION_MADE_BY)?;
    // version needed to extract
    writer.write_u16::<LittleEndian>(file.version_needed())?;
    // general purpose bit flag
    writer.write_u16::<LittleEndian>(file.flags())?;
    // compression method
    writer.write_u16::<LittleEndian>(file.method.to_u16())?;
    // last mod file time + date
    writer.write_u32::<LittleEndian>(file.last_modified.dos_value())?;
    // crc-32
    writer.write_u32::<LittleEndian>(file.crc32)?;
    // compressed size
    writer.write_u32::<LittleEndian>(file.compressed_size)?;
    // uncompressed size
    writer.write_u32::<LittleEndian>(file.uncompressed_size)?;
    // file name length
    writer.write_u16::<LittleEndian>(file.name_raw.len() as u16)?;
    // extra field length
    writer.write_u16::<LittleEndian>(file.central_extra.len() as u16)?;
    // file comment length
    writer.write_u16::<LittleEndian>(file.comment_raw.len() as u16)?;
    // disk number start
    writer.write_u16::<LittleEndian>(0)?;
    // internal file attributes
    writer.write_u16::<LittleEndian>(file.internal_attributes)?;
    // external file attributes
    writer.write_u32::<LittleEndian>(file.external_attributes)?;
    // relative offset of local header
    writer.write_u32::<LittleEndian>(file.header_start as u32)?;
    // file name
    writer.write_all(&file.name_raw)?;
    // extra field (central layout)
    writer.write_all(&file.central_extra)?;
    // file comment
    writer.write_all(&file.comment_raw)?;

    Ok(())
}
