//! Reading the metadata of a ZIP container without extracting anything.

use crate::result::{invalid_archive, ProbeError, ProbeResult};
use crate::spec::{
    Block, CentralEntryBlock, EndOfCentralDirBlock, LocalEntryBlock,
    CENTRAL_DIRECTORY_END_SIGNATURE, ZIP64_BYTES_THR, ZIP64_CENTRAL_DIRECTORY_END_LOCATOR_SIGNATURE,
    ZIP64_ENTRY_THR,
};
use crate::types::{CompressionMethod, DateTime, EntryMetadata};

use memchr::memmem::FinderRev;

use std::io::{Read, Seek, SeekFrom};
use std::mem;

/// Find the last occurrence of `magic` within `bounds` of a seekable reader,
/// scanning windows backwards from the end.
fn rfind_magic<R: Read + Seek>(
    reader: &mut R,
    magic: &[u8],
    bounds: (u64, u64),
) -> ProbeResult<Option<u64>> {
    const BUFFER_SIZE: usize = 2048;

    // A window no larger than the needle could never match, and an equal
    // window size would stall (the window could not be moved).
    debug_assert!(BUFFER_SIZE > magic.len());

    let finder = FinderRev::new(magic);
    let mut buffer = [0u8; BUFFER_SIZE];
    let (lower, upper) = bounds;
    let mut cursor = upper
        .saturating_sub(BUFFER_SIZE as u64)
        .clamp(lower, upper);

    loop {
        /* Position the window and ensure correct length */
        let window_start = cursor;
        let window_end = cursor.saturating_add(BUFFER_SIZE as u64).min(upper);

        if window_end <= window_start {
            return Ok(None);
        }

        let window = &mut buffer[..(window_end - window_start) as usize];
        reader.seek(SeekFrom::Start(window_start))?;
        reader.read_exact(window)?;

        if let Some(offset) = finder.rfind(window) {
            return Ok(Some(window_start + offset as u64));
        }

        if window_start == lower {
            return Ok(None);
        }

        /* Move to the previous chunk, shifted by the needle length so a match
         * straddling the window boundary is still covered. */
        cursor = cursor
            .saturating_add(magic.len() as u64)
            .saturating_sub(BUFFER_SIZE as u64)
            .clamp(lower, upper);
    }
}

/// Metadata view of a ZIP archive.
///
/// Parses the end-of-central-directory record and the central directory into
/// a list of [`EntryMetadata`]. The underlying reader can be taken back with
/// [`ProbeArchive::into_inner`] to read raw byte spans out of the same file.
#[derive(Debug)]
pub struct ProbeArchive<R> {
    reader: R,
    entries: Vec<EntryMetadata>,
    comment: Box<[u8]>,
}

impl<R: Read + Seek> ProbeArchive<R> {
    /// Read an archive's central directory from a seekable reader.
    ///
    /// A trailing archive comment and data prepended before the first entry
    /// (self-extractor stubs, padding) are both tolerated; the archive offset
    /// is derived from where the end-of-central-directory record actually
    /// sits, the same way a full extractor locates it.
    pub fn new(mut reader: R) -> ProbeResult<Self> {
        let file_length = reader.seek(SeekFrom::End(0))?;
        let magic = CENTRAL_DIRECTORY_END_SIGNATURE.to_le_bytes();

        // Every occurrence of the magic is only a candidate: the archive
        // comment may itself contain those four bytes. Walk the candidates
        // from the end of the file toward the start until one of them holds
        // together as a record.
        let mut upper = file_length;
        let mut first_failure = None;

        while let Some(eocd_position) = rfind_magic(&mut reader, &magic, (0, upper))? {
            match read_metadata(&mut reader, eocd_position) {
                Ok((entries, comment)) => {
                    return Ok(ProbeArchive {
                        reader,
                        entries,
                        comment,
                    });
                }
                Err(err) => {
                    first_failure.get_or_insert(err);
                    upper = eocd_position;
                }
            }
        }

        // The failure closest to the end of the file describes the archive
        // best; i/o errors from false candidates (a signature in trailing
        // garbage, say) are not worth reporting over "there is no record".
        Err(match first_failure {
            Some(err @ (ProbeError::InvalidArchive(_) | ProbeError::UnsupportedArchive(_))) => err,
            _ => ProbeError::InvalidArchive(
                "could not find end of central directory record".into(),
            ),
        })
    }
}

impl<R> ProbeArchive<R> {
    /// Number of entries in the archive.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the archive contains no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get the metadata of an entry by its central directory index.
    pub fn entry(&self, index: usize) -> Option<&EntryMetadata> {
        self.entries.get(index)
    }

    /// Get the metadata of the first entry, the one the probe targets by
    /// default.
    pub fn first_entry(&self) -> ProbeResult<&EntryMetadata> {
        self.entries.first().ok_or(ProbeError::InvalidArchive(
            "archive contains no entries".into(),
        ))
    }

    /// Iterate over the metadata of all entries.
    pub fn entries(&self) -> impl Iterator<Item = &EntryMetadata> {
        self.entries.iter()
    }

    /// Get the archive comment.
    pub fn comment(&self) -> &[u8] {
        &self.comment
    }

    /// Unwrap and return the inner reader object.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

/// Read the archive metadata assuming an end-of-central-directory record at
/// `eocd_position`. Any failure here means the position was a false
/// candidate (or the archive is genuinely broken); the caller resumes the
/// magic search toward the file start.
fn read_metadata<R: Read + Seek>(
    reader: &mut R,
    eocd_position: u64,
) -> ProbeResult<(Vec<EntryMetadata>, Box<[u8]>)> {
    reader.seek(SeekFrom::Start(eocd_position))?;
    let eocd = EndOfCentralDirBlock::parse(reader)?;

    if eocd.disk_number != eocd.disk_with_central_directory
        || eocd.number_of_files != eocd.number_of_files_on_this_disk
    {
        return Err(ProbeError::UnsupportedArchive(
            "spanned archives are not supported".into(),
        ));
    }

    if eocd.number_of_files as usize == ZIP64_ENTRY_THR
        || eocd.central_directory_size as u64 == ZIP64_BYTES_THR
        || eocd.central_directory_offset as u64 == ZIP64_BYTES_THR
        || has_zip64_locator(reader, eocd_position)?
    {
        return Err(ProbeError::UnsupportedArchive(
            "zip64 archives are not supported".into(),
        ));
    }

    // Comment follows the fixed-size record. Python's zipfile in append
    // mode can leave garbage past the comment, so don't insist on the
    // advertised length being available.
    reader.seek(SeekFrom::Start(
        eocd_position + mem::size_of::<EndOfCentralDirBlock>() as u64,
    ))?;
    let mut comment = Vec::with_capacity(eocd.zip_file_comment_length as usize);
    (&mut *reader)
        .take(eocd.zip_file_comment_length as u64)
        .read_to_end(&mut comment)?;

    // If data was prepended to the archive, every stored offset is
    // shifted by the same amount. Recover it from where the central
    // directory actually ended.
    let directory_size = eocd.central_directory_size as u64;
    let directory_offset = eocd.central_directory_offset as u64;
    let archive_offset = eocd_position
        .checked_sub(directory_size)
        .and_then(|p| p.checked_sub(directory_offset))
        .ok_or(ProbeError::InvalidArchive(
            "invalid central directory size or offset".into(),
        ))?;

    reader.seek(SeekFrom::Start(archive_offset + directory_offset))?;

    let mut entries = Vec::with_capacity(eocd.number_of_files as usize);
    for _ in 0..eocd.number_of_files {
        entries.push(central_header_to_entry(reader, archive_offset)?);
    }

    Ok((entries, comment.into_boxed_slice()))
}

/// True if a zip64 end-of-central-directory locator sits directly before the
/// end-of-central-directory record.
fn has_zip64_locator<R: Read + Seek>(reader: &mut R, eocd_position: u64) -> ProbeResult<bool> {
    // The locator is a fixed 20-byte record.
    let Some(locator_position) = eocd_position.checked_sub(20) else {
        return Ok(false);
    };

    reader.seek(SeekFrom::Start(locator_position))?;
    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic)?;

    Ok(u32::from_le_bytes(magic) == ZIP64_CENTRAL_DIRECTORY_END_LOCATOR_SIGNATURE)
}

/// Parse one central directory entry into its metadata, resolving where its
/// payload starts by reading the local file header it points at.
fn central_header_to_entry<R: Read + Seek>(
    reader: &mut R,
    archive_offset: u64,
) -> ProbeResult<EntryMetadata> {
    let block = CentralEntryBlock::parse(reader)?;

    let CentralEntryBlock {
        flags,
        compression_method,
        last_mod_time,
        last_mod_date,
        crc32,
        compressed_size,
        uncompressed_size,
        file_name_length,
        extra_field_length,
        file_comment_length,
        offset,
        ..
    } = block;

    if compressed_size as u64 == ZIP64_BYTES_THR
        || uncompressed_size as u64 == ZIP64_BYTES_THR
        || offset as u64 == ZIP64_BYTES_THR
    {
        return Err(ProbeError::UnsupportedArchive(
            "zip64 entries are not supported".into(),
        ));
    }

    let encrypted = flags & 1 == 1;

    let mut file_name_raw = vec![0u8; file_name_length as usize];
    reader.read_exact(&mut file_name_raw)?;
    let name: Box<str> = String::from_utf8_lossy(&file_name_raw).into();

    // Extra field and comment carry nothing the probe reports.
    reader.seek(SeekFrom::Current(
        extra_field_length as i64 + file_comment_length as i64,
    ))?;

    let header_start = archive_offset + offset as u64;
    let directory_position = reader.stream_position()?;
    let data_start = find_data_start(reader, header_start)?;
    reader.seek(SeekFrom::Start(directory_position))?;

    if data_start > directory_position {
        return invalid_archive("an entry can't start after the central directory");
    }

    Ok(EntryMetadata {
        name,
        encrypted,
        compression_method: CompressionMethod::parse_from_u16(compression_method),
        last_modified_time: DateTime::from_msdos(last_mod_date, last_mod_time),
        crc32,
        compressed_size: compressed_size as u64,
        uncompressed_size: uncompressed_size as u64,
        header_start,
        data_start,
    })
}

/// Compute where an entry's payload starts, by parsing the fixed-size part
/// of its local header and skipping the variable-length fields behind it.
fn find_data_start<R: Read + Seek>(reader: &mut R, header_start: u64) -> ProbeResult<u64> {
    reader.seek(SeekFrom::Start(header_start))?;
    let block = LocalEntryBlock::parse(reader)?;

    // Each length must be widened before adding, the sum easily overflows
    // a u16.
    let variable_fields_length =
        block.file_name_length as u64 + block.extra_field_length as u64;

    Ok(header_start + mem::size_of::<LocalEntryBlock>() as u64 + variable_fields_length)
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn magic_found_across_a_window_boundary() {
        // Magic placed so it straddles the 2048-byte scan window.
        let mut data = vec![0u8; 4000];
        let magic = CENTRAL_DIRECTORY_END_SIGNATURE.to_le_bytes();
        data[1950..1954].copy_from_slice(&magic);

        let position = rfind_magic(&mut Cursor::new(&data), &magic, (0, 4000)).unwrap();
        assert_eq!(position, Some(1950));
    }

    #[test]
    fn last_occurrence_wins() {
        let magic = CENTRAL_DIRECTORY_END_SIGNATURE.to_le_bytes();
        let mut data = vec![0u8; 256];
        data[10..14].copy_from_slice(&magic);
        data[200..204].copy_from_slice(&magic);

        let position = rfind_magic(&mut Cursor::new(&data), &magic, (0, 256)).unwrap();
        assert_eq!(position, Some(200));
    }

    #[test]
    fn search_resumes_below_a_rejected_candidate() {
        let magic = CENTRAL_DIRECTORY_END_SIGNATURE.to_le_bytes();
        let mut data = vec![0u8; 256];
        data[10..14].copy_from_slice(&magic);
        data[200..204].copy_from_slice(&magic);

        // Bounding the search below a rejected candidate yields the earlier
        // occurrence instead.
        let position = rfind_magic(&mut Cursor::new(&data), &magic, (0, 200)).unwrap();
        assert_eq!(position, Some(10));
    }

    #[test]
    fn absent_magic_is_none() {
        let magic = CENTRAL_DIRECTORY_END_SIGNATURE.to_le_bytes();
        let data = vec![0u8; 5000];

        let position = rfind_magic(&mut Cursor::new(&data), &magic, (0, 5000)).unwrap();
        assert_eq!(position, None);
    }

    #[test]
    fn empty_input_is_not_an_archive() {
        match ProbeArchive::new(Cursor::new(Vec::new())) {
            Err(ProbeError::InvalidArchive(_)) => (),
            other => panic!("expected InvalidArchive, got {other:?}"),
        }
    }

    #[test]
    fn magic_in_tail_garbage_is_not_an_archive() {
        // A signature with no room for the record behind it must not
        // surface as a bare i/o error.
        let mut data = vec![0u8; 64];
        let magic = CENTRAL_DIRECTORY_END_SIGNATURE.to_le_bytes();
        data[60..64].copy_from_slice(&magic);

        match ProbeArchive::new(Cursor::new(data)) {
            Err(ProbeError::InvalidArchive(_)) => (),
            other => panic!("expected InvalidArchive, got {other:?}"),
        }
    }
}
