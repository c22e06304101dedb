//! The raw-inflate probe: pull a byte span out of a file and decompress it
//! as a headerless deflate stream.

use crate::result::{ProbeError, ProbeResult};

use flate2::read::DeflateDecoder;

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

/// Read exactly `length` bytes starting at `offset` from a seekable reader.
///
/// The span is bounds-checked against the stream length before anything is
/// read, so a span past the end fails with
/// [`ProbeError::SpanOutOfBounds`] instead of a short read.
pub fn read_span<R: Read + Seek>(
    reader: &mut R,
    offset: u64,
    length: u64,
) -> ProbeResult<Vec<u8>> {
    let file_size = reader.seek(SeekFrom::End(0))?;

    let in_bounds = offset
        .checked_add(length)
        .is_some_and(|end| end <= file_size);
    if !in_bounds {
        return Err(ProbeError::SpanOutOfBounds {
            offset,
            length,
            file_size,
        });
    }

    reader.seek(SeekFrom::Start(offset))?;
    let mut span = vec![0u8; length as usize];
    reader.read_exact(&mut span)?;
    Ok(span)
}

/// Decompress a raw deflate stream, one without the zlib header and trailing
/// checksum. This is the form ZIP stores deflated entries in, and the form
/// most proprietary archive formats borrow.
///
/// Corrupt and truncated streams both fail with
/// [`ProbeError::InvalidDeflate`]; no partial output is ever returned.
pub fn raw_inflate(data: &[u8]) -> ProbeResult<Vec<u8>> {
    let mut decoder = DeflateDecoder::new(data);
    let mut inflated = Vec::new();

    match decoder.read_to_end(&mut inflated) {
        Ok(_) => Ok(inflated),
        Err(err)
            if matches!(
                err.kind(),
                io::ErrorKind::InvalidInput
                    | io::ErrorKind::InvalidData
                    | io::ErrorKind::UnexpectedEof
            ) =>
        {
            Err(ProbeError::InvalidDeflate(err.to_string().into()))
        }
        Err(err) => Err(err.into()),
    }
}

/// Open `path`, read the `(offset, length)` span out of it and raw-inflate
/// the result. The file handle only lives for the duration of the read.
pub fn probe_path<P: AsRef<Path>>(path: P, offset: u64, length: u64) -> ProbeResult<Vec<u8>> {
    let mut file = File::open(path)?;
    let span = read_span(&mut file, offset, length)?;
    raw_inflate(&span)
}

#[cfg(test)]
mod test {
    use super::*;
    use flate2::read::DeflateEncoder;
    use flate2::Compression;
    use std::io::Cursor;

    fn deflate(data: &[u8]) -> Vec<u8> {
        let mut compressed = Vec::new();
        DeflateEncoder::new(data, Compression::default())
            .read_to_end(&mut compressed)
            .unwrap();
        compressed
    }

    #[test]
    fn span_round_trip() {
        let compressed = deflate(b"HELLO");

        let mut stream = Vec::new();
        stream.extend_from_slice(b"prefix bytes");
        stream.extend_from_slice(&compressed);
        stream.extend_from_slice(b"suffix");

        let span = read_span(
            &mut Cursor::new(&stream),
            12,
            compressed.len() as u64,
        )
        .unwrap();
        assert_eq!(raw_inflate(&span).unwrap(), b"HELLO");
    }

    #[test]
    fn span_past_the_end_is_rejected() {
        let mut stream = Cursor::new(vec![0u8; 16]);
        match read_span(&mut stream, 8, 9) {
            Err(ProbeError::SpanOutOfBounds {
                offset: 8,
                length: 9,
                file_size: 16,
            }) => (),
            other => panic!("expected SpanOutOfBounds, got {other:?}"),
        }
    }

    #[test]
    fn span_offset_overflow_is_rejected() {
        let mut stream = Cursor::new(vec![0u8; 16]);
        assert!(matches!(
            read_span(&mut stream, u64::MAX, 2),
            Err(ProbeError::SpanOutOfBounds { .. })
        ));
    }

    #[test]
    fn garbage_is_not_silently_inflated() {
        // 0b111 in the first byte selects an invalid block type.
        let garbage = [0xffu8, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff];
        assert!(matches!(
            raw_inflate(&garbage),
            Err(ProbeError::InvalidDeflate(_))
        ));
    }

    #[test]
    fn truncated_stream_is_invalid() {
        let compressed = deflate(b"a longer plaintext that compresses into several bytes");
        let truncated = &compressed[..compressed.len() / 2];
        assert!(matches!(
            raw_inflate(truncated),
            Err(ProbeError::InvalidDeflate(_))
        ));
    }
}
