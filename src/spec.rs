#![allow(clippy::wrong_self_convention)]

//! Parsing for the fixed-layout ZIP header records the probe needs.

use crate::result::{ProbeError, ProbeResult};
use std::io::prelude::*;
use std::mem;

pub type Magic = u32;

pub const LOCAL_FILE_HEADER_SIGNATURE: Magic = 0x04034b50;
pub const CENTRAL_DIRECTORY_HEADER_SIGNATURE: Magic = 0x02014b50;
pub const CENTRAL_DIRECTORY_END_SIGNATURE: Magic = 0x06054b50;
pub const ZIP64_CENTRAL_DIRECTORY_END_LOCATOR_SIGNATURE: Magic = 0x07064b50;

/// Sentinel in 32-bit size/offset fields that pushes the real value into a
/// ZIP64 extra field.
pub const ZIP64_BYTES_THR: u64 = u32::MAX as u64;
/// Sentinel in the 16-bit entry-count fields of the end-of-central-directory
/// record.
pub const ZIP64_ENTRY_THR: usize = u16::MAX as usize;

/// A fixed-layout header record that can be read from the front of a stream.
pub trait Block: Sized + Copy {
    fn interpret(bytes: &[u8]) -> ProbeResult<Self>;

    fn deserialize(block: &[u8]) -> Self {
        assert_eq!(block.len(), mem::size_of::<Self>());
        let block_ptr: *const Self = block.as_ptr().cast();
        unsafe { block_ptr.read() }
    }

    fn parse<T: Read>(reader: &mut T) -> ProbeResult<Self> {
        let mut block = vec![0u8; mem::size_of::<Self>()];
        reader.read_exact(&mut block)?;
        Self::interpret(&block)
    }
}

/// Convert all the fields of a struct *from* little-endian representations.
macro_rules! from_le {
    ($obj:ident, $field:ident, $type:ty) => {
        $obj.$field = <$type>::from_le($obj.$field);
    };
    ($obj:ident, [($field:ident, $type:ty) $(,)?]) => {
        from_le![$obj, $field, $type];
    };
    ($obj:ident, [($field:ident, $type:ty), $($rest:tt),+ $(,)?]) => {
        from_le![$obj, $field, $type];
        from_le!($obj, [$($rest),+]);
    };
}

#[derive(Copy, Clone, Debug)]
#[repr(packed)]
pub struct EndOfCentralDirBlock {
    pub magic: Magic,
    pub disk_number: u16,
    pub disk_with_central_directory: u16,
    pub number_of_files_on_this_disk: u16,
    pub number_of_files: u16,
    pub central_directory_size: u32,
    pub central_directory_offset: u32,
    pub zip_file_comment_length: u16,
}

impl EndOfCentralDirBlock {
    #[inline(always)]
    fn from_le(mut self) -> Self {
        from_le![
            self,
            [
                (magic, Magic),
                (disk_number, u16),
                (disk_with_central_directory, u16),
                (number_of_files_on_this_disk, u16),
                (number_of_files, u16),
                (central_directory_size, u32),
                (central_directory_offset, u32),
                (zip_file_comment_length, u16)
            ]
        ];
        self
    }
}

impl Block for EndOfCentralDirBlock {
    fn interpret(bytes: &[u8]) -> ProbeResult<Self> {
        let block = Self::deserialize(bytes).from_le();

        if block.magic != CENTRAL_DIRECTORY_END_SIGNATURE {
            return Err(ProbeError::InvalidArchive(
                "invalid end of central directory signature".into(),
            ));
        }

        Ok(block)
    }
}

#[derive(Copy, Clone, Debug)]
#[repr(packed)]
pub struct CentralEntryBlock {
    pub magic: Magic,
    pub version_made_by: u16,
    pub version_to_extract: u16,
    pub flags: u16,
    pub compression_method: u16,
    pub last_mod_time: u16,
    pub last_mod_date: u16,
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub file_name_length: u16,
    pub extra_field_length: u16,
    pub file_comment_length: u16,
    pub disk_number: u16,
    pub internal_file_attributes: u16,
    pub external_file_attributes: u32,
    pub offset: u32,
}

impl CentralEntryBlock {
    #[inline(always)]
    fn from_le(mut self) -> Self {
        from_le![
            self,
            [
                (magic, Magic),
                (version_made_by, u16),
                (version_to_extract, u16),
                (flags, u16),
                (compression_method, u16),
                (last_mod_time, u16),
                (last_mod_date, u16),
                (crc32, u32),
                (compressed_size, u32),
                (uncompressed_size, u32),
                (file_name_length, u16),
                (extra_field_length, u16),
                (file_comment_length, u16),
                (disk_number, u16),
                (internal_file_attributes, u16),
                (external_file_attributes, u32),
                (offset, u32),
            ]
        ];
        self
    }
}

impl Block for CentralEntryBlock {
    fn interpret(bytes: &[u8]) -> ProbeResult<Self> {
        let block = Self::deserialize(bytes).from_le();

        if block.magic != CENTRAL_DIRECTORY_HEADER_SIGNATURE {
            return Err(ProbeError::InvalidArchive(
                "invalid central directory entry signature".into(),
            ));
        }

        Ok(block)
    }
}

#[derive(Copy, Clone, Debug)]
#[repr(packed)]
pub struct LocalEntryBlock {
    pub magic: Magic,
    pub version_to_extract: u16,
    pub flags: u16,
    pub compression_method: u16,
    pub last_mod_time: u16,
    pub last_mod_date: u16,
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub file_name_length: u16,
    pub extra_field_length: u16,
}

impl LocalEntryBlock {
    #[inline(always)]
    fn from_le(mut self) -> Self {
        from_le![
            self,
            [
                (magic, Magic),
                (version_to_extract, u16),
                (flags, u16),
                (compression_method, u16),
                (last_mod_time, u16),
                (last_mod_date, u16),
                (crc32, u32),
                (compressed_size, u32),
                (uncompressed_size, u32),
                (file_name_length, u16),
                (extra_field_length, u16),
            ]
        ];
        self
    }
}

impl Block for LocalEntryBlock {
    fn interpret(bytes: &[u8]) -> ProbeResult<Self> {
        let block = Self::deserialize(bytes).from_le();

        if block.magic != LOCAL_FILE_HEADER_SIGNATURE {
            return Err(ProbeError::InvalidArchive(
                "invalid local file header signature".into(),
            ));
        }

        Ok(block)
    }
}
