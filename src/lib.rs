//! A library for probing raw DEFLATE byte spans inside ZIP archives.
//!
//! This crate reads only the metadata of a ZIP container (central directory,
//! local file headers) and lets you pull an arbitrary `(offset, length)` span
//! out of the raw file and inflate it as a headerless deflate stream. It is
//! aimed at inspecting archives whose internal layout you are still reverse
//! engineering; it deliberately has no extraction pipeline and no writer.
//!
//! ```no_run
//! use std::fs::File;
//! use std::io::BufReader;
//! use zipprobe::{raw_inflate, read_span, ProbeArchive};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let file = File::open("data.zip")?;
//!     let archive = ProbeArchive::new(BufReader::new(file))?;
//!     let entry = archive.first_entry()?.clone();
//!     let mut reader = archive.into_inner();
//!     let span = read_span(&mut reader, entry.data_start, entry.compressed_size)?;
//!     let plain = raw_inflate(&span)?;
//!     println!("{}", String::from_utf8_lossy(&plain));
//!     Ok(())
//! }
//! ```

pub mod probe;
pub mod read;
pub mod result;
mod spec;
pub mod types;

pub use crate::probe::{probe_path, raw_inflate, read_span};
pub use crate::read::ProbeArchive;
pub use crate::result::{ProbeError, ProbeResult};
pub use crate::types::{CompressionMethod, DateTime, EntryMetadata};
