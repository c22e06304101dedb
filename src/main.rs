//! Command-line probe: print the first entry's metadata and the inflated
//! contents of a byte span.

use std::fs::File;
use std::io::BufReader;

use zipprobe::{probe_path, CompressionMethod, ProbeArchive, ProbeError};

fn main() {
    std::process::exit(real_main());
}

const USAGE: &str = "Usage: zipprobe <archive> [<offset> <length>]

Reads <length> bytes at <offset> from the raw archive file and inflates them
as a headerless deflate stream. Offset and length take decimal or 0x-prefixed
hex. Without an explicit span, the first entry's own payload is probed.";

fn real_main() -> i32 {
    let args: Vec<_> = std::env::args().collect();
    if args.len() != 2 && args.len() != 4 {
        eprintln!("{USAGE}");
        return 1;
    }
    let fname = std::path::Path::new(&args[1]);

    let span = match (args.get(2), args.get(3)) {
        (Some(offset), Some(length)) => {
            match (parse_number(offset), parse_number(length)) {
                (Some(offset), Some(length)) => Some((offset, length)),
                _ => {
                    eprintln!("{USAGE}");
                    return 1;
                }
            }
        }
        _ => None,
    };

    let archive = match File::open(fname)
        .map_err(ProbeError::from)
        .and_then(|file| ProbeArchive::new(BufReader::new(file)))
    {
        Ok(archive) => archive,
        Err(e) => {
            eprintln!("Error opening {}: {e}", fname.display());
            return 1;
        }
    };

    let entry = match archive.first_entry() {
        Ok(entry) => entry,
        Err(e) => {
            eprintln!("Error reading {}: {e}", fname.display());
            return 1;
        }
    };

    println!("First entry:          {}", entry.name);
    println!("  compression method: {}", entry.compression_method);
    println!("  compressed size:    {:#x}", entry.compressed_size);
    println!("  uncompressed size:  {:#x}", entry.uncompressed_size);
    println!("  crc32:              {:#010x}", entry.crc32);
    println!("  last modified:      {}", entry.last_modified_time);
    println!("  data start:         {:#x}", entry.data_start);

    let (offset, length) = span.unwrap_or((entry.data_start, entry.compressed_size));
    if span.is_none() && entry.compression_method != CompressionMethod::Deflated {
        eprintln!(
            "Note: first entry is {}, the probe will likely fail",
            entry.compression_method
        );
    }

    match probe_path(fname, offset, length) {
        Ok(plain) => {
            println!("{}", String::from_utf8_lossy(&plain));
            0
        }
        Err(e) => {
            eprintln!("Error probing span {offset:#x}+{length:#x}: {e}");
            1
        }
    }
}

/// Parse a decimal or 0x-prefixed hexadecimal integer.
fn parse_number(arg: &str) -> Option<u64> {
    match arg.strip_prefix("0x").or_else(|| arg.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => arg.parse().ok(),
    }
}
