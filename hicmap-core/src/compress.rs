//! Gzip helpers with magic-byte detection.
//!
//! Contact-pair dumps and persisted matrices are frequently gzipped. Readers
//! in `hicmap-io` go through [`open_text`], which sniffs the first bytes of
//! the file and decodes transparently.

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use flate2::read::MultiGzDecoder;

use crate::{HicError, Result};

const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

/// Compress data using gzip at the given level (0–9).
pub fn gzip_compress(data: &[u8], level: u32) -> Result<Vec<u8>> {
    use flate2::write::GzEncoder;
    use flate2::Compression;

    let mut encoder = GzEncoder::new(Vec::new(), Compression::new(level));
    encoder
        .write_all(data)
        .map_err(|e| HicError::Compression(e.to_string()))?;
    encoder
        .finish()
        .map_err(|e| HicError::Compression(e.to_string()))
}

/// Whether `data` starts with the gzip magic bytes.
pub fn is_gzip(data: &[u8]) -> bool {
    data.len() >= 2 && data[..2] == GZIP_MAGIC
}

/// Open a text file for buffered line reading, decoding gzip when the file
/// starts with the gzip magic bytes. Concatenated gzip members are read
/// as one stream.
pub fn open_text(path: impl AsRef<Path>) -> Result<Box<dyn BufRead>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        HicError::Io(std::io::Error::new(
            e.kind(),
            format!("{}: {}", path.display(), e),
        ))
    })?;
    let mut reader = BufReader::new(file);
    let gz = is_gzip(reader.fill_buf()?);
    if gz {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(reader))))
    } else {
        Ok(Box::new(reader))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn compressed_output_has_magic() {
        let compressed = gzip_compress(b"chr1\t100\tchr1\t200\t3\n", 6).unwrap();
        assert!(is_gzip(&compressed));
    }

    #[test]
    fn open_text_reads_every_gzip_member() {
        let mut data = gzip_compress(b"1 2 3\n", 6).unwrap();
        data.extend(gzip_compress(b"4 5 6\n", 1).unwrap());
        let mut gz = NamedTempFile::new().unwrap();
        gz.write_all(&data).unwrap();
        gz.flush().unwrap();
        let lines: Vec<String> = open_text(gz.path())
            .unwrap()
            .lines()
            .map(|l| l.unwrap())
            .collect();
        assert_eq!(lines, vec!["1 2 3", "4 5 6"]);
    }

    #[test]
    fn plain_text_is_not_gzip() {
        assert!(!is_gzip(b"chr1"));
        assert!(!is_gzip(b""));
    }

    #[test]
    fn open_text_plain_and_gzip() {
        let content = "a b\nc d\n";

        let mut plain = NamedTempFile::new().unwrap();
        plain.write_all(content.as_bytes()).unwrap();
        plain.flush().unwrap();
        let lines: Vec<String> = open_text(plain.path())
            .unwrap()
            .lines()
            .map(|l| l.unwrap())
            .collect();
        assert_eq!(lines, vec!["a b", "c d"]);

        let mut gz = NamedTempFile::with_suffix(".gz").unwrap();
        gz.write_all(&gzip_compress(content.as_bytes(), 6).unwrap())
            .unwrap();
        gz.flush().unwrap();
        let lines: Vec<String> = open_text(gz.path())
            .unwrap()
            .lines()
            .map(|l| l.unwrap())
            .collect();
        assert_eq!(lines, vec!["a b", "c d"]);
    }

    #[test]
    fn open_text_missing_file() {
        assert!(matches!(
            open_text("/nonexistent/pairs.txt"),
            Err(HicError::Io(_))
        ));
    }
}
