//! Loading a contact map from a contact-pair text file.
//!
//! Lines are decoded with the configured [`RecordFormat`], filtered by
//! chromosome and region, and binned by a
//! [`ContactMapBuilder`]. Gzipped input is detected from its magic bytes.

use std::io::BufRead;
use std::path::Path;

use hicmap_core::{compress, HicError, Result};
use hicmap_matrix::{BinningConfig, ContactMapBuilder, ContactMatrix, Layout};

use crate::format::RecordFormat;

const PROGRESS_INTERVAL: usize = 100_000;

/// Everything needed to turn a pair file into a contact matrix.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LoadConfig {
    pub format: RecordFormat,
    /// Skip the first line of the input.
    pub header: bool,
    /// Keep only intra-chromosomal contacts on this chromosome. Required for
    /// formats with chromosome columns, ignored for the others.
    pub chromosome: Option<String>,
    pub binning: BinningConfig,
    pub layout: Layout,
}

impl LoadConfig {
    /// Config for `format` at `resolution` over the whole chromosome.
    pub fn new(format: RecordFormat, resolution: u64) -> Self {
        Self {
            format,
            binning: BinningConfig {
                resolution,
                ..BinningConfig::default()
            },
            ..Self::default()
        }
    }

    pub fn with_chromosome(mut self, chromosome: impl Into<String>) -> Self {
        self.chromosome = Some(chromosome.into());
        self
    }

    /// Restrict to `[start, end)`; `end = None` extends to the last contact.
    pub fn with_region(mut self, start: u64, end: Option<u64>) -> Self {
        self.binning.start = start;
        self.binning.end = end;
        self
    }

    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_header(mut self, header: bool) -> Self {
        self.header = header;
        self
    }
}

/// Load the contact matrix of one chromosome (or part of one) from a pair
/// file, plain or gzipped.
pub fn load_contact_map(path: impl AsRef<Path>, config: &LoadConfig) -> Result<ContactMatrix> {
    let path = path.as_ref();
    log::info!(
        "loading {} contacts from {} at {} bp resolution",
        config.format,
        path.display(),
        config.binning.resolution
    );
    let reader = compress::open_text(path)?;
    load_lines(reader, config).map_err(|e| match e {
        HicError::Config(msg) => HicError::Config(format!("{}: {msg}", path.display())),
        HicError::Parse(msg) => HicError::Parse(format!("{}: {msg}", path.display())),
        other => other,
    })
}

/// Load a contact matrix from any buffered reader of pair lines.
pub fn load_contact_map_from_reader<R: BufRead>(
    reader: R,
    config: &LoadConfig,
) -> Result<ContactMatrix> {
    load_lines(reader, config)
}

fn load_lines<R: BufRead>(reader: R, config: &LoadConfig) -> Result<ContactMatrix> {
    let spec = config.format.columns();
    let mut builder = ContactMapBuilder::new(config.binning, config.layout)?;

    let chromosome = config.chromosome.as_deref().filter(|_| spec.has_chromosomes());
    if spec.has_chromosomes() && chromosome.is_none() {
        return Err(HicError::Config(format!(
            "format {} has chromosome columns; a chromosome must be requested",
            config.format
        )));
    }

    let mut records = 0usize;
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if idx == 0 && config.header {
            continue;
        }
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let record = spec.decode(trimmed, idx + 1)?;
        records += 1;
        if records % PROGRESS_INTERVAL == 0 {
            log::debug!("line {}: {records} records read", idx + 1);
        }

        if let Some(chrom) = chromosome {
            if record.chrom1 != Some(chrom) || record.chrom2 != Some(chrom) {
                continue;
            }
        }
        builder.push(record.pos1, record.pos2, record.value);
    }

    log::info!(
        "binned {} of {records} records into {} bins",
        builder.kept(),
        builder.size()
    );
    Ok(builder.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hicmap_matrix::builder::SELF_LOOP_WEIGHT;
    use std::io::{Cursor, Write};
    use tempfile::NamedTempFile;

    const LONG: &str = "\
r1 chr1 100 chr1 1200 2
r2 chr1 1100 chr1 150 1
r3 chr2 100 chr2 200 5
r4 chr1 2500 chr1 2500 3
r5 chr1 100 chr2 100 9
";

    fn write_pairs(content: &[u8], suffix: &str) -> NamedTempFile {
        let mut file = NamedTempFile::with_suffix(suffix).unwrap();
        file.write_all(content).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn long_format_filters_chromosome() {
        let config = LoadConfig::new(RecordFormat::Long, 1000)
            .with_chromosome("chr1")
            .with_region(0, Some(3000))
            .with_layout(Layout::Dense);
        let m = load_contact_map_from_reader(Cursor::new(LONG), &config).unwrap();
        assert_eq!(m.n(), 3);
        assert_eq!(m.get(0, 1), Some(3.0));
        assert_eq!(m.get(1, 0), Some(3.0));
        assert_eq!(m.get(2, 2), Some(3.0 + SELF_LOOP_WEIGHT));
        assert_eq!(m.get(0, 0), Some(SELF_LOOP_WEIGHT));
    }

    #[test]
    fn unknown_end_grows_to_last_bin() {
        let config = LoadConfig::new(RecordFormat::Long, 1000).with_chromosome("chr1");
        let m = load_contact_map_from_reader(Cursor::new(LONG), &config).unwrap();
        assert_eq!(m.layout(), Layout::Sparse);
        assert_eq!(m.n(), 3);
    }

    #[test]
    fn region_start_offsets_bins() {
        let config = LoadConfig::new(RecordFormat::Long, 1000)
            .with_chromosome("chr1")
            .with_region(1000, Some(3000));
        let m = load_contact_map_from_reader(Cursor::new(LONG), &config).unwrap();
        assert_eq!(m.n(), 2);
        // only r4 falls fully inside [1000, 3000)
        assert_eq!(m.get(1, 1), Some(3.0 + SELF_LOOP_WEIGHT));
        assert_eq!(m.get(0, 1), Some(0.0));
    }

    #[test]
    fn custom_format_with_header() {
        let data = "pos_a\tpos_b\tcount\n10\t25\t4\n# comment\n\n30\t30\t1\n";
        let config = LoadConfig::new(RecordFormat::Custom("0,1,0,2,3".parse().unwrap()), 10)
            .with_header(true)
            .with_layout(Layout::Dense);
        let m = load_contact_map_from_reader(Cursor::new(data), &config).unwrap();
        assert_eq!(m.n(), 4);
        assert_eq!(m.get(1, 2), Some(4.0));
        assert_eq!(m.get(3, 3), Some(1.0 + SELF_LOOP_WEIGHT));
    }

    #[test]
    fn short_format_counts_unit_contacts() {
        let data = "a 5 15\na 5 15\na 15 15 2.5\n";
        let config = LoadConfig::new(RecordFormat::Short, 10).with_layout(Layout::Dense);
        let m = load_contact_map_from_reader(Cursor::new(data), &config).unwrap();
        assert_eq!(m.get(0, 1), Some(2.0));
        assert_eq!(m.get(1, 1), Some(2.5 + SELF_LOOP_WEIGHT));
    }

    #[test]
    fn malformed_line_is_fatal() {
        let data = "r1 chr1 100 chr1 200 1\nr2 chr1 100\n";
        let config = LoadConfig::new(RecordFormat::Long, 100).with_chromosome("chr1");
        let err = load_contact_map_from_reader(Cursor::new(data), &config).unwrap_err();
        assert!(matches!(err, HicError::Config(_)));
    }

    #[test]
    fn bad_resolution_is_config_error() {
        let config = LoadConfig::new(RecordFormat::Long, 0);
        assert!(matches!(
            load_contact_map_from_reader(Cursor::new(LONG), &config),
            Err(HicError::Config(_))
        ));
    }

    #[test]
    fn chromosome_columns_need_a_chromosome() {
        let config = LoadConfig::new(RecordFormat::Long, 1000);
        assert!(matches!(
            load_contact_map_from_reader(Cursor::new(LONG), &config),
            Err(HicError::Config(_))
        ));
        let custom = LoadConfig::new(RecordFormat::Custom("2356".parse().unwrap()), 1000);
        assert!(matches!(
            load_contact_map_from_reader(Cursor::new(LONG), &custom),
            Err(HicError::Config(_))
        ));
        // short carries no chromosome columns, so a requested one is ignored
        let short = LoadConfig::new(RecordFormat::Short, 10).with_chromosome("chr1");
        assert!(load_contact_map_from_reader(Cursor::new("a 5 15\n"), &short).is_ok());
    }

    #[test]
    fn loads_plain_and_gzip_files() {
        let config = LoadConfig::new(RecordFormat::Long, 1000)
            .with_chromosome("chr1")
            .with_region(0, Some(3000));

        let plain = write_pairs(LONG.as_bytes(), ".txt");
        let from_plain = load_contact_map(plain.path(), &config).unwrap();

        let gz = write_pairs(&compress::gzip_compress(LONG.as_bytes(), 6).unwrap(), ".txt.gz");
        let from_gz = load_contact_map(gz.path(), &config).unwrap();

        assert_eq!(from_plain, from_gz);
        assert_eq!(from_plain.get(0, 1), Some(3.0));
    }

    #[test]
    fn file_errors_name_the_path() {
        let file = write_pairs(b"r1 chr1 100\n", ".txt");
        let config = LoadConfig::new(RecordFormat::Long, 1000).with_chromosome("chr1");
        let err = load_contact_map(file.path(), &config).unwrap_err();
        assert!(err.to_string().contains(&file.path().display().to_string()));

        assert!(matches!(
            load_contact_map("/nonexistent/pairs.txt", &config),
            Err(HicError::Io(_))
        ));
    }
}
