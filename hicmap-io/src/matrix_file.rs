//! Persisted contact matrices.
//!
//! Two text encodings are supported, both readable from plain or gzipped
//! files and written gzipped when the path ends in `.gz`:
//!
//! - **Dense**: one whitespace-separated row per line.
//! - **Triplet**: a `#n\t<N>` header line, then one `row\tcol\tvalue` line
//!   per stored entry (0-based indices).
//!
//! Values are written with Rust's shortest round-trip float formatting, so
//! reading a written matrix reproduces it exactly.

use core::str::FromStr;
use std::fs::File;
use std::io::{BufRead, BufWriter, Write};
use std::path::Path;

use flate2::write::GzEncoder;
use flate2::Compression;

use hicmap_core::{compress, HicError, Result};
use hicmap_matrix::{ContactMatrix, DenseMatrix, Layout, SparseMatrix};

/// On-disk encoding of a contact matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MatrixFormat {
    Dense,
    Triplet,
}

impl FromStr for MatrixFormat {
    type Err = HicError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "dense" | "npy" => Ok(Self::Dense),
            "triplet" | "sparse" | "npz" => Ok(Self::Triplet),
            other => Err(HicError::Config(format!("unknown matrix format '{other}'"))),
        }
    }
}

/// Write `matrix` to `path`. A `.gz` extension selects gzip compression.
pub fn write_matrix(
    path: impl AsRef<Path>,
    matrix: &ContactMatrix,
    format: MatrixFormat,
) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| {
        HicError::Io(std::io::Error::new(
            e.kind(),
            format!("{}: {}", path.display(), e),
        ))
    })?;
    let gz = path.extension().map_or(false, |ext| ext == "gz");
    if gz {
        let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
        write_to(&mut encoder, matrix, format)?;
        encoder.finish()?.flush()?;
    } else {
        let mut writer = BufWriter::new(file);
        write_to(&mut writer, matrix, format)?;
        writer.flush()?;
    }
    log::debug!("wrote {}\u{00d7}{} matrix to {}", matrix.n(), matrix.n(), path.display());
    Ok(())
}

/// Read a matrix written in `format` from `path` and return it in `layout`.
pub fn read_matrix(
    path: impl AsRef<Path>,
    format: MatrixFormat,
    layout: Layout,
) -> Result<ContactMatrix> {
    let path = path.as_ref();
    let reader = compress::open_text(path)?;
    let matrix = match format {
        MatrixFormat::Dense => read_dense(reader).map(ContactMatrix::Dense),
        MatrixFormat::Triplet => read_triplets(reader).map(ContactMatrix::Sparse),
    }
    .map_err(|e| match e {
        HicError::Parse(msg) => HicError::Parse(format!("{}: {msg}", path.display())),
        other => other,
    })?;
    Ok(matrix.into_layout(layout))
}

fn write_to<W: Write>(writer: &mut W, matrix: &ContactMatrix, format: MatrixFormat) -> Result<()> {
    match format {
        MatrixFormat::Dense => write_dense(writer, &matrix.to_dense()),
        MatrixFormat::Triplet => write_triplets(writer, &matrix.to_sparse()),
    }
}

/// Write one whitespace-separated row per line.
pub fn write_dense<W: Write>(writer: &mut W, matrix: &DenseMatrix) -> Result<()> {
    for r in 0..matrix.n() {
        let mut first = true;
        for v in matrix.row(r) {
            if !first {
                writer.write_all(b" ")?;
            }
            write!(writer, "{v}")?;
            first = false;
        }
        writer.write_all(b"\n")?;
    }
    Ok(())
}

/// Write the `#n` header then one `row\tcol\tvalue` line per stored entry.
pub fn write_triplets<W: Write>(writer: &mut W, matrix: &SparseMatrix) -> Result<()> {
    writeln!(writer, "#n\t{}", matrix.n())?;
    for (r, c, v) in matrix.iter() {
        writeln!(writer, "{r}\t{c}\t{v}")?;
    }
    Ok(())
}

/// Read a dense matrix, one row per non-empty line.
pub fn read_dense<R: BufRead>(reader: R) -> Result<DenseMatrix> {
    let mut rows = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let row = line
            .split_whitespace()
            .map(|field| {
                field.parse::<f64>().map_err(|_| {
                    HicError::Parse(format!("line {}: invalid value '{field}'", idx + 1))
                })
            })
            .collect::<Result<Vec<f64>>>()?;
        rows.push(row);
    }
    DenseMatrix::from_rows(rows).map_err(|e| match e {
        HicError::InvalidInput(msg) => HicError::Parse(msg),
        other => other,
    })
}

/// Read a triplet matrix. The `#n` header is required.
pub fn read_triplets<R: BufRead>(reader: R) -> Result<SparseMatrix> {
    let mut n: Option<usize> = None;
    let mut rows = Vec::new();
    let mut cols = Vec::new();
    let mut values = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        let line_num = idx + 1;
        if line.is_empty() {
            continue;
        }
        if let Some(header) = line.strip_prefix("#n") {
            let size = header.trim().parse().map_err(|_| {
                HicError::Parse(format!("line {line_num}: invalid size header '{line}'"))
            })?;
            n = Some(size);
            continue;
        }
        if line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != 3 {
            return Err(HicError::Parse(format!(
                "line {line_num}: expected 3 columns (row, col, value), found {}",
                fields.len()
            )));
        }
        let index = |field: &str| -> Result<usize> {
            field
                .parse()
                .map_err(|_| HicError::Parse(format!("line {line_num}: invalid index '{field}'")))
        };
        rows.push(index(fields[0])?);
        cols.push(index(fields[1])?);
        values.push(fields[2].parse::<f64>().map_err(|_| {
            HicError::Parse(format!("line {line_num}: invalid value '{}'", fields[2]))
        })?);
    }

    let n = n.ok_or_else(|| HicError::Parse("missing '#n <size>' header".into()))?;
    SparseMatrix::from_triplets(rows, cols, values, n).map_err(|e| match e {
        HicError::InvalidInput(msg) => HicError::Parse(msg),
        other => other,
    })
}
