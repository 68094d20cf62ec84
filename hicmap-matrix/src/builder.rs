//! Binning of position-pair contacts into a symmetric contact matrix.
//!
//! [`ContactMapBuilder`] accumulates `(pos1, pos2, value)` observations into
//! bins of a fixed resolution. When the end of the region is known the
//! matrix size is fixed up front; otherwise the builder grows its buffer by
//! doubling as larger bins arrive and truncates to the largest observed bin
//! on [`finish`](ContactMapBuilder::finish).

use std::collections::BTreeMap;

use hicmap_core::{HicError, Result};

use crate::contact::{ContactMatrix, Layout};
use crate::dense::DenseMatrix;
use crate::sparse::SparseMatrix;

/// Diagonal weight given to every bin so no bin is isolated.
pub const SELF_LOOP_WEIGHT: f64 = f64::EPSILON;

/// Initial side length of the dense buffer when the region end is unknown.
const DEFAULT_CAPACITY: usize = 64;

/// Region and resolution of the matrix being built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BinningConfig {
    /// Bin width in base pairs.
    pub resolution: u64,
    /// First position of the region (inclusive).
    pub start: u64,
    /// End of the region (exclusive), or `None` when unknown.
    pub end: Option<u64>,
}

impl Default for BinningConfig {
    fn default() -> Self {
        Self {
            resolution: 10_000,
            start: 0,
            end: None,
        }
    }
}

impl BinningConfig {
    pub fn validate(&self) -> Result<()> {
        if self.resolution == 0 {
            return Err(HicError::Config("resolution must be positive".into()));
        }
        if let Some(end) = self.end {
            if end <= self.start {
                return Err(HicError::Config(format!(
                    "region end ({end}) must be greater than start ({})",
                    self.start
                )));
            }
        }
        Ok(())
    }

    /// Number of bins when the end is known: `ceil((end - start) / resolution)`.
    pub fn fixed_size(&self) -> Option<usize> {
        self.end
            .map(|end| ((end - self.start) + self.resolution - 1) / self.resolution)
            .map(|n| n as usize)
    }

    /// Bin index of `pos`, or `None` if it falls outside the region.
    pub fn bin(&self, pos: u64) -> Option<usize> {
        if pos < self.start || self.end.map_or(false, |end| pos >= end) {
            return None;
        }
        Some(((pos - self.start) / self.resolution) as usize)
    }
}

/// A square dense buffer whose side doubles when a bin overflows it.
#[derive(Debug)]
struct DenseArena {
    data: Vec<f64>,
    capacity: usize,
}

impl DenseArena {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            data: vec![0.0; capacity * capacity],
            capacity,
        }
    }

    fn ensure(&mut self, bin: usize) {
        if bin < self.capacity {
            return;
        }
        let mut capacity = self.capacity.max(1);
        while bin >= capacity {
            capacity *= 2;
        }
        log::debug!("growing contact buffer from {} to {capacity} bins", self.capacity);
        let mut data = vec![0.0; capacity * capacity];
        for r in 0..self.capacity {
            let old = &self.data[r * self.capacity..(r + 1) * self.capacity];
            data[r * capacity..r * capacity + self.capacity].copy_from_slice(old);
        }
        self.data = data;
        self.capacity = capacity;
    }

    fn add(&mut self, row: usize, col: usize, value: f64) {
        self.data[row * self.capacity + col] += value;
    }

    /// Copy the leading `n × n` block out as a dense matrix.
    fn truncate(self, n: usize) -> DenseMatrix {
        if n == self.capacity {
            return DenseMatrix::from_vec_unchecked(n, self.data);
        }
        let mut data = Vec::with_capacity(n * n);
        for r in 0..n {
            data.extend_from_slice(&self.data[r * self.capacity..r * self.capacity + n]);
        }
        DenseMatrix::from_vec_unchecked(n, data)
    }
}

#[derive(Debug)]
enum Accumulator {
    Dense(DenseArena),
    Sparse(BTreeMap<(usize, usize), f64>),
}

/// Streaming builder for a [`ContactMatrix`].
#[derive(Debug)]
pub struct ContactMapBuilder {
    config: BinningConfig,
    layout: Layout,
    acc: Accumulator,
    max_bin: Option<usize>,
    kept: u64,
    seen: u64,
}

impl ContactMapBuilder {
    /// Create a builder producing a matrix in `layout`.
    pub fn new(config: BinningConfig, layout: Layout) -> Result<Self> {
        config.validate()?;
        let acc = match layout {
            Layout::Dense => Accumulator::Dense(DenseArena::with_capacity(
                config.fixed_size().unwrap_or(DEFAULT_CAPACITY),
            )),
            Layout::Sparse => Accumulator::Sparse(BTreeMap::new()),
        };
        Ok(Self {
            config,
            layout,
            acc,
            max_bin: None,
            kept: 0,
            seen: 0,
        })
    }

    /// Records offered so far.
    pub fn seen(&self) -> u64 {
        self.seen
    }

    /// Records that fell inside the region and were binned.
    pub fn kept(&self) -> u64 {
        self.kept
    }

    /// Bin one contact. Returns `false` if either position lies outside the
    /// region and the record was discarded.
    pub fn push(&mut self, pos1: u64, pos2: u64, value: f64) -> bool {
        self.seen += 1;
        let (b1, b2) = match (self.config.bin(pos1), self.config.bin(pos2)) {
            (Some(b1), Some(b2)) => (b1, b2),
            _ => return false,
        };
        let hi = b1.max(b2);
        self.max_bin = Some(self.max_bin.map_or(hi, |m| m.max(hi)));

        match &mut self.acc {
            Accumulator::Dense(arena) => {
                arena.ensure(hi);
                arena.add(b1, b2, value);
                if b1 != b2 {
                    arena.add(b2, b1, value);
                }
            }
            Accumulator::Sparse(map) => {
                *map.entry((b1, b2)).or_insert(0.0) += value;
                if b1 != b2 {
                    *map.entry((b2, b1)).or_insert(0.0) += value;
                }
            }
        }
        self.kept += 1;
        true
    }

    /// Final number of bins: the fixed region size, or the largest observed
    /// bin plus one when the end is unknown.
    pub fn size(&self) -> usize {
        self.config
            .fixed_size()
            .unwrap_or_else(|| self.max_bin.map_or(0, |m| m + 1))
    }

    /// Finish construction, seeding every diagonal with [`SELF_LOOP_WEIGHT`].
    pub fn finish(self) -> ContactMatrix {
        let n = self.size();
        let matrix = match self.acc {
            Accumulator::Dense(arena) => {
                let mut dense = arena.truncate(n);
                for i in 0..n {
                    dense.add(i, i, SELF_LOOP_WEIGHT);
                }
                ContactMatrix::Dense(dense)
            }
            Accumulator::Sparse(mut map) => {
                for i in 0..n {
                    *map.entry((i, i)).or_insert(0.0) += SELF_LOOP_WEIGHT;
                }
                let mut rows = Vec::with_capacity(map.len());
                let mut cols = Vec::with_capacity(map.len());
                let mut values = Vec::with_capacity(map.len());
                for ((r, c), v) in map {
                    rows.push(r);
                    cols.push(c);
                    values.push(v);
                }
                ContactMatrix::Sparse(SparseMatrix::from_sorted_unchecked(rows, cols, values, n))
            }
        };
        debug_assert_eq!(matrix.layout(), self.layout);
        matrix
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn records() -> impl Strategy<Value = Vec<(u64, u64, f64)>> {
        proptest::collection::vec((0u64..1_000, 0u64..1_000, 0.0f64..100.0), 0..60)
    }

    proptest! {
        #[test]
        fn output_is_symmetric_and_non_negative(
            recs in records(),
            resolution in 1u64..200,
            dense in any::<bool>(),
            fixed in any::<bool>(),
        ) {
            let config = BinningConfig {
                resolution,
                start: 0,
                end: if fixed { Some(1_000) } else { None },
            };
            let layout = if dense { Layout::Dense } else { Layout::Sparse };
            let mut b = ContactMapBuilder::new(config, layout).unwrap();
            for &(p1, p2, v) in &recs {
                b.push(p1, p2, v);
            }
            let m = b.finish().to_dense();
            let n = m.n();
            for r in 0..n {
                for c in 0..n {
                    prop_assert!(m[(r, c)] >= 0.0);
                    prop_assert_eq!(m[(r, c)], m[(c, r)]);
                }
            }
        }

        #[test]
        fn total_mass_is_preserved(recs in records(), resolution in 1u64..200) {
            let config = BinningConfig { resolution, start: 0, end: Some(1_000) };
            let mut b = ContactMapBuilder::new(config, Layout::Sparse).unwrap();
            let mut expected = 0.0;
            for &(p1, p2, v) in &recs {
                b.push(p1, p2, v);
                let off = config.bin(p1) != config.bin(p2);
                expected += if off { 2.0 * v } else { v };
            }
            let m = b.finish();
            let n = m.n() as f64;
            let total: f64 = m.row_sums().iter().sum();
            prop_assert!((total - expected - n * SELF_LOOP_WEIGHT).abs() < 1e-6);
        }
    }
}
