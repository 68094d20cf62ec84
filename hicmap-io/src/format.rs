//! Column layouts of contact-pair text records.
//!
//! A contact-pair line is a whitespace-separated list of fields. A
//! [`ColumnSpec`] names the 1-based columns holding the two chromosomes, the
//! two positions and the contact value. The named [`RecordFormat`]s are
//! shorthands for the common layouts:
//!
//! | name      | chrom1 | pos1 | chrom2 | pos2 | value          |
//! |-----------|--------|------|--------|------|----------------|
//! | `short`   | –      | 2    | –      | 3    | 4 if present   |
//! | `long`    | 2      | 3    | 4      | 5    | 6              |
//! | `noscore` | 2      | 3    | 4      | 5    | 1              |

use core::fmt;
use core::str::FromStr;

use hicmap_core::{HicError, Result};

/// Where the contact value of a record comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ValueColumn {
    /// Every record counts as one contact.
    Unit,
    /// The value is in this column; lines without it are malformed.
    Column(usize),
    /// The value is in this column when the line has it, otherwise 1.
    Optional(usize),
}

/// 1-based column positions of the fields of a contact record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ColumnSpec {
    pub chrom1: Option<usize>,
    pub pos1: usize,
    pub chrom2: Option<usize>,
    pub pos2: usize,
    pub value: ValueColumn,
}

/// One decoded contact record, borrowing chromosome names from the line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactRecord<'a> {
    pub chrom1: Option<&'a str>,
    pub pos1: u64,
    pub chrom2: Option<&'a str>,
    pub pos2: u64,
    pub value: f64,
}

impl ColumnSpec {
    /// Build a spec from 4 or 5 column indices in the order
    /// `chrom1, pos1, chrom2, pos2[, value]`.
    ///
    /// A chromosome index of 0 marks the column as absent. With 4 indices
    /// every record counts as one contact.
    pub fn from_indices(indices: &[usize]) -> Result<Self> {
        if indices.len() != 4 && indices.len() != 5 {
            return Err(HicError::Config(format!(
                "custom format needs 4 or 5 column indices, got {}",
                indices.len()
            )));
        }
        let optional = |i: usize| if i == 0 { None } else { Some(i) };
        let chrom1 = optional(indices[0]);
        let chrom2 = optional(indices[2]);
        if chrom1.is_some() != chrom2.is_some() {
            return Err(HicError::Config(
                "custom format must give both chromosome columns or neither".into(),
            ));
        }
        let (pos1, pos2) = (indices[1], indices[3]);
        if pos1 == 0 || pos2 == 0 {
            return Err(HicError::Config(
                "custom format position columns are 1-based and must be non-zero".into(),
            ));
        }
        let value = match indices.get(4) {
            None | Some(0) => ValueColumn::Unit,
            Some(&v) => ValueColumn::Column(v),
        };
        Ok(Self {
            chrom1,
            pos1,
            chrom2,
            pos2,
            value,
        })
    }

    /// Whether records carry chromosome tags that can be filtered on.
    pub fn has_chromosomes(&self) -> bool {
        self.chrom1.is_some() && self.chrom2.is_some()
    }

    /// Number of fields a line must have to be decodable.
    pub fn required_columns(&self) -> usize {
        let value = match self.value {
            ValueColumn::Column(c) => c,
            ValueColumn::Unit | ValueColumn::Optional(_) => 0,
        };
        [
            self.chrom1.unwrap_or(0),
            self.pos1,
            self.chrom2.unwrap_or(0),
            self.pos2,
            value,
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
    }

    /// Decode one line. `line_num` is 1-based and only used in messages.
    ///
    /// A line with too few fields is a [`HicError::Config`]: the configured
    /// format does not describe the input. Unparsable or negative fields are
    /// [`HicError::Parse`].
    pub fn decode<'a>(&self, line: &'a str, line_num: usize) -> Result<ContactRecord<'a>> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let required = self.required_columns();
        if fields.len() < required {
            return Err(HicError::Config(format!(
                "line {line_num}: format needs at least {required} columns, found {}",
                fields.len()
            )));
        }

        let pos = |col: usize, name: &str| -> Result<u64> {
            let field = fields[col - 1];
            field.parse().map_err(|_| {
                HicError::Parse(format!("line {line_num}: invalid {name} '{field}'"))
            })
        };
        let pos1 = pos(self.pos1, "pos1")?;
        let pos2 = pos(self.pos2, "pos2")?;

        let value_col = match self.value {
            ValueColumn::Unit => None,
            ValueColumn::Column(c) => Some(c),
            ValueColumn::Optional(c) => (fields.len() >= c).then_some(c),
        };
        let value = match value_col {
            None => 1.0,
            Some(c) => {
                let field = fields[c - 1];
                let v: f64 = field.parse().map_err(|_| {
                    HicError::Parse(format!("line {line_num}: invalid value '{field}'"))
                })?;
                if !v.is_finite() || v < 0.0 {
                    return Err(HicError::Parse(format!(
                        "line {line_num}: contact value must be finite and non-negative, got {v}"
                    )));
                }
                v
            }
        };

        Ok(ContactRecord {
            chrom1: self.chrom1.map(|c| fields[c - 1]),
            pos1,
            chrom2: self.chrom2.map(|c| fields[c - 1]),
            pos2,
            value,
        })
    }
}

impl FromStr for ColumnSpec {
    type Err = HicError;

    /// Parse `"2356"` (one digit per column) or `"2,3,5,6"`.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let indices: Vec<usize> = if s.contains(',') {
            s.split(',')
                .map(|p| {
                    p.trim()
                        .parse()
                        .map_err(|_| HicError::Config(format!("invalid column index '{p}'")))
                })
                .collect::<Result<_>>()?
        } else {
            s.chars()
                .map(|ch| {
                    ch.to_digit(10)
                        .map(|d| d as usize)
                        .ok_or_else(|| HicError::Config(format!("invalid column index '{ch}'")))
                })
                .collect::<Result<_>>()?
        };
        Self::from_indices(&indices)
    }
}

/// A named or custom contact-pair record layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RecordFormat {
    #[default]
    Short,
    Long,
    NoScore,
    Custom(ColumnSpec),
}

impl RecordFormat {
    pub fn columns(&self) -> ColumnSpec {
        match self {
            Self::Short => ColumnSpec {
                chrom1: None,
                pos1: 2,
                chrom2: None,
                pos2: 3,
                value: ValueColumn::Optional(4),
            },
            Self::Long => ColumnSpec {
                chrom1: Some(2),
                pos1: 3,
                chrom2: Some(4),
                pos2: 5,
                value: ValueColumn::Column(6),
            },
            Self::NoScore => ColumnSpec {
                chrom1: Some(2),
                pos1: 3,
                chrom2: Some(4),
                pos2: 5,
                value: ValueColumn::Unit,
            },
            Self::Custom(spec) => *spec,
        }
    }
}

impl FromStr for RecordFormat {
    type Err = HicError;

    /// Named formats are matched case-insensitively. `custom:<indices>`
    /// builds a [`ColumnSpec`] from the indices.
    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_ascii_lowercase();
        match lower.as_str() {
            "short" => Ok(Self::Short),
            "long" => Ok(Self::Long),
            "noscore" => Ok(Self::NoScore),
            other => match other.strip_prefix("custom:") {
                Some(indices) => Ok(Self::Custom(indices.parse()?)),
                None => Err(HicError::Config(format!("unrecognized record format '{s}'"))),
            },
        }
    }
}

impl fmt::Display for RecordFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Short => f.write_str("short"),
            Self::Long => f.write_str("long"),
            Self::NoScore => f.write_str("noscore"),
            Self::Custom(spec) => {
                let c = |i: Option<usize>| i.unwrap_or(0);
                write!(f, "custom:{},{},{},{}", c(spec.chrom1), spec.pos1, c(spec.chrom2), spec.pos2)?;
                match spec.value {
                    ValueColumn::Unit => Ok(()),
                    ValueColumn::Column(v) | ValueColumn::Optional(v) => write!(f, ",{v}"),
                }
            }
        }
    }
}
