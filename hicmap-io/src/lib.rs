//! Input and output for the hicmap pipeline.
//!
//! - **Record formats**: [`RecordFormat`] and [`ColumnSpec`] describe where the
//!   chromosome, position and value fields live in a contact-pair line
//! - **Loading**: [`load_contact_map`] streams a (possibly gzipped) pair file
//!   through a [`ContactMapBuilder`](hicmap_matrix::ContactMapBuilder)
//! - **Matrix files**: dense text and triplet text persistence of
//!   [`ContactMatrix`](hicmap_matrix::ContactMatrix) values

pub mod format;
pub mod loader;
pub mod matrix_file;

pub use format::{ColumnSpec, ContactRecord, RecordFormat, ValueColumn};
pub use loader::{load_contact_map, load_contact_map_from_reader, LoadConfig};
pub use matrix_file::{read_matrix, write_matrix, MatrixFormat};
