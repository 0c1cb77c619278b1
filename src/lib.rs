//! # zipkit Core Library
//!
//! Packs files and directory trees into ZIP archives and unpacks them again.
//!
//! ## Key Modules
//!
//! - [`compress`]: Opens inputs and walks directories into a ZIP writer.
//! - [`extract`]: Expands archives, with or without legacy name decoding and progress.
//! - [`archive`]: Entry metadata and GB18030 name decoding.
//! - [`progress`]: Per-entry progress callbacks.
//! - [`fsx`]: Permission-aware filesystem helpers.
//!
//! ## Examples
//!
//! ```no_run
//! use zipkit::{compress_paths, extract_with_progress};
//!
//! # fn main() -> zipkit::Result<()> {
//! compress_paths(&["a.txt", "docs"], "out.zip")?;
//!
//! let mut report = |total: usize, index: usize| println!("{}/{}", index + 1, total);
//! extract_with_progress("out.zip", "restored", Some(&mut report))?;
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod common;
pub mod compress;
pub mod error;
pub mod extract;
pub mod progress;

// Cross-platform filesystem wrapper
pub mod fsx;

pub use archive::{ArchiveEntry, EntryName};
pub use common::SourceEntry;
pub use compress::{compress_files, compress_files_with, compress_paths, open_all, CompressOptions, CompressionAlgo};
pub use error::{ArchiverError, Result};
pub use extract::{extract_all, extract_with_progress, list_entries};
