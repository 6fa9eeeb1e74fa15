//! # DICOM RT ingest library
//!
//! This crate turns a directory tree of radiotherapy DICOM files into compact
//! binary+JSON datasets that a viewer can load without a DICOM parser.
//!
//! Built on the dicom-rs ecosystem, it walks a root directory, treats every
//! directory that directly holds `.dcm` files as one case and converts each
//! case's files:
//!  - CT slices become one `ct.bin` volume of little-endian `i16`, slices in
//!    descending patient z
//!  - RTDOSE grids become `<name>.bin` files of scaled little-endian `f32`
//!  - RTSTRUCT contours become `<name>.json` polygons in CT pixel space
//!
//! A `manifest.json` per case ties the artifacts to their geometry and
//! `cases.json` lists the converted cases. Only the header of each file is
//! read to classify it. Only the Modality and a handful of geometry and
//! scaling attributes are interpreted; anything unreadable is skipped
//! rather than failing the run.
//!
//! Runs are sequential and exclusive: the output workspace is wiped at the
//! start of every run and guarded by a lock file. Progress is pushed through
//! a non-blocking [`ProgressSink`].
//!
//! # Output layout
//!
//! ```text
//! temp_data/
//!   cases.json                 ["Patient001", "Patient001_2"]
//!   Patient001/
//!     manifest.json            {id, ct, doses, structs}
//!     ct.bin
//!     RD_plan_4500cGy.bin
//!     RS_plan.json
//! ```
//!
//! # Examples
//!
//! ## Converting a folder in the background
//!
//! Start the run on tokio's blocking pool and follow its progress events
//! until the terminal one arrives.
//!
//! ```no_run
//! # use dicom_rt_ingest::{ConvertConfig, Converter, ProgressEvent};
//! # use futures::StreamExt;
//! # use std::path::PathBuf;
//! # async fn convert() {
//! let (tx, mut rx) = futures::channel::mpsc::unbounded::<ProgressEvent>();
//! let converter = Converter::new(ConvertConfig::new("temp_data"));
//! let handle = converter.spawn(PathBuf::from("dicom"), tx);
//!
//! while let Some(event) = rx.next().await {
//!     match event {
//!         ProgressEvent::Progress(pct) => println!("{pct}%"),
//!         ProgressEvent::Finished(cases) => println!("converted {cases:?}"),
//!         ProgressEvent::NothingFound => println!("no DICOM found"),
//!         ProgressEvent::Failed => println!("conversion failed"),
//!     }
//! }
//! let report = handle.await.expect("worker should not be cancelled");
//! # }
//! ```

pub mod artifact;
mod attrs;
pub mod classifier;
pub mod config;
pub mod context;
pub mod converter;
pub mod dose;
pub mod enums;
pub mod error;
pub mod manifest;
pub mod progress;
pub mod scanner;
pub mod structure_set;
pub mod volume;
pub mod volume_loader;
pub mod workspace;

pub use attrs::AttrError;
pub use config::ConvertConfig;
pub use converter::{Converter, RunReport};
pub use enums::{Modality, VoxelType};
pub use error::{ConvertError, Skip, SkipReason};
pub use manifest::Manifest;
pub use progress::{NoProgress, ProgressEvent, ProgressSink};
