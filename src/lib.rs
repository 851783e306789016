//! DICOMweb extension for a data plane
//!
//! Moves DICOM instances between DICOMweb endpoints: a WADO-RS source
//! retrieves instances and a STOW-RS sink stores them in partitions.
//!
//! # Contents
//! - [`client`]: STOW-RS and WADO-RS requests with Basic authentication
//! - [`source`] and [`sink`]: the data-plane source, sink and their factories
//! - [`extension`]: registers both factories with a pipeline service
//! - [`runtime`]: a standalone host driven by a TOML [`config`]
//! - [`cli`]: the `dicomweb-dataplane` commands

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod extension;
pub mod logging;
pub mod multipart;
pub mod runtime;
pub mod schema;
pub mod sink;
pub mod source;

#[cfg(feature = "test-fixtures")]
pub mod testing;

pub use client::{Credentials, DicomWebClient};
pub use config::Config;
pub use error::{DicomWebError, Result};
pub use extension::DataPlaneDicomWebExtension;
pub use runtime::Runtime;
pub use sink::{DicomWebDataSink, DicomWebDataSinkFactory, DicomWebPartTransfer};
pub use source::{DicomWebDataSource, DicomWebDataSourceFactory, DicomWebPart};
