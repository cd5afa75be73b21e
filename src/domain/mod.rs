//! Domain models and types for redcap-export.
//!
//! This module contains the core domain model of the crate: the validated
//! [`ParameterSet`] describing one export request, the enumerations its
//! fields draw from, and the error taxonomy every other layer reports in.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Request description** ([`ParameterSet`], [`ParameterSetBuilder`],
//!   [`WireValue`])
//! - **Enumerated parameters** ([`ExportContent`], [`ExportFormat`],
//!   [`RecordType`], [`LabelMode`])
//! - **Error types** ([`RedcapError`], [`ValidationError`], [`ExportError`],
//!   [`TransportError`])
//! - **Result type alias** ([`Result`])
//!
//! # Construction-time validation
//!
//! Every enumerated field is checked when a [`ParameterSet`] is built, so
//! an out-of-range value can never reach the transport layer:
//!
//! ```
//! use redcap_export::domain::{ExportContent, ExportFormat, ParameterSet};
//!
//! let err = ParameterSet::builder()
//!     .token("ABC")
//!     .content(ExportContent::Record)
//!     .format(ExportFormat::Csv)
//!     // no record type supplied
//!     .build()
//!     .unwrap_err();
//!
//! assert_eq!(err.field, "type");
//! ```

pub mod errors;
pub mod params;
pub mod result;

// Re-export commonly used types for convenience
pub use errors::{ExportError, RedcapError, TransportError, ValidationError};
pub use params::{
    ExportContent, ExportFormat, LabelMode, ParameterSet, ParameterSetBuilder, RecordType,
    WireValue,
};
pub use result::Result;
