//! Core data types for address resolution.
//!
//! - [`QueryAddress`]: An address as supplied by a caller, every field optional
//! - [`ReferenceRecord`]: One gazetteer row with its normalized search keys
//! - [`RecordId`], [`Confidence`]: Record identity and result classification
//!
//! ## Gazetteer rows
//!
//! A gazetteer row covers one street of one settlement and lists the
//! buildings on it served by a single postal index:
//!
//! | Field | Example |
//! |-------|---------|
//! | region | Київська область |
//! | city | м. Київ |
//! | street | вул. Хрещатик |
//! | buildings | 1, 3, 5, 7/9 |
//! | postal index | 01001 |
//!
//! Matching compares **normalized** forms only; the raw columns are kept for
//! display.
//!
//! [`QueryAddress`]: address::QueryAddress
//! [`ReferenceRecord`]: record::ReferenceRecord
//! [`RecordId`]: types::RecordId
//! [`Confidence`]: types::Confidence

pub mod address;
pub mod record;
pub mod types;
