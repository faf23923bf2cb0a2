//! XML codec for parameter dependency rules.
//!
//! Entries and validators are referenced by integer surrogate IDs, never
//! inlined. A document is read in stages: validators and parameters first,
//! producing [`IdToValidatorMap`] and [`IdToEntryMap`], then every
//! `<Dependency>` element is resolved against those maps by the
//! [`ConverterRegistry`].
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use paramdep_model::{Dependency, DependencyKind, DependencySheet, ParameterList};
//! use paramdep_xml::{ReadOptions, from_str, to_string};
//!
//! let mut list = ParameterList::new("Solver");
//! let verbose = list.set("verbose", false).unwrap();
//! let log_file = list.set("log file", "solver.log").unwrap();
//! let mut sheet = DependencySheet::new("Solver dependencies");
//! sheet.add_dependency(Arc::new(
//!     Dependency::new(
//!         DependencyKind::BoolVisual { dependee: verbose, show_if: true },
//!         [log_file],
//!     )
//!     .unwrap(),
//! ));
//!
//! let xml = to_string(&list, &sheet).unwrap();
//! let document = from_str(&xml, &ReadOptions::default()).unwrap();
//! assert_eq!(document.sheet.len(), 1);
//! assert!(!document.sheet.is_visible(&document.list, log_file).unwrap());
//! ```

pub mod conditions;
pub mod dependencies;
pub mod document;
pub mod element;
mod error;
pub mod ids;
pub mod validators;

pub use dependencies::{ConverterRegistry, DependencyConverter, ReadContext, WriteContext};
pub use document::{
    Document, FailurePolicy, ReadOptions, SkippedDependency, from_str, read_document,
    read_document_with, read_file, to_string, write_document, write_document_with, write_file,
};
pub use element::XmlElement;
pub use error::{Reference, Result, XmlError};
pub use ids::{EntryIdMap, IdToEntryMap, IdToValidatorMap, ValidatorIdMap};
