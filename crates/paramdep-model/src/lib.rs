//! Declarative rules linking configuration parameters to one another.
//!
//! A [`ParameterList`] holds typed entries. A [`DependencySheet`] indexes
//! [`Dependency`] rules over those entries; each rule answers one question about
//! its dependents:
//!
//! - visual dependencies: is the entry currently shown?
//! - validator dependencies: which [`Validator`] currently governs it?
//! - array length dependencies: how long should the array be?
//!
//! Nothing here mutates entries in response to a rule. Callers ask, the rules answer.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use paramdep_model::{Dependency, DependencyKind, DependencySheet, ParameterList};
//!
//! let mut list = ParameterList::new("Solver");
//! let mode = list.set("mode", "auto").unwrap();
//! let threshold = list.set("threshold", 5.0).unwrap();
//!
//! let mut sheet = DependencySheet::new("Solver dependencies");
//! sheet.add_dependency(Arc::new(
//!     Dependency::new(
//!         DependencyKind::StringVisual {
//!             dependee: mode,
//!             values: vec!["manual".to_string()],
//!             show_if: false,
//!         },
//!         [threshold],
//!     )
//!     .unwrap(),
//! ));
//!
//! assert!(sheet.is_visible(&list, threshold).unwrap());
//! list.set_value(mode, "manual").unwrap();
//! assert!(!sheet.is_visible(&list, threshold).unwrap());
//! ```

pub mod condition;
pub mod dependency;
mod error;
pub mod function;
pub mod list;
pub mod sheet;
pub mod validator;
pub mod value;

pub use condition::Condition;
pub use dependency::{
    DependeeArity, Dependency, DependencyFamily, DependencyKind, ValueRange,
};
pub use error::{ModelError, Result};
pub use function::{FunctionOp, NumberFunction};
pub use list::{ConfigEntry, EntryKey, ParameterList};
pub use sheet::DependencySheet;
pub use validator::{
    ArrayValidator, EnhancedNumberValidator, FileNameValidator, StringEnumerationValidator,
    Validator,
};
pub use value::{ArrayValue, EntryValue, Number, NumberKind, ValueType};
