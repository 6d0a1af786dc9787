//! # pmeta-core — Foundational Packaging Types
//!
//! This crate defines the validated primitives that the metadata pipeline is
//! built on. Every other crate in the workspace depends on `pmeta-core`; it
//! depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtypes with validated constructors.** [`ProjectName`], [`ExtraName`],
//!    [`Version`], [`SpecifierSet`], [`Requirement`] and [`MarkerTree`] can only
//!    be obtained by parsing. A value of one of these types is always valid.
//!
//! 2. **One canonicalization function.** [`canonicalize_name`] is used for
//!    project names, extra declarations and every `extra` reference inside an
//!    environment marker. There is no second spelling of the rule.
//!
//! 3. **Canonical rendering.** `Display` on every type produces the normal
//!    form written into core metadata: PEP 440 normalized versions, sorted
//!    specifiers, markers with double-quoted values and normalized extras.
//!
//! 4. **Errors never echo input.** [`ParseError`] messages describe *what* is
//!    wrong and *where* (byte offset), never the offending text itself.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `pmeta-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

mod cursor;

pub mod error;
pub mod marker;
pub mod name;
pub mod requirement;
pub mod specifier;
pub mod version;

// Re-export primary types for ergonomic imports.
pub use error::ParseError;
pub use marker::{MarkerExpression, MarkerOperator, MarkerTree, MarkerValue, MarkerVariable};
pub use name::{canonicalize_name, is_valid_name, ExtraName, ProjectName};
pub use requirement::{Requirement, VersionOrUrl};
pub use specifier::{Operator, RequiresPython, Specifier, SpecifierSet};
pub use version::{PreRelease, PreReleaseKind, Version};
