//! # refbook-codegen
//!
//! Renders model types for resolved sheets: a Go struct or a C# class per
//! sheet, one field per exportable column.

mod error;
mod generator;
pub mod naming;
mod options;

pub use error::{GenerateError, GenerateResult};
pub use generator::{build_generator, CsharpGenerator, Generator, GoGenerator};
pub use options::{GenerateOptions, Language};
