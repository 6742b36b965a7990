//! Convert the ApiPort breaking-change documents into a single JSON file.
//!
//! The documentation repository holds one markdown document per breaking change, all
//! written against the same template. This crate checks the repository out, extracts a
//! [`BreakingChange`] record from every document and writes the records as a JSON array.
//!
//! # Example
//!
//! ```no_run
//! use apiport2json::{Config, Converter, GitSource};
//!
//! let config = Config::default().with_env()?;
//! let summary = Converter::new(config).run(&GitSource::default())?;
//! println!("wrote {} records", summary.written);
//! # Ok::<(), apiport2json::AppError>(())
//! ```

pub mod config;
pub mod convert;
pub mod emit;
pub mod error;
pub mod model;
pub mod parser;
pub mod source;

pub use config::{Config, MalformedPolicy};
pub use convert::{ConversionSummary, Converter};
pub use error::AppError;
pub use model::BreakingChange;
pub use parser::{parse_breaking_change, ParseError, TemplateParser};
pub use source::{Checkout, DocumentSource, GitSource};
