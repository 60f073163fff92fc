#![forbid(unsafe_code)]
//! # qrsymbols
//!
//! A Rust library for encoding text into QR Code symbols with structured
//! append and device-independent bitmap output.
//!
//! `qrsymbols` implements the QR Code Model 2 specification (JIS X 0510 /
//! ISO/IEC 18004): versions 1 to 40, all four error correction levels, and
//! the numeric, alphanumeric, 8-bit-byte and Kanji encoding modes. Text is
//! appended character by character with greedy mode selection; when a
//! symbol overflows its version ceiling and structured append is enabled,
//! the input spills into a sequence of up to 16 linked symbols that
//! readers reassemble into the original string.
//!
//! ## Features
//!
//! - **Encoding Modes**: Numeric, alphanumeric, byte (configurable
//!   character set) and Kanji (Shift-JIS), selected greedily per
//!   character.
//! - **Error Correction**: Reed-Solomon over GF(2⁸) at levels Low,
//!   Medium, Quartile and High.
//! - **Structured Append**: Long inputs split across up to 16 symbols
//!   with the standard parity byte.
//! - **Output Formats**: Module matrices, monochrome and 24-bit BMP
//!   (DIB) bytes, in-memory images, console ASCII art, and SVG.
//! - **Safety**: Pure Rust implementation with no unsafe code.
//!
//! ## Installation
//!
//! Add the following to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! qrsymbols = "0.1" # Replace with the latest version
//! ```
//!
//! ## Examples
//!
//! Encode a string and save it as a bitmap:
//!
//! ```rust,no_run
//! use qrsymbols::{ErrorCorrectionLevel, Symbols};
//!
//! fn main() -> Result<(), qrsymbols::Error> {
//!     let mut symbols = Symbols::with_options(
//!         ErrorCorrectionLevel::Medium,
//!         40,    // maximum version
//!         false, // structured append
//!         "ISO-8859-1",
//!     )?;
//!     symbols.append_string("Hello, World!")?;
//!     symbols.get(0).save_1bpp_dib("hello.bmp", Some(4), None, None)?;
//!     Ok(())
//! }
//! ```
//!
//! Split a long payload across several symbols:
//!
//! ```rust
//! use qrsymbols::{ErrorCorrectionLevel, Symbols};
//!
//! let mut symbols = Symbols::with_options(
//!     ErrorCorrectionLevel::Medium,
//!     1,    // keep every symbol at version 1
//!     true, // allow structured append
//!     "ISO-8859-1",
//! ).unwrap();
//! symbols.append_string("abcdefghijklmnopqrstuvwxyz").unwrap();
//! assert!(symbols.count() >= 2);
//! for symbol in &symbols {
//!     let matrix = symbol.module_matrix();
//!     assert_eq!(matrix.len(), 21);
//! }
//! ```
//!
//! ## Modules
//!
//! - [`symbols`]: The [`Symbols`] collection driving the encoding
//!   pipeline, and the sealed [`Symbol`] view with the bitmap surface.
//! - [`helper`]: Console and SVG rendering utilities.
//!
//! ## Error Handling
//!
//! All fallible operations return [`Error`]: invalid arguments are
//! rejected at call boundaries before any mutation, capacity and encoding
//! failures surface from [`Symbols::append_string`] without corrupting
//! the collection, and I/O errors pass through verbatim from the `save_*`
//! calls.
//!
//! ## Limitations
//!
//! - **Decoding** is out of scope; this crate only writes symbols.
//! - **Micro QR and Model 1** symbols are not supported.
//! - **Segmentation** is greedy per character rather than globally
//!   optimal; a run of digits inside alphanumeric text stays in the
//!   current mode even when switching would save bits.

mod bits;
mod charset;
mod error;
mod galois;
mod masking;
mod matrix;
mod render;
mod segments;
mod symbol;

pub mod helper;
pub mod symbols;
pub mod types;

pub use charset::ByteCharset;
pub use error::{Error, Result};
pub use symbol::Symbol;
pub use symbols::Symbols;
pub use types::{EncodingMode, ErrorCorrectionLevel, Version};
