//! batscode: parameter derivation, precode and batch generation for BATS codes.
//!
//! # Overview
//!
//! BATS (BATched Sparse) codes split a file into K packets, extend them with
//! L + H check packets, and send coded batches of M symbols, each mixing a
//! random subset of packets with random GF(2^m) coefficients. Encoder and
//! decoder share no state beyond the session inputs (M, K, T), the degree
//! distribution, and a per-batch key: everything else is derived or
//! regenerated deterministically.
//!
//! This crate is the deterministic core both sides run:
//!
//! - derive the structural counts from (M, K, T)
//! - map between the external, SM-domain and PI-domain index spaces
//! - generate the LDPC and HDPC check packets
//! - sample a batch degree from a key
//! - draw the batch's participants and coefficients
//!
//! Decoding and packet transport are out of scope.
//!
//! # Module Structure
//!
//! - [`params`]: Session parameter derivation
//! - [`domain`]: Coordinate mapping between index spaces
//! - [`field`]: GF(2^m) arithmetic with two interchangeable kernels
//! - [`distribution`]: Degree distributions
//! - [`precode`]: LDPC and HDPC check packet generation
//! - [`batch`]: Degree sampling and encoding-vector generation
//! - [`symbols`]: Packet storage by external id
//! - [`session`]: The session tying it all together
//! - [`config`]: Session configuration
//! - [`error`]: Error types
//! - [`util`]: Deterministic PRNG

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::cast_possible_truncation)]

pub mod batch;
pub mod config;
pub mod distribution;
pub mod domain;
pub mod error;
pub mod field;
pub mod params;
pub mod precode;
pub mod session;
pub mod symbols;
pub mod tracing_compat;
pub mod util;

#[cfg(test)]
pub(crate) mod test_utils;

pub use batch::BatchVector;
pub use config::{BatsConfig, ConfigError};
pub use distribution::DegreeDistribution;
pub use domain::{Domain, DomainMap};
pub use error::{Error, ErrorCategory, ErrorKind, Result};
pub use field::{Field, FieldKernel};
pub use params::BatsParams;
pub use session::{BatsSession, EncodedBatch, SampledDegree, SessionStats};
pub use symbols::SymbolStore;
pub use util::DetRng;
