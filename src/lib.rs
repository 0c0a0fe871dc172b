//! resmut - Resistance Mutation Screening for Translated CDS Sequences
//!
//! Checks each protein sequence of a translated CDS file for a catalogue of
//! amino-acid resistance mutations, single (`F264L`) or combined
//! (`K272M+F264L`), and reports Present/Absent with an evidence note.
//!
//! # Modules
//! - `seqio`: FASTA loading into an ordered, identifier-keyed store
//! - `mutation`: Mutation rule parsing
//! - `catalog`: Mutation catalog (CSV/TSV) reading
//! - `evaluate`: Per-position checks and AND aggregation
//! - `note`: Evidence note wording
//! - `report`: Sequence x rule cross product and report writing
//! - `error`: Typed errors

pub mod error;
pub mod seqio;
pub mod mutation;
pub mod catalog;
pub mod evaluate;
pub mod note;
pub mod report;

pub use error::ScreenError;
