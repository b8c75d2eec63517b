//! Memory-mapped read benchmark (`madvbench`)
//!
//! Measures how the access pattern and `madvise` advice interact with the
//! page cache temperature when reading a memory-mapped file.

// Modules
pub mod bench;
pub mod config;
pub mod error;
pub mod mapper;
pub mod order;
pub mod ram;
pub mod sampler;
pub mod sink;
pub mod sizer;
pub mod stats;
pub mod temperature;

// Exports
pub use self::{
	bench::Bench,
	config::{Advice, MappingConfig, Pattern, Temperature},
	error::{ExitKind, OsError, ProbeError, ValidationError},
	order::AccessOrder,
	ram::RamLimit,
	sink::{CsvSink, ResultSink, RunReport, TextSink},
	sizer::MappingSize,
	stats::AggregateStats,
};
