//! vecadd-bench -- elementwise vector addition, three ways.
//!
//! Compares a sequential loop, a fixed-size CPU worker pool and an OpenCL
//! kernel on the fastest GPU. Every strategy gets its own deterministically
//! initialized buffers; the report lists checksum and elapsed time of each.

pub mod accel;
pub mod config;
pub mod report;
pub mod timer;

use std::io::Write;

use anyhow::Result;

use crate::config::BenchConfig;
use crate::report::Measurement;

/// Run the full benchmark (sequential, parallel, device), writing report
/// lines to `out` as each strategy completes.
pub fn run<W: Write>(config: &BenchConfig, out: &mut W) -> Result<Vec<Measurement>> {
    config.validate()?;
    let manager = accel::AccelerationManager::new(&config.bench);
    manager.run_all(out)
}
