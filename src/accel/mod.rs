//! Execution strategies for elementwise vector addition.
//!
//! Three ways to compute `c[i] = a[i] + b[i]`: a scalar loop on one thread,
//! a fixed-size CPU worker pool, and an OpenCL kernel on the fastest GPU.
//! Each strategy owns its timing methodology and reports the interval it
//! measured through [`AddTiming`].

pub mod cpu;
pub mod device;
pub mod manager;
#[cfg(feature = "opencl")]
pub mod opencl;
pub mod ops;
pub mod parallel;

pub use manager::AccelerationManager;

use std::fmt;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BenchError {
    #[error("failed to allocate host buffer of {len} f32 elements")]
    Allocation { len: usize },

    #[error("no compute device available: {0}")]
    DeviceUnavailable(String),

    #[error("kernel build failed:\n{log}")]
    CompileFailure { log: String },

    #[error("{phase} failed: {message}")]
    Device { phase: DevicePhase, message: String },

    #[error("buffer lengths differ: a={a}, b={b}, out={out}")]
    LengthMismatch { a: usize, b: usize, out: usize },

    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Every [`VectorAdder`] calls this before touching `out`.
pub fn check_lengths(a: &[f32], b: &[f32], out: &[f32]) -> Result<(), BenchError> {
    if a.len() == out.len() && b.len() == out.len() {
        Ok(())
    } else {
        Err(BenchError::LengthMismatch {
            a: a.len(),
            b: b.len(),
            out: out.len(),
        })
    }
}

/// Step of the device pipeline, in the order the steps run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum DevicePhase {
    PlatformEnumeration,
    DeviceSelection,
    ContextCreation,
    ProgramBuild,
    BufferAllocation,
    Upload,
    Dispatch,
    Finish,
    Readback,
}

impl fmt::Display for DevicePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::PlatformEnumeration => "platform enumeration",
            Self::DeviceSelection => "device selection",
            Self::ContextCreation => "context/queue creation",
            Self::ProgramBuild => "program build",
            Self::BufferAllocation => "device buffer allocation",
            Self::Upload => "input upload",
            Self::Dispatch => "kernel dispatch",
            Self::Finish => "queue finish",
            Self::Readback => "result read-back",
        };
        f.write_str(name)
    }
}

/// Which execution path produced a measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum Strategy {
    /// Scalar loop on the calling thread
    Sequential,
    /// Fixed-size CPU worker pool
    Parallel,
    /// OpenCL kernel on the selected GPU
    Device,
}

impl Strategy {
    /// Execution order of a full run.
    pub const ALL: [Strategy; 3] = [Strategy::Sequential, Strategy::Parallel, Strategy::Device];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Sequential => "sequential",
            Self::Parallel => "parallel",
            Self::Device => "device",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Phase durations of one device run.
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize)]
pub struct DeviceTimings {
    pub upload: Duration,
    /// Enqueue of the kernel through `finish` returning.
    pub dispatch: Duration,
    pub readback: Duration,
    /// Context creation through read-back completion.
    pub end_to_end: Duration,
}

/// Interval a strategy reports, plus the device breakdown when there is one.
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize)]
pub struct AddTiming {
    pub reported: Duration,
    pub device: Option<DeviceTimings>,
}

impl AddTiming {
    pub fn host(reported: Duration) -> Self {
        Self {
            reported,
            device: None,
        }
    }
}

/// Trait that every strategy implements.
///
/// Implementations reject buffers of unequal length with
/// [`BenchError::LengthMismatch`] before any work starts, write every index
/// of `out` exactly once, and return the interval they timed.
pub trait VectorAdder {
    fn strategy(&self) -> Strategy;

    fn add(&mut self, a: &[f32], b: &[f32], out: &mut [f32]) -> Result<AddTiming, BenchError>;
}
