//! Device-side policy that does not need a live OpenCL runtime: which device
//! to use, how the launch grid is shaped, and the kernel itself.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::accel::{check_lengths, AddTiming, BenchError, Strategy, VectorAdder};

/// Work-items per work-group.
pub const LOCAL_WORK_SIZE: usize = 256;

pub const KERNEL_NAME: &str = "vecAdd";

/// The global size is padded up to a multiple of the local size, so ids past
/// `n` exist. They are folded back into range with `% n` rather than skipped;
/// the overshoot items rewrite an element with the value it already holds.
pub const KERNEL_SOURCE: &str = r#"
__kernel void vecAdd(__global const float *a,
                     __global const float *b,
                     __global float *c,
                     const unsigned int n)
{
    size_t id = get_global_id(0);
    id = id % n;
    c[id] = a[id] + b[id];
}
"#;

/// `clGetPlatformIDs` status when the ICD loader has no platform installed.
pub const CL_PLATFORM_NOT_FOUND_KHR: i32 = -1001;

/// `clGetDeviceIDs` status when a platform has no device of the asked type.
pub const CL_DEVICE_NOT_FOUND: i32 = -1;

/// Fold a "none installed" status into an empty list. Any other status
/// code is still an error.
pub fn empty_if_not_found<T>(listed: Result<Vec<T>, i32>, not_found: i32) -> Result<Vec<T>, i32> {
    match listed {
        Err(code) if code == not_found => Ok(Vec::new()),
        other => other,
    }
}

/// An enumerated device and its ranking score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceCandidate<Id> {
    pub id: Id,
    pub name: String,
    /// `CL_DEVICE_MAX_CLOCK_FREQUENCY`, in MHz.
    pub clock_mhz: u32,
}

/// Pick the device with the highest clock frequency.
///
/// Candidates go into a map keyed by clock in enumeration order; an equal
/// key replaces the earlier entry, so the last enumerated device wins a tie.
/// Returns `None` when nothing was enumerated.
pub fn select_fastest<Id>(candidates: Vec<DeviceCandidate<Id>>) -> Option<DeviceCandidate<Id>> {
    let mut by_clock = BTreeMap::new();
    for candidate in candidates {
        if let Some(replaced) = by_clock.insert(candidate.clock_mhz, candidate) {
            debug!(device = %replaced.name, clock_mhz = replaced.clock_mhz, "tied device superseded");
        }
    }
    by_clock.pop_last().map(|(_, device)| device)
}

/// NDRange shape for a one-dimensional launch over `len` elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchGeometry {
    pub global: usize,
    pub local: usize,
}

impl LaunchGeometry {
    /// `global = ceil(len / local) * local`.
    pub fn for_len(len: usize, local: usize) -> Self {
        Self {
            global: len.div_ceil(local) * local,
            local,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.global == 0
    }
}

/// Accelerator strategy. Each call to [`VectorAdder::add`] runs the whole
/// device pipeline once; see [`crate::accel::opencl`] for the phases.
///
/// The reported interval is the result read-back only. Upload and kernel
/// execution are measured too and carried in [`AddTiming::device`].
#[derive(Debug, Default)]
pub struct DeviceAdder;

impl VectorAdder for DeviceAdder {
    fn strategy(&self) -> Strategy {
        Strategy::Device
    }

    fn add(&mut self, a: &[f32], b: &[f32], out: &mut [f32]) -> Result<AddTiming, BenchError> {
        check_lengths(a, b, out)?;
        let geometry = LaunchGeometry::for_len(out.len(), LOCAL_WORK_SIZE);
        if geometry.is_empty() {
            warn!("empty input, skipping device dispatch");
            return Ok(AddTiming::default());
        }
        run_pipeline(a, b, out, geometry)
    }
}

#[cfg(feature = "opencl")]
fn run_pipeline(
    a: &[f32],
    b: &[f32],
    out: &mut [f32],
    geometry: LaunchGeometry,
) -> Result<AddTiming, BenchError> {
    crate::accel::opencl::run(a, b, out, geometry)
}

#[cfg(not(feature = "opencl"))]
fn run_pipeline(
    _a: &[f32],
    _b: &[f32],
    _out: &mut [f32],
    _geometry: LaunchGeometry,
) -> Result<AddTiming, BenchError> {
    Err(BenchError::DeviceUnavailable(
        "built without the `opencl` feature".to_string(),
    ))
}
