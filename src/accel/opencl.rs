//! OpenCL device pipeline.
//!
//! One run walks the phases in [`DevicePhase`] order exactly once:
//! enumerate platforms and GPU devices, select the fastest, open a context
//! and queue, build the kernel, allocate and upload buffers, dispatch,
//! `finish`, read back. Any error ends the run; nothing is retried and
//! there is no CPU fallback.
//!
//! Handles are owned by [`DeviceSession`] and by locals of
//! [`DeviceSession::add`]; the opencl3 wrappers release them on drop.

use std::ptr;
use std::time::Instant;

use opencl3::command_queue::CommandQueue;
use opencl3::context::Context;
use opencl3::device::{Device, CL_DEVICE_TYPE_GPU};
use opencl3::error_codes::ClError;
use opencl3::kernel::{ExecuteKernel, Kernel};
use opencl3::memory::{Buffer, CL_MEM_READ_ONLY, CL_MEM_WRITE_ONLY};
use opencl3::platform::get_platforms;
use opencl3::program::Program;
use opencl3::types::{cl_device_id, cl_float, cl_uint, CL_BLOCKING};
use tracing::{debug, info};

use crate::accel::device::{
    empty_if_not_found, select_fastest, DeviceCandidate, LaunchGeometry, CL_DEVICE_NOT_FOUND,
    CL_PLATFORM_NOT_FOUND_KHR, KERNEL_NAME, KERNEL_SOURCE,
};
use crate::accel::{AddTiming, BenchError, DevicePhase, DeviceTimings};
use crate::timer::try_timed;

fn fail(phase: DevicePhase) -> impl FnOnce(ClError) -> BenchError {
    move |e| BenchError::Device {
        phase,
        message: e.to_string(),
    }
}

/// Every GPU on every platform, in enumeration order. A loader without
/// platforms, or a platform without GPUs, contributes nothing; the caller
/// then reports [`BenchError::DeviceUnavailable`].
pub fn enumerate_gpus() -> Result<Vec<DeviceCandidate<cl_device_id>>, BenchError> {
    let platforms = empty_if_not_found(get_platforms().map_err(|e| e.0), CL_PLATFORM_NOT_FOUND_KHR)
        .map_err(|code| fail(DevicePhase::PlatformEnumeration)(ClError(code)))?;
    debug!(platforms = platforms.len(), "platforms enumerated");

    let mut candidates = Vec::new();
    for platform in &platforms {
        let ids = empty_if_not_found(
            platform.get_devices(CL_DEVICE_TYPE_GPU).map_err(|e| e.0),
            CL_DEVICE_NOT_FOUND,
        )
        .map_err(|code| fail(DevicePhase::PlatformEnumeration)(ClError(code)))?;

        for id in ids {
            let device = Device::new(id);
            let clock_mhz = device
                .max_clock_frequency()
                .map_err(fail(DevicePhase::DeviceSelection))?;
            let name = device.name().unwrap_or_else(|_| "<unnamed>".to_string());
            debug!(device = %name, clock_mhz, "GPU enumerated");
            candidates.push(DeviceCandidate {
                id,
                name,
                clock_mhz,
            });
        }
    }

    Ok(candidates)
}

/// Context, queue, program and kernel bound to one device.
///
/// Field order is release order.
pub struct DeviceSession {
    kernel: Kernel,
    #[allow(dead_code)]
    program: Program,
    queue: CommandQueue,
    context: Context,
}

impl DeviceSession {
    pub fn open(id: cl_device_id) -> Result<Self, BenchError> {
        let device = Device::new(id);

        let context = Context::from_device(&device).map_err(fail(DevicePhase::ContextCreation))?;
        let queue = CommandQueue::create_default_with_properties(&context, 0, 0)
            .map_err(fail(DevicePhase::ContextCreation))?;
        debug!("context and queue ready");

        let program = Program::create_and_build_from_source(&context, KERNEL_SOURCE, "")
            .map_err(|log| BenchError::CompileFailure { log })?;
        let kernel = Kernel::create(&program, KERNEL_NAME).map_err(fail(DevicePhase::ProgramBuild))?;
        debug!(kernel = KERNEL_NAME, "program built");

        Ok(Self {
            kernel,
            program,
            queue,
            context,
        })
    }

    /// Upload, dispatch, wait, read back. `out.len()` elements, one launch.
    pub fn add(
        &self,
        a: &[f32],
        b: &[f32],
        out: &mut [f32],
        geometry: LaunchGeometry,
    ) -> Result<DeviceTimings, BenchError> {
        let len = out.len();
        let n = cl_uint::try_from(len).map_err(|_| BenchError::Device {
            phase: DevicePhase::Dispatch,
            message: format!("{len} elements exceed the kernel's 32-bit count argument"),
        })?;

        let (mut d_a, mut d_b, d_c) = unsafe {
            (
                Buffer::<cl_float>::create(&self.context, CL_MEM_READ_ONLY, len, ptr::null_mut())
                    .map_err(fail(DevicePhase::BufferAllocation))?,
                Buffer::<cl_float>::create(&self.context, CL_MEM_READ_ONLY, len, ptr::null_mut())
                    .map_err(fail(DevicePhase::BufferAllocation))?,
                Buffer::<cl_float>::create(&self.context, CL_MEM_WRITE_ONLY, len, ptr::null_mut())
                    .map_err(fail(DevicePhase::BufferAllocation))?,
            )
        };
        debug!(len, "device buffers allocated");

        let ((), upload) = try_timed(|| {
            unsafe {
                self.queue
                    .enqueue_write_buffer(&mut d_a, CL_BLOCKING, 0, a, &[])
                    .map_err(fail(DevicePhase::Upload))?;
                self.queue
                    .enqueue_write_buffer(&mut d_b, CL_BLOCKING, 0, b, &[])
                    .map_err(fail(DevicePhase::Upload))?;
            }
            Ok::<(), BenchError>(())
        })?;
        debug!("inputs uploaded");

        let ((), dispatch) = try_timed(|| {
            let _event = unsafe {
                ExecuteKernel::new(&self.kernel)
                    .set_arg(&d_a)
                    .set_arg(&d_b)
                    .set_arg(&d_c)
                    .set_arg(&n)
                    .set_global_work_size(geometry.global)
                    .set_local_work_size(geometry.local)
                    .enqueue_nd_range(&self.queue)
            }
            .map_err(fail(DevicePhase::Dispatch))?;
            self.queue.finish().map_err(fail(DevicePhase::Finish))?;
            Ok::<(), BenchError>(())
        })?;
        debug!(global = geometry.global, local = geometry.local, "kernel finished");

        let (_event, readback) = try_timed(|| {
            unsafe { self.queue.enqueue_read_buffer(&d_c, CL_BLOCKING, 0, out, &[]) }
                .map_err(fail(DevicePhase::Readback))
        })?;
        debug!("results read back");

        Ok(DeviceTimings {
            upload: upload.elapsed(),
            dispatch: dispatch.elapsed(),
            readback: readback.elapsed(),
            end_to_end: Default::default(),
        })
    }
}

impl Drop for DeviceSession {
    fn drop(&mut self) {
        debug!("releasing kernel, program, queue and context");
    }
}

/// Full device run for one strategy invocation.
pub fn run(
    a: &[f32],
    b: &[f32],
    out: &mut [f32],
    geometry: LaunchGeometry,
) -> Result<AddTiming, BenchError> {
    let selected = select_fastest(enumerate_gpus()?).ok_or_else(|| {
        BenchError::DeviceUnavailable("no OpenCL GPU device found on any platform".to_string())
    })?;
    info!(device = %selected.name, clock_mhz = selected.clock_mhz, "device selected");

    let started = Instant::now();
    let session = DeviceSession::open(selected.id)?;
    let mut timings = session.add(a, b, out, geometry)?;
    timings.end_to_end = started.elapsed();
    drop(session);

    info!(
        upload_s = timings.upload.as_secs_f64(),
        dispatch_s = timings.dispatch.as_secs_f64(),
        readback_s = timings.readback.as_secs_f64(),
        end_to_end_s = timings.end_to_end.as_secs_f64(),
        "device phase timings"
    );

    Ok(AddTiming {
        reported: timings.readback,
        device: Some(timings),
    })
}
