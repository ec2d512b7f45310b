use std::io::Write;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::accel::cpu::SequentialAdder;
use crate::accel::device::DeviceAdder;
use crate::accel::ops::{checksum, checksums_agree, VectorSet};
use crate::accel::parallel::ParallelAdder;
use crate::accel::{BenchError, Strategy, VectorAdder};
use crate::config::BenchSettings;
use crate::report::{write_measurement, Measurement};

/// Relative tolerance between strategy checksums.
pub const CHECKSUM_REL_TOLERANCE: f64 = 1e-3;

/// Runs strategies one after another, each on its own freshly initialized
/// buffers, and cross-checks their checksums against the sequential run.
pub struct AccelerationManager {
    vector_len: usize,
    workers: usize,
}

impl AccelerationManager {
    /// Worker count is checked when the parallel strategy builds its pool.
    pub fn new(settings: &BenchSettings) -> Self {
        info!(
            vector_len = settings.vector_len,
            workers = settings.workers,
            "AccelerationManager initialized"
        );

        Self {
            vector_len: settings.vector_len,
            workers: settings.workers,
        }
    }

    fn adder_for(&self, strategy: Strategy) -> Result<Box<dyn VectorAdder>, BenchError> {
        Ok(match strategy {
            Strategy::Sequential => Box::new(SequentialAdder),
            Strategy::Parallel => Box::new(ParallelAdder::new(self.workers)?),
            Strategy::Device => Box::new(DeviceAdder),
        })
    }

    /// Allocate, initialize, add, checksum. Buffers are dropped on return.
    pub fn run_strategy(&self, strategy: Strategy) -> Result<Measurement, BenchError> {
        let mut adder = self.adder_for(strategy)?;
        let mut set = VectorSet::prepare(self.vector_len)?;
        debug!(%strategy, len = set.len(), "buffers initialized");

        info!(%strategy, "running strategy");
        let timing = adder.add(&set.a, &set.b, &mut set.out)?;
        let checksum = checksum(&set.out);
        info!(
            %strategy,
            checksum,
            elapsed_s = timing.reported.as_secs_f64(),
            "strategy complete"
        );

        Ok(Measurement {
            strategy,
            len: set.len(),
            checksum,
            timing,
        })
    }

    /// Run every strategy in [`Strategy::ALL`] order, writing each report as
    /// soon as it is available. The first failure ends the run.
    pub fn run_all<W: Write>(&self, out: &mut W) -> Result<Vec<Measurement>> {
        self.run_strategies(&Strategy::ALL, out)
    }

    pub fn run_strategies<W: Write>(
        &self,
        strategies: &[Strategy],
        out: &mut W,
    ) -> Result<Vec<Measurement>> {
        let mut measurements: Vec<Measurement> = Vec::with_capacity(strategies.len());

        for &strategy in strategies {
            let m = self
                .run_strategy(strategy)
                .with_context(|| format!("{strategy} strategy failed"))?;
            write_measurement(out, &m).context("failed to write report")?;

            if let Some(reference) = measurements.first() {
                verify(reference, &m);
            }
            measurements.push(m);
        }

        Ok(measurements)
    }
}

fn verify(reference: &Measurement, m: &Measurement) {
    if checksums_agree(reference.checksum, m.checksum, CHECKSUM_REL_TOLERANCE) {
        debug!(strategy = %m.strategy, "checksum matches {}", reference.strategy);
    } else {
        warn!(
            strategy = %m.strategy,
            checksum = m.checksum,
            reference = %reference.strategy,
            expected = reference.checksum,
            "checksum mismatch between strategies"
        );
    }
}
