use crate::accel::{check_lengths, AddTiming, BenchError, Strategy, VectorAdder};
use crate::timer::timed;

/// Scalar reference add. Also the per-chunk body of the parallel strategy.
///
/// Callers pass equal lengths; adders enforce it with [`check_lengths`].
pub fn add_into(a: &[f32], b: &[f32], out: &mut [f32]) {
    debug_assert!(a.len() == out.len() && b.len() == out.len());

    for ((c, &x), &y) in out.iter_mut().zip(a).zip(b) {
        *c = x + y;
    }
}

/// Single-threaded baseline. Times the add loop only.
#[derive(Debug, Default)]
pub struct SequentialAdder;

impl VectorAdder for SequentialAdder {
    fn strategy(&self) -> Strategy {
        Strategy::Sequential
    }

    fn add(&mut self, a: &[f32], b: &[f32], out: &mut [f32]) -> Result<AddTiming, BenchError> {
        check_lengths(a, b, out)?;
        let ((), interval) = timed(|| add_into(a, b, out));
        Ok(AddTiming::host(interval.elapsed()))
    }
}
