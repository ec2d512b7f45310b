use crate::accel::BenchError;

/// Input and output buffers owned by a single strategy.
#[derive(Debug)]
pub struct VectorSet {
    pub a: Vec<f32>,
    pub b: Vec<f32>,
    pub out: Vec<f32>,
}

impl VectorSet {
    /// Allocate three `len`-element buffers and fill the inputs with the
    /// deterministic pattern from [`fill_inputs`].
    pub fn prepare(len: usize) -> Result<Self, BenchError> {
        let mut a = alloc_zeroed(len)?;
        let mut b = alloc_zeroed(len)?;
        let out = alloc_zeroed(len)?;
        fill_inputs(&mut a, &mut b);
        Ok(Self { a, b, out })
    }

    pub fn len(&self) -> usize {
        self.out.len()
    }

    pub fn is_empty(&self) -> bool {
        self.out.is_empty()
    }
}

/// Reserve exactly `len` elements up front so an impossible request fails
/// with an error instead of aborting the process.
pub fn alloc_zeroed(len: usize) -> Result<Vec<f32>, BenchError> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|_| BenchError::Allocation { len })?;
    buf.resize(len, 0.0);
    Ok(buf)
}

/// Pairwise trigonometric pattern: for pair `k`,
/// `a = [sin²k, -sin²k]` and `b = [cos²k, -cos²k]`.
///
/// Every even slot sums to ~1 and every odd slot to its exact negation, so
/// the checksum of a full run stays near zero. With an odd length the last
/// element has no partner and is set to `0.0` in both inputs.
pub fn fill_inputs(a: &mut [f32], b: &mut [f32]) {
    debug_assert_eq!(a.len(), b.len());

    for (k, (pa, pb)) in a.chunks_exact_mut(2).zip(b.chunks_exact_mut(2)).enumerate() {
        let x = k as f32;
        let sin_sq = x.sin() * x.sin();
        let cos_sq = x.cos() * x.cos();
        pa[0] = sin_sq;
        pb[0] = cos_sq;
        pa[1] = -sin_sq;
        pb[1] = -cos_sq;
    }

    if a.len() % 2 == 1 {
        let last = a.len() - 1;
        a[last] = 0.0;
        b[last] = 0.0;
    }
}

/// Sum of all elements, accumulated in `f64`.
pub fn checksum(values: &[f32]) -> f64 {
    values.iter().map(|&v| f64::from(v)).sum()
}

/// Whether two checksums agree within `rel_tol` of the larger magnitude.
/// Values near zero fall back to `rel_tol` as an absolute bound.
pub fn checksums_agree(lhs: f64, rhs: f64, rel_tol: f64) -> bool {
    let scale = lhs.abs().max(rhs.abs()).max(1.0);
    (lhs - rhs).abs() <= rel_tol * scale
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_zero_golden_values() {
        let mut a = vec![9.0; 2];
        let mut b = vec![9.0; 2];
        fill_inputs(&mut a, &mut b);
        assert_eq!(a, vec![0.0, -0.0]);
        assert_eq!(b, vec![1.0, -1.0]);
    }

    #[test]
    fn test_odd_length_tail_is_zero() {
        let mut a = vec![9.0; 5];
        let mut b = vec![9.0; 5];
        fill_inputs(&mut a, &mut b);
        assert_eq!(a[4], 0.0);
        assert_eq!(b[4], 0.0);

        // Pair k = 1 is still filled
        let s = 1.0f32.sin();
        assert_eq!(a[2], s * s);
        assert_eq!(a[3], -(s * s));
    }

    #[test]
    fn test_single_element_is_incomplete_pair() {
        let set = VectorSet::prepare(1).unwrap();
        assert_eq!(set.a, vec![0.0]);
        assert_eq!(set.b, vec![0.0]);
        assert_eq!(set.out, vec![0.0]);
    }

    #[test]
    fn test_prepare_empty() {
        let set = VectorSet::prepare(0).unwrap();
        assert!(set.is_empty());
        assert!(set.a.is_empty() && set.b.is_empty());
    }

    #[test]
    fn test_pairs_are_mirrored() {
        let set = VectorSet::prepare(1000).unwrap();
        for k in 0..500 {
            assert_eq!(set.a[2 * k], -set.a[2 * k + 1]);
            assert_eq!(set.b[2 * k], -set.b[2 * k + 1]);
            assert!(set.a[2 * k] >= 0.0 && set.b[2 * k] >= 0.0);
        }
    }

    #[test]
    fn test_impossible_allocation_is_an_error() {
        let err = alloc_zeroed(usize::MAX).unwrap_err();
        assert!(matches!(err, BenchError::Allocation { len } if len == usize::MAX));
    }

    #[test]
    fn test_checksum() {
        assert_eq!(checksum(&[]), 0.0);
        assert_eq!(checksum(&[1.0, -1.0]), 0.0);
        assert_eq!(checksum(&[0.5, 0.25, 0.25]), 1.0);
    }

    #[test]
    fn test_checksums_agree() {
        assert!(checksums_agree(1000.0, 1000.5, 1e-3));
        assert!(!checksums_agree(1000.0, 1002.0, 1e-3));
        assert!(checksums_agree(0.0, 0.0005, 1e-3));
        assert!(!checksums_agree(0.0, 0.01, 1e-3));
    }
}
