use vecadd_bench::accel::cpu::SequentialAdder;
use vecadd_bench::accel::manager::CHECKSUM_REL_TOLERANCE;
use vecadd_bench::accel::ops::{checksum, checksums_agree, VectorSet};
use vecadd_bench::accel::parallel::ParallelAdder;
use vecadd_bench::accel::{AccelerationManager, Strategy, VectorAdder};
use vecadd_bench::config::BenchSettings;

fn run(adder: &mut dyn VectorAdder, len: usize) -> (Vec<f32>, f64) {
    let mut set = VectorSet::prepare(len).unwrap();
    adder.add(&set.a, &set.b, &mut set.out).unwrap();
    let sum = checksum(&set.out);
    (set.out, sum)
}

#[test]
fn test_golden_two_elements() {
    let (seq, seq_sum) = run(&mut SequentialAdder, 2);
    let (par, par_sum) = run(&mut ParallelAdder::new(8).unwrap(), 2);

    assert_eq!(seq, vec![1.0, -1.0]);
    assert_eq!(par, vec![1.0, -1.0]);
    assert_eq!(seq_sum, 0.0);
    assert_eq!(par_sum, 0.0);
}

#[test]
fn test_single_element_sums_to_zero() {
    let (seq, _) = run(&mut SequentialAdder, 1);
    let (par, _) = run(&mut ParallelAdder::new(8).unwrap(), 1);
    assert_eq!(seq, vec![0.0]);
    assert_eq!(par, vec![0.0]);
}

#[test]
fn test_cpu_strategies_agree_on_large_odd_length() {
    let len = 2_000_001;
    let (seq, seq_sum) = run(&mut SequentialAdder, len);
    let (par, par_sum) = run(&mut ParallelAdder::new(8).unwrap(), len);

    assert_eq!(seq, par);
    assert!(checksums_agree(seq_sum, par_sum, CHECKSUM_REL_TOLERANCE));
    // Each pair cancels to within rounding
    assert!(seq_sum.abs() < 1.0, "checksum drifted: {seq_sum}");
}

#[test]
fn test_worker_count_does_not_change_result() {
    let len = 123_457;
    let (reference, _) = run(&mut SequentialAdder, len);
    for workers in [1, 3, 8, 32] {
        let (out, _) = run(&mut ParallelAdder::new(workers).unwrap(), len);
        assert_eq!(out, reference, "workers = {workers}");
    }
}

#[test]
#[ignore] // Requires an OpenCL GPU and ICD loader
fn test_all_strategies_agree() {
    let manager = AccelerationManager::new(&BenchSettings {
        vector_len: 1_000_003,
        workers: 8,
    });

    let mut out = Vec::new();
    let ms = manager.run_all(&mut out).unwrap();
    assert_eq!(
        ms.iter().map(|m| m.strategy).collect::<Vec<_>>(),
        Strategy::ALL.to_vec()
    );
    for m in &ms[1..] {
        assert!(checksums_agree(ms[0].checksum, m.checksum, CHECKSUM_REL_TOLERANCE));
    }
    assert!(ms[2].timing.device.is_some());
}
