//! Per-strategy result lines.

use std::io::{self, Write};

use crate::accel::{AddTiming, Strategy};

/// Outcome of one strategy run.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Measurement {
    pub strategy: Strategy,
    pub len: usize,
    pub checksum: f64,
    pub timing: AddTiming,
}

impl Measurement {
    pub fn elapsed_secs(&self) -> f64 {
        self.timing.reported.as_secs_f64()
    }
}

/// The two report lines for a measurement: checksum, then elapsed seconds.
pub fn format_lines(m: &Measurement) -> [String; 2] {
    let label = m.strategy.label();
    let mut title = label.to_string();
    if let Some(first) = title.get_mut(0..1) {
        first.make_ascii_uppercase();
    }

    [
        format!("{} sum: {:.6}", title, m.checksum),
        format!("Time for {} sum: {:.6} seconds", label, m.elapsed_secs()),
    ]
}

pub fn write_measurement<W: Write>(out: &mut W, m: &Measurement) -> io::Result<()> {
    for line in format_lines(m) {
        writeln!(out, "{line}")?;
    }
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accel::DeviceTimings;
    use std::time::Duration;

    #[test]
    fn test_format_sequential() {
        let m = Measurement {
            strategy: Strategy::Sequential,
            len: 200_000_000,
            checksum: 0.0,
            timing: AddTiming::host(Duration::from_millis(1250)),
        };
        let [sum, time] = format_lines(&m);
        assert_eq!(sum, "Sequential sum: 0.000000");
        assert_eq!(time, "Time for sequential sum: 1.250000 seconds");
    }

    #[test]
    fn test_device_reports_readback_interval() {
        let timings = DeviceTimings {
            upload: Duration::from_millis(300),
            dispatch: Duration::from_millis(40),
            readback: Duration::from_millis(150),
            end_to_end: Duration::from_millis(900),
        };
        let m = Measurement {
            strategy: Strategy::Device,
            len: 4,
            checksum: -1.5,
            timing: AddTiming {
                reported: timings.readback,
                device: Some(timings),
            },
        };
        let [sum, time] = format_lines(&m);
        assert_eq!(sum, "Device sum: -1.500000");
        assert_eq!(time, "Time for device sum: 0.150000 seconds");
    }

    #[test]
    fn test_write_measurement_emits_two_lines() {
        let m = Measurement {
            strategy: Strategy::Parallel,
            len: 2,
            checksum: 0.0,
            timing: AddTiming::default(),
        };
        let mut buf = Vec::new();
        write_measurement(&mut buf, &m).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(
            text,
            "Parallel sum: 0.000000\nTime for parallel sum: 0.000000 seconds\n"
        );
    }
}
