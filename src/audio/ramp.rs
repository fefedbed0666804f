// Exponential parameter ramps, evaluated per sample by the voices.
//
// An exponential ramp can't pass through zero, so both ends are clamped to a
// tiny positive value first (a kick sweeping "down to 0.01 Hz" is fine, one
// sweeping to 0 Hz gets the same treatment).

const MIN_RAMP_VALUE: f32 = 1e-6;

/// Value of a ramp from `start` to `end` over `duration` seconds, `elapsed`
/// seconds after it began. Holds `start` before the ramp and `end` after it.
pub fn exponential(start: f32, end: f32, duration: f64, elapsed: f64) -> f32 {
    if elapsed <= 0.0 {
        return start;
    }
    if duration <= 0.0 || elapsed >= duration {
        return end;
    }
    let from = start.max(MIN_RAMP_VALUE);
    let to = end.max(MIN_RAMP_VALUE);
    let t = (elapsed / duration) as f32;
    from * (to / from).powf(t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints() {
        assert_eq!(exponential(150.0, 0.01, 0.5, 0.0), 150.0);
        assert_eq!(exponential(150.0, 0.01, 0.5, 0.5), 0.01);
        assert_eq!(exponential(150.0, 0.01, 0.5, 3.0), 0.01);
    }

    #[test]
    fn monotonic_descent() {
        let mut last = f32::MAX;
        for i in 0..100 {
            let v = exponential(0.8, 0.001, 0.5, i as f64 * 0.005);
            assert!(v < last);
            last = v;
        }
    }

    #[test]
    fn zero_duration_jumps_to_end() {
        assert_eq!(exponential(1.0, 0.5, 0.0, 0.001), 0.5);
    }

    #[test]
    fn zero_endpoint_does_not_produce_nan() {
        let v = exponential(100.0, 0.0, 1.0, 0.5);
        assert!(v.is_finite());
        assert!(v > 0.0);
    }
}
