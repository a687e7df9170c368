//! Saturation for synthesized samples: symmetric hard clamp at the DAC's full scale.

/// Largest magnitude a DAC sample may take. The range is symmetric, so
/// `i16::MIN` is never produced.
pub const SAMPLE_LIMIT: i16 = 32767;

/// Hard limiter that clamps accumulated samples to `[-ceiling, ceiling]`.
#[derive(Debug, Clone, Copy)]
pub struct SampleLimiter {
    ceiling: f64,
}

impl SampleLimiter {
    /// Create a limiter with the given ceiling in DAC counts.
    pub fn new(ceiling: f64) -> Self {
        debug_assert!(ceiling > 0.0 && ceiling <= SAMPLE_LIMIT as f64);
        Self { ceiling }
    }

    /// Clamp one accumulated value. NaN passes through unchanged.
    #[inline]
    pub fn process(&self, sample: f64) -> f64 {
        if sample > self.ceiling {
            self.ceiling
        } else if sample < -self.ceiling {
            -self.ceiling
        } else {
            sample
        }
    }

    /// Truncate a clamped value toward zero into a DAC sample.
    ///
    /// NaN maps to 0.
    #[inline]
    pub fn quantize(&self, sample: f64) -> i16 {
        self.process(sample).trunc() as i16
    }

    /// Returns the current ceiling value.
    pub fn ceiling(&self) -> f64 {
        self.ceiling
    }
}

impl Default for SampleLimiter {
    fn default() -> Self {
        Self {
            ceiling: SAMPLE_LIMIT as f64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_within_range() {
        let limiter = SampleLimiter::default();
        assert_eq!(limiter.process(0.0), 0.0);
        assert_eq!(limiter.process(1234.5), 1234.5);
        assert_eq!(limiter.process(-32767.0), -32767.0);
        assert_eq!(limiter.process(32767.0), 32767.0);
    }

    #[test]
    fn clamps_both_directions() {
        let limiter = SampleLimiter::default();
        assert_eq!(limiter.process(40000.0), 32767.0);
        assert_eq!(limiter.process(f64::INFINITY), 32767.0);
        assert_eq!(limiter.process(-40000.0), -32767.0);
        assert_eq!(limiter.process(f64::NEG_INFINITY), -32767.0);
    }

    #[test]
    fn quantize_truncates_toward_zero() {
        let limiter = SampleLimiter::default();
        assert_eq!(limiter.quantize(3834.9), 3834);
        assert_eq!(limiter.quantize(-3834.9), -3834);
        assert_eq!(limiter.quantize(0.999), 0);
    }

    #[test]
    fn quantize_never_reaches_i16_min() {
        let limiter = SampleLimiter::default();
        assert_eq!(limiter.quantize(-1.0e12), -32767);
    }

    #[test]
    fn nan_is_not_clamped() {
        let limiter = SampleLimiter::default();
        assert!(limiter.process(f64::NAN).is_nan());
        assert_eq!(limiter.quantize(f64::NAN), 0);
    }

    #[test]
    fn custom_ceiling() {
        let limiter = SampleLimiter::new(1000.0);
        assert_eq!(limiter.ceiling(), 1000.0);
        assert_eq!(limiter.process(1500.0), 1000.0);
        assert_eq!(limiter.process(-1500.0), -1000.0);
    }
}
