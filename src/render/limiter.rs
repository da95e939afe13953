//! Master limiter applied to every block before capture.

/// Hard clamp to `[-ceiling, ceiling]`.
#[derive(Debug, Clone, Copy)]
pub struct Limiter {
    ceiling: f32,
}

impl Limiter {
    /// `ceiling` is clamped into `(0, 1]`.
    pub fn new(ceiling: f32) -> Self {
        let ceiling = if ceiling.is_finite() && ceiling > 0.0 {
            ceiling.min(1.0)
        } else {
            1.0
        };
        Self { ceiling }
    }

    pub fn ceiling(&self) -> f32 {
        self.ceiling
    }

    /// Clamp `buffer` in place and return how many samples were limited.
    /// NaN samples become silence.
    pub fn process_block(&self, buffer: &mut [f32]) -> usize {
        let mut limited = 0;
        for sample in buffer.iter_mut() {
            let clamped = if sample.is_nan() {
                0.0
            } else {
                sample.clamp(-self.ceiling, self.ceiling)
            };
            if clamped != *sample {
                limited += 1;
                *sample = clamped;
            }
        }
        limited
    }
}

impl Default for Limiter {
    fn default() -> Self {
        Self { ceiling: 0.95 }
    }
}
