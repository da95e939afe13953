//! ADSR amplitude envelope.

/// Attack/decay/release in seconds; sustain is a level in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Envelope {
    pub attack: f64,
    pub decay: f64,
    pub sustain: f64,
    pub release: f64,
}

impl Envelope {
    /// Level while the note is held, `t` seconds after the trigger.
    fn held_level(&self, t: f64) -> f64 {
        if t < self.attack {
            t / self.attack
        } else if t < self.attack + self.decay {
            let progress = (t - self.attack) / self.decay;
            1.0 - progress * (1.0 - self.sustain)
        } else {
            self.sustain
        }
    }

    /// Amplitude `t` seconds after the trigger of a note held for `held`
    /// seconds.
    ///
    /// The release ramps down from whatever level the note had reached, so
    /// notes shorter than attack + decay fade out without a jump.
    pub fn amplitude(&self, t: f64, held: f64) -> f64 {
        if t < 0.0 {
            return 0.0;
        }
        if t < held {
            return self.held_level(t);
        }
        let since_release = t - held;
        if since_release >= self.release {
            return 0.0;
        }
        let start = self.held_level(held.max(0.0));
        start * (1.0 - since_release / self.release)
    }

    /// Seconds of sound for a note held `held` seconds.
    pub fn total_duration(&self, held: f64) -> f64 {
        held.max(0.0) + self.release
    }
}
