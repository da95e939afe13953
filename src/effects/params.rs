//! Effect parameters: declared ranges and per-kind parameter structs.
//!
//! Writes are clamped into the declared `[min, max]`; out-of-range input is
//! coerced, never rejected. `step` is UI granularity only and is not applied.

use std::collections::BTreeMap;

use super::kind::EffectKind;

/// Declared range and default of one parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub default: f64,
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl ParamSpec {
    const fn new(name: &'static str, default: f64, min: f64, max: f64, step: f64) -> Self {
        Self {
            name,
            default,
            min,
            max,
            step,
        }
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }
}

const REVERB_SPECS: &[ParamSpec] = &[
    ParamSpec::new("decay", 1.5, 0.1, 10.0, 0.1),
    ParamSpec::new("preDelay", 0.01, 0.0, 0.1, 0.001),
    ParamSpec::new("wet", 0.5, 0.0, 1.0, 0.01),
];

const DELAY_SPECS: &[ParamSpec] = &[
    ParamSpec::new("delayTime", 0.25, 0.0, 1.0, 0.01),
    ParamSpec::new("feedback", 0.5, 0.0, 0.95, 0.01),
    ParamSpec::new("wet", 0.5, 0.0, 1.0, 0.01),
];

const DISTORTION_SPECS: &[ParamSpec] = &[
    ParamSpec::new("distortion", 0.4, 0.0, 1.0, 0.01),
    ParamSpec::new("wet", 0.5, 0.0, 1.0, 0.01),
];

const CHORUS_SPECS: &[ParamSpec] = &[
    ParamSpec::new("frequency", 4.0, 0.1, 20.0, 0.1),
    ParamSpec::new("depth", 0.5, 0.0, 1.0, 0.01),
    ParamSpec::new("wet", 0.5, 0.0, 1.0, 0.01),
];

const TREMOLO_SPECS: &[ParamSpec] = &[
    ParamSpec::new("frequency", 10.0, 0.1, 20.0, 0.1),
    ParamSpec::new("depth", 0.5, 0.0, 1.0, 0.01),
    ParamSpec::new("wet", 0.5, 0.0, 1.0, 0.01),
];

impl EffectKind {
    /// Declared parameters of this kind, in display order.
    pub fn param_specs(self) -> &'static [ParamSpec] {
        match self {
            EffectKind::Reverb => REVERB_SPECS,
            EffectKind::Delay => DELAY_SPECS,
            EffectKind::Distortion => DISTORTION_SPECS,
            EffectKind::Chorus => CHORUS_SPECS,
            EffectKind::Tremolo => TREMOLO_SPECS,
        }
    }

    pub fn param_spec(self, name: &str) -> Option<&'static ParamSpec> {
        self.param_specs().iter().find(|s| s.name == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReverbParams {
    /// Tail length in seconds.
    pub decay: f64,
    pub pre_delay: f64,
    pub wet: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DelayParams {
    pub delay_time: f64,
    pub feedback: f64,
    pub wet: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistortionParams {
    pub distortion: f64,
    pub wet: f64,
}

/// Shared by chorus and tremolo: an LFO rate and depth.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModulationParams {
    /// LFO rate in Hz.
    pub frequency: f64,
    pub depth: f64,
    pub wet: f64,
}

/// Live parameter values of one slot, tagged by effect kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EffectParams {
    Reverb(ReverbParams),
    Delay(DelayParams),
    Distortion(DistortionParams),
    Chorus(ModulationParams),
    Tremolo(ModulationParams),
}

impl EffectParams {
    /// Parameters at their declared defaults.
    pub fn defaults(kind: EffectKind) -> Self {
        let mut params = match kind {
            EffectKind::Reverb => EffectParams::Reverb(ReverbParams {
                decay: 0.0,
                pre_delay: 0.0,
                wet: 0.0,
            }),
            EffectKind::Delay => EffectParams::Delay(DelayParams {
                delay_time: 0.0,
                feedback: 0.0,
                wet: 0.0,
            }),
            EffectKind::Distortion => EffectParams::Distortion(DistortionParams {
                distortion: 0.0,
                wet: 0.0,
            }),
            EffectKind::Chorus => EffectParams::Chorus(ModulationParams {
                frequency: 0.0,
                depth: 0.0,
                wet: 0.0,
            }),
            EffectKind::Tremolo => EffectParams::Tremolo(ModulationParams {
                frequency: 0.0,
                depth: 0.0,
                wet: 0.0,
            }),
        };
        for spec in kind.param_specs() {
            params.set(spec.name, spec.default);
        }
        params
    }

    pub fn kind(&self) -> EffectKind {
        match self {
            EffectParams::Reverb(_) => EffectKind::Reverb,
            EffectParams::Delay(_) => EffectKind::Delay,
            EffectParams::Distortion(_) => EffectKind::Distortion,
            EffectParams::Chorus(_) => EffectKind::Chorus,
            EffectParams::Tremolo(_) => EffectKind::Tremolo,
        }
    }

    pub fn wet(&self) -> f64 {
        match self {
            EffectParams::Reverb(p) => p.wet,
            EffectParams::Delay(p) => p.wet,
            EffectParams::Distortion(p) => p.wet,
            EffectParams::Chorus(p) | EffectParams::Tremolo(p) => p.wet,
        }
    }

    fn field_mut(&mut self, name: &str) -> Option<&mut f64> {
        match self {
            EffectParams::Reverb(p) => match name {
                "decay" => Some(&mut p.decay),
                "preDelay" => Some(&mut p.pre_delay),
                "wet" => Some(&mut p.wet),
                _ => None,
            },
            EffectParams::Delay(p) => match name {
                "delayTime" => Some(&mut p.delay_time),
                "feedback" => Some(&mut p.feedback),
                "wet" => Some(&mut p.wet),
                _ => None,
            },
            EffectParams::Distortion(p) => match name {
                "distortion" => Some(&mut p.distortion),
                "wet" => Some(&mut p.wet),
                _ => None,
            },
            EffectParams::Chorus(p) | EffectParams::Tremolo(p) => match name {
                "frequency" => Some(&mut p.frequency),
                "depth" => Some(&mut p.depth),
                "wet" => Some(&mut p.wet),
                _ => None,
            },
        }
    }

    /// Current value of a named parameter.
    pub fn get(&self, name: &str) -> Option<f64> {
        match self {
            EffectParams::Reverb(p) => match name {
                "decay" => Some(p.decay),
                "preDelay" => Some(p.pre_delay),
                "wet" => Some(p.wet),
                _ => None,
            },
            EffectParams::Delay(p) => match name {
                "delayTime" => Some(p.delay_time),
                "feedback" => Some(p.feedback),
                "wet" => Some(p.wet),
                _ => None,
            },
            EffectParams::Distortion(p) => match name {
                "distortion" => Some(p.distortion),
                "wet" => Some(p.wet),
                _ => None,
            },
            EffectParams::Chorus(p) | EffectParams::Tremolo(p) => match name {
                "frequency" => Some(p.frequency),
                "depth" => Some(p.depth),
                "wet" => Some(p.wet),
                _ => None,
            },
        }
    }

    /// Write a named parameter, clamped into its declared range.
    ///
    /// Returns `false` (and changes nothing) for a name this kind does not
    /// declare or for a NaN value.
    pub fn set(&mut self, name: &str, value: f64) -> bool {
        let Some(spec) = self.kind().param_spec(name) else {
            return false;
        };
        if value.is_nan() {
            return false;
        }
        match self.field_mut(name) {
            Some(field) => {
                *field = spec.clamp(value);
                true
            }
            None => false,
        }
    }

    /// All parameter values keyed by their declared names.
    pub fn values(&self) -> BTreeMap<String, f64> {
        self.kind()
            .param_specs()
            .iter()
            .filter_map(|spec| self.get(spec.name).map(|v| (spec.name.to_string(), v)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_declared_table() {
        for kind in EffectKind::ALL {
            let params = EffectParams::defaults(kind);
            assert_eq!(params.kind(), kind);
            for spec in kind.param_specs() {
                assert_eq!(params.get(spec.name), Some(spec.default), "{kind}.{}", spec.name);
                assert!(spec.min <= spec.default && spec.default <= spec.max);
            }
        }
    }

    #[test]
    fn get_agrees_with_set_for_every_declared_name() {
        for kind in EffectKind::ALL {
            let mut params = EffectParams::defaults(kind);
            for spec in kind.param_specs() {
                let target = (spec.min + spec.max) / 2.0;
                assert!(params.set(spec.name, target));
                assert_eq!(params.get(spec.name), Some(target), "{kind}.{}", spec.name);
            }
            assert_eq!(params.get("notAParam"), None);
        }
        assert_eq!(EffectParams::defaults(EffectKind::Reverb).get("depth"), None);
    }

    #[test]
    fn reverb_defaults() {
        let EffectParams::Reverb(p) = EffectParams::defaults(EffectKind::Reverb) else {
            panic!("wrong variant");
        };
        assert_eq!(p.decay, 1.5);
        assert_eq!(p.pre_delay, 0.01);
        assert_eq!(p.wet, 0.5);
    }

    #[test]
    fn set_clamps_high_and_low() {
        let mut params = EffectParams::defaults(EffectKind::Reverb);
        assert!(params.set("decay", 999.0));
        assert_eq!(params.get("decay"), Some(10.0));
        assert!(params.set("decay", -3.0));
        assert_eq!(params.get("decay"), Some(0.1));
        assert!(params.set("wet", f64::INFINITY));
        assert_eq!(params.get("wet"), Some(1.0));
    }

    #[test]
    fn feedback_capped_below_one() {
        let mut params = EffectParams::defaults(EffectKind::Delay);
        params.set("feedback", 1.0);
        assert_eq!(params.get("feedback"), Some(0.95));
    }

    #[test]
    fn unknown_name_is_ignored() {
        let mut params = EffectParams::defaults(EffectKind::Reverb);
        let before = params;
        assert!(!params.set("notAParam", 1.0));
        // A name that exists on another kind is still unknown here.
        assert!(!params.set("feedback", 0.2));
        assert_eq!(params, before);
    }

    #[test]
    fn nan_is_ignored() {
        let mut params = EffectParams::defaults(EffectKind::Tremolo);
        assert!(!params.set("depth", f64::NAN));
        assert_eq!(params.get("depth"), Some(0.5));
    }

    #[test]
    fn values_lists_every_declared_param() {
        let values = EffectParams::defaults(EffectKind::Chorus).values();
        let names: Vec<&str> = values.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["depth", "frequency", "wet"]);
        assert_eq!(values["frequency"], 4.0);
    }
}
