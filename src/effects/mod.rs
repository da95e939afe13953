//! Effects chain manager.
//!
//! Owns one slot per [`EffectKind`] and routes a source through the enabled
//! subset in caller-chosen order. The manager moves through
//! `Uninitialized -> Initialized -> Disposed`; disposal is terminal.

pub mod kind;
pub mod params;
pub mod processor;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};

pub use kind::EffectKind;
pub use params::{EffectParams, ParamSpec};
pub use processor::EffectProcessor;

/// Identifies the audio source routed through the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SourceId(pub u32);

/// One effect in the bank.
#[derive(Debug, Clone)]
pub struct EffectSlot {
    kind: EffectKind,
    enabled: bool,
    params: EffectParams,
    processor: EffectProcessor,
}

impl EffectSlot {
    fn new(kind: EffectKind, sample_rate: u32, channels: usize) -> Self {
        Self {
            kind,
            enabled: false,
            params: EffectParams::defaults(kind),
            processor: EffectProcessor::new(kind, sample_rate, channels),
        }
    }

    pub fn kind(&self) -> EffectKind {
        self.kind
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn params(&self) -> &EffectParams {
        &self.params
    }

    fn settings(&self) -> EffectSettings {
        EffectSettings {
            kind: self.kind,
            enabled: self.enabled,
            parameters: self.params.values(),
        }
    }
}

/// Serializable snapshot of one slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectSettings {
    #[serde(rename = "type")]
    pub kind: EffectKind,
    pub enabled: bool,
    #[serde(default)]
    pub parameters: BTreeMap<String, f64>,
}

/// Current routing: source, then each node in order, then the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalChain {
    source: Option<SourceId>,
    nodes: Vec<EffectKind>,
}

impl SignalChain {
    pub fn source(&self) -> Option<SourceId> {
        self.source
    }

    pub fn nodes(&self) -> &[EffectKind] {
        &self.nodes
    }

    /// True when the source goes straight to the output.
    pub fn is_direct(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl fmt::Display for SignalChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.source {
            Some(SourceId(id)) => write!(f, "source#{id}")?,
            None => f.write_str("(unconnected)")?,
        }
        for node in &self.nodes {
            write!(f, " -> {node}")?;
        }
        f.write_str(" -> output")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ManagerState {
    Uninitialized,
    Initialized,
    Disposed,
}

/// The fixed bank of effect slots and the topology through them.
#[derive(Debug)]
pub struct EffectsManager {
    state: ManagerState,
    sample_rate: u32,
    channels: usize,
    /// Indexed by [`EffectKind::index`]; empty unless initialized.
    slots: Vec<EffectSlot>,
    source: Option<SourceId>,
    /// Enabled kinds in connection order.
    order: Vec<EffectKind>,
}

impl EffectsManager {
    pub fn new(sample_rate: u32, channels: usize) -> Self {
        Self {
            state: ManagerState::Uninitialized,
            sample_rate,
            channels: channels.max(1),
            slots: Vec::new(),
            source: None,
            order: Vec::new(),
        }
    }

    /// Populate all five slots with default parameters. Repeated calls are
    /// no-ops.
    pub fn initialize(&mut self) -> Result<()> {
        match self.state {
            ManagerState::Disposed => Err(Error::DisposedManager),
            ManagerState::Initialized => Ok(()),
            ManagerState::Uninitialized => {
                self.slots = EffectKind::ALL
                    .iter()
                    .map(|&kind| EffectSlot::new(kind, self.sample_rate, self.channels))
                    .collect();
                self.state = ManagerState::Initialized;
                debug!(sample_rate = self.sample_rate, channels = self.channels, "effects initialized");
                Ok(())
            }
        }
    }

    /// Release every slot and its processor. Terminal; calling it again is
    /// a no-op.
    pub fn dispose(&mut self) {
        if self.state == ManagerState::Disposed {
            debug!("effects manager already disposed");
            return;
        }
        self.slots.clear();
        self.slots.shrink_to_fit();
        self.order.clear();
        self.source = None;
        self.state = ManagerState::Disposed;
        debug!("effects disposed");
    }

    pub fn is_initialized(&self) -> bool {
        self.state == ManagerState::Initialized
    }

    pub fn is_disposed(&self) -> bool {
        self.state == ManagerState::Disposed
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    fn ensure_ready(&self) -> Result<()> {
        match self.state {
            ManagerState::Initialized => Ok(()),
            ManagerState::Uninitialized => Err(Error::NotInitialized),
            ManagerState::Disposed => Err(Error::DisposedManager),
        }
    }

    pub fn slot(&self, kind: EffectKind) -> Result<&EffectSlot> {
        self.ensure_ready()?;
        Ok(&self.slots[kind.index()])
    }

    /// Write parameter values, clamped into each declared range. Names the
    /// kind does not declare are skipped.
    pub fn update_effect<I, K>(&mut self, kind: EffectKind, deltas: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, f64)>,
        K: AsRef<str>,
    {
        self.ensure_ready()?;
        let slot = &mut self.slots[kind.index()];
        for (name, value) in deltas {
            let name = name.as_ref();
            if !slot.params.set(name, value) {
                debug!(effect = %kind, param = name, value, "ignored parameter update");
            }
        }
        Ok(())
    }

    /// [`update_effect`](Self::update_effect) keyed by effect name.
    pub fn update_effect_named<I, K>(&mut self, key: &str, deltas: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, f64)>,
        K: AsRef<str>,
    {
        self.ensure_ready()?;
        let kind: EffectKind = key.parse()?;
        self.update_effect(kind, deltas)
    }

    /// Toggle one slot. Enabling appends it to the end of the chain;
    /// disabling removes it.
    pub fn set_enabled(&mut self, kind: EffectKind, enabled: bool) -> Result<()> {
        self.ensure_ready()?;
        let slot = &mut self.slots[kind.index()];
        if slot.enabled == enabled {
            return Ok(());
        }
        slot.enabled = enabled;
        if enabled {
            self.order.push(kind);
        } else {
            self.order.retain(|&k| k != kind);
            slot.processor.reset();
        }
        debug!(effect = %kind, enabled, chain = %self.current_chain(), "effect toggled");
        Ok(())
    }

    /// Replace the topology: `source -> kinds[0] -> ... -> output`.
    ///
    /// Exactly the listed kinds end up enabled, in the given order; a kind
    /// listed twice keeps its first position. An empty list routes the
    /// source straight to the output.
    pub fn connect_source(&mut self, source: SourceId, kinds: &[EffectKind]) -> Result<SignalChain> {
        self.ensure_ready()?;
        let mut order: Vec<EffectKind> = Vec::with_capacity(kinds.len());
        for &kind in kinds {
            if !order.contains(&kind) {
                order.push(kind);
            }
        }
        for slot in &mut self.slots {
            let enabled = order.contains(&slot.kind);
            if slot.enabled && !enabled {
                slot.processor.reset();
            }
            slot.enabled = enabled;
        }
        self.order = order;
        self.source = Some(source);

        let chain = self.current_chain();
        debug!(chain = %chain, "source connected");
        Ok(chain)
    }

    /// [`connect_source`](Self::connect_source) with effect names. Any unknown
    /// name fails the whole call before the topology changes.
    pub fn connect_source_named<S: AsRef<str>>(
        &mut self,
        source: SourceId,
        keys: &[S],
    ) -> Result<SignalChain> {
        self.ensure_ready()?;
        let kinds = EffectKind::parse_list(keys)?;
        self.connect_source(source, &kinds)
    }

    /// The routing derived from current enablement.
    pub fn chain(&self) -> Result<SignalChain> {
        self.ensure_ready()?;
        Ok(self.current_chain())
    }

    fn current_chain(&self) -> SignalChain {
        SignalChain {
            source: self.source,
            nodes: self.order.clone(),
        }
    }

    /// Snapshot every slot, enabled or not: the enabled ones in chain
    /// order, then the disabled ones in bank order.
    pub fn get_current_settings(&self) -> Result<Vec<EffectSettings>> {
        self.ensure_ready()?;
        let enabled = self.order.iter().map(|kind| &self.slots[kind.index()]);
        let disabled = self.slots.iter().filter(|slot| !slot.enabled);
        Ok(enabled.chain(disabled).map(EffectSlot::settings).collect())
    }

    /// Restore a snapshot. Parameters are clamped like
    /// [`update_effect`](Self::update_effect). The chain is rebuilt with the
    /// enabled entries in the order listed; kinds missing from `settings`
    /// keep their state and, if enabled, follow the listed ones.
    pub fn apply_settings(&mut self, settings: &[EffectSettings]) -> Result<()> {
        self.ensure_ready()?;
        let mut order: Vec<EffectKind> = Vec::with_capacity(EffectKind::ALL.len());
        for entry in settings {
            self.update_effect(entry.kind, entry.parameters.iter().map(|(k, v)| (k, *v)))?;
            let slot = &mut self.slots[entry.kind.index()];
            if slot.enabled && !entry.enabled {
                slot.processor.reset();
            }
            slot.enabled = entry.enabled;
            if entry.enabled && !order.contains(&entry.kind) {
                order.push(entry.kind);
            }
        }
        let listed: Vec<EffectKind> = settings.iter().map(|entry| entry.kind).collect();
        order.extend(self.order.iter().copied().filter(|kind| !listed.contains(kind)));
        self.order = order;
        debug!(chain = %self.current_chain(), "settings applied");
        Ok(())
    }

    /// Clear reverb tails, delay lines and LFO phases.
    pub fn reset(&mut self) -> Result<()> {
        self.ensure_ready()?;
        for slot in &mut self.slots {
            slot.processor.reset();
        }
        Ok(())
    }

    /// Run interleaved `samples` through the connected chain in order.
    pub fn process(&mut self, samples: &mut [f32]) -> Result<()> {
        self.ensure_ready()?;
        if samples.len() % self.channels != 0 {
            warn!(
                len = samples.len(),
                channels = self.channels,
                "buffer is not a whole number of frames"
            );
        }
        for kind in &self.order {
            let slot = &mut self.slots[kind.index()];
            slot.processor.process(&slot.params, samples, self.channels);
        }
        Ok(())
    }
}

impl Default for EffectsManager {
    fn default() -> Self {
        Self::new(44100, 2)
    }
}
