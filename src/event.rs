//! The generated event record (spec.md §6 "Event output").
//!
//! Adapted from `cres`'s `EventBuilder`/`Event` (`event.rs`): a builder
//! accumulates particles and a weight, then `build()` produces an
//! immutable record. Unlike `cres`, which reads events back from a file
//! and groups outgoing momenta by PDG id for storage efficiency, this
//! builder is fed directly by a running [`crate::process::ProcessGenerator`]
//! and keeps incoming/outgoing order as generated, since colour tags and
//! the selected channel id must stay aligned with that order.

use noisy_float::prelude::*;
use particle_id::ParticleID;

use crate::bitstring::ChannelKey;
use crate::momentum::FourMomentum;

/// A single generated event (spec.md §6 "Event output"): every field
/// the spec marks contractual for external serialization, leaving the
/// actual serialization format out of scope.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub incoming: Vec<(ParticleID, FourMomentum)>,
    pub outgoing: Vec<(ParticleID, FourMomentum)>,
    /// Colour/anti-colour tag pair per outgoing particle, `(0, 0)` for
    /// colour singlets.
    pub colour: Vec<(i32, i32)>,
    pub weight: N64,
    pub cross_section: N64,
    pub cross_section_error: N64,
    pub channel: ChannelKey,
}

impl Event {
    pub fn n_incoming(&self) -> usize {
        self.incoming.len()
    }

    pub fn n_outgoing(&self) -> usize {
        self.outgoing.len()
    }
}

/// Builder for [`Event`] (spec.md §6).
#[derive(Debug, Default, Clone)]
pub struct EventBuilder {
    incoming: Vec<(ParticleID, FourMomentum)>,
    outgoing: Vec<(ParticleID, FourMomentum)>,
    colour: Vec<(i32, i32)>,
    weight: N64,
    cross_section: N64,
    cross_section_error: N64,
    channel: Option<ChannelKey>,
}

impl EventBuilder {
    pub fn new() -> Self {
        Self {
            weight: n64(0.0),
            cross_section: n64(0.0),
            cross_section_error: n64(0.0),
            ..Default::default()
        }
    }

    pub fn add_incoming(&mut self, pid: ParticleID, p: FourMomentum) -> &mut Self {
        self.incoming.push((pid, p));
        self
    }

    pub fn add_outgoing(&mut self, pid: ParticleID, p: FourMomentum, colour: (i32, i32)) -> &mut Self {
        self.outgoing.push((pid, p));
        self.colour.push(colour);
        self
    }

    pub fn weight(&mut self, w: N64) -> &mut Self {
        self.weight = w;
        self
    }

    pub fn cross_section(&mut self, xs: N64, err: N64) -> &mut Self {
        self.cross_section = xs;
        self.cross_section_error = err;
        self
    }

    pub fn channel(&mut self, key: ChannelKey) -> &mut Self {
        self.channel = Some(key);
        self
    }

    pub fn build(self) -> Event {
        Event {
            incoming: self.incoming,
            outgoing: self.outgoing,
            colour: self.colour,
            weight: self.weight,
            cross_section: self.cross_section,
            cross_section_error: self.cross_section_error,
            channel: self.channel.unwrap_or_else(|| ChannelKey::root(0, 0)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_roundtrips_fields() {
        let mut b = EventBuilder::new();
        b.add_incoming(ParticleID::new(11), FourMomentum::new())
            .add_outgoing(ParticleID::new(13), FourMomentum::new(), (0, 0))
            .weight(n64(2.5))
            .cross_section(n64(1.0), n64(0.1))
            .channel(ChannelKey::external(0, 3, 2));
        let ev = b.build();
        assert_eq!(ev.n_incoming(), 1);
        assert_eq!(ev.n_outgoing(), 1);
        assert_eq!(ev.weight, n64(2.5));
    }
}
