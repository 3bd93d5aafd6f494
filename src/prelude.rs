pub use crate::{
    bitstring::ChannelKey,
    config::{Config, ConfigBuilder, InitialState, PhaseSpaceGeneratorKind},
    cuts::Cuts,
    error::{PhaseSpaceError, Result},
    event::{Event, EventBuilder},
    initial_state::InitialStateSampler,
    model::{HelicityColourSampler, MatrixElement, Model, NoPdf, ParticleSpecies, PartonDistribution},
    momentum::FourMomentum,
    process::{CrossSectionEstimator, ProcessGenerator},
};
