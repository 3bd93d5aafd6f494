use clap::Parser;

/// Command-line options for the demo process generator binary
/// (SPEC_FULL.md §2.4).
#[derive(Debug, Parser)]
#[command(name = "phasegen", version = phasegen::VERSION)]
pub struct Opt {
    /// Process specification, e.g. "e-,e+ > mu-,mu+"
    pub process: String,

    /// Beam center-of-mass energy in GeV
    #[arg(long, default_value_t = 500.0)]
    pub sqrt_s: f64,

    /// Number of events to generate
    #[arg(long, default_value_t = 10_000)]
    pub n_events: u64,

    /// Initial-state family (partonic, ep_em, pp, pp_bar, p_bar_p, p_bar_p_bar)
    #[arg(long, default_value = "partonic")]
    pub initial_state: String,

    /// Minimum transverse momentum applied to every outgoing leg (GeV)
    #[arg(long)]
    pub min_pt: Option<f64>,

    /// Maximum |pseudorapidity| applied to every outgoing leg
    #[arg(long)]
    pub max_eta: Option<f64>,

    /// RNG seed
    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    /// Log level passed through to `env_logger` (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub loglevel: String,
}
