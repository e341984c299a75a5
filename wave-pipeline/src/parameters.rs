use clap::{Parser, Subcommand, ValueEnum};
use ibw_common::Real;
use signal_analysis::PeakParameters;
use std::path::PathBuf;
use wave_decoder::{FormatVersion, NumericType};

#[derive(Debug, Clone, Parser)]
pub(crate) struct AnalyseParameters {
    /// Directory containing the recordings
    #[clap(long)]
    pub(crate) data_path: PathBuf,

    /// Glob pattern selecting recordings within `data-path`
    #[clap(long, default_value = "*.ibw")]
    pub(crate) pattern: String,

    /// Minimum height of a spike, in the data units of the recording
    #[clap(long, default_value = "-10", allow_hyphen_values = true)]
    pub(crate) spike_threshold: Real,

    /// Minimum number of samples between reported spikes, 0 disables
    #[clap(long, default_value = "0")]
    pub(crate) min_distance: usize,

    /// Minimum prominence of a reported spike, 0 disables
    #[clap(long, default_value = "0")]
    pub(crate) min_prominence: Real,

    /// Only detect spikes in the recording at this position of the sorted file list
    #[clap(long)]
    pub(crate) spike_file: Option<usize>,

    /// Write the report as JSON to this file rather than logging a summary
    #[clap(long)]
    pub(crate) output: Option<PathBuf>,
}

impl AnalyseParameters {
    pub(crate) fn peak_parameters(&self) -> PeakParameters {
        PeakParameters::new(self.spike_threshold)
            .with_min_distance(self.min_distance)
            .with_min_prominence(self.min_prominence)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum SimulatedVersion {
    V2,
    V5,
}

impl From<SimulatedVersion> for FormatVersion {
    fn from(value: SimulatedVersion) -> Self {
        match value {
            SimulatedVersion::V2 => FormatVersion::V2,
            SimulatedVersion::V5 => FormatVersion::V5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum SimulatedType {
    F32,
    I16,
}

impl From<SimulatedType> for NumericType {
    fn from(value: SimulatedType) -> Self {
        match value {
            SimulatedType::F32 => NumericType::Float32,
            SimulatedType::I16 => NumericType::Int16,
        }
    }
}

#[derive(Debug, Clone, Parser)]
pub(crate) struct SimulateParameters {
    /// Directory the recordings are written to, created if missing
    #[clap(long)]
    pub(crate) output_path: PathBuf,

    /// Number of recordings to write
    #[clap(long, default_value = "5")]
    pub(crate) count: usize,

    /// Number of samples in each recording
    #[clap(long, default_value = "20000")]
    pub(crate) samples: usize,

    /// Time between samples in seconds
    #[clap(long, default_value = "0.00005")]
    pub(crate) sampling_interval: Real,

    /// Resting level in mV
    #[clap(long, default_value = "-65", allow_hyphen_values = true)]
    pub(crate) baseline: Real,

    /// Standard deviation of the Gaussian noise in mV
    #[clap(long, default_value = "1.5")]
    pub(crate) noise: Real,

    /// Number of spikes in each recording
    #[clap(long, default_value = "12")]
    pub(crate) spikes: usize,

    /// Height of a spike above the baseline in mV
    #[clap(long, default_value = "90")]
    pub(crate) spike_amplitude: Real,

    /// Rise and decay time constants of a spike, in samples
    #[clap(long, default_value = "3", value_name = "SAMPLES")]
    pub(crate) spike_rise: Real,

    #[clap(long, default_value = "12", value_name = "SAMPLES")]
    pub(crate) spike_decay: Real,

    #[clap(long, value_enum, default_value_t = SimulatedVersion::V5)]
    pub(crate) format_version: SimulatedVersion,

    /// Storage type. Integer storage rounds each sample and records
    /// a full scale of +/- `full-scale` mV
    #[clap(long, value_enum, default_value_t = SimulatedType::F32)]
    pub(crate) storage: SimulatedType,

    #[clap(long, default_value = "200")]
    pub(crate) full_scale: Real,

    /// Seed for reproducible recordings
    #[clap(long)]
    pub(crate) seed: Option<u64>,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Mode {
    #[clap(about = "Decodes recordings, averages them and detects spikes.")]
    Analyse(AnalyseParameters),
    #[clap(about = "Writes synthetic recordings with noise and spikes.")]
    Simulate(SimulateParameters),
}
