use crate::parameters::{SimulateParameters, SimulatedType};
use anyhow::{Context, Result, bail};
use chrono::Utc;
use ibw_common::Real;
use rand::{Rng, SeedableRng, rngs::StdRng};
use rand_distr::{Distribution, Normal};
use tracing::{debug, info, instrument};
use wave_decoder::{NumericType, WaveWriter};

/// A spike of the form `coef * (exp(-t/decay) - exp(-t/rise))`, starting at `start`.
#[derive(Debug, Clone)]
pub(crate) struct Spike {
    start: Real,
    rise: Real,
    decay: Real,
    coef: Real,
}

impl Spike {
    /// Requires `0 < rise < decay`.
    pub(crate) fn new(start: Real, rise: Real, decay: Real, height: Real) -> Self {
        let peak_time = (decay / rise).ln() * decay * rise / (decay - rise);
        let peak_value = (-peak_time / decay).exp() - (-peak_time / rise).exp();
        Self {
            start,
            rise,
            decay,
            coef: height / peak_value,
        }
    }

    pub(crate) fn value_at(&self, sample: Real) -> Real {
        let t = sample - self.start;
        if t < 0.0 {
            0.0
        } else {
            self.coef * ((-t / self.decay).exp() - (-t / self.rise).exp())
        }
    }
}

fn synthesise(
    parameters: &SimulateParameters,
    noise: &Normal<Real>,
    rng: &mut StdRng,
) -> Vec<Real> {
    let spikes: Vec<Spike> = (0..parameters.spikes)
        .map(|_| {
            Spike::new(
                rng.random_range(0.0..parameters.samples as Real),
                parameters.spike_rise,
                parameters.spike_decay,
                parameters.spike_amplitude,
            )
        })
        .collect();
    (0..parameters.samples)
        .map(|index| {
            let sample = index as Real;
            parameters.baseline
                + noise.sample(rng)
                + spikes
                    .iter()
                    .map(|spike| spike.value_at(sample))
                    .sum::<Real>()
        })
        .collect()
}

fn writer(parameters: &SimulateParameters) -> WaveWriter {
    let writer = WaveWriter::new(parameters.format_version.into())
        .with_numeric_type(NumericType::from(parameters.storage))
        .with_timing(parameters.sampling_interval, 0.0)
        .with_units("mV", "s");
    let full_scale = parameters.full_scale;
    match parameters.storage {
        SimulatedType::I16 => writer.with_full_scale(-full_scale, full_scale),
        SimulatedType::F32 => writer,
    }
}

#[instrument(skip_all, fields(output_path = %parameters.output_path.display()))]
pub(crate) fn simulate(parameters: &SimulateParameters) -> Result<()> {
    if parameters.samples == 0 {
        bail!("Recordings need at least one sample");
    }
    if !(parameters.spike_rise > 0.0 && parameters.spike_rise < parameters.spike_decay) {
        bail!(
            "Spike rise {} must be positive and shorter than the decay {}",
            parameters.spike_rise,
            parameters.spike_decay
        );
    }
    std::fs::create_dir_all(&parameters.output_path)
        .with_context(|| format!("Cannot create {}", parameters.output_path.display()))?;

    let mut rng = match parameters.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let noise = Normal::new(0.0, parameters.noise)?;
    let writer = writer(parameters);

    for index in 0..parameters.count {
        let name = format!("recording_{index:03}");
        let samples = synthesise(parameters, &noise, &mut rng);
        let bytes = writer
            .clone()
            .with_name(&name)
            .with_creation_date(Utc::now())
            .encode(&samples)?;
        let path = parameters.output_path.join(format!("{name}.ibw"));
        std::fs::write(&path, &bytes).with_context(|| format!("Cannot write {}", path.display()))?;
        debug!("Wrote {} ({} bytes)", path.display(), bytes.len());
    }
    info!("Wrote {} recording(s)", parameters.count);
    Ok(())
}
