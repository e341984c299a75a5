use crate::{
    loader::{self, Recording},
    parameters::AnalyseParameters,
};
use anyhow::{Context, Result, anyhow, bail};
use chrono::{DateTime, Utc};
use ibw_common::{Real, SampleIndex};
use serde::Serialize;
use signal_analysis::{
    AggregateSeries, AggregationError, PeakDetectionError, PeakParameters, aggregate, find_peaks,
};
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};
use tracing::{debug, info, instrument, warn};
use wave_decoder::TimeSeries;

#[derive(Debug, Serialize)]
pub(crate) struct RecordingSummary {
    pub(crate) file: String,
    pub(crate) name: String,
    pub(crate) format: String,
    pub(crate) samples: usize,
    pub(crate) sampling_interval: Real,
    pub(crate) start_offset: Real,
    pub(crate) data_units: String,
    pub(crate) time_units: String,
    pub(crate) created: Option<DateTime<Utc>>,
}

impl From<&Recording> for RecordingSummary {
    fn from(recording: &Recording) -> Self {
        let wave = &recording.wave;
        Self {
            file: recording.file_name(),
            name: wave.name().to_owned(),
            format: wave.version().to_string(),
            samples: wave.len(),
            sampling_interval: wave.sampling_interval(),
            start_offset: wave.start_offset(),
            data_units: wave.data_units().to_owned(),
            time_units: wave.time_units().to_owned(),
            created: wave.created(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct Spike {
    pub(crate) index: SampleIndex,
    pub(crate) time: Real,
    pub(crate) height: Real,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) prominence: Option<Real>,
}

#[derive(Debug, Serialize)]
pub(crate) struct Detection {
    pub(crate) file: String,
    pub(crate) spikes: Vec<Spike>,
}

#[derive(Debug, Serialize)]
pub(crate) struct Average {
    pub(crate) waves: usize,
    pub(crate) sampling_interval: Real,
    pub(crate) start_offset: Real,
    pub(crate) data_units: String,
    pub(crate) time_units: String,
    pub(crate) samples: Vec<Real>,
}

impl From<AggregateSeries> for Average {
    fn from(series: AggregateSeries) -> Self {
        Self {
            waves: series.wave_count(),
            sampling_interval: series.sampling_interval(),
            start_offset: series.start_offset(),
            data_units: series.data_units().to_owned(),
            time_units: series.time_units().to_owned(),
            samples: series.into_samples(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct Report {
    pub(crate) matched: usize,
    pub(crate) recordings: Vec<RecordingSummary>,
    pub(crate) average: Option<Average>,
    pub(crate) detections: Vec<Detection>,
}

/// Averages every decoded recording. A recording of a different length
/// aborts the analysis, as a partial average would be misleading.
fn average(recordings: &[Recording]) -> Result<Option<Average>> {
    if recordings.is_empty() {
        warn!("No recordings decoded, nothing to average");
        return Ok(None);
    }
    let waves: Vec<_> = recordings.iter().map(|recording| &recording.wave).collect();
    match aggregate(&waves) {
        Ok(series) => Ok(Some(series.into())),
        Err(error @ AggregationError::LengthMismatch { index, .. }) => {
            let file = recordings
                .get(index)
                .map(Recording::file_name)
                .unwrap_or_default();
            Err(anyhow!(error).context(format!("Cannot average {file}")))
        }
        Err(error) => Err(error.into()),
    }
}

/// The recordings spikes are detected in: all of them, or the one at `spike_file`
/// in the sorted listing.
fn select<'a>(
    recordings: &'a [Recording],
    spike_file: Option<usize>,
    matched: usize,
) -> Result<Vec<&'a Recording>> {
    let Some(position) = spike_file else {
        return Ok(recordings.iter().collect());
    };
    if position >= matched {
        bail!("Spike file {position} requested but only {matched} file(s) matched");
    }
    recordings
        .iter()
        .find(|recording| recording.position == position)
        .map(|recording| vec![recording])
        .ok_or_else(|| anyhow!("Spike file {position} could not be decoded"))
}

fn detect(recording: &Recording, parameters: &PeakParameters) -> Result<Option<Detection>> {
    let wave = &recording.wave;
    let peaks = match find_peaks(wave.samples(), parameters) {
        Ok(peaks) => peaks,
        Err(error @ PeakDetectionError::InvalidInput { .. }) => {
            warn!("No spikes detected in {}: {error}", recording.file_name());
            return Ok(None);
        }
        Err(error) => return Err(error.into()),
    };
    let spikes = peaks
        .into_iter()
        .map(|peak| Spike {
            index: peak.index,
            time: wave.time_at(peak.index),
            height: peak.height,
            prominence: peak.prominence,
        })
        .collect();
    Ok(Some(Detection {
        file: recording.file_name(),
        spikes,
    }))
}

pub(crate) fn build_report(parameters: &AnalyseParameters) -> Result<Report> {
    let paths = loader::list_recordings(&parameters.data_path, &parameters.pattern)?;
    if paths.is_empty() {
        warn!(
            "No files in {} match {}",
            parameters.data_path.display(),
            parameters.pattern
        );
    }
    let recordings = loader::load_recordings(&paths);
    info!(
        "Decoded {} of {} recording(s)",
        recordings.len(),
        paths.len()
    );

    let average = average(&recordings)?;
    let peak_parameters = parameters.peak_parameters();
    let mut detections = Vec::new();
    for recording in select(&recordings, parameters.spike_file, paths.len())? {
        detections.extend(detect(recording, &peak_parameters)?);
    }

    Ok(Report {
        matched: paths.len(),
        recordings: recordings.iter().map(RecordingSummary::from).collect(),
        average,
        detections,
    })
}

fn write_report(report: &Report, path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Cannot create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, report)?;
    writer.flush()?;
    info!("Report written to {}", path.display());
    Ok(())
}

fn log_summary(report: &Report) {
    if let Some(average) = &report.average {
        let (low, high) = average
            .samples
            .iter()
            .fold((Real::INFINITY, Real::NEG_INFINITY), |(low, high), &value| {
                (low.min(value), high.max(value))
            });
        info!(
            "Average of {} recording(s): {} samples, range {low} to {high} {}",
            average.waves,
            average.samples.len(),
            average.data_units
        );
    }
    for detection in &report.detections {
        info!("{}: {} spike(s)", detection.file, detection.spikes.len());
        for spike in &detection.spikes {
            debug!(
                "  sample {} at {}: {}",
                spike.index, spike.time, spike.height
            );
        }
    }
}

#[instrument(
    skip_all,
    fields(data_path = %parameters.data_path.display(), pattern = %parameters.pattern)
)]
pub(crate) fn analyse(parameters: &AnalyseParameters) -> Result<()> {
    let report = build_report(parameters)?;
    match &parameters.output {
        Some(path) => write_report(&report, path),
        None => {
            log_summary(&report);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::tests::{scratch_dir, write_wave};
    use assert_approx_eq::assert_approx_eq;
    use std::path::PathBuf;

    fn parameters(data_path: PathBuf) -> AnalyseParameters {
        AnalyseParameters {
            data_path,
            pattern: "*.ibw".to_owned(),
            spike_threshold: 2.0,
            min_distance: 0,
            min_prominence: 0.0,
            spike_file: None,
            output: None,
        }
    }

    #[test]
    fn averages_and_detects() {
        let dir = scratch_dir("analyse");
        write_wave(&dir, "a.ibw", &[0.0, 1.0, 3.0, 1.0, 0.0, 1.0, 5.0, 1.0, 0.0]);
        write_wave(&dir, "b.ibw", &[0.0, 3.0, 1.0, 1.0, 0.0, 1.0, 1.0, 1.0, 0.0]);

        let report = build_report(&parameters(dir)).unwrap();
        assert_eq!(report.matched, 2);
        assert_eq!(report.recordings[0].data_units, "mV");

        let average = report.average.unwrap();
        assert_eq!(average.waves, 2);
        assert_eq!(average.samples, vec![0.0, 2.0, 2.0, 1.0, 0.0, 1.0, 3.0, 1.0, 0.0]);

        assert_eq!(report.detections.len(), 2);
        let spikes = &report.detections[0].spikes;
        assert_eq!(spikes.len(), 2);
        assert_eq!(spikes[1].index, 6);
        assert_approx_eq!(spikes[1].time, 0.006);
        assert_approx_eq!(spikes[1].height, 5.0);
        assert_eq!(report.detections[1].spikes[0].index, 1);
    }

    #[test]
    fn single_spike_file() {
        let dir = scratch_dir("spike-file");
        write_wave(&dir, "a.ibw", &[0.0, 4.0, 0.0]);
        write_wave(&dir, "b.ibw", &[0.0, 9.0, 0.0]);
        let mut parameters = parameters(dir);
        parameters.spike_file = Some(1);

        let report = build_report(&parameters).unwrap();
        assert_eq!(report.detections.len(), 1);
        assert_eq!(report.detections[0].file, "b.ibw");

        parameters.spike_file = Some(2);
        assert!(build_report(&parameters).is_err());
    }

    #[test]
    fn length_mismatch_aborts() {
        let dir = scratch_dir("mismatch");
        write_wave(&dir, "a.ibw", &[0.0; 10]);
        write_wave(&dir, "b.ibw", &[0.0; 12]);
        let error = build_report(&parameters(dir)).unwrap_err();
        assert!(error.to_string().contains("b.ibw"));
        assert!(matches!(
            error.downcast_ref::<AggregationError>(),
            Some(AggregationError::LengthMismatch {
                expected: 10,
                index: 1,
                actual: 12
            })
        ));
    }

    #[test]
    fn empty_directory_gives_empty_report() {
        let report = build_report(&parameters(scratch_dir("empty"))).unwrap();
        assert_eq!(report.matched, 0);
        assert!(report.average.is_none());
        assert!(report.detections.is_empty());
    }

    #[test]
    fn report_written_as_json() {
        let dir = scratch_dir("json");
        write_wave(&dir, "a.ibw", &[0.0, 4.0, 0.0]);
        let output = dir.join("report.json");
        let mut parameters = parameters(dir);
        parameters.output = Some(output.clone());
        analyse(&parameters).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(output).unwrap()).unwrap();
        assert_eq!(json["matched"], 1);
        assert_eq!(json["detections"][0]["spikes"][0]["index"], 1);
        assert_eq!(json["recordings"][0]["format"], "IBW v5");
    }
}
