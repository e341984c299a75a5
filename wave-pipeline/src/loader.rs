use anyhow::Result;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};
use wave_decoder::{DecodeError, TimeSeries, Wave};

#[derive(Debug, Error)]
pub(crate) enum LoadError {
    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Cannot decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: DecodeError,
    },
}

/// A decoded recording and where it came from.
#[derive(Debug)]
pub(crate) struct Recording {
    /// Position of the file in the sorted listing.
    pub(crate) position: usize,
    pub(crate) path: PathBuf,
    pub(crate) wave: Wave,
}

impl Recording {
    pub(crate) fn file_name(&self) -> String {
        self.path
            .file_name()
            .unwrap_or(self.path.as_os_str())
            .to_string_lossy()
            .into_owned()
    }
}

/// Paths in `data_path` matching `pattern`, sorted. Only `pattern` is
/// interpreted as a glob; `data_path` is matched literally.
pub(crate) fn list_recordings(data_path: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let escaped = glob::Pattern::escape(&data_path.to_string_lossy());
    let glob_pattern = Path::new(&escaped).join(pattern);
    let mut paths = glob::glob(&glob_pattern.to_string_lossy())?
        .collect::<Result<Vec<_>, _>>()?;
    paths.sort();
    debug!("{} file(s) match {}", paths.len(), glob_pattern.display());
    Ok(paths)
}

fn load_wave(path: &Path) -> Result<Wave, LoadError> {
    let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_owned(),
        source,
    })?;
    wave_decoder::decode(&bytes).map_err(|source| LoadError::Decode {
        path: path.to_owned(),
        source,
    })
}

fn report_skipped(error: &LoadError) {
    match error {
        LoadError::Decode {
            source: DecodeError::EmptyWave,
            ..
        } => info!("Skipping: {error}"),
        LoadError::Decode {
            source: DecodeError::UnsupportedFormat(_),
            ..
        } => warn!("Skipping unsupported recording. {error}"),
        LoadError::Decode { .. } => warn!("Skipping damaged recording. {error}"),
        LoadError::Io { .. } => warn!("Skipping unreadable file. {error}"),
    }
}

/// Decodes `paths` in parallel. Files that cannot be read or decoded are logged
/// and left out; the rest keep the order of `paths`.
pub(crate) fn load_recordings(paths: &[PathBuf]) -> Vec<Recording> {
    paths
        .par_iter()
        .map(|path| load_wave(path))
        .collect::<Vec<_>>()
        .into_iter()
        .zip(paths)
        .enumerate()
        .filter_map(|(position, (result, path))| match result {
            Ok(wave) => {
                debug!(
                    "Decoded {} ({}, {} samples)",
                    path.display(),
                    wave.version(),
                    wave.len()
                );
                Some(Recording {
                    position,
                    path: path.clone(),
                    wave,
                })
            }
            Err(error) => {
                report_skipped(&error);
                None
            }
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use wave_decoder::{FormatVersion, WaveWriter};

    /// An empty directory unique to the calling test.
    pub(crate) fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("wave-pipeline-{}-{name}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    pub(crate) fn write_wave(dir: &Path, file: &str, samples: &[f64]) -> PathBuf {
        let path = dir.join(file);
        let bytes = WaveWriter::new(FormatVersion::V5)
            .with_timing(0.001, 0.0)
            .with_units("mV", "s")
            .encode(samples)
            .unwrap();
        std::fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn listing_is_sorted_and_filtered() {
        let dir = scratch_dir("listing");
        for file in ["b.ibw", "a.ibw", "c.txt"] {
            std::fs::write(dir.join(file), b"").unwrap();
        }
        let paths = list_recordings(&dir, "*.ibw").unwrap();
        assert_eq!(paths, vec![dir.join("a.ibw"), dir.join("b.ibw")]);
    }

    #[test]
    fn data_path_is_matched_literally() {
        let dir = scratch_dir("run-[1]*?");
        write_wave(&dir, "a.ibw", &[1.0, 2.0, 1.0]);
        let paths = list_recordings(&dir, "*.ibw").unwrap();
        assert_eq!(paths, vec![dir.join("a.ibw")]);
    }

    #[test]
    fn undecodable_files_are_skipped() {
        let dir = scratch_dir("skipping");
        write_wave(&dir, "a.ibw", &[1.0, 2.0, 1.0]);
        std::fs::write(dir.join("b.ibw"), b"not a wave").unwrap();
        let empty = WaveWriter::new(FormatVersion::V2).encode_empty().unwrap();
        std::fs::write(dir.join("c.ibw"), empty).unwrap();
        write_wave(&dir, "d.ibw", &[3.0, 4.0, 3.0]);

        let paths = list_recordings(&dir, "*.ibw").unwrap();
        let recordings = load_recordings(&paths);
        let positions: Vec<usize> = recordings.iter().map(|r| r.position).collect();
        assert_eq!(positions, vec![0, 3]);
        assert_eq!(recordings[1].file_name(), "d.ibw");
        assert_eq!(recordings[1].wave.samples(), &[3.0, 4.0, 3.0]);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = scratch_dir("missing");
        assert!(matches!(
            load_wave(&dir.join("absent.ibw")),
            Err(LoadError::Io { .. })
        ));
    }
}
