use crate::core::models::sample::EnergySample;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SampleIoError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Writes samples as CSV with a header row, one sample per line.
pub fn write_samples<'a, W, I>(writer: W, samples: I) -> Result<(), SampleIoError>
where
    W: Write,
    I: IntoIterator<Item = &'a EnergySample>,
{
    let mut csv_writer = csv::Writer::from_writer(writer);
    for sample in samples {
        csv_writer.serialize(sample)?;
    }
    csv_writer.flush().map_err(|e| SampleIoError::Io {
        path: "<writer>".to_string(),
        source: e,
    })?;
    Ok(())
}

pub fn write_samples_to_path<'a, I>(path: &Path, samples: I) -> Result<(), SampleIoError>
where
    I: IntoIterator<Item = &'a EnergySample>,
{
    let file = File::create(path).map_err(|e| SampleIoError::Io {
        path: path.to_string_lossy().to_string(),
        source: e,
    })?;
    write_samples(file, samples)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_header_and_rows() {
        let samples = vec![
            EnergySample::new(0, 0.2, -60.0, 0.0),
            EnergySample::new(1, 0.4, -58.5, 0.001),
        ];
        let mut buffer = Vec::new();
        write_samples(&mut buffer, &samples).unwrap();

        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "sequence,time,dihedral_degrees,raw_energy,energy");
        assert_eq!(lines[1], "0,0.2,-60.0,0.0,99403.0");
    }

    #[test]
    fn empty_input_writes_nothing() {
        let mut buffer = Vec::new();
        write_samples(&mut buffer, &Vec::<EnergySample>::new()).unwrap();
        assert!(buffer.is_empty());
    }

    #[test]
    fn write_to_path_creates_readable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("samples.csv");
        let samples = [EnergySample::new(7, 1.4, 12.5, -0.5)];
        write_samples_to_path(&path, &samples).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let parsed: Vec<EnergySample> = reader.deserialize().map(|r| r.unwrap()).collect();
        assert_eq!(parsed, samples.to_vec());
    }

    #[test]
    fn write_to_invalid_path_reports_io_error() {
        let result = write_samples_to_path(Path::new("/nonexistent/dir/out.csv"), &[]);
        assert!(matches!(result, Err(SampleIoError::Io { .. })));
    }
}
