use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::cli::ReportFormat;
use crate::recorder::SampleSet;

/// Writes the completed sample sequences to stdout or a file in the
/// specified format.
pub fn write_report(
    samples: &SampleSet,
    format: &ReportFormat,
    output_file: Option<&Path>,
) -> io::Result<()> {
    match output_file {
        Some(path) => {
            let f = File::create(path)?;
            let mut out = BufWriter::new(f);
            format_report(samples, format, &mut out)?;
            out.flush()
        }
        None => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            format_report(samples, format, &mut out)?;
            out.flush()
        }
    }
}

fn format_report(
    samples: &SampleSet,
    format: &ReportFormat,
    out: &mut dyn Write,
) -> io::Result<()> {
    match format {
        ReportFormat::Console => {
            writeln!(out, "Execution times (ns):")?;
            for t in &samples.execution_times {
                writeln!(out, "{}", t)?;
            }
            writeln!(out)?;
            writeln!(out, "Jitter (ns):")?;
            for j in &samples.jitter {
                writeln!(out, "{}", j)?;
            }
        }
        ReportFormat::Csv => {
            writeln!(out, "Sample,ExecutionTime(ns),Jitter(ns)")?;
            for (i, (t, j)) in samples
                .execution_times
                .iter()
                .zip(samples.jitter.iter())
                .enumerate()
            {
                writeln!(out, "{},{},{}", i, t, j)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_set() -> SampleSet {
        SampleSet {
            execution_times: vec![100, 200, 300],
            jitter: vec![0, 5, 10],
        }
    }

    fn format_to_string(samples: &SampleSet, fmt: &ReportFormat) -> String {
        let mut buf = Vec::new();
        format_report(samples, fmt, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_console() {
        let out = format_to_string(&sample_set(), &ReportFormat::Console);
        assert_eq!(
            out,
            "Execution times (ns):\n100\n200\n300\n\nJitter (ns):\n0\n5\n10\n"
        );
    }

    #[test]
    fn test_csv() {
        let out = format_to_string(&sample_set(), &ReportFormat::Csv);
        assert_eq!(
            out,
            "Sample,ExecutionTime(ns),Jitter(ns)\n0,100,0\n1,200,5\n2,300,10\n"
        );
    }

    #[test]
    fn test_csv_row_count_matches_samples() {
        let out = format_to_string(&sample_set(), &ReportFormat::Csv);
        assert_eq!(out.lines().count(), 4); // header + 3 rows
    }

    #[test]
    fn test_write_report_to_file() {
        let path = std::env::temp_dir().join("rtlat_test_report.csv");
        write_report(&sample_set(), &ReportFormat::Csv, Some(&path)).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("Sample,ExecutionTime(ns),Jitter(ns)\n"));
        let _ = std::fs::remove_file(&path);
    }
}
