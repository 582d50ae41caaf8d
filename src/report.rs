//! Aggregate reporting for finished batch runs

use std::path::PathBuf;

use console::style;
use serde::Serialize;

use crate::batch::BatchResult;
use crate::processing::ConversionResult;

/// One failed file in a report, in the order the failure occurred
#[derive(Debug, Clone, Serialize)]
pub struct ReportError {
    pub file: PathBuf,
    pub message: String,
}

/// Summary of one batch conversion run, serializable for `--json` output
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub elapsed_seconds: f64,
    pub total_input_bytes: u64,
    pub total_output_bytes: u64,
    pub compression_ratio: f64,
    pub size_reduction_percent: f64,
    pub files_per_second: f64,
    pub errors: Vec<ReportError>,
}

impl BatchReport {
    /// Build a report from a finished batch run
    pub fn from_batch(result: &BatchResult<PathBuf, ConversionResult>) -> Self {
        let total_input_bytes: u64 = result
            .results
            .iter()
            .map(|r| r.original.file_size)
            .sum();
        let total_output_bytes: u64 = result.results.iter().map(|r| r.output.file_size).sum();

        let elapsed_seconds = result.elapsed.as_secs_f64();
        let compression_ratio = if total_output_bytes == 0 {
            1.0
        } else {
            total_input_bytes as f64 / total_output_bytes as f64
        };
        let size_reduction_percent = if total_input_bytes == 0 {
            0.0
        } else {
            total_input_bytes.saturating_sub(total_output_bytes) as f64
                / total_input_bytes as f64
                * 100.0
        };
        let files_per_second = if elapsed_seconds > 0.0 {
            result.successful as f64 / elapsed_seconds
        } else {
            0.0
        };

        let errors = result
            .errors
            .iter()
            .map(|record| ReportError {
                file: record.item.clone(),
                message: record.error.user_message(),
            })
            .collect();

        Self {
            total: result.total,
            successful: result.successful,
            failed: result.failed,
            elapsed_seconds,
            total_input_bytes,
            total_output_bytes,
            compression_ratio,
            size_reduction_percent,
            files_per_second,
            errors,
        }
    }

    /// Serialize the report as pretty JSON
    pub fn to_json(&self) -> crate::error::Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| crate::error::FastConvertError::SerdeError(e.to_string()))
    }

    /// Render the report for a terminal
    pub fn render(&self) -> String {
        let mut out = String::new();

        out.push_str(&format!("{}\n", style("Conversion Summary:").bold()));
        out.push_str(&format!(
            "  {}: {}\n",
            style("Converted").green(),
            self.successful
        ));
        if self.failed > 0 {
            out.push_str(&format!("  {}: {}\n", style("Failed").red(), self.failed));
        }
        out.push_str(&format!(
            "  {}: {:.2}s\n",
            style("Duration").blue(),
            self.elapsed_seconds
        ));

        if self.successful > 0 {
            out.push_str(&format!(
                "  {}: {:.2}MB -> {:.2}MB ({:.1}x, {:.1}% reduction)\n",
                style("Size").cyan(),
                self.total_input_bytes as f64 / 1024.0 / 1024.0,
                self.total_output_bytes as f64 / 1024.0 / 1024.0,
                self.compression_ratio,
                self.size_reduction_percent
            ));
            out.push_str(&format!(
                "  {}: {:.1} files/sec\n",
                style("Speed").cyan(),
                self.files_per_second
            ));
        }

        if !self.errors.is_empty() {
            out.push_str(&format!("\n{}\n", style("Errors:").bold()));
            for error in &self.errors {
                out.push_str(&format!("  {}: {}\n", error.file.display(), error.message));
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::ErrorRecord;
    use crate::config::ImageFormat;
    use crate::error::FastConvertError;
    use crate::processing::ImageInfo;
    use std::time::Duration;

    fn conversion(input_size: u64, output_size: u64) -> ConversionResult {
        let info = |format, file_size| ImageInfo {
            format,
            file_size,
            width: 10,
            height: 10,
        };
        ConversionResult {
            input_path: PathBuf::from("in.png"),
            output_path: PathBuf::from("out.webp"),
            original: info(ImageFormat::Png, input_size),
            output: info(ImageFormat::WebP, output_size),
            duration: Duration::from_millis(5),
        }
    }

    fn batch(
        results: Vec<ConversionResult>,
        errors: Vec<ErrorRecord<PathBuf>>,
    ) -> BatchResult<PathBuf, ConversionResult> {
        let successful = results.len();
        let failed = errors.len();
        BatchResult {
            total: successful + failed,
            successful,
            failed,
            results,
            errors,
            elapsed: Duration::from_secs(2),
        }
    }

    #[test]
    fn test_report_aggregates_sizes() {
        let result = batch(vec![conversion(1000, 400), conversion(3000, 600)], vec![]);
        let report = BatchReport::from_batch(&result);

        assert_eq!(report.total, 2);
        assert_eq!(report.total_input_bytes, 4000);
        assert_eq!(report.total_output_bytes, 1000);
        assert_eq!(report.compression_ratio, 4.0);
        assert_eq!(report.size_reduction_percent, 75.0);
        assert_eq!(report.files_per_second, 1.0);
    }

    #[test]
    fn test_report_carries_errors_in_order() {
        let errors = vec![
            ErrorRecord {
                item: PathBuf::from("bad2.png"),
                index: 2,
                error: FastConvertError::validation("corrupt", None),
                completed: 1,
                total: 3,
            },
            ErrorRecord {
                item: PathBuf::from("bad1.png"),
                index: 1,
                error: FastConvertError::validation("corrupt", None),
                completed: 3,
                total: 3,
            },
        ];
        let result = batch(vec![conversion(100, 50)], errors);
        let report = BatchReport::from_batch(&result);

        assert_eq!(report.failed, 2);
        assert_eq!(report.errors[0].file, PathBuf::from("bad2.png"));
        assert_eq!(report.errors[1].file, PathBuf::from("bad1.png"));
    }

    #[test]
    fn test_json_serialization() {
        let result = batch(vec![conversion(100, 50)], vec![]);
        let report = BatchReport::from_batch(&result);
        let json = report.to_json().unwrap();

        assert!(json.contains("\"successful\": 1"));
        assert!(json.contains("\"compression_ratio\""));
    }

    #[test]
    fn test_render_mentions_failures_only_when_present() {
        let clean = BatchReport::from_batch(&batch(vec![conversion(100, 50)], vec![]));
        assert!(!clean.render().contains("Failed"));

        let errors = vec![ErrorRecord {
            item: PathBuf::from("bad.png"),
            index: 0,
            error: FastConvertError::validation("corrupt", None),
            completed: 1,
            total: 1,
        }];
        let failed = BatchReport::from_batch(&batch(vec![], errors));
        let rendered = failed.render();
        assert!(rendered.contains("Failed"));
        assert!(rendered.contains("bad.png"));
    }
}
