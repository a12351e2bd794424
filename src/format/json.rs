//! JSON and JSON Lines output formatters

use serde_json::json;

use super::{FindResult, ImageInfo, ReportFormatter};
use crate::ExeError;

impl ReportFormatter for super::JsonFormatter {
    fn format_info(&self, info: &ImageInfo) -> Result<String, ExeError> {
        Ok(serde_json::to_string_pretty(info)?)
    }

    fn format_results(&self, results: &[FindResult]) -> Result<String, ExeError> {
        let result = json!({
            "searched": results.len(),
            "found": results.iter().filter(|r| r.found).count(),
            "results": results,
        });
        Ok(serde_json::to_string_pretty(&result)?)
    }
}

impl ReportFormatter for super::JsonLinesFormatter {
    fn format_info(&self, info: &ImageInfo) -> Result<String, ExeError> {
        Ok(format!("{}\n", serde_json::to_string(info)?))
    }

    fn format_results(&self, results: &[FindResult]) -> Result<String, ExeError> {
        let mut output = String::new();
        for result in results {
            output.push_str(&serde_json::to_string(result)?);
            output.push('\n');
        }
        Ok(output)
    }
}
