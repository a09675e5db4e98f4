use crate::domain::model::AnalysisResult;
use crate::utils::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Csv,
    Tsv,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Tsv => "tsv",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            "tsv" => Ok(OutputFormat::Tsv),
            other => Err(AppError::InvalidConfigValueError {
                field: "format".to_string(),
                value: other.to_string(),
                reason: "Unsupported format. Valid formats: json, csv, tsv".to_string(),
            }),
        }
    }
}

const HEADERS: [&str; 11] = [
    "quarter",
    "capital_level",
    "asset_level",
    "liability_level",
    "us10y_level",
    "kr10y_level",
    "capital_qoq",
    "us10y_change",
    "kr10y_change",
    "us10y_duration",
    "kr10y_duration",
];

fn cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn at(series: &[Option<f64>], index: usize) -> Option<f64> {
    series.get(index).copied().flatten()
}

/// 依格式輸出分析結果
pub fn render(result: &AnalysisResult, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(result)?),
        OutputFormat::Csv => render_delimited(result, b','),
        OutputFormat::Tsv => render_delimited(result, b'\t'),
    }
}

/// 每季一列，最後附一列 median 摘要
fn render_delimited(result: &AnalysisResult, delimiter: u8) -> Result<String> {
    let mut writer = csv::WriterBuilder::new().delimiter(delimiter).from_writer(Vec::new());
    writer.write_record(HEADERS)?;

    for (index, quarter) in result.quarters.iter().enumerate() {
        let mut row = vec![quarter.format("%Y-%m-%d").to_string()];
        row.extend(
            [
                at(&result.capital_level, index),
                at(&result.asset_level, index),
                at(&result.liability_level, index),
                at(&result.us10y_level, index),
                at(&result.kr10y_level, index),
                at(&result.capital_qoq, index),
                at(&result.us10y_change, index),
                at(&result.kr10y_change, index),
                at(&result.duration.us10y.series, index),
                at(&result.duration.kr10y.series, index),
            ]
            .into_iter()
            .map(cell),
        );
        writer.write_record(&row)?;
    }

    let mut summary = vec![String::new(); HEADERS.len()];
    summary[0] = "median".to_string();
    summary[9] = cell(result.duration.us10y.summary);
    summary[10] = cell(result.duration.kr10y.summary);
    writer.write_record(&summary)?;

    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::IoError(io::Error::new(e.error().kind(), e.error().to_string())))?;
    String::from_utf8(bytes)
        .map_err(|e| AppError::IoError(io::Error::new(io::ErrorKind::InvalidData, e)))
}
