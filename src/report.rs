//! 結果レポート出力

use std::path::PathBuf;

use chrono::{DateTime, Local};
use csv::Writer;
use tracing::info;

use crate::error::ScraperError;
use crate::traits::ReportWriter;
use crate::types::ExtractionResult;

const HEADER: [&str; 7] = [
    "Checked at",
    "Plate",
    "Category",
    "Owner",
    "Status",
    "Amount",
    "Passage dates",
];

/// CSV形式のレポート
#[derive(Debug, Clone)]
pub struct CsvReport {
    path: PathBuf,
}

impl CsvReport {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ReportWriter for CsvReport {
    fn write(
        &self,
        results: &[ExtractionResult],
        checked_at: DateTime<Local>,
    ) -> Result<PathBuf, ScraperError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let checked_at = checked_at.format("%Y-%m-%d %H:%M:%S").to_string();
        let mut writer = Writer::from_path(&self.path)?;
        writer.write_record(HEADER)?;

        for result in results {
            let dates = if result.passage_dates.is_empty() {
                "N/A".to_string()
            } else {
                result.formatted_dates().join(", ")
            };
            let status = result.status.to_string();
            let amount = result.amount.to_string();
            writer.write_record([
                checked_at.as_str(),
                result.identifier.as_str(),
                result.category.as_deref().unwrap_or(""),
                result.owner.as_deref().unwrap_or(""),
                status.as_str(),
                amount.as_str(),
                dates.as_str(),
            ])?;
        }

        writer
            .flush()
            .map_err(|e| ScraperError::Report(format!("{}: {}", self.path.display(), e)))?;
        info!("レポート出力完了: {:?} ({} 件)", self.path, results.len());
        Ok(self.path.clone())
    }
}

/// 最終結果の一覧をログ出力
pub fn log_summary(results: &[ExtractionResult]) {
    info!("=== 照会結果一覧 ===");
    for result in results {
        let dates = result.formatted_dates();
        info!(
            "{} -> {} (金額: {}), 通過日: {}",
            result.identifier,
            result.status,
            result.amount,
            if dates.is_empty() {
                "N/A".to_string()
            } else {
                dates.join(", ")
            }
        );
    }
}
