//! 未払い通行料金の一括照会ライブラリ
//!
//! - ナンバープレートのリストをバッチに分け、照会ポータルで1件ずつ確認
//! - ページ本文から支払い状況・金額・通過日を抽出
//! - 進捗を別スレッド/タスクの観測側（UI・ログ）へ通知
//!
//! # 使用例
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use toll_scraper::{input, CheckerConfig, ProgressEvent, TollChecker};
//!
//! #[tokio::main]
//! async fn main() {
//!     let plates = input::load_plates("plates.txt").unwrap();
//!     let config = CheckerConfig::from_env().with_report_path("results.csv");
//!
//!     let checker = Arc::new(TollChecker::new(config));
//!     let (mut progress, handle) = checker.spawn(plates);
//!
//!     while let Some(event) = progress.recv().await {
//!         if let ProgressEvent::LogLine(line) = event {
//!             println!("{}", line);
//!         }
//!     }
//!
//!     let report = handle.await.unwrap().unwrap();
//!     println!("Report: {:?}", report.report_path);
//! }
//! ```

pub mod aggregate;
pub mod chrome;
pub mod config;
pub mod error;
pub mod extractor;
pub mod input;
pub mod pacing;
pub mod parse;
pub mod progress;
pub mod report;
pub mod scheduler;
pub mod service;
pub mod session;
pub mod traits;
pub mod types;

#[cfg(test)]
mod testing;

// 主要な型をリエクスポート
pub use aggregate::{aggregate, ResultAggregator};
pub use config::{CheckerConfig, Delay, EngineSpec, PacingConfig, TargetSite};
pub use error::ScraperError;
pub use extractor::PlateExtractor;
pub use pacing::PacingPolicy;
pub use progress::{ProgressEvent, ProgressReceiver, ProgressSender};
pub use report::CsvReport;
pub use scheduler::{BatchPlan, BatchScheduler};
pub use service::{CheckReport, CheckRequest, TollCheckService, TollChecker};
pub use session::SessionProvider;
pub use traits::{Pacing, PlatePage, ReportWriter, Session, SessionLauncher};
pub use types::{Amount, ExtractionResult, PaymentStatus, PlateRecord};
