use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use chrono::{DateTime, Local};
use tokio::task::JoinHandle;
use tower::Service;
use tracing::{error, info};

use crate::config::CheckerConfig;
use crate::error::ScraperError;
use crate::pacing::PacingPolicy;
use crate::progress::{self, ProgressReceiver, ProgressSender};
use crate::report::{self, CsvReport};
use crate::scheduler::BatchScheduler;
use crate::session::SessionProvider;
use crate::traits::{Pacing, ReportWriter};
use crate::types::{ExtractionResult, PlateRecord};

/// 照会結果
#[derive(Debug, Clone)]
pub struct CheckReport {
    /// プレート順に並んだ結果（入力1件につき1件）
    pub results: Vec<ExtractionResult>,
    pub checked_at: DateTime<Local>,
    /// レポートを書き出した場合のパス
    pub report_path: Option<PathBuf>,
    pub nothing_due: usize,
    pub due: usize,
    pub failed: usize,
}

/// 照会パイプライン（バッチ処理 → 集約 → レポート出力）
pub struct TollChecker {
    config: CheckerConfig,
    provider: Arc<SessionProvider>,
    pacing: Arc<dyn Pacing>,
    reporter: Option<Arc<dyn ReportWriter>>,
}

impl TollChecker {
    pub fn new(config: CheckerConfig) -> Self {
        let provider = Arc::new(SessionProvider::from_config(&config));
        let pacing: Arc<dyn Pacing> = Arc::new(PacingPolicy::new(config.pacing.clone()));
        let reporter = config
            .report_path
            .clone()
            .map(|path| Arc::new(CsvReport::new(path)) as Arc<dyn ReportWriter>);

        Self {
            config,
            provider,
            pacing,
            reporter,
        }
    }

    pub fn with_provider(mut self, provider: SessionProvider) -> Self {
        self.provider = Arc::new(provider);
        self
    }

    pub fn with_pacing(mut self, pacing: Arc<dyn Pacing>) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn ReportWriter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    pub fn config(&self) -> &CheckerConfig {
        &self.config
    }

    /// 全プレートを照会し、結果をプレート順で返す
    ///
    /// 入力が空なら何もせず `EmptyInput`。ブラウザが起動できなければ
    /// `NoEngineAvailable` で打ち切る（途中までの結果は返さない）。
    pub async fn run(
        &self,
        plates: Vec<PlateRecord>,
        progress: ProgressSender,
    ) -> Result<CheckReport, ScraperError> {
        let scheduler = BatchScheduler::new(
            self.config.clone(),
            self.provider.clone(),
            self.pacing.clone(),
        );
        let aggregator = scheduler.run(&plates, &progress).await?;

        let (nothing_due, due, failed) = aggregator.counts();
        let results = aggregator.finish();
        let checked_at = Local::now();
        report::log_summary(&results);

        let report_path = match &self.reporter {
            Some(reporter) => match reporter.write(&results, checked_at) {
                Ok(path) => {
                    progress.log(format!("Report saved to {}", path.display()));
                    Some(path)
                }
                Err(e) => {
                    error!("レポート出力失敗: {}", e);
                    progress.log(format!("Report not saved: {}", e));
                    None
                }
            },
            None => None,
        };

        info!(
            "照会完了: {} 件 (未払いなし {} / 未払いあり {} / 失敗 {})",
            results.len(),
            nothing_due,
            due,
            failed
        );
        progress.completed();

        Ok(CheckReport {
            results,
            checked_at,
            report_path,
            nothing_due,
            due,
            failed,
        })
    }

    /// 別タスクで照会を実行し、進捗の受信側を返す
    pub fn spawn(
        self: Arc<Self>,
        plates: Vec<PlateRecord>,
    ) -> (ProgressReceiver, JoinHandle<Result<CheckReport, ScraperError>>) {
        let (tx, rx) = progress::channel();
        let handle = tokio::spawn(async move { self.run(plates, tx).await });
        (rx, handle)
    }
}

/// 照会リクエスト
#[derive(Debug, Clone)]
pub struct CheckRequest {
    pub plates: Vec<PlateRecord>,
    pub progress: Option<ProgressSender>,
}

impl CheckRequest {
    pub fn new(plates: Vec<PlateRecord>) -> Self {
        Self {
            plates,
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: ProgressSender) -> Self {
        self.progress = Some(progress);
        self
    }
}

/// tower::Serviceを実装した照会サービス
#[derive(Clone)]
pub struct TollCheckService {
    checker: Arc<TollChecker>,
}

impl TollCheckService {
    pub fn new(config: CheckerConfig) -> Self {
        Self::from_checker(TollChecker::new(config))
    }

    pub fn from_checker(checker: TollChecker) -> Self {
        Self {
            checker: Arc::new(checker),
        }
    }
}

impl Service<CheckRequest> for TollCheckService {
    type Response = CheckReport;
    type Error = ScraperError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: CheckRequest) -> Self::Future {
        info!("照会リクエスト受信: {} 件", req.plates.len());

        let checker = self.checker.clone();
        Box::pin(async move {
            let progress = match req.progress {
                Some(progress) => progress,
                None => progress::channel().0,
            };
            checker.run(req.plates, progress).await
        })
    }
}
