//! バッチ処理
//!
//! プレートリストを固定サイズのバッチに分け、バッチごとに新しいブラウザを
//! 起動して順番に照会する。照会先はレート制限があるため並行処理はしない。

use std::sync::Arc;

use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::aggregate::ResultAggregator;
use crate::config::CheckerConfig;
use crate::error::ScraperError;
use crate::extractor::PlateExtractor;
use crate::progress::ProgressSender;
use crate::session::SessionProvider;
use crate::traits::Pacing;
use crate::types::PlateRecord;

/// 入力順を保ったバッチ分割
#[derive(Debug, Clone)]
pub struct BatchPlan<'a> {
    batches: Vec<&'a [PlateRecord]>,
}

impl<'a> BatchPlan<'a> {
    pub fn new(plates: &'a [PlateRecord], batch_size: usize) -> Self {
        Self {
            batches: plates.chunks(batch_size.max(1)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a [PlateRecord]> + '_ {
        self.batches.iter().copied()
    }
}

pub struct BatchScheduler {
    config: CheckerConfig,
    provider: Arc<SessionProvider>,
    pacing: Arc<dyn Pacing>,
}

impl BatchScheduler {
    pub fn new(config: CheckerConfig, provider: Arc<SessionProvider>, pacing: Arc<dyn Pacing>) -> Self {
        Self {
            config,
            provider,
            pacing,
        }
    }

    /// 全プレートを照会する
    ///
    /// ブラウザが1つも起動できなければその時点で打ち切る。
    pub async fn run(
        &self,
        plates: &[PlateRecord],
        progress: &ProgressSender,
    ) -> Result<ResultAggregator, ScraperError> {
        if plates.is_empty() {
            warn!("照会対象のプレートがありません");
            return Err(ScraperError::EmptyInput);
        }

        let plan = BatchPlan::new(plates, self.config.batch_size);
        let total_batches = plan.len();
        let extractor = PlateExtractor::new(&self.config, self.pacing.clone(), progress.clone());
        let mut aggregator = ResultAggregator::with_capacity(plates.len());

        info!(
            "照会開始: {} 件を {} バッチ (最大 {} 件/バッチ) で処理",
            plates.len(),
            total_batches,
            self.config.batch_size
        );

        for (index, batch) in plan.iter().enumerate() {
            let header = format!(
                "=== Batch {}/{}, {} plates ===",
                index + 1,
                total_batches,
                batch.len()
            );
            info!("バッチ {}/{} 開始 ({} 件)", index + 1, total_batches, batch.len());
            progress.log(header);

            let mut session = match self.provider.acquire().await {
                Ok(session) => session,
                Err(e) => {
                    error!("バッチ {} で処理を中断: {}", index + 1, e);
                    progress.log(format!("Aborted: {}", e));
                    return Err(e);
                }
            };

            for plate in batch {
                progress.current_item(plate.identifier.as_str());
                let result = extractor.extract(session.as_ref(), plate).await;
                aggregator.push(result);
                progress.incremented(1);
            }

            if let Err(e) = session.close().await {
                warn!("バッチ {} 後のブラウザ終了に失敗: {}", index + 1, e);
            }

            if index + 1 < total_batches {
                let delay = self.pacing.inter_batch_delay();
                info!("次のバッチまで {:?} 待機中...", delay);
                progress.log(format!("Waiting {}s before next batch...", delay.as_secs()));
                sleep(delay).await;

                if self.pacing.long_cooldown_due(index, total_batches) {
                    let cooldown = self.pacing.long_cooldown();
                    info!("長時間休止: {:?}", cooldown);
                    progress.log(format!("Long pause of {}s...", cooldown.as_secs()));
                    sleep(cooldown).await;
                }
            }
        }

        Ok(aggregator)
    }
}
