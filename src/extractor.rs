//! 1プレート分の照会
//!
//! ページ操作 → 本文取得 → 解析までを行い、どんな失敗も
//! `PaymentStatus::Error` の結果に変換して返す。

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::{CheckerConfig, TargetSite};
use crate::error::ScraperError;
use crate::parse;
use crate::progress::ProgressSender;
use crate::traits::{Pacing, PlatePage, Session};
use crate::types::{ExtractionResult, PageReading, PaymentStatus, PlateRecord};

pub struct PlateExtractor {
    site: TargetSite,
    navigation_timeout: Duration,
    input_timeout: Duration,
    cookie_timeout: Duration,
    settle_time: Duration,
    debug: bool,
    pacing: Arc<dyn Pacing>,
    progress: ProgressSender,
}

impl PlateExtractor {
    pub fn new(config: &CheckerConfig, pacing: Arc<dyn Pacing>, progress: ProgressSender) -> Self {
        Self {
            site: config.site.clone(),
            navigation_timeout: config.navigation_timeout,
            input_timeout: config.input_timeout,
            cookie_timeout: config.cookie_timeout,
            settle_time: config.settle_time,
            debug: config.debug,
            pacing,
            progress,
        }
    }

    /// プレートを照会して結果を返す。エラーで中断することはない
    pub async fn extract(&self, session: &dyn Session, plate: &PlateRecord) -> ExtractionResult {
        let outcome = match session.new_page().await {
            Ok(page) => {
                let outcome = AssertUnwindSafe(self.check_plate(page.as_ref(), plate))
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|panic| Err(ScraperError::Interaction(panic_message(&*panic))));

                if outcome.is_err() && self.debug {
                    self.log_screenshot(page.as_ref(), plate).await;
                }

                // 成否に関わらずページを閉じる
                if let Err(e) = page.close().await {
                    debug!("{}: ページクローズ失敗: {}", plate.identifier, e);
                }
                outcome
            }
            Err(e) => Err(e),
        };

        let result = match outcome {
            Ok(reading) => {
                self.report_reading(plate, &reading);
                ExtractionResult::from_reading(plate, reading)
            }
            Err(e) => {
                warn!("{}: 照会失敗: {}", plate.identifier, e);
                self.progress.log(format!("{}: error - {}", plate.identifier, e));
                ExtractionResult::failed(plate)
            }
        };

        sleep(self.pacing.inter_plate_delay()).await;
        result
    }

    async fn check_plate(
        &self,
        page: &dyn PlatePage,
        plate: &PlateRecord,
    ) -> Result<PageReading, ScraperError> {
        debug!("{}: {} を開いています", plate.identifier, self.site.url);
        page.goto(&self.site.url, self.navigation_timeout).await?;

        self.dismiss_cookies(page).await;

        // プレート入力
        page.wait_for(&self.site.plate_input, self.input_timeout)
            .await?;
        page.fill(&self.site.plate_input, &plate.identifier).await?;
        sleep(self.pacing.human_pause()).await;

        // 照会ボタン押下後、非同期描画を待つ
        page.click_label(&self.site.check_button_label).await?;
        sleep(self.pacing.human_pause()).await;
        sleep(self.settle_time).await;

        let body = page.body_text().await?;
        if parse::has_no_dues_marker(&body, &self.site.no_dues_marker) {
            return Ok(PageReading::none_due());
        }

        let total = match page.text_of(&self.site.total_amount).await {
            Ok(total) => total,
            Err(e) => {
                debug!("{}: 合計金額要素を読み取れません: {}", plate.identifier, e);
                None
            }
        };
        Ok(parse::read_due_page(&body, total.as_deref()))
    }

    /// Cookie同意バナーを閉じる（なければ何もしない）
    async fn dismiss_cookies(&self, page: &dyn PlatePage) {
        if let Err(e) = page.wait_for(&self.site.cookie_button, self.cookie_timeout).await {
            debug!("Cookieバナーなし: {}", e);
            return;
        }

        match page.click(&self.site.cookie_button).await {
            Ok(()) => {
                debug!("Cookieバナーを承認");
                sleep(self.pacing.human_pause()).await;
            }
            Err(e) => debug!("Cookieバナーの承認に失敗: {}", e),
        }
    }

    fn report_reading(&self, plate: &PlateRecord, reading: &PageReading) {
        let line = match reading.status {
            PaymentStatus::NoneDue => {
                info!("{}: 未払いなし", plate.identifier);
                format!("{}: nothing due", plate.identifier)
            }
            _ => {
                let count = reading.passage_dates.len();
                info!("{}: 未払いあり 金額={} 通過日={}件", plate.identifier, reading.amount, count);
                format!(
                    "{}: tolls due, amount {}, {} passage date(s)",
                    plate.identifier, reading.amount, count
                )
            }
        };
        self.progress.log(line);
    }

    /// デバッグスクリーンショット
    async fn log_screenshot(&self, page: &dyn PlatePage, plate: &PlateRecord) {
        use base64::Engine;

        match page.screenshot().await {
            Ok(png) => {
                let encoded = base64::engine::general_purpose::STANDARD.encode(&png);
                debug!("{} スクリーンショット: data:image/png;base64,{}", plate.identifier, encoded);
            }
            Err(e) => debug!("{}: スクリーンショット取得失敗: {}", plate.identifier, e),
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "panic".to_string()
    }
}
