use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local};

use crate::error::ScraperError;
use crate::types::ExtractionResult;

/// ブラウザエンジン候補（起動できれば Session を返す）
#[async_trait]
pub trait SessionLauncher: Send + Sync {
    /// ログ用の名前
    fn name(&self) -> &str;

    /// ブラウザ起動
    async fn launch(&self) -> Result<Box<dyn Session>, ScraperError>;
}

/// 起動済みブラウザ。1バッチの間パイプラインが専有する
#[async_trait]
pub trait Session: Send + Sync {
    /// 新しいページ（タブ）を開く
    async fn new_page(&self) -> Result<Box<dyn PlatePage>, ScraperError>;

    /// リソース解放
    async fn close(&mut self) -> Result<(), ScraperError>;
}

/// プレート照会に必要なページ操作
#[async_trait]
pub trait PlatePage: Send + Sync {
    /// URLへ移動（timeout以内）
    async fn goto(&self, url: &str, timeout: Duration) -> Result<(), ScraperError>;

    /// 要素が現れるまで待機
    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<(), ScraperError>;

    /// 要素をクリック
    async fn click(&self, selector: &str) -> Result<(), ScraperError>;

    /// 表示ラベルでボタン・リンクをクリック
    async fn click_label(&self, label: &str) -> Result<(), ScraperError>;

    /// 入力欄をクリアして入力
    async fn fill(&self, selector: &str, text: &str) -> Result<(), ScraperError>;

    /// 要素のテキスト（要素がなければ None）
    async fn text_of(&self, selector: &str) -> Result<Option<String>, ScraperError>;

    /// ページ全体のテキスト
    async fn body_text(&self) -> Result<String, ScraperError>;

    /// デバッグ用スクリーンショット (PNG)
    async fn screenshot(&self) -> Result<Vec<u8>, ScraperError>;

    /// ページを閉じる
    async fn close(&self) -> Result<(), ScraperError>;
}

/// 待機時間の決定戦略
pub trait Pacing: Send + Sync {
    /// プレート間
    fn inter_plate_delay(&self) -> Duration;

    /// バッチ間
    fn inter_batch_delay(&self) -> Duration;

    /// 入力・クリック後の短い間
    fn human_pause(&self) -> Duration;

    /// `batch_index` (0始まり) の後に長い休止が必要か
    fn long_cooldown_due(&self, batch_index: usize, total_batches: usize) -> bool;

    fn long_cooldown(&self) -> Duration;
}

/// 最終結果の出力先
pub trait ReportWriter: Send + Sync {
    /// 書き込んだファイルのパスを返す
    fn write(
        &self,
        results: &[ExtractionResult],
        checked_at: DateTime<Local>,
    ) -> Result<PathBuf, ScraperError>;
}
