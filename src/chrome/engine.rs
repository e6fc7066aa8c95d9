use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::{CheckerConfig, EngineSpec};
use crate::error::ScraperError;
use crate::traits::{PlatePage, Session, SessionLauncher};

use super::page::ChromePage;

/// CDP対応ブラウザの起動候補
#[derive(Debug, Clone)]
pub struct ChromeEngine {
    spec: EngineSpec,
    headless: bool,
    debug: bool,
    launch_timeout: Duration,
}

impl ChromeEngine {
    pub fn new(spec: EngineSpec, config: &CheckerConfig) -> Self {
        Self {
            spec,
            headless: config.headless,
            debug: config.debug,
            launch_timeout: config.launch_timeout,
        }
    }

    /// 設定の候補リストからエンジン一覧を作成
    pub fn candidates(config: &CheckerConfig) -> Vec<Box<dyn SessionLauncher>> {
        config
            .engines
            .iter()
            .cloned()
            .map(|spec| Box::new(Self::new(spec, config)) as Box<dyn SessionLauncher>)
            .collect()
    }

    fn browser_config(&self, user_data_dir: &Path) -> Result<BrowserConfig, ScraperError> {
        let mut builder = BrowserConfig::builder().user_data_dir(user_data_dir);

        if let Some(executable) = &self.spec.executable {
            builder = builder.chrome_executable(executable);
        }

        if !self.headless {
            builder = builder.with_head();
        }

        builder = builder
            .window_size(1280, 800)
            .no_sandbox()
            .request_timeout(Duration::from_secs(60))
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-gpu");

        if self.debug {
            builder = builder.arg("--enable-logging=stderr").arg("--v=1");
        }

        builder
            .build()
            .map_err(|e| ScraperError::BrowserInit(format!("{}: ブラウザ設定エラー: {}", self.spec.name, e)))
    }
}

static LAUNCH_COUNTER: AtomicU64 = AtomicU64::new(0);

/// 起動ごとにユニークなユーザーデータディレクトリ
fn unique_user_data_dir(engine: &str) -> PathBuf {
    let unique_id = format!(
        "{}-{}-{}",
        std::process::id(),
        LAUNCH_COUNTER.fetch_add(1, Ordering::Relaxed),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    );
    std::env::temp_dir().join(format!("toll-scraper-{}-{}", engine, unique_id))
}

#[async_trait]
impl SessionLauncher for ChromeEngine {
    fn name(&self) -> &str {
        &self.spec.name
    }

    async fn launch(&self) -> Result<Box<dyn Session>, ScraperError> {
        info!("ブラウザを起動中: {}", self.spec.name);

        if let Some(executable) = &self.spec.executable {
            // PATH上のコマンド名はそのまま chromiumoxide に渡す
            if executable.components().count() > 1 && !executable.exists() {
                return Err(ScraperError::BrowserInit(format!(
                    "{}: 実行ファイルが見つかりません: {}",
                    self.spec.name,
                    executable.display()
                )));
            }
        }

        let user_data_dir = unique_user_data_dir(&self.spec.name);
        let config = self.browser_config(&user_data_dir)?;

        let (browser, mut handler) = tokio::time::timeout(self.launch_timeout, Browser::launch(config))
            .await
            .map_err(|_| {
                ScraperError::Timeout(format!(
                    "{}: {:?}以内に起動しませんでした",
                    self.spec.name, self.launch_timeout
                ))
            })?
            .map_err(|e| ScraperError::BrowserInit(format!("{}: {}", self.spec.name, e)))?;

        // ハンドラータスクを起動
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("ブラウザハンドラーエラー: {}", e);
                }
            }
        });

        info!("ブラウザ起動完了: {}", self.spec.name);
        Ok(Box::new(ChromeSession {
            name: self.spec.name.clone(),
            browser: Some(browser),
            handler_task,
            user_data_dir,
        }))
    }
}

/// 起動済みのCDPブラウザ
pub struct ChromeSession {
    name: String,
    browser: Option<Browser>,
    handler_task: JoinHandle<()>,
    user_data_dir: PathBuf,
}

impl ChromeSession {
    fn browser(&self) -> Result<&Browser, ScraperError> {
        self.browser
            .as_ref()
            .ok_or_else(|| ScraperError::BrowserInit(format!("{}: ブラウザは終了済みです", self.name)))
    }
}

#[async_trait]
impl Session for ChromeSession {
    async fn new_page(&self) -> Result<Box<dyn PlatePage>, ScraperError> {
        let page = self
            .browser()?
            .new_page("about:blank")
            .await
            .map_err(|e| ScraperError::BrowserInit(format!("ページ作成エラー: {}", e)))?;

        Ok(Box::new(ChromePage::new(page)))
    }

    async fn close(&mut self) -> Result<(), ScraperError> {
        info!("ブラウザを終了中: {}", self.name);

        if let Some(mut browser) = self.browser.take() {
            if let Err(e) = browser.close().await {
                debug!("ブラウザ終了失敗: {}", e);
            }
            if let Err(e) = browser.wait().await {
                debug!("ブラウザプロセス終了待ち失敗: {}", e);
            }
        }
        self.handler_task.abort();

        if let Err(e) = std::fs::remove_dir_all(&self.user_data_dir) {
            debug!("ユーザーデータディレクトリ削除失敗 {:?}: {}", self.user_data_dir, e);
        }

        Ok(())
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        self.handler_task.abort();
    }
}
