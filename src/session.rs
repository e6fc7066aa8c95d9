//! ブラウザセッションの取得
//!
//! 候補エンジンを順番に起動し、最初に成功したものを返す。

use tracing::{error, info, warn};

use crate::chrome::ChromeEngine;
use crate::config::CheckerConfig;
use crate::error::ScraperError;
use crate::traits::{Session, SessionLauncher};

pub struct SessionProvider {
    engines: Vec<Box<dyn SessionLauncher>>,
}

impl SessionProvider {
    pub fn new(engines: Vec<Box<dyn SessionLauncher>>) -> Self {
        Self { engines }
    }

    /// 設定のブラウザ候補から作成
    pub fn from_config(config: &CheckerConfig) -> Self {
        Self::new(ChromeEngine::candidates(config))
    }

    pub fn engine_names(&self) -> Vec<String> {
        self.engines.iter().map(|e| e.name().to_string()).collect()
    }

    /// 起動できた最初のセッションを返す
    pub async fn acquire(&self) -> Result<Box<dyn Session>, ScraperError> {
        for engine in &self.engines {
            info!("ブラウザ起動を試行: {}", engine.name());
            match engine.launch().await {
                Ok(session) => {
                    info!("使用するブラウザ: {}", engine.name());
                    return Ok(session);
                }
                Err(e) => {
                    warn!("ブラウザ {} は利用できません: {}", engine.name(), e);
                }
            }
        }

        let tried = self.engine_names();
        error!("起動できるブラウザがありません (試行: {:?})", tried);
        Err(ScraperError::NoEngineAvailable { tried })
    }
}
