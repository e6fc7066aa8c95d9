//! 単体テスト用のブラウザ代替実装

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::ScraperError;
use crate::traits::{PlatePage, Session, SessionLauncher};

/// 1プレート分のページの振る舞い
#[derive(Debug, Clone, Default)]
pub struct PageScript {
    pub body: String,
    pub total: Option<String>,
    pub cookie_banner: bool,
    /// この操作で失敗する
    pub fail_at: Option<&'static str>,
    pub panic_at: Option<&'static str>,
}

impl PageScript {
    pub fn body(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            ..Self::default()
        }
    }

    pub fn failing(step: &'static str) -> Self {
        Self {
            fail_at: Some(step),
            ..Self::default()
        }
    }

    pub fn with_total(mut self, total: impl Into<String>) -> Self {
        self.total = Some(total.into());
        self
    }

    pub fn with_cookie_banner(mut self) -> Self {
        self.cookie_banner = true;
        self
    }
}

/// 全ページ共通の記録
#[derive(Debug, Default)]
pub struct Recorder {
    pub calls: Mutex<Vec<String>>,
    pub pages_opened: AtomicUsize,
    pub pages_closed: AtomicUsize,
    pub launches: AtomicUsize,
    pub sessions_closed: AtomicUsize,
}

impl Recorder {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

pub struct FakePage {
    scripts: Arc<HashMap<String, PageScript>>,
    default_script: PageScript,
    plate: Mutex<Option<String>>,
    recorder: Arc<Recorder>,
}

impl FakePage {
    fn script(&self) -> PageScript {
        self.plate
            .lock()
            .unwrap()
            .as_ref()
            .and_then(|plate| self.scripts.get(plate))
            .cloned()
            .unwrap_or_else(|| self.default_script.clone())
    }

    fn step(&self, step: &'static str, script: &PageScript) -> Result<(), ScraperError> {
        self.recorder.record(step.to_string());
        if script.panic_at == Some(step) {
            panic!("page crashed at {}", step);
        }
        if script.fail_at == Some(step) {
            return Err(ScraperError::Navigation(format!("{} failed", step)));
        }
        Ok(())
    }
}

#[async_trait]
impl PlatePage for FakePage {
    async fn goto(&self, url: &str, _timeout: Duration) -> Result<(), ScraperError> {
        self.recorder.record(format!("url:{}", url));
        // goto の時点ではプレート未入力のため既定スクリプトで判定
        self.step("goto", &self.default_script)
    }

    async fn wait_for(&self, selector: &str, _timeout: Duration) -> Result<(), ScraperError> {
        let script = self.default_script.clone();
        if selector.contains("cookie") || selector.contains("tarteaucitron") {
            self.recorder.record("wait_cookie".into());
            return if script.cookie_banner {
                Ok(())
            } else {
                Err(ScraperError::Timeout(selector.into()))
            };
        }
        self.step("wait_for", &script)
    }

    async fn click(&self, _selector: &str) -> Result<(), ScraperError> {
        self.step("click", &self.default_script)
    }

    async fn click_label(&self, _label: &str) -> Result<(), ScraperError> {
        let script = self.script();
        self.step("click_label", &script)
    }

    async fn fill(&self, _selector: &str, text: &str) -> Result<(), ScraperError> {
        *self.plate.lock().unwrap() = Some(text.to_string());
        self.recorder.record(format!("fill:{}", text));
        let script = self.script();
        self.step("fill", &script)
    }

    async fn text_of(&self, _selector: &str) -> Result<Option<String>, ScraperError> {
        let script = self.script();
        self.step("text_of", &script)?;
        Ok(script.total)
    }

    async fn body_text(&self) -> Result<String, ScraperError> {
        let script = self.script();
        self.step("body_text", &script)?;
        Ok(script.body)
    }

    async fn screenshot(&self) -> Result<Vec<u8>, ScraperError> {
        self.recorder.record("screenshot".into());
        Ok(vec![0x89, b'P', b'N', b'G'])
    }

    async fn close(&self) -> Result<(), ScraperError> {
        self.recorder.pages_closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub struct FakeSession {
    scripts: Arc<HashMap<String, PageScript>>,
    default_script: PageScript,
    recorder: Arc<Recorder>,
}

#[async_trait]
impl Session for FakeSession {
    async fn new_page(&self) -> Result<Box<dyn PlatePage>, ScraperError> {
        self.recorder.pages_opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakePage {
            scripts: self.scripts.clone(),
            default_script: self.default_script.clone(),
            plate: Mutex::new(None),
            recorder: self.recorder.clone(),
        }))
    }

    async fn close(&mut self) -> Result<(), ScraperError> {
        self.recorder.sessions_closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// プレートごとにページ内容を差し替えられる偽ブラウザ
#[derive(Clone)]
pub struct FakeBrowser {
    pub name: &'static str,
    pub launchable: bool,
    /// 何回目の起動から失敗させるか
    pub fail_from_launch: Option<usize>,
    pub scripts: Arc<HashMap<String, PageScript>>,
    pub default_script: PageScript,
    pub recorder: Arc<Recorder>,
}

impl FakeBrowser {
    pub fn new(default_script: PageScript) -> Self {
        Self {
            name: "fake",
            launchable: true,
            fail_from_launch: None,
            scripts: Arc::new(HashMap::new()),
            default_script,
            recorder: Arc::new(Recorder::default()),
        }
    }

    pub fn with_script(mut self, plate: &str, script: PageScript) -> Self {
        Arc::make_mut(&mut self.scripts).insert(plate.to_string(), script);
        self
    }

    pub fn session(&self) -> FakeSession {
        FakeSession {
            scripts: self.scripts.clone(),
            default_script: self.default_script.clone(),
            recorder: self.recorder.clone(),
        }
    }
}

#[async_trait]
impl SessionLauncher for FakeBrowser {
    fn name(&self) -> &str {
        self.name
    }

    async fn launch(&self) -> Result<Box<dyn Session>, ScraperError> {
        let attempt = self.recorder.launches.fetch_add(1, Ordering::SeqCst);
        let blocked = self.fail_from_launch.map_or(false, |from| attempt >= from);
        if !self.launchable || blocked {
            return Err(ScraperError::BrowserInit(format!("{} not installed", self.name)));
        }
        Ok(Box::new(self.session()))
    }
}
