use std::time::{Duration, Instant};

use async_trait::async_trait;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use tokio::time::sleep;
use tracing::debug;

use crate::error::ScraperError;
use crate::traits::PlatePage;

/// 要素待機のポーリング間隔（ミリ秒）
const ELEMENT_POLL_INTERVAL_MS: u64 = 250;

/// ラベルで探すクリック可能要素
const CLICKABLE_SELECTOR: &str =
    r#"button, a, [role="button"], input[type="button"], input[type="submit"]"#;

/// chromiumoxide の Page ラッパー
pub struct ChromePage {
    page: Page,
}

impl ChromePage {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// JavaScriptを実行して結果を取得
    async fn eval<T: DeserializeOwned>(&self, script: &str) -> Result<T, ScraperError> {
        self.page
            .evaluate(script)
            .await
            .map_err(|e| ScraperError::JavaScript(e.to_string()))?
            .into_value::<T>()
            .map_err(|e| ScraperError::JavaScript(e.to_string()))
    }

    async fn exists(&self, selector: &str) -> Result<bool, ScraperError> {
        self.eval(&format!(
            "document.querySelector({}) !== null",
            js_string(selector)
        ))
        .await
    }
}

/// JavaScriptの文字列リテラルに変換
fn js_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}

/// クリック・入力・クローズなどの操作失敗
fn interaction_error(target: &str, step: &str, e: impl std::fmt::Display) -> ScraperError {
    ScraperError::Interaction(format!("{} {}: {}", target, step, e))
}

#[async_trait]
impl PlatePage for ChromePage {
    async fn goto(&self, url: &str, timeout: Duration) -> Result<(), ScraperError> {
        let navigation = async {
            self.page
                .goto(url)
                .await
                .map_err(|e| ScraperError::Navigation(e.to_string()))?;
            self.page
                .wait_for_navigation()
                .await
                .map_err(|e| ScraperError::Navigation(e.to_string()))?;
            Ok::<(), ScraperError>(())
        };

        tokio::time::timeout(timeout, navigation)
            .await
            .map_err(|_| {
                ScraperError::Timeout(format!("{} への移動が{:?}以内に完了しませんでした", url, timeout))
            })?
    }

    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<(), ScraperError> {
        let start = Instant::now();

        loop {
            match self.exists(selector).await {
                Ok(true) => return Ok(()),
                Ok(false) => {}
                Err(e) => debug!("要素確認に失敗 {}: {}", selector, e),
            }

            if start.elapsed() >= timeout {
                return Err(ScraperError::Timeout(format!(
                    "要素 {} が{:?}以内に表示されませんでした",
                    selector, timeout
                )));
            }

            sleep(Duration::from_millis(ELEMENT_POLL_INTERVAL_MS)).await;
        }
    }

    async fn click(&self, selector: &str) -> Result<(), ScraperError> {
        self.page
            .find_element(selector)
            .await
            .map_err(|e| ScraperError::ElementNotFound(format!("{}: {}", selector, e)))?
            .click()
            .await
            .map_err(|e| interaction_error(selector, "クリック", e))?;
        Ok(())
    }

    async fn click_label(&self, label: &str) -> Result<(), ScraperError> {
        let script = format!(
            r#"
            (function(label) {{
                var nodes = document.querySelectorAll({});
                for (var i = 0; i < nodes.length; i++) {{
                    var text = (nodes[i].textContent || nodes[i].value || '').trim();
                    if (text.indexOf(label) >= 0) {{
                        nodes[i].click();
                        return true;
                    }}
                }}
                return false;
            }})({})
            "#,
            js_string(CLICKABLE_SELECTOR),
            js_string(label)
        );

        if self.eval::<bool>(&script).await? {
            Ok(())
        } else {
            Err(ScraperError::ElementNotFound(format!("ボタン「{}」", label)))
        }
    }

    async fn fill(&self, selector: &str, text: &str) -> Result<(), ScraperError> {
        // 既存の入力値をクリア
        let cleared: bool = self
            .eval(&format!(
                r#"
                (function(selector) {{
                    var el = document.querySelector(selector);
                    if (!el) {{
                        return false;
                    }}
                    el.value = '';
                    el.dispatchEvent(new Event('input', {{ bubbles: true }}));
                    return true;
                }})({})
                "#,
                js_string(selector)
            ))
            .await?;

        if !cleared {
            return Err(ScraperError::ElementNotFound(selector.to_string()));
        }

        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(|e| ScraperError::ElementNotFound(format!("{}: {}", selector, e)))?;
        element
            .click()
            .await
            .map_err(|e| interaction_error(selector, "フォーカス", e))?;
        element
            .type_str(text)
            .await
            .map_err(|e| interaction_error(selector, "入力", e))?;
        Ok(())
    }

    async fn text_of(&self, selector: &str) -> Result<Option<String>, ScraperError> {
        // null は評価結果の値として取り出せないため JSON 文字列で受け取る
        let json: String = self
            .eval(&format!(
                r#"
                (function(selector) {{
                    var el = document.querySelector(selector);
                    return JSON.stringify(el ? el.textContent : null);
                }})({})
                "#,
                js_string(selector)
            ))
            .await?;

        serde_json::from_str(&json).map_err(|e| ScraperError::JavaScript(e.to_string()))
    }

    async fn body_text(&self) -> Result<String, ScraperError> {
        self.eval("document.body ? document.body.textContent : ''")
            .await
    }

    async fn screenshot(&self) -> Result<Vec<u8>, ScraperError> {
        self.page
            .screenshot(ScreenshotParams::builder().full_page(true).build())
            .await
            .map_err(|e| ScraperError::JavaScript(format!("スクリーンショット: {}", e)))
    }

    async fn close(&self) -> Result<(), ScraperError> {
        self.page
            .clone()
            .close()
            .await
            .map_err(|e| interaction_error("ページ", "クローズ", e))
    }
}
