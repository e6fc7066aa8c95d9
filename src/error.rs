use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScraperError {
    #[error("ブラウザ初期化エラー: {0}")]
    BrowserInit(String),

    #[error("起動可能なブラウザがありません (試行: {})", tried.join(", "))]
    NoEngineAvailable { tried: Vec<String> },

    #[error("ナビゲーションエラー: {0}")]
    Navigation(String),

    #[error("タイムアウト: {0}")]
    Timeout(String),

    #[error("要素が見つかりません: {0}")]
    ElementNotFound(String),

    #[error("JavaScript実行エラー: {0}")]
    JavaScript(String),

    #[error("ページ操作エラー: {0}")]
    Interaction(String),

    #[error("照会対象のプレートがありません")]
    EmptyInput,

    #[error("入力エラー: {0}")]
    Input(String),

    #[error("レポート出力エラー: {0}")]
    Report(String),

    #[error("ファイル操作エラー: {0}")]
    FileIO(#[from] std::io::Error),

    #[error("CSVエラー: {0}")]
    Csv(#[from] csv::Error),
}

impl ScraperError {
    /// 実行全体を打ち切るエラーかどうか
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::NoEngineAvailable { .. })
    }
}
