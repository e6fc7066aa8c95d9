use std::path::PathBuf;
use std::time::Duration;

/// 照会先ポータルのページ構造
#[derive(Debug, Clone)]
pub struct TargetSite {
    pub url: String,
    /// Cookie同意ボタン
    pub cookie_button: String,
    /// プレート入力欄
    pub plate_input: String,
    /// 照会ボタンのラベル
    pub check_button_label: String,
    /// 合計金額の要素
    pub total_amount: String,
    /// 未払いなしの場合に表示される文言
    pub no_dues_marker: String,
}

impl Default for TargetSite {
    fn default() -> Self {
        Self {
            url: "https://www.sanef.com/client/index.html#basket".to_string(),
            cookie_button: ".tarteaucitronCTAButton".to_string(),
            plate_input: "input.input-no-focus".to_string(),
            check_button_label: "Vérifier mes péages à payer".to_string(),
            total_amount: "span.total-amount".to_string(),
            no_dues_marker: "Aucun passage en attente de paiement".to_string(),
        }
    }
}

/// 待機時間の決め方
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delay {
    /// 固定
    Fixed(Duration),
    /// `[min, max]` の一様乱数
    Uniform { min: Duration, max: Duration },
    /// `base ± jitter` の一様乱数
    Jitter { base: Duration, jitter: Duration },
}

impl Delay {
    pub const ZERO: Delay = Delay::Fixed(Duration::ZERO);

    pub fn secs(secs: u64) -> Self {
        Self::Fixed(Duration::from_secs(secs))
    }
}

/// ペーシング設定
#[derive(Debug, Clone)]
pub struct PacingConfig {
    /// プレート間
    pub inter_plate: Delay,
    /// バッチ間
    pub inter_batch: Delay,
    /// 入力・クリック後の短い間
    pub human_pause: Delay,
    /// 何バッチごとに長い休止を入れるか（0で無効）
    pub long_cooldown_every: usize,
    pub long_cooldown: Duration,
    /// 乱数シード（Noneならエントロピーから）
    pub seed: Option<u64>,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            inter_plate: Delay::Uniform {
                min: Duration::from_secs(6),
                max: Duration::from_secs(10),
            },
            inter_batch: Delay::Jitter {
                base: Duration::from_secs(30),
                jitter: Duration::from_secs(5),
            },
            human_pause: Delay::Uniform {
                min: Duration::from_millis(500),
                max: Duration::from_millis(1500),
            },
            long_cooldown_every: 5,
            long_cooldown: Duration::from_secs(300),
            seed: None,
        }
    }
}

impl PacingConfig {
    /// 全ての待機をゼロにする（テスト用）
    pub fn immediate() -> Self {
        Self {
            inter_plate: Delay::ZERO,
            inter_batch: Delay::ZERO,
            human_pause: Delay::ZERO,
            long_cooldown_every: 0,
            long_cooldown: Duration::ZERO,
            seed: Some(0),
        }
    }
}

/// ブラウザ候補
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSpec {
    pub name: String,
    /// Noneの場合はchromiumoxideの自動検出に任せる
    pub executable: Option<PathBuf>,
}

impl EngineSpec {
    pub fn new(name: impl Into<String>, executable: Option<PathBuf>) -> Self {
        Self {
            name: name.into(),
            executable,
        }
    }
}

/// 既定のブラウザ候補（優先順）
pub fn default_engines() -> Vec<EngineSpec> {
    vec![
        EngineSpec::new("chrome", None),
        EngineSpec::new("msedge", default_edge_path()),
        EngineSpec::new("chromium", Some(PathBuf::from("chromium"))),
    ]
}

fn default_edge_path() -> Option<PathBuf> {
    let candidates: &[&str] = if cfg!(windows) {
        &[
            r"C:\Program Files (x86)\Microsoft\Edge\Application\msedge.exe",
            r"C:\Program Files\Microsoft\Edge\Application\msedge.exe",
        ]
    } else if cfg!(target_os = "macos") {
        &["/Applications/Microsoft Edge.app/Contents/MacOS/Microsoft Edge"]
    } else {
        &["/usr/bin/microsoft-edge", "/usr/bin/microsoft-edge-stable"]
    };

    candidates
        .iter()
        .map(PathBuf::from)
        .find(|path| path.exists())
        .or_else(|| Some(PathBuf::from(candidates[0])))
}

#[derive(Debug, Clone)]
pub struct CheckerConfig {
    pub site: TargetSite,
    pub engines: Vec<EngineSpec>,
    pub pacing: PacingConfig,
    pub batch_size: usize,
    pub headless: bool,
    pub debug: bool,
    pub navigation_timeout: Duration,
    pub input_timeout: Duration,
    pub cookie_timeout: Duration,
    /// 照会ボタン押下後、非同期描画を待つ時間
    pub settle_time: Duration,
    pub launch_timeout: Duration,
    pub report_path: Option<PathBuf>,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            site: TargetSite::default(),
            engines: default_engines(),
            pacing: PacingConfig::default(),
            batch_size: 20,
            headless: true,
            debug: false,
            navigation_timeout: Duration::from_secs(20),
            input_timeout: Duration::from_secs(12),
            cookie_timeout: Duration::from_secs(8),
            settle_time: Duration::from_secs(3),
            launch_timeout: Duration::from_secs(30),
            report_path: None,
        }
    }
}

impl CheckerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// 環境変数で既定値を上書き
    pub fn from_env() -> Self {
        let default = Self::default();

        let mut engines = default.engines;
        for (name, var) in [
            ("chrome", "CHROME_PATH"),
            ("msedge", "EDGE_PATH"),
            ("chromium", "CHROMIUM_PATH"),
        ] {
            if let Ok(path) = std::env::var(var) {
                if let Some(engine) = engines.iter_mut().find(|e| e.name == name) {
                    engine.executable = Some(PathBuf::from(path));
                }
            }
        }

        Self {
            site: TargetSite {
                url: std::env::var("TOLL_TARGET_URL").unwrap_or(default.site.url),
                ..default.site
            },
            engines,
            batch_size: std::env::var("TOLL_BATCH_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.batch_size)
                .max(1),
            headless: std::env::var("TOLL_HEADLESS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.headless),
            debug: std::env::var("TOLL_DEBUG")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.debug),
            report_path: std::env::var("TOLL_REPORT_PATH")
                .ok()
                .map(PathBuf::from)
                .or(default.report_path),
            ..default
        }
    }

    pub fn with_site(mut self, site: TargetSite) -> Self {
        self.site = site;
        self
    }

    pub fn with_engines(mut self, engines: Vec<EngineSpec>) -> Self {
        self.engines = engines;
        self
    }

    pub fn with_pacing(mut self, pacing: PacingConfig) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_settle_time(mut self, settle_time: Duration) -> Self {
        self.settle_time = settle_time;
        self
    }

    pub fn with_report_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.report_path = Some(path.into());
        self
    }

    /// 全ての待機・タイムアウトを短くする（テスト用）
    pub fn without_delays(mut self) -> Self {
        self.pacing = PacingConfig::immediate();
        self.settle_time = Duration::ZERO;
        self.navigation_timeout = Duration::from_millis(200);
        self.input_timeout = Duration::from_millis(200);
        self.cookie_timeout = Duration::from_millis(50);
        self
    }
}
