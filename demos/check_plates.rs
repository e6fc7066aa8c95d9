use std::sync::Arc;

use toll_scraper::{input, CheckerConfig, ProgressEvent, TollChecker};

#[tokio::main]
async fn main() {
    // ログ設定
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,toll_scraper=debug".into()),
        )
        .init();

    // 第1引数: プレートリスト（既定: plates.txt）
    let plates_path = std::env::args().nth(1).unwrap_or_else(|| "plates.txt".to_string());
    let plates = match input::load_plates(&plates_path) {
        Ok(plates) => plates,
        Err(e) => {
            eprintln!("エラー: {}", e);
            return;
        }
    };

    let config = CheckerConfig::from_env()
        .with_headless(false) // デバッグ用に表示モード
        .with_report_path(
            std::env::var("TOLL_REPORT_PATH").unwrap_or_else(|_| "results.csv".to_string()),
        );
    let total = plates.len();

    println!("=== Toll Check: {} plates ===", total);

    let checker = Arc::new(TollChecker::new(config));
    let (mut progress, handle) = checker.spawn(plates);

    let mut done = 0;
    while let Some(event) = progress.recv().await {
        match event {
            ProgressEvent::CurrentItem(plate) => println!("[{}/{}] {}", done + 1, total, plate),
            ProgressEvent::Incremented(n) => done += n,
            ProgressEvent::LogLine(line) => println!("  {}", line),
            ProgressEvent::Completed => println!("=== 完了 ==="),
        }
    }

    match handle.await {
        Ok(Ok(report)) => {
            println!(
                "成功! 未払いなし: {}, 未払いあり: {}, エラー: {}",
                report.nothing_due, report.due, report.failed
            );
            if let Some(path) = report.report_path {
                println!("レポート保存先: {:?}", path);
            }
        }
        Ok(Err(e)) => eprintln!("エラー: {}", e),
        Err(e) => eprintln!("タスクエラー: {}", e),
    }
}
