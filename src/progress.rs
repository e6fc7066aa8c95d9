//! 進捗通知チャネル
//!
//! パイプライン（ワーカータスク）から UI やログなどの観測側へ、
//! 型付きのイベントを届ける。送信側はブロックせず、受信側がいなくても失敗しない。

use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};

/// 進捗イベント
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// これから照会するプレート
    CurrentItem(String),
    /// 照会を終えたプレート数（成功・失敗を問わない）
    Incremented(usize),
    /// ログ表示用の1行
    LogLine(String),
    /// 全処理完了
    Completed,
}

/// 送信側。clone して複数の producer から使える
#[derive(Debug, Clone)]
pub struct ProgressSender {
    tx: UnboundedSender<ProgressEvent>,
}

/// 受信側（単一 consumer）
#[derive(Debug)]
pub struct ProgressReceiver {
    rx: UnboundedReceiver<ProgressEvent>,
}

/// 送受信のペアを作成
pub fn channel() -> (ProgressSender, ProgressReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ProgressSender { tx }, ProgressReceiver { rx })
}

impl ProgressSender {
    pub fn send(&self, event: ProgressEvent) {
        // 受信側が閉じていてもパイプラインは止めない
        let _ = self.tx.send(event);
    }

    pub fn current_item(&self, identifier: impl Into<String>) {
        self.send(ProgressEvent::CurrentItem(identifier.into()));
    }

    pub fn incremented(&self, count: usize) {
        self.send(ProgressEvent::Incremented(count));
    }

    pub fn log(&self, line: impl Into<String>) {
        self.send(ProgressEvent::LogLine(line.into()));
    }

    pub fn completed(&self) {
        self.send(ProgressEvent::Completed);
    }
}

impl ProgressReceiver {
    /// 溜まっているイベントを全て取り出す（ブロックしない）
    ///
    /// UI の更新タイマーなどから何度呼んでもよい。
    pub fn poll(&mut self) -> Vec<ProgressEvent> {
        let mut events = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        events
    }

    /// 次のイベントを待つ。全ての送信側が破棄され、空になったら None
    pub async fn recv(&mut self) -> Option<ProgressEvent> {
        self.rx.recv().await
    }
}
