//! 照会結果の集約

use crate::types::{ExtractionResult, PaymentStatus};

/// 結果を溜めておき、最後にプレート順で並べて返す
#[derive(Debug, Default)]
pub struct ResultAggregator {
    results: Vec<ExtractionResult>,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            results: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, result: ExtractionResult) {
        self.results.push(result);
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// 集計（未払いなし・未払いあり・失敗）
    pub fn counts(&self) -> (usize, usize, usize) {
        self.results
            .iter()
            .fold((0, 0, 0), |(none, due, error), r| match r.status {
                PaymentStatus::NoneDue => (none + 1, due, error),
                PaymentStatus::Due(_) => (none, due + 1, error),
                PaymentStatus::Error => (none, due, error + 1),
            })
    }

    pub fn finish(self) -> Vec<ExtractionResult> {
        aggregate(self.results)
    }
}

/// プレート文字列の辞書順（大文字小文字を区別）に安定ソート
pub fn aggregate(mut results: Vec<ExtractionResult>) -> Vec<ExtractionResult> {
    results.sort_by(|a, b| a.identifier.cmp(&b.identifier));
    results
}
