//! 照会の入出力型定義

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 通過日の表示形式 (DD/MM/YYYY)
pub const DATE_FORMAT: &str = "%d/%m/%Y";

/// 照会対象のプレート
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlateRecord {
    /// ナンバープレート文字列（前後の空白は除去済み）
    pub identifier: String,
    /// 車種などの分類タグ
    pub category: Option<String>,
    /// 所有者タグ
    pub owner: Option<String>,
}

impl PlateRecord {
    /// 識別子をトリムして作成。空文字列なら `None`
    pub fn new(identifier: impl AsRef<str>) -> Option<Self> {
        let identifier = identifier.as_ref().trim();
        if identifier.is_empty() {
            return None;
        }
        Some(Self {
            identifier: identifier.to_string(),
            category: None,
            owner: None,
        })
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = non_empty(category.into());
        self
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = non_empty(owner.into());
        self
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// 支払い状況
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "passages")]
pub enum PaymentStatus {
    /// 未払いなし
    NoneDue,
    /// 未払いあり（ユニークな通過日の数）
    Due(usize),
    /// 照会失敗
    Error,
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoneDue => write!(f, "Nothing due"),
            Self::Due(count) => write!(f, "Tolls due ({})", count),
            Self::Error => write!(f, "Error"),
        }
    }
}

/// 未払い金額
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Amount {
    /// ページから取得した金額文字列
    Value(String),
    /// 金額が見つからなかった
    Unknown,
    /// 照会失敗のため該当なし
    NotApplicable,
}

impl Amount {
    /// 未払いなしの場合の金額（解析結果と同じ `0.00 €` 形式）
    pub fn zero() -> Self {
        Self::Value("0.00 €".to_string())
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => f.write_str(value),
            Self::Unknown => f.write_str("Unknown"),
            Self::NotApplicable => f.write_str("N/A"),
        }
    }
}

/// 1プレート分の照会結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub identifier: String,
    pub category: Option<String>,
    pub owner: Option<String>,
    pub status: PaymentStatus,
    pub amount: Amount,
    /// 重複なし・日付順
    pub passage_dates: Vec<NaiveDate>,
}

impl ExtractionResult {
    /// ページ解析結果から作成
    pub fn from_reading(plate: &PlateRecord, reading: PageReading) -> Self {
        Self {
            identifier: plate.identifier.clone(),
            category: plate.category.clone(),
            owner: plate.owner.clone(),
            status: reading.status,
            amount: reading.amount,
            passage_dates: reading.passage_dates,
        }
    }

    /// 照会失敗の結果を作成
    pub fn failed(plate: &PlateRecord) -> Self {
        Self {
            identifier: plate.identifier.clone(),
            category: plate.category.clone(),
            owner: plate.owner.clone(),
            status: PaymentStatus::Error,
            amount: Amount::NotApplicable,
            passage_dates: Vec::new(),
        }
    }

    /// 通過日を DD/MM/YYYY 形式で返す
    pub fn formatted_dates(&self) -> Vec<String> {
        self.passage_dates
            .iter()
            .map(|date| date.format(DATE_FORMAT).to_string())
            .collect()
    }
}

/// 1ページ分の解析結果（プレート情報を含まない）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageReading {
    pub status: PaymentStatus,
    pub amount: Amount,
    pub passage_dates: Vec<NaiveDate>,
}

impl PageReading {
    pub fn none_due() -> Self {
        Self {
            status: PaymentStatus::NoneDue,
            amount: Amount::zero(),
            passage_dates: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plate_record_trims_identifier() {
        let plate = PlateRecord::new("  AB-123-CD \t")
            .unwrap()
            .with_category(" VL ")
            .with_owner("");

        assert_eq!(plate.identifier, "AB-123-CD");
        assert_eq!(plate.category.as_deref(), Some("VL"));
        assert_eq!(plate.owner, None);
    }

    #[test]
    fn test_plate_record_rejects_blank() {
        assert!(PlateRecord::new("   ").is_none());
        assert!(PlateRecord::new("").is_none());
    }

    #[test]
    fn test_failed_result_uses_sentinels() {
        let plate = PlateRecord::new("EF-456-GH").unwrap().with_owner("Durand");
        let result = ExtractionResult::failed(&plate);

        assert_eq!(result.status, PaymentStatus::Error);
        assert_eq!(result.amount, Amount::NotApplicable);
        assert!(result.passage_dates.is_empty());
        assert_eq!(result.owner.as_deref(), Some("Durand"));
    }

    #[test]
    fn test_formatted_dates() {
        let plate = PlateRecord::new("AA-001-AA").unwrap();
        let reading = PageReading {
            status: PaymentStatus::Due(2),
            amount: Amount::Value("12.50 €".into()),
            passage_dates: vec![
                NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
                NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            ],
        };
        let result = ExtractionResult::from_reading(&plate, reading);

        assert_eq!(result.formatted_dates(), vec!["15/01/2024", "01/03/2024"]);
        assert_eq!(result.status.to_string(), "Tolls due (2)");
        assert_eq!(result.amount.to_string(), "12.50 €");
    }

    #[test]
    fn test_serialize_status() {
        let json = serde_json::to_string(&PaymentStatus::Due(3)).unwrap();
        assert_eq!(json, r#"{"kind":"Due","passages":3}"#);
    }
}
