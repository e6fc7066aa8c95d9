//! プレートリストの読み込み
//!
//! 1行1プレート。`;` 区切りで分類・所有者を続けてもよい。
//!
//! ```text
//! # plate;category;owner
//! AB-123-CD;VL;Transports Martin
//! EF-456-GH
//! ```

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, Trim};
use tracing::{debug, info};

use crate::error::ScraperError;
use crate::types::PlateRecord;

/// ファイルからプレートリストを読み込む
pub fn load_plates(path: impl AsRef<Path>) -> Result<Vec<PlateRecord>, ScraperError> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|e| ScraperError::Input(format!("{}: {}", path.display(), e)))?;
    let plates = parse_plates(file)?;
    info!("プレート読み込み完了: {} 件 ({:?})", plates.len(), path);
    Ok(plates)
}

/// 任意の入力からプレートリストを読み込む
pub fn parse_plates<R: Read>(reader: R) -> Result<Vec<PlateRecord>, ScraperError> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .flexible(true)
        .comment(Some(b'#'))
        .trim(Trim::All)
        .from_reader(reader);

    let mut plates = Vec::new();
    for record in reader.records() {
        let record = record?;
        let Some(mut plate) = record.get(0).and_then(PlateRecord::new) else {
            debug!("プレートのない行をスキップ: {:?}", record);
            continue;
        };
        if let Some(category) = record.get(1) {
            plate = plate.with_category(category);
        }
        if let Some(owner) = record.get(2) {
            plate = plate.with_owner(owner);
        }
        plates.push(plate);
    }
    Ok(plates)
}
