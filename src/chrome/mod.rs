//! chromiumoxide による Session / PlatePage 実装
//!
//! Chrome / Edge / Chromium はいずれも CDP で操作できるため、
//! 実行ファイルだけを差し替えた [`ChromeEngine`] を候補として並べる。

mod engine;
mod page;

pub use engine::{ChromeEngine, ChromeSession};
pub use page::ChromePage;
