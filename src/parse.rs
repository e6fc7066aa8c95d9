//! ページテキストの解析
//!
//! 照会ボタン押下後のページ全文から、支払い状況・金額・通過日を取り出す。
//! ブラウザに依存しない純粋関数のみ。

use std::collections::BTreeSet;
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::types::{Amount, PageReading, PaymentStatus};

/// 金額トークン（例: `12,50 €`, `1\u{a0}234,50 €`, `7 €`）
///
/// 桁区切りは NBSP / 狭い NBSP のみ。直前が数字・`:`・`.`・`,` の位置からは
/// 始まらない（時刻や番号が金額に連結されないように）。
fn amount_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?:^|[^0-9:.,])([0-9]{1,3}(?:[\u{a0}\u{202f}][0-9]{3})+(?:[.,][0-9]{2})?|[0-9]+(?:[.,][0-9]{2})?)\s?€",
        )
        .expect("amount regex is valid")
    })
}

/// 通過日 (DD/MM/YYYY)
fn date_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b([0-9]{2})/([0-9]{2})/([0-9]{4})\b").expect("date regex is valid")
    })
}

/// 未払いなしの文言を含むか
pub fn has_no_dues_marker(text: &str, marker: &str) -> bool {
    !marker.is_empty() && text.contains(marker)
}

/// 金額トークンをセント単位に変換。解釈できなければ None
pub fn parse_amount_cents(token: &str) -> Option<u64> {
    let digits_and_seps = token.trim().trim_end_matches('€').trim();
    if digits_and_seps.is_empty() {
        return None;
    }

    // 末尾が「区切り + 2桁」なら小数部
    let bytes = digits_and_seps.as_bytes();
    let (integer_part, fraction) = if bytes.len() >= 3
        && matches!(bytes[bytes.len() - 3], b',' | b'.')
        && bytes[bytes.len() - 2..].iter().all(u8::is_ascii_digit)
    {
        let split = digits_and_seps.len() - 3;
        (
            &digits_and_seps[..split],
            digits_and_seps[split + 1..].parse::<u64>().ok()?,
        )
    } else {
        (digits_and_seps, 0)
    };

    let mut units: u64 = 0;
    let mut seen_digit = false;
    for c in integer_part.chars() {
        if let Some(d) = c.to_digit(10) {
            units = units.checked_mul(10)?.checked_add(u64::from(d))?;
            seen_digit = true;
        } else if !(c == '\u{a0}' || c == '\u{202f}') {
            return None;
        }
    }

    if !seen_digit {
        return None;
    }
    units.checked_mul(100)?.checked_add(fraction)
}

/// セント単位の金額を表示用文字列に
pub fn format_cents(cents: u64) -> String {
    format!("{}.{:02} €", cents / 100, cents % 100)
}

/// テキスト中の金額のうち最大のもの
///
/// 同じ金額がページ内に複数回表示されるため、合計ではなく最大値を採用する。
pub fn max_amount(text: &str) -> Option<String> {
    amount_regex()
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .filter_map(|m| parse_amount_cents(m.as_str()))
        .max()
        .map(format_cents)
}

/// 通過日を重複なし・日付順で取り出す。暦上ありえない日付は無視
pub fn passage_dates(text: &str) -> Vec<NaiveDate> {
    date_regex()
        .captures_iter(text)
        .filter_map(|caps| {
            let day = caps[1].parse().ok()?;
            let month = caps[2].parse().ok()?;
            let year = caps[3].parse().ok()?;
            NaiveDate::from_ymd_opt(year, month, day)
        })
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// 未払いありのページを解析
///
/// `total_element` は合計金額要素のテキスト（要素がなければ None）。
pub fn read_due_page(text: &str, total_element: Option<&str>) -> PageReading {
    let amount = match total_element.map(str::trim).filter(|t| !t.is_empty()) {
        Some(total) => Amount::Value(total.to_string()),
        None => max_amount(text).map(Amount::Value).unwrap_or(Amount::Unknown),
    };

    let passage_dates = passage_dates(text);
    PageReading {
        status: PaymentStatus::Due(passage_dates.len()),
        amount,
        passage_dates,
    }
}

/// ページ全体を解析。未払いなしの文言があれば他の内容は見ない
pub fn analyze_page(text: &str, no_dues_marker: &str, total_element: Option<&str>) -> PageReading {
    if has_no_dues_marker(text, no_dues_marker) {
        return PageReading::none_due();
    }
    read_due_page(text, total_element)
}
