/// タイトルを比較用に正規化
///
/// 前後の空白を除去し、小文字化し、連続する空白を1つにまとめる。
/// ShelfMemoryのタイトル照合で使用するため、表記揺れを吸収する。
///
/// # Examples
/// ```
/// use tubefilter::util::normalize_title;
/// assert_eq!(normalize_title("  Funny   Cat  #Shorts "), "funny cat #shorts");
/// ```
pub fn normalize_title(title: &str) -> String {
    title
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// 再生時間テキストを秒数に変換
///
/// "SS" / "M:SS" / "H:MM:SS" 形式に対応。数字以外を含む場合はNone。
///
/// # Examples
/// ```
/// use tubefilter::util::parse_duration_text;
/// assert_eq!(parse_duration_text("3:00"), Some(180));
/// assert_eq!(parse_duration_text("1:02:03"), Some(3723));
/// assert_eq!(parse_duration_text("LIVE"), None);
/// ```
pub fn parse_duration_text(text: &str) -> Option<u32> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let parts: Vec<&str> = text.split(':').collect();
    if parts.len() > 3 {
        return None;
    }

    let mut total: u32 = 0;
    for part in parts {
        let part = part.trim();
        if part.is_empty() || !part.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let value: u32 = part.parse().ok()?;
        total = total.checked_mul(60)?.checked_add(value)?;
    }
    Some(total)
}

/// クエリ文字列から指定パラメータの値を取得
///
/// 先頭の`?`は無視する。最初に見つかった値を返す。
pub fn query_param<'a>(query: &'a str, name: &str) -> Option<&'a str> {
    query
        .trim_start_matches('?')
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}
