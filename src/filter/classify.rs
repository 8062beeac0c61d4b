//! 動画・シェルフの分類器
//!
//! いずれも副作用のない判定関数。Shorts判定は複数の弱いシグナルのORで、
//! どれか1つでも当てはまればShortsとみなす。

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use super::memory::ShelfMemory;
use crate::innertube::{get_video_id, get_video_title, VideoItem};

/// Shortsとみなす再生時間の上限（秒、この値を含む）
pub const SHORT_DURATION_LIMIT_SECS: u32 = 180;

/// ヘルパー判定でエンドポイントを探索する深さ
const HELPER_SEARCH_DEPTH: usize = 6;

/// Shortsシェルフのタイトル（先頭または末尾が単語としての"shorts"）
static SHORTS_SHELF_TITLE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^#?shorts(\s|$)|(^|\s)#?shorts$").expect("Failed to compile shorts shelf regex")
});

/// 「さらに読み込む」系のテキスト（多言語）
static LOAD_MORE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(load more|show more|see more|more videos|next page|mehr laden|mehr anzeigen|weitere videos|cargar más|ver más|mostrar más|charger plus|afficher plus|voir plus|carica altri|mostra altro|carregar mais|mostrar mais|もっと見る|さらに表示|さらに読み込む|더\s?보기|加载更多|显示更多|查看更多|загрузить ещё|показать ещё|daha fazla)",
    )
    .expect("Failed to compile load-more regex")
});

/// Shortsを示すオーバーレイスタイル・バッジ
const SHORTS_MARKER: &str = "SHORTS";

/// Shortsかどうかを判定
pub fn is_short_item(video: &VideoItem, memory: &ShelfMemory) -> bool {
    // コンテンツ種別
    if video
        .content_type
        .as_deref()
        .is_some_and(|t| t.to_ascii_uppercase().contains("SHORT") || t == "REEL")
    {
        return true;
    }

    // オーバーレイ・バッジ
    if video
        .overlay_style
        .as_deref()
        .is_some_and(|s| s.eq_ignore_ascii_case(SHORTS_MARKER))
        || video
            .badge_texts
            .iter()
            .any(|t| t.trim().eq_ignore_ascii_case(SHORTS_MARKER))
    {
        return true;
    }

    // Shorts専用のエンドポイント・URL
    if video.has_reel_endpoint || video.url.as_deref().is_some_and(|u| u.starts_with("/shorts/")) {
        return true;
    }

    // タイトルのハッシュタグ
    if video.title.to_lowercase().contains("#shorts") {
        return true;
    }

    if video
        .duration_secs
        .is_some_and(|d| d <= SHORT_DURATION_LIMIT_SECS)
    {
        return true;
    }

    if memory.recognizes(video) {
        return true;
    }

    // 縦長サムネイル（最後の手段）
    video.thumbnail_size.is_some_and(|(w, h)| h > w)
}

/// Shortsシェルフのタイトルかどうか
///
/// "Short film festival"のような部分一致は対象外。
pub fn is_shorts_shelf_title(title: &str) -> bool {
    let title = title.trim().to_lowercase();
    if matches!(title.as_str(), "shorts" | "#shorts" | "short") {
        return true;
    }
    SHORTS_SHELF_TITLE_REGEX.is_match(&title)
}

/// 視聴済み割合が閾値以上かどうか
pub fn is_watched_beyond_threshold(video: &VideoItem, threshold_percent: u8) -> bool {
    video
        .progress
        .is_some_and(|p| p.percent_watched >= f64::from(threshold_percent))
}

/// 継続コマンド・継続エンドポイントを持つか
fn has_continuation_command(node: &Value, depth: usize) -> bool {
    if depth == 0 {
        return false;
    }
    match node {
        Value::Object(map) => map.iter().any(|(key, value)| {
            key == "continuationCommand"
                || key == "continuationEndpoint"
                || has_continuation_command(value, depth - 1)
        }),
        Value::Array(items) => items.iter().any(|v| has_continuation_command(v, depth - 1)),
        _ => false,
    }
}

/// ページネーション用のヘルパー（プレースホルダー）かどうか
pub fn is_likely_playlist_helper_item(item: &Value) -> bool {
    if item.get("continuationItemRenderer").is_some()
        || item.get("continuationRenderer").is_some()
    {
        return true;
    }

    if has_continuation_command(item, HELPER_SEARCH_DEPTH) {
        return true;
    }

    if get_video_id(item).is_none() {
        let title = get_video_title(item);
        return !title.is_empty() && LOAD_MORE_REGEX.is_match(&title);
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn video(value: Value) -> VideoItem {
        VideoItem::from_node(&value).expect("test fixture should be a video item")
    }

    fn plain_video(id: &str, length: &str) -> VideoItem {
        video(json!({"videoRenderer": {
            "videoId": id,
            "title": {"simpleText": "Regular upload"},
            "lengthText": {"simpleText": length},
            "thumbnail": {"thumbnails": [{"url": "u", "width": 480, "height": 360}]}
        }}))
    }

    #[test]
    fn test_shorts_shelf_title_matches() {
        assert!(is_shorts_shelf_title("Shorts"));
        assert!(is_shorts_shelf_title("#shorts"));
        assert!(is_shorts_shelf_title("short"));
        assert!(is_shorts_shelf_title("  SHORTS  "));
        assert!(is_shorts_shelf_title("Shorts for you"));
        assert!(is_shorts_shelf_title("YouTube Shorts"));
    }

    #[test]
    fn test_shorts_shelf_title_rejects_substrings() {
        assert!(!is_shorts_shelf_title("Short film festival"));
        assert!(!is_shorts_shelf_title("My shorts collection of clips"));
        assert!(!is_shorts_shelf_title("Shortstop highlights"));
        assert!(!is_shorts_shelf_title("Board shorts review"));
        assert!(!is_shorts_shelf_title(""));
    }

    #[test]
    fn test_duration_boundary() {
        let memory = ShelfMemory::new();
        assert!(is_short_item(&plain_video("a", "3:00"), &memory));
        assert!(!is_short_item(&plain_video("b", "3:01"), &memory));
    }

    #[test]
    fn test_short_signals() {
        let memory = ShelfMemory::new();

        let by_type = video(json!({"tileRenderer": {"contentId": "t", "contentType": "TILE_CONTENT_TYPE_SHORT"}}));
        assert!(is_short_item(&by_type, &memory));

        let by_overlay = video(json!({"tileRenderer": {"contentId": "t", "header": {"tileHeaderRenderer": {
            "thumbnailOverlays": [{"thumbnailOverlayTimeStatusRenderer": {"text": {"simpleText": "10:00"}, "style": "SHORTS"}}]
        }}}}));
        assert!(is_short_item(&by_overlay, &memory));

        let by_url = video(json!({"videoRenderer": {"videoId": "u", "navigationEndpoint": {
            "commandMetadata": {"webCommandMetadata": {"url": "/shorts/u"}}
        }}}));
        assert!(is_short_item(&by_url, &memory));

        let by_endpoint = video(json!({"gridVideoRenderer": {"videoId": "e", "navigationEndpoint": {
            "reelWatchEndpoint": {"videoId": "e"}
        }}}));
        assert!(is_short_item(&by_endpoint, &memory));

        let by_hashtag = video(json!({"compactVideoRenderer": {"videoId": "h", "title": {"simpleText": "Wow #Shorts"}}}));
        assert!(is_short_item(&by_hashtag, &memory));

        let by_aspect = video(json!({"videoRenderer": {"videoId": "p", "thumbnail": {"thumbnails": [
            {"url": "u", "width": 405, "height": 720}
        ]}}}));
        assert!(is_short_item(&by_aspect, &memory));
    }

    #[test]
    fn test_short_by_shelf_memory() {
        let mut memory = ShelfMemory::new();
        let item = json!({"videoRenderer": {"videoId": "mem", "lengthText": {"simpleText": "12:00"}}});
        assert!(!is_short_item(&video(item.clone()), &memory));

        memory.remember(&item);
        assert!(is_short_item(&video(item), &memory));
    }

    #[test]
    fn test_regular_video_is_not_short() {
        let memory = ShelfMemory::new();
        assert!(!is_short_item(&plain_video("r", "12:34"), &memory));
        // 再生時間がない（ライブ配信など）場合も通常動画
        let live = video(json!({"videoRenderer": {"videoId": "l", "title": {"simpleText": "Live now"}}}));
        assert!(!is_short_item(&live, &memory));
    }

    #[test]
    fn test_watched_threshold() {
        let item = video(json!({"videoRenderer": {"videoId": "w", "thumbnailOverlays": [
            {"thumbnailOverlayResumePlaybackRenderer": {"percentDurationWatched": 95}}
        ]}}));
        assert!(is_watched_beyond_threshold(&item, 95));
        assert!(is_watched_beyond_threshold(&item, 80));
        assert!(!is_watched_beyond_threshold(&item, 96));

        let unwatched = plain_video("u", "10:00");
        assert!(!is_watched_beyond_threshold(&unwatched, 0));
    }

    #[test]
    fn test_playlist_helper_detection() {
        assert!(is_likely_playlist_helper_item(&json!({"continuationItemRenderer": {
            "continuationEndpoint": {"continuationCommand": {"token": "x"}}
        }})));

        let tile_with_command = json!({"tileRenderer": {
            "contentId": "helper1",
            "onSelectCommand": {"continuationCommand": {"token": "abc"}}
        }});
        assert!(is_likely_playlist_helper_item(&tile_with_command));

        let load_more = json!({"tileRenderer": {
            "metadata": {"tileMetadataRenderer": {"title": {"simpleText": "Mehr laden"}}}
        }});
        assert!(is_likely_playlist_helper_item(&load_more));

        let japanese = json!({"tileRenderer": {
            "metadata": {"tileMetadataRenderer": {"title": {"simpleText": "もっと見る"}}}
        }});
        assert!(is_likely_playlist_helper_item(&japanese));
    }

    #[test]
    fn test_playlist_helper_negative() {
        // IDがある場合はタイトルの語彙では判定しない
        let real = json!({"tileRenderer": {
            "contentId": "v1",
            "metadata": {"tileMetadataRenderer": {"title": {"simpleText": "Load more RAM tutorial"}}}
        }});
        assert!(!is_likely_playlist_helper_item(&real));
        assert!(!is_likely_playlist_helper_item(&json!({"tileRenderer": {}})));
        assert!(!is_likely_playlist_helper_item(&json!(null)));
    }
}
