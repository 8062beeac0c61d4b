//! ページ種別の判定
//!
//! ナビゲーション状態（ハッシュ・パス・クエリ）から大まかなページ種別を求める。
//! 純粋関数であり、1レスポンスの処理中に何度呼んでも同じ結果を返す。

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::util::query_param;

/// ページ種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageCategory {
    Home,
    Watch,
    Playlist,
    Playlists,
    Channel,
    Channels,
    Subscriptions,
    Subscription,
    Library,
    History,
    Search,
    Music,
    Gaming,
    Other,
}

/// ルート名とページ種別の対応表
const ROUTE_NAMES: &[(&str, PageCategory)] = &[
    ("home", PageCategory::Home),
    ("watch", PageCategory::Watch),
    ("playlist", PageCategory::Playlist),
    ("playlists", PageCategory::Playlists),
    ("channel", PageCategory::Channel),
    ("channels", PageCategory::Channels),
    ("subscriptions", PageCategory::Subscriptions),
    ("subscription", PageCategory::Subscription),
    ("library", PageCategory::Library),
    ("history", PageCategory::History),
    ("search", PageCategory::Search),
    ("music", PageCategory::Music),
    ("gaming", PageCategory::Gaming),
    ("other", PageCategory::Other),
];

impl PageCategory {
    /// 設定値などで使用する小文字の名前
    pub fn as_str(&self) -> &'static str {
        ROUTE_NAMES
            .iter()
            .find(|(_, page)| page == self)
            .map(|(name, _)| *name)
            .unwrap_or("other")
    }

    /// 名前からページ種別を取得（大文字小文字は区別しない）
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim().to_ascii_lowercase();
        ROUTE_NAMES
            .iter()
            .find(|(route, _)| *route == name)
            .map(|(_, page)| *page)
    }

    /// プレイリスト系ページかどうか
    ///
    /// ヘルパータイルの保持やShorts非表示の抑止など、
    /// ページネーション維持のための特別扱いが必要になる。
    pub fn is_playlist_like(&self) -> bool {
        matches!(self, PageCategory::Playlist | PageCategory::Playlists)
    }
}

impl std::fmt::Display for PageCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// ナビゲーション状態
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationState {
    /// `#/browse?c=FEsubscriptions` 形式のハッシュ
    pub hash: String,
    pub path: String,
    pub search: String,
}

impl LocationState {
    pub fn from_hash(hash: impl Into<String>) -> Self {
        Self {
            hash: hash.into(),
            ..Default::default()
        }
    }
}

/// 現在のページ種別を返す外部シグナル
pub trait PageOracle {
    fn detect_current_page(&self) -> PageCategory;
}

/// 固定のナビゲーション状態から判定するオラクル
#[derive(Debug, Clone, Default)]
pub struct LocationOracle {
    location: LocationState,
}

impl LocationOracle {
    pub fn new(location: LocationState) -> Self {
        Self { location }
    }

    pub fn set_location(&mut self, location: LocationState) {
        self.location = location;
    }
}

impl PageOracle for LocationOracle {
    fn detect_current_page(&self) -> PageCategory {
        classify_page(&self.location)
    }
}

/// browse IDからページ種別を判定
///
/// 明示的なマーカーのみを扱う。該当しない場合はNone。
fn classify_browse_id(browse_id: &str) -> Option<PageCategory> {
    let page = match browse_id {
        "FEsubscriptions" => PageCategory::Subscriptions,
        "FEchannels" => PageCategory::Channels,
        "FElibrary" | "FEmy_youtube" => PageCategory::Library,
        "FEhistory" => PageCategory::History,
        "FEplaylist_aggregation" | "FEplaylists" => PageCategory::Playlists,
        "FEwhat_to_watch" | "FEtopics" => PageCategory::Home,
        "FEtopic_gaming" => PageCategory::Gaming,
        id if id.starts_with("VL") || id.starts_with("PL") => PageCategory::Playlist,
        id if id.starts_with("FEmusic") => PageCategory::Music,
        id if id.starts_with("FEgaming") => PageCategory::Gaming,
        id if id.starts_with("UC") => PageCategory::Channel,
        _ => return None,
    };
    Some(page)
}

/// ナビゲーション状態からページ種別を判定
///
/// 判定順序:
/// 1. browse ID（`c` / `browseId` パラメータ）の明示的マーカー
/// 2. URLパターン（`/watch`, `/playlist`, `list=`, `/channel/` など）
/// 3. ルート名がページ種別名と一致する場合
/// 4. 空のルートはホーム、それ以外はOther
pub fn classify_page(location: &LocationState) -> PageCategory {
    let hash = location.hash.trim().trim_start_matches('#');
    let (hash_route, hash_query) = hash.split_once('?').unwrap_or((hash, ""));

    // 1. 明示的マーカー
    let browse_id = [hash_query, location.search.as_str()]
        .iter()
        .find_map(|q| query_param(q, "c").or_else(|| query_param(q, "browseId")));
    if let Some(page) = browse_id.and_then(classify_browse_id) {
        return page;
    }

    // 2. URLパターン
    let route = if hash_route.is_empty() || hash_route == "/" {
        location.path.as_str()
    } else {
        hash_route
    };
    let has_list_param = [hash_query, location.search.as_str()]
        .iter()
        .any(|q| query_param(q, "list").is_some());

    if route.starts_with("/watch") {
        return PageCategory::Watch;
    }
    if route.starts_with("/playlist") && !route.starts_with("/playlists") {
        return PageCategory::Playlist;
    }
    if has_list_param {
        return PageCategory::Playlist;
    }
    if route.contains("/channel/") || route.starts_with("/@") {
        return PageCategory::Channel;
    }
    if route.starts_with("/search") {
        return PageCategory::Search;
    }

    // 3. ルート名
    let route_name = route.trim_matches('/');
    if route_name.is_empty() {
        return PageCategory::Home;
    }
    let first_segment = route_name.split('/').next().unwrap_or_default();
    PageCategory::from_name(first_segment).unwrap_or(PageCategory::Other)
}

/// レスポンスの形状からページ種別を推定
///
/// ナビゲーション状態から判定できない場合（Other）のフォールバック。
pub fn infer_page_from_payload(root: &Value) -> Option<PageCategory> {
    let continuation = root.get("continuationContents");
    let contents = root.get("contents");

    let has = |parent: Option<&Value>, key: &str| parent.and_then(|p| p.get(key)).is_some();

    if has(continuation, "playlistVideoListContinuation")
        || has(contents, "playlistVideoListRenderer")
    {
        return Some(PageCategory::Playlist);
    }
    if has(root.get("metadata"), "channelMetadataRenderer")
        || has(root.get("header"), "c4TabbedHeaderRenderer")
    {
        return Some(PageCategory::Channel);
    }
    if has(contents, "singleColumnWatchNextResults") || has(contents, "watchNextResults") {
        return Some(PageCategory::Watch);
    }
    // 検索結果はsearchQuery付きのセクションリストで返ることがある
    let section_list = contents.and_then(|c| c.get("sectionListRenderer"));
    if has(contents, "searchResultsRenderer") || has(section_list, "searchQuery") {
        return Some(PageCategory::Search);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn hash(h: &str) -> LocationState {
        LocationState::from_hash(h)
    }

    #[test]
    fn test_classify_browse_markers() {
        assert_eq!(classify_page(&hash("#/browse?c=FEsubscriptions")), PageCategory::Subscriptions);
        assert_eq!(classify_page(&hash("#/browse?c=FElibrary")), PageCategory::Library);
        assert_eq!(classify_page(&hash("#/browse?c=FEhistory")), PageCategory::History);
        assert_eq!(classify_page(&hash("#/browse?c=VLPL12345")), PageCategory::Playlist);
        assert_eq!(
            classify_page(&hash("#/browse?c=FEplaylist_aggregation")),
            PageCategory::Playlists
        );
        assert_eq!(classify_page(&hash("#/browse?c=UCabcdef")), PageCategory::Channel);
        assert_eq!(classify_page(&hash("#/browse?c=FEmusic_home")), PageCategory::Music);
        assert_eq!(classify_page(&hash("#/browse?c=FEwhat_to_watch")), PageCategory::Home);
    }

    #[test]
    fn test_marker_takes_precedence_over_url_pattern() {
        // list=があってもbrowse IDのマーカーが優先
        let location = hash("#/browse?c=FEhistory&list=PL1");
        assert_eq!(classify_page(&location), PageCategory::History);
    }

    #[test]
    fn test_classify_url_patterns() {
        assert_eq!(classify_page(&hash("#/watch?v=abc")), PageCategory::Watch);
        assert_eq!(classify_page(&hash("#/watch?v=abc&list=PL1")), PageCategory::Watch);
        assert_eq!(classify_page(&hash("#/playlist?id=1")), PageCategory::Playlist);
        assert_eq!(classify_page(&hash("#/browse?list=PL1")), PageCategory::Playlist);
        assert_eq!(classify_page(&hash("#/channel/UC123")), PageCategory::Channel);
        assert_eq!(classify_page(&hash("#/search?q=cats")), PageCategory::Search);
    }

    #[test]
    fn test_classify_route_names() {
        assert_eq!(classify_page(&hash("#/subscription")), PageCategory::Subscription);
        assert_eq!(classify_page(&hash("#/channels")), PageCategory::Channels);
        assert_eq!(classify_page(&hash("#/gaming")), PageCategory::Gaming);
    }

    #[test]
    fn test_classify_defaults() {
        assert_eq!(classify_page(&LocationState::default()), PageCategory::Home);
        assert_eq!(classify_page(&hash("#/")), PageCategory::Home);
        assert_eq!(classify_page(&hash("#/unknown-route")), PageCategory::Other);
    }

    #[test]
    fn test_classify_uses_path_and_search() {
        let location = LocationState {
            hash: String::new(),
            path: "/watch".to_string(),
            search: "?v=abc".to_string(),
        };
        assert_eq!(classify_page(&location), PageCategory::Watch);

        let location = LocationState {
            hash: String::new(),
            path: "/".to_string(),
            search: "?c=FEsubscriptions".to_string(),
        };
        assert_eq!(classify_page(&location), PageCategory::Subscriptions);
    }

    #[test]
    fn test_classify_is_idempotent() {
        let location = hash("#/browse?c=FEsubscriptions");
        let first = classify_page(&location);
        let second = classify_page(&location);
        assert_eq!(first, second);
    }

    #[test]
    fn test_page_category_names() {
        assert_eq!(PageCategory::from_name("Watch"), Some(PageCategory::Watch));
        assert_eq!(PageCategory::from_name(" subscriptions "), Some(PageCategory::Subscriptions));
        assert_eq!(PageCategory::from_name("nope"), None);
        assert_eq!(PageCategory::Playlists.to_string(), "playlists");
        assert!(PageCategory::Playlist.is_playlist_like());
        assert!(!PageCategory::Watch.is_playlist_like());
    }

    #[test]
    fn test_infer_page_from_payload() {
        let playlist = json!({"continuationContents": {"playlistVideoListContinuation": {}}});
        assert_eq!(infer_page_from_payload(&playlist), Some(PageCategory::Playlist));

        let channel = json!({"metadata": {"channelMetadataRenderer": {"title": "x"}}});
        assert_eq!(infer_page_from_payload(&channel), Some(PageCategory::Channel));

        let watch = json!({"contents": {"singleColumnWatchNextResults": {}}});
        assert_eq!(infer_page_from_payload(&watch), Some(PageCategory::Watch));

        let search = json!({"contents": {"sectionListRenderer": {
            "contents": [],
            "searchQuery": {"runs": [{"text": "cats"}]}
        }}});
        assert_eq!(infer_page_from_payload(&search), Some(PageCategory::Search));
        let results = json!({"contents": {"searchResultsRenderer": {}}});
        assert_eq!(infer_page_from_payload(&results), Some(PageCategory::Search));

        // searchQueryのないセクションリストは判定しない
        let browse = json!({"contents": {"sectionListRenderer": {"contents": []}}});
        assert_eq!(infer_page_from_payload(&browse), None);

        assert_eq!(infer_page_from_payload(&json!({"foo": 1})), None);
        assert_eq!(infer_page_from_payload(&json!(null)), None);
    }

    #[test]
    fn test_location_oracle() {
        let mut oracle = LocationOracle::new(hash("#/watch?v=1"));
        assert_eq!(oracle.detect_current_page(), PageCategory::Watch);
        oracle.set_location(hash("#/browse?c=FEhistory"));
        assert_eq!(oracle.detect_current_page(), PageCategory::History);
    }
}
