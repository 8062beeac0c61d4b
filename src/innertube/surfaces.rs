//! レスポンスのトップレベル構造へのアクセサ
//!
//! ブラウズ画面・継続読み込み・再生画面の関連動画・セカンダリナビなど、
//! バックエンドが使う既知のコンテナ形状ごとに、シェルフ配列または
//! アイテム配列への参照を返す。

use serde_json::Value;

/// `onResponseReceived*`系のキー（処理順）
pub const RESPONSE_RECEIVED_KEYS: &[&str] = &[
    "onResponseReceivedActions",
    "onResponseReceivedEndpoints",
    "onResponseReceivedCommands",
];

const BROWSE_RESULT_KEYS: &[&str] = &[
    "twoColumnBrowseResultsRenderer",
    "singleColumnBrowseResultsRenderer",
];

const CONTINUATION_ITEM_PATHS: &[&str] = &[
    "/appendContinuationItemsAction/continuationItems",
    "/reloadContinuationItemsCommand/continuationItems",
];

const SURFACE_SHELF_PATHS: &[&str] = &[
    "/sectionListRenderer/contents",
    "/tvSurfaceContentRenderer/content/sectionListRenderer/contents",
];

const SURFACE_ITEM_PATHS: &[&str] = &[
    "/gridRenderer/items",
    "/tvSurfaceContentRenderer/content/gridRenderer/items",
];

/// ツリー内の位置（JSONポインタ）とその値への参照
#[derive(Debug)]
pub struct Located<'a, T: ?Sized> {
    pub pointer: String,
    pub node: &'a mut T,
}

impl<'a, T: ?Sized> Located<'a, T> {
    fn new(pointer: impl Into<String>, node: &'a mut T) -> Self {
        Self {
            pointer: pointer.into(),
            node,
        }
    }
}

/// 候補パスのうち最初に配列が見つかったものを、相対パスとともに返す
fn first_array_mut<'a>(
    node: &'a mut Value,
    paths: &[&'static str],
) -> Option<(&'static str, &'a mut Vec<Value>)> {
    let path = paths
        .iter()
        .copied()
        .find(|path| node.pointer(path).is_some_and(Value::is_array))?;
    Some((path, node.pointer_mut(path)?.as_array_mut()?))
}

fn array_at<'a>(root: &'a mut Value, path: &str) -> Option<Located<'a, Vec<Value>>> {
    let items = root.pointer_mut(path)?.as_array_mut()?;
    Some(Located::new(path, items))
}

const TV_BROWSE_CONTENT: &str = "/contents/tvBrowseRenderer/content";
const SECONDARY_NAV_SECTIONS: &str =
    "/contents/tvBrowseRenderer/content/tvSecondaryNavRenderer/sections";

/// TVブラウズ画面の本体（`tvBrowseRenderer.content`）
pub fn tv_browse_content(root: &mut Value) -> Option<Located<'_, Value>> {
    let content = root.pointer_mut(TV_BROWSE_CONTENT)?;
    Some(Located::new(TV_BROWSE_CONTENT, content))
}

/// 画面の中身がセカンダリナビ（タブの入れ物）か
pub fn is_secondary_nav(content: &Value) -> bool {
    content.get("tvSecondaryNavRenderer").is_some()
}

/// セカンダリナビ（タブ）の各タブの中身
pub fn secondary_nav_tab_contents(root: &mut Value) -> Vec<Located<'_, Value>> {
    let Some(sections) = root
        .pointer_mut(SECONDARY_NAV_SECTIONS)
        .and_then(Value::as_array_mut)
    else {
        return vec![];
    };

    sections
        .iter_mut()
        .enumerate()
        .filter_map(|(i, section)| {
            let tabs = section
                .pointer_mut("/tvSecondaryNavSectionRenderer/tabs")?
                .as_array_mut()?;
            Some((i, tabs))
        })
        .flat_map(|(i, tabs)| {
            tabs.iter_mut().enumerate().filter_map(move |(j, tab)| {
                let content = tab.pointer_mut("/tabRenderer/content")?;
                let pointer = format!(
                    "{}/{}/tvSecondaryNavSectionRenderer/tabs/{}/tabRenderer/content",
                    SECONDARY_NAV_SECTIONS, i, j
                );
                Some(Located::new(pointer, content))
            })
        })
        .collect()
}

/// 1カラム・2カラムのブラウズ結果の各タブの中身
pub fn browse_tab_contents(root: &mut Value) -> Vec<Located<'_, Value>> {
    let Some(contents) = root.get_mut("contents").and_then(Value::as_object_mut) else {
        return vec![];
    };

    contents
        .iter_mut()
        .filter(|(key, _)| BROWSE_RESULT_KEYS.contains(&key.as_str()))
        .filter_map(|(key, renderer)| {
            let tabs = renderer.get_mut("tabs")?.as_array_mut()?;
            Some((key.as_str(), tabs))
        })
        .flat_map(|(key, tabs)| {
            tabs.iter_mut().enumerate().filter_map(move |(j, tab)| {
                let content = tab.pointer_mut("/tabRenderer/content")?;
                let pointer = format!("/contents/{}/tabs/{}/tabRenderer/content", key, j);
                Some(Located::new(pointer, content))
            })
        })
        .collect()
}

/// 画面の中身からシェルフ配列を取得
pub fn surface_shelves(content: &mut Value) -> Option<&mut Vec<Value>> {
    first_array_mut(content, SURFACE_SHELF_PATHS).map(|(_, shelves)| shelves)
}

/// 画面の中身からグリッドのアイテム配列を取得
pub fn surface_grid_items(content: &mut Value) -> Option<&mut Vec<Value>> {
    first_array_mut(content, SURFACE_ITEM_PATHS).map(|(_, items)| items)
}

/// セクションリストの継続読み込み（シェルフ配列）
pub fn section_list_continuation(root: &mut Value) -> Option<Located<'_, Vec<Value>>> {
    array_at(root, "/continuationContents/sectionListContinuation/contents")
}

/// 横並びリストの継続読み込み（アイテム配列）
pub fn horizontal_list_continuation(root: &mut Value) -> Option<Located<'_, Vec<Value>>> {
    array_at(root, "/continuationContents/horizontalListContinuation/items")
}

/// グリッドの継続読み込み（アイテム配列）
pub fn grid_continuation(root: &mut Value) -> Option<Located<'_, Vec<Value>>> {
    array_at(root, "/continuationContents/gridContinuation/items")
}

/// プレイリストの継続読み込み（アイテム配列）
pub fn playlist_video_list_continuation(root: &mut Value) -> Option<Located<'_, Vec<Value>>> {
    array_at(root, "/continuationContents/playlistVideoListContinuation/contents")
}

/// 再生画面の関連動画（シェルフ配列）
pub fn watch_next_pivot_shelves(root: &mut Value) -> Option<Located<'_, Vec<Value>>> {
    array_at(
        root,
        "/contents/singleColumnWatchNextResults/pivot/sectionListRenderer/contents",
    )
}

/// `onResponseReceived*`の各アクションに含まれる継続アイテム配列
pub fn response_received_items<'a>(
    root: &'a mut Value,
    key: &str,
) -> Vec<Located<'a, Vec<Value>>> {
    let Some(actions) = root.get_mut(key).and_then(Value::as_array_mut) else {
        return vec![];
    };

    actions
        .iter_mut()
        .enumerate()
        .filter_map(|(i, action)| {
            let (path, items) = first_array_mut(action, CONTINUATION_ITEM_PATHS)?;
            Some(Located::new(format!("/{}/{}{}", key, i, path), items))
        })
        .collect()
}

/// 継続トークンを持つか（最終バッチでないか）を判定
///
/// 継続アイテム・継続コマンド・nextContinuationDataのいずれかがあれば継続あり。
/// 深さは`max_depth`で打ち切る。
pub fn has_continuation(node: &Value, max_depth: usize) -> bool {
    const CONTINUATION_KEYS: &[&str] = &[
        "continuationItemRenderer",
        "continuationCommand",
        "continuationEndpoint",
        "nextContinuationData",
        "reloadContinuationData",
    ];

    if max_depth == 0 {
        return false;
    }
    match node {
        Value::Object(map) => map.iter().any(|(key, value)| {
            CONTINUATION_KEYS.contains(&key.as_str())
                || (key == "continuations" && value.as_array().is_some_and(|c| !c.is_empty()))
                || has_continuation(value, max_depth - 1)
        }),
        Value::Array(items) => items.iter().any(|v| has_continuation(v, max_depth - 1)),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tv_browse_surface() {
        let mut root = json!({"contents": {"tvBrowseRenderer": {"content": {
            "tvSurfaceContentRenderer": {"content": {"sectionListRenderer": {"contents": [1, 2, 3]}}}
        }}}});
        let content = tv_browse_content(&mut root).unwrap();
        assert_eq!(content.pointer, "/contents/tvBrowseRenderer/content");
        assert!(!is_secondary_nav(content.node));
        assert_eq!(surface_shelves(content.node).map(|s| s.len()), Some(3));
    }

    #[test]
    fn test_secondary_nav_tabs() {
        let mut root = json!({"contents": {"tvBrowseRenderer": {"content": {"tvSecondaryNavRenderer": {
            "sections": [
                {"tvSecondaryNavSectionRenderer": {"tabs": [
                    {"tabRenderer": {"content": {"tvSurfaceContentRenderer": {"content": {"gridRenderer": {"items": [1]}}}}}},
                    {"tabRenderer": {"content": {"tvSurfaceContentRenderer": {"content": {"sectionListRenderer": {"contents": []}}}}}}
                ]}},
                {"somethingElse": {}}
            ]
        }}}}});
        assert!(is_secondary_nav(root.pointer("/contents/tvBrowseRenderer/content").unwrap()));
        let tabs = secondary_nav_tab_contents(&mut root);
        assert_eq!(tabs.len(), 2);
        assert_eq!(
            tabs[1].pointer,
            "/contents/tvBrowseRenderer/content/tvSecondaryNavRenderer/sections/0\
             /tvSecondaryNavSectionRenderer/tabs/1/tabRenderer/content"
        );
        let mut tabs = tabs.into_iter().map(|tab| tab.node);
        let first = tabs.next().unwrap();
        assert_eq!(surface_grid_items(first).map(|i| i.len()), Some(1));
        assert!(surface_shelves(tabs.next().unwrap()).is_some());
    }

    #[test]
    fn test_browse_tab_contents() {
        let mut root = json!({"contents": {"singleColumnBrowseResultsRenderer": {"tabs": [
            {"tabRenderer": {"content": {"sectionListRenderer": {"contents": [1]}}}},
            {"expandableTabRenderer": {}}
        ]}}});
        let mut tabs = browse_tab_contents(&mut root);
        assert_eq!(tabs.len(), 1);
        assert_eq!(
            tabs[0].pointer,
            "/contents/singleColumnBrowseResultsRenderer/tabs/0/tabRenderer/content"
        );
        assert_eq!(surface_shelves(tabs[0].node).map(|s| s.len()), Some(1));
    }

    #[test]
    fn test_continuation_surfaces() {
        let mut root = json!({"continuationContents": {
            "playlistVideoListContinuation": {"contents": [1, 2]}
        }});
        let playlist = playlist_video_list_continuation(&mut root).unwrap();
        assert_eq!(playlist.node.len(), 2);
        assert_eq!(
            playlist.pointer,
            "/continuationContents/playlistVideoListContinuation/contents"
        );
        assert!(section_list_continuation(&mut root).is_none());
        assert!(grid_continuation(&mut root).is_none());
        assert!(horizontal_list_continuation(&mut root).is_none());
    }

    #[test]
    fn test_response_received_items() {
        let mut root = json!({"onResponseReceivedActions": [
            {"appendContinuationItemsAction": {"continuationItems": [1, 2]}},
            {"reloadContinuationItemsCommand": {"continuationItems": [3]}},
            {"unknownAction": {}}
        ]});
        let lists = response_received_items(&mut root, "onResponseReceivedActions");
        assert_eq!(lists.iter().map(|l| l.node.len()).collect::<Vec<_>>(), vec![2, 1]);
        assert_eq!(
            lists[1].pointer,
            "/onResponseReceivedActions/1/reloadContinuationItemsCommand/continuationItems"
        );
        assert!(response_received_items(&mut root, "onResponseReceivedCommands").is_empty());
    }

    #[test]
    fn test_has_continuation() {
        assert!(has_continuation(&json!({"a": [{"continuationItemRenderer": {}}]}), 16));
        assert!(has_continuation(&json!({"continuations": [{"nextContinuationData": {}}]}), 16));
        assert!(!has_continuation(&json!({"continuations": []}), 16));
        assert!(!has_continuation(&json!({"a": [1, 2, {"b": "c"}]}), 16));
        // 深さ制限を超えた位置は見ない
        assert!(!has_continuation(&json!({"a": {"b": {"continuationCommand": {}}}}), 2));
    }
}
