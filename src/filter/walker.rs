//! 汎用ツリー走査
//!
//! 既知のコンテナ形状で処理しきれなかった配列を拾うための走査。
//! 配列の中身を構造的に判別し、動画アイテム配列ならアイテムフィルタ、
//! シェルフ配列ならShortsシェルフ除去を適用する。
//!
//! 走査の深さは`MAX_DEPTH`で打ち切る。

use serde_json::Value;

use super::classify::{is_likely_playlist_helper_item, is_watched_beyond_threshold};
use super::items::direct_filter_array;
use super::shelves::{is_shorts_shelf, remove_shorts_shelves};
use super::FilterContext;
use crate::innertube::{RendererShape, VideoItem, SHELF_KEYS, VIDEO_ITEM_KEYS};

/// 走査する最大の深さ
pub const MAX_DEPTH: usize = 128;

/// 配列の判別で調べる先頭要素数
pub const SNIFF_LIMIT: usize = 64;

/// 汎用フィルタ適用済みマーカー
pub const APPLIED_MARKER: &str = "__tubeFilterApplied";

/// 汎用フィルタをスキップさせるマーカー
pub const SKIP_MARKER: &str = "__tubeFilterSkip";

fn has_any_key(value: &Value, keys: &[&str]) -> bool {
    value
        .as_object()
        .is_some_and(|map| keys.iter().any(|key| map.contains_key(*key)))
}

/// 動画アイテムを含む配列か
fn looks_like_items(items: &[Value]) -> bool {
    items
        .iter()
        .take(SNIFF_LIMIT)
        .any(|v| has_any_key(v, VIDEO_ITEM_KEYS))
}

/// シェルフを含む配列か
fn looks_like_shelves(items: &[Value]) -> bool {
    items.iter().take(SNIFF_LIMIT).any(|v| has_any_key(v, SHELF_KEYS))
}

/// JSONポインタの深さ（区切りの数）
fn pointer_depth(pointer: &str) -> usize {
    pointer.matches('/').count()
}

/// JSONポインタにキーを1つ追加（`~`と`/`はエスケープ）
fn push_key(path: &mut String, key: &str) {
    path.push('/');
    if key.contains(|c| c == '~' || c == '/') {
        path.push_str(&key.replace('~', "~0").replace('/', "~1"));
    } else {
        path.push_str(key);
    }
}

/// ツリー全体の配列を走査してフィルタ
///
/// `pointer`は`node`のルートからの位置。処理済みとして記録された位置の下には入らない。
/// スカラー値は何もしない。動画アイテム自体の中には入らない。
pub fn scan_and_filter_all_arrays(node: &mut Value, ctx: &mut FilterContext, pointer: &str) {
    let mut path = pointer.to_string();
    walk_node(node, ctx, &mut path, pointer_depth(pointer));
}

/// 1つの配列とその中身を走査してフィルタ
pub fn scan_and_filter_array(items: &mut Vec<Value>, ctx: &mut FilterContext, pointer: &str) {
    let mut path = pointer.to_string();
    walk_array(items, ctx, &mut path, pointer_depth(pointer));
}

fn walk_node(node: &mut Value, ctx: &mut FilterContext, path: &mut String, depth: usize) {
    if depth > MAX_DEPTH {
        log::debug!("Tree walk depth limit reached; leaving subtree untouched");
        return;
    }
    if ctx.is_handled(path) {
        return;
    }

    match node {
        Value::Array(items) => walk_array(items, ctx, path, depth),
        Value::Object(map) => {
            for (key, value) in map.iter_mut() {
                if value.is_array() || value.is_object() {
                    let len = path.len();
                    push_key(path, key);
                    walk_node(value, ctx, path, depth + 1);
                    path.truncate(len);
                }
            }
        }
        _ => {}
    }
}

fn walk_array(items: &mut Vec<Value>, ctx: &mut FilterContext, path: &mut String, depth: usize) {
    if depth > MAX_DEPTH || ctx.is_handled(path) {
        return;
    }
    if looks_like_shelves(items) && ctx.shorts_filter_applies() {
        remove_shorts_shelves(items, ctx);
    }
    if looks_like_items(items) {
        let filtered = direct_filter_array(std::mem::take(items), ctx);
        *items = filtered;
    }
    for (index, item) in items.iter_mut().enumerate() {
        if RendererShape::detect(item).is_none() {
            let len = path.len();
            push_key(path, &index.to_string());
            walk_node(item, ctx, path, depth + 1);
            path.truncate(len);
        }
    }
}

/// レスポンス全体に汎用フィルタを1回だけ適用
///
/// # Returns
/// 適用した場合はtrue
pub fn run_universal_filter_once(root: &mut Value, ctx: &mut FilterContext) -> bool {
    let marked = |key: &str| root.get(key).and_then(Value::as_bool).unwrap_or(false);
    if marked(SKIP_MARKER) {
        log::debug!("Universal filter skipped by marker");
        return false;
    }
    if marked(APPLIED_MARKER) {
        return false;
    }

    scan_and_filter_all_arrays(root, ctx, "");

    if let Some(map) = root.as_object_mut() {
        map.insert(APPLIED_MARKER.to_string(), Value::Bool(true));
    }
    true
}

/// 配列ごとに`f`を適用しながら深く走査
fn for_each_array(node: &mut Value, depth: usize, f: &mut dyn FnMut(&mut Vec<Value>)) {
    if depth > MAX_DEPTH {
        return;
    }
    match node {
        Value::Array(items) => {
            f(items);
            for item in items.iter_mut() {
                for_each_array(item, depth + 1, f);
            }
        }
        Value::Object(map) => {
            for value in map.values_mut() {
                for_each_array(value, depth + 1, f);
            }
        }
        _ => {}
    }
}

/// 入れ子の深い位置に残った視聴済み動画を除去
///
/// プレイリスト系ページではページネーション用の代替アイテムを残すため対象外。
///
/// # Returns
/// 除去したアイテム数
pub fn hard_prune_watched_deep(root: &mut Value, ctx: &mut FilterContext) -> usize {
    if !ctx.watched_filter_applies() || ctx.page.is_playlist_like() {
        return 0;
    }
    let threshold = ctx.config.hide_watched_videos_threshold;
    let mut removed = 0;

    for_each_array(root, 0, &mut |items| {
        let before = items.len();
        items.retain(|item| {
            !VideoItem::from_node(item).is_some_and(|v| is_watched_beyond_threshold(&v, threshold))
        });
        removed += before - items.len();
    });

    if removed > 0 {
        log::debug!("Deep prune removed {} watched videos", removed);
    }
    ctx.stats.removed_watched += removed;
    removed
}

/// 入れ子の深い位置に残ったShortsシェルフを除去
///
/// # Returns
/// 除去したシェルフ数
pub fn strip_shorts_shelves_deep(root: &mut Value, ctx: &mut FilterContext) -> usize {
    if !ctx.shorts_filter_applies() {
        return 0;
    }
    let mut removed = 0;

    for_each_array(root, 0, &mut |items| {
        if items.iter().take(SNIFF_LIMIT).any(is_shorts_shelf) {
            removed += remove_shorts_shelves(items, ctx);
        }
    });

    removed
}

/// プレイリストの入れ子の深い位置に残ったヘルパーを除去
///
/// 実際の動画を含む配列だけを対象にするため、配列が空になることはない。
///
/// # Returns
/// 除去したアイテム数
pub fn strip_playlist_helpers_deep(root: &mut Value, ctx: &mut FilterContext) -> usize {
    if !ctx.page.is_playlist_like() {
        return 0;
    }
    let mut removed = 0;
    let helpers = &mut ctx.memory.helpers;

    for_each_array(root, 0, &mut |items| {
        let has_real_video = items.iter().any(|item| {
            RendererShape::detect(item).is_some() && !is_likely_playlist_helper_item(item)
        });
        if !has_real_video {
            return;
        }
        let before = items.len();
        items.retain(|item| {
            let helper = helpers.is_known(item) || is_likely_playlist_helper_item(item);
            if helper {
                helpers.remember(item);
            }
            !helper
        });
        removed += before - items.len();
    });

    if removed > 0 {
        log::debug!("Deep pass removed {} playlist helpers", removed);
    }
    ctx.stats.removed_helpers += removed;
    removed
}
