//! シェルフ処理
//!
//! ブラウズ画面のシェルフ配列を処理する。
//! 1. Shortsシェルフをまとめて除去（アイテムはShelfMemoryに記録）
//! 2. 残りのシェルフごとにアイテム配列をフィルタし、残ったアイテムに拡張を適用

use serde_json::Value;

use super::classify::is_shorts_shelf_title;
use super::items::direct_filter_array;
use super::FilterContext;
use crate::innertube::{get_shelf_title, shelf_items_mut, ShelfShape};

/// Shortsシェルフかどうか（タイトルまたはShorts専用の形状）
pub fn is_shorts_shelf(shelf: &Value) -> bool {
    match ShelfShape::detect(shelf) {
        Some(ShelfShape::ReelShelf) => true,
        Some(_) => is_shorts_shelf_title(&get_shelf_title(shelf)),
        None => false,
    }
}

/// Shortsシェルフを除去し、含まれていた動画をShelfMemoryに記録
///
/// # Returns
/// 除去したシェルフ数
pub fn remove_shorts_shelves(shelves: &mut Vec<Value>, ctx: &mut FilterContext) -> usize {
    let before = shelves.len();
    let memory = &mut ctx.memory.shelves;

    shelves.retain(|shelf| {
        if !is_shorts_shelf(shelf) {
            return true;
        }
        let remembered = memory.remember_shelf(shelf);
        log::debug!(
            "Removed shorts shelf '{}' ({} items remembered)",
            get_shelf_title(shelf),
            remembered
        );
        false
    });

    let removed = before - shelves.len();
    ctx.stats.removed_shelves += removed;
    removed
}

/// シェルフ配列を処理
pub fn process_shelves(shelves: &mut Vec<Value>, ctx: &mut FilterContext) {
    if ctx.shorts_filter_applies() {
        remove_shorts_shelves(shelves, ctx);
    }

    let before = shelves.len();
    shelves.retain_mut(|shelf| process_shelf(shelf, ctx));
    let dropped = before - shelves.len();
    if dropped > 0 {
        log::debug!("Dropped {} empty shelves", dropped);
        ctx.stats.removed_shelves += dropped;
    }
}

/// 1つのシェルフを処理
///
/// # Returns
/// シェルフを残す場合はtrue
fn process_shelf(shelf: &mut Value, ctx: &mut FilterContext) -> bool {
    // シェルフ以外の要素（継続アイテムなど）はそのまま残す
    if ShelfShape::detect(shelf).is_none() {
        return true;
    }

    let Some(items) = shelf_items_mut(shelf) else {
        return false;
    };
    if items.is_empty() {
        return false;
    }

    // プレイリストでは元に戻す場合に備えてアイテムと集計を控えておく
    let original = if ctx.page.is_playlist_like() {
        Some((items.clone(), ctx.stats.clone()))
    } else {
        None
    };

    let fallbacks = ctx.stats.fallbacks;
    let filtered = direct_filter_array(std::mem::take(items), ctx);
    // 代替タイルだけが残った場合も空になったものとして扱う
    let emptied = filtered.is_empty() || ctx.stats.fallbacks > fallbacks;

    if !emptied {
        *items = filtered;
    } else if let Some((original, stats)) = original {
        // ページネーション用のタイルを残すため元に戻す
        log::debug!("Shelf filtered to empty on playlist page; restoring original items");
        *items = original;
        ctx.stats = stats;
    } else {
        return false;
    }

    apply_enhancers(items, ctx);
    true
}

/// 残ったアイテムに有効な拡張を適用
///
/// 分類はフィルタ時点の元データで行うため、拡張はフィルタの後に適用する。
fn apply_enhancers(items: &mut [Value], ctx: &FilterContext) {
    for enhancer in ctx.enhancers {
        if enhancer.is_enabled(ctx.config) {
            log::debug!("Applying enhancer '{}' to {} items", enhancer.name(), items.len());
            enhancer.enhance(items);
        }
    }
}
