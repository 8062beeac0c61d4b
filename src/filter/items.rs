//! アイテム配列フィルタ
//!
//! 動画アイテムの配列から、ポリシーに従って不要なアイテムを除いた新しい配列を作る。
//! アイテムごとの判定順序は優先順位そのものなので、入れ替えてはいけない。

use serde_json::Value;

use super::classify::{is_likely_playlist_helper_item, is_short_item, is_watched_beyond_threshold};
use super::FilterContext;
use crate::innertube::VideoItem;

/// アイテム配列をフィルタする
///
/// 判定順序:
/// 1. プレイリスト系ページで既知のヘルパー → 除外
/// 2. プレイリスト系ページでヘルパーらしいアイテム → 出力せずバッファ
/// 3. ShelfMemoryで既知のShorts → 除外
/// 4. Shorts非表示が有効でShorts判定 → 除外
/// 5. プレイリストのfilteringモードで許可IDにない → 除外
/// 6. 視聴済み非表示が有効で閾値以上 → 除外
///
/// プレイリスト系ページでは、結果が空になり最終バッチでもない場合に
/// ページネーションを止めないよう1件だけ代替アイテムを残す。
pub fn direct_filter_array(items: Vec<Value>, ctx: &mut FilterContext) -> Vec<Value> {
    let is_playlist = ctx.page.is_playlist_like();
    let shorts_hidden = !ctx.config.enable_shorts;
    let shorts_applies = ctx.shorts_filter_applies();
    let watched_applies = ctx.watched_filter_applies();
    let threshold = ctx.config.hide_watched_videos_threshold;
    let verbose = ctx.verbose();

    let input_len = items.len();
    let last_input = if is_playlist { items.last().cloned() } else { None };
    let mut helpers: Vec<Value> = Vec::new();
    let mut output: Vec<Value> = Vec::with_capacity(input_len);

    for item in items {
        // 想定外の要素はそのまま残す
        if !item.is_object() {
            output.push(item);
            continue;
        }

        if is_playlist && ctx.memory.helpers.is_known(&item) {
            ctx.stats.removed_helpers += 1;
            continue;
        }

        if is_playlist && is_likely_playlist_helper_item(&item) {
            helpers.push(item);
            continue;
        }

        let Some(video) = VideoItem::from_node(&item) else {
            output.push(item);
            continue;
        };

        if shorts_hidden && ctx.memory.shelves.recognizes(&video) {
            if verbose {
                log::debug!("Removed remembered short: {:?}", video.video_id);
            }
            ctx.stats.removed_shorts += 1;
            continue;
        }

        if shorts_applies && is_short_item(&video, &ctx.memory.shelves) {
            if verbose {
                log::debug!("Removed short: {:?} '{}'", video.video_id, video.title);
            }
            ctx.stats.removed_shorts += 1;
            continue;
        }

        if is_playlist {
            if let Some(allowed) = &ctx.filtered_ids {
                let listed = video.video_id.as_ref().is_some_and(|id| allowed.contains(id));
                if !listed {
                    ctx.stats.removed_unlisted += 1;
                    continue;
                }
            }
        }

        if watched_applies && is_watched_beyond_threshold(&video, threshold) {
            if verbose {
                log::debug!(
                    "Removed watched video: {:?} ({:?})",
                    video.video_id,
                    video.progress
                );
            }
            ctx.stats.removed_watched += 1;
            continue;
        }

        if is_playlist && ctx.filtered_ids.is_none() && video.progress.is_none() {
            ctx.stats.collected_unwatched += 1;
            if let Some(id) = &video.video_id {
                ctx.collection.record_unwatched(id);
            }
        }

        output.push(item);
    }

    if is_playlist {
        finish_playlist_batch(&mut output, helpers, last_input, input_len, ctx);
    }

    output
}

/// プレイリスト系ページのバッチ後処理
fn finish_playlist_batch(
    output: &mut Vec<Value>,
    helpers: Vec<Value>,
    last_input: Option<Value>,
    input_len: usize,
    ctx: &mut FilterContext,
) {
    let helper_count = helpers.len();
    ctx.memory.helpers.remember_batch(helpers);
    ctx.stats.removed_helpers += helper_count;

    if output.is_empty() && input_len > 0 && !ctx.is_last_batch && ctx.filtered_ids.is_none() {
        let fallback = ctx.memory.helpers.last_helper().cloned().or(last_input);
        if let Some(fallback) = fallback {
            log::debug!("Batch filtered to empty; keeping one tile to continue pagination");
            ctx.stats.fallbacks += 1;
            output.push(fallback);
        }
    }

    if ctx.is_last_batch {
        log::debug!("Reached last playlist batch; clearing helper memory");
        ctx.memory.helpers.clear();
    }
}
