//! レスポンスフックのディスパッチャー
//!
//! パース済みレスポンス1件に対して、固定の順序でフィルタを適用する。
//! 1. ページ種別の決定（オラクル → レスポンス形状 → 前回のページ）
//! 2. 広告の除去
//! 3. 既知のコンテナ形状ごとのシェルフ処理・アイテムフィルタ
//! 4. 深い再走査
//! 5. 汎用フィルタ（1回だけ）
//!
//! 呼び出しをまたいで保持する状態はメモリと前回のページのみ。

use serde_json::Value;
use std::sync::Arc;

use super::enhance::{HqThumbnailEnhancer, ItemEnhancer};
use super::items::direct_filter_array;
use super::memory::FilterMemory;
use super::shelves::process_shelves;
use super::walker::{
    hard_prune_watched_deep, run_universal_filter_once, scan_and_filter_all_arrays,
    scan_and_filter_array, strip_playlist_helpers_deep, strip_shorts_shelves_deep, MAX_DEPTH,
};
use super::{FilterContext, FilterStats};
use crate::adblock::strip_ads;
use crate::collection::CollectionOracle;
use crate::config::{ConfigStore, FilterConfig};
use crate::errors::FilterError;
use crate::hooks::ResponseHook;
use crate::innertube::surfaces::{
    browse_tab_contents, grid_continuation, has_continuation, horizontal_list_continuation,
    is_secondary_nav, playlist_video_list_continuation, response_received_items,
    secondary_nav_tab_contents, section_list_continuation, surface_grid_items, surface_shelves,
    tv_browse_content, watch_next_pivot_shelves, Located, RESPONSE_RECEIVED_KEYS,
};
use crate::page::{infer_page_from_payload, PageCategory, PageOracle};

/// アイテム配列をその場でフィルタ
fn filter_items_in_place(items: &mut Vec<Value>, ctx: &mut FilterContext) {
    let filtered = direct_filter_array(std::mem::take(items), ctx);
    *items = filtered;
}

/// 画面の中身（タブの中身など）を処理し、処理済みとして記録
fn filter_surface(surface: Located<'_, Value>, ctx: &mut FilterContext) {
    let Located { pointer, node } = surface;
    if let Some(shelves) = surface_shelves(node) {
        process_shelves(shelves, ctx);
    } else if let Some(items) = surface_grid_items(node) {
        filter_items_in_place(items, ctx);
    } else {
        scan_and_filter_all_arrays(node, ctx, &pointer);
    }
    ctx.mark_handled(pointer);
}

fn filter_located_items(items: Located<'_, Vec<Value>>, ctx: &mut FilterContext) {
    filter_items_in_place(items.node, ctx);
    ctx.mark_handled(items.pointer);
}

fn process_located_shelves(shelves: Located<'_, Vec<Value>>, ctx: &mut FilterContext) {
    process_shelves(shelves.node, ctx);
    ctx.mark_handled(shelves.pointer);
}

/// 既知のコンテナ形状を順に処理
///
/// 処理した位置は記録され、後の汎用フィルタはそこに入らない。
fn filter_known_surfaces(root: &mut Value, ctx: &mut FilterContext) {
    // セカンダリナビはタブごとに処理する
    if let Some(content) = tv_browse_content(root).filter(|c| !is_secondary_nav(&*c.node)) {
        filter_surface(content, ctx);
    }
    for content in secondary_nav_tab_contents(root) {
        filter_surface(content, ctx);
    }
    for content in browse_tab_contents(root) {
        filter_surface(content, ctx);
    }

    if let Some(shelves) = section_list_continuation(root) {
        process_located_shelves(shelves, ctx);
    }
    if let Some(items) = horizontal_list_continuation(root) {
        filter_located_items(items, ctx);
    }
    if let Some(items) = grid_continuation(root) {
        filter_located_items(items, ctx);
    }
    if let Some(items) = playlist_video_list_continuation(root) {
        filter_located_items(items, ctx);
    }
    if let Some(shelves) = watch_next_pivot_shelves(root) {
        process_located_shelves(shelves, ctx);
    }

    for key in RESPONSE_RECEIVED_KEYS {
        for items in response_received_items(root, key) {
            scan_and_filter_array(items.node, ctx, &items.pointer);
            ctx.mark_handled(items.pointer);
        }
    }
}

/// フィルタセッション
///
/// 共有メモリを所有し、レスポンスごとに設定のスナップショットを取って処理する。
pub struct ResponseFilter {
    config: Arc<dyn ConfigStore>,
    page_oracle: Box<dyn PageOracle>,
    collection: Arc<dyn CollectionOracle>,
    memory: FilterMemory,
    enhancers: Vec<Box<dyn ItemEnhancer>>,
    last_page: Option<PageCategory>,
    last_stats: FilterStats,
}

impl ResponseFilter {
    pub fn new(
        config: Arc<dyn ConfigStore>,
        page_oracle: Box<dyn PageOracle>,
        collection: Arc<dyn CollectionOracle>,
    ) -> Self {
        Self {
            config,
            page_oracle,
            collection,
            memory: FilterMemory::new(),
            enhancers: vec![Box::new(HqThumbnailEnhancer::new())],
            last_page: None,
            last_stats: FilterStats::default(),
        }
    }

    /// 拡張を追加
    pub fn with_enhancer(mut self, enhancer: Box<dyn ItemEnhancer>) -> Self {
        self.enhancers.push(enhancer);
        self
    }

    pub fn set_page_oracle(&mut self, page_oracle: Box<dyn PageOracle>) {
        self.page_oracle = page_oracle;
    }

    pub fn memory(&self) -> &FilterMemory {
        &self.memory
    }

    /// 直前のレスポンスの処理結果
    pub fn last_stats(&self) -> &FilterStats {
        &self.last_stats
    }

    pub fn last_page(&self) -> Option<PageCategory> {
        self.last_page
    }

    /// ページ種別を決定
    fn resolve_page(&mut self, root: &Value) -> PageCategory {
        let detected = self.page_oracle.detect_current_page();
        let page = if detected != PageCategory::Other {
            detected
        } else {
            infer_page_from_payload(root)
                .or(self.last_page)
                .unwrap_or(PageCategory::Other)
        };

        if page != PageCategory::Other {
            self.last_page = Some(page);
        }
        page
    }

    /// レスポンスを処理
    pub fn handle(&mut self, root: &mut Value) -> FilterStats {
        let page = self.resolve_page(root);
        let config = FilterConfig::from_store(self.config.as_ref());
        let is_last_batch = !has_continuation(root, MAX_DEPTH);

        let removed_ads = if config.enable_ad_block {
            strip_ads(root)
        } else {
            0
        };

        let mut ctx = FilterContext::new(page, &config, &mut self.memory, self.collection.as_ref())
            .with_enhancers(&self.enhancers)
            .with_last_batch(is_last_batch);
        ctx.stats.removed_ads = removed_ads;

        filter_known_surfaces(root, &mut ctx);

        hard_prune_watched_deep(root, &mut ctx);
        strip_shorts_shelves_deep(root, &mut ctx);
        strip_playlist_helpers_deep(root, &mut ctx);

        run_universal_filter_once(root, &mut ctx);

        let stats = ctx.stats;
        if stats.total_removed() > 0 {
            log::info!(
                "Filtered response on {} page: shorts={}, watched={}, helpers={}, unlisted={}, shelves={}, ads={}",
                page,
                stats.removed_shorts,
                stats.removed_watched,
                stats.removed_helpers,
                stats.removed_unlisted,
                stats.removed_shelves,
                stats.removed_ads
            );
        } else {
            log::debug!("Response on {} page passed through unchanged", page);
        }

        self.last_stats = stats.clone();
        stats
    }
}

impl ResponseHook for ResponseFilter {
    fn name(&self) -> &str {
        "response-filter"
    }

    fn on_response(&mut self, tree: &mut Value) -> Result<Option<Value>, FilterError> {
        self.handle(tree);
        Ok(None)
    }
}

impl std::fmt::Debug for ResponseFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseFilter")
            .field("memory", &self.memory)
            .field("last_page", &self.last_page)
            .field("last_stats", &self.last_stats)
            .finish()
    }
}
