//! レスポンスツリーのフィルタエンジン
//!
//! ホストがデシリアライズしたレスポンスを受け取り、
//! Shorts・視聴済み動画・広告・ページネーション用ヘルパーを
//! ポリシーに従ってその場で書き換える。
//!
//! ## 構成
//! - memory: セッション中の共有メモリ
//! - classify: 分類器
//! - items: アイテム配列フィルタ
//! - shelves: シェルフ処理
//! - walker: 汎用ツリー走査と深い再走査
//! - dispatcher: レスポンスフックのエントリポイント

pub mod classify;
pub mod dispatcher;
pub mod enhance;
pub mod items;
pub mod memory;
pub mod shelves;
pub mod walker;

use std::collections::HashSet;

use crate::collection::CollectionOracle;
use crate::config::FilterConfig;
use crate::page::PageCategory;

pub use dispatcher::ResponseFilter;
pub use enhance::{HqThumbnailEnhancer, ItemEnhancer};
pub use memory::{FilterMemory, PlaylistHelperMemory, ShelfMemory};

/// 1レスポンス分の処理結果の集計
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterStats {
    pub removed_shorts: usize,
    pub removed_watched: usize,
    pub removed_helpers: usize,
    pub removed_unlisted: usize,
    pub removed_shelves: usize,
    pub removed_ads: usize,
    pub collected_unwatched: usize,
    pub fallbacks: usize,
}

impl FilterStats {
    pub fn total_removed(&self) -> usize {
        self.removed_shorts
            + self.removed_watched
            + self.removed_helpers
            + self.removed_unlisted
            + self.removed_shelves
            + self.removed_ads
    }
}

/// 1回のフック呼び出しの間だけ有効なフィルタ文脈
pub struct FilterContext<'a> {
    pub page: PageCategory,
    pub config: &'a FilterConfig,
    pub memory: &'a mut FilterMemory,
    pub collection: &'a dyn CollectionOracle,
    /// filteringモード時の許可ID集合（呼び出しごとに1回だけ取得）
    pub filtered_ids: Option<HashSet<String>>,
    /// 継続トークンのない最終バッチかどうか
    pub is_last_batch: bool,
    pub enhancers: &'a [Box<dyn ItemEnhancer>],
    pub stats: FilterStats,
    /// 既知の形状として処理済みの位置（JSONポインタ）
    handled: HashSet<String>,
}

impl<'a> FilterContext<'a> {
    pub fn new(
        page: PageCategory,
        config: &'a FilterConfig,
        memory: &'a mut FilterMemory,
        collection: &'a dyn CollectionOracle,
    ) -> Self {
        let filtered_ids = if page.is_playlist_like() {
            collection.get_filtered_video_ids()
        } else {
            None
        };
        Self {
            page,
            config,
            memory,
            collection,
            filtered_ids,
            is_last_batch: false,
            enhancers: &[],
            stats: FilterStats::default(),
            handled: HashSet::new(),
        }
    }

    pub fn with_enhancers(mut self, enhancers: &'a [Box<dyn ItemEnhancer>]) -> Self {
        self.enhancers = enhancers;
        self
    }

    pub fn with_last_batch(mut self, is_last_batch: bool) -> Self {
        self.is_last_batch = is_last_batch;
        self
    }

    /// 処理済みの位置を記録（汎用走査はこの位置以下に入らない）
    pub fn mark_handled(&mut self, pointer: impl Into<String>) {
        self.handled.insert(pointer.into());
    }

    pub fn is_handled(&self, pointer: &str) -> bool {
        self.handled.contains(pointer)
    }

    /// Shorts非表示がこのページで有効か
    pub fn shorts_filter_applies(&self) -> bool {
        self.config.shorts_filter_applies(self.page)
    }

    /// 視聴済み非表示がこのページで有効か
    pub fn watched_filter_applies(&self) -> bool {
        self.config.watched_filter_applies(self.page)
    }

    /// 個々の判定をログ出力するか
    pub fn verbose(&self) -> bool {
        self.config.debug_logging
    }
}
