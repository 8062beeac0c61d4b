//! フィルタセッションの共有メモリ
//!
//! - ShelfMemory: 削除したShortsシェルフに含まれていた動画のIDとタイトル
//! - PlaylistHelperMemory: プレイリストのページネーション用ヘルパータイル
//!
//! どちらもセッション（ResponseFilter）が所有し、参照で分類器に渡す。

use lru::LruCache;
use serde_json::Value;
use std::collections::HashSet;
use std::num::NonZeroUsize;

use crate::innertube::{get_video_id, get_video_title, shelf_items, VideoItem};
use crate::util::normalize_title;

/// ヘルパー動画IDの最大保持数
const MAX_HELPER_IDS: usize = 25;

/// ヘルパー複合キー（id|title）の最大保持数
const MAX_HELPER_KEYS: usize = 40;

/// Shortsシェルフで観測した動画の記憶
///
/// 一度Shortsシェルフで見た動画が、後でシェルフ文脈なしの
/// フラットなリストに現れた場合でもShortsと判定するために使う。
/// セッション中は単調増加で、明示的にはクリアしない。
#[derive(Debug, Default)]
pub struct ShelfMemory {
    ids: HashSet<String>,
    titles: HashSet<String>,
}

impl ShelfMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// アイテムのIDと正規化タイトルを記録
    pub fn remember(&mut self, item: &Value) {
        if let Some(id) = get_video_id(item) {
            self.ids.insert(id);
        }
        let title = normalize_title(&get_video_title(item));
        if !title.is_empty() {
            self.titles.insert(title);
        }
    }

    /// シェルフ内の全アイテムを記録
    ///
    /// # Returns
    /// 記録したアイテム数
    pub fn remember_shelf(&mut self, shelf: &Value) -> usize {
        let Some(items) = shelf_items(shelf) else {
            return 0;
        };
        for item in items {
            self.remember(item);
        }
        items.len()
    }

    pub fn contains_id(&self, video_id: &str) -> bool {
        self.ids.contains(video_id)
    }

    pub fn contains_title(&self, title: &str) -> bool {
        let normalized = normalize_title(title);
        !normalized.is_empty() && self.titles.contains(&normalized)
    }

    /// IDまたはタイトルで既知のShortsかどうか
    pub fn recognizes(&self, video: &VideoItem) -> bool {
        video
            .video_id
            .as_deref()
            .is_some_and(|id| self.contains_id(id))
            || self.contains_title(&video.title)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty() && self.titles.is_empty()
    }
}

/// プレイリストのヘルパータイルの記憶
///
/// ホストがページネーションのために挿入するプレースホルダーを覚えておき、
/// 後続バッチで再び現れても除外できるようにする。
/// 保持数には上限があり、超えた分は古い順に破棄する。
#[derive(Debug)]
pub struct PlaylistHelperMemory {
    ids: LruCache<String, ()>,
    keys: LruCache<String, ()>,
    last_helpers: Vec<Value>,
}

impl Default for PlaylistHelperMemory {
    fn default() -> Self {
        Self::new()
    }
}

/// ヘルパーの複合キー（`id|正規化タイトル`）
fn helper_key(item: &Value) -> Option<String> {
    let id = get_video_id(item).unwrap_or_default();
    let title = normalize_title(&get_video_title(item));
    if id.is_empty() && title.is_empty() {
        return None;
    }
    Some(format!("{}|{}", id, title))
}

/// 既存エントリの順序を変えずに追加（FIFO）
fn push_fifo(cache: &mut LruCache<String, ()>, key: String) {
    if !cache.contains(&key) {
        cache.put(key, ());
    }
}

impl PlaylistHelperMemory {
    pub fn new() -> Self {
        Self {
            ids: LruCache::new(NonZeroUsize::new(MAX_HELPER_IDS).unwrap_or(NonZeroUsize::MIN)),
            keys: LruCache::new(NonZeroUsize::new(MAX_HELPER_KEYS).unwrap_or(NonZeroUsize::MIN)),
            last_helpers: Vec::new(),
        }
    }

    /// ヘルパーのIDと複合キーを記録
    pub fn remember(&mut self, item: &Value) {
        if let Some(id) = get_video_id(item) {
            push_fifo(&mut self.ids, id);
        }
        if let Some(key) = helper_key(item) {
            push_fifo(&mut self.keys, key);
        }
    }

    /// 1バッチ分のヘルパーを記録し、直近のヘルパーとして保持
    pub fn remember_batch(&mut self, helpers: Vec<Value>) {
        if helpers.is_empty() {
            return;
        }
        for helper in &helpers {
            self.remember(helper);
        }
        log::debug!(
            "Remembered {} playlist helpers (ids: {}, keys: {})",
            helpers.len(),
            self.ids.len(),
            self.keys.len()
        );
        self.last_helpers = helpers;
    }

    /// 既知のヘルパーかどうか
    pub fn is_known(&self, item: &Value) -> bool {
        get_video_id(item).is_some_and(|id| self.ids.contains(&id))
            || helper_key(item).is_some_and(|key| self.keys.contains(&key))
    }

    pub fn contains_id(&self, video_id: &str) -> bool {
        self.ids.contains(video_id)
    }

    /// 直近のバッチで見つかったヘルパーのうち最後のもの
    pub fn last_helper(&self) -> Option<&Value> {
        self.last_helpers.last()
    }

    pub fn id_count(&self) -> usize {
        self.ids.len()
    }

    pub fn key_count(&self) -> usize {
        self.keys.len()
    }

    /// 最終バッチ到達時にクリア
    pub fn clear(&mut self) {
        self.ids.clear();
        self.keys.clear();
        self.last_helpers.clear();
    }
}

/// セッションが所有するメモリ一式
#[derive(Debug, Default)]
pub struct FilterMemory {
    pub shelves: ShelfMemory,
    pub helpers: PlaylistHelperMemory,
}

impl FilterMemory {
    pub fn new() -> Self {
        Self::default()
    }
}
