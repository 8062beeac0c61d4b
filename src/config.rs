// =============================================================================
// 設定モジュール
// =============================================================================
// フィルタの機能フラグを読み取り専用で扱う。
// 設定の保存・UIはホスト側の責務で、コアは値を読むだけ。
// =============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::errors::FilterError;
use crate::page::PageCategory;

/// 設定ファイル格納ディレクトリ名
const APP_IDENTIFIER: &str = "com.tubefilter.tv";

/// 設定ファイル名
const CONFIG_FILE_NAME: &str = "config.json";

/// 視聴済み判定のデフォルト閾値（%）
pub const DEFAULT_WATCHED_THRESHOLD: u8 = 80;

// 設定キー
pub const KEY_ENABLE_AD_BLOCK: &str = "enableAdBlock";
pub const KEY_ENABLE_SHORTS: &str = "enableShorts";
pub const KEY_HIDE_WATCHED: &str = "hideWatchedVideos";
pub const KEY_HIDE_WATCHED_PAGES: &str = "hideWatchedVideosPages";
pub const KEY_HIDE_WATCHED_THRESHOLD: &str = "hideWatchedVideosThreshold";
pub const KEY_ENABLE_HQ_THUMBNAILS: &str = "enableHqThumbnails";
pub const KEY_DEBUG_LOGGING: &str = "debugLogging";

/// 同期的なキー・バリュー読み取りインターフェース
pub trait ConfigStore: Send + Sync {
    fn read(&self, key: &str) -> Option<Value>;
}

/// 設定変更通知
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigChange {
    pub key: String,
    pub value: Value,
}

type ConfigListener = Box<dyn Fn(&ConfigChange) + Send + Sync>;

/// メモリ上の設定ストア
///
/// ホストの設定サブシステムの代替、およびテスト用。
/// 値の変更は登録済みリスナーに通知される。
#[derive(Default)]
pub struct MemoryConfigStore {
    entries: RwLock<HashMap<String, Value>>,
    listeners: RwLock<Vec<ConfigListener>>,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 値を設定してリスナーに通知
    pub fn set(&self, key: &str, value: Value) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(key.to_string(), value.clone());
        }

        let change = ConfigChange {
            key: key.to_string(),
            value,
        };
        if let Ok(listeners) = self.listeners.read() {
            for listener in listeners.iter() {
                listener(&change);
            }
        }
    }

    /// 変更通知を購読
    pub fn subscribe<F>(&self, listener: F)
    where
        F: Fn(&ConfigChange) + Send + Sync + 'static,
    {
        if let Ok(mut listeners) = self.listeners.write() {
            listeners.push(Box::new(listener));
        }
    }

    /// JSONオブジェクト形式のファイルから値を読み込む
    ///
    /// # Returns
    /// 読み込んだキーの数
    pub fn load_json_file(&self, path: &Path) -> Result<usize, FilterError> {
        let text = std::fs::read_to_string(path)?;
        let value: Value = serde_json::from_str(&text)?;
        let Value::Object(map) = value else {
            return Err(FilterError::InvalidConfig {
                key: path.display().to_string(),
                message: "config file must contain a JSON object".to_string(),
            });
        };

        let count = map.len();
        for (key, value) in map {
            self.set(&key, value);
        }
        log::info!("Loaded {} config entries from {:?}", count, path);
        Ok(count)
    }
}

impl ConfigStore for MemoryConfigStore {
    fn read(&self, key: &str) -> Option<Value> {
        self.entries.read().ok()?.get(key).cloned()
    }
}

impl std::fmt::Debug for MemoryConfigStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let keys = self
            .entries
            .read()
            .map(|e| e.len())
            .unwrap_or_default();
        f.debug_struct("MemoryConfigStore")
            .field("entries", &keys)
            .finish()
    }
}

/// デフォルトの設定ファイルパス
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_IDENTIFIER).join(CONFIG_FILE_NAME))
}

/// 1回のフック呼び出しで使用する設定スナップショット
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterConfig {
    pub enable_ad_block: bool,
    /// falseの場合Shortsを非表示にする
    pub enable_shorts: bool,
    pub hide_watched_videos: bool,
    pub hide_watched_videos_pages: Vec<PageCategory>,
    pub hide_watched_videos_threshold: u8,
    pub enable_hq_thumbnails: bool,
    pub debug_logging: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            enable_ad_block: true,
            enable_shorts: false,
            hide_watched_videos: false,
            hide_watched_videos_pages: vec![
                PageCategory::Subscriptions,
                PageCategory::Channel,
                PageCategory::Home,
            ],
            hide_watched_videos_threshold: DEFAULT_WATCHED_THRESHOLD,
            enable_hq_thumbnails: false,
            debug_logging: false,
        }
    }
}

impl FilterConfig {
    /// ストアから設定を読み取る
    ///
    /// 未設定・型違いのキーはデフォルト値を使用する。
    pub fn from_store(store: &dyn ConfigStore) -> Self {
        let defaults = Self::default();
        let read_bool = |key: &str, default: bool| {
            store
                .read(key)
                .and_then(|v| v.as_bool())
                .unwrap_or(default)
        };

        let hide_watched_videos_pages = store
            .read(KEY_HIDE_WATCHED_PAGES)
            .and_then(|v| v.as_array().cloned())
            .map(|pages| {
                pages
                    .iter()
                    .filter_map(|p| p.as_str())
                    .filter_map(PageCategory::from_name)
                    .collect()
            })
            .unwrap_or(defaults.hide_watched_videos_pages);

        let hide_watched_videos_threshold = store
            .read(KEY_HIDE_WATCHED_THRESHOLD)
            .and_then(|v| v.as_f64())
            .map(|t| t.clamp(0.0, 100.0).round() as u8)
            .unwrap_or(defaults.hide_watched_videos_threshold);

        Self {
            enable_ad_block: read_bool(KEY_ENABLE_AD_BLOCK, defaults.enable_ad_block),
            enable_shorts: read_bool(KEY_ENABLE_SHORTS, defaults.enable_shorts),
            hide_watched_videos: read_bool(KEY_HIDE_WATCHED, defaults.hide_watched_videos),
            hide_watched_videos_pages,
            hide_watched_videos_threshold,
            enable_hq_thumbnails: read_bool(
                KEY_ENABLE_HQ_THUMBNAILS,
                defaults.enable_hq_thumbnails,
            ),
            debug_logging: read_bool(KEY_DEBUG_LOGGING, defaults.debug_logging),
        }
    }

    /// このページでShorts非表示を適用するか
    ///
    /// プレイリスト系ページではユーザーが明示的に追加した動画のため適用しない。
    pub fn shorts_filter_applies(&self, page: PageCategory) -> bool {
        !self.enable_shorts && !page.is_playlist_like()
    }

    /// このページで視聴済み動画の非表示を適用するか
    pub fn watched_filter_applies(&self, page: PageCategory) -> bool {
        self.hide_watched_videos && self.hide_watched_videos_pages.contains(&page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_defaults_from_empty_store() {
        let store = MemoryConfigStore::new();
        let config = FilterConfig::from_store(&store);
        assert_eq!(config, FilterConfig::default());
        assert_eq!(config.hide_watched_videos_threshold, 80);
    }

    #[test]
    fn test_from_store_reads_values() {
        let store = MemoryConfigStore::new();
        store.set(KEY_ENABLE_SHORTS, json!(true));
        store.set(KEY_HIDE_WATCHED, json!(true));
        store.set(KEY_HIDE_WATCHED_PAGES, json!(["watch", "Search", "bogus"]));
        store.set(KEY_HIDE_WATCHED_THRESHOLD, json!(95));

        let config = FilterConfig::from_store(&store);
        assert!(config.enable_shorts);
        assert!(config.hide_watched_videos);
        // 不明なページ名は無視される
        assert_eq!(
            config.hide_watched_videos_pages,
            vec![PageCategory::Watch, PageCategory::Search]
        );
        assert_eq!(config.hide_watched_videos_threshold, 95);
    }

    #[test]
    fn test_from_store_wrong_types_fall_back() {
        let store = MemoryConfigStore::new();
        store.set(KEY_ENABLE_AD_BLOCK, json!("yes"));
        store.set(KEY_HIDE_WATCHED_THRESHOLD, json!(250));

        let config = FilterConfig::from_store(&store);
        assert!(config.enable_ad_block);
        // 範囲外は100にクランプ
        assert_eq!(config.hide_watched_videos_threshold, 100);
    }

    #[test]
    fn test_filter_scopes() {
        let mut config = FilterConfig::default();
        assert!(config.shorts_filter_applies(PageCategory::Home));
        assert!(!config.shorts_filter_applies(PageCategory::Playlist));

        config.enable_shorts = true;
        assert!(!config.shorts_filter_applies(PageCategory::Home));

        config.hide_watched_videos = true;
        config.hide_watched_videos_pages = vec![PageCategory::Watch];
        assert!(config.watched_filter_applies(PageCategory::Watch));
        assert!(!config.watched_filter_applies(PageCategory::Channel));
    }

    #[test]
    fn test_listeners_are_notified() {
        let store = MemoryConfigStore::new();
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = Arc::clone(&count);
        store.subscribe(move |change| {
            assert_eq!(change.key, KEY_ENABLE_SHORTS);
            count_clone.fetch_add(1, Ordering::SeqCst);
        });

        store.set(KEY_ENABLE_SHORTS, json!(true));
        store.set(KEY_ENABLE_SHORTS, json!(false));
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_load_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"enableShorts": true, "hideWatchedVideosThreshold": 90}}"#).unwrap();

        let store = MemoryConfigStore::new();
        let count = store.load_json_file(file.path()).unwrap();
        assert_eq!(count, 2);
        assert_eq!(store.read(KEY_ENABLE_SHORTS), Some(json!(true)));
    }

    #[test]
    fn test_load_json_file_rejects_non_object() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[1, 2, 3]").unwrap();

        let store = MemoryConfigStore::new();
        let result = store.load_json_file(file.path());
        assert!(matches!(result, Err(FilterError::InvalidConfig { .. })));
    }

    #[test]
    fn test_load_json_file_missing() {
        let store = MemoryConfigStore::new();
        let result = store.load_json_file(Path::new("/nonexistent/tubefilter/config.json"));
        assert!(matches!(result, Err(FilterError::IoError(_))));
    }

    #[test]
    fn test_default_config_path_file_name() {
        if let Some(path) = default_config_path() {
            assert!(path.ends_with("com.tubefilter.tv/config.json"));
        }
    }
}
