pub mod adblock;
pub mod collection;
pub mod config;
pub mod errors;
pub mod filter;
pub mod hooks;
pub mod innertube;
pub mod logging;
pub mod page;
pub mod util; // doctestのためpubにする

use std::sync::Arc;

pub use collection::{CollectionModeStore, CollectionOracle};
pub use config::{ConfigStore, FilterConfig, MemoryConfigStore};
pub use errors::FilterError;
pub use filter::{FilterStats, ResponseFilter};
pub use hooks::{HookPipeline, ResponseHook};
pub use page::{classify_page, LocationOracle, LocationState, PageCategory, PageOracle};

/// フィルタを登録済みのフックパイプラインを作成
///
/// ロガーを設定の`debugLogging`に従って初期化し、
/// レスポンスフィルタを最初のフックとして登録する。
/// ホストは広告・コーデックなど他のフックをこの後に追加できる。
pub fn create_pipeline(
    config: Arc<dyn ConfigStore>,
    page_oracle: Box<dyn PageOracle>,
    collection: Arc<dyn CollectionOracle>,
) -> HookPipeline {
    let snapshot = FilterConfig::from_store(config.as_ref());
    logging::init_logging(snapshot.debug_logging);

    let mut pipeline = HookPipeline::new();
    pipeline.register(Box::new(ResponseFilter::new(config, page_oracle, collection)));
    log::info!(
        "Response filter installed (adblock: {}, shorts: {}, hide watched: {})",
        snapshot.enable_ad_block,
        snapshot.enable_shorts,
        snapshot.hide_watched_videos
    );
    pipeline
}

/// 設定ファイルを読み込んだ設定ストアを作成
///
/// ファイルがない場合はデフォルト値のまま。
pub fn load_config_store() -> Arc<MemoryConfigStore> {
    let store = Arc::new(MemoryConfigStore::new());
    if let Some(path) = config::default_config_path() {
        if path.exists() {
            match store.load_json_file(&path) {
                Ok(count) => log::info!("Loaded {} config keys from {}", count, path.display()),
                Err(e) => log::warn!("Failed to load config from {}: {}", path.display(), e),
            }
        }
    }
    store
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_pipeline_filters_parsed_payload() {
        let store = Arc::new(MemoryConfigStore::new());
        let mut pipeline = create_pipeline(
            store,
            Box::new(LocationOracle::new(LocationState::from_hash("#/"))),
            Arc::new(CollectionModeStore::new()),
        );
        assert_eq!(pipeline.len(), 1);

        let payload = json!({
            "playerAds": [{}],
            "continuationContents": {"gridContinuation": {"items": [
                {"videoRenderer": {"videoId": "long", "lengthText": {"simpleText": "12:00"}}},
                {"videoRenderer": {"videoId": "clip", "lengthText": {"simpleText": "0:45"}}}
            ]}}
        });
        let tree = pipeline.parse(&payload.to_string()).unwrap();

        assert!(tree.get("playerAds").is_none());
        let items = tree
            .pointer("/continuationContents/gridContinuation/items")
            .and_then(|v| v.as_array())
            .unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["videoRenderer"]["videoId"], json!("long"));
    }
}
