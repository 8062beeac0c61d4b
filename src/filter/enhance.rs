//! アイテム拡張フック
//!
//! シェルフのアイテムをフィルタした後、残ったアイテムに有効なエンハンサーを順に適用する。

use serde_json::{json, Value};

use crate::config::FilterConfig;
use crate::innertube::{get_video_id, RendererShape};

/// アイテム配列を書き換える拡張
pub trait ItemEnhancer: Send + Sync {
    fn name(&self) -> &str;

    /// 現在の設定で有効かどうか
    fn is_enabled(&self, config: &FilterConfig) -> bool;

    fn enhance(&self, items: &mut [Value]);
}

/// 高画質サムネイルを先頭に追加する拡張
#[derive(Debug, Default)]
pub struct HqThumbnailEnhancer;

const HQ_THUMBNAIL_WIDTH: u32 = 640;
const HQ_THUMBNAIL_HEIGHT: u32 = 480;

fn hq_thumbnail_url(video_id: &str) -> String {
    format!("https://i.ytimg.com/vi/{}/sddefault.jpg", video_id)
}

impl HqThumbnailEnhancer {
    pub fn new() -> Self {
        Self
    }

    /// 1アイテムにサムネイルを追加
    ///
    /// # Returns
    /// 追加した場合はtrue
    fn enhance_item(item: &mut Value) -> bool {
        let Some(shape) = RendererShape::detect(item) else {
            return false;
        };
        let Some(video_id) = get_video_id(item) else {
            return false;
        };
        let url = hq_thumbnail_url(&video_id);

        let Some(thumbnails) = shape
            .renderer_mut(item)
            .and_then(|r| r.pointer_mut(shape.thumbnails_path()))
            .and_then(Value::as_array_mut)
        else {
            return false;
        };

        if thumbnails
            .iter()
            .any(|t| t.get("url").and_then(Value::as_str) == Some(url.as_str()))
        {
            return false;
        }

        thumbnails.insert(
            0,
            json!({"url": url, "width": HQ_THUMBNAIL_WIDTH, "height": HQ_THUMBNAIL_HEIGHT}),
        );
        true
    }
}

impl ItemEnhancer for HqThumbnailEnhancer {
    fn name(&self) -> &str {
        "hq-thumbnails"
    }

    fn is_enabled(&self, config: &FilterConfig) -> bool {
        config.enable_hq_thumbnails
    }

    fn enhance(&self, items: &mut [Value]) {
        let mut count = 0;
        for item in items.iter_mut() {
            if Self::enhance_item(item) {
                count += 1;
            }
        }
        if count > 0 {
            log::debug!("Added HQ thumbnails to {} items", count);
        }
    }
}
