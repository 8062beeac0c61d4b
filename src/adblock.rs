//! 広告ペイロードの除去
//!
//! レスポンスのルートにある広告用キーと、任意の深さの配列に含まれる
//! 広告レンダラーを取り除く。

use serde_json::Value;

use crate::filter::walker::MAX_DEPTH;

/// ルートから削除する広告キー
const AD_ROOT_KEYS: &[&str] = &["adPlacements", "playerAds", "adSlots", "adBreakHeartbeatParams"];

/// 広告レンダラーのキー
const AD_RENDERER_KEYS: &[&str] = &[
    "adSlotRenderer",
    "promotedSparklesWebRenderer",
    "displayAdRenderer",
    "promotedVideoRenderer",
    "compactPromotedVideoRenderer",
    "statementBannerRenderer",
    "brandVideoShelfRenderer",
    "tvMastheadRenderer",
];

/// 有料プロモーションのオーバーレイ
const PAID_CONTENT_KEY: &str = "paidContentOverlay";

fn is_ad_element(value: &Value) -> bool {
    let Some(map) = value.as_object() else {
        return false;
    };
    AD_RENDERER_KEYS.iter().any(|key| map.contains_key(*key))
        || map
            .get("richItemRenderer")
            .and_then(|r| r.get("content"))
            .and_then(Value::as_object)
            .is_some_and(|content| AD_RENDERER_KEYS.iter().any(|key| content.contains_key(*key)))
}

fn strip_nested(node: &mut Value, depth: usize) -> usize {
    if depth > MAX_DEPTH {
        return 0;
    }
    match node {
        Value::Array(items) => {
            let before = items.len();
            items.retain(|item| !is_ad_element(item));
            let mut removed = before - items.len();
            for item in items.iter_mut() {
                removed += strip_nested(item, depth + 1);
            }
            removed
        }
        Value::Object(map) => {
            let mut removed = usize::from(map.remove(PAID_CONTENT_KEY).is_some());
            for value in map.values_mut() {
                removed += strip_nested(value, depth + 1);
            }
            removed
        }
        _ => 0,
    }
}

/// 広告ペイロードを除去
///
/// # Returns
/// 除去した要素数
pub fn strip_ads(root: &mut Value) -> usize {
    let mut removed = 0;
    if let Some(map) = root.as_object_mut() {
        for key in AD_ROOT_KEYS {
            if map.remove(*key).is_some() {
                removed += 1;
            }
        }
    }
    removed += strip_nested(root, 0);

    if removed > 0 {
        log::debug!("Removed {} ad payloads", removed);
    }
    removed
}
