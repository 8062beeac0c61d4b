//! 動画・シェルフのアクセサ
//!
//! 形状の優先順に候補パスを試し、最初に見つかった値を返す。
//! 途中のキーが欠けていても例外にはならず、次の候補に進む。

use serde::Deserialize;
use serde_json::Value;

use super::types::*;
use crate::util::parse_duration_text;

/// 候補パスを順に試し、最初に見つかった空でない文字列を返す
fn first_string(renderer: &Value, paths: &[&str]) -> Option<String> {
    paths.iter().find_map(|path| {
        let value = renderer.pointer(path)?;
        let text = match value {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => return None,
        };
        (!text.is_empty()).then_some(text)
    })
}

fn first_text(renderer: &Value, paths: &[&str]) -> Option<String> {
    paths
        .iter()
        .filter_map(|path| renderer.pointer(path))
        .map(text_of)
        .find(|text| !text.is_empty())
}

/// 動画IDを取得
pub fn get_video_id(item: &Value) -> Option<String> {
    let shape = RendererShape::detect(item)?;
    let renderer = shape.renderer(item)?;
    first_string(renderer, shape.id_paths())
}

/// 表示タイトルを取得（不明な場合は空文字列）
pub fn get_video_title(item: &Value) -> String {
    RendererShape::detect(item)
        .and_then(|shape| {
            let renderer = shape.renderer(item)?;
            first_text(renderer, shape.title_paths())
        })
        .unwrap_or_default()
}

/// オーバーレイ配列から指定キーのレンダラーを列挙
fn overlays<'a>(
    renderer: &'a Value,
    shape: RendererShape,
    key: &'a str,
) -> impl Iterator<Item = &'a Value> {
    renderer
        .pointer(shape.overlays_path())
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(move |overlay| overlay.get(key))
}

fn progress_of(renderer: &Value, shape: RendererShape) -> Option<ResumeProgress> {
    overlays(renderer, shape, "thumbnailOverlayResumePlaybackRenderer")
        .filter_map(|o| ResumePlaybackOverlay::deserialize(o).ok())
        .find_map(|o| o.percent_duration_watched)
        .map(|percent_watched| ResumeProgress { percent_watched })
}

/// 再生位置の記録を取得
pub fn find_progress_bar(item: &Value) -> Option<ResumeProgress> {
    let shape = RendererShape::detect(item)?;
    let renderer = shape.renderer(item)?;
    progress_of(renderer, shape)
}

/// 再生時間（秒）を取得
///
/// `lengthSeconds` → `lengthText` → 時間表示オーバーレイの順。
fn duration_of(renderer: &Value, shape: RendererShape) -> Option<u32> {
    if let Some(seconds) = renderer.get("lengthSeconds") {
        let parsed = match seconds {
            Value::String(s) => s.trim().parse::<u32>().ok(),
            Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
            _ => None,
        };
        if parsed.is_some() {
            return parsed;
        }
    }

    if let Some(duration) = renderer
        .get("lengthText")
        .map(text_of)
        .and_then(|t| parse_duration_text(&t))
    {
        return Some(duration);
    }

    overlays(renderer, shape, "thumbnailOverlayTimeStatusRenderer")
        .filter_map(|o| TimeStatusOverlay::deserialize(o).ok())
        .filter_map(|o| o.text.map(|t| t.get_text()))
        .find_map(|t| parse_duration_text(&t))
}

fn largest_thumbnail(renderer: &Value, shape: RendererShape) -> Option<(u32, u32)> {
    renderer
        .pointer(shape.thumbnails_path())
        .and_then(Value::as_array)?
        .iter()
        .filter_map(|t| Thumbnail::deserialize(t).ok())
        .filter_map(|t| Some((t.width?, t.height?)))
        .max_by_key(|(w, h)| u64::from(*w) * u64::from(*h))
}

impl VideoItem {
    /// ノードを正規化した動画アイテムに変換
    ///
    /// 既知の形状に一致しない場合はNone。
    pub fn from_node(node: &Value) -> Option<Self> {
        let shape = RendererShape::detect(node)?;
        let renderer = shape.renderer(node)?;
        let endpoint = renderer.pointer(shape.endpoint_path());

        let time_status: Vec<TimeStatusOverlay> =
            overlays(renderer, shape, "thumbnailOverlayTimeStatusRenderer")
                .filter_map(|o| TimeStatusOverlay::deserialize(o).ok())
                .collect();

        let mut badge_texts: Vec<String> = time_status
            .iter()
            .filter_map(|o| o.text.as_ref().map(|t| t.get_text()))
            .filter(|t| !t.is_empty())
            .collect();
        badge_texts.extend(
            renderer
                .get("badges")
                .and_then(Value::as_array)
                .into_iter()
                .flatten()
                .filter_map(|b| b.pointer("/metadataBadgeRenderer/label"))
                .filter_map(Value::as_str)
                .map(str::to_string),
        );

        let content_type = match shape {
            RendererShape::RichReel => Some("REEL".to_string()),
            _ => first_string(renderer, &["/contentType"]),
        };

        Some(Self {
            shape,
            video_id: first_string(renderer, shape.id_paths()),
            title: first_text(renderer, shape.title_paths()).unwrap_or_default(),
            progress: progress_of(renderer, shape),
            duration_secs: duration_of(renderer, shape),
            url: endpoint
                .and_then(|e| first_string(e, &["/commandMetadata/webCommandMetadata/url"])),
            content_type,
            overlay_style: time_status.iter().find_map(|o| o.style.clone()),
            badge_texts,
            has_reel_endpoint: endpoint.is_some_and(|e| e.get("reelWatchEndpoint").is_some()),
            thumbnail_size: largest_thumbnail(renderer, shape),
        })
    }
}

/// シェルフのタイトルを取得（不明な場合は空文字列）
pub fn get_shelf_title(shelf: &Value) -> String {
    ShelfShape::detect(shelf)
        .and_then(|shape| first_text(shelf, shape.title_paths()))
        .unwrap_or_default()
}

/// シェルフのアイテム配列へのパスを取得
fn shelf_items_path(shelf: &Value) -> Option<&'static str> {
    let shape = ShelfShape::detect(shelf)?;
    shape
        .items_paths()
        .iter()
        .copied()
        .find(|path| shelf.pointer(path).is_some_and(Value::is_array))
}

/// シェルフのアイテム配列を取得
pub fn shelf_items(shelf: &Value) -> Option<&Vec<Value>> {
    let path = shelf_items_path(shelf)?;
    shelf.pointer(path)?.as_array()
}

/// シェルフのアイテム配列を可変参照で取得
pub fn shelf_items_mut(shelf: &mut Value) -> Option<&mut Vec<Value>> {
    let path = shelf_items_path(shelf)?;
    shelf.pointer_mut(path)?.as_array_mut()
}
