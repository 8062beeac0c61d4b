//! InnerTube レスポンスの型定義
//!
//! レスポンスにはスキーマがなく、同じ「動画」「シェルフ」が
//! UIの種類（tile / grid / list / rich / compact）ごとに異なる形で現れる。
//! ここでは既知の形状を閉じた列挙型として定義し、
//! 形状ごとのキーパスを一箇所にまとめる。

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 動画アイテムのレンダラー形状
///
/// `PRIORITY`の順に判定し、最初に一致した形状を採用する。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RendererShape {
    /// TV UIのタイル（`tileRenderer`）
    Tile,
    Video,
    PlaylistVideo,
    GridVideo,
    CompactVideo,
    /// `richItemRenderer.content.videoRenderer`
    RichVideo,
    /// `richItemRenderer.content.reelItemRenderer`
    RichReel,
}

/// 動画アイテムの判定に使うキー（構造的な判別用）
pub const VIDEO_ITEM_KEYS: &[&str] = &[
    "tileRenderer",
    "videoRenderer",
    "playlistVideoRenderer",
    "gridVideoRenderer",
    "compactVideoRenderer",
    "richItemRenderer",
];

impl RendererShape {
    pub const PRIORITY: [RendererShape; 7] = [
        RendererShape::Tile,
        RendererShape::Video,
        RendererShape::PlaylistVideo,
        RendererShape::GridVideo,
        RendererShape::CompactVideo,
        RendererShape::RichVideo,
        RendererShape::RichReel,
    ];

    /// レンダラー本体へのJSONポインタ
    fn renderer_pointer(&self) -> &'static str {
        match self {
            RendererShape::Tile => "/tileRenderer",
            RendererShape::Video => "/videoRenderer",
            RendererShape::PlaylistVideo => "/playlistVideoRenderer",
            RendererShape::GridVideo => "/gridVideoRenderer",
            RendererShape::CompactVideo => "/compactVideoRenderer",
            RendererShape::RichVideo => "/richItemRenderer/content/videoRenderer",
            RendererShape::RichReel => "/richItemRenderer/content/reelItemRenderer",
        }
    }

    /// ノードの形状を判定
    pub fn detect(node: &Value) -> Option<Self> {
        Self::PRIORITY
            .into_iter()
            .find(|shape| shape.renderer(node).is_some())
    }

    /// レンダラー本体を取得
    pub fn renderer<'a>(&self, node: &'a Value) -> Option<&'a Value> {
        node.pointer(self.renderer_pointer()).filter(|r| r.is_object())
    }

    pub fn renderer_mut<'a>(&self, node: &'a mut Value) -> Option<&'a mut Value> {
        node.pointer_mut(self.renderer_pointer())
            .filter(|r| r.is_object())
    }

    /// 動画IDの候補パス（レンダラー本体からの相対パス）
    pub fn id_paths(&self) -> &'static [&'static str] {
        match self {
            RendererShape::Tile => &[
                "/contentId",
                "/onSelectCommand/watchEndpoint/videoId",
                "/onSelectCommand/reelWatchEndpoint/videoId",
            ],
            _ => &[
                "/videoId",
                "/navigationEndpoint/watchEndpoint/videoId",
                "/navigationEndpoint/reelWatchEndpoint/videoId",
            ],
        }
    }

    pub fn title_paths(&self) -> &'static [&'static str] {
        match self {
            RendererShape::Tile => &["/metadata/tileMetadataRenderer/title"],
            RendererShape::RichReel => &["/headline", "/title"],
            _ => &["/title", "/headline"],
        }
    }

    pub fn overlays_path(&self) -> &'static str {
        match self {
            RendererShape::Tile => "/header/tileHeaderRenderer/thumbnailOverlays",
            _ => "/thumbnailOverlays",
        }
    }

    pub fn thumbnails_path(&self) -> &'static str {
        match self {
            RendererShape::Tile => "/header/tileHeaderRenderer/thumbnail/thumbnails",
            _ => "/thumbnail/thumbnails",
        }
    }

    /// 選択時に実行されるエンドポイント
    pub fn endpoint_path(&self) -> &'static str {
        match self {
            RendererShape::Tile => "/onSelectCommand",
            _ => "/navigationEndpoint",
        }
    }
}

/// シェルフのコンテナ形状
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShelfShape {
    Shelf,
    RichShelf,
    /// `richSectionRenderer.content.richShelfRenderer`
    RichSection,
    Grid,
    /// Shorts専用のシェルフ
    ReelShelf,
}

/// シェルフの判定に使うキー
pub const SHELF_KEYS: &[&str] = &[
    "shelfRenderer",
    "richShelfRenderer",
    "richSectionRenderer",
    "gridRenderer",
    "reelShelfRenderer",
];

impl ShelfShape {
    pub const PRIORITY: [ShelfShape; 5] = [
        ShelfShape::Shelf,
        ShelfShape::RichShelf,
        ShelfShape::RichSection,
        ShelfShape::Grid,
        ShelfShape::ReelShelf,
    ];

    fn renderer_pointer(&self) -> &'static str {
        match self {
            ShelfShape::Shelf => "/shelfRenderer",
            ShelfShape::RichShelf => "/richShelfRenderer",
            ShelfShape::RichSection => "/richSectionRenderer/content/richShelfRenderer",
            ShelfShape::Grid => "/gridRenderer",
            ShelfShape::ReelShelf => "/reelShelfRenderer",
        }
    }

    pub fn detect(node: &Value) -> Option<Self> {
        Self::PRIORITY
            .into_iter()
            .find(|shape| node.pointer(shape.renderer_pointer()).is_some_and(Value::is_object))
    }

    /// アイテム配列の候補パス（ノードからの絶対パス、優先順）
    pub fn items_paths(&self) -> &'static [&'static str] {
        match self {
            ShelfShape::Shelf => &[
                "/shelfRenderer/content/horizontalListRenderer/items",
                "/shelfRenderer/content/verticalListRenderer/items",
                "/shelfRenderer/content/gridRenderer/items",
                "/shelfRenderer/content/expandedShelfContentsRenderer/items",
            ],
            ShelfShape::RichShelf => &["/richShelfRenderer/contents"],
            ShelfShape::RichSection => &["/richSectionRenderer/content/richShelfRenderer/contents"],
            ShelfShape::Grid => &["/gridRenderer/items"],
            ShelfShape::ReelShelf => &["/reelShelfRenderer/items"],
        }
    }

    /// タイトルの候補パス（ノードからの絶対パス、優先順）
    pub fn title_paths(&self) -> &'static [&'static str] {
        match self {
            ShelfShape::Shelf => &[
                "/shelfRenderer/title",
                "/shelfRenderer/headerRenderer/shelfHeaderRenderer/title",
                "/shelfRenderer/header/shelfHeaderRenderer/title",
            ],
            ShelfShape::RichShelf => &["/richShelfRenderer/title"],
            ShelfShape::RichSection => &["/richSectionRenderer/content/richShelfRenderer/title"],
            ShelfShape::Grid => &[
                "/gridRenderer/header/gridHeaderRenderer/title",
                "/gridRenderer/title",
            ],
            ShelfShape::ReelShelf => &["/reelShelfRenderer/title"],
        }
    }
}

/// 正規化された動画アイテム
///
/// 形状ごとの違いを吸収し、分類器が参照する属性を一度に取り出したもの。
#[derive(Debug, Clone, PartialEq)]
pub struct VideoItem {
    pub shape: RendererShape,
    pub video_id: Option<String>,
    pub title: String,
    pub progress: Option<ResumeProgress>,
    pub duration_secs: Option<u32>,
    pub url: Option<String>,
    /// `TILE_CONTENT_TYPE_SHORT`などのコンテンツ種別
    pub content_type: Option<String>,
    /// 時間表示オーバーレイのスタイル（"SHORTS"など）
    pub overlay_style: Option<String>,
    /// オーバーレイ・バッジのテキスト
    pub badge_texts: Vec<String>,
    pub has_reel_endpoint: bool,
    /// 最大サムネイルの(幅, 高さ)
    pub thumbnail_size: Option<(u32, u32)>,
}

/// 再生位置の記録
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResumeProgress {
    pub percent_watched: f64,
}

/// `thumbnailOverlayResumePlaybackRenderer`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumePlaybackOverlay {
    pub percent_duration_watched: Option<f64>,
}

/// `thumbnailOverlayTimeStatusRenderer`
#[derive(Debug, Deserialize)]
pub struct TimeStatusOverlay {
    pub text: Option<SimpleText>,
    pub style: Option<String>,
}

/// シンプルテキスト
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimpleText {
    pub simple_text: Option<String>,
    pub runs: Option<Vec<RunItem>>,
    pub content: Option<String>,
}

/// runs配列の要素
#[derive(Debug, Deserialize)]
pub struct RunItem {
    pub text: Option<String>,
}

impl SimpleText {
    /// テキスト内容を取得
    pub fn get_text(&self) -> String {
        if let Some(text) = &self.simple_text {
            return text.clone();
        }
        if let Some(runs) = &self.runs {
            return runs
                .iter()
                .filter_map(|r| r.text.as_ref())
                .cloned()
                .collect::<Vec<_>>()
                .join("");
        }
        if let Some(text) = &self.content {
            return text.clone();
        }
        String::new()
    }
}

/// テキストノードから文字列を取り出す
///
/// 文字列そのもの、`simpleText`、`runs`、`content`のいずれにも対応。
/// 想定外の形の場合は空文字列。
pub fn text_of(node: &Value) -> String {
    if let Some(text) = node.as_str() {
        return text.to_string();
    }
    SimpleText::deserialize(node)
        .map(|t| t.get_text())
        .unwrap_or_default()
}

/// サムネイル
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Thumbnail {
    pub url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}
