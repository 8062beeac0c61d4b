//! InnerTube レスポンス構造モジュール
//!
//! バックエンドのJSONレスポンスはスキーマが公開されておらず、
//! 同じ論理エンティティが画面ごとに異なるレンダラー形状で現れる。
//! このモジュールは形状の判別と、値の取り出しだけを担当する（書き換えはしない）。
//!
//! ## 注意事項
//! - 非公式な構造のため、形状の追加・変更に追従が必要
//! - 取り出しに失敗しても例外にはならず、None / 空文字列を返す

pub mod accessors;
pub mod surfaces;
pub mod types;

pub use accessors::{
    find_progress_bar, get_shelf_title, get_video_id, get_video_title, shelf_items, shelf_items_mut,
};
pub use types::*;
