//! プレイリストのコレクションモード
//!
//! プレイリストを一度スクロールして未視聴動画のIDを収集し（collecting）、
//! その後は収集したIDのみを表示する（filtering）ワークフローを管理する。
//! レコードはタイムスタンプから5分で失効する。

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::sync::RwLock;

use crate::errors::FilterError;

/// レコードの有効期間（5分）
const RECORD_TTL_SECS: i64 = 5 * 60;

/// コレクションモードを参照するためのインターフェース
pub trait CollectionOracle {
    /// 未視聴動画を収集中かどうか
    fn is_in_collection_mode(&self) -> bool;

    /// 表示を許可する動画IDの集合（filteringモード時のみSome）
    fn get_filtered_video_ids(&self) -> Option<HashSet<String>>;

    /// 未視聴動画を収集対象として記録
    fn record_unwatched(&self, video_id: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionMode {
    Collecting,
    Filtering,
}

/// 永続化されるコレクションレコード
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionRecord {
    pub mode: CollectionMode,
    pub timestamp: DateTime<Utc>,
    pub video_ids: Vec<String>,
}

impl CollectionRecord {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now - self.timestamp > Duration::seconds(RECORD_TTL_SECS)
    }
}

/// コレクションレコードのストア
#[derive(Debug, Default)]
pub struct CollectionModeStore {
    record: RwLock<Option<CollectionRecord>>,
}

impl CollectionModeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 収集を開始（既存レコードは破棄）
    pub fn start_collecting(&self) {
        self.start_collecting_at(Utc::now());
    }

    fn start_collecting_at(&self, now: DateTime<Utc>) {
        if let Ok(mut record) = self.record.write() {
            *record = Some(CollectionRecord {
                mode: CollectionMode::Collecting,
                timestamp: now,
                video_ids: Vec::new(),
            });
        }
        log::info!("Playlist collection started");
    }

    /// 収集を終了してfilteringモードに切り替え
    ///
    /// # Returns
    /// 収集した動画IDの数（収集中でなければNone）
    pub fn finish_collecting(&self) -> Option<usize> {
        self.finish_collecting_at(Utc::now())
    }

    fn finish_collecting_at(&self, now: DateTime<Utc>) -> Option<usize> {
        let mut guard = self.record.write().ok()?;
        let record = guard.as_mut()?;
        if record.mode != CollectionMode::Collecting {
            return None;
        }
        record.mode = CollectionMode::Filtering;
        record.timestamp = now;
        log::info!(
            "Playlist collection finished with {} videos",
            record.video_ids.len()
        );
        Some(record.video_ids.len())
    }

    pub fn clear(&self) {
        if let Ok(mut record) = self.record.write() {
            *record = None;
        }
    }

    /// 現在のレコードを取得
    pub fn snapshot(&self) -> Option<CollectionRecord> {
        self.record.read().ok()?.clone()
    }

    /// 指定時刻で有効なレコードのモードを取得
    fn active_mode_at(&self, now: DateTime<Utc>) -> Option<CollectionMode> {
        let guard = self.record.read().ok()?;
        let record = guard.as_ref()?;
        if record.is_expired(now) {
            log::debug!("Collection record expired");
            return None;
        }
        Some(record.mode)
    }

    fn filtered_ids_at(&self, now: DateTime<Utc>) -> Option<HashSet<String>> {
        if self.active_mode_at(now)? != CollectionMode::Filtering {
            return None;
        }
        let guard = self.record.read().ok()?;
        guard
            .as_ref()
            .map(|r| r.video_ids.iter().cloned().collect())
    }

    /// ファイルからレコードを読み込む
    pub fn load(&self, path: &Path) -> Result<(), FilterError> {
        let text = std::fs::read_to_string(path)?;
        let loaded: CollectionRecord = serde_json::from_str(&text)?;
        if let Ok(mut record) = self.record.write() {
            *record = Some(loaded);
        }
        Ok(())
    }

    /// レコードをファイルに保存（レコードがなければ何もしない）
    pub fn save(&self, path: &Path) -> Result<(), FilterError> {
        let Some(record) = self.snapshot() else {
            return Ok(());
        };
        let text = serde_json::to_string(&record)?;
        std::fs::write(path, text)?;
        Ok(())
    }
}

impl CollectionOracle for CollectionModeStore {
    fn is_in_collection_mode(&self) -> bool {
        self.active_mode_at(Utc::now()) == Some(CollectionMode::Collecting)
    }

    fn get_filtered_video_ids(&self) -> Option<HashSet<String>> {
        self.filtered_ids_at(Utc::now())
    }

    fn record_unwatched(&self, video_id: &str) {
        if !self.is_in_collection_mode() {
            return;
        }
        if let Ok(mut guard) = self.record.write() {
            if let Some(record) = guard.as_mut() {
                if !record.video_ids.iter().any(|id| id == video_id) {
                    record.video_ids.push(video_id.to_string());
                }
            }
        }
    }
}
