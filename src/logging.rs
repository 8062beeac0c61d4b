//! ログ出力の初期化
//!
//! `log`ファサードのバックエンドとして`env_logger`を使用する。
//! ホストが独自のロガーを設定済みの場合は何もしない。

use log::LevelFilter;

/// ロガーを初期化
///
/// `debug`がtrueの場合はDebugレベル、それ以外はInfoレベル。
/// 2回目以降の呼び出しは無視される。
pub fn init_logging(debug: bool) {
    let level = if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    if env_logger::Builder::new()
        .filter_level(level)
        .try_init()
        .is_ok()
    {
        log::info!("tubefilter logging initialized (level: {})", level);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_twice_is_noop() {
        init_logging(true);
        init_logging(false);
        log::debug!("still alive");
    }
}
