//! レスポンスフックのパイプライン
//!
//! ホストのJSONデシリアライズ結果を、登録順にフックへ通す。
//! フックが失敗（Err / panic）しても記録だけして次のフックに進む。

use serde_json::Value;
use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::errors::FilterError;

/// パース済みレスポンスを書き換えるフック
pub trait ResponseHook {
    fn name(&self) -> &str;

    /// レスポンスを処理
    ///
    /// `Some`を返すとツリー全体を置き換える。`None`なら（書き換え済みの）入力をそのまま次へ渡す。
    fn on_response(&mut self, tree: &mut Value) -> Result<Option<Value>, FilterError>;
}

type HookFn = Box<dyn FnMut(&mut Value) -> Result<Option<Value>, FilterError>>;

/// クロージャをフックとして扱うためのラッパー
struct FnHook {
    name: String,
    func: HookFn,
}

impl ResponseHook for FnHook {
    fn name(&self) -> &str {
        &self.name
    }

    fn on_response(&mut self, tree: &mut Value) -> Result<Option<Value>, FilterError> {
        (self.func)(tree)
    }
}

/// panicのペイロードからメッセージを取り出す
fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        return (*message).to_string();
    }
    if let Some(message) = payload.downcast_ref::<String>() {
        return message.clone();
    }
    "unknown panic".to_string()
}

/// 登録順にフックを実行するパイプライン
#[derive(Default)]
pub struct HookPipeline {
    hooks: Vec<Box<dyn ResponseHook>>,
}

impl HookPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, hook: Box<dyn ResponseHook>) {
        log::debug!("Registered response hook: {}", hook.name());
        self.hooks.push(hook);
    }

    /// クロージャをフックとして登録
    pub fn register_fn<F>(&mut self, name: &str, func: F)
    where
        F: FnMut(&mut Value) -> Result<Option<Value>, FilterError> + 'static,
    {
        self.register(Box::new(FnHook {
            name: name.to_string(),
            func: Box::new(func),
        }));
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// 全フックを順に実行
    pub fn run(&mut self, mut tree: Value) -> Value {
        for hook in self.hooks.iter_mut() {
            let result = catch_unwind(AssertUnwindSafe(|| hook.on_response(&mut tree)));
            match result {
                Ok(Ok(Some(replacement))) => tree = replacement,
                Ok(Ok(None)) => {}
                Ok(Err(e)) => {
                    let error = FilterError::HookFailed {
                        name: hook.name().to_string(),
                        message: e.to_string(),
                    };
                    log::warn!("{}", error);
                }
                Err(payload) => {
                    let error = FilterError::HookFailed {
                        name: hook.name().to_string(),
                        message: panic_message(payload.as_ref()),
                    };
                    log::error!("{} (panicked)", error);
                }
            }
        }
        tree
    }

    /// JSONテキストをパースしてフックに通す
    pub fn parse(&mut self, text: &str) -> Result<Value, FilterError> {
        let tree: Value = serde_json::from_str(text)?;
        Ok(self.run(tree))
    }
}

impl std::fmt::Debug for HookPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.hooks.iter().map(|h| h.name()).collect();
        f.debug_struct("HookPipeline").field("hooks", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_hooks_run_in_order() {
        let mut pipeline = HookPipeline::new();
        pipeline.register_fn("first", |tree| {
            tree["order"] = json!(["first"]);
            Ok(None)
        });
        pipeline.register_fn("second", |tree| {
            if let Some(order) = tree["order"].as_array_mut() {
                order.push(json!("second"));
            }
            Ok(None)
        });

        let result = pipeline.run(json!({}));
        assert_eq!(result["order"], json!(["first", "second"]));
        assert_eq!(pipeline.len(), 2);
    }

    #[test]
    fn test_hook_can_replace_tree() {
        let mut pipeline = HookPipeline::new();
        pipeline.register_fn("replace", |_| Ok(Some(json!({"replaced": true}))));
        pipeline.register_fn("check", |tree| {
            let seen = tree["replaced"] == json!(true);
            tree["seen"] = json!(seen);
            Ok(None)
        });

        let result = pipeline.run(json!({"original": 1}));
        assert!(result.get("original").is_none());
        assert_eq!(result["seen"], json!(true));
    }

    #[test]
    fn test_failing_hooks_are_isolated() {
        let mut pipeline = HookPipeline::new();
        pipeline.register_fn("partial", |tree| {
            tree["partial"] = json!(true);
            Err(FilterError::InvalidConfig {
                key: "x".to_string(),
                message: "boom".to_string(),
            })
        });
        pipeline.register_fn("panics", |_| panic!("hook crashed"));
        pipeline.register_fn("after", |tree| {
            tree["after"] = json!(true);
            Ok(None)
        });

        let result = pipeline.run(json!({}));
        // 失敗したフックの途中までの書き換えは残る
        assert_eq!(result["partial"], json!(true));
        assert_eq!(result["after"], json!(true));
    }

    #[test]
    fn test_parse() {
        let mut pipeline = HookPipeline::new();
        pipeline.register_fn("mark", |tree| {
            tree["marked"] = json!(1);
            Ok(None)
        });

        let tree = pipeline.parse(r#"{"a": [1, 2]}"#).unwrap();
        assert_eq!(tree["marked"], json!(1));
        assert!(matches!(pipeline.parse("{broken"), Err(FilterError::JsonError(_))));
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("static message");
        assert_eq!(panic_message(payload.as_ref()), "static message");
        let payload: Box<dyn std::any::Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(payload.as_ref()), "owned");
    }
}
