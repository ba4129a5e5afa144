//! 算术服务演示：调用前打印 `name args...`，未被选中的函数静默执行。
//!
//! # 使用方法
//! ```bash
//! cargo run --bin arithmetic
//! cargo run --bin arithmetic -- hooks.toml
//! ```
//! - 不带参数时挂载只包装 `add` 与 `total` 的日志 Hook，日志行写到标准输出；
//! - 带参数时从 TOML 文件读取 [`HookConfig`]，`kind = "usage"` 时额外输出统计快照 JSON；
//! - `RUST_LOG=svc_proxy=trace` 可观察拦截器的 `replaced` / `absent` 决策。

use std::{env, fs, io, sync::Arc};

use serde_json::json;
use svc_proxy_core::{Hook, ServiceDefinition, service};
use svc_proxy_middleware::{
    FunctionSelector, HookConfig, LoggingHook, LoggingHookConfig, WriterSink,
};
use tracing_subscriber::EnvFilter;

pub struct MyService;

#[service]
impl MyService {
    fn add(a: i64, b: i64) -> i64 {
        a + b
    }

    fn total(values: Vec<i64>) -> i64 {
        values.iter().sum()
    }

    fn constant() -> i64 {
        42
    }
}

/// 以同一组函数构造挂载任意 Hook 的服务，函数来自 `#[service]` 生成的定义。
fn with_hook(hook: Arc<dyn Hook>) -> Result<Arc<ServiceDefinition>, String> {
    let base = MyService::definition().map_err(|error| error.to_string())?;
    ServiceDefinition::builder("ConfiguredService")
        .extends(base)
        .shared_hook(hook)
        .build()
        .map_err(|error| error.to_string())
}

fn stdout_logging() -> Arc<dyn Hook> {
    Arc::new(LoggingHook::with_sink(
        LoggingHookConfig {
            functions: FunctionSelector::only(["add", "total"]),
            ..LoggingHookConfig::default()
        },
        Arc::new(WriterSink::new(io::stdout())),
    ))
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    if let Err(error) = run() {
        eprintln!("arithmetic demo failed: {error}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let mut usage = None;
    let hook = match env::args().nth(1) {
        Some(path) => {
            let source =
                fs::read_to_string(&path).map_err(|error| format!("read {path}: {error}"))?;
            let configured = HookConfig::from_toml_str(&source)
                .map_err(|error| error.to_string())?
                .build();
            usage = configured.usage_stats().cloned();
            configured.into_shared()
        }
        None => stdout_logging(),
    };
    let service = with_hook(hook)?;

    let calls = [
        ("add", vec![json!(1), json!(2)]),
        ("total", vec![json!([1, 1, 2, 3, 5])]),
        ("constant", vec![]),
    ];
    for (name, args) in calls {
        let result = service.call(name, &args).map_err(|error| error.to_string())?;
        tracing::info!(target: "svc_proxy::demo", function = name, %result, "call returned");
    }

    let Err(error) = service.instantiate(&[]);
    tracing::info!(target: "svc_proxy::demo", %error, "instantiation rejected");

    if let Some(stats) = usage {
        let snapshot = serde_json::to_string_pretty(&stats.snapshot())
            .map_err(|error| error.to_string())?;
        println!("{snapshot}");
    }
    Ok(())
}
