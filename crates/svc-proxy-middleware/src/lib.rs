//! svc-proxy-middleware: 可复用的 `proxy` Hook 实现。
//!
//! # 教案式概览
//! - **意图（Why）**：最常见的横切需求是“调用前记一行日志”与“统计调用次数和耗时”，
//!   把它们做成可配置、可共享的 Hook，服务定义只需挂载即可；
//! - **结构（How）**：
//!   - [`logging`]：[`LoggingHook`] 与可替换的输出端 [`CallLogSink`]；
//!   - [`metrics`]：[`UsageStatsHook`] 与并发安全的 [`UsageStats`]；
//!   - [`selector`]：按名字筛选被包装的函数；
//!   - [`config`]：从 TOML 声明构建 Hook。
//! - **契约（What）**：所有 Hook 对未被选中的函数返回 `Absent`，被包装函数的返回值与错误原样传递。

pub mod config;
pub mod logging;
pub mod metrics;
pub mod selector;

pub use config::{ConfigError, ConfiguredHook, HookConfig};
pub use logging::{
    CallLogSink, CallRecord, LogLevel, LoggingHook, LoggingHookConfig, RecordingSink, TracingSink,
    WriterSink,
};
pub use metrics::{FunctionUsage, UsageSnapshot, UsageStats, UsageStatsConfig, UsageStatsHook};
pub use selector::FunctionSelector;
