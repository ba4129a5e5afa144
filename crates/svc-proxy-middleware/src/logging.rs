use std::{borrow::Cow, io::Write, sync::Arc};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use svc_proxy_core::{
    Accessor, Hook, HookDescriptor, Interception, ServiceError, ServiceFn,
};

use crate::selector::FunctionSelector;

/// 日志级别，对应 `tracing::Level`。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

/// 日志 Hook 的配置。
///
/// # 教案式说明
/// - **意图（Why）**：不同服务需要记录的函数集合与级别各不相同，配置把这些差异外部化，
///   Hook 本身保持无状态并可在多个服务间共享；
/// - **契约（What）**：
///   - `label`：低基数字符串，写入每条日志的 `label` 字段，用于区分多个日志 Hook；
///   - `level`：经由 [`TracingSink`] 输出时使用的级别；
///   - `functions`：被包装的函数集合，未被选中的合格函数原样透传。
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingHookConfig {
    pub label: Cow<'static, str>,
    pub level: LogLevel,
    pub functions: FunctionSelector,
}

impl Default for LoggingHookConfig {
    fn default() -> Self {
        Self {
            label: Cow::Borrowed("logging"),
            level: LogLevel::Info,
            functions: FunctionSelector::all(),
        }
    }
}

/// 一次被包装函数的调用。
#[derive(Clone, Copy, Debug)]
pub struct CallRecord<'a> {
    pub label: &'a str,
    pub service: &'a str,
    pub function: &'a str,
    pub args: &'a [Value],
}

impl CallRecord<'_> {
    /// 渲染为 `name arg1 arg2 ...`：字符串参数原样输出，其余参数为紧凑 JSON。
    pub fn line(&self) -> String {
        let mut line = String::from(self.function);
        for arg in self.args {
            line.push(' ');
            match arg {
                Value::String(text) => line.push_str(text),
                other => line.push_str(&other.to_string()),
            }
        }
        line
    }
}

/// 调用日志的输出端。
pub trait CallLogSink: Send + Sync {
    fn record(&self, level: LogLevel, call: &CallRecord<'_>);
}

/// 以 `tracing` 事件输出，target 固定为 `svc_proxy::calls`。
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl CallLogSink for TracingSink {
    fn record(&self, level: LogLevel, call: &CallRecord<'_>) {
        let line = call.line();
        macro_rules! emit {
            ($macro:ident) => {
                tracing::$macro!(
                    target: "svc_proxy::calls",
                    label = call.label,
                    service = call.service,
                    function = call.function,
                    args = call.args.len(),
                    "{line}"
                )
            };
        }
        match level {
            LogLevel::Trace => emit!(trace),
            LogLevel::Debug => emit!(debug),
            LogLevel::Info => emit!(info),
            LogLevel::Warn => emit!(warn),
            LogLevel::Error => emit!(error),
        }
    }
}

/// 逐行写入任意 `io::Write`，例如标准输出。写入失败只记录 `tracing` 警告，不影响被包装的调用。
pub struct WriterSink<W> {
    writer: Mutex<W>,
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl<W: Write + Send> CallLogSink for WriterSink<W> {
    fn record(&self, _: LogLevel, call: &CallRecord<'_>) {
        let mut writer = self.writer.lock();
        if let Err(err) = writeln!(writer, "{}", call.line()) {
            tracing::warn!(
                target: "svc_proxy::calls",
                error = %err,
                function = call.function,
                "failed to write call log line"
            );
        }
    }
}

/// 在内存中保留渲染后的日志行，供诊断与测试读取。
#[derive(Clone, Debug, Default)]
pub struct RecordingSink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.lines.lock())
    }
}

impl CallLogSink for RecordingSink {
    fn record(&self, _: LogLevel, call: &CallRecord<'_>) {
        self.lines.lock().push(call.line());
    }
}

/// 在被选中的函数调用前输出一条 `name arg1 arg2 ...` 日志，然后委托给原函数。
///
/// # 教案式说明
/// - **结构（How）**：`intercept` 只构造包装闭包，真正的日志副作用发生在包装函数被调用时；
///   原函数通过 Accessor 取回，包装闭包持有其句柄。
/// - **契约（What）**：原函数的返回值与错误原样返回；未被选中的函数返回 `Absent`。
#[derive(Clone)]
pub struct LoggingHook {
    config: Arc<LoggingHookConfig>,
    sink: Arc<dyn CallLogSink>,
}

impl LoggingHook {
    pub fn new(config: LoggingHookConfig) -> Self {
        Self::with_sink(config, Arc::new(TracingSink))
    }

    pub fn with_sink(config: LoggingHookConfig, sink: Arc<dyn CallLogSink>) -> Self {
        Self {
            config: Arc::new(config),
            sink,
        }
    }

    pub fn config(&self) -> &LoggingHookConfig {
        &self.config
    }
}

impl Default for LoggingHook {
    fn default() -> Self {
        Self::new(LoggingHookConfig::default())
    }
}

impl Hook for LoggingHook {
    fn intercept(
        &self,
        name: &str,
        accessor: &Accessor<'_>,
    ) -> Result<Interception, ServiceError> {
        if !self.config.functions.matches(name) {
            return Ok(Interception::Absent);
        }
        let original = accessor.function(name)?;
        let config = Arc::clone(&self.config);
        let sink = Arc::clone(&self.sink);
        let service = accessor.service().to_owned();
        let function = name.to_owned();
        Ok(Interception::replace(ServiceFn::new(move |args| {
            sink.record(
                config.level,
                &CallRecord {
                    label: &config.label,
                    service: &service,
                    function: &function,
                    args,
                },
            );
            original.call(args)
        })))
    }

    fn describe(&self) -> HookDescriptor {
        HookDescriptor::new(
            "svc_proxy.middleware.logging",
            "observability",
            "在服务函数调用前输出调用日志",
        )
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn line_matches_print_style() {
        let args = [json!(1), json!([1, 1, 2, 3, 5]), json!("text")];
        let record = CallRecord {
            label: "logging",
            service: "MyService",
            function: "mixed",
            args: &args,
        };
        assert_eq!(record.line(), "mixed 1 [1,1,2,3,5] text");
    }

    #[test]
    fn writer_sink_appends_lines() {
        let sink = WriterSink::new(Vec::new());
        let args = [json!(1), json!(2)];
        sink.record(
            LogLevel::Info,
            &CallRecord {
                label: "logging",
                service: "MyService",
                function: "add",
                args: &args,
            },
        );
        assert_eq!(sink.into_inner(), b"add 1 2\n");
    }
}
