use std::sync::Arc;

use serde::{Deserialize, Serialize};
use svc_proxy_core::Hook;
use thiserror::Error;

use crate::{
    logging::{LoggingHook, LoggingHookConfig},
    metrics::{UsageStatsConfig, UsageStatsHook},
};

/// 配置解析失败。
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid hook configuration: {0}")]
    Toml(#[from] toml::de::Error),
}

/// 以 `kind` 字段区分的 Hook 声明。
///
/// ```toml
/// kind = "logging"
/// label = "audit"
/// level = "debug"
///
/// [functions]
/// except = ["constant"]
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HookConfig {
    Logging(LoggingHookConfig),
    Usage(UsageStatsConfig),
}

impl HookConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// 按配置实例化 Hook。日志 Hook 使用默认的 [`TracingSink`](crate::TracingSink)。
    pub fn build(&self) -> ConfiguredHook {
        match self {
            Self::Logging(config) => ConfiguredHook::Logging(LoggingHook::new(config.clone())),
            Self::Usage(config) => ConfiguredHook::Usage(UsageStatsHook::new(config.clone())),
        }
    }
}

/// 由 [`HookConfig::build`] 得到的具体 Hook，保留具体类型以便读取统计快照。
#[derive(Clone)]
pub enum ConfiguredHook {
    Logging(LoggingHook),
    Usage(UsageStatsHook),
}

impl ConfiguredHook {
    pub fn into_shared(self) -> Arc<dyn Hook> {
        match self {
            Self::Logging(hook) => Arc::new(hook),
            Self::Usage(hook) => Arc::new(hook),
        }
    }

    pub fn usage_stats(&self) -> Option<&UsageStatsHook> {
        match self {
            Self::Usage(hook) => Some(hook),
            Self::Logging(_) => None,
        }
    }
}
