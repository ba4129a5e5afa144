use std::{
    borrow::Cow,
    collections::BTreeMap,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::{Duration, Instant},
};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use svc_proxy_core::{Accessor, Hook, HookDescriptor, Interception, ServiceError, ServiceFn};

use crate::selector::FunctionSelector;

/// 调用统计 Hook 的配置。
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UsageStatsConfig {
    pub label: Cow<'static, str>,
    pub functions: FunctionSelector,
}

impl Default for UsageStatsConfig {
    fn default() -> Self {
        Self {
            label: Cow::Borrowed("usage"),
            functions: FunctionSelector::all(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct FunctionKey {
    service: String,
    function: String,
}

#[derive(Debug, Default)]
struct FunctionCounters {
    calls: AtomicU64,
    errors: AtomicU64,
    total_nanos: AtomicU64,
    max_nanos: AtomicU64,
}

/// 单个函数的统计快照。
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionUsage {
    pub calls: u64,
    pub errors: u64,
    pub total_micros: u64,
    pub max_micros: u64,
}

/// 全部函数的统计快照：`service -> function -> usage`。
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageSnapshot {
    pub label: String,
    pub services: BTreeMap<String, BTreeMap<String, FunctionUsage>>,
}

impl UsageSnapshot {
    pub fn function(&self, service: &str, function: &str) -> Option<&FunctionUsage> {
        self.services.get(service)?.get(function)
    }

    pub fn total_calls(&self) -> u64 {
        self.services
            .values()
            .flat_map(BTreeMap::values)
            .map(|usage| usage.calls)
            .sum()
    }
}

/// 并发安全的调用计数器集合。
///
/// # 教案式说明
/// - **意图（Why）**：同一个 Hook 可以挂到多个服务、被多个线程同时调用，计数必须无锁或细粒度加锁；
/// - **结构（How）**：`DashMap` 按 `(service, function)` 分片存放原子计数器，
///   读取快照时逐项 `load`，不阻塞正在进行的调用；
/// - **风险提示（Trade-offs）**：快照不是全局一致的时间点视图，同一函数的 `calls` 与 `errors`
///   可能相差正在进行中的那一次调用。
#[derive(Debug, Default)]
pub struct UsageStats {
    counters: DashMap<FunctionKey, Arc<FunctionCounters>>,
}

impl UsageStats {
    pub fn new() -> Self {
        Self::default()
    }

    fn counters(&self, service: &str, function: &str) -> Arc<FunctionCounters> {
        let key = FunctionKey {
            service: service.to_owned(),
            function: function.to_owned(),
        };
        Arc::clone(self.counters.entry(key).or_default().value())
    }

    /// 记录一次调用。
    pub fn record(&self, service: &str, function: &str, elapsed: Duration, failed: bool) {
        let counters = self.counters(service, function);
        let nanos = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
        counters.calls.fetch_add(1, Ordering::Relaxed);
        if failed {
            counters.errors.fetch_add(1, Ordering::Relaxed);
        }
        counters.total_nanos.fetch_add(nanos, Ordering::Relaxed);
        counters.max_nanos.fetch_max(nanos, Ordering::Relaxed);
    }

    pub fn snapshot(&self, label: &str) -> UsageSnapshot {
        let mut services: BTreeMap<String, BTreeMap<String, FunctionUsage>> = BTreeMap::new();
        for entry in self.counters.iter() {
            let counters = entry.value();
            services
                .entry(entry.key().service.clone())
                .or_default()
                .insert(
                    entry.key().function.clone(),
                    FunctionUsage {
                        calls: counters.calls.load(Ordering::Relaxed),
                        errors: counters.errors.load(Ordering::Relaxed),
                        total_micros: counters.total_nanos.load(Ordering::Relaxed) / 1_000,
                        max_micros: counters.max_nanos.load(Ordering::Relaxed) / 1_000,
                    },
                );
        }
        UsageSnapshot {
            label: label.to_owned(),
            services,
        }
    }

    pub fn reset(&self) {
        self.counters.clear();
    }
}

/// 统计被选中函数的调用次数、失败次数与耗时。
#[derive(Clone)]
pub struct UsageStatsHook {
    config: Arc<UsageStatsConfig>,
    stats: Arc<UsageStats>,
}

impl UsageStatsHook {
    pub fn new(config: UsageStatsConfig) -> Self {
        Self {
            config: Arc::new(config),
            stats: Arc::new(UsageStats::new()),
        }
    }

    pub fn stats(&self) -> &Arc<UsageStats> {
        &self.stats
    }

    pub fn snapshot(&self) -> UsageSnapshot {
        self.stats.snapshot(&self.config.label)
    }
}

impl Default for UsageStatsHook {
    fn default() -> Self {
        Self::new(UsageStatsConfig::default())
    }
}

impl Hook for UsageStatsHook {
    fn intercept(
        &self,
        name: &str,
        accessor: &Accessor<'_>,
    ) -> Result<Interception, ServiceError> {
        if !self.config.functions.matches(name) {
            return Ok(Interception::Absent);
        }
        let original = accessor.function(name)?;
        let stats = Arc::clone(&self.stats);
        let service = accessor.service().to_owned();
        let function = name.to_owned();
        Ok(Interception::replace(ServiceFn::new(move |args| {
            let started = Instant::now();
            let result = original.call(args);
            stats.record(&service, &function, started.elapsed(), result.is_err());
            result
        })))
    }

    fn describe(&self) -> HookDescriptor {
        HookDescriptor::new(
            "svc_proxy.middleware.usage",
            "observability",
            "统计服务函数的调用次数、失败次数与耗时",
        )
    }
}
