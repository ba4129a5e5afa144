//! Hook 契约：服务定义上唯一的集中式拦截点。
//!
//! # 设计背景（Why）
//! - 日志、指标、调用统计等横切关注点需要统一作用于一组函数；与其给每个函数逐一加装饰，
//!   不如由一个 Hook 在属性被读取时集中决定是否替换。
//! - 借鉴 Tower `Layer` 与 Pipeline 中间件的描述符模式，Hook 同时暴露 [`HookDescriptor`]，
//!   便于在日志中标识是哪一个 Hook 做出了替换。
//!
//! # 契约说明（What）
//! - Hook 接收 `(name, accessor)`，返回 [`Interception::Absent`] 表示“不替换”，
//!   返回 [`Interception::Replace`] 表示以给定属性替代原值；替代值可以是任意种类。
//! - Hook 自身的错误会原样传播给属性读取方。
//! - Hook 存放在保留名 [`PROXY`] 下，永远不会被自己拦截。

use std::borrow::Cow;

use crate::{accessor::Accessor, attribute::Attribute, error::ServiceError};

/// Hook 在服务体中的保留属性名。
pub const PROXY: &str = "proxy";

/// Hook 的返回值。
#[derive(Clone, Debug)]
pub enum Interception {
    /// 不替换，继续普通属性解析。
    Absent,
    /// 以给定属性替换原值。
    Replace(Attribute),
}

impl Interception {
    pub fn replace(attribute: impl Into<Attribute>) -> Self {
        Interception::Replace(attribute.into())
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Interception::Absent)
    }
}

/// Hook 的元数据，辅助可观测性。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HookDescriptor {
    name: Cow<'static, str>,
    category: Cow<'static, str>,
    summary: Cow<'static, str>,
}

impl HookDescriptor {
    pub fn new(
        name: impl Into<Cow<'static, str>>,
        category: impl Into<Cow<'static, str>>,
        summary: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            summary: summary.into(),
        }
    }

    /// 构造匿名描述，常用于闭包 Hook 或测试。
    pub fn anonymous() -> Self {
        Self {
            name: Cow::Borrowed("anonymous"),
            category: Cow::Borrowed("unspecified"),
            summary: Cow::Borrowed("hook without descriptor"),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }
}

/// 拦截钩子。
///
/// # 教案式说明
/// - **意图（Why）**：把“读取哪个函数时替换成什么”的决策集中到一处。
/// - **契约（What）**：
///   - `intercept` 只会以合格函数名被调用，永远不会收到 [`PROXY`]；
///   - `accessor` 提供未经拦截的原始属性，Hook 可在包装函数中持有取回的 [`crate::ServiceFn`]；
///   - 返回 `Err` 时错误原样传给调用方，拦截器不重试、不吞掉、不包装。
/// - **风险提示（Trade-offs）**：Hook 每次属性读取都会执行，若在其中做重活会直接拖慢所有调用；
///   推荐只构造轻量包装，把副作用推迟到包装函数被调用时。
pub trait Hook: Send + Sync {
    fn intercept(&self, name: &str, accessor: &Accessor<'_>)
    -> Result<Interception, ServiceError>;

    fn describe(&self) -> HookDescriptor {
        HookDescriptor::anonymous()
    }
}

/// 将闭包适配为 [`Hook`]。
pub struct HookFn<F> {
    f: F,
    descriptor: HookDescriptor,
}

impl<F> HookFn<F>
where
    F: Fn(&str, &Accessor<'_>) -> Result<Interception, ServiceError> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self {
            f,
            descriptor: HookDescriptor::anonymous(),
        }
    }

    pub fn with_descriptor(mut self, descriptor: HookDescriptor) -> Self {
        self.descriptor = descriptor;
        self
    }
}

impl<F> Hook for HookFn<F>
where
    F: Fn(&str, &Accessor<'_>) -> Result<Interception, ServiceError> + Send + Sync,
{
    fn intercept(
        &self,
        name: &str,
        accessor: &Accessor<'_>,
    ) -> Result<Interception, ServiceError> {
        (self.f)(name, accessor)
    }

    fn describe(&self) -> HookDescriptor {
        self.descriptor.clone()
    }
}

/// 便捷构造：`hook_fn(|name, accessor| ...)`。
pub fn hook_fn<F>(f: F) -> HookFn<F>
where
    F: Fn(&str, &Accessor<'_>) -> Result<Interception, ServiceError> + Send + Sync,
{
    HookFn::new(f)
}

/// 根服务声明的默认 Hook：永不替换。
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopHook;

impl Hook for NoopHook {
    fn intercept(&self, _: &str, _: &Accessor<'_>) -> Result<Interception, ServiceError> {
        Ok(Interception::Absent)
    }

    fn describe(&self) -> HookDescriptor {
        HookDescriptor::new("svc_proxy.noop", "core", "default hook, never overrides")
    }
}
