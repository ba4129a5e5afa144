//! svc-proxy-core: 服务命名空间的函数访问拦截契约。
//!
//! # 教案式概览
//! - **意图（Why）**：让一个“服务”在自身函数被读取时，由唯一的 Hook 集中决定是否以包装替换，
//!   从而把日志、指标、调用统计等横切关注点统一施加到一组函数上，而不改动函数定义本身。
//! - **结构（How）**：
//!   - [`definition`]：不可变的服务定义与其 Builder，服务不可实例化；
//!   - [`attribute`] / [`function`]：封闭的属性标签模型与以 `serde_json::Value` 为载体的函数句柄；
//!   - [`classifier`]：判定哪些属性是可拦截的普通函数（惰性或急切）；
//!   - [`hook`] / [`accessor`]：Hook 契约与绕过拦截的原值读取器；
//!   - [`interceptor`]：所有属性读取的唯一入口 [`ServiceDefinition::get`]。
//! - **契约（What）**：Hook 返回 `Absent` 时读取结果与原值同一；返回替代值时以替代值为准；
//!   Hook 与 Accessor 的错误原样传播；`proxy` 永不拦截自身。
//! - **风险提示（Trade-offs）**：显式的 `get`/`call` 取代了隐式成员访问，调用方必须经由服务定义
//!   读取函数，直接调用底层 Rust 函数不会经过 Hook。

extern crate self as svc_proxy_core;

pub mod accessor;
pub mod attribute;
pub mod classifier;
pub mod definition;
pub mod error;
pub mod function;
pub mod hook;
pub mod interceptor;

pub use accessor::{Accessor, AccessorScope};
pub use attribute::{Attribute, AttributeKind};
pub use classifier::{Classification, FUNCTIONS_ATTRIBUTE};
pub use definition::{ROOT_SERVICE, ServiceDefinition, ServiceDefinitionBuilder};
pub use error::{DefinitionError, ServiceError};
pub use function::ServiceFn;
pub use hook::{Hook, HookDescriptor, HookFn, Interception, NoopHook, PROXY, hook_fn};
pub use serde_json::Value;

#[cfg(feature = "macros")]
pub use svc_proxy_macros::service;

/// 宏展开使用的内部路径，不属于稳定 API。
#[doc(hidden)]
pub mod __private {
    pub use std::sync::{Arc, OnceLock};

    pub use crate::function::{arg, expect_arity, into_value};
}
