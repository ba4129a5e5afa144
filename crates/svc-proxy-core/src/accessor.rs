//! Accessor：交给 Hook 的“读取原始属性”能力。
//!
//! # 教案式说明
//! - **意图（Why）**：Hook 需要拿到被包装函数的原值；若它通过普通读取拿值，会再次进入拦截器，
//!   因而 Accessor 按构造即绕过拦截。
//! - **结构（How）**：持有对服务定义的借用与 [`AccessorScope`]：
//!   - `Resolved`：沿完整继承链做真实查找，是默认且推荐的语义；
//!   - `OwnBody`：只看最派生定义自身的属性体，仅供 `Classification::BodyOnly` 复现早期行为，
//!     对仅在基类中定义的函数会返回查找失败。
//! - **契约（What）**：查找失败返回 [`ServiceError::AccessorLookup`]；取回的属性是独立句柄，
//!   可被包装函数长期持有。

use crate::{
    attribute::Attribute, definition::ServiceDefinition, error::ServiceError, function::ServiceFn,
};

/// Accessor 的可见范围。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AccessorScope {
    Resolved,
    OwnBody,
}

/// 未经拦截的属性读取器。
#[derive(Clone, Copy, Debug)]
pub struct Accessor<'a> {
    definition: &'a ServiceDefinition,
    scope: AccessorScope,
}

impl<'a> Accessor<'a> {
    pub(crate) fn new(definition: &'a ServiceDefinition, scope: AccessorScope) -> Self {
        Self { definition, scope }
    }

    pub fn scope(&self) -> AccessorScope {
        self.scope
    }

    /// 被访问的服务定义（最派生的那一个）。
    pub fn definition(&self) -> &'a ServiceDefinition {
        self.definition
    }

    pub fn service(&self) -> &'a str {
        self.definition.name()
    }

    fn find(&self, name: &str) -> Option<&'a Attribute> {
        match self.scope {
            AccessorScope::Resolved => self.definition.find(name),
            AccessorScope::OwnBody => self.definition.own(name),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// 读取原始属性。
    pub fn get(&self, name: &str) -> Result<Attribute, ServiceError> {
        self.find(name)
            .cloned()
            .ok_or_else(|| ServiceError::AccessorLookup {
                service: self.definition.name().to_owned(),
                name: name.to_owned(),
            })
    }

    /// 读取原始函数；属性存在但不可调用时返回 [`ServiceError::NotCallable`]。
    pub fn function(&self, name: &str) -> Result<ServiceFn, ServiceError> {
        self.get(name)?.into_function(self.definition.name(), name)
    }
}
