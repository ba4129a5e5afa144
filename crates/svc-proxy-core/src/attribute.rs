//! 服务属性的封闭标签模型。
//!
//! # 教案式说明
//! - **意图（Why）**：静态语言无法在运行时对任意值询问“是不是普通函数”，因此属性种类在注册时就被
//!   固化为 [`Attribute`] 的变体，分类器只需匹配标签。
//! - **契约（What）**：
//!   - `Function`：可被拦截的普通函数；
//!   - `Data`：类变量等数据属性，永不拦截；
//!   - `Type`：嵌套的服务定义，永不拦截；
//!   - `Hook`：保留名 `proxy` 上的拦截钩子，永不拦截自身。

use std::{fmt, sync::Arc};

use serde_json::Value;

use crate::{definition::ServiceDefinition, error::ServiceError, function::ServiceFn, hook::Hook};

/// 属性值。克隆只复制 `Arc` 句柄。
#[derive(Clone)]
pub enum Attribute {
    Function(ServiceFn),
    Data(Value),
    Type(Arc<ServiceDefinition>),
    Hook(Arc<dyn Hook>),
}

/// 属性种类，与 [`Attribute`] 的变体一一对应。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    Function,
    Data,
    Type,
    Hook,
}

impl AttributeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AttributeKind::Function => "function",
            AttributeKind::Data => "data attribute",
            AttributeKind::Type => "nested type",
            AttributeKind::Hook => "hook",
        }
    }
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Attribute {
    pub fn kind(&self) -> AttributeKind {
        match self {
            Attribute::Function(_) => AttributeKind::Function,
            Attribute::Data(_) => AttributeKind::Data,
            Attribute::Type(_) => AttributeKind::Type,
            Attribute::Hook(_) => AttributeKind::Hook,
        }
    }

    pub fn as_function(&self) -> Option<&ServiceFn> {
        match self {
            Attribute::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_data(&self) -> Option<&Value> {
        match self {
            Attribute::Data(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_type(&self) -> Option<&Arc<ServiceDefinition>> {
        match self {
            Attribute::Type(definition) => Some(definition),
            _ => None,
        }
    }

    pub fn as_hook(&self) -> Option<&Arc<dyn Hook>> {
        match self {
            Attribute::Hook(hook) => Some(hook),
            _ => None,
        }
    }

    /// 取出函数句柄；非函数属性返回 [`ServiceError::NotCallable`]。
    ///
    /// `service` 与 `name` 仅用于填充错误上下文。
    pub fn into_function(self, service: &str, name: &str) -> Result<ServiceFn, ServiceError> {
        match self {
            Attribute::Function(f) => Ok(f),
            other => Err(ServiceError::NotCallable {
                service: service.to_owned(),
                name: name.to_owned(),
                kind: other.kind(),
            }),
        }
    }

    /// 判断两个属性是否为同一对象（函数、嵌套类型与 Hook 按指针比较，数据按值比较）。
    pub fn same_as(&self, other: &Attribute) -> bool {
        match (self, other) {
            (Attribute::Function(a), Attribute::Function(b)) => a.ptr_eq(b),
            (Attribute::Data(a), Attribute::Data(b)) => a == b,
            (Attribute::Type(a), Attribute::Type(b)) => Arc::ptr_eq(a, b),
            (Attribute::Hook(a), Attribute::Hook(b)) => {
                std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
            }
            _ => false,
        }
    }
}

impl From<ServiceFn> for Attribute {
    fn from(value: ServiceFn) -> Self {
        Attribute::Function(value)
    }
}

impl From<Value> for Attribute {
    fn from(value: Value) -> Self {
        Attribute::Data(value)
    }
}

impl From<Arc<ServiceDefinition>> for Attribute {
    fn from(value: Arc<ServiceDefinition>) -> Self {
        Attribute::Type(value)
    }
}

impl fmt::Debug for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attribute::Function(func) => f.debug_tuple("Function").field(func).finish(),
            Attribute::Data(value) => f.debug_tuple("Data").field(value).finish(),
            Attribute::Type(definition) => f.debug_tuple("Type").field(&definition.name()).finish(),
            Attribute::Hook(_) => f.write_str("Hook(..)"),
        }
    }
}
