//! # error 模块说明
//!
//! ## 角色定位（Why）
//! - 集中定义访问拦截链路上的全部错误：实例化、属性缺失、Accessor 缺失、调用失败与定义期校验；
//! - 每个变体都暴露稳定错误码，供日志与指标按 `code()` 聚合。
//!
//! ## 传播策略（What）
//! - 拦截器与 Accessor 只负责“原样上抛”：Hook 或函数返回的 [`ServiceError`] 不会被重新包装；
//! - 定义期错误 [`DefinitionError`] 与运行期错误分离，`build()` 阶段即可暴露命名冲突。

use std::borrow::Cow;

use thiserror::Error;

use crate::attribute::AttributeKind;

/// 稳定错误码常量。
pub mod codes {
    pub const INSTANTIATION: &str = "service.instantiation";
    pub const ATTRIBUTE_NOT_FOUND: &str = "service.attribute_not_found";
    pub const ACCESSOR_LOOKUP: &str = "service.accessor_lookup";
    pub const NOT_CALLABLE: &str = "service.not_callable";
    pub const ARITY: &str = "service.call.arity";
    pub const INVALID_ARGUMENT: &str = "service.call.invalid_argument";
    pub const INVALID_RETURN: &str = "service.call.invalid_return";
}

/// 服务访问与调用期间的错误域。
///
/// # 教案式说明
/// - **意图 (Why)**：服务定义是“只读命名空间”，所有失败都发生在属性读取或函数调用时，
///   用一个枚举即可覆盖，调用方可通过 `match` 精确区分。
/// - **契约 (What)**：
///   - 所有变体均为 `Clone + Send + Sync + 'static`，允许 Hook 在包装函数中复制并再次返回；
///   - [`ServiceError::Failure`] 为业务函数与 Hook 预留，`code` 由调用方自行约定；
///   - 拦截器从不把一种错误转换为另一种错误。
/// - **设计权衡 (Trade-offs)**：上下文使用 `String` 保存，换取可读的诊断信息。
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ServiceError {
    /// 试图实例化服务定义。
    #[error("service `{service}` cannot be instantiated")]
    Instantiation { service: String },

    /// 普通属性解析（未经 Hook 替换）未命中。
    #[error("service `{service}` has no attribute `{name}`")]
    AttributeNotFound { service: String, name: String },

    /// Hook 通过 Accessor 读取了不存在的原始属性。
    #[error("accessor of service `{service}` has no original attribute `{name}`")]
    AccessorLookup { service: String, name: String },

    /// 属性存在但不是可调用函数。
    #[error("attribute `{name}` of service `{service}` is a {kind}, not a function")]
    NotCallable {
        service: String,
        name: String,
        kind: AttributeKind,
    },

    #[error("function `{function}` expects {expected} argument(s), got {actual}")]
    Arity {
        function: String,
        expected: usize,
        actual: usize,
    },

    #[error("function `{function}` received an invalid argument #{index}: {detail}")]
    InvalidArgument {
        function: String,
        index: usize,
        detail: String,
    },

    #[error("function `{function}` produced a value that cannot be encoded: {detail}")]
    InvalidReturn { function: String, detail: String },

    /// 业务函数或 Hook 主动报告的失败。
    #[error("[{code}] {message}")]
    Failure {
        code: Cow<'static, str>,
        message: String,
    },
}

impl ServiceError {
    /// 构造业务失败，`code` 建议遵循 `<领域>.<语义>` 命名。
    pub fn failure(code: impl Into<Cow<'static, str>>, message: impl Into<String>) -> Self {
        ServiceError::Failure {
            code: code.into(),
            message: message.into(),
        }
    }

    /// 获取稳定错误码。
    pub fn code(&self) -> &str {
        match self {
            ServiceError::Instantiation { .. } => codes::INSTANTIATION,
            ServiceError::AttributeNotFound { .. } => codes::ATTRIBUTE_NOT_FOUND,
            ServiceError::AccessorLookup { .. } => codes::ACCESSOR_LOOKUP,
            ServiceError::NotCallable { .. } => codes::NOT_CALLABLE,
            ServiceError::Arity { .. } => codes::ARITY,
            ServiceError::InvalidArgument { .. } => codes::INVALID_ARGUMENT,
            ServiceError::InvalidReturn { .. } => codes::INVALID_RETURN,
            ServiceError::Failure { code, .. } => code,
        }
    }
}

/// 构建服务定义时的校验错误。
///
/// - **意图 (Why)**：保留名（`proxy`、`__functions__`）与重复属性会破坏拦截协议的不变量，
///   必须在定义期拒绝，而不是在第一次访问时才暴露；
/// - **契约 (What)**：`service` 为正在构建的定义名称，`name` 为冲突的属性名。
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DefinitionError {
    #[error("attribute name `{name}` is reserved in service `{service}`")]
    ReservedName { service: String, name: String },

    #[error("attribute `{name}` is declared twice in service `{service}`")]
    DuplicateAttribute { service: String, name: String },

    #[error("data attribute `{name}` of service `{service}` cannot be encoded: {detail}")]
    InvalidData {
        service: String,
        name: String,
        detail: String,
    },
}
