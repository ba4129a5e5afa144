//! 服务函数：以 `serde_json::Value` 作为统一参数/返回载体的可调用对象。
//!
//! # 教案式概览
//! - **意图（Why）**：服务定义需要在运行时按名称持有签名各异的函数，并允许 Hook 返回“同签名”的包装；
//!   将参数与返回值统一为 [`Value`] 后，包装函数只需转发切片即可，不必关心具体类型。
//! - **结构（How）**：[`ServiceFn`] 内部是 `Arc<dyn Fn>`，克隆廉价；[`arg`]、[`expect_arity`] 与
//!   [`into_value`] 负责类型化函数与动态载体之间的转换，`#[service]` 宏生成的代码直接调用它们。
//! - **契约（What）**：克隆后的 `ServiceFn` 与原值指向同一闭包，[`ServiceFn::ptr_eq`] 据此判定同一性。

use std::{fmt, sync::Arc};

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::error::ServiceError;

type Callable = dyn Fn(&[Value]) -> Result<Value, ServiceError> + Send + Sync;

/// 可共享的服务函数句柄。
#[derive(Clone)]
pub struct ServiceFn {
    inner: Arc<Callable>,
}

impl ServiceFn {
    /// 以闭包构造服务函数。
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, ServiceError> + Send + Sync + 'static,
    {
        Self { inner: Arc::new(f) }
    }

    /// 以给定参数调用函数；错误原样返回。
    pub fn call(&self, args: &[Value]) -> Result<Value, ServiceError> {
        (self.inner)(args)
    }

    /// 判断两个句柄是否指向同一个函数对象。
    ///
    /// 仅比较数据指针，忽略 vtable，避免跨 codegen unit 的假阴性。
    pub fn ptr_eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.inner), Arc::as_ptr(&other.inner))
    }
}

impl fmt::Debug for ServiceFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceFn")
            .field("addr", &Arc::as_ptr(&self.inner).cast::<()>())
            .finish()
    }
}

/// 校验参数个数。
pub fn expect_arity(function: &str, args: &[Value], expected: usize) -> Result<(), ServiceError> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(ServiceError::Arity {
            function: function.to_owned(),
            expected,
            actual: args.len(),
        })
    }
}

/// 将第 `index` 个参数解码为 `T`。
///
/// # 契约说明（What）
/// - **前置条件**：调用方已通过 [`expect_arity`] 确认参数个数，越界时仍会返回
///   [`ServiceError::Arity`] 而不是 panic；
/// - **返回值**：解码失败时返回 [`ServiceError::InvalidArgument`]，`detail` 为 serde 给出的原因。
pub fn arg<T>(function: &str, args: &[Value], index: usize) -> Result<T, ServiceError>
where
    T: DeserializeOwned,
{
    let value = args.get(index).ok_or_else(|| ServiceError::Arity {
        function: function.to_owned(),
        expected: index + 1,
        actual: args.len(),
    })?;
    T::deserialize(value).map_err(|err| ServiceError::InvalidArgument {
        function: function.to_owned(),
        index,
        detail: err.to_string(),
    })
}

/// 将函数返回值编码为 [`Value`]。
pub fn into_value<T>(function: &str, value: T) -> Result<Value, ServiceError>
where
    T: Serialize,
{
    serde_json::to_value(value).map_err(|err| ServiceError::InvalidReturn {
        function: function.to_owned(),
        detail: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn clones_share_identity() {
        let f = ServiceFn::new(|_| Ok(json!(1)));
        let g = f.clone();
        let h = ServiceFn::new(|_| Ok(json!(1)));
        assert!(f.ptr_eq(&g));
        assert!(!f.ptr_eq(&h));
    }

    #[test]
    fn arg_reports_index_and_function() {
        let args = [json!(1), json!("two")];
        let first: i64 = arg("add", &args, 0).expect("first argument decodes");
        assert_eq!(first, 1);

        let err = arg::<i64>("add", &args, 1).expect_err("string is not an integer");
        match err {
            ServiceError::InvalidArgument {
                function, index, ..
            } => {
                assert_eq!(function, "add");
                assert_eq!(index, 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn missing_argument_is_an_arity_error() {
        let err = arg::<i64>("add", &[json!(1)], 1).expect_err("index out of range");
        assert_eq!(
            err,
            ServiceError::Arity {
                function: "add".into(),
                expected: 2,
                actual: 1,
            }
        );
        assert!(expect_arity("add", &[json!(1), json!(2)], 2).is_ok());
    }
}
