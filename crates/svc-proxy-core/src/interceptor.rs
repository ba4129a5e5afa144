//! 访问拦截器：服务定义上所有属性读取的唯一入口。
//!
//! # 教案式说明
//! - **意图（Why）**：没有元类式的成员访问钩子时，用显式的 [`ServiceDefinition::get`] 承接
//!   “读取 `Service.attr`” 这一动作，保持原协议的全部契约。
//! - **流程（How）**：
//!   1. 解析最近声明的 Hook；
//!   2. 若 Hook 存在且 `name` 在当前分类模式下合格，以 `(name, accessor)` 调用 Hook；
//!   3. `Absent` 时回落到普通属性解析，`Replace` 时直接返回替代值；
//!   4. Hook 的错误以 `?` 原样传播。
//! - **契约（What）**：
//!   - `proxy` 自身永不合格，读取 `proxy` 总是拿到未经修改的 Hook；
//!   - Accessor 绕过拦截，Hook 在内部读取原值不会递归；
//!   - 拦截器不持有可变状态，并发读取互不影响，Hook 副作用的先后顺序不做保证。

use serde_json::Value;

use crate::{
    attribute::Attribute, definition::ServiceDefinition, error::ServiceError, function::ServiceFn,
    hook::Interception,
};

const TARGET: &str = "svc_proxy::interceptor";

impl ServiceDefinition {
    /// 读取属性，必要时交给 Hook 替换。
    pub fn get(&self, name: &str) -> Result<Attribute, ServiceError> {
        if let Some(hook) = self.resolve_hook()
            && self.is_eligible(name)
        {
            let accessor = self.accessor();
            match hook.intercept(name, &accessor)? {
                Interception::Replace(attribute) => {
                    let descriptor = hook.describe();
                    tracing::trace!(
                        target: TARGET,
                        service = %self.name(),
                        attribute = name,
                        hook = descriptor.name(),
                        kind = %attribute.kind(),
                        outcome = "replaced",
                    );
                    return Ok(attribute);
                }
                Interception::Absent => {
                    tracing::trace!(
                        target: TARGET,
                        service = %self.name(),
                        attribute = name,
                        outcome = "absent",
                    );
                }
            }
        }
        self.lookup(name)
    }

    /// 读取函数；非函数属性返回 [`ServiceError::NotCallable`]。
    pub fn function(&self, name: &str) -> Result<ServiceFn, ServiceError> {
        self.get(name)?.into_function(self.name(), name)
    }

    /// 经拦截读取并调用函数。
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value, ServiceError> {
        self.function(name)?.call(args)
    }
}
