//! 服务定义：只读的函数命名空间。
//!
//! # 设计背景（Why）
//! - 服务是一组函数的命名空间，而不是带状态的对象：它没有实例，只能通过定义本身读取属性；
//! - 属性集合、基类与分类模式在 [`ServiceDefinitionBuilder::build`] 时固化，之后不可变，
//!   多线程并发读取无需同步。
//!
//! # 结构（How）
//! - `body` 保存自身声明的属性，`base` 指向被继承的定义，解析顺序为“自身 → 基类 → 基类的基类”；
//! - 默认基类是 [`ServiceDefinition::root`]：名为 `Service`，只声明一个永不替换的 Hook；
//! - 急切分类模式会在构建时计算合格函数集合，并以 `__functions__` 数据属性暴露，供诊断使用。

use std::{
    collections::{BTreeMap, BTreeSet},
    convert::Infallible,
    fmt,
    sync::{Arc, OnceLock},
};

use serde::Serialize;
use serde_json::Value;

use crate::{
    accessor::Accessor,
    attribute::Attribute,
    classifier::{self, Classification, FUNCTIONS_ATTRIBUTE},
    error::{DefinitionError, ServiceError},
    function::ServiceFn,
    hook::{Hook, NoopHook, PROXY},
};

/// 根服务的名称。
pub const ROOT_SERVICE: &str = "Service";

/// 不可变的服务定义。
pub struct ServiceDefinition {
    name: String,
    base: Option<Arc<ServiceDefinition>>,
    body: BTreeMap<String, Attribute>,
    classification: Classification,
    eligible: Option<BTreeSet<String>>,
}

impl ServiceDefinition {
    /// 所有服务的默认基类。
    pub fn root() -> Arc<ServiceDefinition> {
        static ROOT: OnceLock<Arc<ServiceDefinition>> = OnceLock::new();
        Arc::clone(ROOT.get_or_init(|| {
            let mut body = BTreeMap::new();
            body.insert(PROXY.to_owned(), Attribute::Hook(Arc::new(NoopHook)));
            Arc::new(ServiceDefinition {
                name: ROOT_SERVICE.to_owned(),
                base: None,
                body,
                classification: Classification::Lazy,
                eligible: None,
            })
        }))
    }

    /// 以根服务为基类开始声明新的服务。
    pub fn builder(name: impl Into<String>) -> ServiceDefinitionBuilder {
        ServiceDefinitionBuilder::new(name.into())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base(&self) -> Option<&Arc<ServiceDefinition>> {
        self.base.as_ref()
    }

    pub fn classification(&self) -> Classification {
        self.classification
    }

    /// 自身声明的属性体（不含继承）。
    pub fn body(&self) -> &BTreeMap<String, Attribute> {
        &self.body
    }

    /// 解析顺序：自身在前，根在后。
    pub fn resolution_order(&self) -> impl Iterator<Item = &ServiceDefinition> + '_ {
        std::iter::successors(Some(self), |definition| definition.base.as_deref())
    }

    /// 是否在解析顺序中出现了给定定义（含自身）。
    pub fn is_subclass_of(&self, other: &ServiceDefinition) -> bool {
        self.resolution_order()
            .any(|definition| std::ptr::eq(definition, other))
    }

    /// 只在自身属性体中查找。
    pub fn own(&self, name: &str) -> Option<&Attribute> {
        self.body.get(name)
    }

    /// 沿解析顺序查找，不经过拦截。
    ///
    /// `__functions__` 描述的是单个定义的分类结果，不沿继承链解析。
    pub fn find(&self, name: &str) -> Option<&Attribute> {
        if name == FUNCTIONS_ATTRIBUTE {
            return self.own(name);
        }
        self.resolution_order()
            .find_map(|definition| definition.body.get(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// 普通属性解析：与拦截无关的真实查找。
    pub fn lookup(&self, name: &str) -> Result<Attribute, ServiceError> {
        self.find(name)
            .cloned()
            .ok_or_else(|| ServiceError::AttributeNotFound {
                service: self.name.clone(),
                name: name.to_owned(),
            })
    }

    /// 沿解析顺序可见的全部属性名。
    pub fn attribute_names(&self) -> BTreeSet<&str> {
        self.resolution_order()
            .enumerate()
            .flat_map(|(depth, definition)| {
                definition
                    .body
                    .keys()
                    .map(String::as_str)
                    .filter(move |name| depth == 0 || *name != FUNCTIONS_ATTRIBUTE)
            })
            .collect()
    }

    /// 最近声明的 Hook。
    pub fn resolve_hook(&self) -> Option<&Arc<dyn Hook>> {
        self.find(PROXY).and_then(Attribute::as_hook)
    }

    /// 急切模式下预先计算的合格函数名；`Lazy` 模式返回 `None`。
    pub fn eligible_functions(&self) -> Option<&BTreeSet<String>> {
        self.eligible.as_ref()
    }

    /// 当前分类模式下 `name` 是否会交给 Hook。
    pub fn is_eligible(&self, name: &str) -> bool {
        if name == PROXY {
            return false;
        }
        match &self.eligible {
            Some(eligible) => eligible.contains(name),
            None => self
                .find(name)
                .is_some_and(|attribute| classifier::classify(name, attribute)),
        }
    }

    /// 当前分类模式对应的 Accessor。
    pub fn accessor(&self) -> Accessor<'_> {
        Accessor::new(self, self.classification.accessor_scope())
    }

    /// 服务定义不可实例化：无论参数如何都返回 [`ServiceError::Instantiation`]。
    ///
    /// 返回类型中的 [`Infallible`] 保证调用方永远拿不到实例。
    pub fn instantiate(&self, _args: &[Value]) -> Result<Infallible, ServiceError> {
        Err(ServiceError::Instantiation {
            service: self.name.clone(),
        })
    }
}

impl fmt::Debug for ServiceDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceDefinition")
            .field("name", &self.name)
            .field("base", &self.base.as_ref().map(|base| base.name()))
            .field("classification", &self.classification)
            .field("body", &self.body)
            .finish()
    }
}

impl fmt::Display for ServiceDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let functions = self
            .body
            .iter()
            .filter(|(name, attribute)| classifier::classify(name, attribute))
            .map(|(name, _)| name.as_str())
            .collect::<Vec<_>>();
        write!(f, "{}({})", self.name, functions.join(", "))
    }
}

/// 服务定义的声明入口。
///
/// # 教案式说明
/// - **意图（Why）**：对应“在类体中声明函数、类变量、嵌套类型与 `proxy`”的过程；
/// - **契约（What）**：
///   - 同一属性体中名字唯一，重复声明在 `build()` 时报 [`DefinitionError::DuplicateAttribute`]；
///   - `proxy` 只能通过 [`hook`](Self::hook) 声明，`__functions__` 由构建过程自动生成，二者都不可手工占用；
///   - 第一个声明错误会被保留并在 `build()` 时返回，后续链式调用不会覆盖它。
/// - **风险提示（Trade-offs）**：[`standalone`](Self::standalone) 会切断与根服务的继承关系，
///   得到一个没有任何 Hook 的纯透传定义。
#[must_use]
pub struct ServiceDefinitionBuilder {
    name: String,
    base: Option<Arc<ServiceDefinition>>,
    body: BTreeMap<String, Attribute>,
    classification: Classification,
    error: Option<DefinitionError>,
}

impl ServiceDefinitionBuilder {
    fn new(name: String) -> Self {
        Self {
            name,
            base: Some(ServiceDefinition::root()),
            body: BTreeMap::new(),
            classification: Classification::default(),
            error: None,
        }
    }

    /// 继承给定定义。
    pub fn extends(mut self, base: Arc<ServiceDefinition>) -> Self {
        self.base = Some(base);
        self
    }

    /// 不继承任何定义（包括根服务）。
    pub fn standalone(mut self) -> Self {
        self.base = None;
        self
    }

    pub fn classification(mut self, classification: Classification) -> Self {
        self.classification = classification;
        self
    }

    pub fn function(self, name: impl Into<String>, function: ServiceFn) -> Self {
        self.insert(name.into(), Attribute::Function(function))
    }

    /// 以闭包声明函数。
    pub fn function_with<F>(self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, ServiceError> + Send + Sync + 'static,
    {
        self.function(name, ServiceFn::new(f))
    }

    pub fn data(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name.into(), Attribute::Data(value.into()))
    }

    /// 以任意可序列化值声明数据属性；编码失败记为 [`DefinitionError::InvalidData`]。
    pub fn data_serialize<T>(mut self, name: impl Into<String>, value: &T) -> Self
    where
        T: Serialize + ?Sized,
    {
        let name = name.into();
        match serde_json::to_value(value) {
            Ok(value) => self.insert(name, Attribute::Data(value)),
            Err(err) => {
                let service = self.name.clone();
                self.record(DefinitionError::InvalidData {
                    service,
                    name,
                    detail: err.to_string(),
                });
                self
            }
        }
    }

    pub fn nested(self, name: impl Into<String>, definition: Arc<ServiceDefinition>) -> Self {
        self.insert(name.into(), Attribute::Type(definition))
    }

    /// 声明本服务的 Hook，覆盖继承来的 Hook。
    pub fn hook<H>(self, hook: H) -> Self
    where
        H: Hook + 'static,
    {
        self.shared_hook(Arc::new(hook))
    }

    pub fn shared_hook(mut self, hook: Arc<dyn Hook>) -> Self {
        if self.body.contains_key(PROXY) {
            let service = self.name.clone();
            self.record(DefinitionError::DuplicateAttribute {
                service,
                name: PROXY.to_owned(),
            });
            return self;
        }
        self.body.insert(PROXY.to_owned(), Attribute::Hook(hook));
        self
    }

    fn insert(mut self, name: String, attribute: Attribute) -> Self {
        if name == PROXY || name == FUNCTIONS_ATTRIBUTE {
            let service = self.name.clone();
            self.record(DefinitionError::ReservedName { service, name });
            return self;
        }
        if self.body.contains_key(&name) {
            let service = self.name.clone();
            self.record(DefinitionError::DuplicateAttribute { service, name });
            return self;
        }
        self.body.insert(name, attribute);
        self
    }

    fn record(&mut self, error: DefinitionError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    /// 固化定义；急切模式在此计算合格函数集合。
    pub fn build(self) -> Result<Arc<ServiceDefinition>, DefinitionError> {
        if let Some(error) = self.error {
            return Err(error);
        }

        let mut definition = ServiceDefinition {
            name: self.name,
            base: self.base,
            body: self.body,
            classification: self.classification,
            eligible: None,
        };

        let eligible = match definition.classification {
            Classification::Lazy => None,
            Classification::Resolved => Some(classifier::eligible_resolved(&definition)),
            Classification::BodyOnly => Some(classifier::eligible_in_body(&definition.body)),
        };
        if let Some(eligible) = eligible {
            definition.body.insert(
                FUNCTIONS_ATTRIBUTE.to_owned(),
                Attribute::Data(Value::from(eligible.iter().cloned().collect::<Vec<_>>())),
            );
            definition.eligible = Some(eligible);
        }

        tracing::debug!(
            target: "svc_proxy::definition",
            service = %definition.name,
            base = definition.base.as_ref().map(|base| base.name()),
            classification = ?definition.classification,
            attributes = definition.body.len(),
            "service definition built"
        );

        Ok(Arc::new(definition))
    }
}
