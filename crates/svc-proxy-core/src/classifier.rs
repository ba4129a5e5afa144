//! 函数分类器：判定某个属性名是否为可拦截的普通函数。
//!
//! # 教案式概览
//! - **惰性（`Lazy`）**：每次访问都沿继承链做真实查找后按标签判定，天然覆盖继承函数；
//! - **解析期缓存（`Resolved`）**：在 `build()` 时对完整解析顺序计算一次合格集合，
//!   由于定义不可变，行为与 `Lazy` 完全一致，只是把成本前移；
//! - **仅自身属性体（`BodyOnly`）**：只统计最派生定义自身声明的函数，Accessor 也只看自身属性体。
//!   仅在基类中声明的函数不会被拦截，这是为了对照研究而保留的模式，不应在新代码中使用。

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{
    accessor::AccessorScope,
    attribute::{Attribute, AttributeKind},
    definition::ServiceDefinition,
    hook::PROXY,
};

/// 合格函数集合在服务体中的诊断属性名（仅急切模式存在）。
pub const FUNCTIONS_ATTRIBUTE: &str = "__functions__";

/// 分类策略。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    #[default]
    Lazy,
    Resolved,
    BodyOnly,
}

impl Classification {
    /// 对应模式下交给 Hook 的 Accessor 范围。
    pub fn accessor_scope(self) -> AccessorScope {
        match self {
            Classification::Lazy | Classification::Resolved => AccessorScope::Resolved,
            Classification::BodyOnly => AccessorScope::OwnBody,
        }
    }

    /// 是否在定义期预先计算合格集合。
    pub fn is_eager(self) -> bool {
        !matches!(self, Classification::Lazy)
    }
}

/// 单个属性是否合格：必须是普通函数，且名字不是 Hook 的保留名。
pub fn classify(name: &str, attribute: &Attribute) -> bool {
    name != PROXY && attribute.kind() == AttributeKind::Function
}

/// 仅统计给定属性体中的合格函数名，不沿继承链。
pub fn eligible_in_body<'a, I>(body: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = (&'a String, &'a Attribute)>,
{
    body.into_iter()
        .filter(|(name, attribute)| classify(name, attribute))
        .map(|(name, _)| name.clone())
        .collect()
}

/// 沿完整解析顺序统计合格函数名，同名属性以最近的定义为准。
///
/// 派生类用数据属性遮蔽基类函数时，该名字不再合格。
pub fn eligible_resolved(definition: &ServiceDefinition) -> BTreeSet<String> {
    let mut seen = BTreeSet::new();
    let mut eligible = BTreeSet::new();
    for level in definition.resolution_order() {
        for (name, attribute) in level.body() {
            if seen.insert(name.as_str()) && classify(name, attribute) {
                eligible.insert(name.clone());
            }
        }
    }
    eligible
}
