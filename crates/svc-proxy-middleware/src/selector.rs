use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// 决定 Hook 包装哪些合格函数。
///
/// - `only` 为空（`None`）时表示全部合格函数；
/// - `except` 中的名字总是被排除，优先级高于 `only`。
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FunctionSelector {
    pub only: Option<BTreeSet<String>>,
    pub except: BTreeSet<String>,
}

impl FunctionSelector {
    /// 选择全部合格函数。
    pub fn all() -> Self {
        Self::default()
    }

    pub fn only<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            only: Some(names.into_iter().map(Into::into).collect()),
            except: BTreeSet::new(),
        }
    }

    pub fn except<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.except.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn matches(&self, name: &str) -> bool {
        if self.except.contains(name) {
            return false;
        }
        self.only
            .as_ref()
            .is_none_or(|only| only.contains(name))
    }
}
