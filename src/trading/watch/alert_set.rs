use std::collections::HashSet;

use crate::trading::watch::rule::AlertKey;

/// 已触发规则集合
///
/// 仅存在于进程内存中，没有过期也没有重置；一条规则触发后直到进程重启都不再评估。
#[derive(Debug, Default)]
pub struct FiredSet {
    keys: HashSet<AlertKey>,
}

impl FiredSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &AlertKey) -> bool {
        self.keys.contains(key)
    }

    /// 返回 false 表示之前已存在
    pub fn insert(&mut self, key: AlertKey) -> bool {
        self.keys.insert(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
