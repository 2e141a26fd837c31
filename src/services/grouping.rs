//! 分组服务 - 业务能力层
//!
//! 先按节点（服务器 + 虚拟代理）分组，再在节点内按应用分组，
//! 保证每个 (节点, 应用) 只建立一次连接、打开一次会话。
//! 分组是稳定的：键按首次出现的顺序排列，组内保持输入顺序。

use std::hash::Hash;

use indexmap::IndexMap;

use crate::models::{Configuration, NodeKey};

/// 一个节点下的所有配置
#[derive(Debug, Clone, PartialEq)]
pub struct NodeGroup {
    pub key: NodeKey,
    pub configurations: Vec<Configuration>,
}

/// 一个应用下的所有配置，`key` 为 `None` 表示 URL 中没有 appid
#[derive(Debug, Clone, PartialEq)]
pub struct AppGroup {
    pub key: Option<String>,
    pub configurations: Vec<Configuration>,
}

/// 按节点分组
pub fn group_by_node(configurations: impl IntoIterator<Item = Configuration>) -> Vec<NodeGroup> {
    stable_partition(configurations, Configuration::node_key)
        .into_iter()
        .map(|(key, configurations)| NodeGroup { key, configurations })
        .collect()
}

/// 按应用分组
pub fn group_by_app(configurations: impl IntoIterator<Item = Configuration>) -> Vec<AppGroup> {
    stable_partition(configurations, Configuration::app_key)
        .into_iter()
        .map(|(key, configurations)| AppGroup { key, configurations })
        .collect()
}

/// 稳定划分：键按首次出现排序，组内元素保持原有相对顺序
pub fn stable_partition<T, K, F>(items: impl IntoIterator<Item = T>, key_of: F) -> Vec<(K, Vec<T>)>
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let mut groups: IndexMap<K, Vec<T>> = IndexMap::new();
    for item in items {
        groups.entry(key_of(&item)).or_default().push(item);
    }
    groups.into_iter().collect()
}
