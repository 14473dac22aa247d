use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The key space captured by a v1 snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreTree {
    #[serde(rename = "Root", alias = "root", default)]
    pub root: StoreNode,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreNode {
    #[serde(rename = "Path", alias = "path", default)]
    pub path: String,
    #[serde(rename = "Value", alias = "value", default)]
    pub value: String,
    #[serde(rename = "Children", alias = "children", default)]
    pub children: BTreeMap<String, StoreNode>,
}

impl StoreTree {
    /// Walks `key` (e.g. `/_etcd/next-internal-version`) from the root.
    pub fn get(&self, key: &str) -> Option<&StoreNode> {
        key.split('/')
            .filter(|segment| !segment.is_empty())
            .try_fold(&self.root, |node, segment| node.children.get(segment))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_lookup_follows_children() {
        let tree: StoreTree = serde_json::from_str(
            r#"{"Root":{"Path":"/","Children":{"_etcd":{"Path":"/_etcd","Children":{
                "next-internal-version":{"Path":"/_etcd/next-internal-version","Value":"2"}}}}}}"#,
        )
        .expect("tree");
        let node = tree.get("/_etcd/next-internal-version").expect("node");
        assert_eq!(node.value, "2");
        assert!(tree.get("/_etcd/missing").is_none());
        assert!(tree.get("/other/next-internal-version").is_none());
    }
}
