use crate::error::Error;
use crate::storage::Store;
use serde::Serialize;

pub const ROOT_NAME: &str = ".";

/// A node of the exported directory tree.
///
/// Serializes as `{"name", "children"}` for directories and
/// `{"name", "value"}` for files, where `value` is the size in bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TreeNode {
    Directory { name: String, children: Vec<TreeNode> },
    File { name: String, value: i64 },
}

impl TreeNode {
    pub fn directory(name: &str) -> Self {
        TreeNode::Directory {
            name: name.to_string(),
            children: Vec::new(),
        }
    }

    fn is_directory_named(&self, segment: &str) -> bool {
        matches!(self, TreeNode::Directory { name, .. } if name == segment)
    }

    /// Number of file leaves below this node.
    pub fn file_count(&self) -> usize {
        match self {
            TreeNode::Directory { children, .. } => children.iter().map(TreeNode::file_count).sum(),
            TreeNode::File { .. } => 1,
        }
    }
}

/// Builds the nested tree from flat (path, size) pairs, in the order given.
///
/// Paths are split on both `/` and `\`. Siblings are found by a linear scan
/// and only directories with the exact same segment name are reused.
pub fn build_tree<I, S>(entries: I) -> TreeNode
where
    I: IntoIterator<Item = (S, i64)>,
    S: AsRef<str>,
{
    let mut root = Vec::new();
    for (path, size) in entries {
        insert_path(&mut root, path.as_ref(), size);
    }
    TreeNode::Directory {
        name: ROOT_NAME.to_string(),
        children: root,
    }
}

fn insert_path(root: &mut Vec<TreeNode>, path: &str, size: i64) {
    let segments: Vec<&str> = path
        .split(['/', '\\'])
        .filter(|segment| !segment.is_empty())
        .collect();
    let Some((leaf, dirs)) = segments.split_last() else {
        return;
    };

    let mut siblings = root;
    for segment in dirs {
        siblings = child_directory(siblings, segment);
    }
    siblings.push(TreeNode::File {
        name: (*leaf).to_string(),
        value: size,
    });
}

fn child_directory<'a>(siblings: &'a mut Vec<TreeNode>, segment: &str) -> &'a mut Vec<TreeNode> {
    let index = match siblings.iter().position(|n| n.is_directory_named(segment)) {
        Some(index) => index,
        None => {
            siblings.push(TreeNode::directory(segment));
            siblings.len() - 1
        }
    };
    match &mut siblings[index] {
        TreeNode::Directory { children, .. } => children,
        TreeNode::File { .. } => unreachable!("sibling lookup only matches directories"),
    }
}

/// Read every stored (path, size) pair and materialize the tree. Rows with a
/// missing hash are included; only the size is needed.
pub fn export_tree(store: &Store) -> Result<TreeNode, Error> {
    let mut entries: Vec<(String, i64)> = Vec::new();
    store.for_each_entry(|path, size| entries.push((path.to_string(), size)))?;
    Ok(build_tree(entries))
}

pub fn export_json(store: &Store) -> Result<String, Error> {
    let tree = export_tree(store)?;
    Ok(serde_json::to_string_pretty(&tree)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::FileRecord;
    use serde_json::json;

    #[test]
    fn test_nested_paths() {
        let tree = build_tree(vec![("a/b.txt", 4), ("a/c.txt", 0)]);
        assert_eq!(
            serde_json::to_value(&tree).unwrap(),
            json!({
                "name": ".",
                "children": [
                    {"name": "a", "children": [
                        {"name": "b.txt", "value": 4},
                        {"name": "c.txt", "value": 0}
                    ]}
                ]
            })
        );
    }

    #[test]
    fn test_mixed_separators_share_directories() {
        let tree = build_tree(vec![("x\\y\\one", 1), ("x/y/two", 2), ("top", 3)]);
        let value = serde_json::to_value(&tree).unwrap();
        assert_eq!(
            value,
            json!({
                "name": ".",
                "children": [
                    {"name": "x", "children": [
                        {"name": "y", "children": [
                            {"name": "one", "value": 1},
                            {"name": "two", "value": 2}
                        ]}
                    ]},
                    {"name": "top", "value": 3}
                ]
            })
        );
        assert_eq!(tree.file_count(), 3);
    }

    #[test]
    fn test_file_and_directory_with_same_name() {
        let tree = build_tree(vec![("data", 7), ("data/inner", 1)]);
        let TreeNode::Directory { children, .. } = tree else {
            panic!("root must be a directory");
        };
        assert_eq!(children.len(), 2);
        assert_eq!(children[0], TreeNode::File { name: "data".to_string(), value: 7 });
        assert!(matches!(&children[1], TreeNode::Directory { name, .. } if name == "data"));
    }

    #[test]
    fn test_empty_store_exports_bare_root() {
        let store = Store::open_in_memory().unwrap();
        let tree = export_tree(&store).unwrap();
        assert_eq!(
            serde_json::to_value(&tree).unwrap(),
            json!({"name": ".", "children": []})
        );
    }

    #[test]
    fn test_export_includes_rows_without_hash() {
        let store = Store::open_in_memory().unwrap();
        store
            .upsert(&FileRecord {
                path: "broken/file.bin".to_string(),
                size: 12,
                modified: "2024-01-01T00:00:00.000000000Z".to_string(),
                hash: None,
            })
            .unwrap();

        let json = export_json(&store).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["children"][0]["name"], "broken");
        assert_eq!(value["children"][0]["children"][0]["value"], 12);
    }
}
