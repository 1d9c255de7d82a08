//! Directory tree of the files in a diff.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeNode<T> {
    pub data: T,
    pub children: Vec<TreeNode<T>>,
}

impl<T> TreeNode<T> {
    pub fn leaf(data: T) -> Self {
        Self {
            data,
            children: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FileTreeEntry {
    /// `name` may span several path components ("src/app") when
    /// single-child directories were merged.
    Directory { name: String, path: String },
    File {
        name: String,
        path: String,
        file_index: usize,
    },
}

impl FileTreeEntry {
    pub fn name(&self) -> &str {
        match self {
            FileTreeEntry::Directory { name, .. } | FileTreeEntry::File { name, .. } => name,
        }
    }

    pub fn path(&self) -> &str {
        match self {
            FileTreeEntry::Directory { path, .. } | FileTreeEntry::File { path, .. } => path,
        }
    }
}

/// Builds a tree from `(file index, path)` pairs, keeping insertion order.
/// Directories whose only child is another directory are merged into one
/// node.
pub fn build_file_tree<'a, I>(paths: I) -> Vec<TreeNode<FileTreeEntry>>
where
    I: IntoIterator<Item = (usize, &'a str)>,
{
    let mut roots = Vec::new();
    for (file_index, path) in paths {
        let parts: Vec<&str> = path.split('/').filter(|part| !part.is_empty()).collect();
        insert(&mut roots, &parts, "", file_index);
    }
    roots.into_iter().map(merge_single_child_dirs).collect()
}

fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}/{name}")
    }
}

fn insert(nodes: &mut Vec<TreeNode<FileTreeEntry>>, parts: &[&str], prefix: &str, file_index: usize) {
    match parts {
        [] => {}
        [name] => nodes.push(TreeNode::leaf(FileTreeEntry::File {
            name: (*name).to_string(),
            path: join(prefix, name),
            file_index,
        })),
        [dir, rest @ ..] => {
            let path = join(prefix, dir);
            let existing = nodes.iter().position(|node| {
                matches!(&node.data, FileTreeEntry::Directory { name, .. } if name == dir)
            });
            let index = match existing {
                Some(index) => index,
                None => {
                    nodes.push(TreeNode::leaf(FileTreeEntry::Directory {
                        name: (*dir).to_string(),
                        path: path.clone(),
                    }));
                    nodes.len() - 1
                }
            };
            insert(&mut nodes[index].children, rest, &path, file_index);
        }
    }
}

fn merge_single_child_dirs(mut node: TreeNode<FileTreeEntry>) -> TreeNode<FileTreeEntry> {
    node.children = std::mem::take(&mut node.children)
        .into_iter()
        .map(merge_single_child_dirs)
        .collect();

    let single_dir_child = node.children.len() == 1
        && matches!(node.data, FileTreeEntry::Directory { .. })
        && matches!(node.children[0].data, FileTreeEntry::Directory { .. });
    if !single_dir_child {
        return node;
    }

    let Some(child) = node.children.pop() else {
        return node;
    };
    let name = format!("{}/{}", node.data.name(), child.data.name());
    TreeNode {
        data: FileTreeEntry::Directory {
            name,
            path: child.data.path().to_string(),
        },
        children: child.children,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(nodes: &[TreeNode<FileTreeEntry>]) -> Vec<&str> {
        nodes.iter().map(|node| node.data.name()).collect()
    }

    #[test]
    fn test_single_child_directories_merge() {
        let tree = build_file_tree([(0, "src/app/main.rs"), (1, "src/app/lib.rs")]);
        assert_eq!(names(&tree), vec!["src/app"]);
        assert_eq!(tree[0].data.path(), "src/app");
        assert_eq!(names(&tree[0].children), vec!["main.rs", "lib.rs"]);
    }

    #[test]
    fn test_directories_with_files_do_not_merge() {
        let tree = build_file_tree([(0, "a/x.rs"), (1, "a/b/c/y.rs"), (2, "README.md")]);
        assert_eq!(names(&tree), vec!["a", "README.md"]);
        assert_eq!(names(&tree[0].children), vec!["x.rs", "b/c"]);
        assert_eq!(
            tree[0].children[1].children[0].data,
            FileTreeEntry::File {
                name: "y.rs".into(),
                path: "a/b/c/y.rs".into(),
                file_index: 1,
            }
        );
    }

    #[test]
    fn test_insertion_order_is_kept() {
        let tree = build_file_tree([(0, "z.rs"), (1, "lib/a.rs"), (2, "b.rs"), (3, "lib/c.rs")]);
        assert_eq!(names(&tree), vec!["z.rs", "lib", "b.rs"]);
        assert_eq!(names(&tree[1].children), vec!["a.rs", "c.rs"]);
    }
}
