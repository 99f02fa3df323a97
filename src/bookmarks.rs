//! Reader for Chromium-style `Bookmarks` JSON exports.

use serde::Deserialize;
use std::path::Path;

use crate::error::JobBoardError;

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Node {
    Url {
        #[serde(default)]
        name: String,
        url: String,
    },
    Folder {
        #[serde(default)]
        name: String,
        #[serde(default)]
        children: Vec<Node>,
    },
    #[serde(other)]
    Other,
}

impl Node {
    fn folder_name(&self) -> Option<&str> {
        match self {
            Node::Folder { name, .. } => Some(name),
            _ => None,
        }
    }

    fn children(&self) -> &[Node] {
        match self {
            Node::Folder { children, .. } => children,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct Roots {
    bookmark_bar: Option<Node>,
    other: Option<Node>,
    synced: Option<Node>,
}

#[derive(Debug, Clone, Deserialize)]
struct BookmarksFile {
    #[serde(default)]
    roots: Roots,
}

/// A link found under the target folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bookmark {
    pub title: String,
    pub url: String,
    /// `/`-joined folder names from the target folder down to the link.
    pub folder: String,
}

#[derive(Debug, Clone)]
pub struct BookmarkTree {
    roots: Vec<Node>,
}

impl BookmarkTree {
    pub fn load(path: &Path) -> Result<Self, JobBoardError> {
        let text = std::fs::read_to_string(path).map_err(|source| JobBoardError::BookmarksRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text).map_err(|source| JobBoardError::BookmarksFormat {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(json: &str) -> Result<Self, serde_json::Error> {
        let file: BookmarksFile = serde_json::from_str(json)?;
        let Roots {
            bookmark_bar,
            other,
            synced,
        } = file.roots;
        Ok(Self {
            roots: [bookmark_bar, other, synced].into_iter().flatten().collect(),
        })
    }

    /// Finds a folder by `/`-separated path. The first segment may sit at any
    /// depth (first match in file order); later segments are direct children.
    pub fn find_folder(&self, folder_path: &str) -> Option<&Node> {
        let parts: Vec<&str> = folder_path.split('/').filter(|p| !p.is_empty()).collect();
        let (first, rest) = parts.split_first()?;

        let mut stack: Vec<&Node> = self.roots.iter().rev().collect();
        while let Some(node) = stack.pop() {
            if node.folder_name() == Some(*first) {
                if let Some(found) = descend(node, rest) {
                    return Some(found);
                }
            }
            stack.extend(node.children().iter().rev());
        }
        None
    }

    /// Links under `folder_path`, in file order. Fails with `NotFound` when
    /// the folder does not exist.
    pub fn links<'a>(
        &'a self,
        folder_path: &str,
        recursive: bool,
    ) -> Result<Links<'a>, JobBoardError> {
        let folder = self
            .find_folder(folder_path)
            .ok_or_else(|| JobBoardError::NotFound(folder_path.to_string()))?;
        let name = folder.folder_name().unwrap_or_default().to_string();
        Ok(Links {
            stack: vec![(folder.children().iter(), name)],
            recursive,
        })
    }
}

fn descend<'a>(node: &'a Node, path: &[&str]) -> Option<&'a Node> {
    let Some((next, rest)) = path.split_first() else {
        return Some(node);
    };
    node.children()
        .iter()
        .find(|child| child.folder_name() == Some(*next))
        .and_then(|child| descend(child, rest))
}

/// Lazy depth-first walk over a folder's links.
pub struct Links<'a> {
    stack: Vec<(std::slice::Iter<'a, Node>, String)>,
    recursive: bool,
}

impl Iterator for Links<'_> {
    type Item = Bookmark;

    fn next(&mut self) -> Option<Bookmark> {
        loop {
            let (iter, folder) = self.stack.last_mut()?;
            let Some(node) = iter.next() else {
                self.stack.pop();
                continue;
            };
            match node {
                Node::Url { name, url } => {
                    return Some(Bookmark {
                        title: name.clone(),
                        url: url.clone(),
                        folder: folder.clone(),
                    });
                }
                Node::Folder { name, children } if self.recursive => {
                    let path = format!("{}/{}", folder, name);
                    self.stack.push((children.iter(), path));
                }
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "checksum": "abc",
        "version": 1,
        "roots": {
            "bookmark_bar": {
                "type": "folder",
                "name": "Bookmarks bar",
                "children": [
                    { "type": "url", "name": "News", "url": "https://news.example" },
                    {
                        "type": "folder",
                        "name": "Job-searching",
                        "children": [
                            {
                                "type": "folder",
                                "name": "Jobs",
                                "children": [
                                    { "type": "url", "name": "Rust Engineer", "url": "https://jobs.example/1" },
                                    {
                                        "type": "folder",
                                        "name": "Maybe",
                                        "children": [
                                            { "type": "url", "name": "Data Engineer", "url": "https://jobs.example/2" }
                                        ]
                                    },
                                    { "type": "url", "name": "Platform Engineer", "url": "https://jobs.example/3" }
                                ]
                            }
                        ]
                    }
                ]
            },
            "other": { "type": "folder", "name": "Other bookmarks", "children": [] },
            "synced": { "type": "folder", "name": "Mobile bookmarks", "children": [
                { "type": "separator" }
            ] }
        }
    }"#;

    #[test]
    fn test_links_include_nested_folders_in_file_order() {
        let tree = BookmarkTree::parse(SAMPLE).unwrap();
        let links: Vec<Bookmark> = tree.links("Job-searching/Jobs", true).unwrap().collect();
        let urls: Vec<&str> = links.iter().map(|b| b.url.as_str()).collect();
        assert_eq!(
            urls,
            vec!["https://jobs.example/1", "https://jobs.example/2", "https://jobs.example/3"]
        );
        assert_eq!(links[0].title, "Rust Engineer");
        assert_eq!(links[1].folder, "Jobs/Maybe");
    }

    #[test]
    fn test_folder_found_by_name_at_any_depth() {
        let tree = BookmarkTree::parse(SAMPLE).unwrap();
        assert_eq!(tree.links("Jobs", true).unwrap().count(), 3);
        assert_eq!(tree.links("Maybe", true).unwrap().count(), 1);
    }

    #[test]
    fn test_non_recursive_skips_subfolders() {
        let tree = BookmarkTree::parse(SAMPLE).unwrap();
        let urls: Vec<String> = tree.links("Jobs", false).unwrap().map(|b| b.url).collect();
        assert_eq!(urls, vec!["https://jobs.example/1", "https://jobs.example/3"]);
    }

    #[test]
    fn test_missing_folder_is_not_found() {
        let tree = BookmarkTree::parse(SAMPLE).unwrap();
        let err = tree.links("Job-searching/Archive", true).err().unwrap();
        assert!(matches!(err, JobBoardError::NotFound(ref f) if f == "Job-searching/Archive"));

        assert!(matches!(tree.links("", true), Err(JobBoardError::NotFound(_))));
    }

    #[test]
    fn test_only_links_under_target_are_returned() {
        let json = r#"{"roots": {"bookmark_bar": {"type": "folder", "name": "Bar", "children": [
            {"type": "url", "name": "elsewhere", "url": "https://elsewhere.example"},
            {"type": "folder", "name": "Jobs", "children": [
                {"type": "url", "name": "a", "url": "https://a.example"},
                {"type": "url", "name": "b", "url": "https://b.example"}
            ]}
        ]}}}"#;
        let tree = BookmarkTree::parse(json).unwrap();
        assert_eq!(tree.links("Jobs", true).unwrap().count(), 2);
    }

    #[test]
    fn test_load_reports_unreadable_and_malformed_files() {
        let dir = tempfile::tempdir().unwrap();
        let missing = BookmarkTree::load(&dir.path().join("Bookmarks")).unwrap_err();
        assert!(matches!(missing, JobBoardError::BookmarksRead { .. }));

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "not json").unwrap();
        let malformed = BookmarkTree::load(&bad).unwrap_err();
        assert!(matches!(malformed, JobBoardError::BookmarksFormat { .. }));

        let good = dir.path().join("Bookmarks");
        std::fs::write(&good, SAMPLE).unwrap();
        assert!(BookmarkTree::load(&good).is_ok());
    }
}
