use anyhow::{anyhow, Context, Result};
use std::path::Path;

/// Keywords read from a CSV file with a `keyword` column.
#[derive(Debug, Clone, Default)]
pub struct KeywordSet {
    keywords: Vec<String>,
}

impl KeywordSet {
    pub fn new(keywords: impl IntoIterator<Item = String>) -> Self {
        let mut seen = Vec::new();
        for kw in keywords {
            let kw = kw.trim().to_string();
            if !kw.is_empty() && !seen.iter().any(|s: &String| s.eq_ignore_ascii_case(&kw)) {
                seen.push(kw);
            }
        }
        Self { keywords: seen }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path)
            .with_context(|| format!("Failed to open keyword file: {}", path.display()))?;

        let column = reader
            .headers()?
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case("keyword"))
            .ok_or_else(|| anyhow!("Keyword file {} has no 'keyword' column", path.display()))?;

        let mut keywords = Vec::new();
        for record in reader.records() {
            let record = record.with_context(|| format!("Bad row in {}", path.display()))?;
            if let Some(value) = record.get(column) {
                keywords.push(value.to_string());
            }
        }
        Ok(Self::new(keywords))
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    /// Keywords present in `text`, case-insensitive, in file order.
    pub fn matches(&self, text: &str) -> Vec<&str> {
        let haystack = text.to_lowercase();
        self.keywords
            .iter()
            .filter(|kw| haystack.contains(&kw.to_lowercase()))
            .map(String::as_str)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_case_insensitive() {
        let set = KeywordSet::new(["Rust", "SQL", "kubernetes", "rust "].map(String::from));
        assert_eq!(set.len(), 3);
        let found = set.matches("We write rust services backed by PostgreSQL.");
        assert_eq!(found, vec!["Rust", "SQL"]);
        assert!(set.matches("").is_empty());
    }

    #[test]
    fn test_load_from_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keywords.csv");
        std::fs::write(&path, "category,keyword\nlang,Rust\nlang,Go\ninfra,\n").unwrap();

        let set = KeywordSet::load(&path).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.matches("Go and Rust"), vec!["Rust", "Go"]);
    }

    #[test]
    fn test_load_requires_keyword_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keywords.csv");
        std::fs::write(&path, "term\nRust\n").unwrap();
        assert!(KeywordSet::load(&path).is_err());
    }
}
