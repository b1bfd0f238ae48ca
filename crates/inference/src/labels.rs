//! Class index to display name lookup.

use anyhow::Context;
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// Read-only mapping from class index to display name.
pub trait LabelLookup {
    fn label(&self, class_index: usize) -> Option<&str>;
}

impl<T: LabelLookup + ?Sized> LabelLookup for &T {
    fn label(&self, class_index: usize) -> Option<&str> {
        (**self).label(class_index)
    }
}

impl LabelLookup for [&str] {
    fn label(&self, class_index: usize) -> Option<&str> {
        self.get(class_index).copied()
    }
}

impl LabelLookup for Vec<String> {
    fn label(&self, class_index: usize) -> Option<&str> {
        self.get(class_index).map(String::as_str)
    }
}

impl LabelLookup for HashMap<usize, String> {
    fn label(&self, class_index: usize) -> Option<&str> {
        self.get(&class_index).map(String::as_str)
    }
}

/// Labels loaded from `"<index>: <name>"` lines.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelMap {
    labels: HashMap<usize, String>,
}

impl LabelMap {
    pub fn from_reader<R: BufRead>(reader: R) -> io::Result<Self> {
        let mut labels = HashMap::new();

        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match parse_line(&line) {
                Some((index, name)) => {
                    labels.insert(index, name.to_string());
                }
                None => {
                    tracing::warn!(line = line_no + 1, content = %line, "Skipping malformed label line");
                }
            }
        }

        Ok(Self { labels })
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open label file {}", path.display()))?;
        let labels = Self::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to read label file {}", path.display()))?;

        tracing::info!(path = %path.display(), count = labels.len(), "Loaded labels");
        Ok(labels)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl FromIterator<(usize, String)> for LabelMap {
    fn from_iter<I: IntoIterator<Item = (usize, String)>>(iter: I) -> Self {
        Self {
            labels: iter.into_iter().collect(),
        }
    }
}

impl LabelLookup for LabelMap {
    fn label(&self, class_index: usize) -> Option<&str> {
        self.labels.get(&class_index).map(String::as_str)
    }
}

fn parse_line(line: &str) -> Option<(usize, &str)> {
    let (index, name) = line.split_once(':')?;
    let index = index.trim().parse().ok()?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((index, name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    #[test]
    fn test_parse_label_lines() {
        let text = "0: person\n1:bicycle\n\n  9 :  traffic light  \nnot a label\n-1: negative\n2:\n";
        let labels = LabelMap::from_reader(Cursor::new(text)).unwrap();

        assert_eq!(labels.len(), 3);
        assert_eq!(labels.label(0), Some("person"));
        assert_eq!(labels.label(1), Some("bicycle"));
        assert_eq!(labels.label(9), Some("traffic light"));
        assert_eq!(labels.label(2), None, "Empty names are skipped");
        assert_eq!(labels.label(5), None);
    }

    #[test]
    fn test_duplicate_index_keeps_last() {
        let labels = LabelMap::from_reader(Cursor::new("0: cat\n0: dog\n")).unwrap();
        assert_eq!(labels.label(0), Some("dog"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labels.txt");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "0: face").unwrap();
        writeln!(file, "1: mask").unwrap();

        let labels = LabelMap::load(&path).unwrap();
        assert_eq!(labels.label(1), Some("mask"));

        let missing = LabelMap::load(dir.path().join("missing.txt"));
        assert!(missing.unwrap_err().to_string().contains("Failed to open"));
    }

    #[test]
    fn test_other_lookups() {
        let names: &[&str] = &["a", "b"];
        assert_eq!(names.label(1), Some("b"));
        assert_eq!(names.label(2), None);

        let owned = vec!["x".to_string()];
        assert_eq!(owned.label(0), Some("x"));

        let map: HashMap<usize, String> = [(7, "seven".to_string())].into_iter().collect();
        assert_eq!(map.label(7), Some("seven"));

        let collected: LabelMap = [(3, "three".to_string())].into_iter().collect();
        assert_eq!((&collected).label(3), Some("three"));
    }
}
