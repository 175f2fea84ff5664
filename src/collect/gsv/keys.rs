use anyhow::{ensure, Context, Result};
use std::path::Path;

/// Ordered pool of access keys for the imagery service. Selection is
/// round-robin by record index, so a given record always maps to the same
/// key regardless of how many requests earlier records issued.
#[derive(Debug, Clone)]
pub struct KeyPool {
    keys: Vec<String>,
}

impl KeyPool {
    pub fn new(keys: Vec<String>) -> Result<Self> {
        ensure!(!keys.is_empty(), "credential pool must not be empty");
        Ok(KeyPool { keys })
    }

    /// One key per line, order defines the round-robin index. Blank lines
    /// are ignored.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read key file: {:?}", path))?;
        let keys = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        Self::new(keys).with_context(|| format!("No keys found in {:?}", path))
    }

    pub fn key_for(&self, index: usize) -> &str {
        &self.keys[index % self.keys.len()]
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_round_robin_by_index() {
        let pool = KeyPool::new(vec!["a".into(), "b".into(), "c".into()]).unwrap();
        assert_eq!(pool.key_for(0), "a");
        assert_eq!(pool.key_for(1), "b");
        assert_eq!(pool.key_for(2), "c");
        assert_eq!(pool.key_for(3), "a");
        assert_eq!(pool.key_for(7), "b");
    }

    #[test]
    fn test_empty_pool_is_rejected() {
        assert!(KeyPool::new(vec![]).is_err());
    }

    #[test]
    fn test_from_file_skips_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keys.txt");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "KEY_A").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "KEY_B").unwrap();
        drop(file);

        let pool = KeyPool::from_file(&path).unwrap();
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.key_for(1), "KEY_B");
    }
}
