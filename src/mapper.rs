//! File mappers: logical file names to read-only byte windows.
//!
//! Version-two dictionaries are spread across a header file and N value
//! files; the reader resolves them through a [`FileMapper`] rather than
//! touching the filesystem itself. Mapping happens eagerly at construction,
//! so `map_file` is a lookup, never I/O.
//!
//! Two implementations:
//!
//! - [`DirFileMapper`] memory-maps every regular file in a segment
//!   directory.
//! - [`MemoryFileMapper`] serves windows over in-process buffers, for tests
//!   and for segments that were just written and not yet persisted.

use crate::error::{DictError, Result};
use crate::window::ByteWindow;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

// ============================================================================
// FileMapper
// ============================================================================

/// Resolve a logical file name to a read-only byte window.
///
/// The returned window's limit equals its capacity, and the bytes stay valid
/// for the mapper's lifetime, which is what lets the byte-slice codec hand
/// out payloads that outlive individual reader calls.
pub trait FileMapper {
    fn map_file(&self, name: &str) -> Result<ByteWindow<'_>>;
}

// ============================================================================
// Backing
// ============================================================================

enum Backing {
    Mmap(memmap2::Mmap),
    Memory(Vec<u8>),
}

impl Backing {
    fn bytes(&self) -> &[u8] {
        match self {
            Backing::Mmap(mmap) => mmap.as_ref(),
            Backing::Memory(bytes) => bytes.as_ref(),
        }
    }
}

// ============================================================================
// DirFileMapper
// ============================================================================

/// Maps every regular file in a directory at open time.
pub struct DirFileMapper {
    files: HashMap<String, Backing>,
}

impl DirFileMapper {
    /// Memory-map all regular files directly under `dir`.
    ///
    /// Empty files are held as empty in-memory buffers (an empty dictionary
    /// has an empty header file, and zero-length mappings are not portable).
    pub fn open_dir(dir: &Path) -> Result<Self> {
        let mut files = HashMap::new();
        let entries = std::fs::read_dir(dir).map_err(|e| DictError::FileMapping {
            name: dir.display().to_string(),
            reason: e.to_string(),
        })?;
        for entry in entries {
            let entry = entry.map_err(|e| DictError::FileMapping {
                name: dir.display().to_string(),
                reason: e.to_string(),
            })?;
            if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            let backing = map_path(&entry.path(), &name)?;
            files.insert(name, backing);
        }
        tracing::debug!(dir = %dir.display(), files = files.len(), "mapped segment directory");
        Ok(Self { files })
    }
}

impl FileMapper for DirFileMapper {
    fn map_file(&self, name: &str) -> Result<ByteWindow<'_>> {
        match self.files.get(name) {
            Some(backing) => Ok(ByteWindow::new(backing.bytes())),
            None => Err(DictError::FileMapping {
                name: name.to_string(),
                reason: "no such file in mapped directory".to_string(),
            }),
        }
    }
}

fn map_path(path: &Path, name: &str) -> Result<Backing> {
    let file = File::open(path).map_err(|e| DictError::FileMapping {
        name: name.to_string(),
        reason: e.to_string(),
    })?;
    let len = file
        .metadata()
        .map_err(|e| DictError::FileMapping {
            name: name.to_string(),
            reason: e.to_string(),
        })?
        .len();
    if len == 0 {
        return Ok(Backing::Memory(Vec::new()));
    }
    let mmap = unsafe { memmap2::Mmap::map(&file) }.map_err(|e| DictError::FileMapping {
        name: name.to_string(),
        reason: e.to_string(),
    })?;
    Ok(Backing::Mmap(mmap))
}

// ============================================================================
// MemoryFileMapper
// ============================================================================

/// In-process mapper over owned buffers.
#[derive(Default)]
pub struct MemoryFileMapper {
    files: HashMap<String, Vec<u8>>,
}

impl MemoryFileMapper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, bytes: Vec<u8>) {
        self.files.insert(name.into(), bytes);
    }
}

impl FileMapper for MemoryFileMapper {
    fn map_file(&self, name: &str) -> Result<ByteWindow<'_>> {
        match self.files.get(name) {
            Some(bytes) => Ok(ByteWindow::new(bytes)),
            None => Err(DictError::FileMapping {
                name: name.to_string(),
                reason: "no such in-memory file".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_mapper_limit_equals_capacity() {
        let mut mapper = MemoryFileMapper::new();
        mapper.insert("col_header", vec![1, 2, 3, 4]);

        let w = mapper.map_file("col_header").unwrap();
        assert_eq!(w.limit(), w.capacity());
        assert_eq!(w.capacity(), 4);

        let err = mapper.map_file("col_value_0").unwrap_err();
        assert!(matches!(err, DictError::FileMapping { ref name, .. } if name == "col_value_0"));
    }
}
