//! Two-port read-only file access used by the boot menu.
//!
//! | Port | Read                          | Write                              |
//! |------|-------------------------------|------------------------------------|
//! | data | next byte, 0 past the end     | file-name byte; NUL opens the file |
//! | ctrl | status: bit 0 open, bit 1 EOF | any value closes the file          |

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

pub const STATUS_OPEN: u8 = 0x01;
pub const STATUS_EOF: u8 = 0x02;

/// Longest file name accepted; further bytes are ignored.
const MAX_NAME: usize = 64;

/// Where named files come from.
pub trait FileSource {
    /// Contents of `name`, or `None` if it does not exist.
    fn open(&mut self, name: &str) -> Option<Vec<u8>>;
}

impl<T: FileSource + ?Sized> FileSource for Box<T> {
    fn open(&mut self, name: &str) -> Option<Vec<u8>> {
        (**self).open(name)
    }
}

/// Files held in memory.
#[derive(Debug, Default, Clone)]
pub struct MemoryFiles(HashMap<String, Vec<u8>>);

impl MemoryFiles {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, contents: Vec<u8>) {
        self.0.insert(name.into(), contents);
    }
}

impl FileSource for MemoryFiles {
    fn open(&mut self, name: &str) -> Option<Vec<u8>> {
        self.0.get(name).cloned()
    }
}

/// Files in one host directory. Names with path components are refused.
#[derive(Debug, Clone)]
pub struct HostDirectory {
    root: PathBuf,
}

impl HostDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl FileSource for HostDirectory {
    fn open(&mut self, name: &str) -> Option<Vec<u8>> {
        if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
            log::warn!("refusing file name {name:?}");
            return None;
        }
        match fs::read(self.root.join(name)) {
            Ok(contents) => Some(contents),
            Err(e) => {
                log::debug!("cannot open {name}: {e}");
                None
            }
        }
    }
}

struct OpenFile {
    contents: Vec<u8>,
    position: usize,
}

pub struct FilePorts<F: FileSource> {
    source: F,
    name: Vec<u8>,
    file: Option<OpenFile>,
}

impl<F: FileSource> FilePorts<F> {
    pub fn new(source: F) -> Self {
        Self {
            source,
            name: Vec::new(),
            file: None,
        }
    }

    pub fn write_data(&mut self, value: u8) {
        if value != 0 {
            if self.name.len() < MAX_NAME {
                self.name.push(value);
            }
            return;
        }

        let name = String::from_utf8_lossy(&self.name).into_owned();
        self.name.clear();
        self.file = self.source.open(&name).map(|contents| OpenFile { contents, position: 0 });
        match &self.file {
            Some(file) => log::info!("opened {name} ({} bytes)", file.contents.len()),
            None => log::debug!("no file named {name}"),
        }
    }

    pub fn read_data(&mut self) -> u8 {
        let Some(file) = self.file.as_mut() else {
            return 0;
        };
        let byte = file.contents.get(file.position).copied().unwrap_or(0);
        file.position = (file.position + 1).min(file.contents.len());
        byte
    }

    #[must_use]
    pub fn status(&self) -> u8 {
        match &self.file {
            None => 0,
            Some(file) if file.position >= file.contents.len() => STATUS_OPEN | STATUS_EOF,
            Some(_) => STATUS_OPEN,
        }
    }

    pub fn close(&mut self) {
        self.file = None;
        self.name.clear();
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ports() -> FilePorts<MemoryFiles> {
        let mut files = MemoryFiles::new();
        files.insert("DEMO.O", vec![0xA9, 0x01]);
        files.insert("EMPTY", vec![]);
        FilePorts::new(files)
    }

    fn open(ports: &mut FilePorts<MemoryFiles>, name: &str) {
        for b in name.bytes() {
            ports.write_data(b);
        }
        ports.write_data(0);
    }

    #[test]
    fn open_read_close() {
        let mut ports = ports();
        assert_eq!(ports.status(), 0);
        open(&mut ports, "DEMO.O");
        assert_eq!(ports.status(), STATUS_OPEN);
        assert_eq!(ports.read_data(), 0xA9);
        assert_eq!(ports.read_data(), 0x01);
        assert_eq!(ports.status(), STATUS_OPEN | STATUS_EOF);
        assert_eq!(ports.read_data(), 0);

        ports.close();
        assert_eq!(ports.status(), 0);
        assert_eq!(ports.read_data(), 0);
    }

    #[test]
    fn missing_file_stays_closed() {
        let mut ports = ports();
        open(&mut ports, "NOPE");
        assert!(!ports.is_open());
        // the name buffer was consumed by the failed open
        open(&mut ports, "EMPTY");
        assert_eq!(ports.status(), STATUS_OPEN | STATUS_EOF);
    }

    #[test]
    fn host_directory_refuses_paths() {
        let mut dir = HostDirectory::new(std::env::temp_dir());
        assert_eq!(dir.open("../etc/passwd"), None);
        assert_eq!(dir.open(".."), None);
        assert_eq!(dir.open(""), None);
    }
}
