use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use super::unit_entry_name;
use crate::core::error::{BootError, BootResult};

/// An opened container of named entries. Entries are held in memory so the
/// writer can replace them in place; loaders read through the reader and
/// therefore only ever see the current content.
#[derive(Debug)]
pub struct ArchiveReference {
    name: String,
    location: Option<PathBuf>,
    entries: RwLock<BTreeMap<String, Arc<[u8]>>>,
}

impl ArchiveReference {
    /// Open a zip container from disk.
    pub async fn open(path: &Path) -> BootResult<Arc<Self>> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| BootError::io(path, e))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        let entries = tokio::task::spawn_blocking(move || read_zip_entries(bytes))
            .await
            .map_err(|e| BootError::Other(format!("Task join error: {}", e)))??;

        debug!("Opened archive {:?} ({} entries)", path, entries.len());
        Ok(Arc::new(Self {
            name,
            location: Some(path.to_path_buf()),
            entries: RwLock::new(entries),
        }))
    }

    /// Build an archive from in-memory entries.
    pub fn from_entries<I, K, V>(name: &str, entries: I) -> Arc<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Vec<u8>>,
    {
        let entries = entries
            .into_iter()
            .map(|(k, v)| {
                let bytes: Vec<u8> = v.into();
                (k.into(), Arc::from(bytes))
            })
            .collect();
        Arc::new(Self {
            name: name.to_string(),
            location: None,
            entries: RwLock::new(entries),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn location(&self) -> Option<&Path> {
        self.location.as_deref()
    }

    pub fn reader(&self) -> ArchiveReader<'_> {
        ArchiveReader { archive: self }
    }

    pub fn writer(&self) -> ArchiveWriter<'_> {
        ArchiveWriter { archive: self }
    }
}

/// Most an entry's declared size may preallocate; the read grows past it.
const MAX_PREALLOCATION: u64 = 1 << 20;

fn initial_capacity(declared: u64) -> usize {
    declared.min(MAX_PREALLOCATION) as usize
}

fn read_zip_entries(bytes: Vec<u8>) -> BootResult<BTreeMap<String, Arc<[u8]>>> {
    let mut zip = zip::ZipArchive::new(std::io::Cursor::new(bytes))?;
    let mut entries = BTreeMap::new();

    for i in 0..zip.len() {
        let mut file = zip.by_index(i)?;
        if file.is_dir() {
            continue;
        }
        let name = file.name().to_string();
        let mut content = Vec::with_capacity(initial_capacity(file.size()));
        file.read_to_end(&mut content)?;
        entries.insert(name, Arc::from(content));
    }

    Ok(entries)
}

/// Read access to an archive's entries.
pub struct ArchiveReader<'a> {
    archive: &'a ArchiveReference,
}

impl ArchiveReader<'_> {
    pub fn contains(&self, entry: &str) -> bool {
        self.archive
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(entry)
    }

    pub fn get(&self, entry: &str) -> Option<Arc<[u8]>> {
        self.archive
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(entry)
            .cloned()
    }

    pub fn contains_unit(&self, unit: &str) -> bool {
        self.contains(&unit_entry_name(unit))
    }

    pub fn unit(&self, unit: &str) -> Option<Arc<[u8]>> {
        self.get(&unit_entry_name(unit))
    }

    pub fn entry_names(&self) -> Vec<String> {
        self.archive
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }
}

/// In-place replacement of an archive's entries.
pub struct ArchiveWriter<'a> {
    archive: &'a ArchiveReference,
}

impl ArchiveWriter<'_> {
    pub fn put(&self, entry: &str, bytes: Vec<u8>) {
        self.archive
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(entry.to_string(), Arc::from(bytes));
    }

    pub fn put_unit(&self, unit: &str, bytes: Vec<u8>) {
        self.put(&unit_entry_name(unit), bytes);
    }

    pub fn remove(&self, entry: &str) -> bool {
        self.archive
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(entry)
            .is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_zip(path: &Path, files: &[(&str, &[u8])]) {
        let file = std::fs::File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        zip.add_directory("net/demo/", zip::write::SimpleFileOptions::default())
            .unwrap();
        for (name, body) in files {
            zip.start_file(*name, zip::write::SimpleFileOptions::default())
                .unwrap();
            zip.write_all(body).unwrap();
        }
        zip.finish().unwrap();
    }

    #[test]
    fn declared_entry_size_does_not_drive_allocation() {
        assert_eq!(initial_capacity(4), 4);
        assert_eq!(initial_capacity(u64::MAX), 1 << 20);
    }

    #[tokio::test]
    async fn opens_zip_and_skips_directories() {
        let dir = std::env::temp_dir().join(format!("patchboot-archive-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("app-1.0.jar");
        write_zip(
            &path,
            &[
                ("net/demo/Main.class", &b"main"[..]),
                ("META-INF/target-provider.properties", &b"provider-name=demo"[..]),
            ],
        );

        let archive = ArchiveReference::open(&path).await.unwrap();
        assert_eq!(archive.name(), "app-1.0.jar");
        assert_eq!(archive.reader().entry_names().len(), 2);
        assert!(archive.reader().contains_unit("net.demo.Main"));
        assert_eq!(&*archive.reader().unit("net.demo.Main").unwrap(), b"main");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn writer_replaces_entries_in_place() {
        let archive = ArchiveReference::from_entries("mem", [("a/B.class", b"old".to_vec())]);
        archive.writer().put_unit("a.B", b"new".to_vec());
        assert_eq!(&*archive.reader().unit("a.B").unwrap(), b"new");
        assert!(archive.writer().remove("a/B.class"));
        assert!(!archive.reader().contains_unit("a.B"));
    }
}
