use crate::common::{Error, Result};
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// Identifies an open table file. The buffer pool's cache key is
/// `(FileId, PageId)` rather than bare `PageId`, so that one pool can
/// back several tables at once.
pub type FileId = u32;

/// Identifies a page within a file. `-1` is [`crate::common::constants::INVALID_PAGE_ID`].
pub type PageId = i32;

struct OpenFile {
    name: String,
    handle: File,
    /// One past the highest page id ever read or written for this file.
    page_num: usize,
}

/// Reads and writes fixed-size pages on behalf of the buffer pool.
///
/// Page allocation is implicit: reading a page id at or beyond the
/// current end-of-file grows the file with zero-filled pages up to and
/// including that id (spec.md §6). There is no separate "allocate"
/// call -- the table handle decides the next page id
/// ([`crate::storage::table::table_handle::TableHandle`] §4.5.1) and
/// simply fetches it.
pub struct DiskManager {
    data_dir: PathBuf,
    page_size: usize,
    files: HashMap<FileId, OpenFile>,
    next_file_id: FileId,
}

impl DiskManager {
    pub fn new(data_dir: impl Into<PathBuf>, page_size: usize) -> Self {
        DiskManager {
            data_dir: data_dir.into(),
            page_size,
            files: HashMap::new(),
            next_file_id: 0,
        }
    }

    pub fn new_with_handle(data_dir: impl Into<PathBuf>, page_size: usize) -> Arc<RwLock<Self>> {
        Arc::new(RwLock::new(Self::new(data_dir, page_size)))
    }

    /// A disk manager rooted in a fresh temporary directory, for tests
    /// that don't care where their files land.
    pub fn new_with_handle_for_test() -> Arc<RwLock<Self>> {
        Self::new_with_handle_for_test_with_page_size(crate::config::config::DEFAULT_PAGE_SIZE)
    }

    /// Like [`DiskManager::new_with_handle_for_test`], for tests that
    /// need a small, specific page size (e.g. to exercise a table's
    /// free-page chain with few records per page).
    pub fn new_with_handle_for_test_with_page_size(page_size: usize) -> Arc<RwLock<Self>> {
        let dir = tempfile::tempdir().expect("failed to create temp dir for disk manager");
        // Leak the TempDir so its files outlive the returned handle; test
        // processes are short-lived and this keeps the API ergonomic.
        let path = dir.into_path();
        Self::new_with_handle(path, page_size)
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Opens `name` under the data directory, creating it if absent, and
    /// returns a fresh `FileId` for it.
    pub fn open_or_create_file(&mut self, name: &str) -> Result<FileId> {
        let path = self.data_dir.join(name);
        let handle = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&path)?;
        let len = handle.metadata()?.len() as usize;
        let page_num = len / self.page_size;

        let fid = self.next_file_id;
        self.next_file_id += 1;
        self.files.insert(
            fid,
            OpenFile {
                name: name.to_string(),
                handle,
                page_num,
            },
        );
        Ok(fid)
    }

    pub fn file_name(&self, fid: FileId) -> Result<&str> {
        self.files
            .get(&fid)
            .map(|f| f.name.as_str())
            .ok_or(Error::PageMiss { page_id: -1 })
    }

    /// Number of pages currently materialized on disk for `fid`
    /// (including any implicit growth from prior reads/writes).
    pub fn page_num(&self, fid: FileId) -> usize {
        self.files.get(&fid).map(|f| f.page_num).unwrap_or(0)
    }

    fn ensure_grown(file: &mut OpenFile, page_size: usize, pid: PageId) -> Result<()> {
        let required = pid as usize + 1;
        if required > file.page_num {
            let zero_page = vec![0u8; page_size];
            file.handle.seek(SeekFrom::Start((file.page_num * page_size) as u64))?;
            for _ in file.page_num..required {
                file.handle.write_all(&zero_page)?;
            }
            file.page_num = required;
        }
        Ok(())
    }

    /// Reads page `pid` of file `fid` into `buf`, which must be exactly
    /// `page_size` bytes. Implicitly grows the file if `pid` has never
    /// been written.
    pub fn read_page(&mut self, fid: FileId, pid: PageId, buf: &mut [u8]) -> Result<()> {
        debug_assert_eq!(buf.len(), self.page_size);
        let page_size = self.page_size;
        let file = self.files.get_mut(&fid).ok_or(Error::PageMiss { page_id: pid })?;
        Self::ensure_grown(file, page_size, pid)?;
        file.handle.seek(SeekFrom::Start(pid as u64 * page_size as u64))?;
        file.handle.read_exact(buf)?;
        Ok(())
    }

    /// Writes `buf` (exactly `page_size` bytes) to page `pid` of file `fid`.
    pub fn write_page(&mut self, fid: FileId, pid: PageId, buf: &[u8]) -> Result<()> {
        debug_assert_eq!(buf.len(), self.page_size);
        let page_size = self.page_size;
        let file = self.files.get_mut(&fid).ok_or(Error::PageMiss { page_id: pid })?;
        Self::ensure_grown(file, page_size, pid)?;
        file.handle.seek(SeekFrom::Start(pid as u64 * page_size as u64))?;
        file.handle.write_all(buf)?;
        file.handle.flush()?;
        Ok(())
    }
}

pub fn table_file_name(table_name: &str) -> String {
    format!("{table_name}.tbl")
}

pub fn objname_from_filename(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_beyond_eof_implicitly_grows_and_reads_zeros() {
        let dm = DiskManager::new_with_handle_for_test();
        let mut dm = dm.write().unwrap();
        let fid = dm.open_or_create_file("t.tbl").unwrap();

        let mut buf = vec![0xAAu8; dm.page_size()];
        dm.read_page(fid, 3, &mut buf).unwrap();
        assert!(buf.iter().all(|&b| b == 0));
        assert_eq!(dm.page_num(fid), 4);
    }

    #[test]
    fn write_then_read_round_trips() {
        let dm = DiskManager::new_with_handle_for_test();
        let mut dm = dm.write().unwrap();
        let fid = dm.open_or_create_file("t.tbl").unwrap();

        let mut written = vec![0u8; dm.page_size()];
        written[0] = 7;
        written[dm.page_size() - 1] = 9;
        dm.write_page(fid, 0, &written).unwrap();

        let mut read_back = vec![0u8; dm.page_size()];
        dm.read_page(fid, 0, &mut read_back).unwrap();
        assert_eq!(written, read_back);
    }

    #[test]
    fn reopening_an_existing_file_recovers_page_num() {
        let dir = tempfile::tempdir().unwrap();
        let page_size = 4096;
        {
            let mut dm = DiskManager::new(dir.path(), page_size);
            let fid = dm.open_or_create_file("t.tbl").unwrap();
            let buf = vec![0u8; page_size];
            dm.write_page(fid, 5, &buf).unwrap();
        }
        let mut dm = DiskManager::new(dir.path(), page_size);
        let fid = dm.open_or_create_file("t.tbl").unwrap();
        assert_eq!(dm.page_num(fid), 6);
    }

    #[test]
    fn writing_a_page_grows_the_backing_file_to_a_whole_number_of_pages() {
        use predicates::prelude::*;

        let dir = tempfile::tempdir().unwrap();
        let page_size = 4096;
        let mut dm = DiskManager::new(dir.path(), page_size);
        let fid = dm.open_or_create_file("t.tbl").unwrap();
        dm.write_page(fid, 2, &vec![0u8; page_size]).unwrap();

        let path = dir.path().join(dm.file_name(fid).unwrap());
        assert!(predicate::path::exists().eval(&path));
        let expect_size = (page_size as u64) * 3;
        assert!(predicate::function(|p: &std::path::Path| {
            p.metadata().map(|m| m.len() == expect_size).unwrap_or(false)
        })
        .eval(&path));
    }
}
