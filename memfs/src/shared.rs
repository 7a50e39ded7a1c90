//! Access to one file system from several threads.
//!
//! Directory entries, link counts and the free inode set have to change
//! together, so the whole file system sits behind a single lock.

use std::sync::{Arc, Mutex};

use crate::fs::FileSystem;

#[derive(Clone)]
pub struct SharedFileSystem {
    inner: Arc<Mutex<FileSystem>>,
}

impl SharedFileSystem {
    pub fn new(fs: FileSystem) -> Self {
        Self {
            inner: Arc::new(Mutex::new(fs)),
        }
    }

    /// Runs `f` with exclusive access to the file system.
    ///
    /// Operations never leave the file system half updated, so a lock
    /// poisoned by a panicking caller is still safe to reuse.
    pub fn with<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&mut FileSystem) -> R,
    {
        let mut guard = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut guard)
    }
}

impl From<FileSystem> for SharedFileSystem {
    fn from(fs: FileSystem) -> Self {
        SharedFileSystem::new(fs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::DEFAULT_FILE_MODE;
    use std::thread;

    #[test]
    fn threads_see_each_others_files() {
        let shared = SharedFileSystem::new(FileSystem::new());

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let shared = shared.clone();
                thread::spawn(move || {
                    let path = format!("/file{}", i);
                    shared.with(|fs| {
                        let fd = fs.creat(&path, DEFAULT_FILE_MODE).unwrap();
                        fs.write(fd, path.as_bytes()).unwrap();
                        fs.close(fd).unwrap();
                    });
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        shared.with(|fs| {
            for i in 0..4 {
                assert_eq!(fs.stat(&format!("/file{}", i)).unwrap().size, 6);
            }
            assert_eq!(fs.stat("/").unwrap().nlink, 6);
            assert_eq!(fs.super_block().free_inodes_count, 256 - 5);
        });
    }
}
