//! On-disk snapshots of a whole store.
//!
//! File layout:
//!
//! ```text
//! magic "RLS\0" | version u8 | body length u64 LE | crc32 u32 LE | MessagePack body
//! ```
//!
//! Snapshots are written to a temporary file and renamed into place.

use crate::collection::{Collection, MemoryStore, RecordStore};
use crate::error::{Result, StoreError};
use crate::types::{MemberType, Post, Profile, User};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::Path;

/// Magic bytes for snapshot files.
const SNAPSHOT_MAGIC: &[u8; 4] = b"RLS\0";

/// Current snapshot format version.
const SNAPSHOT_VERSION: u8 = 1;

/// Magic, version, body length and checksum.
const HEADER_LEN: u64 = 4 + 1 + 8 + 4;

/// Snapshot file name inside a database directory.
pub const SNAPSHOT_FILE: &str = "snapshot.bin";

/// Lock file name inside a database directory.
pub const LOCK_FILE: &str = "LOCK";

/// Every record of every kind, in store order.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub users: Vec<User>,
    pub posts: Vec<Post>,
    pub profiles: Vec<Profile>,
    pub member_types: Vec<MemberType>,
}

impl Snapshot {
    /// Copy the contents of a store.
    pub fn capture<S: RecordStore + ?Sized>(store: &S) -> Self {
        Self {
            users: store.users().find_many(None),
            posts: store.posts().find_many(None),
            profiles: store.profiles().find_many(None),
            member_types: store.member_types().find_many(None),
        }
    }

    /// Build an in-memory store holding this snapshot.
    pub fn into_store(self) -> MemoryStore {
        MemoryStore::from_parts(self.users, self.posts, self.profiles, self.member_types)
    }

    pub fn record_count(&self) -> usize {
        self.users.len() + self.posts.len() + self.profiles.len() + self.member_types.len()
    }

    /// Write the snapshot to `path` atomically.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let body = rmp_serde::to_vec(self)?;
        let checksum = crc32fast::hash(&body);

        let tmp_path = path.with_extension("tmp");
        {
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&tmp_path)?;

            file.write_all(SNAPSHOT_MAGIC)?;
            file.write_all(&[SNAPSHOT_VERSION])?;
            file.write_all(&(body.len() as u64).to_le_bytes())?;
            file.write_all(&checksum.to_le_bytes())?;
            file.write_all(&body)?;
            file.sync_all()?;
        }

        fs::rename(&tmp_path, path)?;
        Ok(())
    }

    /// Read and verify a snapshot file.
    pub fn read_from(path: &Path) -> Result<Self> {
        let mut file = File::open(path)?;

        let mut magic = [0u8; 4];
        file.read_exact(&mut magic)?;
        if &magic != SNAPSHOT_MAGIC {
            return Err(StoreError::InvalidFormat("Invalid snapshot magic".into()));
        }

        let mut version = [0u8; 1];
        file.read_exact(&mut version)?;
        if version[0] != SNAPSHOT_VERSION {
            return Err(StoreError::InvalidFormat(format!(
                "Unsupported snapshot version: {}",
                version[0]
            )));
        }

        let mut len_bytes = [0u8; 8];
        file.read_exact(&mut len_bytes)?;
        let len = u64::from_le_bytes(len_bytes);

        // The body can't be longer than what follows the header.
        let available = file.metadata()?.len().saturating_sub(HEADER_LEN);
        if len > available {
            return Err(StoreError::InvalidFormat(format!(
                "Snapshot body length {} exceeds file size",
                len
            )));
        }
        let len = len as usize;

        let mut checksum_bytes = [0u8; 4];
        file.read_exact(&mut checksum_bytes)?;
        let expected = u32::from_le_bytes(checksum_bytes);

        let mut body = vec![0u8; len];
        file.read_exact(&mut body)?;

        let got = crc32fast::hash(&body);
        if got != expected {
            return Err(StoreError::ChecksumMismatch { expected, got });
        }

        Ok(rmp_serde::from_slice(&body)?)
    }
}

/// Take the exclusive lock on a database directory.
pub fn acquire_lock(dir: &Path) -> Result<File> {
    let lock_file = File::create(dir.join(LOCK_FILE))?;

    lock_file
        .try_lock_exclusive()
        .map_err(|_| StoreError::Locked)?;

    Ok(lock_file)
}
