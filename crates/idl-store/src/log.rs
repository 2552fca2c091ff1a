use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, warn};

use idl_chain::Block;

use crate::error::{StoreError, StoreResult};

/// Magic bytes opening every block log file.
const MAGIC: &[u8; 8] = b"IDLBLOG\0";

/// Current on-disk format version.
const FORMAT_VERSION: u32 = 1;

/// Header size: 8 bytes magic + 4 bytes version.
const FILE_HEADER_SIZE: u64 = 12;

/// Frame header size: 4 bytes length + 4 bytes CRC.
const FRAME_HEADER_SIZE: usize = 8;

/// Flush/sync strategy for the block log.
#[derive(Clone, Debug, Default)]
pub enum SyncMode {
    /// `fsync` after every append (safest, highest latency).
    EveryWrite,
    /// Rely on OS page-cache buffering (fastest, least durable).
    #[default]
    OsDefault,
}

/// Configuration for the block log.
#[derive(Clone, Debug, Default)]
pub struct LogConfig {
    /// Sync/flush strategy.
    pub sync_mode: SyncMode,
}

/// Internal mutable state for the log writer.
struct LogWriter {
    writer: BufWriter<File>,
    /// Current write offset in the log file.
    offset: u64,
}

/// Append-only persisted chain of sealed blocks.
///
/// On-disk format, fixed and versioned:
/// ```text
/// [8 bytes: magic "IDLBLOG\0"]
/// [4 bytes: format version (little-endian u32)]
/// then per block:
/// [4 bytes: frame length (little-endian u32)]
/// [4 bytes: CRC32 of payload (little-endian u32)]
/// [N bytes: payload (bincode-serialized Block)]
/// ```
///
/// Blocks are only ever appended. On recovery the file is read
/// front-to-back; a torn tail frame from a crash is logged and skipped,
/// while a wrong magic or version fails recovery outright.
pub struct BlockLog {
    /// Path to the log file.
    path: PathBuf,
    /// Writer state behind a mutex for thread safety.
    writer: Mutex<LogWriter>,
    /// Configuration.
    config: LogConfig,
}

impl BlockLog {
    /// Open (or create) a block log at the given path.
    ///
    /// A new file gets the versioned header written immediately; an
    /// existing file has its header checked before any appends are
    /// accepted.
    pub fn open(path: &Path, config: LogConfig) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)?;

        let mut offset = file.metadata()?.len();
        if offset == 0 {
            file.write_all(MAGIC)?;
            file.write_all(&FORMAT_VERSION.to_le_bytes())?;
            file.flush()?;
            offset = FILE_HEADER_SIZE;
        } else {
            Self::check_header(&mut file)?;
        }

        Ok(Self {
            path: path.to_path_buf(),
            writer: Mutex::new(LogWriter {
                writer: BufWriter::new(file),
                offset,
            }),
            config,
        })
    }

    /// Append a sealed block. Returns the byte offset of its frame.
    pub fn append(&self, block: &Block) -> StoreResult<u64> {
        let payload =
            bincode::serialize(block).map_err(|e| StoreError::Serialization(e.to_string()))?;
        let length = payload.len() as u32;
        let crc = crc32fast::hash(&payload);

        let mut w = self.writer.lock().expect("log mutex poisoned");
        let frame_offset = w.offset;

        w.writer.write_all(&length.to_le_bytes())?;
        w.writer.write_all(&crc.to_le_bytes())?;
        w.writer.write_all(&payload)?;

        w.writer.flush()?;
        if matches!(self.config.sync_mode, SyncMode::EveryWrite) {
            w.writer.get_ref().sync_all()?;
        }

        w.offset += (FRAME_HEADER_SIZE + payload.len()) as u64;

        debug!(
            offset = frame_offset,
            len = payload.len(),
            block = %block.hash().short_hex(),
            "block log append"
        );
        Ok(frame_offset)
    }

    /// Recover all intact blocks from the log, in append order.
    ///
    /// Reads front-to-back. A frame that is truncated or fails its CRC
    /// check marks the torn tail of a crashed write: recovery warns and
    /// stops there, returning everything before it.
    pub fn recover(&self) -> StoreResult<Vec<Block>> {
        let mut file = BufReader::new(File::open(&self.path)?);
        Self::check_header(file.get_mut())?;
        let file_len = file.get_ref().metadata()?.len();

        let mut blocks = Vec::new();
        let mut offset = FILE_HEADER_SIZE;
        file.seek(SeekFrom::Start(offset))?;

        while offset + FRAME_HEADER_SIZE as u64 <= file_len {
            let mut header = [0u8; FRAME_HEADER_SIZE];
            match file.read_exact(&mut header) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(e.into()),
            }

            let length = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
            let expected_crc = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);

            if length == 0 || offset + (FRAME_HEADER_SIZE as u64) + (length as u64) > file_len {
                warn!(offset, length, file_len, "torn block log frame; stopping recovery");
                break;
            }

            let mut payload = vec![0u8; length as usize];
            match file.read_exact(&mut payload) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                    warn!(offset, "truncated block log frame; stopping recovery");
                    break;
                }
                Err(e) => return Err(e.into()),
            }

            let actual_crc = crc32fast::hash(&payload);
            if actual_crc != expected_crc {
                warn!(
                    offset,
                    expected = expected_crc,
                    actual = actual_crc,
                    "CRC mismatch in block log frame; stopping recovery"
                );
                break;
            }

            let block: Block = bincode::deserialize(&payload)
                .map_err(|e| StoreError::Serialization(e.to_string()))?;
            blocks.push(block);
            offset += (FRAME_HEADER_SIZE + length as usize) as u64;
        }

        debug!(blocks = blocks.len(), path = %self.path.display(), "block log recovered");
        Ok(blocks)
    }

    /// The log file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn check_header(file: &mut File) -> StoreResult<()> {
        file.seek(SeekFrom::Start(0))?;
        let mut magic = [0u8; 8];
        file.read_exact(&mut magic).map_err(|e| {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                StoreError::BadMagic
            } else {
                StoreError::Io(e)
            }
        })?;
        if &magic != MAGIC {
            return Err(StoreError::BadMagic);
        }

        let mut version_bytes = [0u8; 4];
        file.read_exact(&mut version_bytes).map_err(|e| {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                StoreError::BadMagic
            } else {
                StoreError::Io(e)
            }
        })?;
        let version = u32::from_le_bytes(version_bytes);
        if version != FORMAT_VERSION {
            return Err(StoreError::UnsupportedVersion {
                found: version,
                supported: FORMAT_VERSION,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use idl_chain::{IdentityChain, MiningBudget};
    use idl_types::IdentityRecord;

    fn sealed_blocks(count: usize) -> Vec<Block> {
        let mut chain = IdentityChain::new(1).unwrap();
        for i in 0..count {
            chain
                .add_identity(
                    IdentityRecord::new(format!("user-{i}"), "ef".repeat(32)),
                    &MiningBudget::unbounded(),
                )
                .unwrap();
        }
        chain.blocks().to_vec()
    }

    #[test]
    fn fresh_log_recovers_empty() {
        let dir = tempfile::tempdir().unwrap();
        let log = BlockLog::open(&dir.path().join("chain.log"), LogConfig::default()).unwrap();
        assert!(log.recover().unwrap().is_empty());
    }

    #[test]
    fn append_recover_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chain.log");
        let blocks = sealed_blocks(3);

        let log = BlockLog::open(&path, LogConfig::default()).unwrap();
        for block in &blocks {
            log.append(block).unwrap();
        }
        drop(log);

        let reopened = BlockLog::open(&path, LogConfig::default()).unwrap();
        assert_eq!(reopened.recover().unwrap(), blocks);
    }

    #[test]
    fn appends_resume_after_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chain.log");
        let blocks = sealed_blocks(2);

        let log = BlockLog::open(&path, LogConfig::default()).unwrap();
        log.append(&blocks[0]).unwrap();
        log.append(&blocks[1]).unwrap();
        drop(log);

        let log = BlockLog::open(&path, LogConfig::default()).unwrap();
        log.append(&blocks[2]).unwrap();
        assert_eq!(log.recover().unwrap(), blocks);
    }

    #[test]
    fn torn_tail_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chain.log");
        let blocks = sealed_blocks(2);

        let log = BlockLog::open(&path, LogConfig::default()).unwrap();
        for block in &blocks[..2] {
            log.append(block).unwrap();
        }
        drop(log);

        // Simulate a crash mid-append: garbage after the last intact frame.
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(&[0xde, 0xad, 0xbe, 0xef, 0x01, 0x02, 0x03, 0x04, 0x05])
            .unwrap();
        drop(file);

        let log = BlockLog::open(&path, LogConfig::default()).unwrap();
        assert_eq!(log.recover().unwrap(), blocks[..2].to_vec());
    }

    #[test]
    fn corrupted_frame_stops_recovery() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chain.log");
        let blocks = sealed_blocks(2);

        let log = BlockLog::open(&path, LogConfig::default()).unwrap();
        let first_offset = log.append(&blocks[0]).unwrap();
        log.append(&blocks[1]).unwrap();
        drop(log);

        // Flip a payload byte in the first frame.
        let mut contents = fs::read(&path).unwrap();
        let payload_start = first_offset as usize + FRAME_HEADER_SIZE;
        contents[payload_start] ^= 0xff;
        fs::write(&path, &contents).unwrap();

        let log = BlockLog::open(&path, LogConfig::default()).unwrap();
        assert!(log.recover().unwrap().is_empty());
    }

    #[test]
    fn wrong_magic_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chain.log");
        fs::write(&path, b"NOTALOG\0\x01\x00\x00\x00").unwrap();

        assert!(matches!(
            BlockLog::open(&path, LogConfig::default()),
            Err(StoreError::BadMagic)
        ));
    }

    #[test]
    fn unsupported_version_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chain.log");
        let mut contents = Vec::new();
        contents.extend_from_slice(MAGIC);
        contents.extend_from_slice(&99u32.to_le_bytes());
        fs::write(&path, &contents).unwrap();

        assert!(matches!(
            BlockLog::open(&path, LogConfig::default()),
            Err(StoreError::UnsupportedVersion {
                found: 99,
                supported: FORMAT_VERSION
            })
        ));
    }

    #[test]
    fn every_write_sync_mode_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chain.log");
        let blocks = sealed_blocks(1);

        let log = BlockLog::open(
            &path,
            LogConfig {
                sync_mode: SyncMode::EveryWrite,
            },
        )
        .unwrap();
        log.append(&blocks[0]).unwrap();
        log.append(&blocks[1]).unwrap();
        assert_eq!(log.recover().unwrap(), blocks);
    }
}
