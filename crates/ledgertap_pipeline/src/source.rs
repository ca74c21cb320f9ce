//! Incremental transcript reading.
//!
//! A source is an append-only log file consumed through a byte cursor: seek
//! to the stored offset, read to end, hand the new content off. The caller
//! persists the advanced offset only after the derived events were applied,
//! so a crash in between replays instead of losing data.
//!
//! Exports land in whatever encoding the chat client felt like that day;
//! decoding tries UTF-8 first, then EUC-KR (CP949), and a file neither can
//! decode is a skip for this cycle, not a crash.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors from reading one source. Both variants are source-level: the
/// orchestrator skips the source for the cycle and moves on.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No decoding strategy accepted {}", path.display())]
    Decode { path: PathBuf },
}

/// New content read past the cursor.
#[derive(Debug, Clone)]
pub struct NewContent {
    pub text: String,
    /// Post-read position; persist this only after applying the content.
    pub new_offset: u64,
    /// Offset the read actually started from (0 after a truncation reset).
    pub resumed_from: u64,
    /// Which strategy decoded the bytes.
    pub encoding: &'static str,
}

/// Read everything past `offset`. Returns `Ok(None)` when the file is
/// missing or has nothing new. A file smaller than the stored offset was
/// rotated or truncated: the read restarts from 0 and returns the full
/// current content.
pub fn read_new(path: &Path, offset: u64) -> Result<Option<NewContent>, SourceError> {
    if !path.exists() {
        debug!(path = %path.display(), "Source file missing");
        return Ok(None);
    }

    let size = std::fs::metadata(path)?.len();
    let start = if size < offset {
        warn!(
            path = %path.display(),
            stored = offset,
            size,
            "Source shrank below stored offset; rereading from start"
        );
        0
    } else {
        offset
    };

    if size == start {
        return Ok(None);
    }

    let mut file = File::open(path)?;
    file.seek(SeekFrom::Start(start))?;
    let mut bytes = Vec::with_capacity((size - start) as usize);
    file.read_to_end(&mut bytes)?;

    let (text, encoding) = decode(&bytes).ok_or_else(|| SourceError::Decode {
        path: path.to_path_buf(),
    })?;

    Ok(Some(NewContent {
        text,
        new_offset: start + bytes.len() as u64,
        resumed_from: start,
        encoding,
    }))
}

/// Try decoding strategies in order, accepting the first that decodes
/// without error.
fn decode(bytes: &[u8]) -> Option<(String, &'static str)> {
    if let Ok(text) = std::str::from_utf8(bytes) {
        return Some((text.to_string(), "utf-8"));
    }

    let (text, _, had_errors) = encoding_rs::EUC_KR.decode(bytes);
    if !had_errors {
        return Some((text.into_owned(), "euc-kr"));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, bytes: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn missing_file_is_none() {
        let dir = TempDir::new().unwrap();
        let result = read_new(&dir.path().join("absent.txt"), 0).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn sequential_reads_advance_monotonically() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "room.txt", "첫 조각\n".as_bytes());

        let first = read_new(&path, 0).unwrap().unwrap();
        assert_eq!(first.text, "첫 조각\n");
        assert_eq!(first.resumed_from, 0);

        // Nothing new yet.
        assert!(read_new(&path, first.new_offset).unwrap().is_none());

        let mut file = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all("둘째 조각\n".as_bytes()).unwrap();
        drop(file);

        let second = read_new(&path, first.new_offset).unwrap().unwrap();
        assert_eq!(second.text, "둘째 조각\n");
        assert!(second.new_offset > first.new_offset);
    }

    #[test]
    fn truncation_resets_to_full_reread() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "room.txt", "아주 긴 원래 내용입니다\n".as_bytes());
        let first = read_new(&path, 0).unwrap().unwrap();

        // Rotate: the file is replaced with something shorter.
        std::fs::write(&path, "새 파일\n".as_bytes()).unwrap();

        let second = read_new(&path, first.new_offset).unwrap().unwrap();
        assert_eq!(second.resumed_from, 0);
        assert_eq!(second.text, "새 파일\n");
    }

    #[test]
    fn euc_kr_fallback_decodes() {
        let dir = TempDir::new().unwrap();
        let (encoded, _, _) = encoding_rs::EUC_KR.encode("입금 확인했습니다\n");
        let path = write_file(&dir, "legacy.txt", &encoded);

        let content = read_new(&path, 0).unwrap().unwrap();
        assert_eq!(content.encoding, "euc-kr");
        assert_eq!(content.text, "입금 확인했습니다\n");
    }

    #[test]
    fn undecodable_bytes_are_a_decode_error() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "garbage.bin", &[0xff, 0xfe, 0xff, 0x00, 0xff]);

        match read_new(&path, 0) {
            Err(SourceError::Decode { .. }) => {}
            other => panic!("expected decode error, got {other:?}"),
        }
    }

    #[test]
    fn offset_mid_file_returns_only_the_tail() {
        let dir = TempDir::new().unwrap();
        let head = "head\n";
        let tail = "tail line\n";
        let path = write_file(&dir, "room.txt", format!("{head}{tail}").as_bytes());

        let content = read_new(&path, head.len() as u64).unwrap().unwrap();
        assert_eq!(content.text, tail);
    }
}
