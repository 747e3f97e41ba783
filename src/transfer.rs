//! Accumulation state for one chunked upload.
//!
//! A [`TransferSession`] is owned by a single handler invocation. It collects
//! payloads as they arrive, reports cumulative progress against the total
//! declared in the start message, and persists everything with a single write
//! once the update stream is exhausted.

use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::protocol::{Transfer, TransferError, TransferProgress};

#[derive(Debug)]
pub struct TransferSession {
    path: PathBuf,
    file_name: String,
    declared_total: u64,
    buf: Vec<u8>,
}

impl TransferSession {
    /// Validates the start message and sets up an empty accumulation buffer.
    ///
    /// The file name must be a single normal path component. The target path
    /// is always resolved inside `out_dir`.
    pub fn new(out_dir: &Path, req: &Transfer) -> Result<Self, TransferError> {
        if !is_bare_file_name(&req.file_name) {
            return Err(TransferError::InvalidFileName {
                name: req.file_name.clone(),
            });
        }
        Ok(Self {
            path: out_dir.join(&req.file_name),
            file_name: req.file_name.clone(),
            declared_total: req.total_size,
            buf: Vec::new(),
        })
    }

    /// Appends one payload and returns the cumulative progress.
    ///
    /// A declared total of zero reports 0.0 percent rather than dividing by
    /// zero.
    pub fn push(&mut self, payload: &[u8]) -> TransferProgress {
        self.buf.extend_from_slice(payload);
        let received = self.buf.len() as u64;
        debug!(file = %self.file_name, received, total = self.declared_total, "chunk received");
        let percent = if self.declared_total == 0 {
            0.0
        } else {
            received as f32 / self.declared_total as f32 * 100.0
        };
        TransferProgress(percent)
    }

    /// Writes the accumulated bytes to the target path in one go.
    ///
    /// Returns the number of bytes written. An empty session still creates
    /// an empty file.
    pub async fn finish(self) -> Result<u64, TransferError> {
        let len = self.buf.len() as u64;
        tokio::fs::write(&self.path, &self.buf)
            .await
            .map_err(|err| TransferError::Write {
                name: self.file_name.clone(),
                reason: err.to_string(),
            })?;
        debug!(file = %self.file_name, bytes = len, "transfer persisted");
        Ok(len)
    }
}

/// A name is usable if it is exactly one normal path component, which rules
/// out empty names, absolute paths, separators and `..`.
///
/// The component has to spell the whole input. `Path::components` normalizes
/// trailing separators and interior `.` away, so `"dir/"` and `"name/."`
/// also parse as a single component and must be caught here.
fn is_bare_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(c)), None) if c == name
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(total: u64) -> TransferSession {
        TransferSession::new(
            Path::new("/nonexistent"),
            &Transfer {
                file_name: "out.bin".into(),
                total_size: total,
            },
        )
        .unwrap()
    }

    #[test]
    fn progress_is_cumulative() {
        let lengths = [3usize, 1, 4, 1, 5, 9, 2, 6];
        let total: usize = lengths.iter().sum();
        let mut session = session(total as u64);
        let mut received = 0usize;
        for len in lengths {
            received += len;
            let TransferProgress(percent) = session.push(&vec![0u8; len]);
            assert_eq!(percent, received as f32 / total as f32 * 100.0);
        }
        let TransferProgress(last) = session.push(&[]);
        assert_eq!(last, 100.0);
    }

    #[test]
    fn zero_total_reports_zero_percent() {
        let mut session = session(0);
        let TransferProgress(percent) = session.push(b"data");
        assert_eq!(percent, 0.0);
    }

    #[test]
    fn rejects_non_bare_names() {
        for name in ["", "a/b", "/etc/passwd", "..", "../up", "dir/", "name/.", "./name"] {
            let res = TransferSession::new(
                Path::new("."),
                &Transfer {
                    file_name: name.into(),
                    total_size: 1,
                },
            );
            assert!(
                matches!(res, Err(TransferError::InvalidFileName { .. })),
                "accepted {name:?}"
            );
        }
        assert!(is_bare_file_name("plain-name.txt"));
    }

    #[tokio::test]
    async fn finish_writes_concatenation() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let mut session = TransferSession::new(
            dir.path(),
            &Transfer {
                file_name: "hello.txt".into(),
                total_size: 5,
            },
        )?;
        session.push(b"He");
        session.push(b"llo");
        assert_eq!(session.finish().await?, 5);
        assert_eq!(tokio::fs::read(dir.path().join("hello.txt")).await?, b"Hello");
        Ok(())
    }

    #[tokio::test]
    async fn finish_reports_write_errors() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let session = TransferSession::new(
            &dir.path().join("missing-subdir"),
            &Transfer {
                file_name: "out.bin".into(),
                total_size: 0,
            },
        )?;
        let err = session.finish().await.unwrap_err();
        assert!(matches!(err, TransferError::Write { .. }));
        Ok(())
    }
}
