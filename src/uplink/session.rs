//! # Uplink Session
//!
//! Owns one file for the duration of one transfer and paces its chunks onto
//! the link.

use std::fs;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::{plan_uplink, UplinkChunk};
use crate::command::encode_command;
use crate::error::{GroundStationError, Result};
use crate::link::checksum::xor_checksum;
use crate::link::protocol::LinkProfile;
use crate::task::{emit_frame, emit_note, pace, TaskEvent, TransferOutcome};

/// A single file transfer
#[derive(Debug)]
pub struct UplinkSession {
    source: PathBuf,
    blob: Vec<u8>,
}

impl UplinkSession {
    /// Read the whole source file up front
    ///
    /// # Errors
    ///
    /// Returns `File` if the file cannot be read; nothing is sent in that case
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let blob = fs::read(path).map_err(|source| GroundStationError::File {
            path: path.to_path_buf(),
            source,
        })?;

        info!("Loaded {} for uplink ({} bytes)", path.display(), blob.len());
        Ok(Self::from_bytes(path, blob))
    }

    /// Build a session from in-memory data
    pub fn from_bytes(source: impl Into<PathBuf>, blob: Vec<u8>) -> Self {
        Self {
            source: source.into(),
            blob,
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Chunk plan for this file
    pub fn plan(&self) -> Vec<UplinkChunk> {
        plan_uplink(&self.blob)
    }

    /// Send every chunk, waiting `pacing` after each one
    ///
    /// # Arguments
    ///
    /// * `profile` - Wire variant used to frame each chunk
    /// * `pacing` - Delay after each chunk
    /// * `events` - Channel to the station loop
    /// * `cancel` - Stops the transfer before its next chunk
    ///
    /// # Errors
    ///
    /// Returns `LinkClosed` if the station stops accepting frames
    pub async fn run(
        self,
        profile: LinkProfile,
        pacing: Duration,
        events: mpsc::Sender<TaskEvent>,
        cancel: CancellationToken,
    ) -> Result<TransferOutcome> {
        if self.blob.is_empty() {
            emit_note(&events, format!("File {} is empty.", self.source.display())).await?;
            return Ok(TransferOutcome::Empty);
        }

        let chunks = self.plan();
        let total = chunks.len();
        info!(
            "Uplinking {} ({} bytes, {} chunks, checksum 0x{:02X})",
            self.source.display(),
            self.blob.len(),
            total,
            xor_checksum(&self.blob)
        );

        for (i, chunk) in chunks.iter().enumerate() {
            if cancel.is_cancelled() {
                return Ok(TransferOutcome::Cancelled { sent: i, total });
            }

            let frame = encode_command(&chunk.command(), profile)?;
            let note = format!("Sent packet {}/{} ({} bytes)", i + 1, total, chunk.data.len());
            debug!("{} [{}]", note, chunk.opcode);
            emit_frame(&events, frame, note).await?;

            if !pace(pacing, &cancel).await && i + 1 < total {
                return Ok(TransferOutcome::Cancelled { sent: i + 1, total });
            }
        }

        Ok(TransferOutcome::Completed { sent: total })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::decoder::decode_frame;
    use crate::link::protocol::FrameResult;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const PACING: Duration = Duration::from_millis(1);

    fn collect_frames(rx: &mut mpsc::Receiver<TaskEvent>) -> Vec<(Vec<u8>, String)> {
        let mut frames = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let TaskEvent::Frame { bytes, note } = event {
                frames.push((bytes, note));
            }
        }
        frames
    }

    #[test]
    fn test_load_missing_file() {
        let result = UplinkSession::load("/nonexistent/dir/binary.bin");
        match result {
            Err(GroundStationError::File { path, .. }) => {
                assert_eq!(path, PathBuf::from("/nonexistent/dir/binary.bin"));
            }
            other => panic!("Expected File error, got: {:?}", other),
        }
    }

    #[test]
    fn test_load_reads_whole_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&[7u8; 130]).unwrap();
        file.flush().unwrap();

        let session = UplinkSession::load(file.path()).unwrap();
        assert_eq!(session.source(), file.path());
        assert_eq!(session.plan().len(), 3);
    }

    #[tokio::test]
    async fn test_run_sends_every_chunk_in_order() {
        let mut data: Vec<u8> = (0..=255).collect();
        data.extend_from_slice(&[67, 67, 68]);
        let session = UplinkSession::from_bytes("binary.bin", data);

        let (tx, mut rx) = mpsc::channel(16);
        let outcome = session
            .run(LinkProfile::Canonical, PACING, tx, CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(outcome, TransferOutcome::Completed { sent: 5 });

        let frames = collect_frames(&mut rx);
        assert_eq!(frames.len(), 5);
        assert_eq!(frames[0].1, "Sent packet 1/5 (64 bytes)");
        assert_eq!(frames[4].1, "Sent packet 5/5 (4 bytes)");

        let opcodes: Vec<u8> = frames
            .iter()
            .map(|(bytes, _)| match decode_frame(bytes, LinkProfile::Canonical) {
                FrameResult::Frame(frame) => frame.payload[0],
                other => panic!("Expected frame, got: {:?}", other),
            })
            .collect();
        assert_eq!(opcodes, vec![0x05, 0x06, 0x06, 0x06, 0x07]);

        // Last frame: opcode, 3 data bytes, whole-file checksum (68)
        let last = &frames[4].0;
        assert_eq!(&last[2..7], &[0x07, 67, 67, 68, 68]);
    }

    #[tokio::test]
    async fn test_run_empty_file_sends_nothing() {
        let session = UplinkSession::from_bytes("empty.bin", Vec::new());

        let (tx, mut rx) = mpsc::channel(4);
        let outcome = session
            .run(LinkProfile::Canonical, PACING, tx, CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(outcome, TransferOutcome::Empty);

        assert!(collect_frames(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn test_run_cancelled_before_start() {
        let session = UplinkSession::from_bytes("binary.bin", vec![1u8; 200]);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let (tx, mut rx) = mpsc::channel(8);
        let outcome = session.run(LinkProfile::Canonical, PACING, tx, cancel).await.unwrap();
        assert_eq!(outcome, TransferOutcome::Cancelled { sent: 0, total: 4 });
        assert!(collect_frames(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn test_run_cancelled_mid_transfer() {
        let session = UplinkSession::from_bytes("binary.bin", vec![1u8; 640]);
        let cancel = CancellationToken::new();

        let (tx, mut rx) = mpsc::channel(16);
        let handle = tokio::spawn(session.run(
            LinkProfile::Canonical,
            Duration::from_secs(60),
            tx,
            cancel.clone(),
        ));

        // First chunk goes out immediately, then the task waits on pacing
        match rx.recv().await.unwrap() {
            TaskEvent::Frame { note, .. } => assert_eq!(note, "Sent packet 1/10 (64 bytes)"),
            other => panic!("Expected frame, got: {:?}", other),
        }
        cancel.cancel();

        let outcome = handle.await.unwrap().unwrap();
        assert_eq!(outcome, TransferOutcome::Cancelled { sent: 1, total: 10 });
    }

    #[tokio::test]
    async fn test_run_station_gone() {
        let session = UplinkSession::from_bytes("binary.bin", vec![1u8; 10]);
        let (tx, rx) = mpsc::channel(1);
        drop(rx);

        let result = session.run(LinkProfile::Canonical, PACING, tx, CancellationToken::new()).await;
        assert!(matches!(result, Err(GroundStationError::LinkClosed)));
    }
}
