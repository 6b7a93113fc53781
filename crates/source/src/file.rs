// Copyright 2025-2026 CEMAXECUTER LLC

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam::channel::Sender;

use crate::{ByteSource, SourceError, DEFAULT_CHUNK_SIZE};

/// Reads a regular file or an already-configured serial device node.
pub struct FileSource {
    path: String,
    chunk_size: usize,
    running: Arc<AtomicBool>,
}

impl FileSource {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn set_chunk_size(&mut self, size: usize) {
        self.chunk_size = size.max(1);
    }

    /// One read of up to `chunk_size` bytes. `Ok(None)` at end of input.
    fn read_chunk<R: Read>(reader: &mut R, chunk_size: usize) -> io::Result<Option<Vec<u8>>> {
        let mut buf = vec![0u8; chunk_size];
        loop {
            match reader.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(n) => {
                    buf.truncate(n);
                    return Ok(Some(buf));
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }
}

impl ByteSource for FileSource {
    fn start(&mut self, tx: Sender<Vec<u8>>) -> Result<(), SourceError> {
        let file = File::open(Path::new(&self.path)).map_err(|source| SourceError::Open {
            path: self.path.clone(),
            source,
        })?;
        let mut reader = BufReader::with_capacity(self.chunk_size, file);

        self.running.store(true, Ordering::Relaxed);
        log::info!("reading bytes from {} ({} byte chunks)", self.path, self.chunk_size);

        while self.running.load(Ordering::Relaxed) {
            match Self::read_chunk(&mut reader, self.chunk_size) {
                Ok(Some(chunk)) => {
                    if tx.send(chunk).is_err() {
                        break; // receiver dropped
                    }
                }
                Ok(None) => {
                    log::info!("end of input: {}", self.path);
                    break;
                }
                Err(source) => {
                    return Err(SourceError::Read {
                        path: self.path.clone(),
                        source,
                    });
                }
            }
        }

        Ok(())
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
    }

    fn name(&self) -> &str {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam::channel;
    use std::io::Write;

    fn temp_file(name: &str, contents: &[u8]) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("mw_source_{}_{}", std::process::id(), name));
        let mut f = File::create(&path).unwrap();
        f.write_all(contents).unwrap();
        path
    }

    #[test]
    fn test_chunks_in_order() {
        let data: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
        let path = temp_file("order", &data);

        let mut source = FileSource::new(path.to_string_lossy().to_string());
        source.set_chunk_size(4096);
        let (tx, rx) = channel::unbounded();
        source.start(tx).unwrap();

        let chunks: Vec<Vec<u8>> = rx.iter().collect();
        assert!(chunks.iter().all(|c| !c.is_empty() && c.len() <= 4096));
        assert_eq!(chunks.concat(), data);

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_missing_file() {
        let mut source = FileSource::new("/nonexistent/mw_source_input.bin");
        let (tx, _rx) = channel::unbounded();
        assert!(matches!(source.start(tx), Err(SourceError::Open { .. })));
    }

    #[test]
    fn test_receiver_dropped() {
        let path = temp_file("dropped", &[1u8; 1000]);
        let mut source = FileSource::new(path.to_string_lossy().to_string());
        source.set_chunk_size(10);
        let (tx, rx) = channel::bounded(1);
        drop(rx);
        assert!(source.start(tx).is_ok());
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_read_chunk_eof() {
        let mut empty: &[u8] = &[];
        assert!(FileSource::read_chunk(&mut empty, 16).unwrap().is_none());
        let mut some: &[u8] = &[1, 2, 3];
        assert_eq!(FileSource::read_chunk(&mut some, 2).unwrap(), Some(vec![1, 2]));
    }
}
