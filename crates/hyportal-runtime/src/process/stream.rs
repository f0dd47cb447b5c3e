//! Async chunk readers for child process pipes.
//!
//! Output is forwarded chunk by chunk rather than line by line so prompts
//! without a trailing newline still reach the terminal. Multi-byte UTF-8
//! sequences split across reads are carried over to the next chunk; truly
//! invalid bytes are decoded lossily so a stray byte never ends the reader.

use hyportal_core::OutputStream;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

const READ_BUFFER: usize = 8 * 1024;

/// A decoded piece of output from one pipe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputChunk {
    pub stream: OutputStream,
    pub text: String,
}

/// Incremental UTF-8 decoder that holds back incomplete trailing sequences.
#[derive(Debug, Default)]
pub struct Utf8ChunkDecoder {
    pending: Vec<u8>,
}

impl Utf8ChunkDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode `bytes` together with anything held back from the last call.
    pub fn decode(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);
        let complete = match std::str::from_utf8(&self.pending) {
            Ok(_) => self.pending.len(),
            // `error_len() == None` means the input ended mid-sequence
            Err(e) if e.error_len().is_none() => e.valid_up_to(),
            Err(_) => self.pending.len(),
        };
        let rest = self.pending.split_off(complete);
        let text = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending = rest;
        text
    }

    /// Flush whatever is still held back.
    pub fn finish(&mut self) -> String {
        let text = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        text
    }
}

/// Read `reader` until EOF, sending each decoded chunk to `tx`.
///
/// Chunks from one pipe arrive in read order. Sharing one `tx` between the
/// stdout and stderr readers gives a single arrival-ordered stream.
pub fn spawn_chunk_reader<R>(
    mut reader: R,
    stream: OutputStream,
    tx: mpsc::UnboundedSender<OutputChunk>,
) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut decoder = Utf8ChunkDecoder::new();
        let mut buf = vec![0u8; READ_BUFFER];

        loop {
            match reader.read(&mut buf).await {
                Ok(0) => break, // EOF
                Ok(n) => {
                    let text = decoder.decode(&buf[..n]);
                    if !text.is_empty() && tx.send(OutputChunk { stream, text }).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    debug!(stream = stream.as_str(), error = %e, "output reader exiting due to read error");
                    break;
                }
            }
        }

        let tail = decoder.finish();
        if !tail.is_empty() {
            let _ = tx.send(OutputChunk { stream, text: tail });
        }
        debug!(stream = stream.as_str(), "output reader task exiting");
    })
}
