//! Streaming multipart uploads.
//!
//! A producer thread encodes the multipart body into a bounded in-memory pipe while a second
//! thread runs the HTTP request that drains it, so files are never buffered whole. The caller
//! sees cumulative byte counts as they are produced and then exactly one completion result.

use std::fs::File;
use std::io::{self, Read, Write};
use std::sync::mpsc::{self, Receiver, Sender, SyncSender};
use std::thread::{self, JoinHandle};

use tracing::debug;

use super::*;

const PIPE_CHUNK: usize = 64 * 1024;
const PIPE_DEPTH: usize = 8;

/// An upload in flight.
pub struct UploadHandle {
    total: u64,
    progress: Receiver<u64>,
    done: Receiver<Result<()>>,
}

impl UploadHandle {
    /// A handle whose events have already happened.
    pub fn finished(total: u64, progress: Vec<u64>, result: Result<()>) -> Self {
        let (progress_tx, progress_rx) = mpsc::channel();
        for p in progress {
            let _ = progress_tx.send(p);
        }
        let (done_tx, done_rx) = mpsc::channel();
        let _ = done_tx.send(result);
        Self {
            total,
            progress: progress_rx,
            done: done_rx,
        }
    }

    /// Sum of the source file sizes at the time the upload started.
    pub fn total_bytes(&self) -> u64 {
        self.total
    }

    /// Cumulative bytes streamed so far; ends once the whole body has been produced.
    pub fn progress(&self) -> mpsc::Iter<'_, u64> {
        self.progress.iter()
    }

    /// Blocks until the remote has answered.
    pub fn wait(self) -> Result<()> {
        match self.done.recv() {
            Ok(result) => result,
            Err(_) => Err(anyhow::anyhow!("upload worker exited without a result")),
        }
    }
}

impl RemoteClient {
    pub(super) fn upload_simple(
        &self,
        path: &str,
        query: &[(&str, &str)],
        metadata: Option<&serde_json::Value>,
        sources: Vec<UploadSource>,
    ) -> Result<UploadHandle> {
        let total = total_size(&sources)?;
        let metadata = metadata
            .map(serde_json::to_vec)
            .transpose()
            .context("serialize upload metadata")?;
        let boundary = multipart_boundary()?;
        let content_type = format!("multipart/form-data; boundary={}", boundary);
        debug!(path, files = sources.len(), total, "upload start");

        let (writer, reader) = pipe();
        let (progress_tx, progress_rx) = mpsc::channel();
        let (done_tx, done_rx) = mpsc::channel();

        let producer = thread::Builder::new()
            .name("treeport-multipart".to_string())
            .spawn(move || produce(writer, &boundary, metadata.as_deref(), &sources, progress_tx))
            .context("spawn multipart producer")?;

        let mut request = self
            .client
            .post(self.url(path))
            .header(reqwest::header::AUTHORIZATION, self.auth())
            .header(reqwest::header::CONTENT_TYPE, content_type);
        if !query.is_empty() {
            request = request.query(query);
        }
        let request = request.body(reqwest::blocking::Body::new(reader));

        let label = format!("upload to {}", path);
        thread::Builder::new()
            .name("treeport-upload".to_string())
            .spawn(move || {
                let result = finish_upload(request.send(), producer, &label);
                let _ = done_tx.send(result);
            })
            .context("spawn upload worker")?;

        Ok(UploadHandle {
            total,
            progress: progress_rx,
            done: done_rx,
        })
    }
}

fn finish_upload(
    sent: reqwest::Result<reqwest::blocking::Response>,
    producer: JoinHandle<Result<()>>,
    label: &str,
) -> Result<()> {
    match sent {
        Ok(resp) => {
            // A success status means the body was consumed, so the producer is done or about to be.
            check_response(resp, label)?;
            join_producer(producer)
        }
        Err(err) => {
            // A failed read on our side surfaces as a send error; report the root cause instead.
            if producer.is_finished()
                && let Err(produce_err) = join_producer(producer)
            {
                return Err(produce_err);
            }
            Err(anyhow::Error::new(err).context(format!("{} request", label)))
        }
    }
}

fn join_producer(producer: JoinHandle<Result<()>>) -> Result<()> {
    producer
        .join()
        .unwrap_or_else(|_| Err(anyhow::anyhow!("multipart producer panicked")))
}

fn produce(
    mut writer: PipeWriter,
    boundary: &str,
    metadata: Option<&[u8]>,
    sources: &[UploadSource],
    progress: Sender<u64>,
) -> Result<()> {
    match write_multipart(&mut writer, boundary, metadata, sources, &progress) {
        Ok(()) => writer.finish().context("close upload stream"),
        Err(err) => {
            writer.fail(&err);
            Err(err)
        }
    }
}

pub(super) fn write_multipart(
    w: &mut impl Write,
    boundary: &str,
    metadata: Option<&[u8]>,
    sources: &[UploadSource],
    progress: &Sender<u64>,
) -> Result<()> {
    if let Some(metadata) = metadata {
        write!(
            w,
            "--{}\r\nContent-Disposition: form-data; name=\"metadata\"\r\nContent-Type: application/json\r\n\r\n",
            boundary
        )?;
        w.write_all(metadata)?;
        w.write_all(b"\r\n")?;
    }

    let mut sent = 0u64;
    let mut buf = vec![0u8; PIPE_CHUNK];
    for src in sources {
        write!(
            w,
            "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
            boundary,
            escape_filename(&src.name)
        )?;
        let mut f =
            File::open(&src.path).with_context(|| format!("open {}", src.path.display()))?;
        loop {
            let n = f
                .read(&mut buf)
                .with_context(|| format!("read {}", src.path.display()))?;
            if n == 0 {
                break;
            }
            w.write_all(&buf[..n]).context("write upload stream")?;
            sent += n as u64;
            let _ = progress.send(sent);
        }
        w.write_all(b"\r\n")?;
    }
    write!(w, "--{}--\r\n", boundary)?;
    Ok(())
}

fn escape_filename(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '\r' && *c != '\n')
        .map(|c| if c == '"' { '\'' } else { c })
        .collect()
}

fn total_size(sources: &[UploadSource]) -> Result<u64> {
    let mut total = 0;
    for src in sources {
        let meta = std::fs::metadata(&src.path)
            .with_context(|| format!("stat {}", src.path.display()))?;
        total += meta.len();
    }
    Ok(total)
}

fn multipart_boundary() -> Result<String> {
    let mut bytes = [0u8; 16];
    getrandom::getrandom(&mut bytes).map_err(|e| anyhow::anyhow!("getrandom: {:?}", e))?;
    let mut out = String::from("treeport-");
    for b in &bytes {
        out.push_str(&format!("{:02x}", b));
    }
    Ok(out)
}

pub(super) fn pipe() -> (PipeWriter, PipeReader) {
    let (tx, rx) = mpsc::sync_channel(PIPE_DEPTH);
    (
        PipeWriter {
            tx,
            buf: Vec::with_capacity(PIPE_CHUNK),
        },
        PipeReader {
            rx,
            chunk: Vec::new(),
            pos: 0,
        },
    )
}

/// Write half of the in-memory pipe. Blocks once `PIPE_DEPTH` chunks are waiting.
pub(super) struct PipeWriter {
    tx: SyncSender<io::Result<Vec<u8>>>,
    buf: Vec<u8>,
}

impl PipeWriter {
    fn send_buf(&mut self) -> io::Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        let chunk = std::mem::replace(&mut self.buf, Vec::with_capacity(PIPE_CHUNK));
        self.tx
            .send(Ok(chunk))
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "upload stream closed"))
    }

    pub(super) fn finish(mut self) -> io::Result<()> {
        self.send_buf()
    }

    /// Makes the reader fail with `err` instead of seeing a clean end of stream.
    pub(super) fn fail(self, err: &anyhow::Error) {
        let _ = self.tx.send(Err(io::Error::other(format!("{:#}", err))));
    }
}

impl Write for PipeWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        if self.buf.len() >= PIPE_CHUNK {
            self.send_buf()?;
        }
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.send_buf()
    }
}

pub(super) struct PipeReader {
    rx: Receiver<io::Result<Vec<u8>>>,
    chunk: Vec<u8>,
    pos: usize,
}

impl Read for PipeReader {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        if out.is_empty() {
            return Ok(0);
        }
        while self.pos >= self.chunk.len() {
            match self.rx.recv() {
                Ok(Ok(chunk)) => {
                    self.chunk = chunk;
                    self.pos = 0;
                }
                Ok(Err(err)) => return Err(err),
                Err(_) => return Ok(0),
            }
        }
        let n = out.len().min(self.chunk.len() - self.pos);
        out[..n].copy_from_slice(&self.chunk[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

#[cfg(test)]
#[path = "../tests/remote/upload_tests.rs"]
mod tests;
