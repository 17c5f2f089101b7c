use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::channel::{ChannelEvent, LineFramer, SignalingChannel};
use crate::error::RelayError;

/// How long `close` waits for queued lines to reach the stream.
const CLOSE_FLUSH_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stream {
    Output,
    Errors,
}

/// [`SignalingChannel`] over a pair of byte streams, e.g. a remote
/// command's stdout/stdin or this process's own stdio.
pub struct LineChannel {
    outbound: Option<mpsc::UnboundedSender<String>>,
    events_tx: mpsc::UnboundedSender<ChannelEvent>,
    events_rx: mpsc::UnboundedReceiver<ChannelEvent>,
    readers: Vec<JoinHandle<()>>,
    writer: Option<JoinHandle<()>>,
    finished: bool,
}

impl LineChannel {
    pub fn spawn<R, W>(reader: R, writer: W) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (outbound, outbound_rx) = mpsc::unbounded_channel();

        let writer = tokio::spawn(write_lines(writer, outbound_rx, events_tx.clone()));
        let reader = tokio::spawn(read_lines(reader, events_tx.clone(), Stream::Output));

        Self {
            outbound: Some(outbound),
            events_tx,
            events_rx,
            readers: vec![reader],
            writer: Some(writer),
            finished: false,
        }
    }

    /// Also report lines from the remote's error stream.
    pub fn with_stderr<R>(mut self, stderr: R) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let reader = tokio::spawn(read_lines(stderr, self.events_tx.clone(), Stream::Errors));
        self.readers.push(reader);
        self
    }
}

#[async_trait]
impl SignalingChannel for LineChannel {
    fn send(&self, line: &str) -> Result<(), RelayError> {
        let Some(outbound) = &self.outbound else {
            return Err(RelayError::Channel("channel already closed".into()));
        };
        outbound
            .send(line.to_owned())
            .map_err(|_| RelayError::Channel("stream writer stopped".into()))
    }

    async fn recv(&mut self) -> ChannelEvent {
        if self.finished {
            return ChannelEvent::Closed;
        }
        let event = self.events_rx.recv().await.unwrap_or(ChannelEvent::Closed);
        if event.is_terminal() {
            self.finished = true;
        }
        event
    }

    async fn close(&mut self) {
        self.finished = true;
        self.outbound.take();
        for reader in self.readers.drain(..) {
            reader.abort();
        }

        let Some(writer) = self.writer.take() else {
            return;
        };
        let abort = writer.abort_handle();
        if tokio::time::timeout(CLOSE_FLUSH_TIMEOUT, writer).await.is_err() {
            warn!("Signaling writer did not drain in time, aborting");
            abort.abort();
        }
    }
}

impl Drop for LineChannel {
    fn drop(&mut self) {
        for reader in &self.readers {
            reader.abort();
        }
    }
}

async fn read_lines<R>(mut reader: R, events: mpsc::UnboundedSender<ChannelEvent>, stream: Stream)
where
    R: AsyncRead + Unpin,
{
    let mut framer = LineFramer::new();

    loop {
        match reader.read_buf(framer.buffer_mut()).await {
            Ok(0) => {
                if framer.pending() > 0 {
                    debug!(
                        bytes = framer.pending(),
                        "Dropping unterminated line at end of stream"
                    );
                }
                if stream == Stream::Output {
                    let _ = events.send(ChannelEvent::Closed);
                }
                return;
            }
            Ok(_) => {
                while let Some(line) = framer.next_line() {
                    let event = match stream {
                        Stream::Output => ChannelEvent::Line(line),
                        Stream::Errors => ChannelEvent::Stderr(line),
                    };
                    if events.send(event).is_err() {
                        return;
                    }
                }
                if framer.discard_overflow() {
                    warn!(?stream, "Dropped an overlong line from the signaling stream");
                }
            }
            Err(e) => {
                match stream {
                    Stream::Output => {
                        let _ = events.send(ChannelEvent::Error(format!("read failed: {e}")));
                    }
                    Stream::Errors => warn!("Remote error stream failed: {}", e),
                }
                return;
            }
        }
    }
}

async fn write_lines<W>(
    mut writer: W,
    mut outbound: mpsc::UnboundedReceiver<String>,
    events: mpsc::UnboundedSender<ChannelEvent>,
) where
    W: AsyncWrite + Unpin,
{
    while let Some(line) = outbound.recv().await {
        if let Err(e) = write_line(&mut writer, line).await {
            let _ = events.send(ChannelEvent::Error(format!("write failed: {e}")));
            return;
        }
    }
    let _ = writer.shutdown().await;
}

async fn write_line<W>(writer: &mut W, line: String) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut framed = line.into_bytes();
    framed.push(b'\n');
    writer.write_all(&framed).await?;
    writer.flush().await
}
