use crate::batch::partial_failure;
use crate::command::Command;
use crate::config::RespConfig;
use crate::error::{Error, Result};
use crate::store::SetStore;
use redis_protocol::resp2::{
    decode::decode,
    encode::encode,
    types::{OwnedFrame as Frame, Resp2Frame},
};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;

const INITIAL_BUFFER: usize = 4096;

/// RESP2 client for a Redis-compatible store.
///
/// Clones share one connection; pipelines are serialised so replies are never
/// interleaved between callers.
#[derive(Clone)]
pub struct RespStore {
    conn: Arc<Mutex<Connection>>,
    config: Arc<RespConfig>,
}

struct Connection {
    socket: TcpStream,
    buf: Vec<u8>,
    filled: usize,
    /// Cleared once an exchange fails midway; replies can no longer be matched to requests.
    healthy: bool,
}

async fn with_timeout<T, F>(limit: Option<Duration>, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut).await.map_err(|_| Error::Timeout)?,
        None => fut.await,
    }
}

impl Connection {
    async fn write_commands(&mut self, commands: &[Command]) -> Result<()> {
        let mut out = Vec::new();
        for command in commands {
            let frame = command.to_frame();
            let start = out.len();
            out.resize(start + frame.encode_len(false), 0);
            encode(&mut out[start..], &frame, false).map_err(|e| Error::Protocol(e.to_string()))?;
        }
        self.socket.write_all(&out).await?;
        Ok(())
    }

    async fn read_frame(&mut self) -> Result<Frame> {
        loop {
            if self.filled > 0 {
                let parsed = decode(&self.buf[..self.filled]).map_err(|e| Error::Protocol(e.to_string()))?;
                if let Some((frame, used)) = parsed {
                    // Move any leftover bytes to the front of the buffer
                    self.buf.copy_within(used..self.filled, 0);
                    self.filled -= used;
                    return Ok(frame);
                }
            }
            if self.filled == self.buf.len() {
                let grown = self.buf.len() * 2;
                self.buf.resize(grown, 0);
            }
            let n = self.socket.read(&mut self.buf[self.filled..]).await?;
            if n == 0 {
                return Err(Error::Io(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "connection closed by the store",
                )));
            }
            self.filled += n;
        }
    }
}

impl RespStore {
    pub async fn connect(config: RespConfig) -> Result<Self> {
        let socket = with_timeout(config.connect_timeout, async {
            TcpStream::connect(&config.addr).await.map_err(Error::from)
        })
        .await?;
        socket.set_nodelay(true)?;
        log::debug!("connected to store at {}", config.addr);

        Ok(Self {
            conn: Arc::new(Mutex::new(Connection {
                socket,
                buf: vec![0u8; INITIAL_BUFFER],
                filled: 0,
                healthy: true,
            })),
            config: Arc::new(config),
        })
    }

    pub fn addr(&self) -> &str {
        &self.config.addr
    }
}

impl SetStore for RespStore {
    async fn pipeline(&self, commands: Vec<Command>) -> Result<Vec<Frame>> {
        let io_timeout = self.config.io_timeout;
        let mut conn = self.conn.lock().await;
        if !conn.healthy {
            return Err(Error::Store(format!(
                "connection to {} was interrupted and must be re-established",
                self.config.addr
            )));
        }
        log::debug!("sending pipeline of {} commands to {}", commands.len(), self.config.addr);

        if let Err(e) = with_timeout(io_timeout, conn.write_commands(&commands)).await {
            conn.healthy = false;
            return Err(e);
        }

        let mut replies = Vec::with_capacity(commands.len());
        while replies.len() < commands.len() {
            match with_timeout(io_timeout, conn.read_frame()).await {
                Ok(frame) => replies.push(frame),
                Err(e) => {
                    conn.healthy = false;
                    log::warn!("pipeline to {} interrupted after {} replies: {}", self.config.addr, replies.len(), e);
                    // nothing was acknowledged; the caller sees the transport error as is
                    if replies.is_empty() {
                        return Err(e);
                    }
                    return Err(partial_failure(commands.len(), &replies, replies.len(), e.to_string()));
                }
            }
        }
        Ok(replies)
    }
}
