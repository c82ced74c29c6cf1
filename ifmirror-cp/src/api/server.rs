//! Unix-socket transport for the binary API.
//!
//! Frames are a u32 big-endian length followed by the message bytes. One
//! mutex over the service keeps request handling strictly sequential
//! across connections; a request's replies are written back on the
//! connection it arrived on, in order.

use super::service::ApiService;
use std::future::Future;
use std::io;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Largest frame an agent may send. Every defined request fits well below
/// this.
const MAX_FRAME: u32 = 4096;

pub struct ApiServer {
    listener: UnixListener,
    service: Arc<Mutex<ApiService>>,
}

impl ApiServer {
    pub fn bind(path: &Path, service: ApiService) -> io::Result<Self> {
        // Stale socket from a previous run.
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        let listener = UnixListener::bind(path)?;
        info!(socket = %path.display(), "control socket bound");
        Ok(ApiServer {
            listener,
            service: Arc::new(Mutex::new(service)),
        })
    }

    /// Accept loop; runs until `shutdown` resolves.
    pub async fn serve(self, shutdown: impl Future<Output = ()>) -> io::Result<()> {
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("control server stopping");
                    return Ok(());
                }
                accepted = self.listener.accept() => {
                    let (stream, _addr) = accepted?;
                    let service = Arc::clone(&self.service);
                    tokio::spawn(async move {
                        if let Err(e) = handle_conn(stream, service).await {
                            warn!(error = %e, "control connection closed with error");
                        }
                    });
                }
            }
        }
    }
}

async fn handle_conn(mut stream: UnixStream, service: Arc<Mutex<ApiService>>) -> io::Result<()> {
    debug!("control agent connected");
    loop {
        let mut len_buf = [0u8; 4];
        match stream.read_exact(&mut len_buf).await {
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                debug!("control agent disconnected");
                return Ok(());
            }
            Err(e) => return Err(e),
        }

        let len = u32::from_be_bytes(len_buf);
        if len > MAX_FRAME {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("frame of {len} bytes exceeds limit"),
            ));
        }
        let mut frame = vec![0u8; len as usize];
        stream.read_exact(&mut frame).await?;

        let replies = {
            let mut service = service.lock().await;
            service.handle(&frame)
        };
        for reply in replies {
            stream.write_u32(reply.len() as u32).await?;
            stream.write_all(&reply).await?;
        }
        stream.flush().await?;
    }
}
