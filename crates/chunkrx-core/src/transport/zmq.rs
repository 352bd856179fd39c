//! ZeroMQ PULL/PUSH adapters.
//!
//! The `zeromq` crate is async; each adapter owns a small tokio runtime and
//! blocks on it, so callers see a plain synchronous API. Sockets are closed
//! when the adapter is dropped, on success and on error paths alike.

use futures::StreamExt;
use std::time::Duration;
use tokio::runtime::Runtime;
use zeromq::{PullSocket, PushSocket, Socket, SocketEvent, SocketRecv, SocketSend, ZmqMessage};

use super::{FrameSet, FrameSink, FrameSource};
use crate::error::TransportError;

fn runtime() -> Result<Runtime, TransportError> {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .thread_name("chunkrx-zmq")
        .enable_all()
        .build()
        .map_err(TransportError::Runtime)
}

/// Receiving end: PULL socket connected to the sender's bound address.
pub struct ZmqPull {
    socket: Option<PullSocket>,
    endpoint: String,
    timeout: Option<Duration>,
    runtime: Runtime,
}

impl ZmqPull {
    /// Connect to `endpoint` (e.g. `tcp://127.0.0.1:5555`).
    ///
    /// Blocks until a sender is listening there.
    pub fn connect(endpoint: &str) -> Result<Self, TransportError> {
        Self::connect_within(endpoint, None)
    }

    /// Like [`ZmqPull::connect`], but gives up with `Timeout` if no sender is
    /// listening within `limit` (None = wait forever).
    pub fn connect_within(endpoint: &str, limit: Option<Duration>) -> Result<Self, TransportError> {
        let runtime = runtime()?;
        let mut socket = PullSocket::new();
        let connected = runtime.block_on(async {
            let connect = socket.connect(endpoint);
            match limit {
                Some(limit) => match tokio::time::timeout(limit, connect).await {
                    Ok(done) => done.map_err(Some),
                    Err(_) => Err(None),
                },
                None => connect.await.map_err(Some),
            }
        });
        match connected {
            Ok(()) => {}
            Err(Some(source)) => {
                return Err(TransportError::Connect {
                    endpoint: endpoint.to_string(),
                    source,
                })
            }
            Err(None) => {
                let limit = limit.unwrap_or_default();
                tracing::debug!(endpoint, ?limit, "no sender listening");
                return Err(TransportError::Timeout(limit));
            }
        }
        tracing::debug!(endpoint, "pull socket connected");
        Ok(Self {
            socket: Some(socket),
            endpoint: endpoint.to_string(),
            timeout: None,
            runtime,
        })
    }

    /// Bound each `receive` by `timeout` (None = wait forever).
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl FrameSource for ZmqPull {
    fn receive(&mut self) -> Result<FrameSet, TransportError> {
        let socket = self.socket.as_mut().ok_or(TransportError::Closed)?;
        let timeout = self.timeout;
        let message = self.runtime.block_on(async {
            match timeout {
                Some(limit) => match tokio::time::timeout(limit, socket.recv()).await {
                    Ok(received) => received.map_err(TransportError::Recv),
                    Err(_) => Err(TransportError::Timeout(limit)),
                },
                None => socket.recv().await.map_err(TransportError::Recv),
            }
        })?;
        Ok(FrameSet::from(message.into_vec()))
    }
}

impl Drop for ZmqPull {
    fn drop(&mut self) {
        if let Some(socket) = self.socket.take() {
            for err in self.runtime.block_on(socket.close()) {
                tracing::debug!(endpoint = %self.endpoint, "pull socket close: {}", err);
            }
        }
    }
}

/// Sending end: PUSH socket bound to a local address.
pub struct ZmqPush {
    socket: Option<PushSocket>,
    monitor: futures::channel::mpsc::Receiver<SocketEvent>,
    endpoint: String,
    peer_wait: Option<Duration>,
    has_peer: bool,
    runtime: Runtime,
}

impl ZmqPush {
    /// Bind to `endpoint`. A port of 0 picks a free port; see [`ZmqPush::endpoint`].
    pub fn bind(endpoint: &str) -> Result<Self, TransportError> {
        let runtime = runtime()?;
        let mut socket = PushSocket::new();
        let monitor = socket.monitor();
        let bound = runtime
            .block_on(socket.bind(endpoint))
            .map_err(|source| TransportError::Bind {
                endpoint: endpoint.to_string(),
                source,
            })?;
        let endpoint = bound.to_string();
        tracing::debug!(endpoint = %endpoint, "push socket bound");
        Ok(Self {
            socket: Some(socket),
            monitor,
            endpoint,
            peer_wait: None,
            has_peer: false,
            runtime,
        })
    }

    /// Give up if no receiver connects within `wait` (None = wait forever).
    pub fn with_peer_wait(mut self, wait: Option<Duration>) -> Self {
        self.peer_wait = wait;
        self
    }

    /// The address actually bound, with any wildcard port resolved.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Block until a receiver has connected. PUSH has nowhere to deliver before that.
    pub fn wait_for_peer(&mut self) -> Result<(), TransportError> {
        if self.has_peer {
            return Ok(());
        }
        let monitor = &mut self.monitor;
        let wait_accepted = async {
            while let Some(event) = monitor.next().await {
                if let SocketEvent::Accepted(..) = event {
                    return Ok(());
                }
            }
            Err(TransportError::Closed)
        };
        let limit = self.peer_wait;
        self.runtime.block_on(async {
            match limit {
                Some(limit) => tokio::time::timeout(limit, wait_accepted)
                    .await
                    .unwrap_or(Err(TransportError::NoPeer(limit))),
                None => wait_accepted.await,
            }
        })?;
        self.has_peer = true;
        tracing::debug!(endpoint = %self.endpoint, "receiver connected");
        Ok(())
    }
}

impl FrameSink for ZmqPush {
    fn send(&mut self, frames: FrameSet) -> Result<(), TransportError> {
        self.wait_for_peer()?;
        let mut frames = frames.into_frames().into_iter();
        let first = frames.next().ok_or(TransportError::EmptyFrameSet)?;
        let mut message = ZmqMessage::from(first);
        for frame in frames {
            message.push_back(frame);
        }
        let socket = self.socket.as_mut().ok_or(TransportError::Closed)?;
        self.runtime
            .block_on(socket.send(message))
            .map_err(TransportError::Send)
    }
}

impl Drop for ZmqPush {
    fn drop(&mut self) {
        if let Some(socket) = self.socket.take() {
            for err in self.runtime.block_on(socket.close()) {
                tracing::debug!(endpoint = %self.endpoint, "push socket close: {}", err);
            }
        }
    }
}
