//! Process transport: a bridge program answering NDJSON on stdin/stdout.
//!
//! Each request line is a [`RequestEnvelope`]; each response line is a
//! [`ResponseEnvelope`] echoing the request `id`. Requests may overlap.

use std::collections::HashMap;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::{oneshot, Mutex};

use super::error::{RpcError, RpcResult};
use super::protocol::{RequestEnvelope, ResponseEnvelope};
use super::transport::Transport;
use crate::config::{BridgeSettings, ServerSettings};

type Pending = Arc<Mutex<HashMap<String, oneshot::Sender<ResponseEnvelope>>>>;

pub struct ProcessTransport {
    stdin: Arc<Mutex<BufWriter<ChildStdin>>>,
    pending: Pending,
    _child: Child,
    reader_task: tokio::task::JoinHandle<()>,
    timeout: Duration,
}

impl ProcessTransport {
    /// Spawn the bridge program.
    pub fn spawn<P: AsRef<Path>>(program: P, args: &[String], timeout: Duration) -> RpcResult<Self> {
        let mut child = Command::new(program.as_ref())
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(RpcError::SpawnFailed)?;

        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            return Err(RpcError::SpawnFailed(std::io::Error::other(
                "bridge stdio was not captured",
            )));
        };

        let pending: Pending = Arc::new(Mutex::new(HashMap::new()));
        let reader_task = spawn_reader(stdout, pending.clone());
        tracing::debug!(program = %program.as_ref().display(), "bridge process started");

        Ok(Self {
            stdin: Arc::new(Mutex::new(BufWriter::new(stdin))),
            pending,
            _child: child,
            reader_task,
            timeout,
        })
    }

    pub fn from_settings(server: &ServerSettings, bridge: &BridgeSettings) -> RpcResult<Self> {
        let program = bridge
            .path
            .as_deref()
            .ok_or_else(|| RpcError::InvalidConfig("bridge.path is not set".into()))?;
        Self::spawn(
            program,
            &bridge.args,
            Duration::from_secs(server.timeout_secs),
        )
    }

    /// `false` once the bridge closed its stdout.
    pub fn is_alive(&self) -> bool {
        !self.reader_task.is_finished()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn send_line(&self, request: &RequestEnvelope) -> RpcResult<()> {
        let line = serde_json::to_string(request).map_err(RpcError::SerializeFailed)? + "\n";
        let mut stdin = self.stdin.lock().await;
        stdin
            .write_all(line.as_bytes())
            .await
            .map_err(RpcError::WriteFailed)?;
        stdin.flush().await.map_err(RpcError::WriteFailed)
    }
}

fn spawn_reader(stdout: ChildStdout, pending: Pending) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut reader = BufReader::new(stdout);
        let mut line = String::new();

        loop {
            line.clear();
            match reader.read_line(&mut line).await {
                Ok(0) => break,
                Ok(_) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<ResponseEnvelope>(&line) {
                        Ok(resp) => {
                            let Some(id) = resp.id.clone() else {
                                tracing::warn!("bridge response without id dropped");
                                continue;
                            };
                            if let Some(tx) = pending.lock().await.remove(&id) {
                                let _ = tx.send(resp);
                            }
                        }
                        Err(e) => tracing::warn!(error = %e, "unparseable bridge response"),
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "bridge read error");
                    break;
                }
            }
        }

        // Dropping the senders wakes every waiter with TransportClosed.
        let mut pending = pending.lock().await;
        if !pending.is_empty() {
            tracing::warn!(waiting = pending.len(), "bridge exited with calls in flight");
        }
        pending.clear();
    })
}

#[async_trait]
impl Transport for ProcessTransport {
    async fn call(&self, method: &str, params: Value) -> RpcResult<ResponseEnvelope> {
        let id = uuid::Uuid::new_v4().to_string();
        let request = RequestEnvelope {
            id: id.clone(),
            method: method.to_string(),
            params,
        };

        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(id.clone(), tx);
        if !self.is_alive() {
            self.pending.lock().await.remove(&id);
            return Err(RpcError::TransportClosed);
        }

        if let Err(e) = self.send_line(&request).await {
            self.pending.lock().await.remove(&id);
            return Err(e);
        }

        match tokio::time::timeout(self.timeout, rx).await {
            Ok(resp) => Ok(resp?),
            Err(_) => {
                self.pending.lock().await.remove(&id);
                Err(RpcError::Timeout(self.timeout.as_secs()))
            }
        }
    }

    fn name(&self) -> &'static str {
        "process"
    }
}
