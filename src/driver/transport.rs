//! JSON-level CDP transport
//!
//! Launches a Chromium, connects to its DevTools websocket and pumps the
//! connection in a background task. Commands are raw method strings with
//! `serde_json` params; responses are matched to in-flight call ids.
//! Protocol events have no consumer in this suite and are logged at debug
//! level, then dropped.

use std::collections::HashMap;
use std::convert::TryInto;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::async_process::Child;
use chromiumoxide::browser::BrowserConfig;
use chromiumoxide::cdp::browser_protocol::target::SessionId as CdpSessionId;
use chromiumoxide::cdp::events::CdpEventMessage;
use chromiumoxide::conn::Connection;
use chromiumoxide_types::{CallId, CdpJsonEventMessage, Message, MethodId, Response};
use futures::io::{AsyncBufReadExt, BufReader};
use futures::StreamExt;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::BrowserOptions;
use crate::error::DriverError;

/// Minimal command surface the page driver needs from the wire.
#[async_trait]
pub trait CdpTransport: Send + Sync {
    /// Send one CDP command, scoped to a session when given, and await its
    /// response payload.
    async fn send_command(
        &self,
        session: Option<&str>,
        method: &str,
        params: Value,
    ) -> Result<Value, DriverError>;
}

struct ControlMessage {
    session: Option<String>,
    method: String,
    params: Value,
    responder: oneshot::Sender<Result<Value, DriverError>>,
}

/// Transport bound to one launched Chromium for the lifetime of the suite.
pub struct ChromiumTransport {
    command_tx: mpsc::Sender<ControlMessage>,
    command_timeout: Duration,
    loop_task: JoinHandle<()>,
    child: Mutex<Option<Child>>,
    alive: Arc<AtomicBool>,
}

impl ChromiumTransport {
    /// Launch Chromium with the given options and connect to its DevTools
    /// endpoint.
    pub async fn launch(options: &BrowserOptions) -> Result<Self, DriverError> {
        let config = Self::browser_config(options)?;
        let mut child = config
            .launch()
            .map_err(|err| DriverError::Launch(format!("failed to launch chromium: {err}")))?;

        let ws_url = match extract_ws_url(&mut child).await {
            Ok(url) => url,
            Err(err) => {
                let _ = child.kill().await;
                return Err(err);
            }
        };

        let conn = Connection::<CdpEventMessage>::connect(&ws_url)
            .await
            .map_err(|err| DriverError::CdpIo(err.to_string()))?;

        info!(url = %ws_url, "chromium devtools connection established");
        Ok(Self::from_connection(
            conn,
            Some(child),
            options.command_timeout(),
        ))
    }

    /// Attach to an already-running browser exposing a DevTools websocket.
    pub async fn connect(ws_url: &str, command_timeout: Duration) -> Result<Self, DriverError> {
        let conn = Connection::<CdpEventMessage>::connect(ws_url)
            .await
            .map_err(|err| DriverError::CdpIo(err.to_string()))?;
        Ok(Self::from_connection(conn, None, command_timeout))
    }

    fn from_connection(
        conn: Connection<CdpEventMessage>,
        child: Option<Child>,
        command_timeout: Duration,
    ) -> Self {
        let (command_tx, command_rx) = mpsc::channel(128);
        let alive = Arc::new(AtomicBool::new(true));
        let loop_alive = alive.clone();

        let loop_task = tokio::spawn(async move {
            if let Err(err) = run_loop(conn, command_rx).await {
                warn!(%err, "cdp connection loop terminated");
            }
            loop_alive.store(false, Ordering::Relaxed);
        });

        Self {
            command_tx,
            command_timeout,
            loop_task,
            child: Mutex::new(child),
            alive,
        }
    }

    fn browser_config(options: &BrowserOptions) -> Result<BrowserConfig, DriverError> {
        if let Some(executable) = &options.executable {
            if !executable.exists() {
                return Err(DriverError::Launch(format!(
                    "chrome executable not found at {}",
                    executable.display()
                )));
            }
        }

        let mut builder = BrowserConfig::builder()
            .request_timeout(options.command_timeout())
            .launch_timeout(Duration::from_secs(20));

        if !options.headless {
            builder = builder.with_head();
        }

        let mut args = vec![
            "--disable-background-networking",
            "--disable-background-timer-throttling",
            "--disable-breakpad",
            "--disable-component-update",
            "--disable-default-apps",
            "--disable-dev-shm-usage",
            "--disable-extensions",
            "--disable-hang-monitor",
            "--disable-popup-blocking",
            "--disable-prompt-on-repost",
            "--disable-sync",
            "--no-first-run",
            "--no-default-browser-check",
            "--password-store=basic",
            "--remote-allow-origins=*",
            "--use-mock-keychain",
        ];
        if options.headless {
            args.push("--headless=new");
            args.push("--hide-scrollbars");
            args.push("--mute-audio");
        }
        builder = builder.args(args);

        if let Some(executable) = &options.executable {
            builder = builder.chrome_executable(executable.clone());
        }
        if let Some(dir) = &options.user_data_dir {
            builder = builder.user_data_dir(dir.clone());
        }

        builder
            .build()
            .map_err(|err| DriverError::Launch(format!("browser config error: {err}")))
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl CdpTransport for ChromiumTransport {
    async fn send_command(
        &self,
        session: Option<&str>,
        method: &str,
        params: Value,
    ) -> Result<Value, DriverError> {
        let (resp_tx, resp_rx) = oneshot::channel();
        let message = ControlMessage {
            session: session.map(|s| s.to_string()),
            method: method.to_string(),
            params,
            responder: resp_tx,
        };

        self.command_tx
            .send(message)
            .await
            .map_err(|err| DriverError::CdpIo(err.to_string()))?;

        match tokio::time::timeout(self.command_timeout, resp_rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(DriverError::CdpIo(
                "command response channel closed".to_string(),
            )),
            Err(_) => Err(DriverError::Timeout(format!("command {method} timed out"))),
        }
    }
}

impl Drop for ChromiumTransport {
    fn drop(&mut self) {
        self.alive.store(false, Ordering::Relaxed);
        self.loop_task.abort();

        if let Ok(mut guard) = self.child.try_lock() {
            if let Some(mut child) = guard.take() {
                if let Ok(handle) = tokio::runtime::Handle::try_current() {
                    handle.spawn(async move {
                        if let Err(err) = child.kill().await {
                            warn!(%err, "failed to kill chromium child");
                        }
                    });
                } else {
                    debug!("no tokio runtime available to kill chromium child");
                }
            }
        }
    }
}

async fn run_loop(
    mut conn: Connection<CdpEventMessage>,
    mut command_rx: mpsc::Receiver<ControlMessage>,
) -> Result<(), DriverError> {
    let mut inflight: HashMap<CallId, oneshot::Sender<Result<Value, DriverError>>> = HashMap::new();

    loop {
        tokio::select! {
            Some(cmd) = command_rx.recv() => {
                submit(&mut conn, cmd, &mut inflight);
            }
            message = conn.next() => {
                match message {
                    Some(Ok(Message::Response(resp))) => {
                        if let Some(sender) = inflight.remove(&resp.id) {
                            let _ = sender.send(extract_payload(resp));
                        }
                    }
                    Some(Ok(Message::Event(event))) => {
                        log_event(event);
                    }
                    Some(Err(err)) => {
                        let failure = DriverError::CdpIo(err.to_string());
                        for (_, sender) in inflight.drain() {
                            let _ = sender.send(Err(failure.clone()));
                        }
                        return Err(failure);
                    }
                    None => {
                        let closed = DriverError::CdpIo("cdp connection closed".to_string());
                        for (_, sender) in inflight.drain() {
                            let _ = sender.send(Err(closed.clone()));
                        }
                        return Ok(());
                    }
                }
            }
        }
    }
}

fn submit(
    conn: &mut Connection<CdpEventMessage>,
    cmd: ControlMessage,
    inflight: &mut HashMap<CallId, oneshot::Sender<Result<Value, DriverError>>>,
) {
    let session = cmd.session.map(CdpSessionId::from);
    let method_id: MethodId = cmd.method.clone().into();

    match conn.submit_command(method_id, session, cmd.params) {
        Ok(call_id) => {
            inflight.insert(call_id, cmd.responder);
        }
        Err(err) => {
            let _ = cmd
                .responder
                .send(Err(DriverError::CdpIo(err.to_string())));
        }
    }
}

fn extract_payload(resp: Response) -> Result<Value, DriverError> {
    if let Some(result) = resp.result {
        Ok(result)
    } else if let Some(error) = resp.error {
        Err(DriverError::CdpIo(format!(
            "cdp error {}: {}",
            error.code, error.message
        )))
    } else {
        Err(DriverError::Protocol("empty cdp response".to_string()))
    }
}

fn log_event(event: CdpEventMessage) {
    match TryInto::<CdpJsonEventMessage>::try_into(event) {
        Ok(raw) => debug!(method = %raw.method, "cdp event"),
        Err(err) => debug!(%err, "undecodable cdp event"),
    }
}

/// Extract the DevTools websocket URL from Chromium stderr output.
async fn extract_ws_url(child: &mut Child) -> Result<String, DriverError> {
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| DriverError::Launch("chromium process missing stderr handle".to_string()))?;
    let mut lines = BufReader::new(stderr).lines();
    let mut preview = Vec::new();

    let reader = async {
        while let Some(line) = lines.next().await {
            let line = line.map_err(|err| DriverError::Launch(err.to_string()))?;
            preview.push(line.clone());
            if let Some((_, ws)) = line.rsplit_once("listening on ") {
                let ws = ws.trim();
                if ws.starts_with("ws") && ws.contains("devtools/browser") {
                    return Ok(ws.to_string());
                }
            }
        }
        Err(DriverError::Launch(format!(
            "chromium exited before exposing devtools websocket url. stderr preview: {}",
            preview.iter().take(8).cloned().collect::<Vec<_>>().join(" | ")
        )))
    };

    tokio::time::timeout(Duration::from_secs(20), reader)
        .await
        .map_err(|_| {
            DriverError::Timeout("waiting for chromium devtools websocket url".to_string())
        })?
}
