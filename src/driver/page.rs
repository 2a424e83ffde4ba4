//! CDP-backed page driver
//!
//! One `CdpPage` owns one browser tab: a target created and attached at
//! construction time. Frame-scoped work goes through an isolated world per
//! call, so page scripts never observe the suite's helpers. Out-of-process
//! iframes (the ad network serves those) are reached by attaching to their
//! targets at enumeration time.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::{debug, trace};

use crate::config::SuiteConfig;
use crate::driver::transport::CdpTransport;
use crate::driver::{js, FrameRef, PageDriver};
use crate::error::DriverError;
use crate::locator::Selector;

const ISOLATED_WORLD: &str = "bookstore-e2e";

pub struct CdpPage {
    transport: Arc<dyn CdpTransport>,
    target_id: String,
    session_id: String,
    main_frame_id: String,
    nav_timeout: Duration,
    poll_interval: Duration,
    /// iframe target id -> attached session id
    oopif_sessions: Mutex<HashMap<String, String>>,
}

impl CdpPage {
    /// Create a fresh tab on the given transport.
    pub async fn create(
        transport: Arc<dyn CdpTransport>,
        config: &SuiteConfig,
    ) -> Result<Self, DriverError> {
        let created = transport
            .send_command(None, "Target.createTarget", json!({ "url": "about:blank" }))
            .await?;
        let target_id = string_field(&created, "targetId")?;

        let attached = transport
            .send_command(
                None,
                "Target.attachToTarget",
                json!({ "targetId": target_id, "flatten": true }),
            )
            .await?;
        let session_id = string_field(&attached, "sessionId")?;

        transport
            .send_command(Some(&session_id), "Page.enable", json!({}))
            .await?;
        transport
            .send_command(Some(&session_id), "Runtime.enable", json!({}))
            .await?;

        let tree = transport
            .send_command(Some(&session_id), "Page.getFrameTree", json!({}))
            .await?;
        let main_frame_id = tree
            .get("frameTree")
            .and_then(|t| t.get("frame"))
            .and_then(|f| f.get("id"))
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| DriverError::Protocol("frame tree missing root frame id".to_string()))?;

        Ok(Self {
            transport,
            target_id,
            session_id,
            main_frame_id,
            nav_timeout: config.browser.nav_timeout(),
            poll_interval: config.ui.poll_interval(),
            oopif_sessions: Mutex::new(HashMap::new()),
        })
    }

    async fn send(
        &self,
        session: &str,
        method: &str,
        params: Value,
    ) -> Result<Value, DriverError> {
        self.transport
            .send_command(Some(session), method, params)
            .await
    }

    /// Evaluate an expression in the isolated world of the given frame.
    async fn eval(&self, frame: &FrameRef, expression: &str) -> Result<Value, DriverError> {
        let world = self
            .send(
                frame.session_id(),
                "Page.createIsolatedWorld",
                json!({ "frameId": frame.frame_id(), "worldName": ISOLATED_WORLD }),
            )
            .await?;
        let context_id = world
            .get("executionContextId")
            .and_then(|v| v.as_i64())
            .ok_or_else(|| {
                DriverError::Protocol("createIsolatedWorld returned no context id".to_string())
            })?;

        let response = self
            .send(
                frame.session_id(),
                "Runtime.evaluate",
                json!({
                    "expression": expression,
                    "contextId": context_id,
                    "returnByValue": true,
                }),
            )
            .await?;

        if let Some(details) = response.get("exceptionDetails") {
            let text = details
                .get("exception")
                .and_then(|e| e.get("description"))
                .and_then(|v| v.as_str())
                .or_else(|| details.get("text").and_then(|v| v.as_str()))
                .unwrap_or("runtime exception");
            return Err(DriverError::JsException(text.to_string()));
        }

        Ok(response
            .get("result")
            .and_then(|r| r.get("value"))
            .cloned()
            .unwrap_or(Value::Null))
    }

    /// Evaluate against the default world of the main session (readyState,
    /// location probes).
    async fn eval_top(&self, expression: &str) -> Result<Value, DriverError> {
        let response = self
            .send(
                &self.session_id,
                "Runtime.evaluate",
                json!({ "expression": expression, "returnByValue": true }),
            )
            .await?;
        Ok(response
            .get("result")
            .and_then(|r| r.get("value"))
            .cloned()
            .unwrap_or(Value::Null))
    }

    async fn wait_for_ready(&self, deadline: Instant) -> Result<(), DriverError> {
        loop {
            if Instant::now() >= deadline {
                return Err(DriverError::Timeout(
                    "navigation did not reach readyState complete".to_string(),
                ));
            }

            let ready = self
                .eval_top("document.readyState")
                .await?
                .as_str()
                .map(|state| matches!(state, "interactive" | "complete"))
                .unwrap_or(false);

            if ready {
                return Ok(());
            }
            sleep(self.poll_interval).await;
        }
    }

    /// Frames owned by one session, depth first.
    async fn session_frames(&self, session: &str) -> Result<Vec<FrameRef>, DriverError> {
        let tree = self
            .send(session, "Page.getFrameTree", json!({}))
            .await?;
        let root = tree
            .get("frameTree")
            .ok_or_else(|| DriverError::Protocol("missing frameTree in response".to_string()))?;

        let mut out = Vec::new();
        collect_tree(root, session, &mut out);
        Ok(out)
    }

    /// Attach to iframe targets not yet covered by a session. Failures here
    /// are expected while ad frames churn, so they only get a debug line.
    async fn attach_oopif_sessions(&self) -> Vec<String> {
        let targets = match self
            .transport
            .send_command(None, "Target.getTargets", json!({}))
            .await
        {
            Ok(value) => value,
            Err(err) => {
                debug!(%err, "Target.getTargets failed; using main session only");
                return Vec::new();
            }
        };

        let infos = targets
            .get("targetInfos")
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default();

        let mut sessions = Vec::new();
        let mut attached = self.oopif_sessions.lock().await;
        for info in infos {
            let kind = info.get("type").and_then(|v| v.as_str()).unwrap_or("");
            if kind != "iframe" {
                continue;
            }
            let Some(target_id) = info.get("targetId").and_then(|v| v.as_str()) else {
                continue;
            };

            if let Some(session) = attached.get(target_id) {
                sessions.push(session.clone());
                continue;
            }

            let result = self
                .transport
                .send_command(
                    None,
                    "Target.attachToTarget",
                    json!({ "targetId": target_id, "flatten": true }),
                )
                .await
                .and_then(|v| string_field(&v, "sessionId"));

            match result {
                Ok(session) => {
                    trace!(target = target_id, session = %session, "attached iframe target");
                    attached.insert(target_id.to_string(), session.clone());
                    sessions.push(session);
                }
                Err(err) => {
                    debug!(%err, target = target_id, "iframe target attach failed");
                }
            }
        }
        sessions
    }

    fn status_result(value: Value, selector: &Selector) -> Result<(), DriverError> {
        match value.get("status").and_then(|v| v.as_str()) {
            Some("clicked") | Some("filled") | Some("selected") => Ok(()),
            Some("not-found") => Err(DriverError::TargetNotFound(selector.to_string())),
            Some("option-not-found") => Err(DriverError::TargetNotFound(format!(
                "option not found for {selector}"
            ))),
            other => Err(DriverError::Protocol(format!(
                "unexpected interaction status {other:?} for {selector}"
            ))),
        }
    }

    pub fn target_id(&self) -> &str {
        &self.target_id
    }
}

fn collect_tree(node: &Value, session: &str, out: &mut Vec<FrameRef>) {
    if let Some(id) = node
        .get("frame")
        .and_then(|f| f.get("id"))
        .and_then(|v| v.as_str())
    {
        out.push(FrameRef::new(id, session));
    }
    if let Some(children) = node.get("childFrames").and_then(|v| v.as_array()) {
        for child in children {
            collect_tree(child, session, out);
        }
    }
}

fn string_field(value: &Value, field: &str) -> Result<String, DriverError> {
    value
        .get(field)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| DriverError::Protocol(format!("response missing '{field}'")))
}

#[async_trait]
impl PageDriver for CdpPage {
    async fn navigate(&self, url: &str) -> Result<(), DriverError> {
        let response = self
            .send(&self.session_id, "Page.navigate", json!({ "url": url }))
            .await?;
        if let Some(error) = response.get("errorText").and_then(|v| v.as_str()) {
            return Err(DriverError::CdpIo(format!("navigation failed: {error}")));
        }
        self.wait_for_ready(Instant::now() + self.nav_timeout).await
    }

    async fn current_url(&self) -> Result<String, DriverError> {
        self.eval_top("window.location.href")
            .await?
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| DriverError::Protocol("location probe returned no string".to_string()))
    }

    async fn frames(&self) -> Result<Vec<FrameRef>, DriverError> {
        let mut out = self.session_frames(&self.session_id).await?;
        let mut seen: HashSet<String> = out.iter().map(|f| f.frame_id().to_string()).collect();

        for session in self.attach_oopif_sessions().await {
            match self.session_frames(&session).await {
                Ok(frames) => {
                    for frame in frames {
                        if seen.insert(frame.frame_id().to_string()) {
                            out.push(frame);
                        }
                    }
                }
                Err(err) => {
                    // frame may have detached between enumeration and query
                    debug!(%err, session = %session, "iframe session frame walk failed");
                }
            }
        }
        Ok(out)
    }

    async fn count(&self, frame: &FrameRef, selector: &Selector) -> Result<usize, DriverError> {
        self.eval(frame, &js::count_expression(selector))
            .await?
            .as_u64()
            .map(|n| n as usize)
            .ok_or_else(|| DriverError::Protocol(format!("count query for {selector} returned no number")))
    }

    async fn is_visible(
        &self,
        frame: &FrameRef,
        selector: &Selector,
    ) -> Result<bool, DriverError> {
        self.eval(frame, &js::visibility_expression(selector))
            .await?
            .as_bool()
            .ok_or_else(|| {
                DriverError::Protocol(format!("visibility probe for {selector} returned no bool"))
            })
    }

    async fn click(&self, frame: &FrameRef, selector: &Selector) -> Result<(), DriverError> {
        let value = self.eval(frame, &js::click_expression(selector)).await?;
        Self::status_result(value, selector)
    }

    async fn fill(
        &self,
        frame: &FrameRef,
        selector: &Selector,
        text: &str,
    ) -> Result<(), DriverError> {
        let value = self.eval(frame, &js::fill_expression(selector, text)).await?;
        Self::status_result(value, selector)
    }

    async fn select_option(
        &self,
        frame: &FrameRef,
        selector: &Selector,
        value: &str,
    ) -> Result<(), DriverError> {
        let result = self
            .eval(frame, &js::select_expression(selector, value))
            .await?;
        Self::status_result(result, selector)
    }

    async fn visible_texts(
        &self,
        frame: &FrameRef,
        selector: &Selector,
    ) -> Result<Vec<String>, DriverError> {
        let value = self.eval(frame, &js::texts_expression(selector)).await?;
        let entries = value.as_array().ok_or_else(|| {
            DriverError::Protocol(format!("text query for {selector} returned no array"))
        })?;
        Ok(entries
            .iter()
            .filter_map(|v| v.as_str())
            .map(|s| s.to_string())
            .collect())
    }

    async fn value(&self, frame: &FrameRef, selector: &Selector) -> Result<String, DriverError> {
        let value = self.eval(frame, &js::value_expression(selector)).await?;
        if value.is_null() {
            return Err(DriverError::TargetNotFound(selector.to_string()));
        }
        value
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| DriverError::Protocol(format!("value query for {selector} returned no string")))
    }

    async fn main_frame(&self) -> Result<FrameRef, DriverError> {
        Ok(FrameRef::new(&self.main_frame_id, &self.session_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::mock::MockTransport;

    fn page_with_transport(transport: Arc<MockTransport>) -> CdpPage {
        CdpPage {
            transport,
            target_id: "target-1".to_string(),
            session_id: "session-1".to_string(),
            main_frame_id: "frame-main".to_string(),
            nav_timeout: Duration::from_millis(500),
            poll_interval: Duration::from_millis(5),
            oopif_sessions: Mutex::new(HashMap::new()),
        }
    }

    #[tokio::test]
    async fn create_attaches_target_and_enables_domains() {
        let transport = Arc::new(MockTransport::new());
        transport.respond("Target.createTarget", json!({ "targetId": "t-9" }));
        transport.respond("Target.attachToTarget", json!({ "sessionId": "s-9" }));
        transport.respond("Page.enable", json!({}));
        transport.respond("Runtime.enable", json!({}));
        transport.respond(
            "Page.getFrameTree",
            json!({ "frameTree": { "frame": { "id": "f-root" } } }),
        );

        let page = CdpPage::create(transport.clone(), &SuiteConfig::default())
            .await
            .expect("create page");
        assert_eq!(page.target_id(), "t-9");
        assert_eq!(page.main_frame().await.expect("main frame").frame_id(), "f-root");

        let methods = transport.methods();
        assert!(methods.contains(&"Page.enable".to_string()));
        assert!(methods.contains(&"Runtime.enable".to_string()));
    }

    #[tokio::test]
    async fn frames_walks_tree_main_frame_first() {
        let transport = Arc::new(MockTransport::new());
        transport.respond(
            "Page.getFrameTree",
            json!({
                "frameTree": {
                    "frame": { "id": "f-root" },
                    "childFrames": [
                        { "frame": { "id": "f-ad-outer" },
                          "childFrames": [ { "frame": { "id": "f-ad-inner" } } ] }
                    ]
                }
            }),
        );
        transport.respond("Target.getTargets", json!({ "targetInfos": [] }));

        let page = page_with_transport(transport);
        let frames = page.frames().await.expect("frames");
        let ids: Vec<&str> = frames.iter().map(|f| f.frame_id()).collect();
        assert_eq!(ids, vec!["f-root", "f-ad-outer", "f-ad-inner"]);
    }

    #[tokio::test]
    async fn eval_surfaces_page_exceptions() {
        let transport = Arc::new(MockTransport::new());
        transport.respond(
            "Page.createIsolatedWorld",
            json!({ "executionContextId": 7 }),
        );
        transport.respond(
            "Runtime.evaluate",
            json!({
                "result": { "type": "undefined" },
                "exceptionDetails": {
                    "text": "Uncaught",
                    "exception": { "description": "ReferenceError: x is not defined" }
                }
            }),
        );

        let page = page_with_transport(transport);
        let frame = FrameRef::new("f-root", "session-1");
        let err = page
            .count(&frame, &Selector::css(".close"))
            .await
            .expect_err("exception must surface");
        assert!(matches!(err, DriverError::JsException(msg) if msg.contains("ReferenceError")));
    }

    #[tokio::test]
    async fn click_maps_not_found_status() {
        let transport = Arc::new(MockTransport::new());
        transport.respond(
            "Page.createIsolatedWorld",
            json!({ "executionContextId": 3 }),
        );
        transport.respond(
            "Runtime.evaluate",
            json!({ "result": { "type": "object", "value": { "status": "not-found" } } }),
        );

        let page = page_with_transport(transport);
        let frame = FrameRef::new("f-root", "session-1");
        let err = page
            .click(&frame, &Selector::button("Close ad"))
            .await
            .expect_err("missing element");
        assert!(matches!(err, DriverError::TargetNotFound(_)));
    }
}
