//! Scripted driver and transport doubles for unit tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::driver::transport::CdpTransport;
use crate::driver::{FrameRef, PageDriver};
use crate::error::DriverError;
use crate::locator::Selector;

/// Transport returning canned responses per method and recording every
/// command sent.
pub(crate) struct MockTransport {
    responses: Mutex<HashMap<String, Vec<Value>>>,
    commands: Mutex<Vec<(Option<String>, String, Value)>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(HashMap::new()),
            commands: Mutex::new(Vec::new()),
        }
    }

    /// Script a response for a method. Multiple calls queue responses in
    /// order; the final one is repeated for any further calls.
    pub fn respond(&self, method: &str, value: Value) {
        self.responses
            .lock()
            .expect("responses lock")
            .entry(method.to_string())
            .or_default()
            .push(value);
    }

    pub fn methods(&self) -> Vec<String> {
        self.commands
            .lock()
            .expect("commands lock")
            .iter()
            .map(|(_, method, _)| method.clone())
            .collect()
    }
}

#[async_trait]
impl CdpTransport for MockTransport {
    async fn send_command(
        &self,
        session: Option<&str>,
        method: &str,
        params: Value,
    ) -> Result<Value, DriverError> {
        self.commands.lock().expect("commands lock").push((
            session.map(|s| s.to_string()),
            method.to_string(),
            params,
        ));

        let mut responses = self.responses.lock().expect("responses lock");
        match responses.get_mut(method) {
            Some(queue) if queue.len() > 1 => Ok(queue.remove(0)),
            Some(queue) if queue.len() == 1 => Ok(queue[0].clone()),
            _ => Err(DriverError::Protocol(format!(
                "no scripted response for {method}"
            ))),
        }
    }
}

/// One scripted element behind a selector.
#[derive(Clone, Debug)]
pub(crate) struct MockElement {
    count: usize,
    visible: bool,
    visible_after_polls: Option<usize>,
    visibility_error: bool,
    click_error: bool,
    texts: Vec<String>,
    value: String,
}

impl MockElement {
    pub fn visible() -> Self {
        Self {
            count: 1,
            visible: true,
            visible_after_polls: None,
            visibility_error: false,
            click_error: false,
            texts: Vec::new(),
            value: String::new(),
        }
    }

    pub fn hidden() -> Self {
        Self {
            visible: false,
            ..Self::visible()
        }
    }

    /// Becomes visible once `is_visible` has been probed `polls` times.
    pub fn visible_after_polls(mut self, polls: usize) -> Self {
        self.visible = false;
        self.visible_after_polls = Some(polls);
        self
    }

    /// Visibility probes fail as if the frame detached mid-check.
    pub fn with_visibility_error(mut self) -> Self {
        self.visibility_error = true;
        self
    }

    /// Clicks raise instead of succeeding.
    pub fn with_click_error(mut self) -> Self {
        self.click_error = true;
        self
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    pub fn with_texts(mut self, texts: &[&str]) -> Self {
        self.texts = texts.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn with_value(mut self, value: &str) -> Self {
        self.value = value.to_string();
        self
    }
}

/// One scripted document.
#[derive(Clone, Debug, Default)]
pub(crate) struct MockFrame {
    elements: HashMap<Selector, MockElement>,
}

impl MockFrame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, selector: Selector, element: MockElement) -> Self {
        self.elements.insert(selector, element);
        self
    }
}

#[derive(Default)]
struct MockState {
    frames: Vec<MockFrame>,
    url: String,
    redirect_to: Option<String>,
    navigations: Vec<String>,
    clicks: Vec<(usize, Selector)>,
    fills: Vec<(Selector, String)>,
    selects: Vec<(Selector, String)>,
    visibility_probes: Vec<(usize, Selector)>,
    count_queries: Vec<(usize, Selector)>,
}

/// In-memory `PageDriver` over a scripted frame set, recording every
/// interaction.
pub(crate) struct MockDriver {
    state: Mutex<MockState>,
}

impl MockDriver {
    pub fn with_frames(frames: Vec<MockFrame>) -> Self {
        Self {
            state: Mutex::new(MockState {
                frames,
                url: "about:blank".to_string(),
                ..MockState::default()
            }),
        }
    }

    pub fn set_url(&self, url: &str) {
        self.state.lock().expect("state lock").url = url.to_string();
    }

    /// Every navigation lands on `url` instead of its target.
    pub fn redirect_navigations_to(&self, url: &str) {
        self.state.lock().expect("state lock").redirect_to = Some(url.to_string());
    }

    pub fn clicks(&self) -> Vec<(usize, Selector)> {
        self.state.lock().expect("state lock").clicks.clone()
    }

    pub fn fills(&self) -> Vec<(Selector, String)> {
        self.state.lock().expect("state lock").fills.clone()
    }

    pub fn selects(&self) -> Vec<(Selector, String)> {
        self.state.lock().expect("state lock").selects.clone()
    }

    pub fn visibility_probes(&self) -> Vec<(usize, Selector)> {
        self.state
            .lock()
            .expect("state lock")
            .visibility_probes
            .clone()
    }

    pub fn count_queries(&self) -> Vec<(usize, Selector)> {
        self.state.lock().expect("state lock").count_queries.clone()
    }

    pub fn navigations(&self) -> Vec<String> {
        self.state.lock().expect("state lock").navigations.clone()
    }

    fn frame_index(frame: &FrameRef) -> Result<usize, DriverError> {
        frame
            .frame_id()
            .strip_prefix("frame-")
            .and_then(|raw| raw.parse().ok())
            .ok_or_else(|| DriverError::Protocol(format!("unknown mock frame {frame:?}")))
    }
}

#[async_trait]
impl PageDriver for MockDriver {
    async fn navigate(&self, url: &str) -> Result<(), DriverError> {
        let mut state = self.state.lock().expect("state lock");
        state.navigations.push(url.to_string());
        state.url = state.redirect_to.clone().unwrap_or_else(|| url.to_string());
        Ok(())
    }

    async fn current_url(&self) -> Result<String, DriverError> {
        Ok(self.state.lock().expect("state lock").url.clone())
    }

    async fn frames(&self) -> Result<Vec<FrameRef>, DriverError> {
        let state = self.state.lock().expect("state lock");
        Ok((0..state.frames.len())
            .map(|i| FrameRef::new(format!("frame-{i}"), "mock"))
            .collect())
    }

    async fn count(&self, frame: &FrameRef, selector: &Selector) -> Result<usize, DriverError> {
        let index = Self::frame_index(frame)?;
        let mut state = self.state.lock().expect("state lock");
        state.count_queries.push((index, selector.clone()));
        Ok(state
            .frames
            .get(index)
            .and_then(|f| f.elements.get(selector))
            .map(|e| e.count)
            .unwrap_or(0))
    }

    async fn is_visible(
        &self,
        frame: &FrameRef,
        selector: &Selector,
    ) -> Result<bool, DriverError> {
        let index = Self::frame_index(frame)?;
        let mut state = self.state.lock().expect("state lock");
        state.visibility_probes.push((index, selector.clone()));

        let Some(element) = state
            .frames
            .get_mut(index)
            .and_then(|f| f.elements.get_mut(selector))
        else {
            return Ok(false);
        };

        if element.visibility_error {
            return Err(DriverError::CdpIo("frame detached during probe".to_string()));
        }
        if let Some(remaining) = element.visible_after_polls {
            if remaining == 0 {
                element.visible = true;
            } else {
                element.visible_after_polls = Some(remaining - 1);
            }
        }
        Ok(element.visible)
    }

    async fn click(&self, frame: &FrameRef, selector: &Selector) -> Result<(), DriverError> {
        let index = Self::frame_index(frame)?;
        let mut state = self.state.lock().expect("state lock");

        let Some(element) = state
            .frames
            .get(index)
            .and_then(|f| f.elements.get(selector))
        else {
            return Err(DriverError::TargetNotFound(selector.to_string()));
        };
        if element.click_error {
            return Err(DriverError::JsException("click intercepted".to_string()));
        }
        state.clicks.push((index, selector.clone()));
        Ok(())
    }

    async fn fill(
        &self,
        frame: &FrameRef,
        selector: &Selector,
        text: &str,
    ) -> Result<(), DriverError> {
        Self::frame_index(frame)?;
        let mut state = self.state.lock().expect("state lock");
        state.fills.push((selector.clone(), text.to_string()));
        Ok(())
    }

    async fn select_option(
        &self,
        frame: &FrameRef,
        selector: &Selector,
        value: &str,
    ) -> Result<(), DriverError> {
        Self::frame_index(frame)?;
        let mut state = self.state.lock().expect("state lock");
        state.selects.push((selector.clone(), value.to_string()));
        Ok(())
    }

    async fn visible_texts(
        &self,
        frame: &FrameRef,
        selector: &Selector,
    ) -> Result<Vec<String>, DriverError> {
        let index = Self::frame_index(frame)?;
        let state = self.state.lock().expect("state lock");
        Ok(state
            .frames
            .get(index)
            .and_then(|f| f.elements.get(selector))
            .map(|e| e.texts.clone())
            .unwrap_or_default())
    }

    async fn value(&self, frame: &FrameRef, selector: &Selector) -> Result<String, DriverError> {
        let index = Self::frame_index(frame)?;
        let state = self.state.lock().expect("state lock");
        state
            .frames
            .get(index)
            .and_then(|f| f.elements.get(selector))
            .map(|e| e.value.clone())
            .ok_or_else(|| DriverError::TargetNotFound(selector.to_string()))
    }
}
