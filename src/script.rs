//! Replay scripts.
//!
//! A script is a JSON array of steps fed to an [`App`] in order. Each step is
//! translated into one or more [`Message`]s and the page's class state is
//! captured after it:
//!
//! ```json
//! [
//!   { "scroll": 150 },
//!   { "tap": "a[data-toggle=menu]" },
//!   { "press": { "target": "#content", "at": [10, 400] } },
//!   { "wait": 500 }
//! ]
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::app::{App, Message, Snapshot};
use crate::components::EventOutcome;
use crate::dom::{NodeId, SelectorError, SelectorList};

/// Errors produced while parsing or replaying a script.
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("invalid script: {0}")]
    Json(#[from] serde_json::Error),
    #[error("step {step}: invalid selector `{selector}`")]
    Selector {
        step: usize,
        selector: String,
        #[source]
        source: SelectorError,
    },
    #[error("step {step}: `{selector}` matches no element")]
    UnknownTarget { step: usize, selector: String },
}

/// The element a pointer step is aimed at, optionally with page coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Target {
    Selector(String),
    At { target: String, at: (f64, f64) },
}

impl Target {
    pub fn selector(&self) -> &str {
        match self {
            Self::Selector(selector) | Self::At { target: selector, .. } => selector,
        }
    }

    pub const fn position(&self) -> Option<(f64, f64)> {
        match self {
            Self::Selector(_) => None,
            Self::At { at, .. } => Some(*at),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Selector(selector) => f.write_str(selector),
            Self::At { target, at } => write!(f, "{target} @ {},{}", at.0, at.1),
        }
    }
}

/// One scripted host event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Scroll(f64),
    Resize(u32, u32),
    Press(Target),
    Move(f64, f64),
    Release(Target),
    /// Press, release and click without moving.
    Tap(Target),
    Click(Target),
    Wait(u64),
    /// Detach an element (and its subtree) from the page.
    Remove(String),
    /// Change an element's layout offset. Widgets notice on the next resize.
    SetTop(String, f64),
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scroll(top) => write!(f, "scroll {top}"),
            Self::Resize(w, h) => write!(f, "resize {w}x{h}"),
            Self::Press(t) => write!(f, "press {t}"),
            Self::Move(x, y) => write!(f, "move {x},{y}"),
            Self::Release(t) => write!(f, "release {t}"),
            Self::Tap(t) => write!(f, "tap {t}"),
            Self::Click(t) => write!(f, "click {t}"),
            Self::Wait(ms) => write!(f, "wait {ms}ms"),
            Self::Remove(sel) => write!(f, "remove {sel}"),
            Self::SetTop(sel, top) => write!(f, "set_top {sel} {top}"),
        }
    }
}

/// Result of replaying one step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepReport {
    pub index: usize,
    pub step: Step,
    pub default_prevented: bool,
    pub snapshot: Snapshot,
}

impl fmt::Display for StepReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.index, self.step)?;
        if self.default_prevented {
            f.write_str(" (prevented)")?;
        }
        write!(f, "\n    {}", self.snapshot)
    }
}

/// An ordered list of steps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Script {
    pub steps: Vec<Step>,
}

impl Script {
    /// Parse a JSON script.
    ///
    /// # Errors
    /// Returns [`ScriptError::Json`] when the input is not an array of steps.
    pub fn parse(json: &str) -> Result<Self, ScriptError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Replay every step against `app`, stopping at the first failure.
    ///
    /// # Errors
    /// Returns an error when a step's selector is invalid or matches nothing.
    pub fn run(&self, app: &mut App) -> Result<Vec<StepReport>, ScriptError> {
        app.start();
        let mut reports = Vec::with_capacity(self.steps.len());
        for (index, step) in self.steps.iter().enumerate() {
            let outcome = apply_step(app, index, step)?;
            debug!(index, %step, prevented = outcome.default_prevented, "step replayed");
            reports.push(StepReport {
                index,
                step: step.clone(),
                default_prevented: outcome.default_prevented,
                snapshot: app.snapshot(),
            });
        }
        Ok(reports)
    }
}

fn apply_step(app: &mut App, index: usize, step: &Step) -> Result<EventOutcome, ScriptError> {
    let outcome = match step {
        Step::Scroll(top) => app.dispatch(Message::Scroll(*top)),
        Step::Resize(width, height) => app.dispatch(Message::Resize(*width, *height)),
        Step::Press(target) => {
            let node = resolve(app, index, target.selector())?;
            let (x, y) = target.position().unwrap_or_default();
            app.dispatch(Message::PointerDown { target: node, x, y })
        }
        Step::Move(x, y) => app.dispatch(Message::PointerMove { x: *x, y: *y }),
        Step::Release(target) => {
            let node = resolve(app, index, target.selector())?;
            if let Some((x, y)) = target.position() {
                app.dispatch(Message::PointerMove { x, y });
            }
            app.dispatch(Message::PointerUp { target: node })
        }
        Step::Tap(target) => {
            let node = resolve(app, index, target.selector())?;
            let (x, y) = target.position().unwrap_or_default();
            let down = app.dispatch(Message::PointerDown { target: node, x, y });
            let up = app.dispatch(Message::PointerUp { target: node });
            let click = app.dispatch(Message::Click { target: node });
            down.merge(up).merge(click)
        }
        Step::Click(target) => {
            let node = resolve(app, index, target.selector())?;
            app.dispatch(Message::Click { target: node })
        }
        Step::Wait(ms) => app.dispatch(Message::Advance(*ms)),
        Step::Remove(selector) => {
            let node = resolve(app, index, selector)?;
            app.page_mut().remove(node);
            EventOutcome::default()
        }
        Step::SetTop(selector, top) => {
            let node = resolve(app, index, selector)?;
            app.page_mut().set_top(node, *top);
            EventOutcome::default()
        }
    };
    Ok(outcome)
}

fn resolve(app: &App, step: usize, selector: &str) -> Result<NodeId, ScriptError> {
    let list = SelectorList::parse(selector).map_err(|source| ScriptError::Selector {
        step,
        selector: selector.to_string(),
        source,
    })?;
    app.page()
        .query(&list)
        .ok_or_else(|| ScriptError::UnknownTarget {
            step,
            selector: selector.to_string(),
        })
}
