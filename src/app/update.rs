use tracing::trace;

use crate::app::App;
use crate::components::{EventOutcome, Phase, PointerEvent};
use crate::dom::NodeId;
use crate::pointer::PointerAction;
use crate::viewport::ViewportEvent;

/// All events a host can feed into the runtime.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Message {
    // Viewport
    /// The viewport scrolled to this offset
    Scroll(f64),
    /// The viewport was resized (or the layout changed)
    Resize(u32, u32),

    // Pointer
    /// Pointer pressed on `target` at page coordinates
    PointerDown { target: NodeId, x: f64, y: f64 },
    /// Pointer moved to page coordinates
    PointerMove { x: f64, y: f64 },
    /// Pointer released over `target`
    PointerUp { target: NodeId },
    /// Click synthesized after a release
    Click { target: NodeId },

    // Time
    /// Advance the clock to an absolute time, firing due timers
    Tick(u64),
    /// Advance the clock by a number of milliseconds
    Advance(u64),
}

impl App {
    /// Process one message to completion.
    ///
    /// Pointer events are delivered to element listeners first and document
    /// listeners second; the returned outcome tells the host whether the
    /// event's default action was prevented.
    pub fn dispatch(&mut self, msg: Message) -> EventOutcome {
        self.start();
        match msg {
            Message::Scroll(top) => {
                let event = self.viewport.scroll_to(top);
                self.notify(event);
            }
            Message::Resize(width, height) => {
                let event = self.viewport.resize(width, height);
                self.notify(event);
            }
            Message::PointerDown { target, x, y } => {
                self.pointer.press(x, y);
                return self.deliver_pointer(PointerEvent::Down { target }, PointerAction::Down);
            }
            Message::PointerMove { x, y } => {
                self.pointer.move_to(x, y);
            }
            Message::PointerUp { target } => {
                self.pointer.release();
                return self.deliver_pointer(PointerEvent::Up { target }, PointerAction::Up);
            }
            Message::Click { target } => {
                return self.deliver_click(target);
            }
            Message::Tick(now_ms) => self.run_timers(now_ms),
            Message::Advance(delta_ms) => {
                let now = self.scheduler.now_ms().saturating_add(delta_ms);
                self.run_timers(now);
            }
        }
        EventOutcome::default()
    }

    fn notify(&mut self, event: ViewportEvent) {
        for id in self.viewport.subscribers(event.topic()) {
            self.with_component(id, |component, ctx| component.on_viewport(event, ctx));
        }
    }

    fn deliver_pointer(&mut self, event: PointerEvent, action: PointerAction) -> EventOutcome {
        if !self.page.contains(event.target()) {
            trace!(?event, "pointer target no longer on page");
            return EventOutcome::default();
        }
        trace!(name = self.pointer.kind().event_name(action), ?event, "pointer event");
        self.deliver_phases(event)
    }

    fn deliver_click(&mut self, target: NodeId) -> EventOutcome {
        if !self.page.contains(target) {
            return EventOutcome::default();
        }
        self.deliver_phases(PointerEvent::Click { target })
    }

    fn deliver_phases(&mut self, event: PointerEvent) -> EventOutcome {
        let ids = self.component_ids();
        let mut outcome = EventOutcome::default();
        for phase in [Phase::Target, Phase::Document] {
            for id in &ids {
                let result = self
                    .with_component(*id, |component, ctx| component.on_pointer(event, phase, ctx))
                    .unwrap_or_default();
                outcome = outcome.merge(result);
            }
        }
        outcome
    }

    fn run_timers(&mut self, now_ms: u64) {
        while let Some(task) = self.scheduler.take_due(now_ms) {
            trace!(owner = %task.owner, due = task.due_ms, action = ?task.action, "timer fired");
            self.with_component(task.owner, |component, ctx| {
                component.on_timer(&task.action, ctx);
            });
        }
        self.scheduler.advance_to(now_ms);
    }
}
