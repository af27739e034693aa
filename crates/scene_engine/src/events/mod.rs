//! Event dispatch
//!
//! Key principles:
//! - Typed event payloads (no stringly-keyed arguments)
//! - Handler returns bool (true = consumed, stops forwarding)
//! - Priority-ordered delivery (higher priority handlers run first)
//! - Immediate dispatch plus a cross-thread posted queue
//!
//! Events may be posted from any thread but are handled exclusively on the
//! thread that owns the dispatcher, which serializes all graph mutation.

use crate::animation::AnimatorId;
use crate::foundation::math::{Vec2, Vec3};
use crate::scene::ActorId;
use slotmap::{new_key_type, SlotMap};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

new_key_type! {
    /// Handle to a registered event handler
    pub struct HandlerId;
}

/// Animation lifecycle notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationEventKind {
    /// Animator was started
    Start,
    /// Repeating animator rewound for another cycle
    Reset,
    /// Animator reached the end of its length
    Finish,
}

/// UI interaction notification targeting an actor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiEventKind {
    /// Pointer moved onto the actor
    ActorEnter,
    /// Pointer moved off the actor
    ActorLeave,
    /// Pointer was pressed on the actor
    ActorPress,
    /// Pointer that was pressed on the actor was released
    ActorRelease,
    /// Pointer was pressed and released on the same actor
    ActorClick,
    /// Pointer moved while pressed on the actor
    ActorDrag,
}

/// UI event payload
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UiEvent {
    /// What happened
    pub kind: UiEventKind,
    /// The actor the event targets
    pub actor: ActorId,
    /// Pointer identifier (0 for the mouse, touch id for touches)
    pub pointer_id: u64,
    /// Pointer position in window-normalized coordinates
    pub position: Vec2,
    /// Hit position in the actor's local space (press/release/drag)
    pub local_position: Vec3,
    /// Pointer movement since the previous event (move/drag)
    pub difference: Vec2,
}

/// Event delivered through the dispatcher
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Event {
    /// Animation lifecycle event
    Animation {
        /// What happened
        kind: AnimationEventKind,
        /// The animator it happened to
        animator: AnimatorId,
    },
    /// Actor-targeted UI event
    Ui(UiEvent),
}

/// Raw mouse event kind, as delivered by the input collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseEventKind {
    /// Button pressed
    Press,
    /// Button released
    Release,
    /// Cursor moved
    Move,
}

/// Raw mouse event consumed by [`crate::scene::Scene::handle_mouse`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MouseEvent {
    /// What happened
    pub kind: MouseEventKind,
    /// Cursor position in window-normalized coordinates
    pub position: Vec2,
    /// Movement since the previous event (valid for `Move`)
    pub difference: Vec2,
}

/// Raw touch event kind, as delivered by the input collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchEventKind {
    /// Touch started
    Begin,
    /// Touch ended
    End,
    /// Touch moved
    Move,
    /// Touch was cancelled by the system
    Cancel,
}

/// Raw touch event consumed by [`crate::scene::Scene::handle_touch`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchEvent {
    /// What happened
    pub kind: TouchEventKind,
    /// Identifier of the touch, stable for its duration
    pub touch_id: u64,
    /// Touch position in window-normalized coordinates
    pub position: Vec2,
    /// Movement since the previous event (valid for `Move`)
    pub difference: Vec2,
    /// Whether the touchpad is the screen itself (off-screen pads are
    /// ignored for actor picking)
    pub screen_device: bool,
}

/// Event handler callback
///
/// Returns true if the event was consumed (stops forwarding to
/// lower-priority handlers).
pub type HandlerFn = Box<dyn FnMut(&Event) -> bool>;

struct HandlerEntry {
    priority: i32,
    callback: HandlerFn,
}

/// Priority-ordered event dispatcher
///
/// `dispatch` delivers synchronously on the calling thread. Handlers may
/// capture thread-local state, so the dispatcher itself never crosses
/// threads; other threads enqueue through an [`EventPoster`] obtained from
/// [`EventDispatcher::poster`], and the owning thread drains the queue via
/// `dispatch_posted`.
#[derive(Default)]
pub struct EventDispatcher {
    handlers: SlotMap<HandlerId, HandlerEntry>,
    // Handler ids sorted by descending priority, stable among equals
    order: Vec<HandlerId>,
    posted: Arc<Mutex<VecDeque<Event>>>,
}

/// Cloneable, thread-safe handle that enqueues events for a dispatcher
///
/// The handle stays valid for the dispatcher's lifetime; events posted
/// after the dispatcher is dropped are discarded with it.
#[derive(Clone)]
pub struct EventPoster {
    queue: Arc<Mutex<VecDeque<Event>>>,
}

impl EventPoster {
    /// Enqueue an event for delivery on the dispatcher's owning thread
    pub fn post(&self, event: Event) {
        let mut posted = self
            .queue
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        posted.push_back(event);
    }
}

impl EventDispatcher {
    /// Create a new empty dispatcher
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler; higher priority handlers are notified first,
    /// equal priorities in registration order
    pub fn add_handler(&mut self, priority: i32, callback: HandlerFn) -> HandlerId {
        let id = self.handlers.insert(HandlerEntry { priority, callback });

        let index = self
            .order
            .partition_point(|other| self.handlers[*other].priority >= priority);
        self.order.insert(index, id);

        id
    }

    /// Remove a handler; returns false if it was not registered
    pub fn remove_handler(&mut self, id: HandlerId) -> bool {
        if self.handlers.remove(id).is_some() {
            self.order.retain(|other| *other != id);
            true
        } else {
            false
        }
    }

    /// Number of registered handlers
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Dispatch an event immediately on the calling thread
    ///
    /// Returns whether any handler consumed the event.
    pub fn dispatch(&mut self, event: &Event) -> bool {
        for index in 0..self.order.len() {
            let id = self.order[index];
            if let Some(entry) = self.handlers.get_mut(id) {
                if (entry.callback)(event) {
                    return true;
                }
            }
        }

        false
    }

    /// Enqueue an event for later delivery on the owning thread
    pub fn post(&self, event: Event) {
        let mut posted = self.posted.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        posted.push_back(event);
    }

    /// A `Send + Sync` handle other threads use to post events
    pub fn poster(&self) -> EventPoster {
        EventPoster {
            queue: Arc::clone(&self.posted),
        }
    }

    /// Drain the posted queue, dispatching each event in posting order
    pub fn dispatch_posted(&mut self) {
        loop {
            let event = {
                let mut posted = self
                    .posted
                    .lock()
                    .unwrap_or_else(std::sync::PoisonError::into_inner);
                posted.pop_front()
            };

            match event {
                Some(event) => {
                    self.dispatch(&event);
                }
                None => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn animation_event() -> Event {
        Event::Animation {
            kind: AnimationEventKind::Start,
            animator: AnimatorId::default(),
        }
    }

    #[test]
    fn test_priority_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut dispatcher = EventDispatcher::new();

        for (name, priority) in [("low", 0), ("high", 10), ("mid", 5)] {
            let log = Rc::clone(&log);
            dispatcher.add_handler(
                priority,
                Box::new(move |_| {
                    log.borrow_mut().push(name);
                    false
                }),
            );
        }

        let consumed = dispatcher.dispatch(&animation_event());
        assert!(!consumed);
        assert_eq!(*log.borrow(), vec!["high", "mid", "low"]);
    }

    #[test]
    fn test_consumption_stops_forwarding() {
        let reached = Rc::new(RefCell::new(false));
        let mut dispatcher = EventDispatcher::new();

        dispatcher.add_handler(10, Box::new(|_| true));
        {
            let reached = Rc::clone(&reached);
            dispatcher.add_handler(
                0,
                Box::new(move |_| {
                    *reached.borrow_mut() = true;
                    false
                }),
            );
        }

        assert!(dispatcher.dispatch(&animation_event()));
        assert!(!*reached.borrow());
    }

    #[test]
    fn test_remove_handler() {
        let mut dispatcher = EventDispatcher::new();
        let id = dispatcher.add_handler(0, Box::new(|_| true));

        assert!(dispatcher.remove_handler(id));
        assert!(!dispatcher.remove_handler(id));
        assert!(!dispatcher.dispatch(&animation_event()));
    }

    #[test]
    fn test_poster_posts_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<EventPoster>();

        let log = Rc::new(RefCell::new(Vec::new()));
        let mut dispatcher = EventDispatcher::new();
        {
            let log = Rc::clone(&log);
            dispatcher.add_handler(
                0,
                Box::new(move |event| {
                    if let Event::Animation { kind, .. } = event {
                        log.borrow_mut().push(*kind);
                    }
                    false
                }),
            );
        }

        let poster = dispatcher.poster();
        let handle = std::thread::spawn(move || {
            for kind in [AnimationEventKind::Start, AnimationEventKind::Finish] {
                poster.post(Event::Animation {
                    kind,
                    animator: AnimatorId::default(),
                });
            }
        });
        handle.join().unwrap();

        dispatcher.dispatch_posted();

        assert_eq!(
            *log.borrow(),
            vec![AnimationEventKind::Start, AnimationEventKind::Finish]
        );
    }

    #[test]
    fn test_posted_events_delivered_in_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut dispatcher = EventDispatcher::new();
        {
            let log = Rc::clone(&log);
            dispatcher.add_handler(
                0,
                Box::new(move |event| {
                    if let Event::Animation { kind, .. } = event {
                        log.borrow_mut().push(*kind);
                    }
                    false
                }),
            );
        }

        for kind in [
            AnimationEventKind::Start,
            AnimationEventKind::Reset,
            AnimationEventKind::Finish,
        ] {
            dispatcher.post(Event::Animation {
                kind,
                animator: AnimatorId::default(),
            });
        }

        dispatcher.dispatch_posted();

        assert_eq!(
            *log.borrow(),
            vec![
                AnimationEventKind::Start,
                AnimationEventKind::Reset,
                AnimationEventKind::Finish,
            ]
        );
    }
}
