//! Animator nodes and the animator arena
//!
//! Animators form trees of their own: combinators (sequence, parallel,
//! repeat, ease) drive leaf animators (fade, move, rotate, scale, shake)
//! by setting their progress. The whole tree lives in [`Animators`], an
//! arena owned next to the scene graph; an animator targets an actor by
//! id and mutates it through the graph on every progress change.
//!
//! A node's state machine: `start` (or `play`) rewinds and runs it,
//! `update` advances it by wall-clock time, crossing the length finishes
//! it (dispatching an animation-finish event) and stops it. Zero-length
//! animators run forever with progress pinned at zero.

use crate::events::{AnimationEventKind, Event, EventDispatcher};
use crate::scene::{ActorId, SceneGraph};
use slotmap::{new_key_type, SlotMap};

use super::animators::AnimatorKind;

new_key_type! {
    /// Generational id of an animator node
    pub struct AnimatorId;
}

/// One node of an animator tree
pub struct Animator {
    pub(crate) kind: AnimatorKind,
    pub(crate) length: f32,
    pub(crate) current_time: f32,
    pub(crate) progress: f32,
    pub(crate) running: bool,
    pub(crate) done: bool,

    /// Actor this node is explicitly attached to
    pub(crate) actor: Option<ActorId>,
    /// Actor resolved at play time (own attachment, else the parent's)
    pub(crate) target_actor: Option<ActorId>,

    pub(crate) parent: Option<AnimatorId>,
    pub(crate) children: Vec<AnimatorId>,
    pub(crate) owned_children: Vec<AnimatorId>,
}

impl Animator {
    pub(crate) fn new(kind: AnimatorKind, length: f32) -> Self {
        Self {
            kind,
            length,
            current_time: 0.0,
            progress: 0.0,
            running: false,
            done: false,
            actor: None,
            target_actor: None,
            parent: None,
            children: Vec::new(),
            owned_children: Vec::new(),
        }
    }

    /// Total duration in seconds; zero means the animator never finishes
    pub fn length(&self) -> f32 {
        self.length
    }

    /// Elapsed time in seconds
    pub fn current_time(&self) -> f32 {
        self.current_time
    }

    /// Progress in [0, 1] (after easing, for ease nodes)
    pub fn progress(&self) -> f32 {
        self.progress
    }

    /// Whether the animator is advancing
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Whether the animator has reached its end
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// The actor this node is explicitly attached to
    pub fn actor(&self) -> Option<ActorId> {
        self.actor
    }

    /// The actor resolved at the last play
    pub fn target_actor(&self) -> Option<ActorId> {
        self.target_actor
    }

    /// Child animators in attach order
    pub fn children(&self) -> &[AnimatorId] {
        &self.children
    }
}

/// Arena of animator trees
///
/// All id-taking methods panic on stale ids, matching the scene graph's
/// hard-error surface for invariant violations.
#[derive(Default)]
pub struct Animators {
    pub(crate) animators: SlotMap<AnimatorId, Animator>,
}

impl Animators {
    /// Create an empty arena
    pub fn new() -> Self {
        Self::default()
    }

    /// Borrow an animator
    ///
    /// # Panics
    /// Panics if `id` is stale.
    pub fn animator(&self, id: AnimatorId) -> &Animator {
        &self.animators[id]
    }

    /// Borrow an animator if it is still alive
    pub fn get_animator(&self, id: AnimatorId) -> Option<&Animator> {
        self.animators.get(id)
    }

    /// Attach an animator to an actor; it becomes the target for this node
    /// and any descendants without their own attachment
    pub fn set_actor(&mut self, id: AnimatorId, actor: Option<ActorId>) {
        self.animators[id].actor = actor;
    }

    /// Attach `child` under `parent` without taking ownership; reparents if
    /// the child was attached elsewhere
    pub fn add_animator(&mut self, parent: AnimatorId, child: AnimatorId) {
        self.attach(parent, child, false);
    }

    /// Attach `child` under `parent`, destroying it with the parent
    pub fn add_owned_animator(&mut self, parent: AnimatorId, child: AnimatorId) {
        self.attach(parent, child, true);
    }

    pub(crate) fn attach(&mut self, parent: AnimatorId, child: AnimatorId, owned: bool) {
        assert!(self.animators.contains_key(child), "attach: stale animator id");
        self.detach_from_parent(child);

        self.animators[parent].children.push(child);
        if owned {
            self.animators[parent].owned_children.push(child);
        }
        self.animators[child].parent = Some(parent);
    }

    /// Remove a direct child; an owned child is destroyed
    ///
    /// Returns `false` when `child` is not a direct child of `parent`.
    pub fn remove_animator(&mut self, parent: AnimatorId, child: AnimatorId) -> bool {
        let holder = &mut self.animators[parent];
        let Some(position) = holder.children.iter().position(|&c| c == child) else {
            return false;
        };
        holder.children.remove(position);
        let owned = if let Some(position) = holder.owned_children.iter().position(|&c| c == child) {
            holder.owned_children.remove(position);
            true
        } else {
            false
        };

        self.animators[child].parent = None;
        if owned {
            self.despawn(child);
        }
        true
    }

    /// Detach every child of an animator; owned children are destroyed
    pub fn remove_all_animators(&mut self, parent: AnimatorId) {
        let children = self.animators[parent].children.clone();
        for child in children {
            self.remove_animator(parent, child);
        }
    }

    /// Destroy an animator and its owned descendants; referenced children
    /// are detached and stay alive
    ///
    /// # Panics
    /// Panics if `id` is stale.
    pub fn destroy_animator(&mut self, id: AnimatorId) {
        assert!(
            self.animators.contains_key(id),
            "destroy_animator: stale animator id"
        );
        self.detach_from_parent(id);
        self.despawn(id);
    }

    fn despawn(&mut self, id: AnimatorId) {
        let children = self.animators[id].children.clone();
        let owned_children = self.animators[id].owned_children.clone();
        for child in children {
            if owned_children.contains(&child) {
                self.despawn(child);
            } else {
                self.animators[child].parent = None;
            }
        }
        self.animators.remove(id);
    }

    fn detach_from_parent(&mut self, child: AnimatorId) {
        if let Some(parent) = self.animators[child].parent {
            let holder = &mut self.animators[parent];
            holder.children.retain(|&c| c != child);
            holder.owned_children.retain(|&c| c != child);
            self.animators[child].parent = None;
        }
    }

    // State machine

    /// Rewind and run an animator, dispatching an animation-start event
    pub fn start(
        &mut self,
        id: AnimatorId,
        graph: &mut SceneGraph,
        dispatcher: &mut EventDispatcher,
    ) {
        self.play(id, graph, dispatcher);
        dispatcher.dispatch(&Event::Animation {
            kind: AnimationEventKind::Start,
            animator: id,
        });
    }

    /// Rewind and run an animator without dispatching a start event
    ///
    /// The target actor is resolved here: the node's own attachment, or
    /// the nearest ancestor's resolved target. Leaf animators snapshot
    /// their start values from the target.
    pub fn play(
        &mut self,
        id: AnimatorId,
        graph: &mut SceneGraph,
        dispatcher: &mut EventDispatcher,
    ) {
        {
            let node = &mut self.animators[id];
            node.done = false;
            node.running = true;
        }

        let target = self.animators[id].actor.or_else(|| {
            self.animators[id]
                .parent
                .and_then(|parent| self.animators[parent].target_actor)
        });
        self.animators[id].target_actor = target;

        self.on_play(id, graph);

        // A sequence plays only its first child; everything else plays all
        if matches!(self.animators[id].kind, AnimatorKind::Sequence { .. }) {
            if let Some(&first) = self.animators[id].children.first() {
                self.play(first, graph, dispatcher);
            }
        } else {
            let children = self.animators[id].children.clone();
            for child in children {
                self.play(child, graph, dispatcher);
            }
        }

        self.set_progress(id, 0.0, graph, dispatcher);
    }

    /// Advance a running animator by `delta` seconds
    ///
    /// Crossing the length pins progress at 1, stops the animator, and
    /// dispatches an animation-finish event. Not-running animators ignore
    /// updates.
    pub fn update(
        &mut self,
        id: AnimatorId,
        delta: f32,
        graph: &mut SceneGraph,
        dispatcher: &mut EventDispatcher,
    ) {
        if !self.animators[id].running {
            return;
        }

        {
            let node = &mut self.animators[id];
            if node.length == 0.0 {
                // Never-ending animation
                node.current_time += delta;
                node.progress = 0.0;
            } else if node.current_time + delta >= node.length {
                node.done = true;
                node.running = false;
                node.progress = 1.0;
                node.current_time = node.length;
            } else {
                node.current_time += delta;
                node.progress = node.current_time / node.length;
            }
        }

        if self.animators[id].done {
            dispatcher.dispatch(&Event::Animation {
                kind: AnimationEventKind::Finish,
                animator: id,
            });
        }

        self.update_progress(id, graph, dispatcher);
    }

    /// Keep a stopped animator's progress and run it again
    pub fn resume(&mut self, id: AnimatorId) {
        self.animators[id].running = true;
    }

    /// Stop an animator, optionally rewinding it and its children
    pub fn stop(
        &mut self,
        id: AnimatorId,
        reset_animation: bool,
        graph: &mut SceneGraph,
        dispatcher: &mut EventDispatcher,
    ) {
        self.animators[id].running = false;
        if reset_animation {
            self.reset(id, graph, dispatcher);
        }
    }

    /// Rewind an animator; children rewind in reverse order so sequences
    /// end up at their first step
    pub fn reset(
        &mut self,
        id: AnimatorId,
        graph: &mut SceneGraph,
        dispatcher: &mut EventDispatcher,
    ) {
        self.animators[id].done = false;
        self.set_progress(id, 0.0, graph, dispatcher);

        if let AnimatorKind::Repeat { current_count, .. } = &mut self.animators[id].kind {
            *current_count = 0;
        }

        let children = self.animators[id].children.clone();
        for child in children.into_iter().rev() {
            self.reset(child, graph, dispatcher);
        }
    }

    /// Set an animator's progress directly, applying its effect
    pub fn set_progress(
        &mut self,
        id: AnimatorId,
        progress: f32,
        graph: &mut SceneGraph,
        dispatcher: &mut EventDispatcher,
    ) {
        {
            let node = &mut self.animators[id];
            node.progress = progress;
            node.current_time = progress * node.length;
        }
        self.update_progress(id, graph, dispatcher);
    }
}
