//! Concrete animators
//!
//! Leaf animators (fade, translate, rotate, scale, shake) snapshot their
//! start state when played and interpolate the target actor's property
//! from progress. Combinators (sequence, parallel, repeat, ease) never
//! touch actors; they drive their children's progress.

use crate::events::{AnimationEventKind, Event, EventDispatcher};
use crate::foundation::math::{smooth_step, Quat, Vec3};
use crate::scene::{ActorId, SceneGraph};
use rand::Rng;

use super::animator::{Animator, AnimatorId, Animators};
use super::easing::{self, EasingFunc, EasingMode};

/// What an animator node does with its progress
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnimatorKind {
    /// Children run one after another; length is the sum of theirs
    Sequence {
        /// The child currently being advanced
        current: Option<AnimatorId>,
    },
    /// Children run together; length is the longest child's
    Parallel,
    /// One child repeated `count` times (0 = forever)
    Repeat {
        /// Requested cycle count
        count: u32,
        /// Completed cycles so far
        current_count: u32,
    },
    /// Remaps one child's progress through an easing curve
    Ease {
        /// The curve
        func: EasingFunc,
        /// Which end accelerates
        mode: EasingMode,
    },
    /// Interpolates the target actor's opacity
    Fade {
        /// Goal opacity, absolute or relative to the start
        target: f32,
        /// Whether `target` is an offset from the start value
        relative: bool,
        /// Opacity snapshotted at play
        start: f32,
        /// Resolved goal minus start
        diff: f32,
    },
    /// Interpolates the target actor's position
    Move {
        /// Goal position, absolute or relative
        target: Vec3,
        /// Whether `target` is an offset from the start value
        relative: bool,
        /// Position snapshotted at play
        start: Vec3,
        /// Resolved goal minus start
        diff: Vec3,
    },
    /// Interpolates the target actor's rotation through Euler angles
    Rotate {
        /// Goal Euler angles, absolute or relative
        target: Vec3,
        /// Whether `target` is an offset from the start value
        relative: bool,
        /// Euler angles snapshotted at play
        start: Vec3,
        /// Resolved goal minus start
        diff: Vec3,
    },
    /// Interpolates the target actor's scale
    Scale {
        /// Goal scale, absolute or relative
        target: Vec3,
        /// Whether `target` is an offset from the start value
        relative: bool,
        /// Scale snapshotted at play
        start: Vec3,
        /// Resolved goal minus start
        diff: Vec3,
    },
    /// Jitters the target actor's position with seeded bucket noise
    Shake {
        /// Maximum displacement per axis
        distance: Vec3,
        /// Noise buckets per second of animation
        time_scale: f32,
        /// Per-axis noise seeds, drawn at construction
        seeds: [u32; 3],
        /// Position snapshotted at play; shaking is relative to it
        start: Vec3,
    },
}

/// 32-bit FNV-1 over the little-endian bytes of a bucket index
fn fnv1_hash(value: u64) -> u32 {
    const PRIME: u32 = 16_777_619;
    let mut hash: u32 = 0x811c_9dc5;
    for byte in value.to_le_bytes() {
        hash = hash.wrapping_mul(PRIME) ^ u32::from(byte);
    }
    hash
}

/// Noise in [-1, 1] scaled by `distance`, for bucket `index` of `seed`
fn shake_noise(seed: u32, index: u64, distance: f32) -> f32 {
    let hash = fnv1_hash(u64::from(seed) | (index << 32));
    (2.0 * (hash as f32 / u32::MAX as f32) - 1.0) * distance
}

// Constructors
impl Animators {
    fn insert(&mut self, kind: AnimatorKind, length: f32) -> AnimatorId {
        self.animators.insert(Animator::new(kind, length))
    }

    /// Animate the target's opacity to `opacity` (or by `opacity` when
    /// relative) over `length` seconds
    pub fn fade(&mut self, length: f32, opacity: f32, relative: bool) -> AnimatorId {
        self.insert(
            AnimatorKind::Fade {
                target: opacity,
                relative,
                start: 0.0,
                diff: 0.0,
            },
            length,
        )
    }

    /// Animate the target's position to `position` (or by `position` when
    /// relative) over `length` seconds
    pub fn translate(&mut self, length: f32, position: Vec3, relative: bool) -> AnimatorId {
        self.insert(
            AnimatorKind::Move {
                target: position,
                relative,
                start: Vec3::zeros(),
                diff: Vec3::zeros(),
            },
            length,
        )
    }

    /// Animate the target's rotation to the Euler angles `rotation` (or by
    /// them when relative) over `length` seconds
    pub fn rotate(&mut self, length: f32, rotation: Vec3, relative: bool) -> AnimatorId {
        self.insert(
            AnimatorKind::Rotate {
                target: rotation,
                relative,
                start: Vec3::zeros(),
                diff: Vec3::zeros(),
            },
            length,
        )
    }

    /// Animate the target's scale to `scale` (or by `scale` when relative)
    /// over `length` seconds
    pub fn scale(&mut self, length: f32, scale: Vec3, relative: bool) -> AnimatorId {
        self.insert(
            AnimatorKind::Scale {
                target: scale,
                relative,
                start: Vec3::zeros(),
                diff: Vec3::zeros(),
            },
            length,
        )
    }

    /// Jitter the target's position within `distance` per axis for
    /// `length` seconds, changing direction `time_scale` times per second
    ///
    /// Seeds are drawn from the caller's random source, so a seeded
    /// generator reproduces the exact same shake.
    pub fn shake<R: Rng + ?Sized>(
        &mut self,
        length: f32,
        distance: Vec3,
        time_scale: f32,
        rng: &mut R,
    ) -> AnimatorId {
        self.insert(
            AnimatorKind::Shake {
                distance,
                time_scale,
                seeds: [rng.gen(), rng.gen(), rng.gen()],
                start: Vec3::zeros(),
            },
            length,
        )
    }

    /// Run `children` one after another, taking ownership of them
    pub fn sequence(&mut self, children: Vec<AnimatorId>) -> AnimatorId {
        let length = children
            .iter()
            .map(|&child| self.animators[child].length)
            .sum();
        let id = self.insert(AnimatorKind::Sequence { current: None }, length);
        for child in children {
            self.add_owned_animator(id, child);
        }
        id
    }

    /// Run `children` simultaneously, taking ownership of them
    pub fn parallel(&mut self, children: Vec<AnimatorId>) -> AnimatorId {
        let length = children
            .iter()
            .map(|&child| self.animators[child].length)
            .fold(0.0, f32::max);
        let id = self.insert(AnimatorKind::Parallel, length);
        for child in children {
            self.add_owned_animator(id, child);
        }
        id
    }

    /// Repeat `child` `count` times (0 = forever), taking ownership
    pub fn repeat(&mut self, child: AnimatorId, count: u32) -> AnimatorId {
        let length = self.animators[child].length * count as f32;
        let id = self.insert(
            AnimatorKind::Repeat {
                count,
                current_count: 0,
            },
            length,
        );
        self.add_owned_animator(id, child);
        id
    }

    /// Remap `child`'s progress through an easing curve, taking ownership
    pub fn ease(&mut self, child: AnimatorId, func: EasingFunc, mode: EasingMode) -> AnimatorId {
        let length = self.animators[child].length;
        let id = self.insert(AnimatorKind::Ease { func, mode }, length);
        self.add_owned_animator(id, child);
        id
    }
}

// Progress application
impl Animators {
    fn live_target(&self, id: AnimatorId, graph: &SceneGraph) -> Option<ActorId> {
        self.animators[id]
            .target_actor
            .filter(|&actor| graph.get_actor(actor).is_some())
    }

    /// Kind-specific play behavior: snapshot start state for leaves, pick
    /// the first child for sequences
    pub(crate) fn on_play(&mut self, id: AnimatorId, graph: &SceneGraph) {
        let target = self.live_target(id, graph);
        match self.animators[id].kind {
            AnimatorKind::Sequence { .. } => {
                let first = self.animators[id].children.first().copied();
                if let AnimatorKind::Sequence { current } = &mut self.animators[id].kind {
                    *current = first;
                }
            }
            AnimatorKind::Fade {
                target: goal,
                relative,
                ..
            } => {
                if let Some(actor) = target {
                    let start = graph.actor(actor).opacity();
                    let end = if relative { start + goal } else { goal };
                    if let AnimatorKind::Fade { start: s, diff, .. } = &mut self.animators[id].kind
                    {
                        *s = start;
                        *diff = end - start;
                    }
                }
            }
            AnimatorKind::Move {
                target: goal,
                relative,
                ..
            } => {
                if let Some(actor) = target {
                    let start = graph.actor(actor).position();
                    let end = if relative { start + goal } else { goal };
                    if let AnimatorKind::Move { start: s, diff, .. } = &mut self.animators[id].kind
                    {
                        *s = start;
                        *diff = end - start;
                    }
                }
            }
            AnimatorKind::Rotate {
                target: goal,
                relative,
                ..
            } => {
                if let Some(actor) = target {
                    let (roll, pitch, yaw) = graph.actor(actor).rotation().euler_angles();
                    let start = Vec3::new(roll, pitch, yaw);
                    let end = if relative { start + goal } else { goal };
                    if let AnimatorKind::Rotate { start: s, diff, .. } =
                        &mut self.animators[id].kind
                    {
                        *s = start;
                        *diff = end - start;
                    }
                }
            }
            AnimatorKind::Scale {
                target: goal,
                relative,
                ..
            } => {
                if let Some(actor) = target {
                    let start = graph.actor(actor).scale();
                    let end = if relative {
                        start + goal
                    } else {
                        goal
                    };
                    if let AnimatorKind::Scale { start: s, diff, .. } = &mut self.animators[id].kind
                    {
                        *s = start;
                        *diff = end - start;
                    }
                }
            }
            AnimatorKind::Shake { .. } => {
                if let Some(actor) = target {
                    let position = graph.actor(actor).position();
                    if let AnimatorKind::Shake { start, .. } = &mut self.animators[id].kind {
                        *start = position;
                    }
                }
            }
            AnimatorKind::Parallel | AnimatorKind::Repeat { .. } | AnimatorKind::Ease { .. } => {}
        }
    }

    /// Apply the node's current progress: mutate the target actor (leaves)
    /// or drive children (combinators)
    pub(crate) fn update_progress(
        &mut self,
        id: AnimatorId,
        graph: &mut SceneGraph,
        dispatcher: &mut EventDispatcher,
    ) {
        match self.animators[id].kind {
            AnimatorKind::Ease { func, mode } => {
                let Some(&first) = self.animators[id].children.first() else {
                    return;
                };
                let eased = easing::ease(func, mode, self.animators[id].progress);
                self.animators[id].progress = eased;
                self.set_progress(first, eased, graph, dispatcher);
            }

            AnimatorKind::Parallel => {
                let current_time = self.animators[id].current_time;
                let children = self.animators[id].children.clone();
                for child in children {
                    let child_length = self.animators[child].length;
                    let progress = if child_length <= 0.0 || current_time > child_length {
                        1.0
                    } else {
                        current_time / child_length
                    };
                    self.set_progress(child, progress, graph, dispatcher);
                }
            }

            AnimatorKind::Sequence { current } => {
                let current_time = self.animators[id].current_time;
                let children = self.animators[id].children.clone();
                let mut current = current;
                let mut time = 0.0;
                for child in children {
                    let child_length = self.animators[child].length;
                    if child_length <= 0.0 || current_time > time + child_length {
                        // Past this child; pin it once while it is current
                        if current == Some(child) {
                            self.set_progress(child, 1.0, graph, dispatcher);
                        }
                    } else if current_time <= time {
                        // Not reached yet
                        if current == Some(child) {
                            self.set_progress(child, 0.0, graph, dispatcher);
                        }
                    } else {
                        if current != Some(child) {
                            current = Some(child);
                            self.play(child, graph, dispatcher);
                        }
                        self.set_progress(
                            child,
                            (current_time - time) / child_length,
                            graph,
                            dispatcher,
                        );
                    }
                    time += child_length;
                }
                if let AnimatorKind::Sequence { current: stored } = &mut self.animators[id].kind {
                    *stored = current;
                }
            }

            AnimatorKind::Repeat {
                count,
                current_count,
            } => {
                let Some(&child) = self.animators[id].children.first() else {
                    return;
                };
                let child_length = self.animators[child].length;
                if child_length == 0.0 {
                    return;
                }

                let current_time = self.animators[id].current_time;
                let new_count = (current_time / child_length) as u32;

                if count == 0 || new_count < count {
                    {
                        let node = &mut self.animators[id];
                        node.done = false;
                        node.running = true;
                    }

                    let remaining = current_time - child_length * new_count as f32;
                    self.set_progress(child, remaining / child_length, graph, dispatcher);

                    // One reset notification per completed cycle
                    for _ in current_count..new_count {
                        dispatcher.dispatch(&Event::Animation {
                            kind: AnimationEventKind::Reset,
                            animator: id,
                        });
                    }
                    if let AnimatorKind::Repeat {
                        current_count: stored,
                        ..
                    } = &mut self.animators[id].kind
                    {
                        *stored = new_count;
                    }
                } else {
                    let already_done = self.animators[id].done;
                    {
                        let node = &mut self.animators[id];
                        node.done = true;
                        node.running = false;
                        node.current_time = node.length;
                        node.progress = 1.0;
                    }
                    if let AnimatorKind::Repeat {
                        current_count: stored,
                        ..
                    } = &mut self.animators[id].kind
                    {
                        *stored = new_count;
                    }
                    if !already_done {
                        dispatcher.dispatch(&Event::Animation {
                            kind: AnimationEventKind::Finish,
                            animator: id,
                        });
                    }
                }
            }

            AnimatorKind::Fade { start, diff, .. } => {
                if let Some(actor) = self.live_target(id, graph) {
                    let progress = self.animators[id].progress;
                    graph.set_opacity(actor, start + diff * progress);
                }
            }

            AnimatorKind::Move { start, diff, .. } => {
                if let Some(actor) = self.live_target(id, graph) {
                    let progress = self.animators[id].progress;
                    graph.set_position(actor, start + diff * progress);
                }
            }

            AnimatorKind::Rotate { start, diff, .. } => {
                if let Some(actor) = self.live_target(id, graph) {
                    let progress = self.animators[id].progress;
                    let angles = start + diff * progress;
                    graph.set_rotation(
                        actor,
                        Quat::from_euler_angles(angles.x, angles.y, angles.z),
                    );
                }
            }

            AnimatorKind::Scale { start, diff, .. } => {
                if let Some(actor) = self.live_target(id, graph) {
                    let progress = self.animators[id].progress;
                    graph.set_scale(actor, start + diff * progress);
                }
            }

            AnimatorKind::Shake {
                distance,
                time_scale,
                seeds,
                start,
            } => {
                if let Some(actor) = self.live_target(id, graph) {
                    let node = &self.animators[id];
                    let x = node.length * node.progress * time_scale;

                    let x1 = x as u64;
                    let x2 = x1 + 1;
                    let t = x - x1 as f32;

                    let mut previous = Vec3::zeros();
                    let mut next = Vec3::zeros();

                    if x1 != 0 {
                        previous = Vec3::new(
                            shake_noise(seeds[0], x1, distance.x),
                            shake_noise(seeds[1], x1, distance.y),
                            shake_noise(seeds[2], x1, distance.z),
                        );
                    }
                    // The last bucket eases back to rest
                    if x2 != u64::from(time_scale as u32) {
                        next = Vec3::new(
                            shake_noise(seeds[0], x2, distance.x),
                            shake_noise(seeds[1], x2, distance.y),
                            shake_noise(seeds[2], x2, distance.z),
                        );
                    }

                    let noise = Vec3::new(
                        smooth_step(previous.x, next.x, t),
                        smooth_step(previous.y, next.y, t),
                        smooth_step(previous.z, next.z, t),
                    );

                    graph.set_position(actor, start + noise);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Actor;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn setup() -> (SceneGraph, Animators, EventDispatcher, ActorId) {
        let mut graph = SceneGraph::new();
        let actor = graph.spawn(Actor::new());
        (graph, Animators::new(), EventDispatcher::new(), actor)
    }

    fn event_log(
        dispatcher: &mut EventDispatcher,
    ) -> Rc<RefCell<Vec<AnimationEventKind>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let log_handle = Rc::clone(&log);
        dispatcher.add_handler(
            0,
            Box::new(move |event| {
                if let Event::Animation { kind, .. } = event {
                    log_handle.borrow_mut().push(*kind);
                }
                false
            }),
        );
        log
    }

    #[test]
    fn test_move_absolute() {
        let (mut graph, mut animators, mut dispatcher, actor) = setup();
        let id = animators.translate(2.0, Vec3::new(10.0, 0.0, 0.0), false);
        animators.set_actor(id, Some(actor));

        animators.start(id, &mut graph, &mut dispatcher);
        animators.update(id, 1.0, &mut graph, &mut dispatcher);

        assert_relative_eq!(graph.actor(actor).position().x, 5.0);
        assert!(animators.animator(id).is_running());
    }

    #[test]
    fn test_move_relative_from_offset_start() {
        let (mut graph, mut animators, mut dispatcher, actor) = setup();
        graph.set_position(actor, Vec3::new(3.0, 0.0, 0.0));

        let id = animators.translate(1.0, Vec3::new(10.0, 0.0, 0.0), true);
        animators.set_actor(id, Some(actor));

        animators.start(id, &mut graph, &mut dispatcher);
        animators.update(id, 1.0, &mut graph, &mut dispatcher);

        assert_relative_eq!(graph.actor(actor).position().x, 13.0);
        assert!(animators.animator(id).is_done());
    }

    #[test]
    fn test_fade_clamps_through_actor() {
        let (mut graph, mut animators, mut dispatcher, actor) = setup();
        let id = animators.fade(1.0, 2.0, false);
        animators.set_actor(id, Some(actor));

        animators.start(id, &mut graph, &mut dispatcher);
        animators.update(id, 1.0, &mut graph, &mut dispatcher);

        // Actor opacity saturates at 1 even though the goal exceeds it
        assert_relative_eq!(graph.actor(actor).opacity(), 1.0);
    }

    #[test]
    fn test_rotate_relative() {
        let (mut graph, mut animators, mut dispatcher, actor) = setup();
        let id = animators.rotate(1.0, Vec3::new(0.0, 0.0, std::f32::consts::FRAC_PI_2), true);
        animators.set_actor(id, Some(actor));

        animators.start(id, &mut graph, &mut dispatcher);
        animators.update(id, 1.0, &mut graph, &mut dispatcher);

        let (_, _, yaw) = graph.actor(actor).rotation().euler_angles();
        assert_relative_eq!(yaw, std::f32::consts::FRAC_PI_2, epsilon = 1e-4);
    }

    #[test]
    fn test_scale_absolute() {
        let (mut graph, mut animators, mut dispatcher, actor) = setup();
        let id = animators.scale(2.0, Vec3::new(3.0, 3.0, 3.0), false);
        animators.set_actor(id, Some(actor));

        animators.start(id, &mut graph, &mut dispatcher);
        animators.update(id, 1.0, &mut graph, &mut dispatcher);

        // Halfway from (1,1,1) to (3,3,3)
        assert_relative_eq!(graph.actor(actor).scale().x, 2.0);
    }

    #[test]
    fn test_sequence_windows_children() {
        let (mut graph, mut animators, mut dispatcher, actor) = setup();
        let first = animators.translate(1.0, Vec3::new(10.0, 0.0, 0.0), false);
        let second = animators.translate(2.0, Vec3::new(20.0, 0.0, 0.0), false);
        let sequence = animators.sequence(vec![first, second]);
        animators.set_actor(sequence, Some(actor));

        animators.start(sequence, &mut graph, &mut dispatcher);
        assert_relative_eq!(animators.animator(sequence).length(), 3.0);

        animators.update(sequence, 1.5, &mut graph, &mut dispatcher);

        // First child finished, second a quarter through its window
        assert_relative_eq!(animators.animator(first).progress(), 1.0);
        assert_relative_eq!(animators.animator(second).progress(), 0.25);
        // Second child started from the first child's end position
        assert_relative_eq!(graph.actor(actor).position().x, 12.5);
    }

    #[test]
    fn test_parallel_clamps_shorter_children() {
        let (mut graph, mut animators, mut dispatcher, actor) = setup();
        let short = animators.fade(1.0, 0.0, false);
        let long = animators.translate(2.0, Vec3::new(10.0, 0.0, 0.0), false);
        let parallel = animators.parallel(vec![short, long]);
        animators.set_actor(parallel, Some(actor));

        animators.start(parallel, &mut graph, &mut dispatcher);
        assert_relative_eq!(animators.animator(parallel).length(), 2.0);

        animators.update(parallel, 1.5, &mut graph, &mut dispatcher);

        assert_relative_eq!(animators.animator(short).progress(), 1.0);
        assert_relative_eq!(animators.animator(long).progress(), 0.75);
    }

    #[test]
    fn test_repeat_boundary() {
        let (mut graph, mut animators, mut dispatcher, actor) = setup();
        let child = animators.translate(1.0, Vec3::new(10.0, 0.0, 0.0), false);
        let repeat = animators.repeat(child, 3);
        animators.set_actor(repeat, Some(actor));
        let log = event_log(&mut dispatcher);

        animators.start(repeat, &mut graph, &mut dispatcher);
        assert_relative_eq!(animators.animator(repeat).length(), 3.0);

        // Just before the last cycle ends: two completed cycles, running
        animators.update(repeat, 2.999, &mut graph, &mut dispatcher);
        assert!(animators.animator(repeat).is_running());
        assert!(!animators.animator(repeat).is_done());
        assert!(matches!(
            animators.animator(repeat).kind,
            AnimatorKind::Repeat { current_count: 2, .. }
        ));
        assert_relative_eq!(animators.animator(child).progress(), 0.999, epsilon = 1e-3);

        // Crossing the length finishes exactly once
        animators.update(repeat, 0.001, &mut graph, &mut dispatcher);
        assert!(animators.animator(repeat).is_done());
        assert!(!animators.animator(repeat).is_running());

        let log = log.borrow();
        let resets = log
            .iter()
            .filter(|&&kind| kind == AnimationEventKind::Reset)
            .count();
        let finishes = log
            .iter()
            .filter(|&&kind| kind == AnimationEventKind::Finish)
            .count();
        assert_eq!(resets, 2);
        assert_eq!(finishes, 1);
    }

    #[test]
    fn test_repeat_forever_never_finishes() {
        let (mut graph, mut animators, mut dispatcher, actor) = setup();
        let child = animators.translate(1.0, Vec3::new(10.0, 0.0, 0.0), false);
        let repeat = animators.repeat(child, 0);
        animators.set_actor(repeat, Some(actor));

        animators.start(repeat, &mut graph, &mut dispatcher);
        // Length 0 runs forever
        animators.update(repeat, 100.0, &mut graph, &mut dispatcher);
        assert!(animators.animator(repeat).is_running());
        assert!(!animators.animator(repeat).is_done());
    }

    #[test]
    fn test_ease_remaps_child_progress() {
        let (mut graph, mut animators, mut dispatcher, actor) = setup();
        let child = animators.translate(2.0, Vec3::new(10.0, 0.0, 0.0), false);
        let ease = animators.ease(child, EasingFunc::Quad, EasingMode::In);
        animators.set_actor(ease, Some(actor));

        animators.start(ease, &mut graph, &mut dispatcher);
        animators.update(ease, 1.0, &mut graph, &mut dispatcher);

        // Raw progress 0.5 remapped to 0.25
        assert_relative_eq!(animators.animator(child).progress(), 0.25);
        assert_relative_eq!(graph.actor(actor).position().x, 2.5);
    }

    #[test]
    fn test_shake_is_deterministic_per_seed() {
        let run = || {
            let (mut graph, mut animators, mut dispatcher, actor) = setup();
            let mut rng = StdRng::seed_from_u64(7);
            let id = animators.shake(2.0, Vec3::new(10.0, 10.0, 0.0), 30.0, &mut rng);
            animators.set_actor(id, Some(actor));
            animators.start(id, &mut graph, &mut dispatcher);
            animators.update(id, 0.7, &mut graph, &mut dispatcher);
            graph.actor(actor).position()
        };

        let first = run();
        let second = run();
        assert_relative_eq!(first.x, second.x);
        assert_relative_eq!(first.y, second.y);

        // The shake actually displaces the actor
        assert!(first.x.abs() + first.y.abs() > 0.0);
        assert!(first.x.abs() <= 10.0 && first.y.abs() <= 10.0);
    }

    #[test]
    fn test_zero_length_runs_forever() {
        let (mut graph, mut animators, mut dispatcher, actor) = setup();
        let id = animators.fade(0.0, 0.5, false);
        animators.set_actor(id, Some(actor));
        let log = event_log(&mut dispatcher);

        animators.start(id, &mut graph, &mut dispatcher);
        animators.update(id, 1000.0, &mut graph, &mut dispatcher);

        assert!(animators.animator(id).is_running());
        assert!(!animators.animator(id).is_done());
        assert_relative_eq!(animators.animator(id).progress(), 0.0);
        assert!(!log.borrow().contains(&AnimationEventKind::Finish));
    }

    #[test]
    fn test_missing_target_is_silent() {
        let (mut graph, mut animators, mut dispatcher, _) = setup();
        let id = animators.translate(1.0, Vec3::new(10.0, 0.0, 0.0), false);

        // No actor attached anywhere; nothing to mutate, nothing to panic
        animators.start(id, &mut graph, &mut dispatcher);
        animators.update(id, 0.5, &mut graph, &mut dispatcher);
        assert!(animators.animator(id).is_running());
    }

    #[test]
    fn test_destroyed_target_is_skipped() {
        let (mut graph, mut animators, mut dispatcher, actor) = setup();
        let id = animators.translate(1.0, Vec3::new(10.0, 0.0, 0.0), false);
        animators.set_actor(id, Some(actor));

        animators.start(id, &mut graph, &mut dispatcher);
        graph.destroy_actor(actor);
        animators.update(id, 0.5, &mut graph, &mut dispatcher);
    }

    #[test]
    fn test_start_and_finish_events() {
        let (mut graph, mut animators, mut dispatcher, actor) = setup();
        let id = animators.translate(1.0, Vec3::new(10.0, 0.0, 0.0), false);
        animators.set_actor(id, Some(actor));
        let log = event_log(&mut dispatcher);

        animators.start(id, &mut graph, &mut dispatcher);
        animators.update(id, 2.0, &mut graph, &mut dispatcher);
        animators.update(id, 1.0, &mut graph, &mut dispatcher);

        assert_eq!(
            *log.borrow(),
            vec![AnimationEventKind::Start, AnimationEventKind::Finish]
        );
    }

    #[test]
    fn test_stop_and_resume() {
        let (mut graph, mut animators, mut dispatcher, actor) = setup();
        let id = animators.translate(2.0, Vec3::new(10.0, 0.0, 0.0), false);
        animators.set_actor(id, Some(actor));

        animators.start(id, &mut graph, &mut dispatcher);
        animators.update(id, 1.0, &mut graph, &mut dispatcher);
        animators.stop(id, false, &mut graph, &mut dispatcher);
        animators.update(id, 1.0, &mut graph, &mut dispatcher);
        assert_relative_eq!(animators.animator(id).progress(), 0.5);

        animators.resume(id);
        animators.update(id, 0.5, &mut graph, &mut dispatcher);
        assert_relative_eq!(animators.animator(id).progress(), 0.75);
    }

    #[test]
    fn test_reset_rewinds_sequence_children() {
        let (mut graph, mut animators, mut dispatcher, actor) = setup();
        let first = animators.translate(1.0, Vec3::new(10.0, 0.0, 0.0), false);
        let second = animators.translate(1.0, Vec3::new(20.0, 0.0, 0.0), false);
        let sequence = animators.sequence(vec![first, second]);
        animators.set_actor(sequence, Some(actor));

        animators.start(sequence, &mut graph, &mut dispatcher);
        animators.update(sequence, 1.5, &mut graph, &mut dispatcher);
        animators.stop(sequence, true, &mut graph, &mut dispatcher);

        assert!(!animators.animator(sequence).is_done());
        assert_relative_eq!(animators.animator(sequence).progress(), 0.0);
        assert_relative_eq!(animators.animator(first).progress(), 0.0);
        assert_relative_eq!(animators.animator(second).progress(), 0.0);
    }

    #[test]
    fn test_remove_animator_ownership() {
        let (_, mut animators, _, _) = setup();
        let owned = animators.translate(1.0, Vec3::zeros(), false);
        let referenced = animators.translate(1.0, Vec3::zeros(), false);
        let parent = animators.translate(1.0, Vec3::zeros(), false);

        animators.add_owned_animator(parent, owned);
        animators.add_animator(parent, referenced);

        assert!(animators.remove_animator(parent, owned));
        assert!(animators.get_animator(owned).is_none());

        assert!(animators.remove_animator(parent, referenced));
        assert!(animators.get_animator(referenced).is_some());
        assert!(!animators.remove_animator(parent, referenced));
    }
}
