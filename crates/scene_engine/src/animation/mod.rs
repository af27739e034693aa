//! Property animation
//!
//! Animator trees drive actor properties over time. Leaves interpolate a
//! single property (opacity, position, rotation, scale, or a seeded
//! positional shake); combinators sequence, parallelize, repeat, or ease
//! their children. See [`Animators`] for the arena the trees live in.

pub mod animator;
pub mod animators;
pub mod easing;

pub use animator::{Animator, AnimatorId, Animators};
pub use animators::AnimatorKind;
pub use easing::{ease, EasingFunc, EasingMode};
