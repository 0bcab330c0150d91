//! # Components 模块
//!
//! 内置的非动画组件。

pub mod container;
mod scene_call;
mod signal_binding;
mod timer;

pub use container::{Container, DisposeBehavior, DomainContainer};
pub(crate) use scene_call::produce_bundle as produce_scene_call_bundle;
pub use scene_call::SceneCall;
pub use signal_binding::{BindingAction, SignalBinding};
pub use timer::{FRAMES_PER_SECOND, Timer};
