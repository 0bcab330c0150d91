//! # Animation 模块
//!
//! 动画组件族。
//!
//! 每个动画组件持有一个 [`AnimationDriver`]（插值器 + 状态 + 完成回调），
//! 把插值结果映射到所属对象的一个字段：
//!
//! | 组件 | 写入字段 |
//! |------|----------|
//! | [`BlendAnimation`] | `opacity` |
//! | [`BlurAnimation`] | `effects.blur` |
//! | [`ZoomAnimation`] | `zoom` |
//! | [`ImageAnimation`] | `image` |
//! | [`Live2DAnimation`] | `model_parameters[parameter]` |
//!
//! ## 跳过模式
//!
//! 跳过模式开启时，运行中的动画在下一帧被压缩：`skip_time == 0` 直接结束，
//! 否则剩余部分改为 `skip_time` 帧并从头播放。
//! 瞬间跳过（`skip_time == 0`）期间新启动的动画直接到达终值。

pub(crate) mod driver;

mod blend;
mod blur;
mod image;
mod live2d;
mod zoom;

pub use blend::BlendAnimation;
pub use blur::BlurAnimation;
pub use driver::{AnimationCallback, AnimationComponent, AnimationDriver, AnimationState};
pub use image::ImageAnimation;
pub use live2d::Live2DAnimation;
pub use zoom::ZoomAnimation;
