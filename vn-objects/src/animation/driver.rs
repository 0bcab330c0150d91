//! 动画组件共用的计时协议。
//!
//! ```text
//! Idle ──start()──► Running ──最后一帧──► Completing ──回调──► Idle
//!   ▲                                                          │
//!   └──── 已在目标值 / duration == 0 / 瞬间跳过：同步回调 ──────┘
//! ```

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::component::{Component, ComponentContext};
use crate::context::TempSettings;
use crate::easing::Easing;
use crate::object::GameObject;

/// 动画完成回调
///
/// 回调不可序列化，从存档恢复的动画在完成时不会触发回调。
pub type AnimationCallback = Box<dyn FnOnce(&mut GameObject, &dyn Component)>;

/// 动画状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationState {
    /// 没有进行中的插值
    #[default]
    Idle,
    /// 插值进行中
    Running,
    /// 运行的最后一帧（回调执行期间）
    Completing,
}

/// 插值器 + 状态 + 完成回调
#[derive(Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationDriver {
    pub easing: Easing,
    pub state: AnimationState,
    #[serde(skip)]
    callback: Option<AnimationCallback>,
}

impl std::fmt::Debug for AnimationDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimationDriver")
            .field("easing", &self.easing)
            .field("state", &self.state)
            .field("has_callback", &self.callback.is_some())
            .finish()
    }
}

impl AnimationDriver {
    pub fn is_running(&self) -> bool {
        self.state == AnimationState::Running
    }
}

/// 动画组件接口
///
/// 每个实现只负责"读一个字段、写一个字段"，计时与完成协议由本模块统一处理。
pub trait AnimationComponent: Component {
    fn driver(&self) -> &AnimationDriver;

    fn driver_mut(&mut self) -> &mut AnimationDriver;

    /// 把当前插值写入对象
    fn apply(&self, object: &mut GameObject);

    /// 运行结束时的修正（取整、派生开关等）
    fn finish(&self, _object: &mut GameObject) {}

    /// 是否使用二维插值
    fn is_positional(&self) -> bool {
        false
    }

    fn is_running(&self) -> bool {
        self.driver().is_running()
    }
}

/// 开始一次运行
///
/// `seed` 负责设置曲线并调用 `start_value`/`start_position`，传入的帧数可能被改为 0。
pub(crate) fn begin<A: AnimationComponent>(
    animation: &mut A,
    object: &mut GameObject,
    settings: TempSettings,
    at_target: bool,
    duration: u32,
    seed: impl FnOnce(&mut Easing, u32),
    callback: Option<AnimationCallback>,
) {
    let driver = animation.driver_mut();
    driver.callback = None;
    driver.state = AnimationState::Idle;

    if at_target {
        if let Some(callback) = callback {
            callback(object, &*animation);
        }
        return;
    }

    if duration == 0 || settings.is_instant_skip() {
        trace!(object = %object.id(), animation = animation.class_name(), "animation snapped");
        seed(&mut animation.driver_mut().easing, 0);
        animation.apply(object);
        animation.finish(object);
        if let Some(callback) = callback {
            callback(object, &*animation);
        }
        return;
    }

    let driver = animation.driver_mut();
    seed(&mut driver.easing, duration);
    driver.callback = callback;
    driver.state = AnimationState::Running;
}

/// 推进一帧
pub(crate) fn step<A: AnimationComponent>(animation: &mut A, cx: &mut ComponentContext<'_>) {
    if animation.driver().state != AnimationState::Running {
        return;
    }
    let settings = cx.settings();
    let Some(object) = cx.object_mut() else {
        return;
    };

    let positional = animation.is_positional();
    let easing = &mut animation.driver_mut().easing;
    if settings.skip {
        easing.skip(settings.skip_time);
    }
    if positional {
        easing.update_position();
    } else {
        easing.update_value();
    }
    animation.apply(object);

    if animation.driver().easing.is_running() {
        return;
    }

    let driver = animation.driver_mut();
    driver.state = AnimationState::Completing;
    let callback = driver.callback.take();
    animation.finish(object);
    if let Some(callback) = callback {
        callback(object, &*animation);
    }
    animation.driver_mut().state = AnimationState::Idle;
}

/// 为动画组件实现 [`Component`]
macro_rules! animation_component {
    ($ty:ty, $class:literal) => {
        impl $crate::component::Component for $ty {
            fn class_name(&self) -> &'static str {
                $class
            }

            fn base(&self) -> &$crate::component::ComponentBase {
                &self.base
            }

            fn base_mut(&mut self) -> &mut $crate::component::ComponentBase {
                &mut self.base
            }

            fn update(&mut self, cx: &mut $crate::component::ComponentContext<'_>) {
                $crate::animation::driver::step(self, cx);
            }

            fn to_bundle_value(&self) -> Result<serde_json::Value, serde_json::Error> {
                serde_json::to_value(self)
            }

            fn as_any(&self) -> &dyn std::any::Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
                self
            }
        }
    };
}

pub(crate) use animation_component;
