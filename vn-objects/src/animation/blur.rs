//! 模糊强度动画。

use serde::{Deserialize, Serialize};

use super::driver::{
    self, AnimationCallback, AnimationComponent, AnimationDriver, animation_component,
};
use crate::component::ComponentBase;
use crate::context::TempSettings;
use crate::easing::EasingFunction;
use crate::object::GameObject;

/// 模糊强度动画
///
/// 运行期间模糊保持开启，结束时按最终强度是否大于 0 决定开关。
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BlurAnimation {
    pub base: ComponentBase,
    pub driver: AnimationDriver,
}

impl BlurAnimation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(
        &mut self,
        object: &mut GameObject,
        settings: TempSettings,
        power: f32,
        duration: u32,
        easing: EasingFunction,
        callback: Option<AnimationCallback>,
    ) {
        let current = object.effects.blur.power;
        driver::begin(
            self,
            object,
            settings,
            current == power,
            duration,
            |e, duration| {
                e.function = easing;
                e.start_value(current, power - current, duration);
            },
            callback,
        );
    }
}

impl AnimationComponent for BlurAnimation {
    fn driver(&self) -> &AnimationDriver {
        &self.driver
    }

    fn driver_mut(&mut self) -> &mut AnimationDriver {
        &mut self.driver
    }

    fn apply(&self, object: &mut GameObject) {
        object.effects.blur.power = self.driver.easing.value;
        object.effects.blur.enabled = true;
    }

    fn finish(&self, object: &mut GameObject) {
        let blur = &mut object.effects.blur;
        blur.enabled = blur.power > 0.0;
    }
}

animation_component!(BlurAnimation, "BlurAnimation");
