//! 不透明度动画。

use serde::{Deserialize, Serialize};

use super::driver::{
    self, AnimationCallback, AnimationComponent, AnimationDriver, animation_component,
};
use crate::component::ComponentBase;
use crate::context::TempSettings;
use crate::easing::EasingFunction;
use crate::object::GameObject;

/// 不透明度动画，结束时取整
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BlendAnimation {
    pub base: ComponentBase,
    pub driver: AnimationDriver,
}

impl BlendAnimation {
    pub fn new() -> Self {
        Self::default()
    }

    /// 把不透明度变化到 `opacity` (0 - 255)
    pub fn start(
        &mut self,
        object: &mut GameObject,
        settings: TempSettings,
        opacity: f32,
        duration: u32,
        easing: EasingFunction,
        callback: Option<AnimationCallback>,
    ) {
        let current = object.opacity;
        driver::begin(
            self,
            object,
            settings,
            current == opacity,
            duration,
            |e, duration| {
                e.function = easing;
                e.start_value(current, opacity - current, duration);
            },
            callback,
        );
    }
}

impl AnimationComponent for BlendAnimation {
    fn driver(&self) -> &AnimationDriver {
        &self.driver
    }

    fn driver_mut(&mut self) -> &mut AnimationDriver {
        &mut self.driver
    }

    fn apply(&self, object: &mut GameObject) {
        object.opacity = self.driver.easing.value;
    }

    fn finish(&self, object: &mut GameObject) {
        object.opacity = object.opacity.round();
    }
}

animation_component!(BlendAnimation, "BlendAnimation");
