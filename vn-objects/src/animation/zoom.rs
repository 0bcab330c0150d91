//! 缩放动画。

use serde::{Deserialize, Serialize};

use super::driver::{
    self, AnimationCallback, AnimationComponent, AnimationDriver, animation_component,
};
use crate::component::ComponentBase;
use crate::context::TempSettings;
use crate::easing::EasingFunction;
use crate::object::{GameObject, Point};

/// 缩放动画，x/y 共用一条时间轴
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomAnimation {
    pub base: ComponentBase,
    pub driver: AnimationDriver,
}

impl ZoomAnimation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(
        &mut self,
        object: &mut GameObject,
        settings: TempSettings,
        zoom: Point,
        duration: u32,
        easing: EasingFunction,
        callback: Option<AnimationCallback>,
    ) {
        let current = object.zoom;
        driver::begin(
            self,
            object,
            settings,
            current == zoom,
            duration,
            |e, duration| {
                e.function = easing;
                e.start_position(
                    current.x,
                    current.y,
                    zoom.x - current.x,
                    zoom.y - current.y,
                    duration,
                );
            },
            callback,
        );
    }
}

impl AnimationComponent for ZoomAnimation {
    fn driver(&self) -> &AnimationDriver {
        &self.driver
    }

    fn driver_mut(&mut self) -> &mut AnimationDriver {
        &mut self.driver
    }

    fn apply(&self, object: &mut GameObject) {
        let easing = &self.driver.easing;
        object.zoom = Point::new(easing.x, easing.y);
    }

    fn is_positional(&self) -> bool {
        true
    }
}

animation_component!(ZoomAnimation, "ZoomAnimation");
