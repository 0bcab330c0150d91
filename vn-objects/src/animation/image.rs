//! 图片序列动画。

use serde::{Deserialize, Serialize};

use super::driver::{
    self, AnimationCallback, AnimationComponent, AnimationDriver, animation_component,
};
use crate::component::ComponentBase;
use crate::context::TempSettings;
use crate::easing::EasingFunction;
use crate::object::GameObject;

/// 图片序列动画
///
/// 插值范围是 `0 ..= images.len() - 1`，当前帧取 `round(value)`。
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageAnimation {
    pub base: ComponentBase,
    pub driver: AnimationDriver,
    pub images: Vec<String>,
}

impl ImageAnimation {
    pub fn new() -> Self {
        Self::default()
    }

    /// 播放图片序列；序列为空时视为已在目标状态
    pub fn start(
        &mut self,
        object: &mut GameObject,
        settings: TempSettings,
        images: Vec<String>,
        duration: u32,
        easing: EasingFunction,
        callback: Option<AnimationCallback>,
    ) {
        let last = images.len().saturating_sub(1) as f32;
        let at_target = images.is_empty();
        self.images = images;
        driver::begin(
            self,
            object,
            settings,
            at_target,
            duration,
            |e, duration| {
                e.function = easing;
                e.start_value(0.0, last, duration);
            },
            callback,
        );
    }

    /// 当前帧索引
    pub fn frame(&self) -> Option<usize> {
        if self.images.is_empty() {
            return None;
        }
        let index = self.driver.easing.value.round().max(0.0) as usize;
        Some(index.min(self.images.len() - 1))
    }
}

impl AnimationComponent for ImageAnimation {
    fn driver(&self) -> &AnimationDriver {
        &self.driver
    }

    fn driver_mut(&mut self) -> &mut AnimationDriver {
        &mut self.driver
    }

    fn apply(&self, object: &mut GameObject) {
        if let Some(image) = self.frame().and_then(|i| self.images.get(i)) {
            object.image = Some(image.clone());
        }
    }
}

animation_component!(ImageAnimation, "ImageAnimation");

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::EngineContext;
    use crate::store::ObjectStore;

    fn frames() -> Vec<String> {
        (0..4).map(|i| format!("walk_{i}.png")).collect()
    }

    #[test]
    fn test_frames_follow_rounded_value() {
        let engine = EngineContext::new();
        let mut store = ObjectStore::new();
        let id = store.create("picture");
        store.add_component(id, ImageAnimation::new()).unwrap();
        store
            .with_component_mut::<ImageAnimation, _>(id, |anim, object| {
                anim.start(
                    object,
                    engine.settings(),
                    frames(),
                    3,
                    EasingFunction::Linear,
                    None,
                )
            })
            .unwrap();

        let mut seen = Vec::new();
        for _ in 0..3 {
            store.update_object(id, &engine);
            seen.push(store.get(id).unwrap().image.clone().unwrap_or_default());
        }
        assert_eq!(seen, vec!["walk_1.png", "walk_2.png", "walk_3.png"]);
    }

    #[test]
    fn test_empty_sequence_finishes_immediately() {
        let mut object = GameObject::default();
        let mut anim = ImageAnimation::new();
        anim.start(
            &mut object,
            TempSettings::default(),
            Vec::new(),
            10,
            EasingFunction::Linear,
            None,
        );
        assert!(!anim.is_running());
        assert_eq!(object.image, None);
    }
}
