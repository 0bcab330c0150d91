//! 模型参数动画。

use serde::{Deserialize, Serialize};

use super::driver::{
    self, AnimationCallback, AnimationComponent, AnimationDriver, animation_component,
};
use crate::component::ComponentBase;
use crate::context::TempSettings;
use crate::easing::EasingFunction;
use crate::object::GameObject;

/// 对一个命名的模型参数做插值
///
/// 参数不存在时从 0 开始。
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Live2DAnimation {
    pub base: ComponentBase,
    pub driver: AnimationDriver,
    pub parameter: String,
}

impl Live2DAnimation {
    pub fn new(parameter: impl Into<String>) -> Self {
        Self {
            parameter: parameter.into(),
            ..Self::default()
        }
    }

    pub fn start(
        &mut self,
        object: &mut GameObject,
        settings: TempSettings,
        target: f32,
        duration: u32,
        easing: EasingFunction,
        callback: Option<AnimationCallback>,
    ) {
        let current = object
            .model_parameters
            .get(&self.parameter)
            .copied()
            .unwrap_or_default();
        driver::begin(
            self,
            object,
            settings,
            current == target,
            duration,
            |e, duration| {
                e.function = easing;
                e.start_value(current, target - current, duration);
            },
            callback,
        );
    }
}

impl AnimationComponent for Live2DAnimation {
    fn driver(&self) -> &AnimationDriver {
        &self.driver
    }

    fn driver_mut(&mut self) -> &mut AnimationDriver {
        &mut self.driver
    }

    fn apply(&self, object: &mut GameObject) {
        object
            .model_parameters
            .insert(self.parameter.clone(), self.driver.easing.value);
    }
}

animation_component!(Live2DAnimation, "Live2DAnimation");

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::EngineContext;
    use crate::store::ObjectStore;

    #[test]
    fn test_parameter_written_each_frame() {
        let engine = EngineContext::new();
        let mut store = ObjectStore::new();
        let id = store.create("live2d");
        store
            .add_component(id, Live2DAnimation::new("ParamMouthOpenY"))
            .unwrap();
        store
            .with_component_mut::<Live2DAnimation, _>(id, |anim, object| {
                anim.start(
                    object,
                    engine.settings(),
                    1.0,
                    2,
                    EasingFunction::Linear,
                    None,
                )
            })
            .unwrap();

        store.update_object(id, &engine);
        assert_eq!(
            store.get(id).unwrap().model_parameters["ParamMouthOpenY"],
            0.5
        );
        store.update_object(id, &engine);
        assert_eq!(
            store.get(id).unwrap().model_parameters["ParamMouthOpenY"],
            1.0
        );
    }
}
