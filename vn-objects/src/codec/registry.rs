//! 类元数据注册表。
//!
//! 对象类：字段黑名单（可继承）、组件过滤、自定义生成/恢复函数。
//! 组件类：从数据构造组件的工厂函数、可选的自定义生成函数。
//!
//! 查不到类元数据时按空黑名单处理，不报错。

use std::collections::{HashMap, HashSet};

use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};

use super::bundle::ObjectBundle;
use super::context::RestoreContext;
use crate::animation::{
    BlendAnimation, BlurAnimation, ImageAnimation, Live2DAnimation, ZoomAnimation,
};
use crate::component::Component;
use crate::components::{
    Container, DomainContainer, SceneCall, SignalBinding, Timer, produce_scene_call_bundle,
};
use crate::error::CodecError;
use crate::object::{GameObject, Rect};

/// 黑名单中的伪字段：不写出子对象
pub const SUB_OBJECTS_FIELD: &str = "sub_objects";

/// 继承链最大深度
const MAX_CLASS_DEPTH: usize = 32;

/// 替代默认字段遍历的对象数据生成函数
pub type ObjectProducer = fn(&GameObject) -> Result<Map<String, Value>, CodecError>;

/// 对象恢复函数，在组件恢复钩子之前调用
pub type ObjectRestorer =
    fn(&mut GameObject, &ObjectBundle, &mut RestoreContext<'_>) -> Result<(), CodecError>;

/// 从数据构造组件
pub type ComponentFactory = fn(Value) -> Result<Box<dyn Component>, CodecError>;

/// 替代 `Component::to_bundle_value` 的组件数据生成函数
pub type ComponentProducer = fn(&dyn Component) -> Result<Value, CodecError>;

/// 对象类元数据
#[derive(Debug, Clone)]
pub struct ObjectClass {
    name: String,
    extends: Option<String>,
    blacklist: Vec<String>,
    bundle_components: Option<Vec<String>>,
    producer: Option<ObjectProducer>,
    restorer: Option<ObjectRestorer>,
}

impl ObjectClass {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extends: None,
            blacklist: Vec::new(),
            bundle_components: None,
            producer: None,
            restorer: None,
        }
    }

    /// 父类；黑名单、组件过滤与自定义函数沿继承链查找
    pub fn extends(mut self, parent: impl Into<String>) -> Self {
        self.extends = Some(parent.into());
        self
    }

    /// 不写入数据包的字段
    pub fn blacklist<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.blacklist.extend(fields.into_iter().map(Into::into));
        self
    }

    /// 只写出这些类名的组件
    pub fn bundle_components<I, S>(mut self, classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.bundle_components = Some(classes.into_iter().map(Into::into).collect());
        self
    }

    pub fn producer(mut self, producer: ObjectProducer) -> Self {
        self.producer = Some(producer);
        self
    }

    pub fn restorer(mut self, restorer: ObjectRestorer) -> Self {
        self.restorer = Some(restorer);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// 组件类元数据
#[derive(Debug, Clone, Copy)]
pub struct ComponentClass {
    pub factory: ComponentFactory,
    pub producer: Option<ComponentProducer>,
}

fn build_component<C: Component + DeserializeOwned>(
    data: Value,
) -> Result<Box<dyn Component>, CodecError> {
    let component: C = serde_json::from_value(data)?;
    Ok(Box::new(component))
}

/// 编解码注册表
#[derive(Debug, Clone, Default)]
pub struct CodecRegistry {
    objects: HashMap<String, ObjectClass>,
    components: HashMap<String, ComponentClass>,
}

impl CodecRegistry {
    /// 空注册表
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册全部内置类
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();

        registry.register_object_class(ObjectClass::new("GameObject").blacklist([
            "parent",
            "needs_update",
            "needs_full_update",
            "texture",
        ]));
        registry.register_object_class(ObjectClass::new("picture").extends("GameObject"));
        registry.register_object_class(ObjectClass::new("layout").extends("GameObject"));
        registry.register_object_class(ObjectClass::new("scene").extends("GameObject"));
        registry.register_object_class(ObjectClass::new("live2d").extends("picture"));
        registry.register_object_class(
            ObjectClass::new("image_map")
                .extends("picture")
                .blacklist([SUB_OBJECTS_FIELD])
                .restorer(restore_image_map),
        );
        registry.register_object_class(
            ObjectClass::new("timer")
                .extends("GameObject")
                .bundle_components(["Timer"]),
        );
        registry.register_object_class(
            ObjectClass::new("hotspot")
                .extends("GameObject")
                .producer(produce_hotspot)
                .restorer(restore_hotspot),
        );

        registry.register_component::<Container>("Container");
        registry.register_component::<DomainContainer>("DomainContainer");
        registry.register_component::<Timer>("Timer");
        registry.register_component::<SignalBinding>("SignalBinding");
        registry
            .register_component_with_producer::<SceneCall>("SceneCall", produce_scene_call_bundle);
        registry.register_component::<BlendAnimation>("BlendAnimation");
        registry.register_component::<BlurAnimation>("BlurAnimation");
        registry.register_component::<ZoomAnimation>("ZoomAnimation");
        registry.register_component::<ImageAnimation>("ImageAnimation");
        registry.register_component::<Live2DAnimation>("Live2DAnimation");

        registry
    }

    /// 注册对象类，同名类被替换
    pub fn register_object_class(&mut self, class: ObjectClass) {
        self.objects.insert(class.name.clone(), class);
    }

    /// 注册组件类；组件数据以 serde 反序列化
    pub fn register_component<C: Component + DeserializeOwned>(&mut self, name: &str) {
        self.components.insert(
            name.to_string(),
            ComponentClass {
                factory: build_component::<C>,
                producer: None,
            },
        );
    }

    /// 注册带自定义生成函数的组件类
    pub fn register_component_with_producer<C: Component + DeserializeOwned>(
        &mut self,
        name: &str,
        producer: ComponentProducer,
    ) {
        self.components.insert(
            name.to_string(),
            ComponentClass {
                factory: build_component::<C>,
                producer: Some(producer),
            },
        );
    }

    pub fn object_class(&self, name: &str) -> Option<&ObjectClass> {
        self.objects.get(name)
    }

    pub fn component_class(&self, name: &str) -> Option<&ComponentClass> {
        self.components.get(name)
    }

    /// 沿继承链遍历（自身在前）
    fn lineage<'a>(&'a self, class: &str) -> impl Iterator<Item = &'a ObjectClass> + 'a {
        let mut next = self.objects.get(class);
        std::iter::from_fn(move || {
            let current = next?;
            next = current
                .extends
                .as_deref()
                .and_then(|parent| self.objects.get(parent));
            Some(current)
        })
        .take(MAX_CLASS_DEPTH)
    }

    /// 合并继承链上的全部黑名单；未注册的类返回空集合
    pub fn blacklist(&self, class: &str) -> HashSet<&str> {
        self.lineage(class)
            .flat_map(|c| c.blacklist.iter().map(String::as_str))
            .collect()
    }

    /// 组件过滤（继承链上最近的定义）；`None` 表示写出全部已注册组件
    pub fn bundle_components(&self, class: &str) -> Option<&[String]> {
        self.lineage(class)
            .find_map(|c| c.bundle_components.as_deref())
    }

    pub fn object_producer(&self, class: &str) -> Option<ObjectProducer> {
        self.lineage(class).find_map(|c| c.producer)
    }

    pub fn object_restorer(&self, class: &str) -> Option<ObjectRestorer> {
        self.lineage(class).find_map(|c| c.restorer)
    }
}

/// 子对象是临时的，恢复后总是为空
fn restore_image_map(
    object: &mut GameObject,
    _bundle: &ObjectBundle,
    _cx: &mut RestoreContext<'_>,
) -> Result<(), CodecError> {
    object.reset_domains();
    Ok(())
}

/// 热区只记录矩形的原始坐标
fn produce_hotspot(object: &GameObject) -> Result<Map<String, Value>, CodecError> {
    let rect = object.dst_rect;
    let mut fields = Map::new();
    fields.insert(
        "rect".to_string(),
        json!([rect.x, rect.y, rect.width, rect.height]),
    );
    fields.insert("order".to_string(), json!(object.order));
    fields.insert("active".to_string(), json!(object.active));
    fields.insert("visible".to_string(), json!(object.visible));
    Ok(fields)
}

fn restore_hotspot(
    object: &mut GameObject,
    bundle: &ObjectBundle,
    _cx: &mut RestoreContext<'_>,
) -> Result<(), CodecError> {
    let malformed = |message: &str| CodecError::MalformedBundle {
        message: format!("hotspot {}: {message}", bundle.id),
    };

    let rect: Vec<f32> = bundle
        .fields
        .get("rect")
        .map(|v| serde_json::from_value(v.clone()))
        .transpose()?
        .ok_or_else(|| malformed("缺少 rect"))?;
    let [x, y, width, height] = rect[..] else {
        return Err(malformed("rect 必须是 4 个数"));
    };
    object.dst_rect = Rect::new(x, y, width, height);

    let fields = &bundle.fields;
    if let Some(order) = fields.get("order") {
        object.order = order
            .as_i64()
            .and_then(|value| i32::try_from(value).ok())
            .ok_or_else(|| malformed("order 超出范围"))?;
    }
    if let Some(active) = fields.get("active").and_then(Value::as_bool) {
        object.active = active;
    }
    if let Some(visible) = fields.get("visible").and_then(Value::as_bool) {
        object.visible = visible;
    }
    Ok(())
}
