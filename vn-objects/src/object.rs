//! # Object 模块
//!
//! 游戏对象：纯数据容器，行为全部来自挂载的组件。
//!
//! ## 组成
//!
//! - 有序的组件列表（更新顺序与序列化顺序都以插入顺序为准）
//! - 按域（domain）划分的子对象列表，`default` 域总是存在且位于首位
//! - 几何、透明度、缩放、特效等供组件读写的字段

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::component::Component;
use crate::event::EventBus;

/// 默认域名称
pub const DEFAULT_DOMAIN: &str = "default";

/// 对象唯一标识符
///
/// 由 [`ObjectStore`](crate::ObjectStore) 分配，保证在同一存储内唯一。
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ObjectId(pub(crate) u64);

impl ObjectId {
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }

    /// 获取内部 ID 值
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ObjectId({})", self.0)
    }
}

/// 二维点
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl std::ops::Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

/// 矩形
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// 模糊特效参数
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BlurEffect {
    pub power: f32,
    pub enabled: bool,
}

/// 对象特效
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Effects {
    pub blur: BlurEffect,
}

/// 渲染后端资源句柄（不透明）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextureHandle(pub u64);

/// 一个子对象域
///
/// 空槽位（`None`）表示该位置的对象已销毁但保留了索引。
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectDomain {
    /// 域名称
    pub name: String,
    /// 子对象槽位
    pub objects: Vec<Option<ObjectId>>,
    /// 下一次容器更新前是否需要重新排序
    pub needs_sort: bool,
}

impl ObjectDomain {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            objects: Vec::new(),
            needs_sort: false,
        }
    }

    /// 非空槽位中的对象
    pub fn live(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.objects.iter().flatten().copied()
    }
}

/// 游戏对象
///
/// 可序列化字段由编解码器按类黑名单过滤后写入数据包；
/// 组件、子对象与事件总线由编解码器单独处理。
#[derive(Serialize, Deserialize)]
#[serde(default)]
pub struct GameObject {
    #[serde(skip)]
    id: ObjectId,
    #[serde(skip)]
    class: String,
    /// 父对象（由所属存储维护）
    pub parent: Option<ObjectId>,
    /// 是否参与更新
    pub active: bool,
    /// 是否可见
    pub visible: bool,
    /// 是否已销毁；实际移除发生在父容器的下一次更新中
    pub disposed: bool,
    pub needs_update: bool,
    pub needs_full_update: bool,
    /// 容器排序键，数值大的排在前面
    pub order: i32,
    /// 自身 z 序，最终值见 [`ObjectStore::compute_z_index`](crate::ObjectStore::compute_z_index)
    pub z_index: i32,
    pub dst_rect: Rect,
    pub offset: Point,
    pub zoom: Point,
    /// 不透明度 (0 - 255)
    pub opacity: f32,
    pub effects: Effects,
    /// 当前显示的图片
    pub image: Option<String>,
    /// 模型参数（Live2D 等）
    pub model_parameters: BTreeMap<String, f32>,
    /// 后端纹理句柄
    pub texture: Option<TextureHandle>,
    /// 对象本地事件
    #[serde(skip)]
    pub events: EventBus,
    #[serde(skip)]
    pub(crate) components: Vec<Box<dyn Component>>,
    #[serde(skip)]
    pub(crate) domains: Vec<ObjectDomain>,
}

impl Default for GameObject {
    fn default() -> Self {
        Self {
            id: ObjectId::default(),
            class: String::new(),
            parent: None,
            active: true,
            visible: true,
            disposed: false,
            needs_update: false,
            needs_full_update: false,
            order: 0,
            z_index: 0,
            dst_rect: Rect::default(),
            offset: Point::default(),
            zoom: Point::new(1.0, 1.0),
            opacity: 255.0,
            effects: Effects::default(),
            image: None,
            model_parameters: BTreeMap::new(),
            texture: None,
            events: EventBus::new(),
            components: Vec::new(),
            domains: vec![ObjectDomain::new(DEFAULT_DOMAIN)],
        }
    }
}

impl std::fmt::Debug for GameObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameObject")
            .field("id", &self.id)
            .field("class", &self.class)
            .field("parent", &self.parent)
            .field("active", &self.active)
            .field("disposed", &self.disposed)
            .field(
                "components",
                &self
                    .components
                    .iter()
                    .map(|c| c.class_name())
                    .collect::<Vec<_>>(),
            )
            .field("domains", &self.domains)
            .finish()
    }
}

impl GameObject {
    pub(crate) fn new(id: ObjectId, class: impl Into<String>) -> Self {
        Self {
            id,
            class: class.into(),
            ..Self::default()
        }
    }

    pub(crate) fn assign_identity(&mut self, id: ObjectId, class: impl Into<String>) {
        self.id = id;
        self.class = class.into();
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// 对象类名（编解码器据此查找黑名单与自定义处理）
    pub fn class(&self) -> &str {
        &self.class
    }

    // ========== 组件 ==========

    /// 挂载组件
    ///
    /// 这是把组件接入对象的唯一途径：设置组件的所属对象并追加到列表末尾。
    pub fn add_component<C: Component>(&mut self, component: C) {
        self.add_boxed_component(Box::new(component));
    }

    /// 挂载已装箱的组件
    pub fn add_boxed_component(&mut self, mut component: Box<dyn Component>) {
        component.base_mut().attach(self.id);
        self.components.push(component);
    }

    /// 在指定位置插入组件，越界时追加到末尾
    pub fn insert_component<C: Component>(&mut self, index: usize, component: C) {
        let mut component: Box<dyn Component> = Box::new(component);
        component.base_mut().attach(self.id);
        let index = index.min(self.components.len());
        self.components.insert(index, component);
    }

    /// 移除指定位置的组件，返回的组件已与对象解除关联
    pub fn remove_component(&mut self, index: usize) -> Option<Box<dyn Component>> {
        if index >= self.components.len() {
            return None;
        }
        let mut component = self.components.remove(index);
        component.base_mut().detach();
        Some(component)
    }

    /// 移除第一个指定类名的组件
    pub fn remove_component_by_class(&mut self, class: &str) -> Option<Box<dyn Component>> {
        let index = self
            .components
            .iter()
            .position(|c| c.class_name() == class)?;
        self.remove_component(index)
    }

    /// 按插入顺序遍历组件
    pub fn components(&self) -> impl Iterator<Item = &dyn Component> {
        self.components.iter().map(|c| c.as_ref())
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// 查找第一个指定类型的组件
    pub fn find_component<T: Component>(&self) -> Option<&T> {
        self.components
            .iter()
            .find_map(|c| c.as_any().downcast_ref::<T>())
    }

    pub fn find_component_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.components
            .iter_mut()
            .find_map(|c| c.as_any_mut().downcast_mut::<T>())
    }

    /// 查找第一个指定类名的组件
    pub fn find_component_by_class(&self, class: &str) -> Option<&dyn Component> {
        self.components
            .iter()
            .find(|c| c.class_name() == class)
            .map(|c| c.as_ref())
    }

    pub fn has_component<T: Component>(&self) -> bool {
        self.find_component::<T>().is_some()
    }

    // ========== 子对象 ==========

    /// 默认域中的子对象槽位
    pub fn sub_objects(&self) -> &[Option<ObjectId>] {
        &self.domains[0].objects
    }

    /// 所有域（默认域在首位）
    pub fn domains(&self) -> &[ObjectDomain] {
        &self.domains
    }

    /// 按名称查找域
    pub fn domain(&self, name: &str) -> Option<&ObjectDomain> {
        self.domains.iter().find(|d| d.name == name)
    }

    pub(crate) fn domain_index(&self, name: &str) -> Option<usize> {
        self.domains.iter().position(|d| d.name == name)
    }

    /// 获取域，不存在时按创建顺序追加
    pub(crate) fn ensure_domain(&mut self, name: &str) -> &mut ObjectDomain {
        let index = match self.domain_index(name) {
            Some(index) => index,
            None => {
                self.domains.push(ObjectDomain::new(name));
                self.domains.len() - 1
            }
        };
        &mut self.domains[index]
    }

    /// 清空全部子对象槽位，只保留空的默认域
    pub(crate) fn reset_domains(&mut self) {
        self.domains = vec![ObjectDomain::new(DEFAULT_DOMAIN)];
    }

    /// 所有域中的存活子对象
    pub fn children(&self) -> Vec<ObjectId> {
        self.domains.iter().flat_map(|d| d.live()).collect()
    }

    // ========== 脏标记 ==========

    pub fn set_dst_rect(&mut self, rect: Rect) {
        if self.dst_rect != rect {
            self.dst_rect = rect;
            self.needs_update = true;
        }
    }

    pub fn set_offset(&mut self, offset: Point) {
        if self.offset != offset {
            self.offset = offset;
            self.needs_update = true;
        }
    }

    pub fn set_visible(&mut self, visible: bool) {
        if self.visible != visible {
            self.visible = visible;
            self.needs_update = true;
        }
    }

    /// 要求下一帧完整刷新（容器会把该标记传给子对象）
    pub fn mark_full_update(&mut self) {
        self.needs_update = true;
        self.needs_full_update = true;
    }

    pub(crate) fn clear_dirty(&mut self) {
        self.needs_update = false;
        self.needs_full_update = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Timer;

    #[test]
    fn test_default_domain_always_present() {
        let object = GameObject::new(ObjectId::new(1), "picture");
        assert_eq!(object.domains().len(), 1);
        assert_eq!(object.domains()[0].name, DEFAULT_DOMAIN);
        assert!(object.sub_objects().is_empty());
    }

    #[test]
    fn test_add_component_assigns_owner() {
        let mut object = GameObject::new(ObjectId::new(3), "timer");
        object.add_component(Timer::countdown(0, 1));

        let timer = object.find_component::<Timer>().unwrap();
        assert_eq!(timer.base().owner(), Some(ObjectId::new(3)));
    }

    #[test]
    fn test_component_order_and_removal() {
        let mut object = GameObject::new(ObjectId::new(1), "picture");
        object.add_component(Timer::countdown(0, 1));
        object.insert_component(0, Timer::stopwatch());

        let order: Vec<bool> = object
            .components
            .iter()
            .filter_map(|c| c.as_any().downcast_ref::<Timer>())
            .map(|t| t.stopwatch)
            .collect();
        assert_eq!(order, vec![true, false]);

        let removed = object.remove_component(0).unwrap();
        assert_eq!(removed.base().owner(), None);
        assert_eq!(object.component_count(), 1);
        assert!(object.remove_component(5).is_none());
    }

    #[test]
    fn test_setters_mark_dirty() {
        let mut object = GameObject::new(ObjectId::new(1), "picture");
        object.set_offset(Point::new(0.0, 0.0));
        assert!(!object.needs_update);

        object.set_dst_rect(Rect::new(1.0, 2.0, 3.0, 4.0));
        assert!(object.needs_update);

        object.clear_dirty();
        object.mark_full_update();
        assert!(object.needs_update && object.needs_full_update);
    }
}
