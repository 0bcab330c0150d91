//! # Container 组件
//!
//! 管理子对象：排序、逐个更新、处理已销毁的子对象。
//!
//! - [`Container`]：只管理默认域
//! - [`DomainContainer`]：按创建顺序管理所有域（默认域在最前）

use std::cmp::Reverse;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::component::{Component, ComponentBase, ComponentContext};
use crate::context::EngineContext;
use crate::object::{ObjectDomain, ObjectId};
use crate::store::ObjectStore;

/// 子对象销毁后的处理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisposeBehavior {
    /// 从列表中移除，后面的子对象前移
    #[default]
    Remove,
    /// 槽位置空，其它子对象的索引保持不变
    KeepSlot,
}

/// 默认域容器
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Container {
    pub base: ComponentBase,
    pub dispose_behavior: DisposeBehavior,
}

impl Container {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dispose_behavior(dispose_behavior: DisposeBehavior) -> Self {
        Self {
            dispose_behavior,
            ..Self::default()
        }
    }
}

impl Component for Container {
    fn class_name(&self) -> &'static str {
        "Container"
    }

    fn base(&self) -> &ComponentBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ComponentBase {
        &mut self.base
    }

    fn update(&mut self, cx: &mut ComponentContext<'_>) {
        update_domain(cx, 0, self.dispose_behavior);
    }

    fn to_bundle_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

/// 多域容器
///
/// 每个域是独立排序、独立销毁的子对象列表，但在同一次更新中依次处理。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DomainContainer {
    pub base: ComponentBase,
    pub dispose_behavior: DisposeBehavior,
}

impl DomainContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dispose_behavior(dispose_behavior: DisposeBehavior) -> Self {
        Self {
            dispose_behavior,
            ..Self::default()
        }
    }
}

impl Component for DomainContainer {
    fn class_name(&self) -> &'static str {
        "DomainContainer"
    }

    fn base(&self) -> &ComponentBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ComponentBase {
        &mut self.base
    }

    fn update(&mut self, cx: &mut ComponentContext<'_>) {
        let mut index = 0;
        while cx.object().is_some_and(|o| index < o.domains.len()) {
            update_domain(cx, index, self.dispose_behavior);
            index += 1;
        }
    }

    fn to_bundle_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

/// 按 `order` 降序稳定排序，空槽位排在最后
fn sort_domain(domain: &mut ObjectDomain, store: &ObjectStore) {
    domain.objects.sort_by_key(|slot| match slot {
        Some(id) => (false, Reverse(store.get(*id).map_or(0, |o| o.order))),
        None => (true, Reverse(0)),
    });
    domain.needs_sort = false;
}

fn slot_at(
    store: &ObjectStore,
    owner: ObjectId,
    domain: usize,
    index: usize,
) -> Option<Option<ObjectId>> {
    store
        .get(owner)?
        .domains
        .get(domain)?
        .objects
        .get(index)
        .copied()
}

fn update_domain(cx: &mut ComponentContext<'_>, domain: usize, behavior: DisposeBehavior) {
    let owner = cx.owner;
    let Some(object) = cx.objects.get_mut(owner) else {
        return;
    };
    let full_update = object.needs_full_update;

    if object.domains.get(domain).is_some_and(|d| d.needs_sort) {
        let mut list = std::mem::replace(&mut object.domains[domain], ObjectDomain::new(""));
        sort_domain(&mut list, cx.objects);
        if let Some(object) = cx.objects.get_mut(owner) {
            object.domains[domain] = list;
        }
    }

    // 每一步重新读取槽位：子对象更新期间列表可能被追加
    let mut index = 0;
    while let Some(slot) = slot_at(cx.objects, owner, domain, index) {
        let Some(child) = slot else {
            index += 1;
            continue;
        };
        let Some((disposed, active)) = cx.objects.get(child).map(|o| (o.disposed, o.active)) else {
            index += 1;
            continue;
        };

        if disposed {
            let removed = cx.objects.remove_subtree(child);
            debug!(parent = %owner, child = %child, removed, ?behavior, "remove disposed child");
            let Some(list) = cx
                .objects
                .get_mut(owner)
                .and_then(|o| o.domains.get_mut(domain))
            else {
                return;
            };
            match behavior {
                DisposeBehavior::Remove => {
                    list.objects.remove(index);
                    continue;
                }
                DisposeBehavior::KeepSlot => list.objects[index] = None,
            }
        } else if active {
            if full_update && let Some(object) = cx.objects.get_mut(child) {
                object.mark_full_update();
            }
            cx.objects.update_object(child, cx.engine);
        }
        index += 1;
    }
}

/// 把可见性传递给容器管理的子对象，并立即更新一次使其生效
///
/// 对象上没有容器组件时什么也不做。
pub fn propagate_visibility(
    store: &mut ObjectStore,
    id: ObjectId,
    visible: bool,
    engine: &EngineContext,
) {
    let Some(object) = store.get(id) else {
        return;
    };
    let children: Vec<ObjectId> = if object.has_component::<DomainContainer>() {
        object.children()
    } else if object.has_component::<Container>() {
        object.domains[0].live().collect()
    } else {
        return;
    };

    for child in children {
        let Some(object) = store.get_mut(child) else {
            continue;
        };
        if object.disposed {
            continue;
        }
        object.set_visible(visible);
        store.update_object(child, engine);
    }
}
