//! 数据包结构。
//!
//! 数据包是纯数据树，可直接写成 JSON。布局：
//!
//! ```text
//! WorldBundle
//!   ├─ version: { major, minor }
//!   ├─ frame
//!   └─ roots: [ObjectBundle]
//!        ├─ id, class
//!        ├─ fields: { 字段名: 值 }      （已按类黑名单过滤）
//!        ├─ components: [{ class, data }]
//!        └─ domains: [{ name, objects: [SlotBundle], needs_sort }]
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CodecError;

/// 数据包格式版本
///
/// 版本号含义：
/// - MAJOR: 不兼容的格式变更
/// - MINOR: 向后兼容的新字段
pub const BUNDLE_VERSION_MAJOR: u32 = 1;
pub const BUNDLE_VERSION_MINOR: u32 = 0;

/// 数据包版本信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleVersion {
    pub major: u32,
    pub minor: u32,
}

impl BundleVersion {
    /// 当前版本
    pub fn current() -> Self {
        Self {
            major: BUNDLE_VERSION_MAJOR,
            minor: BUNDLE_VERSION_MINOR,
        }
    }

    /// major 相同即兼容
    pub fn is_compatible(&self) -> bool {
        self.major == BUNDLE_VERSION_MAJOR
    }
}

impl Default for BundleVersion {
    fn default() -> Self {
        Self::current()
    }
}

impl std::fmt::Display for BundleVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// 整个世界的数据包
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldBundle {
    pub version: BundleVersion,
    /// 保存时已执行的帧数
    #[serde(default)]
    pub frame: u64,
    /// 根对象（按更新顺序）
    pub roots: Vec<ObjectBundle>,
}

impl WorldBundle {
    pub fn new(frame: u64, roots: Vec<ObjectBundle>) -> Self {
        Self {
            version: BundleVersion::current(),
            frame,
            roots,
        }
    }

    /// 序列化为 JSON 字符串
    pub fn to_json(&self) -> Result<String, CodecError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// 从 JSON 字符串反序列化，并检查版本
    pub fn from_json(json: &str) -> Result<Self, CodecError> {
        let bundle: WorldBundle = serde_json::from_str(json)?;
        bundle.check_version()?;
        Ok(bundle)
    }

    pub fn check_version(&self) -> Result<(), CodecError> {
        if !self.version.is_compatible() {
            return Err(CodecError::IncompatibleVersion {
                bundle_version: self.version.to_string(),
                current_version: BundleVersion::current().to_string(),
            });
        }
        Ok(())
    }

    /// 数据包中完整写出的对象数量（引用不计）
    pub fn object_count(&self) -> usize {
        self.roots.iter().map(ObjectBundle::object_count).sum()
    }
}

/// 单个对象
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectBundle {
    /// 保存时的对象 id
    pub id: u64,
    pub class: String,
    #[serde(default)]
    pub fields: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<ComponentBundle>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub domains: Vec<DomainBundle>,
}

impl ObjectBundle {
    /// 自身及全部内联子对象的数量
    pub fn object_count(&self) -> usize {
        1 + self
            .domains
            .iter()
            .flat_map(|d| &d.objects)
            .map(|slot| match slot {
                SlotBundle::Object(object) => object.object_count(),
                SlotBundle::Empty | SlotBundle::Ref(_) => 0,
            })
            .sum::<usize>()
    }
}

/// 单个组件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentBundle {
    pub class: String,
    #[serde(default)]
    pub data: Value,
}

/// 一个子对象域
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainBundle {
    pub name: String,
    pub objects: Vec<SlotBundle>,
    /// 保存时还有未执行的排序
    #[serde(default, skip_serializing_if = "is_false")]
    pub needs_sort: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// 容器槽位
///
/// 同一对象在图中出现多次时，第一次完整写出，之后只写 id。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotBundle {
    /// 空槽位
    Empty,
    Object(Box<ObjectBundle>),
    /// 引用已写出的对象
    Ref(u64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_compatibility() {
        let mut bundle = WorldBundle::new(0, Vec::new());
        bundle.version.minor = 7;
        assert!(bundle.check_version().is_ok());

        bundle.version.major = 9;
        let json = serde_json::to_string(&bundle).unwrap();
        let err = WorldBundle::from_json(&json).unwrap_err();
        insta::assert_snapshot!(err.to_string(), @"数据包版本 9.7 与当前版本 1.0 不兼容");
    }

    #[test]
    fn test_slot_layout() {
        let slots = vec![SlotBundle::Empty, SlotBundle::Ref(4)];
        insta::assert_snapshot!(serde_json::to_string(&slots).unwrap(), @r#"["empty",{"ref":4}]"#);
    }

    #[test]
    fn test_malformed_json() {
        let err = WorldBundle::from_json("{\"roots\": 3}").unwrap_err();
        assert!(matches!(err, CodecError::Serde(_)));
    }
}
