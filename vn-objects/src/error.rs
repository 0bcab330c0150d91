//! # Error 模块
//!
//! 定义 vn-objects 中使用的错误类型。
//!
//! 生命周期违规（组件没有所属对象、已销毁对象仍被更新）属于调用方的编程错误，
//! 直接 panic，不在这里建模。

use thiserror::Error;

use crate::object::ObjectId;

/// 对象存储操作错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ObjectError {
    /// 对象不存在
    #[error("对象 {id} 不存在")]
    NotFound { id: ObjectId },

    /// 对象已销毁
    #[error("对象 {id} 已销毁")]
    Disposed { id: ObjectId },

    /// 对象上没有指定组件
    #[error("对象 {id} 上没有组件 '{component}'")]
    ComponentMissing { id: ObjectId, component: String },

    /// 非法的父子关系（自身或祖先成为子对象）
    #[error("不能把 {child} 加入 {parent}：会形成环")]
    InvalidHierarchy { parent: ObjectId, child: ObjectId },
}

/// 数据包编解码错误
///
/// 全部属于数据完整性错误：出现时说明存档已损坏或与当前版本不兼容。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CodecError {
    /// 未注册的对象类或组件类
    #[error("未注册的类 '{class}'")]
    UnknownClass { class: String },

    /// 无法解析的引用
    #[error("无法解析的引用 '{reference}'")]
    UnresolvedReference { reference: String },

    /// 数据包中出现重复的对象 id
    #[error("重复的对象 id {id}")]
    DuplicateObject { id: u64 },

    /// 数据包结构错误
    #[error("数据包格式错误: {message}")]
    MalformedBundle { message: String },

    /// 版本不兼容
    #[error("数据包版本 {bundle_version} 与当前版本 {current_version} 不兼容")]
    IncompatibleVersion {
        bundle_version: String,
        current_version: String,
    },

    /// JSON 序列化/反序列化错误
    #[error("序列化错误: {0}")]
    Serde(String),
}

impl From<serde_json::Error> for CodecError {
    fn from(e: serde_json::Error) -> Self {
        CodecError::Serde(e.to_string())
    }
}

/// vn-objects 统一错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VnError {
    /// 对象存储错误
    #[error("对象错误: {0}")]
    Object(#[from] ObjectError),

    /// 编解码错误
    #[error("编解码错误: {0}")]
    Codec(#[from] CodecError),
}

/// Result 类型别名
pub type VnResult<T> = Result<T, VnError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ObjectError::ComponentMissing {
            id: ObjectId::new(3),
            component: "Timer".to_string(),
        };
        insta::assert_snapshot!(err.to_string(), @"对象 ObjectId(3) 上没有组件 'Timer'");

        let err = VnError::from(CodecError::UnresolvedReference {
            reference: "document:ch01".to_string(),
        });
        insta::assert_snapshot!(err.to_string(), @"编解码错误: 无法解析的引用 'document:ch01'");
    }

    #[test]
    fn test_serde_error_conversion() {
        let err: CodecError = serde_json::from_str::<u32>("\"x\"").unwrap_err().into();
        assert!(matches!(err, CodecError::Serde(_)));
    }
}
