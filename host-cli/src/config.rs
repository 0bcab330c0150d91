//! # Config 模块
//!
//! 无界面宿主的运行配置。
//!
//! ## 配置优先级
//!
//! 1. 命令行参数（最高）
//! 2. 配置文件 (config.json)
//! 3. 默认值（最低）

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{Level, info, warn};
use vn_objects::TempSettings;

/// 单次运行允许模拟的最大帧数（60 fps 下一小时）
pub const MAX_FRAMES: u64 = 60 * 60 * 60;

/// 宿主配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostConfig {
    /// 模拟的帧数
    #[serde(default = "default_frames")]
    pub frames: u64,

    /// 存档目录
    #[serde(default = "default_saves_dir")]
    pub saves_dir: PathBuf,

    /// 日志级别（trace/debug/info/warn/error）
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// 跳过模式
    #[serde(default)]
    pub skip: SkipConfig,
}

/// 跳过模式配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkipConfig {
    #[serde(default)]
    pub enabled: bool,

    /// 跳过时动画剩余部分压缩到的帧数；0 表示立即结束
    #[serde(default)]
    pub skip_time: u32,
}

impl SkipConfig {
    pub fn settings(&self) -> TempSettings {
        TempSettings {
            skip: self.enabled,
            skip_time: self.skip_time,
        }
    }
}

// 默认值函数
fn default_frames() -> u64 {
    180
}

fn default_saves_dir() -> PathBuf {
    PathBuf::from("saves")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            frames: default_frames(),
            saves_dir: default_saves_dir(),
            log_level: default_log_level(),
            skip: SkipConfig::default(),
        }
    }
}

impl HostConfig {
    /// 加载配置文件
    ///
    /// 文件不存在或解析失败时返回默认配置并记录警告。
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            warn!(path = %path.display(), "配置文件不存在，使用默认配置");
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(config) => {
                    info!(path = %path.display(), "配置文件加载成功");
                    config
                }
                Err(e) => {
                    warn!(error = %e, "配置文件解析失败，使用默认配置");
                    Self::default()
                }
            },
            Err(e) => {
                warn!(error = %e, "配置文件读取失败，使用默认配置");
                Self::default()
            }
        }
    }

    /// 保存配置到文件
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializationFailed(e.to_string()))?;

        fs::write(path, json).map_err(|e| ConfigError::Io(e.to_string()))?;

        Ok(())
    }

    /// 解析日志级别
    pub fn level(&self) -> Result<Level, ConfigError> {
        Level::from_str(&self.log_level).map_err(|_| {
            ConfigError::ValidationFailed(format!("未知的日志级别: {}", self.log_level))
        })
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frames == 0 || self.frames > MAX_FRAMES {
            return Err(ConfigError::ValidationFailed(format!(
                "frames 必须在 1 - {MAX_FRAMES} 之间"
            )));
        }

        if self.saves_dir.as_os_str().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "saves_dir 不能为空".to_string(),
            ));
        }

        self.level()?;
        Ok(())
    }
}

/// 配置错误
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("配置序列化失败: {0}")]
    SerializationFailed(String),

    #[error("配置 IO 错误: {0}")]
    Io(String),

    #[error("配置验证失败: {0}")]
    ValidationFailed(String),
}
