// crates/dfvm_foundation/src/error.rs

//! 错误处理模块，定义统一错误类型
//!
//! 提供 `DfvmError` 枚举和 `DfvmResult` 类型别名。基础层只定义与网格、
//! 输入和配置相关的核心错误，求解相关的错误在 `dfvm_physics` 中扩展。
//!
//! # 示例
//!
//! ```
//! use dfvm_foundation::error::{DfvmError, DfvmResult};
//!
//! fn check_dims(n: usize) -> DfvmResult<()> {
//!     if n < 2 {
//!         return Err(DfvmError::invalid_input("每个方向至少需要 2 个节点"));
//!     }
//!     Ok(())
//! }
//! assert!(check_dims(1).is_err());
//! ```

use thiserror::Error;

use crate::group::GroupLabel;

/// 统一结果类型
pub type DfvmResult<T> = Result<T, DfvmError>;

/// 核心错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DfvmError {
    // ========================================================================
    // 输入与数据
    // ========================================================================
    /// 无效输入
    #[error("无效的输入数据: {message}")]
    InvalidInput {
        /// 说明无效原因
        message: String,
    },

    /// 数组大小不匹配
    #[error("数组大小不匹配: {name} 期望{expected}, 实际{actual}")]
    SizeMismatch {
        /// 数据名称
        name: String,
        /// 期望大小
        expected: usize,
        /// 实际大小
        actual: usize,
    },

    /// 索引越界
    #[error("索引越界: {index_type} 索引 {index} 超出范围 0..{len}")]
    IndexOutOfBounds {
        /// 索引类别描述
        index_type: &'static str,
        /// 访问的索引
        index: usize,
        /// 上界（长度）
        len: usize,
    },

    // ========================================================================
    // 网格拓扑
    // ========================================================================
    /// 拓扑不一致
    #[error("网格拓扑不一致: {message}")]
    InvalidTopology {
        /// 具体错误信息
        message: String,
    },

    /// 未注册的分组
    #[error("分组未注册: {label}")]
    UnknownGroup {
        /// 查询的分组标签
        label: GroupLabel,
    },

    /// 命名资源未找到（命名数组等）
    #[error("资源未找到: {resource}")]
    NotFound {
        /// 资源名称
        resource: String,
    },

    // ========================================================================
    // 配置
    // ========================================================================
    /// 配置值无效
    #[error("配置值无效: {key}={value}, 原因: {reason}")]
    InvalidConfig {
        /// 配置键名
        key: String,
        /// 配置值
        value: String,
        /// 无效原因说明
        reason: String,
    },

    /// 内部错误
    #[error("内部错误: {message}")]
    Internal {
        /// 内部错误描述
        message: String,
    },
}

// ========================================================================
// 便捷构造方法
// ========================================================================

impl DfvmError {
    /// 无效输入
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// 数组大小不匹配
    pub fn size_mismatch(name: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::SizeMismatch {
            name: name.into(),
            expected,
            actual,
        }
    }

    /// 索引越界
    pub fn index_out_of_bounds(index_type: &'static str, index: usize, len: usize) -> Self {
        Self::IndexOutOfBounds {
            index_type,
            index,
            len,
        }
    }

    /// 拓扑不一致
    pub fn topology(message: impl Into<String>) -> Self {
        Self::InvalidTopology {
            message: message.into(),
        }
    }

    /// 未注册的分组
    pub fn unknown_group(label: GroupLabel) -> Self {
        Self::UnknownGroup { label }
    }

    /// 资源未找到
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// 配置值无效
    pub fn invalid_config(
        key: impl Into<String>,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidConfig {
            key: key.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    /// 内部错误
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

/// 检查数组长度，不匹配时返回 `SizeMismatch`
///
/// ```
/// use dfvm_foundation::error::check_len;
/// assert!(check_len("concs", 4, 4).is_ok());
/// assert!(check_len("concs", 4, 3).is_err());
/// ```
#[inline]
pub fn check_len(name: &str, expected: usize, actual: usize) -> DfvmResult<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(DfvmError::size_mismatch(name, expected, actual))
    }
}
