// crates/dfvm_foundation/src/lib.rs

//! DFVM Foundation Layer
//!
//! 扩散有限体积求解器的基础层，被网格、配置与物理层共同依赖。
//!
//! # 模块概览
//!
//! - [`error`]: 统一错误类型
//! - [`group`]: 类型化分组标签与材料分区
//! - [`kahan`]: 补偿求和，用于守恒量诊断
//! - [`metrics`]: 阶段计时钩子
//!
//! # 示例
//!
//! ```
//! use dfvm_foundation::prelude::*;
//!
//! let label: GroupLabel = "left".parse().unwrap();
//! assert_eq!(label.side(), Some((0, false)));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod group;
pub mod kahan;
pub mod metrics;

pub use error::{DfvmError, DfvmResult};
pub use group::{GroupLabel, Zone};
pub use kahan::KahanSum;
pub use metrics::{TimingEntry, TimingHook, TimingLog};

/// Prelude 模块，包含常用类型
pub mod prelude {
    pub use crate::error::{check_len, DfvmError, DfvmResult};
    pub use crate::group::{GroupLabel, Zone};
    pub use crate::kahan::KahanSum;
    pub use crate::metrics::{TimingHook, TimingLog};
}
