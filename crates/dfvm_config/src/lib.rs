// crates/dfvm_config/src/lib.rs

//! DFVM Config Layer
//!
//! 配置层，定义扩散模拟的全部可调参数，使用 serde 以 JSON 读写。
//!
//! # 模块概览
//!
//! - [`simulation`]: [`DfvmConfig`] 总配置、时间与线性求解器配置
//! - [`material`]: 材料参数与线性律
//! - [`boundary`]: 边界条件分组配置
//! - [`weighing`]: 面上物性权重方法
//! - [`error`]: 配置错误类型
//!
//! # 层级架构
//!
//! ```text
//! dfvm_physics    ─> 读取 DfvmConfig 构建方程引擎
//! dfvm_config     ─> 本层
//! dfvm_grid       ─> 结构化网格
//! dfvm_foundation ─> 错误、分组标签
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod boundary;
pub mod error;
pub mod material;
pub mod simulation;
pub mod weighing;

pub use boundary::BoundaryConfig;
pub use error::ConfigError;
pub use material::{LinearLaw, MaterialConfig};
pub use simulation::{DfvmConfig, LinearSolverConfig, NonConvergencePolicy, TimeConfig};
pub use weighing::WeighingMethod;
