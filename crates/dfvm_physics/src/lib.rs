// crates/dfvm_physics/src/lib.rs

//! 隐式有限体积扩散求解
//!
//! 在结构化网格上逐步组装并求解非线性扩散方程，包括：
//! - 稀疏线性代数 (numerics) - CSR 矩阵、预条件器、BiCGStab
//! - 材料物性接口 (properties)
//! - 累积项 (local) - 时间步切分与累积系数
//! - 传导项 (convective) - 面传导系数与加权
//! - 边界条件 (boundary) - Dirichlet 单元、通量面、无通量面
//! - 方程引擎 (equation) - 组装、求解、历史与通量统计
//!
//! # Trait 抽象
//!
//! - [`MaterialProperties`]: 物性查询接口
//! - [`IterativeSolver`]: 迭代求解器接口
//! - [`Preconditioner`]: 预条件器接口

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod boundary;
pub mod convective;
pub mod equation;
pub mod error;
pub mod local;
pub mod numerics;
pub mod properties;

pub use boundary::{BoundaryConditions, FaceKind};
pub use convective::Convective;
pub use equation::{Equation, EquationState, FlowComponent, StepReport};
pub use error::{PhysicsError, PhysicsResult};
pub use local::Local;
pub use numerics::linear_algebra::{
    BiCgStabSolver, CsrMatrix, IterativeSolver, JacobiPreconditioner, Preconditioner,
    SolverResult, SolverStatus,
};
pub use properties::{MaterialProperties, ZonedProperties};

/// Prelude 模块，包含常用类型
pub mod prelude {
    pub use crate::boundary::shift_boundary_faces;
    pub use crate::equation::{Equation, EquationState, FlowComponent, StepReport};
    pub use crate::error::{PhysicsError, PhysicsResult};
    pub use crate::properties::{MaterialProperties, ZonedProperties};
    pub use dfvm_config::{BoundaryConfig, DfvmConfig, MaterialConfig, WeighingMethod};
    pub use dfvm_foundation::{GroupLabel, TimingLog, Zone};
    pub use dfvm_grid::StructuredGrid;
}
