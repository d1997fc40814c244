// crates/dfvm_physics/src/numerics/linear_algebra/mod.rs

//! 稀疏线性代数
//!
//! - [`csr`]: CSR 稀疏模式、矩阵与构建器
//! - [`vector_ops`]: 向量运算
//! - [`preconditioner`]: 恒等 / Jacobi 预条件器
//! - [`solver`]: BiCGStab 求解器与求解结果

pub mod csr;
pub mod preconditioner;
pub mod solver;
pub mod vector_ops;

pub use csr::{CsrBuilder, CsrMatrix, CsrPattern};
pub use preconditioner::{IdentityPreconditioner, JacobiPreconditioner, Preconditioner};
pub use solver::{BiCgStabSolver, IterativeSolver, SolverResult, SolverStatus};
pub use vector_ops::{axpy, copy, dot, norm2};
