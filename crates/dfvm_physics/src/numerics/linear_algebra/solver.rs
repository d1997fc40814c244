// crates/dfvm_physics/src/numerics/linear_algebra/solver.rs

//! 迭代线性求解器
//!
//! Dirichlet 行只保留对角元，系统矩阵一般不对称，因此采用预条件
//! BiCGStab。求解状态（收敛、达到迭代上限、发散、停滞）原样返回给调用方，
//! 是否接受结果由方程引擎按配置决定。
//!
//! # 使用示例
//!
//! ```
//! use dfvm_config::LinearSolverConfig;
//! use dfvm_physics::numerics::linear_algebra::{
//!     BiCgStabSolver, CsrBuilder, IterativeSolver, JacobiPreconditioner,
//! };
//!
//! let mut builder = CsrBuilder::new(2);
//! builder.set(0, 0, 3.0);
//! builder.set(0, 1, 1.0);
//! builder.set(1, 1, 2.0);
//! let matrix = builder.build();
//!
//! let precond = JacobiPreconditioner::from_matrix(&matrix);
//! let mut solver = BiCgStabSolver::new(LinearSolverConfig::default());
//! let mut x = vec![0.0; 2];
//! let result = solver.solve(&matrix, &[5.0, 4.0], &mut x, &precond);
//! assert!(result.is_converged());
//! assert!((x[0] - 1.0).abs() < 1e-8 && (x[1] - 2.0).abs() < 1e-8);
//! ```

use serde::Serialize;

use dfvm_config::LinearSolverConfig;

use super::csr::CsrMatrix;
use super::preconditioner::Preconditioner;
use super::vector_ops::{axpy, copy, dot, norm2};

/// 相对于初始残差平方的失效阈值
const BREAKDOWN_FACTOR: f64 = 1e-30;

/// 矩阵向量乘，启用 `parallel` 时按行并行
#[inline]
fn spmv(matrix: &CsrMatrix, x: &[f64], y: &mut [f64]) {
    #[cfg(feature = "parallel")]
    matrix.mul_vec_parallel(x, y);
    #[cfg(not(feature = "parallel"))]
    matrix.mul_vec(x, y);
}

/// 残差增长超过初始残差的该倍数视为发散
const DIVERGENCE_FACTOR: f64 = 1e6;

/// 求解器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SolverStatus {
    /// 收敛
    Converged,
    /// 达到最大迭代次数
    MaxIterationsReached,
    /// 发散
    Diverged,
    /// 停滞（内积失效）
    Stagnated,
}

/// 求解器结果
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SolverResult {
    /// 求解状态
    pub status: SolverStatus,
    /// 迭代次数
    pub iterations: usize,
    /// 最终残差范数
    pub residual_norm: f64,
    /// 初始残差范数
    pub initial_residual_norm: f64,
    /// 相对残差
    pub relative_residual: f64,
}

impl SolverResult {
    /// 是否收敛
    #[inline]
    pub fn is_converged(&self) -> bool {
        self.status == SolverStatus::Converged
    }

    fn new(status: SolverStatus, iterations: usize, residual: f64, initial: f64) -> Self {
        let relative = if initial > 0.0 { residual / initial } else { 0.0 };
        Self {
            status,
            iterations,
            residual_norm: residual,
            initial_residual_norm: initial,
            relative_residual: relative,
        }
    }
}

/// 迭代求解器 trait
pub trait IterativeSolver {
    /// 求解 `A x = b`，`x` 输入初值、输出解
    fn solve<P: Preconditioner>(
        &mut self,
        matrix: &CsrMatrix,
        b: &[f64],
        x: &mut [f64],
        precond: &P,
    ) -> SolverResult;

    /// 名称
    fn name(&self) -> &'static str;
}

/// 预条件 BiCGStab 求解器
///
/// 工作向量在首次求解时按阶数分配，之后复用。
#[derive(Debug, Clone)]
pub struct BiCgStabSolver {
    config: LinearSolverConfig,
    r: Vec<f64>,
    r0: Vec<f64>,
    p: Vec<f64>,
    v: Vec<f64>,
    s: Vec<f64>,
    t: Vec<f64>,
    p_hat: Vec<f64>,
    s_hat: Vec<f64>,
}

impl BiCgStabSolver {
    /// 创建求解器
    pub fn new(config: LinearSolverConfig) -> Self {
        Self {
            config,
            r: Vec::new(),
            r0: Vec::new(),
            p: Vec::new(),
            v: Vec::new(),
            s: Vec::new(),
            t: Vec::new(),
            p_hat: Vec::new(),
            s_hat: Vec::new(),
        }
    }

    /// 求解器配置
    #[inline]
    pub fn config(&self) -> &LinearSolverConfig {
        &self.config
    }

    fn ensure_workspace(&mut self, n: usize) {
        if self.r.len() != n {
            for buf in [
                &mut self.r,
                &mut self.r0,
                &mut self.p,
                &mut self.v,
                &mut self.s,
                &mut self.t,
                &mut self.p_hat,
                &mut self.s_hat,
            ] {
                buf.clear();
                buf.resize(n, 0.0);
            }
        }
    }
}

impl IterativeSolver for BiCgStabSolver {
    fn solve<P: Preconditioner>(
        &mut self,
        matrix: &CsrMatrix,
        b: &[f64],
        x: &mut [f64],
        precond: &P,
    ) -> SolverResult {
        let n = b.len();
        self.ensure_workspace(n);
        let rtol = self.config.rtol;
        let atol = self.config.atol;

        // r = b - A x
        spmv(matrix, x, &mut self.r);
        for (ri, bi) in self.r.iter_mut().zip(b) {
            *ri = bi - *ri;
        }
        let initial = norm2(&self.r);
        if initial <= atol || initial == 0.0 {
            return SolverResult::new(SolverStatus::Converged, 0, initial, initial);
        }
        let breakdown = BREAKDOWN_FACTOR * initial * initial;

        copy(&self.r, &mut self.r0);
        self.p.fill(0.0);
        self.v.fill(0.0);

        let mut rho_old = 1.0;
        let mut alpha = 1.0;
        let mut omega = 1.0;

        for iter in 0..self.config.max_iter {
            let rho = dot(&self.r0, &self.r);
            if rho.abs() < breakdown {
                return SolverResult::new(SolverStatus::Stagnated, iter, norm2(&self.r), initial);
            }

            let beta = if iter == 0 {
                0.0
            } else {
                (rho / rho_old) * (alpha / omega)
            };
            rho_old = rho;

            // p = r + beta (p - omega v)
            for i in 0..n {
                self.p[i] = self.r[i] + beta * (self.p[i] - omega * self.v[i]);
            }
            precond.apply(&self.p, &mut self.p_hat);
            spmv(matrix, &self.p_hat, &mut self.v);

            let r0v = dot(&self.r0, &self.v);
            if r0v.abs() < breakdown {
                return SolverResult::new(SolverStatus::Stagnated, iter, norm2(&self.r), initial);
            }
            alpha = rho / r0v;

            // s = r - alpha v
            for i in 0..n {
                self.s[i] = self.r[i] - alpha * self.v[i];
            }
            let s_norm = norm2(&self.s);
            if s_norm <= atol || s_norm / initial < rtol {
                axpy(alpha, &self.p_hat, x);
                return SolverResult::new(SolverStatus::Converged, iter + 1, s_norm, initial);
            }

            precond.apply(&self.s, &mut self.s_hat);
            spmv(matrix, &self.s_hat, &mut self.t);

            let tt = dot(&self.t, &self.t);
            omega = if tt > 0.0 { dot(&self.t, &self.s) / tt } else { 0.0 };

            axpy(alpha, &self.p_hat, x);
            if omega.abs() < f64::EPSILON * f64::EPSILON {
                return SolverResult::new(SolverStatus::Stagnated, iter + 1, s_norm, initial);
            }
            axpy(omega, &self.s_hat, x);

            // r = s - omega t
            for i in 0..n {
                self.r[i] = self.s[i] - omega * self.t[i];
            }
            let res = norm2(&self.r);
            if self.config.verbose {
                log::trace!("BiCGStab iter {}: residual = {:.6e}", iter + 1, res);
            }

            if res <= atol || res / initial < rtol {
                return SolverResult::new(SolverStatus::Converged, iter + 1, res, initial);
            }
            if !res.is_finite() || res > initial * DIVERGENCE_FACTOR {
                return SolverResult::new(SolverStatus::Diverged, iter + 1, res, initial);
            }
        }

        SolverResult::new(
            SolverStatus::MaxIterationsReached,
            self.config.max_iter,
            norm2(&self.r),
            initial,
        )
    }

    fn name(&self) -> &'static str {
        "BiCGStab"
    }
}
