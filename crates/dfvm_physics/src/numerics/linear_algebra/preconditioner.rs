// crates/dfvm_physics/src/numerics/linear_algebra/preconditioner.rs

//! 预条件器
//!
//! 扩散矩阵的对角元由累积项主导，Jacobi 预条件即可显著改善条件数。

use super::csr::CsrMatrix;

/// 预条件器 trait：`z = M⁻¹ r`
pub trait Preconditioner: Send + Sync {
    /// 应用预条件器
    fn apply(&self, r: &[f64], z: &mut [f64]);

    /// 名称
    fn name(&self) -> &'static str;

    /// 矩阵数值变化（模式不变）后刷新
    fn update(&mut self, matrix: &CsrMatrix);
}

/// 恒等预条件器
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityPreconditioner;

impl Preconditioner for IdentityPreconditioner {
    fn apply(&self, r: &[f64], z: &mut [f64]) {
        z.copy_from_slice(r);
    }

    fn name(&self) -> &'static str {
        "Identity"
    }

    fn update(&mut self, _matrix: &CsrMatrix) {}
}

/// 对角元绝对值低于该阈值时不做缩放
const DIAG_THRESHOLD: f64 = 1e-300;

/// Jacobi（对角）预条件器
#[derive(Debug, Clone, Default)]
pub struct JacobiPreconditioner {
    inv_diag: Vec<f64>,
}

impl JacobiPreconditioner {
    /// 由矩阵构建
    pub fn from_matrix(matrix: &CsrMatrix) -> Self {
        let mut precond = Self::default();
        precond.update(matrix);
        precond
    }

    /// 对角元倒数
    #[inline]
    pub fn inv_diag(&self) -> &[f64] {
        &self.inv_diag
    }
}

impl Preconditioner for JacobiPreconditioner {
    fn apply(&self, r: &[f64], z: &mut [f64]) {
        for ((zi, ri), d) in z.iter_mut().zip(r).zip(&self.inv_diag) {
            *zi = ri * d;
        }
    }

    fn name(&self) -> &'static str {
        "Jacobi"
    }

    fn update(&mut self, matrix: &CsrMatrix) {
        self.inv_diag.clear();
        self.inv_diag.extend(matrix.extract_diagonal().into_iter().map(|d| {
            if d.abs() > DIAG_THRESHOLD {
                1.0 / d
            } else {
                1.0
            }
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numerics::linear_algebra::csr::CsrBuilder;

    #[test]
    fn test_jacobi_apply() {
        let mut builder = CsrBuilder::new(3);
        builder.set(0, 0, 2.0);
        builder.set(1, 1, 4.0);
        builder.set(2, 2, 0.0);
        builder.set(2, 0, 1.0);
        let matrix = builder.build();

        let precond = JacobiPreconditioner::from_matrix(&matrix);
        let mut z = vec![0.0; 3];
        precond.apply(&[2.0, 2.0, 5.0], &mut z);
        assert_eq!(z, vec![1.0, 0.5, 5.0]);
        assert_eq!(precond.name(), "Jacobi");
    }

    #[test]
    fn test_identity() {
        let mut z = vec![0.0; 2];
        IdentityPreconditioner.apply(&[1.0, -2.0], &mut z);
        assert_eq!(z, vec![1.0, -2.0]);
    }
}
