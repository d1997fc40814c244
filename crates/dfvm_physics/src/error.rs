// crates/dfvm_physics/src/error.rs

//! 物理层错误类型
//!
//! 在基础层 [`DfvmError`] 与配置层 [`ConfigError`] 之上增加求解相关的错误。

use dfvm_config::ConfigError;
use dfvm_foundation::DfvmError;
use thiserror::Error;

use crate::numerics::linear_algebra::SolverStatus;

/// 物理层结果类型
pub type PhysicsResult<T> = Result<T, PhysicsError>;

/// 物理层错误
#[derive(Error, Debug)]
pub enum PhysicsError {
    /// 基础层错误
    #[error(transparent)]
    Foundation(#[from] DfvmError),

    /// 配置错误
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// 线性求解未收敛，本步已回滚
    #[error("第 {step} 步线性求解未收敛: {status:?}, 迭代 {iterations} 次, 残差 {residual:.3e}")]
    NotConverged {
        /// 失败的步序号（从 0 开始）
        step: usize,
        /// 求解状态
        status: SolverStatus,
        /// 迭代次数
        iterations: usize,
        /// 最终残差范数
        residual: f64,
        /// 求解器给出的最后一次迭代结果
        best_iterate: Vec<f64>,
    },

    /// 全部时间步已完成
    #[error("时间推进已结束, 共 {steps} 步")]
    Finished {
        /// 总步数
        steps: usize,
    },

    /// 当前状态不允许该操作
    #[error("状态错误: {0}")]
    InvalidState(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_foundation() {
        let err: PhysicsError = DfvmError::invalid_input("bad").into();
        assert!(matches!(err, PhysicsError::Foundation(_)));
        assert!(err.to_string().contains("bad"));
    }

    #[test]
    fn test_not_converged_display() {
        let err = PhysicsError::NotConverged {
            step: 3,
            status: SolverStatus::MaxIterationsReached,
            iterations: 10,
            residual: 1.5e-3,
            best_iterate: vec![0.0; 2],
        };
        let msg = err.to_string();
        assert!(msg.contains("第 3 步"));
        assert!(msg.contains("MaxIterationsReached"));
    }
}
