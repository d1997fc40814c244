// crates/dfvm_physics/src/local.rs

//! 累积项（Local）
//!
//! 隐式格式中每个单元的累积系数
//!
//! ```text
//! alpha[c] = A(conc[c], zone[c]) · V / dt
//! ```
//!
//! 同时负责把总时长切分为时间步序列。

use std::sync::Arc;

use dfvm_config::TimeConfig;
use dfvm_foundation::error::check_len;
use dfvm_foundation::{DfvmError, DfvmResult};
use dfvm_grid::StructuredGrid;

use crate::properties::MaterialProperties;

/// 商与整数的相对差小于该值时不追加余数步
const STEP_ROUNDING_TOL: f64 = 1e-9;

/// 时间步数上限
const MAX_TIME_STEPS: f64 = 1e8;

/// 切分时间步序列
///
/// `floor(period / step)` 个完整步，余数严格为正时追加一个余数步。
///
/// ```
/// use dfvm_physics::local::compute_time_steps;
///
/// assert_eq!(compute_time_steps(10.0, 3.0).unwrap(), vec![3.0, 3.0, 3.0, 1.0]);
/// assert_eq!(compute_time_steps(9.0, 3.0).unwrap(), vec![3.0, 3.0, 3.0]);
/// assert!(compute_time_steps(9.0, 0.0).is_err());
/// ```
pub fn compute_time_steps(time_period: f64, time_step: f64) -> DfvmResult<Vec<f64>> {
    if !(time_period.is_finite() && time_period > 0.0) {
        return Err(DfvmError::invalid_config(
            "time_period",
            time_period,
            "总时长必须为有限正数",
        ));
    }
    if !(time_step.is_finite() && time_step > 0.0) {
        return Err(DfvmError::invalid_config(
            "time_step",
            time_step,
            "时间步长必须为有限正数",
        ));
    }

    let ratio = time_period / time_step;
    if ratio > MAX_TIME_STEPS {
        return Err(DfvmError::invalid_config(
            "time_step",
            time_step,
            format!("时间步数 {ratio:.3e} 超过上限"),
        ));
    }

    let nearest = ratio.round();
    let (full, remainder) =
        if nearest >= 1.0 && (ratio - nearest).abs() <= STEP_ROUNDING_TOL * nearest {
            (nearest as usize, 0.0)
        } else {
            let floor = ratio.floor();
            (floor as usize, time_period - floor * time_step)
        };

    let mut steps = vec![time_step; full];
    if remainder > 0.0 {
        steps.push(remainder);
    }
    Ok(steps)
}

/// 累积项计算器
pub struct Local {
    grid: Arc<StructuredGrid>,
    props: Arc<dyn MaterialProperties>,
    time_steps: Vec<f64>,
    alphas: Vec<f64>,
}

impl Local {
    /// 创建计算器并切分时间步
    pub fn new(
        grid: Arc<StructuredGrid>,
        props: Arc<dyn MaterialProperties>,
        time: &TimeConfig,
    ) -> DfvmResult<Self> {
        let time_steps = compute_time_steps(time.time_period, time.time_step)?;
        let alphas = vec![0.0; grid.cells_n()];
        Ok(Self {
            grid,
            props,
            time_steps,
            alphas,
        })
    }

    /// 时间步序列
    #[inline]
    pub fn time_steps(&self) -> &[f64] {
        &self.time_steps
    }

    /// 最近一次计算的累积系数
    #[inline]
    pub fn alphas(&self) -> &[f64] {
        &self.alphas
    }

    /// 按上一时刻浓度计算累积系数
    pub fn compute_alphas(&mut self, concs: &[f64], dt: f64) -> DfvmResult<&[f64]> {
        check_len("concs", self.grid.cells_n(), concs.len())?;
        if !(dt.is_finite() && dt > 0.0) {
            return Err(DfvmError::invalid_input(format!("时间步长 {dt} 必须为有限正数")));
        }
        let scale = self.grid.cell_volume() / dt;
        let zones = self.grid.zones();
        for ((alpha, &conc), &zone) in self.alphas.iter_mut().zip(concs).zip(zones) {
            *alpha = self.props.storage_coefficient(conc, zone) * scale;
        }
        Ok(&self.alphas)
    }
}
