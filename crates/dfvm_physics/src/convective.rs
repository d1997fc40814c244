// crates/dfvm_physics/src/convective.rs

//! 传导项（Convective）
//!
//! 每个面的传导系数
//!
//! ```text
//! beta[f] = D(c̄) · weigh(B(c0, z0), B(c1, z1)) · S[axis] / h[axis]
//! ```
//!
//! `c̄` 为两侧浓度的算术平均，`B` 为分区的相对传导系数。边界面只有一个
//! 邻居，取该单元的值两次。没有活动邻居的面传导系数为 0。

use std::sync::Arc;

use dfvm_config::WeighingMethod;
use dfvm_foundation::error::check_len;
use dfvm_foundation::DfvmResult;
use dfvm_grid::StructuredGrid;

use crate::properties::MaterialProperties;

/// 面上浓度：两侧算术平均，边界面取唯一邻居
#[inline]
pub fn face_concentration(cells: &[usize], concs: &[f64]) -> f64 {
    match cells {
        [c0, c1] => 0.5 * (concs[*c0] + concs[*c1]),
        [c0] => concs[*c0],
        _ => 0.0,
    }
}

/// 两侧取值的加权
///
/// ```
/// use dfvm_config::WeighingMethod;
/// use dfvm_physics::convective::weigh;
///
/// assert_eq!(weigh(WeighingMethod::MeanHarmonic, 2.0, 2.0), 2.0);
/// assert_eq!(weigh(WeighingMethod::UpWind, 3.0, 7.0), 7.0);
/// assert_eq!(weigh(WeighingMethod::MeanAverage, 4.0, 6.0), 5.0);
/// ```
#[inline]
pub fn weigh(method: WeighingMethod, v0: f64, v1: f64) -> f64 {
    match method {
        WeighingMethod::MeanAverage => 0.5 * (v0 + v1),
        WeighingMethod::MeanHarmonic => {
            let sum = v0 + v1;
            if sum == 0.0 {
                0.0
            } else {
                2.0 * v0 * v1 / sum
            }
        }
        WeighingMethod::UpWind => v0.max(v1),
    }
}

/// 传导项计算器
pub struct Convective {
    grid: Arc<StructuredGrid>,
    props: Arc<dyn MaterialProperties>,
    method: WeighingMethod,
    /// 各轴 `S / h`
    geometric: [f64; 3],
    betas: Vec<f64>,
}

impl Convective {
    /// 创建计算器
    pub fn new(
        grid: Arc<StructuredGrid>,
        props: Arc<dyn MaterialProperties>,
        method: WeighingMethod,
    ) -> Self {
        let spacing = grid.spacing();
        let geometric = std::array::from_fn(|a| grid.face_area(a) / spacing[a]);
        let betas = vec![0.0; grid.faces_n()];
        Self {
            grid,
            props,
            method,
            geometric,
            betas,
        }
    }

    /// 权重方法
    #[inline]
    pub fn method(&self) -> WeighingMethod {
        self.method
    }

    /// 最近一次计算的传导系数
    #[inline]
    pub fn betas(&self) -> &[f64] {
        &self.betas
    }

    /// 某轴的几何因子 `S / h`
    #[inline]
    pub fn geometric_factor(&self, axis: usize) -> f64 {
        self.geometric[axis]
    }

    /// 按上一时刻浓度计算所有面的传导系数
    pub fn compute_betas(&mut self, concs: &[f64]) -> DfvmResult<&[f64]> {
        let grid = &self.grid;
        check_len("concs", grid.cells_n(), concs.len())?;

        for (face, beta) in self.betas.iter_mut().enumerate() {
            let cells = grid.neighbor_cells(face);
            if !cells.iter().any(|&c| grid.is_active(c)) {
                *beta = 0.0;
                continue;
            }
            let b0 = self.props.flow_coefficient(concs[cells[0]], grid.zone(cells[0]));
            let b1 = match cells.get(1) {
                Some(&c1) => self.props.flow_coefficient(concs[c1], grid.zone(c1)),
                None => b0,
            };
            let diffusivity = self.props.diffusivity(face_concentration(cells, concs));
            *beta = diffusivity
                * weigh(self.method, b0, b1)
                * self.geometric[grid.face_axis(face)];
        }
        Ok(&self.betas)
    }
}
