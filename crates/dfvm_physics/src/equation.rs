// crates/dfvm_physics/src/equation.rs

//! 隐式扩散方程引擎
//!
//! 每个时间步组装并求解
//!
//! ```text
//! alpha_i·c_i + Σ_f n_if·Σ_j beta_f·n_jf·c_j = alpha_i·c_i^prev + q_i
//! ```
//!
//! 其中 `n` 为法向符号，`q` 为通量面注入量。稀疏模式在构造时确定：每个单元
//! 的对角元，加上非 Dirichlet 单元与所有经一个面相邻的单元之间的非对角元。
//! 每个 (单元, 局部面, 面邻居) 的值索引也在构造时缓存，之后每步只做
//! 清零和按索引回填。
//!
//! # 状态机
//!
//! ```text
//! Constructed ──step──> Stepped{0} ──step──> ... ──step──> Finished
//! ```
//!
//! 浓度使用两块缓冲交替存放：每步开始交换 `i_curr` / `i_prev`，物性按
//! `concs[i_prev]` 计算，解写入 `concs[i_curr]`。
//!
//! # 使用示例
//!
//! ```
//! use std::sync::Arc;
//! use dfvm_config::{BoundaryConfig, DfvmConfig, MaterialConfig};
//! use dfvm_foundation::GroupLabel;
//! use dfvm_grid::StructuredGrid;
//! use dfvm_physics::Equation;
//!
//! let grid = Arc::new(StructuredGrid::new([6, 2, 2], [0.0; 3], [1.0; 3]).unwrap());
//! let config = DfvmConfig::default()
//!     .with_time(1.0, 0.5)
//!     .with_material(MaterialConfig::uniform(1.0, 1.0))
//!     .with_boundary(BoundaryConfig::default().with_dirichlet(GroupLabel::Left, 1.0));
//!
//! let mut eq = Equation::from_config(grid, &config).unwrap();
//! let reports = eq.run().unwrap();
//! assert_eq!(reports.len(), 2);
//! assert_eq!(eq.concentrations()[0], 1.0);
//! assert!(eq.concentrations()[1] > 0.0);
//! ```

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;

use dfvm_config::{DfvmConfig, NonConvergencePolicy, WeighingMethod};
use dfvm_foundation::error::check_len;
use dfvm_foundation::{DfvmError, GroupLabel, KahanSum, TimingHook};
use dfvm_grid::{StructuredGrid, FACES_PER_CELL};

use crate::boundary::{active_neighbor, BoundaryConditions, FaceKind};
use crate::convective::{face_concentration, weigh, Convective};
use crate::error::{PhysicsError, PhysicsResult};
use crate::local::Local;
use crate::numerics::linear_algebra::{
    BiCgStabSolver, CsrBuilder, CsrMatrix, IterativeSolver, JacobiPreconditioner, Preconditioner,
    SolverResult,
};
use crate::properties::{MaterialProperties, ZonedProperties};

/// 累积系数过小时 Dirichlet 行改用单位权重
const MIN_DIRICHLET_WEIGHT: f64 = 1e-300;

// =============================================================================
// 公共类型
// =============================================================================

/// 引擎状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EquationState {
    /// 已构造，尚未推进
    Constructed,
    /// 已完成第 `step` 步（从 0 开始）
    Stepped {
        /// 最近完成的步序号
        step: usize,
    },
    /// 全部时间步已完成
    Finished,
}

/// 通量统计所用的传导系数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum FlowComponent {
    /// 传导系数 B（基质为自由 + 表面扩散）
    #[default]
    Total,
    /// 仅自由扩散
    Free,
    /// 仅表面扩散
    Surface,
}

/// 单步推进报告
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StepReport {
    /// 步序号（从 0 开始）
    pub step: usize,
    /// 本步时间步长
    pub dt: f64,
    /// 本步结束时的累计时间
    pub time: f64,
    /// 线性求解结果
    pub solver: SolverResult,
}

/// 面耦合缓存：与面邻居列表对齐的系数，以及通量注入量
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct FaceCoupling {
    coeffs: [f64; 2],
    flux: f64,
}

/// 单元模板：每个局部面、每个面邻居对应的矩阵值索引
type CellStencil = [[Option<usize>; 2]; FACES_PER_CELL];

// =============================================================================
// 引擎
// =============================================================================

/// 隐式扩散方程引擎
pub struct Equation {
    grid: Arc<StructuredGrid>,
    props: Arc<dyn MaterialProperties>,
    weighing: WeighingMethod,
    policy: NonConvergencePolicy,

    local: Local,
    convective: Convective,
    boundary: BoundaryConditions,

    matrix: CsrMatrix,
    diag_idx: Vec<usize>,
    stencil: Vec<CellStencil>,
    couplings: Vec<FaceCoupling>,
    flux_targets: Vec<(usize, usize)>,
    rhs: Vec<f64>,

    concs: [Vec<f64>; 2],
    i_curr: usize,
    i_prev: usize,
    rollback: Vec<f64>,
    concs_time: Vec<Vec<f64>>,
    times: Vec<f64>,
    time: f64,
    state: EquationState,

    solver: BiCgStabSolver,
    precond: JacobiPreconditioner,
    last_solve: Option<SolverResult>,
    hook: Option<Box<dyn TimingHook>>,
}

impl Equation {
    /// 使用配置中的材料参数（[`ZonedProperties`]）构建引擎
    pub fn from_config(grid: Arc<StructuredGrid>, config: &DfvmConfig) -> PhysicsResult<Self> {
        let props: Arc<dyn MaterialProperties> = Arc::new(ZonedProperties::new(&config.material));
        Self::new(grid, props, config)
    }

    /// 构建引擎
    ///
    /// 验证配置、切分时间步、解析边界条件并建立稀疏模式。两块浓度缓冲
    /// 初始化为 0，Dirichlet 单元写入固定浓度。
    pub fn new(
        grid: Arc<StructuredGrid>,
        props: Arc<dyn MaterialProperties>,
        config: &DfvmConfig,
    ) -> PhysicsResult<Self> {
        config.validate()?;

        let local = Local::new(grid.clone(), props.clone(), &config.time)?;
        let convective = Convective::new(grid.clone(), props.clone(), config.weighing);
        let boundary = BoundaryConditions::resolve(&config.boundary, &grid)?;

        let (matrix, diag_idx, stencil) = build_system_pattern(&grid, &boundary)?;
        let flux_targets = boundary
            .face_kinds()
            .iter()
            .enumerate()
            .filter(|(_, kind)| matches!(kind, FaceKind::Flux(_)))
            .filter_map(|(face, _)| active_neighbor(&grid, face).map(|cell| (face, cell)))
            .collect();

        let cells_n = grid.cells_n();
        log::debug!(
            "方程引擎构建完成: cells={}, nnz={}, steps={}, weighing={}",
            cells_n,
            matrix.nnz(),
            local.time_steps().len(),
            config.weighing
        );

        let mut eq = Self {
            weighing: config.weighing,
            policy: config.solver.on_non_convergence,
            local,
            convective,
            boundary,
            matrix,
            diag_idx,
            stencil,
            couplings: vec![FaceCoupling::default(); grid.faces_n()],
            flux_targets,
            rhs: vec![0.0; cells_n],
            concs: [vec![0.0; cells_n], vec![0.0; cells_n]],
            i_curr: 0,
            i_prev: 1,
            rollback: vec![0.0; cells_n],
            concs_time: Vec::new(),
            times: Vec::new(),
            time: 0.0,
            state: EquationState::Constructed,
            solver: BiCgStabSolver::new(config.solver),
            precond: JacobiPreconditioner::default(),
            last_solve: None,
            hook: None,
            grid,
            props,
        };
        eq.stamp_dirichlet_all();
        Ok(eq)
    }

    /// 设置计时钩子
    pub fn with_timing_hook(mut self, hook: impl TimingHook + 'static) -> Self {
        self.hook = Some(Box::new(hook));
        self
    }

    /// 设置或替换计时钩子
    pub fn set_timing_hook(&mut self, hook: Option<Box<dyn TimingHook>>) {
        self.hook = hook;
    }

    // =========================================================================
    // 初值与边界
    // =========================================================================

    /// 设置初始浓度（仅在推进前允许）
    pub fn set_initial_concentrations(&mut self, values: &[f64]) -> PhysicsResult<()> {
        if self.state != EquationState::Constructed {
            return Err(PhysicsError::InvalidState("推进开始后不能再设置初值".into()));
        }
        check_len("initial concs", self.grid.cells_n(), values.len())?;
        if let Some(bad) = values.iter().position(|v| !v.is_finite()) {
            return Err(DfvmError::invalid_input(format!("单元 {bad} 的初始浓度不是有限数")).into());
        }
        for buf in &mut self.concs {
            buf.copy_from_slice(values);
        }
        self.stamp_dirichlet_all();
        Ok(())
    }

    /// 设置均匀初始浓度
    pub fn set_uniform_concentration(&mut self, value: f64) -> PhysicsResult<()> {
        let values = vec![value; self.grid.cells_n()];
        self.set_initial_concentrations(&values)
    }

    /// 从网格的命名单元数组读取初始浓度
    pub fn initial_from_cells_array(&mut self, name: &str) -> PhysicsResult<()> {
        let values = self.grid.cells_arrays().get(name)?.to_vec();
        self.set_initial_concentrations(&values)
    }

    /// 修改 Dirichlet 分组的固定浓度，从下一步起生效
    pub fn set_dirichlet_value(&mut self, label: GroupLabel, value: f64) -> PhysicsResult<()> {
        self.boundary.set_dirichlet_value(label, value)?;
        Ok(())
    }

    fn stamp_dirichlet_all(&mut self) {
        for (cell, value) in self.boundary.dirichlet_cells() {
            self.concs[0][cell] = value;
            self.concs[1][cell] = value;
        }
    }

    // =========================================================================
    // 组装
    // =========================================================================

    /// 按 `concs[i_prev]` 重建系统矩阵与右端项（不求解、不推进）
    ///
    /// 输入不变时重复调用得到逐位相同的结果。
    pub fn rebuild_system(&mut self, dt: f64) -> PhysicsResult<()> {
        let start = Instant::now();
        self.convective.compute_betas(&self.concs[self.i_prev])?;
        self.report("betas", start);

        let start = Instant::now();
        self.local.compute_alphas(&self.concs[self.i_prev], dt)?;
        self.report("alphas", start);

        let start = Instant::now();
        self.fill_couplings();
        self.fill_system();
        self.report("assemble", start);
        Ok(())
    }

    fn fill_couplings(&mut self) {
        let betas = self.convective.betas();
        for (face, coupling) in self.couplings.iter_mut().enumerate() {
            *coupling = FaceCoupling::default();
            match self.boundary.face_kind(face) {
                FaceKind::Interior => {
                    let normals = self.grid.normals_cell_at_face(face);
                    for (slot, &n) in normals.iter().enumerate() {
                        coupling.coeffs[slot] = betas[face] * n;
                    }
                }
                FaceKind::Flux(q) => coupling.flux = q,
                FaceKind::NoFlow => {}
            }
        }
    }

    fn fill_system(&mut self) {
        self.matrix.clear_values();
        let alphas = self.local.alphas();
        let prev = &self.concs[self.i_prev];

        for cell in 0..self.grid.cells_n() {
            self.matrix.set_at(self.diag_idx[cell], alphas[cell]);
            self.rhs[cell] = alphas[cell] * prev[cell];
        }
        for &(face, cell) in &self.flux_targets {
            self.rhs[cell] += self.couplings[face].flux;
        }

        for (cell, stencil) in self.stencil.iter().enumerate() {
            if self.boundary.is_dirichlet(cell) {
                continue;
            }
            let faces = self.grid.neighbor_faces(cell);
            let normals = self.grid.normals_face_at_cell(cell);
            for local in 0..FACES_PER_CELL {
                let coupling = &self.couplings[faces[local]];
                for (slot, idx) in stencil[local].iter().enumerate() {
                    if let Some(idx) = *idx {
                        self.matrix.add_at(idx, normals[local] * coupling.coeffs[slot]);
                    }
                }
            }
        }

        for (cell, value) in self.boundary.dirichlet_cells() {
            let weight = if alphas[cell].abs() > MIN_DIRICHLET_WEIGHT {
                alphas[cell]
            } else {
                1.0
            };
            self.matrix.set_at(self.diag_idx[cell], weight);
            self.rhs[cell] = value * weight;
        }
    }

    // =========================================================================
    // 推进
    // =========================================================================

    /// 推进一个时间步
    ///
    /// 求解未收敛且策略为 `fail` 时返回 [`PhysicsError::NotConverged`]，
    /// 缓冲索引、时间和历史均保持本步之前的状态。
    pub fn step(&mut self) -> PhysicsResult<StepReport> {
        let n_steps = self.local.time_steps().len();
        let step = match self.state {
            EquationState::Constructed => 0,
            EquationState::Stepped { step } => step + 1,
            EquationState::Finished => return Err(PhysicsError::Finished { steps: n_steps }),
        };
        let dt = self
            .local
            .time_steps()
            .get(step)
            .copied()
            .ok_or(PhysicsError::Finished { steps: n_steps })?;

        std::mem::swap(&mut self.i_curr, &mut self.i_prev);
        if let Err(err) = self.rebuild_system(dt) {
            std::mem::swap(&mut self.i_curr, &mut self.i_prev);
            return Err(err);
        }

        let start = Instant::now();
        let result = {
            let (first, second) = self.concs.split_at_mut(1);
            let (curr, prev) = if self.i_curr == 0 {
                (&mut first[0], &second[0])
            } else {
                (&mut second[0], &first[0])
            };
            self.rollback.copy_from_slice(curr);
            curr.copy_from_slice(prev);
            for (cell, value) in self.boundary.dirichlet_cells() {
                curr[cell] = value;
            }

            self.precond.update(&self.matrix);
            let result = self.solver.solve(&self.matrix, &self.rhs, curr, &self.precond);

            for (cell, value) in self.boundary.dirichlet_cells() {
                curr[cell] = value;
            }
            result
        };
        self.report("solve", start);
        self.last_solve = Some(result);

        if !result.is_converged() {
            match self.policy {
                NonConvergencePolicy::Fail => {
                    let best_iterate = self.concs[self.i_curr].clone();
                    // 恢复被覆盖的上一步缓冲
                    self.concs[self.i_curr].copy_from_slice(&self.rollback);
                    std::mem::swap(&mut self.i_curr, &mut self.i_prev);
                    log::warn!(
                        "第 {} 步线性求解未收敛 ({:?}, 残差 {:.3e}), 本步已回滚",
                        step,
                        result.status,
                        result.residual_norm
                    );
                    return Err(PhysicsError::NotConverged {
                        step,
                        status: result.status,
                        iterations: result.iterations,
                        residual: result.residual_norm,
                        best_iterate,
                    });
                }
                NonConvergencePolicy::Warn => {
                    log::warn!(
                        "第 {} 步线性求解未收敛 ({:?}, 残差 {:.3e}), 接受当前迭代结果",
                        step,
                        result.status,
                        result.residual_norm
                    );
                }
            }
        }

        self.time += dt;
        self.concs_time.push(self.concs[self.i_curr].clone());
        self.times.push(self.time);
        self.state = if step + 1 >= n_steps {
            EquationState::Finished
        } else {
            EquationState::Stepped { step }
        };

        log::debug!(
            "第 {} 步完成: dt={:.3e}, t={:.3e}, {} 迭代 {} 次",
            step,
            dt,
            self.time,
            self.solver.name(),
            result.iterations
        );

        Ok(StepReport {
            step,
            dt,
            time: self.time,
            solver: result,
        })
    }

    /// 推进全部剩余时间步
    pub fn run(&mut self) -> PhysicsResult<Vec<StepReport>> {
        let mut reports = Vec::with_capacity(self.steps_remaining());
        while self.state != EquationState::Finished {
            reports.push(self.step()?);
        }
        Ok(reports)
    }

    fn report(&mut self, name: &'static str, start: Instant) {
        if let Some(hook) = self.hook.as_mut() {
            hook.record(name, start.elapsed());
        }
    }

    // =========================================================================
    // 诊断量
    // =========================================================================

    /// 通过一组面的流量
    ///
    /// ```text
    /// Σ_f −D(c̄_prev) · weigh(K(c_prev)) · weigh(φ(c_prev)) · (n0·c0 + n1·c1) · S / h
    /// ```
    ///
    /// 物性按 `concs[i_prev]`（`c̄` 为两侧平均），浓度差按 `concs[i_curr]`。正值表示沿坐标轴
    /// 正向流动。边界面应先用 [`shift_boundary_faces`](crate::boundary::shift_boundary_faces)
    /// 移到内侧。
    pub fn faces_flow_rate(&self, faces: &[usize], component: FlowComponent) -> PhysicsResult<f64> {
        let grid = &self.grid;
        let prev = &self.concs[self.i_prev];
        let curr = &self.concs[self.i_curr];
        let coefficient = |cell: usize| {
            let (c, zone) = (prev[cell], grid.zone(cell));
            match component {
                FlowComponent::Total => self.props.flow_coefficient(c, zone),
                FlowComponent::Free => self.props.free_diffusivity(c, zone),
                FlowComponent::Surface => self.props.surface_diffusivity(c, zone),
            }
        };
        let porosity = |cell: usize| self.props.porosity(prev[cell], grid.zone(cell));

        let mut total = KahanSum::new();
        for &face in faces {
            if face >= grid.faces_n() {
                return Err(DfvmError::index_out_of_bounds("face", face, grid.faces_n()).into());
            }
            let cells = grid.neighbor_cells(face);
            let normals = grid.normals_cell_at_face(face);
            let c0 = cells[0];
            let c1 = cells.get(1).copied().unwrap_or(c0);

            let k = weigh(self.weighing, coefficient(c0), coefficient(c1));
            let phi = weigh(self.weighing, porosity(c0), porosity(c1));
            let jump: f64 = cells.iter().zip(normals).map(|(&c, &n)| n * curr[c]).sum();
            let geometric = self.convective.geometric_factor(grid.face_axis(face));
            let diffusivity = self.props.diffusivity(face_concentration(cells, prev));
            total.add(-diffusivity * k * phi * jump * geometric);
        }
        Ok(total.value())
    }

    /// 当前浓度场的总量 `Σ c·V`
    pub fn total_amount(&self) -> f64 {
        let volume = self.grid.cell_volume();
        KahanSum::sum_iter(self.concentrations().iter().map(|c| c * volume))
    }

    // =========================================================================
    // 访问器
    // =========================================================================

    /// 网格
    #[inline]
    pub fn grid(&self) -> &Arc<StructuredGrid> {
        &self.grid
    }

    /// 当前浓度 `concs[i_curr]`
    #[inline]
    pub fn concentrations(&self) -> &[f64] {
        &self.concs[self.i_curr]
    }

    /// 上一时刻浓度 `concs[i_prev]`
    #[inline]
    pub fn previous_concentrations(&self) -> &[f64] {
        &self.concs[self.i_prev]
    }

    /// 当前缓冲索引
    #[inline]
    pub fn i_curr(&self) -> usize {
        self.i_curr
    }

    /// 上一时刻缓冲索引
    #[inline]
    pub fn i_prev(&self) -> usize {
        self.i_prev
    }

    /// 每步结束时的浓度快照
    #[inline]
    pub fn concs_time(&self) -> &[Vec<f64>] {
        &self.concs_time
    }

    /// 每步结束时的累计时间
    #[inline]
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// 当前累计时间
    #[inline]
    pub fn time(&self) -> f64 {
        self.time
    }

    /// 时间步序列
    #[inline]
    pub fn time_steps(&self) -> &[f64] {
        self.local.time_steps()
    }

    /// 剩余步数
    pub fn steps_remaining(&self) -> usize {
        let n = self.local.time_steps().len();
        match self.state {
            EquationState::Constructed => n,
            EquationState::Stepped { step } => n - step - 1,
            EquationState::Finished => 0,
        }
    }

    /// 引擎状态
    #[inline]
    pub fn state(&self) -> EquationState {
        self.state
    }

    /// 系统矩阵
    #[inline]
    pub fn matrix(&self) -> &CsrMatrix {
        &self.matrix
    }

    /// 右端项
    #[inline]
    pub fn rhs(&self) -> &[f64] {
        &self.rhs
    }

    /// 最近一次的累积系数
    #[inline]
    pub fn alphas(&self) -> &[f64] {
        self.local.alphas()
    }

    /// 最近一次的传导系数
    #[inline]
    pub fn betas(&self) -> &[f64] {
        self.convective.betas()
    }

    /// 边界条件
    #[inline]
    pub fn boundary(&self) -> &BoundaryConditions {
        &self.boundary
    }

    /// 最近一次线性求解结果
    #[inline]
    pub fn last_solve(&self) -> Option<&SolverResult> {
        self.last_solve.as_ref()
    }
}

/// 建立稀疏模式、对角索引与单元模板
fn build_system_pattern(
    grid: &StructuredGrid,
    boundary: &BoundaryConditions,
) -> PhysicsResult<(CsrMatrix, Vec<usize>, Vec<CellStencil>)> {
    let cells_n = grid.cells_n();
    let mut builder = CsrBuilder::new(cells_n);
    for cell in 0..cells_n {
        builder.touch(cell, cell);
        if boundary.is_dirichlet(cell) {
            continue;
        }
        for &face in grid.neighbor_faces(cell) {
            for &nb in grid.neighbor_cells(face) {
                builder.touch(cell, nb);
            }
        }
    }
    let pattern = builder.build_pattern();

    let diag_idx = (0..cells_n)
        .map(|cell| {
            pattern
                .find_index(cell, cell)
                .ok_or_else(|| DfvmError::internal(format!("单元 {cell} 缺少对角元")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut stencil = vec![[[None; 2]; FACES_PER_CELL]; cells_n];
    for (cell, entry) in stencil.iter_mut().enumerate() {
        if boundary.is_dirichlet(cell) {
            continue;
        }
        for (local, &face) in grid.neighbor_faces(cell).iter().enumerate() {
            for (slot, &nb) in grid.neighbor_cells(face).iter().enumerate() {
                let idx = pattern.find_index(cell, nb).ok_or_else(|| {
                    DfvmError::internal(format!("稀疏模式缺少 ({cell}, {nb})"))
                })?;
                entry[local][slot] = Some(idx);
            }
        }
    }

    Ok((CsrMatrix::from(pattern), diag_idx, stencil))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dfvm_config::{BoundaryConfig, MaterialConfig};

    fn row_equation(boundary: BoundaryConfig) -> Equation {
        // 4 个单元沿 x 排列，单元体积 1
        let grid = Arc::new(StructuredGrid::new([5, 2, 2], [0.0; 3], [1.0; 3]).unwrap());
        let config = DfvmConfig::default()
            .with_time(3.0, 1.0)
            .with_material(MaterialConfig::uniform(0.5, 1.0))
            .with_weighing(WeighingMethod::MeanAverage)
            .with_boundary(boundary);
        Equation::from_config(grid, &config).unwrap()
    }

    #[test]
    fn test_pattern_shape() {
        let eq = row_equation(BoundaryConfig::default().with_dirichlet(GroupLabel::Left, 1.0));
        let pattern = eq.matrix().pattern();
        // Dirichlet 行只有对角元
        assert_eq!(pattern.row_indices(0), &[0]);
        assert_eq!(pattern.row_indices(1), &[0, 1, 2]);
        assert_eq!(pattern.row_indices(3), &[2, 3]);
    }

    #[test]
    fn test_assembled_coefficients() {
        let mut eq = row_equation(BoundaryConfig::default());
        eq.set_initial_concentrations(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        eq.rebuild_system(1.0).unwrap();

        // alpha = 1·1/1，beta = 0.5·1/1
        let m = eq.matrix();
        assert!((m.get(0, 0) - 1.5).abs() < 1e-14);
        assert!((m.get(1, 1) - 2.0).abs() < 1e-14);
        assert!((m.get(1, 0) + 0.5).abs() < 1e-14);
        assert!((m.get(1, 2) + 0.5).abs() < 1e-14);
        assert_eq!(eq.rhs(), &[1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_state_machine() {
        let mut eq = row_equation(BoundaryConfig::default());
        assert_eq!(eq.state(), EquationState::Constructed);
        assert_eq!(eq.steps_remaining(), 3);

        let first = eq.step().unwrap();
        assert_eq!(first.step, 0);
        assert_eq!(eq.state(), EquationState::Stepped { step: 0 });
        assert_eq!((eq.i_curr(), eq.i_prev()), (1, 0));

        eq.step().unwrap();
        let last = eq.step().unwrap();
        assert_eq!(last.step, 2);
        assert!((last.time - 3.0).abs() < 1e-14);
        assert_eq!(eq.state(), EquationState::Finished);
        assert!(matches!(eq.step(), Err(PhysicsError::Finished { steps: 3 })));

        assert_eq!(eq.concs_time().len(), 3);
        assert_eq!(eq.times(), &[1.0, 2.0, 3.0]);
        assert!(eq.set_uniform_concentration(1.0).is_err());
    }

    #[test]
    fn test_failed_step_restores_both_buffers() {
        let mut eq = row_equation(BoundaryConfig::default());
        eq.set_initial_concentrations(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        eq.step().unwrap();

        let curr = eq.concentrations().to_vec();
        let prev = eq.previous_concentrations().to_vec();
        assert_ne!(curr, prev);

        eq.solver = BiCgStabSolver::new(dfvm_config::LinearSolverConfig {
            rtol: 1e-30,
            atol: 0.0,
            max_iter: 1,
            verbose: false,
            on_non_convergence: NonConvergencePolicy::Fail,
        });
        assert!(matches!(eq.step(), Err(PhysicsError::NotConverged { step: 1, .. })));

        assert_eq!(eq.concentrations(), curr.as_slice());
        assert_eq!(eq.previous_concentrations(), prev.as_slice());
        assert_eq!(eq.state(), EquationState::Stepped { step: 0 });
        assert_eq!(eq.concs_time().len(), 1);
    }

    #[test]
    fn test_flux_face_injects_into_rhs() {
        let mut eq = row_equation(BoundaryConfig::default().with_flux(GroupLabel::Left, 0.25));
        eq.rebuild_system(1.0).unwrap();
        assert!((eq.rhs()[0] - 0.25).abs() < 1e-14);
        assert_eq!(eq.rhs()[1], 0.0);
    }
}
