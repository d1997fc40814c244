// crates/dfvm_physics/src/boundary.rs

//! 边界条件
//!
//! 把配置中的分组标签解析为单元 / 面集合：
//!
//! - Dirichlet：单元分组，方程行被替换为 `alpha·c = alpha·c_fixed`
//! - 通量面：面分组，固定通量直接加到唯一活动邻居的右端项
//! - 其余非内部面均为无通量
//!
//! 标签未注册、通量面没有活动邻居、分组之间的固定浓度冲突，都在解析时报错。

use std::collections::BTreeMap;

use dfvm_config::BoundaryConfig;
use dfvm_foundation::{DfvmError, DfvmResult, GroupLabel};
use dfvm_grid::StructuredGrid;

/// 面的边界类型
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FaceKind {
    /// 两侧均为活动单元
    Interior,
    /// 固定通量（流入为正）
    Flux(f64),
    /// 无通量
    NoFlow,
}

/// 解析后的边界条件
#[derive(Debug, Clone)]
pub struct BoundaryConditions {
    dirichlet_groups: BTreeMap<GroupLabel, (f64, Vec<usize>)>,
    dirichlet_values: Vec<Option<f64>>,
    face_kinds: Vec<FaceKind>,
}

impl BoundaryConditions {
    /// 解析边界配置
    pub fn resolve(config: &BoundaryConfig, grid: &StructuredGrid) -> DfvmResult<Self> {
        let mut dirichlet_groups = BTreeMap::new();
        for (&label, &value) in &config.dirichlet {
            let cells = grid.cells_group(label)?.to_vec();
            dirichlet_groups.insert(label, (value, cells));
        }
        let dirichlet_values = collect_dirichlet_values(&dirichlet_groups, grid.cells_n())?;

        let mut face_kinds: Vec<FaceKind> = (0..grid.faces_n())
            .map(|face| {
                let cells = grid.neighbor_cells(face);
                if cells.len() == 2 && cells.iter().all(|&c| grid.is_active(c)) {
                    FaceKind::Interior
                } else {
                    FaceKind::NoFlow
                }
            })
            .collect();

        for (&label, &value) in &config.flux {
            for &face in grid.faces_group(label)? {
                if active_neighbor(grid, face).is_none() {
                    return Err(DfvmError::invalid_config(
                        format!("boundary.flux.{label}"),
                        face,
                        "通量面必须恰有一个活动邻居",
                    ));
                }
                face_kinds[face] = FaceKind::Flux(value);
            }
        }

        let n_dirichlet = dirichlet_values.iter().filter(|v| v.is_some()).count();
        let n_flux = face_kinds
            .iter()
            .filter(|k| matches!(k, FaceKind::Flux(_)))
            .count();
        log::debug!("边界条件解析完成: dirichlet 单元 {n_dirichlet}, 通量面 {n_flux}");

        Ok(Self {
            dirichlet_groups,
            dirichlet_values,
            face_kinds,
        })
    }

    /// 面类型
    #[inline]
    pub fn face_kind(&self, face: usize) -> FaceKind {
        self.face_kinds[face]
    }

    /// 全部面类型
    #[inline]
    pub fn face_kinds(&self) -> &[FaceKind] {
        &self.face_kinds
    }

    /// 单元的固定浓度
    #[inline]
    pub fn dirichlet_value(&self, cell: usize) -> Option<f64> {
        self.dirichlet_values[cell]
    }

    /// 是否为 Dirichlet 单元
    #[inline]
    pub fn is_dirichlet(&self, cell: usize) -> bool {
        self.dirichlet_values[cell].is_some()
    }

    /// 全部 Dirichlet 单元及其固定浓度
    pub fn dirichlet_cells(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.dirichlet_values
            .iter()
            .enumerate()
            .filter_map(|(cell, v)| v.map(|v| (cell, v)))
    }

    /// Dirichlet 分组的当前取值
    pub fn dirichlet_groups(&self) -> impl Iterator<Item = (GroupLabel, f64)> + '_ {
        self.dirichlet_groups.iter().map(|(&l, &(v, _))| (l, v))
    }

    /// 修改已有 Dirichlet 分组的固定浓度
    ///
    /// 稀疏模式按构造时的 Dirichlet 单元建立，不能新增分组。
    pub fn set_dirichlet_value(&mut self, label: GroupLabel, value: f64) -> DfvmResult<()> {
        if !value.is_finite() {
            return Err(DfvmError::invalid_config(
                format!("boundary.dirichlet.{label}"),
                value,
                "浓度必须为有限数",
            ));
        }
        let n = self.dirichlet_values.len();
        match self.dirichlet_groups.get_mut(&label) {
            Some(entry) => entry.0 = value,
            None => return Err(DfvmError::unknown_group(label)),
        }
        self.dirichlet_values = collect_dirichlet_values(&self.dirichlet_groups, n)?;
        Ok(())
    }
}

fn collect_dirichlet_values(
    groups: &BTreeMap<GroupLabel, (f64, Vec<usize>)>,
    cells_n: usize,
) -> DfvmResult<Vec<Option<f64>>> {
    let mut values: Vec<Option<f64>> = vec![None; cells_n];
    for (label, (value, cells)) in groups {
        for &cell in cells {
            match values[cell] {
                Some(existing) if existing != *value => {
                    return Err(DfvmError::invalid_config(
                        format!("boundary.dirichlet.{label}"),
                        value,
                        format!("单元 {cell} 已被其他分组固定为 {existing}"),
                    ));
                }
                _ => values[cell] = Some(*value),
            }
        }
    }
    Ok(values)
}

/// 面唯一的活动邻居
pub fn active_neighbor(grid: &StructuredGrid, face: usize) -> Option<usize> {
    let mut active = grid
        .neighbor_cells(face)
        .iter()
        .copied()
        .filter(|&c| grid.is_active(c));
    match (active.next(), active.next()) {
        (Some(cell), None) => Some(cell),
        _ => None,
    }
}

/// 把边界面向内平移一层
///
/// 每个面替换为其相邻单元在同一轴上的另一个面，用于在 Dirichlet 层内侧
/// 统计通量。
///
/// ```
/// use dfvm_foundation::GroupLabel;
/// use dfvm_grid::StructuredGrid;
/// use dfvm_physics::boundary::shift_boundary_faces;
///
/// let grid = StructuredGrid::new([4, 2, 2], [0.0; 3], [1.0; 3]).unwrap();
/// let left = grid.faces_group(GroupLabel::Left).unwrap();
/// assert_eq!(shift_boundary_faces(&grid, left, 0).unwrap(), vec![1]);
/// ```
pub fn shift_boundary_faces(
    grid: &StructuredGrid,
    faces: &[usize],
    axis: usize,
) -> DfvmResult<Vec<usize>> {
    faces
        .iter()
        .map(|&face| {
            if face >= grid.faces_n() {
                return Err(DfvmError::index_out_of_bounds("face", face, grid.faces_n()));
            }
            if grid.face_axis(face) != axis {
                return Err(DfvmError::invalid_input(format!(
                    "面 {face} 的法向轴为 {}, 不是 {axis}",
                    grid.face_axis(face)
                )));
            }
            let cells = grid.neighbor_cells(face);
            if cells.len() != 1 {
                return Err(DfvmError::invalid_input(format!("面 {face} 不是边界面")));
            }
            grid.opposite_face(cells[0], face)
                .ok_or_else(|| DfvmError::topology(format!("单元 {} 不含面 {face}", cells[0])))
        })
        .collect()
}
