// crates/dfvm_grid/src/grid.rs

//! 三维结构化网格
//!
//! 由节点维数、原点和各向步长定义的规则六面体网格。构造时按固定顺序
//! 计算全部派生量与邻接关系，之后拓扑只读，只允许显式注册分组与命名数组。
//!
//! # 编号规则
//!
//! - 单元 `(i, j, k)` 的编号为 `i + cx·(j + cy·k)`
//! - 面按轴分块编号：先全部 x 向面，再 y 向面，最后 z 向面；
//!   每块内部同样按 x 最快的顺序遍历该轴的面维数
//! - 单元的 6 个局部面顺序为 -x, +x, -y, +y, -z, +z
//! - 面的相邻单元按单元编号升序排列，第 `s` 个邻居的法向符号为 `2s - 1`，
//!   因此共享一个面的两个单元总是看到相反的符号
//!
//! # 使用示例
//!
//! ```
//! use dfvm_grid::StructuredGrid;
//!
//! let grid = StructuredGrid::new([3, 2, 2], [0.0; 3], [1.0, 2.0, 0.5]).unwrap();
//! assert_eq!(grid.cells_n(), 2);
//! assert_eq!(grid.faces_n(), 3 + 4 + 4);
//! assert_eq!(grid.cell_volume(), 1.0);
//!
//! // 两个单元共享的 x 向面
//! let shared = grid.neighbor_faces(0)[1];
//! assert_eq!(grid.neighbor_cells(shared), &[0, 1]);
//! ```

use smallvec::SmallVec;

use dfvm_foundation::error::check_len;
use dfvm_foundation::{DfvmError, DfvmResult, GroupLabel, Zone};

use crate::arrays::ArrayTable;
use crate::groups::GroupRegistry;

/// 每个单元的面数
pub const FACES_PER_CELL: usize = 6;

/// 面的相邻单元（1 或 2 个）
pub type FaceCells = SmallVec<[usize; 2]>;

/// 面上各相邻单元的法向符号
pub type FaceNormals = SmallVec<[f64; 2]>;

/// 三维结构化网格
#[derive(Debug, Clone)]
pub struct StructuredGrid {
    points_dims: [usize; 3],
    points_origin: [f64; 3],
    spacing: [f64; 3],

    points_n: usize,
    cells_dims: [usize; 3],
    cells_n: usize,
    faces_dims: [[usize; 3]; 3],
    /// 各轴面块的起始编号，最后一项为面总数
    faces_offsets: [usize; 4],
    cell_volume: f64,
    face_areas: [f64; 3],

    neighbor_faces: Vec<[usize; FACES_PER_CELL]>,
    neighbor_cells: Vec<FaceCells>,
    normals_cell_at_face: Vec<FaceNormals>,
    normals_face_at_cell: Vec<[f64; FACES_PER_CELL]>,

    groups: GroupRegistry,
    active: Vec<bool>,
    zones: Vec<Zone>,

    points_arrays: ArrayTable,
    cells_arrays: ArrayTable,
    faces_arrays: ArrayTable,
}

impl StructuredGrid {
    // =========================================================================
    // 构造
    // =========================================================================

    /// 构建网格
    ///
    /// # 参数
    ///
    /// - `points_dims`: 各方向节点数，均不小于 2
    /// - `points_origin`: 原点坐标
    /// - `spacing`: 各方向步长，有限且为正
    ///
    /// # 错误
    ///
    /// 参数非法返回 `InvalidInput`；邻接关系自检失败返回 `InvalidTopology`。
    pub fn new(
        points_dims: [usize; 3],
        points_origin: [f64; 3],
        spacing: [f64; 3],
    ) -> DfvmResult<Self> {
        validate_geometry(points_dims, points_origin, spacing)?;

        let points_n = points_dims.iter().product();
        let cells_dims = [points_dims[0] - 1, points_dims[1] - 1, points_dims[2] - 1];
        let cells_n = cells_dims.iter().product();

        let mut faces_dims = [points_dims; 3];
        for (axis, dims) in faces_dims.iter_mut().enumerate() {
            dims[(axis + 1) % 3] -= 1;
            dims[(axis + 2) % 3] -= 1;
        }
        let mut faces_offsets = [0usize; 4];
        for axis in 0..3 {
            faces_offsets[axis + 1] = faces_offsets[axis] + faces_dims[axis].iter().product::<usize>();
        }
        let faces_n = faces_offsets[3];

        let cell_volume = spacing.iter().product();
        let face_areas = [
            spacing[1] * spacing[2],
            spacing[0] * spacing[2],
            spacing[0] * spacing[1],
        ];

        let mut grid = Self {
            points_dims,
            points_origin,
            spacing,
            points_n,
            cells_dims,
            cells_n,
            faces_dims,
            faces_offsets,
            cell_volume,
            face_areas,
            neighbor_faces: Vec::new(),
            neighbor_cells: Vec::new(),
            normals_cell_at_face: Vec::new(),
            normals_face_at_cell: Vec::new(),
            groups: GroupRegistry::new(),
            active: vec![true; cells_n],
            zones: vec![Zone::default(); cells_n],
            points_arrays: ArrayTable::new("points", points_n),
            cells_arrays: ArrayTable::new("cells", cells_n),
            faces_arrays: ArrayTable::new("faces", faces_n),
        };

        grid.neighbor_faces = grid.compute_neighbor_faces();
        grid.neighbor_cells = grid.compute_neighbor_cells();
        grid.normals_cell_at_face = grid
            .neighbor_cells
            .iter()
            .map(|cells| (0..cells.len()).map(|s| 2.0 * s as f64 - 1.0).collect())
            .collect();
        grid.normals_face_at_cell = grid.compute_normals_face_at_cell()?;
        grid.register_side_groups();
        grid.classify_active_faces();

        log::debug!(
            "结构化网格构建完成: points={:?}, cells={}, faces={}",
            points_dims,
            cells_n,
            faces_n
        );
        Ok(grid)
    }

    fn compute_neighbor_faces(&self) -> Vec<[usize; FACES_PER_CELL]> {
        let [cx, cy, cz] = self.cells_dims;
        let px = self.points_dims[0];
        let py = self.points_dims[1];
        let [o0, o1, o2, _] = self.faces_offsets;

        let mut faces = Vec::with_capacity(self.cells_n);
        for k in 0..cz {
            for j in 0..cy {
                for i in 0..cx {
                    let fx = o0 + i + px * (j + cy * k);
                    let fy = o1 + i + cx * (j + py * k);
                    let fz = o2 + i + cx * (j + cy * k);
                    faces.push([fx, fx + 1, fy, fy + cx, fz, fz + cx * cy]);
                }
            }
        }
        faces
    }

    fn compute_neighbor_cells(&self) -> Vec<FaceCells> {
        let mut cells = vec![FaceCells::new(); self.faces_n()];
        // 按单元升序追加，邻居列表自然有序
        for (cell, faces) in self.neighbor_faces.iter().enumerate() {
            for &face in faces {
                cells[face].push(cell);
            }
        }
        cells
    }

    fn compute_normals_face_at_cell(&self) -> DfvmResult<Vec<[f64; FACES_PER_CELL]>> {
        let mut normals = Vec::with_capacity(self.cells_n);
        for (cell, faces) in self.neighbor_faces.iter().enumerate() {
            let mut row = [0.0; FACES_PER_CELL];
            for (local, &face) in faces.iter().enumerate() {
                let slot = self.slot_of(face, cell).ok_or_else(|| {
                    DfvmError::topology(format!("面 {face} 的邻居列表中没有单元 {cell}"))
                })?;
                row[local] = self.normals_cell_at_face[face][slot];
            }
            normals.push(row);
        }
        Ok(normals)
    }

    // =========================================================================
    // 分组
    // =========================================================================

    fn register_side_groups(&mut self) {
        for label in GroupLabel::SIDES {
            let Some((axis, at_max)) = label.side() else {
                continue;
            };
            let target = if at_max { self.points_dims[axis] - 1 } else { 0 };
            let faces: Vec<usize> = (self.faces_offsets[axis]..self.faces_offsets[axis + 1])
                .filter(|&face| self.face_coords(face)[axis] == target)
                .collect();
            let cells = faces.iter().map(|&face| self.neighbor_cells[face][0]).collect();
            self.groups.set_faces(label, faces);
            self.groups.set_cells(label, cells);
        }
        self.groups
            .set_cells(GroupLabel::Active, (0..self.cells_n).collect());
    }

    fn classify_active_faces(&mut self) {
        let mut bound = Vec::new();
        let mut nonbound = Vec::new();
        for (face, cells) in self.neighbor_cells.iter().enumerate() {
            let n_active = cells.iter().filter(|&&c| self.active[c]).count();
            if n_active == 2 {
                nonbound.push(face);
            } else if n_active == 1 {
                bound.push(face);
            }
        }
        self.groups.set_faces(GroupLabel::ActiveBound, bound);
        self.groups.set_faces(GroupLabel::ActiveNonbound, nonbound);
    }

    /// 按单元列表设置活动区，其余单元注册为 `inactive`
    pub fn set_active_cells(&mut self, cells: &[usize]) -> DfvmResult<()> {
        let mut mask = vec![false; self.cells_n];
        for &cell in cells {
            if cell >= self.cells_n {
                return Err(DfvmError::index_out_of_bounds("cell", cell, self.cells_n));
            }
            mask[cell] = true;
        }
        self.set_active_mask(&mask)
    }

    /// 按掩码设置活动区，并重新划分 `active_bound` / `active_nonbound` 面
    pub fn set_active_mask(&mut self, mask: &[bool]) -> DfvmResult<()> {
        check_len("active_mask", self.cells_n, mask.len())?;
        self.active = mask.to_vec();
        let (active, inactive): (Vec<usize>, Vec<usize>) =
            (0..self.cells_n).partition(|&c| self.active[c]);
        log::debug!("活动区更新: active={}, inactive={}", active.len(), inactive.len());
        self.groups.set_cells(GroupLabel::Active, active);
        self.groups.set_cells(GroupLabel::Inactive, inactive);
        self.classify_active_faces();
        Ok(())
    }

    /// 设置每个单元的材料分区，并注册 `matrix` / `fracture` 分组
    pub fn set_zones(&mut self, zones: &[Zone]) -> DfvmResult<()> {
        check_len("zones", self.cells_n, zones.len())?;
        self.zones = zones.to_vec();
        let (matrix, fracture): (Vec<usize>, Vec<usize>) =
            (0..self.cells_n).partition(|&c| self.zones[c] == Zone::Matrix);
        self.groups.set_cells(GroupLabel::Matrix, matrix);
        self.groups.set_cells(GroupLabel::Fracture, fracture);
        Ok(())
    }

    /// 以布尔掩码设置材料分区（`true` 为基质）
    pub fn set_matrix_mask(&mut self, is_matrix: &[bool]) -> DfvmResult<()> {
        let zones: Vec<Zone> = is_matrix.iter().map(|&m| Zone::from_is_matrix(m)).collect();
        self.set_zones(&zones)
    }

    /// 单元分组
    #[inline]
    pub fn cells_group(&self, label: GroupLabel) -> DfvmResult<&[usize]> {
        self.groups.cells(label)
    }

    /// 面分组
    #[inline]
    pub fn faces_group(&self, label: GroupLabel) -> DfvmResult<&[usize]> {
        self.groups.faces(label)
    }

    /// 分组注册表
    #[inline]
    pub fn groups(&self) -> &GroupRegistry {
        &self.groups
    }

    /// 单元是否活动
    #[inline]
    pub fn is_active(&self, cell: usize) -> bool {
        self.active[cell]
    }

    /// 活动掩码
    #[inline]
    pub fn active_mask(&self) -> &[bool] {
        &self.active
    }

    /// 单元所在材料分区
    #[inline]
    pub fn zone(&self, cell: usize) -> Zone {
        self.zones[cell]
    }

    /// 全部单元的材料分区
    #[inline]
    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    // =========================================================================
    // 命名数组
    // =========================================================================

    /// 节点数组表
    #[inline]
    pub fn points_arrays(&self) -> &ArrayTable {
        &self.points_arrays
    }

    /// 节点数组表（可变）
    #[inline]
    pub fn points_arrays_mut(&mut self) -> &mut ArrayTable {
        &mut self.points_arrays
    }

    /// 单元数组表
    #[inline]
    pub fn cells_arrays(&self) -> &ArrayTable {
        &self.cells_arrays
    }

    /// 单元数组表（可变）
    #[inline]
    pub fn cells_arrays_mut(&mut self) -> &mut ArrayTable {
        &mut self.cells_arrays
    }

    /// 面数组表
    #[inline]
    pub fn faces_arrays(&self) -> &ArrayTable {
        &self.faces_arrays
    }

    /// 面数组表（可变）
    #[inline]
    pub fn faces_arrays_mut(&mut self) -> &mut ArrayTable {
        &mut self.faces_arrays
    }

    // =========================================================================
    // 几何量
    // =========================================================================

    /// 各方向节点数
    #[inline]
    pub fn points_dims(&self) -> [usize; 3] {
        self.points_dims
    }

    /// 原点
    #[inline]
    pub fn points_origin(&self) -> [f64; 3] {
        self.points_origin
    }

    /// 各方向步长
    #[inline]
    pub fn spacing(&self) -> [f64; 3] {
        self.spacing
    }

    /// 节点总数
    #[inline]
    pub fn points_n(&self) -> usize {
        self.points_n
    }

    /// 各方向单元数
    #[inline]
    pub fn cells_dims(&self) -> [usize; 3] {
        self.cells_dims
    }

    /// 单元总数
    #[inline]
    pub fn cells_n(&self) -> usize {
        self.cells_n
    }

    /// 某轴的面维数
    #[inline]
    pub fn faces_dims(&self, axis: usize) -> [usize; 3] {
        self.faces_dims[axis]
    }

    /// 面总数
    #[inline]
    pub fn faces_n(&self) -> usize {
        self.faces_offsets[3]
    }

    /// 单元体积
    #[inline]
    pub fn cell_volume(&self) -> f64 {
        self.cell_volume
    }

    /// 某轴法向面的面积
    #[inline]
    pub fn face_area(&self, axis: usize) -> f64 {
        self.face_areas[axis]
    }

    /// 三个轴的面面积
    #[inline]
    pub fn face_areas(&self) -> [f64; 3] {
        self.face_areas
    }

    /// 单元编号
    #[inline]
    pub fn cell_index(&self, i: usize, j: usize, k: usize) -> usize {
        debug_assert!(i < self.cells_dims[0] && j < self.cells_dims[1] && k < self.cells_dims[2]);
        i + self.cells_dims[0] * (j + self.cells_dims[1] * k)
    }

    /// 单元的 `(i, j, k)`
    #[inline]
    pub fn cell_coords(&self, cell: usize) -> [usize; 3] {
        let [cx, cy, _] = self.cells_dims;
        [cell % cx, (cell / cx) % cy, cell / (cx * cy)]
    }

    /// 单元中心坐标
    pub fn cell_center(&self, cell: usize) -> [f64; 3] {
        let ijk = self.cell_coords(cell);
        std::array::from_fn(|a| self.points_origin[a] + (ijk[a] as f64 + 0.5) * self.spacing[a])
    }

    /// 面的法向轴
    #[inline]
    pub fn face_axis(&self, face: usize) -> usize {
        debug_assert!(face < self.faces_n());
        if face < self.faces_offsets[1] {
            0
        } else if face < self.faces_offsets[2] {
            1
        } else {
            2
        }
    }

    /// 面在其轴向面维数内的坐标
    pub fn face_coords(&self, face: usize) -> [usize; 3] {
        let axis = self.face_axis(face);
        let local = face - self.faces_offsets[axis];
        let [d0, d1, _] = self.faces_dims[axis];
        [local % d0, (local / d0) % d1, local / (d0 * d1)]
    }

    /// 面中心坐标
    pub fn face_center(&self, face: usize) -> [f64; 3] {
        let axis = self.face_axis(face);
        let ijk = self.face_coords(face);
        std::array::from_fn(|a| {
            let shift = if a == axis { 0.0 } else { 0.5 };
            self.points_origin[a] + (ijk[a] as f64 + shift) * self.spacing[a]
        })
    }

    // =========================================================================
    // 邻接关系
    // =========================================================================

    /// 单元的 6 个面（-x, +x, -y, +y, -z, +z）
    #[inline]
    pub fn neighbor_faces(&self, cell: usize) -> &[usize; FACES_PER_CELL] {
        &self.neighbor_faces[cell]
    }

    /// 面的相邻单元（升序）
    #[inline]
    pub fn neighbor_cells(&self, face: usize) -> &[usize] {
        &self.neighbor_cells[face]
    }

    /// 面上各相邻单元的法向符号，与 [`neighbor_cells`](Self::neighbor_cells) 对齐
    #[inline]
    pub fn normals_cell_at_face(&self, face: usize) -> &[f64] {
        &self.normals_cell_at_face[face]
    }

    /// 单元在其 6 个面上的法向符号，与 [`neighbor_faces`](Self::neighbor_faces) 对齐
    #[inline]
    pub fn normals_face_at_cell(&self, cell: usize) -> &[f64; FACES_PER_CELL] {
        &self.normals_face_at_cell[cell]
    }

    /// 是否为区域边界面
    #[inline]
    pub fn is_boundary_face(&self, face: usize) -> bool {
        self.neighbor_cells[face].len() == 1
    }

    /// 单元在面邻居列表中的位置
    #[inline]
    pub fn slot_of(&self, face: usize, cell: usize) -> Option<usize> {
        self.neighbor_cells[face].iter().position(|&c| c == cell)
    }

    /// 面在单元局部面中的位置
    #[inline]
    pub fn local_face_of(&self, cell: usize, face: usize) -> Option<usize> {
        self.neighbor_faces[cell].iter().position(|&f| f == face)
    }

    /// 单元在同一轴上与 `face` 相对的面
    pub fn opposite_face(&self, cell: usize, face: usize) -> Option<usize> {
        self.local_face_of(cell, face)
            .map(|local| self.neighbor_faces[cell][local ^ 1])
    }

    /// 拓扑自检
    ///
    /// 检查内容：
    /// - 每个面有 1 或 2 个升序排列的邻居
    /// - 每个单元的面都反向列出该单元，且两张法向表一致
    /// - 内部面两侧法向相反
    /// - 边界面数目与网格维数相符
    pub fn validate_topology(&self) -> DfvmResult<()> {
        for (face, cells) in self.neighbor_cells.iter().enumerate() {
            let normals = &self.normals_cell_at_face[face];
            match cells.as_slice() {
                [_] => {}
                [a, b] => {
                    if a >= b {
                        return Err(DfvmError::topology(format!("面 {face} 的邻居未按升序排列")));
                    }
                    if normals[0] + normals[1] != 0.0 || normals[0].abs() != 1.0 {
                        return Err(DfvmError::topology(format!("面 {face} 两侧法向不相反")));
                    }
                }
                other => {
                    return Err(DfvmError::topology(format!(
                        "面 {face} 的相邻单元数为 {}",
                        other.len()
                    )))
                }
            }
        }

        for (cell, faces) in self.neighbor_faces.iter().enumerate() {
            for (local, &face) in faces.iter().enumerate() {
                let slot = self.slot_of(face, cell).ok_or_else(|| {
                    DfvmError::topology(format!("面 {face} 的邻居列表中没有单元 {cell}"))
                })?;
                if self.normals_cell_at_face[face][slot] != self.normals_face_at_cell[cell][local] {
                    return Err(DfvmError::topology(format!(
                        "单元 {cell} 在面 {face} 上的法向不一致"
                    )));
                }
            }
        }

        let [cx, cy, cz] = self.cells_dims;
        let expected = 2 * (cy * cz + cx * cz + cx * cy);
        let boundary = self.neighbor_cells.iter().filter(|c| c.len() == 1).count();
        if boundary != expected {
            return Err(DfvmError::topology(format!(
                "边界面数目 {boundary} 与期望 {expected} 不符"
            )));
        }
        Ok(())
    }
}

fn validate_geometry(
    points_dims: [usize; 3],
    points_origin: [f64; 3],
    spacing: [f64; 3],
) -> DfvmResult<()> {
    for axis in 0..3 {
        if points_dims[axis] < 2 {
            return Err(DfvmError::invalid_input(format!(
                "第 {axis} 轴节点数为 {}, 至少需要 2",
                points_dims[axis]
            )));
        }
        if !(spacing[axis].is_finite() && spacing[axis] > 0.0) {
            return Err(DfvmError::invalid_input(format!(
                "第 {axis} 轴步长 {} 必须为有限正数",
                spacing[axis]
            )));
        }
        if !points_origin[axis].is_finite() {
            return Err(DfvmError::invalid_input(format!(
                "第 {axis} 轴原点 {} 不是有限数",
                points_origin[axis]
            )));
        }
    }
    Ok(())
}
