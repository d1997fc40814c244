// crates/dfvm_grid/src/groups.rs

//! 命名分组注册表
//!
//! 单元分组与面分组分开存放，索引列表均保持升序。查询未注册的标签返回
//! [`DfvmError::UnknownGroup`]。

use std::collections::BTreeMap;

use dfvm_foundation::{DfvmError, DfvmResult, GroupLabel};

/// 分组注册表
#[derive(Debug, Clone, Default)]
pub struct GroupRegistry {
    cells: BTreeMap<GroupLabel, Vec<usize>>,
    faces: BTreeMap<GroupLabel, Vec<usize>>,
}

impl GroupRegistry {
    /// 创建空注册表
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册（或替换）单元分组
    pub fn set_cells(&mut self, label: GroupLabel, mut cells: Vec<usize>) {
        cells.sort_unstable();
        cells.dedup();
        self.cells.insert(label, cells);
    }

    /// 注册（或替换）面分组
    pub fn set_faces(&mut self, label: GroupLabel, mut faces: Vec<usize>) {
        faces.sort_unstable();
        faces.dedup();
        self.faces.insert(label, faces);
    }

    /// 查询单元分组
    pub fn cells(&self, label: GroupLabel) -> DfvmResult<&[usize]> {
        self.cells
            .get(&label)
            .map(Vec::as_slice)
            .ok_or_else(|| DfvmError::unknown_group(label))
    }

    /// 查询面分组
    pub fn faces(&self, label: GroupLabel) -> DfvmResult<&[usize]> {
        self.faces
            .get(&label)
            .map(Vec::as_slice)
            .ok_or_else(|| DfvmError::unknown_group(label))
    }

    /// 单元分组是否已注册
    #[inline]
    pub fn has_cells(&self, label: GroupLabel) -> bool {
        self.cells.contains_key(&label)
    }

    /// 面分组是否已注册
    #[inline]
    pub fn has_faces(&self, label: GroupLabel) -> bool {
        self.faces.contains_key(&label)
    }

    /// 已注册的单元分组标签
    pub fn cell_labels(&self) -> impl Iterator<Item = GroupLabel> + '_ {
        self.cells.keys().copied()
    }

    /// 已注册的面分组标签
    pub fn face_labels(&self) -> impl Iterator<Item = GroupLabel> + '_ {
        self.faces.keys().copied()
    }
}
