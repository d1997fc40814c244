// crates/dfvm_physics/src/numerics/linear_algebra/csr.rs

//! 压缩稀疏行（CSR）矩阵
//!
//! 稀疏模式与数值分离：扩散方程每个时间步只改变数值，模式在引擎构造时
//! 建立一次，之后通过 [`CsrMatrix::clear_values`] 清零再按值索引回填。
//!
//! # 特性开关
//!
//! - `parallel`: 启用基于 `rayon` 的并行矩阵-向量乘法
//!
//! # 使用示例
//!
//! ```
//! use dfvm_physics::numerics::linear_algebra::{CsrBuilder, CsrMatrix};
//!
//! let mut builder = CsrBuilder::new(3);
//! for i in 0..3 {
//!     builder.set(i, i, 2.0);
//! }
//! builder.set(0, 1, -1.0);
//! let matrix = builder.build();
//!
//! let mut y = vec![0.0; 3];
//! matrix.mul_vec(&[1.0, 1.0, 1.0], &mut y);
//! assert_eq!(y, vec![1.0, 2.0, 2.0]);
//! ```

use std::collections::BTreeMap;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

// =============================================================================
// 稀疏模式
// =============================================================================

/// CSR 稀疏模式（方阵）
///
/// 每行列索引升序排列。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrPattern {
    n_rows: usize,
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
}

impl CsrPattern {
    /// 行数
    #[inline]
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// 非零元数量
    #[inline]
    pub fn nnz(&self) -> usize {
        self.col_idx.len()
    }

    /// 行指针
    #[inline]
    pub fn row_ptr(&self) -> &[usize] {
        &self.row_ptr
    }

    /// 列索引
    #[inline]
    pub fn col_idx(&self) -> &[usize] {
        &self.col_idx
    }

    /// 第 `row` 行的列索引
    #[inline]
    pub fn row_indices(&self, row: usize) -> &[usize] {
        &self.col_idx[self.row_ptr[row]..self.row_ptr[row + 1]]
    }

    /// 查找 `(row, col)` 在值数组中的位置
    pub fn find_index(&self, row: usize, col: usize) -> Option<usize> {
        let start = self.row_ptr[row];
        self.row_indices(row)
            .binary_search(&col)
            .ok()
            .map(|local| start + local)
    }

    /// 各行对角元的值索引
    pub fn diagonal_indices(&self) -> Vec<Option<usize>> {
        (0..self.n_rows).map(|row| self.find_index(row, row)).collect()
    }
}

// =============================================================================
// 矩阵
// =============================================================================

/// CSR 方阵（f64）
#[derive(Debug, Clone, PartialEq)]
pub struct CsrMatrix {
    pattern: CsrPattern,
    values: Vec<f64>,
}

impl CsrMatrix {
    /// 行数
    #[inline]
    pub fn n_rows(&self) -> usize {
        self.pattern.n_rows
    }

    /// 非零元数量
    #[inline]
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// 稀疏模式
    #[inline]
    pub fn pattern(&self) -> &CsrPattern {
        &self.pattern
    }

    /// 值数组
    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// 可变值数组
    #[inline]
    pub fn values_mut(&mut self) -> &mut [f64] {
        &mut self.values
    }

    /// 全部值清零，模式不变
    #[inline]
    pub fn clear_values(&mut self) {
        self.values.fill(0.0);
    }

    /// 按值索引累加
    #[inline]
    pub fn add_at(&mut self, idx: usize, value: f64) {
        self.values[idx] += value;
    }

    /// 按值索引赋值
    #[inline]
    pub fn set_at(&mut self, idx: usize, value: f64) {
        self.values[idx] = value;
    }

    /// 读取 `(row, col)`，不在模式中返回 0
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.pattern
            .find_index(row, col)
            .map_or(0.0, |idx| self.values[idx])
    }

    /// 对 `(row, col)` 赋值，位置不在模式中返回 `false`
    pub fn set(&mut self, row: usize, col: usize, value: f64) -> bool {
        match self.pattern.find_index(row, col) {
            Some(idx) => {
                self.values[idx] = value;
                true
            }
            None => false,
        }
    }

    /// 对 `(row, col)` 累加，位置不在模式中返回 `false`
    pub fn add(&mut self, row: usize, col: usize, value: f64) -> bool {
        match self.pattern.find_index(row, col) {
            Some(idx) => {
                self.values[idx] += value;
                true
            }
            None => false,
        }
    }

    /// 第 `row` 行的 `(列, 值)` 迭代器
    pub fn row(&self, row: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let range = self.pattern.row_ptr[row]..self.pattern.row_ptr[row + 1];
        self.pattern.col_idx[range.clone()]
            .iter()
            .copied()
            .zip(self.values[range].iter().copied())
    }

    /// 对角元向量（缺失补 0）
    pub fn extract_diagonal(&self) -> Vec<f64> {
        (0..self.n_rows()).map(|i| self.get(i, i)).collect()
    }

    /// `y = A x`
    ///
    /// # Panics
    ///
    /// 向量长度与矩阵阶数不一致。
    pub fn mul_vec(&self, x: &[f64], y: &mut [f64]) {
        assert_eq!(x.len(), self.n_rows(), "x 长度必须等于矩阵阶数");
        assert_eq!(y.len(), self.n_rows(), "y 长度必须等于矩阵阶数");
        for (row, out) in y.iter_mut().enumerate() {
            *out = self.row_dot(row, x);
        }
    }

    /// 并行 `y = A x`
    #[cfg(feature = "parallel")]
    pub fn mul_vec_parallel(&self, x: &[f64], y: &mut [f64]) {
        assert_eq!(x.len(), self.n_rows(), "x 长度必须等于矩阵阶数");
        assert_eq!(y.len(), self.n_rows(), "y 长度必须等于矩阵阶数");
        y.par_iter_mut()
            .enumerate()
            .for_each(|(row, out)| *out = self.row_dot(row, x));
    }

    #[inline]
    fn row_dot(&self, row: usize, x: &[f64]) -> f64 {
        let start = self.pattern.row_ptr[row];
        let end = self.pattern.row_ptr[row + 1];
        self.pattern.col_idx[start..end]
            .iter()
            .zip(&self.values[start..end])
            .map(|(&col, &v)| v * x[col])
            .sum()
    }

    /// 每行绝对值和的最大值
    pub fn infinity_norm(&self) -> f64 {
        (0..self.n_rows())
            .map(|row| self.row(row).map(|(_, v)| v.abs()).sum::<f64>())
            .fold(0.0, f64::max)
    }
}

impl From<CsrPattern> for CsrMatrix {
    fn from(pattern: CsrPattern) -> Self {
        let values = vec![0.0; pattern.nnz()];
        Self { pattern, values }
    }
}

// =============================================================================
// 构建器
// =============================================================================

/// CSR 构建器
///
/// 逐项写入，`build` 时按行列排序压缩。
#[derive(Debug, Clone)]
pub struct CsrBuilder {
    n: usize,
    rows: Vec<BTreeMap<usize, f64>>,
}

impl CsrBuilder {
    /// 创建 `n` 阶构建器
    pub fn new(n: usize) -> Self {
        Self {
            n,
            rows: vec![BTreeMap::new(); n],
        }
    }

    /// 赋值（覆盖）
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        debug_assert!(col < self.n);
        self.rows[row].insert(col, value);
    }

    /// 累加
    pub fn add(&mut self, row: usize, col: usize, value: f64) {
        debug_assert!(col < self.n);
        *self.rows[row].entry(col).or_insert(0.0) += value;
    }

    /// 只声明位置（值为 0）
    pub fn touch(&mut self, row: usize, col: usize) {
        debug_assert!(col < self.n);
        self.rows[row].entry(col).or_insert(0.0);
    }

    /// 当前非零元数量
    pub fn nnz(&self) -> usize {
        self.rows.iter().map(BTreeMap::len).sum()
    }

    /// 只生成稀疏模式
    pub fn build_pattern(&self) -> CsrPattern {
        let mut row_ptr = Vec::with_capacity(self.n + 1);
        let mut col_idx = Vec::with_capacity(self.nnz());
        row_ptr.push(0);
        for row in &self.rows {
            col_idx.extend(row.keys().copied());
            row_ptr.push(col_idx.len());
        }
        CsrPattern {
            n_rows: self.n,
            row_ptr,
            col_idx,
        }
    }

    /// 生成矩阵
    pub fn build(self) -> CsrMatrix {
        let pattern = self.build_pattern();
        let values = self
            .rows
            .into_iter()
            .flat_map(|row| row.into_values())
            .collect();
        CsrMatrix { pattern, values }
    }
}
