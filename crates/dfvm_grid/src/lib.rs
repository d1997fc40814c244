// crates/dfvm_grid/src/lib.rs

//! DFVM 结构化网格层
//!
//! 提供三维规则六面体网格的几何量、单元/面邻接关系、法向符号表、
//! 命名分组以及按节点/单元/面挂载的命名数组。
//!
//! # 模块概览
//!
//! - [`grid`]: [`StructuredGrid`] 本体
//! - [`groups`]: 命名分组注册表
//! - [`arrays`]: 定长命名数组表
//!
//! 网格构造后拓扑不再改变，物理层通过 `Arc<StructuredGrid>` 只读共享。

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod arrays;
pub mod grid;
pub mod groups;

pub use arrays::ArrayTable;
pub use grid::{FaceCells, FaceNormals, StructuredGrid, FACES_PER_CELL};
pub use groups::GroupRegistry;
