// crates/dfvm_grid/src/arrays.rs

//! 命名数组表
//!
//! 每张表绑定一个实体数目（节点、单元或面），写入时检查长度。

use std::collections::BTreeMap;

use dfvm_foundation::{DfvmError, DfvmResult};

/// 定长命名数组表
#[derive(Debug, Clone)]
pub struct ArrayTable {
    kind: &'static str,
    len: usize,
    data: BTreeMap<String, Vec<f64>>,
}

impl ArrayTable {
    /// 创建表，`kind` 用于错误信息（如 `"cells"`）
    pub fn new(kind: &'static str, len: usize) -> Self {
        Self {
            kind,
            len,
            data: BTreeMap::new(),
        }
    }

    /// 每个数组的长度
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// 表中是否没有数组
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// 写入数组，长度必须等于实体数目
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>) -> DfvmResult<()> {
        let name = name.into();
        if values.len() != self.len {
            return Err(DfvmError::size_mismatch(
                format!("{}_arrays[{name}]", self.kind),
                self.len,
                values.len(),
            ));
        }
        self.data.insert(name, values);
        Ok(())
    }

    /// 读取数组
    pub fn get(&self, name: &str) -> DfvmResult<&[f64]> {
        self.data
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| DfvmError::not_found(format!("{}_arrays[{name}]", self.kind)))
    }

    /// 可变读取
    pub fn get_mut(&mut self, name: &str) -> DfvmResult<&mut [f64]> {
        let kind = self.kind;
        self.data
            .get_mut(name)
            .map(Vec::as_mut_slice)
            .ok_or_else(|| DfvmError::not_found(format!("{kind}_arrays[{name}]")))
    }

    /// 移除数组
    pub fn remove(&mut self, name: &str) -> Option<Vec<f64>> {
        self.data.remove(name)
    }

    /// 数组名称（升序）
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.data.keys().map(String::as_str)
    }
}
