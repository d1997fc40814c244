// crates/dfvm_config/src/boundary.rs

//! 边界条件配置
//!
//! - `dirichlet`: 单元分组 → 固定浓度
//! - `flux`: 面分组 → 每个面的固定通量（流入区域为正）
//!
//! 未列出的区域边界面一律视为无通量。

use std::collections::BTreeMap;

use dfvm_foundation::GroupLabel;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// 边界条件配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundaryConfig {
    /// 固定浓度分组
    #[serde(default)]
    pub dirichlet: BTreeMap<GroupLabel, f64>,

    /// 固定通量分组
    #[serde(default)]
    pub flux: BTreeMap<GroupLabel, f64>,
}

impl BoundaryConfig {
    /// 添加固定浓度分组
    pub fn with_dirichlet(mut self, label: GroupLabel, value: f64) -> Self {
        self.dirichlet.insert(label, value);
        self
    }

    /// 添加固定通量分组
    pub fn with_flux(mut self, label: GroupLabel, value: f64) -> Self {
        self.flux.insert(label, value);
        self
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (label, value) in &self.dirichlet {
            if !value.is_finite() {
                return Err(ConfigError::invalid(
                    format!("boundary.dirichlet.{label}"),
                    value,
                    "浓度必须为有限数",
                ));
            }
        }
        for (label, value) in &self.flux {
            let key = format!("boundary.flux.{label}");
            if !value.is_finite() {
                return Err(ConfigError::invalid(key, value, "通量必须为有限数"));
            }
            if !(label.is_side() || *label == GroupLabel::ActiveBound) {
                return Err(ConfigError::invalid(key, label, "通量只能施加在区域端面或活动区边界面上"));
            }
        }
        Ok(())
    }
}
