// crates/dfvm_config/src/material.rs

//! 材料参数配置
//!
//! 各系数均以线性律 `[a, b]` 给出，取值 `a·c + b`。只给 `b`（`a = 0`）
//! 即为常数。面传导系数为体相扩散系数 `d_coeff` 与分区相对系数之积：
//! 裂隙取 `d_free_frac`，基质取 `d_free_matrix + d_surf_matrix`。
//! 孔隙度按材料分区（基质 / 裂隙）分别给出。

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// 线性律 `a·c + b`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinearLaw(pub [f64; 2]);

impl LinearLaw {
    /// 常数律
    pub const fn constant(b: f64) -> Self {
        Self([0.0, b])
    }

    /// 在浓度 `c` 处取值
    #[inline]
    pub fn eval(&self, c: f64) -> f64 {
        self.0[0] * c + self.0[1]
    }

    fn validate(&self, key: &str) -> Result<(), ConfigError> {
        if self.0.iter().all(|v| v.is_finite()) {
            Ok(())
        } else {
            Err(ConfigError::invalid(key, format!("{:?}", self.0), "系数必须为有限数"))
        }
    }
}

/// 材料参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialConfig {
    /// 体相扩散系数律 [m²/s]
    #[serde(default = "default_d_coeff")]
    pub d_coeff: LinearLaw,

    /// 裂隙自由扩散相对系数律（无量纲）
    #[serde(default = "default_d_free_frac")]
    pub d_free_frac: LinearLaw,

    /// 基质自由扩散相对系数律（无量纲）
    #[serde(default = "default_d_free_matrix")]
    pub d_free_matrix: LinearLaw,

    /// 基质表面扩散相对系数律（无量纲）
    #[serde(default = "default_d_surf_matrix")]
    pub d_surf_matrix: LinearLaw,

    /// 裂隙孔隙度
    #[serde(default = "default_poro_frac")]
    pub poro_frac: f64,

    /// 基质孔隙度
    #[serde(default = "default_poro_matrix")]
    pub poro_matrix: f64,
}

fn default_d_coeff() -> LinearLaw { LinearLaw::constant(1e-9) }
fn default_d_free_frac() -> LinearLaw { LinearLaw::constant(1.0) }
fn default_d_free_matrix() -> LinearLaw { LinearLaw::constant(1.0) }
fn default_d_surf_matrix() -> LinearLaw { LinearLaw::constant(0.0) }
fn default_poro_frac() -> f64 { 1.0 }
fn default_poro_matrix() -> f64 { 0.2 }

impl Default for MaterialConfig {
    fn default() -> Self {
        Self {
            d_coeff: default_d_coeff(),
            d_free_frac: default_d_free_frac(),
            d_free_matrix: default_d_free_matrix(),
            d_surf_matrix: default_d_surf_matrix(),
            poro_frac: default_poro_frac(),
            poro_matrix: default_poro_matrix(),
        }
    }
}

impl MaterialConfig {
    /// 全部分区使用同一常数扩散系数与孔隙度（相对系数取 1，无表面扩散）
    pub fn uniform(diffusivity: f64, porosity: f64) -> Self {
        Self {
            d_coeff: LinearLaw::constant(diffusivity),
            d_free_frac: LinearLaw::constant(1.0),
            d_free_matrix: LinearLaw::constant(1.0),
            d_surf_matrix: LinearLaw::constant(0.0),
            poro_frac: porosity,
            poro_matrix: porosity,
        }
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.d_coeff.validate("material.d_coeff")?;
        self.d_free_frac.validate("material.d_free_frac")?;
        self.d_free_matrix.validate("material.d_free_matrix")?;
        self.d_surf_matrix.validate("material.d_surf_matrix")?;

        for (key, value) in [
            ("material.poro_frac", self.poro_frac),
            ("material.poro_matrix", self.poro_matrix),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(ConfigError::invalid(key, value, "孔隙度必须在 (0, 1] 范围内"));
            }
        }
        Ok(())
    }
}
