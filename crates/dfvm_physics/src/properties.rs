// crates/dfvm_physics/src/properties.rs

//! 材料物性
//!
//! 引擎只通过 [`MaterialProperties`] 查询物性，具体的本构关系可以替换。
//! [`ZonedProperties`] 是按基质 / 裂隙两区给出线性律的标准实现：
//!
//! - 累积系数 A = 分区孔隙度
//! - 相对传导系数 B：基质 = 自由扩散 + 表面扩散，裂隙 = 自由扩散
//! - 面传导系数还要乘以体相扩散系数 D(c)

use dfvm_config::{LinearLaw, MaterialConfig};
use dfvm_foundation::Zone;

/// 材料物性接口
pub trait MaterialProperties: Send + Sync {
    /// 体相扩散系数 D(c)
    fn diffusivity(&self, conc: f64) -> f64;

    /// 孔隙度
    fn porosity(&self, conc: f64, zone: Zone) -> f64;

    /// 自由扩散相对系数
    fn free_diffusivity(&self, conc: f64, zone: Zone) -> f64;

    /// 表面扩散相对系数
    fn surface_diffusivity(&self, conc: f64, zone: Zone) -> f64;

    /// 累积系数 A(c, zone)
    fn storage_coefficient(&self, conc: f64, zone: Zone) -> f64 {
        self.porosity(conc, zone)
    }

    /// 相对传导系数 B(c, zone)
    fn flow_coefficient(&self, conc: f64, zone: Zone) -> f64 {
        match zone {
            Zone::Matrix => {
                self.free_diffusivity(conc, zone) + self.surface_diffusivity(conc, zone)
            }
            Zone::Fracture => self.free_diffusivity(conc, zone),
        }
    }
}

/// 两区线性律物性
#[derive(Debug, Clone, PartialEq)]
pub struct ZonedProperties {
    d_coeff: LinearLaw,
    d_free_frac: LinearLaw,
    d_free_matrix: LinearLaw,
    d_surf_matrix: LinearLaw,
    poro_frac: f64,
    poro_matrix: f64,
}

impl ZonedProperties {
    /// 由材料配置构建
    pub fn new(config: &MaterialConfig) -> Self {
        Self {
            d_coeff: config.d_coeff,
            d_free_frac: config.d_free_frac,
            d_free_matrix: config.d_free_matrix,
            d_surf_matrix: config.d_surf_matrix,
            poro_frac: config.poro_frac,
            poro_matrix: config.poro_matrix,
        }
    }
}

impl From<&MaterialConfig> for ZonedProperties {
    fn from(config: &MaterialConfig) -> Self {
        Self::new(config)
    }
}

impl MaterialProperties for ZonedProperties {
    fn diffusivity(&self, conc: f64) -> f64 {
        self.d_coeff.eval(conc)
    }

    fn porosity(&self, _conc: f64, zone: Zone) -> f64 {
        match zone {
            Zone::Matrix => self.poro_matrix,
            Zone::Fracture => self.poro_frac,
        }
    }

    fn free_diffusivity(&self, conc: f64, zone: Zone) -> f64 {
        match zone {
            Zone::Matrix => self.d_free_matrix.eval(conc),
            Zone::Fracture => self.d_free_frac.eval(conc),
        }
    }

    fn surface_diffusivity(&self, conc: f64, zone: Zone) -> f64 {
        match zone {
            Zone::Matrix => self.d_surf_matrix.eval(conc),
            Zone::Fracture => 0.0,
        }
    }
}
