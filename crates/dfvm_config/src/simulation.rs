// crates/dfvm_config/src/simulation.rs

//! DfvmConfig - 扩散模拟总配置
//!
//! 时间、材料、权重方法、线性求解器与边界条件五部分，均可在 JSON 中
//! 省略而取默认值。加载后统一经过 [`DfvmConfig::validate`]。
//!
//! # 使用示例
//!
//! ```
//! use dfvm_config::DfvmConfig;
//!
//! let config = DfvmConfig::from_json_str(r#"{
//!     "time": { "time_period": 10.0, "time_step": 3.0 },
//!     "weighing": "upWind",
//!     "boundary": { "dirichlet": { "left": 0.0, "right": 10.0 } }
//! }"#).unwrap();
//! assert_eq!(config.time.time_step, 3.0);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::boundary::BoundaryConfig;
use crate::error::ConfigError;
use crate::material::MaterialConfig;
use crate::weighing::WeighingMethod;

/// 扩散模拟总配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DfvmConfig {
    /// 时间推进
    #[serde(default)]
    pub time: TimeConfig,

    /// 材料参数
    #[serde(default)]
    pub material: MaterialConfig,

    /// 面上物性权重方法
    #[serde(default)]
    pub weighing: WeighingMethod,

    /// 线性求解器
    #[serde(default)]
    pub solver: LinearSolverConfig,

    /// 边界条件
    #[serde(default)]
    pub boundary: BoundaryConfig,
}

/// 时间推进配置
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeConfig {
    /// 总模拟时长 [s]
    #[serde(default = "default_time_period")]
    pub time_period: f64,

    /// 名义时间步长 [s]
    #[serde(default = "default_time_step")]
    pub time_step: f64,
}

fn default_time_period() -> f64 { 1.0 }
fn default_time_step() -> f64 { 0.1 }

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            time_period: default_time_period(),
            time_step: default_time_step(),
        }
    }
}

impl TimeConfig {
    /// 创建时间配置
    pub fn new(time_period: f64, time_step: f64) -> Self {
        Self {
            time_period,
            time_step,
        }
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.time_period.is_finite() && self.time_period > 0.0) {
            return Err(ConfigError::invalid(
                "time.time_period",
                self.time_period,
                "总时长必须为有限正数",
            ));
        }
        if !(self.time_step.is_finite() && self.time_step > 0.0) {
            return Err(ConfigError::invalid(
                "time.time_step",
                self.time_step,
                "时间步长必须为有限正数",
            ));
        }
        Ok(())
    }
}

/// 不收敛时的处理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NonConvergencePolicy {
    /// 返回错误并回滚本步
    #[default]
    Fail,
    /// 记录警告并接受当前迭代结果
    Warn,
}

/// 线性求解器配置
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearSolverConfig {
    /// 相对容差
    #[serde(default = "default_rtol")]
    pub rtol: f64,

    /// 绝对容差
    #[serde(default = "default_atol")]
    pub atol: f64,

    /// 最大迭代次数
    #[serde(default = "default_max_iter")]
    pub max_iter: usize,

    /// 逐次迭代输出 trace 日志
    #[serde(default)]
    pub verbose: bool,

    /// 不收敛时的处理策略
    #[serde(default)]
    pub on_non_convergence: NonConvergencePolicy,
}

fn default_rtol() -> f64 { 1e-10 }
fn default_atol() -> f64 { 1e-14 }
fn default_max_iter() -> usize { 1000 }

impl Default for LinearSolverConfig {
    fn default() -> Self {
        Self {
            rtol: default_rtol(),
            atol: default_atol(),
            max_iter: default_max_iter(),
            verbose: false,
            on_non_convergence: NonConvergencePolicy::default(),
        }
    }
}

impl LinearSolverConfig {
    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.rtol.is_finite() && self.rtol > 0.0) {
            return Err(ConfigError::invalid("solver.rtol", self.rtol, "相对容差必须为正"));
        }
        if !(self.atol.is_finite() && self.atol >= 0.0) {
            return Err(ConfigError::invalid("solver.atol", self.atol, "绝对容差不能为负"));
        }
        if self.max_iter == 0 {
            return Err(ConfigError::invalid("solver.max_iter", self.max_iter, "最大迭代次数必须大于 0"));
        }
        Ok(())
    }
}

impl DfvmConfig {
    /// 从 JSON 字符串解析并验证
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let config: DfvmConfig =
            serde_json::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// 从文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    /// 保存配置到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content =
            serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.time.validate()?;
        self.material.validate()?;
        self.solver.validate()?;
        self.boundary.validate()?;
        Ok(())
    }

    /// 设置时间推进
    pub fn with_time(mut self, time_period: f64, time_step: f64) -> Self {
        self.time = TimeConfig::new(time_period, time_step);
        self
    }

    /// 设置材料参数
    pub fn with_material(mut self, material: MaterialConfig) -> Self {
        self.material = material;
        self
    }

    /// 设置权重方法
    pub fn with_weighing(mut self, weighing: WeighingMethod) -> Self {
        self.weighing = weighing;
        self
    }

    /// 设置边界条件
    pub fn with_boundary(mut self, boundary: BoundaryConfig) -> Self {
        self.boundary = boundary;
        self
    }

    /// 设置线性求解器
    pub fn with_solver(mut self, solver: LinearSolverConfig) -> Self {
        self.solver = solver;
        self
    }
}
