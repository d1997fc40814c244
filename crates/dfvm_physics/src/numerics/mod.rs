// crates/dfvm_physics/src/numerics/mod.rs

//! 数值方法

pub mod linear_algebra;
