// crates/dfvm_foundation/src/group.rs

//! 类型化的分组标签与材料分区
//!
//! 网格上的命名分组（边界面、活动区、材料区）使用封闭的枚举标识，
//! 配置文件中的未知名称在反序列化时即被拒绝。
//!
//! # 名称对照
//!
//! | 标签 | 名称 | 含义 |
//! |------|------|------|
//! | `Left`/`Right` | `left`/`right` | x 方向最小/最大端 |
//! | `Front`/`Back` | `front`/`back` | y 方向最小/最大端 |
//! | `Bottom`/`Top` | `bottom`/`top` | z 方向最小/最大端 |
//! | `Active`/`Inactive` | `active`/`inactive` | 参与计算/冻结的单元 |
//! | `ActiveBound` | `active_bound` | 活动区边界面 |
//! | `ActiveNonbound` | `active_nonbound` | 活动区内部面 |
//! | `Matrix`/`Fracture` | `matrix`/`fracture` | 基质区/裂隙区 |

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DfvmError;

/// 分组标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupLabel {
    /// x 最小端
    Left,
    /// x 最大端
    Right,
    /// y 最小端
    Front,
    /// y 最大端
    Back,
    /// z 最小端
    Bottom,
    /// z 最大端
    Top,
    /// 活动单元
    Active,
    /// 非活动单元
    Inactive,
    /// 活动区边界面
    ActiveBound,
    /// 活动区内部面
    ActiveNonbound,
    /// 基质区单元
    Matrix,
    /// 裂隙区单元
    Fracture,
}

impl GroupLabel {
    /// 全部标签
    pub const ALL: [GroupLabel; 12] = [
        Self::Left,
        Self::Right,
        Self::Front,
        Self::Back,
        Self::Bottom,
        Self::Top,
        Self::Active,
        Self::Inactive,
        Self::ActiveBound,
        Self::ActiveNonbound,
        Self::Matrix,
        Self::Fracture,
    ];

    /// 六个区域端面，顺序与单元局部面顺序一致（-x, +x, -y, +y, -z, +z）
    pub const SIDES: [GroupLabel; 6] = [
        Self::Left,
        Self::Right,
        Self::Front,
        Self::Back,
        Self::Bottom,
        Self::Top,
    ];

    /// 名称
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Front => "front",
            Self::Back => "back",
            Self::Bottom => "bottom",
            Self::Top => "top",
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::ActiveBound => "active_bound",
            Self::ActiveNonbound => "active_nonbound",
            Self::Matrix => "matrix",
            Self::Fracture => "fracture",
        }
    }

    /// 端面所在的坐标轴和方向（`false` 为最小端）
    ///
    /// 非端面标签返回 `None`。
    pub fn side(&self) -> Option<(usize, bool)> {
        match self {
            Self::Left => Some((0, false)),
            Self::Right => Some((0, true)),
            Self::Front => Some((1, false)),
            Self::Back => Some((1, true)),
            Self::Bottom => Some((2, false)),
            Self::Top => Some((2, true)),
            _ => None,
        }
    }

    /// 是否为区域端面
    #[inline]
    pub fn is_side(&self) -> bool {
        self.side().is_some()
    }
}

impl fmt::Display for GroupLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupLabel {
    type Err = DfvmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|label| label.as_str() == s)
            .ok_or_else(|| DfvmError::invalid_input(format!("未知的分组名称: {s}")))
    }
}

/// 材料分区
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Zone {
    /// 多孔基质
    #[default]
    Matrix,
    /// 裂隙
    Fracture,
}

impl Zone {
    /// 对应的单元分组标签
    #[inline]
    pub fn label(&self) -> GroupLabel {
        match self {
            Self::Matrix => GroupLabel::Matrix,
            Self::Fracture => GroupLabel::Fracture,
        }
    }

    /// 由布尔掩码构造（`true` 为基质）
    #[inline]
    pub fn from_is_matrix(is_matrix: bool) -> Self {
        if is_matrix {
            Self::Matrix
        } else {
            Self::Fracture
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_name_roundtrip() {
        for label in GroupLabel::ALL {
            let parsed: GroupLabel = label.as_str().parse().unwrap();
            assert_eq!(parsed, label);
        }
    }

    #[test]
    fn test_unknown_label_rejected() {
        assert!("upstream".parse::<GroupLabel>().is_err());
    }

    #[test]
    fn test_display_names() {
        assert_eq!(GroupLabel::ActiveNonbound.to_string(), "active_nonbound");
        assert_eq!(GroupLabel::Left.to_string(), "left");
    }

    #[test]
    fn test_sides() {
        assert_eq!(GroupLabel::Top.side(), Some((2, true)));
        assert_eq!(GroupLabel::Front.side(), Some((1, false)));
        assert!(GroupLabel::Active.side().is_none());
        assert!(GroupLabel::SIDES.iter().all(|s| s.is_side()));
    }

    #[test]
    fn test_zone_from_mask() {
        assert_eq!(Zone::from_is_matrix(true), Zone::Matrix);
        assert_eq!(Zone::from_is_matrix(false).label(), GroupLabel::Fracture);
    }
}
