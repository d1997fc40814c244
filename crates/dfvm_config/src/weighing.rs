// crates/dfvm_config/src/weighing.rs

//! 面上物性的两侧权重方法

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// 权重方法
///
/// 配置名称沿用 `meanAverage` / `meanHarmonic` / `upWind`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WeighingMethod {
    /// 算术平均
    MeanAverage,
    /// 调和平均
    #[default]
    MeanHarmonic,
    /// 取两侧较大值
    UpWind,
}

impl WeighingMethod {
    /// 配置名称
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MeanAverage => "meanAverage",
            Self::MeanHarmonic => "meanHarmonic",
            Self::UpWind => "upWind",
        }
    }
}

impl fmt::Display for WeighingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WeighingMethod {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "meanAverage" => Ok(Self::MeanAverage),
            "meanHarmonic" => Ok(Self::MeanHarmonic),
            "upWind" => Ok(Self::UpWind),
            other => Err(ConfigError::UnknownWeighing(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names() {
        assert_eq!("upWind".parse::<WeighingMethod>().unwrap(), WeighingMethod::UpWind);
        assert_eq!(
            WeighingMethod::MeanAverage.to_string().parse::<WeighingMethod>().unwrap(),
            WeighingMethod::MeanAverage
        );
        assert!(matches!(
            "harmonic".parse::<WeighingMethod>(),
            Err(ConfigError::UnknownWeighing(_))
        ));
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&WeighingMethod::MeanHarmonic).unwrap();
        assert_eq!(json, "\"meanHarmonic\"");
        assert!(serde_json::from_str::<WeighingMethod>("\"upwind\"").is_err());
    }
}
