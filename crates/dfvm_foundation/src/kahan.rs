// crates/dfvm_foundation/src/kahan.rs

//! Kahan 补偿求和
//!
//! 守恒量诊断（总溶质量等）在大网格上累加时，普通求和的舍入误差会掩盖
//! 真实的守恒偏差，这里统一使用补偿求和。

/// Kahan 补偿求和器
///
/// # 示例
///
/// ```
/// use dfvm_foundation::kahan::KahanSum;
///
/// let data = vec![0.1f64; 1000];
/// let sum = KahanSum::sum_iter(data.iter().copied());
/// assert!((sum - 100.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct KahanSum {
    sum: f64,
    compensation: f64,
}

impl KahanSum {
    /// 创建零值求和器
    pub const fn new() -> Self {
        Self {
            sum: 0.0,
            compensation: 0.0,
        }
    }

    /// 累加一个值
    #[inline]
    pub fn add(&mut self, value: f64) {
        let y = value - self.compensation;
        let t = self.sum + y;
        self.compensation = (t - self.sum) - y;
        self.sum = t;
    }

    /// 当前和
    #[inline]
    pub fn value(&self) -> f64 {
        self.sum
    }

    /// 对迭代器求和
    pub fn sum_iter<I: IntoIterator<Item = f64>>(iter: I) -> f64 {
        let mut kahan = Self::new();
        for v in iter {
            kahan.add(v);
        }
        kahan.value()
    }

    /// 加权求和 `Σ a[i]·b[i]`
    pub fn weighted(a: &[f64], b: &[f64]) -> f64 {
        Self::sum_iter(a.iter().zip(b).map(|(x, w)| x * w))
    }
}
