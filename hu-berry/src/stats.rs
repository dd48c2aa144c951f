//! ROI 区域的逐切片 HU 统计.

use itertools::Itertools;
use ndarray::ArrayView2;
use ordered_float::NotNan;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::consts::label::is_in_region;
use crate::data::{HuVolume, IjkToWorld, RoiMask, Shaped3d};

/// 单个水平切片上 ROI 区域的 HU 描述性统计量.
///
/// 所有统计量均以双精度浮点计算. 该记录一经产生不再修改.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SliceHuStats {
    /// 切片索引 (z 方向, 从 0 开始).
    pub slice_index: usize,

    /// 切片对应的物理 z 坐标, 以毫米为单位.
    pub z_mm: f64,

    /// 区域内 HU 均值.
    pub mean: f64,

    /// 区域内 HU 总体标准差 (除数为 n, 而不是 n - 1).
    pub std_dev: f64,

    /// 区域内 HU 最小值.
    pub min: f64,

    /// 区域内 HU 最大值.
    pub max: f64,

    /// 区域内体素个数.
    pub voxel_count: usize,

    /// 均值标准误, 即 `std_dev / sqrt(voxel_count)`.
    pub std_err: f64,
}

impl SliceHuStats {
    /// 对一个切片的区域内 HU 采样计算统计量.
    ///
    /// 当 `samples` 为空时返回 `None`: 空切片不产生统计记录,
    /// 也绝不产生零值或 NaN 填充的记录.
    ///
    /// 若采样中存在 NaN, 则程序 panic.
    pub fn measure(slice_index: usize, z_mm: f64, samples: &[f64]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }

        let n = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / n;
        let variance = samples
            .iter()
            .map(|v| {
                let d = v - mean;
                d * d
            })
            .sum::<f64>()
            / n;
        let std_dev = variance.sqrt();

        let (min, max) = samples
            .iter()
            .map(|&v| NotNan::<f64>::new(v).unwrap())
            .minmax()
            .into_option()
            .unwrap();

        Some(Self {
            slice_index,
            z_mm,
            mean,
            std_dev,
            min: min.into_inner(),
            max: max.into_inner(),
            voxel_count: samples.len(),
            std_err: std_dev / n.sqrt(),
        })
    }
}

/// 收集单个切片上 mask 区域内的 HU 采样.
fn region_hu(scan: ArrayView2<f32>, mask: ArrayView2<u8>) -> Vec<f64> {
    scan.iter()
        .zip(mask.iter())
        .filter_map(|(&hu, &m)| is_in_region(m).then_some(hu as f64))
        .collect()
}

/// 计算 `scan` 在 `mask` 区域内的逐切片 HU 统计量.
///
/// 切片索引通过 `ijk_to_world` 映射到物理 z 坐标. 返回的记录按切片索引
/// 严格递增排列 (外部契约: 消费方可以依赖 z 的单调性); 区域内体素数为 0
/// 的切片不产生记录.
///
/// # 注意
///
/// 1. `scan` 和 `mask` 的形状必须一致, 否则程序 panic.
/// 2. 区域内若存在 NaN HU 值, 则程序 panic.
pub fn slice_hu_stats(
    scan: &HuVolume,
    mask: &RoiMask,
    ijk_to_world: &IjkToWorld,
) -> Vec<SliceHuStats> {
    assert_eq!(scan.shape(), mask.shape(), "CT 扫描和 ROI mask 形状不一致");

    let mut records = Vec::new();
    for z in 0..scan.len_z() {
        let hu = region_hu(scan.slice_at(z), mask.slice_at(z));
        if let Some(r) = SliceHuStats::measure(z, ijk_to_world.z_of_slice(z), &hu) {
            records.push(r);
        }
    }
    records
}
