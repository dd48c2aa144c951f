//! 体素索引坐标系到物理坐标系的仿射变换.

use nifti::NiftiHeader;

/// 4x4 仿射矩阵, 将齐次体素索引 `(i, j, k, 1)` 映射到物理毫米坐标
/// `(x, y, z, 1)`.
///
/// 体素索引按 nifti 存储惯例排列, 即 `(i, j, k)` = (列, 行, 切片).
/// 注意这与本 crate 数组的 (z, H, W) 访问模式次序相反.
///
/// 该变换是只读的. 若要修改矩阵参数, 你应该创建新的实例.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct IjkToWorld {
    m: [[f64; 4]; 4],
}

impl IjkToWorld {
    /// 由行优先的 4x4 矩阵直接构建.
    #[inline]
    pub const fn new(m: [[f64; 4]; 4]) -> Self {
        Self { m }
    }

    /// 单位变换, 即物理坐标等于体素索引.
    pub const fn identity() -> Self {
        Self::new([
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// 从 nii header 推导仿射变换.
    ///
    /// 当 header 的 sform 有效 (`sform_code > 0`) 时, 取 srow_{x, y, z}
    /// 三行; 否则退化为由 pixdim 缩放的对角矩阵 (无旋转, 无平移).
    pub fn from_nifti_header(h: &NiftiHeader) -> Self {
        if h.sform_code > 0 {
            let row = |r: &[f32; 4]| [r[0] as f64, r[1] as f64, r[2] as f64, r[3] as f64];
            Self::new([
                row(&h.srow_x),
                row(&h.srow_y),
                row(&h.srow_z),
                [0.0, 0.0, 0.0, 1.0],
            ])
        } else {
            // [_, i, j, k, ..]. 体素分辨率数组.
            let [_, i, j, k, ..] = h.pixdim;
            Self::new([
                [i as f64, 0.0, 0.0, 0.0],
                [0.0, j as f64, 0.0, 0.0],
                [0.0, 0.0, k as f64, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ])
        }
    }

    /// 将体素索引 `(i, j, k)` 映射到物理坐标 `(x, y, z)`.
    pub fn apply(&self, (i, j, k): (f64, f64, f64)) -> (f64, f64, f64) {
        let row = |r: &[f64; 4]| r[0] * i + r[1] * j + r[2] * k + r[3];
        (row(&self.m[0]), row(&self.m[1]), row(&self.m[2]))
    }

    /// 第 `k` 个水平切片对应的物理 z 坐标, 以毫米为单位.
    ///
    /// 等价于对齐次向量 `(0, 0, k, 1)` 应用变换后取第三分量.
    /// 因为 i = j = 0, 只有 k 列系数和平移分量参与计算.
    #[inline]
    pub fn z_of_slice(&self, k: usize) -> f64 {
        self.apply((0.0, 0.0, k as f64)).2
    }
}
