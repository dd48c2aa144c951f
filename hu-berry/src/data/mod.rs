//! 3D CT 扫描与 ROI mask 的基础数据结构.

use std::ops::Index;
use std::path::Path;

use ndarray::{Array3, ArrayView, ArrayView2, ArrayView3, Axis, Ix3};
use nifti::{IntoNdArray, NiftiHeader, NiftiObject, ReaderOptions};

use crate::consts::label::{is_in_region, BACKGROUND};
use crate::{Idx2d, Idx3d};

pub mod affine;

pub use affine::IjkToWorld;

/// `NiftiHeader` 是栈上大对象, 移动该对象的开销很可观.
/// 因此我们将其分配到堆上.
type BoxedHeader = Box<NiftiHeader>;

/// 从 header 读出数据形状, 并转换成 (z, H, W) 访问模式.
#[inline]
fn shape_from_header(h: &NiftiHeader) -> Idx3d {
    // [W, H, z]. 体素个数数组.
    let [_, w, h, z, ..] = h.dim;
    (z as usize, h as usize, w as usize)
}

/// 3D 体素网格的形状属性与索引合法性检查.
pub trait Shaped3d {
    /// 获取数据形状大小, 按 (z, H, W) 排列.
    fn shape(&self) -> Idx3d;

    /// 获取水平切片个数.
    #[inline]
    fn len_z(&self) -> usize {
        self.shape().0
    }

    /// 获取数据水平切片形状大小.
    #[inline]
    fn slice_shape(&self) -> Idx2d {
        let (_, h, w) = self.shape();
        (h, w)
    }

    /// 获取数据体素个数.
    #[inline]
    fn size(&self) -> usize {
        let (z, h, w) = self.shape();
        z * h * w
    }

    /// 检查索引是否合法.
    #[inline]
    fn check(&self, (z0, h0, w0): &Idx3d) -> bool {
        let (z, h, w) = self.shape();
        *z0 < z && *h0 < h && *w0 < w
    }
}

/// 打开 nii 文件格式的 3D labelmap, 返回按 (z, H, W) 访问的体素数组.
/// `path` 为 nii 文件的本地路径. 如果打开成功, 则返回 `Ok`, 否则返回 `Err`.
pub fn open_labelmap<P: AsRef<Path>>(path: P) -> nifti::Result<Array3<u8>> {
    let obj = ReaderOptions::new().read_file(path.as_ref())?;
    let header = Box::new(obj.header().clone());

    // [W, H, z] -> [z, H, W].
    let data = obj
        .into_volume()
        .into_ndarray::<u8>()?
        .permuted_axes([2, 1, 0].as_slice());

    // The nature of nifti data field layout.
    debug_assert!(data.is_standard_layout());

    // 该操作不会生成 `Err`, 可直接 unwrap.
    Ok(Array3::<u8>::from_shape_vec(shape_from_header(&header), data.into_raw_vec()).unwrap())
}

/// nii 格式 3D CT 扫描, 包括 header (若有) 和 CT 扫描 (HU). HU 值以 `f32` 保存.
#[derive(Debug, Clone)]
pub struct HuVolume {
    header: Option<BoxedHeader>,
    data: Array3<f32>,
}

impl Shaped3d for HuVolume {
    #[inline]
    fn shape(&self) -> Idx3d {
        let &[z, h, w] = self.data.shape() else {
            unreachable!()
        };
        (z, h, w)
    }
}

impl Index<Idx3d> for HuVolume {
    type Output = f32;

    #[inline]
    fn index(&self, index: Idx3d) -> &Self::Output {
        &self.data[index]
    }
}

impl HuVolume {
    /// 打开 nii 文件格式的 3D CT 扫描. `path` 为 nii 文件的本地路径.
    /// 如果打开成功, 则返回 `Ok(Self)`, 否则返回 `Err`.
    pub fn open<P: AsRef<Path>>(path: P) -> nifti::Result<Self> {
        let obj = ReaderOptions::new().read_file(path.as_ref())?;
        let header = Box::new(obj.header().clone());

        // [W, H, z] -> [z, H, W].
        let data = obj
            .into_volume()
            .into_ndarray::<f32>()?
            .permuted_axes([2, 1, 0].as_slice());

        // The nature of nifti data field layout.
        debug_assert!(data.is_standard_layout());

        // 该操作不会生成 `Err`, 可直接 unwrap.
        let data =
            Array3::<f32>::from_shape_vec(shape_from_header(&header), data.into_raw_vec())
                .unwrap();

        Ok(Self {
            header: Some(header),
            data,
        })
    }

    /// 从内存中已有的体素数组直接创建扫描. `data` 按 (z, H, W) 组织.
    ///
    /// 以该方式创建的扫描不携带 header, 宿主方应自行提供仿射变换.
    #[inline]
    pub fn from_array(data: Array3<f32>) -> Self {
        Self { header: None, data }
    }

    /// 获取 header 部分. 内存内构造的扫描返回 `None`.
    #[inline]
    pub fn header(&self) -> Option<&NiftiHeader> {
        self.header.as_deref()
    }

    /// 获取 3D 扫描 z 空间的第 `z_index` 层切片视图.
    ///
    /// 当 `z_index` 越界时 panic.
    #[inline]
    pub fn slice_at(&self, z_index: usize) -> ArrayView2<f32> {
        self.data.index_axis(Axis(0), z_index)
    }

    /// 获取能按升序迭代 3D 扫描水平切片的迭代器.
    #[inline]
    pub fn slice_iter(&self) -> impl ExactSizeIterator<Item = ArrayView2<f32>> {
        self.data.axis_iter(Axis(0))
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView<'_, f32, Ix3> {
        self.data.view()
    }
}

/// 3D ROI mask, 与某个扫描形状一致. 体素值大于 0 即视为 "区域内".
///
/// mask 一般由宿主环境按 segment 提供, 或通过 [`RoiMask::from_label_value`]
/// 从 labelmap 中拆分得到.
#[derive(Debug, Clone)]
pub struct RoiMask {
    data: Array3<u8>,
}

impl Shaped3d for RoiMask {
    #[inline]
    fn shape(&self) -> Idx3d {
        let &[z, h, w] = self.data.shape() else {
            unreachable!()
        };
        (z, h, w)
    }
}

impl Index<Idx3d> for RoiMask {
    type Output = u8;

    #[inline]
    fn index(&self, index: Idx3d) -> &Self::Output {
        &self.data[index]
    }
}

impl RoiMask {
    /// 打开 nii 文件格式的 3D mask. `path` 为 nii 文件的本地路径.
    /// 如果打开成功, 则返回 `Ok(Self)`, 否则返回 `Err`.
    pub fn open<P: AsRef<Path>>(path: P) -> nifti::Result<Self> {
        Ok(Self::from_array(open_labelmap(path)?))
    }

    /// 从内存中已有的体素数组直接创建 mask. `data` 按 (z, H, W) 组织.
    #[inline]
    pub fn from_array(data: Array3<u8>) -> Self {
        Self { data }
    }

    /// 从 labelmap 中抽取值等于 `label` 的体素, 生成对应的二值 mask.
    ///
    /// `label` 必须为正值, 否则程序 panic (背景不构成区域).
    pub fn from_label_value(labelmap: ArrayView3<u8>, label: u8) -> Self {
        assert_ne!(label, BACKGROUND, "背景值不能作为 segment 标签");
        Self {
            data: labelmap.mapv(|v| u8::from(v == label)),
        }
    }

    /// 判断给定体素是否在区域内.
    ///
    /// 当 `pos` 越界时 panic.
    #[inline]
    pub fn in_region(&self, pos: Idx3d) -> bool {
        is_in_region(self.data[pos])
    }

    /// 区域内体素总个数.
    #[inline]
    pub fn region_count(&self) -> usize {
        self.data.iter().filter(|&&v| is_in_region(v)).count()
    }

    /// 第 `z_index` 个水平切片上区域内体素个数.
    ///
    /// 当 `z_index` 越界时 panic.
    #[inline]
    pub fn region_count_at(&self, z_index: usize) -> usize {
        self.slice_at(z_index)
            .iter()
            .filter(|&&v| is_in_region(v))
            .count()
    }

    /// 获取 3D mask z 空间的第 `z_index` 层切片视图.
    ///
    /// 当 `z_index` 越界时 panic.
    #[inline]
    pub fn slice_at(&self, z_index: usize) -> ArrayView2<u8> {
        self.data.index_axis(Axis(0), z_index)
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView<'_, u8, Ix3> {
        self.data.view()
    }
}
