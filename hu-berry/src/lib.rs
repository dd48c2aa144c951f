#![warn(missing_docs)] // <= 合适时移除它.

//! 核心库. 提供 3D CT 扫描中 ROI (感兴趣区域) 的逐切片 HU 统计功能,
//! 以及面向电子表格工具的 CSV 导出功能.
//!
//! 工作流: 给定一个 3D CT 扫描 (HU 体素) 和一个同形状的 ROI mask,
//! 对每个存在区域内体素的水平切片计算描述性统计量 (均值, 总体标准差,
//! 最值, 体素数, 标准误), 将切片索引通过 4x4 仿射矩阵映射到物理 z
//! 坐标 (毫米), 最终按区域格式约定写出 CSV 文件. 批量导出时每个
//! (分割容器, segment) 选择对应一个输出文件.
//!
//! # 注意
//!
//! 1. 扫描和 mask 的形状必须一致. 在非期望情况下, 程序会直接 panic,
//!   而不会导致内存错误. As what Rust promises.
//! 2. 全程单线程同步执行. 对典型 CT 体积 (数百切片, 亚百万级区域体素)
//!   而言, 单次导出耗时远小于一秒, 不值得并行化.
//! 3. 区域格式 (小数分隔符) 由调用方一次性解析后显式传入,
//!   本库不读取进程全局的 locale 状态.
//!
//! # 开发计划
//!
//! ### 逐切片 HU 统计 ✅
//!
//! mask 过滤 + 均值 / 总体标准差 / 最值 / 体素数 / 标准误.
//! 空切片静默跳过, 不产生零值或 NaN 行.
//!
//! 实现位于 `hu-berry/src/stats.rs`.
//!
//! ### 体素索引到物理坐标的仿射变换 ✅
//!
//! 支持从 nii header 推导 (sform 有效时取 srow 三行, 否则退化为
//! pixdim 对角缩放).
//!
//! 实现位于 `hu-berry/src/data/affine.rs`.
//!
//! ### 区域格式感知的 CSV 写出 ✅
//!
//! 小数点-逗号与逗号-分号两种合法配对, 浮点字段固定小数位数.
//!
//! 实现位于 `hu-berry/src/export`.
//!
//! ### 输出文件名清洗 ✅
//!
//! 去除常见文件系统的非法字符, 拼接 `*_statistics.csv` 文件名.
//!
//! 实现位于 `hu-berry/src/export/name.rs`.
//!
//! ### 无头批量导出 ✅
//!
//! 将原先 GUI 形式的 "选择体积 + 选择 segment" 流程建模为普通请求对象.
//! segment 查找失败不中断批次, I/O 失败则致命.
//!
//! 实现位于 `hu-berry/src/batch.rs`.
//!
//! ### 完善代码文档 ✅
//!
//! 给每个 public API 提供文档.

/// 二维索引, 同时也可一定程度上用作非负整数向量.
pub type Idx2d = (usize, usize);

/// 三维索引, 同时也可一定程度上用作非负整数向量.
pub type Idx3d = (usize, usize, usize);

/// 3D CT 扫描与 ROI mask 基础数据结构.
mod data;

pub use data::{open_labelmap, HuVolume, IjkToWorld, RoiMask, Shaped3d};

pub mod consts;

pub mod batch;
pub mod export;
pub mod prelude;
pub mod stats;
