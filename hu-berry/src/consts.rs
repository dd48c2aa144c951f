//! 通用常量.

/// labelmap 体素值.
pub mod label {
    /// labelmap 中背景的体素值.
    pub const BACKGROUND: u8 = 0;

    /// 体素是否在 ROI 区域内 (即非背景)?
    #[inline]
    pub const fn is_in_region(p: u8) -> bool {
        p > BACKGROUND
    }
}

/// CSV 表头的固定列名, 按输出顺序排列.
pub const CSV_COLUMNS: [&str; 8] = [
    "SliceIndex",
    "Z_Slice_mm",
    "Mean",
    "StdDev",
    "Min",
    "Max",
    "VoxelCount",
    "StdErr",
];

/// CSV 浮点字段默认保留的小数位数.
pub const CSV_DECIMAL_PLACES: usize = 9;

/// 常见文件系统中非法的文件名字符. 构建输出文件名前会将其全部去除.
pub const ILLEGAL_FILENAME_CHARS: [char; 10] =
    ['<', '>', ':', '"', '/', '\\', '|', '?', '*', '\''];

/// 统计输出文件名的固定后缀.
pub const STATISTICS_SUFFIX: &str = "_statistics.csv";
