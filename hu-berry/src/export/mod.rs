//! 统计结果的 CSV 序列化与写出.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use itertools::Itertools;

use crate::consts::{CSV_COLUMNS, CSV_DECIMAL_PLACES};
use crate::stats::SliceHuStats;

mod name;

pub use name::{sanitize_name, statistics_filename};

/// CSV 的区域格式约定: 小数分隔符与字段分隔符的合法配对.
///
/// 为了让任意区域设置下的电子表格工具都能解析输出, 两种分隔符不允许冲突:
/// 小数点用 `.` 时字段以 `,` 分隔, 小数点用 `,` 时字段以 `;` 分隔.
/// 除此之外不存在其他合法组合, 该枚举也无法表达其他组合.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CsvStyle {
    /// 小数分隔符 `.`, 字段分隔符 `,`.
    PointComma,

    /// 小数分隔符 `,`, 字段分隔符 `;`.
    CommaSemicolon,
}

impl CsvStyle {
    /// 由调用方解析好的区域设置决定风格: 小数点是否为逗号.
    ///
    /// 区域设置应由调用方启动时一次性解析后传入,
    /// 而不是在计算过程中读取进程全局状态.
    #[inline]
    pub const fn from_decimal_comma(decimal_comma: bool) -> Self {
        if decimal_comma {
            Self::CommaSemicolon
        } else {
            Self::PointComma
        }
    }

    /// 字段分隔符.
    #[inline]
    pub const fn delimiter(&self) -> char {
        match self {
            Self::PointComma => ',',
            Self::CommaSemicolon => ';',
        }
    }

    /// 小数分隔符.
    #[inline]
    pub const fn decimal_separator(&self) -> char {
        match self {
            Self::PointComma => '.',
            Self::CommaSemicolon => ',',
        }
    }
}

/// CSV 数值格式, 包含区域风格和浮点字段保留的小数位数.
///
/// 该格式是只读的. 若要修改格式参数, 你应该创建新的实例.
#[derive(Copy, Clone, Debug)]
pub struct CsvFormat {
    style: CsvStyle,
    decimal_places: usize,
}

impl CsvFormat {
    /// 构建格式, 小数位数取默认值 [`CSV_DECIMAL_PLACES`].
    #[inline]
    pub const fn new(style: CsvStyle) -> Self {
        Self {
            style,
            decimal_places: CSV_DECIMAL_PLACES,
        }
    }

    /// 指定浮点字段保留的小数位数.
    #[inline]
    pub const fn with_decimal_places(self, decimal_places: usize) -> Self {
        Self {
            style: self.style,
            decimal_places,
        }
    }

    /// 区域风格.
    #[inline]
    pub const fn style(&self) -> CsvStyle {
        self.style
    }

    /// 浮点字段保留的小数位数.
    #[inline]
    pub const fn decimal_places(&self) -> usize {
        self.decimal_places
    }

    /// 将浮点值格式化为当前风格下的字段文本.
    fn float_field(&self, v: f64) -> String {
        let plain = format!("{v:.prec$}", prec = self.decimal_places);
        match self.style {
            CsvStyle::PointComma => plain,
            CsvStyle::CommaSemicolon => plain.replace('.', ","),
        }
    }
}

/// 将统计记录写入 `w`: 先写固定表头, 再按记录顺序逐行写出.
///
/// 浮点字段按 `format` 的小数位数和小数分隔符格式化, 整数字段原样写出.
pub fn write_slice_stats<W: Write>(
    w: &mut W,
    records: &[SliceHuStats],
    format: CsvFormat,
) -> io::Result<()> {
    let sep = format.style().delimiter().to_string();

    writeln!(w, "{}", CSV_COLUMNS.iter().join(&sep))?;
    for r in records {
        let fields = [
            r.slice_index.to_string(),
            format.float_field(r.z_mm),
            format.float_field(r.mean),
            format.float_field(r.std_dev),
            format.float_field(r.min),
            format.float_field(r.max),
            r.voxel_count.to_string(),
            format.float_field(r.std_err),
        ];
        writeln!(w, "{}", fields.iter().join(&sep))?;
    }
    Ok(())
}

/// 将统计记录写出到 `path` 文件 (UTF-8). 已存在的同名文件会被覆盖.
///
/// 文件句柄在本函数作用域内获取并释放, 所有退出路径 (包括序列化中途出错)
/// 都会关闭句柄. 写出失败时原样返回 I/O 错误, 不做半成品文件清理,
/// 调用方可能观察到截断的文件.
pub fn export_slice_stats_csv<P: AsRef<Path>>(
    path: P,
    records: &[SliceHuStats],
    format: CsvFormat,
) -> io::Result<()> {
    let mut w = BufWriter::new(File::create(path.as_ref())?);
    write_slice_stats(&mut w, records, format)?;
    w.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::SliceHuStats;

    fn demo_records() -> Vec<SliceHuStats> {
        vec![
            SliceHuStats::measure(1, -97.5, &[10.0, 20.0, 30.0]).unwrap(),
            SliceHuStats::measure(3, -92.5, &[-5.0]).unwrap(),
        ]
    }

    fn render(records: &[SliceHuStats], format: CsvFormat) -> String {
        let mut buf = Vec::with_capacity(512);
        write_slice_stats(&mut buf, records, format).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_style_pairing_is_fixed() {
        // 合法配对只有两种: `.`-`,` 和 `,`-`;`.
        let dot = CsvStyle::from_decimal_comma(false);
        assert_eq!(dot, CsvStyle::PointComma);
        assert_eq!(dot.decimal_separator(), '.');
        assert_eq!(dot.delimiter(), ',');

        let comma = CsvStyle::from_decimal_comma(true);
        assert_eq!(comma, CsvStyle::CommaSemicolon);
        assert_eq!(comma.decimal_separator(), ',');
        assert_eq!(comma.delimiter(), ';');
    }

    #[test]
    fn test_header_and_row_layout() {
        let out = render(&demo_records(), CsvFormat::new(CsvStyle::PointComma));
        let mut lines = out.lines();

        assert_eq!(
            lines.next().unwrap(),
            "SliceIndex,Z_Slice_mm,Mean,StdDev,Min,Max,VoxelCount,StdErr"
        );

        let row: Vec<&str> = lines.next().unwrap().split(',').collect();
        assert_eq!(row.len(), 8);
        assert_eq!(row[0], "1");
        assert_eq!(row[1], "-97.500000000");
        assert_eq!(row[2], "20.000000000");
        assert_eq!(row[6], "3");

        // 每条记录一行, 外加表头.
        assert_eq!(out.lines().count(), 3);
    }

    #[test]
    fn test_comma_style_replaces_decimal_separator() {
        let out = render(
            &demo_records(),
            CsvFormat::new(CsvStyle::CommaSemicolon).with_decimal_places(3),
        );
        let mut lines = out.lines();

        // 表头不含小数, 仅分隔符不同.
        assert_eq!(
            lines.next().unwrap(),
            "SliceIndex;Z_Slice_mm;Mean;StdDev;Min;Max;VoxelCount;StdErr"
        );

        let row: Vec<&str> = lines.next().unwrap().split(';').collect();
        assert_eq!(row[1], "-97,500");
        assert_eq!(row[2], "20,000");
        assert!(!row.iter().any(|f| f.contains('.')));
    }

    /// 以已知分隔符配对解析一行数值字段.
    fn parse_row(line: &str, style: CsvStyle) -> Vec<f64> {
        line.split(style.delimiter())
            .map(|f| f.replace(style.decimal_separator(), ".").parse().unwrap())
            .collect()
    }

    #[test]
    fn test_round_trip_both_styles() {
        let records = demo_records();
        for style in [CsvStyle::PointComma, CsvStyle::CommaSemicolon] {
            let out = render(&records, CsvFormat::new(style));
            for (line, r) in out.lines().skip(1).zip(records.iter()) {
                let v = parse_row(line, style);
                assert_eq!(v[0] as usize, r.slice_index);
                assert!((v[1] - r.z_mm).abs() < 1e-9);
                assert!((v[2] - r.mean).abs() < 1e-9);
                assert!((v[3] - r.std_dev).abs() < 1e-9);
                assert!((v[4] - r.min).abs() < 1e-9);
                assert!((v[5] - r.max).abs() < 1e-9);
                assert_eq!(v[6] as usize, r.voxel_count);
                assert!((v[7] - r.std_err).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_export_to_file() {
        let mut path = std::env::temp_dir();
        path.push(format!("hu-berry-export-{}.csv", std::process::id()));

        export_slice_stats_csv(&path, &demo_records(), CsvFormat::new(CsvStyle::PointComma))
            .unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 3);

        // 重复导出覆盖旧文件, 而不是追加.
        export_slice_stats_csv(&path, &demo_records()[..1], CsvFormat::new(CsvStyle::PointComma))
            .unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);

        std::fs::remove_file(&path).unwrap();
    }
}
