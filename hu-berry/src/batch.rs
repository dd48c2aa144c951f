//! 无头批量导出.
//!
//! 将宿主应用中 "选择体积 + 选择若干 segment + 选择输出目录" 的交互流程
//! 建模为普通请求对象: 一次请求引用一个扫描, 每个选择命名一个
//! (分割容器, segment) 对. 各选择独立串行处理, 彼此之间除成功计数外
//! 不共享任何可变状态.

use std::io;
use std::path::{Path, PathBuf};

use ndarray::ArrayView3;

use crate::data::{HuVolume, IjkToWorld, RoiMask};
use crate::export::{export_slice_stats_csv, statistics_filename, CsvFormat};
use crate::stats::slice_hu_stats;

/// 命名的分割容器, 内含若干命名 segment, 每个 segment 对应一个 ROI mask.
///
/// 这是宿主分割节点的无头替身: segment 按名字查找, 按定义顺序枚举.
#[derive(Debug, Clone)]
pub struct Segmentation {
    name: String,
    segments: Vec<(String, RoiMask)>,
}

impl Segmentation {
    /// 创建不含任何 segment 的空容器.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            segments: Vec::new(),
        }
    }

    /// 按正标签值拆分 labelmap, 每个出现过的标签值生成一个二值 mask segment.
    ///
    /// segment 按标签值升序命名为 `label-{v}` (如 LiTS 惯例下 `label-1`
    /// 为肝脏, `label-2` 为肿瘤). 全背景 labelmap 生成空容器.
    pub fn from_labelmap(name: impl Into<String>, labelmap: ArrayView3<u8>) -> Self {
        let mut seen = [false; 256];
        for &v in labelmap.iter() {
            seen[v as usize] = true;
        }

        let mut ans = Self::new(name);
        for v in 1..=u8::MAX {
            if seen[v as usize] {
                ans.push_segment(
                    format!("label-{v}"),
                    RoiMask::from_label_value(labelmap.view(), v),
                );
            }
        }
        ans
    }

    /// 容器名.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 在容器尾部添加一个命名 segment.
    pub fn push_segment(&mut self, name: impl Into<String>, mask: RoiMask) {
        self.segments.push((name.into(), mask));
    }

    /// 按定义顺序枚举 segment 名.
    pub fn segment_names(&self) -> impl ExactSizeIterator<Item = &str> {
        self.segments.iter().map(|(name, _)| name.as_str())
    }

    /// 按名字查找 segment 的 mask. 找不到时返回 `None`.
    pub fn mask_of(&self, segment: &str) -> Option<&RoiMask> {
        self.segments
            .iter()
            .find(|(name, _)| name == segment)
            .map(|(_, mask)| mask)
    }

    /// segment 个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// 容器是否不含任何 segment?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// 一次导出选择: 某个分割容器中的一个命名 segment.
#[derive(Copy, Clone, Debug)]
pub struct Selection<'a> {
    /// 所属分割容器.
    pub segmentation: &'a Segmentation,

    /// segment 名.
    pub segment: &'a str,
}

/// 一次批量导出请求: 扫描, 仿射变换, 输出目录和 CSV 格式.
///
/// 请求本身不持有任何 segment 选择; 选择列表在 [`run_export`] 调用时给出.
#[derive(Debug)]
pub struct ExportRequest<'a> {
    /// 待统计的 CT 扫描.
    pub scan: &'a HuVolume,

    /// 扫描的人类可读名, 仅用于输出文件名构建.
    pub scan_name: &'a str,

    /// 体素索引到物理坐标的仿射变换.
    pub ijk_to_world: IjkToWorld,

    /// 输出目录. 假定已存在且可写.
    pub out_dir: &'a Path,

    /// CSV 数值格式.
    pub format: CsvFormat,
}

/// 批量导出错误.
#[derive(Debug)]
pub enum ExportError {
    /// 没有选择任何 segment. 该检查在任何文件 I/O 之前完成.
    NothingSelected,

    /// 写出 CSV 时的底层 I/O 错误. 该错误对整个批次是致命的.
    Io(io::Error),
}

/// 批量导出的结果报告.
#[derive(Debug)]
pub struct BatchReport {
    /// 成功导出的 segment 个数.
    pub exported: u32,

    /// 未在其容器中找到的 (容器名, segment 名) 列表.
    pub missing: Vec<(String, String)>,

    /// 输出目录.
    pub out_dir: PathBuf,
}

impl BatchReport {
    /// 人类可读的单行状态串, 报告成功个数和输出目录.
    pub fn status_line(&self) -> String {
        format!(
            "Exported {} segment(s) to {}",
            self.exported,
            self.out_dir.display()
        )
    }
}

/// 执行批量导出. 每个选择独立串行处理:
///
/// 1. `selections` 为空时立即返回 [`ExportError::NothingSelected`],
///   不触碰任何文件;
/// 2. segment 在其容器中不存在时记入报告的 `missing` 并继续处理后续选择;
/// 3. CSV 写出失败对整个批次致命, 原样上抛 I/O 错误
///   (此时已写出的文件保留在磁盘上);
/// 4. 输出文件名为三段形式 `{扫描名}_{容器名}_{segment 名}_statistics.csv`,
///   同名旧文件直接覆盖.
///
/// # 注意
///
/// 扫描和任一选中 mask 的形状不一致时程序 panic.
pub fn run_export(
    request: &ExportRequest,
    selections: &[Selection],
) -> Result<BatchReport, ExportError> {
    if selections.is_empty() {
        return Err(ExportError::NothingSelected);
    }

    let mut report = BatchReport {
        exported: 0,
        missing: Vec::new(),
        out_dir: request.out_dir.to_owned(),
    };

    for sel in selections {
        let Some(mask) = sel.segmentation.mask_of(sel.segment) else {
            report
                .missing
                .push((sel.segmentation.name().to_owned(), sel.segment.to_owned()));
            continue;
        };

        let records = slice_hu_stats(request.scan, mask, &request.ijk_to_world);
        let filename =
            statistics_filename(request.scan_name, Some(sel.segmentation.name()), sel.segment);
        export_slice_stats_csv(request.out_dir.join(filename), &records, request.format)
            .map_err(ExportError::Io)?;
        report.exported += 1;
    }

    Ok(report)
}

/// 默认导出目录, 即用户主目录.
#[inline]
pub fn default_export_dir() -> Option<PathBuf> {
    dirs::home_dir()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::{CsvFormat, CsvStyle};
    use ndarray::Array3;

    fn scratch_dir(tag: &str) -> PathBuf {
        let mut d = std::env::temp_dir();
        d.push(format!("hu-berry-batch-{tag}-{}", std::process::id()));
        std::fs::create_dir_all(&d).unwrap();
        d
    }

    /// 2x2x2 扫描和一个含 liver/tumor 两个 segment 的容器.
    fn demo_scene() -> (HuVolume, Segmentation) {
        let mut scan = Array3::<f32>::zeros((2, 2, 2));
        scan[(0, 0, 0)] = 50.0;
        scan[(1, 1, 1)] = 70.0;

        let mut liver = Array3::<u8>::zeros((2, 2, 2));
        liver[(0, 0, 0)] = 1;
        let mut tumor = Array3::<u8>::zeros((2, 2, 2));
        tumor[(1, 1, 1)] = 1;

        let mut seg = Segmentation::new("seg");
        seg.push_segment("liver", RoiMask::from_array(liver));
        seg.push_segment("tumor", RoiMask::from_array(tumor));
        (HuVolume::from_array(scan), seg)
    }

    #[test]
    fn test_segmentation_lookup() {
        let (_, seg) = demo_scene();
        assert_eq!(seg.len(), 2);
        assert!(!seg.is_empty());
        assert_eq!(seg.segment_names().collect::<Vec<_>>(), ["liver", "tumor"]);
        assert!(seg.mask_of("liver").is_some());
        assert!(seg.mask_of("spleen").is_none());
    }

    #[test]
    fn test_from_labelmap_splits_positive_values() {
        let mut labelmap = Array3::<u8>::zeros((2, 2, 2));
        labelmap[(0, 0, 0)] = 1;
        labelmap[(0, 0, 1)] = 2;
        labelmap[(1, 0, 0)] = 2;

        let seg = Segmentation::from_labelmap("seg", labelmap.view());
        assert_eq!(
            seg.segment_names().collect::<Vec<_>>(),
            ["label-1", "label-2"]
        );
        assert_eq!(seg.mask_of("label-1").unwrap().region_count(), 1);
        assert_eq!(seg.mask_of("label-2").unwrap().region_count(), 2);

        let empty = Segmentation::from_labelmap("bg", Array3::<u8>::zeros((1, 1, 1)).view());
        assert!(empty.is_empty());
    }

    #[test]
    fn test_nothing_selected_aborts_before_io() {
        let (scan, _) = demo_scene();
        let dir = scratch_dir("empty");
        let request = ExportRequest {
            scan: &scan,
            scan_name: "ct",
            ijk_to_world: IjkToWorld::identity(),
            out_dir: &dir,
            format: CsvFormat::new(CsvStyle::PointComma),
        };

        let err = run_export(&request, &[]).unwrap_err();
        assert!(matches!(err, ExportError::NothingSelected));
        assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 0);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_batch_continues_past_missing_segment() {
        let (scan, seg) = demo_scene();
        let dir = scratch_dir("partial");
        let request = ExportRequest {
            scan: &scan,
            scan_name: "ct",
            ijk_to_world: IjkToWorld::identity(),
            out_dir: &dir,
            format: CsvFormat::new(CsvStyle::CommaSemicolon),
        };

        // 3 个选择, 其中 1 个在容器中不存在.
        let selections = [
            Selection {
                segmentation: &seg,
                segment: "liver",
            },
            Selection {
                segmentation: &seg,
                segment: "spleen",
            },
            Selection {
                segmentation: &seg,
                segment: "tumor",
            },
        ];
        let report = run_export(&request, &selections).unwrap();

        assert_eq!(report.exported, 2);
        assert_eq!(report.missing, [("seg".to_owned(), "spleen".to_owned())]);
        assert!(report.status_line().starts_with("Exported 2 segment(s) to "));

        // 恰好 2 个输出文件, 文件名为三段形式.
        assert!(dir.join("ct_seg_liver_statistics.csv").is_file());
        assert!(dir.join("ct_seg_tumor_statistics.csv").is_file());
        assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 2);

        // liver segment 只有切片 0 非空: 表头 + 1 行.
        let content = std::fs::read_to_string(dir.join("ct_seg_liver_statistics.csv")).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(content.lines().nth(1).unwrap().starts_with("0;"));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
