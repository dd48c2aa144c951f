//! 将 nii 格式的 CT 扫描按 labelmap 区域批量导出为逐切片 HU 统计 CSV.
//!
//! 每个 labelmap 文件作为一个分割容器, 按正标签值拆分为若干 segment
//! (LiTS 惯例下 `label-1` 为肝脏, `label-2` 为肿瘤). 缺省导出所有
//! segment, `--segment` 可以限定导出的 segment 名.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;

use hu_berry::prelude::*;

/// Per-slice ROI HU statistics exporter.
///
/// Computes per-axial-slice HU statistics of a CT volume restricted to each
/// segment of the given labelmap(s), and writes one CSV file per segment.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// CT volume (.nii file).
    #[arg(long)]
    volume: PathBuf,

    /// Labelmap (.nii file); may be given multiple times. Each file acts as
    /// one segmentation container, split into segments by positive label
    /// value.
    #[arg(long = "labelmap", required = true)]
    labelmaps: Vec<PathBuf>,

    /// Output directory. Defaults to the home directory.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Use a comma as decimal separator (fields are then delimited by
    /// semicolons).
    #[arg(long)]
    decimal_comma: bool,

    /// Only export segments with this name; may be given multiple times.
    /// Defaults to every segment of every labelmap.
    #[arg(long = "segment")]
    segments: Vec<String>,
}

/// 文件名主干, 用于构建体积名和容器名.
fn stem_of(path: &Path) -> &str {
    path.file_stem().and_then(|s| s.to_str()).unwrap_or("unnamed")
}

fn main() -> ExitCode {
    let args = Args::parse();

    // 前置校验全部在任何导出 I/O 之前完成.
    let scan = match HuVolume::open(&args.volume) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("Cannot open CT volume {}: {e:?}", args.volume.display());
            return ExitCode::FAILURE;
        }
    };
    let ijk_to_world = IjkToWorld::from_nifti_header(
        scan.header().expect("volume loaded from nii always has a header"),
    );

    let mut segmentations = Vec::with_capacity(args.labelmaps.len());
    for path in &args.labelmaps {
        match open_labelmap(path) {
            Ok(labelmap) => {
                segmentations.push(Segmentation::from_labelmap(stem_of(path), labelmap.view()));
            }
            Err(e) => {
                eprintln!("Cannot open labelmap {}: {e:?}", path.display());
                return ExitCode::FAILURE;
            }
        }
    }

    let out_dir = match args.out.or_else(default_export_dir) {
        Some(d) => d,
        None => {
            eprintln!("No output directory given and no home directory found.");
            return ExitCode::FAILURE;
        }
    };
    assert!(out_dir.is_dir(), "output directory does not exist");

    // 缺省导出全部 segment; 指定 --segment 时按名字在每个容器中选择,
    // 任何容器中都不存在的名字会走 "未找到" 路径而不中断批次.
    let mut selections = Vec::new();
    for seg in &segmentations {
        if args.segments.is_empty() {
            selections.extend(seg.segment_names().map(|name| Selection {
                segmentation: seg,
                segment: name,
            }));
        } else {
            selections.extend(args.segments.iter().map(|name| Selection {
                segmentation: seg,
                segment: name.as_str(),
            }));
        }
    }

    let request = ExportRequest {
        scan: &scan,
        scan_name: stem_of(&args.volume),
        ijk_to_world,
        out_dir: &out_dir,
        format: CsvFormat::new(CsvStyle::from_decimal_comma(args.decimal_comma)),
    };

    match run_export(&request, &selections) {
        Ok(report) => {
            for (container, segment) in &report.missing {
                println!("Segment '{segment}' not found in '{container}'.");
            }
            println!("{}", report.status_line());
            ExitCode::SUCCESS
        }
        Err(ExportError::NothingSelected) => {
            println!("A Segment needs to be selected!");
            ExitCode::FAILURE
        }
        Err(ExportError::Io(e)) => {
            eprintln!("Export failed: {e}");
            ExitCode::FAILURE
        }
    }
}
