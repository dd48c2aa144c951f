//! 🍊欢迎光临🍋
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::{Idx2d, Idx3d};

pub use crate::data::{open_labelmap, HuVolume, IjkToWorld, RoiMask, Shaped3d};

pub use crate::stats::{slice_hu_stats, SliceHuStats};

pub use crate::export::{
    export_slice_stats_csv, sanitize_name, statistics_filename, write_slice_stats, CsvFormat,
    CsvStyle,
};

pub use crate::batch::{
    default_export_dir, run_export, BatchReport, ExportError, ExportRequest, Segmentation,
    Selection,
};

pub use crate::consts::{CSV_COLUMNS, CSV_DECIMAL_PLACES};
