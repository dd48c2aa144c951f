//! 输出文件名的构建与清洗.

use crate::consts::{ILLEGAL_FILENAME_CHARS, STATISTICS_SUFFIX};

/// 去除 `name` 中常见文件系统的非法字符: `< > : " / \ | ? * '`.
///
/// 其余字符 (含 Unicode) 原样保留. 所有用户提供的名字片段
/// (体积名, 分割容器名, segment 名) 在进入文件名前都应经过该清洗.
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .filter(|c| !ILLEGAL_FILENAME_CHARS.contains(c))
        .collect()
}

/// 构建统计输出文件名.
///
/// 三段形式为 `{volume}_{container}_{segment}_statistics.csv`.
/// 当仅使用单一分割来源时 `container` 传 `None`, 得到两段变体
/// `{volume}_{segment}_statistics.csv`. 每个片段都先经过 [`sanitize_name`].
pub fn statistics_filename(volume: &str, container: Option<&str>, segment: &str) -> String {
    let volume = sanitize_name(volume);
    let segment = sanitize_name(segment);
    match container {
        Some(c) => {
            let container = sanitize_name(c);
            format!("{volume}_{container}_{segment}{STATISTICS_SUFFIX}")
        }
        None => format!("{volume}_{segment}{STATISTICS_SUFFIX}"),
    }
}
