use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use url::Url;

use crate::error::InputError;

/// 从表格文件的第一个工作表中读取所有 URL
///
/// 逐行遍历所有非空单元格，能解析为绝对 URL 的保留，其余静默跳过
pub async fn load_uris_from_spreadsheet(path: &Path) -> Result<Vec<Url>, InputError> {
    let path_display = path.display().to_string();
    if !path.exists() {
        return Err(InputError::NotFound { path: path_display });
    }

    let owned = path.to_path_buf();
    let cells = tokio::task::spawn_blocking(move || read_first_sheet_cells(&owned))
        .await
        .map_err(|e| InputError::read_failed(&path_display, e))??;

    tracing::debug!("从 {} 读取到 {} 个非空单元格", path_display, cells.len());

    let uris = extract_uris(cells);
    tracing::info!("✓ 从 {} 中找到 {} 个URL", path_display, uris.len());

    Ok(uris)
}

/// 只保留能解析为带主机名 URL 的单元格内容
///
/// `Region: East` 这类标签也能被解析成无主机的 URL，需要排除
pub fn extract_uris<I, S>(cells: I) -> Vec<Url>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    cells
        .into_iter()
        .filter_map(|cell| Url::parse(cell.as_ref().trim()).ok())
        .filter(Url::has_host)
        .collect()
}

fn read_first_sheet_cells(path: &Path) -> Result<Vec<String>, InputError> {
    let path_display = path.display().to_string();
    let mut workbook =
        open_workbook_auto(path).map_err(|e| InputError::read_failed(&path_display, e))?;

    let first_sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| InputError::NoWorksheet {
            path: path_display.clone(),
        })?;

    let range = workbook
        .worksheet_range(&first_sheet)
        .map_err(|e| InputError::read_failed(&path_display, e))?;

    let cells = range
        .rows()
        .flat_map(|row| row.iter())
        .filter(|cell| !matches!(cell, Data::Empty))
        .map(|cell| cell.to_string())
        .collect();

    Ok(cells)
}
