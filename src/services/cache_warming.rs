//! 缓存预热服务 - 业务能力层
//!
//! 对 sheet 及其直接子对象同时请求 layout，等待整批完成。
//! 只要有一个对象失败，整批视为失败：只算出一半可视化的缓存没有意义。
//! 本服务不做任何选择操作，调用前应已完成选择回放。

use std::time::Duration;

use futures::future::{join_all, try_join_all};
use tracing::debug;

use crate::error::{EngineError, WarmError};
use crate::infrastructure::{AppSession, GenericObject};

/// 一次成功预热的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WarmReport {
    /// 返回 layout 的对象数量（sheet + 子对象）
    pub objects: usize,
}

/// 定位 sheet 及其直接子对象
pub async fn locate_sheet<A: AppSession>(
    app: &A,
    sheet_id: &str,
) -> Result<(A::Object, Vec<A::Object>), EngineError> {
    let sheet = app.object(sheet_id).await?;
    let child_ids = sheet.child_ids().await?;
    let children = try_join_all(child_ids.iter().map(|id| app.object(id))).await?;
    debug!("sheet {} 共有 {} 个子对象", sheet_id, children.len());
    Ok((sheet, children))
}

/// 同时请求所有对象的 layout
///
/// `timeout` 限制整批请求的总时长
pub async fn warm<O: GenericObject>(
    sheet: &O,
    children: &[O],
    timeout: Option<Duration>,
) -> Result<WarmReport, WarmError> {
    let objects: Vec<&O> = std::iter::once(sheet).chain(children.iter()).collect();
    let total = objects.len();

    let batch = join_all(objects.iter().map(|object| async move {
        object
            .layout()
            .await
            .map_err(|e| format!("{}: {}", object.id(), e))
    }));

    let results = match timeout {
        Some(limit) => tokio::time::timeout(limit, batch)
            .await
            .map_err(|_| WarmError::TimedOut {
                seconds: limit.as_secs(),
                total,
            })?,
        None => batch.await,
    };

    let failures: Vec<String> = results.into_iter().filter_map(Result::err).collect();
    if !failures.is_empty() {
        return Err(WarmError::Incomplete {
            failed: failures.len(),
            total,
            failures,
        });
    }

    Ok(WarmReport { objects: total })
}
