//! 选择回放服务 - 业务能力层
//!
//! 先清空应用上的全部选择，再按配置中的顺序逐个字段重新选择。
//! 顺序决定最终的缓存状态，必须与 URL 中的顺序一致。

use tracing::debug;

use crate::error::ReplayError;
use crate::infrastructure::AppSession;
use crate::models::Configuration;
use crate::reporter::WarmReporter;

/// 在应用会话上回放配置中的选择
pub async fn apply_configuration<A, R>(
    app: &A,
    configuration: &Configuration,
    reporter: &R,
) -> Result<(), ReplayError>
where
    A: AppSession,
    R: WarmReporter + ?Sized,
{
    app.clear_all().await?;

    for selection in &configuration.selections {
        reporter.selection_applying(&selection.field, selection.values.len());

        let field = app
            .field(&selection.field)
            .await?
            .ok_or_else(|| ReplayError::FieldNotFound {
                field: selection.field.clone(),
            })?;

        let values = selection.field_values();
        let selected = app.select_values(&field, &values).await?;
        debug!(
            "字段 '{}' 选择 {} 个值, 引擎返回 {}",
            selection.field,
            values.len(),
            selected
        );
    }

    Ok(())
}
