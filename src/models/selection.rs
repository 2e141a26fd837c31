//! 字段选择

use percent_encoding::percent_decode_str;

/// 一次字段选择
///
/// 由 `select` 参数解码得到：第一个逗号分隔的片段是字段名，其余是要选中的值
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// 字段名
    pub field: String,
    /// 要选中的值（保持 URL 中的顺序）
    pub values: Vec<String>,
}

/// 只清空、不添加选择的特殊值
pub const CLEAR_ALL: &str = "clearall";

impl Selection {
    /// 从 `select` 参数的原始值构建选择
    ///
    /// 解码后的值为 `clearall` 时返回 `None`
    pub fn from_query_value(raw: &str) -> Option<Self> {
        let decoded = decode_query_component(raw);
        if decoded == CLEAR_ALL {
            return None;
        }

        let mut parts = decoded.split(',').map(str::to_string);
        let field = parts.next().unwrap_or_default();
        Some(Self {
            field,
            values: parts.collect(),
        })
    }

    /// 按数值 / 文本分类后的值
    pub fn field_values(&self) -> Vec<FieldValue> {
        self.values.iter().map(|v| FieldValue::classify(v)).collect()
    }
}

/// 提交给引擎的字段值
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Numeric(f64),
    Text(String),
}

impl FieldValue {
    /// 能按十进制数解析的按数值匹配，否则按文本匹配
    pub fn classify(literal: &str) -> Self {
        match literal.parse::<f64>() {
            Ok(number) if number.is_finite() => FieldValue::Numeric(number),
            _ => FieldValue::Text(literal.to_string()),
        }
    }
}

/// 表单式 URL 解码（`+` 视为空格）
fn decode_query_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}
