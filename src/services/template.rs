//! 提示词展开服务
//!
//! 源值为外层循环、模板为内层循环，结果表格按这个顺序重建每一行

use crate::error::{AppResult, PipelineError};
use crate::models::template::{Prompt, QueryTemplate};

/// 把每个源值代入每个已选模板
///
/// # 参数
/// - `source_values`: 所选行/列的非空值
/// - `templates`: 已选模板（不能为空）
/// - `placeholder`: 占位符
///
/// # 返回
/// `source_values.len() * templates.len()` 条提示词，源值优先排序
pub fn expand(
    source_values: &[String],
    templates: &[&QueryTemplate],
    placeholder: &str,
) -> AppResult<Vec<Prompt>> {
    if templates.is_empty() {
        return Err(PipelineError::NoQuerySelected.into());
    }

    let mut prompts = Vec::with_capacity(source_values.len() * templates.len());
    for (source_index, value) in source_values.iter().enumerate() {
        for (template_index, template) in templates.iter().enumerate() {
            prompts.push(Prompt {
                template: template.text.clone(),
                text: template.text.replacen(placeholder, value, 1),
                source_value: value.clone(),
                source_index,
                template_index,
            });
        }
    }

    Ok(prompts)
}
