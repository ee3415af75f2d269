//! 查询模板与展开后的提示词

use crate::error::{AppResult, PipelineError};

/// 默认占位符
pub const DEFAULT_PLACEHOLDER: &str = "{{input}}";

/// 查询模板
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTemplate {
    pub text: String,
    /// 是否被勾选参与批处理
    pub selected: bool,
    /// 由哪个基础模板改写而来；`None` 表示本身就是基础模板
    pub derived_from: Option<String>,
}

impl QueryTemplate {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            selected: true,
            derived_from: None,
        }
    }

    pub fn is_variation(&self) -> bool {
        self.derived_from.is_some()
    }
}

/// 模板集合：基础模板 + 改写得到的模板
///
/// 勾选状态与是否由改写生成相互独立
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSet {
    placeholder: String,
    templates: Vec<QueryTemplate>,
}

impl Default for TemplateSet {
    fn default() -> Self {
        Self::new(DEFAULT_PLACEHOLDER)
    }
}

impl TemplateSet {
    pub fn new(placeholder: impl Into<String>) -> Self {
        Self {
            placeholder: placeholder.into(),
            templates: Vec::new(),
        }
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    pub fn templates(&self) -> &[QueryTemplate] {
        &self.templates
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// 检查模板是否恰好包含一个占位符
    pub fn validate(&self, text: &str) -> AppResult<()> {
        if text.matches(self.placeholder.as_str()).count() != 1 {
            return Err(PipelineError::InvalidTemplate {
                template: text.to_string(),
                placeholder: self.placeholder.clone(),
            }
            .into());
        }
        Ok(())
    }

    /// 添加基础模板，返回其索引
    pub fn add(&mut self, text: impl Into<String>, selected: bool) -> AppResult<usize> {
        let text = text.into();
        self.validate(&text)?;
        self.templates.push(QueryTemplate {
            text,
            selected,
            derived_from: None,
        });
        Ok(self.templates.len() - 1)
    }

    /// 添加改写结果
    ///
    /// 不含占位符或与已有模板重复的改写会被丢弃，返回实际添加的数量
    pub fn add_variations(&mut self, base: &str, variations: &[String], selected: bool) -> usize {
        let mut added = 0;
        for variation in variations {
            if self.validate(variation).is_err()
                || self.templates.iter().any(|t| &t.text == variation)
            {
                continue;
            }
            self.templates.push(QueryTemplate {
                text: variation.clone(),
                selected,
                derived_from: Some(base.to_string()),
            });
            added += 1;
        }
        added
    }

    /// 设置勾选状态，索引越界时返回 false
    pub fn set_selected(&mut self, index: usize, selected: bool) -> bool {
        match self.templates.get_mut(index) {
            Some(template) => {
                template.selected = selected;
                true
            }
            None => false,
        }
    }

    /// 已勾选的模板（保持添加顺序）
    pub fn selected(&self) -> Vec<&QueryTemplate> {
        self.templates.iter().filter(|t| t.selected).collect()
    }

    /// 某个基础模板的全部改写
    pub fn variations_of(&self, base: &str) -> Vec<String> {
        self.templates
            .iter()
            .filter(|t| t.derived_from.as_deref() == Some(base))
            .map(|t| t.text.clone())
            .collect()
    }
}

/// 一个具体的提示词：源值代入模板后的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    /// 来源模板原文
    pub template: String,
    /// 代入后的文本
    pub text: String,
    /// 源值
    pub source_value: String,
    /// 源值序号
    pub source_index: usize,
    /// 模板序号
    pub template_index: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_rejects_template_without_single_placeholder() {
        let mut set = TemplateSet::default();
        assert!(set.add("Describe {{input}}", true).is_ok());
        assert!(set.add("No placeholder", true).is_err());
        assert!(set.add("{{input}} vs {{input}}", true).is_err());
        assert_eq!(set.templates().len(), 1);
    }

    #[test]
    fn test_selection_is_independent_of_origin() {
        let mut set = TemplateSet::default();
        set.add("Describe {{input}}", false).unwrap();
        let added = set.add_variations(
            "Describe {{input}}",
            &[
                "Explain {{input}}".to_string(),
                "Explain {{input}}".to_string(),
                "missing token".to_string(),
            ],
            true,
        );

        assert_eq!(added, 1);
        let selected = set.selected();
        assert_eq!(selected.len(), 1);
        assert!(selected[0].is_variation());
        assert_eq!(set.variations_of("Describe {{input}}"), vec!["Explain {{input}}"]);
    }

    #[test]
    fn test_custom_placeholder() {
        let mut set = TemplateSet::new("<X>");
        assert!(set.add("What is <X>?", true).is_ok());
        assert!(set.add("What is {{input}}?", true).is_err());
        assert!(!set.set_selected(5, true));
    }
}
