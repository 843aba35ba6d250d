//! JS 执行器 - 基础设施层
//!
//! 持有 page，暴露"执行 JS"以及基于 JS 的表单操作

use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use crate::error::PageError;

/// JS 执行器
///
/// 职责：
/// - 持有 Page 资源
/// - 暴露 eval() 能力
/// - 提供填写 / 选择 / 读取文件数这类 DOM 操作
pub struct JsExecutor {
    page: Page,
}

impl JsExecutor {
    /// 创建新的 JS 执行器
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// 获取 page 的引用（用于其他操作）
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// 执行 JS 代码并返回 JSON 结果
    pub async fn eval(&self, js_code: impl Into<String>) -> Result<JsonValue, PageError> {
        let result = self.page.evaluate(js_code.into()).await?;
        result
            .into_value()
            .map_err(|e| PageError::Cdp(format!("无法读取 JS 返回值: {}", e)))
    }

    /// 执行 JS 代码并反序列化为指定类型
    pub async fn eval_as<T: DeserializeOwned>(
        &self,
        js_code: impl Into<String>,
    ) -> Result<T, PageError> {
        let json_value = self.eval(js_code).await?;
        serde_json::from_value(json_value)
            .map_err(|e| PageError::Cdp(format!("JS 返回值类型不符: {}", e)))
    }

    /// 设置输入框 / 下拉框的值并触发 input、change 事件
    pub async fn set_value(&self, selector: &str, value: &str) -> Result<(), PageError> {
        let js_code = format!(
            r#"
            (() => {{
                const el = document.querySelector({selector});
                if (!el) return false;
                el.value = {value};
                el.dispatchEvent(new Event('input', {{ bubbles: true }}));
                el.dispatchEvent(new Event('change', {{ bubbles: true }}));
                return true;
            }})()
            "#,
            selector = js_string(selector),
            value = js_string(value),
        );

        if self.eval_as::<bool>(js_code).await? {
            Ok(())
        } else {
            Err(PageError::NotFound {
                selector: selector.to_string(),
            })
        }
    }

    /// 读取 `<input type=file>` 的文件数
    pub async fn file_count(&self, selector: &str) -> Result<usize, PageError> {
        let js_code = format!(
            r#"
            (() => {{
                const el = document.querySelector({selector});
                return el && el.files ? el.files.length : -1;
            }})()
            "#,
            selector = js_string(selector),
        );

        let count: i64 = self.eval_as(js_code).await?;
        usize::try_from(count).map_err(|_| PageError::NotFound {
            selector: selector.to_string(),
        })
    }

    /// `document.readyState`
    pub async fn ready_state(&self) -> Result<String, PageError> {
        self.eval_as("document.readyState").await
    }
}

/// 转成 JS 字符串字面量
fn js_string(value: &str) -> String {
    JsonValue::String(value.to_string()).to_string()
}
