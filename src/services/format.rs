//! 展示格式化工具
//!
//! 只用于展示：缺失值显示为占位符 `-`，不参与任何聚合计算

use chrono::{NaiveDate, Utc};
use chrono_tz::Asia::Shanghai;
use regex::Regex;
use std::sync::OnceLock;

/// 缺失值占位符
pub const PLACEHOLDER: &str = "-";

/// 获取北京时间当天日期
pub fn beijing_today() -> NaiveDate {
    Utc::now().with_timezone(&Shanghai).date_naive()
}

/// 金额/费率：保留两位小数
pub fn format_fixed(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.2}", v))
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

/// 人数类：取整并按千分位分组
pub fn format_count(value: Option<f64>) -> String {
    value
        .map(|v| group_thousands(v.round() as i64))
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

/// 人数周变化，正数带 `+`
pub fn format_signed_count(value: Option<f64>) -> String {
    match value {
        Some(v) if v.round() > 0.0 => format!("+{}", group_thousands(v.round() as i64)),
        other => format_count(other),
    }
}

/// 金额周变化，正数带 `+`
pub fn format_signed_fixed(value: Option<f64>) -> String {
    match value {
        Some(v) if v > 0.0 => format!("+{:.2}", v),
        other => format_fixed(other),
    }
}

/// 整数千分位分组，如 1234567 -> 1,234,567
pub fn group_thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);

    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if n < 0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

/// 去掉基金代码的交易所后缀（.SZ/.SH/.BJ）
pub fn strip_exchange_suffix(code: &str) -> &str {
    static SUFFIX: OnceLock<Regex> = OnceLock::new();
    let re = SUFFIX.get_or_init(|| Regex::new(r"(?i)\.(SZ|SH|BJ)$").unwrap());

    match re.find(code) {
        Some(m) => &code[..m.start()],
        None => code,
    }
}

/// 简化基金公司名称：截断到后缀标记首次出现的位置
///
/// 如 "华夏基金管理有限公司" 在标记 "基金" 处截断为 "华夏"。
/// 全称缺失时退回简称。
pub fn simplify_manager(full_name: &str, short_name: Option<&str>, suffix_token: &str) -> String {
    let full_name = full_name.trim();
    if full_name.is_empty() {
        return short_name
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(PLACEHOLDER)
            .to_string();
    }

    match full_name.find(suffix_token) {
        Some(pos) if pos > 0 && !suffix_token.is_empty() => full_name[..pos].to_string(),
        _ => full_name.to_string(),
    }
}

/// 转义 HTML 特殊字符
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Markdown 表格单元格转义
pub fn markdown_cell(s: &str) -> String {
    s.replace('|', "\\|").replace('\n', " ")
}

/// 报告日期格式 YYYY.MM.DD
pub fn report_date(date: NaiveDate) -> String {
    date.format("%Y.%m.%d").to_string()
}
