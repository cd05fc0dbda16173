//! ETF 数据模型
//!
//! 定义上游搜索接口返回的 ETF 记录、指数分组以及四种搜索结果形态：
//! - 跟踪指数名称搜索（按指数分组）
//! - 基金公司名称搜索
//! - ETF 基金代码搜索（单指数 + 关联 ETF）
//! - 通用搜索
//!
//! 上游数值字段可能缺失、为 null 或为非法字符串，统一解析为 `None`，
//! 聚合时按 0 处理，展示时显示为 `-`。

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::errors::RenderError;

/// 跟踪指数名称搜索标签
pub const SEARCH_TYPE_INDEX_NAME: &str = "跟踪指数名称";
/// 基金公司名称搜索标签
pub const SEARCH_TYPE_COMPANY: &str = "基金公司名称";
/// ETF 基金代码搜索标签
pub const SEARCH_TYPE_CODE: &str = "ETF基金代码";

/// 单只 ETF 在某个快照日的指标
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct EtfRecord {
    /// 基金代码（可能带 .SZ/.SH/.BJ 后缀）
    #[serde(default, deserialize_with = "lenient_string")]
    pub code: String,
    /// 基金简称
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    /// 基金管理人全称
    #[serde(default, alias = "manager", deserialize_with = "lenient_string")]
    pub manager_full_name: String,
    /// 基金管理人简称
    #[serde(default, deserialize_with = "lenient_optional_string")]
    pub manager_short_name: Option<String>,
    /// 跟踪指数代码
    #[serde(default, deserialize_with = "lenient_string")]
    pub tracking_index_code: String,
    /// 跟踪指数名称
    #[serde(default, deserialize_with = "lenient_string")]
    pub tracking_index_name: String,
    /// 是否商务品
    #[serde(default, rename = "is_business", alias = "is_business_product", deserialize_with = "lenient_bool")]
    pub is_business_product: bool,
    /// 商务品展示文字
    #[serde(default, deserialize_with = "lenient_string")]
    pub business_label: String,
    /// 日均成交额（亿元）
    #[serde(default, deserialize_with = "lenient_number")]
    pub daily_avg_volume: Option<f64>,
    /// 管理费率（%）
    #[serde(default, rename = "management_fee_rate", deserialize_with = "lenient_number")]
    pub management_fee_rate_pct: Option<f64>,
    /// 基金规模（亿元）
    #[serde(default, rename = "fund_size", deserialize_with = "lenient_number")]
    pub fund_size_yuan_100m: Option<f64>,
    /// 关注人数
    #[serde(default, deserialize_with = "lenient_number")]
    pub attention_count: Option<f64>,
    /// 关注人数周变化
    #[serde(default, rename = "attention_change", deserialize_with = "lenient_number")]
    pub attention_weekly_delta: Option<f64>,
    /// 持有人数
    #[serde(default, deserialize_with = "lenient_number")]
    pub holders_count: Option<f64>,
    /// 持有人数周变化
    #[serde(default, rename = "holders_change", deserialize_with = "lenient_number")]
    pub holders_weekly_delta: Option<f64>,
    /// 持有金额（亿元）
    #[serde(default, rename = "holding_amount", deserialize_with = "lenient_number")]
    pub holding_amount_yuan_100m: Option<f64>,
    /// 持有金额周变化
    #[serde(default, rename = "holding_amount_change", deserialize_with = "lenient_number")]
    pub holding_amount_weekly_delta: Option<f64>,
}

impl EtfRecord {
    // 聚合取值：缺失按 0 处理

    pub fn volume(&self) -> f64 {
        self.daily_avg_volume.unwrap_or(0.0)
    }

    pub fn fee_rate(&self) -> f64 {
        self.management_fee_rate_pct.unwrap_or(0.0)
    }

    pub fn fund_size(&self) -> f64 {
        self.fund_size_yuan_100m.unwrap_or(0.0)
    }
}

/// 跟踪同一指数的一组 ETF
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct IndexGroup {
    #[serde(default, deserialize_with = "lenient_string")]
    pub index_code: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub index_name: String,
    /// 指数简介
    #[serde(default, rename = "index_intro")]
    pub index_description: Option<String>,
    /// 总规模（亿元）
    #[serde(default, rename = "total_scale", deserialize_with = "lenient_number")]
    pub total_scale_yuan_100m: Option<f64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub etf_count: Option<u64>,
    #[serde(default, rename = "etfs", deserialize_with = "nullable_list")]
    pub records: Vec<EtfRecord>,
}

impl IndexGroup {
    pub fn total_scale(&self) -> f64 {
        self.total_scale_yuan_100m.unwrap_or(0.0)
    }

    /// 上游未给出数量时按记录数计
    pub fn etf_count(&self) -> u64 {
        self.etf_count.unwrap_or(self.records.len() as u64)
    }
}

/// 代码搜索命中的指数概况
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexProfile {
    pub index_code: String,
    pub index_name: String,
    pub index_description: Option<String>,
    pub total_scale_yuan_100m: Option<f64>,
    pub etf_count: Option<u64>,
}

/// 上游搜索接口原始响应
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct SearchResponse {
    /// 搜索类型标签
    #[serde(default)]
    pub search_type: Option<String>,
    #[serde(default)]
    pub keyword: Option<String>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub count: Option<u64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub index_count: Option<u64>,
    #[serde(default)]
    pub index_groups: Option<Vec<IndexGroup>>,
    #[serde(default)]
    pub index_name: Option<String>,
    #[serde(default)]
    pub index_code: Option<String>,
    #[serde(default)]
    pub index_intro: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub total_scale: Option<f64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub etf_count: Option<u64>,
    #[serde(default)]
    pub results: Option<Vec<EtfRecord>>,
    #[serde(default)]
    pub related_etfs: Option<Vec<EtfRecord>>,
    /// 数据截止日期
    #[serde(default)]
    pub data_date: Option<String>,
    /// 上游错误信息，存在时不再渲染
    #[serde(default)]
    pub error: Option<String>,
}

/// 搜索结果的四种形态
#[derive(Debug, Clone, PartialEq)]
pub enum SearchKind {
    IndexName {
        index_groups: Vec<IndexGroup>,
    },
    Company {
        records: Vec<EtfRecord>,
    },
    Code {
        profile: IndexProfile,
        records: Vec<EtfRecord>,
        related_records: Vec<EtfRecord>,
    },
    Generic {
        records: Vec<EtfRecord>,
    },
}

/// 一次搜索的完整结果
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub keyword: Option<String>,
    pub data_date: Option<String>,
    pub count: Option<u64>,
    pub index_count: Option<u64>,
    pub kind: SearchKind,
}

impl SearchResult {
    /// 从上游响应构建搜索结果
    ///
    /// 响应中带 `error` 字段时直接返回错误，不进入归一化流程。
    pub fn from_response(response: SearchResponse) -> Result<Self, RenderError> {
        if let Some(message) = response.error.filter(|m| !m.trim().is_empty()) {
            return Err(RenderError::Upstream(message));
        }

        let kind = match response.search_type.as_deref() {
            Some(SEARCH_TYPE_INDEX_NAME) => SearchKind::IndexName {
                index_groups: response.index_groups.unwrap_or_default(),
            },
            Some(SEARCH_TYPE_COMPANY) => SearchKind::Company {
                records: response.results.unwrap_or_default(),
            },
            Some(SEARCH_TYPE_CODE) => SearchKind::Code {
                profile: IndexProfile {
                    index_code: response.index_code.unwrap_or_default(),
                    index_name: response.index_name.unwrap_or_default(),
                    index_description: response.index_intro,
                    total_scale_yuan_100m: response.total_scale,
                    etf_count: response.etf_count,
                },
                records: response.results.unwrap_or_default(),
                related_records: response.related_etfs.unwrap_or_default(),
            },
            _ => SearchKind::Generic {
                records: response.results.unwrap_or_default(),
            },
        };

        Ok(Self {
            keyword: response.keyword.filter(|k| !k.trim().is_empty()),
            data_date: response.data_date.filter(|d| !d.trim().is_empty()),
            count: response.count,
            index_count: response.index_count,
            kind,
        })
    }

    /// 搜索类型标签，用于日志
    pub fn type_label(&self) -> &'static str {
        match self.kind {
            SearchKind::IndexName { .. } => SEARCH_TYPE_INDEX_NAME,
            SearchKind::Company { .. } => SEARCH_TYPE_COMPANY,
            SearchKind::Code { .. } => SEARCH_TYPE_CODE,
            SearchKind::Generic { .. } => "通用搜索",
        }
    }

    /// 在结果中查找指数简介
    pub fn find_index_description(&self, index_code: &str) -> Option<&str> {
        fn non_empty(d: &Option<String>) -> Option<&str> {
            d.as_deref().filter(|s| !s.trim().is_empty())
        }

        match &self.kind {
            SearchKind::IndexName { index_groups } => index_groups
                .iter()
                .filter(|g| g.index_code == index_code)
                .find_map(|g| non_empty(&g.index_description)),
            SearchKind::Code { profile, .. } if profile.index_code == index_code => {
                non_empty(&profile.index_description)
            }
            _ => None,
        }
    }
}

/// 将 JSON 值解析为有限浮点数
pub fn number_from_value(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', "").parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|v| v.is_finite())
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(number_from_value))
}

fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(number_from_value)
        .filter(|v| *v >= 0.0)
        .map(|v| v.round() as u64))
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    })
}

fn lenient_optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Bool(b)) => b,
        Some(Value::Number(n)) => n.as_f64().map(|v| v != 0.0).unwrap_or(false),
        Some(Value::String(s)) => matches!(s.trim(), "是" | "true" | "True" | "1" | "Y"),
        _ => false,
    })
}

fn nullable_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
