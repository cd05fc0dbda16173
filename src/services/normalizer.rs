//! 结果归一化
//!
//! 负责排序、汇总以及高亮选择，HTML 与 Markdown 两种输出共用同一套计算，
//! 保证两个视图的高亮和合计一致。
//!
//! 所有排序都在引用副本上进行，不修改输入顺序。

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::models::{EtfRecord, IndexGroup};

/// 一组 ETF 的汇总
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Summary {
    pub count: usize,
    /// 商务品数量
    pub business_count: usize,
    pub total_volume: f64,
    pub total_fee_rate: f64,
    pub total_fund_size: f64,
    pub total_attention: f64,
    pub total_attention_delta: f64,
    pub total_holders: f64,
    pub total_holders_delta: f64,
    pub total_holding_amount: f64,
    pub total_holding_amount_delta: f64,
    /// 平均费率，count 为 0 时为 0
    pub avg_fee_rate_pct: f64,
}

/// 高亮的基金代码
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Highlights {
    /// 规模最大
    pub max_size_code: Option<String>,
    /// 成交额最大
    pub max_volume_code: Option<String>,
    /// 费率最低（同费率取成交额最大）
    pub min_fee_code: Option<String>,
}

impl Highlights {
    pub fn is_max_size(&self, code: &str) -> bool {
        self.max_size_code.as_deref() == Some(code)
    }

    pub fn is_max_volume(&self, code: &str) -> bool {
        self.max_volume_code.as_deref() == Some(code)
    }

    pub fn is_min_fee(&self, code: &str) -> bool {
        self.min_fee_code.as_deref() == Some(code)
    }

    /// 代码列：命中任意一项高亮即强调
    pub fn is_highlighted(&self, code: &str) -> bool {
        self.is_max_size(code) || self.is_max_volume(code) || self.is_min_fee(code)
    }
}

/// 对一组记录求和，缺失指标按 0 计
pub fn aggregate<'a, I>(records: I) -> Summary
where
    I: IntoIterator<Item = &'a EtfRecord>,
{
    let mut summary = Summary::default();

    for record in records {
        summary.count += 1;
        if record.is_business_product {
            summary.business_count += 1;
        }
        summary.total_volume += record.volume();
        summary.total_fee_rate += record.fee_rate();
        summary.total_fund_size += record.fund_size();
        summary.total_attention += record.attention_count.unwrap_or(0.0);
        summary.total_attention_delta += record.attention_weekly_delta.unwrap_or(0.0);
        summary.total_holders += record.holders_count.unwrap_or(0.0);
        summary.total_holders_delta += record.holders_weekly_delta.unwrap_or(0.0);
        summary.total_holding_amount += record.holding_amount_yuan_100m.unwrap_or(0.0);
        summary.total_holding_amount_delta += record.holding_amount_weekly_delta.unwrap_or(0.0);
    }

    summary.avg_fee_rate_pct = if summary.count > 0 {
        summary.total_fee_rate / summary.count as f64
    } else {
        0.0
    };

    summary
}

/// 选出规模最大、成交额最大、费率最低三类高亮
///
/// 并列时取输入顺序中第一个出现的记录。
/// 费率缺失的记录不参与最低费率比较；只有一条记录时它就是最低费率。
pub fn select_highlights(records: &[&EtfRecord]) -> Highlights {
    if records.is_empty() {
        return Highlights::default();
    }

    if records.len() == 1 {
        let code = Some(records[0].code.clone());
        return Highlights {
            max_size_code: code.clone(),
            max_volume_code: code.clone(),
            min_fee_code: code,
        };
    }

    Highlights {
        max_size_code: first_max_by(records, EtfRecord::fund_size).map(|r| r.code.clone()),
        max_volume_code: first_max_by(records, EtfRecord::volume).map(|r| r.code.clone()),
        min_fee_code: min_fee_record(records).map(|r| r.code.clone()),
    }
}

fn first_max_by<'a>(records: &[&'a EtfRecord], key: fn(&EtfRecord) -> f64) -> Option<&'a EtfRecord> {
    let mut best: Option<&'a EtfRecord> = None;
    for &record in records {
        match best {
            Some(current) if key(record) <= key(current) => {}
            _ => best = Some(record),
        }
    }
    best
}

fn min_fee_record<'a>(records: &[&'a EtfRecord]) -> Option<&'a EtfRecord> {
    let min_fee = records
        .iter()
        .filter_map(|r| r.management_fee_rate_pct)
        .fold(None, |acc: Option<f64>, fee| match acc {
            Some(current) if current <= fee => Some(current),
            _ => Some(fee),
        })?;

    let candidates: Vec<&'a EtfRecord> = records
        .iter()
        .copied()
        .filter(|r| r.management_fee_rate_pct == Some(min_fee))
        .collect();

    first_max_by(&candidates, EtfRecord::volume)
}

fn descending(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

/// 按日均成交额降序排列（稳定排序）
pub fn sort_by_volume<'a, I>(records: I) -> Vec<&'a EtfRecord>
where
    I: IntoIterator<Item = &'a EtfRecord>,
{
    let mut sorted: Vec<&'a EtfRecord> = records.into_iter().collect();
    sorted.sort_by(|a, b| descending(a.volume(), b.volume()));
    sorted
}

/// 指数分组按总规模降序排列（稳定排序）
pub fn sort_groups(groups: &[IndexGroup]) -> Vec<&IndexGroup> {
    let mut sorted: Vec<&IndexGroup> = groups.iter().collect();
    sorted.sort_by(|a, b| descending(a.total_scale(), b.total_scale()));
    sorted
}

/// 合并两组记录，同一代码只保留第一次出现的记录
pub fn merge_unique<'a>(records: &'a [EtfRecord], related: &'a [EtfRecord]) -> Vec<&'a EtfRecord> {
    let mut seen = HashSet::new();
    let mut merged = Vec::with_capacity(records.len() + related.len());
    for record in records.iter().chain(related.iter()) {
        if seen.insert(record.code.as_str()) {
            merged.push(record);
        }
    }
    merged
}

/// 归一化后的一张表：排序后的记录、汇总、高亮
#[derive(Debug, Clone)]
pub struct NormalizedTable<'a> {
    pub records: Vec<&'a EtfRecord>,
    pub summary: Summary,
    pub highlights: Highlights,
}

impl<'a> NormalizedTable<'a> {
    pub fn build<I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a EtfRecord>,
    {
        // 高亮并列时按输入顺序取第一条，须在排序前选出
        let input: Vec<&'a EtfRecord> = records.into_iter().collect();
        let highlights = select_highlights(&input);
        let summary = aggregate(input.iter().copied());
        let records = sort_by_volume(input);
        Self {
            records,
            summary,
            highlights,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
