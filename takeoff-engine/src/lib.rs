pub mod report;

pub mod errors {
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum EngineError {
        #[error("layout {name:?} not found and fallback is disabled")]
        LayoutNotFound { name: String },
        #[error("document has no layouts to place the report on")]
        NoLayouts,
        #[error("table cell ({row}, {column}) is out of range")]
        TableCellOutOfRange { row: u32, column: u32 },
    }
}

pub mod aggregate {
    use std::collections::BTreeMap;
    use std::fmt;

    use takeoff_core::document::{Document, Entity};
    use tracing::debug;

    /// 单个统计分组的累计值。块数与字符数是整数，长度与面积是浮点数。
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub enum MetricValue {
        Count(u64),
        Measure(f64),
    }

    impl fmt::Display for MetricValue {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                MetricValue::Count(value) => write!(f, "{value}"),
                MetricValue::Measure(value) => write!(f, "{value}"),
            }
        }
    }

    impl MetricValue {
        #[inline]
        pub fn as_f64(self) -> f64 {
            match self {
                MetricValue::Count(value) => value as f64,
                MetricValue::Measure(value) => value,
            }
        }
    }

    /// 分组键（块名或图层名）到累计值的映射。
    /// 只有至少贡献过一次的键才会出现；缺失键的零填充由报表负责。
    pub type MetricResult = BTreeMap<String, MetricValue>;

    /// 对模型空间做一次线性扫描。选择器同时承担类型过滤、
    /// 取键与取值：返回 `None` 表示跳过该实体（包括 `Other`），
    /// 这是有意的 best-effort 策略，扫描过程不产生错误。
    pub fn aggregate<F>(document: &Document, mut select: F) -> BTreeMap<String, f64>
    where
        F: FnMut(&Entity) -> Option<(&str, f64)>,
    {
        let mut buckets: BTreeMap<String, f64> = BTreeMap::new();
        for (_, entity) in document.entities() {
            if let Some((key, value)) = select(entity) {
                buckets
                    .entry(key.to_string())
                    .and_modify(|total| *total += value)
                    .or_insert(value);
            }
        }
        buckets
    }

    /// 四舍五入到 3 位小数。对已经是 3 位小数的值再次调用结果不变。
    #[inline]
    pub fn round3(value: f64) -> f64 {
        (value * 1000.0).round() / 1000.0
    }

    /// 各类型块的插入数量，键为块名称。
    pub fn block_counts(document: &Document) -> MetricResult {
        let buckets = aggregate(document, |entity| match entity {
            Entity::BlockReference(reference) => Some((reference.name.as_str(), 1.0)),
            _ => None,
        });
        let result: MetricResult = buckets
            .into_iter()
            .map(|(key, value)| (key, MetricValue::Count(value as u64)))
            .collect();
        debug!(buckets = result.len(), "块数量统计完成");
        result
    }

    /// 各图层多段线总长度，四舍五入到 3 位小数。
    pub fn polyline_lengths(document: &Document) -> MetricResult {
        let buckets = aggregate(document, |entity| match entity {
            Entity::Polyline(polyline) => Some((polyline.layer.as_str(), polyline.length())),
            _ => None,
        });
        let result: MetricResult = buckets
            .into_iter()
            .map(|(key, value)| (key, MetricValue::Measure(round3(value))))
            .collect();
        debug!(buckets = result.len(), "多段线长度统计完成");
        result
    }

    /// 各图层单行文字的字符总数。
    pub fn text_char_counts(document: &Document) -> MetricResult {
        let buckets = aggregate(document, |entity| match entity {
            Entity::Text(text) => Some((text.layer.as_str(), text.char_count() as f64)),
            _ => None,
        });
        let result: MetricResult = buckets
            .into_iter()
            .map(|(key, value)| (key, MetricValue::Count(value as u64)))
            .collect();
        debug!(buckets = result.len(), "文字字符数统计完成");
        result
    }

    /// 各图层填充总面积，四舍五入到 3 位小数。面积取宿主携带的值。
    pub fn hatch_areas(document: &Document) -> MetricResult {
        let buckets = aggregate(document, |entity| match entity {
            Entity::Hatch(hatch) => Some((hatch.layer.as_str(), hatch.area)),
            _ => None,
        });
        let result: MetricResult = buckets
            .into_iter()
            .map(|(key, value)| (key, MetricValue::Measure(round3(value))))
            .collect();
        debug!(buckets = result.len(), "填充面积统计完成");
        result
    }

    /// 所有分组的合计，供控制台输出使用。
    pub fn total(result: &MetricResult) -> f64 {
        result.values().map(|value| value.as_f64()).sum()
    }

}
