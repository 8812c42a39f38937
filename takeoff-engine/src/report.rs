use takeoff_core::document::{Document, Layout};
use takeoff_core::geometry::{Point2, Vector2};
use tracing::debug;

use crate::aggregate::MetricResult;
use crate::errors::EngineError;

/// 默认插入游标起点与步进，沿用既有图纸上验证过的版面常数。
pub const DEFAULT_CURSOR_X: f64 = 0.05;
pub const DEFAULT_CURSOR_Y: f64 = 21.78;
pub const DEFAULT_CURSOR_STEP: f64 = 7.5;

const DEFAULT_CAPTION_WIDTH: f64 = 7.2;
const DEFAULT_TABLE_OFFSET: f64 = 1.0;
const DEFAULT_ROW_HEIGHT: f64 = 0.1;
const DEFAULT_COLUMN_WIDTH: f64 = 3.6;

/// 报表插入游标。每产出一份报表后水平前移固定步进，
/// 纵坐标保持不变，保证多份报表互不重叠。
/// 游标是显式值，由驱动方持有并逐次传递，不存在全局可变状态。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReportCursor {
    pub position: Point2,
    pub step: f64,
}

impl ReportCursor {
    #[inline]
    pub fn new(position: Point2, step: f64) -> Self {
        Self { position, step }
    }

    /// 返回水平前移一个步进后的新游标。
    #[inline]
    pub fn advanced(self) -> Self {
        Self {
            position: self.position.translate(Vector2::new(self.step, 0.0)),
            step: self.step,
        }
    }
}

impl Default for ReportCursor {
    fn default() -> Self {
        Self::new(
            Point2::new(DEFAULT_CURSOR_X, DEFAULT_CURSOR_Y),
            DEFAULT_CURSOR_STEP,
        )
    }
}

/// 报表版面常数。列宽行高是固定值，表格不随内容自动伸缩。
#[derive(Debug, Clone)]
pub struct ReportStyle {
    pub caption_width: f64,
    /// 表格相对标签锚点的垂直下移量。
    pub table_offset: f64,
    pub row_height: f64,
    pub column_width: f64,
    /// 标签两行之间的分隔符。默认空串，保留原始行为
    /// （两行直接拼接）；换行需要显式配置启用。
    pub caption_separator: String,
}

impl Default for ReportStyle {
    fn default() -> Self {
        Self {
            caption_width: DEFAULT_CAPTION_WIDTH,
            table_offset: DEFAULT_TABLE_OFFSET,
            row_height: DEFAULT_ROW_HEIGHT,
            column_width: DEFAULT_COLUMN_WIDTH,
            caption_separator: String::new(),
        }
    }
}

/// 单份报表的文字内容：两行标签、表格标题与两列表头。
#[derive(Debug, Clone)]
pub struct ReportSpec {
    pub caption_line1: String,
    pub caption_line2: String,
    pub table_title: String,
    pub column1_header: String,
    pub column2_header: String,
}

impl ReportSpec {
    pub fn new(
        caption_line1: impl Into<String>,
        caption_line2: impl Into<String>,
        table_title: impl Into<String>,
        column1_header: impl Into<String>,
        column2_header: impl Into<String>,
    ) -> Self {
        Self {
            caption_line1: caption_line1.into(),
            caption_line2: caption_line2.into(),
            table_title: table_title.into(),
            column1_header: column1_header.into(),
            column2_header: column2_header.into(),
        }
    }
}

/// 解析报表目标布局：按名称精确匹配；未命中时若允许回退则取
/// 第一个布局，否则返回 `LayoutNotFound`。
pub fn resolve_target_layout<'a>(
    document: &'a mut Document,
    name: &str,
    fallback_to_first: bool,
) -> Result<&'a mut Layout, EngineError> {
    if !document.has_layouts() {
        return Err(EngineError::NoLayouts);
    }
    let index = match document.layout_index_by_name(name) {
        Some(index) => index,
        None if fallback_to_first => {
            debug!(name, "未找到目标布局，回退到第一个布局");
            0
        }
        None => {
            return Err(EngineError::LayoutNotFound {
                name: name.to_string(),
            });
        }
    };
    document
        .layout_mut(index)
        .ok_or(EngineError::NoLayouts)
}

/// 在布局上产出一份报表：标签置于游标处，表格在其下方，
/// 成功后返回前移的游标。表格固定两列，行数 = 键全集 + 2
/// （标题行与表头行）；全集中无统计值的键填 0。
pub fn emit_report(
    layout: &mut Layout,
    cursor: ReportCursor,
    style: &ReportStyle,
    spec: &ReportSpec,
    key_universe: &[String],
    result: &MetricResult,
) -> Result<ReportCursor, EngineError> {
    let caption = format!(
        "{}{}{}",
        spec.caption_line1, style.caption_separator, spec.caption_line2
    );
    layout.add_mtext(cursor.position, style.caption_width, caption);

    let table_insert = cursor
        .position
        .translate(Vector2::new(0.0, -style.table_offset));
    let rows = key_universe.len() as u32 + 2;
    let table = layout.add_table(
        table_insert,
        rows,
        2,
        style.row_height,
        style.column_width,
    );

    set_cell(table, 0, 0, &spec.table_title)?;
    set_cell(table, 1, 0, &spec.column1_header)?;
    set_cell(table, 1, 1, &spec.column2_header)?;

    for (offset, key) in key_universe.iter().enumerate() {
        let row = offset as u32 + 2;
        set_cell(table, row, 0, key)?;
        match result.get(key) {
            Some(value) => set_cell(table, row, 1, &value.to_string())?,
            None => set_cell(table, row, 1, "0")?,
        }
    }

    debug!(
        layout = %layout.name,
        rows,
        keys = key_universe.len(),
        "报表已写入布局"
    );
    Ok(cursor.advanced())
}

fn set_cell(
    table: &mut takeoff_core::document::Table,
    row: u32,
    column: u32,
    value: &str,
) -> Result<(), EngineError> {
    if table.set_text(row, column, value) {
        Ok(())
    } else {
        Err(EngineError::TableCellOutOfRange { row, column })
    }
}
