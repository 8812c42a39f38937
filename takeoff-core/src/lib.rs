pub mod geometry {
    use glam::DVec2;
    use serde::{Deserialize, Serialize};

    /// 二维点，内部以 `glam::DVec2` 表示，与图纸坐标保持双精度一致。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Point2(pub DVec2);

    impl Point2 {
        #[inline]
        pub fn new(x: f64, y: f64) -> Self {
            Self(DVec2::new(x, y))
        }

        #[inline]
        pub fn from_vec(vec: DVec2) -> Self {
            Self(vec)
        }

        #[inline]
        pub fn x(self) -> f64 {
            self.0.x
        }

        #[inline]
        pub fn y(self) -> f64 {
            self.0.y
        }

        #[inline]
        pub fn translate(self, offset: Vector2) -> Self {
            Self(self.0 + offset.0)
        }

        #[inline]
        pub fn vector_to(self, other: Point2) -> Vector2 {
            Vector2(other.0 - self.0)
        }

        #[inline]
        pub fn as_vec2(self) -> DVec2 {
            self.0
        }
    }

    impl From<DVec2> for Point2 {
        fn from(value: DVec2) -> Self {
            Self::from_vec(value)
        }
    }

    /// 二维向量，当前主要用于插入点偏移与长度计算。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Vector2(pub DVec2);

    impl Vector2 {
        #[inline]
        pub fn new(x: f64, y: f64) -> Self {
            Self(DVec2::new(x, y))
        }

        #[inline]
        pub fn from_points(start: Point2, end: Point2) -> Self {
            Self(end.0 - start.0)
        }

        #[inline]
        pub fn length(self) -> f64 {
            self.0.length()
        }

        #[inline]
        pub fn length_squared(self) -> f64 {
            self.0.length_squared()
        }

        #[inline]
        pub fn as_vec2(self) -> DVec2 {
            self.0
        }

        #[inline]
        pub fn x(self) -> f64 {
            self.0.x
        }

        #[inline]
        pub fn y(self) -> f64 {
            self.0.y
        }
    }

    impl From<DVec2> for Vector2 {
        fn from(value: DVec2) -> Self {
            Self(value)
        }
    }
}

pub mod document {
    use std::collections::HashMap;

    use serde::{Deserialize, Serialize};

    use crate::geometry::Point2;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct EntityId(u64);

    impl EntityId {
        #[inline]
        pub fn new(raw: u64) -> Self {
            Self(raw)
        }

        /// 提供原始数值，便于序列化或日志输出。
        #[inline]
        pub fn get(self) -> u64 {
            self.0
        }
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Layer {
        pub name: String,
        pub is_visible: bool,
    }

    impl Layer {
        #[inline]
        pub fn new(name: impl Into<String>) -> Self {
            Self {
                name: name.into(),
                is_visible: true,
            }
        }
    }

    /// 模型空间实体的封闭变体集。统计只关心这四类实体，
    /// 其余实体（以及宿主无法细化的记录）统一落入 `Other`。
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub enum Entity {
        BlockReference(BlockReference),
        Polyline(Polyline),
        Text(Text),
        Hatch(Hatch),
        Other(OtherEntity),
    }

    impl Entity {
        #[inline]
        pub fn layer_name(&self) -> &str {
            match self {
                Entity::BlockReference(reference) => &reference.layer,
                Entity::Polyline(polyline) => &polyline.layer,
                Entity::Text(text) => &text.layer,
                Entity::Hatch(hatch) => &hatch.layer,
                Entity::Other(other) => &other.layer,
            }
        }
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct BlockReference {
        pub name: String,
        pub insert: Point2,
        pub layer: String,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Polyline {
        pub vertices: Vec<PolylineVertex>,
        pub is_closed: bool,
        pub layer: String,
    }

    impl Polyline {
        /// 几何总长度：直线段取弦长，带 bulge 的段按圆弧展开
        /// （θ = 4·atan(bulge)，r = 弦长 / (2·sin(θ/2))，弧长 = r·θ）。
        /// 闭合多段线计入收尾段。
        pub fn length(&self) -> f64 {
            let count = self.vertices.len();
            if count < 2 {
                return 0.0;
            }
            let segment_count = if self.is_closed { count } else { count - 1 };
            let mut total = 0.0;
            for index in 0..segment_count {
                let start = &self.vertices[index];
                let end = &self.vertices[(index + 1) % count];
                total += segment_length(start, end);
            }
            total
        }
    }

    fn segment_length(start: &PolylineVertex, end: &PolylineVertex) -> f64 {
        let chord = start.position.vector_to(end.position).length();
        if start.bulge.abs() <= 1e-9 || chord <= f64::EPSILON {
            return chord;
        }
        let theta = 4.0 * start.bulge.atan();
        let half_theta = theta / 2.0;
        let sin_half = half_theta.sin().abs();
        if sin_half <= 1e-9 {
            return chord;
        }
        let radius = chord / (2.0 * sin_half);
        radius * theta.abs()
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct PolylineVertex {
        pub position: Point2,
        pub bulge: f64,
    }

    impl PolylineVertex {
        #[inline]
        pub fn new(position: Point2) -> Self {
            Self {
                position,
                bulge: 0.0,
            }
        }

        #[inline]
        pub fn with_bulge(position: Point2, bulge: f64) -> Self {
            Self { position, bulge }
        }
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Text {
        pub insert: Point2,
        pub content: String,
        pub height: f64,
        pub layer: String,
    }

    impl Text {
        /// 按 Unicode 标量统计字符数。
        #[inline]
        pub fn char_count(&self) -> usize {
            self.content.chars().count()
        }
    }

    /// 填充实体。面积由宿主计算并随快照携带，本系统只做汇总。
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Hatch {
        pub pattern_name: String,
        pub is_solid: bool,
        pub area: f64,
        pub layer: String,
    }

    /// 宿主侧存在但本系统不统计的实体。保留类型名便于日志排查。
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct OtherEntity {
        pub type_name: String,
        pub layer: String,
    }

    /// 块定义（仅保留统计所需的元信息）。
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct BlockDefinition {
        pub name: String,
        pub base_point: Point2,
    }

    /// 多行文字标签，报表的表头说明由它承载。
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct MTextLabel {
        pub insert: Point2,
        pub width: f64,
        pub content: String,
    }

    /// 固定行高/列宽的二维表格实体。单元格按 (行, 列) 寻址，
    /// 尺寸在创建时确定，不随内容伸缩。
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Table {
        pub insert: Point2,
        rows: u32,
        columns: u32,
        pub row_height: f64,
        pub column_width: f64,
        cells: Vec<String>,
    }

    impl Table {
        pub fn new(
            insert: Point2,
            rows: u32,
            columns: u32,
            row_height: f64,
            column_width: f64,
        ) -> Self {
            Self {
                insert,
                rows,
                columns,
                row_height,
                column_width,
                cells: vec![String::new(); (rows * columns) as usize],
            }
        }

        #[inline]
        pub fn rows(&self) -> u32 {
            self.rows
        }

        #[inline]
        pub fn columns(&self) -> u32 {
            self.columns
        }

        /// 写入单元格文本；越界时返回 false，由调用方决定如何上报。
        pub fn set_text(&mut self, row: u32, column: u32, value: impl Into<String>) -> bool {
            if row >= self.rows || column >= self.columns {
                return false;
            }
            let index = (row * self.columns + column) as usize;
            self.cells[index] = value.into();
            true
        }

        pub fn cell(&self, row: u32, column: u32) -> Option<&str> {
            if row >= self.rows || column >= self.columns {
                return None;
            }
            let index = (row * self.columns + column) as usize;
            Some(self.cells[index].as_str())
        }
    }

    /// 布局图纸：报表产物（标签与表格）落在这里，与模型空间分离。
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Layout {
        pub name: String,
        labels: Vec<MTextLabel>,
        tables: Vec<Table>,
    }

    impl Layout {
        pub fn new(name: impl Into<String>) -> Self {
            Self {
                name: name.into(),
                labels: Vec::new(),
                tables: Vec::new(),
            }
        }

        pub fn add_mtext(&mut self, insert: Point2, width: f64, content: impl Into<String>) {
            self.labels.push(MTextLabel {
                insert,
                width,
                content: content.into(),
            });
        }

        pub fn add_table(
            &mut self,
            insert: Point2,
            rows: u32,
            columns: u32,
            row_height: f64,
            column_width: f64,
        ) -> &mut Table {
            let index = self.tables.len();
            self.tables
                .push(Table::new(insert, rows, columns, row_height, column_width));
            &mut self.tables[index]
        }

        #[inline]
        pub fn labels(&self) -> impl Iterator<Item = &MTextLabel> {
            self.labels.iter()
        }

        #[inline]
        pub fn tables(&self) -> impl Iterator<Item = &Table> {
            self.tables.iter()
        }
    }

    #[derive(Debug, Default, Clone, Serialize, Deserialize)]
    pub struct Document {
        name: Option<String>,
        layers: HashMap<String, Layer>,
        entities: Vec<(EntityId, Entity)>,
        next_entity_id: u64,
        blocks: HashMap<String, BlockDefinition>,
        layouts: Vec<Layout>,
    }

    impl Document {
        pub fn new() -> Self {
            let mut doc = Self::default();
            doc.ensure_layer("0");
            doc
        }

        pub fn with_name(name: impl Into<String>) -> Self {
            let mut doc = Self::new();
            doc.name = Some(name.into());
            doc
        }

        #[inline]
        pub fn name(&self) -> Option<&str> {
            self.name.as_deref()
        }

        pub fn set_name(&mut self, name: impl Into<String>) {
            self.name = Some(name.into());
        }

        pub fn ensure_layer(&mut self, name: impl AsRef<str>) {
            let key = name.as_ref();
            self.layers
                .entry(key.to_string())
                .or_insert_with(|| Layer::new(key));
        }

        pub fn add_block_reference(
            &mut self,
            name: impl Into<String>,
            insert: Point2,
            layer: impl Into<String>,
        ) -> EntityId {
            let layer = layer.into();
            self.ensure_layer(&layer);
            let id = self.next_id();
            self.entities.push((
                id,
                Entity::BlockReference(BlockReference {
                    name: name.into(),
                    insert,
                    layer,
                }),
            ));
            id
        }

        pub fn add_polyline<I>(
            &mut self,
            vertices: I,
            is_closed: bool,
            layer: impl Into<String>,
        ) -> EntityId
        where
            I: IntoIterator<Item = Point2>,
        {
            let collected = vertices
                .into_iter()
                .map(PolylineVertex::new)
                .collect::<Vec<_>>();
            self.add_polyline_with_vertices(collected, is_closed, layer)
        }

        pub fn add_polyline_with_vertices<I>(
            &mut self,
            vertices: I,
            is_closed: bool,
            layer: impl Into<String>,
        ) -> EntityId
        where
            I: IntoIterator<Item = PolylineVertex>,
        {
            let layer = layer.into();
            self.ensure_layer(&layer);
            let collected: Vec<PolylineVertex> = vertices.into_iter().collect();
            let id = self.next_id();
            self.entities.push((
                id,
                Entity::Polyline(Polyline {
                    vertices: collected,
                    is_closed,
                    layer,
                }),
            ));
            id
        }

        pub fn add_text(
            &mut self,
            insert: Point2,
            content: impl Into<String>,
            height: f64,
            layer: impl Into<String>,
        ) -> EntityId {
            let layer = layer.into();
            self.ensure_layer(&layer);
            let id = self.next_id();
            self.entities.push((
                id,
                Entity::Text(Text {
                    insert,
                    content: content.into(),
                    height,
                    layer,
                }),
            ));
            id
        }

        pub fn add_hatch(
            &mut self,
            pattern_name: impl Into<String>,
            is_solid: bool,
            area: f64,
            layer: impl Into<String>,
        ) -> EntityId {
            let layer = layer.into();
            self.ensure_layer(&layer);
            let id = self.next_id();
            self.entities.push((
                id,
                Entity::Hatch(Hatch {
                    pattern_name: pattern_name.into(),
                    is_solid,
                    area,
                    layer,
                }),
            ));
            id
        }

        pub fn add_other(
            &mut self,
            type_name: impl Into<String>,
            layer: impl Into<String>,
        ) -> EntityId {
            let layer = layer.into();
            self.ensure_layer(&layer);
            let id = self.next_id();
            self.entities.push((
                id,
                Entity::Other(OtherEntity {
                    type_name: type_name.into(),
                    layer,
                }),
            ));
            id
        }

        pub fn add_entity(&mut self, entity: Entity) -> EntityId {
            match entity {
                Entity::BlockReference(reference) => {
                    self.add_block_reference(reference.name, reference.insert, reference.layer)
                }
                Entity::Polyline(polyline) => self.add_polyline_with_vertices(
                    polyline.vertices,
                    polyline.is_closed,
                    polyline.layer,
                ),
                Entity::Text(text) => {
                    self.add_text(text.insert, text.content, text.height, text.layer)
                }
                Entity::Hatch(hatch) => {
                    self.add_hatch(hatch.pattern_name, hatch.is_solid, hatch.area, hatch.layer)
                }
                Entity::Other(other) => self.add_other(other.type_name, other.layer),
            }
        }

        pub fn add_block_definition(&mut self, definition: BlockDefinition) {
            self.blocks.insert(definition.name.clone(), definition);
        }

        #[inline]
        pub fn blocks(&self) -> impl Iterator<Item = &BlockDefinition> {
            self.blocks.values()
        }

        #[inline]
        pub fn layers(&self) -> impl Iterator<Item = &Layer> {
            self.layers.values()
        }

        #[inline]
        pub fn entities(&self) -> impl Iterator<Item = &(EntityId, Entity)> {
            self.entities.iter()
        }

        #[inline]
        pub fn entity(&self, id: EntityId) -> Option<&Entity> {
            self.entities.iter().find_map(|(entity_id, entity)| {
                if entity_id.get() == id.get() {
                    Some(entity)
                } else {
                    None
                }
            })
        }

        /// 全部块定义名称的有序全集，供报表零填充。
        /// 以 `*` 开头的内部块（匿名块、模型/图纸空间记录）不参与统计。
        pub fn block_name_universe(&self) -> Vec<String> {
            let mut names: Vec<String> = self
                .blocks
                .keys()
                .filter(|name| !name.starts_with('*'))
                .cloned()
                .collect();
            names.sort();
            names
        }

        /// 全部图层名称的有序全集，与实体是否使用该图层无关。
        pub fn layer_name_universe(&self) -> Vec<String> {
            let mut names: Vec<String> = self.layers.keys().cloned().collect();
            names.sort();
            names
        }

        pub fn add_layout(&mut self, name: impl Into<String>) -> &mut Layout {
            let index = self.layouts.len();
            self.layouts.push(Layout::new(name));
            &mut self.layouts[index]
        }

        #[inline]
        pub fn layouts(&self) -> impl Iterator<Item = &Layout> {
            self.layouts.iter()
        }

        pub fn layout_index_by_name(&self, name: &str) -> Option<usize> {
            self.layouts.iter().position(|layout| layout.name == name)
        }

        pub fn layout_mut(&mut self, index: usize) -> Option<&mut Layout> {
            self.layouts.get_mut(index)
        }

        #[inline]
        pub fn has_layouts(&self) -> bool {
            !self.layouts.is_empty()
        }

        #[inline]
        fn next_id(&mut self) -> EntityId {
            let id = self.next_entity_id;
            self.next_entity_id += 1;
            EntityId(id)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::geometry::Point2;
        use std::f64::consts::PI;

        #[test]
        fn document_stores_entities_and_layers() {
            let mut doc = Document::with_name("план.dwg");
            let block_id = doc.add_block_reference("DOOR", Point2::new(1.0, 2.0), "ARCH");
            let polyline_id = doc.add_polyline(
                [
                    Point2::new(0.0, 0.0),
                    Point2::new(3.0, 4.0),
                    Point2::new(6.0, 0.0),
                ],
                false,
                "WALLS",
            );
            let text_id = doc.add_text(Point2::new(1.0, 1.0), "Hello", 2.5, "ANNOT");
            let hatch_id = doc.add_hatch("SOLID", true, 12.5, "FILL");
            let other_id = doc.add_other("AcDbCircle", "GEOM");

            assert_eq!(doc.name(), Some("план.dwg"));
            assert_eq!(block_id.get(), 0);
            assert_eq!(other_id.get(), 4);
            assert_eq!(doc.entities().count(), 5);

            let layers: Vec<_> = doc.layers().map(|l| l.name.clone()).collect();
            for expected in ["0", "ARCH", "WALLS", "ANNOT", "FILL", "GEOM"] {
                assert!(layers.contains(&expected.to_string()), "missing {expected}");
            }

            match doc.entity(polyline_id) {
                Some(Entity::Polyline(polyline)) => {
                    assert_eq!(polyline.vertices.len(), 3);
                    assert!(!polyline.is_closed);
                }
                other => panic!("unexpected entity lookup result: {other:?}"),
            }
            match doc.entity(text_id) {
                Some(Entity::Text(text)) => assert_eq!(text.char_count(), 5),
                _ => panic!("expected text entity"),
            }
            match doc.entity(hatch_id) {
                Some(Entity::Hatch(hatch)) => assert!((hatch.area - 12.5).abs() < 1e-12),
                _ => panic!("expected hatch entity"),
            }
        }

        #[test]
        fn polyline_length_sums_straight_segments() {
            let polyline = Polyline {
                vertices: vec![
                    PolylineVertex::new(Point2::new(0.0, 0.0)),
                    PolylineVertex::new(Point2::new(3.0, 4.0)),
                    PolylineVertex::new(Point2::new(3.0, 10.0)),
                ],
                is_closed: false,
                layer: "0".to_string(),
            };
            assert!((polyline.length() - 11.0).abs() < 1e-9);
        }

        #[test]
        fn closed_polyline_counts_the_closing_segment() {
            let polyline = Polyline {
                vertices: vec![
                    PolylineVertex::new(Point2::new(0.0, 0.0)),
                    PolylineVertex::new(Point2::new(4.0, 0.0)),
                    PolylineVertex::new(Point2::new(4.0, 3.0)),
                ],
                is_closed: true,
                layer: "0".to_string(),
            };
            // 4 + 3 + 5（收尾段）
            assert!((polyline.length() - 12.0).abs() < 1e-9);
        }

        #[test]
        fn bulge_one_expands_to_a_semicircle() {
            // bulge = 1 对应半圆：弦长 10，弧长应为 π·5。
            let polyline = Polyline {
                vertices: vec![
                    PolylineVertex::with_bulge(Point2::new(0.0, 0.0), 1.0),
                    PolylineVertex::new(Point2::new(10.0, 0.0)),
                ],
                is_closed: false,
                layer: "0".to_string(),
            };
            assert!((polyline.length() - PI * 5.0).abs() < 1e-9);
        }

        #[test]
        fn degenerate_polyline_has_zero_length() {
            let empty = Polyline {
                vertices: vec![PolylineVertex::new(Point2::new(1.0, 1.0))],
                is_closed: false,
                layer: "0".to_string(),
            };
            assert_eq!(empty.length(), 0.0);
        }

        #[test]
        fn block_universe_is_sorted_and_skips_system_blocks() {
            let mut doc = Document::new();
            for name in ["WINDOW", "*Model_Space", "DOOR", "*Paper_Space", "COLUMN"] {
                doc.add_block_definition(BlockDefinition {
                    name: name.to_string(),
                    base_point: Point2::new(0.0, 0.0),
                });
            }
            assert_eq!(doc.block_name_universe(), vec!["COLUMN", "DOOR", "WINDOW"]);
        }

        #[test]
        fn layer_universe_is_sorted_and_complete() {
            let mut doc = Document::new();
            doc.ensure_layer("ЭЛЕКТРИКА");
            doc.ensure_layer("ARCH");
            doc.ensure_layer("B-WALLS");
            // 没有任何实体也应列出全部图层。
            assert_eq!(
                doc.layer_name_universe(),
                vec!["0", "ARCH", "B-WALLS", "ЭЛЕКТРИКА"]
            );
        }

        #[test]
        fn table_cells_are_addressed_by_row_and_column() {
            let mut table = Table::new(Point2::new(0.0, 0.0), 3, 2, 0.1, 3.6);
            assert!(table.set_text(0, 0, "标题"));
            assert!(table.set_text(2, 1, "42"));
            assert!(!table.set_text(3, 0, "越界"));
            assert!(!table.set_text(0, 2, "越界"));
            assert_eq!(table.cell(0, 0), Some("标题"));
            assert_eq!(table.cell(2, 1), Some("42"));
            assert_eq!(table.cell(1, 1), Some(""));
            assert!(table.cell(3, 0).is_none());
        }

        #[test]
        fn layout_collects_labels_and_tables() {
            let mut doc = Document::new();
            let layout = doc.add_layout("统计表");
            layout.add_mtext(Point2::new(0.05, 21.78), 7.2, "说明文字");
            let table = layout.add_table(Point2::new(0.05, 20.78), 4, 2, 0.1, 3.6);
            assert!(table.set_text(0, 0, "标题"));

            let layout = doc
                .layout_index_by_name("统计表")
                .and_then(|index| doc.layout_mut(index))
                .expect("layout should be found by name");
            assert_eq!(layout.labels().count(), 1);
            assert_eq!(layout.tables().count(), 1);
        }
    }
}
