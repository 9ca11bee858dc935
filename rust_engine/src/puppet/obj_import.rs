//! Puppet OBJ 网格导入

use std::collections::HashMap;

use glam::{Vec2, Vec3};

use crate::model::SkinnedVertex;

use super::layers::dominant_bone;

/// 导入结果
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ObjMesh {
    pub vertices: Vec<SkinnedVertex>,
    pub indices: Vec<u32>,
    /// 每个三角形的主骨骼，-1 表示没有
    pub triangle_bones: Vec<i32>,
    /// 原始位置的 X 跨度
    pub bounding_width: f32,
}

impl ObjMesh {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// OBJ 索引转为 0 基；负数相对于当前已读数量
fn resolve_index(raw: i64, count: usize) -> Option<i64> {
    match raw {
        0 => None,
        r if r > 0 => Some(r - 1),
        r => Some(count as i64 + r),
    }
}

/// 解析 OBJ 文本
///
/// `skin_table` 以位置索引为键；没有条目的顶点权重全为 0、绑定骨骼 0。
pub fn parse_obj(text: &str, skin_table: &HashMap<i64, ([u16; 4], [f32; 4])>) -> ObjMesh {
    let mut positions: Vec<Vec3> = Vec::new();
    let mut uvs: Vec<Vec2> = Vec::new();
    let mut mesh = ObjMesh::default();
    let mut unique: HashMap<(i64, i64), u32> = HashMap::new();
    let mut min_x = f32::INFINITY;
    let mut max_x = f32::NEG_INFINITY;

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut parts = line.split_whitespace();
        let Some(keyword) = parts.next() else { continue };
        let fields: Vec<&str> = parts.collect();

        match keyword {
            "v" => {
                let coords: Vec<f32> = fields.iter().take(3).filter_map(|s| s.parse().ok()).collect();
                if let [x, y, z] = coords[..] {
                    positions.push(Vec3::new(x, y, z));
                    min_x = min_x.min(x);
                    max_x = max_x.max(x);
                }
            }
            "vt" => {
                let coords: Vec<f32> = fields.iter().take(2).filter_map(|s| s.parse().ok()).collect();
                if let [u, v] = coords[..] {
                    uvs.push(Vec2::new(u, 1.0 - v));
                }
            }
            "f" => {
                let mut corners: Vec<u32> = Vec::with_capacity(fields.len());
                for field in &fields {
                    let mut refs = field.split('/');
                    let Some(pos_idx) = refs
                        .next()
                        .and_then(|s| s.parse::<i64>().ok())
                        .and_then(|r| resolve_index(r, positions.len()))
                    else {
                        continue;
                    };
                    let uv_idx = refs
                        .next()
                        .and_then(|s| s.parse::<i64>().ok())
                        .and_then(|r| resolve_index(r, uvs.len()))
                        .unwrap_or(pos_idx);

                    let index = *unique.entry((pos_idx, uv_idx)).or_insert_with(|| {
                        let position = usize::try_from(pos_idx)
                            .ok()
                            .and_then(|i| positions.get(i))
                            .copied()
                            .unwrap_or(Vec3::ZERO);
                        let uv = usize::try_from(uv_idx)
                            .ok()
                            .and_then(|i| uvs.get(i))
                            .copied()
                            .unwrap_or(Vec2::ZERO);
                        let (joints, weights) = skin_table
                            .get(&pos_idx)
                            .copied()
                            .unwrap_or(([0; 4], [0.0; 4]));
                        mesh.vertices.push(SkinnedVertex::new(position, uv, joints, weights));
                        (mesh.vertices.len() - 1) as u32
                    });
                    corners.push(index);
                }

                for k in 1..corners.len().saturating_sub(1) {
                    let triangle = [corners[0], corners[k], corners[k + 1]];
                    mesh.triangle_bones.push(dominant_bone(&mesh.vertices, &triangle));
                    mesh.indices.extend_from_slice(&triangle);
                }
            }
            _ => {}
        }
    }

    mesh.bounding_width = if positions.is_empty() { 0.0 } else { max_x - min_x };
    log::debug!(
        "OBJ 解析完成: {} 顶点, {} 索引, 宽度 {}",
        mesh.vertices.len(),
        mesh.indices.len(),
        mesh.bounding_width
    );
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUAD: &str = "\
# quad
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0

vt 0 0
vt 1 0
vt 1 1
vt 0 1
f 1/1 2/2 3/3 4/4
f 1/1 3/3 2/2
";

    fn skin() -> HashMap<i64, ([u16; 4], [f32; 4])> {
        let mut table = HashMap::new();
        table.insert(2, ([4, 0, 0, 0], [0.9, 0.1, 0.0, 0.0]));
        table
    }

    #[test]
    fn test_dedup_and_fan() {
        let mesh = parse_obj(QUAD, &skin());
        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.indices, vec![0, 1, 2, 0, 2, 3, 0, 2, 1]);
        assert_eq!(mesh.triangle_count(), 3);
        assert_eq!(mesh.bounding_width, 1.0);
        // V 翻转
        assert_eq!(mesh.vertices[3].uv, [0.0, 0.0]);
        assert_eq!(mesh.vertices[0].uv, [0.0, 1.0]);
    }

    #[test]
    fn test_import_is_deterministic() {
        let a = parse_obj(QUAD, &skin());
        let b = parse_obj(QUAD, &skin());
        assert_eq!(a, b);
    }

    #[test]
    fn test_dominant_bone_per_triangle() {
        let mesh = parse_obj(QUAD, &skin());
        // 顶点 2（位置索引 2）主权重 0.9 落在骨骼 4
        assert_eq!(mesh.triangle_bones, vec![4, 4, 4]);

        let mesh = parse_obj(QUAD, &HashMap::new());
        assert_eq!(mesh.triangle_bones, vec![-1, -1, -1]);
        assert_eq!(mesh.vertices[0].weights, [0.0; 4]);
    }

    #[test]
    fn test_missing_uv_and_negative_indices() {
        let text = "v 0 0 0\nv 2 0 0\nv 0 3 0\nvt 0.5 0.5\nf -3//1 -2//1 -1//1\nf 1 2 3\n";
        let mesh = parse_obj(text, &HashMap::new());
        // 无 uv 时 uv 索引取位置索引，两组面共享同一批顶点
        assert_eq!(mesh.vertices.len(), 3);
        assert_eq!(mesh.indices, vec![0, 1, 2, 0, 1, 2]);
        assert_eq!(mesh.bounding_width, 2.0);
    }

    #[test]
    fn test_empty_input() {
        let mesh = parse_obj("", &HashMap::new());
        assert!(mesh.vertices.is_empty());
        assert_eq!(mesh.bounding_width, 0.0);
    }
}
