//! 顶点蒙皮计算

use glam::{Mat4, Vec3};
use rayon::prelude::*;

use crate::model::SkinnedVertex;

/// 并行计算所有顶点的蒙皮位置
pub fn compute_skinning(vertices: &[SkinnedVertex], matrices: &[Mat4]) -> Vec<Vec3> {
    vertices
        .par_iter()
        .map(|v| skin_vertex(v, matrices))
        .collect()
}

/// 计算单个顶点的蒙皮位置，权重按原值使用
pub fn skin_vertex(vertex: &SkinnedVertex, matrices: &[Mat4]) -> Vec3 {
    let position = vertex.position();
    let mut skinned = Vec3::ZERO;
    for (&joint, &weight) in vertex.joints.iter().zip(&vertex.weights) {
        if weight == 0.0 {
            continue;
        }
        skinned += get_matrix(matrices, joint).transform_point3(position) * weight;
    }
    skinned
}

fn get_matrix(matrices: &[Mat4], index: u16) -> Mat4 {
    matrices.get(index as usize).copied().unwrap_or(Mat4::IDENTITY)
}
