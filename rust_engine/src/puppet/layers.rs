//! 网格分层（模板遮罩）
//!
//! 每个三角形按主骨骼归入 mask / clipped / overlay / standard 四层之一。

use std::collections::HashSet;

use crate::animation::AnimationClip;
use crate::config::get_config;
use crate::model::{SkinnedVertex, SubMesh};
use crate::skeleton::{Bone, BoneTag};

/// 模板缓冲用法
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StencilMode {
    Disabled,
    /// 写入参考值
    Write(u8),
    /// 只在等于参考值处绘制
    Test(u8),
}

pub const STENCIL_REFERENCE: u8 = 1;

/// 三角形层
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MeshLayer {
    Mask,
    Clipped,
    Overlay,
    Standard,
}

impl MeshLayer {
    /// 绘制顺序
    pub const DRAW_ORDER: [MeshLayer; 4] = [
        MeshLayer::Standard,
        MeshLayer::Mask,
        MeshLayer::Clipped,
        MeshLayer::Overlay,
    ];

    pub fn stencil(self) -> StencilMode {
        match self {
            MeshLayer::Mask => StencilMode::Write(STENCIL_REFERENCE),
            MeshLayer::Clipped => StencilMode::Test(STENCIL_REFERENCE),
            MeshLayer::Overlay | MeshLayer::Standard => StencilMode::Disabled,
        }
    }
}

/// 分层后的索引：按 mask、clipped、overlay、standard 顺序拼接
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LayeredIndices {
    pub indices: Vec<u32>,
    pub mask: SubMesh,
    pub clipped: SubMesh,
    pub overlay: SubMesh,
    pub standard: SubMesh,
}

impl LayeredIndices {
    pub fn range(&self, layer: MeshLayer) -> SubMesh {
        match layer {
            MeshLayer::Mask => self.mask,
            MeshLayer::Clipped => self.clipped,
            MeshLayer::Overlay => self.overlay,
            MeshLayer::Standard => self.standard,
        }
    }

    pub fn layer(&self, layer: MeshLayer) -> &[u32] {
        &self.indices[self.range(layer).range()]
    }

    /// 是否需要模板 pass
    pub fn has_masking(&self) -> bool {
        !self.mask.is_empty() || !self.clipped.is_empty() || !self.overlay.is_empty()
    }

    /// 非空层，按绘制顺序
    pub fn draw_ranges(&self) -> impl Iterator<Item = (MeshLayer, SubMesh)> + '_ {
        MeshLayer::DRAW_ORDER
            .into_iter()
            .map(|layer| (layer, self.range(layer)))
            .filter(|(_, range)| !range.is_empty())
    }
}

/// 三角形主骨骼：第一个主权重超过阈值的顶点的首骨骼，否则 -1
pub fn dominant_bone(vertices: &[SkinnedVertex], triangle: &[u32]) -> i32 {
    let threshold = get_config().dominant_weight_threshold;
    triangle
        .iter()
        .filter_map(|&i| vertices.get(i as usize))
        .find(|v| v.weights[0] > threshold)
        .map_or(-1, |v| v.joints[0] as i32)
}

/// 逐三角形计算主骨骼
pub fn dominant_bones(vertices: &[SkinnedVertex], indices: &[u32]) -> Vec<i32> {
    indices
        .chunks_exact(3)
        .map(|triangle| dominant_bone(vertices, triangle))
        .collect()
}

/// 动画中 Y 缩放会压到阈值以下的骨骼（眨眼）
pub fn blink_bones(clips: &[AnimationClip]) -> HashSet<i32> {
    let threshold = get_config().blink_scale_threshold;
    let mut bones = HashSet::new();
    for clip in clips {
        for &bone_id in clip.tracks.keys() {
            if clip.min_scale_y(bone_id).is_some_and(|min| min < threshold) {
                bones.insert(bone_id);
            }
        }
    }
    bones
}

/// 按主骨骼对三角形分层
///
/// 遮罩骨骼集合 = 动画推断的眨眼骨骼 ∪ 显式 mask 标记。
pub fn classify_layers(
    indices: &[u32],
    triangle_bones: &[i32],
    bones: &[Bone],
    clips: &[AnimationClip],
) -> LayeredIndices {
    let mut mask_ids = blink_bones(clips);
    let mut clipped_ids = HashSet::new();
    for bone in bones {
        match bone.tag {
            Some(BoneTag::Mask) => {
                mask_ids.insert(bone.id);
            }
            Some(BoneTag::Clipped) => {
                clipped_ids.insert(bone.id);
            }
            None => {}
        }
    }
    let has_masking = !mask_ids.is_empty() || !clipped_ids.is_empty();

    let mut mask = Vec::new();
    let mut clipped = Vec::new();
    let mut overlay = Vec::new();
    let mut standard = Vec::new();

    for (t, triangle) in indices.chunks_exact(3).enumerate() {
        let bone = triangle_bones.get(t).copied().unwrap_or(-1);
        let bucket = if mask_ids.contains(&bone) {
            &mut mask
        } else if clipped_ids.contains(&bone) {
            &mut clipped
        } else if has_masking {
            &mut overlay
        } else {
            &mut standard
        };
        bucket.extend_from_slice(triangle);
    }

    let mut layered = LayeredIndices::default();
    let mut cursor = 0u32;
    for (slot, part) in [
        (&mut layered.mask, mask),
        (&mut layered.clipped, clipped),
        (&mut layered.overlay, overlay),
        (&mut layered.standard, standard),
    ] {
        *slot = SubMesh::new(cursor, part.len() as u32);
        cursor += part.len() as u32;
        layered.indices.extend(part);
    }

    log::debug!(
        "网格分层: mask {} / clipped {} / overlay {} / standard {} 个三角形",
        layered.mask.triangle_count(),
        layered.clipped.triangle_count(),
        layered.overlay.triangle_count(),
        layered.standard.triangle_count()
    );
    layered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::BoneKeyframe;
    use glam::{Mat4, Vec3};
    use std::collections::HashMap;

    fn bone(id: i32, tag: Option<BoneTag>) -> Bone {
        let mut b = Bone::new(id, format!("b{}", id), -1, Mat4::IDENTITY);
        b.tag = tag;
        b
    }

    fn blink_clip(bone_id: i32) -> AnimationClip {
        let mut tracks = HashMap::new();
        tracks.insert(
            bone_id,
            vec![
                BoneKeyframe::default(),
                BoneKeyframe::new(Vec3::ZERO, Vec3::ZERO, Vec3::new(1.0, 0.1, 1.0)),
            ],
        );
        AnimationClip::new(1, "blink".into(), 30.0, 2, tracks)
    }

    fn indices(triangles: usize) -> Vec<u32> {
        (0..triangles as u32 * 3).collect()
    }

    #[test]
    fn test_no_masking_is_all_standard() {
        let layered = classify_layers(&indices(3), &[0, 1, -1], &[bone(0, None), bone(1, None)], &[]);
        assert_eq!(layered.standard.index_count, 9);
        assert!(!layered.has_masking());
        assert_eq!(layered.layer(MeshLayer::Standard), &indices(3)[..]);
    }

    #[test]
    fn test_heuristic_and_tags_are_unioned() {
        let bones = [bone(0, None), bone(1, None), bone(2, Some(BoneTag::Clipped)), bone(3, Some(BoneTag::Mask))];
        let layered = classify_layers(&indices(4), &[1, 2, 0, 3], &bones, &[blink_clip(1)]);

        assert_eq!(layered.standard.index_count, 0);
        assert_eq!(layered.layer(MeshLayer::Mask), &[0, 1, 2, 9, 10, 11]);
        assert_eq!(layered.layer(MeshLayer::Clipped), &[3, 4, 5]);
        assert_eq!(layered.layer(MeshLayer::Overlay), &[6, 7, 8]);
        assert_eq!(layered.indices.len(), 12);
    }

    #[test]
    fn test_clipped_only_still_routes_to_overlay() {
        let bones = [bone(0, None), bone(5, Some(BoneTag::Clipped))];
        let layered = classify_layers(&indices(2), &[0, -1], &bones, &[]);
        assert_eq!(layered.overlay.index_count, 6);
        assert_eq!(layered.standard.index_count, 0);
    }

    #[test]
    fn test_stencil_modes() {
        assert_eq!(MeshLayer::Mask.stencil(), StencilMode::Write(1));
        assert_eq!(MeshLayer::Clipped.stencil(), StencilMode::Test(1));
        assert_eq!(MeshLayer::Overlay.stencil(), StencilMode::Disabled);
    }

    #[test]
    fn test_dominant_bones_threshold() {
        use glam::Vec2;
        let weak = SkinnedVertex::new(Vec3::ZERO, Vec2::ZERO, [7, 0, 0, 0], [0.5, 0.5, 0.0, 0.0]);
        let strong = SkinnedVertex::new(Vec3::ZERO, Vec2::ZERO, [3, 0, 0, 0], [0.6, 0.4, 0.0, 0.0]);
        let vertices = [weak, strong];
        assert_eq!(dominant_bones(&vertices, &[0, 0, 1, 0, 0, 0]), vec![3, -1]);
    }
}
