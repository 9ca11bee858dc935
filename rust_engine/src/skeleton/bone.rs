//! 骨骼节点

use glam::Mat4;

/// 骨骼渲染标记（来自 Puppet 元数据）
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BoneTag {
    /// 写入模板缓冲（例如眼白）
    Mask,
    /// 只在模板标记处绘制（例如瞳孔）
    Clipped,
}

impl BoneTag {
    /// 解析元数据中的标记字符串，未知标记返回 None
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "mask" => Some(BoneTag::Mask),
            "clipped" => Some(BoneTag::Clipped),
            _ => None,
        }
    }
}

/// 骨骼节点
#[derive(Clone, Debug)]
pub struct Bone {
    /// 骨骼 ID（动画轨道按此 ID 匹配）
    pub id: i32,
    pub name: String,
    /// 父骨骼索引，-1 表示根
    pub parent_index: i32,
    /// 绑定姿态下相对父骨骼的变换（列主序）
    pub bind_transform: Mat4,
    /// 逆绑定矩阵（在 prepare 中计算）
    pub inverse_bind_matrix: Mat4,
    pub tag: Option<BoneTag>,
}

impl Bone {
    pub fn new(id: i32, name: String, parent_index: i32, bind_transform: Mat4) -> Self {
        Self {
            id,
            name,
            parent_index,
            bind_transform,
            inverse_bind_matrix: Mat4::IDENTITY,
            tag: None,
        }
    }

    /// 父骨骼索引严格小于自身时才返回（按索引顺序求值的前提）
    pub fn ordered_parent(&self, self_index: usize) -> Option<usize> {
        let parent = usize::try_from(self.parent_index).ok()?;
        (parent < self_index).then_some(parent)
    }
}

impl Default for Bone {
    fn default() -> Self {
        Self::new(0, String::new(), -1, Mat4::IDENTITY)
    }
}
