//! 场景图

use std::collections::HashMap;

use glam::Mat4;

use crate::config::get_config;

use super::SceneNode;

/// 按注册顺序保存的节点列表，父子关系用下标表示
pub struct SceneGraph {
    nodes: Vec<SceneNode>,
    projection: (f32, f32),
}

impl SceneGraph {
    pub fn new(projection: (f32, f32)) -> Self {
        Self {
            nodes: Vec::new(),
            projection,
        }
    }

    /// 注册节点，返回其下标
    pub fn push(&mut self, node: SceneNode) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    pub fn nodes(&self) -> &[SceneNode] {
        &self.nodes
    }

    pub fn node(&self, index: usize) -> Option<&SceneNode> {
        self.nodes.get(index)
    }

    pub fn node_mut(&mut self, index: usize) -> Option<&mut SceneNode> {
        self.nodes.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// 正交投影尺寸 (宽, 高)
    pub fn projection(&self) -> (f32, f32) {
        self.projection
    }

    /// 第二遍：按父 ID 连接节点
    ///
    /// 父 ID 不存在、指向自身或会形成环时，节点没有父节点。
    pub fn link_parents(&mut self) {
        let mut by_id: HashMap<i64, usize> = HashMap::new();
        for (index, node) in self.nodes.iter().enumerate() {
            if let Some(id) = node.id {
                by_id.insert(id, index);
            }
        }

        for index in 0..self.nodes.len() {
            let parent = self.nodes[index]
                .parent_id
                .and_then(|pid| by_id.get(&pid).copied())
                .filter(|&p| p != index);
            if self.nodes[index].parent_id.is_some() && parent.is_none() {
                log::debug!("对象 {} 的父节点 {:?} 不可用", self.nodes[index].name, self.nodes[index].parent_id);
            }
            self.nodes[index].parent = parent;
        }

        for index in 0..self.nodes.len() {
            if self.reaches(index) {
                log::warn!("对象 {} 的父子关系成环，已断开", self.nodes[index].name);
                self.nodes[index].parent = None;
            }
        }
    }

    /// 沿父链向上能否回到自身
    fn reaches(&self, index: usize) -> bool {
        let mut current = self.nodes[index].parent;
        for _ in 0..self.nodes.len() {
            match current {
                Some(p) if p == index => return true,
                Some(p) => current = self.nodes[p].parent,
                None => return false,
            }
        }
        false
    }

    /// 世界矩阵：`parent.world * local`
    pub fn world_matrix(&self, index: usize) -> Mat4 {
        let Some(node) = self.nodes.get(index) else {
            return Mat4::IDENTITY;
        };
        let mut world = node.local_matrix();
        let mut current = node.parent;
        for _ in 0..self.nodes.len() {
            let Some(p) = current.and_then(|p| self.nodes.get(p)) else {
                break;
            };
            world = p.local_matrix() * world;
            current = p.parent;
        }
        world
    }

    /// 模型矩阵：`world * geometryScale`
    pub fn model_matrix(&self, index: usize) -> Mat4 {
        let scale = self
            .nodes
            .get(index)
            .map_or(glam::Vec3::ONE, SceneNode::geometry_scale);
        self.world_matrix(index) * Mat4::from_scale(scale)
    }

    /// 推进所有动画节点
    pub fn advance(&mut self, time: f64) {
        for node in &mut self.nodes {
            let name = &node.name;
            if let Some(mesh) = node.kind.animated_mut() {
                mesh.advance(time, name);
            }
        }
    }
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new(get_config().default_projection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{LocalTransform, NodeKind};
    use crate::texture::TextureHandle;
    use glam::Vec3;

    fn sprite(id: Option<i64>, parent: Option<i64>, x: f32) -> SceneNode {
        let transform = LocalTransform {
            position: Vec3::new(x, 0.0, 0.0),
            ..Default::default()
        };
        let mut node = SceneNode::new(format!("n{}", x), transform, TextureHandle(0), NodeKind::Sprite);
        node.id = id;
        node.parent_id = parent;
        node
    }

    #[test]
    fn test_world_composes_parent_chain() {
        let mut graph = SceneGraph::default();
        graph.push(sprite(Some(1), None, 10.0));
        graph.push(sprite(Some(2), Some(1), 5.0));
        graph.push(sprite(Some(3), Some(2), 1.0));
        graph.link_parents();

        assert_eq!(graph.node(2).and_then(|n| n.parent), Some(1));
        let p = graph.world_matrix(2).transform_point3(Vec3::ZERO);
        assert!(p.abs_diff_eq(Vec3::new(16.0, 0.0, 0.0), 1e-5));
    }

    #[test]
    fn test_missing_parent_keeps_local() {
        let mut graph = SceneGraph::default();
        graph.push(sprite(Some(1), Some(42), 7.0));
        graph.push(sprite(None, Some(1), 3.0));
        graph.link_parents();

        assert_eq!(graph.node(0).and_then(|n| n.parent), None);
        assert_eq!(graph.world_matrix(0), graph.node(0).map(|n| n.local_matrix()).unwrap());
        // 没有 ID 的节点仍可以有父节点
        assert_eq!(graph.node(1).and_then(|n| n.parent), Some(0));
    }

    #[test]
    fn test_self_parent_and_cycle_rejected() {
        let mut graph = SceneGraph::default();
        graph.push(sprite(Some(1), Some(1), 1.0));
        graph.push(sprite(Some(2), Some(3), 2.0));
        graph.push(sprite(Some(3), Some(2), 3.0));
        graph.link_parents();

        assert_eq!(graph.node(0).and_then(|n| n.parent), None);
        assert_eq!(graph.node(1).and_then(|n| n.parent), None);
        assert_eq!(graph.node(2).and_then(|n| n.parent), Some(1));
        // 不会死循环
        let _ = graph.world_matrix(2);
    }

    #[test]
    fn test_sprite_model_matrix_scales_by_size() {
        let mut graph = SceneGraph::default();
        graph.push(sprite(None, None, 0.0));
        let corner = graph.model_matrix(0).transform_point3(Vec3::new(0.5, 0.5, 0.0));
        assert!(corner.abs_diff_eq(Vec3::new(50.0, 50.0, 0.0), 1e-5));
        assert_eq!(graph.projection(), (1920.0, 1080.0));
    }
}
