//! 任意顺序骨骼层级的全局矩阵求解

use glam::Mat4;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    Visiting,
    Done,
}

struct Resolver<'a> {
    parents: &'a [i32],
    locals: &'a [Mat4],
    marks: Vec<Mark>,
    globals: Vec<Mat4>,
}

impl Resolver<'_> {
    fn resolve(&mut self, index: usize) -> Mat4 {
        match self.marks[index] {
            Mark::Done => return self.globals[index],
            // 环：把当前骨骼当作根
            Mark::Visiting => return self.locals[index],
            Mark::Unvisited => {}
        }
        self.marks[index] = Mark::Visiting;

        let local = self.locals[index];
        let parent = usize::try_from(self.parents[index])
            .ok()
            .filter(|&p| p < self.locals.len() && p != index);
        let global = match parent {
            Some(p) => self.resolve(p) * local,
            None => local,
        };

        self.globals[index] = global;
        self.marks[index] = Mark::Done;
        global
    }
}

/// 由局部矩阵和父索引求全局矩阵，每根骨骼只计算一次
///
/// 父索引越界、指向自身或成环时该骨骼视为根。
pub fn resolve_globals(parents: &[i32], locals: &[Mat4]) -> Vec<Mat4> {
    let count = locals.len().min(parents.len());
    let mut resolver = Resolver {
        parents: &parents[..count],
        locals: &locals[..count],
        marks: vec![Mark::Unvisited; count],
        globals: vec![Mat4::IDENTITY; count],
    };
    for i in 0..count {
        resolver.resolve(i);
    }
    resolver.globals
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_child_before_parent() {
        // 0 的父骨骼是 1
        let parents = [1, -1];
        let locals = [
            Mat4::from_translation(Vec3::new(0.0, 1.0, 0.0)),
            Mat4::from_translation(Vec3::new(5.0, 0.0, 0.0)),
        ];
        let globals = resolve_globals(&parents, &locals);
        assert!(globals[0].abs_diff_eq(Mat4::from_translation(Vec3::new(5.0, 1.0, 0.0)), 1e-6));
        assert!(globals[1].abs_diff_eq(locals[1], 1e-6));
    }

    #[test]
    fn test_self_parent_and_cycle_terminate() {
        let parents = [0, 2, 1];
        let locals = [Mat4::IDENTITY; 3];
        let globals = resolve_globals(&parents, &locals);
        assert_eq!(globals.len(), 3);
        assert_eq!(globals[0], Mat4::IDENTITY);
    }
}
