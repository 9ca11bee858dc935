//! 子网格定义

use std::ops::Range;

/// 索引缓冲区中的一段连续区间
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SubMesh {
    pub begin_index: u32,
    pub index_count: u32,
}

impl SubMesh {
    pub fn new(begin_index: u32, index_count: u32) -> Self {
        Self { begin_index, index_count }
    }

    pub fn is_empty(&self) -> bool {
        self.index_count == 0
    }

    pub fn triangle_count(&self) -> u32 {
        self.index_count / 3
    }

    pub fn range(&self) -> Range<usize> {
        let begin = self.begin_index as usize;
        begin..begin + self.index_count as usize
    }
}
