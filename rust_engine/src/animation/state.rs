//! 节点动画播放状态

/// 单个节点的动画状态
///
/// 只由所属节点的逐帧更新读写，节点之间不共享。
#[derive(Clone, Debug)]
pub struct AnimationState {
    /// 当前播放的片段 ID
    pub clip_id: Option<i32>,
    /// 最近一次观察到的循环序号，-1 表示尚未播放
    last_cycle: i64,
}

impl AnimationState {
    pub fn new(clip_id: Option<i32>) -> Self {
        Self {
            clip_id,
            last_cycle: -1,
        }
    }

    /// 记录当前循环序号，进入新一轮循环时返回该序号（首轮不算）
    pub fn observe_cycle(&mut self, cycle: i64) -> Option<i64> {
        if cycle <= self.last_cycle {
            return None;
        }
        let completed = self.last_cycle != -1;
        self.last_cycle = cycle;
        completed.then_some(cycle)
    }

    pub fn last_cycle(&self) -> i64 {
        self.last_cycle
    }
}

impl Default for AnimationState {
    fn default() -> Self {
        Self::new(None)
    }
}
