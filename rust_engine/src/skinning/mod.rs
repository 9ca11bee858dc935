//! 顶点蒙皮计算（CPU 侧）
//!
//! 渲染器在 GPU 上做同样的混合，这里供无窗口的调用方检查摆好姿势的网格。

mod skinning;

pub use skinning::{compute_skinning, skin_vertex};
