//! 引擎运行配置
//!
//! 所有参数扁平化，直接在代码中修改默认值即可。

use once_cell::sync::Lazy;

/// 引擎配置（扁平化，不嵌套）
#[derive(Debug, Clone)]
pub struct EngineConfig {
    // ========== 骨骼 ==========
    /// 蒙皮矩阵缓冲区容量（骨骼上限），默认 100
    pub max_bones: usize,
    /// fps <= 0 时的回退帧率，默认 30.0
    pub default_fps: f32,
    /// 行列式绝对值低于此值时视为奇异矩阵，逆绑定矩阵用单位矩阵代替
    pub singular_epsilon: f32,

    // ========== 分层 ==========
    /// Y 缩放最小值低于此值的骨骼视为"眨眼"遮罩骨骼，默认 0.2
    pub blink_scale_threshold: f32,
    /// 主骨骼权重阈值，默认 0.5
    pub dominant_weight_threshold: f32,
    /// 包围盒宽度超过此值时认为网格使用像素坐标，默认 2.0
    pub pixel_scale_width: f32,

    // ========== 资源 ==========
    /// 纹理扩展名，按顺序尝试
    pub texture_extensions: Vec<String>,
    /// 纹理所在子目录
    pub materials_dir: String,
    /// 项目描述文件名
    pub project_file: String,
    /// 每个对象最多绑定的辅助纹理数
    pub max_aux_textures: usize,
    /// 场景未声明正交投影时使用的尺寸
    pub default_projection: (f32, f32),

    // ========== 调试 ==========
    /// 是否输出逐对象调试日志，默认 false
    pub debug_log: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_bones: 100,
            default_fps: 30.0,
            singular_epsilon: 1e-6,

            blink_scale_threshold: 0.2,
            dominant_weight_threshold: 0.5,
            pixel_scale_width: 2.0,

            texture_extensions: ["png", "jpg", "jpeg", "tga", "bmp"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            materials_dir: "materials".to_string(),
            project_file: "project.json".to_string(),
            // 与着色器纹理槽位一致：0 号为主纹理，1..=8 为辅助纹理
            max_aux_textures: 8,
            default_projection: (1920.0, 1080.0),

            debug_log: false,
        }
    }
}

/// 全局配置实例
static ENGINE_CONFIG: Lazy<EngineConfig> = Lazy::new(EngineConfig::default);

/// 获取当前配置（只读）
pub fn get_config() -> EngineConfig {
    ENGINE_CONFIG.clone()
}
