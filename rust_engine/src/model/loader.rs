//! MDL 模型加载器

use std::collections::HashMap;
use std::path::Path;

use glam::{Mat4, Vec2, Vec3};

use crate::animation::{AnimationClip, BoneKeyframe, FLOATS_PER_FRAME};
use crate::config::get_config;
use crate::skeleton::{Bone, BoneManager};
use crate::{Result, WpError};

use super::{clamp_joint, BinaryReader, MdlFormat, MdlMesh, SkinnedVertex};

const STANDARD_MARKER: u32 = 0x0180_0009;
const ALTERNATE_MARKER: u32 = 0x0180_000F;
const INCOMPLETE_PUPPET_FLAG: i32 = 9;
const BONE_STRUCT_SIZE: u32 = 64;
const SIGNATURE_LEN: i32 = 8;
const ATTACHMENT_RECORD_SIZE: usize = 64;
const FRAME_BYTES: usize = FLOATS_PER_FRAME * 4;

/// 解码结果
pub struct MdlModel {
    pub format: MdlFormat,
    /// 头部记录的材质路径
    pub material_path: String,
    pub mesh: MdlMesh,
    /// 已完成 prepare 的骨骼和动画
    pub skeleton: BoneManager,
}

/// 从文件加载 MDL 模型
pub fn load_mdl<P: AsRef<Path>>(path: P) -> Result<MdlModel> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(WpError::AssetMissing(path.display().to_string()));
    }
    let data = std::fs::read(path)?;
    decode_mdl(&data)
}

/// 从字节缓冲区解码 MDL 模型
pub fn decode_mdl(data: &[u8]) -> Result<MdlModel> {
    let mut reader = BinaryReader::new(data);

    let material_path = read_header(&mut reader)?;
    let (format, vertex_block) = detect_format(&mut reader)?;
    let vertices = read_vertices(&mut reader, format, vertex_block)?;
    let indices = read_indices(&mut reader)?;

    let mut skeleton = BoneManager::new();
    let (bones_version, bone_count) = read_bones(&mut reader, &mut skeleton)?;
    if bones_version > 1 {
        skip_bone_extras(&mut reader, bone_count)?;
    }

    if let Some(version) = find_animation_section(&mut reader)? {
        if version != 0 {
            for clip in read_clips(&mut reader, format, version)? {
                skeleton.add_clip(clip);
            }
        }
    }

    skeleton.prepare();

    log::info!(
        "MDL 解码完成: {:?}, {} 顶点, {} 索引, {} 骨骼, {} 动画",
        format,
        vertices.len(),
        indices.len(),
        skeleton.bone_count(),
        skeleton.clips().len()
    );

    Ok(MdlModel {
        format,
        material_path,
        mesh: MdlMesh { vertices, indices },
        skeleton,
    })
}

fn read_header(reader: &mut BinaryReader) -> Result<String> {
    let _version = reader.read_i32()?;
    let flag = reader.read_i32()?;
    if flag == INCOMPLETE_PUPPET_FLAG {
        return Err(WpError::Format("Puppet 不完整 (flag = 9)".to_string()));
    }
    reader.skip(8)?;
    let material_path = reader.read_string()?;
    reader.skip(4)?;
    Ok(material_path)
}

/// 识别顶点布局，返回布局和顶点块字节数
fn detect_format(reader: &mut BinaryReader) -> Result<(MdlFormat, u32)> {
    let marker = reader.read_u32()?;
    match marker {
        0 => {
            // 长度未声明的填充块，向前扫描到备用标记
            loop {
                if reader.remaining() < 4 {
                    return Err(WpError::Format("未找到顶点块标记".to_string()));
                }
                if reader.read_u32()? == ALTERNATE_MARKER {
                    break;
                }
            }
            Ok((MdlFormat::Alternate, reader.read_u32()?))
        }
        STANDARD_MARKER => Ok((MdlFormat::Standard, reader.read_u32()?)),
        size => Ok((MdlFormat::Standard, size)),
    }
}

fn read_vertices(
    reader: &mut BinaryReader,
    format: MdlFormat,
    block_size: u32,
) -> Result<Vec<SkinnedVertex>> {
    let stride = format.vertex_stride();
    if block_size % stride != 0 {
        return Err(WpError::Format(format!(
            "顶点块大小 {} 不是步长 {} 的整数倍",
            block_size, stride
        )));
    }
    let count = (block_size / stride) as usize;
    if count * stride as usize > reader.remaining() {
        return Err(WpError::Format(format!("顶点块越界: {} 个顶点", count)));
    }

    let max_bones = get_config().max_bones;
    let mut vertices = Vec::with_capacity(count);
    for _ in 0..count {
        let position = reader.read_f32_array::<3>()?;
        if format == MdlFormat::Alternate {
            reader.skip(7 * 4)?;
        }
        let blend_indices = reader.read_u32_array::<4>()?;
        let weights = reader.read_f32_array::<4>()?;
        let uv = reader.read_f32_array::<2>()?;

        vertices.push(SkinnedVertex::new(
            Vec3::from_array(position),
            Vec2::from_array(uv),
            blend_indices.map(|i| clamp_joint(i, max_bones)),
            weights,
        ));
    }
    Ok(vertices)
}

fn read_indices(reader: &mut BinaryReader) -> Result<Vec<u16>> {
    let byte_size = reader.read_u32()? as usize;
    let count = byte_size / 2;
    let mut indices = Vec::with_capacity(count.min(reader.remaining() / 2));
    for _ in 0..count {
        indices.push(reader.read_u16()?);
    }
    Ok(indices)
}

/// 读取 MDLS 骨骼段，返回 (段版本, 骨骼数)
fn read_bones(reader: &mut BinaryReader, skeleton: &mut BoneManager) -> Result<(i32, usize)> {
    let version = reader.read_i32()?;
    let _section_end = reader.read_u32()?;
    let bone_count = reader.read_u16()? as usize;
    reader.skip(2)?;

    for i in 0..bone_count {
        let name = reader.read_string()?;
        reader.skip(4)?;
        // 0xFFFFFFFF 即 -1
        let parent = reader.read_u32()? as i32;

        let size = reader.read_u32()?;
        if size != BONE_STRUCT_SIZE {
            return Err(WpError::Format(format!(
                "骨骼 {} 结构大小为 {}，应为 {}",
                i, size, BONE_STRUCT_SIZE
            )));
        }
        let bind = Mat4::from_cols_array(&reader.read_f32_array::<16>()?);
        let _simulation_json = reader.read_string()?;

        skeleton.add_bone(Bone::new(i as i32, name, parent, bind));
    }

    Ok((version, bone_count))
}

/// 跳过版本 > 1 的骨骼附加数据，每块由一个字节标志控制
fn skip_bone_extras(reader: &mut BinaryReader, bone_count: usize) -> Result<()> {
    let unknown = reader.read_i16()?;
    if unknown != 0 {
        log::warn!("MDLS 附加数据首字段非零: {}", unknown);
    }
    if reader.read_u8()? != 0 {
        reader.skip(bone_count * 16 * 4)?;
    }
    let triples = reader.read_u32()? as usize;
    reader.skip(triples * 3 * 4)?;
    reader.skip(4)?;
    if reader.read_u8()? != 0 {
        // 位置 (3) + 矩阵 (16)
        reader.skip(bone_count * 19 * 4)?;
    }
    if reader.read_u8()? != 0 {
        reader.skip(bone_count * 4)?;
    }
    Ok(())
}

/// 扫描签名直到 MDLA，返回其版本号；到达末尾返回 None
fn find_animation_section(reader: &mut BinaryReader) -> Result<Option<i32>> {
    while reader.position() + 8 < reader.len() {
        let len = reader.read_i32()?;
        if len <= 0 || len as usize > reader.remaining() {
            continue;
        }
        if len != SIGNATURE_LEN {
            reader.skip(len as usize)?;
            continue;
        }

        let signature = reader.read_bytes(8)?;
        let (tag, version) = signature.split_at(4);
        match tag {
            b"MDLA" => {
                let version = std::str::from_utf8(version)
                    .ok()
                    .and_then(|v| v.parse::<i32>().ok())
                    .unwrap_or(0);
                return Ok(Some(version));
            }
            b"MDAT" => skip_attachments(reader)?,
            _ => {}
        }
    }
    Ok(None)
}

fn skip_attachments(reader: &mut BinaryReader) -> Result<()> {
    reader.skip(4)?;
    let count = reader.read_u16()?;
    for _ in 0..count {
        reader.skip(2)?;
        let _name = reader.read_string()?;
        reader.skip(ATTACHMENT_RECORD_SIZE)?;
    }
    Ok(())
}

fn read_clips(reader: &mut BinaryReader, format: MdlFormat, version: i32) -> Result<Vec<AnimationClip>> {
    let _section_end = reader.read_u32()?;
    let clip_count = reader.read_u32()?;
    let mut clips = Vec::new();

    for _ in 0..clip_count {
        let mut id = reader.read_i32()?;
        while id == 0 {
            id = reader.read_i32()?;
        }
        reader.skip(4)?;
        let mut name = reader.read_string()?;
        if name.is_empty() {
            name = reader.read_string()?;
        }
        let _play_mode = reader.read_string()?;
        let fps = reader.read_f32()?;
        let length = reader.read_i32()?;
        reader.skip(4)?;

        let track_count = reader.read_u32()?;
        let mut tracks = HashMap::new();
        for track_index in 0..track_count {
            // 轨道按出现顺序对应骨骼索引
            let _bone_hint = reader.read_i32()?;
            let byte_size = reader.read_u32()? as usize;
            let frame_count = byte_size / FRAME_BYTES;
            let mut frames = Vec::with_capacity(frame_count.min(reader.remaining() / FRAME_BYTES));
            for _ in 0..frame_count {
                frames.push(BoneKeyframe::from_floats(&reader.read_f32_array::<FLOATS_PER_FRAME>()?));
            }
            reader.skip(byte_size % FRAME_BYTES)?;
            tracks.insert(track_index as i32, frames);
        }

        match (format, version) {
            (MdlFormat::Alternate, _) => reader.skip(2)?,
            (_, 3) => reader.skip(1)?,
            _ => {
                let extra = reader.read_u32()?;
                for _ in 0..extra {
                    reader.skip(4)?;
                    let _ = reader.read_string()?;
                }
            }
        }

        log::debug!("动画片段 {} '{}': {} fps, {} 帧, {} 轨道", id, name, fps, length, tracks.len());
        clips.push(AnimationClip::new(id, name, fps, length, tracks));
    }
    Ok(clips)
}
