//! State-only records: device context attributes, mapping, SAVEDC/RESTOREDC
//! and the world transform.

use log::warn;

use super::Renderer;
use crate::analysis::MWT_SET;
use crate::bounds::RecordReader;
use crate::device_context::Color;
use crate::error::{ConvertError, Result};
use crate::geometry::PointD;
use crate::transform::MapMode;

fn read_u32_at(rec: &[u8], offset: usize) -> Result<u32> {
    RecordReader::at(rec, offset)?.read_u32()
}

fn read_pair(rec: &[u8]) -> Result<(f64, f64)> {
    let mut reader = RecordReader::at(rec, 8)?;
    Ok((reader.read_i32()? as f64, reader.read_i32()? as f64))
}

pub(crate) fn set_map_mode(r: &mut Renderer<'_>, rec: &[u8]) -> Result<()> {
    let mode = read_u32_at(rec, 8)?;
    match MapMode::from_u32(mode) {
        Some(m) => r.dc.mapping.map_mode = m,
        None => warn!("unknown map mode {}", mode),
    }
    Ok(())
}

pub(crate) fn set_bk_mode(r: &mut Renderer<'_>, rec: &[u8]) -> Result<()> {
    r.dc.bk_mode = read_u32_at(rec, 8)?;
    Ok(())
}

pub(crate) fn set_polyfill_mode(r: &mut Renderer<'_>, rec: &[u8]) -> Result<()> {
    r.dc.polyfill_mode = read_u32_at(rec, 8)?;
    Ok(())
}

pub(crate) fn set_rop2(r: &mut Renderer<'_>, rec: &[u8]) -> Result<()> {
    r.dc.rop2 = read_u32_at(rec, 8)?;
    Ok(())
}

pub(crate) fn set_stretch_mode(r: &mut Renderer<'_>, rec: &[u8]) -> Result<()> {
    r.dc.stretch_mode = read_u32_at(rec, 8)?;
    Ok(())
}

pub(crate) fn set_text_align(r: &mut Renderer<'_>, rec: &[u8]) -> Result<()> {
    r.dc.text_align = read_u32_at(rec, 8)?;
    Ok(())
}

pub(crate) fn set_text_color(r: &mut Renderer<'_>, rec: &[u8]) -> Result<()> {
    r.dc.text_color = Color::from_colorref(read_u32_at(rec, 8)?);
    Ok(())
}

pub(crate) fn set_bk_color(r: &mut Renderer<'_>, rec: &[u8]) -> Result<()> {
    r.dc.bk_color = Color::from_colorref(read_u32_at(rec, 8)?);
    Ok(())
}

pub(crate) fn set_arc_direction(r: &mut Renderer<'_>, rec: &[u8]) -> Result<()> {
    let direction = read_u32_at(rec, 8)?;
    r.dc.set_arc_direction(direction);
    Ok(())
}

pub(crate) fn set_miter_limit(r: &mut Renderer<'_>, rec: &[u8]) -> Result<()> {
    r.dc.miter_limit = read_u32_at(rec, 8)? as f64;
    Ok(())
}

pub(crate) fn set_layout(r: &mut Renderer<'_>, rec: &[u8]) -> Result<()> {
    r.text_layout = read_u32_at(rec, 8)?;
    Ok(())
}

pub(crate) fn set_window_ext(r: &mut Renderer<'_>, rec: &[u8]) -> Result<()> {
    let (x, y) = read_pair(rec)?;
    r.dc.mapping.window.ext_x = x;
    r.dc.mapping.window.ext_y = y;
    Ok(())
}

pub(crate) fn set_window_org(r: &mut Renderer<'_>, rec: &[u8]) -> Result<()> {
    let (x, y) = read_pair(rec)?;
    r.dc.mapping.window.org_x = x;
    r.dc.mapping.window.org_y = y;
    Ok(())
}

pub(crate) fn set_viewport_ext(r: &mut Renderer<'_>, rec: &[u8]) -> Result<()> {
    let (x, y) = read_pair(rec)?;
    r.dc.mapping.viewport.ext_x = x;
    r.dc.mapping.viewport.ext_y = y;
    Ok(())
}

pub(crate) fn set_viewport_org(r: &mut Renderer<'_>, rec: &[u8]) -> Result<()> {
    let (x, y) = read_pair(rec)?;
    r.dc.mapping.viewport.org_x = x;
    r.dc.mapping.viewport.org_y = y;
    Ok(())
}

/// `num / denom` factors of the SCALE*EXTEX records. A zero denominator
/// leaves the axis unchanged.
fn read_scale(rec: &[u8]) -> Result<(f64, f64)> {
    let mut reader = RecordReader::at(rec, 8)?;
    let (x_num, x_denom) = (reader.read_i32()?, reader.read_i32()?);
    let (y_num, y_denom) = (reader.read_i32()?, reader.read_i32()?);
    let factor = |num: i32, denom: i32| if denom == 0 { 1.0 } else { num as f64 / denom as f64 };
    Ok((factor(x_num, x_denom), factor(y_num, y_denom)))
}

pub(crate) fn scale_window_ext(r: &mut Renderer<'_>, rec: &[u8]) -> Result<()> {
    let (fx, fy) = read_scale(rec)?;
    r.dc.mapping.window.ext_x *= fx;
    r.dc.mapping.window.ext_y *= fy;
    Ok(())
}

pub(crate) fn scale_viewport_ext(r: &mut Renderer<'_>, rec: &[u8]) -> Result<()> {
    let (fx, fy) = read_scale(rec)?;
    r.dc.mapping.viewport.ext_x *= fx;
    r.dc.mapping.viewport.ext_y *= fy;
    Ok(())
}

pub(crate) fn move_to(r: &mut Renderer<'_>, rec: &[u8]) -> Result<()> {
    let p = RecordReader::at(rec, 8)?.read_point_l()?;
    if r.in_path {
        r.move_to(p);
    } else {
        r.cur = PointD::new(p.x as f64, p.y as f64);
    }
    Ok(())
}

pub(crate) fn save_dc(r: &mut Renderer<'_>, _rec: &[u8]) -> Result<()> {
    r.stack.save(&r.dc);
    Ok(())
}

/// A depth past the bottom of the stack raises the error flag and leaves
/// the context unchanged; the walk goes on.
pub(crate) fn restore_dc(r: &mut Renderer<'_>, rec: &[u8]) -> Result<()> {
    let relative = RecordReader::at(rec, 8)?.read_i32()?;
    match r.stack.restore(relative) {
        Ok(dc) => {
            let transform_changed = dc.world_transform != r.dc.world_transform
                || dc.mapping != r.dc.mapping;
            r.dc = dc;
            if transform_changed && !r.in_path {
                r.transform_group();
            }
        }
        Err(ConvertError::Bounds(msg)) => r.flag_error(&msg),
        Err(err) => return Err(err),
    }
    Ok(())
}

/// Inside a path the change was already recorded by the analysis pass and
/// is replayed at BEGINPATH or ENDPATH.
pub(crate) fn set_world_transform(r: &mut Renderer<'_>, rec: &[u8]) -> Result<()> {
    if r.in_path {
        return Ok(());
    }
    let xform = RecordReader::at(rec, 8)?.read_xform()?;
    r.apply_transform(&xform, MWT_SET);
    r.transform_group();
    Ok(())
}

pub(crate) fn modify_world_transform(r: &mut Renderer<'_>, rec: &[u8]) -> Result<()> {
    if r.in_path {
        return Ok(());
    }
    let mut reader = RecordReader::at(rec, 8)?;
    let xform = reader.read_xform()?;
    let mode = reader.read_u32()?;
    if r.apply_transform(&xform, mode) {
        r.transform_group();
    } else {
        warn!("unknown MODIFYWORLDTRANSFORM mode {}", mode);
    }
    Ok(())
}
