//! COMMENT records
//!
//! Only EMF+ comments are interpreted; every other comment is ignored.

use super::Renderer;
use crate::analysis::comment_is_emfplus;
use crate::bounds::{slice_at, RecordReader};
use crate::error::Result;

/// EMF+ records start after the record header, cbData and the identifier.
const EMFPLUS_DATA_OFFSET: usize = 16;

pub(crate) fn comment(r: &mut Renderer<'_>, rec: &[u8]) -> Result<()> {
    if !r.options.emfplus || !comment_is_emfplus(rec) {
        return Ok(());
    }
    let cb_data = RecordReader::at(rec, 8)?.read_u32()? as usize;
    // cbData counts the 4-byte identifier
    let data = slice_at(rec, EMFPLUS_DATA_OFFSET, cb_data.saturating_sub(4))?;
    let scaling = r.page.scaling;
    r.outside_path(|r| r.emfplus.play(data, &mut r.w, scaling));
    Ok(())
}
