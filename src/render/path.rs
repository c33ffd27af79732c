//! Explicit paths: BEGINPATH .. ENDPATH
//!
//! The `<path d="` element is opened at BEGINPATH and closed at ENDPATH.
//! Whether it is filled or stroked is known up front from the analysis
//! side table, since FILLPATH/STROKEPATH come after ENDPATH.

use super::Renderer;
use crate::analysis::DeferredTransform;
use crate::error::Result;

pub(crate) fn begin(r: &mut Renderer<'_>, _rec: &[u8]) -> Result<()> {
    if r.in_path {
        r.abandon_path();
    }
    let entry = r.next_path_entry()?;
    r.replay(&entry.before);
    r.w.open("path");
    r.clip_attr();
    r.w.raw("d=\"");
    r.path.clear();
    r.in_path = true;
    Ok(())
}

pub(crate) fn end(r: &mut Renderer<'_>, _rec: &[u8]) -> Result<()> {
    if !r.in_path {
        return Ok(());
    }
    let entry = r.current_path_entry()?;
    r.close_d();
    let stroked = entry.is_stroked() && r.stroke_attrs();
    let filled = entry.is_filled() && r.fill_attrs();
    r.none_defaults(filled, stroked);
    r.w.raw("/>\n");
    r.in_path = false;
    r.release_held();
    r.replay(&entry.after);
    Ok(())
}

pub(crate) fn close_figure(r: &mut Renderer<'_>, _rec: &[u8]) -> Result<()> {
    if r.in_path {
        r.close_figure();
    }
    Ok(())
}

pub(crate) fn abort(r: &mut Renderer<'_>, _rec: &[u8]) -> Result<()> {
    if r.in_path {
        r.abandon_path();
    }
    r.path.clear();
    Ok(())
}

pub(crate) fn flatten(r: &mut Renderer<'_>, _rec: &[u8]) -> Result<()> {
    r.path = r.path.flatten();
    Ok(())
}

impl Renderer<'_> {
    /// Close an open path element without painting it.
    pub(crate) fn abandon_path(&mut self) {
        self.close_d();
        self.w.raw("fill=\"none\" stroke=\"none\" />\n");
        self.in_path = false;
        self.release_held();
    }

    /// Apply world transform changes deferred by the analysis pass, each
    /// with its own mode, and emit the resulting wrapper.
    fn replay(&mut self, deferred: &[DeferredTransform]) {
        if deferred.is_empty() {
            return;
        }
        for t in deferred {
            self.apply_transform(&t.xform, t.mode);
        }
        self.transform_group();
    }
}
