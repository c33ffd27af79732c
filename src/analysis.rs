//! Analysis pass
//!
//! A first walk over the record stream. It validates the record framing and
//! builds an immutable side table consulted by the render pass:
//!
//! - the list of records (offset, kind, size), ending with EOF
//! - one [`PathEntry`] per BEGINPATH, in order of appearance
//! - whether any comment carries EMF+ data
//!
//! Any framing error here is structural: no output is produced.

use log::debug;

use crate::bounds::RecordReader;
use crate::emf_records::*;
use crate::error::{ConvertError, Result};
use crate::geometry::XForm;

/// MODIFYWORLDTRANSFORM modes, SET is used for SETWORLDTRANSFORM.
pub const MWT_IDENTITY: u32 = 1;
pub const MWT_LEFTMULTIPLY: u32 = 2;
pub const MWT_RIGHTMULTIPLY: u32 = 3;
pub const MWT_SET: u32 = 4;

/// A validated record header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordRef {
    pub offset: usize,
    pub kind: u32,
    pub size: usize,
}

/// A world transform change met while a path was open.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeferredTransform {
    /// One of the `MWT_*` modes.
    pub mode: u32,
    pub xform: XForm,
}

/// What happened to one BEGINPATH..ENDPATH bracket.
///
/// Offsets point at the record that consumed the path. Transforms set
/// before the path drew anything are replayed at BEGINPATH, the others at
/// ENDPATH.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathEntry {
    pub fill: Option<usize>,
    pub stroke: Option<usize>,
    pub stroke_fill: Option<usize>,
    pub flatten: Option<usize>,
    pub widen: Option<usize>,
    pub select_clip: Option<usize>,
    pub abort: Option<usize>,
    pub before: Vec<DeferredTransform>,
    pub after: Vec<DeferredTransform>,
}

impl PathEntry {
    pub fn is_filled(&self) -> bool {
        self.fill.is_some() || self.stroke_fill.is_some()
    }

    pub fn is_stroked(&self) -> bool {
        self.stroke.is_some() || self.stroke_fill.is_some()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Analysis {
    pub records: Vec<RecordRef>,
    pub paths: Vec<PathEntry>,
    pub has_emfplus: bool,
}

/// Walk the record stream once and validate its framing.
pub fn analyse(data: &[u8]) -> Result<Analysis> {
    let mut analysis = Analysis::default();
    let mut offset = 0usize;
    let mut in_path = false;
    let mut path_drawn = false;

    loop {
        if offset >= data.len() {
            return Err(ConvertError::structural(
                "record stream ends without an EOF record",
            ));
        }
        let record = read_header(data, offset)?;
        let index = analysis.records.len();
        if index == 0 && record.kind != EMR_HEADER {
            return Err(ConvertError::structural(
                "metafile does not begin with an EMR_HEADER record",
            ));
        }
        if index > 0 && record.kind == EMR_HEADER {
            return Err(ConvertError::structural(
                "metafile contains more than one EMR_HEADER record",
            ));
        }
        analysis.records.push(record);
        let body = &data[record.offset..record.offset + record.size];

        match record.kind {
            EMR_EOF => break,
            EMR_BEGINPATH => {
                analysis.paths.push(PathEntry::default());
                in_path = true;
                path_drawn = false;
            }
            EMR_ENDPATH => {
                in_path = false;
                path_drawn = false;
            }
            EMR_SETWORLDTRANSFORM | EMR_MODIFYWORLDTRANSFORM if in_path => {
                let mut reader = RecordReader::at(body, RECORD_HEADER_SIZE)?;
                let xform = reader.read_xform().map_err(framing)?;
                let mode = if record.kind == EMR_SETWORLDTRANSFORM {
                    MWT_SET
                } else {
                    reader.read_u32().map_err(framing)?
                };
                if let Some(entry) = analysis.paths.last_mut() {
                    let deferred = DeferredTransform { mode, xform };
                    if path_drawn {
                        entry.after.push(deferred);
                    } else {
                        entry.before.push(deferred);
                    }
                }
            }
            EMR_COMMENT => {
                analysis.has_emfplus |= comment_is_emfplus(body);
            }
            kind if in_path && draws_geometry(kind) => path_drawn = true,
            kind => {
                if let Some(entry) = analysis.paths.last_mut() {
                    let slot = match kind {
                        EMR_FILLPATH => Some(&mut entry.fill),
                        EMR_STROKEPATH => Some(&mut entry.stroke),
                        EMR_STROKEANDFILLPATH => Some(&mut entry.stroke_fill),
                        EMR_FLATTENPATH => Some(&mut entry.flatten),
                        EMR_WIDENPATH => Some(&mut entry.widen),
                        EMR_SELECTCLIPPATH => Some(&mut entry.select_clip),
                        EMR_ABORTPATH => Some(&mut entry.abort),
                        _ => None,
                    };
                    if let Some(slot) = slot {
                        *slot = Some(record.offset);
                    }
                }
            }
        }
        offset += record.size;
    }

    debug!(
        "analysed {} records, {} paths, emf+: {}",
        analysis.records.len(),
        analysis.paths.len(),
        analysis.has_emfplus
    );
    Ok(analysis)
}

/// Read and validate one record header at `offset`.
fn read_header(data: &[u8], offset: usize) -> Result<RecordRef> {
    let mut reader = RecordReader::at(data, offset).map_err(framing)?;
    let kind = reader.read_u32().map_err(framing)?;
    let size = reader.read_u32().map_err(framing)? as usize;
    if size < RECORD_HEADER_SIZE {
        return Err(ConvertError::structural(format!(
            "record {} at offset {} is smaller than its header ({} bytes)",
            record_name(kind),
            offset,
            size
        )));
    }
    match offset.checked_add(size) {
        Some(end) if end <= data.len() => Ok(RecordRef { offset, kind, size }),
        _ => Err(ConvertError::structural(format!(
            "record {} at offset {} claims {} bytes past the end of the buffer",
            record_name(kind),
            offset,
            size
        ))),
    }
}

fn framing(err: ConvertError) -> ConvertError {
    ConvertError::structural(err.to_string())
}

/// Records that add visible geometry to an open path.
fn draws_geometry(kind: u32) -> bool {
    matches!(
        kind,
        EMR_POLYBEZIER
            | EMR_POLYGON
            | EMR_POLYLINE
            | EMR_POLYBEZIERTO
            | EMR_POLYLINETO
            | EMR_POLYPOLYLINE
            | EMR_POLYPOLYGON
            | EMR_LINETO
            | EMR_ARCTO
            | EMR_POLYDRAW
            | EMR_POLYBEZIER16
            | EMR_POLYGON16
            | EMR_POLYLINE16
            | EMR_POLYBEZIERTO16
            | EMR_POLYLINETO16
            | EMR_POLYPOLYLINE16
            | EMR_POLYPOLYGON16
            | EMR_POLYDRAW16
            | EMR_ANGLEARC
            | EMR_ARC
            | EMR_CHORD
            | EMR_PIE
            | EMR_ELLIPSE
            | EMR_RECTANGLE
            | EMR_ROUNDRECT
    )
}

/// True when a COMMENT record body starts with the EMF+ identifier.
pub fn comment_is_emfplus(body: &[u8]) -> bool {
    let mut reader = RecordReader::new(body);
    if reader.seek(RECORD_HEADER_SIZE).is_err() {
        return false;
    }
    match (reader.read_u32(), reader.read_u32()) {
        (Ok(cb_data), Ok(ident)) => cb_data >= 4 && ident == EMR_COMMENT_EMFPLUS,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(kind: u32, payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&kind.to_le_bytes());
        out.extend_from_slice(&((payload.len() + 8) as u32).to_le_bytes());
        out.extend_from_slice(payload);
        out
    }

    fn stream(records: &[Vec<u8>]) -> Vec<u8> {
        records.concat()
    }

    fn xform_payload(mode: Option<u32>) -> Vec<u8> {
        let mut out = Vec::new();
        for v in [2.0f32, 0.0, 0.0, 2.0, 0.0, 0.0] {
            out.extend_from_slice(&v.to_le_bytes());
        }
        if let Some(mode) = mode {
            out.extend_from_slice(&mode.to_le_bytes());
        }
        out
    }

    #[test]
    fn test_minimal_stream() {
        let data = stream(&[record(EMR_HEADER, &[0; 80]), record(EMR_EOF, &[0; 12])]);
        let analysis = analyse(&data).unwrap();
        assert_eq!(analysis.records.len(), 2);
        assert_eq!(analysis.records[1].kind, EMR_EOF);
        assert!(!analysis.has_emfplus);
    }

    #[test]
    fn test_missing_header_is_structural() {
        let data = stream(&[record(EMR_SAVEDC, &[]), record(EMR_EOF, &[0; 12])]);
        assert!(matches!(analyse(&data), Err(ConvertError::Structural(_))));
    }

    #[test]
    fn test_duplicate_header_is_structural() {
        let data = stream(&[
            record(EMR_HEADER, &[0; 80]),
            record(EMR_HEADER, &[0; 80]),
            record(EMR_EOF, &[0; 12]),
        ]);
        assert!(matches!(analyse(&data), Err(ConvertError::Structural(_))));
    }

    #[test]
    fn test_truncation_is_structural() {
        let data = stream(&[record(EMR_HEADER, &[0; 80]), record(EMR_EOF, &[0; 12])]);
        for cut in [4, 50, 90, data.len() - 1] {
            assert!(
                matches!(analyse(&data[..cut]), Err(ConvertError::Structural(_))),
                "cut at {}",
                cut
            );
        }
    }

    #[test]
    fn test_undersized_record_is_structural() {
        let mut data = record(EMR_HEADER, &[0; 80]);
        data.extend_from_slice(&EMR_SAVEDC.to_le_bytes());
        data.extend_from_slice(&4u32.to_le_bytes());
        assert!(matches!(analyse(&data), Err(ConvertError::Structural(_))));
    }

    #[test]
    fn test_path_offsets_and_deferred_transforms() {
        let data = stream(&[
            record(EMR_HEADER, &[0; 80]),
            record(EMR_BEGINPATH, &[]),
            record(EMR_SETWORLDTRANSFORM, &xform_payload(None)),
            record(EMR_LINETO, &[0; 8]),
            record(EMR_MODIFYWORLDTRANSFORM, &xform_payload(Some(MWT_LEFTMULTIPLY))),
            record(EMR_ENDPATH, &[]),
            record(EMR_STROKEPATH, &[0; 16]),
            record(EMR_EOF, &[0; 12]),
        ]);
        let analysis = analyse(&data).unwrap();
        assert_eq!(analysis.paths.len(), 1);
        let entry = &analysis.paths[0];
        assert_eq!(entry.before.len(), 1);
        assert_eq!(entry.before[0].mode, MWT_SET);
        assert_eq!(entry.after[0].mode, MWT_LEFTMULTIPLY);
        assert_eq!(entry.stroke, Some(analysis.records[6].offset));
        assert!(entry.is_stroked());
        assert!(!entry.is_filled());
    }

    #[test]
    fn test_emfplus_comment_detected() {
        let mut payload = Vec::new();
        payload.extend_from_slice(&4u32.to_le_bytes());
        payload.extend_from_slice(&EMR_COMMENT_EMFPLUS.to_le_bytes());
        let data = stream(&[
            record(EMR_HEADER, &[0; 80]),
            record(EMR_COMMENT, &payload),
            record(EMR_EOF, &[0; 12]),
        ]);
        assert!(analyse(&data).unwrap().has_emfplus);
    }
}
