//! Builders for synthetic EMF streams used by the integration tests.

#![allow(dead_code)]

use emf2svg::emf_records::{EMR_COMMENT, EMR_COMMENT_EMFPLUS, EMR_EOF, EMR_HEADER};

/// Little-endian bytes of a list of 32-bit values.
pub fn words(values: &[i32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

pub fn u32s(values: &[u32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

pub fn f32s(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// One EMF record with the given parameter bytes.
pub fn record(kind: u32, params: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(8 + params.len());
    out.extend_from_slice(&kind.to_le_bytes());
    out.extend_from_slice(&((8 + params.len()) as u32).to_le_bytes());
    out.extend_from_slice(params);
    out
}

/// EMR_HEADER with bounds (0,0)-(1000,1000), a 1000x1000 pixel device
/// and `handles` object slots.
pub fn header(handles: u16) -> Vec<u8> {
    let mut params = words(&[0, 0, 1000, 1000]); // rclBounds
    params.extend(words(&[0, 0, 26458, 26458])); // rclFrame
    params.extend(u32s(&[0x464D_4520, 0x0001_0000, 0, 0])); // signature, version, nBytes, nRecords
    params.extend_from_slice(&handles.to_le_bytes());
    params.extend_from_slice(&0u16.to_le_bytes());
    params.extend(u32s(&[0, 0, 0])); // description, palette
    params.extend(words(&[1000, 1000, 250, 250])); // szlDevice, szlMillimeters
    record(EMR_HEADER, &params)
}

pub fn eof() -> Vec<u8> {
    record(EMR_EOF, &u32s(&[0, 16, 20]))
}

/// A metafile made of a header, `body` records and EOF.
pub fn metafile(body: &[Vec<u8>]) -> Vec<u8> {
    let mut out = header(8);
    for rec in body {
        out.extend_from_slice(rec);
    }
    out.extend(eof());
    out
}

/// Panics when markup shows up inside an attribute value.
pub fn assert_attributes_clean(svg: &str) {
    for (i, value) in svg.split('"').enumerate() {
        if i % 2 == 1 {
            assert!(!value.contains('<'), "element inside attribute value {:?} in {}", value, svg);
        }
    }
}

/// One EMF+ record.
pub fn plus_record(kind: u16, flags: u16, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(12 + payload.len());
    out.extend_from_slice(&kind.to_le_bytes());
    out.extend_from_slice(&flags.to_le_bytes());
    out.extend_from_slice(&((12 + payload.len()) as u32).to_le_bytes());
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(payload);
    out
}

/// EMR_COMMENT carrying EMF+ records.
pub fn emfplus_comment(plus: &[u8]) -> Vec<u8> {
    let mut params = ((plus.len() + 4) as u32).to_le_bytes().to_vec();
    params.extend_from_slice(&EMR_COMMENT_EMFPLUS.to_le_bytes());
    params.extend_from_slice(plus);
    while params.len() % 4 != 0 {
        params.push(0);
    }
    record(EMR_COMMENT, &params)
}
