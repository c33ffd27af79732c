mod common;

use common::*;
use emf2svg::{convert, ConversionOptions};

const HEADER: u16 = 0x4001;
const OBJECT: u16 = 0x4008;
const FILL_RECTS: u16 = 0x400A;
const DRAW_LINES: u16 = 0x400D;

const OBJECT_BRUSH: u16 = 0x0100;
const OBJECT_PEN: u16 = 0x0200;
const CONTINUED: u16 = 0x8000;

fn plus_header(dual: bool) -> Vec<u8> {
    plus_record(HEADER, dual as u16, &u32s(&[0xDBC0_1002, 0, 96, 96]))
}

fn brush_body(argb: u32) -> Vec<u8> {
    u32s(&[0xDBC0_1002, 0, argb])
}

/// FILLRECTS with brush object 3 and one integer rectangle.
fn fill_rect_with_brush_3() -> Vec<u8> {
    let mut payload = u32s(&[3, 1]);
    for v in [10i16, 20, 30, 40] {
        payload.extend_from_slice(&v.to_le_bytes());
    }
    plus_record(FILL_RECTS, 0x4000, &payload)
}

fn picture(object_comments: Vec<Vec<u8>>) -> Vec<u8> {
    let mut body = vec![emfplus_comment(&plus_header(false))];
    body.extend(object_comments);
    body.push(emfplus_comment(&fill_rect_with_brush_3()));
    metafile(&body)
}

#[test]
fn test_fill_rects_from_brush_object() {
    let object = plus_record(OBJECT, OBJECT_BRUSH | 3, &brush_body(0xFF00_80FF));
    let svg = convert(&picture(vec![emfplus_comment(&object)]), &ConversionOptions::default()).unwrap();
    assert!(svg.contains("d=\"M 10,20 L 40,20 L 40,60 L 10,60 Z\""), "{}", svg);
    assert!(svg.contains("fill=\"#0080FF\""));
}

#[test]
fn test_object_split_across_three_comments() {
    let body = brush_body(0xFF12_3456);
    let single = picture(vec![emfplus_comment(&plus_record(OBJECT, OBJECT_BRUSH | 3, &body))]);

    let total = (body.len() as u32).to_le_bytes();
    let fragments = body
        .chunks(4)
        .map(|chunk| {
            let mut payload = total.to_vec();
            payload.extend_from_slice(chunk);
            emfplus_comment(&plus_record(OBJECT, CONTINUED | OBJECT_BRUSH | 3, &payload))
        })
        .collect::<Vec<_>>();
    assert_eq!(fragments.len(), 3);
    let split = picture(fragments);

    let options = ConversionOptions::default();
    let expected = convert(&single, &options).unwrap();
    assert!(expected.contains("fill=\"#123456\""));
    assert_eq!(convert(&split, &options).unwrap(), expected);
}

#[test]
fn test_unrelated_record_ends_pending_object() {
    let body = brush_body(0xFF00_FF00);
    // declares more bytes than ever arrive
    let mut payload = 64u32.to_le_bytes().to_vec();
    payload.extend_from_slice(&body);
    let object = plus_record(OBJECT, CONTINUED | OBJECT_BRUSH | 3, &payload);
    let svg = convert(&picture(vec![emfplus_comment(&object)]), &ConversionOptions::default()).unwrap();
    assert!(svg.contains("fill=\"#00FF00\""));
}

#[test]
fn test_dual_mode_skips_drawing() {
    let object = plus_record(OBJECT, OBJECT_BRUSH | 3, &brush_body(0xFF00_80FF));
    let data = metafile(&[
        emfplus_comment(&plus_header(true)),
        emfplus_comment(&object),
        emfplus_comment(&fill_rect_with_brush_3()),
    ]);
    let svg = convert(&data, &ConversionOptions::default()).unwrap();
    assert!(!svg.contains("#0080FF"));
}

#[test]
fn test_emfplus_disabled() {
    let object = plus_record(OBJECT, OBJECT_BRUSH | 3, &brush_body(0xFF00_80FF));
    let data = picture(vec![emfplus_comment(&object)]);
    let svg = convert(&data, &ConversionOptions::default().with_emfplus(false)).unwrap();
    assert!(!svg.contains("#0080FF"));
}

#[test]
fn test_draw_lines_with_pen() {
    let mut pen = u32s(&[0xDBC0_1002, 0, 0, 0]);
    pen.extend(f32s(&[2.0]));
    pen.extend(brush_body(0x80FF_0000));
    let mut lines = u32s(&[2]);
    lines.extend(f32s(&[0.0, 0.0, 50.0, 0.0]));
    let plus = [
        plus_header(false),
        plus_record(OBJECT, OBJECT_PEN | 1, &pen),
        plus_record(DRAW_LINES, 1, &lines),
    ]
    .concat();
    let svg = convert(&metafile(&[emfplus_comment(&plus)]), &ConversionOptions::default()).unwrap();
    assert!(svg.contains("d=\"M 0,0 L 50,0\""), "{}", svg);
    assert!(svg.contains("stroke=\"#FF0000\""));
    assert!(svg.contains("stroke-width=\"2\""));
    assert!(svg.contains("stroke-opacity=\"0.502\""));
}

#[test]
fn test_emfplus_inside_open_path_follows_it() {
    use emf2svg::emf_records::*;

    let object = plus_record(OBJECT, OBJECT_BRUSH | 3, &brush_body(0xFF00_80FF));
    let plus = [plus_header(false), object, fill_rect_with_brush_3()].concat();
    let data = metafile(&[
        record(EMR_BEGINPATH, &[]),
        record(EMR_MOVETOEX, &words(&[0, 0])),
        record(EMR_LINETO, &words(&[10, 0])),
        emfplus_comment(&plus),
        record(EMR_LINETO, &words(&[10, 10])),
        record(EMR_ENDPATH, &[]),
        record(EMR_STROKEPATH, &words(&[0, 0, 10, 10])),
    ]);
    let svg = convert(&data, &ConversionOptions::default()).unwrap();
    assert_attributes_clean(&svg);

    let gdi = svg.find("d=\"M 0,0 L 10,0 L 10,10\"").expect("stroked path");
    let plus = svg.find("d=\"M 10,20 L 40,20 L 40,60 L 10,60 Z\"").expect("EMF+ rectangle");
    assert!(gdi < plus);
}

#[test]
fn test_garbage_after_records_is_ignored() {
    let mut plus = plus_header(false);
    plus.extend_from_slice(&[0xFF; 8]);
    let svg = convert(&metafile(&[emfplus_comment(&plus)]), &ConversionOptions::default()).unwrap();
    assert!(svg.trim_end().ends_with("</svg>"));
}
