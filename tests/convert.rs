mod common;

use common::*;
use emf2svg::emf_records::*;
use emf2svg::{convert, convert_with_status, is_emfplus, ConversionOptions, ConvertError};

fn red_brush_rect() -> Vec<u8> {
    metafile(&[
        record(EMR_SETMAPMODE, &u32s(&[1])), // MM_TEXT
        record(EMR_CREATEBRUSHINDIRECT, &u32s(&[1, 0, 0x0000_00FF, 0])),
        record(EMR_SELECTOBJECT, &u32s(&[1])),
        record(EMR_RECTANGLE, &words(&[10, 10, 100, 100])),
    ])
}

#[test]
fn test_filled_rectangle() {
    let svg = convert(&red_brush_rect(), &ConversionOptions::default()).unwrap();
    assert!(svg.starts_with("<?xml"));
    assert!(svg.contains("<rect "));
    assert!(svg.contains("fill=\"#FF0000\""));
    assert!(svg.contains("x=\"10\""));
    assert!(svg.contains("y=\"10\""));
    assert!(svg.contains("width=\"90\""));
    assert!(svg.contains("height=\"90\""));
    assert!(svg.trim_end().ends_with("</svg>"));
    assert_eq!(svg.matches("<svg ").count(), 1);
    assert_eq!(svg.matches("<g transform=\"translate").count(), 1);
    assert_eq!(svg.matches("<rect ").count(), 1);
    assert_attributes_clean(&svg);
}

#[test]
fn test_stroked_path() {
    let data = metafile(&[
        record(EMR_BEGINPATH, &[]),
        record(EMR_MOVETOEX, &words(&[0, 0])),
        record(EMR_LINETO, &words(&[10, 0])),
        record(EMR_LINETO, &words(&[10, 10])),
        record(EMR_CLOSEFIGURE, &[]),
        record(EMR_ENDPATH, &[]),
        record(EMR_STROKEPATH, &words(&[0, 0, 10, 10])),
    ]);
    let svg = convert(&data, &ConversionOptions::default()).unwrap();
    assert!(svg.contains("d=\"M 0,0 L 10,0 L 10,10 Z\""), "{}", svg);
    assert!(svg.contains("stroke=\"#000000\""));
    assert!(svg.contains("fill=\"none\""));
}

#[test]
fn test_standalone_line() {
    let data = metafile(&[
        record(EMR_MOVETOEX, &words(&[5, 5])),
        record(EMR_LINETO, &words(&[20, 5])),
    ]);
    let svg = convert(&data, &ConversionOptions::default()).unwrap();
    assert!(svg.contains("d=\"M 5,5 L 20,5\""), "{}", svg);
}

#[test]
fn test_truncated_stream_is_structural() {
    let mut data = red_brush_rect();
    data.truncate(data.len() - 4);
    match convert(&data, &ConversionOptions::default()) {
        Err(ConvertError::Structural(_)) => {}
        other => panic!("expected a structural error, got {:?}", other),
    }
}

#[test]
fn test_missing_header_is_structural() {
    let data = record(EMR_EOF, &u32s(&[0, 16, 20]));
    assert!(matches!(
        convert(&data, &ConversionOptions::default()),
        Err(ConvertError::Structural(_))
    ));
}

#[test]
fn test_restore_dc_brings_back_brush() {
    let data = metafile(&[
        record(EMR_SAVEDC, &[]),
        record(EMR_CREATEBRUSHINDIRECT, &u32s(&[1, 0, 0x0000_00FF, 0])),
        record(EMR_SELECTOBJECT, &u32s(&[1])),
        record(EMR_RESTOREDC, &words(&[-1])),
        record(EMR_RECTANGLE, &words(&[0, 0, 50, 50])),
    ]);
    let result = convert_with_status(&data, &ConversionOptions::default()).unwrap();
    assert!(result.complete);
    assert!(result.svg.contains("fill=\"#FFFFFF\""));
    assert!(!result.svg.contains("#FF0000"));
}

#[test]
fn test_restore_dc_too_deep_flags_error() {
    let data = metafile(&[
        record(EMR_RESTOREDC, &words(&[-1])),
        record(EMR_RECTANGLE, &words(&[0, 0, 50, 50])),
    ]);
    let result = convert_with_status(&data, &ConversionOptions::default()).unwrap();
    assert!(!result.complete);
    // the walk goes on after the failed restore
    assert!(result.svg.contains("<rect "));
    assert!(result.svg.trim_end().ends_with("</svg>"));
}

#[test]
fn test_bad_object_index_keeps_partial_output() {
    let data = metafile(&[
        record(EMR_RECTANGLE, &words(&[0, 0, 50, 50])),
        record(EMR_SELECTOBJECT, &u32s(&[99])),
        record(EMR_RECTANGLE, &words(&[60, 60, 80, 80])),
    ]);
    let result = convert_with_status(&data, &ConversionOptions::default()).unwrap();
    assert!(!result.complete);
    assert_eq!(result.svg.matches("<rect ").count(), 1);
}

#[test]
fn test_namespace_prefix() {
    let options = ConversionOptions::default().with_namespace("svg");
    let svg = convert(&red_brush_rect(), &options).unwrap();
    assert!(svg.contains("<svg:svg "));
    assert!(svg.contains("xmlns:svg=\"http://www.w3.org/2000/svg\""));
    assert!(svg.contains("<svg:rect "));
    assert!(svg.contains("</svg:svg>"));
}

#[test]
fn test_fragment_without_delimiter() {
    let options = ConversionOptions::default().with_svg_delimiter(false);
    let svg = convert(&red_brush_rect(), &options).unwrap();
    assert!(!svg.contains("<?xml"));
    assert!(!svg.contains("<svg"));
    assert!(svg.starts_with("<g transform=\"translate(0, 0)\">"));
}

#[test]
fn test_requested_width_scales_drawing() {
    let options = ConversionOptions::default().with_size(500.0, 0.0);
    let svg = convert(&red_brush_rect(), &options).unwrap();
    assert!(svg.contains("width=\"500\""));
    assert!(svg.contains("height=\"500\""));
    assert!(svg.contains("width=\"45\""));
}

#[test]
fn test_text_output() {
    let mut params = words(&[0, 0, 100, 100]); // bounds
    params.extend(u32s(&[1])); // graphics mode
    params.extend(f32s(&[1.0, 1.0])); // scales
    params.extend(words(&[20, 30])); // reference point
    params.extend(u32s(&[2, 76, 0])); // chars, offString, options
    params.extend(words(&[0, 0, 0, 0])); // rectangle
    params.extend(u32s(&[0])); // offDx
    params.extend_from_slice(&[b'h', 0, b'i', 0]);
    let data = metafile(&[record(EMR_EXTTEXTOUTW, &params)]);
    let svg = convert(&data, &ConversionOptions::default()).unwrap();
    assert!(svg.contains("<text "));
    assert!(svg.contains("<![CDATA[hi]]>"));
    assert!(svg.contains("x=\"20\""));
}

#[test]
fn test_text_inside_open_path_follows_it() {
    let mut text = words(&[0, 0, 100, 100]);
    text.extend(u32s(&[1]));
    text.extend(f32s(&[1.0, 1.0]));
    text.extend(words(&[20, 30]));
    text.extend(u32s(&[2, 76, 0]));
    text.extend(words(&[0, 0, 0, 0]));
    text.extend(u32s(&[0]));
    text.extend_from_slice(&[b'h', 0, b'i', 0]);
    let data = metafile(&[
        record(EMR_BEGINPATH, &[]),
        record(EMR_MOVETOEX, &words(&[0, 0])),
        record(EMR_LINETO, &words(&[10, 0])),
        record(EMR_EXTTEXTOUTW, &text),
        record(EMR_LINETO, &words(&[10, 10])),
        record(EMR_ENDPATH, &[]),
        record(EMR_STROKEPATH, &words(&[0, 0, 10, 10])),
    ]);
    let svg = convert(&data, &ConversionOptions::default()).unwrap();
    assert_attributes_clean(&svg);
    let path = svg.find("d=\"M 0,0 L 10,0 L 10,10\"").expect("stroked path");
    let text = svg.find("<text ").expect("text element");
    assert!(path < text);
}

#[test]
fn test_stretchdibits_embeds_png() {
    let mut params = words(&[0, 0, 10, 10]); // bounds
    params.extend(words(&[5, 5, 0, 0, 1, 1])); // dest, src, src size
    params.extend(u32s(&[80, 40, 120, 4, 0, 0x00CC_0020])); // bmi, bits, usage, rop
    params.extend(words(&[10, 10])); // dest size
    params.extend(u32s(&[40, 1, 1]));
    params.extend_from_slice(&1u16.to_le_bytes());
    params.extend_from_slice(&24u16.to_le_bytes());
    params.extend(u32s(&[0, 4, 0, 0, 0, 0]));
    params.extend_from_slice(&[0x00, 0x00, 0xFF, 0x00]);
    let data = metafile(&[record(EMR_STRETCHDIBITS, &params)]);
    let svg = convert(&data, &ConversionOptions::default()).unwrap();
    assert!(svg.contains("<image"));
    assert!(svg.contains("data:image/png;base64,"));
}

#[test]
fn test_is_emfplus() {
    assert!(!is_emfplus(&red_brush_rect()).unwrap());
    let plus = plus_record(0x4001, 0, &u32s(&[0xDBC0_1002, 0, 96, 96]));
    let data = metafile(&[emfplus_comment(&plus)]);
    assert!(is_emfplus(&data).unwrap());
    assert!(is_emfplus(&[0u8; 4]).is_err());
}

#[test]
fn test_options_from_json() {
    let options = ConversionOptions::from_json(r#"{"namespace": "x", "svg_delimiter": false}"#).unwrap();
    assert_eq!(options.namespace.as_deref(), Some("x"));
    assert!(!options.svg_delimiter);
    assert!(options.emfplus);
    assert!(matches!(
        ConversionOptions::from_json("not json"),
        Err(ConvertError::Options(_))
    ));
}
