//! EMF/EMF+ to SVG Converter
//!
//! Converts Windows Enhanced Metafiles, including EMF+ records embedded in
//! comments, to SVG text. The input is walked twice: an analysis pass
//! validates the record stream and records which paths get filled or
//! stroked, then the render pass replays the records against a GDI-like
//! drawing state and writes SVG in record order.

#[cfg(feature = "python")]
use pyo3::prelude::*;
#[cfg(feature = "python")]
use std::fs;

pub mod analysis;
pub mod bounds;
pub mod clip;
pub mod device_context;
pub mod dib;
pub mod emf_records;
pub mod emfplus;
pub mod error;
pub mod geometry;
pub mod image_codec;
pub mod image_library;
pub mod object_table;
pub mod options;
pub mod path;
mod render;
pub mod svg_writer;
pub mod transform;

pub use clip::{ClipService, ReplaceClipper};
pub use error::{ConvertError, Result};
pub use image_codec::{ImageCodec, PngCodec};
pub use options::ConversionOptions;

use render::Renderer;

/// Result of a conversion that may have stopped early.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    pub svg: String,
    /// False when a record could not be read and the walk was cut short;
    /// `svg` then holds everything drawn before that record.
    pub complete: bool,
}

/// Convert EMF bytes to SVG text.
///
/// Only a malformed record stream is an error. Damage found while drawing
/// ends the walk and the partial picture is returned.
pub fn convert(contents: &[u8], options: &ConversionOptions) -> Result<String> {
    convert_with_status(contents, options).map(|c| c.svg)
}

/// Like [`convert`], also reporting whether the walk reached the end.
pub fn convert_with_status(contents: &[u8], options: &ConversionOptions) -> Result<Conversion> {
    convert_with(contents, options, &ReplaceClipper, &PngCodec)
}

/// Convert with caller-supplied clipping and image encoding services.
pub fn convert_with(
    contents: &[u8],
    options: &ConversionOptions,
    clipper: &dyn ClipService,
    codec: &dyn ImageCodec,
) -> Result<Conversion> {
    let analysis = analysis::analyse(contents)?;
    Renderer::new(contents, &analysis, options, clipper, codec).run()
}

/// Whether any COMMENT record carries EMF+ data.
pub fn is_emfplus(contents: &[u8]) -> Result<bool> {
    Ok(analysis::analyse(contents)?.has_emfplus)
}

/// Convert EMF bytes to SVG string
///
/// Args:
///     emf_data: EMF data as bytes
///     options_json: Optional JSON object with conversion options
///
/// Returns:
///     SVG content as string
#[cfg(feature = "python")]
#[pyfunction]
#[pyo3(signature = (emf_data, options_json=None))]
fn convert_emf_bytes_to_svg(emf_data: &[u8], options_json: Option<&str>) -> PyResult<String> {
    let options = match options_json {
        Some(json) => ConversionOptions::from_json(json)?,
        None => ConversionOptions::default(),
    };
    Ok(convert(emf_data, &options)?)
}

/// Check for EMF+ records
///
/// Args:
///     emf_data: EMF data as bytes
///
/// Returns:
///     True if the metafile carries EMF+ records
#[cfg(feature = "python")]
#[pyfunction(name = "is_emfplus")]
fn py_is_emfplus(emf_data: &[u8]) -> PyResult<bool> {
    Ok(is_emfplus(emf_data)?)
}

/// Convert EMF file to SVG
///
/// Args:
///     input_path: Path to input EMF file
///     output_path: Path to output SVG file
///     options_json: Optional JSON object with conversion options
///
/// Returns:
///     True if conversion successful
#[cfg(feature = "python")]
#[pyfunction]
#[pyo3(signature = (input_path, output_path, options_json=None))]
fn emf_to_svg(input_path: &str, output_path: &str, options_json: Option<&str>) -> PyResult<bool> {
    let data = fs::read(input_path).map_err(|e| {
        PyErr::new::<pyo3::exceptions::PyIOError, _>(format!("Failed to read input file: {}", e))
    })?;
    let svg_content = convert_emf_bytes_to_svg(&data, options_json)?;
    fs::write(output_path, svg_content).map_err(|e| {
        PyErr::new::<pyo3::exceptions::PyIOError, _>(format!("Failed to write output file: {}", e))
    })?;
    Ok(true)
}

/// Python module definition
#[cfg(feature = "python")]
#[pymodule]
fn emf2svg(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(convert_emf_bytes_to_svg, m)?)?;
    m.add_function(wrap_pyfunction!(py_is_emfplus, m)?)?;
    m.add_function(wrap_pyfunction!(emf_to_svg, m)?)?;
    Ok(())
}
