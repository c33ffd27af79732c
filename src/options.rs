//! Conversion options

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Options controlling one conversion call.
///
/// Sizes of `0.0` mean "derive from the metafile bounds". When only one of
/// them is set the other follows the bounds' aspect ratio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionOptions {
    /// Prefix emitted as `ns:` before every element name.
    pub namespace: Option<String>,
    /// Log every record with its support status.
    pub verbose: bool,
    /// Interpret EMF+ records found in comments.
    pub emfplus: bool,
    /// Emit the XML prolog and the root `<svg>` element.
    pub svg_delimiter: bool,
    pub image_width: f64,
    pub image_height: f64,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            namespace: None,
            verbose: false,
            emfplus: true,
            svg_delimiter: true,
            image_width: 0.0,
            image_height: 0.0,
        }
    }
}

impl ConversionOptions {
    /// Parse options from a JSON object. Missing keys keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        let ns = namespace.into();
        self.namespace = if ns.is_empty() { None } else { Some(ns) };
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_emfplus(mut self, emfplus: bool) -> Self {
        self.emfplus = emfplus;
        self
    }

    pub fn with_svg_delimiter(mut self, svg_delimiter: bool) -> Self {
        self.svg_delimiter = svg_delimiter;
        self
    }

    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.image_width = width;
        self.image_height = height;
        self
    }

    /// The `ns:` prefix applied to element names, or an empty string.
    pub(crate) fn prefix(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{}:", ns),
            None => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = ConversionOptions::default();
        assert!(opts.svg_delimiter);
        assert!(opts.emfplus);
        assert_eq!(opts.prefix(), "");
    }

    #[test]
    fn test_from_json_partial() {
        let opts = ConversionOptions::from_json(r#"{"namespace": "svg", "image_width": 200}"#).unwrap();
        assert_eq!(opts.namespace.as_deref(), Some("svg"));
        assert_eq!(opts.image_width, 200.0);
        assert!(opts.svg_delimiter);
        assert_eq!(opts.prefix(), "svg:");
    }

    #[test]
    fn test_from_json_invalid() {
        let err = ConversionOptions::from_json("{not json").unwrap_err();
        assert!(matches!(err, crate::error::ConvertError::Options(_)));
    }

    #[test]
    fn test_empty_namespace_is_none() {
        let opts = ConversionOptions::default().with_namespace("");
        assert!(opts.namespace.is_none());
    }
}
