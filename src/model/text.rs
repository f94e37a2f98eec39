//! Positioned text lines.

use super::BoundingBox;

/// One physically grouped line of text with position and font information.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub text: String,
    pub bbox: BoundingBox,
    pub font_size: Option<f32>,
    pub font_name: Option<String>,
    pub is_bold: bool,
    pub is_italic: bool,
}

impl TextBlock {
    /// Create a block, inferring bold/italic from the font name.
    pub fn new(
        text: impl Into<String>,
        bbox: BoundingBox,
        font_size: Option<f32>,
        font_name: Option<String>,
    ) -> Self {
        let (is_bold, is_italic) = font_name
            .as_deref()
            .map(font_style_flags)
            .unwrap_or((false, false));

        Self {
            text: text.into(),
            bbox,
            font_size,
            font_name,
            is_bold,
            is_italic,
        }
    }

    /// Left edge, used for indentation.
    pub fn x_position(&self) -> f32 {
        self.bbox.x0
    }

    /// Top edge, used for reading order.
    pub fn y_position(&self) -> f32 {
        self.bbox.y0
    }
}

/// Infer `(bold, italic)` from a font name such as `"HYGothic-Bold"`.
pub fn font_style_flags(font_name: &str) -> (bool, bool) {
    let lower = font_name.to_lowercase();
    (lower.contains("bold"), lower.contains("italic"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_detection() {
        let bbox = BoundingBox::new(72.0, 100.0, 200.0, 112.0, 0);
        let bold = TextBlock::new("1. 공급개요", bbox, Some(12.0), Some("Helvetica-Bold".into()));
        assert!(bold.is_bold);
        assert!(!bold.is_italic);

        let italic = TextBlock::new("note", bbox, Some(12.0), Some("Times-Italic".into()));
        assert!(!italic.is_bold);
        assert!(italic.is_italic);

        let plain = TextBlock::new("plain", bbox, None, None);
        assert!(!plain.is_bold && !plain.is_italic);
        assert_eq!(plain.x_position(), 72.0);
        assert_eq!(plain.y_position(), 100.0);
    }

    #[test]
    fn test_only_bold_and_italic_names_count() {
        assert_eq!(font_style_flags("NanumGothic-Bold"), (true, false));
        assert_eq!(font_style_flags("Arial-BoldItalic"), (true, true));
        assert_eq!(font_style_flags("NotoSansKR-Black"), (false, false));
        assert_eq!(font_style_flags("HYGothic-Heavy"), (false, false));
        assert_eq!(font_style_flags("Times-Oblique"), (false, false));
    }
}
