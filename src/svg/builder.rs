//! SVG builder: accumulates elements and produces the final document.

use super::constants::*;

pub(super) struct SvgBuilder {
    elements: Vec<String>,
    width: f64,
    height: f64,
    scale: f64,
}

impl SvgBuilder {
    pub(super) fn new(width: f64, height: f64, scale: f64) -> Self {
        Self {
            elements: Vec::new(),
            width,
            height,
            scale,
        }
    }

    pub(super) fn build(&self) -> String {
        let mut svg = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {} {}" width="{}" height="{}" style="font-family: 'Arial', sans-serif;">"#,
            self.width, self.height, self.width, self.height
        );
        svg.push('\n');
        svg.push_str(&format!(r#"<g transform="scale({})">"#, self.scale));
        svg.push('\n');
        for el in &self.elements {
            svg.push_str("  ");
            svg.push_str(el);
            svg.push('\n');
        }
        svg.push_str("</g>\n</svg>\n");
        svg
    }

    pub(super) fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, color: &str, width: f64) {
        self.elements.push(format!(
            r#"<line x1="{:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}" stroke="{}" stroke-width="{:.1}" stroke-linecap="round"/>"#,
            x1, y1, x2, y2, color, width
        ));
    }

    pub(super) fn rect(&mut self, x: f64, y: f64, w: f64, h: f64, fill: &str) {
        self.elements.push(format!(
            r#"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="{}"/>"#,
            x, y, w, h, fill
        ));
    }

    pub(super) fn text(&mut self, x: f64, y: f64, content: &str, size: f64, weight: &str, anchor: &str) {
        self.elements.push(format!(
            r#"<text x="{:.1}" y="{:.1}" font-size="{:.0}" font-weight="{}" fill="{}" text-anchor="{}">{}</text>"#,
            x, y, size, weight, NOTE_COLOR, anchor, escape(content)
        ));
    }

    /// Text in an explicit font family and style.
    pub(super) fn styled_text(
        &mut self,
        x: f64,
        y: f64,
        content: &str,
        family: &str,
        size: f64,
        style: Option<&str>,
        anchor: &str,
    ) {
        let (weight, slant) = match style {
            Some("bold") => ("bold", "normal"),
            Some("italic") => ("normal", "italic"),
            _ => ("normal", "normal"),
        };
        self.elements.push(format!(
            r#"<text x="{:.1}" y="{:.1}" font-family="{}" font-size="{:.0}" font-weight="{}" font-style="{}" fill="{}" text-anchor="{}">{}</text>"#,
            x, y, escape(family), size, weight, slant, NOTE_COLOR, anchor, escape(content)
        ));
    }

    pub(super) fn path(&mut self, d: &str, stroke: &str, stroke_width: f64) {
        self.elements.push(format!(
            r#"<path d="{}" fill="none" stroke="{}" stroke-width="{:.1}" stroke-linecap="round"/>"#,
            d, stroke, stroke_width
        ));
    }

    pub(super) fn notehead(&mut self, cx: f64, cy: f64, filled: bool) {
        if filled {
            self.elements.push(format!(
                r#"<ellipse cx="{:.1}" cy="{:.1}" rx="{:.1}" ry="{:.1}" fill="{}" transform="rotate(-15,{:.1},{:.1})"/>"#,
                cx, cy, NOTEHEAD_RX, NOTEHEAD_RY, NOTE_COLOR, cx, cy
            ));
        } else {
            let sw = 1.5;
            self.elements.push(format!(
                r#"<ellipse cx="{:.1}" cy="{:.1}" rx="{:.1}" ry="{:.1}" fill="none" stroke="{}" stroke-width="{:.1}" transform="rotate(-15,{:.1},{:.1})"/>"#,
                cx, cy, NOTEHEAD_RX - sw / 2.0, NOTEHEAD_RY - sw / 2.0, NOTE_COLOR, sw, cx, cy
            ));
        }
    }

    /// Clef glyph with its reference line (G for treble, F for bass) at `y`.
    pub(super) fn clef(&mut self, x: f64, y: f64, glyph: char, size: f64) {
        self.elements.push(format!(
            r#"<text x="{:.1}" y="{:.1}" font-size="{:.0}" fill="{}" text-anchor="middle">{}</text>"#,
            x, y, size, NOTE_COLOR, glyph
        ));
    }
}

fn escape(content: &str) -> String {
    content
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Placeholder document for scores that can't be drawn.
pub(super) fn empty_svg(message: &str) -> String {
    format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 400 100\">\
         <text x=\"200\" y=\"50\" text-anchor=\"middle\" font-size=\"14\" fill=\"gray\">{}</text>\
         </svg>",
        escape(message)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_is_escaped() {
        let mut svg = SvgBuilder::new(100.0, 50.0, 1.0);
        svg.text(10.0, 10.0, "a<b & \"c\"", 10.0, "normal", "start");
        let out = svg.build();
        assert!(out.contains("a&lt;b &amp; &quot;c&quot;"));
        assert!(out.starts_with("<svg"));
        assert!(out.trim_end().ends_with("</svg>"));
    }
}
