//! SVG export for download and cutting software.

use crate::model::{Document, FontWeight, LayerKind};
use std::fmt::Write;

/// Escape text for use in XML content and attribute values.
fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Serialize `doc` as a standalone SVG file. Hidden layers are omitted;
/// everything else is written in paint order with its id preserved.
pub fn render_svg(doc: &Document) -> String {
    let mut svg = String::new();
    let _ = writeln!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"{}\">",
        escape(doc.view_box())
    );

    for layer in doc.layers().iter().filter(|l| l.visible) {
        let id = escape(layer.id.as_str());
        match &layer.kind {
            LayerKind::Path(p) => {
                let _ = writeln!(
                    svg,
                    "  <path id=\"{id}\" d=\"{}\" fill=\"{}\" />",
                    escape(p.d.as_str()),
                    p.fill
                );
            }
            LayerKind::Text(t) => {
                let weight = match t.font_weight {
                    FontWeight::Normal => "normal",
                    FontWeight::Bold => "bold",
                };
                let _ = writeln!(
                    svg,
                    "  <text id=\"{id}\" x=\"{}\" y=\"{}\" font-family=\"{}\" font-size=\"{}\" font-weight=\"{weight}\" fill=\"{}\" text-anchor=\"middle\">{}</text>",
                    t.x,
                    t.y,
                    escape(&t.font_family),
                    t.font_size,
                    t.fill,
                    escape(&t.text)
                );
            }
        }
    }

    svg.push_str("</svg>\n");
    svg
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::LayerId;
    use crate::model::{HexColor, Layer, TextAttributes};
    use crate::patch::Patch;

    #[test]
    fn exports_layers_in_order_and_skips_hidden() {
        let mut doc = Document::default();
        let base = Layer::path("base", "M 0 0 L 10 0 L 10 10 Z", "#f06").unwrap();
        let mut hidden = Layer::path("ghost", "M 0 0 L 5 0 L 5 5 Z", "#000").unwrap();
        hidden.visible = false;
        let text = Layer::new(
            LayerId::intern("caption"),
            LayerKind::Text(TextAttributes::new(
                "Tom & Jerry <3",
                250.0,
                400.0,
                HexColor::parse("#123456").unwrap(),
            )),
        );
        doc.apply_patch(&Patch::ReplaceAll {
            view_box: "0 0 500 500".into(),
            layers: vec![base, hidden, text],
        })
        .unwrap();

        let svg = render_svg(&doc);
        assert!(svg.starts_with("<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 500 500\">"));
        assert!(svg.contains("<path id=\"base\" d=\"M 0 0 L 10 0 L 10 10 Z\" fill=\"#f06\" />"));
        assert!(!svg.contains("ghost"));
        assert!(svg.contains("text-anchor=\"middle\">Tom &amp; Jerry &lt;3</text>"));
        assert!(svg.find("base").unwrap() < svg.find("caption").unwrap());
        assert!(svg.ends_with("</svg>\n"));
    }
}
