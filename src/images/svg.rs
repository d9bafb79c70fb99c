//! SVG sniffing and intrinsic size extraction.
//!
//! Vector images are stored untouched, so only the root `<svg>` tag is read.

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// True when the document's root element is `<svg>`, after any XML
/// declaration, processing instructions, comments and doctype.
pub fn is_svg(bytes: &[u8]) -> bool {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let first = bytes.iter().find(|b| !b.is_ascii_whitespace());
    if first != Some(&b'<') {
        return false;
    }

    let text = String::from_utf8_lossy(bytes);
    root_element(&text).is_some_and(|element| svg_attributes(element).is_some())
}

/// Width and height from `viewBox`, falling back to `width`/`height`.
pub fn dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    let text = String::from_utf8_lossy(bytes);
    let tag = root_tag(&text)?;

    if let Some(view_box) = attribute(tag, "viewBox") {
        let values: Vec<f64> = view_box
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|s| !s.is_empty())
            .filter_map(|s| s.parse().ok())
            .collect();
        if let [_, _, w, h] = values[..] {
            if let (Some(w), Some(h)) = (to_pixels(w), to_pixels(h)) {
                return Some((w, h));
            }
        }
    }

    let width = attribute(tag, "width").and_then(length)?;
    let height = attribute(tag, "height").and_then(length)?;
    Some((width, height))
}

fn root_tag(text: &str) -> Option<&str> {
    let rest = svg_attributes(root_element(text)?)?;
    let end = rest.find('>')?;
    Some(&rest[..end])
}

/// The markup from the root element onward.
fn root_element(text: &str) -> Option<&str> {
    let mut rest = text.trim_start_matches('\u{feff}');
    loop {
        rest = rest.trim_start();
        if let Some(pi) = rest.strip_prefix("<?") {
            rest = &pi[pi.find("?>")? + 2..];
        } else if let Some(comment) = rest.strip_prefix("<!--") {
            rest = &comment[comment.find("-->")? + 3..];
        } else if rest.starts_with("<!") {
            rest = skip_declaration(rest)?;
        } else if rest.starts_with('<') {
            return Some(rest);
        } else {
            return None;
        }
    }
}

/// Skips `<!DOCTYPE ...>`, including a bracketed internal subset.
fn skip_declaration(decl: &str) -> Option<&str> {
    let mut depth = 0usize;
    for (i, c) in decl.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            '>' if depth == 0 => return Some(&decl[i + 1..]),
            _ => {}
        }
    }
    None
}

/// Whatever follows `<svg` when `element` opens an svg tag.
fn svg_attributes(element: &str) -> Option<&str> {
    let rest = element.strip_prefix("<svg")?;
    rest.starts_with(|c: char| c.is_whitespace() || c == '>' || c == '/')
        .then_some(rest)
}

/// Quoted value of `name` inside a tag, skipping names that merely end with it
/// (`stroke-width` is not `width`).
fn attribute<'a>(tag: &'a str, name: &str) -> Option<&'a str> {
    let mut offset = 0;
    while let Some(pos) = tag[offset..].find(name) {
        let at = offset + pos;
        offset = at + name.len();

        let standalone = tag[..at].ends_with(|c: char| c.is_whitespace());
        if !standalone {
            continue;
        }

        let Some(value) = tag[offset..].trim_start().strip_prefix('=') else {
            continue;
        };
        let value = value.trim_start();
        let quote = value.chars().next()?;
        if quote != '"' && quote != '\'' {
            continue;
        }
        let body = &value[1..];
        let end = body.find(quote)?;
        return Some(&body[..end]);
    }
    None
}

/// Parses `120`, `120.5` or `120px`. Relative units are not intrinsic sizes.
fn length(value: &str) -> Option<u32> {
    let value = value.trim();
    let number = value.strip_suffix("px").unwrap_or(value);
    to_pixels(number.trim().parse().ok()?)
}

fn to_pixels(value: f64) -> Option<u32> {
    if value.is_finite() && value > 0.0 && value <= u32::MAX as f64 {
        Some(value.round() as u32)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniffs_svg_documents() {
        assert!(is_svg(br#"<svg xmlns="http://www.w3.org/2000/svg"/>"#));
        assert!(is_svg(b"<?xml version=\"1.0\"?>\n<svg></svg>"));
        assert!(!is_svg(b"\x89PNG\r\n\x1a\n"));
        assert!(!is_svg(b"hello <svg"));
    }

    #[test]
    fn looks_past_long_prologs() {
        let mut doc = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        doc.push_str(&format!("<!-- {} -->\n", "generated ".repeat(600)));
        doc.push_str(r#"<!DOCTYPE svg PUBLIC "-//W3C//DTD SVG 1.1//EN" [ <!ENTITY ns "x"> ]>"#);
        doc.push_str(r#"<svg viewBox="0 0 40 30"></svg>"#);
        assert!(doc.len() > 4096);

        assert!(is_svg(doc.as_bytes()));
        assert_eq!(dimensions(doc.as_bytes()), Some((40, 30)));
    }

    #[test]
    fn root_must_be_svg() {
        assert!(!is_svg(br#"<html><body><svg viewBox="0 0 1 1"></svg></body></html>"#));
        assert!(!is_svg(br#"<?xml version="1.0"?><note><svg/></note>"#));
        assert!(!is_svg(b"<svgfoo></svgfoo>"));
        assert!(!is_svg(b"<!-- <svg> -->"));
        assert!(is_svg(b"\xEF\xBB\xBF  <svg/>"));
    }

    #[test]
    fn commented_out_svg_does_not_size_the_root() {
        let svg = br#"<!-- <svg width="1" height="1"> --><svg width="64" height="32"></svg>"#;
        assert_eq!(dimensions(svg), Some((64, 32)));
    }

    #[test]
    fn prefers_view_box() {
        let svg = br#"<svg width="10" height="10" viewBox="0 0 1200 800"><rect/></svg>"#;
        assert_eq!(dimensions(svg), Some((1200, 800)));
    }

    #[test]
    fn falls_back_to_width_and_height() {
        let svg = br#"<svg stroke-width="3" width="64px" height='48'></svg>"#;
        assert_eq!(dimensions(svg), Some((64, 48)));
    }

    #[test]
    fn comma_separated_view_box() {
        let svg = br#"<svg viewBox="0,0,300.4,150.6"></svg>"#;
        assert_eq!(dimensions(svg), Some((300, 151)));
    }

    #[test]
    fn unknown_size_without_attributes_or_with_relative_units() {
        assert_eq!(dimensions(b"<svg></svg>"), None);
        assert_eq!(dimensions(br#"<svg width="100%" height="100%"></svg>"#), None);
    }
}
