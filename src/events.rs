// src/events.rs
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesStart, BytesText, Event as XmlEvent};
use quick_xml::Reader;

/// One parse notification from an HTML document, in document order.
///
/// Tag and attribute names are ASCII-lowercased; attribute values keep their
/// source form (entity-decoded where possible). The attribute list preserves
/// source order and duplicates, so callers can match on it exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Start { name: String, attrs: Vec<(String, String)> },
    End { name: String },
    Text(String),
    EntityRef(String),
}

/// Forward-only event stream over one fully buffered document.
///
/// Self-closing tags surface as a start/end pair, so `<br/>` produces an
/// `End` for `br` the way the consumers expect. Comments, doctypes and
/// processing instructions are dropped. A tokenizer error ends the stream
/// early; consumers treat that the same as a truncated document.
pub struct EventStream<'a> {
    reader: Reader<&'a [u8]>,
    done: bool,
}

pub fn stream(html: &str) -> EventStream<'_> {
    let mut reader = Reader::from_str(html);
    let config = reader.config_mut();
    config.expand_empty_elements = true;
    config.allow_dangling_amp = true;
    config.check_end_names = false;
    config.allow_unmatched_ends = true;
    config.check_comments = false;
    EventStream {
        reader,
        done: false,
    }
}

impl Iterator for EventStream<'_> {
    type Item = Event;

    fn next(&mut self) -> Option<Event> {
        while !self.done {
            match self.reader.read_event() {
                Ok(XmlEvent::Start(e)) => {
                    return Some(Event::Start {
                        name: lowercase_name(e.name().as_ref()),
                        attrs: collect_attrs(&e),
                    });
                }
                Ok(XmlEvent::End(e)) => {
                    return Some(Event::End {
                        name: lowercase_name(e.name().as_ref()),
                    });
                }
                Ok(XmlEvent::Text(e)) => return Some(Event::Text(decode_text(&e))),
                Ok(XmlEvent::CData(e)) => {
                    return Some(Event::Text(
                        String::from_utf8_lossy(e.as_ref()).into_owned(),
                    ));
                }
                Ok(XmlEvent::GeneralRef(e)) => {
                    return Some(Event::EntityRef(
                        String::from_utf8_lossy(e.as_ref()).into_owned(),
                    ));
                }
                Ok(XmlEvent::Eof) => self.done = true,
                Ok(_) => {} // comments, doctype, declarations, PIs
                Err(err) => {
                    tracing::warn!(
                        "Markup error at byte {}: {}; ending event stream early",
                        self.reader.buffer_position(),
                        err
                    );
                    self.done = true;
                }
            }
        }
        None
    }
}

fn lowercase_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).to_ascii_lowercase()
}

fn collect_attrs(e: &BytesStart) -> Vec<(String, String)> {
    let mut attrs = Vec::new();
    // with_checks(false) keeps duplicate attributes instead of erroring on them
    for attr in e.attributes().with_checks(false) {
        match attr {
            Ok(a) => {
                let name = String::from_utf8_lossy(a.key.as_ref()).to_ascii_lowercase();
                let value = a
                    .unescape_value()
                    .map(|v| v.into_owned())
                    .unwrap_or_else(|_| String::from_utf8_lossy(&a.value).into_owned());
                attrs.push((name, value));
            }
            Err(err) => {
                tracing::debug!("Skipping unparsable attribute: {}", err);
                break;
            }
        }
    }
    attrs
}

fn decode_text(e: &BytesText) -> String {
    e.decode()
        .map(|t| t.into_owned())
        .unwrap_or_else(|_| String::from_utf8_lossy(e.as_ref()).into_owned())
}

/// Decodes a character reference (the text between `&` and `;`) to its
/// literal form. Numeric references are decoded exactly; named references
/// come from the predefined XML set plus the handful of HTML entities that
/// show up in contest pages. Unknown names return `None` and callers keep
/// the raw `&name;` text.
pub fn resolve_entity(name: &str) -> Option<String> {
    if let Some(num) = name.strip_prefix('#') {
        let code = if let Some(hex) = num.strip_prefix('x').or_else(|| num.strip_prefix('X')) {
            u32::from_str_radix(hex, 16).ok()?
        } else {
            num.parse::<u32>().ok()?
        };
        return char::from_u32(code).map(String::from);
    }

    if let Some(text) = resolve_predefined_entity(name) {
        return Some(text.to_string());
    }

    let text = match name {
        "nbsp" => "\u{a0}",
        "ndash" => "\u{2013}",
        "mdash" => "\u{2014}",
        "lsquo" => "\u{2018}",
        "rsquo" => "\u{2019}",
        "ldquo" => "\u{201c}",
        "rdquo" => "\u{201d}",
        "laquo" => "\u{ab}",
        "raquo" => "\u{bb}",
        "hellip" => "\u{2026}",
        "times" => "\u{d7}",
        "minus" => "\u{2212}",
        "le" => "\u{2264}",
        "ge" => "\u{2265}",
        _ => return None,
    };
    Some(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn events(html: &str) -> Vec<Event> {
        stream(html).collect()
    }

    #[test]
    fn start_tag_preserves_attribute_order() {
        let evs = events(r#"<a style="color: black" href="/contest/1464">x</a>"#);
        assert_eq!(
            evs[0],
            Event::Start {
                name: "a".into(),
                attrs: vec![
                    ("style".into(), "color: black".into()),
                    ("href".into(), "/contest/1464".into()),
                ],
            }
        );
    }

    #[test]
    fn names_are_lowercased() {
        let evs = events(r#"<DIV CLASS="input"></DIV>"#);
        assert!(matches!(
            &evs[0],
            Event::Start { name, attrs } if name == "div" && attrs[0].0 == "class"
        ));
        assert_eq!(evs[1], Event::End { name: "div".into() });
    }

    #[test]
    fn self_closing_tag_expands_to_pair() {
        let evs = events("<pre>a<br/>b</pre>");
        assert!(evs.contains(&Event::Start {
            name: "br".into(),
            attrs: vec![],
        }));
        assert!(evs.contains(&Event::End { name: "br".into() }));
    }

    #[test]
    fn named_reference_becomes_entity_event() {
        let evs = events("<pre>1 &lt; 2</pre>");
        assert!(evs.contains(&Event::EntityRef("lt".into())));
    }

    #[test]
    fn comments_are_dropped() {
        let evs = events("<div><!-- nothing --></div>");
        assert_eq!(evs.len(), 2);
    }

    #[test]
    fn resolve_named_and_numeric() {
        assert_eq!(resolve_entity("lt").as_deref(), Some("<"));
        assert_eq!(resolve_entity("nbsp").as_deref(), Some("\u{a0}"));
        assert_eq!(resolve_entity("#65").as_deref(), Some("A"));
        assert_eq!(resolve_entity("#x41").as_deref(), Some("A"));
        assert_eq!(resolve_entity("unknownref"), None);
    }
}
