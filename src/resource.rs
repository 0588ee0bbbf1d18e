//! Android `strings.xml` parsing.
//!
//! Only direct `<string>` children of the root element are read. Inline markup
//! inside a string (e.g. `<b>`, `<xliff:g>`) is serialized back to text and
//! folded into the content, then the whole content is XML-escaped once so it
//! can be written back verbatim between `<string>` tags.

use crate::error::ResourceError;
use quick_xml::errors::IllFormedError;
use quick_xml::escape::{escape, partial_escape};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::path::Path;
use tracing::debug;

/// A single `<string>` entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringResource {
    pub id: String,
    /// Inner markup of the element, escaped
    pub content: String,
    /// `false` only for `translatable="false"`
    pub translated: bool,
}

impl StringResource {
    pub fn new(id: impl Into<String>, content: impl Into<String>, translated: bool) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            translated,
        }
    }
}

/// Escape text for use as string content: `& < > " '` become entities
pub fn escape_content(text: &str) -> String {
    escape(text).into_owned()
}

/// Parse a resource file into its ordered `<string>` entries.
///
/// A path that does not exist yields an empty list.
pub fn parse_resource_file(path: &Path) -> Result<Vec<StringResource>, ResourceError> {
    if !path.exists() {
        debug!("Resource file {} does not exist, treating as empty", path.display());
        return Ok(Vec::new());
    }

    let xml = std::fs::read_to_string(path).map_err(|source| ResourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    parse_resources(&xml, path)
}

/// Parse resource XML held in memory. `path` is only used for error reporting.
pub fn parse_resources(xml: &str, path: &Path) -> Result<Vec<StringResource>, ResourceError> {
    let xml_err = |source: quick_xml::Error| ResourceError::Xml {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = Reader::from_str(xml);
    let mut resources = Vec::new();
    let mut depth = 0usize;

    loop {
        match reader.read_event().map_err(xml_err)? {
            Event::Start(e) => {
                depth += 1;
                if depth == 2 && is_string_element(&e) {
                    let (id, translated) = read_attributes(&e, path)?;
                    let content = read_content(&mut reader, path)?;
                    depth -= 1;
                    resources.push(StringResource {
                        id,
                        content,
                        translated,
                    });
                }
            }
            Event::Empty(e) => {
                if depth == 1 && is_string_element(&e) {
                    let (id, translated) = read_attributes(&e, path)?;
                    resources.push(StringResource {
                        id,
                        content: String::new(),
                        translated,
                    });
                }
            }
            Event::End(_) => depth = depth.saturating_sub(1),
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(resources)
}

fn is_string_element(e: &BytesStart<'_>) -> bool {
    e.name().as_ref().ends_with(b"string")
}

/// Resolve the id and translatable flag of a `<string>` element
fn read_attributes(e: &BytesStart<'_>, path: &Path) -> Result<(String, bool), ResourceError> {
    let xml_err = |source: quick_xml::Error| ResourceError::Xml {
        path: path.to_path_buf(),
        source,
    };

    let mut name = None;
    let mut android_id = None;
    let mut translated = true;

    for attr in e.attributes() {
        let attr = attr.map_err(|err| xml_err(err.into()))?;
        let value = attr.unescape_value().map_err(xml_err)?;
        let key = attr.key;

        // android:id="@+id/foo" -> foo
        if key.prefix().is_some() && key.local_name().as_ref() == b"id" {
            let id = value.rsplit('/').next().unwrap_or_default();
            android_id = Some(id.to_string());
            continue;
        }

        match key.as_ref() {
            b"name" => name = Some(value.into_owned()),
            b"translatable" => translated = value != "false",
            _ => {}
        }
    }

    let id = android_id.or(name).unwrap_or_default();
    if !is_valid_id(&id) {
        return Err(ResourceError::InvalidId {
            path: path.to_path_buf(),
            id,
        });
    }

    Ok((id, translated))
}

fn is_valid_id(id: &str) -> bool {
    !id.is_empty() && !id.chars().any(|c| c.is_whitespace() || c == '-')
}

/// Read everything up to the end tag of the current element and return it escaped.
///
/// Text is unescaped first; nested elements are written back as markup with
/// their own text and attributes escaped, followed by their trailing text.
fn read_content(reader: &mut Reader<&[u8]>, path: &Path) -> Result<String, ResourceError> {
    let xml_err = |source: quick_xml::Error| ResourceError::Xml {
        path: path.to_path_buf(),
        source,
    };

    let mut raw = String::new();
    let mut depth = 0usize;

    loop {
        match reader.read_event().map_err(xml_err)? {
            Event::Text(t) => {
                let text = t.unescape().map_err(xml_err)?;
                push_text(&mut raw, &text, depth);
            }
            Event::CData(c) => {
                let text = String::from_utf8_lossy(&c);
                push_text(&mut raw, &text, depth);
            }
            Event::Start(e) => {
                depth += 1;
                raw.push_str(&open_tag(&e, false).map_err(xml_err)?);
            }
            Event::Empty(e) => raw.push_str(&open_tag(&e, true).map_err(xml_err)?),
            Event::End(e) => {
                if depth == 0 {
                    break;
                }
                depth -= 1;
                raw.push_str("</");
                raw.push_str(&String::from_utf8_lossy(e.name().as_ref()));
                raw.push('>');
            }
            Event::Eof => {
                return Err(xml_err(quick_xml::Error::IllFormed(
                    IllFormedError::MissingEndTag("string".to_string()),
                )));
            }
            _ => {}
        }
    }

    Ok(escape_content(&raw))
}

fn push_text(raw: &mut String, text: &str, depth: usize) {
    if depth == 0 {
        raw.push_str(text);
    } else {
        raw.push_str(&partial_escape(text));
    }
}

fn open_tag(e: &BytesStart<'_>, empty: bool) -> Result<String, quick_xml::Error> {
    let mut tag = String::from("<");
    tag.push_str(&String::from_utf8_lossy(e.name().as_ref()));

    for attr in e.attributes() {
        let attr = attr?;
        let value = attr.unescape_value()?;
        tag.push(' ');
        tag.push_str(&String::from_utf8_lossy(attr.key.as_ref()));
        tag.push_str("=\"");
        tag.push_str(&escape(&*value));
        tag.push('"');
    }

    tag.push_str(if empty { " />" } else { ">" });
    Ok(tag)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::TempDir;

    fn parse(xml: &str) -> Result<Vec<StringResource>, ResourceError> {
        parse_resources(xml, Path::new("strings.xml"))
    }

    fn wrap(body: &str) -> String {
        format!(
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<resources>\n{}\n</resources>\n",
            body
        )
    }

    // ==================== Escaping ====================

    #[test]
    fn test_escape_content_quotes() {
        assert_eq!(escape_content("\"test\""), "&quot;test&quot;");
    }

    #[test]
    fn test_escape_content_all_entities() {
        assert_eq!(
            escape_content("a & b < c > d ' e"),
            "a &amp; b &lt; c &gt; d &apos; e"
        );
    }

    #[test]
    fn test_quoted_text_is_escaped() {
        let resources = parse(&wrap(r#"<string name="a">"hi"</string>"#)).unwrap();
        assert_eq!(resources, vec![StringResource::new("a", "&quot;hi&quot;", true)]);
    }

    #[test]
    fn test_entities_are_escaped_once() {
        let resources = parse(&wrap(r#"<string name="a">Fish &amp; Chips</string>"#)).unwrap();
        assert_eq!(resources[0].content, "Fish &amp; Chips");
    }

    #[test]
    fn test_android_apostrophe_escape_is_passthrough() {
        let resources = parse(&wrap(r#"<string name="a">Don\'t</string>"#)).unwrap();
        assert_eq!(resources[0].content, r"Don\&apos;t");
    }

    // ==================== Translatable flag ====================

    #[test]
    fn test_translatable_false() {
        let resources =
            parse(&wrap(r#"<string name="b" translatable="false">x</string>"#)).unwrap();
        assert!(!resources[0].translated);
    }

    #[test]
    fn test_translatable_other_values_are_true() {
        let resources = parse(&wrap(
            r#"<string name="a" translatable="true">x</string>
               <string name="b" translatable="False">x</string>
               <string name="c">x</string>"#,
        ))
        .unwrap();
        assert!(resources.iter().all(|r| r.translated));
    }

    // ==================== Ids ====================

    #[test]
    fn test_id_with_space_is_rejected() {
        let err = parse(&wrap(r#"<string name="bad id">x</string>"#)).unwrap_err();
        assert!(matches!(err, ResourceError::InvalidId { ref id, .. } if id == "bad id"));
    }

    #[test]
    fn test_id_with_hyphen_is_rejected() {
        let err = parse(&wrap(r#"<string name="bad-id">x</string>"#)).unwrap_err();
        assert!(matches!(err, ResourceError::InvalidId { .. }));
    }

    #[test]
    fn test_missing_or_empty_id_is_rejected() {
        assert!(matches!(
            parse(&wrap(r#"<string>x</string>"#)),
            Err(ResourceError::InvalidId { .. })
        ));
        assert!(matches!(
            parse(&wrap(r#"<string name="">x</string>"#)),
            Err(ResourceError::InvalidId { .. })
        ));
    }

    #[test]
    fn test_android_id_takes_precedence() {
        let resources = parse(
            r#"<resources xmlns:android="http://schemas.android.com/apk/res/android">
                <string android:id="@+id/from_id" name="from_name">x</string>
            </resources>"#,
        )
        .unwrap();
        assert_eq!(resources[0].id, "from_id");
    }

    // ==================== Content ====================

    #[test]
    fn test_nested_markup_is_serialized_then_escaped() {
        let resources = parse(&wrap(
            r#"<string name="a">Hello <b>big</b> world</string>"#,
        ))
        .unwrap();
        assert_eq!(resources[0].content, "Hello &lt;b&gt;big&lt;/b&gt; world");
    }

    #[test]
    fn test_nested_markup_with_attributes() {
        let resources = parse(&wrap(
            r#"<string name="a">Hi <xliff:g id="name" example="Bob">%s</xliff:g>!</string>"#,
        ))
        .unwrap();
        assert_eq!(
            resources[0].content,
            "Hi &lt;xliff:g id=&quot;name&quot; example=&quot;Bob&quot;&gt;%s&lt;/xliff:g&gt;!"
        );
    }

    #[test]
    fn test_empty_nested_element() {
        let resources = parse(&wrap(r#"<string name="a">one<br/>two</string>"#)).unwrap();
        assert_eq!(resources[0].content, "one&lt;br /&gt;two");
    }

    #[test]
    fn test_self_closing_string_has_empty_content() {
        let resources = parse(&wrap(r#"<string name="a"/>"#)).unwrap();
        assert_eq!(resources, vec![StringResource::new("a", "", true)]);
    }

    #[test]
    fn test_cdata_contributes_raw_text() {
        let resources =
            parse(&wrap(r#"<string name="a"><![CDATA[<i>x</i>]]></string>"#)).unwrap();
        assert_eq!(resources[0].content, "&lt;i&gt;x&lt;/i&gt;");
    }

    // ==================== Structure ====================

    #[test]
    fn test_preserves_document_order() {
        let resources = parse(&wrap(
            r#"<string name="c">3</string>
               <string name="a">1</string>
               <string name="b">2</string>"#,
        ))
        .unwrap();
        let ids: Vec<_> = resources.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_other_resource_types_are_ignored() {
        let resources = parse(&wrap(
            r#"<!-- comment -->
               <color name="red">#f00</color>
               <string-array name="arr"><item>x</item></string-array>
               <plurals name="p"><item quantity="one">x</item></plurals>
               <string name="a">kept</string>"#,
        ))
        .unwrap();
        assert_eq!(resources.len(), 1);
        assert_eq!(resources[0].id, "a");
    }

    #[test]
    fn test_unclosed_string_is_an_xml_error() {
        let err = parse("<resources><string name=\"a\">x").unwrap_err();
        assert!(matches!(err, ResourceError::Xml { .. }));
    }

    #[test]
    fn test_mismatched_tags_are_an_xml_error() {
        let err = parse("<resources><string name=\"a\">x</b></resources>").unwrap_err();
        assert!(matches!(err, ResourceError::Xml { .. }));
    }

    // ==================== Files ====================

    #[test]
    fn test_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let resources = parse_resource_file(&temp_dir.path().join("strings.xml")).unwrap();
        assert!(resources.is_empty());
    }

    #[test]
    fn test_parse_file_from_disk() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("strings.xml");
        std::fs::write(&path, wrap(r#"<string name="app_name">App</string>"#)).unwrap();

        let resources = parse_resource_file(&path).unwrap();
        assert_eq!(resources, vec![StringResource::new("app_name", "App", true)]);
    }

    proptest! {
        #[test]
        fn prop_content_only_contains_entity_forms(text in "[ -~]{0,64}") {
            let xml = wrap(&format!(r#"<string name="p">{}</string>"#, escape(text.as_str())));
            let resources = parse(&xml).unwrap();

            let content = &resources[0].content;
            prop_assert_eq!(content, &escape_content(&text));
            prop_assert!(!content.contains(['<', '>', '"', '\'']));

            let stripped = content
                .replace("&amp;", "")
                .replace("&lt;", "")
                .replace("&gt;", "")
                .replace("&quot;", "")
                .replace("&apos;", "");
            prop_assert!(!stripped.contains('&'));
        }
    }
}
