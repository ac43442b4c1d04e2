//! Fragment reading: load `{type}/{reference_name}.xml` and extract its
//! display name, verbatim source, and declared children.

use std::path::Path;

use encoding_rs::{Encoding, UTF_8};
use roxmltree::{Document, Node};

use crate::types::ComponentRef;

/// Attributes that name a child's fragment, in lookup order.
const REFERENCE_ATTRIBUTES: [&str; 2] = ["url_name", "url_name_ref"];

/// One immediate child element of a fragment root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChildDecl {
    /// Content embedded directly in the parent, without a reference name.
    Inline(InlineChild),
    /// A reference to another fragment file.
    Reference(ComponentRef),
}

/// A parsed fragment. Reading never fails: missing and unparsable files
/// come back as labelled, childless fragments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    /// Child declarations in document order.
    pub children: Vec<ChildDecl>,
    /// Root `display_name`, the reference name, or a placeholder label.
    pub display_name: String,
    /// Verbatim file text; empty when the file could not be read.
    pub raw_source: String,
    /// Reference name the fragment was requested under.
    pub reference_name: String,
    /// Outcome of loading the file.
    pub status: FragmentStatus,
}

/// Whether a fragment file was found and parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentStatus {
    /// The file is not well-formed XML in its declared encoding, or the
    /// reference names a path outside the package.
    Invalid,
    /// No file at the conventional path.
    Missing,
    /// Parsed normally.
    Parsed,
}

/// Inline child content. Only its own direct references are followed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineChild {
    /// Element tag, used as the component type.
    pub component_type: String,
    /// The element's `display_name`, if any.
    pub display_name: Option<String>,
    /// Verbatim text of the element within its parent fragment.
    pub raw_source: String,
    /// References declared by the element's immediate children.
    pub references: Vec<ComponentRef>,
}

impl Fragment {
    /// Placeholder for a file that cannot be located safely or parsed.
    fn invalid(reference: &ComponentRef, raw_source: String) -> Self {
        return Self::placeholder(reference, "Invalid", FragmentStatus::Invalid, raw_source);
    }

    /// Placeholder for a file that is not there.
    fn missing(reference: &ComponentRef) -> Self {
        return Self::placeholder(reference, "Missing", FragmentStatus::Missing, String::new());
    }

    /// Childless fragment labelled `{label} {type}`.
    fn placeholder(
        reference: &ComponentRef,
        label: &str,
        status: FragmentStatus,
        raw_source: String,
    ) -> Self {
        return Self {
            children: Vec::new(),
            display_name: format!("{label} {}", reference.component_type),
            raw_source,
            reference_name: reference.reference_name.clone(),
            status,
        };
    }

    /// Only the reference children, in declaration order.
    pub fn references(&self) -> impl Iterator<Item = &ComponentRef> {
        return self.children.iter().filter_map(|c| {
            return match c {
                ChildDecl::Reference(r) => Some(r),
                ChildDecl::Inline(_) => None,
            };
        });
    }
}

/// Decode XML file bytes to text. UTF-8 input is kept byte for byte; any
/// other encoding comes from a byte-order mark or the `<?xml ...?>`
/// declaration. Returns `None` when the bytes are not valid in that encoding.
pub fn decode_xml(bytes: Vec<u8>) -> Option<String> {
    let (encoding, bom_length) = Encoding::for_bom(&bytes)
        .or_else(|| return declared_encoding(&bytes).map(|encoding| return (encoding, 0)))
        .unwrap_or((UTF_8, 0));
    if encoding == UTF_8 {
        return String::from_utf8(bytes).ok();
    }

    let (text, had_errors) = encoding.decode_without_bom_handling(bytes.get(bom_length..)?);
    if had_errors {
        return None;
    }
    return Some(text.into_owned());
}

/// Parse fragment text already loaded from disk.
/// Returns `None` when the text is not well-formed XML.
pub fn parse_fragment(reference: &ComponentRef, text: &str) -> Option<Fragment> {
    let doc = Document::parse(text).ok()?;
    let root = doc.root_element();

    let display_name = root
        .attribute("display_name")
        .unwrap_or(&reference.reference_name)
        .to_string();

    let children = root
        .children()
        .filter(Node::is_element)
        .map(|child| return child_declaration(child, text))
        .collect();

    return Some(Fragment {
        children,
        display_name,
        raw_source: text.to_string(),
        reference_name: reference.reference_name.clone(),
        status: FragmentStatus::Parsed,
    });
}

/// Load and parse the fragment for `reference` under `root`.
pub fn read(root: &Path, reference: &ComponentRef) -> Fragment {
    let Some(path) = reference.fragment_path(root) else {
        return Fragment::invalid(reference, String::new());
    };
    if !path.is_file() {
        return Fragment::missing(reference);
    }

    let Some(text) = std::fs::read(&path).ok().and_then(decode_xml) else {
        return Fragment::invalid(reference, String::new());
    };

    return match parse_fragment(reference, &text) {
        Some(fragment) => fragment,
        None => Fragment::invalid(reference, text),
    };
}

/// Look up a child's reference name: `url_name` first, then `url_name_ref`.
/// Empty values count as absent.
pub fn reference_name_of<'a>(node: Node<'a, '_>) -> Option<&'a str> {
    return REFERENCE_ATTRIBUTES
        .iter()
        .filter_map(|attr| return node.attribute(*attr))
        .find(|value| return !value.is_empty());
}

/// Classify one immediate child element of a fragment root.
fn child_declaration(node: Node<'_, '_>, text: &str) -> ChildDecl {
    let tag = node.tag_name().name();
    if let Some(name) = reference_name_of(node) {
        return ChildDecl::Reference(ComponentRef::new(tag, name));
    }

    let references = node
        .children()
        .filter(Node::is_element)
        .filter_map(|nested| {
            return reference_name_of(nested)
                .map(|name| return ComponentRef::new(nested.tag_name().name(), name));
        })
        .collect();

    return ChildDecl::Inline(InlineChild {
        component_type: tag.to_string(),
        display_name: node.attribute("display_name").map(str::to_string),
        raw_source: text.get(node.range()).unwrap_or_default().to_string(),
        references,
    });
}

/// Encoding named by a leading XML declaration. A declaration readable as
/// ASCII cannot be UTF-16, so UTF-16 labels fall back to UTF-8.
fn declared_encoding(bytes: &[u8]) -> Option<&'static Encoding> {
    let head = bytes.strip_prefix(b"<?xml")?;
    let end = head.windows(2).position(|pair| return pair == b"?>")?;
    let declaration = std::str::from_utf8(head.get(..end)?).ok()?;

    let (_, after) = declaration.split_once("encoding")?;
    let value = after.trim_start().strip_prefix('=')?.trim_start();
    let quote = value.chars().next().filter(|c| return *c == '"' || *c == '\'')?;
    let label = value.get(1..)?.split(quote).next()?;
    return Encoding::for_label(label.as_bytes()).map(Encoding::output_encoding);
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc, clippy::unwrap_used, clippy::indexing_slicing, reason = "tests")]
mod tests {
    use std::fs;

    use super::*;

    fn write_fragment(root: &Path, component_type: &str, name: &str, body: &str) {
        let dir = root.join(component_type);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(format!("{name}.xml")), body).unwrap();
    }

    #[test]
    fn reads_display_name_and_ordered_references() {
        let tmp = tempfile::tempdir().unwrap();
        let body = r#"<sequential display_name="Week 1">
  <vertical url_name="v2"/>
  <vertical url_name_ref="v1"/>
  <html url_name="intro"/>
</sequential>"#;
        write_fragment(tmp.path(), "sequential", "s1", body);

        let fragment = read(tmp.path(), &ComponentRef::new("sequential", "s1"));
        assert_eq!(fragment.status, FragmentStatus::Parsed);
        assert_eq!(fragment.display_name, "Week 1");
        assert_eq!(fragment.raw_source, body);

        let refs: Vec<String> = fragment.references().map(ToString::to_string).collect();
        assert_eq!(refs, ["vertical/v2", "vertical/v1", "html/intro"]);
    }

    #[test]
    fn display_name_defaults_to_reference_name() {
        let tmp = tempfile::tempdir().unwrap();
        write_fragment(tmp.path(), "chapter", "ch1", "<chapter/>");

        let fragment = read(tmp.path(), &ComponentRef::new("chapter", "ch1"));
        assert_eq!(fragment.display_name, "ch1");
        assert!(fragment.children.is_empty());
    }

    #[test]
    fn url_name_takes_precedence_over_url_name_ref() {
        let doc = Document::parse(r#"<p url_name="direct" url_name_ref="named"/>"#).unwrap();
        assert_eq!(reference_name_of(doc.root_element()), Some("direct"));

        let doc = Document::parse(r#"<p url_name="" url_name_ref="named"/>"#).unwrap();
        assert_eq!(reference_name_of(doc.root_element()), Some("named"));

        let doc = Document::parse(r#"<p display_name="x"/>"#).unwrap();
        assert_eq!(reference_name_of(doc.root_element()), None);
    }

    #[test]
    fn missing_file_is_labelled_placeholder() {
        let tmp = tempfile::tempdir().unwrap();
        let fragment = read(tmp.path(), &ComponentRef::new("problem", "gone"));
        assert_eq!(fragment.status, FragmentStatus::Missing);
        assert_eq!(fragment.display_name, "Missing problem");
        assert_eq!(fragment.reference_name, "gone");
        assert!(fragment.raw_source.is_empty());
        assert!(fragment.children.is_empty());
    }

    #[test]
    fn malformed_xml_is_invalid_but_keeps_source() {
        let tmp = tempfile::tempdir().unwrap();
        write_fragment(tmp.path(), "video", "v1", "<video url_name='a'><unclosed></video>");

        let fragment = read(tmp.path(), &ComponentRef::new("video", "v1"));
        assert_eq!(fragment.status, FragmentStatus::Invalid);
        assert_eq!(fragment.display_name, "Invalid video");
        assert!(fragment.children.is_empty());
        assert!(fragment.raw_source.contains("<unclosed>"));
    }

    #[test]
    fn inline_children_capture_tag_source_and_nested_references() {
        let text = r#"<course><chapter display_name="Inline Ch"><sequential url_name="s1"/><p>text</p></chapter><wiki slug="x"/></course>"#;
        let fragment = parse_fragment(&ComponentRef::new("course", "run1"), text).unwrap();
        assert_eq!(fragment.children.len(), 2);

        let ChildDecl::Inline(chapter) = &fragment.children[0] else {
            panic!("expected inline chapter");
        };
        assert_eq!(chapter.component_type, "chapter");
        assert_eq!(chapter.display_name.as_deref(), Some("Inline Ch"));
        assert!(chapter.raw_source.starts_with("<chapter display_name"));
        assert!(chapter.raw_source.ends_with("</chapter>"));
        assert_eq!(chapter.references, [ComponentRef::new("sequential", "s1")]);

        let ChildDecl::Inline(wiki) = &fragment.children[1] else {
            panic!("expected inline wiki");
        };
        assert_eq!(wiki.raw_source, r#"<wiki slug="x"/>"#);
        assert!(wiki.references.is_empty());
    }

    #[test]
    fn text_and_comment_nodes_are_not_children() {
        let text = "<vertical>\n  <!-- note -->\n  text\n  <problem url_name=\"p1\"/>\n</vertical>";
        let fragment = parse_fragment(&ComponentRef::new("vertical", "v"), text).unwrap();
        assert_eq!(fragment.children, [ChildDecl::Reference(ComponentRef::new("problem", "p1"))]);
    }

    #[test]
    fn latin1_fragment_is_decoded_from_its_declaration() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("chapter");
        fs::create_dir_all(&dir).unwrap();
        let body = b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\n<chapter display_name=\"Caf\xE9\"><sequential url_name=\"s1\"/></chapter>";
        fs::write(dir.join("ch1.xml"), body).unwrap();

        let fragment = read(tmp.path(), &ComponentRef::new("chapter", "ch1"));
        assert_eq!(fragment.status, FragmentStatus::Parsed);
        assert_eq!(fragment.display_name, "Café");
        assert_eq!(fragment.references().count(), 1);
        assert!(fragment.raw_source.contains("Café"));
    }

    #[test]
    fn utf16_fragment_with_bom_is_decoded() {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in r#"<html display_name="Ünïcode"/>"#.encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        assert_eq!(decode_xml(bytes).unwrap(), r#"<html display_name="Ünïcode"/>"#);
    }

    #[test]
    fn utf8_bytes_are_kept_verbatim() {
        let text = "<?xml version='1.0' encoding='utf-8'?>\r\n<html display_name=\"naïve\"/>\n";
        assert_eq!(decode_xml(text.as_bytes().to_vec()).unwrap(), text);
        assert_eq!(decode_xml(vec![b'<', 0xFF, b'>']), None);
    }

    #[test]
    fn declared_utf16_without_bom_reads_as_utf8() {
        let text = r#"<?xml version="1.0" encoding="UTF-16"?><html/>"#;
        assert_eq!(decode_xml(text.as_bytes().to_vec()).unwrap(), text);
    }

    #[test]
    fn reference_outside_package_is_not_read() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("pkg");
        fs::create_dir_all(root.join("chapter")).unwrap();
        fs::write(tmp.path().join("outside.xml"), r#"<secret display_name="Outside"/>"#).unwrap();

        let absolute = tmp.path().join("outside").to_string_lossy().into_owned();
        for name in [absolute.as_str(), "../../outside"] {
            let fragment = read(&root, &ComponentRef::new("chapter", name));
            assert_eq!(fragment.status, FragmentStatus::Invalid, "{name}");
            assert_eq!(fragment.display_name, "Invalid chapter");
            assert!(fragment.raw_source.is_empty());
        }
    }
}
