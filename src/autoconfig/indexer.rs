use super::{FieldCandidate, FieldManager, Node, Path};
use lazy_static::lazy_static;
use scraper::{node::Element, ElementRef, Html, Selector};
use std::collections::HashMap;
use tracing::debug;

const E: &str = "Invalid selector";
const LINK_ATTRIBUTES: &[&str] = &["href"];
const IMAGE_ATTRIBUTES: &[&str] = &["src"];
lazy_static! {
    static ref BODY: Selector = Selector::parse("body").expect(E);
    static ref ALLOWED_ATTRIBUTES: HashMap<&'static str, &'static [&'static str]> =
        HashMap::from([("a", LINK_ATTRIBUTES), ("img", IMAGE_ATTRIBUTES)]);
}

const VOID_TAGS: [&str; 13] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];
const SKIPPED_TAGS: [&str; 4] = ["script", "style", "noscript", "template"];
const COMMENT: &str = "#comment";

/// Walks the `<body>` of `html` and emits one candidate per non-empty text
/// node and per allow-listed attribute, in document order.
///
/// The input goes through html5ever first, so implicit elements such as
/// `tbody` are present and malformed markup is recovered, never rejected.
pub fn index(html: &str) -> FieldManager {
    let doc = Html::parse_document(html);
    let mut indexer = Indexer::default();

    if let Some(body) = doc.select(&BODY).next() {
        indexer.stack.push(Node::new("body"));
        indexer.walk(body);
    }

    debug!("Indexed {} field candidates", indexer.fields.len());
    indexer.fields.into()
}

#[derive(Default)]
struct Indexer {
    stack: Vec<Node>,
    fields: Vec<FieldCandidate>,
}

impl Indexer {
    fn emit(&mut self, path: Path, attr: &str, text_index: usize, value: &str) {
        let emission_index = self.fields.len();
        self.fields
            .push(FieldCandidate::new(path, attr, text_index, value, emission_index));
    }

    /// Copy of the traversal stack, optionally extended by one node.
    fn path(&self, last: Option<&Node>) -> Path {
        let mut nodes = self.stack.clone();
        nodes.extend(last.cloned());
        Path(nodes)
    }

    fn walk<'a>(&mut self, element: ElementRef<'a>) {
        let mut siblings: Vec<&'a str> = vec![];
        let mut texts = 0;

        for child in element.children() {
            match child.value() {
                scraper::Node::Text(text) => {
                    let text = text.trim();
                    if !text.is_empty() {
                        let path = self.path(None);
                        self.emit(path, "", texts, text);
                        texts += 1;
                    }
                }
                scraper::Node::Comment(_) => siblings.push(COMMENT),
                scraper::Node::Element(el) => {
                    let tag = el.name();
                    let node = element_node(el, &siblings);
                    siblings.push(tag);
                    if SKIPPED_TAGS.contains(&tag) {
                        continue;
                    }

                    if let Some(attrs) = ALLOWED_ATTRIBUTES.get(tag) {
                        for attr in attrs.iter() {
                            if let Some(value) = el.attr(attr).map(str::trim) {
                                if !value.is_empty() {
                                    let path = self.path(Some(&node));
                                    self.emit(path, attr, 0, value);
                                }
                            }
                        }
                    }

                    if VOID_TAGS.contains(&tag) {
                        continue;
                    }
                    if let Some(child) = ElementRef::wrap(child) {
                        self.stack.push(node);
                        self.walk(child);
                        self.stack.pop();
                    }
                }
                _ => {}
            }
        }
    }
}

fn element_node(el: &Element, siblings: &[&str]) -> Node {
    let tag = el.name();
    let classes = el
        .attr("class")
        .unwrap_or_default()
        .split_whitespace()
        .filter(|c| !c.contains('.'));

    let mut node = Node::new(tag).with_classes(classes);
    if siblings.iter().any(|s| *s == tag) {
        node.pseudo_classes = vec![format!("nth-child({})", siblings.len() + 1)];
    }
    node
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn paths(fm: &FieldManager) -> Vec<String> {
        fm.iter().map(|f| f.path.to_string()).collect()
    }

    #[test]
    fn test_index_text_and_attributes() {
        let html = r#"<html><body>
            <div class="card big">
                <a href="/one">One</a>
                <img src="one.png">
                <span class="date">Mon</span>
            </div>
        </body></html>"#;

        let fm = index(html);
        let values: Vec<&str> = fm.iter().flat_map(|f| f.example_values()).collect();
        assert_eq!(values, vec!["/one", "One", "one.png", "Mon"]);
        assert_eq!(
            paths(&fm),
            vec![
                "body > div.card.big > a",
                "body > div.card.big > a",
                "body > div.card.big > img",
                "body > div.card.big > span.date",
            ]
        );
        assert_eq!(fm[0].attr, "href");
        assert_eq!(fm[1].attr, "");
        assert_eq!(fm[2].attr, "src");
        assert_eq!(
            fm.iter().map(|f| f.emission_index).collect::<Vec<_>>(),
            vec![0, 1, 2, 3]
        );
    }

    #[test]
    fn test_index_nth_child_same_tag_only() {
        let html = r#"<body><ul>
            <li>a</li>
            <!-- separator -->
            <li class="x">b</li>
            <p>c</p>
        </ul></body>"#;

        let fm = index(html);
        assert_eq!(
            paths(&fm),
            vec![
                "body > ul > li",
                "body > ul > li.x:nth-child(3)",
                "body > ul > p",
            ]
        );
    }

    #[test]
    fn test_index_text_index_and_classes() {
        let html = r#"<body><p class="a b.c  d">first<br>second<b>bold</b>third</p></body>"#;

        let fm = index(html);
        assert_eq!(
            fm.iter()
                .map(|f| (f.example_values().next().unwrap(), f.text_index))
                .collect::<Vec<_>>(),
            vec![("first", 0), ("second", 1), ("bold", 0), ("third", 2)]
        );
        assert_eq!(fm[0].path.to_string(), "body > p.a.d");
    }

    #[test]
    fn test_index_implicit_tbody_and_skipped_content() {
        let html = r#"<body><script>var x = 1;</script><table><tr><td>cell</td></tr></table>"#;

        let fm = index(html);
        assert_eq!(paths(&fm), vec!["body > table > tbody > tr > td"]);
    }

    #[test]
    fn test_index_malformed_html() {
        let html = "<body><div><p>unclosed<span>inner</div></p></body>garbage";
        let fm = index(html);
        let values: Vec<&str> = fm.iter().flat_map(|f| f.example_values()).collect();
        assert_eq!(values, vec!["unclosed", "inner", "garbage"]);
    }

    #[test]
    fn test_index_paths_are_not_shared() {
        let html = r#"<body><div><span>a</span><span>b</span></div></body>"#;
        let mut fm = index(html);
        fm[0].path[1].pseudo_classes.push("nth-child(9)".to_string());
        assert_eq!(fm[1].path[1].pseudo_classes, Vec::<String>::new());
    }
}
