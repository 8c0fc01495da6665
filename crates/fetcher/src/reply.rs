//! NETCONF reply parsing
//!
//! Replies are turned into a small element tree keyed by local names, so
//! lookups ignore namespace prefixes the same way regardless of how the
//! device qualifies its elements. Character data is kept as sent; schema
//! text in `<data>` must reach disk byte for byte.

use crate::{FetchError, Result};
use quick_xml::events::Event;
use quick_xml::Reader;

/// Element of a parsed reply
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlElement {
    /// Local name (namespace prefix stripped)
    pub name: String,

    /// Concatenated, unescaped character data, whitespace included
    pub text: String,

    pub children: Vec<XmlElement>,
}

impl XmlElement {
    fn new(name: &[u8]) -> Self {
        Self {
            name: String::from_utf8_lossy(name).into_owned(),
            ..Default::default()
        }
    }

    /// Parse a document; the returned element is a nameless document root
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);

        let mut stack = vec![XmlElement::default()];
        loop {
            let event = reader
                .read_event()
                .map_err(|e| FetchError::MalformedReply(format!("Invalid XML: {}", e)))?;

            match event {
                Event::Start(start) => stack.push(XmlElement::new(start.local_name().as_ref())),
                Event::Empty(empty) => {
                    let element = XmlElement::new(empty.local_name().as_ref());
                    current(&mut stack)?.children.push(element);
                }
                Event::End(_) => {
                    let element = stack.pop().filter(|_| !stack.is_empty()).ok_or_else(|| {
                        FetchError::MalformedReply("Unbalanced closing tag".to_string())
                    })?;
                    current(&mut stack)?.children.push(element);
                }
                Event::Text(text) => {
                    let text = text
                        .unescape()
                        .map_err(|e| FetchError::MalformedReply(format!("Invalid text: {}", e)))?;
                    current(&mut stack)?.text.push_str(&text);
                }
                Event::CData(data) => {
                    let data = data.into_inner();
                    current(&mut stack)?
                        .text
                        .push_str(&String::from_utf8_lossy(&data));
                }
                Event::Eof => break,
                _ => {}
            }
        }

        match (stack.pop(), stack.is_empty()) {
            (Some(root), true) => Ok(root),
            _ => Err(FetchError::MalformedReply(
                "Unexpected end of document".to_string(),
            )),
        }
    }

    /// First direct child with the given local name
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All direct children with the given local name
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Follow a path of local names from this element
    pub fn descend(&self, path: &[&str]) -> Option<&XmlElement> {
        path.iter().try_fold(self, |element, name| element.child(name))
    }

    /// Trimmed text of a direct child, if present and non-blank
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name)
            .map(|c| c.text.trim())
            .filter(|t| !t.is_empty())
    }

    /// Depth-first search for the first element with the given local name
    pub fn find(&self, name: &str) -> Option<&XmlElement> {
        self.children
            .iter()
            .find_map(|c| if c.name == name { Some(c) } else { c.find(name) })
    }
}

fn current(stack: &mut [XmlElement]) -> Result<&mut XmlElement> {
    stack
        .last_mut()
        .ok_or_else(|| FetchError::MalformedReply("Unbalanced document".to_string()))
}

/// Look up `data` with or without the `<rpc-reply>` envelope
pub(crate) fn reply_data(root: &XmlElement) -> Option<&XmlElement> {
    root.descend(&["rpc-reply", "data"])
        .or_else(|| root.descend(&["data"]))
}

/// Turn an `<rpc-error>` reply into a transport error
pub(crate) fn check_rpc_error(root: &XmlElement) -> Result<()> {
    let Some(error) = root.find("rpc-error") else {
        return Ok(());
    };

    let message = error
        .child_text("error-message")
        .or_else(|| error.child_text("error-tag"))
        .unwrap_or("unknown error");
    Err(FetchError::Transport(format!("rpc-error: {}", message.trim())))
}
