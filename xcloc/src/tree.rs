//! A small owned XML tree with get / create-on-demand accessors.
//!
//! Reading and writing go through `quick-xml` events. Everything the editor
//! does not understand (comments, CDATA, processing instructions, the
//! doctype, whitespace between elements) is kept as a node so that writing
//! a document back changes only what was edited.
//!
//! Readers use [`Element::attribute`] and [`Element::first_child_named`];
//! they never mutate. Only the `get_or_create_*` accessors create nodes, and
//! they attach the new node to its parent before handing it out.

use std::io::BufRead;

use quick_xml::{
    Reader, Writer,
    escape::partial_escape,
    events::{BytesCData, BytesEnd, BytesStart, BytesText, Event},
};

use crate::error::Error;

/// A named attribute. Names are unique within one element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
    CData(String),
    Comment(String),
    /// Raw content of the `<?xml ...?>` declaration, without the delimiters.
    Declaration(String),
    /// Raw content of a `<?...?>` processing instruction.
    ProcessingInstruction(String),
    /// Raw content of `<!DOCTYPE ...>`.
    DocType(String),
}

impl Node {
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Node::Element(el) => Some(el),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    attributes: Vec<Attribute>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Element {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.name == name)
            .map(|attr| attr.value.as_str())
    }

    /// Returns the value of `name`, first attaching an empty attribute if
    /// the element has none.
    pub fn get_or_create_attribute(&mut self, name: &str) -> &mut String {
        let index = match self.attributes.iter().position(|attr| attr.name == name) {
            Some(index) => index,
            None => {
                self.attributes.push(Attribute {
                    name: name.to_string(),
                    value: String::new(),
                });
                self.attributes.len() - 1
            }
        };
        &mut self.attributes[index].value
    }

    pub fn set_attribute(&mut self, name: &str, value: impl Into<String>) {
        *self.get_or_create_attribute(name) = value.into();
    }

    /// Removes `name`, returning its previous value.
    pub fn remove_attribute(&mut self, name: &str) -> Option<String> {
        let index = self.attributes.iter().position(|attr| attr.name == name)?;
        Some(self.attributes.remove(index).value)
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    pub fn child_elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(Node::as_element_mut)
    }

    /// The first child element called `name`, in document order.
    pub fn first_child_named(&self, name: &str) -> Option<&Element> {
        self.child_elements().find(|el| el.name == name)
    }

    pub fn first_child_named_mut(&mut self, name: &str) -> Option<&mut Element> {
        self.child_elements_mut().find(|el| el.name == name)
    }

    fn child_position(&self, name: &str) -> Option<usize> {
        self.children
            .iter()
            .position(|node| matches!(node, Node::Element(el) if el.name == name))
    }

    /// The first child element called `name`; appends an empty one if
    /// there is none.
    pub fn get_or_create_child_named(&mut self, name: &str) -> &mut Element {
        let index = match self.child_position(name) {
            Some(index) => index,
            None => {
                self.children.push(Node::Element(Element::new(name)));
                self.children.len() - 1
            }
        };
        self.element_at(index)
    }

    /// Like [`Element::get_or_create_child_named`], but a newly created
    /// child is inserted right after the first child called `anchor`
    /// (or appended when there is no such child).
    pub fn get_or_create_child_named_after(&mut self, name: &str, anchor: &str) -> &mut Element {
        let index = match self.child_position(name) {
            Some(index) => index,
            None => {
                let at = self
                    .child_position(anchor)
                    .map_or(self.children.len(), |i| i + 1);
                self.children.insert(at, Node::Element(Element::new(name)));
                at
            }
        };
        self.element_at(index)
    }

    /// Detaches the first child element called `name`.
    pub fn remove_child_named(&mut self, name: &str) -> Option<Element> {
        let index = self.child_position(name)?;
        match self.children.remove(index) {
            Node::Element(el) => Some(el),
            _ => None,
        }
    }

    fn element_at(&mut self, index: usize) -> &mut Element {
        match &mut self.children[index] {
            Node::Element(el) => el,
            _ => unreachable!("child index {index} does not point at an element"),
        }
    }

    /// Concatenated text and CDATA content of this element and its
    /// descendants.
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for node in &self.children {
            match node {
                Node::Text(text) | Node::CData(text) => out.push_str(text),
                Node::Element(el) => el.collect_text(out),
                _ => {}
            }
        }
    }

    /// Replaces all content with a single text node.
    pub fn set_text(&mut self, value: impl Into<String>) {
        let value = value.into();
        self.children.clear();
        if !value.is_empty() {
            self.children.push(Node::Text(value));
        }
    }

    /// All descendant elements called `name`, in document order. Matching
    /// elements are not searched further.
    pub fn descendants_named<'a>(&'a self, name: &str) -> Vec<&'a Element> {
        let mut out = Vec::new();
        self.collect_named(name, &mut out);
        out
    }

    fn collect_named<'a>(&'a self, name: &str, out: &mut Vec<&'a Element>) {
        for child in self.child_elements() {
            if child.name == name {
                out.push(child);
            } else {
                child.collect_named(name, out);
            }
        }
    }

    /// The first descendant called `name` whose attribute `attr` equals `value`.
    pub fn find_descendant_mut(
        &mut self,
        name: &str,
        attr: &str,
        value: &str,
    ) -> Option<&mut Element> {
        for child in self.child_elements_mut() {
            if child.name == name {
                if child.attribute(attr) == Some(value) {
                    return Some(child);
                }
            } else if let Some(found) = child.find_descendant_mut(name, attr, value) {
                return Some(found);
            }
        }
        None
    }
}

/// A parsed XML document: the root element plus whatever surrounds it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDocument {
    pub prolog: Vec<Node>,
    pub root: Element,
    pub epilog: Vec<Node>,
}

impl XmlDocument {
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, Error> {
        let mut xml_reader = Reader::from_reader(reader);
        xml_reader.config_mut().trim_text(false);

        let mut buf = Vec::new();
        let mut stack: Vec<Element> = Vec::new();
        let mut prolog = Vec::new();
        let mut root: Option<Element> = None;
        let mut epilog = Vec::new();

        loop {
            let node = match xml_reader.read_event_into(&mut buf)? {
                Event::Start(ref e) => {
                    stack.push(element_from_start(e)?);
                    None
                }
                Event::End(_) => {
                    let el = stack.pop().ok_or_else(|| {
                        Error::InvalidDocument("unexpected closing tag".to_string())
                    })?;
                    Some(Node::Element(el))
                }
                Event::Empty(ref e) => Some(Node::Element(element_from_start(e)?)),
                Event::Text(e) => Some(Node::Text(e.unescape()?.into_owned())),
                Event::CData(e) => Some(Node::CData(lossy(&e))),
                Event::Comment(e) => Some(Node::Comment(lossy(&e))),
                Event::Decl(e) => Some(Node::Declaration(lossy(&e))),
                Event::PI(e) => Some(Node::ProcessingInstruction(lossy(&e))),
                Event::DocType(e) => Some(Node::DocType(lossy(&e))),
                Event::Eof => break,
            };
            buf.clear();

            let Some(node) = node else { continue };
            if let Some(parent) = stack.last_mut() {
                parent.children.push(node);
            } else if let Node::Element(el) = node {
                if root.is_some() {
                    return Err(Error::InvalidDocument(
                        "more than one root element".to_string(),
                    ));
                }
                root = Some(el);
            } else if root.is_none() {
                prolog.push(node);
            } else {
                epilog.push(node);
            }
        }

        if let Some(open) = stack.last() {
            return Err(Error::InvalidDocument(format!(
                "unclosed element <{}>",
                open.name
            )));
        }
        let root = root.ok_or_else(|| Error::InvalidDocument("no root element".to_string()))?;

        Ok(XmlDocument {
            prolog,
            root,
            epilog,
        })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        Self::from_reader(bytes)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        let mut writer = Writer::new(Vec::new());
        for node in &self.prolog {
            write_node(&mut writer, node)?;
        }
        write_element(&mut writer, &self.root)?;
        for node in &self.epilog {
            write_node(&mut writer, node)?;
        }
        Ok(writer.into_inner())
    }
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn element_from_start(e: &BytesStart) -> Result<Element, Error> {
    let mut el = Element::new(lossy(e.name().as_ref()));
    for attr in e.attributes() {
        let attr = attr?;
        let name = lossy(attr.key.as_ref());
        let value = attr.unescape_value()?.into_owned();
        el.set_attribute(&name, value);
    }
    Ok(el)
}

fn write_raw(writer: &mut Writer<Vec<u8>>, open: &str, content: &str, close: &str) {
    let out = writer.get_mut();
    out.extend_from_slice(open.as_bytes());
    out.extend_from_slice(content.as_bytes());
    out.extend_from_slice(close.as_bytes());
}

fn write_node(writer: &mut Writer<Vec<u8>>, node: &Node) -> Result<(), Error> {
    match node {
        Node::Element(el) => write_element(writer, el)?,
        Node::Text(text) => {
            writer.write_event(Event::Text(BytesText::from_escaped(partial_escape(
                text.as_str(),
            ))))?;
        }
        Node::CData(text) => writer.write_event(Event::CData(BytesCData::new(text.as_str())))?,
        Node::Comment(text) => write_raw(writer, "<!--", text, "-->"),
        Node::Declaration(raw) | Node::ProcessingInstruction(raw) => {
            write_raw(writer, "<?", raw, "?>")
        }
        Node::DocType(raw) => write_raw(writer, "<!DOCTYPE ", raw, ">"),
    }
    Ok(())
}

fn write_element(writer: &mut Writer<Vec<u8>>, el: &Element) -> Result<(), Error> {
    let mut start = BytesStart::new(el.name.as_str());
    for attr in &el.attributes {
        start.push_attribute((attr.name.as_str(), attr.value.as_str()));
    }

    if el.children.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    for child in &el.children {
        write_node(writer, child)?;
    }
    writer.write_event(Event::End(BytesEnd::new(el.name.as_str())))?;
    Ok(())
}
