//! Streaming tree builder.
//!
//! The XML reader is reduced to three tokens (enter, text, exit). Each enter
//! pushes the node built by the construction table; each exit pops it and hands
//! it to the completion table together with its parent. The last node popped is
//! the document root.

use std::io::Read;
use std::path::PathBuf;

use xml::reader::{EventReader, XmlEvent};

use crate::config::LoaderConfig;
use crate::error::{TmxError, TmxResult};
use crate::gid::Gid;
use crate::loaders::ResourceReader;
use crate::loaders::attributes::Attributes;
use crate::loaders::completion::attach;
use crate::loaders::nodes::{ElementKind, Node, construct};

/// A markup event, reduced to what the builder needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token {
    Enter {
        name: String,
        attributes: Vec<(String, String)>,
    },
    Text(String),
    Exit {
        name: String,
    },
}

impl Token {
    fn from_xml(event: XmlEvent) -> Option<Self> {
        match event {
            XmlEvent::StartElement {
                name, attributes, ..
            } => Some(Token::Enter {
                name: name.local_name,
                attributes: attributes
                    .into_iter()
                    .map(|attribute| (attribute.name.local_name, attribute.value))
                    .collect(),
            }),
            XmlEvent::EndElement { name } => Some(Token::Exit {
                name: name.local_name,
            }),
            XmlEvent::Characters(text) | XmlEvent::CData(text) => Some(Token::Text(text)),
            _ => None,
        }
    }
}

/// A tile object whose tile metadata is merged in after the whole document is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PendingTileObject {
    pub key: u32,
    pub gid: Gid,
}

/// Ambient state of one load, shared by the map and any external tilesets it pulls in.
pub(crate) struct ParseContext<'a> {
    /// Directory relative resource paths resolve against.
    pub base_dir: PathBuf,
    /// Lowest gid not yet claimed by a tileset.
    pub next_gid: u32,
    pub next_object_key: u32,
    pub pending_tile_objects: Vec<PendingTileObject>,
    pub reader: &'a mut dyn ResourceReader,
    pub config: &'a LoaderConfig,
    /// External documents currently being parsed, outermost first.
    pub external_chain: Vec<PathBuf>,
}

impl<'a> ParseContext<'a> {
    pub(crate) fn new(
        base_dir: PathBuf,
        reader: &'a mut dyn ResourceReader,
        config: &'a LoaderConfig,
    ) -> Self {
        Self {
            base_dir,
            next_gid: 1,
            next_object_key: 0,
            pending_tile_objects: Vec::new(),
            reader,
            config,
            external_chain: Vec::new(),
        }
    }
}

pub(crate) struct TreeBuilder<'c, 'a, H> {
    ctx: &'c mut ParseContext<'a>,
    stack: Vec<Node<H>>,
    root: Option<Node<H>>,
}

impl<'c, 'a, H> TreeBuilder<'c, 'a, H> {
    pub(crate) fn new(ctx: &'c mut ParseContext<'a>) -> Self {
        Self {
            ctx,
            stack: Vec::new(),
            root: None,
        }
    }

    pub(crate) fn feed(&mut self, token: Token) -> TmxResult<()> {
        match token {
            Token::Enter { name, attributes } => {
                if self.root.is_some() {
                    return Err(TmxError::MalformedDocument(format!(
                        "<{name}> after the root element"
                    )));
                }
                let kind = ElementKind::from_name(&name).ok_or(TmxError::UnknownElement(name))?;
                if self.stack.is_empty() && !matches!(kind, ElementKind::Map | ElementKind::Tileset) {
                    return Err(TmxError::MalformedDocument(format!(
                        "<{}> cannot be a document root",
                        kind.name()
                    )));
                }
                let attrs = Attributes::new(kind, attributes);
                let node = construct(kind, attrs, &self.stack, self.ctx)?;
                self.stack.push(node);
            }
            Token::Text(text) => {
                if let Some(top) = self.stack.last_mut() {
                    top.push_text(&text);
                }
            }
            Token::Exit { name } => {
                let node = self
                    .stack
                    .pop()
                    .ok_or_else(|| TmxError::MalformedDocument(format!("unexpected </{name}>")))?;
                if node.kind().name() != name {
                    return Err(TmxError::MalformedDocument(format!(
                        "</{name}> closes <{}>",
                        node.kind().name()
                    )));
                }
                match self.stack.last_mut() {
                    Some(parent) => attach(parent, node, self.ctx)?,
                    None => self.root = Some(node),
                }
            }
        }
        Ok(())
    }

    pub(crate) fn finish(self) -> TmxResult<Node<H>> {
        if let Some(open) = self.stack.last() {
            return Err(TmxError::MalformedDocument(format!(
                "document ended inside <{}>",
                open.kind().name()
            )));
        }
        self.root
            .ok_or_else(|| TmxError::MalformedDocument("empty document".to_string()))
    }
}

/// Run one document through a fresh builder.
pub(crate) fn parse_document<H, R: Read>(source: R, ctx: &mut ParseContext<'_>) -> TmxResult<Node<H>> {
    let mut builder = TreeBuilder::new(ctx);
    for event in EventReader::new(source) {
        if let Some(token) = Token::from_xml(event?) {
            builder.feed(token)?;
        }
    }
    builder.finish()
}
