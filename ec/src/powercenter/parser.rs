//! Streaming extraction of the repository structure from PowerCenter XML

use std::collections::HashSet;
use std::fmt::Display;

use indexmap::IndexMap;
use quick_xml::Reader;
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesRef, BytesStart, Event};
use thiserror::Error;
use tracing::{debug, info};

use super::{ComponentKind, Connector, Field, Mapping, ParsedComponent, ParsedRepository, UNKNOWN};

/// Errors raised while extracting a repository from XML
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Malformed XML at byte {position}: {message}")]
    Malformed { position: u64, message: String },

    #[error("Document contains no root element")]
    Empty,

    #[error("Expected root element POWERMART, found {0}")]
    UnexpectedRoot(String),

    #[error("Required element {0} not found")]
    MissingElement(&'static str),

    #[error("{element} element is missing the {attribute} attribute")]
    MissingAttribute { element: String, attribute: &'static str },

    #[error("Duplicate {kind} name: {name}")]
    DuplicateName { kind: ComponentKind, name: String },
}

const ROOT: &[u8] = b"POWERMART";

/// Elements whose attributes the builder needs
const TRACKED: &[&[u8]] = &[
    b"POWERMART",
    b"REPOSITORY",
    b"FOLDER",
    b"SOURCE",
    b"SOURCEFIELD",
    b"TARGET",
    b"TARGETFIELD",
    b"TRANSFORMATION",
    b"TRANSFORMFIELD",
    b"MAPPING",
    b"SHORTCUT",
    b"CONNECTOR",
];

/// Parse a PowerCenter export into a [`ParsedRepository`]
///
/// Fails on malformed XML, a root other than `POWERMART`, a document without
/// any `SOURCE` or `TARGET`, and on missing or duplicate component names.
pub fn parse_repository(xml: &str) -> Result<ParsedRepository, ParseError> {
    debug!(xml_len = xml.len(), "parse_repository: called");
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut builder = RepositoryBuilder::default();
    let mut depth = 0usize;
    let mut roots = 0usize;

    loop {
        let event = reader.read_event().map_err(|e| malformed(&reader, e))?;
        match event {
            Event::Start(e) => {
                if depth == 0 {
                    check_root(&e, &mut roots, &reader)?;
                }
                depth += 1;
                builder.open(&e, &reader)?;
            }
            Event::Empty(e) => {
                if depth == 0 {
                    check_root(&e, &mut roots, &reader)?;
                }
                builder.open(&e, &reader)?;
                builder.close(e.name().as_ref())?;
            }
            Event::End(e) => {
                depth = depth.checked_sub(1).ok_or_else(|| malformed(&reader, "unexpected closing tag"))?;
                builder.close(e.name().as_ref())?;
            }
            Event::Text(e) => {
                let text = e.decode().map_err(|err| malformed(&reader, err))?;
                if depth == 0 && !text.trim().is_empty() {
                    return Err(malformed(&reader, "text outside the root element"));
                }
            }
            Event::CData(_) if depth == 0 => {
                return Err(malformed(&reader, "CDATA outside the root element"));
            }
            Event::GeneralRef(e) => {
                if depth == 0 {
                    return Err(malformed(&reader, "entity reference outside the root element"));
                }
                check_reference(&e, &reader)?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if depth != 0 {
        debug!(%depth, "parse_repository: document ended with open elements");
        return Err(malformed(&reader, "unexpected end of document, unclosed element"));
    }
    if roots == 0 {
        debug!("parse_repository: no root element");
        return Err(ParseError::Empty);
    }

    let repository = builder.finish()?;
    info!(
        "Parsed repository '{}': {} sources, {} targets, {} transformations, {} mappings",
        repository.repository_name,
        repository.sources.len(),
        repository.targets.len(),
        repository.transformations.len(),
        repository.mappings.len()
    );
    Ok(repository)
}

fn malformed(reader: &Reader<&[u8]>, message: impl Display) -> ParseError {
    ParseError::Malformed {
        position: reader.buffer_position() as u64,
        message: message.to_string(),
    }
}

fn check_root(e: &BytesStart<'_>, roots: &mut usize, reader: &Reader<&[u8]>) -> Result<(), ParseError> {
    *roots += 1;
    if *roots > 1 {
        return Err(malformed(reader, "multiple root elements"));
    }
    let name = e.name();
    if name.as_ref() != ROOT {
        let found = String::from_utf8_lossy(name.as_ref()).into_owned();
        debug!(%found, "check_root: unexpected root element");
        return Err(ParseError::UnexpectedRoot(found));
    }
    Ok(())
}

/// Only character references and the five predefined entities are defined
fn check_reference(e: &BytesRef<'_>, reader: &Reader<&[u8]>) -> Result<(), ParseError> {
    if e.is_char_ref() {
        return match e.resolve_char_ref() {
            Ok(Some(_)) => Ok(()),
            Ok(None) => Err(malformed(reader, "invalid character reference")),
            Err(err) => Err(malformed(reader, err)),
        };
    }
    let name = e.decode().map_err(|err| malformed(reader, err))?;
    match resolve_predefined_entity(&name) {
        Some(_) => Ok(()),
        None => Err(malformed(reader, format!("undefined entity &{};", name))),
    }
}

fn read_attributes(e: &BytesStart<'_>, reader: &Reader<&[u8]>) -> Result<IndexMap<String, String>, ParseError> {
    let mut attributes = IndexMap::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| malformed(reader, err))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .decode_and_unescape_value(reader.decoder())
            .map_err(|err| malformed(reader, err))?;
        attributes.insert(key, value.into_owned());
    }
    Ok(attributes)
}

fn required(attributes: &IndexMap<String, String>, element: &[u8], key: &'static str) -> Result<String, ParseError> {
    match attributes.get(key) {
        Some(value) if !value.trim().is_empty() => Ok(value.clone()),
        _ => Err(ParseError::MissingAttribute {
            element: String::from_utf8_lossy(element).into_owned(),
            attribute: key,
        }),
    }
}

/// Accumulates the repository while the reader walks the document
#[derive(Default)]
struct RepositoryBuilder {
    repository_name: Option<String>,
    version: Option<String>,
    repository_version: Option<String>,
    creation_date: Option<String>,
    folders: Vec<String>,
    sources: Vec<ParsedComponent>,
    targets: Vec<ParsedComponent>,
    transformations: Vec<ParsedComponent>,
    mappings: Vec<Mapping>,
    component: Option<ParsedComponent>,
    mapping: Option<Mapping>,
    seen: HashSet<(ComponentKind, String)>,
}

impl RepositoryBuilder {
    fn open(&mut self, e: &BytesStart<'_>, reader: &Reader<&[u8]>) -> Result<(), ParseError> {
        let name = e.name();
        let tag = name.as_ref();
        if !TRACKED.contains(&tag) {
            return Ok(());
        }
        let mut attributes = read_attributes(e, reader)?;

        match tag {
            b"POWERMART" => {
                self.repository_version = attributes.shift_remove("REPOSITORY_VERSION");
                self.creation_date = attributes.shift_remove("CREATION_DATE");
            }
            b"REPOSITORY" => {
                if self.repository_name.is_none() {
                    self.repository_name = attributes.shift_remove("NAME");
                    self.version = attributes.shift_remove("VERSION");
                }
            }
            b"FOLDER" => {
                if let Some(folder) = attributes.shift_remove("NAME") {
                    self.folders.push(folder);
                }
            }
            b"SOURCE" | b"TARGET" | b"TRANSFORMATION" => {
                let Some(kind) = ComponentKind::from_element(tag) else {
                    return Ok(());
                };
                let component_name = required(&attributes, tag, "NAME")?;
                debug!(%kind, name = %component_name, "RepositoryBuilder::open: component");
                self.component = Some(ParsedComponent {
                    name: component_name,
                    kind,
                    attributes,
                    fields: Vec::new(),
                });
            }
            b"SOURCEFIELD" | b"TARGETFIELD" | b"TRANSFORMFIELD" => {
                let field_name = required(&attributes, tag, "NAME")?;
                if let Some(component) = self.component.as_mut()
                    && component.kind.field_element().as_bytes() == tag
                {
                    component.fields.push(Field {
                        name: field_name,
                        datatype: attributes.shift_remove("DATATYPE"),
                        port_type: attributes.shift_remove("PORTTYPE"),
                    });
                }
            }
            b"MAPPING" => {
                let mapping_name = required(&attributes, tag, "NAME")?;
                debug!(name = %mapping_name, "RepositoryBuilder::open: mapping");
                self.mapping = Some(Mapping {
                    name: mapping_name,
                    description: attributes.shift_remove("DESCRIPTION").unwrap_or_default(),
                    is_valid: attributes
                        .get("ISVALID")
                        .is_none_or(|v| v.eq_ignore_ascii_case("YES")),
                    shortcuts: Vec::new(),
                    connectors: Vec::new(),
                });
            }
            b"SHORTCUT" => {
                if let Some(mapping) = self.mapping.as_mut() {
                    let reference = attributes
                        .shift_remove("REFERENCEDOBJECTNAME")
                        .filter(|r| !r.is_empty())
                        .map(Ok)
                        .unwrap_or_else(|| required(&attributes, tag, "NAME"))?;
                    mapping.shortcuts.push(reference);
                }
            }
            b"CONNECTOR" => {
                if self.mapping.is_some() {
                    let connector = Connector {
                        from_instance: required(&attributes, tag, "FROMINSTANCE")?,
                        from_field: attributes.shift_remove("FROMFIELD").unwrap_or_default(),
                        to_instance: required(&attributes, tag, "TOINSTANCE")?,
                        to_field: attributes.shift_remove("TOFIELD").unwrap_or_default(),
                    };
                    if let Some(mapping) = self.mapping.as_mut() {
                        mapping.connectors.push(connector);
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn close(&mut self, tag: &[u8]) -> Result<(), ParseError> {
        if ComponentKind::from_element(tag).is_some() {
            if let Some(component) = self.component.take() {
                self.push_component(component)?;
            }
        } else if tag == b"MAPPING"
            && let Some(mapping) = self.mapping.take()
        {
            self.mappings.push(mapping);
        }
        Ok(())
    }

    fn push_component(&mut self, component: ParsedComponent) -> Result<(), ParseError> {
        if !self.seen.insert((component.kind, component.name.clone())) {
            debug!(kind = %component.kind, name = %component.name, "push_component: duplicate name");
            return Err(ParseError::DuplicateName {
                kind: component.kind,
                name: component.name,
            });
        }
        match component.kind {
            ComponentKind::Source => self.sources.push(component),
            ComponentKind::Target => self.targets.push(component),
            ComponentKind::Transformation => self.transformations.push(component),
        }
        Ok(())
    }

    fn finish(self) -> Result<ParsedRepository, ParseError> {
        if self.sources.is_empty() {
            return Err(ParseError::MissingElement("SOURCE"));
        }
        if self.targets.is_empty() {
            return Err(ParseError::MissingElement("TARGET"));
        }
        Ok(ParsedRepository {
            repository_name: self.repository_name.unwrap_or_else(|| UNKNOWN.to_string()),
            version: self.version.unwrap_or_else(|| UNKNOWN.to_string()),
            repository_version: self.repository_version,
            creation_date: self.creation_date,
            folders: self.folders,
            sources: self.sources,
            targets: self.targets,
            transformations: self.transformations,
            mappings: self.mappings,
        })
    }
}
