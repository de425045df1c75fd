//! SOAP envelope construction.
//!
//! Uses quick-xml to check that the payload is a well-formed document
//! before it is accepted, so a built [`Envelope`] can always be sent.
//! quick-xml does not expand entities, and DOCTYPE declarations are
//! rejected outright.

use crate::config::{EnvelopeConfig, SoapVersion};
use crate::error::BuildError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// SOAP namespace URIs.
pub const SOAP_11_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";
pub const SOAP_12_NS: &str = "http://www.w3.org/2003/05/soap-envelope";

/// A SOAP message ready to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    version: SoapVersion,
    wrapped: bool,
    xml: String,
}

impl Envelope {
    /// Build an envelope from raw payload text.
    ///
    /// A payload whose root element is `Envelope` is sent as is. Any other
    /// well-formed payload is placed inside the Body of a new envelope of
    /// the configured default version, unless wrapping is disabled.
    pub fn build(raw: &str, config: &EnvelopeConfig) -> Result<Self, BuildError> {
        let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);
        let scan = scan_document(raw)?;

        if scan.root_local_name == "Envelope" {
            let version = match scan.root_namespace.as_deref() {
                Some(SOAP_11_NS) => SoapVersion::Soap11,
                Some(SOAP_12_NS) => SoapVersion::Soap12,
                _ => config.default_version,
            };
            return Ok(Self {
                version,
                wrapped: false,
                xml: raw.to_string(),
            });
        }

        if !config.wrap_fragments {
            return Err(BuildError::NotAnEnvelope(scan.root_qname));
        }

        let fragment = raw[scan.content_start..].trim();
        Ok(Self {
            version: config.default_version,
            wrapped: true,
            xml: wrap_fragment(fragment, config.default_version),
        })
    }

    /// SOAP version used for the transport headers.
    pub fn version(&self) -> SoapVersion {
        self.version
    }

    /// Whether the payload was wrapped into a new envelope.
    pub fn is_wrapped(&self) -> bool {
        self.wrapped
    }

    /// The serialized message.
    pub fn as_str(&self) -> &str {
        &self.xml
    }

    /// Consume the envelope, returning the serialized message.
    pub fn into_string(self) -> String {
        self.xml
    }
}

fn wrap_fragment(fragment: &str, version: SoapVersion) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><soapenv:Envelope xmlns:soapenv="{}"><soapenv:Header/><soapenv:Body>{}</soapenv:Body></soapenv:Envelope>"#,
        version.namespace(),
        fragment
    )
}

/// What the well-formedness scan learned about the document.
#[derive(Debug)]
struct DocumentScan {
    root_qname: String,
    root_local_name: String,
    root_namespace: Option<String>,
    /// Byte offset just past the XML declaration, if any
    content_start: usize,
}

/// Walk every event of the document and fail on the first defect.
fn scan_document(raw: &str) -> Result<DocumentScan, BuildError> {
    let mut reader = Reader::from_str(raw);
    reader.config_mut().check_end_names = true;

    let mut depth = 0u32;
    let mut root: Option<(String, String, Option<String>)> = None;
    let mut content_start = 0usize;
    let mut first = true;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| BuildError::XmlParse(e.to_string()))?;
        let at_start = std::mem::replace(&mut first, false);

        match event {
            Event::Decl(_) if at_start => {
                content_start = usize::try_from(reader.buffer_position()).unwrap_or(0);
            }

            Event::Decl(_) => {
                return Err(BuildError::XmlParse(
                    "XML declaration is only allowed at the start of the document".to_string(),
                ));
            }

            Event::DocType(_) => return Err(BuildError::Doctype),

            Event::Start(ref e) | Event::Empty(ref e) => {
                check_attributes(e)?;
                if depth == 0 {
                    if let Some((ref qname, _, _)) = root {
                        return Err(BuildError::TrailingContent(format!(
                            "second root element <{}> after <{}>",
                            qname_str(e),
                            qname
                        )));
                    }
                    root = Some((qname_str(e), local_name_str(e), root_namespace(e)));
                }
                if matches!(event, Event::Start(_)) {
                    depth += 1;
                }
            }

            Event::End(_) => {
                depth = depth.saturating_sub(1);
            }

            Event::Text(ref e) => {
                if depth == 0 {
                    if e.iter().any(|b| !b.is_ascii_whitespace()) {
                        let text = String::from_utf8_lossy(e).trim().to_string();
                        return Err(BuildError::TrailingContent(format!(
                            "text outside root element: {:?}",
                            text
                        )));
                    }
                } else {
                    e.unescape()
                        .map_err(|err| BuildError::XmlParse(err.to_string()))?;
                }
            }

            Event::CData(_) if depth == 0 => {
                return Err(BuildError::TrailingContent(
                    "CDATA section outside root element".to_string(),
                ));
            }

            Event::Eof => break,

            _ => {}
        }
    }

    if depth > 0 {
        return Err(BuildError::XmlParse(format!(
            "unexpected end of document: {} element(s) left open",
            depth
        )));
    }

    let (root_qname, root_local_name, root_namespace) = root.ok_or(BuildError::Empty)?;
    Ok(DocumentScan {
        root_qname,
        root_local_name,
        root_namespace,
        content_start,
    })
}

/// Parse every attribute so that malformed ones surface at build time.
fn check_attributes(e: &BytesStart) -> Result<(), BuildError> {
    for attr in e.attributes() {
        let attr = attr.map_err(|err| BuildError::XmlParse(err.to_string()))?;
        attr.unescape_value()
            .map_err(|err| BuildError::XmlParse(err.to_string()))?;
    }
    Ok(())
}

/// Extract local name from element.
fn local_name_str(e: &BytesStart) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

/// Extract the qualified (possibly prefixed) name from element.
fn qname_str(e: &BytesStart) -> String {
    String::from_utf8_lossy(e.name().as_ref()).into_owned()
}

/// Resolve the namespace of the root element from its own declarations.
///
/// The root has no ancestors, so its prefix can only be bound on itself.
fn root_namespace(e: &BytesStart) -> Option<String> {
    let name = e.name();
    let wanted = match name.prefix() {
        Some(prefix) => format!("xmlns:{}", String::from_utf8_lossy(prefix.as_ref())),
        None => "xmlns".to_string(),
    };

    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == wanted.as_bytes())
        .map(|attr| String::from_utf8_lossy(&attr.value).into_owned())
}
