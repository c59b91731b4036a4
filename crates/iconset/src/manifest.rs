//! The `icondef.xml` manifest.
//!
//! [`Manifest::parse`] turns the document into plain data: bundle metadata,
//! one [`IconEntry`] per `<icon>`, and free-form `<x xmlns="...">` entries.
//! Nothing is decoded here; the loader resolves entries against a byte
//! source.

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::error::{IconsetError, IconsetErrorKind, IconsetResult};
use crate::icon::IconText;
use crate::xml::{XmlElement, parse_document};

/// File name of the manifest at the bundle root.
pub const MANIFEST_FILE: &str = "icondef.xml";

/// Image encodings, most preferred first.
pub const IMAGE_MIME_PRIORITY: &[&str] = &[
    "image/png",
    "image/gif",
    "image/x-xpm",
    "image/bmp",
    "image/jpeg",
    "image/svg+xml",
];

/// Sound encodings, most preferred first.
pub const SOUND_MIME_PRIORITY: &[&str] = &["audio/x-wav", "audio/x-ogg", "audio/x-mp3", "audio/x-midi"];

/// Encodings that may carry an animation.
pub const ANIMATION_MIME: &[&str] = &["image/gif"];

/// One `<author>` entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Author {
    /// The author's name.
    pub name: String,
    /// `email` attribute.
    pub email: Option<String>,
    /// `jid` attribute.
    pub jid: Option<String>,
    /// `www` attribute.
    pub www: Option<String>,
}

impl Author {
    /// Creates an author with only a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Rich-text line for an "about" box: the name followed by one indented
    /// link per contact attribute.
    pub fn display_string(&self) -> String {
        const BREAK: &str = "<br>&nbsp;&nbsp;";
        let mut out = self.name.clone();
        if let Some(email) = &self.email {
            out.push_str(&format!("{BREAK}Email: <a href='mailto:{email}'>{email}</a>"));
        }
        if let Some(jid) = &self.jid {
            out.push_str(&format!("{BREAK}JID: <a href='jabber:{jid}'>{jid}</a>"));
        }
        if let Some(www) = &self.www {
            out.push_str(&format!("{BREAK}WWW: <a href='{www}'>{www}</a>"));
        }
        out
    }
}

/// Bundle metadata from `<meta>`. Absent elements stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestMeta {
    pub name: Option<String>,
    pub version: Option<String>,
    pub description: Option<String>,
    pub authors: Vec<Author>,
    pub creation: Option<String>,
    pub home: Option<String>,
}

/// The `<x xmlns="type">` hint of an icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeHint {
    /// Decode as an animation.
    Animation,
    /// Decode as a still image.
    Image,
}

/// One `<icon>` element, unresolved.
#[derive(Debug, Clone, Default)]
pub struct IconEntry {
    /// Name from `<x xmlns="name">`.
    pub name: Option<String>,
    pub text: IconText,
    pub type_hint: Option<TypeHint>,
    graphics: HashMap<String, String>,
    sounds: HashMap<String, String>,
}

impl IconEntry {
    /// Image paths in [`IMAGE_MIME_PRIORITY`] order, with their MIME type.
    pub fn image_candidates(&self) -> impl Iterator<Item = (&'static str, &str)> {
        candidates(IMAGE_MIME_PRIORITY, &self.graphics)
    }

    /// Sound paths in [`SOUND_MIME_PRIORITY`] order, with their MIME type.
    pub fn sound_candidates(&self) -> impl Iterator<Item = (&'static str, &str)> {
        candidates(SOUND_MIME_PRIORITY, &self.sounds)
    }

    /// Whether a candidate of `mime` should be decoded as an animation.
    pub fn wants_animation(&self, mime: &str) -> bool {
        match self.type_hint {
            Some(TypeHint::Animation) => true,
            Some(TypeHint::Image) => false,
            None => ANIMATION_MIME.contains(&mime),
        }
    }

    fn from_element(element: &XmlElement) -> Self {
        let mut entry = IconEntry::default();
        let mut objects: HashMap<String, String> = HashMap::new();

        for child in element.child_elements() {
            let mime = || child.attribute("mime").unwrap_or_default().to_string();
            match child.name() {
                "text" => {
                    let lang = child.attribute("xml:lang").unwrap_or_default();
                    entry.text.insert(lang, child.text());
                }
                "object" => {
                    objects.insert(mime(), child.text());
                }
                // Older manifests
                "graphic" => {
                    entry.graphics.insert(mime(), child.text());
                }
                "sound" => {
                    entry.sounds.insert(mime(), child.text());
                }
                "x" => match (child.attribute("xmlns"), child.text().as_str()) {
                    (Some("name"), name) => entry.name = Some(name.to_string()),
                    (Some("type"), "animation") => entry.type_hint = Some(TypeHint::Animation),
                    (Some("type"), "image") => entry.type_hint = Some(TypeHint::Image),
                    _ => {}
                },
                _ => {}
            }
        }

        // Known object types override graphic/sound entries of the same type
        for (mime, path) in objects {
            if IMAGE_MIME_PRIORITY.contains(&mime.as_str()) {
                entry.graphics.insert(mime, path);
            } else if SOUND_MIME_PRIORITY.contains(&mime.as_str()) {
                entry.sounds.insert(mime, path);
            }
        }

        entry
    }
}

fn candidates<'a>(
    priority: &'static [&'static str],
    table: &'a HashMap<String, String>,
) -> impl Iterator<Item = (&'static str, &'a str)> {
    priority
        .iter()
        .filter_map(|mime| table.get(*mime).map(|path| (*mime, path.as_str())))
}

/// A parsed manifest.
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    pub meta: ManifestMeta,
    pub icons: Vec<IconEntry>,
    /// `<x xmlns="key">value</x>` children of the root, in document order.
    pub info: IndexMap<String, String>,
}

impl Manifest {
    /// Parse manifest bytes.
    ///
    /// Fails with [`IconsetErrorKind::ManifestMalformed`] if the document is
    /// not well-formed or its root element is not `icondef`.
    pub fn parse(data: &[u8]) -> IconsetResult<Self> {
        let root = parse_document(data).map_err(|e| e.with_kind(IconsetErrorKind::ManifestMalformed))?;
        if root.name() != "icondef" {
            return Err(IconsetError::with_message(
                IconsetErrorKind::ManifestMalformed,
                MANIFEST_FILE,
                format!("root element is <{}>, expected <icondef>", root.name()),
            ));
        }

        let mut manifest = Manifest::default();
        for child in root.child_elements() {
            match child.name() {
                "meta" => manifest.read_meta(child),
                "icon" => manifest.icons.push(IconEntry::from_element(child)),
                "x" => {
                    let key = child.attribute("xmlns").unwrap_or_default();
                    manifest.info.insert(key.to_string(), child.text());
                }
                _ => {}
            }
        }
        Ok(manifest)
    }

    fn read_meta(&mut self, element: &XmlElement) {
        let meta = &mut self.meta;
        for child in element.child_elements() {
            match child.name() {
                "name" => meta.name = Some(child.text()),
                "version" => meta.version = Some(child.text()),
                "description" => meta.description = Some(child.text()),
                "creation" => meta.creation = Some(child.text()),
                "home" => meta.home = Some(child.text()),
                "author" => {
                    let attr = |key| {
                        child
                            .attribute(key)
                            .filter(|v| !v.is_empty())
                            .map(String::from)
                    };
                    meta.authors.push(Author {
                        name: child.text(),
                        email: attr("email"),
                        jid: attr("jid"),
                        www: attr("www"),
                    });
                }
                _ => {}
            }
        }
    }
}
