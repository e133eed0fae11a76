//! Per-kind field mapping tables.
//!
//! A [`MappingTable`] says which fixed file name holds which JSON property,
//! both at the root of a resource directory (default locale) and inside a
//! locale subdirectory. The download, upload and watch paths all drive off
//! the same table, so adding a kind is a data change rather than new code.

mod tree;

use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};

use crate::models::{Resource, ResourceId, ResourceKind};

pub use tree::{from_files, to_files, write_tree, TreeFile};

/// Subset of a theme that can be enabled independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Templates,
    Messages,
    Stylesheet,
}

impl Section {
    pub const ALL: [Self; 3] = [Self::Templates, Self::Messages, Self::Stylesheet];
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Templates => "templates",
            Self::Messages => "messages",
            Self::Stylesheet => "stylesheet",
        })
    }
}

impl FromStr for Section {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "templates" => Ok(Self::Templates),
            "messages" => Ok(Self::Messages),
            "stylesheet" => Ok(Self::Stylesheet),
            other => Err(format!("unknown section '{other}'")),
        }
    }
}

/// One fixed-name leaf file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileField {
    pub file_name: &'static str,
    /// Property written when the file sits at the resource root
    pub field: &'static str,
    /// Map property written when the file sits in a locale directory
    pub localized_field: Option<&'static str>,
    pub section: Option<Section>,
}

/// Reserved subdirectory whose `<name>.<extension>` files fill a keyed map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamedDir {
    pub dir_name: &'static str,
    pub extension: &'static str,
    pub field: &'static str,
    pub section: Option<Section>,
}

/// File holding the structured metadata blob as pretty-printed JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetadataFile {
    pub file_name: &'static str,
    pub field: &'static str,
}

/// Where a file sits inside a resource directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// Directly under `<root>/<id>/`
    Default,
    /// Under `<root>/<id>/<locale>/`
    Locale(String),
    /// Under a reserved directory such as `<root>/<id>/templates/`
    Named(String),
}

const fn file(
    file_name: &'static str,
    field: &'static str,
    localized_field: Option<&'static str>,
    section: Option<Section>,
) -> FileField {
    FileField {
        file_name,
        field,
        localized_field,
        section,
    }
}

/// Static description of how one resource kind maps onto a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingTable {
    kind: ResourceKind,
    files: Vec<FileField>,
    named_dirs: Vec<NamedDir>,
    /// Named dir names stay reserved even when their section is disabled
    reserved_dirs: Vec<&'static str>,
    metadata: Option<MetadataFile>,
    /// Some mapped parts were dropped by [`MappingTable::restrict`]
    restricted: bool,
}

impl MappingTable {
    /// Email templates: subject, bodies and sender per locale.
    #[must_use]
    pub fn email() -> Self {
        Self {
            kind: ResourceKind::Email,
            files: vec![
                file("name.txt", "name", None, None),
                file("from_email.txt", "fromEmail", None, None),
                file(
                    "body.html",
                    "defaultHtmlTemplate",
                    Some("localizedHtmlTemplates"),
                    None,
                ),
                file(
                    "body.txt",
                    "defaultTextTemplate",
                    Some("localizedTextTemplates"),
                    None,
                ),
                file(
                    "subject.txt",
                    "defaultSubject",
                    Some("localizedSubjects"),
                    None,
                ),
                file(
                    "from_name.txt",
                    "defaultFromName",
                    Some("localizedFromNames"),
                    None,
                ),
            ],
            named_dirs: Vec::new(),
            reserved_dirs: Vec::new(),
            metadata: None,
            restricted: false,
        }
    }

    /// Message (SMS) templates. `type.txt` is passed through unvalidated.
    #[must_use]
    pub fn message() -> Self {
        Self {
            kind: ResourceKind::Message,
            files: vec![
                file("name.txt", "name", None, None),
                file("type.txt", "type", None, None),
                file(
                    "template.txt",
                    "defaultTemplate",
                    Some("localizedTemplates"),
                    None,
                ),
            ],
            named_dirs: Vec::new(),
            reserved_dirs: Vec::new(),
            metadata: Some(MetadataFile {
                file_name: "data.json",
                field: "data",
            }),
            restricted: false,
        }
    }

    /// Themes: stylesheet, message bundles per locale and FreeMarker templates.
    #[must_use]
    pub fn theme() -> Self {
        Self {
            kind: ResourceKind::Theme,
            files: vec![
                file("name.txt", "name", None, None),
                file(
                    "stylesheet.css",
                    "stylesheet",
                    None,
                    Some(Section::Stylesheet),
                ),
                file(
                    "messages.txt",
                    "defaultMessages",
                    Some("localizedMessages"),
                    Some(Section::Messages),
                ),
            ],
            named_dirs: vec![NamedDir {
                dir_name: "templates",
                extension: "ftl",
                field: "templates",
                section: Some(Section::Templates),
            }],
            reserved_dirs: vec!["templates"],
            metadata: None,
            restricted: false,
        }
    }

    /// Table for a kind synced as a directory tree.
    #[must_use]
    pub fn for_kind(kind: ResourceKind) -> Option<Self> {
        match kind {
            ResourceKind::Email => Some(Self::email()),
            ResourceKind::Message => Some(Self::message()),
            ResourceKind::Theme => Some(Self::theme()),
            ResourceKind::Lambda | ResourceKind::Application => None,
        }
    }

    /// Keep only files that belong to no section or to an enabled one.
    #[must_use]
    pub fn restrict(mut self, sections: &[Section]) -> Self {
        let enabled = |section: Option<Section>| section.map_or(true, |s| sections.contains(&s));
        let before = self.files.len() + self.named_dirs.len();
        self.files.retain(|entry| enabled(entry.section));
        self.named_dirs.retain(|dir| enabled(dir.section));
        self.restricted |= self.files.len() + self.named_dirs.len() != before;
        self
    }

    /// True when the table no longer covers every part of the resource.
    ///
    /// A body built from a restricted table is partial and must never be
    /// used to replace the remote resource.
    pub const fn is_restricted(&self) -> bool {
        self.restricted
    }

    pub const fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn files(&self) -> &[FileField] {
        &self.files
    }

    pub fn named_dirs(&self) -> &[NamedDir] {
        &self.named_dirs
    }

    pub const fn metadata(&self) -> Option<&MetadataFile> {
        self.metadata.as_ref()
    }

    /// Directory names that are never treated as locales.
    pub fn is_reserved_dir(&self, dir_name: &str) -> bool {
        self.reserved_dirs.contains(&dir_name)
    }

    pub fn file(&self, file_name: &str) -> Option<&FileField> {
        self.files.iter().find(|entry| entry.file_name == file_name)
    }

    pub fn named_dir(&self, dir_name: &str) -> Option<&NamedDir> {
        self.named_dirs.iter().find(|dir| dir.dir_name == dir_name)
    }

    pub fn localized_files(&self) -> impl Iterator<Item = (&FileField, &'static str)> {
        self.files
            .iter()
            .filter_map(|entry| entry.localized_field.map(|field| (entry, field)))
    }

    /// True when `location`/`file_name` corresponds to a mapped field.
    pub fn recognizes(&self, location: &Location, file_name: &str) -> bool {
        match location {
            Location::Default => {
                self.file(file_name).is_some()
                    || self
                        .metadata
                        .is_some_and(|metadata| metadata.file_name == file_name)
            }
            Location::Locale(_) => self
                .file(file_name)
                .is_some_and(|entry| entry.localized_field.is_some()),
            Location::Named(dir_name) => self
                .named_dir(dir_name)
                .is_some_and(|dir| entry_name(dir, file_name).is_some()),
        }
    }

    /// Build a single-field partial resource for one changed file.
    ///
    /// Returns `Ok(None)` for unknown files and for empty content, which has
    /// nothing to send.
    pub fn partial_for_file(
        &self,
        location: &Location,
        file_name: &str,
        content: String,
    ) -> crate::Result<Option<Resource>> {
        if content.is_empty() || !self.recognizes(location, file_name) {
            return Ok(None);
        }

        let mut resource = Resource::default();
        match location {
            Location::Default => {
                if let Some(entry) = self.file(file_name) {
                    resource.set_field(entry.field, content);
                } else {
                    resource.data = Some(parse_metadata(&content)?);
                }
            }
            Location::Locale(locale) => {
                if let Some(field) = self.file(file_name).and_then(|entry| entry.localized_field) {
                    resource.set_localized(field, locale, content);
                }
            }
            Location::Named(dir_name) => {
                if let Some(dir) = self.named_dir(dir_name) {
                    if let Some(name) = entry_name(dir, file_name) {
                        resource.set_entry(dir.field, name, content);
                    }
                }
            }
        }

        Ok(Some(resource))
    }

    /// Glob patterns, relative to the input root, one per mapped extension.
    ///
    /// Matching is by extension so that unmapped names (`notes.txt`) still
    /// reach the decomposer and get reported as unknown files.
    pub fn watch_patterns(&self) -> Vec<String> {
        let mut patterns: Vec<String> = Vec::new();
        let mut push = |pattern: String| {
            if !patterns.contains(&pattern) {
                patterns.push(pattern);
            }
        };
        for entry in &self.files {
            push(extension_pattern(entry.file_name));
        }
        for dir in &self.named_dirs {
            push(format!("**/{}/*.{}", dir.dir_name, dir.extension));
        }
        if let Some(metadata) = &self.metadata {
            push(extension_pattern(metadata.file_name));
        }
        patterns
    }

    /// Extract the mapped parts of a JSON resource returned by the server.
    pub fn resource_from_json(&self, value: &Value) -> crate::Result<Resource> {
        let object = value.as_object().ok_or_else(|| {
            crate::Error::InvalidPayload(format!("{} is not a JSON object", self.kind.label()))
        })?;

        let id = match object.get("id").and_then(Value::as_str) {
            Some(raw) => Some(raw.parse::<ResourceId>().map_err(|error| {
                crate::Error::InvalidPayload(format!("invalid {} id '{raw}': {error}", self.kind))
            })?),
            None => None,
        };

        let mut resource = Resource::new(id);
        for entry in &self.files {
            if let Some(text) = object.get(entry.field).and_then(Value::as_str) {
                resource.set_field(entry.field, text);
            }
            if let Some(field) = entry.localized_field {
                for (locale, text) in string_map(object.get(field)) {
                    resource.set_localized(field, &locale, text);
                }
            }
        }
        for dir in &self.named_dirs {
            for (name, text) in string_map(object.get(dir.field)) {
                resource.set_entry(dir.field, &name, text);
            }
        }
        if let Some(metadata) = &self.metadata {
            if let Some(Value::Object(data)) = object.get(metadata.field) {
                if !data.is_empty() {
                    resource.data = Some(data.clone());
                }
            }
        }

        Ok(resource)
    }

    /// Render only the present parts of a resource as a JSON object.
    pub fn resource_to_json(&self, resource: &Resource) -> Value {
        let mut object = Map::new();
        for (field, value) in &resource.fields {
            object.insert(field.clone(), Value::String(value.clone()));
        }
        for (field, values) in resource.localized.iter().chain(&resource.entries) {
            if values.is_empty() {
                continue;
            }
            let map = values
                .iter()
                .map(|(key, value)| (key.clone(), Value::String(value.clone())))
                .collect();
            object.insert(field.clone(), Value::Object(map));
        }
        if let (Some(metadata), Some(data)) = (&self.metadata, &resource.data) {
            object.insert(metadata.field.to_string(), Value::Object(data.clone()));
        }
        Value::Object(object)
    }
}

fn extension_pattern(file_name: &str) -> String {
    match file_name.rsplit_once('.') {
        Some((_, extension)) => format!("**/*.{extension}"),
        None => format!("**/{file_name}"),
    }
}

/// Name of a named-dir entry, e.g. `oauth2Authorize` for `oauth2Authorize.ftl`.
pub(crate) fn entry_name<'a>(dir: &NamedDir, file_name: &'a str) -> Option<&'a str> {
    file_name
        .strip_suffix(dir.extension)
        .and_then(|stem| stem.strip_suffix('.'))
        .filter(|stem| !stem.is_empty())
}

pub(crate) fn parse_metadata(content: &str) -> crate::Result<Map<String, Value>> {
    match serde_json::from_str::<Value>(content)? {
        Value::Object(map) => Ok(map),
        _ => Err(crate::Error::InvalidInput(
            "metadata must be a JSON object".to_string(),
        )),
    }
}

fn string_map(value: Option<&Value>) -> Vec<(String, String)> {
    let Some(Value::Object(map)) = value else {
        return Vec::new();
    };
    map.iter()
        .filter_map(|(key, value)| value.as_str().map(|text| (key.clone(), text.to_string())))
        .collect()
}
