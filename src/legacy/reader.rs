//! Locating and parsing the XML files the bot kept before the SQLite
//! database existed: `UserData.xml` (one `<user>` per member) and
//! `ServerData.xml` (godpacks, filed under whichever tag name the exporter
//! of the day used).

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use roxmltree::{Document, Node, ParsingOptions};
use thiserror::Error;
use tracing::debug;

use crate::config::LegacyConfig;

pub const USER_TAG: &str = "user";

/// Every tag name a godpack has been exported under, in search order.
pub const GODPACK_TAGS: [&str; 3] = ["godpack", "gp", "pack"];

#[derive(Debug, Error)]
pub enum LegacyError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{} is not well-formed XML: {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: roxmltree::Error,
    },
}

#[derive(Debug, Clone)]
pub struct LegacyDocument {
    path: PathBuf,
    text: String,
}

impl LegacyDocument {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn parse(&self) -> Result<Document<'_>, LegacyError> {
        let options = ParsingOptions {
            allow_dtd: true,
            ..ParsingOptions::default()
        };
        Document::parse_with_options(&self.text, options).map_err(|source| LegacyError::Malformed {
            path: self.path.clone(),
            source,
        })
    }
}

#[derive(Debug, Clone)]
pub struct LegacyDocumentReader {
    root: PathBuf,
    users_file: String,
    server_file: String,
}

impl LegacyDocumentReader {
    pub fn new(config: &LegacyConfig) -> Self {
        Self {
            root: PathBuf::from(&config.root),
            users_file: config.users_file.clone(),
            server_file: config.server_file.clone(),
        }
    }

    pub fn users_file(&self) -> &str {
        &self.users_file
    }

    pub fn server_file(&self) -> &str {
        &self.server_file
    }

    /// `<root>/<file>` wins over `<root>/data/<file>`.
    pub fn locate(&self, file_name: &str) -> Option<PathBuf> {
        [
            self.root.join(file_name),
            self.root.join("data").join(file_name),
        ]
        .into_iter()
        .find(|candidate| candidate.is_file())
    }

    pub fn read_users(&self) -> Result<Option<LegacyDocument>, LegacyError> {
        self.read(&self.users_file)
    }

    pub fn read_server(&self) -> Result<Option<LegacyDocument>, LegacyError> {
        self.read(&self.server_file)
    }

    /// `Ok(None)` means the file does not exist anywhere we look.
    fn read(&self, file_name: &str) -> Result<Option<LegacyDocument>, LegacyError> {
        let Some(path) = self.locate(file_name) else {
            return Ok(None);
        };

        match std::fs::read_to_string(&path) {
            Ok(text) => {
                debug!("read {} bytes from {}", text.len(), path.display());
                let text = match text.strip_prefix('\u{feff}') {
                    Some(stripped) => stripped.to_string(),
                    None => text,
                };
                Ok(Some(LegacyDocument { path, text }))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(LegacyError::Io { path, source }),
        }
    }
}

/// Direct `<user>` children of the document root.
pub fn user_elements<'a, 'input>(
    document: &'a Document<'input>,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    document
        .root_element()
        .children()
        .filter(|node| node.has_tag_name(USER_TAG))
}

/// All godpack elements below the root: every `<godpack>` in document order,
/// then every `<gp>`, then every `<pack>`.
pub fn godpack_elements<'a, 'input>(document: &'a Document<'input>) -> Vec<Node<'a, 'input>> {
    let root = document.root_element();
    GODPACK_TAGS
        .iter()
        .flat_map(move |tag| {
            root.descendants()
                .skip(1)
                .filter(move |node| node.has_tag_name(*tag))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::{LegacyDocumentReader, LegacyError, godpack_elements, user_elements};
    use crate::config::LegacyConfig;

    fn reader(dir: &TempDir) -> LegacyDocumentReader {
        LegacyDocumentReader::new(&LegacyConfig {
            root: dir.path().to_string_lossy().to_string(),
            ..LegacyConfig::default()
        })
    }

    #[test]
    fn absent_files_read_as_none() {
        let dir = TempDir::new().unwrap();
        let reader = reader(&dir);
        assert!(reader.read_users().unwrap().is_none());
        assert!(reader.read_server().unwrap().is_none());
    }

    #[test]
    fn working_directory_wins_over_data_dir() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("data")).unwrap();
        std::fs::write(dir.path().join("data").join("UserData.xml"), "<Users/>").unwrap();
        let reader = reader(&dir);
        assert_eq!(
            reader.locate("UserData.xml"),
            Some(dir.path().join("data").join("UserData.xml"))
        );

        std::fs::write(dir.path().join("UserData.xml"), "<Users/>").unwrap();
        assert_eq!(
            reader.locate("UserData.xml"),
            Some(dir.path().join("UserData.xml"))
        );
    }

    #[test]
    fn malformed_document_is_reported() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("ServerData.xml"), "<root><gp></root>").unwrap();
        let document = reader(&dir).read_server().unwrap().unwrap();
        assert!(matches!(document.parse(), Err(LegacyError::Malformed { .. })));
    }

    #[test]
    fn strips_byte_order_mark() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("UserData.xml"),
            "\u{feff}<?xml version='1.0' encoding='utf-8'?><Users><user id=\"1\"/></Users>",
        )
        .unwrap();
        let document = reader(&dir).read_users().unwrap().unwrap();
        let parsed = document.parse().unwrap();
        assert_eq!(user_elements(&parsed).count(), 1);
    }

    #[test]
    fn user_elements_are_direct_children_only() {
        let text = r#"<Users><user id="1"/><group><user id="2"/></group><user id="3"/></Users>"#;
        let document = roxmltree::Document::parse(text).unwrap();
        let ids: Vec<&str> = user_elements(&document)
            .filter_map(|node| node.attribute("id"))
            .collect();
        assert_eq!(ids, vec!["1", "3"]);
    }

    #[test]
    fn godpack_elements_union_tags_in_search_order() {
        let text = r#"
            <root>
                <packs><pack messageId="3"/></packs>
                <gps><gp messageId="2"/></gps>
                <godpacks><godpack messageId="1"/><godpack messageId="4"/></godpacks>
            </root>"#;
        let document = roxmltree::Document::parse(text).unwrap();
        let ids: Vec<&str> = godpack_elements(&document)
            .iter()
            .filter_map(|node| node.attribute("messageId"))
            .collect();
        assert_eq!(ids, vec!["1", "4", "2", "3"]);
    }

    #[test]
    fn root_element_is_never_a_candidate() {
        let document = roxmltree::Document::parse(r#"<gp messageId="9"><gp messageId="10"/></gp>"#).unwrap();
        let ids: Vec<&str> = godpack_elements(&document)
            .iter()
            .filter_map(|node| node.attribute("messageId"))
            .collect();
        assert_eq!(ids, vec!["10"]);
    }
}
