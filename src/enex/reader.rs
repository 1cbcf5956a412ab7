use crate::error::AppError;
use crate::model::{Note, Resource};
use base64::Engine;
use chrono::{DateTime, NaiveDateTime, Utc};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

const ENEX_TIME_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Opens an export file and returns its notes in file order.
pub fn iter_notes(path: &Path) -> Result<NoteReader<BufReader<File>>, AppError> {
    let file = File::open(path)?;
    Ok(NoteReader::new(BufReader::new(file), path.to_path_buf()))
}

/// Counts the notes in an export file without decoding them.
pub fn count_notes(path: &Path) -> Result<usize, AppError> {
    let file = File::open(path)?;
    let mut reader = Reader::from_reader(BufReader::new(file));
    let mut buf = Vec::new();
    let mut count = 0;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"note" => count += 1,
            Ok(Event::Eof) => break,
            Err(e) => return Err(malformed(path, e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(count)
}

fn malformed(path: &Path, error: impl std::fmt::Display) -> AppError {
    AppError::MalformedExport {
        path: path.to_path_buf(),
        message: error.to_string(),
    }
}

/// Streaming iterator over the notes of one export.
///
/// A malformed document yields one error and then ends.
pub struct NoteReader<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    path: PathBuf,
    finished: bool,
}

impl<R: BufRead> NoteReader<R> {
    pub fn new(source: R, path: PathBuf) -> Self {
        Self {
            reader: Reader::from_reader(source),
            buf: Vec::new(),
            path,
            finished: false,
        }
    }

    fn read_next(&mut self) -> Result<Option<Note>, AppError> {
        // Element names below the current <note>; empty when outside one.
        let mut stack: Vec<String> = Vec::new();
        let mut note: Option<NoteFields> = None;

        loop {
            self.buf.clear();
            let event = self
                .reader
                .read_event_into(&mut self.buf)
                .map_err(|e| malformed(&self.path, e))?;

            match event {
                Event::Start(ref e) => {
                    let name = element_name(e);
                    if name == "note" && note.is_none() {
                        note = Some(NoteFields::default());
                        continue;
                    }
                    if let Some(fields) = note.as_mut() {
                        if name == "resource" {
                            fields.resources.push(ResourceFields::default());
                        }
                        stack.push(name);
                    }
                }
                Event::End(ref e) => {
                    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                    if note.is_some() && stack.is_empty() && name == "note" {
                        if let Some(fields) = note.take() {
                            return Ok(Some(fields.into_note()));
                        }
                    }
                    stack.pop();
                }
                Event::Text(ref e) => {
                    if let Some(fields) = note.as_mut() {
                        let text = e.unescape().map_err(|err| malformed(&self.path, err))?;
                        fields.push_text(&stack, &text);
                    }
                }
                Event::CData(ref e) => {
                    if let Some(fields) = note.as_mut() {
                        let text = String::from_utf8_lossy(e.as_ref());
                        fields.push_text(&stack, &text);
                    }
                }
                Event::Eof => {
                    if note.is_some() {
                        return Err(malformed(&self.path, "unexpected end of file inside <note>"));
                    }
                    return Ok(None);
                }
                _ => {}
            }
        }
    }
}

impl<R: BufRead> Iterator for NoteReader<R> {
    type Item = Result<Note, AppError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.read_next() {
            Ok(Some(note)) => Some(Ok(note)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

fn element_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().as_ref()).into_owned()
}

#[derive(Default)]
struct ResourceFields {
    data: String,
    mime: String,
    file_name: String,
}

impl ResourceFields {
    fn into_resource(self) -> Option<Resource> {
        let cleaned: String = self.data.split_whitespace().collect();
        match base64::engine::general_purpose::STANDARD.decode(cleaned.as_bytes()) {
            Ok(data) => Some(Resource::new(
                data,
                self.mime.trim(),
                Some(self.file_name.trim().to_string()),
            )),
            Err(e) => {
                log::warn!("Skipping attachment with undecodable data: {}", e);
                None
            }
        }
    }
}

#[derive(Default)]
struct NoteFields {
    title: String,
    created: String,
    updated: String,
    content: String,
    tags: Vec<String>,
    author: String,
    source: String,
    source_url: String,
    resources: Vec<ResourceFields>,
}

impl NoteFields {
    fn push_text(&mut self, stack: &[String], text: &str) {
        let path: Vec<&str> = stack.iter().map(String::as_str).collect();
        match path.as_slice() {
            ["title"] => self.title.push_str(text),
            ["created"] => self.created.push_str(text),
            ["updated"] => self.updated.push_str(text),
            ["content"] => self.content.push_str(text),
            ["tag"] => self.tags.push(text.trim().to_string()),
            ["note-attributes", "author"] => self.author.push_str(text),
            ["note-attributes", "source"] => self.source.push_str(text),
            ["note-attributes", "source-url"] => self.source_url.push_str(text),
            ["resource", rest @ ..] => {
                let Some(resource) = self.resources.last_mut() else {
                    return;
                };
                match rest {
                    ["data"] => resource.data.push_str(text),
                    ["mime"] => resource.mime.push_str(text),
                    ["resource-attributes", "file-name"] => resource.file_name.push_str(text),
                    _ => {}
                }
            }
            _ => {}
        }
    }

    fn into_note(self) -> Note {
        let title = match self.title.trim() {
            "" => "Untitled".to_string(),
            title => title.to_string(),
        };
        let created = parse_timestamp(&self.created).unwrap_or_default();
        let updated = parse_timestamp(&self.updated).unwrap_or(created);
        let is_webclip = self.source.trim().starts_with("web.clip")
            || self.content.contains("--en-clipped-content");

        let resources = self
            .resources
            .into_iter()
            .filter_map(ResourceFields::into_resource)
            .map(Arc::new)
            .collect();

        Note::new(
            title,
            created,
            updated,
            self.content,
            self.tags.into_iter().filter(|t| !t.is_empty()).collect(),
            non_empty(self.author),
            non_empty(self.source_url),
            is_webclip,
            resources,
        )
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value.trim(), ENEX_TIME_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}
