//! In-memory notes resource.
//!
//! | Path | Methods |
//! |------|---------|
//! | `/notes` | `POST` creates a note |
//! | `/notes/{id}` | `GET`, `PUT`, `DELETE` |
//! | `/notes/*`, `/notes/{lo}-{hi}`, `/notes/{id},{id}` | `GET` |
//! | `/notes/{id}/contents` | `GET`, `PUT` the body as plain text |
//! | `/notes/{selection}/export[/titles]` | CSV or title listing |

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Result;
use bytes::Bytes;
use hateos_codec::{CodecError, Marshall, MarshallContext, MediaType, TypeRegistry, Unmarshall};
use hateos_core::{
    HandlerError, HandlerResult, HateosContext, HateosHttpEntityHandler, HateosHttpHandler,
    HateosResourceHandler, HateosResourceMapping, HateosRouter, HttpEntity, RequestContext,
};
use hateos_model::{
    HateosResource, HttpMethod, LinkRelation, ResourceName, Selection, SelectionRange,
    SelectionSyntax,
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A note. `id` is assigned by the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
}

impl HateosResource for Note {
    type Id = u64;

    fn id(&self) -> Option<u64> {
        self.id
    }
}

impl Marshall for Note {
    fn marshall(&self, context: &MarshallContext) -> Result<hateos_codec::Node, CodecError> {
        context.marshall_resource(self)
    }
}

impl Unmarshall for Note {
    fn unmarshall(
        node: &hateos_codec::Node,
        context: &MarshallContext,
    ) -> Result<Self, CodecError> {
        context.unmarshall_value(node)
    }
}

#[derive(Debug, Default)]
struct Notes {
    next_id: u64,
    by_id: BTreeMap<u64, Note>,
}

/// Thread-safe note storage.
#[derive(Debug, Default)]
pub struct NoteStore {
    inner: RwLock<Notes>,
}

impl NoteStore {
    /// Store `note` under a fresh id.
    pub fn create(&self, mut note: Note) -> Note {
        let mut notes = self.inner.write();
        notes.next_id += 1;
        let id = notes.next_id;
        note.id = Some(id);
        notes.by_id.insert(id, note.clone());
        note
    }

    pub fn get(&self, id: u64) -> Option<Note> {
        self.inner.read().by_id.get(&id).cloned()
    }

    /// Insert or replace the note at `id`.
    pub fn put(&self, id: u64, mut note: Note) -> Note {
        let mut notes = self.inner.write();
        note.id = Some(id);
        notes.next_id = notes.next_id.max(id);
        notes.by_id.insert(id, note.clone());
        note
    }

    pub fn remove(&self, id: u64) -> Option<Note> {
        self.inner.write().by_id.remove(&id)
    }

    /// Replace the body of an existing note.
    pub fn set_body(&self, id: u64, body: String) -> Option<Note> {
        let mut notes = self.inner.write();
        let note = notes.by_id.get_mut(&id)?;
        note.body = body;
        Some(note.clone())
    }

    /// Notes matching `selection`, in id order for ranges and `*`, request
    /// order for lists. Missing ids are skipped.
    pub fn select(&self, selection: &Selection<u64>) -> Vec<Note> {
        let notes = self.inner.read();
        match selection {
            Selection::None | Selection::All => notes.by_id.values().cloned().collect(),
            Selection::One(id) => notes.by_id.get(id).cloned().into_iter().collect(),
            Selection::Range(range) => in_range(&notes.by_id, range),
            Selection::List(ids) => ids
                .iter()
                .filter_map(|id| notes.by_id.get(id).cloned())
                .collect(),
        }
    }
}

fn in_range(by_id: &BTreeMap<u64, Note>, range: &SelectionRange<u64>) -> Vec<Note> {
    let lower = range.lower().copied().unwrap_or(u64::MIN);
    let upper = range.upper().copied().unwrap_or(u64::MAX);
    let (lower, upper) = if lower <= upper {
        (lower, upper)
    } else {
        (upper, lower)
    };
    by_id.range(lower..=upper).map(|(_, note)| note.clone()).collect()
}

/// Typed handler for `self`.
#[derive(Debug)]
struct NotesHandler {
    store: Arc<NoteStore>,
}

impl HateosResourceHandler<u64, Note, Vec<Note>> for NotesHandler {
    fn handle_none(&self, resource: Option<Note>, _: &HateosContext) -> HandlerResult<Note> {
        let note = self.store.create(resource.unwrap_or_default());
        debug!(id = ?note.id, "created note");
        Ok(Some(note))
    }

    fn handle_one(
        &self,
        id: &u64,
        resource: Option<Note>,
        context: &HateosContext,
    ) -> HandlerResult<Note> {
        let method = context.request().method();
        if *method == HttpMethod::GET {
            Ok(self.store.get(*id))
        } else if *method == HttpMethod::PUT {
            Ok(Some(self.store.put(*id, resource.unwrap_or_default())))
        } else if *method == HttpMethod::DELETE {
            self.store.remove(*id);
            Ok(None)
        } else {
            Err(HandlerError::unsupported())
        }
    }

    fn handle_all(
        &self,
        _: Option<Vec<Note>>,
        context: &HateosContext,
    ) -> HandlerResult<Vec<Note>> {
        self.read_only(context, &Selection::All)
    }

    fn handle_range(
        &self,
        range: &SelectionRange<u64>,
        _: Option<Vec<Note>>,
        context: &HateosContext,
    ) -> HandlerResult<Vec<Note>> {
        self.read_only(context, &Selection::Range(range.clone()))
    }

    fn handle_many(
        &self,
        ids: &[u64],
        _: Option<Vec<Note>>,
        context: &HateosContext,
    ) -> HandlerResult<Vec<Note>> {
        self.read_only(context, &Selection::List(ids.to_vec()))
    }
}

impl NotesHandler {
    /// Collections can only be read.
    fn read_only(
        &self,
        context: &HateosContext,
        selection: &Selection<u64>,
    ) -> HandlerResult<Vec<Note>> {
        if *context.request().method() == HttpMethod::GET {
            Ok(Some(self.store.select(selection)))
        } else {
            Err(HandlerError::unsupported_with(format!(
                "{} is not supported for selection {}",
                context.request().method(),
                selection.kind()
            )))
        }
    }
}

/// Byte-level handler for `contents`: the note body as `text/plain`.
#[derive(Debug)]
struct NoteContents {
    store: Arc<NoteStore>,
}

impl HateosHttpEntityHandler<u64> for NoteContents {
    fn handle_one(
        &self,
        id: &u64,
        entity: HttpEntity,
        context: &HateosContext,
    ) -> Result<HttpEntity, HandlerError> {
        if *context.request().method() == HttpMethod::PUT {
            let body = String::from_utf8_lossy(&entity.body).into_owned();
            if self.store.set_body(*id, body).is_none() {
                return Err(HandlerError::unsupported_with(format!("No note {id}")));
            }
            return Ok(HttpEntity::default());
        }
        Ok(self
            .store
            .get(*id)
            .map(|note| {
                HttpEntity::new(note.body)
                    .with_header(http::header::CONTENT_TYPE, "text/plain; charset=utf-8")
            })
            .unwrap_or_default())
    }
}

/// Raw handler for `export`: CSV of the selected notes, or just their titles.
#[derive(Debug)]
struct NoteExport {
    store: Arc<NoteStore>,
}

impl HateosHttpHandler<u64> for NoteExport {
    fn handle(
        &self,
        selection: &Selection<u64>,
        extra_path: &[String],
        _request: &http::Request<Bytes>,
        _context: &RequestContext,
    ) -> http::Response<Bytes> {
        let notes = self.store.select(selection);
        let (content_type, text) = match extra_path {
            [] => ("text/csv", export_csv(&notes)),
            [format] if format == "titles" => (
                "text/plain; charset=utf-8",
                notes.iter().map(|note| format!("{}\n", note.title)).collect(),
            ),
            _ => {
                let mut response = http::Response::new(Bytes::from_static(b"Unknown export"));
                *response.status_mut() = http::StatusCode::NOT_FOUND;
                return response;
            }
        };
        let mut response = http::Response::new(Bytes::from(text));
        response.headers_mut().insert(
            http::header::CONTENT_TYPE,
            http::HeaderValue::from_static(content_type),
        );
        response
    }
}

fn export_csv(notes: &[Note]) -> String {
    let mut csv = String::from("id,title\n");
    for note in notes {
        let title = note.title.replace('"', "\"\"");
        csv.push_str(&format!(
            "{},\"{title}\"\n",
            note.id.map(|id| id.to_string()).unwrap_or_default()
        ));
    }
    csv
}

/// The notes mapping type.
pub type NoteMapping = HateosResourceMapping<u64, Note, Vec<Note>, Note>;

/// The `notes` mapping over `store`.
pub fn mapping(store: &Arc<NoteStore>) -> Result<NoteMapping> {
    let notes: Arc<dyn HateosResourceHandler<u64, Note, Vec<Note>>> = Arc::new(NotesHandler {
        store: Arc::clone(store),
    });
    let contents: Arc<dyn HateosHttpEntityHandler<u64>> = Arc::new(NoteContents {
        store: Arc::clone(store),
    });

    let mut mapping = NoteMapping::with(ResourceName::new("notes")?, |segment, _| {
        SelectionSyntax::default().parse(segment, |text| text.parse().ok())
    });
    for method in [HttpMethod::GET, HttpMethod::POST, HttpMethod::PUT, HttpMethod::DELETE] {
        mapping =
            mapping.set_hateos_resource_handler(LinkRelation::SELF, method, Arc::clone(&notes));
    }
    for method in [HttpMethod::GET, HttpMethod::PUT] {
        mapping = mapping.set_hateos_http_entity_handler(
            LinkRelation::CONTENTS,
            method,
            Arc::clone(&contents),
        );
    }
    Ok(mapping.set_hateos_http_handler(
        "export",
        Arc::new(NoteExport {
            store: Arc::clone(store),
        }),
    ))
}

/// A router at `base_path` serving the notes in `store`.
pub fn router(
    base_path: &str,
    media_type: MediaType,
    store: &Arc<NoteStore>,
) -> Result<HateosRouter> {
    let registry = TypeRegistry::new().register::<Note>("note")?;
    let router = HateosRouter::builder(base_path)
        .media_type(media_type)
        .type_registry(registry)
        .mapping(mapping(store)?)
        .build()?;
    Ok(router)
}
