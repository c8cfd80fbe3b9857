use rusqlite::Connection;
use serde_json::json;
use technotes_core::db::open_db_in_memory;
use technotes_core::{
    CreateNoteRequest, DeleteNoteRequest, Note, NoteId, NoteRepository, NoteService,
    NoteServiceError, RepoResult, ResponseStatus, SqliteNoteRepository, SqliteUserDirectory,
    UpdateNoteRequest, User,
};

type SqliteNoteService<'conn> = NoteService<SqliteNoteRepository<'conn>, SqliteUserDirectory<'conn>>;

fn seeded_conn() -> Connection {
    let conn = open_db_in_memory().unwrap();
    let users = SqliteUserDirectory::try_new(&conn).unwrap();
    users.insert_user(&User::new("u1", "alice")).unwrap();
    users.insert_user(&User::new("u2", "bob")).unwrap();
    conn
}

fn service(conn: &Connection) -> SqliteNoteService<'_> {
    NoteService::new(
        SqliteNoteRepository::try_new(conn).unwrap(),
        SqliteUserDirectory::try_new(conn).unwrap(),
    )
}

fn create_request(user: &str, title: &str, text: &str) -> CreateNoteRequest {
    CreateNoteRequest {
        user: Some(user.to_string()),
        title: Some(title.to_string()),
        text: Some(text.to_string()),
    }
}

fn update_request(id: NoteId, user: &str, title: &str, completed: bool) -> UpdateNoteRequest {
    UpdateNoteRequest {
        id: Some(id.to_string()),
        user: Some(user.to_string()),
        title: Some(title.to_string()),
        text: Some("updated body".to_string()),
        completed: Some(json!(completed)),
    }
}

fn note_count(conn: &Connection) -> u64 {
    SqliteNoteRepository::try_new(conn).unwrap().count().unwrap()
}

fn id_of(conn: &Connection, title: &str) -> NoteId {
    SqliteNoteRepository::try_new(conn)
        .unwrap()
        .find_by_title(title)
        .unwrap()
        .unwrap()
        .id
}

#[test]
fn duplicate_title_scenario_keeps_first_note_and_resolves_owner() {
    let conn = seeded_conn();
    let service = service(&conn);

    let created = service
        .create(&create_request("u1", "Shopping", "milk"))
        .unwrap();
    assert_eq!(created.message, "Note created successfully");

    let err = service
        .create(&create_request("u2", "Shopping", "eggs"))
        .unwrap_err();
    assert!(matches!(err, NoteServiceError::Conflict(_)));
    assert_eq!(err.status(), ResponseStatus::Conflict);

    let listed = service.list().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].title, "Shopping");
    assert_eq!(listed[0].text, "milk");
    assert_eq!(listed[0].user.as_str(), "u1");
    assert_eq!(listed[0].username.as_deref(), Some("alice"));
    assert!(!listed[0].completed);
}

#[test]
fn list_on_empty_collection_is_not_found() {
    let conn = seeded_conn();
    let err = service(&conn).list().unwrap_err();
    assert!(matches!(err, NoteServiceError::NotFound(_)));
    assert_eq!(err.message(), "No notes found");
    assert_eq!(err.status().http_status(), 400);
}

#[test]
fn list_preserves_insertion_order_and_unresolved_owner_has_no_username() {
    let conn = seeded_conn();
    let service = service(&conn);
    service.create(&create_request("u2", "first", "a")).unwrap();
    service.create(&create_request("ghost", "second", "b")).unwrap();
    service.create(&create_request("u1", "third", "c")).unwrap();

    let listed = service.list().unwrap();
    let titles = listed.iter().map(|note| note.title.as_str()).collect::<Vec<_>>();
    assert_eq!(titles, vec!["first", "second", "third"]);
    assert_eq!(listed[0].username.as_deref(), Some("bob"));
    assert_eq!(listed[1].username, None);
    assert_eq!(listed[2].username.as_deref(), Some("alice"));
}

#[test]
fn create_with_any_missing_or_empty_field_is_invalid_input_and_stores_nothing() {
    let conn = seeded_conn();
    let service = service(&conn);

    let cases = [
        CreateNoteRequest {
            user: None,
            ..create_request("u1", "t", "x")
        },
        CreateNoteRequest {
            title: None,
            ..create_request("u1", "t", "x")
        },
        CreateNoteRequest {
            text: None,
            ..create_request("u1", "t", "x")
        },
        create_request("u1", "", "x"),
        CreateNoteRequest::default(),
    ];

    for request in &cases {
        let err = service.create(request).unwrap_err();
        assert!(matches!(err, NoteServiceError::InvalidInput(_)), "{request:?}");
        assert_eq!(err.message(), "All fields required");
    }
    assert_eq!(note_count(&conn), 0);
}

#[test]
fn create_accepts_owner_ids_unknown_to_the_directory() {
    let conn = seeded_conn();
    let service = service(&conn);
    service
        .create(&create_request("nobody", "orphan", "text"))
        .unwrap();
    assert_eq!(note_count(&conn), 1);
}

#[test]
fn create_conflict_leaves_store_unchanged() {
    let conn = seeded_conn();
    let service = service(&conn);
    service.create(&create_request("u1", "Shopping", "milk")).unwrap();

    service
        .create(&create_request("u1", "Shopping", "bread"))
        .unwrap_err();
    assert_eq!(note_count(&conn), 1);
    let stored = service.get(&id_of(&conn, "Shopping").to_string()).unwrap();
    assert_eq!(stored.text, "milk");
}

#[test]
fn title_match_is_exact() {
    let conn = seeded_conn();
    let service = service(&conn);
    service.create(&create_request("u1", "Shopping", "milk")).unwrap();
    service.create(&create_request("u1", "shopping", "eggs")).unwrap();
    assert_eq!(note_count(&conn), 2);
}

#[test]
fn update_replaces_all_mutable_fields() {
    let conn = seeded_conn();
    let service = service(&conn);
    service.create(&create_request("u1", "Shopping", "milk")).unwrap();
    let id = id_of(&conn, "Shopping");

    let response = service
        .update(&update_request(id, "u2", "Groceries", true))
        .unwrap();
    assert_eq!(response.message, "Note updated successfully");

    let stored = service.get(&id.to_string()).unwrap();
    assert_eq!(stored.id, id);
    assert_eq!(stored.user.as_str(), "u2");
    assert_eq!(stored.username.as_deref(), Some("bob"));
    assert_eq!(stored.title, "Groceries");
    assert_eq!(stored.text, "updated body");
    assert!(stored.completed);
}

#[test]
fn update_keeping_own_title_is_not_a_conflict() {
    let conn = seeded_conn();
    let service = service(&conn);
    service.create(&create_request("u1", "Shopping", "milk")).unwrap();
    let id = id_of(&conn, "Shopping");

    service
        .update(&update_request(id, "u1", "Shopping", true))
        .unwrap();
    assert!(service.get(&id.to_string()).unwrap().completed);
}

#[test]
fn update_to_another_notes_title_is_conflict() {
    let conn = seeded_conn();
    let service = service(&conn);
    service.create(&create_request("u1", "Shopping", "milk")).unwrap();
    service.create(&create_request("u1", "Chores", "dishes")).unwrap();
    let chores_id = id_of(&conn, "Chores");

    let err = service
        .update(&update_request(chores_id, "u1", "Shopping", false))
        .unwrap_err();
    assert!(matches!(err, NoteServiceError::Conflict(_)));
    assert_eq!(service.get(&chores_id.to_string()).unwrap().title, "Chores");
}

#[test]
fn update_unknown_id_is_not_found_even_when_title_is_taken() {
    let conn = seeded_conn();
    let service = service(&conn);
    service.create(&create_request("u1", "Shopping", "milk")).unwrap();

    let err = service
        .update(&update_request(NoteId::new_v4(), "u1", "Shopping", false))
        .unwrap_err();
    assert!(matches!(err, NoteServiceError::NotFound(_)));
    assert_eq!(err.message(), "Note not found");

    let mut opaque = update_request(NoteId::new_v4(), "u1", "Other", false);
    opaque.id = Some("not-a-stored-id".to_string());
    let err = service.update(&opaque).unwrap_err();
    assert!(matches!(err, NoteServiceError::NotFound(_)));
}

#[test]
fn update_requires_boolean_completed() {
    let conn = seeded_conn();
    let service = service(&conn);
    service.create(&create_request("u1", "Shopping", "milk")).unwrap();
    let id = id_of(&conn, "Shopping");

    for completed in [Some(json!("true")), Some(json!(1)), Some(json!(null)), None] {
        let request = UpdateNoteRequest {
            completed: completed.clone(),
            ..update_request(id, "u1", "Shopping", false)
        };
        let err = service.update(&request).unwrap_err();
        assert!(
            matches!(err, NoteServiceError::InvalidInput(_)),
            "completed={completed:?}"
        );
    }
    assert!(!service.get(&id.to_string()).unwrap().completed);
}

#[test]
fn update_with_missing_fields_is_invalid_input() {
    let conn = seeded_conn();
    let service = service(&conn);
    let id = NoteId::new_v4();

    let err = service
        .update(&UpdateNoteRequest {
            text: Some(String::new()),
            ..update_request(id, "u1", "t", false)
        })
        .unwrap_err();
    assert_eq!(err.status(), ResponseStatus::InvalidInput);

    let err = service
        .update(&UpdateNoteRequest {
            id: None,
            ..update_request(id, "u1", "t", false)
        })
        .unwrap_err();
    assert_eq!(err.status(), ResponseStatus::InvalidInput);
}

#[test]
fn update_request_decoded_from_json_rejects_string_completed() {
    let conn = seeded_conn();
    let service = service(&conn);
    service.create(&create_request("u1", "Shopping", "milk")).unwrap();
    let id = id_of(&conn, "Shopping");

    let request: UpdateNoteRequest = serde_json::from_value(json!({
        "id": id.to_string(),
        "user": "u1",
        "title": "Shopping",
        "text": "milk",
        "completed": "true",
    }))
    .unwrap();
    let err = service.update(&request).unwrap_err();
    assert!(matches!(err, NoteServiceError::InvalidInput(_)));
}

#[test]
fn delete_validates_and_removes_exactly_one_note() {
    let conn = seeded_conn();
    let service = service(&conn);
    service.create(&create_request("u1", "keep", "a")).unwrap();
    service.create(&create_request("u1", "drop", "b")).unwrap();

    let err = service.delete(&DeleteNoteRequest::default()).unwrap_err();
    assert!(matches!(err, NoteServiceError::InvalidInput(_)));
    assert_eq!(err.message(), "Note ID required");

    let err = service
        .delete(&DeleteNoteRequest {
            id: Some(NoteId::new_v4().to_string()),
        })
        .unwrap_err();
    assert!(matches!(err, NoteServiceError::NotFound(_)));

    let response = service
        .delete(&DeleteNoteRequest {
            id: Some(id_of(&conn, "drop").to_string()),
        })
        .unwrap();
    assert_eq!(response.message, "Note deleted successfully");

    let remaining = service.list().unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].title, "keep");
}

#[test]
fn deleted_title_can_be_reused() {
    let conn = seeded_conn();
    let service = service(&conn);
    service.create(&create_request("u1", "Shopping", "milk")).unwrap();
    service
        .delete(&DeleteNoteRequest {
            id: Some(id_of(&conn, "Shopping").to_string()),
        })
        .unwrap();

    service.create(&create_request("u2", "Shopping", "eggs")).unwrap();
    assert_eq!(service.list().unwrap()[0].username.as_deref(), Some("bob"));
}

/// Wraps a real store but hides title matches and lets tests control deletes,
/// emulating a lost check-then-act race and a store that refuses deletion.
struct RacingStore<'conn> {
    inner: SqliteNoteRepository<'conn>,
    delete_removes: bool,
}

impl NoteRepository for RacingStore<'_> {
    fn find_all(&self) -> RepoResult<Vec<Note>> {
        self.inner.find_all()
    }

    fn find_by_id(&self, id: NoteId) -> RepoResult<Option<Note>> {
        self.inner.find_by_id(id)
    }

    fn find_by_title(&self, _title: &str) -> RepoResult<Option<Note>> {
        Ok(None)
    }

    fn insert(&self, note: &Note) -> RepoResult<NoteId> {
        self.inner.insert(note)
    }

    fn save(&self, note: &Note) -> RepoResult<()> {
        self.inner.save(note)
    }

    fn delete_by_id(&self, id: NoteId) -> RepoResult<bool> {
        if self.delete_removes {
            self.inner.delete_by_id(id)
        } else {
            Ok(false)
        }
    }
}

fn racing_service(
    conn: &Connection,
    delete_removes: bool,
) -> NoteService<RacingStore<'_>, SqliteUserDirectory<'_>> {
    NoteService::new(
        RacingStore {
            inner: SqliteNoteRepository::try_new(conn).unwrap(),
            delete_removes,
        },
        SqliteUserDirectory::try_new(conn).unwrap(),
    )
}

#[test]
fn storage_unique_index_backstops_a_missed_title_check() {
    let conn = seeded_conn();
    let service = racing_service(&conn, true);
    service.create(&create_request("u1", "Shopping", "milk")).unwrap();

    let err = service
        .create(&create_request("u2", "Shopping", "eggs"))
        .unwrap_err();
    assert!(matches!(err, NoteServiceError::InvalidData(_)));
    assert_eq!(err.status().http_status(), 409);
    assert_eq!(note_count(&conn), 1);

    service.create(&create_request("u1", "Chores", "x")).unwrap();
    let err = service
        .update(&update_request(id_of(&conn, "Chores"), "u1", "Shopping", false))
        .unwrap_err();
    assert_eq!(err.status(), ResponseStatus::InvalidData);
}

#[test]
fn delete_not_performed_by_store_is_invalid_data() {
    let conn = seeded_conn();
    service(&conn)
        .create(&create_request("u1", "Shopping", "milk"))
        .unwrap();
    let id = id_of(&conn, "Shopping");

    let err = racing_service(&conn, false)
        .delete(&DeleteNoteRequest {
            id: Some(id.to_string()),
        })
        .unwrap_err();
    assert!(matches!(err, NoteServiceError::InvalidData(_)));
    assert_eq!(err.message(), "Invalid note data");
    assert_eq!(note_count(&conn), 1);
}
