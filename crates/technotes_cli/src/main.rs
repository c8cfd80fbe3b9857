//! Command-line caller for the note core.
//!
//! # Responsibility
//! - Load configuration, open the store, and close it on exit.
//! - Decode JSON request bodies, invoke `NoteService`, and print the JSON
//!   response together with its HTTP-equivalent status code.
//!
//! Usage:
//!   technotes version
//!   technotes list
//!   technotes get <id>
//!   technotes create '{"user":"u1","title":"Shopping","text":"milk"}'
//!   technotes update '{"id":"...","user":"u1","title":"...","text":"...","completed":true}'
//!   technotes delete '{"id":"..."}'
//!   technotes add-user <id> <username>

use log::{debug, error};
use rusqlite::Connection;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::error::Error;
use std::process::ExitCode;
use technotes_core::db::{close_db, open_db};
use technotes_core::service::note_service::{MSG_ALL_FIELDS_REQUIRED, MSG_NOTE_ID_REQUIRED};
use technotes_core::{
    core_version, init_logging, CoreConfig, CreateNoteRequest, DeleteNoteRequest, NoteService,
    NoteServiceError, NoteServiceResult, ResponseStatus, SqliteNoteRepository,
    SqliteUserDirectory, UpdateNoteRequest, User,
};

const USAGE: &str = "usage: technotes <version|list|get|create|update|delete|add-user> [args]";

type CliResult<T> = Result<T, Box<dyn Error>>;

fn main() -> ExitCode {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    match run(&args) {
        Ok(code) => code,
        Err(err) => {
            error!("event=cli_run module=cli status=error error={err}");
            eprintln!("technotes: {err}");
            ExitCode::from(2)
        }
    }
}

fn run(args: &[String]) -> CliResult<ExitCode> {
    let Some(command) = args.first().map(String::as_str) else {
        eprintln!("{USAGE}");
        return Ok(ExitCode::from(2));
    };
    if command == "version" {
        println!("technotes_core version={}", core_version());
        return Ok(ExitCode::SUCCESS);
    }

    let config = CoreConfig::from_env()?;
    if let Some(log_dir) = config.log_dir.as_ref() {
        init_logging(&config.log_level, log_dir)?;
    }

    let conn = open_db(&config.db_path)?;
    let outcome = dispatch(&conn, command, &args[1..]);
    close_db(conn)?;

    let (status, body) = outcome?;
    eprintln!("status={}", status.http_status());
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(if status.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn dispatch(
    conn: &Connection,
    command: &str,
    rest: &[String],
) -> CliResult<(ResponseStatus, Value)> {
    let service = NoteService::new(
        SqliteNoteRepository::try_new(conn)?,
        SqliteUserDirectory::try_new(conn)?,
    );

    let outcome = match command {
        "list" => service
            .list()
            .map(|notes| (ResponseStatus::Success, serde_json::to_value(notes))),
        "get" => service
            .get(positional(rest, 0, "note id")?)
            .map(|note| (ResponseStatus::Success, serde_json::to_value(note))),
        "create" => decode::<CreateNoteRequest>(
            positional(rest, 0, "request body")?,
            MSG_ALL_FIELDS_REQUIRED,
        )
        .and_then(|request| service.create(&request))
        .map(|ack| (ResponseStatus::Created, serde_json::to_value(ack))),
        "update" => decode::<UpdateNoteRequest>(
            positional(rest, 0, "request body")?,
            MSG_ALL_FIELDS_REQUIRED,
        )
        .and_then(|request| service.update(&request))
        .map(|ack| (ResponseStatus::Success, serde_json::to_value(ack))),
        "delete" => decode::<DeleteNoteRequest>(
            positional(rest, 0, "request body")?,
            MSG_NOTE_ID_REQUIRED,
        )
        .and_then(|request| service.delete(&request))
        .map(|ack| (ResponseStatus::Success, serde_json::to_value(ack))),
        "add-user" => {
            let user = User::new(
                positional(rest, 0, "user id")?,
                positional(rest, 1, "username")?,
            );
            SqliteUserDirectory::try_new(conn)?.insert_user(&user)?;
            Ok((ResponseStatus::Created, serde_json::to_value(user)))
        }
        other => return Err(format!("unknown command `{other}`; {USAGE}").into()),
    };

    match outcome {
        Ok((status, body)) => Ok((status, body?)),
        Err(err) => Ok((err.status(), serde_json::to_value(err.to_response())?)),
    }
}

/// Decodes a request body. Malformed JSON or wrong-typed fields are invalid
/// input, reported the same way as fields the service rejects.
fn decode<T: DeserializeOwned>(body: &str, message: &'static str) -> NoteServiceResult<T> {
    serde_json::from_str(body).map_err(|err| {
        debug!("event=cli_decode module=cli status=error error={err}");
        NoteServiceError::InvalidInput(message)
    })
}

fn positional<'a>(rest: &'a [String], index: usize, name: &str) -> CliResult<&'a str> {
    rest.get(index)
        .map(String::as_str)
        .ok_or_else(|| format!("missing {name}; {USAGE}").into())
}
