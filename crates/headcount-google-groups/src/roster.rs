//! Roster export decoding.
//!
//! The service prepends a one-line, non-tabular banner to the CSV
//! export. The banner is discarded, the remainder is read as a headered
//! comma-separated table, and each `Email address` is reduced to its
//! local part. Row order and duplicates are preserved.

use std::path::Path;

use serde::Deserialize;

use crate::error::{GroupsError, GroupsResult};

#[derive(Debug, Deserialize)]
struct RosterRow {
    #[serde(rename = "Email address")]
    email_address: String,
}

/// Decode a spooled export into member usernames.
pub(crate) fn decode(path: &Path) -> GroupsResult<Vec<String>> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        GroupsError::roster_fetch_with_source("failed to read spooled export", e)
    })?;
    decode_export(&raw)
}

/// Decode raw export content. A banner-only export is an empty roster.
pub(crate) fn decode_export(raw: &str) -> GroupsResult<Vec<String>> {
    let table = raw.split_once('\n').map_or("", |(_, rest)| rest);

    let mut reader = csv::Reader::from_reader(table.as_bytes());
    let mut usernames = Vec::new();
    for row in reader.deserialize::<RosterRow>() {
        let row = row.map_err(|e| {
            GroupsError::roster_fetch_with_source(
                "export is not a valid roster table (expected an 'Email address' column)",
                e,
            )
        })?;
        usernames.push(local_part(&row.email_address).to_owned());
    }
    Ok(usernames)
}

/// The part of an address before `@`; values without `@` are kept whole.
fn local_part(address: &str) -> &str {
    address
        .split_once('@')
        .map_or(address, |(local, _)| local)
}
