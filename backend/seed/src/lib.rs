//! # Seeding
//!
//! Bulk registration of schools through a running portal.
//!
//! ## Flow
//! 1. Read a JSON file, either a bare array of schools or `{ "schools": [...] }`.
//! 2. Tidy every record (whitespace, phone digits, lowercase emails).
//! 3. Skip records missing a required field without bothering the server.
//! 4. `POST` the rest one at a time. The server still validates, so records it
//!    refuses with a `400` are counted as rejected and the import carries on.
//! 5. Any other failure (server down, `500`) aborts the run.
use std::{fs, path::Path};

use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use registry::{RemoteError, SchoolsClient};

pub mod models;
pub mod utils;

use models::{Tally, parse_seed};
use utils::{is_complete, sanitize_input};

pub async fn load_schools(path: &Path, url: &str) -> anyhow::Result<Tally> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let mut schools = parse_seed(&json)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    println!("Loaded Schools: {}\n", schools.len());

    let client = SchoolsClient::new(url);
    let pb = ProgressBar::new(schools.len() as u64);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
        )?
        .progress_chars("=> "),
    );

    let mut tally = Tally::default();

    for school in schools.iter_mut() {
        sanitize_input(school);
        pb.set_message(school.name.clone());

        if !is_complete(school) {
            pb.println(format!("Skipping incomplete record {:?}", school.name));
            tally.skipped += 1;
            pb.inc(1);
            continue;
        }

        match client.create(school).await {
            Ok(_) => tally.created += 1,
            Err(RemoteError::Status { status, message }) if status.is_client_error() => {
                pb.println(format!("Rejected {:?}: {message}", school.name));
                tally.rejected += 1;
            }
            Err(e) => {
                pb.abandon_with_message("Aborted");
                return Err(e).with_context(|| format!("Failed to register {:?}", school.name));
            }
        }

        pb.inc(1);
    }

    pb.finish_with_message("Done");

    println!("\nCreated: {}", tally.created);
    println!("Skipped: {}", tally.skipped);
    println!("Rejected: {}", tally.rejected);

    Ok(tally)
}
