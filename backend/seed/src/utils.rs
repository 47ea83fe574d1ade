use std::sync::LazyLock;

use regex::Regex;
use registry::SchoolInput;

static SPACES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static NON_DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\D").unwrap());

pub fn sanitize(input: &str) -> String {
    SPACES.replace_all(input.trim(), " ").into_owned()
}

/// Tidies an imported record: whitespace collapsed, phone numbers stripped to
/// digits, emails lowercased, blank optionals dropped.
pub fn sanitize_input(input: &mut SchoolInput) {
    for field in [
        &mut input.name,
        &mut input.address,
        &mut input.city,
        &mut input.state,
    ] {
        *field = sanitize(field);
    }

    input.contact = NON_DIGITS.replace_all(&input.contact, "").into_owned();
    input.email_id = sanitize(&input.email_id).to_lowercase();

    for field in [&mut input.description, &mut input.image] {
        *field = field
            .take()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
    }
}

/// Whether every field the server insists on is present.
pub fn is_complete(input: &SchoolInput) -> bool {
    [
        &input.name,
        &input.address,
        &input.city,
        &input.state,
        &input.contact,
        &input.email_id,
    ]
    .iter()
    .all(|field| !field.is_empty())
}
