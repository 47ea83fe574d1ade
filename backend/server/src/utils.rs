use std::sync::LazyLock;

use regex::Regex;
use registry::SchoolInput;

use crate::error::AppError::{self, InvalidField, MissingFields};

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());
static CONTACT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]{7,15}$").unwrap());

/// A [`SchoolInput`] that passed validation, ready to be written.
#[derive(Clone, Debug, PartialEq)]
pub struct CleanInput {
    pub name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub contact: String,
    pub email_id: String,
    pub description: Option<String>,
    pub image: Option<String>,
}

/// Trims and collapses inner whitespace.
pub fn sanitize(input: &str) -> String {
    WHITESPACE.replace_all(input.trim(), " ").into_owned()
}

fn optional(input: Option<&str>) -> Option<String> {
    input.map(sanitize).filter(|s| !s.is_empty())
}

pub fn validate(input: &SchoolInput) -> Result<CleanInput, AppError> {
    let clean = CleanInput {
        name: sanitize(&input.name),
        address: sanitize(&input.address),
        city: sanitize(&input.city),
        state: sanitize(&input.state),
        contact: sanitize(&input.contact),
        email_id: sanitize(&input.email_id),
        // descriptions keep their line breaks
        description: input
            .description
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        image: optional(input.image.as_deref()),
    };

    let required = [
        &clean.name,
        &clean.address,
        &clean.city,
        &clean.state,
        &clean.contact,
        &clean.email_id,
    ];
    if required.iter().any(|field| field.is_empty()) {
        return Err(MissingFields);
    }

    if !EMAIL.is_match(&clean.email_id) {
        return Err(InvalidField("Enter a valid email"));
    }

    if !CONTACT.is_match(&clean.contact) {
        return Err(InvalidField("Enter a valid contact number"));
    }

    Ok(clean)
}

/// Path ids that are not integers name no school.
pub fn parse_id(raw: &str) -> Result<i32, AppError> {
    raw.trim().parse().map_err(|_| AppError::NotFound)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn input() -> SchoolInput {
        SchoolInput {
            name: "  ABC   Public School ".to_string(),
            address: "42 MG Road".to_string(),
            city: "Bangalore".to_string(),
            state: "Karnataka".to_string(),
            contact: "9876543210".to_string(),
            email_id: "contact@school.com".to_string(),
            description: Some("  Co-ed.\nCBSE affiliated.  ".to_string()),
            image: Some("   ".to_string()),
        }
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("  hello   world "), "hello world");
        assert_eq!(sanitize("tab\there"), "tab here");
        assert_eq!(sanitize("     "), "");
    }

    #[test]
    fn test_validate_cleans() {
        let clean = validate(&input()).unwrap();

        assert_eq!(clean.name, "ABC Public School");
        assert_eq!(clean.description.as_deref(), Some("Co-ed.\nCBSE affiliated."));
        assert_eq!(clean.image, None);
    }

    #[test]
    fn test_blank_description_is_null() {
        let mut input = input();
        input.description = Some("   ".to_string());

        assert_eq!(validate(&input).unwrap().description, None);
    }

    #[rstest]
    #[case::name(|i: &mut SchoolInput| i.name.clear())]
    #[case::address(|i: &mut SchoolInput| i.address = " ".to_string())]
    #[case::city(|i: &mut SchoolInput| i.city.clear())]
    #[case::state(|i: &mut SchoolInput| i.state.clear())]
    #[case::contact(|i: &mut SchoolInput| i.contact.clear())]
    #[case::email(|i: &mut SchoolInput| i.email_id.clear())]
    fn test_missing_fields(#[case] blank: fn(&mut SchoolInput)) {
        let mut input = input();
        blank(&mut input);

        assert!(matches!(validate(&input), Err(MissingFields)));
    }

    #[rstest]
    #[case("contact@school")]
    #[case("no at sign.com")]
    #[case("a@b@c.com")]
    fn test_bad_email(#[case] email: &str) {
        let mut input = input();
        input.email_id = email.to_string();

        assert!(matches!(
            validate(&input),
            Err(InvalidField("Enter a valid email"))
        ));
    }

    #[rstest]
    #[case("12345")]
    #[case("1234567890123456")]
    #[case("98765-43210")]
    #[case("९८७६५४३२१०")]
    #[case("٩٨٧٦٥٤٣٢١٠")]
    fn test_bad_contact(#[case] contact: &str) {
        let mut input = input();
        input.contact = contact.to_string();

        assert!(matches!(
            validate(&input),
            Err(InvalidField("Enter a valid contact number"))
        ));
    }

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("17").unwrap(), 17);
        assert!(matches!(parse_id("abc"), Err(AppError::NotFound)));
        assert!(matches!(parse_id(""), Err(AppError::NotFound)));
    }
}
