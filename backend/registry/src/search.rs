use crate::models::School;

/// Case-insensitive substring match over the fields people actually search by.
///
/// A blank term matches every school.
pub fn matches(school: &School, term: &str) -> bool {
    let term = term.trim().to_lowercase();

    if term.is_empty() {
        return true;
    }

    [
        &school.name,
        &school.city,
        &school.state,
        &school.address,
        &school.email_id,
        &school.contact,
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(&term))
}
