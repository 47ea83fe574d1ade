//! # Browse Board
//!
//! Client-side view over the school listing.
//!
//! Mirrors what the browse page keeps in memory: the listing sorted by id,
//! a search term, up to [`MAX_COMPARE`] schools picked for comparison, and
//! the school currently waiting on a rating round trip.
//!
//! ## Rating flow
//! 1. [`Board::apply_optimistic`] folds the star into the cached aggregate
//!    right away.
//! 2. The rating is posted.
//! 3. On success, [`Board::reconcile`] replaces the guess with the server's
//!    aggregate.
//! 4. On failure, the whole listing is fetched again and [`Board::load`]ed.
use crate::{
    models::{RatingSummary, SchoolListing},
    rating::optimistic_average,
    search::matches,
};

pub const MAX_COMPARE: usize = 4;
pub const MIN_COMPARE: usize = 2;

#[derive(Clone, Debug, Default)]
pub struct Board {
    schools: Vec<SchoolListing>,
    search: String,
    selected: Vec<i32>,
    submitting: Option<i32>,
}

/// One column of the comparison table.
#[derive(Clone, Debug, PartialEq)]
pub struct ComparisonColumn {
    pub id: i32,
    pub name: String,
    pub image: Option<String>,
    /// Address, then "city, state".
    pub location: [String; 2],
    /// Phone, then email.
    pub contact: [String; 2],
}

impl Board {
    pub fn new(listings: Vec<SchoolListing>) -> Self {
        let mut board = Self::default();
        board.load(listings);
        board
    }

    /// Replaces the cached listing, keeping the search term and whichever
    /// selections still exist.
    pub fn load(&mut self, mut listings: Vec<SchoolListing>) {
        listings.sort_by_key(|listing| listing.school.id);

        self.selected
            .retain(|id| listings.iter().any(|listing| listing.school.id == *id));
        self.schools = listings;
    }

    pub fn schools(&self) -> &[SchoolListing] {
        &self.schools
    }

    pub fn get(&self, id: i32) -> Option<&SchoolListing> {
        self.schools.iter().find(|listing| listing.school.id == id)
    }

    pub fn set_search(&mut self, term: impl Into<String>) {
        self.search = term.into();
    }

    pub fn clear_search(&mut self) {
        self.search.clear();
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn filtered(&self) -> Vec<&SchoolListing> {
        self.schools
            .iter()
            .filter(|listing| matches(&listing.school, &self.search))
            .collect()
    }

    /// Flips the selection of `id` and reports whether it ends up selected.
    ///
    /// Selecting beyond [`MAX_COMPARE`] schools is ignored.
    pub fn toggle(&mut self, id: i32) -> bool {
        if let Some(position) = self.selected.iter().position(|&selected| selected == id) {
            self.selected.remove(position);
            return false;
        }

        if self.selected.len() >= MAX_COMPARE || self.get(id).is_none() {
            return false;
        }

        self.selected.push(id);
        true
    }

    pub fn selected(&self) -> &[i32] {
        &self.selected
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    pub fn remaining_selections(&self) -> usize {
        MAX_COMPARE - self.selected.len()
    }

    pub fn can_compare(&self) -> bool {
        self.selected.len() >= MIN_COMPARE
    }

    pub fn comparison(&self) -> Vec<ComparisonColumn> {
        self.selected
            .iter()
            .filter_map(|&id| self.get(id))
            .map(|listing| {
                let school = &listing.school;

                ComparisonColumn {
                    id: school.id,
                    name: school.name.clone(),
                    image: school.image.clone(),
                    location: [
                        school.address.clone(),
                        format!("{}, {}", school.city, school.state),
                    ],
                    contact: [school.contact.clone(), school.email_id.clone()],
                }
            })
            .collect()
    }

    /// Folds `rating` into the cached aggregate of `id` and marks it as
    /// submitting. Returns the aggregate it replaced.
    pub fn apply_optimistic(&mut self, id: i32, rating: u8) -> Option<RatingSummary> {
        let listing = self
            .schools
            .iter_mut()
            .find(|listing| listing.school.id == id)?;

        let previous = listing.summary();
        let updated = optimistic_average(previous, rating);
        listing.avg_rating = updated.avg_rating;
        listing.rating_count = updated.rating_count;

        self.submitting = Some(id);
        Some(previous)
    }

    /// Overwrites the cached aggregate of `id` with the server's.
    pub fn reconcile(&mut self, id: i32, summary: RatingSummary) {
        if let Some(listing) = self
            .schools
            .iter_mut()
            .find(|listing| listing.school.id == id)
        {
            listing.avg_rating = summary.avg_rating;
            listing.rating_count = summary.rating_count;
        }

        self.finish_submission();
    }

    pub fn finish_submission(&mut self) {
        self.submitting = None;
    }

    pub fn is_submitting(&self, id: i32) -> bool {
        self.submitting == Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::School;

    fn listing(id: i32, name: &str, city: &str, avg_rating: f64, rating_count: i64) -> SchoolListing {
        SchoolListing {
            school: School {
                id,
                name: name.to_string(),
                address: format!("{id} Main Road"),
                city: city.to_string(),
                state: "Karnataka".to_string(),
                contact: format!("98765432{id:02}"),
                image: None,
                email_id: format!("school{id}@example.com"),
                description: None,
            },
            avg_rating,
            rating_count,
        }
    }

    fn board() -> Board {
        Board::new(vec![
            listing(3, "Cedar Academy", "Mysore", 3.0, 0),
            listing(1, "Banyan School", "Bangalore", 4.0, 2),
            listing(2, "Lotus Convent", "Mangalore", 2.5, 4),
            listing(5, "Peepal Vidyalaya", "Bangalore", 5.0, 1),
            listing(4, "Neem Public School", "Hubli", 3.0, 0),
        ])
    }

    #[test]
    fn test_load_sorts_ascending() {
        let ids: Vec<i32> = board().schools().iter().map(|l| l.school.id).collect();

        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_search_filters() {
        let mut board = board();
        board.set_search("bangalore");
        assert_eq!(board.search(), "bangalore");

        let names: Vec<&str> = board
            .filtered()
            .iter()
            .map(|l| l.school.name.as_str())
            .collect();
        assert_eq!(names, vec!["Banyan School", "Peepal Vidyalaya"]);

        board.clear_search();
        assert_eq!(board.search(), "");
        assert_eq!(board.filtered().len(), 5);
    }

    #[test]
    fn test_selection_caps_at_four() {
        let mut board = board();

        for id in 1..=4 {
            assert!(board.toggle(id));
        }
        assert!(!board.toggle(5));
        assert_eq!(board.selected(), &[1, 2, 3, 4]);
        assert_eq!(board.remaining_selections(), 0);

        assert!(!board.toggle(2));
        assert!(board.toggle(5));
        assert_eq!(board.selected(), &[1, 3, 4, 5]);

        board.clear_selection();
        assert!(board.selected().is_empty());
        assert_eq!(board.remaining_selections(), 4);
        assert!(!board.can_compare());
    }

    #[test]
    fn test_unknown_school_is_not_selectable() {
        let mut board = board();

        assert!(!board.toggle(42));
        assert!(board.selected().is_empty());
    }

    #[test]
    fn test_compare_needs_two() {
        let mut board = board();
        board.toggle(1);
        assert!(!board.can_compare());

        board.toggle(3);
        assert!(board.can_compare());

        let columns = board.comparison();
        assert_eq!(columns.len(), 2);
        assert_eq!(columns[0].name, "Banyan School");
        assert_eq!(columns[0].location[1], "Bangalore, Karnataka");
        assert_eq!(columns[1].contact[1], "school3@example.com");
    }

    #[test]
    fn test_reload_drops_vanished_selections() {
        let mut board = board();
        board.toggle(2);
        board.toggle(5);

        board.load(vec![listing(5, "Peepal Vidyalaya", "Bangalore", 5.0, 1)]);

        assert_eq!(board.selected(), &[5]);
    }

    #[test]
    fn test_optimistic_then_reconcile() {
        let mut board = board();

        let previous = board.apply_optimistic(1, 1).unwrap();
        assert_eq!(previous.avg_rating, 4.0);
        assert_eq!(board.get(1).unwrap().avg_rating, 3.0);
        assert_eq!(board.get(1).unwrap().rating_count, 3);
        assert!(board.is_submitting(1));

        board.reconcile(
            1,
            RatingSummary {
                avg_rating: 2.75,
                rating_count: 4,
            },
        );
        assert_eq!(board.get(1).unwrap().avg_rating, 2.75);
        assert_eq!(board.get(1).unwrap().rating_count, 4);
        assert!(!board.is_submitting(1));
    }

    #[test]
    fn test_optimistic_on_unrated_school() {
        let mut board = board();

        board.apply_optimistic(4, 2);

        assert_eq!(board.get(4).unwrap().avg_rating, 2.0);
        assert_eq!(board.get(4).unwrap().rating_count, 1);
    }

    #[test]
    fn test_optimistic_unknown_school() {
        let mut board = board();

        assert_eq!(board.apply_optimistic(99, 5), None);
        assert!(!board.is_submitting(99));
    }
}
