//! The in-memory roster: every known boat keyed by hull number.

use std::collections::HashMap;

use serde::Deserialize;

use crate::boat::{Boat, Owner};

/// Boats in the order the spreadsheet first mentions them.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    boats: Vec<Boat>,
    by_hull: HashMap<String, usize>,
}

/// The three fields a member types in to prove they are on the roster.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MemberCredentials {
    pub hull: String,
    pub last_name: String,
    pub email: String,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a row-level boat record. The first record for a hull creates the
    /// boat; later ones push their owner to the front of the history and
    /// overwrite whatever fields they fill in.
    pub fn absorb(&mut self, mut boat: Boat, owner: Owner) {
        let owned = boat.has_owned_status();
        match self.by_hull.get(&boat.hull) {
            Some(&idx) => {
                let existing = &mut self.boats[idx];
                if owned {
                    existing.owners.insert(0, owner);
                }
                existing.merge_newer(boat);
            }
            None => {
                boat.owners.clear();
                if owned {
                    boat.owners.push(owner);
                }
                self.by_hull.insert(boat.hull.clone(), self.boats.len());
                self.boats.push(boat);
            }
        }
    }

    pub fn get(&self, hull: &str) -> Option<&Boat> {
        self.by_hull.get(hull).map(|&idx| &self.boats[idx])
    }

    pub fn boats(&self) -> &[Boat] {
        &self.boats
    }

    pub fn iter(&self) -> impl Iterator<Item = &Boat> {
        self.boats.iter()
    }

    pub fn len(&self) -> usize {
        self.boats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boats.is_empty()
    }

    /// Case-insensitive substring search over boat name, berth and owner
    /// names. Results keep roster order.
    pub fn search(&self, query: &str) -> Vec<&Boat> {
        let needle = query.to_lowercase();
        self.boats
            .iter()
            .filter(|boat| boat.search_text().contains(&needle))
            .collect()
    }

    /// Look up the boat whose current owner matches the given credentials.
    ///
    /// The hull must match exactly, the owner's name must end with the given
    /// last name in whole words (so "Van Dyke" works but "yke" does not) and
    /// the email must match. Comparisons ignore case and extra whitespace.
    pub fn find_member(&self, creds: &MemberCredentials) -> Option<&Boat> {
        let last_name = words(&creds.last_name);
        let email = creds.email.trim().to_lowercase();
        if last_name.is_empty() || email.is_empty() {
            return None;
        }

        let boat = self.get(creds.hull.trim())?;
        let owner = boat.current_owner()?;

        let owner_words = words(&owner.owner_name);
        let owner_email = owner.email.trim().to_lowercase();

        (owner_words.ends_with(&last_name) && owner_email == email).then_some(boat)
    }
}

fn words(name: &str) -> Vec<String> {
    name.split_whitespace().map(str::to_lowercase).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(hull: &str, status: &str, name: &str, owner: &str) -> (Boat, Owner) {
        let boat = Boat {
            hull: hull.into(),
            status: status.into(),
            boat_name: name.into(),
            ..Default::default()
        };
        let owner = Owner {
            hull: hull.into(),
            owner_name: owner.into(),
            email: format!("{}@example.org", owner.to_lowercase().replace(' ', ".")),
            ..Default::default()
        };
        (boat, owner)
    }

    fn sample() -> Roster {
        let mut roster = Roster::new();
        for (hull, status, name, owner) in [
            ("1", "GOOD", "Sea Witch", "Ann Baker"),
            ("2", "GOOD", "Tern", "Carl Dunn"),
            ("1", "GOOD", "", "Eve Ford"),
            ("3", "SUNK", "Blue Moon", "Gil Hart"),
            ("2", "RENO", "Tern II", "Ida Jones"),
        ] {
            let (boat, owner) = row(hull, status, name, owner);
            roster.absorb(boat, owner);
        }
        roster
    }

    #[test]
    fn test_first_seen_order() {
        let roster = sample();
        let hulls: Vec<_> = roster.iter().map(|b| b.hull.as_str()).collect();
        assert_eq!(hulls, vec!["1", "2", "3"]);
        assert_eq!(roster.len(), 3);
    }

    #[test]
    fn test_later_rows_become_current_owner() {
        let roster = sample();
        let boat = roster.get("1").unwrap();
        let names: Vec<_> = boat.owners.iter().map(|o| o.owner_name.as_str()).collect();
        assert_eq!(names, vec!["Eve Ford", "Ann Baker"]);
        assert_eq!(boat.boat_name, "Sea Witch");

        let boat = roster.get("2").unwrap();
        assert_eq!(boat.boat_name, "Tern II");
        assert_eq!(boat.status, "RENO");
        assert_eq!(boat.current_owner().unwrap().owner_name, "Ida Jones");
    }

    #[test]
    fn test_unowned_status_has_no_owner() {
        let roster = sample();
        let boat = roster.get("3").unwrap();
        assert!(boat.owners.is_empty());
        assert!(boat.current_owner().is_none());
    }

    #[test]
    fn test_search_matches_previous_owners() {
        let roster = sample();
        let hits: Vec<_> = roster.search("BAKER").iter().map(|b| b.hull.clone()).collect();
        assert_eq!(hits, vec!["1"]);

        let hits = roster.search("tern");
        assert_eq!(hits.len(), 1);
        assert!(roster.search("nobody").is_empty());
    }

    #[test]
    fn test_find_member() {
        let roster = sample();
        let creds = MemberCredentials {
            hull: " 1 ".into(),
            last_name: "ford".into(),
            email: "EVE.FORD@example.org".into(),
        };
        assert_eq!(roster.find_member(&creds).map(|b| b.hull.as_str()), Some("1"));
    }

    #[test]
    fn test_find_member_rejects_previous_owner() {
        let roster = sample();
        let creds = MemberCredentials {
            hull: "1".into(),
            last_name: "Baker".into(),
            email: "ann.baker@example.org".into(),
        };
        assert!(roster.find_member(&creds).is_none());
    }

    #[test]
    fn test_find_member_rejects_blank_fields() {
        let roster = sample();
        let creds = MemberCredentials {
            hull: "1".into(),
            last_name: "".into(),
            email: "".into(),
        };
        assert!(roster.find_member(&creds).is_none());
    }

    #[test]
    fn test_find_member_multi_word_surname() {
        let mut roster = Roster::new();
        let (boat, owner) = row("7", "GOOD", "Dutchman", "Piet Van Dyke");
        roster.absorb(boat, owner);

        let creds = MemberCredentials {
            hull: "7".into(),
            last_name: " van   DYKE ".into(),
            email: "piet.van.dyke@example.org".into(),
        };
        assert_eq!(roster.find_member(&creds).map(|b| b.hull.as_str()), Some("7"));

        let creds = MemberCredentials {
            last_name: "Dyke".into(),
            ..creds
        };
        assert!(roster.find_member(&creds).is_some());
    }

    #[test]
    fn test_find_member_rejects_partial_word() {
        let mut roster = Roster::new();
        let (boat, owner) = row("7", "GOOD", "Dutchman", "Piet Van Dyke");
        roster.absorb(boat, owner);

        let creds = MemberCredentials {
            hull: "7".into(),
            last_name: "yke".into(),
            email: "piet.van.dyke@example.org".into(),
        };
        assert!(roster.find_member(&creds).is_none());
    }
}
