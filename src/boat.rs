use chrono::{Datelike, NaiveDateTime};
use serde::{Serialize, Serializer};

/// Statuses under which a roster row names a real owner. Rows with any
/// other status (SUNK, LOST, UNKNOWN, ...) only update the boat itself.
pub const OWNED_STATUSES: [&str; 2] = ["GOOD", "RENO"];

/// One owner of a boat, as recorded on a single roster row.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Owner {
    pub hull: String,

    /// When this owner acquired the boat. Serialized fuzzy-formatted.
    #[serde(serialize_with = "serialize_fuzzy")]
    pub acquired: Option<NaiveDateTime>,

    pub owner_name: String,
    pub address1: String,
    pub address2: String,
    pub phone: String,
    pub email: String,
}

/// A boat with its ownership history, newest owner first.
///
/// Text fields are empty strings when the roster has nothing for them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Boat {
    pub hull: String,

    /// Date of the most recent dated row for this hull.
    #[serde(serialize_with = "serialize_fuzzy")]
    pub date: Option<NaiveDateTime>,

    pub status: String,
    pub boat_name: String,
    pub sale_link: String,
    pub sailnum: String,
    pub rig: String,
    pub color: String,
    pub engine_type: String,
    pub engine_desc: String,
    pub berth: String,
    pub epitaph: String,
    pub latest_info: String,

    pub owners: Vec<Owner>,
}

impl Boat {
    /// The current owner, if the boat has one on record.
    pub fn current_owner(&self) -> Option<&Owner> {
        self.owners.first()
    }

    /// Whether the row this boat came from names an owner.
    pub fn has_owned_status(&self) -> bool {
        OWNED_STATUSES.contains(&self.status.trim())
    }

    /// Fold a later roster row for the same hull into this boat.
    ///
    /// Every non-empty field of `newer` replaces ours; the owner history is
    /// left alone and maintained by the loader.
    pub fn merge_newer(&mut self, newer: Boat) {
        fn take(dst: &mut String, src: String) {
            if !src.is_empty() {
                *dst = src;
            }
        }

        take(&mut self.hull, newer.hull);
        if newer.date.is_some() {
            self.date = newer.date;
        }
        take(&mut self.status, newer.status);
        take(&mut self.boat_name, newer.boat_name);
        take(&mut self.sale_link, newer.sale_link);
        take(&mut self.sailnum, newer.sailnum);
        take(&mut self.rig, newer.rig);
        take(&mut self.color, newer.color);
        take(&mut self.engine_type, newer.engine_type);
        take(&mut self.engine_desc, newer.engine_desc);
        take(&mut self.berth, newer.berth);
        take(&mut self.epitaph, newer.epitaph);
        take(&mut self.latest_info, newer.latest_info);
    }

    /// Text the search box matches against: boat name, berth and every
    /// owner name on record, lowercased.
    pub fn search_text(&self) -> String {
        let mut parts = vec![self.boat_name.as_str(), self.berth.as_str()];
        parts.extend(self.owners.iter().map(|o| o.owner_name.as_str()));
        parts.join(" ").to_lowercase()
    }
}

/// Format a roster date with only as much precision as the data has.
///
/// The roster uses 1 July to mean "sometime that year" and the first of a
/// month to mean "sometime that month".
pub fn fuzzy_date(date: &NaiveDateTime) -> String {
    match (date.month(), date.day()) {
        (7, 1) => date.format("%Y").to_string(),
        (month, 1) => format!("{}/{}", month, date.year()),
        (month, day) => format!("{}/{}/{}", month, day, date.year()),
    }
}

fn serialize_fuzzy<S>(date: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match date {
        Some(date) => serializer.serialize_str(&fuzzy_date(date)),
        None => serializer.serialize_str(""),
    }
}
