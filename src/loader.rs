use std::collections::HashMap;
use std::path::Path;

use calamine::{Data, Reader, Xlsx, open_workbook};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use tracing::debug;

use crate::boat::{Boat, Owner};
use crate::error::{Result, RosterError};
use crate::roster::Roster;

/// Name of the worksheet holding one row per boat/owner pairing.
pub const BOATS_SHEET: &str = "boats";

/// Columns the `boats` sheet must carry, by header name.
pub const REQUIRED_COLUMNS: [&str; 18] = [
    "hull",
    "date",
    "status",
    "boat_name",
    "sale_link",
    "sailnum",
    "rig",
    "color",
    "engine_type",
    "engine_desc",
    "berth",
    "epitaph",
    "latest_info",
    "owner_name",
    "address1",
    "address2",
    "phone",
    "email",
];

/// Load the roster from an Excel workbook
///
/// Opens the workbook at `path`, reads the `boats` sheet and folds its rows
/// into boats with their ownership history. The file is read fresh on every
/// call.
///
/// # Arguments
/// * `path` - Path to the `.xlsx` roster
///
/// # Returns
/// * `Result<Roster>` - The roster in spreadsheet order, or a load error
///
/// # Examples
/// ```no_run
/// use asoa::loader::load_roster;
///
/// match load_roster("data/asoa-roster.xlsx") {
///     Ok(roster) => println!("{} boats on file", roster.len()),
///     Err(e) => eprintln!("Error loading roster: {}", e),
/// }
/// ```
pub fn load_roster(path: impl AsRef<Path>) -> Result<Roster> {
    let path = path.as_ref();
    let mut workbook: Xlsx<_> = open_workbook(path)?;

    if !workbook.sheet_names().iter().any(|name| name == BOATS_SHEET) {
        return Err(RosterError::MissingSheet(BOATS_SHEET.to_string()));
    }
    let range = workbook.worksheet_range(BOATS_SHEET)?;

    let roster = roster_from_rows(range.rows())?;
    debug!(path = %path.display(), boats = roster.len(), "loaded roster");
    Ok(roster)
}

/// Build a roster from raw sheet rows, the first of which is the header.
///
/// An empty sheet yields an empty roster. Rows without a hull number are
/// skipped.
pub fn roster_from_rows<'a, I>(rows: I) -> Result<Roster>
where
    I: IntoIterator<Item = &'a [Data]>,
{
    let mut rows = rows.into_iter();
    let mut roster = Roster::new();

    let Some(header) = rows.next() else {
        return Ok(roster);
    };

    let mut columns: HashMap<String, usize> = HashMap::new();
    for (idx, cell) in header.iter().enumerate() {
        let name = cell_text(cell);
        if !name.is_empty() {
            columns.entry(name).or_insert(idx);
        }
    }
    for column in REQUIRED_COLUMNS {
        if !columns.contains_key(column) {
            return Err(RosterError::MissingColumn {
                sheet: BOATS_SHEET.to_string(),
                column: column.to_string(),
            });
        }
    }

    for row in rows {
        let cell = |name: &str| columns.get(name).and_then(|&idx| row.get(idx));
        let text = |name: &str| cell(name).map(cell_text).unwrap_or_default();

        let hull = text("hull").trim().to_string();
        if hull.is_empty() {
            continue;
        }
        let date = cell("date").and_then(cell_date);

        let boat = Boat {
            hull: hull.clone(),
            date,
            status: text("status"),
            boat_name: text("boat_name"),
            sale_link: text("sale_link"),
            sailnum: text("sailnum"),
            rig: text("rig"),
            color: text("color"),
            engine_type: text("engine_type"),
            engine_desc: text("engine_desc"),
            berth: text("berth"),
            epitaph: text("epitaph"),
            latest_info: text("latest_info"),
            owners: Vec::new(),
        };
        let owner = Owner {
            hull,
            acquired: date,
            owner_name: text("owner_name"),
            address1: text("address1"),
            address2: text("address2"),
            phone: text("phone"),
            email: text("email"),
        };

        roster.absorb(boat, owner);
    }

    Ok(roster)
}

/// Render a cell as display text.
///
/// Blank, zero, false and error cells are empty. Whole numbers drop their
/// fractional part so hull 12 reads "12", not "12.0".
pub fn cell_text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.clone(),
        Data::Int(0) => String::new(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if *f == 0.0 => String::new(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => (*f as i64).to_string(),
        Data::Float(f) => f.to_string(),
        Data::Bool(true) => "True".to_string(),
        Data::DateTime(_) | Data::DateTimeIso(_) => cell_date(cell)
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default(),
        Data::DurationIso(s) => s.clone(),
        Data::Bool(false) | Data::Error(_) | Data::Empty => String::new(),
    }
}

/// Interpret a cell as a date. Anything that is not a date cell is `None`.
pub fn cell_date(cell: &Data) -> Option<NaiveDateTime> {
    match cell {
        Data::DateTime(dt) => dt.as_datetime(),
        Data::DateTimeIso(s) => NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
            .ok()
            .or_else(|| {
                NaiveDate::parse_from_str(s, "%Y-%m-%d")
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
            }),
        _ => None,
    }
}

/// When the roster file was last changed.
pub fn last_modified(path: impl AsRef<Path>) -> Result<DateTime<Utc>> {
    let modified = std::fs::metadata(path)?.modified()?;
    Ok(DateTime::<Utc>::from(modified))
}
