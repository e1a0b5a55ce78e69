use chrono::{DateTime, Utc};
use rust_xlsxwriter::{Format, FormatAlign, Workbook, Worksheet};

use crate::boat::{Boat, Owner};
use crate::error::Result;
use crate::roster::Roster;

/// MIME type of the member export.
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Columns of the member export, left to right.
pub const EXPORT_FIELDS: [&str; 14] = [
    "hull",
    "boat_name",
    "status",
    "sailnum",
    "rig",
    "owner_name",
    "acquired",
    "address1",
    "address2",
    "phone",
    "email",
    "berth",
    "latest_info",
    "epitaph",
];

const BASE_WIDTH: f64 = 10.0;

/// Width multipliers for the columns that usually hold longer text.
const WIDE_COLUMNS: [(&str, f64); 8] = [
    ("boat_name", 2.0),
    ("owner_name", 2.5),
    ("address1", 2.0),
    ("address2", 2.0),
    ("email", 2.0),
    ("berth", 2.0),
    ("phone", 1.5),
    ("acquired", 1.25),
];

/// Convert the roster to the member export workbook
///
/// Writes one row per boat with its current owner's contact details into a
/// sheet named `members`, with a bold frozen header row, centered hull
/// numbers and real date cells for the acquisition date.
///
/// # Arguments
/// * `roster` - The roster to export
///
/// # Returns
/// * `Result<Vec<u8>>` - XLSX file content as bytes or an error
///
/// # Examples
/// ```no_run
/// use asoa::loader::load_roster;
/// use asoa::downloader::to_xlsx;
///
/// let roster = load_roster("data/asoa-roster.xlsx").unwrap();
/// match to_xlsx(&roster) {
///     Ok(xlsx_data) => println!("XLSX generated: {} bytes", xlsx_data.len()),
///     Err(e) => eprintln!("Failed to generate XLSX: {}", e),
/// }
/// ```
pub fn to_xlsx(roster: &Roster) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name("members")?;

    write_header(worksheet)?;

    let centered = Format::new().set_align(FormatAlign::Center);
    let date_format = Format::new().set_num_format("m/d/yyyy;@");
    let blank_owner = Owner::default();

    for (idx, boat) in roster.iter().enumerate() {
        let row = (idx + 1) as u32;
        let owner = boat.current_owner().unwrap_or(&blank_owner);

        for (col, field) in EXPORT_FIELDS.iter().enumerate() {
            let col = col as u16;
            match *field {
                "hull" => match numeric_hull(&boat.hull) {
                    Some(n) => worksheet.write_number_with_format(row, col, n as f64, &centered)?,
                    None => worksheet.write_string_with_format(row, col, &boat.hull, &centered)?,
                },
                "acquired" => match &owner.acquired {
                    Some(date) => worksheet.write_datetime_with_format(row, col, date, &date_format)?,
                    None => worksheet.write_blank(row, col, &date_format)?,
                },
                other => {
                    let value = field_value(boat, owner, other);
                    if value.is_empty() {
                        continue;
                    }
                    worksheet.write_string(row, col, value)?
                }
            };
        }
    }

    for (col, field) in EXPORT_FIELDS.iter().enumerate() {
        worksheet.set_column_width(col as u16, column_width(field))?;
    }
    worksheet.set_freeze_panes(1, 0)?;

    Ok(workbook.save_to_buffer()?)
}

/// Download name for an export of a roster last changed at `modified`.
pub fn export_filename(modified: &DateTime<Utc>) -> String {
    format!("asoa-members-{}.xlsx", modified.format("%Y-%m-%d"))
}

fn write_header(worksheet: &mut Worksheet) -> Result<()> {
    let bold = Format::new().set_bold();
    let bold_centered = Format::new().set_bold().set_align(FormatAlign::Center);

    for (col, field) in EXPORT_FIELDS.iter().enumerate() {
        let format = if *field == "hull" { &bold_centered } else { &bold };
        worksheet.write_string_with_format(0, col as u16, *field, format)?;
    }
    Ok(())
}

fn field_value<'a>(boat: &'a Boat, owner: &'a Owner, field: &str) -> &'a str {
    match field {
        "boat_name" => &boat.boat_name,
        "status" => &boat.status,
        "sailnum" => &boat.sailnum,
        "rig" => &boat.rig,
        "owner_name" => &owner.owner_name,
        "address1" => &owner.address1,
        "address2" => &owner.address2,
        "phone" => &owner.phone,
        "email" => &owner.email,
        "berth" => &boat.berth,
        "latest_info" => &boat.latest_info,
        "epitaph" => &boat.epitaph,
        _ => "",
    }
}

/// Plain integer hulls become number cells. Anything that would not read
/// back the same ("007", "1e3", "inf") stays text.
fn numeric_hull(hull: &str) -> Option<i64> {
    hull.parse::<i64>().ok().filter(|n| n.to_string() == hull)
}

fn column_width(field: &str) -> f64 {
    WIDE_COLUMNS
        .iter()
        .find(|(name, _)| *name == field)
        .map(|(_, factor)| BASE_WIDTH * factor)
        .unwrap_or(BASE_WIDTH)
}
