/*!
# ASOA Seabreeze Roster

The membership directory of the Alberg Seabreeze Owners Association, served
from a single Excel workbook.

## Overview

The association keeps its roster as a spreadsheet with one row per
boat/owner pairing. This crate turns that sheet into boats with their
ownership history, serves it as a browsable and searchable website, and
gives logged-in members a formatted export of the current owners.

## Architecture

### Data Layer
- **loader**: reads the `boats` sheet with calamine and folds rows into boats.
  Rows for the same hull stack their owners newest-first; later non-empty
  fields win.
- **roster**: the boats in spreadsheet order, hull lookup and a linear
  substring search over boat names, berths and owners.
- **boat**: the record types and the fuzzy date display rules (1 July means
  "that year", the 1st means "that month").

### Export
- **downloader**: rebuilds a `members` sheet with rust_xlsxwriter: bold frozen
  header, centered hulls, date-formatted acquisition dates.

### Web Layer (feature `web`)
- **app**: axum routes for the start page, list, detail, search and the
  member export.
- **login**: member sessions. A member proves themselves with hull number,
  last name and email, all checked against the current owner.
- **pages**: embedded Handlebars templates and the globals every page sees.

The workbook is re-read on every request, so pages always reflect the file
on disk.

## Routes

- `/` - Start page
- `/list` - Every known boat
- `/detail/{hull}` - One boat and its owners
- `/search?q=` - Hull number jump or text search
- `/login`, `/logout` - Member session (members mode)
- `/download/members` - Member export (members mode, logged in)
- `/health` - Liveness check
*/

pub mod boat;
pub mod config;
pub mod downloader;
pub mod error;
pub mod loader;
pub mod roster;

#[cfg(feature = "web")]
pub mod app;
#[cfg(feature = "web")]
pub mod login;
#[cfg(feature = "web")]
pub mod pages;

pub use boat::{Boat, Owner};
pub use config::{AccessMode, Config};
pub use error::RosterError;
pub use roster::{MemberCredentials, Roster};
