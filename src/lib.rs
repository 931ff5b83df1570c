//! # Mangashelf
//!
//! A minimal HTTP server for reading manga off your filesystem. Your
//! directory tree is the database: subdirectories of the root are chapters,
//! image files inside them are pages. The server enumerates them fresh on
//! every request, sorts them the way a human expects (`page2.jpg` before
//! `page10.jpg`), and hands the bytes over a static file route.
//!
//! ```text
//! manga/
//! ├── ch1/
//! │   ├── 1.png
//! │   └── 2.jpg
//! └── ch2/
//!     ├── page1.jpg
//!     ├── page2.jpg
//!     └── page10.jpg
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | Immutable [`config::ServerConfig`] — root directory, bind address, port, allowed extensions |
//! | [`natural`] | Pure natural-sort comparator shared by both listers |
//! | [`scan`] | The chapter and page listers: enumerate, classify, filter, sort |
//! | [`serve`] | axum router, JSON handlers, static media service, error mapping |
//!
//! # Design Decisions
//!
//! ## No Cache, No Database
//!
//! Every listing is a fresh read of the filesystem. Dropping a new chapter
//! directory into the root makes it appear on the next request — no rescan
//! command, no invalidation, no state to corrupt. Directory listings of a
//! few hundred entries are far cheaper than the image transfers they sit
//! next to, so caching would buy nothing and cost correctness.
//!
//! ## Opaque Scan Errors
//!
//! Clients get exactly two failure messages, "Unable to scan chapters" and
//! "Unable to scan pages". Whether the cause was a missing directory, a
//! permission problem, or a dying disk is a server-side concern; it goes to
//! the log, not over the wire.
//!
//! ## Chapter Names Are Hostile Input
//!
//! The chapter segment of the URL is joined onto a filesystem path, which is
//! exactly the place path traversal bugs live. [`scan::list_pages`] accepts
//! only a single normal path component and then verifies the canonicalized
//! result is still strictly inside the root, so `../../etc` and escaping
//! symlinks both get a 400 instead of a directory listing.

pub mod config;
pub mod natural;
pub mod scan;
pub mod serve;
