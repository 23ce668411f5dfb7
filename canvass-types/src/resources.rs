use std::fmt::Display;
use std::hash::Hash;

/// A record managed by the WARD backend and rendered in a dashboard list.
///
/// The backend owns the identifiers; client code only ever reads them.
/// `search_terms` returns the fields a free-text search is matched against,
/// which differ per resource (name, venue, category, status, ...).
pub trait Record: Clone {
    type Id: Copy + Eq + Hash + Display + Send + Sync;

    fn id(&self) -> Self::Id;

    fn search_terms(&self) -> Vec<&str>;
}
