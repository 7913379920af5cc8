pub mod accounts;
pub mod feed;
pub mod fetched;
pub mod http;
pub mod providers;
pub mod recommendations;
pub mod tagging;
pub mod terms;
pub mod url_check;

pub use fetched::{Absence, Fetched};
