pub mod domain;
pub mod url_state;

pub use url_state::{Location, QueryParameters, UrlState};
