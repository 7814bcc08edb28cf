//! Canonical dashboard URLs. Every page builds its URL state here so links,
//! redirects and persisted state agree on one shape.

use shared::url_state::{encode_path_segment, Location, QueryParameters, UrlState};

pub const CONSOLE_LOGS_BASE_PATH: &str = "consolelogs";
pub const METRICS_BASE_PATH: &str = "metrics";
pub const STRUCTURED_LOGS_BASE_PATH: &str = "structuredlogs";

const RESOURCE_SEGMENT: &str = "resource";

pub fn console_logs_url(resource: Option<&str>) -> UrlState {
    UrlState::path_only(page_path(CONSOLE_LOGS_BASE_PATH, resource))
}

pub fn metrics_url(
    resource: Option<&str>,
    meter: Option<&str>,
    instrument: Option<&str>,
    duration_minutes: Option<u32>,
    view: Option<&str>,
) -> UrlState {
    let query = QueryParameters::new()
        .with("meter", meter.map(str::to_string))
        .with("instrument", instrument.map(str::to_string))
        .with("duration", duration_minutes.map(|d| d.to_string()))
        .with("view", view.map(str::to_string));
    UrlState::new(page_path(METRICS_BASE_PATH, resource), Some(query))
}

pub fn structured_logs_url(
    resource: Option<&str>,
    log_level: Option<&str>,
    filter: Option<&str>,
) -> UrlState {
    let query = QueryParameters::new()
        .with("logLevel", log_level.map(str::to_string))
        .with("filter", filter.map(str::to_string));
    UrlState::new(page_path(STRUCTURED_LOGS_BASE_PATH, resource), Some(query))
}

/// Resource name from `{base}/resource/{name}`.
pub fn resource_from_location(location: &Location, base_path: &str) -> Option<String> {
    let segments = location.path_segments();
    match segments.as_slice() {
        [base, marker, name, ..]
            if base.eq_ignore_ascii_case(base_path) && marker == RESOURCE_SEGMENT =>
        {
            Some(name.clone())
        }
        _ => None,
    }
}

fn page_path(base_path: &str, resource: Option<&str>) -> String {
    match resource {
        Some(name) => format!(
            "{base_path}/{RESOURCE_SEGMENT}/{}",
            encode_path_segment(name)
        ),
        None => base_path.to_string(),
    }
}
