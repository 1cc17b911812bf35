use serde::Serialize;

/// `part` per hundred `whole`, with a zero `whole` read as one.
///
/// Counts that are not true subsets of their base (a click from a session
/// that never logged a view) produce rates above 100.
pub fn percentage(part: u64, whole: u64) -> f64 {
    part as f64 * 100.0 / whole.max(1) as f64
}

/// Views → clicks → completions, as percentage transitions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Funnel {
    pub views: u64,
    pub clicks: u64,
    pub completions: u64,
    pub view_to_click: f64,
    pub click_to_completion: f64,
    pub overall: f64,
}

pub fn compute_funnel(view_count: u64, click_count: u64, completion_count: u64) -> Funnel {
    Funnel {
        views: view_count,
        clicks: click_count,
        completions: completion_count,
        view_to_click: percentage(click_count, view_count),
        click_to_completion: percentage(completion_count, click_count),
        overall: percentage(completion_count, view_count),
    }
}
