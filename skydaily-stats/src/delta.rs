use crate::snapshot::Snapshot;

/// Difference between today's snapshot and the previous archive entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Delta {
    pub users: i64,
    pub likes: i64,
    pub elapsed_secs: i64,
    /// Likes per second over `elapsed_secs`; `None` unless time moved forward.
    pub growth_rate: Option<f64>,
}

/// Pure: no previous entry means no delta.
pub fn compute_delta(current: &Snapshot, previous: Option<&Snapshot>) -> Option<Delta> {
    let previous = previous?;
    let users = current.users().saturating_sub(previous.users());
    let likes = current.likes().saturating_sub(previous.likes());
    let elapsed_secs = (current.captured_at() - previous.captured_at()).num_seconds();
    let growth_rate = (elapsed_secs > 0).then(|| likes as f64 / elapsed_secs as f64);

    Some(Delta {
        users,
        likes,
        elapsed_secs,
        growth_rate,
    })
}
