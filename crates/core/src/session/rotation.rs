//! Random notification selection for display rotation.

use rand::Rng;
use rand::seq::IndexedRandom;

use crate::types::{Notification, NotificationId};

/// Pick a notification uniformly at random, avoiding `exclude` when possible.
///
/// - An empty candidate list yields `None`.
/// - A single candidate is always returned, excluded or not.
/// - Otherwise the draw is made from the candidates whose ID differs from
///   `exclude`. If that leaves nothing (every candidate carries the excluded
///   ID) the draw falls back to the full list, so selection always terminates.
pub fn pick_notification<'a, R>(
    candidates: &'a [Notification],
    exclude: Option<NotificationId>,
    rng: &mut R,
) -> Option<&'a Notification>
where
    R: Rng + ?Sized,
{
    match candidates {
        [] => None,
        [only] => Some(only),
        _ => {
            let eligible: Vec<&Notification> = candidates
                .iter()
                .filter(|n| exclude != Some(n.id))
                .collect();
            if eligible.is_empty() {
                candidates.choose(rng)
            } else {
                eligible.choose(rng).copied()
            }
        }
    }
}
