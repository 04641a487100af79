//! Task ID generation
//!
//! IDs are 9-character lowercase base36 strings, unique within a batch.
//! Model-supplied ids are kept when they look intentional (longer than two
//! characters) and are not already taken.

use rand::Rng;
use std::collections::HashSet;
use tracing::debug;

use super::task::Task;

/// Length of generated ids
pub const ID_LEN: usize = 9;

/// Model ids this short are treated as placeholders ("1", "t2")
const MIN_KEPT_ID_LEN: usize = 3;

const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Generate a random base36 id
pub fn generate_id() -> String {
    let mut rng = rand::rng();
    (0..ID_LEN)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Give every task an id that is unique within the slice
pub fn assign_ids(tasks: &mut [Task]) {
    let mut seen = HashSet::new();

    for task in tasks.iter_mut() {
        let keep = task.id.trim().len() >= MIN_KEPT_ID_LEN && !seen.contains(task.id.trim());
        if keep {
            task.id = task.id.trim().to_string();
        } else {
            let mut id = generate_id();
            while seen.contains(&id) {
                id = generate_id();
            }
            debug!(old = %task.id, new = %id, "assign_ids: replaced id");
            task.id = id;
        }
        seen.insert(task.id.clone());
    }
}
