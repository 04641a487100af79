//! Model output parsing
//!
//! The model is asked for bare JSON but, with search grounding on, it often
//! wraps the object in prose or a markdown fence. Two strategies:
//! 1. Direct `serde_json` deserialization
//! 2. The span from the first `{` to the last `}`

use regex::Regex;
use tracing::debug;

use super::CoachError;
use crate::domain::{Guidance, assign_ids};

/// Parse raw model text into guidance with batch-ready tasks
///
/// Tasks get unique ids and start out pending regardless of what the model
/// claimed.
pub fn parse_guidance(raw: &str) -> Result<Guidance, CoachError> {
    debug!(raw_len = raw.len(), "parse_guidance: called");
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CoachError::EmptyResponse);
    }

    let mut guidance = match serde_json::from_str::<Guidance>(trimmed) {
        Ok(g) => g,
        Err(direct) => {
            debug!(error = %direct, "parse_guidance: direct parse failed, extracting object");
            let span = extract_object(trimmed)?.ok_or_else(|| CoachError::Parse(direct.to_string()))?;
            serde_json::from_str::<Guidance>(span).map_err(|e| CoachError::Parse(e.to_string()))?
        }
    };

    assign_ids(&mut guidance.tasks);
    for task in &mut guidance.tasks {
        task.completed = false;
    }

    Ok(guidance)
}

/// Outermost `{ ... }` span, if any
fn extract_object(text: &str) -> Result<Option<&str>, CoachError> {
    let re = Regex::new(r"\{[\s\S]*\}").map_err(|e| CoachError::Parse(e.to_string()))?;
    Ok(re.find(text).map(|m| m.as_str()))
}
