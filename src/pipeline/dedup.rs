use std::collections::HashMap;

use crate::models::{MergedDetection, RawDetection};

/// Collapse detections sharing a payload
///
/// The key is the decoded text alone: the same text read as two different
/// symbologies yields one entry. Entries keep first-occurrence order, their
/// fields come from the lowest Block index and their tags accumulate.
pub fn merge(raw: &[RawDetection]) -> Vec<MergedDetection> {
    let mut index: HashMap<&str, usize> = HashMap::with_capacity(raw.len());
    let mut merged: Vec<MergedDetection> = Vec::with_capacity(raw.len());

    for detection in raw {
        match index.get(detection.payload.as_str()) {
            Some(&slot) => merged[slot].absorb(detection),
            None => {
                index.insert(detection.payload.as_str(), merged.len());
                merged.push(MergedDetection::new(detection.clone()));
            }
        }
    }

    merged
}
