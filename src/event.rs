//! The event generator (§4.1): parses a CSV weight table and samples a
//! weighted-random operation code.
//!
//! Grounded on `original_source/fs_drift/event.py`: `parse_weights`,
//! `normalize_weights` (including its deliberate 1.01x total-weight
//! inflation, so the cumulative-probability walk in `gen_event` can fall
//! through to the last opcode rather than always landing short of 1.0),
//! and `gen_event`'s linear walk over a list sorted by descending weight.

use crate::error::FsDriftError;
use crate::fsop::OpCode;
use rand::Rng;
use rand_xoshiro::Xoshiro256PlusPlus;
use std::collections::HashMap;
use std::path::Path;

/// Total weight is inflated by this factor before normalizing, so the
/// cumulative-probability list never quite reaches 1.0 and `gen_event`
/// exercises its "fall through to the last entry" branch (§9, matching
/// the original's `total_weight *= 1.01`).
const WEIGHT_INFLATION: f64 = 1.01;

/// Read `opname,weight` records from a CSV file. Blank lines, lines
/// starting with `#`, and lines with fewer than two fields are skipped.
pub fn parse_weights(path: &Path) -> Result<HashMap<OpCode, f64>, FsDriftError> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        FsDriftError::WorkloadTable(format!("could not read {}: {e}", path.display()))
    })?;

    let mut weights = HashMap::new();
    for (lineno, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut fields = line.splitn(2, ',');
        let opname = fields.next().unwrap_or("").trim();
        let Some(relweight) = fields.next() else {
            continue;
        };
        let relweight = relweight.trim();

        let opcode = OpCode::from_name(opname).ok_or_else(|| {
            FsDriftError::WorkloadTable(format!(
                "{}:{}: unrecognized opname '{opname}'",
                path.display(),
                lineno + 1
            ))
        })?;
        let weight: f64 = relweight.parse().map_err(|_| {
            FsDriftError::WorkloadTable(format!(
                "{}:{}: relative weight must be a floating-point number",
                path.display(),
                lineno + 1
            ))
        })?;
        if weight < 0.0 {
            return Err(FsDriftError::WorkloadTable(format!(
                "{}:{}: negative weights not allowed",
                path.display(),
                lineno + 1
            )));
        }
        weights.insert(opcode, weight);
    }

    if weights.is_empty() {
        return Err(FsDriftError::WorkloadTable(format!(
            "{}: workload table must not be empty",
            path.display()
        )));
    }

    Ok(weights)
}

/// Normalize raw weights to a cumulative-probability table, sorted by
/// descending weight so `gen_event`'s linear walk usually exits quickly.
pub fn normalize_weights(weights: &HashMap<OpCode, f64>) -> Vec<(OpCode, f64)> {
    let total: f64 = weights.values().sum::<f64>() * WEIGHT_INFLATION;
    let mut sorted: Vec<(OpCode, f64)> = weights.iter().map(|(&k, &v)| (k, v)).collect();
    sorted.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    let mut cumulative = 0.0;
    let mut out = Vec::with_capacity(sorted.len());
    for (opcode, weight) in sorted {
        let probability = weight / total;
        cumulative += probability;
        if cumulative > 1.0 && cumulative < 1.000_001 {
            cumulative = 1.0;
        }
        out.push((opcode, cumulative));
    }
    out
}

/// Walk the cumulative-probability table for a single uniform draw,
/// falling back to the last opcode if the draw lands past every entry
/// (guaranteed possible by the `WEIGHT_INFLATION` factor above).
pub fn gen_event(normalized: &[(OpCode, f64)], rng: &mut Xoshiro256PlusPlus) -> OpCode {
    let r: f64 = rng.gen_range(0.0..1.0);
    let mut last = normalized.last().map(|&(op, _)| op).unwrap_or(OpCode::Read);
    for &(opcode, cumulative_probability) in normalized {
        last = opcode;
        if r < cumulative_probability {
            return opcode;
        }
    }
    last
}

/// Reject a workload table that weights a privileged or mode-gated
/// operation without the matching configuration flag (§9).
pub fn check_gates(
    weights: &HashMap<OpCode, f64>,
    allow_remount: bool,
    raw_device: bool,
) -> Result<(), FsDriftError> {
    if !allow_remount && weights.get(&OpCode::Remount).copied().unwrap_or(0.0) > 0.0 {
        return Err(FsDriftError::Configuration(
            "remount is disabled by default; set allow_remount=true to weight it".into(),
        ));
    }
    if !raw_device && weights.get(&OpCode::RandomDiscard).copied().unwrap_or(0.0) > 0.0 {
        return Err(FsDriftError::Configuration(
            "random_discard requires raw_device=true".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use std::collections::HashMap;

    fn write_csv(dir: &Path, contents: &str) -> std::path::PathBuf {
        let path = dir.join("weights.csv");
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn parses_and_skips_comments_and_blanks() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            dir.path(),
            "# comment\n\ncreate,6\nread, 2\nremount,0.01\n",
        );
        let weights = parse_weights(&path).unwrap();
        assert_eq!(weights.len(), 3);
        assert_eq!(weights[&OpCode::Create], 6.0);
    }

    #[test]
    fn rejects_unknown_opname() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(dir.path(), "bogus,1\n");
        assert!(parse_weights(&path).is_err());
    }

    #[test]
    fn rejects_negative_weight() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(dir.path(), "create,-1\n");
        assert!(parse_weights(&path).is_err());
    }

    #[test]
    fn rejects_empty_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(dir.path(), "# nothing but comments\n");
        assert!(parse_weights(&path).is_err());
    }

    #[test]
    fn normalized_weights_sum_below_one_due_to_inflation() {
        let mut weights = HashMap::new();
        weights.insert(OpCode::Create, 6.0);
        weights.insert(OpCode::Read, 2.0);
        weights.insert(OpCode::Delete, 2.0);
        let normalized = normalize_weights(&weights);
        let last_cumulative = normalized.last().unwrap().1;
        assert!(last_cumulative < 1.0);
        assert!(last_cumulative > 0.99);
    }

    #[test]
    fn normalized_weights_sorted_descending() {
        let mut weights = HashMap::new();
        weights.insert(OpCode::Create, 1.0);
        weights.insert(OpCode::Read, 6.0);
        weights.insert(OpCode::Delete, 3.0);
        let normalized = normalize_weights(&weights);
        assert_eq!(normalized[0].0, OpCode::Read);
        assert_eq!(normalized[1].0, OpCode::Delete);
        assert_eq!(normalized[2].0, OpCode::Create);
    }

    #[test]
    fn gen_event_can_fall_through_to_last_opcode() {
        let mut weights = HashMap::new();
        weights.insert(OpCode::Create, 1.0);
        let normalized = normalize_weights(&weights);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(1);
        // Every draw should resolve to Create since it's the only opcode.
        for _ in 0..100 {
            assert_eq!(gen_event(&normalized, &mut rng), OpCode::Create);
        }
    }

    #[test]
    fn gen_event_distribution_matches_weights_roughly() {
        let mut weights = HashMap::new();
        weights.insert(OpCode::Create, 3.0);
        weights.insert(OpCode::Read, 1.0);
        let normalized = normalize_weights(&weights);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);
        let mut create_count = 0;
        let trials = 10_000;
        for _ in 0..trials {
            if gen_event(&normalized, &mut rng) == OpCode::Create {
                create_count += 1;
            }
        }
        let ratio = create_count as f64 / trials as f64;
        assert!((ratio - 0.75).abs() < 0.05, "ratio was {ratio}");
    }

    #[test]
    fn check_gates_rejects_remount_without_allow() {
        let mut weights = HashMap::new();
        weights.insert(OpCode::Remount, 0.1);
        assert!(check_gates(&weights, false, false).is_err());
        assert!(check_gates(&weights, true, false).is_ok());
    }

    #[test]
    fn check_gates_rejects_discard_without_raw_device() {
        let mut weights = HashMap::new();
        weights.insert(OpCode::RandomDiscard, 0.1);
        assert!(check_gates(&weights, false, false).is_err());
        assert!(check_gates(&weights, false, true).is_ok());
    }
}
