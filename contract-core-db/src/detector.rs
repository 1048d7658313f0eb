//! Field-level change detection.
//!
//! A pure function over two immutable snapshots. The caller (the mutation
//! gate) captures the before/after state explicitly; there is no hidden
//! "changed fields" instance state.

use contract_core_api::{ChangeKind, FieldDelta, FieldSnapshot};

/// Compute the field deltas to record for one mutation.
///
/// - `Create`/`Delete`: one synthetic whole-entity delta, no values. The
///   full new/old state lives on the entity itself and is not duplicated
///   into the log.
/// - `Update`: one delta per tracked field whose value actually changed.
///   The tracked set is the key set of `previous` (snapshots already
///   exclude bookkeeping fields); keys present only in `next` are ignored,
///   not an error. A null-to-value or value-to-null transition is a
///   change, with the null side rendered as an absent value.
///
/// Never fails on valid inputs. Output order follows the snapshot's key
/// order, so it is deterministic.
pub fn detect(previous: &FieldSnapshot, next: &FieldSnapshot, kind: ChangeKind) -> Vec<FieldDelta> {
    match kind {
        ChangeKind::Create | ChangeKind::Delete => vec![FieldDelta::whole_entity()],
        ChangeKind::Update => previous
            .iter()
            .filter_map(|(field_name, old)| {
                let new = next.get(field_name)?;
                if old == new {
                    return None;
                }
                Some(FieldDelta {
                    field_name: field_name.clone(),
                    old_value: old.render(),
                    new_value: new.render(),
                })
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use contract_core_api::{FieldValue, WHOLE_ENTITY_FIELD};
    use rust_decimal::Decimal;

    fn snapshot(fields: &[(&str, FieldValue)]) -> FieldSnapshot {
        fields
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn create_produces_a_single_whole_entity_delta() {
        let state = snapshot(&[("title", "Draft A".into())]);
        let deltas = detect(&FieldSnapshot::new(), &state, ChangeKind::Create);
        assert_eq!(deltas, vec![FieldDelta::whole_entity()]);
        assert_eq!(deltas[0].field_name, WHOLE_ENTITY_FIELD);
    }

    #[test]
    fn delete_produces_a_single_whole_entity_delta() {
        let state = snapshot(&[("title", "Draft A".into())]);
        let deltas = detect(&state, &FieldSnapshot::new(), ChangeKind::Delete);
        assert_eq!(deltas, vec![FieldDelta::whole_entity()]);
    }

    #[test]
    fn update_emits_one_delta_per_changed_field_only() {
        let previous = snapshot(&[
            ("a", "1".into()),
            ("b", "2".into()),
            ("c", "3".into()),
        ]);
        let next = snapshot(&[
            ("a", "10".into()),
            ("b", "20".into()),
            ("c", "3".into()),
        ]);

        let deltas = detect(&previous, &next, ChangeKind::Update);
        assert_eq!(deltas.len(), 2);
        assert_eq!(deltas[0].field_name, "a");
        assert_eq!(deltas[0].old_value.as_deref(), Some("1"));
        assert_eq!(deltas[0].new_value.as_deref(), Some("10"));
        assert_eq!(deltas[1].field_name, "b");
        assert!(deltas.iter().all(|d| d.field_name != "c"));
    }

    #[test]
    fn identical_snapshots_emit_nothing() {
        let state = snapshot(&[("title", "Draft A".into()), ("active", true.into())]);
        assert!(detect(&state, &state.clone(), ChangeKind::Update).is_empty());
    }

    #[test]
    fn null_transitions_are_changes_with_an_absent_side() {
        let previous = snapshot(&[("description", FieldValue::Null)]);
        let next = snapshot(&[("description", "filled in".into())]);

        let deltas = detect(&previous, &next, ChangeKind::Update);
        assert_eq!(deltas.len(), 1);
        assert_eq!(deltas[0].old_value, None);
        assert_eq!(deltas[0].new_value.as_deref(), Some("filled in"));

        let back = detect(&next, &previous, ChangeKind::Update);
        assert_eq!(back[0].old_value.as_deref(), Some("filled in"));
        assert_eq!(back[0].new_value, None);
    }

    #[test]
    fn null_is_not_the_empty_string() {
        let previous = snapshot(&[("description", FieldValue::Null)]);
        let next = snapshot(&[("description", "".into())]);

        let deltas = detect(&previous, &next, ChangeKind::Update);
        assert_eq!(deltas.len(), 1);
        assert_eq!(deltas[0].old_value, None);
        assert_eq!(deltas[0].new_value.as_deref(), Some(""));
    }

    #[test]
    fn dates_compare_by_instant() {
        let instant = Utc.with_ymd_and_hms(2024, 6, 1, 13, 0, 0).unwrap();
        let previous = snapshot(&[("start_date", instant.into())]);
        // Same instant reconstructed through a different representation.
        let reparsed = Utc.timestamp_opt(instant.timestamp(), 0).unwrap();
        let next = snapshot(&[("start_date", reparsed.into())]);

        assert!(detect(&previous, &next, ChangeKind::Update).is_empty());
    }

    #[test]
    fn decimals_compare_numerically() {
        let previous = snapshot(&[("value", FieldValue::Decimal("1200.5".parse::<Decimal>().unwrap()))]);
        let next = snapshot(&[("value", FieldValue::Decimal("1200.50".parse::<Decimal>().unwrap()))]);

        assert!(detect(&previous, &next, ChangeKind::Update).is_empty());
    }

    #[test]
    fn fields_only_in_next_are_ignored() {
        let previous = snapshot(&[("title", "Draft A".into())]);
        let next = snapshot(&[("title", "Draft A".into()), ("intruder", "x".into())]);

        assert!(detect(&previous, &next, ChangeKind::Update).is_empty());
    }
}
