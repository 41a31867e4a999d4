//! # Track Selection
//!
//! Keeps the engine's latest track groups together with the derived
//! "what is playing per track type" view, and builds selection overrides.

use bridge_traits::{TrackFormat, TrackGroup, TrackSelectionOverride, TrackSelectionParameters, TrackType};
use std::collections::BTreeMap;

/// Projection from track groups to the selected track of each type.
///
/// For every type the first group flagged as selected is used. Inside it the
/// first track reporting `selected` wins; when none does, track 0 is used.
/// Empty groups contribute nothing.
pub fn selected_by_type(groups: &[TrackGroup]) -> BTreeMap<TrackType, TrackFormat> {
    let mut selected = BTreeMap::new();

    for group in groups.iter().filter(|g| g.selected && !g.is_empty()) {
        if selected.contains_key(&group.track_type) {
            continue;
        }

        let index = group
            .tracks
            .iter()
            .position(|track| track.selected)
            .unwrap_or(0);

        if let Some(format) = group.track_format(index) {
            selected.insert(group.track_type, format.clone());
        }
    }

    selected
}

/// Track index outside the group's bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackIndexOutOfRange {
    pub index: usize,
    pub len: usize,
}

/// Latest track groups plus the derived selection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackSelectionTable {
    groups: Vec<TrackGroup>,
    selected: BTreeMap<TrackType, TrackFormat>,
}

impl TrackSelectionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the groups and recomputes the selection.
    pub fn update(&mut self, groups: Vec<TrackGroup>) {
        self.selected = selected_by_type(&groups);
        self.groups = groups;
    }

    pub fn clear(&mut self) {
        self.groups.clear();
        self.selected.clear();
    }

    pub fn groups(&self) -> &[TrackGroup] {
        &self.groups
    }

    pub fn selected(&self) -> &BTreeMap<TrackType, TrackFormat> {
        &self.selected
    }

    /// Merges an override for `group`/`track_index` into `current`.
    ///
    /// Only the override of the group's track type is replaced.
    pub fn override_parameters(
        current: TrackSelectionParameters,
        group: &TrackGroup,
        track_index: usize,
    ) -> Result<TrackSelectionParameters, TrackIndexOutOfRange> {
        if track_index >= group.len() {
            return Err(TrackIndexOutOfRange {
                index: track_index,
                len: group.len(),
            });
        }

        Ok(current.with_override_for_type(TrackSelectionOverride::new(group, track_index)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::{TrackGroupId, TrackInfo};

    fn track(label: &str, selected: bool) -> TrackInfo {
        TrackInfo {
            format: TrackFormat {
                label: Some(label.to_string()),
                ..Default::default()
            },
            supported: true,
            selected,
        }
    }

    fn group(id: &str, track_type: TrackType, selected: bool, tracks: Vec<TrackInfo>) -> TrackGroup {
        TrackGroup {
            id: TrackGroupId::new(id),
            track_type,
            selected,
            tracks,
        }
    }

    fn label(map: &BTreeMap<TrackType, TrackFormat>, track_type: TrackType) -> Option<&str> {
        map.get(&track_type).and_then(|f| f.label.as_deref())
    }

    #[test]
    fn test_first_selected_track_wins() {
        let groups = vec![group(
            "a",
            TrackType::Audio,
            true,
            vec![track("en", false), track("de", true), track("fr", true)],
        )];

        assert_eq!(label(&selected_by_type(&groups), TrackType::Audio), Some("de"));
    }

    #[test]
    fn test_defaults_to_index_zero() {
        let groups = vec![group(
            "v",
            TrackType::Video,
            true,
            vec![track("1080p", false), track("720p", false)],
        )];

        assert_eq!(label(&selected_by_type(&groups), TrackType::Video), Some("1080p"));
    }

    #[test]
    fn test_first_selected_group_per_type() {
        let groups = vec![
            group("a0", TrackType::Audio, false, vec![track("unselected", true)]),
            group("a1", TrackType::Audio, true, vec![track("first", false)]),
            group("a2", TrackType::Audio, true, vec![track("second", true)]),
            group("t0", TrackType::Text, true, vec![track("subs", true)]),
        ];

        let selected = selected_by_type(&groups);
        assert_eq!(selected.len(), 2);
        assert_eq!(label(&selected, TrackType::Audio), Some("first"));
        assert_eq!(label(&selected, TrackType::Text), Some("subs"));
    }

    #[test]
    fn test_empty_groups_contribute_nothing() {
        let groups = vec![
            group("empty", TrackType::Audio, true, vec![]),
            group("real", TrackType::Audio, true, vec![track("en", true)]),
        ];

        assert_eq!(label(&selected_by_type(&groups), TrackType::Audio), Some("en"));
        assert!(selected_by_type(&[group("e", TrackType::Text, true, vec![])]).is_empty());
    }

    #[test]
    fn test_table_update_and_clear() {
        let mut table = TrackSelectionTable::new();
        table.update(vec![group("v", TrackType::Video, true, vec![track("hd", true)])]);
        assert_eq!(table.groups().len(), 1);
        assert_eq!(label(table.selected(), TrackType::Video), Some("hd"));

        table.clear();
        assert!(table.groups().is_empty());
        assert!(table.selected().is_empty());
    }

    #[test]
    fn test_override_replaces_only_same_type() {
        let audio = group("a", TrackType::Audio, true, vec![track("en", true), track("de", false)]);
        let text = group("t", TrackType::Text, true, vec![track("subs", false)]);

        let params = TrackSelectionParameters::default();
        let params = TrackSelectionTable::override_parameters(params, &text, 0).unwrap();
        let params = TrackSelectionTable::override_parameters(params, &audio, 0).unwrap();
        let params = TrackSelectionTable::override_parameters(params, &audio, 1).unwrap();

        assert_eq!(params.overrides.len(), 2);
        assert_eq!(
            params.override_for(TrackType::Audio).unwrap().track_indices,
            vec![1]
        );
        assert_eq!(
            params.override_for(TrackType::Text).unwrap().group_id,
            TrackGroupId::new("t")
        );
    }

    #[test]
    fn test_override_rejects_out_of_range() {
        let audio = group("a", TrackType::Audio, true, vec![track("en", true)]);
        let result =
            TrackSelectionTable::override_parameters(TrackSelectionParameters::default(), &audio, 3);

        assert_eq!(result, Err(TrackIndexOutOfRange { index: 3, len: 1 }));
    }
}
