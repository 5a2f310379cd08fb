//! Track catalog and selection cursor

use serde::Deserialize;

/// One catalog entry: metadata plus the URL of the playable media.
///
/// Records are immutable after the catalog is loaded; a re-fetch replaces
/// the whole catalog rather than mutating entries in place.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct TrackRecord {
    pub id: String,
    pub name: String,
    pub artist: String,
    #[serde(rename = "cover")]
    pub cover_url: String,
    #[serde(rename = "url")]
    pub media_url: String,
}

/// Ordered sequence of tracks, insertion order = fetch order.
#[derive(Clone, Debug, Default)]
pub struct TrackCatalog {
    tracks: Vec<TrackRecord>,
}

impl TrackCatalog {
    pub fn new(tracks: Vec<TrackRecord>) -> Self {
        Self { tracks }
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&TrackRecord> {
        self.tracks.get(index)
    }

    pub fn tracks(&self) -> &[TrackRecord] {
        &self.tracks
    }

    /// Catalog indices of tracks whose name or artist contains `query`
    /// (case-insensitive). An empty query matches everything. The returned
    /// indices point into the unfiltered catalog, so selecting a filtered
    /// row resolves to the right underlying record.
    pub fn filtered_indices(&self, query: &str) -> Vec<usize> {
        if query.is_empty() {
            return (0..self.tracks.len()).collect();
        }
        let needle = query.to_lowercase();
        self.tracks
            .iter()
            .enumerate()
            .filter(|(_, t)| {
                t.name.to_lowercase().contains(&needle)
                    || t.artist.to_lowercase().contains(&needle)
            })
            .map(|(i, _)| i)
            .collect()
    }
}

/// Index of the currently selected track. `None` while the catalog is empty.
///
/// Cursor changes are the only trigger for a playback rebind, so every
/// mutator reports whether the cursor actually moved.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SelectionCursor {
    index: Option<usize>,
}

impl SelectionCursor {
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn clear(&mut self) {
        self.index = None;
    }

    /// Set the cursor to `i`. Out-of-range values are ignored: displayed
    /// lists may be filtered, and a stale index must not corrupt the cursor.
    pub fn select(&mut self, i: usize, len: usize) -> bool {
        if i >= len {
            tracing::warn!(index = i, len, "Ignoring out-of-range selection");
            return false;
        }
        let changed = self.index != Some(i);
        self.index = Some(i);
        changed
    }

    /// Advance, wrapping to the first track after the last.
    pub fn next(&mut self, len: usize) -> bool {
        if len == 0 {
            return false;
        }
        let next = match self.index {
            Some(i) => (i + 1) % len,
            None => 0,
        };
        let changed = self.index != Some(next);
        self.index = Some(next);
        changed
    }

    /// Step back, wrapping to the last track before the first.
    pub fn previous(&mut self, len: usize) -> bool {
        if len == 0 {
            return false;
        }
        let prev = match self.index {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        let changed = self.index != Some(prev);
        self.index = Some(prev);
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(n: usize) -> TrackCatalog {
        TrackCatalog::new(
            (0..n)
                .map(|i| TrackRecord {
                    id: format!("id-{i}"),
                    name: format!("Track {i}"),
                    artist: format!("Artist {i}"),
                    cover_url: String::new(),
                    media_url: format!("https://example.com/{i}.mp3"),
                })
                .collect(),
        )
    }

    #[test]
    fn select_in_range_sets_cursor() {
        let mut cursor = SelectionCursor::default();
        assert!(cursor.select(2, 3));
        assert_eq!(cursor.index(), Some(2));
    }

    #[test]
    fn select_out_of_range_is_noop() {
        let mut cursor = SelectionCursor::default();
        cursor.select(1, 3);
        assert!(!cursor.select(3, 3));
        assert!(!cursor.select(usize::MAX, 3));
        assert_eq!(cursor.index(), Some(1));
    }

    #[test]
    fn next_wraps_after_last() {
        // Catalog [A, B, C], cursor starts at 0.
        let mut cursor = SelectionCursor::default();
        cursor.select(0, 3);
        cursor.next(3);
        assert_eq!(cursor.index(), Some(1));
        cursor.next(3);
        assert_eq!(cursor.index(), Some(2));
        cursor.next(3);
        assert_eq!(cursor.index(), Some(0));
    }

    #[test]
    fn next_applied_len_times_is_identity() {
        for start in 0..5 {
            let mut cursor = SelectionCursor::default();
            cursor.select(start, 5);
            for _ in 0..5 {
                cursor.next(5);
            }
            assert_eq!(cursor.index(), Some(start));
        }
    }

    #[test]
    fn previous_inverts_next() {
        for start in 0..4 {
            let mut cursor = SelectionCursor::default();
            cursor.select(start, 4);
            cursor.next(4);
            cursor.previous(4);
            assert_eq!(cursor.index(), Some(start));
        }
    }

    #[test]
    fn previous_wraps_before_first() {
        let mut cursor = SelectionCursor::default();
        cursor.select(0, 3);
        cursor.previous(3);
        assert_eq!(cursor.index(), Some(2));
    }

    #[test]
    fn empty_catalog_leaves_cursor_unset() {
        let mut cursor = SelectionCursor::default();
        assert!(!cursor.next(0));
        assert!(!cursor.previous(0));
        assert_eq!(cursor.index(), None);
    }

    #[test]
    fn filter_matches_name_and_artist_case_insensitive() {
        let mut tracks = catalog(3).tracks().to_vec();
        tracks[1].name = "Midnight City".to_string();
        tracks[2].artist = "M83".to_string();
        let catalog = TrackCatalog::new(tracks);

        assert_eq!(catalog.filtered_indices("midnight"), vec![1]);
        assert_eq!(catalog.filtered_indices("m83"), vec![2]);
        assert_eq!(catalog.filtered_indices(""), vec![0, 1, 2]);
        assert!(catalog.filtered_indices("no such track").is_empty());
    }

    #[test]
    fn filtered_indices_resolve_to_underlying_records() {
        let mut tracks = catalog(4).tracks().to_vec();
        tracks[3].name = "Outlier".to_string();
        let catalog = TrackCatalog::new(tracks);

        let filtered = catalog.filtered_indices("outlier");
        assert_eq!(filtered, vec![3]);
        assert_eq!(catalog.get(filtered[0]).unwrap().name, "Outlier");
    }
}
