//! In-memory bookshelf collection with write-through persistence.

use crate::store::ShelfStore;
use crate::types::{DraftRecord, SongRecord};
use chrono::Utc;
use log::{debug, info};
use std::sync::Arc;
use uuid::Uuid;

/// Ordering for bookshelf queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShelfOrder {
    /// Newest first.
    #[default]
    CreatedAt,
    /// Alphabetical by title.
    Title,
    /// Alphabetical by artist.
    Artist,
}

/// The record collection, sole mutator of the backing store.
///
/// All mutations run on a single logical owner; the store is written after
/// the in-memory collection has already changed, and a failed write never
/// surfaces to the caller.
pub struct Bookshelf {
    records: Vec<SongRecord>,
    store: Arc<dyn ShelfStore>,
}

impl Bookshelf {
    /// Load the collection from the given store.
    pub fn load(store: Arc<dyn ShelfStore>) -> Self {
        let records = store.load();
        info!("bookshelf loaded ({} records)", records.len());
        Self { records, store }
    }

    /// All records in persistence order.
    pub fn records(&self) -> &[SongRecord] {
        &self.records
    }

    /// Number of records on the shelf.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the shelf is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Look up a record by id.
    pub fn get(&self, id: Uuid) -> Option<&SongRecord> {
        self.records.iter().find(|record| record.id == id)
    }

    /// Append a new record, assigning id and creation time when absent.
    pub fn add(&mut self, draft: DraftRecord) -> Uuid {
        let record = SongRecord {
            id: draft.id.unwrap_or_else(Uuid::new_v4),
            title: draft.title,
            artist: draft.artist,
            release_year: draft.release_year,
            cover_art_url: draft.cover_art_url,
            summary: draft.summary,
            chat_history: draft.chat_history,
            tags: draft.tags,
            created_at: draft.created_at.unwrap_or_else(Utc::now),
        };
        let id = record.id;
        info!("adding record (id={}, title={})", id, record.title);
        self.records.push(record);
        self.store.save(&self.records);
        id
    }

    /// Replace the record matching `record.id`; silently a no-op otherwise.
    pub fn update(&mut self, record: SongRecord) {
        let Some(existing) = self.records.iter_mut().find(|entry| entry.id == record.id) else {
            debug!("update for unknown record ignored (id={})", record.id);
            return;
        };
        info!("updating record (id={}, title={})", record.id, record.title);
        *existing = record;
        self.store.save(&self.records);
    }

    /// Add or update depending on whether the draft's id is already shelved.
    ///
    /// The edit path reuses the existing id; the original creation time is
    /// kept unless the draft carries its own.
    pub fn upsert(&mut self, draft: DraftRecord) -> Uuid {
        let existing = draft.id.and_then(|id| self.get(id).cloned());
        match existing {
            Some(previous) => {
                let record = SongRecord {
                    id: previous.id,
                    title: draft.title,
                    artist: draft.artist,
                    release_year: draft.release_year,
                    cover_art_url: draft.cover_art_url,
                    summary: draft.summary,
                    chat_history: draft.chat_history,
                    tags: draft.tags,
                    created_at: draft.created_at.unwrap_or(previous.created_at),
                };
                let id = record.id;
                self.update(record);
                id
            }
            None => self.add(draft),
        }
    }

    /// Remove the record with the given id; a no-op when absent.
    pub fn delete(&mut self, id: Uuid) {
        let before = self.records.len();
        self.records.retain(|record| record.id != id);
        if self.records.len() == before {
            debug!("delete for unknown record ignored (id={})", id);
            return;
        }
        info!("deleted record (id={})", id);
        self.store.save(&self.records);
    }

    /// Filter and order records for display.
    pub fn query(&self, filter: &str, order: ShelfOrder) -> Vec<&SongRecord> {
        filter_records(&self.records, filter, order)
    }
}

/// Filter and order a record slice for display.
///
/// The filter matches case-insensitively against title, artist, and tags.
pub fn filter_records<'a>(
    records: &'a [SongRecord],
    filter: &str,
    order: ShelfOrder,
) -> Vec<&'a SongRecord> {
    let needle = filter.trim().to_lowercase();
    let mut matches: Vec<&SongRecord> = records
        .iter()
        .filter(|record| {
            needle.is_empty()
                || record.title.to_lowercase().contains(&needle)
                || record.artist.to_lowercase().contains(&needle)
                || record
                    .tags
                    .iter()
                    .any(|tag| tag.to_lowercase().contains(&needle))
        })
        .collect();
    match order {
        ShelfOrder::CreatedAt => matches.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        ShelfOrder::Title => matches.sort_by(|a, b| a.title.cmp(&b.title)),
        ShelfOrder::Artist => matches.sort_by(|a, b| a.artist.cmp(&b.artist)),
    }
    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryShelfStore;
    use crate::types::ChatMessage;
    use chrono::{Duration, Utc};
    use pretty_assertions::assert_eq;

    fn draft(title: &str, artist: &str) -> DraftRecord {
        DraftRecord {
            id: None,
            title: title.to_string(),
            artist: artist.to_string(),
            release_year: String::new(),
            cover_art_url: crate::links::cover_art_url(title),
            summary: "summary".to_string(),
            chat_history: vec![ChatMessage::assistant("q"), ChatMessage::user("a")],
            tags: vec!["warm".to_string()],
            created_at: None,
        }
    }

    fn shelf_with_store() -> (Bookshelf, Arc<MemoryShelfStore>) {
        let store = Arc::new(MemoryShelfStore::new());
        (Bookshelf::load(store.clone()), store)
    }

    #[test]
    fn add_assigns_unique_id_and_created_at() {
        let (mut shelf, _store) = shelf_with_store();
        let first = shelf.add(draft("One", "A"));
        let second = shelf.add(draft("Two", "B"));

        assert_ne!(first, second);
        let record = shelf.get(first).expect("record");
        assert!(!record.id.is_nil());
        assert!(record.created_at <= Utc::now());
    }

    #[test]
    fn every_mutation_writes_through_to_the_store() {
        let (mut shelf, store) = shelf_with_store();
        let id = shelf.add(draft("One", "A"));
        assert_eq!(store.snapshot(), shelf.records());

        let mut record = shelf.get(id).expect("record").clone();
        record.summary = "edited".to_string();
        shelf.update(record);
        assert_eq!(store.snapshot(), shelf.records());

        shelf.delete(id);
        assert_eq!(store.snapshot(), shelf.records());
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn update_for_unknown_id_is_a_silent_no_op() {
        let (mut shelf, store) = shelf_with_store();
        shelf.add(draft("One", "A"));
        let before = shelf.records().to_vec();

        let mut stray = before[0].clone();
        stray.id = Uuid::new_v4();
        stray.summary = "never stored".to_string();
        shelf.update(stray);

        assert_eq!(shelf.records(), before);
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn delete_for_unknown_id_leaves_collection_unchanged() {
        let (mut shelf, _store) = shelf_with_store();
        shelf.add(draft("One", "A"));
        let before = shelf.records().to_vec();

        shelf.delete(Uuid::new_v4());
        assert_eq!(shelf.records(), before);
    }

    #[test]
    fn upsert_with_existing_id_updates_and_keeps_created_at() {
        let (mut shelf, _store) = shelf_with_store();
        let id = shelf.add(draft("One", "A"));
        let original_created_at = shelf.get(id).expect("record").created_at;

        let mut edited = draft("One (edited)", "A");
        edited.id = Some(id);
        let updated_id = shelf.upsert(edited);

        assert_eq!(updated_id, id);
        assert_eq!(shelf.len(), 1);
        let record = shelf.get(id).expect("record");
        assert_eq!(record.title, "One (edited)");
        assert_eq!(record.created_at, original_created_at);
    }

    #[test]
    fn query_filters_on_title_artist_and_tags() {
        let (mut shelf, _store) = shelf_with_store();
        shelf.add(draft("Imagine", "John Lennon"));
        let mut tagged = draft("Other", "Someone");
        tagged.tags = vec!["nostalgic".to_string()];
        shelf.add(tagged);

        assert_eq!(shelf.query("imagine", ShelfOrder::default()).len(), 1);
        assert_eq!(shelf.query("lennon", ShelfOrder::default()).len(), 1);
        assert_eq!(shelf.query("nostalgic", ShelfOrder::default()).len(), 1);
        assert_eq!(shelf.query("", ShelfOrder::default()).len(), 2);
        assert!(shelf.query("missing", ShelfOrder::default()).is_empty());
    }

    #[test]
    fn query_orders_newest_first_by_default() {
        let (mut shelf, _store) = shelf_with_store();
        let mut older = draft("Older", "A");
        older.created_at = Some(Utc::now() - Duration::hours(1));
        let mut newer = draft("Newer", "B");
        newer.created_at = Some(Utc::now());
        shelf.add(older);
        shelf.add(newer);

        let ordered = shelf.query("", ShelfOrder::CreatedAt);
        assert_eq!(ordered[0].title, "Newer");
        assert_eq!(ordered[1].title, "Older");

        let by_title = shelf.query("", ShelfOrder::Title);
        assert_eq!(by_title[0].title, "Newer");

        let by_artist = shelf.query("", ShelfOrder::Artist);
        assert_eq!(by_artist[0].artist, "A");
    }
}
