//! # Song Record Store
//!
//! Ordered title → [`SongRecord`] mapping.
//!
//! Iteration follows insertion order (file order after a load). That order is
//! the tie-breaker for every stable sort done on top of the store, so it is
//! preserved through serialization as well.

use crate::error::{LibraryError, Result};
use crate::models::{NewSong, SongRecord};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SongStore {
    order: Vec<String>,
    songs: HashMap<String, SongRecord>,
}

impl SongStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, title: &str) -> bool {
        self.songs.contains_key(title)
    }

    pub fn get(&self, title: &str) -> Option<&SongRecord> {
        self.songs.get(title)
    }

    pub fn get_mut(&mut self, title: &str) -> Option<&mut SongRecord> {
        self.songs.get_mut(title)
    }

    /// Titles in insertion order.
    pub fn titles(&self) -> impl Iterator<Item = &str> + '_ {
        self.order.iter().map(String::as_str)
    }

    /// `(title, record)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SongRecord)> + '_ {
        self.order
            .iter()
            .filter_map(|title| self.songs.get(title).map(|r| (title.as_str(), r)))
    }

    /// Insert a record under a title that must not exist yet.
    pub fn insert(&mut self, title: impl Into<String>, record: SongRecord) -> Result<()> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(LibraryError::invalid_input("title", "Title cannot be empty"));
        }
        if self.songs.contains_key(&title) {
            return Err(LibraryError::AlreadyExists(title));
        }
        self.order.push(title.clone());
        self.songs.insert(title, record);
        Ok(())
    }

    /// Insert a manually entered song, returning the (trimmed) title it was
    /// stored under.
    pub fn insert_song(&mut self, song: NewSong, rating: f64) -> Result<String> {
        let title = song
            .normalized_title()
            .ok_or_else(|| LibraryError::invalid_input("title", "Title cannot be empty"))?;
        if self.contains(&title) {
            return Err(LibraryError::AlreadyExists(title));
        }
        self.insert(title.clone(), song.into_record(rating))?;
        Ok(title)
    }

    /// Add every incoming title that is not present yet. Existing records are
    /// never overwritten. Returns the number of inserted songs.
    pub fn merge<I>(&mut self, incoming: I) -> usize
    where
        I: IntoIterator<Item = (String, SongRecord)>,
    {
        let mut inserted = 0;
        for (title, record) in incoming {
            if self.songs.contains_key(&title) {
                continue;
            }
            self.order.push(title.clone());
            self.songs.insert(title, record);
            inserted += 1;
        }
        inserted
    }

    pub fn remove(&mut self, title: &str) -> Option<SongRecord> {
        let record = self.songs.remove(title)?;
        self.order.retain(|t| t != title);
        Some(record)
    }

    /// Remove every listed title that exists; returns how many were removed.
    pub fn remove_many<S: AsRef<str>>(&mut self, titles: &[S]) -> usize {
        let mut removed = 0;
        for title in titles {
            if self.songs.remove(title.as_ref()).is_some() {
                removed += 1;
            }
        }
        if removed > 0 {
            let songs = &self.songs;
            self.order.retain(|t| songs.contains_key(t));
        }
        removed
    }

    /// Re-key a record under a new title. The record moves to the end of the
    /// order, as if it had been removed and inserted again.
    pub fn rename(&mut self, from: &str, to: impl Into<String>) -> Result<()> {
        let to = to.into();
        if to.trim().is_empty() {
            return Err(LibraryError::invalid_input("title", "Title cannot be empty"));
        }
        if !self.songs.contains_key(from) {
            return Err(LibraryError::NotFound(from.to_string()));
        }
        if from == to {
            return Ok(());
        }
        if self.songs.contains_key(&to) {
            return Err(LibraryError::AlreadyExists(to));
        }

        if let Some(record) = self.remove(from) {
            self.order.push(to.clone());
            self.songs.insert(to, record);
        }
        Ok(())
    }

    /// Remove every song whose album equals `album`.
    pub fn remove_album(&mut self, album: &str) -> usize {
        let titles: Vec<String> = self
            .iter()
            .filter(|(_, record)| record.album == album)
            .map(|(title, _)| title.to_string())
            .collect();
        self.remove_many(&titles)
    }

    /// Distinct album labels, sorted.
    pub fn albums(&self) -> Vec<String> {
        self.songs
            .values()
            .map(|record| record.album.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

impl FromIterator<(String, SongRecord)> for SongStore {
    fn from_iter<T: IntoIterator<Item = (String, SongRecord)>>(iter: T) -> Self {
        let mut store = SongStore::new();
        store.merge(iter);
        store
    }
}

impl IntoIterator for SongStore {
    type Item = (String, SongRecord);
    type IntoIter = std::vec::IntoIter<(String, SongRecord)>;

    fn into_iter(mut self) -> Self::IntoIter {
        let mut pairs = Vec::with_capacity(self.order.len());
        for title in self.order {
            if let Some(record) = self.songs.remove(&title) {
                pairs.push((title, record));
            }
        }
        pairs.into_iter()
    }
}

impl Serialize for SongStore {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (title, record) in self.iter() {
            map.serialize_entry(title, record)?;
        }
        map.end()
    }
}

struct SongStoreVisitor;

impl<'de> Visitor<'de> for SongStoreVisitor {
    type Value = SongStore;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("an object mapping song titles to song records")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<SongStore, A::Error> {
        let mut store = SongStore::new();
        while let Some((title, record)) = access.next_entry::<String, SongRecord>()? {
            // A repeated key keeps its first position and its last value.
            match store.songs.get_mut(&title) {
                Some(existing) => *existing = record,
                None => {
                    store.order.push(title.clone());
                    store.songs.insert(title, record);
                }
            }
        }
        Ok(store)
    }
}

impl<'de> Deserialize<'de> for SongStore {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_map(SongStoreVisitor)
    }
}
