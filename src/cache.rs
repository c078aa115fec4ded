// src/cache.rs
use std::cmp::Ordering;

use chrono::{DateTime, FixedOffset};

use crate::flag::{Environment, Flag};

/// A record mirrored from a remote collection.
pub trait Entity: Clone + Send + Sync {
    fn id(&self) -> &str;
    fn name(&self) -> &str;
    fn description(&self) -> Option<&str>;
    fn created_at(&self) -> Option<&str>;
    fn updated_at(&self) -> Option<&str>;

    fn environment(&self) -> Option<&Environment> {
        None
    }

    /// Overwrites the fields `update` carries and keeps the rest.
    fn merge(&mut self, update: Self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    LastUpdated,
    Created,
    /// Ascending, ignoring case: `"apple"` comes before `"Banana"`. Names that
    /// differ only in case fall back to byte order.
    Name,
}

/// Local mirror of one remote collection, newest first.
#[derive(Debug, Clone)]
pub struct ListCache<E> {
    entries: Vec<E>,
}

impl<E> Default for ListCache<E> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<E: Entity> ListCache<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[E] {
        &self.entries
    }

    pub fn get(&self, id: &str) -> Option<&E> {
        self.entries.iter().find(|e| e.id() == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Swaps the whole collection for a freshly listed one.
    pub fn refresh(&mut self, entries: Vec<E>) {
        self.entries = entries;
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn insert_front(&mut self, entity: E) {
        self.entries.retain(|e| e.id() != entity.id());
        self.entries.insert(0, entity);
    }

    /// Merges `update` into the entry with the same id. Unknown ids are ignored.
    pub fn merge(&mut self, update: E) -> Option<&E> {
        let pos = self.entries.iter().position(|e| e.id() == update.id())?;
        self.entries[pos].merge(update);
        Some(&self.entries[pos])
    }

    pub fn remove(&mut self, id: &str) -> Option<E> {
        let pos = self.entries.iter().position(|e| e.id() == id)?;
        Some(self.entries.remove(pos))
    }

    pub fn view(&self) -> View<'_, E> {
        View {
            cache: self,
            query: None,
            environment: None,
            sort: None,
        }
    }
}

impl ListCache<Flag> {
    /// Flips the cached enabled state and returns the new value.
    pub fn toggle(&mut self, id: &str) -> Option<bool> {
        let flag = self.entries.iter_mut().find(|f| f.id == id)?;
        let next = !flag.enabled();
        flag.is_enabled = Some(next);
        Some(next)
    }

    pub fn set_enabled(&mut self, id: &str, enabled: bool) -> bool {
        match self.entries.iter_mut().find(|f| f.id == id) {
            Some(flag) => {
                flag.is_enabled = Some(enabled);
                true
            }
            None => false,
        }
    }
}

/// Filtered and sorted read-only projection of a [`ListCache`].
pub struct View<'a, E> {
    cache: &'a ListCache<E>,
    query: Option<String>,
    environment: Option<Environment>,
    sort: Option<SortKey>,
}

impl<'a, E: Entity> View<'a, E> {
    /// Case-insensitive substring match over name or description.
    pub fn matching(mut self, query: &str) -> Self {
        let query = query.trim();
        self.query = if query.is_empty() {
            None
        } else {
            Some(query.to_lowercase())
        };
        self
    }

    /// Keeps entries tagged with exactly `environment`; untagged entries drop out.
    pub fn in_environment(mut self, environment: Environment) -> Self {
        self.environment = Some(environment);
        self
    }

    pub fn sorted_by(mut self, key: SortKey) -> Self {
        self.sort = Some(key);
        self
    }

    pub fn collect(self) -> Vec<&'a E> {
        let mut out: Vec<&'a E> = self
            .cache
            .entries
            .iter()
            .filter(|e| match &self.query {
                Some(q) => {
                    e.name().to_lowercase().contains(q)
                        || e.description()
                            .is_some_and(|d| d.to_lowercase().contains(q))
                }
                None => true,
            })
            .filter(|e| match &self.environment {
                Some(env) => e.environment() == Some(env),
                None => true,
            })
            .collect();

        match self.sort {
            Some(SortKey::Name) => out.sort_by(|a, b| compare_names(a.name(), b.name())),
            Some(SortKey::Created) => {
                out.sort_by(|a, b| newest_first(a.created_at(), b.created_at()))
            }
            Some(SortKey::LastUpdated) => {
                out.sort_by(|a, b| newest_first(a.updated_at(), b.updated_at()))
            }
            None => {}
        }
        out
    }
}

fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

fn parse_timestamp(raw: Option<&str>) -> Option<DateTime<FixedOffset>> {
    raw.and_then(|s| DateTime::parse_from_rfc3339(s.trim()).ok())
}

// Descending; anything that fails to parse goes last.
fn newest_first(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (parse_timestamp(a), parse_timestamp(b)) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
