//! In-memory entity index built once from the store, aliases included.

use std::collections::HashMap;

use gotham_types::{EntityId, EntityKind};
use tracing::{info, warn};

use crate::error::Result;
use crate::matcher::fold;
use crate::store::{AliasRow, EntityRow, Store};

/// One candidate string for matching. Alias rows appear as their own
/// entries carrying the real entity's id and canonical name.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: EntityId,
    /// Stored name, or the alias text for alias entries.
    pub name: String,
    pub canonical_name: String,
    pub description: String,
    /// Canonical name of the target when this entry is an alias.
    pub alias_of: Option<String>,
    /// `name` folded for comparison.
    pub folded: String,
}

impl Entity {
    fn canonical(kind: EntityKind, row: EntityRow) -> Self {
        Self {
            id: EntityId::new(kind, row.id),
            folded: fold(&row.name),
            canonical_name: row.name.clone(),
            name: row.name,
            description: row.description,
            alias_of: None,
        }
    }

    pub fn is_alias(&self) -> bool {
        self.alias_of.is_some()
    }
}

/// Immutable in-memory snapshot of every entity plus alias entries, built
/// once from the store.
#[derive(Debug, Default)]
pub struct EntityCache {
    partitions: [Vec<Entity>; 5],
    index: HashMap<EntityId, (usize, usize)>,
}

impl EntityCache {
    /// Load every entity table. Any storage failure aborts the build; there
    /// is no partial cache.
    pub fn build(store: &Store) -> Result<Self> {
        let mut loaded = Vec::with_capacity(EntityKind::ALL.len());
        for kind in EntityKind::ALL {
            loaded.push((kind, store.entities(kind)?, store.aliases(kind)?));
        }
        let cache = Self::from_rows(loaded);
        info!(
            entities = cache.canonical_len(),
            candidates = cache.partitions.iter().map(Vec::len).sum::<usize>(),
            "entity cache built"
        );
        Ok(cache)
    }

    pub fn from_rows(loaded: Vec<(EntityKind, Vec<EntityRow>, Vec<AliasRow>)>) -> Self {
        let mut cache = Self::default();
        for (kind, rows, aliases) in loaded {
            let part = &mut cache.partitions[kind.index()];
            for row in rows {
                let entity = Entity::canonical(kind, row);
                cache.index.insert(entity.id, (kind.index(), part.len()));
                part.push(entity);
            }
            for alias in aliases {
                let target = EntityId::new(kind, alias.entity_id);
                let Some(&(_, pos)) = cache.index.get(&target) else {
                    warn!(alias = %alias.alias, %target, "alias points at a missing entity");
                    continue;
                };
                let real = &part[pos];
                let entry = Entity {
                    id: real.id,
                    folded: fold(&alias.alias),
                    name: alias.alias,
                    canonical_name: real.canonical_name.clone(),
                    description: real.description.clone(),
                    alias_of: Some(real.canonical_name.clone()),
                };
                part.push(entry);
            }
        }
        cache
    }

    /// Every candidate of one kind, canonical entries first, then aliases.
    pub fn list(&self, kind: EntityKind) -> &[Entity] {
        &self.partitions[kind.index()]
    }

    /// Canonical entries only.
    pub fn canonical(&self, kind: EntityKind) -> impl Iterator<Item = &Entity> {
        self.list(kind).iter().filter(|e| !e.is_alias())
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        let &(part, pos) = self.index.get(&id)?;
        self.partitions[part].get(pos)
    }

    pub fn count(&self, kind: EntityKind) -> usize {
        self.canonical(kind).count()
    }

    pub fn canonical_len(&self) -> usize {
        EntityKind::ALL.iter().map(|k| self.count(*k)).sum()
    }

    /// Exact stored-name lookup (case-insensitive), kinds in search order.
    pub fn find_exact(&self, name: &str) -> Option<&Entity> {
        EntityKind::ALL
            .iter()
            .find_map(|kind| self.find_exact_in(*kind, name))
    }

    pub fn find_exact_in(&self, kind: EntityKind, name: &str) -> Option<&Entity> {
        let wanted = name.trim().replace(' ', "_");
        self.canonical(kind)
            .find(|e| e.name.eq_ignore_ascii_case(&wanted) || e.name.eq_ignore_ascii_case(name.trim()))
    }

    /// First canonical entity whose name contains `fragment`, ignoring case.
    pub fn find_containing(&self, kind: EntityKind, fragment: &str) -> Option<&Entity> {
        let needle = fragment.to_lowercase();
        self.canonical(kind)
            .find(|e| e.name.to_lowercase().contains(&needle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixture_store;

    fn row(id: i64, name: &str) -> EntityRow {
        EntityRow {
            id,
            name: name.into(),
            description: String::new(),
        }
    }

    #[test]
    fn test_alias_entries_point_back() {
        let cache = EntityCache::from_rows(vec![(
            EntityKind::Character,
            vec![row(1, "Batman"), row(2, "Joker")],
            vec![AliasRow {
                entity_id: 1,
                alias: "Bruce Wayne".into(),
            }],
        )]);
        let all = cache.list(EntityKind::Character);
        assert_eq!(all.len(), 3);
        let alias = &all[2];
        assert_eq!(alias.name, "Bruce Wayne");
        assert_eq!(alias.alias_of.as_deref(), Some("Batman"));
        assert_eq!(alias.id, EntityId::new(EntityKind::Character, 1));
        assert_eq!(cache.count(EntityKind::Character), 2, "aliases are not counted as entities");
    }

    #[test]
    fn test_dangling_alias_is_dropped() {
        let cache = EntityCache::from_rows(vec![(
            EntityKind::Vehicle,
            vec![row(1, "Batmobile")],
            vec![AliasRow {
                entity_id: 99,
                alias: "Ghost Car".into(),
            }],
        )]);
        assert_eq!(cache.list(EntityKind::Vehicle).len(), 1);
    }

    #[test]
    fn test_get_returns_canonical_entry() {
        let cache = EntityCache::build(&fixture_store()).unwrap();
        let batman = cache.find_exact("batman").unwrap();
        let again = cache.get(batman.id).unwrap();
        assert!(!again.is_alias());
        assert_eq!(again.name, "Batman");
    }

    #[test]
    fn test_find_exact_accepts_spaces() {
        let cache = EntityCache::build(&fixture_store()).unwrap();
        let manor = cache.find_exact("wayne manor").unwrap();
        assert_eq!(manor.name, "Wayne_Manor");
        assert_eq!(manor.id.kind, EntityKind::Location);
    }

    #[test]
    fn test_find_containing_first_seen() {
        let cache = EntityCache::build(&fixture_store()).unwrap();
        let robin = cache.find_containing(EntityKind::Character, "robin").unwrap();
        assert_eq!(robin.name, "Robin_(Dick_Grayson)");
    }

    #[test]
    fn test_build_covers_all_kinds() {
        let store = fixture_store();
        let cache = EntityCache::build(&store).unwrap();
        let stats = store.stats().unwrap();
        assert_eq!(cache.canonical_len(), stats.total_entities());
    }
}
