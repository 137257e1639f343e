//! Seed-data import: JSON documents → SQLite.
//!
//! Each `*.json` file under the import root is one [`SeedDocument`]. Files
//! are applied in path order, each inside its own transaction. Entities are
//! keyed by name; re-importing a file adds nothing new for names already
//! present.

use std::path::{Path, PathBuf};

use rusqlite::{OptionalExtension, Transaction, params};
use serde::Deserialize;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::store::Store;

// ── Document shape ───────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SeedDocument {
    pub characters: Vec<CharacterRecord>,
    pub vehicles: Vec<VehicleRecord>,
    pub locations: Vec<LocationRecord>,
    pub storylines: Vec<StorylineRecord>,
    pub organizations: Vec<OrganizationRecord>,
    pub relationships: Vec<RelationshipRecord>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CharacterRecord {
    pub name: String,
    pub url: Option<String>,
    pub description: Option<String>,
    pub first_appearance: Option<String>,
    pub aliases: Vec<String>,
    pub powers: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SpecificationsRecord {
    pub length: Option<String>,
    pub width: Option<String>,
    pub height: Option<String>,
    pub weight: Option<String>,
    pub max_speed: Option<String>,
    pub engine: Option<String>,
    pub armor: Option<String>,
    pub crew_capacity: Option<String>,
    pub manufacturer: Option<String>,
    pub first_appearance: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct VehicleRecord {
    pub name: String,
    pub url: Option<String>,
    pub description: Option<String>,
    pub vehicle_type: Option<String>,
    pub specifications: Option<SpecificationsRecord>,
    pub weapons: Vec<String>,
    pub defensive_systems: Vec<String>,
    pub special_features: Vec<String>,
    pub aliases: Vec<String>,
    /// Character names; unresolved names are skipped.
    pub users: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LocationLink {
    pub name: String,
    pub association: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LocationRecord {
    pub name: String,
    pub url: Option<String>,
    pub description: Option<String>,
    pub location_type: Option<String>,
    pub characters: Vec<LocationLink>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StorylineRecord {
    pub name: String,
    pub url: Option<String>,
    pub description: Option<String>,
    pub complexity_level: Option<String>,
    pub simplified_summary: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct OrganizationRecord {
    pub name: String,
    pub url: Option<String>,
    pub description: Option<String>,
    pub organization_type: Option<String>,
    pub alignment: Option<String>,
}

/// Directional: `character` holds `related` as a `kind` (ally, enemy, ...).
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RelationshipRecord {
    pub character: String,
    pub related: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Rows written by one import run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub files: usize,
    pub entities: usize,
    pub links: usize,
    pub skipped: usize,
}

impl ImportSummary {
    fn absorb(&mut self, other: ImportSummary) {
        self.files += other.files;
        self.entities += other.entities;
        self.links += other.links;
        self.skipped += other.skipped;
    }
}

// ── Entry points ─────────────────────────────────────────────────────────

/// Import one JSON file, or every `*.json` below a directory.
pub fn import_path(store: &Store, root: &Path) -> Result<ImportSummary> {
    let files = seed_files(root);
    info!(root = %root.display(), files = files.len(), "importing seed data");
    let mut summary = ImportSummary::default();
    for path in files {
        let doc = read_document(&path)?;
        let mut one = import_document(store, &doc, &path.display().to_string())?;
        one.files = 1;
        debug!(file = %path.display(), entities = one.entities, links = one.links, "imported");
        summary.absorb(one);
    }
    Ok(summary)
}

fn seed_files(root: &Path) -> Vec<PathBuf> {
    if root.is_file() {
        return vec![root.to_path_buf()];
    }
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();
    files
}

pub fn read_document(path: &Path) -> Result<SeedDocument> {
    let text = std::fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| Error::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Write one document in a single transaction. `source_file` is recorded on
/// every entity row.
pub fn import_document(store: &Store, doc: &SeedDocument, source_file: &str) -> Result<ImportSummary> {
    store.write(|tx| {
        let mut s = ImportSummary::default();

        for c in &doc.characters {
            let Some(id) = insert_entity(
                tx,
                "INSERT OR IGNORE INTO characters (name, url, description, first_appearance, source_file)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![c.name, c.url, c.description, c.first_appearance, source_file],
                "characters",
                &c.name,
                &mut s,
            )?
            else {
                continue;
            };
            for alias in &c.aliases {
                s.links += tx.execute(
                    "INSERT INTO character_aliases (character_id, alias) VALUES (?1, ?2)",
                    params![id, alias],
                )?;
            }
            for power in &c.powers {
                s.links += tx.execute(
                    "INSERT INTO character_powers (character_id, power_ability) VALUES (?1, ?2)",
                    params![id, power],
                )?;
            }
        }

        for v in &doc.vehicles {
            let Some(id) = insert_entity(
                tx,
                "INSERT OR IGNORE INTO vehicles (name, url, description, vehicle_type, source_file)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![v.name, v.url, v.description, v.vehicle_type, source_file],
                "vehicles",
                &v.name,
                &mut s,
            )?
            else {
                continue;
            };
            if let Some(spec) = &v.specifications {
                s.links += tx.execute(
                    "INSERT OR REPLACE INTO vehicle_specifications
                     (vehicle_id, length, width, height, weight, max_speed, engine, armor,
                      crew_capacity, manufacturer, first_appearance)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                    params![
                        id,
                        spec.length,
                        spec.width,
                        spec.height,
                        spec.weight,
                        spec.max_speed,
                        spec.engine,
                        spec.armor,
                        spec.crew_capacity,
                        spec.manufacturer,
                        spec.first_appearance,
                    ],
                )?;
            }
            let lists: [(&str, &Vec<String>); 4] = [
                ("INSERT INTO vehicle_weapons (vehicle_id, weapon) VALUES (?1, ?2)", &v.weapons),
                (
                    "INSERT INTO vehicle_defensive_systems (vehicle_id, defensive_system) VALUES (?1, ?2)",
                    &v.defensive_systems,
                ),
                (
                    "INSERT INTO vehicle_special_features (vehicle_id, special_feature) VALUES (?1, ?2)",
                    &v.special_features,
                ),
                ("INSERT INTO vehicle_aliases (vehicle_id, alias) VALUES (?1, ?2)", &v.aliases),
            ];
            for (sql, values) in lists {
                for value in values {
                    s.links += tx.execute(sql, params![id, value])?;
                }
            }
            for user in &v.users {
                match resolve(tx, "characters", user)? {
                    Some(cid) => {
                        s.links += tx.execute(
                            "INSERT INTO vehicle_users (vehicle_id, character_id) VALUES (?1, ?2)",
                            params![id, cid],
                        )?;
                    }
                    None => unresolved(&mut s, "vehicle user", &v.name, user),
                }
            }
        }

        for l in &doc.locations {
            let Some(id) = insert_entity(
                tx,
                "INSERT OR IGNORE INTO locations (name, url, description, location_type, source_file)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![l.name, l.url, l.description, l.location_type, source_file],
                "locations",
                &l.name,
                &mut s,
            )?
            else {
                continue;
            };
            for link in &l.characters {
                match resolve(tx, "characters", &link.name)? {
                    Some(cid) => {
                        s.links += tx.execute(
                            "INSERT INTO character_locations (character_id, location_id, association_type)
                             VALUES (?1, ?2, ?3)",
                            params![cid, id, link.association],
                        )?;
                    }
                    None => unresolved(&mut s, "location character", &l.name, &link.name),
                }
            }
        }

        for st in &doc.storylines {
            insert_entity(
                tx,
                "INSERT OR IGNORE INTO storylines
                 (name, url, description, complexity_level, simplified_summary, source_file)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![st.name, st.url, st.description, st.complexity_level, st.simplified_summary, source_file],
                "storylines",
                &st.name,
                &mut s,
            )?;
        }

        for o in &doc.organizations {
            insert_entity(
                tx,
                "INSERT OR IGNORE INTO organizations
                 (name, url, description, organization_type, alignment, source_file)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![o.name, o.url, o.description, o.organization_type, o.alignment, source_file],
                "organizations",
                &o.name,
                &mut s,
            )?;
        }

        for r in &doc.relationships {
            let from = resolve(tx, "characters", &r.character)?;
            let to = resolve(tx, "characters", &r.related)?;
            match (from, to) {
                (Some(a), Some(b)) if !r.kind.trim().is_empty() => {
                    s.links += tx.execute(
                        "INSERT OR IGNORE INTO character_relationships
                         (character_id, related_character_id, relationship_type)
                         VALUES (?1, ?2, ?3)",
                        params![a, b, r.kind.trim().to_lowercase()],
                    )?;
                }
                _ => unresolved(&mut s, "relationship", &r.character, &r.related),
            }
        }

        Ok(s)
    })
}

// ── helpers ──────────────────────────────────────────────────────────────

/// Insert an entity row. Returns the new id, or `None` when the name is
/// blank or already stored; existing entities keep their sub-records.
fn insert_entity(
    tx: &Transaction<'_>,
    sql: &str,
    values: &[&dyn rusqlite::ToSql],
    table: &str,
    name: &str,
    summary: &mut ImportSummary,
) -> Result<Option<i64>> {
    if name.trim().is_empty() {
        warn!(table, "record without a name");
        summary.skipped += 1;
        return Ok(None);
    }
    if tx.execute(sql, values)? == 0 {
        debug!(table, name, "already stored");
        summary.skipped += 1;
        return Ok(None);
    }
    summary.entities += 1;
    Ok(Some(tx.last_insert_rowid()))
}

/// Resolve a name to an id, trying the name as written and with spaces
/// turned into underscores.
fn resolve(tx: &Transaction<'_>, table: &str, name: &str) -> Result<Option<i64>> {
    let sql = format!("SELECT id FROM {table} WHERE name = ?1 COLLATE NOCASE ORDER BY id LIMIT 1");
    let trimmed = name.trim();
    for candidate in [trimmed.to_string(), trimmed.replace(' ', "_")] {
        let hit: Option<i64> = tx.query_row(&sql, [&candidate], |r| r.get(0)).optional()?;
        if hit.is_some() {
            return Ok(hit);
        }
    }
    Ok(None)
}

fn unresolved(summary: &mut ImportSummary, what: &str, owner: &str, name: &str) {
    warn!(what, owner, name, "unresolved link skipped");
    summary.skipped += 1;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::VehicleList;
    use gotham_types::EntityKind;
    use std::io::Write;

    const SMALL: &str = r#"{
        "characters": [
            {"name": "Batman", "aliases": ["Bruce Wayne"], "powers": ["Detective skills"]},
            {"name": "Joker"}
        ],
        "vehicles": [
            {"name": "Batmobile", "weapons": ["Missiles"], "users": ["Batman", "Nobody"]}
        ],
        "relationships": [
            {"character": "Batman", "related": "Joker", "type": "Enemy"}
        ]
    }"#;

    fn small_doc() -> SeedDocument {
        serde_json::from_str(SMALL).unwrap()
    }

    #[test]
    fn test_import_document_counts() {
        let store = Store::open_in_memory().unwrap();
        let s = import_document(&store, &small_doc(), "small.json").unwrap();
        assert_eq!(s.entities, 3);
        // alias + power + weapon + one user + relationship
        assert_eq!(s.links, 5);
        assert_eq!(s.skipped, 1, "unknown vehicle user is skipped");
    }

    #[test]
    fn test_relationship_type_is_lowercased() {
        let store = Store::open_in_memory().unwrap();
        import_document(&store, &small_doc(), "small.json").unwrap();
        let (_, batman) = store.find_by_name("Batman").unwrap().unwrap();
        let rel = store.character_relations(batman.id).unwrap();
        assert_eq!(rel.len(), 1);
        assert_eq!(rel[0].relationship, "enemy");
        assert_eq!(rel[0].character.name, "Joker");
    }

    #[test]
    fn test_reimport_adds_nothing() {
        let store = Store::open_in_memory().unwrap();
        import_document(&store, &small_doc(), "small.json").unwrap();
        let again = import_document(&store, &small_doc(), "small.json").unwrap();
        assert_eq!(again.entities, 0);
        let (_, mobile) = store.find_by_name("Batmobile").unwrap().unwrap();
        let weapons = store.vehicle_list(mobile.id, VehicleList::Weapons).unwrap();
        assert_eq!(weapons.len(), 1, "sub-records are not duplicated");
        assert_eq!(again.links, 0, "relationship rows are not duplicated");
        let (_, batman) = store.find_by_name("Batman").unwrap().unwrap();
        assert_eq!(store.character_relations(batman.id).unwrap().len(), 1);
    }

    #[test]
    fn test_reimport_fixture_keeps_relationship_count() {
        let store = Store::open_in_memory().unwrap();
        let doc: SeedDocument = serde_json::from_str(crate::testing::FIXTURE).unwrap();
        import_document(&store, &doc, "fixture.json").unwrap();
        let before = store.stats().unwrap().relationships;
        let again = import_document(&store, &doc, "fixture.json").unwrap();
        assert_eq!(again.links, 0);
        assert_eq!(again.entities, 0);
        assert_eq!(store.stats().unwrap().relationships, before);
    }

    #[test]
    fn test_links_resolve_spaced_names() {
        let doc: SeedDocument = serde_json::from_str(
            r#"{
                "characters": [{"name": "Alfred_Pennyworth"}],
                "locations": [{"name": "Wayne_Manor",
                               "characters": [{"name": "Alfred Pennyworth", "association": "residence"}]}]
            }"#,
        )
        .unwrap();
        let store = Store::open_in_memory().unwrap();
        let s = import_document(&store, &doc, "t.json").unwrap();
        assert_eq!(s.links, 1);
        assert_eq!(s.skipped, 0);
    }

    #[test]
    fn test_import_path_walks_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("batman");
        std::fs::create_dir(&nested).unwrap();
        let mut f = std::fs::File::create(nested.join("core.json")).unwrap();
        f.write_all(SMALL.as_bytes()).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let store = Store::open_in_memory().unwrap();
        let s = import_path(&store, dir.path()).unwrap();
        assert_eq!(s.files, 1);
        assert_eq!(store.entities(EntityKind::Character).unwrap().len(), 2);
    }

    #[test]
    fn test_bad_json_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = read_document(&path).unwrap_err();
        assert!(matches!(err, Error::Json { .. }), "got {err:?}");
    }
}
