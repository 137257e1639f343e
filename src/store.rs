//! SQLite-backed entity store.
//!
//! Read accessors cover the five entity tables and the auxiliary relation
//! tables. Writes happen only through [`Store::write`], used by the importer.

use std::path::Path;
use std::sync::Mutex;

use gotham_types::{EntityKind, Stats};
use rusqlite::{Connection, OpenFlags, OptionalExtension, Row, Transaction, params};
use tracing::warn;

use crate::error::{Error, Result};

pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS characters (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    url TEXT,
    description TEXT,
    first_appearance TEXT,
    source_file TEXT
);
CREATE TABLE IF NOT EXISTS character_aliases (
    character_id INTEGER NOT NULL REFERENCES characters(id),
    alias TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS character_powers (
    character_id INTEGER NOT NULL REFERENCES characters(id),
    power_ability TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS vehicles (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    url TEXT,
    description TEXT,
    vehicle_type TEXT,
    source_file TEXT
);
CREATE TABLE IF NOT EXISTS vehicle_specifications (
    vehicle_id INTEGER PRIMARY KEY REFERENCES vehicles(id),
    length TEXT,
    width TEXT,
    height TEXT,
    weight TEXT,
    max_speed TEXT,
    engine TEXT,
    armor TEXT,
    crew_capacity TEXT,
    manufacturer TEXT,
    first_appearance TEXT
);
CREATE TABLE IF NOT EXISTS vehicle_weapons (
    vehicle_id INTEGER NOT NULL REFERENCES vehicles(id),
    weapon TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS vehicle_defensive_systems (
    vehicle_id INTEGER NOT NULL REFERENCES vehicles(id),
    defensive_system TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS vehicle_special_features (
    vehicle_id INTEGER NOT NULL REFERENCES vehicles(id),
    special_feature TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS vehicle_aliases (
    vehicle_id INTEGER NOT NULL REFERENCES vehicles(id),
    alias TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS locations (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    url TEXT,
    description TEXT,
    location_type TEXT,
    source_file TEXT
);
CREATE TABLE IF NOT EXISTS storylines (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    url TEXT,
    description TEXT,
    complexity_level TEXT,
    simplified_summary TEXT,
    source_file TEXT
);
CREATE TABLE IF NOT EXISTS organizations (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    url TEXT,
    description TEXT,
    organization_type TEXT,
    alignment TEXT,
    source_file TEXT
);
CREATE TABLE IF NOT EXISTS character_locations (
    character_id INTEGER NOT NULL REFERENCES characters(id),
    location_id INTEGER NOT NULL REFERENCES locations(id),
    association_type TEXT
);
CREATE TABLE IF NOT EXISTS vehicle_users (
    vehicle_id INTEGER NOT NULL REFERENCES vehicles(id),
    character_id INTEGER NOT NULL REFERENCES characters(id)
);
CREATE TABLE IF NOT EXISTS character_relationships (
    character_id INTEGER NOT NULL REFERENCES characters(id),
    related_character_id INTEGER NOT NULL REFERENCES characters(id),
    relationship_type TEXT NOT NULL,
    UNIQUE (character_id, related_character_id, relationship_type)
);
"#;

// ── Row types ────────────────────────────────────────────────────────────

/// The columns shared by every entity table.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityRow {
    pub id: i64,
    pub name: String,
    pub description: String,
}

impl EntityRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AliasRow {
    pub entity_id: i64,
    pub alias: String,
}

/// One-to-one vehicle specification record; every column is optional text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VehicleSpecs {
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

impl VehicleSpecs {
    pub const FIELDS: [&'static str; 10] = [
        "length",
        "width",
        "height",
        "weight",
        "max_speed",
        "engine",
        "armor",
        "crew_capacity",
        "manufacturer",
        "first_appearance",
    ];

    /// Non-blank fields in column order.
    pub fn present(&self) -> Vec<(&'static str, &str)> {
        let values = [
            &self.length,
            &self.width,
            &self.height,
            &self.weight,
            &self.max_speed,
            &self.engine,
            &self.armor,
            &self.crew_capacity,
            &self.manufacturer,
            &self.first_appearance,
        ];
        Self::FIELDS
            .iter()
            .zip(values)
            .filter_map(|(field, v)| {
                let v = v.as_deref()?.trim();
                (!v.is_empty()).then_some((*field, v))
            })
            .collect()
    }
}

/// The three one-to-many string lists hanging off a vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VehicleList {
    Weapons,
    Defenses,
    Features,
}

impl VehicleList {
    fn table_and_column(&self) -> (&'static str, &'static str) {
        match self {
            Self::Weapons => ("vehicle_weapons", "weapon"),
            Self::Defenses => ("vehicle_defensive_systems", "defensive_system"),
            Self::Features => ("vehicle_special_features", "special_feature"),
        }
    }
}

/// A location reached through `character_locations`.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkedLocation {
    pub location: EntityRow,
    pub association: String,
}

/// A character reached through `character_relationships`.
#[derive(Debug, Clone, PartialEq)]
pub struct RelatedCharacter {
    pub character: EntityRow,
    pub relationship: String,
}

// ── Store ────────────────────────────────────────────────────────────────

/// Thread-safe accessor: one connection behind a mutex.
pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    /// Open an existing database for serving queries.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::MissingDatabase(path.to_path_buf()));
        }
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open (or create) a writable database and make sure the schema exists.
    pub fn create(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> rusqlite::Result<T>) -> Result<T> {
        let conn = self.conn.lock().map_err(|_| Error::LockPoisoned)?;
        Ok(f(&conn)?)
    }

    /// Run `f` inside a single transaction, committing on success.
    pub fn write<T>(&self, f: impl FnOnce(&Transaction<'_>) -> Result<T>) -> Result<T> {
        let mut conn = self.conn.lock().map_err(|_| Error::LockPoisoned)?;
        let tx = conn.transaction()?;
        let out = f(&tx)?;
        tx.commit()?;
        Ok(out)
    }

    // ── Entities ──

    pub fn entities(&self, kind: EntityKind) -> Result<Vec<EntityRow>> {
        let sql = format!(
            "SELECT id, name, description FROM {} ORDER BY id",
            kind.table()
        );
        self.with_conn(|c| {
            let mut stmt = c.prepare(&sql)?;
            let rows = stmt.query_map([], EntityRow::from_row)?;
            Ok(collect_rows(rows, kind.table()))
        })
    }

    /// Exact, case-insensitive name lookup across kinds in search order.
    pub fn find_by_name(&self, name: &str) -> Result<Option<(EntityKind, EntityRow)>> {
        for kind in EntityKind::ALL {
            let sql = format!(
                "SELECT id, name, description FROM {} WHERE name = ?1 COLLATE NOCASE ORDER BY id LIMIT 1",
                kind.table()
            );
            let hit = self.with_conn(|c| c.query_row(&sql, [name], EntityRow::from_row).optional())?;
            if let Some(row) = hit {
                return Ok(Some((kind, row)));
            }
        }
        Ok(None)
    }

    /// Case-insensitive substring search on names within one kind.
    pub fn search_names(&self, kind: EntityKind, fragment: &str) -> Result<Vec<EntityRow>> {
        let sql = format!(
            "SELECT id, name, description FROM {} WHERE name LIKE ?1 ORDER BY id",
            kind.table()
        );
        let pattern = format!("%{}%", fragment.trim());
        self.with_conn(|c| {
            let mut stmt = c.prepare(&sql)?;
            let rows = stmt.query_map([pattern], EntityRow::from_row)?;
            Ok(collect_rows(rows, kind.table()))
        })
    }

    /// Alias rows for kinds that carry aliases; empty for the rest.
    pub fn aliases(&self, kind: EntityKind) -> Result<Vec<AliasRow>> {
        let sql = match kind {
            EntityKind::Character => {
                "SELECT character_id, alias FROM character_aliases ORDER BY rowid"
            }
            EntityKind::Vehicle => "SELECT vehicle_id, alias FROM vehicle_aliases ORDER BY rowid",
            _ => return Ok(Vec::new()),
        };
        self.with_conn(|c| {
            let mut stmt = c.prepare(sql)?;
            let rows = stmt.query_map([], |row| {
                Ok(AliasRow {
                    entity_id: row.get(0)?,
                    alias: row.get(1)?,
                })
            })?;
            Ok(collect_rows(rows, "aliases"))
        })
    }

    // ── Character relations ──

    pub fn character_aliases(&self, character_id: i64) -> Result<Vec<String>> {
        self.strings(
            "SELECT alias FROM character_aliases WHERE character_id = ?1 ORDER BY rowid",
            character_id,
        )
    }

    pub fn character_powers(&self, character_id: i64) -> Result<Vec<String>> {
        self.strings(
            "SELECT power_ability FROM character_powers WHERE character_id = ?1 ORDER BY rowid",
            character_id,
        )
    }

    /// Locations linked to a character, in stored order.
    pub fn character_locations(&self, character_id: i64) -> Result<Vec<LinkedLocation>> {
        self.with_conn(|c| {
            let mut stmt = c.prepare(
                "SELECT l.id, l.name, l.description, cl.association_type
                 FROM character_locations cl
                 JOIN locations l ON cl.location_id = l.id
                 WHERE cl.character_id = ?1
                 ORDER BY cl.rowid",
            )?;
            let rows = stmt.query_map([character_id], |row| {
                Ok(LinkedLocation {
                    location: EntityRow::from_row(row)?,
                    association: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                })
            })?;
            Ok(collect_rows(rows, "character_locations"))
        })
    }

    pub fn location_characters(&self, location_id: i64) -> Result<Vec<EntityRow>> {
        self.entity_rows(
            "SELECT c.id, c.name, c.description
             FROM character_locations cl
             JOIN characters c ON cl.character_id = c.id
             WHERE cl.location_id = ?1
             ORDER BY cl.rowid",
            location_id,
        )
    }

    pub fn character_vehicles(&self, character_id: i64) -> Result<Vec<EntityRow>> {
        self.entity_rows(
            "SELECT v.id, v.name, v.description
             FROM vehicle_users vu
             JOIN vehicles v ON vu.vehicle_id = v.id
             WHERE vu.character_id = ?1
             ORDER BY vu.rowid",
            character_id,
        )
    }

    /// Outgoing relationship rows (`character_id = X`), in stored order.
    pub fn character_relations(&self, character_id: i64) -> Result<Vec<RelatedCharacter>> {
        self.with_conn(|c| {
            let mut stmt = c.prepare(
                "SELECT c.id, c.name, c.description, cr.relationship_type
                 FROM character_relationships cr
                 JOIN characters c ON cr.related_character_id = c.id
                 WHERE cr.character_id = ?1
                 ORDER BY cr.rowid",
            )?;
            let rows = stmt.query_map([character_id], |row| {
                Ok(RelatedCharacter {
                    character: EntityRow::from_row(row)?,
                    relationship: row.get(3)?,
                })
            })?;
            Ok(collect_rows(rows, "character_relationships"))
        })
    }

    // ── Vehicle relations ──

    pub fn vehicle_specs(&self, vehicle_id: i64) -> Result<Option<VehicleSpecs>> {
        self.with_conn(|c| {
            c.query_row(
                "SELECT length, width, height, weight, max_speed, engine, armor,
                        crew_capacity, manufacturer, first_appearance
                 FROM vehicle_specifications WHERE vehicle_id = ?1",
                [vehicle_id],
                |row| {
                    Ok(VehicleSpecs {
                        length: row.get(0)?,
                        width: row.get(1)?,
                        height: row.get(2)?,
                        weight: row.get(3)?,
                        max_speed: row.get(4)?,
                        engine: row.get(5)?,
                        armor: row.get(6)?,
                        crew_capacity: row.get(7)?,
                        manufacturer: row.get(8)?,
                        first_appearance: row.get(9)?,
                    })
                },
            )
            .optional()
        })
    }

    pub fn vehicle_list(&self, vehicle_id: i64, list: VehicleList) -> Result<Vec<String>> {
        let (table, column) = list.table_and_column();
        let sql = format!("SELECT {column} FROM {table} WHERE vehicle_id = ?1 ORDER BY rowid");
        self.strings(&sql, vehicle_id)
    }

    pub fn vehicle_users(&self, vehicle_id: i64) -> Result<Vec<EntityRow>> {
        self.entity_rows(
            "SELECT c.id, c.name, c.description
             FROM vehicle_users vu
             JOIN characters c ON vu.character_id = c.id
             WHERE vu.vehicle_id = ?1
             ORDER BY vu.rowid",
            vehicle_id,
        )
    }

    // ── Statistics ──

    pub fn stats(&self) -> Result<Stats> {
        self.with_conn(|c| {
            let count = |table: &str| -> rusqlite::Result<usize> {
                let n: i64 = c.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))?;
                Ok(usize::try_from(n).unwrap_or(0))
            };
            Ok(Stats {
                characters: count("characters")?,
                vehicles: count("vehicles")?,
                locations: count("locations")?,
                storylines: count("storylines")?,
                organizations: count("organizations")?,
                aliases: count("character_aliases")? + count("vehicle_aliases")?,
                relationships: count("character_relationships")?,
            })
        })
    }

    // ── helpers ──

    fn strings(&self, sql: &str, id: i64) -> Result<Vec<String>> {
        self.with_conn(|c| {
            let mut stmt = c.prepare(sql)?;
            let rows = stmt.query_map(params![id], |row| row.get::<_, Option<String>>(0))?;
            Ok(collect_rows(rows, "string list")
                .into_iter()
                .flatten()
                .filter(|s| !s.trim().is_empty())
                .collect())
        })
    }

    fn entity_rows(&self, sql: &str, id: i64) -> Result<Vec<EntityRow>> {
        self.with_conn(|c| {
            let mut stmt = c.prepare(sql)?;
            let rows = stmt.query_map(params![id], EntityRow::from_row)?;
            Ok(collect_rows(rows, "entity list"))
        })
    }
}

/// Keep the well-formed rows; a single bad record never fails the lookup.
fn collect_rows<T>(rows: impl Iterator<Item = rusqlite::Result<T>>, what: &str) -> Vec<T> {
    rows.filter_map(|r| match r {
        Ok(v) => Some(v),
        Err(e) => {
            warn!(table = what, error = %e, "skipping malformed row");
            None
        }
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixture_store;

    #[test]
    fn test_entities_in_id_order() {
        let store = fixture_store();
        let chars = store.entities(EntityKind::Character).unwrap();
        assert_eq!(chars[0].name, "Batman");
        assert!(chars.windows(2).all(|w| w[0].id < w[1].id));
    }

    #[test]
    fn test_find_by_name_case_insensitive() {
        let store = fixture_store();
        let (kind, row) = store.find_by_name("batmobile").unwrap().unwrap();
        assert_eq!(kind, EntityKind::Vehicle);
        assert_eq!(row.name, "Batmobile");
        assert!(store.find_by_name("Bat-Mite").unwrap().is_none());
    }

    #[test]
    fn test_search_names_substring() {
        let store = fixture_store();
        let robins = store.search_names(EntityKind::Character, "robin").unwrap();
        assert_eq!(robins.len(), 4, "four Robin identities in the fixture");
    }

    #[test]
    fn test_vehicle_lists_and_specs() {
        let store = fixture_store();
        let (_, mobile) = store.find_by_name("Batmobile").unwrap().unwrap();
        let weapons = store.vehicle_list(mobile.id, VehicleList::Weapons).unwrap();
        assert_eq!(weapons, vec!["Machine guns", "Grappling hooks", "Missiles"]);
        let specs = store.vehicle_specs(mobile.id).unwrap().unwrap();
        assert_eq!(specs.max_speed.as_deref(), Some("200 mph"));
        assert!(specs.present().iter().any(|(k, _)| *k == "armor"));
    }

    #[test]
    fn test_missing_specs_is_none() {
        let store = fixture_store();
        let (_, cycle) = store.find_by_name("Batcycle").unwrap().unwrap();
        assert!(store.vehicle_specs(cycle.id).unwrap().is_none());
        assert!(store.vehicle_list(cycle.id, VehicleList::Weapons).unwrap().is_empty());
    }

    #[test]
    fn test_character_locations_keep_stored_order() {
        let store = fixture_store();
        let (_, batman) = store.find_by_name("Batman").unwrap().unwrap();
        let locs = store.character_locations(batman.id).unwrap();
        assert_eq!(locs[0].location.name, "Wayne_Manor");
        assert_eq!(locs[0].association, "residence");
    }

    #[test]
    fn test_stats_counts() {
        let store = fixture_store();
        let stats = store.stats().unwrap();
        assert!(stats.characters >= 10);
        assert_eq!(stats.storylines, 1);
        assert_eq!(stats.total_entities(), stats.characters + stats.vehicles + stats.locations + 2);
    }

    #[test]
    fn test_open_missing_database() {
        let dir = tempfile::tempdir().unwrap();
        let err = Store::open(&dir.path().join("nope.db")).err().unwrap();
        assert!(matches!(err, Error::MissingDatabase(_)));
    }
}
