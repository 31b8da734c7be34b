//! Migration source - loads and orders migrations from a provider

use std::collections::BTreeMap;

use crate::domain::result::{Error, Result};
use crate::domain::Migration;
use crate::ports::MigrationFileProvider;

/// Loads every migration a provider offers
pub struct MigrationSource<'a> {
    provider: &'a dyn MigrationFileProvider,
}

impl<'a> MigrationSource<'a> {
    pub fn new(provider: &'a dyn MigrationFileProvider) -> Self {
        Self { provider }
    }

    /// Parse every file and return migrations sorted ascending by version
    ///
    /// All filenames are parsed before anything is returned, so one bad
    /// name or a repeated version fails the whole load.
    pub fn load_all(&self) -> Result<Vec<Migration>> {
        let files = self.provider.files()?;

        let mut by_version: BTreeMap<i64, Migration> = BTreeMap::new();
        for file in &files {
            let migration = Migration::from_file(file)?;
            if let Some(existing) = by_version.get(&migration.version) {
                let (first, second) = ordered_pair(&existing.description, &migration.description);
                return Err(Error::DuplicateVersion {
                    version: migration.version,
                    first,
                    second,
                });
            }
            by_version.insert(migration.version, migration);
        }

        tracing::debug!(
            "Loaded {} migrations from {}",
            by_version.len(),
            self.provider.origin()
        );

        Ok(by_version.into_values().collect())
    }
}

fn ordered_pair(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::EmbeddedMigrations;

    const OUT_OF_ORDER: &[(&str, &str)] = &[
        ("2025-12-07-001.sql", "SELECT 2;"),
        ("2025-11-29-001.sql", "SELECT 1;"),
        ("2026-01-15-002.sql", "SELECT 4;"),
        ("2026-01-15-001.sql", "SELECT 3;"),
    ];

    #[test]
    fn test_load_all_sorts_ascending() {
        let provider = EmbeddedMigrations::new("test", OUT_OF_ORDER);
        let migrations = MigrationSource::new(&provider).load_all().unwrap();

        let versions: Vec<i64> = migrations.iter().map(|m| m.version).collect();
        assert_eq!(
            versions,
            vec![20251129001, 20251207001, 20260115001, 20260115002]
        );
        assert_eq!(migrations[0].description, "2025-11-29-001");
        assert_eq!(migrations[0].sql, "SELECT 1;");
    }

    #[test]
    fn test_one_bad_filename_fails_the_load() {
        const WITH_BAD: &[(&str, &str)] = &[
            ("2025-11-29-001.sql", "SELECT 1;"),
            ("2025-12-07-abc.sql", "SELECT 2;"),
        ];
        let provider = EmbeddedMigrations::new("test", WITH_BAD);

        let err = MigrationSource::new(&provider).load_all().unwrap_err();
        assert!(matches!(err, Error::FilenameParse { ref filename, .. } if filename == "2025-12-07-abc.sql"));
    }

    #[test]
    fn test_duplicate_version_fails_the_load() {
        // Both reduce to 20251129001
        const DUPLICATE: &[(&str, &str)] = &[
            ("2025-11-29-001.sql", "SELECT 1;"),
            ("20251129-001.sql", "SELECT 1;"),
        ];
        let provider = EmbeddedMigrations::new("test", DUPLICATE);

        let err = MigrationSource::new(&provider).load_all().unwrap_err();
        match err {
            Error::DuplicateVersion { version, first, second } => {
                assert_eq!(version, 20251129001);
                assert_eq!(first, "2025-11-29-001");
                assert_eq!(second, "20251129-001");
            }
            other => panic!("expected DuplicateVersion, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_set_loads_nothing() {
        let provider = EmbeddedMigrations::new("empty", &[]);
        assert!(MigrationSource::new(&provider).load_all().unwrap().is_empty());
    }
}
