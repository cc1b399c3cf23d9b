//! Fixture file loading.

use crate::{CitationFixture, SpecError};
use std::fs;
use std::path::Path;

/// Parse a fixture from TOML text. `path` is only used in errors.
pub fn parse_fixture(path: &str, content: &str) -> Result<CitationFixture, SpecError> {
    toml::from_str(content).map_err(|e| SpecError::Parse {
        path: path.to_string(),
        message: e.to_string(),
    })
}

/// Load a single fixture file.
pub fn load_fixture(path: &Path) -> Result<CitationFixture, SpecError> {
    let content = fs::read_to_string(path).map_err(|e| SpecError::Load {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    parse_fixture(&path.display().to_string(), &content)
}

/// Load all fixtures from a directory (glob: **/*.toml), sorted by their
/// path relative to `dir`.
pub fn load_all_fixtures(dir: &Path) -> Result<Vec<(String, CitationFixture)>, SpecError> {
    let mut fixtures = Vec::new();
    load_fixtures_recursive(dir, dir, &mut fixtures)?;
    fixtures.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(fixtures)
}

fn load_fixtures_recursive(
    base: &Path,
    dir: &Path,
    fixtures: &mut Vec<(String, CitationFixture)>,
) -> Result<(), SpecError> {
    if !dir.is_dir() {
        return Ok(());
    }

    for entry in fs::read_dir(dir).map_err(|e| SpecError::Load {
        path: dir.display().to_string(),
        message: e.to_string(),
    })? {
        let entry = entry.map_err(|e| SpecError::Load {
            path: dir.display().to_string(),
            message: e.to_string(),
        })?;
        let path = entry.path();

        if path.is_dir() {
            load_fixtures_recursive(base, &path, fixtures)?;
        } else if path.extension().map_or(false, |e| e == "toml") {
            let relative = path.strip_prefix(base).unwrap_or(&path);
            let fixture = load_fixture(&path)?;
            fixtures.push((relative.display().to_string(), fixture));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_fixture() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("fixtures")
            .join("library-document.toml");
        let fixture = load_fixture(&path).unwrap();
        assert!(fixture.title.is_some());
        assert!(fixture.source.contains("<library-document"));
    }

    #[test]
    fn test_load_all_fixtures() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures");
        let fixtures = load_all_fixtures(&dir).unwrap();
        assert!(fixtures.len() >= 5);
        assert!(fixtures.windows(2).all(|w| w[0].0 <= w[1].0));
    }

    #[test]
    fn test_missing_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let fixtures = load_all_fixtures(&dir.path().join("nope")).unwrap();
        assert!(fixtures.is_empty());
    }

    #[test]
    fn test_nested_and_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        let mut file = std::fs::File::create(dir.path().join("nested").join("a.toml")).unwrap();
        writeln!(file, "source = \"um\"\ngenerated = \"dois\"").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let fixtures = load_all_fixtures(dir.path()).unwrap();
        assert_eq!(fixtures.len(), 1);
        assert_eq!(fixtures[0].1.generated, "dois");
        assert_eq!(fixtures[0].1.expect, Default::default());
    }

    #[test]
    fn test_parse_error_names_the_file() {
        let err = parse_fixture("bad.toml", "source = 1").unwrap_err();
        match err {
            SpecError::Parse { path, .. } => assert_eq!(path, "bad.toml"),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_unknown_expectation_is_rejected() {
        let text = "source = \"a\"\ngenerated = \"b\"\n[expect]\ncitation = 1\n";
        assert!(parse_fixture("typo.toml", text).is_err());
    }
}
