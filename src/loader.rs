mod graph;
mod unit;

pub use graph::{detect_cycles, CycleError, DependencyGraph};
pub use unit::{qualified_name, UnitDescriptor, UnitLocation, EXTENSION};

use crate::syntax::ParseError;
use log::{debug, info, warn};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to read {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("`{name}` ({location}): {source}")]
    Parse {
        name: String,
        location: UnitLocation,
        #[source]
        source: ParseError,
    },

    #[error("{} is not a source unit under {}", .path.display(), .root.display())]
    NotAUnit { path: PathBuf, root: PathBuf },

    #[error("{} dependency cycle(s) detected: {}", .0.len(), cycle_edges(.0))]
    Cycles(Vec<CycleError>),
}

fn cycle_edges(errors: &[CycleError]) -> String {
    errors
        .iter()
        .map(|err| format!("{} -> {}", err.from, err.to))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Collects unit descriptors, then checks their reference graph for cycles.
#[derive(Debug, Default)]
pub struct Loader {
    units: BTreeMap<String, UnitDescriptor>,
    loaded_files: HashSet<PathBuf>,
    errors: Vec<CycleError>,
}

impl Loader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads every `.jn` unit under `root`, then runs one cycle-check pass.
    ///
    /// Hidden entries are skipped. Entries are visited in sorted order.
    pub fn load_directory<P: AsRef<Path>>(&mut self, root: P) -> Result<(), LoadError> {
        let root = root.as_ref();
        let mut files = vec![];

        discover(root, &mut files)?;
        files.sort();

        debug!("{} unit(s) found under {}", files.len(), root.display());

        for path in &files {
            self.load_file(root, path)?;
        }

        self.detect_cycles();
        info!(
            "{} unit(s) loaded from {}",
            self.units.len(),
            root.display()
        );

        Ok(())
    }

    /// Loads the unit at `path`, named relative to `root`. Idempotent per path.
    pub fn load_file(&mut self, root: &Path, path: &Path) -> Result<(), LoadError> {
        if self.loaded_files.contains(path) {
            return Ok(());
        }

        let name = qualified_name(root, path).ok_or_else(|| LoadError::NotAUnit {
            path: path.to_path_buf(),
            root: root.to_path_buf(),
        })?;
        let source = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        self.register(name, UnitLocation::File(path.to_path_buf()), &source)?;
        self.loaded_files.insert(path.to_path_buf());

        Ok(())
    }

    /// Registers a unit from source text. Idempotent per name.
    pub fn load_source<S: Into<String>>(&mut self, name: S, source: &str) -> Result<(), LoadError> {
        let name = name.into();

        if self.units.contains_key(&name) {
            return Ok(());
        }

        self.register(name, UnitLocation::Memory, source)
    }

    fn register(
        &mut self,
        name: String,
        location: UnitLocation,
        source: &str,
    ) -> Result<(), LoadError> {
        let unit = match UnitDescriptor::from_source(name.as_str(), location.clone(), source) {
            Ok(unit) => unit,
            Err(source) => {
                return Err(LoadError::Parse {
                    name,
                    location,
                    source,
                })
            }
        };

        if let Some(identity) = unit.declared_identity() {
            if identity != name {
                warn!(
                    "{}: declares `@name {}`, registered as `{}`",
                    location, identity, name
                );
            }
        }

        debug!(
            "loaded `{}` from {}, dependencies: {:?}",
            name,
            location,
            unit.dependencies()
        );
        self.units.insert(name, unit);

        Ok(())
    }

    /// Checks the reference graph of every loaded unit. Replaces previous results.
    pub fn detect_cycles(&mut self) {
        let graph: DependencyGraph = self
            .units
            .iter()
            .map(|(name, unit)| (name.clone(), unit.dependencies().clone()))
            .collect();

        self.errors = detect_cycles(&graph);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn errors(&self) -> &[CycleError] {
        &self.errors
    }

    pub fn get(&self, name: &str) -> Option<&UnitDescriptor> {
        self.units.get(name)
    }

    pub fn units(&self) -> impl Iterator<Item = &UnitDescriptor> {
        self.units.values()
    }

    /// Freezes the loaded units. Fails if the last cycle check found cycles.
    pub fn into_library(self) -> Result<Library, LoadError> {
        if self.has_errors() {
            return Err(LoadError::Cycles(self.errors));
        }

        Ok(Library { units: self.units })
    }
}

fn discover(dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), LoadError> {
    let io_error = |source| LoadError::Io {
        path: dir.to_path_buf(),
        source,
    };

    for entry in fs::read_dir(dir).map_err(io_error)? {
        let path = entry.map_err(io_error)?.path();

        // Skip hidden files and directories
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            if name.starts_with('.') {
                continue;
            }
        }

        if path.is_dir() {
            discover(&path, files)?;
        } else if path.extension().map_or(false, |ext| ext == EXTENSION) {
            files.push(path);
        }
    }

    Ok(())
}

/// Loaded units, read-only after loading.
#[derive(Debug, Default)]
pub struct Library {
    units: BTreeMap<String, UnitDescriptor>,
}

impl Library {
    pub fn get(&self, name: &str) -> Option<&UnitDescriptor> {
        self.units.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.units.contains_key(name)
    }

    pub fn units(&self) -> impl Iterator<Item = &UnitDescriptor> {
        self.units.values()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}
