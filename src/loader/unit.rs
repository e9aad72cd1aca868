use crate::annotation::{self, Annotations, FieldInfo, ParameterSet};
use crate::syntax::{ParseError, Parser, Program, Tokenizer};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// File extension of Jnane source units.
pub const EXTENSION: &str = "jn";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitLocation {
    File(PathBuf),
    /// Registered from source text.
    Memory,
}

/// One loadable function definition.
///
/// Everything derived from the source text is computed once, when the unit is
/// loaded.
#[derive(Debug)]
pub struct UnitDescriptor {
    name: String,
    location: UnitLocation,
    program: Program,
    annotations: Annotations,
    dependencies: BTreeSet<String>,
}

impl UnitDescriptor {
    pub fn from_source<S: Into<String>>(
        name: S,
        location: UnitLocation,
        source: &str,
    ) -> Result<Self, ParseError> {
        let tokenizer = Tokenizer::from_string(source);
        let mut parser = Parser::new(tokenizer, location_label(&location));
        let program = parser.parse()?;

        Ok(Self {
            name: name.into(),
            location,
            program,
            annotations: annotation::extract(source),
            dependencies: annotation::extract_dependencies(source),
        })
    }

    /// Fully-qualified name, `namespace:identifier`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn location(&self) -> &UnitLocation {
        &self.location
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    /// The `@name ns:id` identity written in the source, if any.
    pub fn declared_identity(&self) -> Option<&str> {
        self.annotations.identity.as_deref()
    }

    pub fn parameters(&self) -> &ParameterSet {
        &self.annotations.parameters
    }

    pub fn fields(&self) -> &BTreeMap<String, FieldInfo> {
        &self.annotations.fields
    }

    pub fn dependencies(&self) -> &BTreeSet<String> {
        &self.dependencies
    }
}

fn location_label(location: &UnitLocation) -> String {
    match location {
        UnitLocation::File(path) => path.display().to_string(),
        UnitLocation::Memory => "-".to_string(),
    }
}

/// Derives the fully-qualified name of the unit at `path` under `root`.
///
/// Directory segments joined by `.` form the namespace and the file stem is the
/// identifier: `root/math/ops/add.jn` is `math.ops:add`. A file directly under
/// `root` has no namespace and is named by its stem alone.
pub fn qualified_name(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let stem = relative.file_stem()?.to_str()?;

    let mut segments = vec![];
    if let Some(parent) = relative.parent() {
        for component in parent.components() {
            match component {
                Component::Normal(segment) => segments.push(segment.to_str()?),
                Component::CurDir => {}
                _ => return None,
            }
        }
    }

    if segments.is_empty() {
        Some(stem.to_string())
    } else {
        Some(format!("{}:{}", segments.join("."), stem))
    }
}

impl fmt::Display for UnitLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitLocation::File(path) => write!(f, "{}", path.display()),
            UnitLocation::Memory => write!(f, "<memory>"),
        }
    }
}
