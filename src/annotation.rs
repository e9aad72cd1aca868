//! Annotation lines of a Jnane unit.
//!
//! ```text
//! @name test:add          unit identity (contains `:`)
//! @optional               the next parameter declaration is optional
//! @arg first Entier       parameter
//! @name second            parameter (no `:`)
//! @field resultat: Entier post-execution obligation
//! @view total: Montant    post-execution obligation, registers a view type
//! ```
use log::debug;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::OnceLock;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInfo {
    pub ty: String,
    pub is_view: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Parameter {
    /// Declared type, informational only.
    pub ty: Option<String>,
    pub optional: bool,
}

/// Declared parameters of a function, optional ones included.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParameterSet {
    parameters: BTreeMap<String, Parameter>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<S: Into<String>>(&mut self, name: S, ty: Option<String>, optional: bool) {
        self.parameters.insert(name.into(), Parameter { ty, optional });
    }

    pub fn contains(&self, name: &str) -> bool {
        self.parameters.contains_key(name)
    }

    pub fn is_optional(&self, name: &str) -> bool {
        self.parameters
            .get(name)
            .map_or(false, |param| param.optional)
    }

    pub fn required(&self) -> impl Iterator<Item = &str> {
        self.parameters
            .iter()
            .filter(|(_, param)| !param.optional)
            .map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Parameter)> {
        self.parameters
            .iter()
            .map(|(name, param)| (name.as_str(), param))
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Annotations {
    /// `@name ns:id`
    pub identity: Option<String>,
    pub parameters: ParameterSet,
    /// `@field` / `@view` declarations by variable name.
    pub fields: BTreeMap<String, FieldInfo>,
}

fn field_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"(?i)@(field|view)[ \t]+(\w+)(?:[ \t]*:[ \t]*|[ \t]+)(\S+)")
            .expect("field regex must compile")
    })
}

fn identity_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"^@name[ \t]+([\w.]+:\w+)").expect("identity regex must compile")
    })
}

fn parameter_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"^@(?:arg|name)[ \t]+(\w+)(?:[ \t]*:?[ \t]*([A-Za-z_]\w*))?")
            .expect("parameter regex must compile")
    })
}

fn call_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"([A-Za-z_][\w.]*):([A-Za-z_]\w*)[ \t]*\(").expect("call regex must compile")
    })
}

pub fn extract(source: &str) -> Annotations {
    let mut annotations = Annotations::default();
    let mut pending_optional = false;

    for line in source.lines() {
        let mut line = line.trim();

        if let Some(rest) = line.strip_prefix("@optional") {
            pending_optional = true;
            line = rest.trim_start();

            if line.is_empty() {
                continue;
            }
        }

        if let Some(captures) = identity_regex().captures(line) {
            if annotations.identity.is_none() {
                annotations.identity = Some(captures[1].to_string());
            }
        } else if let Some(captures) = parameter_regex().captures(line) {
            let name = &captures[1];
            let ty = captures.get(2).map(|ty| ty.as_str().to_string());

            debug!(
                "parameter `{}` ({})",
                name,
                if pending_optional { "optional" } else { "required" }
            );
            annotations.parameters.insert(name, ty, pending_optional);
        }

        if line.starts_with('@') {
            for captures in field_regex().captures_iter(line) {
                let is_view = captures[1].eq_ignore_ascii_case("view");
                let info = FieldInfo {
                    ty: captures[3].to_string(),
                    is_view,
                };

                debug!("annotation {} {}", &captures[2], info);
                annotations
                    .fields
                    .entry(captures[2].to_string())
                    .or_insert(info);
            }
        }

        pending_optional = false;
    }

    annotations
}

/// Fully-qualified names this source calls, in `ns:id(` form.
///
/// Comment lines and annotation lines are skipped.
pub fn extract_dependencies(source: &str) -> BTreeSet<String> {
    let mut dependencies = BTreeSet::new();

    for line in source.lines() {
        let line = line.trim_start();

        if line.starts_with("//") || line.starts_with('@') {
            continue;
        }

        for captures in call_regex().captures_iter(line) {
            dependencies.insert(format!("{}:{}", &captures[1], &captures[2]));
        }
    }

    dependencies
}

impl fmt::Display for FieldInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keyword = if self.is_view { "@view" } else { "@field" };
        write!(f, "{}: {}", keyword, self.ty)
    }
}
