//! Loading mapping declarations from YAML files.
//!
//! Loading is two-phase. Phase one parses every candidate file (and every
//! file reachable through `bases` references) into an arena of immutable raw
//! declarations keyed by canonical path. Phase two resolves inheritance by
//! arena lookups only, producing immutable [`MappingSpec`]s. Broken files are
//! excluded with a warning and never abort the load; files that are not
//! mapping documents at all (or carry unrecognized top-level keys) are
//! silently dropped from the candidate set.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde_yaml::Value as Yaml;

use super::format::Format;
use super::types::{
    ColumnConversion, ColumnTransformations, ColumnType, DirectionalMapping, MappingSpec,
    TransformationEntry, TransformationSet,
};
use super::Mapping;
use crate::error::{RecastError, RecastResult};
use crate::expression::ast::Value;

const RECOGNIZED_KEYS: [&str; 5] = [
    "bases",
    "input_format",
    "output_format",
    "forward_transform",
    "reverse_transform",
];

/// One direction as declared in a file, before inheritance.
#[derive(Debug, Clone, Default)]
struct RawDirection {
    /// Ordered column → entries pairs.
    columns: Vec<(String, Vec<TransformationEntry>)>,
    /// Ordered column → conversion pairs (order kept for deterministic merges).
    conversions: Vec<(String, ColumnConversion)>,
    null_values: Vec<Value>,
}

impl RawDirection {
    fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Overlays another layer on top of this one: per-key replacement for
    /// columns and conversions, wholesale replacement for null sentinels.
    fn overlay(&mut self, layer: &RawDirection) {
        for (column, entries) in &layer.columns {
            match self.columns.iter_mut().find(|(name, _)| name == column) {
                Some(slot) => slot.1 = entries.clone(),
                None => self.columns.push((column.clone(), entries.clone())),
            }
        }
        for (column, conversion) in &layer.conversions {
            match self.conversions.iter_mut().find(|(name, _)| name == column) {
                Some(slot) => slot.1 = conversion.clone(),
                None => self.conversions.push((column.clone(), conversion.clone())),
            }
        }
        if !layer.null_values.is_empty() {
            self.null_values = layer.null_values.clone();
        }
    }
}

/// A parsed-but-unresolved mapping file.
#[derive(Debug, Clone)]
struct RawDeclaration {
    path: PathBuf,
    bases: Vec<String>,
    input_format: Option<Format>,
    output_format: Option<Format>,
    forward: RawDirection,
    reverse: RawDirection,
}

/// The effective view of a declaration after inheritance.
#[derive(Debug, Default)]
struct Effective {
    input_format: Option<Format>,
    output_format: Option<Format>,
    forward: RawDirection,
    reverse: RawDirection,
}

/// Discovers and loads mapping files from a set of search paths.
pub struct MappingLoader {
    search_paths: Vec<PathBuf>,
}

impl MappingLoader {
    pub fn new(search_paths: Vec<PathBuf>) -> Self {
        Self { search_paths }
    }

    /// Loads every `.yml`/`.yaml` file under the search paths, in
    /// lexicographic order per path, search paths in configured order.
    pub fn load(&self) -> RecastResult<Mapping> {
        let mut files = Vec::new();
        for dir in &self.search_paths {
            let entries = match fs::read_dir(dir) {
                Ok(entries) => entries,
                Err(e) => {
                    debug!("mapping search path {} not readable: {}", dir.display(), e);
                    continue;
                }
            };
            let mut found: Vec<PathBuf> = entries
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|path| is_mapping_extension(path))
                .collect();
            found.sort();
            files.extend(found);
        }
        self.load_files(&files)
    }

    /// Loads an explicit list of files, preserving the given declaration
    /// order (earlier files take precedence on duplicate graph edges).
    pub fn load_files(&self, files: &[PathBuf]) -> RecastResult<Mapping> {
        // Phase one: raw declarations for every candidate file.
        let mut arena: HashMap<PathBuf, RawDeclaration> = HashMap::new();
        let mut candidates: Vec<PathBuf> = Vec::new();

        for file in files {
            let path = canonical(file);
            match read_declaration(&path) {
                Ok(Some(raw)) => {
                    if !arena.contains_key(&path) {
                        candidates.push(path.clone());
                        arena.insert(path, raw);
                    }
                }
                Ok(None) => {
                    debug!("ignoring non-mapping document {}", path.display());
                }
                Err(reason) => {
                    warn!("invalid mapping file {}: {}", path.display(), reason);
                }
            }
        }

        // Pull base files that were not among the candidates into the arena,
        // transitively; still phase one, nothing is resolved yet.
        let mut pending: Vec<PathBuf> = candidates.clone();
        let mut visited: HashSet<PathBuf> = candidates.iter().cloned().collect();
        while let Some(path) = pending.pop() {
            let (bases, dir) = match arena.get(&path) {
                Some(raw) => (raw.bases.clone(), parent_of(&raw.path)),
                None => continue,
            };
            for reference in bases {
                let Some(base_path) = self.locate_base(&reference, &dir) else {
                    continue; // reported during resolution
                };
                if !visited.insert(base_path.clone()) {
                    continue;
                }
                match read_declaration(&base_path) {
                    Ok(Some(raw)) => {
                        arena.insert(base_path.clone(), raw);
                        pending.push(base_path);
                    }
                    Ok(None) => {}
                    Err(reason) => {
                        warn!("invalid mapping file {}: {}", base_path.display(), reason);
                    }
                }
            }
        }

        // Phase two: resolve inheritance through arena lookups only.
        let mut specs = Vec::new();
        for path in &candidates {
            match self.resolve_spec(path, &arena) {
                Ok(spec) => specs.push(spec),
                Err(reason) => {
                    warn!("invalid mapping file {}: {}", path.display(), reason);
                }
            }
        }
        Ok(Mapping::new(specs))
    }

    /// Loads a single mapping file, surfacing brokenness as an error instead
    /// of a warning. Non-conforming documents are also errors here, since the
    /// caller asked for this specific file.
    pub fn load_file(&self, file: &Path) -> RecastResult<MappingSpec> {
        let path = canonical(file);
        let invalid = |reason: String| RecastError::InvalidMappingFile {
            path: path.clone(),
            reason,
        };

        let raw = read_declaration(&path)
            .map_err(&invalid)?
            .ok_or_else(|| invalid("not a mapping document".to_string()))?;

        let mut arena = HashMap::new();
        arena.insert(path.clone(), raw);

        // Bases still need to reach the arena before resolution.
        let mut pending = vec![path.clone()];
        let mut visited: HashSet<PathBuf> = pending.iter().cloned().collect();
        while let Some(current) = pending.pop() {
            let (bases, dir) = match arena.get(&current) {
                Some(raw) => (raw.bases.clone(), parent_of(&raw.path)),
                None => continue,
            };
            for reference in bases {
                if let Some(base_path) = self.locate_base(&reference, &dir) {
                    if visited.insert(base_path.clone()) {
                        if let Ok(Some(raw)) = read_declaration(&base_path) {
                            arena.insert(base_path.clone(), raw);
                            pending.push(base_path);
                        }
                    }
                }
            }
        }

        self.resolve_spec(&path, &arena).map_err(invalid)
    }

    fn resolve_spec(
        &self,
        path: &Path,
        arena: &HashMap<PathBuf, RawDeclaration>,
    ) -> Result<MappingSpec, String> {
        let mut stack = Vec::new();
        let effective = self.resolve_effective(path, arena, &mut stack)?;

        let input_format = effective
            .input_format
            .ok_or_else(|| "missing input_format after inheritance".to_string())?;
        let output_format = effective
            .output_format
            .ok_or_else(|| "missing output_format after inheritance".to_string())?;

        let forward = direction_of(&effective.forward, &input_format, &output_format);
        let reverse = direction_of(&effective.reverse, &output_format, &input_format);

        Ok(MappingSpec {
            input_format,
            output_format,
            forward,
            reverse,
        })
    }

    /// Recursively computes the effective declaration: formats resolve to the
    /// first non-empty value in (self, bases in listed order); transformation
    /// sets merge with later bases overriding earlier ones and the current
    /// declaration overriding all bases.
    fn resolve_effective(
        &self,
        path: &Path,
        arena: &HashMap<PathBuf, RawDeclaration>,
        stack: &mut Vec<PathBuf>,
    ) -> Result<Effective, String> {
        if stack.iter().any(|p| p.as_path() == path) {
            return Err(format!("cyclic bases through {}", path.display()));
        }
        let raw = arena
            .get(path)
            .ok_or_else(|| format!("base {} could not be loaded", path.display()))?;

        stack.push(path.to_path_buf());
        let dir = parent_of(&raw.path);
        let mut bases = Vec::with_capacity(raw.bases.len());
        for reference in &raw.bases {
            let base_path = self
                .locate_base(reference, &dir)
                .ok_or_else(|| format!("base '{}' not found", reference))?;
            bases.push(self.resolve_effective(&base_path, arena, stack)?);
        }
        stack.pop();

        let mut effective = Effective::default();
        for base in &bases {
            effective.forward.overlay(&base.forward);
            effective.reverse.overlay(&base.reverse);
        }
        effective.forward.overlay(&raw.forward);
        effective.reverse.overlay(&raw.reverse);

        effective.input_format = raw
            .input_format
            .clone()
            .or_else(|| bases.iter().find_map(|b| b.input_format.clone()));
        effective.output_format = raw
            .output_format
            .clone()
            .or_else(|| bases.iter().find_map(|b| b.output_format.clone()));

        Ok(effective)
    }

    /// Resolves a base reference: path-like references against the directory
    /// of the referencing file, bare names across the referencing directory
    /// and the configured search paths, trying both extensions.
    fn locate_base(&self, reference: &str, referencing_dir: &Path) -> Option<PathBuf> {
        let is_path_like = reference.contains('/')
            || reference.contains(std::path::MAIN_SEPARATOR)
            || reference.ends_with(".yml")
            || reference.ends_with(".yaml");

        if is_path_like {
            let candidate = referencing_dir.join(reference);
            if candidate.is_file() {
                return Some(canonical(&candidate));
            }
            return None;
        }

        let mut dirs: Vec<&Path> = vec![referencing_dir];
        dirs.extend(self.search_paths.iter().map(|p| p.as_path()));
        for dir in dirs {
            for extension in ["yml", "yaml"] {
                let candidate = dir.join(format!("{}.{}", reference, extension));
                if candidate.is_file() {
                    return Some(canonical(&candidate));
                }
            }
        }
        None
    }
}

fn is_mapping_extension(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yml") | Some("yaml")
    )
}

fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

fn parent_of(path: &Path) -> PathBuf {
    path.parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Builds a directional mapping from the merged raw direction, or `None`
/// when the direction declares no columns.
fn direction_of(
    raw: &RawDirection,
    input_format: &Format,
    output_format: &Format,
) -> Option<DirectionalMapping> {
    if raw.is_empty() {
        return None;
    }
    Some(DirectionalMapping {
        input_format: input_format.clone(),
        output_format: output_format.clone(),
        transformations: TransformationSet::new(
            raw.columns
                .iter()
                .map(|(column, entries)| ColumnTransformations {
                    column: column.clone(),
                    entries: entries.clone(),
                })
                .collect(),
        ),
        conversions: raw.conversions.iter().cloned().collect(),
        null_values: raw.null_values.clone(),
    })
}

/// Parses one file into a raw declaration.
///
/// `Ok(None)` means the document is not a candidate at all (not a mapping, or
/// unrecognized top-level keys); `Err` means the document looked like a
/// mapping but is broken.
fn read_declaration(path: &Path) -> Result<Option<RawDeclaration>, String> {
    let text = fs::read_to_string(path).map_err(|e| format!("unreadable: {}", e))?;
    let doc: Yaml = serde_yaml::from_str(&text).map_err(|e| format!("not valid YAML: {}", e))?;

    let Yaml::Mapping(map) = doc else {
        return Ok(None);
    };
    for key in map.keys() {
        match key.as_str() {
            Some(name) if RECOGNIZED_KEYS.contains(&name) => {}
            _ => return Ok(None),
        }
    }

    let bases = match map.get("bases") {
        None => Vec::new(),
        Some(Yaml::Sequence(items)) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| "bases entries must be strings".to_string())
            })
            .collect::<Result<Vec<_>, _>>()?,
        Some(_) => return Err("bases must be a list".to_string()),
    };

    let input_format = map.get("input_format").map(format_of).transpose()?;
    let output_format = map.get("output_format").map(format_of).transpose()?;
    let forward = map
        .get("forward_transform")
        .map(direction_section)
        .transpose()?
        .unwrap_or_default();
    let reverse = map
        .get("reverse_transform")
        .map(direction_section)
        .transpose()?
        .unwrap_or_default();

    Ok(Some(RawDeclaration {
        path: path.to_path_buf(),
        bases,
        input_format,
        output_format,
        forward,
        reverse,
    }))
}

/// A format is either a bare name or `{name, version}`.
fn format_of(value: &Yaml) -> Result<Format, String> {
    match value {
        Yaml::String(name) => Ok(Format::named(name.clone())),
        Yaml::Mapping(map) => {
            let name = map
                .get("name")
                .and_then(Yaml::as_str)
                .ok_or_else(|| "format requires a name".to_string())?;
            let version = match map.get("version") {
                None => "1".to_string(),
                Some(Yaml::String(s)) => s.clone(),
                Some(Yaml::Number(n)) => n.to_string(),
                Some(_) => return Err("format version must be a scalar".to_string()),
            };
            Ok(Format::new(name, version))
        }
        _ => Err("format must be a name or a {name, version} mapping".to_string()),
    }
}

fn direction_section(value: &Yaml) -> Result<RawDirection, String> {
    let map = value
        .as_mapping()
        .ok_or_else(|| "transform section must be a mapping".to_string())?;

    let mut direction = RawDirection::default();
    for (key, section) in map {
        match key.as_str() {
            Some("columns") => direction.columns = columns_section(section)?,
            Some("conversions") => direction.conversions = conversions_section(section)?,
            Some("null_values") => direction.null_values = scalar_list(section)?,
            Some(other) => {
                return Err(format!("unrecognized transform section key '{}'", other))
            }
            None => return Err("transform section keys must be strings".to_string()),
        }
    }
    Ok(direction)
}

fn columns_section(value: &Yaml) -> Result<Vec<(String, Vec<TransformationEntry>)>, String> {
    let map = value
        .as_mapping()
        .ok_or_else(|| "columns must be a mapping".to_string())?;

    let mut columns = Vec::with_capacity(map.len());
    for (key, entries) in map {
        let column = key
            .as_str()
            .ok_or_else(|| "column names must be strings".to_string())?;
        let parsed = match entries {
            Yaml::Sequence(items) => items
                .iter()
                .map(entry_of)
                .collect::<Result<Vec<_>, _>>()?,
            single => vec![entry_of(single)?],
        };
        if parsed.is_empty() {
            return Err(format!("column '{}' has no entries", column));
        }
        columns.push((column.to_string(), parsed));
    }
    Ok(columns)
}

/// An entry is either a bare expression string (unconditional) or a
/// `{transformation, when}` mapping.
fn entry_of(value: &Yaml) -> Result<TransformationEntry, String> {
    match value {
        Yaml::String(expr) => Ok(TransformationEntry::new(expr.clone())),
        Yaml::Mapping(map) => {
            let transformation = map
                .get("transformation")
                .map(expression_text)
                .transpose()?
                .ok_or_else(|| "entry requires a transformation".to_string())?;
            let when = map
                .get("when")
                .map(expression_text)
                .transpose()?
                .unwrap_or_else(|| "True".to_string());
            for key in map.keys() {
                match key.as_str() {
                    Some("transformation") | Some("when") => {}
                    _ => return Err("entry keys are 'transformation' and 'when'".to_string()),
                }
            }
            Ok(TransformationEntry { when, transformation })
        }
        _ => Err("entry must be an expression or a {transformation, when} mapping".to_string()),
    }
}

/// Renders a YAML scalar as expression text. Unquoted `True`/`False` arrive
/// as YAML booleans; numbers are accepted as literal expressions.
fn expression_text(value: &Yaml) -> Result<String, String> {
    match value {
        Yaml::String(s) => Ok(s.clone()),
        Yaml::Bool(true) => Ok("True".to_string()),
        Yaml::Bool(false) => Ok("False".to_string()),
        Yaml::Number(n) => Ok(n.to_string()),
        _ => Err("expressions must be scalars".to_string()),
    }
}

fn conversions_section(value: &Yaml) -> Result<Vec<(String, ColumnConversion)>, String> {
    let map = value
        .as_mapping()
        .ok_or_else(|| "conversions must be a mapping".to_string())?;

    let mut conversions = Vec::with_capacity(map.len());
    for (key, spec) in map {
        let column = key
            .as_str()
            .ok_or_else(|| "conversion column names must be strings".to_string())?;
        conversions.push((column.to_string(), conversion_of(column, spec)?));
    }
    Ok(conversions)
}

fn conversion_of(column: &str, value: &Yaml) -> Result<ColumnConversion, String> {
    let map = value
        .as_mapping()
        .ok_or_else(|| format!("conversion for '{}' must be a mapping", column))?;

    let tag = map
        .get("type")
        .and_then(Yaml::as_str)
        .ok_or_else(|| format!("conversion for '{}' requires a type", column))?;
    let column_type = ColumnType::parse(tag)
        .ok_or_else(|| format!("unknown conversion type '{}' for '{}'", tag, column))?;

    let nullable = match map.get("nullable") {
        None => false,
        Some(Yaml::Bool(b)) => *b,
        Some(_) => return Err(format!("nullable for '{}' must be a boolean", column)),
    };
    let null_values = match map.get("null_values") {
        None => Vec::new(),
        Some(list) => scalar_list(list)?,
    };

    for key in map.keys() {
        match key.as_str() {
            Some("type") | Some("nullable") | Some("null_values") => {}
            _ => return Err(format!("unrecognized conversion key for '{}'", column)),
        }
    }

    Ok(ColumnConversion {
        column_type,
        nullable,
        null_values,
    })
}

fn scalar_list(value: &Yaml) -> Result<Vec<Value>, String> {
    let items = value
        .as_sequence()
        .ok_or_else(|| "null_values must be a list".to_string())?;
    items.iter().map(scalar_of).collect()
}

fn scalar_of(value: &Yaml) -> Result<Value, String> {
    match value {
        Yaml::Null => Ok(Value::Null),
        Yaml::Bool(b) => Ok(Value::Bool(*b)),
        Yaml::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::Int(i))
            } else {
                Ok(Value::Float(n.as_f64().unwrap_or(f64::NAN)))
            }
        }
        Yaml::String(s) => Ok(Value::Str(s.clone())),
        _ => Err("expected a scalar value".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_simple_mapping() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "ab.yml",
            r#"
input_format: a
output_format: b
forward_transform:
  columns:
    c: "a * 2"
    d:
      - transformation: "b + 3"
        when: "b is not 0"
      - "b"
  conversions:
    a: {type: int}
"#,
        );

        let loader = MappingLoader::new(vec![dir.path().to_path_buf()]);
        let mapping = loader.load().unwrap();
        assert_eq!(mapping.specs().len(), 1);

        let spec = &mapping.specs()[0];
        assert_eq!(spec.input_format, Format::named("a"));
        let forward = spec.forward.as_ref().unwrap();
        assert_eq!(forward.transformations.columns.len(), 2);
        assert_eq!(forward.transformations.columns[0].column, "c");
        assert_eq!(forward.transformations.columns[1].entries.len(), 2);
        assert_eq!(
            forward.conversions.get("a").unwrap().column_type,
            ColumnType::Int
        );
        assert!(spec.reverse.is_none());
    }

    #[test]
    fn test_non_mapping_documents_silently_excluded() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "list.yml", "- just\n- a\n- list\n");
        write(
            dir.path(),
            "other.yml",
            "input_format: a\noutput_format: b\nunexpected_key: 1\n",
        );
        write(
            dir.path(),
            "good.yml",
            "input_format: a\noutput_format: b\nforward_transform:\n  columns:\n    x: 'a'\n",
        );

        let loader = MappingLoader::new(vec![dir.path().to_path_buf()]);
        let mapping = loader.load().unwrap();
        assert_eq!(mapping.specs().len(), 1);
    }

    #[test]
    fn test_broken_candidate_excluded_with_remaining_load() {
        let dir = TempDir::new().unwrap();
        // Missing output_format: a candidate, but invalid after inheritance.
        write(
            dir.path(),
            "broken.yml",
            "input_format: a\nforward_transform:\n  columns:\n    x: 'a'\n",
        );
        write(
            dir.path(),
            "good.yml",
            "input_format: a\noutput_format: b\nforward_transform:\n  columns:\n    x: 'a'\n",
        );

        let loader = MappingLoader::new(vec![dir.path().to_path_buf()]);
        let mapping = loader.load().unwrap();
        assert_eq!(mapping.specs().len(), 1);
    }

    #[test]
    fn test_inheritance_precedence() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "first.yml",
            r#"
input_format: base_in
output_format: base_out
forward_transform:
  columns:
    a: "'from first'"
    b: "'from first'"
    c: "'from first'"
"#,
        );
        write(
            dir.path(),
            "second.yml",
            r#"
forward_transform:
  columns:
    b: "'from second'"
    c: "'from second'"
"#,
        );
        let child = write(
            dir.path(),
            "child.yml",
            r#"
bases: [first, second]
forward_transform:
  columns:
    c: "'from child'"
    e: "'from child'"
"#,
        );

        let loader = MappingLoader::new(vec![dir.path().to_path_buf()]);
        let spec = loader.load_file(&child).unwrap();

        assert_eq!(spec.input_format, Format::named("base_in"));
        assert_eq!(spec.output_format, Format::named("base_out"));

        let forward = spec.forward.unwrap();
        let entry = |col: &str| {
            forward
                .transformations
                .columns
                .iter()
                .find(|c| c.column == col)
                .map(|c| c.entries[0].transformation.clone())
        };
        assert_eq!(entry("a").unwrap(), "'from first'");
        assert_eq!(entry("b").unwrap(), "'from second'");
        assert_eq!(entry("c").unwrap(), "'from child'");
        assert_eq!(entry("e").unwrap(), "'from child'");
    }

    #[test]
    fn test_base_by_relative_path() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("shared")).unwrap();
        write(
            &dir.path().join("shared"),
            "common.yaml",
            "input_format: a\noutput_format: b\nforward_transform:\n  columns:\n    x: 'a'\n",
        );
        let child = write(
            dir.path(),
            "child.yml",
            "bases: [shared/common.yaml]\nforward_transform:\n  columns:\n    y: 'a'\n",
        );

        let loader = MappingLoader::new(vec![dir.path().to_path_buf()]);
        let spec = loader.load_file(&child).unwrap();
        assert_eq!(spec.input_format, Format::named("a"));
        let forward = spec.forward.unwrap();
        assert_eq!(forward.transformations.columns.len(), 2);
    }

    #[test]
    fn test_unresolvable_base_is_invalid() {
        let dir = TempDir::new().unwrap();
        let child = write(
            dir.path(),
            "child.yml",
            "bases: [nowhere]\ninput_format: a\noutput_format: b\nforward_transform:\n  columns:\n    x: 'a'\n",
        );

        let loader = MappingLoader::new(vec![dir.path().to_path_buf()]);
        let err = loader.load_file(&child).unwrap_err();
        assert!(matches!(err, RecastError::InvalidMappingFile { .. }));

        // Bulk loading excludes it without failing.
        let mapping = loader.load().unwrap();
        assert!(mapping.specs().is_empty());
    }

    #[test]
    fn test_cyclic_bases_are_invalid() {
        let dir = TempDir::new().unwrap();
        let a = write(
            dir.path(),
            "a.yml",
            "bases: [b]\ninput_format: a\noutput_format: b\nforward_transform:\n  columns:\n    x: 'a'\n",
        );
        write(dir.path(), "b.yml", "bases: [a]\nforward_transform:\n  columns:\n    y: 'a'\n");

        let loader = MappingLoader::new(vec![dir.path().to_path_buf()]);
        let err = loader.load_file(&a).unwrap_err();
        assert!(matches!(err, RecastError::InvalidMappingFile { .. }));
    }

    #[test]
    fn test_reverse_and_formats_with_versions() {
        let dir = TempDir::new().unwrap();
        let file = write(
            dir.path(),
            "ab.yml",
            r#"
input_format: {name: a, version: 2}
output_format: b
forward_transform:
  columns:
    x: "a"
reverse_transform:
  columns:
    a: "x"
"#,
        );

        let loader = MappingLoader::new(vec![dir.path().to_path_buf()]);
        let spec = loader.load_file(&file).unwrap();
        assert_eq!(spec.input_format, Format::new("a", "2"));
        let reverse = spec.reverse.unwrap();
        assert_eq!(reverse.input_format, Format::named("b"));
        assert_eq!(reverse.output_format, Format::new("a", "2"));
    }

    #[test]
    fn test_null_value_sentinels_parse() {
        let dir = TempDir::new().unwrap();
        let file = write(
            dir.path(),
            "nulls.yml",
            r#"
input_format: a
output_format: b
forward_transform:
  columns:
    x: "a"
  conversions:
    a: {type: int, nullable: true, null_values: [~, "NULL"]}
"#,
        );

        let loader = MappingLoader::new(vec![dir.path().to_path_buf()]);
        let spec = loader.load_file(&file).unwrap();
        let forward = spec.forward.unwrap();
        let conversion = &forward.conversions["a"];
        assert!(conversion.nullable);
        assert_eq!(
            conversion.null_values,
            vec![Value::Null, Value::Str("NULL".to_string())]
        );
    }
}
