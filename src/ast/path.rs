use std::fmt;

use crate::alias::{AliasConflictError, AliasTable, split_segment};

/// Which namespace a path navigates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathKind {
    /// Object properties and relationships (the default)
    Object,
    /// Database columns and joins (`db:`)
    Db,
    /// Primary-key columns (`dbid:`)
    DbId,
}

impl PathKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            PathKind::Object => "",
            PathKind::Db => "db:",
            PathKind::DbId => "dbid:",
        }
    }
}

/// One dotted component of a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// The property or relationship name actually navigated
    pub name: String,
    /// Label standing in for this segment (`name#label`)
    pub alias: Option<String>,
    /// Outer-join marker (`name+`)
    pub outer: bool,
}

impl Segment {
    pub fn new(name: impl Into<String>) -> Self {
        Segment {
            name: name.into(),
            alias: None,
            outer: false,
        }
    }

    /// The label if the segment is aliased, otherwise its name.
    pub fn label(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    /// `name#alias+` as written in expression text.
    pub fn canonical(&self) -> String {
        let mut out = self.name.clone();
        if let Some(alias) = &self.alias {
            out.push('#');
            out.push_str(alias);
        }
        if self.outer {
            out.push('+');
        }
        out
    }
}

/// A dotted chain of property and relationship names.
///
/// The alias table holds exactly the bindings used by the path's own segments;
/// it is filled at construction and never changes once the path is part of a
/// finished expression.
///
/// # Examples
///
/// ```
/// use qualex::ast::{Path, PathKind};
///
/// let path = Path::parse("paintingArray#p.toGallery+.galleryName").unwrap();
/// assert_eq!(path.kind(), PathKind::Object);
/// assert_eq!(path.path_string(), "p.toGallery+.galleryName");
/// assert_eq!(path.aliases().resolve("p"), Some("paintingArray"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    kind: PathKind,
    segments: Vec<Segment>,
    aliases: AliasTable,
}

impl Path {
    /// Parse a raw path, honouring a leading `db:` or `dbid:` prefix.
    pub fn parse(raw: &str) -> Result<Path, AliasConflictError> {
        if let Some(rest) = raw.strip_prefix(PathKind::DbId.prefix()) {
            Path::with_kind(PathKind::DbId, rest)
        } else if let Some(rest) = raw.strip_prefix(PathKind::Db.prefix()) {
            Path::with_kind(PathKind::Db, rest)
        } else {
            Path::with_kind(PathKind::Object, raw)
        }
    }

    /// Parse a raw path without prefix detection.
    pub fn with_kind(kind: PathKind, raw: &str) -> Result<Path, AliasConflictError> {
        let segments = raw
            .split('.')
            .map(|component| {
                let parsed = split_segment(component)?;
                Ok(Segment {
                    name: parsed.base.to_string(),
                    alias: parsed.alias.map(str::to_string),
                    outer: parsed.outer,
                })
            })
            .collect::<Result<Vec<_>, AliasConflictError>>()?;
        Path::from_segments(kind, segments)
    }

    pub fn from_segments(kind: PathKind, segments: Vec<Segment>) -> Result<Path, AliasConflictError> {
        if segments.is_empty() {
            return Err(AliasConflictError::Malformed(String::new()));
        }
        let mut aliases = AliasTable::new();
        for segment in &segments {
            if let Some(alias) = &segment.alias {
                aliases.bind(alias, &segment.name)?;
            }
        }
        Ok(Path {
            kind,
            segments,
            aliases,
        })
    }

    pub fn kind(&self) -> PathKind {
        self.kind
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn aliases(&self) -> &AliasTable {
        &self.aliases
    }

    /// Segment labels joined by `.`, with aliases substituted for the
    /// segments they are bound to.
    pub fn path_string(&self) -> String {
        self.segments
            .iter()
            .map(|s| {
                if s.outer {
                    format!("{}+", s.label())
                } else {
                    s.label().to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Bind segments written as a bare label to the segment the label stands
    /// for, and check declared aliases against `table`.
    pub fn attach_aliases(&mut self, table: &AliasTable) -> Result<(), AliasConflictError> {
        for segment in &mut self.segments {
            match &segment.alias {
                Some(alias) => {
                    if let Some(bound) = table.resolve(alias)
                        && bound != segment.name
                    {
                        return Err(AliasConflictError::Rebound {
                            alias: alias.clone(),
                            existing: bound.to_string(),
                            conflicting: segment.name.clone(),
                        });
                    }
                }
                None => {
                    if let Some(bound) = table.resolve(&segment.name) {
                        let label = std::mem::replace(&mut segment.name, bound.to_string());
                        self.aliases.bind(&label, bound)?;
                        segment.alias = Some(label);
                    }
                }
            }
        }
        Ok(())
    }

    pub fn with_aliases(mut self, table: &AliasTable) -> Result<Path, AliasConflictError> {
        self.attach_aliases(table)?;
        Ok(self)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let body = self
            .segments
            .iter()
            .map(Segment::canonical)
            .collect::<Vec<_>>()
            .join(".");
        write!(f, "{}{}", self.kind.prefix(), body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_prefixes() {
        assert_eq!(Path::parse("db:ARTIST_NAME").unwrap().kind(), PathKind::Db);
        assert_eq!(Path::parse("dbid:ARTIST_ID").unwrap().kind(), PathKind::DbId);
        assert_eq!(Path::parse("artistName").unwrap().kind(), PathKind::Object);
    }

    #[test]
    fn outer_marker_on_middle_segment() {
        let path = Path::parse("toArtist+.artistName").unwrap();
        assert!(path.segments()[0].outer);
        assert!(!path.segments()[1].outer);
        assert_eq!(path.to_string(), "toArtist+.artistName");
    }

    #[test]
    fn same_alias_twice_in_one_path_conflicts() {
        let err = Path::parse("toArtist#a.paintingArray#a.paintingTitle").unwrap_err();
        assert!(matches!(err, AliasConflictError::Rebound { .. }));
    }

    #[test]
    fn attach_rewrites_bare_labels() {
        let table: AliasTable = [("split0_1", "paintingArray")].into_iter().collect();
        let path = Path::parse("split0_1.paintingTitle")
            .unwrap()
            .with_aliases(&table)
            .unwrap();
        assert_eq!(path.segments()[0].name, "paintingArray");
        assert_eq!(path.path_string(), "split0_1.paintingTitle");
        assert_eq!(path.to_string(), "paintingArray#split0_1.paintingTitle");
    }

    #[test]
    fn empty_component_is_malformed() {
        assert!(Path::parse("a..b").is_err());
        assert!(Path::parse("").is_err());
    }
}
