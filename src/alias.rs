//! Path alias handling.
//!
//! A path segment may carry a label (`paintingArray#p1`) so that two uses of
//! the same relationship inside one expression can be told apart, or so that
//! one join can be shared by several paths. Labels are bound to the segment
//! name they stand for; a label may be re-bound to the same name any number of
//! times, but never to a different one.

use std::collections::BTreeMap;

use crate::ast::{Expr, Path};

/// Raised when an alias is bound inconsistently or placed on a segment that
/// cannot carry one.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AliasConflictError {
    #[error("alias '{alias}' is already bound to '{existing}', cannot re-bind it to '{conflicting}'")]
    Rebound {
        alias: String,
        existing: String,
        conflicting: String,
    },

    #[error("alias '{alias}' is applied to '{segment}', which is not a relationship")]
    NonRelationship { alias: String, segment: String },

    #[error("invalid path component '{0}'")]
    Malformed(String),
}

/// One dotted component of a raw path string.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSegment<'a> {
    pub base: &'a str,
    pub alias: Option<&'a str>,
    pub outer: bool,
}

/// Split `name#alias+` into its parts.
///
/// ```
/// use qualex::alias::split_segment;
///
/// let seg = split_segment("paintingArray#p1+").unwrap();
/// assert_eq!(seg.base, "paintingArray");
/// assert_eq!(seg.alias, Some("p1"));
/// assert!(seg.outer);
/// ```
pub fn split_segment(raw: &str) -> Result<RawSegment<'_>, AliasConflictError> {
    let (body, outer) = match raw.strip_suffix('+') {
        Some(body) => (body, true),
        None => (raw, false),
    };

    let (base, alias) = match body.split_once('#') {
        Some((base, alias)) => (base, Some(alias)),
        None => (body, None),
    };

    let valid_name = |s: &str| {
        !s.is_empty() && s.chars().all(|c| c.is_alphanumeric() || c == '_')
    };
    if !valid_name(base) || alias.is_some_and(|a| !valid_name(a)) {
        return Err(AliasConflictError::Malformed(raw.to_string()));
    }

    Ok(RawSegment { base, alias, outer })
}

/// Mapping from alias label to the segment name it stands for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasTable {
    bindings: BTreeMap<String, String>,
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `alias` to `segment`. Binding the same pair twice is accepted.
    pub fn bind(&mut self, alias: &str, segment: &str) -> Result<(), AliasConflictError> {
        match self.bindings.get(alias) {
            Some(existing) if existing != segment => Err(AliasConflictError::Rebound {
                alias: alias.to_string(),
                existing: existing.clone(),
                conflicting: segment.to_string(),
            }),
            Some(_) => Ok(()),
            None => {
                self.bindings.insert(alias.to_string(), segment.to_string());
                Ok(())
            }
        }
    }

    pub fn merge(&mut self, other: &AliasTable) -> Result<(), AliasConflictError> {
        for (alias, segment) in &other.bindings {
            self.bind(alias, segment)?;
        }
        Ok(())
    }

    pub fn resolve(&self, alias: &str) -> Option<&str> {
        self.bindings.get(alias).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.bindings.iter().map(|(a, s)| (a.as_str(), s.as_str()))
    }
}

impl<A: Into<String>, S: Into<String>> FromIterator<(A, S)> for AliasTable {
    fn from_iter<I: IntoIterator<Item = (A, S)>>(iter: I) -> Self {
        AliasTable {
            bindings: iter
                .into_iter()
                .map(|(a, s)| (a.into(), s.into()))
                .collect(),
        }
    }
}

/// Collects alias bindings across every path of one expression and then
/// attaches them to segments that refer to a label without re-declaring it.
///
/// `paintingArray#p.estimatedPrice > 10 and p.paintingTitle like "G%"`
/// resolves the second path's `p` to `paintingArray` so that both comparisons
/// share one join.
#[derive(Debug, Default)]
pub struct AliasResolver {
    table: AliasTable,
}

impl AliasResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the bindings declared by `path`.
    pub fn declare(&mut self, path: &Path) -> Result<(), AliasConflictError> {
        self.table.merge(path.aliases())
    }

    pub fn table(&self) -> &AliasTable {
        &self.table
    }

    /// Attach the collected bindings to every path in `expr`.
    pub fn apply(&self, expr: &mut Expr) -> Result<(), AliasConflictError> {
        if self.table.is_empty() {
            return Ok(());
        }
        expr.try_for_each_path_mut(&mut |path| path.attach_aliases(&self.table))
    }

    /// Declare every path in `expr`, then attach the merged table back.
    pub fn resolve(expr: &mut Expr) -> Result<AliasTable, AliasConflictError> {
        let mut resolver = AliasResolver::new();
        expr.try_for_each_path(&mut |path| resolver.declare(path))?;
        resolver.apply(expr)?;
        log::trace!("resolved {} path alias(es)", resolver.table.len());
        Ok(resolver.table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_plain_segment() {
        let seg = split_segment("artistName").unwrap();
        assert_eq!(seg.base, "artistName");
        assert_eq!(seg.alias, None);
        assert!(!seg.outer);
    }

    #[test]
    fn split_rejects_empty_alias() {
        assert!(matches!(
            split_segment("paintingArray#"),
            Err(AliasConflictError::Malformed(_))
        ));
    }

    #[test]
    fn rebinding_same_segment_is_accepted() {
        let mut table = AliasTable::new();
        table.bind("p", "paintingArray").unwrap();
        table.bind("p", "paintingArray").unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn rebinding_other_segment_fails() {
        let mut table = AliasTable::new();
        table.bind("p", "paintingArray").unwrap();
        let err = table.bind("p", "toGallery").unwrap_err();
        assert_eq!(
            err,
            AliasConflictError::Rebound {
                alias: "p".into(),
                existing: "paintingArray".into(),
                conflicting: "toGallery".into(),
            }
        );
    }

    #[test]
    fn merge_detects_conflicts() {
        let mut a: AliasTable = [("x", "artist")].into_iter().collect();
        let b: AliasTable = [("x", "gallery")].into_iter().collect();
        assert!(a.merge(&b).is_err());
    }
}
