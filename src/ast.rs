//! # Qualifier Expressions - Abstract Syntax Tree
//!
//! This module defines the Abstract Syntax Tree (AST) for qualifier
//! expressions: small conditions over a graph of domain objects such as
//!
//! ```text
//! artistName like "Pic%" and paintingArray.estimatedPrice > 3000
//! ```
//!
//! ## Architecture Overview
//!
//! - **[tokens]** - Lexical tokens produced by the lexer
//! - **[path]** - Dotted property paths with aliases and outer-join markers
//! - **[expressions]** - Expression nodes (leaves, operators, joins, lists)
//! - **[operators]** - Binary, unary and pattern operators
//!
//! ## Paths
//!
//! A path navigates from the subject object through relationships to an
//! attribute. Each segment may carry an alias and an outer-join marker:
//!
//! ```text
//! paintingArray#p1.toGallery+.galleryName
//! db:ARTIST_NAME
//! dbid:ARTIST_ID
//! ```
//!
//! ## Precedence
//!
//! From highest to lowest: unary `- ~`, `* /`, `+ -`, `<< >>`, `&`, `^`, `|`,
//! relational (`= != < <= > >= like in between`), `not`, `and`, `or`.
//!
//! ## Constants
//!
//! [`Expr::True`] and [`Expr::False`] are distinct from boolean scalars. An
//! empty `in ()` list folds to `False`, an empty `not in ()` to `True`.
pub mod expressions;
pub mod operators;
pub mod path;
pub mod tokens;

pub use expressions::{EnumRef, Expr, ExprKind};
pub use operators::{BinOp, LikeOp, UnOp};
pub use path::{Path, PathKind, Segment};
pub use tokens::Token;
