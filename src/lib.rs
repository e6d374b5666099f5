//! Qualifier expressions: a small language for filtering object graphs.
//!
//! ```
//! use qualex::{parse, Evaluator};
//! use qualex::json::JsonObjectModel;
//! use serde_json::json;
//!
//! let expr = parse("artistName like 'Pic%' and paintingArray.estimatedPrice > 3000").unwrap();
//!
//! let artist = JsonObjectModel::object(json!({
//!     "artistName": "Picasso",
//!     "paintingArray": [{"estimatedPrice": 5000}]
//! }));
//! let model = JsonObjectModel::new();
//!
//! assert!(Evaluator::new(&model).matches(&expr, &artist).unwrap());
//! ```
pub mod accessor;
pub mod alias;
pub mod ast;
pub mod evaluator;
pub mod factory;
pub mod json;
pub mod lexer;
pub mod like;
pub mod output;
pub mod parser;
pub mod transform;
pub mod translate;
pub mod traversal;
pub mod value;

#[cfg(feature = "cli")]
pub mod cli;

pub use accessor::{AccessError, EnumResolver, EnumTable, PropertyAccessor, PropertyKind};
pub use alias::{AliasConflictError, AliasResolver, AliasTable};
pub use ast::{BinOp, EnumRef, Expr, ExprKind, LikeOp, Path, PathKind, Segment, Token, UnOp};
pub use evaluator::{EvalError, Evaluator};
pub use factory::FactoryError;
pub use lexer::{LexError, Lexer, Position};
pub use parser::{ParseError, ParseOptions, Parser, parse, parse_with};
pub use transform::BindError;
pub use translate::{MarkerStyle, ParameterizedRenderer, RenderError, RenderOptions, Rendered};
pub use traversal::{NodeCounter, TraversalHandler};
pub use value::{ObjectRef, Value};
