//! `Spindle` Query
//!
//! The filter condition tree shared between a query planner and the indexes it
//! consults.
//!
//! # Example
//!
//! ```
//! use spindle_query::{Expr, Variable};
//!
//! let e = Variable::new(0, "e");
//! // FILTER e._from == "vertices/v1" AND e.weight > 3
//! let cond = Expr::attribute(&e, "_from")
//!     .eq(Expr::string("vertices/v1"))
//!     .and(Expr::attribute(&e, "weight").gt(Expr::integer(3)));
//!
//! assert_eq!(cond.conjuncts().len(), 2);
//! ```

#![deny(clippy::unwrap_used)]

pub mod expr;

pub use expr::{BinaryOp, Expr, Literal, UnaryOp, Variable};
