//! ECSQL statement trees.
//!
//! Statements reference classes and properties by name. They are turned into
//! native SQL by the preparer in `classmap-sql`, which resolves every name
//! against the mapping.

mod assignment;
pub use assignment::Assignment;

mod class_ref;
pub use class_ref::ClassRef;

mod cte;
pub use cte::Cte;

mod delete;
pub use delete::Delete;

mod expr;
pub use expr::Expr;

mod expr_and;
pub use expr_and::ExprAnd;

mod expr_binary_op;
pub use expr_binary_op::ExprBinaryOp;

mod expr_in_list;
pub use expr_in_list::ExprInList;

mod expr_is_null;
pub use expr_is_null::ExprIsNull;

mod expr_not;
pub use expr_not::ExprNot;

mod expr_or;
pub use expr_or::ExprOr;

mod expr_param;
pub use expr_param::Param;

mod expr_property;
pub use expr_property::ExprProperty;

mod from_item;
pub use from_item::FromItem;

mod insert;
pub use insert::Insert;

mod op_binary;
pub use op_binary::BinaryOp;

mod options;
pub use options::Options;

mod select;
pub use select::{Select, SelectItem};

mod statement;
pub use statement::Statement;

mod update;
pub use update::Update;

mod value;
pub use value::Value;
