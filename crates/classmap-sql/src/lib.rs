pub mod migration;
pub use migration::MigrationStatement;

pub mod param;
pub use param::{Accessor, ParamSlot};

pub mod prepare;
pub use prepare::{prepare, NativeStatement, PreparedStatement, ResultColumn};

pub mod serializer;
pub use serializer::{Params, Serializer};

pub mod stmt;
pub use stmt::Statement;
