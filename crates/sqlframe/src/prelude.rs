//! Convenient imports for typical `sqlframe` usage.
//!
//! ```ignore
//! use sqlframe::prelude::*;
//! ```

pub use crate::{
    Condition, Data, Db, DbConfig, DbError, DbResult, Fragment, GenericClient, PageInfo, Record,
    SearchPolicy, Selector, Value, Where, args,
};

#[cfg(feature = "mysql")]
pub use crate::MySqlClient;
