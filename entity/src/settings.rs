//! SeaORM Entity for the settings table.
//! A minimal key/value store for application state, such as the one-time
//! hardware seed flags.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Longest key the settings table accepts.
pub const MAX_KEY_LEN: usize = 191;
/// Longest value the settings table accepts.
pub const MAX_VALUE_LEN: usize = 1000;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "settings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub key: String,
    pub value: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
