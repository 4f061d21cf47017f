use diesel::prelude::*;
use diesel::sql_types::{BigInt, Integer, Text};

use crate::api::{ItemId, PreviewInfo, SizeInfo};

#[derive(Debug, Clone, QueryableByName)]
pub struct RepostRow {
    #[diesel(sql_type = BigInt)]
    pub item_id: i64,
}

#[derive(Debug, Clone, QueryableByName)]
pub struct SizeRow {
    #[diesel(sql_type = BigInt)]
    pub id: i64,
    #[diesel(sql_type = Integer)]
    pub width: i32,
    #[diesel(sql_type = Integer)]
    pub height: i32,
}

impl From<SizeRow> for SizeInfo {
    fn from(row: SizeRow) -> Self {
        SizeInfo {
            id: ItemId::new(row.id),
            width: row.width,
            height: row.height,
        }
    }
}

#[derive(Debug, Clone, QueryableByName)]
pub struct PreviewRow {
    #[diesel(sql_type = BigInt)]
    pub id: i64,
    #[diesel(sql_type = Integer)]
    pub width: i32,
    #[diesel(sql_type = Integer)]
    pub height: i32,
    #[diesel(sql_type = Text)]
    pub pixels: String,
}

impl From<PreviewRow> for PreviewInfo {
    fn from(row: PreviewRow) -> Self {
        PreviewInfo {
            id: ItemId::new(row.id),
            width: row.width,
            height: row.height,
            pixels: row.pixels,
        }
    }
}

#[derive(Debug, Clone, QueryableByName)]
pub struct ScoreRow {
    #[diesel(sql_type = BigInt)]
    pub timestamp: i64,
    #[diesel(sql_type = Integer)]
    pub score: i32,
}

#[derive(Debug, Clone, QueryableByName)]
pub struct NameRow {
    #[diesel(sql_type = Text)]
    pub name: String,
}
