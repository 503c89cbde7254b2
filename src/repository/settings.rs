//! Runtime bot settings stored as JSON key/value pairs.
//!
//! These are the knobs the admin API can flip without a redeploy
//! (auto-fix enabled, batch size, excluded page types).

use std::collections::BTreeMap;

use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::schema::bot_settings;

use super::models::SettingRecord;
use super::pool::{DbError, SqlitePool};

#[derive(Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Fetch one setting as parsed JSON.
    pub async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, DbError> {
        let mut conn = self.pool.get().await?;
        let record: Option<SettingRecord> = bot_settings::table
            .find(key)
            .first(&mut conn)
            .await
            .optional()?;
        Ok(record.and_then(|r| serde_json::from_str(&r.setting_value).ok()))
    }

    /// Fetch every setting, keyed by name.
    pub async fn get_all(&self) -> Result<BTreeMap<String, serde_json::Value>, DbError> {
        let mut conn = self.pool.get().await?;
        let records: Vec<SettingRecord> = bot_settings::table.load(&mut conn).await?;
        Ok(records
            .into_iter()
            .filter_map(|r| {
                serde_json::from_str(&r.setting_value)
                    .ok()
                    .map(|v| (r.setting_key, v))
            })
            .collect())
    }

    /// Insert or replace a setting.
    pub async fn set(&self, key: &str, value: &serde_json::Value) -> Result<(), DbError> {
        let serialized = value.to_string();
        let now = Utc::now().to_rfc3339();
        let mut conn = self.pool.get().await?;
        diesel::insert_into(bot_settings::table)
            .values((
                bot_settings::setting_key.eq(key),
                bot_settings::setting_value.eq(&serialized),
                bot_settings::updated_at.eq(&now),
            ))
            .on_conflict(bot_settings::setting_key)
            .do_update()
            .set((
                bot_settings::setting_value.eq(&serialized),
                bot_settings::updated_at.eq(&now),
            ))
            .execute(&mut conn)
            .await?;
        Ok(())
    }
}
