//! The "not implemented" default used to widen [`crate::db::Database`] to
//! the full administrative API surface without implementing any of it.
//!
//! Grounded on the original's `unimplemented.go`: dozens of methods each
//! returning a uniform error. The Rust idiom for "embed a default, override
//! a few methods" is a trait with default bodies (the shape `Rule` already
//! uses in `src/rules/mod.rs` for `explain()`/`default_severity()`) rather
//! than struct embedding: [`Database`](crate::db::Database) implements this
//! trait by inheriting every default and separately implements
//! [`crate::db::ItemApi`] for the five operations it actually supports.

use serde_json::Value;

use crate::error::{unimplemented, Result};

/// The broad administrative surface this core does not implement. Every
/// method returns [`crate::error::ErrorKind::Unimplemented`] by default.
pub trait UnimplementedApi {
    fn batch_get_item(&self, _input: Value) -> Result<Value> {
        Err(unimplemented("BatchGetItem"))
    }
    fn batch_write_item(&self, _input: Value) -> Result<Value> {
        Err(unimplemented("BatchWriteItem"))
    }
    fn create_backup(&self, _input: Value) -> Result<Value> {
        Err(unimplemented("CreateBackup"))
    }
    fn create_global_table(&self, _input: Value) -> Result<Value> {
        Err(unimplemented("CreateGlobalTable"))
    }
    fn create_table(&self, _input: Value) -> Result<Value> {
        Err(unimplemented("CreateTable"))
    }
    fn delete_backup(&self, _input: Value) -> Result<Value> {
        Err(unimplemented("DeleteBackup"))
    }
    fn delete_table(&self, _input: Value) -> Result<Value> {
        Err(unimplemented("DeleteTable"))
    }
    fn describe_backup(&self, _input: Value) -> Result<Value> {
        Err(unimplemented("DescribeBackup"))
    }
    fn describe_continuous_backups(&self, _input: Value) -> Result<Value> {
        Err(unimplemented("DescribeContinuousBackups"))
    }
    fn describe_contributor_insights(&self, _input: Value) -> Result<Value> {
        Err(unimplemented("DescribeContributorInsights"))
    }
    fn describe_endpoints(&self, _input: Value) -> Result<Value> {
        Err(unimplemented("DescribeEndpoints"))
    }
    fn describe_export(&self, _input: Value) -> Result<Value> {
        Err(unimplemented("DescribeExport"))
    }
    fn describe_global_table(&self, _input: Value) -> Result<Value> {
        Err(unimplemented("DescribeGlobalTable"))
    }
    fn describe_global_table_settings(&self, _input: Value) -> Result<Value> {
        Err(unimplemented("DescribeGlobalTableSettings"))
    }
    fn describe_limits(&self, _input: Value) -> Result<Value> {
        Err(unimplemented("DescribeLimits"))
    }
    /// Unlike the other methods here, `DescribeTable` has a natural,
    /// low-cost answer from data this core already owns — a future
    /// revision could override it per-table instead of erroring.
    fn describe_table(&self, _input: Value) -> Result<Value> {
        Err(unimplemented("DescribeTable"))
    }
    fn describe_table_replica_auto_scaling(&self, _input: Value) -> Result<Value> {
        Err(unimplemented("DescribeTableReplicaAutoScaling"))
    }
    fn describe_time_to_live(&self, _input: Value) -> Result<Value> {
        Err(unimplemented("DescribeTimeToLive"))
    }
    fn export_table_to_point_in_time(&self, _input: Value) -> Result<Value> {
        Err(unimplemented("ExportTableToPointInTime"))
    }
    fn list_backups(&self, _input: Value) -> Result<Value> {
        Err(unimplemented("ListBackups"))
    }
    fn list_exports(&self, _input: Value) -> Result<Value> {
        Err(unimplemented("ListExports"))
    }
    fn list_global_tables(&self, _input: Value) -> Result<Value> {
        Err(unimplemented("ListGlobalTables"))
    }
    fn list_tables(&self, _input: Value) -> Result<Value> {
        Err(unimplemented("ListTables"))
    }
    fn list_tags_of_resource(&self, _input: Value) -> Result<Value> {
        Err(unimplemented("ListTagsOfResource"))
    }
    fn restore_table_from_backup(&self, _input: Value) -> Result<Value> {
        Err(unimplemented("RestoreTableFromBackup"))
    }
    fn restore_table_to_point_in_time(&self, _input: Value) -> Result<Value> {
        Err(unimplemented("RestoreTableToPointInTime"))
    }
    fn scan(&self, _input: Value) -> Result<Value> {
        Err(unimplemented("Scan"))
    }
    fn tag_resource(&self, _input: Value) -> Result<Value> {
        Err(unimplemented("TagResource"))
    }
    fn transact_get_items(&self, _input: Value) -> Result<Value> {
        Err(unimplemented("TransactGetItems"))
    }
    fn transact_write_items(&self, _input: Value) -> Result<Value> {
        Err(unimplemented("TransactWriteItems"))
    }
    fn untag_resource(&self, _input: Value) -> Result<Value> {
        Err(unimplemented("UntagResource"))
    }
    fn update_continuous_backups(&self, _input: Value) -> Result<Value> {
        Err(unimplemented("UpdateContinuousBackups"))
    }
    fn update_global_table(&self, _input: Value) -> Result<Value> {
        Err(unimplemented("UpdateGlobalTable"))
    }
    fn update_global_table_settings(&self, _input: Value) -> Result<Value> {
        Err(unimplemented("UpdateGlobalTableSettings"))
    }
    fn update_table(&self, _input: Value) -> Result<Value> {
        Err(unimplemented("UpdateTable"))
    }
    fn update_table_replica_auto_scaling(&self, _input: Value) -> Result<Value> {
        Err(unimplemented("UpdateTableReplicaAutoScaling"))
    }
    fn update_time_to_live(&self, _input: Value) -> Result<Value> {
        Err(unimplemented("UpdateTimeToLive"))
    }
}
