//! Static record corpora and on-disk fixture writers used across harnesses.

use std::path::Path;

/// Activity-log lines in the `<subscription>.jsonl` format, covering the
/// timestamp and field placements the normalizer accepts.
pub const EVENTS_JSONL: &[&str] = &[
    r#"{"annotations":{"time":"2024-01-15T10:00:00Z","resourceId":"/subscriptions/s1/resourceGroups/rg-web/providers/Microsoft.Compute/virtualMachines/vm1","operationName":"Microsoft.Compute/virtualMachines/start/action","level":"Informational"},"body":"vm1 started"}"#,
    r#"{"annotations":{"eventTimestamp":"2024-01-15T10:00:01Z","resourceId":"/subscriptions/s1/resourceGroups/rg-web/providers/Microsoft.Compute/virtualMachines/vm1","operationName":"Microsoft.Compute/virtualMachines/restart/action","level":"Error"},"body":"restart failed"}"#,
    r#"{"properties":{"TimeGenerated":"2024-01-15 10:00:02","resourceId":"/subscriptions/s1/resourceGroups/rg-data/providers/Microsoft.Storage/storageAccounts/st1","operationName":"Microsoft.Storage/storageAccounts/write"},"body":"storage account updated"}"#,
    r#"{"body":{"timestamp":1705312803000,"resourceId":"/subscriptions/s1/resourceGroups/rg-data/providers/Microsoft.Storage/storageAccounts/st1","operationName":"Microsoft.Storage/storageAccounts/listKeys/action","level":"Warning"}}"#,
];

/// Resource directory for the resources referenced by [`EVENTS_JSONL`]
/// (only vm1 is known).
pub const DIRECTORY_JSON: &str = r#"[
  {"id": "/subscriptions/s1/resourceGroups/rg-web/providers/Microsoft.Compute/virtualMachines/vm1", "resourceGroup": "rg-web", "location": "westeurope", "tags": {"env": "prod"}}
]"#;

/// Records that must be skipped by the normalizer.
pub const MALFORMED_JSONL: &[&str] = &[
    r#"{"annotations":{"resourceId":"vm1","operationName":"a/b"},"body":"no timestamp"}"#,
    r#"{"annotations":{"time":"yesterday","resourceId":"vm1","operationName":"a/b"}}"#,
    r#"{"annotations":{"time":"2024-01-15T10:00:00Z","operationName":"a/b"}}"#,
];

pub fn write_events(dir: &Path, subscription: &str, lines: &[&str]) {
    std::fs::create_dir_all(dir).unwrap();
    let mut text = lines.join("\n");
    text.push('\n');
    std::fs::write(dir.join(format!("{subscription}.jsonl")), text).unwrap();
}

pub fn write_directory(dir: &Path, subscription: &str, json: &str) {
    std::fs::create_dir_all(dir).unwrap();
    std::fs::write(dir.join(format!("{subscription}.json")), json).unwrap();
}
