// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Default documents seeded into new application namespaces.

use serde_json::{Value, json};

use appdeck_types::ids;

/// Design document initializing the namespace's indexing structures.
/// Written before any tables or templates.
pub fn design_doc() -> Value {
    json!({
        "_id": "_design/database",
        "views": {},
    })
}

/// Schema document for the built-in users table every blank app gets.
pub fn users_table_doc() -> Value {
    json!({
        "_id": format!("{}users", ids::TABLE_PREFIX),
        "type": "table",
        "name": "Users",
        "primaryDisplay": "email",
        "schema": {
            "email": { "type": "text", "constraints": { "type": "string", "presence": true } },
            "firstName": { "type": "text" },
            "lastName": { "type": "text" },
            "roleId": { "type": "options" },
            "status": { "type": "options" },
        },
    })
}

/// Sample dataset seeded when the caller asks for stock data: one inventory
/// table and a handful of rows.
pub fn sample_docs() -> Vec<Value> {
    let table_id = format!("{}sample_inventory", ids::TABLE_PREFIX);
    let mut docs = vec![json!({
        "_id": table_id,
        "type": "table",
        "name": "Inventory",
        "primaryDisplay": "name",
        "schema": {
            "name": { "type": "text" },
            "quantity": { "type": "number" },
            "restocked": { "type": "datetime" },
        },
    })];
    for (name, quantity) in [("Desk", 20), ("Chair", 48), ("Monitor", 12)] {
        docs.push(json!({
            "_id": format!("{}{}_{}", ids::ROW_PREFIX, "table_sample_inventory", name.to_lowercase()),
            "type": "row",
            "tableId": format!("{}sample_inventory", ids::TABLE_PREFIX),
            "name": name,
            "quantity": quantity,
        }));
    }
    docs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_docs_include_rows() {
        let docs = sample_docs();
        assert_eq!(docs.len(), 4);
        let rows = docs
            .iter()
            .filter(|d| d["_id"].as_str().unwrap().starts_with(ids::ROW_PREFIX))
            .count();
        assert_eq!(rows, 3);
    }

    #[test]
    fn test_users_table_has_fixed_id() {
        assert_eq!(users_table_doc()["_id"], "table_users");
    }
}
