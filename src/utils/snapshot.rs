//! JSON snapshot files used as the hand-off between funnel stages.

use crate::domain::ports::Storage;
use crate::utils::error::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;

pub async fn read_json<T: DeserializeOwned, S: Storage>(storage: &S, path: &str) -> Result<T> {
    let data = storage.read_file(path).await?;
    Ok(serde_json::from_slice(&data)?)
}

pub async fn write_json<T: Serialize + ?Sized, S: Storage>(
    storage: &S,
    path: &str,
    value: &T,
) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    storage.write_file(path, json.as_bytes()).await
}

/// Path of the newest `.json` file in `dir`, by descending file name.
///
/// Snapshot names embed a millisecond timestamp, so name order is creation order.
pub async fn latest_snapshot<S: Storage>(storage: &S, dir: &str) -> Result<Option<String>> {
    let mut names: Vec<String> = storage
        .list_dir(dir)
        .await?
        .into_iter()
        .filter(|name| name.ends_with(".json"))
        .collect();
    names.sort();
    Ok(names.pop().map(|name| join(dir, &name)))
}

pub fn join(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", dir.trim_end_matches('/'), name)
    }
}
