//! Label mutations. Renames and deletes also invalidate the tickets
//! partition, which embeds label copies.

use crate::client::{ApiClient, NewLabel, UpdateLabel};
use crate::errors::ApiError;
use crate::models::{Label, Ticket};
use crate::mutate::Transaction;
use crate::store::Store;
use crate::validate;

pub async fn create_label(
    client: &ApiClient,
    store: &Store,
    title: &str,
) -> Result<Label, ApiError> {
    validate::label_title(title)?;
    let created = client
        .create_label(&NewLabel {
            title: title.to_string(),
        })
        .await?;
    store.invalidate::<Label>(None);
    Ok(created)
}

pub async fn rename_label(
    client: &ApiClient,
    store: &Store,
    id: i64,
    title: &str,
) -> Result<Label, ApiError> {
    validate::label_title(title)?;
    let txn = Transaction::begin(store, |labels: &mut Vec<Label>| {
        if let Some(cached) = labels.iter_mut().find(|l| l.id == id) {
            cached.title = title.to_string();
        }
    });
    let result = client
        .update_label(
            id,
            &UpdateLabel {
                title: title.to_string(),
            },
        )
        .await;
    txn.finish(result, |store, label| {
        store.upsert(label.clone());
        store.invalidate::<Ticket>(None);
    })
}

pub async fn delete_label(client: &ApiClient, store: &Store, id: i64) -> Result<(), ApiError> {
    client.delete_label(id).await?;
    store.remove::<Label>(id);
    store.invalidate::<Ticket>(None);
    Ok(())
}
