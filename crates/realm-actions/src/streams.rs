//! Channel actions that touch realm settings

use realm_org::{PropertyValue, RealmError, RealmResult, Stream};
use tracing::info;
use uuid::Uuid;

use crate::service::RealmService;

impl RealmService {
    /// Add a channel to an existing realm.
    pub async fn create_stream(&self, stream: Stream) -> RealmResult<Stream> {
        self.get_realm(stream.realm_id).await?;
        self.store.insert_stream(stream.clone()).await?;
        Ok(stream)
    }

    /// Archive a channel and clear every realm designation pointing at it.
    pub async fn deactivate_stream(
        &self,
        stream_id: Uuid,
        acting_user: Option<Uuid>,
    ) -> RealmResult<Stream> {
        let mut stream = self
            .store
            .get_stream(stream_id)
            .await?
            .ok_or_else(|| RealmError::NotFound(format!("Channel {}", stream_id)))?;
        if stream.deactivated {
            return Ok(stream);
        }
        stream.deactivated = true;
        self.store.update_stream(&stream).await?;

        let realm = self.get_realm(stream.realm_id).await?;
        for property in realm.channel_designations(stream.id) {
            self.set_realm_property(realm.id, property, PropertyValue::Channel(None), acting_user)
                .await?;
        }

        info!(realm_id = %realm.id, stream_id = %stream.id, "Deactivated channel");
        Ok(stream)
    }
}
