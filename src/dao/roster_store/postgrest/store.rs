use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use uuid::Uuid;

use crate::dao::{
    models::{MatchEntity, MatchPlayerEntity, MatchResultEntity, NotificationEntity},
    roster_store::{MatchFilter, RosterStore},
    storage::StorageResult,
};

use super::{
    config::PostgrestConfig,
    error::{PostgrestDaoError, PostgrestResult},
    models::{
        MATCH_PLAYERS_TABLE, MATCH_RESULTS_TABLE, MATCHES_TABLE, MatchPlayerPatch,
        NOTIFICATIONS_TABLE, ROSTER_ORDER, eq, id_list, involving_query, match_filter_query,
    },
};

const PREFER: &str = "Prefer";
const RETURN_MINIMAL: &str = "return=minimal";
const RETURN_REPRESENTATION: &str = "return=representation";

type Query = Vec<(&'static str, String)>;

/// [`RosterStore`] speaking the PostgREST dialect exposed by the hosted relational database.
#[derive(Clone)]
pub struct PostgrestRosterStore {
    client: Client,
    base_url: Arc<str>,
    api_key: Option<Arc<str>>,
}

impl PostgrestRosterStore {
    /// Build the HTTP client and verify the gateway answers.
    pub async fn connect(config: PostgrestConfig) -> PostgrestResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|source| PostgrestDaoError::ClientBuilder { source })?;

        let store = Self {
            client,
            base_url: Arc::<str>::from(config.base_url.trim_end_matches('/')),
            api_key: config.api_key.map(Arc::<str>::from),
        };

        store.probe().await?;
        Ok(store)
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, table);
        let builder = self.client.request(method, url);
        match self.api_key {
            Some(ref key) => builder
                .header("apikey", key.as_ref())
                .bearer_auth(key.as_ref()),
            None => builder,
        }
    }

    async fn send(&self, table: &str, builder: RequestBuilder) -> PostgrestResult<Response> {
        let response = builder
            .send()
            .await
            .map_err(|source| PostgrestDaoError::RequestSend {
                path: table.to_string(),
                source,
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        if status == StatusCode::CONFLICT {
            Err(PostgrestDaoError::Conflict {
                path: table.to_string(),
                body,
            })
        } else {
            Err(PostgrestDaoError::RequestStatus {
                path: table.to_string(),
                status,
                body,
            })
        }
    }

    async fn select<T>(&self, table: &'static str, query: Query) -> PostgrestResult<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let builder = self.request(Method::GET, table).query(&query);
        let response = self.send(table, builder).await?;
        response
            .json::<Vec<T>>()
            .await
            .map_err(|source| PostgrestDaoError::DecodeResponse {
                path: table.to_string(),
                source,
            })
    }

    async fn select_one<T>(&self, table: &'static str, query: Query) -> PostgrestResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        let rows = self.select::<T>(table, query).await?;
        Ok(rows.into_iter().next())
    }

    /// Insert one row or a JSON array of rows in a single statement.
    async fn insert<T>(&self, table: &'static str, payload: &T) -> PostgrestResult<()>
    where
        T: ?Sized + Serialize,
    {
        let builder = self
            .request(Method::POST, table)
            .header(PREFER, RETURN_MINIMAL)
            .json(payload);
        self.send(table, builder).await.map(|_| ())
    }

    /// Apply a filtered PATCH; fails when no row matched.
    async fn patch<T>(&self, table: &'static str, query: Query, payload: &T) -> PostgrestResult<()>
    where
        T: ?Sized + Serialize,
    {
        let builder = self
            .request(Method::PATCH, table)
            .query(&query)
            .header(PREFER, RETURN_REPRESENTATION)
            .json(payload);
        let affected = self.affected_rows(table, builder).await?;
        if affected == 0 {
            return Err(PostgrestDaoError::RowNotFound {
                path: table.to_string(),
            });
        }
        Ok(())
    }

    /// Apply a filtered DELETE and report how many rows went away.
    async fn delete(&self, table: &'static str, query: Query) -> PostgrestResult<u64> {
        let builder = self
            .request(Method::DELETE, table)
            .query(&query)
            .header(PREFER, RETURN_REPRESENTATION);
        self.affected_rows(table, builder).await
    }

    async fn affected_rows(&self, table: &str, builder: RequestBuilder) -> PostgrestResult<u64> {
        let response = self.send(table, builder).await?;
        let rows = response
            .json::<Vec<Value>>()
            .await
            .map_err(|source| PostgrestDaoError::DecodeResponse {
                path: table.to_string(),
                source,
            })?;
        Ok(rows.len() as u64)
    }

    async fn probe(&self) -> PostgrestResult<()> {
        let query = vec![("select", "id".to_string()), ("limit", "1".to_string())];
        self.select::<Value>(MATCHES_TABLE, query).await.map(|_| ())
    }
}

impl RosterStore for PostgrestRosterStore {
    fn insert_match(&self, entity: MatchEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .insert(MATCHES_TABLE, &entity)
                .await
                .map_err(Into::into)
        })
    }

    fn update_match(&self, entity: MatchEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .patch(MATCHES_TABLE, vec![eq("id", entity.id)], &entity)
                .await
                .map_err(Into::into)
        })
    }

    fn find_match(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<MatchEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let query = vec![("select", "*".to_string()), eq("id", id)];
            store
                .select_one(MATCHES_TABLE, query)
                .await
                .map_err(Into::into)
        })
    }

    fn list_matches(
        &self,
        filter: MatchFilter,
    ) -> BoxFuture<'static, StorageResult<Vec<MatchEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .select(MATCHES_TABLE, match_filter_query(&filter))
                .await
                .map_err(Into::into)
        })
    }

    fn list_matches_involving(
        &self,
        player_id: Uuid,
        joined: Vec<Uuid>,
    ) -> BoxFuture<'static, StorageResult<Vec<MatchEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .select(MATCHES_TABLE, involving_query(player_id, &joined))
                .await
                .map_err(Into::into)
        })
    }

    fn delete_match(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            let removed = store.delete(MATCHES_TABLE, vec![eq("id", id)]).await?;
            Ok(removed > 0)
        })
    }

    fn list_match_players(
        &self,
        match_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<MatchPlayerEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let query = vec![
                ("select", "*".to_string()),
                eq("match_id", match_id),
                ("order", ROSTER_ORDER.to_string()),
            ];
            store
                .select(MATCH_PLAYERS_TABLE, query)
                .await
                .map_err(Into::into)
        })
    }

    fn list_rosters(
        &self,
        match_ids: Vec<Uuid>,
    ) -> BoxFuture<'static, StorageResult<Vec<MatchPlayerEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            if match_ids.is_empty() {
                return Ok(Vec::new());
            }
            let query = vec![
                ("select", "*".to_string()),
                ("match_id", format!("in.{}", id_list(&match_ids))),
                ("order", ROSTER_ORDER.to_string()),
            ];
            store
                .select(MATCH_PLAYERS_TABLE, query)
                .await
                .map_err(Into::into)
        })
    }

    fn list_player_memberships(
        &self,
        player_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<MatchPlayerEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let query = vec![
                ("select", "*".to_string()),
                eq("player_id", player_id),
                ("order", ROSTER_ORDER.to_string()),
            ];
            store
                .select(MATCH_PLAYERS_TABLE, query)
                .await
                .map_err(Into::into)
        })
    }

    fn insert_match_players(
        &self,
        rows: Vec<MatchPlayerEntity>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            if rows.is_empty() {
                return Ok(());
            }
            store
                .insert(MATCH_PLAYERS_TABLE, rows.as_slice())
                .await
                .map_err(Into::into)
        })
    }

    fn update_match_player(
        &self,
        row: MatchPlayerEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let query = vec![eq("match_id", row.match_id), eq("player_id", row.player_id)];
            let patch = MatchPlayerPatch::from(&row);
            store
                .patch(MATCH_PLAYERS_TABLE, query, &patch)
                .await
                .map_err(Into::into)
        })
    }

    fn delete_match_player(
        &self,
        match_id: Uuid,
        player_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            let query = vec![eq("match_id", match_id), eq("player_id", player_id)];
            let removed = store.delete(MATCH_PLAYERS_TABLE, query).await?;
            Ok(removed > 0)
        })
    }

    fn delete_match_players(&self, match_id: Uuid) -> BoxFuture<'static, StorageResult<u64>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .delete(MATCH_PLAYERS_TABLE, vec![eq("match_id", match_id)])
                .await
                .map_err(Into::into)
        })
    }

    fn find_result(
        &self,
        match_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<MatchResultEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let query = vec![("select", "*".to_string()), eq("match_id", match_id)];
            store
                .select_one(MATCH_RESULTS_TABLE, query)
                .await
                .map_err(Into::into)
        })
    }

    fn insert_result(&self, result: MatchResultEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .insert(MATCH_RESULTS_TABLE, &result)
                .await
                .map_err(Into::into)
        })
    }

    fn delete_result(&self, match_id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            let removed = store
                .delete(MATCH_RESULTS_TABLE, vec![eq("match_id", match_id)])
                .await?;
            Ok(removed > 0)
        })
    }

    fn insert_notifications(
        &self,
        notifications: Vec<NotificationEntity>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            if notifications.is_empty() {
                return Ok(());
            }
            store
                .insert(NOTIFICATIONS_TABLE, notifications.as_slice())
                .await
                .map_err(Into::into)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.probe().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        // HTTP is connectionless from our side; a successful probe is a reconnect.
        let store = self.clone();
        Box::pin(async move { store.probe().await.map_err(Into::into) })
    }
}
