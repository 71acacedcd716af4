pub mod dto;

use std::env;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};

use crate::store::{CollectionPath, Direction, Document, DocumentStore, Fields, OrderBy, StoreError};

const FIRESTORE_API: &str = "https://firestore.googleapis.com/v1";
const PAGE_SIZE: u32 = 300;
// listing an absent collection succeeds with no documents
const PING_COLLECTION: &str = "_health";

#[derive(Clone)]
pub struct FirestoreConfig {
    pub project_id: String,
    pub api_key: String,
    pub database: String,
    pub id_token: Option<String>,
}

impl std::fmt::Debug for FirestoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirestoreConfig")
            .field("project_id", &self.project_id)
            .field("database", &self.database)
            .finish_non_exhaustive()
    }
}

impl FirestoreConfig {
    pub fn new_from_env() -> Result<Self, StoreError> {
        let project_id = env::var("FIRESTORE_PROJECT_ID")
            .map_err(|_| StoreError::Config("FIRESTORE_PROJECT_ID is not set".to_string()))?;
        let api_key = env::var("FIRESTORE_API_KEY")
            .map_err(|_| StoreError::Config("FIRESTORE_API_KEY is not set".to_string()))?;
        let database = env::var("FIRESTORE_DATABASE").unwrap_or_else(|_| "(default)".to_string());
        let id_token = env::var("FIRESTORE_ID_TOKEN").ok().filter(|t| !t.is_empty());

        Ok(Self {
            project_id,
            api_key,
            database,
            id_token,
        })
    }

    fn documents_root(&self) -> String {
        format!(
            "{}/projects/{}/databases/{}/documents",
            FIRESTORE_API, self.project_id, self.database
        )
    }
}

/// Hosted document store reached through the Firestore REST API.
pub struct FirestoreClient {
    client: Client,
    config: FirestoreConfig,
}

impl FirestoreClient {
    pub fn new(config: FirestoreConfig) -> Result<Self, StoreError> {
        let client = Client::builder()
            .build()
            .map_err(|e| StoreError::Config(format!("Failed to build http client: {}", e)))?;
        Ok(Self { client, config })
    }

    fn collection_url(&self, collection: &CollectionPath) -> Result<Url, StoreError> {
        self.url(&format!("{}/{}", self.config.documents_root(), collection))
    }

    fn document_url(&self, collection: &CollectionPath, key: &str) -> Result<Url, StoreError> {
        if key.is_empty() || key.contains('/') {
            return Err(StoreError::InvalidPath(format!("{}/{}", collection, key)));
        }
        self.url(&format!("{}/{}/{}", self.config.documents_root(), collection, key))
    }

    fn url(&self, raw: &str) -> Result<Url, StoreError> {
        let mut url = Url::parse(raw).map_err(|e| StoreError::InvalidPath(format!("{}: {}", raw, e)))?;
        url.query_pairs_mut().append_pair("key", &self.config.api_key);
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.id_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, StoreError> {
        let response = self.authorize(request).send().await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Api { status, body });
        }
        Ok(response)
    }

    async fn patch(&self, url: Url, fields: &Fields) -> Result<(), StoreError> {
        let request_body = dto::WriteDocumentRequest {
            fields: dto::encode_fields(fields),
        };
        self.send(self.client.patch(url).json(&request_body)).await?;
        Ok(())
    }
}

/// Quotes a field name for an update mask unless it is a simple identifier.
fn field_path(name: &str) -> String {
    let simple = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if simple {
        name.to_string()
    } else {
        format!("`{}`", name.replace('\\', "\\\\").replace('`', "\\`"))
    }
}

fn order_clause(order: &OrderBy) -> String {
    match order.direction {
        Direction::Ascending => field_path(&order.field),
        Direction::Descending => format!("{} desc", field_path(&order.field)),
    }
}

#[async_trait]
impl DocumentStore for FirestoreClient {
    async fn list_all(
        &self,
        collection: &CollectionPath,
        order: Option<&OrderBy>,
    ) -> Result<Vec<Document>, StoreError> {
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut url = self.collection_url(collection)?;
            {
                let mut query = url.query_pairs_mut();
                query.append_pair("pageSize", &PAGE_SIZE.to_string());
                if let Some(order) = order {
                    query.append_pair("orderBy", &order_clause(order));
                }
                if let Some(token) = &page_token {
                    query.append_pair("pageToken", token);
                }
            }

            let response = self.send(self.client.get(url)).await?;
            let page: dto::ListDocumentsResponse = response.json().await?;

            for doc in page.documents {
                documents.push(Document {
                    key: doc.key().to_string(),
                    fields: dto::decode_fields(&doc.fields),
                });
            }

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        tracing::debug!("Listed {} documents from {}", documents.len(), collection);
        Ok(documents)
    }

    async fn get_one(&self, collection: &CollectionPath, key: &str) -> Result<Option<Fields>, StoreError> {
        let url = self.document_url(collection, key)?;
        let response = self.authorize(self.client.get(url)).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Api { status, body });
        }

        let doc: dto::FirestoreDocument = response.json().await?;
        Ok(Some(dto::decode_fields(&doc.fields)))
    }

    async fn create(&self, collection: &CollectionPath, fields: Fields) -> Result<String, StoreError> {
        let url = self.collection_url(collection)?;
        let request_body = dto::WriteDocumentRequest {
            fields: dto::encode_fields(&fields),
        };

        let response = self.send(self.client.post(url).json(&request_body)).await?;
        let created: dto::FirestoreDocument = response.json().await?;
        let key = created.key();
        if key.is_empty() {
            return Err(StoreError::Malformed("create response carried no document name".to_string()));
        }

        tracing::info!("Created document {}/{}", collection, key);
        Ok(key.to_string())
    }

    async fn merge_update(&self, collection: &CollectionPath, key: &str, fields: Fields) -> Result<(), StoreError> {
        let mut url = self.document_url(collection, key)?;
        {
            let mut query = url.query_pairs_mut();
            for name in fields.keys() {
                query.append_pair("updateMask.fieldPaths", &field_path(name));
            }
        }
        self.patch(url, &fields).await
    }

    async fn overwrite(&self, collection: &CollectionPath, key: &str, fields: Fields) -> Result<(), StoreError> {
        let url = self.document_url(collection, key)?;
        self.patch(url, &fields).await
    }

    async fn delete(&self, collection: &CollectionPath, key: &str) -> Result<(), StoreError> {
        let url = self.document_url(collection, key)?;
        self.send(self.client.delete(url)).await?;
        tracing::info!("Deleted document {}/{}", collection, key);
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut url = self.collection_url(&CollectionPath::root(PING_COLLECTION))?;
        url.query_pairs_mut().append_pair("pageSize", "1");
        self.send(self.client.get(url)).await?;
        Ok(())
    }
}
