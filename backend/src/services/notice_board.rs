use std::sync::Arc;

use tracing::{error, info};

use crate::clock::Clock;
use crate::error::AppError;
use crate::models::notice::CREATED_AT_FIELD;
use crate::models::{NewNoticeRequest, Notice};
use crate::store::{DocumentStore, OrderBy};

pub const MISSING_NOTICE_FIELDS: &str = "Please fill in both the title and content.";

/// Notices, newest first.
pub struct NoticeBoard {
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
    notices: Vec<Notice>,
}

impl NoticeBoard {
    pub fn new(store: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            notices: Vec::new(),
        }
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn into_notices(self) -> Vec<Notice> {
        self.notices
    }

    pub async fn load(&mut self) {
        let order = OrderBy::descending(CREATED_AT_FIELD);
        match self.store.list_all(&Notice::collection(), Some(&order)).await {
            Ok(docs) => self.notices = docs.iter().map(Notice::from_document).collect(),
            Err(e) => {
                error!("Error fetching notices: {}", e);
                self.notices.clear();
            }
        }
    }

    /// Publishes a notice and puts it at the top of the list.
    pub async fn post(&mut self, request: &NewNoticeRequest) -> Result<Notice, AppError> {
        let title = request.title.trim();
        let content = request.content.trim();
        if title.is_empty() || content.is_empty() {
            return Err(AppError::Validation(MISSING_NOTICE_FIELDS.to_string()));
        }

        let now = self.clock.now();
        let mut notice = Notice {
            id: String::new(),
            title: title.to_string(),
            content: content.to_string(),
            created_at: now,
            updated_at: now,
        };
        notice.id = self.store.create(&Notice::collection(), notice.to_fields()).await?;

        info!("Posted notice {}", notice.id);
        self.notices.insert(0, notice.clone());
        Ok(notice)
    }

    /// Deletes a notice from the store, then from the list.
    pub async fn delete(&mut self, id: &str) -> Result<(), AppError> {
        self.store.delete(&Notice::collection(), id).await?;
        self.notices.retain(|notice| notice.id != id);
        info!("Deleted notice {}", id);
        Ok(())
    }
}
