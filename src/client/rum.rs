use serde_json::Value;

use super::list::ListKind;
use super::types::{DataSource, RumEventType};
use super::{ClientError, DatadogClient};

pub const DEFAULT_RUM_GROUP_FIELD: &str = "log_type";

impl DatadogClient {
    pub async fn rum_list(
        &self,
        query: &str,
        hours: f64,
        limit: u32,
        event_type: Option<RumEventType>,
    ) -> Result<Value, ClientError> {
        let kind = ListKind::Rum { event_type };
        Ok(self.list_page(&kind, query, hours, limit, None).await?.body)
    }

    pub async fn rum_sessions(
        &self,
        query: &str,
        hours: f64,
        limit: u32,
    ) -> Result<Value, ClientError> {
        self.rum_list(query, hours, limit, Some(RumEventType::Session)).await
    }

    pub async fn rum_actions(
        &self,
        query: &str,
        hours: f64,
        limit: u32,
    ) -> Result<Value, ClientError> {
        self.rum_list(query, hours, limit, Some(RumEventType::Action)).await
    }

    pub async fn rum_views(
        &self,
        query: &str,
        hours: f64,
        limit: u32,
    ) -> Result<Value, ClientError> {
        self.rum_list(query, hours, limit, Some(RumEventType::View)).await
    }

    pub async fn rum_errors(
        &self,
        query: &str,
        hours: f64,
        limit: u32,
    ) -> Result<Value, ClientError> {
        self.rum_list(query, hours, limit, Some(RumEventType::Error)).await
    }

    pub async fn rum_resources(
        &self,
        query: &str,
        hours: f64,
        limit: u32,
    ) -> Result<Value, ClientError> {
        self.rum_list(query, hours, limit, Some(RumEventType::Resource)).await
    }

    pub async fn rum_aggregate(
        &self,
        query: &str,
        hours: f64,
        field: &str,
        limit: u32,
    ) -> Result<Value, ClientError> {
        self.aggregate(DataSource::Rum, query, hours, field, limit)
            .await
    }
}
