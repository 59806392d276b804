//! Wire shapes shared by the shop backend's endpoints.

use serde::{Deserialize, Serialize};

use crate::error::ClientError;

/// Envelope wrapping every backend answer.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    #[serde(default)]
    pub status_code: Option<u16>,
    pub content: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Content of the envelope. A missing `statusCode` counts as success and
    /// 404 as "nothing here"; any other code is a backend failure carrying
    /// the envelope's message.
    pub fn into_result(self) -> Result<Option<T>, ClientError> {
        match self.status_code {
            None | Some(200) | Some(201) => Ok(self.content),
            Some(404) => Ok(None),
            Some(code) => Err(ClientError::Api(code, self.message.unwrap_or_default())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// Body of the `GetAll` endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    pub page_size: u32,
    pub page_index: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    pub direction: SortDirection,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page_size: 20,
            page_index: 0,
            sort: None,
            direction: SortDirection::Asc,
        }
    }
}

impl PageRequest {
    pub fn page(page_index: u32, page_size: u32) -> Self {
        Self {
            page_index,
            page_size,
            ..Self::default()
        }
    }

    pub fn sorted_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sort = Some(field.into());
        self.direction = direction;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedResult<T> {
    #[serde(default = "Vec::new")]
    pub result_list: Vec<T>,
    #[serde(default)]
    pub total_records: u64,
    #[serde(default)]
    pub page_index: u32,
    #[serde(default)]
    pub page_size: u32,
}

impl<T> PagedResult<T> {
    pub fn empty() -> Self {
        Self {
            result_list: Vec::new(),
            total_records: 0,
            page_index: 0,
            page_size: 0,
        }
    }

    pub fn has_more(&self) -> bool {
        let seen = u64::from(self.page_index) * u64::from(self.page_size)
            + self.result_list.len() as u64;
        seen < self.total_records
    }
}
